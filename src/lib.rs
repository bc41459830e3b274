pub mod cli;
pub mod config;
pub mod core;
pub mod demo;
pub mod error;
pub mod facade;
pub mod pump;

// 公開API
pub use config::{DuplicatePolicy, FacadeConfig, FailurePolicy};
pub use error::{HandlerError, HandlerFailure, HandlerResult, MvcError, MvcResult};
pub use facade::Facade;
pub use pump::{NotificationPump, PumpSendError, PumpSender};
