//! mvc-demo - counter application built on the puremvc facade
//!
//! Command-line usage:
//!   mvc-demo Increment Increment Reset       - send notifications in order
//!   mvc-demo Increment --amount 5            - increment by 5
//!   mvc-demo Increment --highlight 10        - mark values >= 10
//!   mvc-demo --config facade.json ...        - load facade policies from JSON

use puremvc::cli::run_cli;

fn main() {
    env_logger::init();

    if let Err(e) = run_cli() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
