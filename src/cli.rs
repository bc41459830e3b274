use crate::config::FacadeConfig;
use crate::core::{Mediator, Payload};
use crate::demo::{self, CounterProxy, DisplayMediator, HighlightDisplayMediator, Screen};
use crate::facade::Facade;
use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;

/// mvc-demo - drive the counter application from the command line
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Notifications to send, in order (e.g. Increment Increment Reset)
    pub notifications: Vec<String>,

    /// Facade configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Amount carried by each Increment notification
    #[arg(short, long, default_value_t = 1)]
    pub amount: i64,

    /// Initial counter value
    #[arg(long, default_value_t = 0)]
    pub initial: i64,

    /// Use the highlighting display, marking values at or above this threshold
    #[arg(long)]
    pub highlight: Option<i64>,
}

/// Result of a demo run
#[derive(Debug)]
pub struct DemoOutcome {
    pub lines: Vec<String>,
    pub count: i64,
    pub failures: usize,
}

/// CLI実行エントリーポイント
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let outcome = run_demo(&cli)?;

    for line in &outcome.lines {
        println!("{}", line);
    }
    println!("final count: {}", outcome.count);
    if outcome.failures > 0 {
        eprintln!("{} notification(s) reported handler failures", outcome.failures);
    }
    Ok(())
}

/// Build the application and send every notification named on the command line.
pub fn run_demo(cli: &Cli) -> Result<DemoOutcome> {
    let config = match &cli.config {
        Some(path) => FacadeConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => FacadeConfig::default(),
    };
    debug!("Demo config: {:?}", config);

    let facade = Facade::new(config);
    let screen = Arc::new(Screen::default());
    let display: Arc<dyn Mediator> = match cli.highlight {
        Some(threshold) => Arc::new(HighlightDisplayMediator::new(screen.clone(), threshold)),
        None => Arc::new(DisplayMediator::new(screen.clone())),
    };
    demo::startup(&facade, display, cli.initial).context("Startup failed")?;

    let mut failures = 0;
    for name in &cli.notifications {
        let body = (name == demo::INCREMENT).then(|| Payload::new(cli.amount));
        if let Err(e) = facade.send_notification(name.as_str(), body, None) {
            log::warn!("{} failed: {}", name, e);
            failures += 1;
        }
    }

    let count = facade
        .retrieve_proxy_as::<CounterProxy>(demo::COUNTER_PROXY)
        .map(|counter| *counter.data())
        .context("Counter proxy missing after startup")?;

    Ok(DemoOutcome {
        lines: screen.lines(),
        count,
        failures,
    })
}
