use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use debate_agents::config::AgentsConfig;
use debate_agents::panel;
use debate_coordination::{Coordinator, DebateConfig, Problem};

#[derive(Debug, Parser)]
#[command(name = "debate-agents", about = "Ledger-driven multi-expert debate")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one debate and stream its events as JSON lines.
    Solve(SolveArgs),
}

#[derive(Debug, clap::Args)]
struct SolveArgs {
    /// Problem statement.
    question: String,
    /// TOML configuration file (defaults to $DEBATE_CONFIG).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    max_rounds: Option<u32>,
    #[arg(long)]
    max_stall: Option<u32>,
    /// Per-call time budget in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Restrict the session to these worker ids.
    #[arg(long, value_delimiter = ',')]
    workers: Option<Vec<String>>,
    /// Bounded retries per worker per round (0 or 1).
    #[arg(long)]
    retries: Option<u32>,
    /// Dispatch workers one at a time.
    #[arg(long)]
    sequential: bool,
    /// Use scripted workers instead of the chat endpoint.
    #[arg(long)]
    mock: bool,
    /// Simulated thinking time for scripted workers, in milliseconds.
    #[arg(long, default_value_t = 0)]
    mock_delay_ms: u64,
}

impl SolveArgs {
    fn apply(&self, debate: &mut DebateConfig) {
        if let Some(n) = self.max_rounds {
            debate.max_rounds = n;
        }
        if let Some(k) = self.max_stall {
            debate.max_stall = k;
        }
        if let Some(secs) = self.timeout_secs {
            debate.per_call_timeout = Duration::from_secs(secs);
        }
        if let Some(pool) = &self.workers {
            debate.worker_pool = Some(pool.clone());
        }
        if let Some(retries) = self.retries {
            debate.max_retries = retries;
        }
        if self.sequential {
            debate.parallel_dispatch = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Solve(args) => solve(args).await,
    }
}

async fn solve(args: SolveArgs) -> Result<()> {
    let mut config = AgentsConfig::load(args.config.as_deref())?;
    args.apply(&mut config.debate);

    let registry = if args.mock {
        panel::scripted_panel(
            &config,
            &args.question,
            Duration::from_millis(args.mock_delay_ms),
        )?
    } else {
        panel::chat_panel(&config)?
    };
    let coordinator =
        Coordinator::new(registry, config.debate.clone()).context("Invalid debate configuration")?;
    info!(
        workers = ?coordinator.registry().ids(),
        max_rounds = config.debate.max_rounds,
        mock = args.mock,
        "debate-agents starting"
    );

    let (_, mut events) = coordinator.event_bus().subscribe_with_history();
    let printer = tokio::spawn(async move {
        let stdout = std::io::stdout();
        loop {
            match events.recv().await {
                Ok(envelope) => {
                    let line = serde_json::to_string(&envelope)?;
                    writeln!(stdout.lock(), "{line}")?;
                    if envelope.event.is_terminal() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event printer lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        anyhow::Ok(())
    });

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling debate");
            on_signal.cancel();
        }
    });

    let result = coordinator.run(Problem::new(&args.question), cancel).await;
    printer.await.context("Event printer panicked")??;

    let outcome = result.context("Debate failed")?;
    info!(summary = %outcome.summary_line(), "debate complete");
    println!("{}", outcome.final_answer);
    Ok(())
}
