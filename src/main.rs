use std::error::Error;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt};

use travel_desk::{
    Config, OpenAiClient, Overrides, Runner, Session, SessionContext, WebSearch, catalog,
};

const PROMPT: &str = "Enter message: ";

#[derive(Parser, Debug)]
#[command(
    name = "travel-desk",
    version,
    about = "Ask about cities and flights; a router agent hands you to the right specialist"
)]
struct Cli {
    /// Name the weather tool greets you with.
    #[arg(long)]
    first_name: Option<String>,
    /// Model for the router and the guardrail classifiers.
    #[arg(long)]
    model: Option<String>,
    /// OpenAI-compatible API base URL.
    #[arg(long)]
    base_url: Option<String>,
    /// Cap on model calls per message.
    #[arg(long)]
    max_turns: Option<usize>,
    /// Tracing filter, e.g. `debug` or `travel_desk=trace`. Falls back to RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            first_name: self.first_name.clone(),
            max_turns: self.max_turns,
        }
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    let code = match runtime.block_on(console(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "travel desk stopped");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    };

    // stdin reads and an in-flight turn live on blocking threads; don't wait for them
    runtime.shutdown_background();
    code
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn console(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?.apply(cli.overrides())?;
    info!(model = %config.model, base_url = %config.base_url, max_turns = config.max_turns, "starting travel desk");

    let search = WebSearch::new(config.search_url.clone()).with_timeout(config.http_timeout);
    let runner = Arc::new(
        Runner::new(
            catalog::travel_desk()?,
            catalog::toolbox(search),
            Arc::new(OpenAiClient::new(config.openai())),
        )
        .with_max_turns(config.max_turns)
        .with_tracing(),
    );

    let mut session = Session::new(
        runner.graph().start(),
        SessionContext::new().with_first_name(config.first_name.clone()),
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{PROMPT}");
        io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            interrupted();
            return Ok(());
        };

        let worker = Arc::clone(&runner);
        let job = tokio::task::spawn_blocking(move || {
            let turn = session.submit(&worker, &line);
            (session, turn)
        });

        let (returned, turn) = tokio::select! {
            joined = job => joined?,
            _ = signal::ctrl_c() => {
                interrupted();
                return Ok(());
            }
        };
        session = returned;

        let turn = turn?;
        debug!(agent = session.current_agent(), history = session.history().len(), "turn done");
        for line in turn.lines(runner.graph()) {
            println!("{line}");
        }
    }
}

fn interrupted() {
    println!();
    println!("Interrupted by user.");
}
