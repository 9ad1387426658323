use anyhow::Context as _;
use clap::{Parser, Subcommand};
use flyme::recognizer::LuisRecognizer;
use flyme::{Bot, BotConfig, JsonFileOutcomeLog, OutcomeLog, PerformanceReport, TurnStatus};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flyme", version, about = "Conversational flight-booking assistant")]
struct Args {
    /// Outcome log file (overrides OUTCOME_LOG_PATH)
    #[arg(long, global = true)]
    log_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Talk to the bot on the terminal
    Chat,
    /// Print the acceptance rate of the outcome log
    Report,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn build_bot(config: &BotConfig) -> anyhow::Result<Bot> {
    let recognizer = LuisRecognizer::new(config.luis.clone())
        .context("Failed to create the LUIS client")?;

    let bot = Bot::builder()
        .recognizer(Arc::new(recognizer))
        .outcome_log(Arc::new(JsonFileOutcomeLog::new(&config.outcome_log_path)))
        .build()?;
    Ok(bot)
}

async fn chat(bot: Bot) -> anyhow::Result<()> {
    let session_id = bot.create_session().await?;
    println!("Bot: {}", bot.greeting());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = bot.process_message(session_id, line).await?;
        for message in &response.messages {
            println!("Bot: {}", message);
        }
        if response.status == TurnStatus::Complete {
            tracing::debug!(booking = ?response.booking, "Conversation finished a booking");
        }
    }

    Ok(())
}

async fn report(config: &BotConfig) -> anyhow::Result<()> {
    let log = JsonFileOutcomeLog::new(&config.outcome_log_path);
    let records = log
        .load()
        .await
        .with_context(|| format!("Failed to read {}", config.outcome_log_path.display()))?;

    let report = PerformanceReport::from(&records);
    println!("{}", report);
    println!(
        "({} successful, {} unsuccessful)",
        report.successful, report.unsuccessful
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let args = Args::parse();

    let mut config = BotConfig::from_env()?;
    if let Some(path) = args.log_path {
        config = config.with_outcome_log_path(path);
    }

    match args.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config = config.with_port(port);
            }
            let bot = build_bot(&config)?;
            flyme::server::serve(Arc::new(bot), config.port)
                .await
                .context("HTTP server failed")?;
        }
        Command::Chat => chat(build_bot(&config)?).await?,
        Command::Report => report(&config).await?,
    }

    Ok(())
}
