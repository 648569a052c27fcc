//! sqlchat - Chat with your SQL database in natural language.

use sqlchat::app::Orchestrator;
use sqlchat::cli::Cli;
use sqlchat::config::Config;
use sqlchat::error::Result;
use sqlchat::llm::{create_client, LlmService};
use sqlchat::logging;
use sqlchat::repl::LineSurface;
use sqlchat::session::Session;
use sqlchat::surface::{run_session, Surface};
use sqlchat::tui::Tui;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();

    if cli.plain {
        logging::init_stderr_logging();
    } else {
        logging::init_file_logging();
    }

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        eprintln!("{}: {}", e.category(), e.message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;

    // CLI arguments take precedence over the config file
    if let Some(provider) = &cli.llm {
        config.llm.provider = provider.clone();
    }
    if let Some(model) = &cli.model {
        config.llm.model = Some(model.clone());
    }
    let connection = cli.to_connection_config(&config.connection)?;

    let client = create_client(&config.llm)?;
    info!("Using LLM provider: {}", config.llm.provider);
    let orchestrator = Orchestrator::new(LlmService::new(client))
        .with_strip_code_fences(config.llm.strip_code_fences);

    let mut session = Session::new();
    if cli.wants_startup_connection() {
        info!("Connecting to {}", connection.display_string());
        orchestrator.connect(&mut session, &connection).await?;
    }

    let mut surface: Box<dyn Surface> = if cli.plain {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        Box::new(LineSurface::new(stdin, std::io::stdout(), connection))
    } else {
        Box::new(Tui::new(&connection)?)
    };

    let result = run_session(&orchestrator, surface.as_mut(), &mut session).await;

    // Restore the terminal before anything else is printed
    drop(surface);

    if let Err(e) = session.close().await {
        warn!("Error closing database connection: {e}");
    }

    result
}
