//! Query Router - Main Entry Point
//!
//! Loads configuration, builds the corpus index and the model-backed
//! capabilities, then answers queries from the command line.

use clap::{Parser, Subcommand};
use query_router::config::{QueryRouterConfig, DEFAULT_CONFIG_PATHS};
use query_router::error::RunError;
use query_router::llm::provider::LlmProvider;
use query_router::llm::providers::{OpenAiConfig, OpenAiProvider};
use query_router::llm::LlmGenerator;
use query_router::observability::logging::parse_spans_flag;
use query_router::observability::{init_default_logging, init_logging, metrics, LogFormat};
use query_router::orchestrator::Orchestrator;
use query_router::retrieval::{load_corpus, DocumentIndex};
use query_router::search::{AgenticSearchConfig, AgenticSearcher};
use query_router::tools::builtin::{WebSearchConfig, WebSearchTool};
use query_router::tools::ToolSet;
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{error, info, Level};

/// Route questions to math, local documents, or web search
#[derive(Parser)]
#[command(name = "query-router")]
#[command(about = "Route questions to math, local documents, or web search")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "QUERY_ROUTER_CONFIG")]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace); overrides LOG_LEVEL
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single query
    Ask {
        /// The question to answer
        query: String,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Read queries from stdin until "exit", "quit" or end of input
    Interactive,
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Also check that the LLM endpoint accepts the configured key
        #[arg(long)]
        check: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match verbosity_level(cli.verbose) {
        Some(level) => init_logging(
            level,
            LogFormat::parse(&env::var("LOG_FORMAT").unwrap_or_default()),
            parse_spans_flag(&env::var("LOG_SPANS").unwrap_or_default()),
        ),
        None => init_default_logging(),
    }

    info!("Starting query router v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Ask { query, json } => ask(&config, &query, json).await,
        Commands::Interactive => interactive(&config).await,
        Commands::Config { show, check } => handle_config_command(&config, show, check).await,
    };

    if let Err(e) = result {
        let message = e
            .downcast_ref::<RunError>()
            .map(RunError::sanitized_message)
            .unwrap_or_else(|| e.to_string());
        error!("Command failed: {}", message);
        eprintln!("Error: {message}");
        process::exit(1);
    }
}

fn verbosity_level(verbose: u8) -> Option<Level> {
    match verbose {
        0 => None,
        1 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    }
}

fn load_configuration(
    config_path: Option<&PathBuf>,
) -> Result<QueryRouterConfig, Box<dyn std::error::Error>> {
    let path = match config_path {
        Some(path) => path.clone(),
        None => QueryRouterConfig::find_config_file(&DEFAULT_CONFIG_PATHS)?,
    };

    info!("Loading configuration from: {}", path.display());
    Ok(QueryRouterConfig::load_from_file(&path)?)
}

/// Provider factory for creating LLM providers from configuration
struct LlmProviderFactory;

impl LlmProviderFactory {
    fn create_provider(
        config: &QueryRouterConfig,
    ) -> Result<Arc<dyn LlmProvider>, Box<dyn std::error::Error>> {
        match config.llm.provider.as_str() {
            "openai" => {
                let mut openai_config = OpenAiConfig {
                    api_key: config.get_llm_api_key()?,
                    timeout: config.llm.timeout(),
                    ..Default::default()
                };
                if let Some(base_url) = &config.llm.base_url {
                    openai_config.base_url = base_url.clone();
                }
                Ok(Arc::new(OpenAiProvider::new(openai_config)?))
            }
            provider => Err(format!("Unsupported LLM provider: {provider}").into()),
        }
    }
}

/// Bootstrap factory - builds the orchestrator with injected capabilities
fn build_orchestrator(
    config: &QueryRouterConfig,
) -> Result<Orchestrator, Box<dyn std::error::Error>> {
    let provider = LlmProviderFactory::create_provider(config)?;

    let generator = LlmGenerator::new(provider.clone(), config.llm.model.clone())
        .with_temperature(config.llm.temperature)
        .with_max_tokens(config.llm.max_tokens);

    let documents = load_corpus(&config.retrieval.corpus_dir, &config.retrieval.extension)?;
    let index = DocumentIndex::build(documents);

    let mut search_tool_config = WebSearchConfig {
        api_key: config.get_search_api_key()?,
        max_results: config.search.max_results,
        timeout: config.search.timeout(),
        ..Default::default()
    };
    if let Some(base_url) = &config.search.base_url {
        search_tool_config.base_url = base_url.clone();
    }
    let tools = ToolSet::new().with_tool(Arc::new(WebSearchTool::new(search_tool_config)?));

    let mut search_config = AgenticSearchConfig::new(config.llm.model.clone());
    search_config.temperature = Some(config.llm.temperature);
    search_config.max_tokens = config.llm.max_tokens;
    search_config.max_iterations = config.search.max_iterations;
    let searcher = AgenticSearcher::new(provider, tools, search_config);

    Ok(
        Orchestrator::from_capabilities(Arc::new(generator), Arc::new(index), Arc::new(searcher))
            .with_top_k(config.retrieval.top_k),
    )
}

async fn ask(
    config: &QueryRouterConfig,
    query: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let orchestrator = build_orchestrator(config)?;
    let outcome = orchestrator.run(query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("[{}] {}", outcome.handler_used, outcome.answer);
    }
    Ok(())
}

async fn interactive(config: &QueryRouterConfig) -> Result<(), Box<dyn std::error::Error>> {
    let orchestrator = build_orchestrator(config)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(query) = next_query(&mut lines).await? else {
            break;
        };

        match orchestrator.run(&query).await {
            Ok(outcome) => println!("[{}] {}", outcome.handler_used, outcome.answer),
            Err(e) => eprintln!("Error: {}", e.sanitized_message()),
        }
    }

    info!(
        metrics = %serde_json::to_string(&metrics().snapshot())?,
        "Interactive session finished"
    );
    Ok(())
}

/// Next non-blank line, or `None` at end of input or on "exit"/"quit"
async fn next_query<R>(lines: &mut Lines<R>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    while let Some(line) = lines.next_line().await? {
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
            return Ok(None);
        }
        return Ok(Some(query.to_string()));
    }
    Ok(None)
}

async fn handle_config_command(
    config: &QueryRouterConfig,
    show: bool,
    check: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(config)?);
    }

    if check {
        check_llm_provider(config).await?;
        println!("LLM provider '{}' is reachable", config.llm.provider);
    }

    info!("Configuration validation complete");
    Ok(())
}

/// Build the configured provider and run its health check
async fn check_llm_provider(config: &QueryRouterConfig) -> Result<(), Box<dyn std::error::Error>> {
    let provider = LlmProviderFactory::create_provider(config)?;
    provider.health_check().await?;
    info!(provider = provider.name(), "LLM provider health check passed");
    Ok(())
}
