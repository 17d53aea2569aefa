use clap::{Parser, Subcommand};
use std::path::Path;
use std::process::ExitCode;

use modbot::infrastructure::adapters::ConsoleGateway;
use modbot::infrastructure::config::Config;
use modbot::infrastructure::plugins::{PluginDescriptor, PluginLoader};
use modbot::{Bot, BotError};

#[derive(Parser)]
#[command(name = "modbot")]
#[command(about = "A plugin-extensible chat bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot on the console gateway
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
    /// List plugin modules in the plugin directory
    Plugins {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => run_bot(&cli.config),
        Commands::Version => {
            println!("modbot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
        Commands::Plugins { json } => list_plugins(&cli.config, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(config_path: &str) -> Config {
    if Path::new(config_path).exists() {
        Config::load(config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    }
}

fn run_bot(config_path: &str) -> Result<(), BotError> {
    let config = load_config(config_path);
    let bot = Bot::new(config)?;
    let gateway = ConsoleGateway::new(bot.config().bot.name.clone());

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        bot.start()?;
        bot.run(&gateway).await
    })
}

fn init_config() -> Result<(), BotError> {
    let yaml = Config::default().to_yaml()?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}

#[derive(serde::Serialize)]
struct ModuleListing {
    path: String,
    #[serde(flatten)]
    descriptor: Option<PluginDescriptor>,
    error: Option<String>,
}

fn list_plugins(config_path: &str, json: bool) -> Result<(), BotError> {
    let config = load_config(config_path);
    let loader = PluginLoader::new(config.plugins.directory.clone());

    let listings: Vec<ModuleListing> = loader
        .discover()?
        .into_iter()
        .map(|path| {
            let (descriptor, error) = match loader.read_descriptor(&path) {
                Ok(d) => (Some(d), None),
                Err(e) => (None, Some(e.to_string())),
            };
            ModuleListing {
                path: path.display().to_string(),
                descriptor,
                error,
            }
        })
        .collect();

    if json {
        let out = serde_json::to_string_pretty(&listings)
            .map_err(|e| BotError::Internal(format!("Failed to encode listing: {}", e)))?;
        println!("{}", out);
        return Ok(());
    }

    if listings.is_empty() {
        println!("No plugin modules in {}", loader.plugin_dir().display());
    }
    for listing in &listings {
        match (&listing.descriptor, &listing.error) {
            (Some(d), _) => println!("{} {} - {} ({})", d.name, d.version, d.description, listing.path),
            (None, Some(e)) => println!("{}: {}", listing.path, e),
            (None, None) => println!("{}", listing.path),
        }
    }
    Ok(())
}
