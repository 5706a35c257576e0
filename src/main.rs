//! 命令行入口
//!
//! 从夹具文件构造模拟后端，在其上执行一次翻译操作并打印结果。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use flaky_translator::env::describe_all;
use flaky_translator::translation::{
    ConfigManager, MockExternalApi, TranslationResult, TranslationService, TranslatorConfig,
};

#[derive(Parser)]
#[command(name = "flaky-translator")]
#[command(about = "Translate texts through a flaky simulated translation backend")]
#[command(version)]
struct Cli {
    /// Fixture with registered translations (.json or .toml)
    #[arg(short, long)]
    fixture: Option<PathBuf>,

    /// Configuration file (.toml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch whatever translation is available
    Free { text: String },

    /// Translate several texts at once, all or nothing
    Batch { texts: Vec<String> },

    /// Ask the backend to generate a translation (retried)
    Request { text: String },

    /// Fetch a translation meeting a minimum quality
    Premium {
        text: String,

        /// Minimum acceptable quality
        #[arg(short = 'q', long, default_value_t = 0.5)]
        min_quality: f64,
    },

    /// List supported environment variables
    Env,

    /// Write an example configuration file
    InitConfig { path: PathBuf },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::from_file(path),
        None => ConfigManager::new(),
    };
    let manager = match manager {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let config = manager.get_config().clone();

    init_tracing(&config);
    match manager.source() {
        Some(path) => tracing::info!("加载配置文件: {}", path.display()),
        None => tracing::info!("未找到配置文件，使用默认配置"),
    }

    match run(cli, config).await {
        Ok(output) => {
            for line in output {
                println!("{}", line);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(config: &TranslatorConfig) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli, config: TranslatorConfig) -> TranslationResult<Vec<String>> {
    match &cli.command {
        Commands::Env => {
            return Ok(describe_all()
                .into_iter()
                .map(|(name, description)| format!("{}\t{}", name, description))
                .collect());
        }
        Commands::InitConfig { path } => {
            ConfigManager::generate_example_config(path)?;
            return Ok(vec![format!("wrote {}", path.display())]);
        }
        _ => {}
    }

    let api = match &cli.fixture {
        Some(path) => MockExternalApi::from_fixture_file(path, config.mock_config())?,
        None => MockExternalApi::with_config(config.mock_config()),
    };
    let service = TranslationService::with_config(api, config.service_config());

    let output = match cli.command {
        Commands::Free { text } => vec![service.free(&text).await?],
        Commands::Batch { texts } => service.batch(texts.as_slice()).await?,
        Commands::Request { text } => {
            service.request(&text).await?;
            vec![format!("requested {}", text)]
        }
        Commands::Premium { text, min_quality } => vec![service.premium(&text, min_quality).await?],
        Commands::Env | Commands::InitConfig { .. } => Vec::new(),
    };

    tracing::debug!(stats = ?service.stats(), "完成");
    Ok(output)
}
