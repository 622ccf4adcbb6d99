use clap::Parser;
use ean_lookup::core::{expander, ingest};
use ean_lookup::core::ConfigProvider;
use ean_lookup::utils::{logger, validation::Validate};
use ean_lookup::{EanPipeline, EtlEngine, LocalStorage, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-ean")]
#[command(about = "EAN lookup driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "ean-lookup.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the input CSV from the config
    #[arg(long)]
    input: Option<String>,

    /// Dry run - parse the input and show the planned lookups without calling the registry
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based EAN lookup");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 套用命令列覆蓋設定
    if let Some(input) = args.input {
        tracing::info!("🔧 Input overridden to: {}", input);
        config.input.path = input;
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No registry calls will be made");
        perform_dry_run(&config)?;
        return Ok(());
    }

    let storage = LocalStorage::new(".");
    let pipeline = EanPipeline::new(storage, config)?;
    let outcome = EtlEngine::new(pipeline).run().await?;

    println!("✅ EAN lookup completed: {} records", outcome.records);
    println!("📁 Output saved to: {}", outcome.output_path);
    for address in &outcome.missing {
        eprintln!(
            "⚠️ No metering points found for {} {}",
            address.postal_code, address.street_number
        );
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig) {
    tracing::info!("📋 Configuration Summary:");
    tracing::info!("   Registry: {}", config.registry_endpoint());
    tracing::info!("   Input: {}", config.input_path());
    tracing::info!("   Output: {}", config.output_path());
    tracing::info!("   Concurrent requests: {}", config.concurrent_requests());
    tracing::info!("   Timeout: {:?}", config.request_timeout());
    tracing::info!("   Retry: {:?}", config.retry_policy());
    tracing::info!("   Missing policy: {:?}", config.missing_policy());
}

fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    let data = std::fs::read(config.input_path())?;
    let rows = ingest::parse_input_csv(&data)?;
    let tasks = expander::expand_rows(&rows);

    println!("🔍 {} rows → {} lookups", rows.len(), tasks.len());
    for task in tasks.iter().take(10) {
        println!(
            "   {} {} {} {}",
            task.product,
            task.key.postal_code,
            task.key.street_number,
            task.street_number_addition.as_deref().unwrap_or("-")
        );
    }
    if tasks.len() > 10 {
        println!("   ... and {} more", tasks.len() - 10);
    }

    Ok(())
}
