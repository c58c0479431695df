use clap::Parser;
use crs_convert::config::{Command, ListArgs, ListTarget};
use crs_convert::core::ConfigProvider;
use crs_convert::utils::error::ErrorSeverity;
use crs_convert::utils::logger;
use crs_convert::{
    Catalog, CliConfig, ConversionPipeline, ConversionRunner, ConverterSession, LocalStorage,
    Result, Role, TomlConfig, TransformationEngine,
};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting crs-convert");
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = run(&cli).await {
        tracing::error!(
            "❌ Conversion failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(cli: &CliConfig) -> Result<()> {
    let config = cli.resolve()?;
    let catalog = Arc::new(Catalog::from_paths(
        config.crs_catalog_path(),
        config.unit_catalog_path(),
    )?);

    match &cli.command {
        Command::List(args) => {
            list(ConverterSession::new(catalog), args);
            Ok(())
        }
        Command::Convert(_) => convert(catalog, config).await,
    }
}

fn list(session: ConverterSession, args: &ListArgs) {
    let picker = match args.axis {
        ListTarget::Horizontal => session.crs_picker(Role::InputHorizontal),
        ListTarget::Vertical => session.crs_picker(Role::InputVertical),
        ListTarget::Units => session.unit_picker(Role::InputHorizontal),
    };
    let query = args.filter.as_deref().unwrap_or("");

    let mut shown = 0;
    for candidate in picker.filter(query) {
        println!("{}", candidate.label);
        shown += 1;
    }
    tracing::info!("📋 {} of {} candidates", shown, picker.candidates().len());
}

async fn convert(catalog: Arc<Catalog>, config: TomlConfig) -> Result<()> {
    let mut session = ConverterSession::new(catalog);
    session.apply_config(&config)?;

    let geodesy = Arc::new(config.build_geodesy()?);
    let engine = TransformationEngine::new(geodesy, config.concurrency());
    let pipeline = ConversionPipeline::new(LocalStorage::new("."), config, &session, engine)?;

    let cancel = pipeline.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("🛑 Interrupt received, cancelling conversion");
            cancel.cancel();
        }
    });

    let runner = ConversionRunner::new(pipeline);
    let output_path = runner.run().await?;

    tracing::info!("✅ Conversion completed successfully!");
    println!("✅ Conversion completed successfully!");
    println!("📁 Output saved to: {}", output_path);
    Ok(())
}
