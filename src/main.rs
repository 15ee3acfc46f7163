use clap::Parser;
use serde_blocklist::utils::{logger, validation::Validate};
use serde_blocklist::{BlocklistConfig, CliConfig, TypeCatalog};
use std::collections::BTreeMap;

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match BlocklistConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            logger::init_cli_logger(None, cli.verbose);
            tracing::error!("❌ Failed to load {}: {}", cli.config.display(), e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };

    if cli.json_logs || config.json_logs() {
        logger::init_json_logger(config.log_level(), cli.verbose);
    } else {
        logger::init_cli_logger(config.log_level(), cli.verbose);
    }

    tracing::info!("Loaded blocklist '{}' from {}", config.name(), cli.config.display());
    if cli.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    // No types are linked into the CLI, so package and annotation rules resolve to nothing.
    let blocklist = match config.build(TypeCatalog::new()) {
        Ok(blocklist) => blocklist,
        Err(e) => {
            tracing::error!("❌ Failed to resolve blocklist: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };

    let checks: BTreeMap<&str, &str> = cli
        .checks
        .iter()
        .map(|name| {
            let verdict = if blocklist.is_blocked(name) || blocklist.is_path_blocked(name) {
                "blocked"
            } else {
                "allowed"
            };
            (name.as_str(), verdict)
        })
        .collect();

    let report = serde_json::json!({
        "name": config.name(),
        "blocked": blocklist.blocked_types().collect::<Vec<_>>(),
        "checks": checks,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    tracing::info!("✅ {} blocked types resolved", blocklist.len());
    Ok(())
}
