use chrono::Local;
use clap::Parser;
use session_checkin::config::Command;
use session_checkin::core::ConfigProvider;
use session_checkin::utils::error::ErrorSeverity;
use session_checkin::utils::{logger, validation::normalize_dni, validation::Validate};
use session_checkin::{
    CheckinError, CliConfig, CsvSheetStore, ProcessLock, Registrar, RegistrarSettings,
    SystemClock, TomlConfig,
};
use serde::Serialize;

type CsvRegistrar = Registrar<CsvSheetStore, ProcessLock, SystemClock>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file is valid TOML");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.logging.json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("Resolved config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let registrar = build_registrar(&config);

    if let Err(e) = run(&registrar, cli.command).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());

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

    Ok(())
}

fn build_registrar(config: &TomlConfig) -> CsvRegistrar {
    let store = CsvSheetStore::with_files(config.data_dir(), config.store.files.clone());
    tracing::info!("📁 Reading sheets from {}", config.data_dir());
    Registrar::new(
        store,
        ProcessLock::new(),
        SystemClock,
        RegistrarSettings::from_config(config),
    )
}

fn now_iso() -> String {
    Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.3f")
        .to_string()
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CheckinError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(registrar: &CsvRegistrar, command: Command) -> Result<(), CheckinError> {
    match command {
        Command::Register {
            dni,
            session,
            timestamp,
        } => {
            let timestamp = timestamp.unwrap_or_else(now_iso);
            let outcome = registrar
                .register(&normalize_dni(&dni), &session, &timestamp)
                .await?;
            eprintln!("{}", outcome.message());
            print_json(&outcome)
        }
        Command::General { dni, timestamp } => {
            let timestamp = timestamp.unwrap_or_else(now_iso);
            let outcome = registrar
                .register_general(&normalize_dni(&dni), &timestamp)
                .await?;
            print_json(&outcome)
        }
        Command::Sessions => print_json(&registrar.list_sessions().await?),
        Command::Capacity => print_json(&registrar.session_capacity().await?),
        Command::Lookup { dni } => {
            let dni = normalize_dni(&dni);
            match registrar.attendee_summary(&dni).await? {
                Some(summary) => print_json(&summary),
                None => {
                    eprintln!("Attendee {} not found", dni);
                    print_json(&serde_json::Value::Null)
                }
            }
        }
        Command::Export { output } => {
            let csv = registrar.export_attendees().await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, csv)?;
                    tracing::info!("📁 Export saved to: {}", path);
                    Ok(())
                }
                None => {
                    print!("{}", csv);
                    Ok(())
                }
            }
        }
    }
}
