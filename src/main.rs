use clap::Parser;
use serde_json::{json, Value};
use studio_content::config::cli::{Cli, Command, StdinConfirm};
use studio_content::domain::model::LoadReport;
use studio_content::domain::ports::ConfigProvider;
use studio_content::utils::error::{ContentError, ErrorSeverity, Result};
use studio_content::utils::{logger, validation::Validate};
use studio_content::{ContentSession, FileKvStore, SessionOptions, StorageClient, StudioConfig};

type Session = ContentSession<StorageClient, FileKvStore>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI args: {:?}", cli);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli.command, config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
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

fn load_config(cli: &Cli) -> Result<StudioConfig> {
    let mut config = match &cli.config {
        Some(path) => StudioConfig::from_file(path)?.with_env_overrides()?,
        None => StudioConfig::from_env()?,
    };
    if let Some(base_url) = cli.base_url.as_deref().filter(|s| !s.trim().is_empty()) {
        config.storage.base_url = Some(base_url.to_string());
    }

    config.validate()?;
    Ok(config)
}

async fn run(command: Command, config: StudioConfig) -> Result<()> {
    let backend = StorageClient::from_config(&config)?;
    let store = FileKvStore::new(config.draft_dir());
    let session = ContentSession::new(
        backend,
        store,
        SessionOptions {
            debounce: config.debounce(),
        },
    );

    let report = session.load().await?;
    tracing::debug!("Content loaded: {:?}", report);

    let outcome = execute(&session, &report, command).await;

    // 結束前把尚未寫入的草稿寫完
    session.close(true).await;
    outcome
}

async fn execute(session: &Session, report: &LoadReport, command: Command) -> Result<()> {
    match command {
        Command::Status => {
            let status = json!({
                "session": session.status(),
                "remote": report.remote,
                "draft_restored": report.draft_restored,
                "keys": report.keys,
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Show { path } => {
            let value = match path {
                Some(path) => session.get(&path).unwrap_or(Value::Null),
                None => session.snapshot().into_value(),
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Command::Get { path, default } => {
            println!("{}", session.get_str(&path, &default));
        }
        Command::Set { path, value, json } => {
            let value = if json {
                serde_json::from_str(&value)?
            } else {
                Value::String(value)
            };
            if !session.set(&path, value) {
                return Err(ContentError::InvalidContentPath { path });
            }
            println!("✅ {} updated in the local draft", path);
        }
        Command::SaveDraft => {
            let saved_at = session.save_draft().await?;
            println!("💾 Draft saved at {}", saved_at.to_rfc3339());
        }
        Command::Publish => {
            let receipt = session.publish().await?;
            println!(
                "✅ Published successfully! {} keys ({} bytes). Changes should be live momentarily.",
                receipt.keys, receipt.bytes
            );
        }
        Command::Discard { yes } => match session.discard(&StdinConfirm { assume_yes: yes }).await? {
            Some(reloaded) => println!("🗑️ Draft discarded; {} live keys loaded", reloaded.keys),
            None => println!("Discard cancelled"),
        },
        Command::Upload { file, prefix, key } => {
            let data = tokio::fs::read(&file).await?;
            let file_name = file
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| ContentError::UploadError {
                    message: format!("{} has no usable file name", file.display()),
                })?;

            let asset = session.upload_asset(&prefix, file_name, data).await?;
            if let Some(key) = key {
                if !session.set(&key, asset.public_url.clone()) {
                    return Err(ContentError::InvalidContentPath { path: key });
                }
                println!("✅ {} now points at the uploaded file", key);
            }
            println!("📁 {}", asset.public_url);
        }
    }

    Ok(())
}
