use anyhow::Result;
use hestia::kraken::resolve_account_number;
use hestia::logging::{LogContext, get_logger_with_context, init_logging};
use hestia::{Config, KrakenClient, metrics};
use std::time::Duration;
use tracing::{error, info, warn};

fn load_config() -> Result<Config> {
    let config = match std::env::var("HESTIA_CONFIG") {
        Ok(path) if !path.trim().is_empty() => Config::from_file(path.trim())?,
        _ => Config::load()?,
    };
    Ok(config.with_env_overrides())
}

/// Refresh once and print the metrics; `Err` only for failures needing new credentials
async fn cycle(client: &KrakenClient, account_number: &str) -> hestia::Result<()> {
    match client.refresh(account_number).await {
        Ok(snapshot) => {
            let local_time = chrono::Utc::now().with_timezone(&client.timezone()).time();
            let metrics = metrics::flatten(&snapshot, local_time);
            match serde_json::to_string_pretty(&metrics) {
                Ok(json) => println!("{}", json),
                Err(e) => error!("Cannot serialize metrics: {}", e),
            }
            Ok(())
        }
        Err(e) if e.requires_reauth() => Err(e),
        Err(e) => {
            warn!("{}; retrying on next tick", e);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    config.validate()?;
    init_logging(&config.logging)?;

    info!("Hestia {} starting up", env!("APP_VERSION"));

    let once = std::env::args().skip(1).any(|a| a == "--once");
    let client = KrakenClient::new(&config);

    if !client.authenticate().await {
        client.close().await;
        anyhow::bail!("Authentication failed, check the configured credentials");
    }

    let accounts = client.get_accounts().await?;
    let Some(account_number) = resolve_account_number(&accounts, &config.account.account_number)
    else {
        client.close().await;
        anyhow::bail!("No account visible to this login");
    };
    let logger = get_logger_with_context(LogContext::new("main").with_account(&account_number));
    logger.info("Using account");

    let minutes = config.scan_interval_minutes.clamp(1, 60);
    let mut ticker = tokio::time::interval(Duration::from_secs(minutes * 60));

    let outcome = loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = cycle(&client, &account_number).await {
                    break Err(e);
                }
                if once {
                    break Ok(());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                logger.info("Interrupted, shutting down");
                break Ok(());
            }
        }
    };

    client.close().await;
    match outcome {
        Ok(()) => {
            info!("Shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("Stopping: {}", e);
            Err(anyhow::anyhow!("Re-authentication required: {}", e))
        }
    }
}
