use std::process::ExitCode;
use tokio::sync::mpsc;

use super::render::{render_history, render_report};
use crate::client::{HistoryClient, SessionDriver, ValidationTui};
use crate::core::{HistoryView, SessionState};
use crate::utils::log_capture::LogEntry;
use crate::{Config, Result};

pub async fn run_tui(config: Config, log_rx: mpsc::UnboundedReceiver<LogEntry>) -> Result<ExitCode> {
    tracing::info!(
        "Starting deckcheck UI against {}:{}",
        config.service.host,
        config.service.port
    );

    let mut tui = ValidationTui::new(&config)?;

    if let Err(e) = tui.run(log_rx).await {
        tracing::error!("TUI error: {}", e);
        return Err(e);
    }

    Ok(ExitCode::SUCCESS)
}

/// Run one session headlessly. Exits non-zero when the session fails or the
/// deck is not legal.
pub async fn validate_deck(config: Config, raw: String) -> Result<ExitCode> {
    let mut driver = SessionDriver::new(&config);
    if !driver.submit(&raw) {
        anyhow::bail!("No deck ID in '{}'", raw);
    }
    if let SessionState::Connecting { deck, .. } = driver.state() {
        eprintln!("🔍 Checking deck {}...", deck);
    }

    let state = driver
        .run_until_settled(|status| eprintln!("   … {}", status))
        .await;

    let code = match state {
        SessionState::Settled(report) => {
            print!("{}", render_report(report));
            if report.is_valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        SessionState::Failed(message) => {
            eprintln!("❌ {}", message);
            ExitCode::FAILURE
        }
        other => {
            tracing::error!("Session ended without a verdict: {:?}", other);
            ExitCode::FAILURE
        }
    };

    driver.shutdown().await;
    Ok(code)
}

pub async fn show_history(config: Config, index: Option<usize>) -> Result<ExitCode> {
    let client = HistoryClient::from_config(&config)?;
    let mut view = HistoryView::new();
    view.load(client.list().await);

    match index {
        None => {
            println!("🕑 Recent Analyses");
            print!("{}", render_history(view.entries()));
            Ok(ExitCode::SUCCESS)
        }
        Some(position) => {
            let Some(report) = position.checked_sub(1).and_then(|i| view.select(i)) else {
                eprintln!(
                    "❌ No history entry {} ({} available)",
                    position,
                    view.entries().len()
                );
                return Ok(ExitCode::FAILURE);
            };
            print!("{}", render_report(report));
            Ok(ExitCode::SUCCESS)
        }
    }
}

pub fn show_config(config: Config, save: bool) -> Result<ExitCode> {
    print!("{}", toml::to_string_pretty(&config)?);
    if save {
        let path = config.save()?;
        println!("✅ Saved to {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_validate_without_deck_id_is_error() {
        let err = validate_deck(Config::default(), "   ".to_string()).await.unwrap_err();
        assert!(err.to_string().contains("No deck ID"));
    }

    #[test]
    fn test_show_config_without_save() {
        assert_eq!(show_config(Config::default(), false).unwrap(), ExitCode::SUCCESS);
    }
}
