//! Interactive session: one realtime client driven from stdin, events printed as they
//! arrive.

use crate::commands::{self, HELP, PromptCommand};
use crate::error::CliError;
use crate::settings::Settings;

use realtime_core::events::{GeneralProgressInfo, ProgressInfo, RecommendationResult};
use realtime_core::{ConnectionState, RealtimeClient, RealtimeError, RealtimeListener};

use std::sync::Arc;

use log::{error, info, warn};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader, stdin};

/// Prints every event kind to the log.
#[derive(Debug, Default)]
pub struct ConsoleListener;

impl RealtimeListener for ConsoleListener {
    fn on_state_change(&self, from: ConnectionState, to: ConnectionState) {
        info!("state: {from} -> {to}");
    }

    fn on_authenticated(&self) {
        info!("authenticated");
    }

    fn on_ocr_progress(&self, progress: &ProgressInfo) {
        info!("ocr: {}", describe_progress(progress));
    }

    fn on_ocr_result(&self, data: &Value) {
        let text = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
        info!("ocr result:\n{text}");
    }

    fn on_ocr_error(&self, error: &RealtimeError) {
        warn!("ocr failed: {}", error.message());
    }

    fn on_recommendation_progress(&self, progress: &ProgressInfo) {
        info!("recommendation: {}", describe_progress(progress));
    }

    fn on_recommendation_result(&self, result: &RecommendationResult) {
        info!("{} (total {})", result.reason, result.total_count);
        for recipe in &result.recipes {
            info!(
                "  {} [{}] {} min, {}% match",
                recipe.title, recipe.difficulty, recipe.cook_time_minutes, recipe.match_percentage
            );
        }
    }

    fn on_recommendation_error(&self, error: &RealtimeError) {
        warn!("recommendation failed: {}", error.message());
    }

    fn on_general_progress(&self, progress: &GeneralProgressInfo) {
        info!("{:.0}% {}", progress.percent, progress.message);
    }

    fn on_general_error(&self, error: &RealtimeError) {
        warn!("server error: {}", error.message());
    }

    fn on_token_expired(&self, error: &RealtimeError) {
        warn!("{} (use 'token <new-token>')", error.message());
    }

    fn on_connection_error(&self, error: &RealtimeError) {
        error!("connection: {error}");
    }

    fn on_unknown_message(&self, kind: &str) {
        info!("ignoring unknown '{kind}' frame");
    }
}

pub fn describe_progress(progress: &ProgressInfo) -> String {
    if progress.total_steps > 0 {
        format!(
            "step {}/{} ({:.0}%) {}",
            progress.current_step,
            progress.total_steps,
            progress.percentage,
            progress.step_description
        )
    } else {
        format!("{:.0}% {}", progress.percentage, progress.step_description)
    }
}

/// Connect and serve prompt commands until `quit`, end of input or Ctrl-C.
///
/// # Errors
///
/// Returns [`CliError`] if the client cannot be created, the first connect fails or stdin
/// cannot be read.
pub async fn run(settings: Settings) -> Result<(), CliError> {
    let params = settings.connection_params()?;
    info!("Realtime endpoint: {}", params.log_safe_url());

    let mut slot: Option<RealtimeClient> = None;
    let client = RealtimeClient::replace(&mut slot, params).await?;
    client.set_listener(Arc::new(ConsoleListener));
    client.connect().await?;

    println!("{HELP}");

    let mut lines = BufReader::new(stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line
                .map_err(|e| CliError::cli(format!("Failed to read stdin: {e}")))?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        };

        let Some(line) = line else {
            break;
        };

        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };

        if !execute(client, command).await {
            break;
        }
    }

    if let Some(client) = slot.take() {
        client.shutdown().await;
    }
    info!("Realtime CLI stopped");
    Ok(())
}

/// Returns false when the session should end.
async fn execute(client: &RealtimeClient, command: PromptCommand) -> bool {
    match command {
        PromptCommand::Connect => {
            if let Err(e) = client.connect().await {
                error!("connect failed: {e}");
            }
        }
        PromptCommand::Disconnect => client.disconnect(),
        PromptCommand::Ocr { image_url } => client.request_ocr(image_url),
        PromptCommand::Recommend => client.request_recommendations(),
        PromptCommand::Token(token) => client.update_token(token),
        PromptCommand::State => println!("{}", client.state()),
        PromptCommand::Progress => {
            let snapshot = client.progress();
            match (&snapshot.ocr, &snapshot.recommendation) {
                (None, None) => println!("nothing in flight"),
                (ocr, recommendation) => {
                    if let Some(ocr) = ocr {
                        println!("ocr: {}", describe_progress(ocr));
                    }
                    if let Some(recommendation) = recommendation {
                        println!("recommendation: {}", describe_progress(recommendation));
                    }
                }
            }
        }
        PromptCommand::Help => println!("{HELP}"),
        PromptCommand::Quit => return false,
    }
    true
}
