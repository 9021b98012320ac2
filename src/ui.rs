// UI layer: command handlers for the CLI. Each one calls into the library,
// shows a spinner while the network is busy and prints the outcome.

use crate::api::{self, MediaClient};
use crate::config::UploadMode;
use crate::error::Error;
use crate::strategy;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

fn spinner(msg: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Resolve and upload `source`, then print id, URL and strategy.
pub fn run_upload(
    client: &MediaClient,
    source: &str,
    mode: Option<UploadMode>,
    json: bool,
) -> Result<()> {
    let mode = mode.unwrap_or_else(|| client.config().mode());
    let pb = spinner("Uploading...");
    let outcome = strategy::upload_with_mode(client, source, mode);
    pb.finish_and_clear();

    let result = outcome.with_context(|| format!("Upload of {source} failed"))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Upload OK ({})", result.strategy);
        println!("  id:  {}", result.id);
        println!("  url: {}", result.source_url);
    }
    Ok(())
}

/// Probe `users/me` and print who the credentials belong to.
pub fn run_whoami(client: &MediaClient, json: bool) -> Result<()> {
    let pb = spinner("Checking credentials...");
    let outcome = client.whoami();
    pb.finish_and_clear();

    match outcome {
        Ok(profile) if json => println!("{}", serde_json::to_string_pretty(&profile)?),
        Ok(profile) => {
            println!("Authenticated as {} (id {})", profile.name, profile.id);
            if !profile.roles.is_empty() {
                println!("  roles: {}", profile.roles.join(", "));
            }
        }
        Err(Error::Auth { status, body }) => {
            anyhow::bail!("Credentials rejected: {} - {}", status, body)
        }
        Err(e) => return Err(e).context("Credential check failed"),
    }
    Ok(())
}

pub fn print_health() -> Result<()> {
    println!("{}", serde_json::to_string(&api::health())?);
    Ok(())
}
