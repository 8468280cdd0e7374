use super::print_json;
use crate::cli::Sig0Command;
use crate::di::App;
use anyhow::bail;
use ferrous_dsync_application::ports::ZoneData;
use ferrous_dsync_jobs::{KeyLifecycleCommand, KeyLifecycleResponse};
use serde_json::json;

pub async fn run(app: &App, command: Sig0Command, json: bool) -> anyhow::Result<()> {
    match command {
        Sig0Command::Bootstrap { zone } => {
            let response = submit(app, KeyLifecycleCommand::Bootstrap, &zone).await?;
            let Some(outcome) = response.bootstrap else {
                bail!("key bootstrapper sent no bootstrap outcome for {}", zone);
            };
            if json {
                return print_json(&json!({
                    "zone": response.zone,
                    "parent": outcome.parent,
                    "key_id": outcome.key_id,
                    "generated": outcome.generated,
                    "result": outcome.result,
                }));
            }
            println!(
                "SIG(0) key {} of {} accepted by {}{}",
                outcome.key_id,
                response.zone,
                outcome.parent,
                if outcome.generated { " (newly generated)" } else { "" }
            );
        }
        Sig0Command::Rollover { zone, action } => {
            let response = submit(app, KeyLifecycleCommand::Rollover(action), &zone).await?;
            let Some(outcome) = response.rollover else {
                bail!("key bootstrapper sent no rollover outcome for {}", zone);
            };
            if json {
                return print_json(&json!({
                    "zone": response.zone,
                    "old_key_id": outcome.old_key_id,
                    "new_key_id": outcome.new_key_id,
                    "completed": outcome.completed,
                }));
            }
            if outcome.completed {
                println!(
                    "Rollover of {} complete: key {} replaced key {}",
                    response.zone, outcome.new_key_id, outcome.old_key_id
                );
            } else {
                println!(
                    "Key {} of {} added at the parent; key {} is still active",
                    outcome.new_key_id, response.zone, outcome.old_key_id
                );
            }
        }
        Sig0Command::Publish { zone } => {
            let zone = app.zone(&zone)?;
            let changed = app.use_cases.publish.execute(zone.as_ref()).await?;
            if json {
                return print_json(&json!({ "zone": zone.name(), "changed": changed }));
            }
            if changed {
                println!("Published the SIG(0) KEY of {}", zone.name());
            } else {
                println!("SIG(0) KEY of {} already published", zone.name());
            }
        }
    }
    Ok(())
}

/// Hands the work to the key bootstrapper and waits for its reply.
async fn submit(
    app: &App,
    command: KeyLifecycleCommand,
    zone: &str,
) -> anyhow::Result<KeyLifecycleResponse> {
    let zone = app.zone(zone)?;
    // A rollover is two UPDATE round trips plus a zone republish
    let limit = app.config.delegation_sync.reply_timeout() * 4;
    let response = app
        .queues
        .key_lifecycle
        .request(command, zone.name(), limit)
        .await?;
    if response.error {
        bail!("{} failed for {}: {}", command, zone.name(), response.error_msg);
    }
    Ok(response)
}
