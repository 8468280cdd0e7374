use super::print_json;
use crate::cli::DelegationCommand;
use crate::di::App;
use anyhow::bail;
use ferrous_dsync_domain::{DelegationSyncStatus, ResourceRecord};
use ferrous_dsync_jobs::{DelegationSyncResponse, SyncCommand};
use serde_json::json;

pub async fn run(app: &App, command: DelegationCommand, json: bool) -> anyhow::Result<()> {
    let (command, zone) = match command {
        DelegationCommand::Status { zone } => (SyncCommand::Status, zone),
        DelegationCommand::Sync { zone } => (SyncCommand::ExplicitSyncDelegation, zone),
        DelegationCommand::Setup { zone } => (SyncCommand::Setup, zone),
    };

    // Covers the analysis, a SETUP bootstrap and any UPDATE round trips
    let limit = app.config.delegation_sync.reply_timeout() * 4;
    let response = app.queues.syncher.request(command, &zone, limit).await?;

    if json {
        print_json(&response_json(&response))?;
    } else {
        print_response(&response);
    }
    if response.error {
        bail!("{} failed for {}: {}", command, zone, response.error_msg);
    }
    Ok(())
}

fn print_response(response: &DelegationSyncResponse) {
    if !response.message.is_empty() {
        println!("{}", response.message);
    }
    let Some(status) = &response.status else {
        return;
    };
    for rr in status.adds() {
        println!("  + {}", rr);
    }
    for rr in status.removes() {
        println!("  - {}", rr);
    }
    if let Some(result) = &status.update_result {
        for (target, outcome) in &result.targets {
            let rcode = outcome
                .rcode
                .map(|r| r.to_string())
                .unwrap_or_else(|| "no answer".to_string());
            println!("  {}: {}", target, rcode);
            if outcome.ede_found {
                println!("    EDE {}: {}", outcome.ede_code, outcome.ede_text);
            }
        }
    }
}

fn records(rrs: &[ResourceRecord]) -> Vec<String> {
    rrs.iter().map(|rr| rr.to_string()).collect()
}

fn status_json(status: &DelegationSyncStatus) -> serde_json::Value {
    json!({
        "parent": status.parent,
        "in_sync": status.in_sync,
        "time": status.time.to_rfc3339(),
        "adds": records(&status.adds()),
        "removes": records(&status.removes()),
        "update_result": status.update_result,
    })
}

fn response_json(response: &DelegationSyncResponse) -> serde_json::Value {
    json!({
        "zone": response.zone,
        "message": response.message,
        "error": response.error,
        "error_msg": response.error_msg,
        "status": response.status.as_ref().map(status_json),
    })
}
