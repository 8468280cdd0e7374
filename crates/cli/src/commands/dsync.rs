use super::print_json;
use crate::cli::DsyncCommand;
use crate::di::App;
use serde_json::json;

pub async fn run(app: &App, command: DsyncCommand, json: bool) -> anyhow::Result<()> {
    match command {
        DsyncCommand::Discover { zone } => {
            let lookup = app.use_cases.dsync.discover(&zone).await?;
            if json {
                let records: Vec<String> = lookup.records.iter().map(|rr| rr.to_string()).collect();
                return print_json(&json!({
                    "zone": zone,
                    "parent": lookup.parent,
                    "qname": lookup.qname,
                    "schemes": lookup.schemes().iter().map(|s| s.to_string()).collect::<Vec<_>>(),
                    "records": records,
                }));
            }
            println!("Parent: {}", lookup.parent);
            if lookup.records.is_empty() {
                println!("No DSYNC records found");
                return Ok(());
            }
            println!("DSYNC RRset at {}:", lookup.qname);
            for rr in &lookup.records {
                println!("  {}", rr);
            }
        }
    }
    Ok(())
}
