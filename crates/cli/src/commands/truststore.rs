use super::print_json;
use crate::cli::TruststoreCommand;
use crate::di::App;

pub async fn run(app: &App, command: TruststoreCommand, json: bool) -> anyhow::Result<()> {
    match command {
        TruststoreCommand::List { zone } => {
            let keys = app.use_cases.manage_keys.list_trusted(zone.as_deref()).await?;
            if json {
                return print_json(&keys);
            }
            for key in &keys {
                println!(
                    "{}\t{}\tvalidated={}\ttrusted={}\t{}\t{}",
                    key.zone, key.key_id, key.validated, key.trusted, key.source, key.key_rr
                );
            }
        }
    }
    Ok(())
}
