use super::print_json;
use crate::cli::{AddArgs, GenerateArgs, KeyCommand, KeystoreKind};
use crate::di::App;
use anyhow::{anyhow, bail};
use ferrous_dsync_domain::keys::{mask_private_key, DNSKEY_FLAGS_KSK, DNSKEY_FLAGS_ZSK};
use ferrous_dsync_domain::rr::KeyRdata;
use ferrous_dsync_domain::{Algorithm, DnssecKeyRecord, ResourceRecord, Sig0KeyRecord};

const CREATOR: &str = "cli";

pub async fn run(app: &App, kind: KeystoreKind, json: bool) -> anyhow::Result<()> {
    match kind {
        KeystoreKind::Sig0 { command } => sig0(app, command, json).await,
        KeystoreKind::Dnssec { command } => dnssec(app, command, json).await,
    }
}

async fn sig0(app: &App, command: KeyCommand, json: bool) -> anyhow::Result<()> {
    let keys = &app.use_cases.manage_keys;
    match command {
        KeyCommand::List { zone } => {
            let list = keys.list_sig0(zone.as_deref()).await?;
            if json {
                return print_json(&list);
            }
            for key in &list {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    key.zone, key.key_id, key.algorithm, key.state, key.key_rr
                );
            }
        }
        KeyCommand::Generate(args) => {
            if args.ksk {
                bail!("--ksk only applies to DNSSEC keys");
            }
            let algorithm = algorithm(app, &args)?;
            let mut record = keys
                .generate_sig0(&args.zone, algorithm, args.state, CREATOR)
                .await?;
            record.private_key = mask_private_key(&record.private_key);
            if json {
                return print_json(&record);
            }
            println!("Generated SIG(0) key {} for {} ({})", record.key_id, record.zone, record.state);
            println!("{}", record.key_rr);
        }
        KeyCommand::Add(args) => {
            let key = parse_key(&args)?;
            let record = Sig0KeyRecord {
                zone: args.zone.clone(),
                state: args.state,
                key_id: key.key_tag(),
                algorithm: key.algorithm,
                creator: CREATOR.to_string(),
                private_key: args.private_key.clone(),
                key_rr: args.key_rr.clone(),
            };
            keys.add_sig0(&record).await?;
            println!("Imported SIG(0) key {} for {}", record.key_id, record.zone);
        }
        KeyCommand::Setstate {
            zone,
            key_id,
            state,
        } => {
            let rows = keys.set_sig0_state(&zone, key_id, state).await?;
            report_change(rows, &zone, key_id, &format!("is now {}", state));
        }
        KeyCommand::Delete { zone, key_id } => {
            let rows = keys.delete_sig0(&zone, key_id).await?;
            report_change(rows, &zone, key_id, "deleted");
        }
    }
    Ok(())
}

async fn dnssec(app: &App, command: KeyCommand, json: bool) -> anyhow::Result<()> {
    let keys = &app.use_cases.manage_keys;
    match command {
        KeyCommand::List { zone } => {
            let list = keys.list_dnssec(zone.as_deref()).await?;
            if json {
                return print_json(&list);
            }
            for key in &list {
                let role = if key.is_ksk() { "KSK" } else { "ZSK" };
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    key.zone, key.key_id, role, key.algorithm, key.state, key.key_rr
                );
            }
        }
        KeyCommand::Generate(args) => {
            let algorithm = algorithm(app, &args)?;
            let flags = if args.ksk {
                DNSKEY_FLAGS_KSK
            } else {
                DNSKEY_FLAGS_ZSK
            };
            let mut record = keys
                .generate_dnssec(&args.zone, flags, algorithm, args.state, CREATOR)
                .await?;
            record.private_key = mask_private_key(&record.private_key);
            if json {
                return print_json(&record);
            }
            println!(
                "Generated DNSSEC {} {} for {} ({})",
                if record.is_ksk() { "KSK" } else { "ZSK" },
                record.key_id,
                record.zone,
                record.state
            );
            println!("{}", record.key_rr);
        }
        KeyCommand::Add(args) => {
            let key = parse_key(&args)?;
            let record = DnssecKeyRecord {
                zone: args.zone.clone(),
                state: args.state,
                key_id: key.key_tag(),
                flags: key.flags,
                algorithm: key.algorithm,
                creator: CREATOR.to_string(),
                private_key: args.private_key.clone(),
                key_rr: args.key_rr.clone(),
            };
            keys.add_dnssec(&record).await?;
            println!("Imported DNSSEC key {} for {}", record.key_id, record.zone);
        }
        KeyCommand::Setstate {
            zone,
            key_id,
            state,
        } => {
            let rows = keys.set_dnssec_state(&zone, key_id, state).await?;
            report_change(rows, &zone, key_id, &format!("is now {}", state));
        }
        KeyCommand::Delete { zone, key_id } => {
            let rows = keys.delete_dnssec(&zone, key_id).await?;
            report_change(rows, &zone, key_id, "deleted");
        }
    }
    Ok(())
}

fn algorithm(app: &App, args: &GenerateArgs) -> anyhow::Result<Algorithm> {
    match args.algorithm {
        Some(algorithm) if !algorithm.supports_keygen() => {
            bail!("{} cannot be used for key generation", algorithm)
        }
        Some(algorithm) => Ok(algorithm),
        None => Ok(app.config.keygen.algorithm()?),
    }
}

fn parse_key(args: &AddArgs) -> anyhow::Result<KeyRdata> {
    let rr: ResourceRecord = args.key_rr.parse()?;
    rr.data
        .as_key()
        .cloned()
        .ok_or_else(|| anyhow!("'{}' is not a KEY or DNSKEY record", args.key_rr))
}

fn report_change(rows: u64, zone: &str, key_id: u16, what: &str) {
    if rows == 0 {
        println!("No change: key {} of {} not found or already in that state", key_id, zone);
    } else {
        println!("Key {} of {} {}", key_id, zone, what);
    }
}
