//! Master-file reader for the zones this engine serves.
//!
//! Supports `$ORIGIN`, `$TTL`, `;` comments, parenthesised multi-line
//! records and owner inheritance from the previous record.

use super::MemoryZone;
use ferrous_dsync_domain::config::ZoneConfig;
use ferrous_dsync_domain::name::fqdn;
use ferrous_dsync_domain::rr::rdata::absolute_name;
use ferrous_dsync_domain::{DomainError, ResourceRecord};
use std::path::Path;
use tracing::info;

const DEFAULT_TTL: u32 = 3600;

/// Reads `config.file` and builds the zone with its configured options.
pub fn load_zone_file(config: &ZoneConfig) -> Result<MemoryZone, DomainError> {
    let path = Path::new(&config.file);
    let text = std::fs::read_to_string(path)
        .map_err(|e| DomainError::IoError(format!("cannot read {}: {}", path.display(), e)))?;
    let records = parse_zone(&text, &config.name)?;
    let count = records.len();
    let zone = MemoryZone::from_records(&config.name, config.options.clone(), records)?
        .with_parent_servers(config.parent_servers.clone())
        .with_multisigner_targets(config.multisigner_targets.clone());
    info!(zone = %fqdn(&config.name), records = count, file = %path.display(), "Zone loaded");
    Ok(zone)
}

pub fn parse_zone(text: &str, origin: &str) -> Result<Vec<ResourceRecord>, DomainError> {
    let mut origin = fqdn(origin);
    let mut default_ttl = DEFAULT_TTL;
    let mut last_owner: Option<String> = None;
    let mut records = Vec::new();

    for (line_no, entry) in logical_lines(text) {
        let located = |e: DomainError| {
            DomainError::InvalidRecord(format!("line {}: {}", line_no, e))
        };
        let trimmed = entry.trim();
        if let Some(rest) = trimmed.strip_prefix("$ORIGIN") {
            origin = absolute_name(rest.trim(), &origin);
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("$TTL") {
            default_ttl = parse_ttl(rest.trim()).map_err(located)?;
            continue;
        }
        if trimmed.starts_with('$') {
            return Err(located(DomainError::InvalidRecord(format!(
                "unsupported directive '{}'",
                trimmed
            ))));
        }

        let line = if entry.starts_with(char::is_whitespace) {
            let owner = last_owner.clone().ok_or_else(|| {
                located(DomainError::InvalidRecord(
                    "record without owner and no previous owner".to_string(),
                ))
            })?;
            format!("{} {}", owner, trimmed)
        } else {
            trimmed.to_string()
        };
        let line = with_numeric_ttl(&line).map_err(located)?;

        let rr = ResourceRecord::parse_with_origin(&line, &origin, default_ttl).map_err(located)?;
        last_owner = Some(rr.name.clone());
        records.push(rr);
    }
    Ok(records)
}

/// Strips comments and joins parenthesised continuations. Yields the
/// starting line number with each non-empty logical line.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut pending: Option<(usize, String)> = None;
    let mut depth = 0usize;

    for (idx, raw) in text.lines().enumerate() {
        let line = strip_comment(raw);
        let opens = line.matches('(').count();
        let closes = line.matches(')').count();
        let cleaned = line.replace(['(', ')'], " ");

        match pending.as_mut() {
            Some((_, buffer)) => {
                buffer.push(' ');
                buffer.push_str(cleaned.trim());
            }
            None => {
                if cleaned.trim().is_empty() {
                    continue;
                }
                pending = Some((idx + 1, cleaned.trim_end().to_string()));
            }
        }
        depth = (depth + opens).saturating_sub(closes);
        if depth == 0 {
            if let Some(done) = pending.take() {
                out.push(done);
            }
        }
    }
    if let Some(done) = pending {
        out.push(done);
    }
    out
}

fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => return &line[..i],
            _ => {}
        }
    }
    line
}

/// TTL with optional BIND unit suffixes (`1h30m`, `2d`).
fn parse_ttl(token: &str) -> Result<u32, DomainError> {
    if let Ok(value) = token.parse::<u32>() {
        return Ok(value);
    }
    let bad = || DomainError::InvalidRecord(format!("bad TTL '{}'", token));
    let mut total: u32 = 0;
    let mut digits = String::new();
    for c in token.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit = match c.to_ascii_lowercase() {
            's' => 1,
            'm' => 60,
            'h' => 3600,
            'd' => 86400,
            'w' => 604800,
            _ => return Err(bad()),
        };
        let value: u32 = digits.parse().map_err(|_| bad())?;
        total = total
            .checked_add(value.checked_mul(unit).ok_or_else(bad)?)
            .ok_or_else(bad)?;
        digits.clear();
    }
    if !digits.is_empty() {
        return Err(bad());
    }
    Ok(total)
}

/// Rewrites a unit-suffixed TTL in the owner/TTL/class prefix as seconds.
fn with_numeric_ttl(line: &str) -> Result<String, DomainError> {
    let mut tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
    for token in tokens.iter_mut().skip(1).take(2) {
        let starts_with_digit = token.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false);
        let has_unit = token.chars().any(|c| c.is_ascii_alphabetic());
        if starts_with_digit && has_unit && token.chars().all(|c| c.is_ascii_alphanumeric()) {
            *token = parse_ttl(token)?.to_string();
        }
    }
    Ok(tokens.join(" "))
}
