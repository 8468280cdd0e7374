//! Helpers for absolute, lower-case domain names.
//!
//! Names are kept as plain strings throughout the core; every name that
//! enters the system passes through [`fqdn`] so comparisons are plain
//! string equality.

use crate::DomainError;

/// Normalizes a name to lower case with a trailing dot.
pub fn fqdn(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed == "." {
        return ".".to_string();
    }
    let mut out = trimmed.to_ascii_lowercase();
    if !out.ends_with('.') {
        out.push('.');
    }
    out
}

/// Like [`fqdn`] but rejects names that could never appear on the wire.
pub fn parse_fqdn(name: &str) -> Result<String, DomainError> {
    let normalized = fqdn(name);
    if normalized == "." {
        return Ok(normalized);
    }
    if normalized.len() > 254 {
        return Err(DomainError::InvalidDomainName(format!(
            "'{}' exceeds 255 octets",
            name
        )));
    }
    for label in labels(&normalized) {
        if label.is_empty() {
            return Err(DomainError::InvalidDomainName(format!(
                "'{}' contains an empty label",
                name
            )));
        }
        if label.len() > 63 {
            return Err(DomainError::InvalidDomainName(format!(
                "label '{}' in '{}' exceeds 63 octets",
                label, name
            )));
        }
    }
    Ok(normalized)
}

/// Labels of an absolute name, leftmost first. The root has none.
pub fn labels(name: &str) -> Vec<&str> {
    let trimmed = name.trim_end_matches('.');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('.').collect()
}

pub fn label_count(name: &str) -> usize {
    labels(name).len()
}

/// Leftmost label and the remaining parent name, e.g.
/// `child.example.com.` → `("child", "example.com.")`.
pub fn split_first_label(name: &str) -> Option<(String, String)> {
    let name = fqdn(name);
    if name == "." {
        return None;
    }
    match name.split_once('.') {
        Some((first, "")) => Some((first.to_string(), ".".to_string())),
        Some((first, rest)) => Some((first.to_string(), rest.to_string())),
        None => None,
    }
}

/// The name with its leftmost label removed.
pub fn parent_guess(name: &str) -> Option<String> {
    split_first_label(name).map(|(_, parent)| parent)
}

/// True if `name` is `zone` or below it.
pub fn is_subdomain_of(name: &str, zone: &str) -> bool {
    let name = fqdn(name);
    let zone = fqdn(zone);
    if zone == "." {
        return true;
    }
    name == zone || name.ends_with(&format!(".{}", zone))
}

/// In-bailiwick nameserver: at or below the delegated zone.
pub fn is_in_bailiwick(ns_name: &str, zone: &str) -> bool {
    is_subdomain_of(ns_name, zone)
}

/// The labels of `name` that lie below `zone`, joined with dots.
/// `a.b.example.com.` under `example.com.` → `a.b`.
pub fn relative_to(name: &str, zone: &str) -> Option<String> {
    let name = fqdn(name);
    let zone = fqdn(zone);
    if name == zone || !is_subdomain_of(&name, &zone) {
        return None;
    }
    let keep = label_count(&name) - label_count(&zone);
    Some(labels(&name)[..keep].join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fqdn_normalizes_case_and_dot() {
        assert_eq!(fqdn("Child.Example.COM"), "child.example.com.");
        assert_eq!(fqdn("child.example.com."), "child.example.com.");
        assert_eq!(fqdn(""), ".");
    }

    #[test]
    fn test_split_first_label() {
        assert_eq!(
            split_first_label("child.example.com."),
            Some(("child".to_string(), "example.com.".to_string()))
        );
        assert_eq!(
            split_first_label("com."),
            Some(("com".to_string(), ".".to_string()))
        );
        assert_eq!(split_first_label("."), None);
    }

    #[test]
    fn test_bailiwick() {
        assert!(is_in_bailiwick("ns1.child.example.com.", "child.example.com."));
        assert!(!is_in_bailiwick("ns1.other.net.", "child.example.com."));
        assert!(!is_in_bailiwick("notchild.example.com.", "child.example.com."));
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(
            relative_to("a.b.example.com.", "example.com."),
            Some("a.b".to_string())
        );
        assert_eq!(relative_to("example.com.", "example.com."), None);
    }

    #[test]
    fn test_parse_fqdn_rejects_empty_label() {
        assert!(parse_fqdn("a..example.com").is_err());
    }
}
