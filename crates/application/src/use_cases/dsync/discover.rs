use ferrous_dsync_domain::name::{fqdn, is_subdomain_of, parent_guess, relative_to, split_first_label};
use ferrous_dsync_domain::{
    DomainError, DsyncLookup, DsyncTarget, Rcode, RecordData, RecordType, ResourceRecord,
    SyncScheme,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::ports::{DnsMessenger, QueryResponse, ZoneData};

/// Locates the parent's DSYNC records and the parent zone itself.
pub struct DsyncDiscoveryUseCase {
    messenger: Arc<dyn DnsMessenger>,
    resolver: String,
}

impl DsyncDiscoveryUseCase {
    pub fn new(messenger: Arc<dyn DnsMessenger>, resolver: impl Into<String>) -> Self {
        Self {
            messenger,
            resolver: resolver.into(),
        }
    }

    /// Three-step walk:
    /// 1. `<label>._dsync.<guessed parent>`
    /// 2. the same owner under the true parent, if an authority SOA showed
    ///    the guess was wrong
    /// 3. `_dsync.<parent>`
    #[instrument(skip(self))]
    pub async fn discover(&self, child: &str) -> Result<DsyncLookup, DomainError> {
        let child = fqdn(child);
        let (label, guessed) =
            split_first_label(&child).ok_or_else(|| DomainError::DsyncDiscoveryFailed {
                zone: child.clone(),
                reason: "the root has no parent".to_string(),
            })?;

        let mut failures: Vec<String> = Vec::new();
        let mut parent = guessed.clone();

        let qname = dsync_owner(&label, &guessed);
        if let Some(resp) = self.exchange(&qname, &mut failures).await {
            if let Some(lookup) = found(&qname, &resp, &parent) {
                return Ok(lookup);
            }
            if let Some(owner) = learned_parent(&child, &resp) {
                if owner != guessed {
                    debug!(guessed = %guessed, parent = %owner, "Authority SOA revealed the parent");
                    parent = owner;
                }
            }
        }

        if parent != guessed {
            if let Some(prefix) = relative_to(&child, &parent) {
                let qname = dsync_owner(&prefix, &parent);
                if let Some(resp) = self.exchange(&qname, &mut failures).await {
                    if let Some(lookup) = found(&qname, &resp, &parent) {
                        return Ok(lookup);
                    }
                }
            }
        }

        let qname = dsync_owner("", &parent);
        if let Some(resp) = self.exchange(&qname, &mut failures).await {
            if let Some(lookup) = found(&qname, &resp, &parent) {
                return Ok(lookup);
            }
        }

        let reason = if failures.is_empty() {
            format!("no DSYNC records published by {}", parent)
        } else {
            failures.join("; ")
        };
        warn!(zone = %child, parent = %parent, reason = %reason, "DSYNC discovery failed");
        Err(DomainError::DsyncDiscoveryFailed {
            zone: child,
            reason,
        })
    }

    /// Picks the first DSYNC record matching `rrtype` and `scheme` and
    /// resolves its target to `addr:port` strings.
    #[instrument(skip(self))]
    pub async fn lookup_target(
        &self,
        child: &str,
        rrtype: RecordType,
        scheme: SyncScheme,
    ) -> Result<DsyncTarget, DomainError> {
        let lookup = self.discover(child).await?;
        self.resolve_target(child, &lookup, rrtype, scheme).await
    }

    pub async fn resolve_target(
        &self,
        child: &str,
        lookup: &DsyncLookup,
        rrtype: RecordType,
        scheme: SyncScheme,
    ) -> Result<DsyncTarget, DomainError> {
        let (rr, dsync) =
            lookup
                .find(rrtype, scheme)
                .ok_or_else(|| DomainError::NoDsyncTarget {
                    zone: fqdn(child),
                    scheme: scheme.to_string(),
                })?;

        let addresses = self.messenger.resolve_host(&dsync.target, dsync.port).await?;
        if addresses.is_empty() {
            return Err(DomainError::NoDsyncTarget {
                zone: fqdn(child),
                scheme: format!("{} (target {} has no addresses)", scheme, dsync.target),
            });
        }

        info!(
            zone = %child,
            scheme = %scheme,
            target = %dsync.target,
            addresses = ?addresses,
            "DSYNC target resolved"
        );

        Ok(DsyncTarget {
            name: dsync.target.clone(),
            scheme: dsync.scheme,
            port: dsync.port,
            addresses,
            rr: rr.clone(),
        })
    }

    /// Finds the zone that `child` is delegated from by asking for the SOA
    /// of successive ancestors.
    #[instrument(skip(self))]
    pub async fn find_parent(&self, child: &str) -> Result<String, DomainError> {
        let child = fqdn(child);
        let mut candidate = parent_guess(&child);
        while let Some(name) = candidate {
            match self
                .messenger
                .query(&self.resolver, &name, RecordType::SOA)
                .await
            {
                Ok(resp) => {
                    if let Some(owner) = resp.soa_owner() {
                        if owner != child && is_subdomain_of(&child, &owner) {
                            debug!(child = %child, parent = %owner, "Parent found");
                            return Ok(owner);
                        }
                    }
                }
                Err(e) => {
                    debug!(child = %child, name = %name, error = %e, "SOA lookup failed");
                }
            }
            if name == "." {
                break;
            }
            candidate = parent_guess(&name);
        }
        Err(DomainError::ParentUnknown(child))
    }

    /// The zone's memoized parent, discovering and storing it if unknown.
    pub async fn resolve_parent(&self, zone: &dyn ZoneData) -> Result<String, DomainError> {
        if let Some(parent) = zone.parent() {
            return Ok(parent);
        }
        let parent = self.find_parent(zone.name()).await?;
        zone.set_parent(&parent);
        Ok(parent)
    }

    async fn exchange(&self, qname: &str, failures: &mut Vec<String>) -> Option<QueryResponse> {
        match self
            .messenger
            .query(&self.resolver, qname, RecordType::DSYNC)
            .await
        {
            Ok(resp) => {
                if resp.rcode != Rcode::NOERROR && resp.rcode != Rcode::NXDOMAIN {
                    failures.push(format!("{}: {}", qname, resp.rcode));
                }
                Some(resp)
            }
            Err(e) => {
                failures.push(format!("{}: {}", qname, e));
                None
            }
        }
    }
}

fn dsync_owner(prefix: &str, parent: &str) -> String {
    let parent = fqdn(parent);
    let suffix = if parent == "." {
        String::new()
    } else {
        parent
    };
    if prefix.is_empty() {
        format!("_dsync.{}", suffix)
    } else {
        format!("{}._dsync.{}", prefix, suffix)
    }
}

fn found(qname: &str, resp: &QueryResponse, parent: &str) -> Option<DsyncLookup> {
    if resp.rcode != Rcode::NOERROR {
        return None;
    }
    let records: Vec<ResourceRecord> = resp
        .answers
        .iter()
        .filter(|rr| matches!(rr.data, RecordData::Dsync(_)))
        .cloned()
        .collect();
    if records.is_empty() {
        return None;
    }
    Some(DsyncLookup {
        qname: qname.to_string(),
        records,
        parent: parent.to_string(),
    })
}

/// SOA owner from a negative answer, if it is a proper ancestor of `child`.
fn learned_parent(child: &str, resp: &QueryResponse) -> Option<String> {
    if resp.rcode != Rcode::NOERROR && resp.rcode != Rcode::NXDOMAIN {
        return None;
    }
    resp.authority_soa_owner()
        .filter(|owner| owner != child && is_subdomain_of(child, owner))
}
