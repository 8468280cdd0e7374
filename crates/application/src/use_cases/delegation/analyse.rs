use ferrous_dsync_domain::{
    DelegationSyncStatus, DomainError, Rcode, RecordType, ResourceRecord,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::changes::{apex_records, glue_hosts};
use crate::ports::{DnsMessenger, ZoneData, ZoneStore};
use crate::services::rrset_differ;
use crate::use_cases::dsync::DsyncDiscoveryUseCase;

/// Compares the child's apex NS and glue with what the parent publishes.
pub struct AnalyseDelegationUseCase {
    messenger: Arc<dyn DnsMessenger>,
    zones: Arc<dyn ZoneStore>,
    dsync: Arc<DsyncDiscoveryUseCase>,
    resolver: String,
}

/// Parent-side view of the delegation.
struct ParentView {
    ns: Vec<ResourceRecord>,
    a: Vec<ResourceRecord>,
    aaaa: Vec<ResourceRecord>,
}

impl AnalyseDelegationUseCase {
    pub fn new(
        messenger: Arc<dyn DnsMessenger>,
        zones: Arc<dyn ZoneStore>,
        dsync: Arc<DsyncDiscoveryUseCase>,
        resolver: impl Into<String>,
    ) -> Self {
        Self {
            messenger,
            zones,
            dsync,
            resolver: resolver.into(),
        }
    }

    /// Returns the NS and glue differences between child and parent.
    ///
    /// The parent's data comes from the local zone store when the parent
    /// is served here, otherwise from the parent's nameservers. DNSKEY
    /// changes are never reported by this analysis.
    ///
    /// # Errors
    ///
    /// * `DomainError::ParentUnknown` - if the parent cannot be found
    /// * `DomainError::DsyncDiscoveryFailed` - if no parent nameserver
    ///   answered at all, or none answered a glue query
    #[instrument(skip(self, zone), fields(zone = %zone.name()))]
    pub async fn execute(&self, zone: &dyn ZoneData) -> Result<DelegationSyncStatus, DomainError> {
        let child = zone.name().to_string();
        let parent = self.dsync.resolve_parent(zone).await?;

        let child_ns = apex_records(zone, RecordType::NS);

        let view = match self.zones.get(&parent) {
            Some(parent_zone) => {
                debug!(parent = %parent, "Parent served locally");
                local_view(parent_zone.as_ref(), &child)
            }
            None => self.remote_view(zone, &parent, &child_ns).await?,
        };

        let mut status = DelegationSyncStatus::new(&child, &parent);

        let ns = rrset_differ(&child, &child_ns, &view.ns, RecordType::NS);
        status.ns_adds = ns.adds;
        status.ns_removes = ns.removes;

        let hosts = glue_hosts(&child, child_ns.iter());
        let child_a = child_glue(zone, &hosts, RecordType::A);
        let child_aaaa = child_glue(zone, &hosts, RecordType::AAAA);

        let a = rrset_differ(&child, &child_a, &view.a, RecordType::A);
        status.a_adds = a.adds;
        status.a_removes = a.removes;

        let aaaa = rrset_differ(&child, &child_aaaa, &view.aaaa, RecordType::AAAA);
        status.aaaa_adds = aaaa.adds;
        status.aaaa_removes = aaaa.removes;

        status.update_in_sync();
        info!(
            parent = %parent,
            in_sync = status.in_sync,
            changes = %status.summary(),
            "Delegation analysed"
        );
        Ok(status)
    }

    async fn remote_view(
        &self,
        zone: &dyn ZoneData,
        parent: &str,
        child_ns: &[ResourceRecord],
    ) -> Result<ParentView, DomainError> {
        let child = zone.name();
        let servers = self.parent_servers(zone, parent).await?;

        let mut responded: Option<String> = None;
        let mut parent_ns: Vec<ResourceRecord> = Vec::new();
        for server in &servers {
            match self.messenger.query(server, child, RecordType::NS).await {
                Ok(resp) => {
                    if responded.is_none() {
                        responded = Some(server.clone());
                    }
                    let ns = resp.records_anywhere(child, RecordType::NS);
                    if !ns.is_empty() {
                        responded = Some(server.clone());
                        parent_ns = ns;
                        break;
                    }
                }
                Err(e) => {
                    warn!(server = %server, error = %e, "Parent nameserver did not answer");
                }
            }
        }

        let server = responded.ok_or_else(|| DomainError::DsyncDiscoveryFailed {
            zone: child.to_string(),
            reason: format!("no nameserver of {} answered", parent),
        })?;
        if parent_ns.is_empty() {
            warn!(parent = %parent, "Parent publishes no delegation");
        }

        // The server that answered NS goes first for glue.
        let mut glue_servers = vec![server.clone()];
        glue_servers.extend(servers.into_iter().filter(|s| *s != server));

        // Glue is asked for every in-bailiwick host on either side so a
        // stale parent-only host shows up as a removal.
        let hosts = glue_hosts(child, child_ns.iter().chain(&parent_ns));
        let mut a = Vec::new();
        let mut aaaa = Vec::new();
        for host in &hosts {
            a.extend(self.parent_glue(child, &glue_servers, host, RecordType::A).await?);
            aaaa.extend(self.parent_glue(child, &glue_servers, host, RecordType::AAAA).await?);
        }

        Ok(ParentView {
            ns: parent_ns,
            a,
            aaaa,
        })
    }

    /// Glue for `host` from the first server that gives a real answer.
    /// NXDOMAIN counts as an answer; a timeout or an error rcode moves on
    /// to the next server.
    async fn parent_glue(
        &self,
        child: &str,
        servers: &[String],
        host: &str,
        rtype: RecordType,
    ) -> Result<Vec<ResourceRecord>, DomainError> {
        let mut failures = Vec::new();
        for server in servers {
            match self.messenger.query(server, host, rtype).await {
                Ok(resp) if resp.rcode == Rcode::NOERROR || resp.rcode == Rcode::NXDOMAIN => {
                    return Ok(resp.records_anywhere(host, rtype));
                }
                Ok(resp) => {
                    warn!(server = %server, host = %host, rtype = %rtype, rcode = %resp.rcode, "Glue lookup refused");
                    failures.push(format!("{}: {}", server, resp.rcode));
                }
                Err(e) => {
                    warn!(server = %server, host = %host, rtype = %rtype, error = %e, "Glue lookup failed");
                    failures.push(format!("{}: {}", server, e));
                }
            }
        }
        Err(DomainError::DsyncDiscoveryFailed {
            zone: child.to_string(),
            reason: format!(
                "no parent nameserver answered {} {} ({})",
                host,
                rtype,
                failures.join(", ")
            ),
        })
    }

    /// Configured parent servers, or the parent's NS addresses found
    /// through the resolver and remembered on the zone.
    async fn parent_servers(
        &self,
        zone: &dyn ZoneData,
        parent: &str,
    ) -> Result<Vec<String>, DomainError> {
        let configured = zone.parent_servers();
        if !configured.is_empty() {
            return Ok(configured);
        }

        let resp = self
            .messenger
            .query(&self.resolver, parent, RecordType::NS)
            .await?;
        let mut servers = Vec::new();
        for rr in resp.answers_for(parent, RecordType::NS) {
            let Some(host) = rr.data.ns_target() else {
                continue;
            };
            match self.messenger.resolve_host(host, 53).await {
                Ok(addrs) => {
                    for addr in addrs {
                        if !servers.contains(&addr) {
                            servers.push(addr);
                        }
                    }
                }
                Err(e) => debug!(host = %host, error = %e, "Parent nameserver unresolvable"),
            }
        }

        if servers.is_empty() {
            return Err(DomainError::DsyncDiscoveryFailed {
                zone: zone.name().to_string(),
                reason: format!("no nameserver addresses found for {}", parent),
            });
        }
        zone.set_parent_servers(servers.clone());
        Ok(servers)
    }
}

fn local_view(parent_zone: &dyn ZoneData, child: &str) -> ParentView {
    match parent_zone.find_delegation(child) {
        Some(delegation) if delegation.ns.name == child => ParentView {
            ns: delegation.ns.records,
            a: delegation.v4_glue,
            aaaa: delegation.v6_glue,
        },
        _ => ParentView {
            ns: Vec::new(),
            a: Vec::new(),
            aaaa: Vec::new(),
        },
    }
}

fn child_glue(zone: &dyn ZoneData, hosts: &[String], rtype: RecordType) -> Vec<ResourceRecord> {
    hosts
        .iter()
        .filter_map(|host| zone.get_rrset(host, rtype))
        .flat_map(|rrset| rrset.records)
        .collect()
}
