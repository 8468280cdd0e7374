use ferrous_dsync_domain::name::is_in_bailiwick;
use ferrous_dsync_domain::{DelegationSyncStatus, RecordType, ResourceRecord};
use tracing::debug;

use crate::ports::ZoneData;
use crate::services::{rrset_differ, RRsetDiff};

/// Compares the delegation data (apex NS plus in-bailiwick glue) and the
/// DNSKEY RRset of two versions of the same zone.
///
/// Used by the zone updater to decide whether an update needs to be
/// pushed to the parent.
pub fn delegation_data_changed(old: &dyn ZoneData, new: &dyn ZoneData) -> DelegationSyncStatus {
    let zone = new.name();
    let parent = new.parent().unwrap_or_default();
    let mut status = DelegationSyncStatus::new(zone, &parent);

    let old_ns = apex_records(old, RecordType::NS);
    let new_ns = apex_records(new, RecordType::NS);
    let ns = rrset_differ(zone, &new_ns, &old_ns, RecordType::NS);
    status.ns_adds = ns.adds;
    status.ns_removes = ns.removes;

    let hosts = glue_hosts(zone, new_ns.iter().chain(&old_ns));
    let a = rrset_differ(
        zone,
        &glue_of(new, &hosts, RecordType::A),
        &glue_of(old, &hosts, RecordType::A),
        RecordType::A,
    );
    status.a_adds = a.adds;
    status.a_removes = a.removes;

    let aaaa = rrset_differ(
        zone,
        &glue_of(new, &hosts, RecordType::AAAA),
        &glue_of(old, &hosts, RecordType::AAAA),
        RecordType::AAAA,
    );
    status.aaaa_adds = aaaa.adds;
    status.aaaa_removes = aaaa.removes;

    let dnskey = dnskeys_changed(old, new);
    status.dnskey_adds = dnskey.adds;
    status.dnskey_removes = dnskey.removes;

    status.update_in_sync();
    debug!(zone = %zone, changes = %status.summary(), in_sync = status.in_sync, "Delegation data compared");
    status
}

pub fn dnskeys_changed(old: &dyn ZoneData, new: &dyn ZoneData) -> RRsetDiff {
    rrset_differ(
        new.name(),
        &apex_records(new, RecordType::DNSKEY),
        &apex_records(old, RecordType::DNSKEY),
        RecordType::DNSKEY,
    )
}

pub(crate) fn apex_records(zone: &dyn ZoneData, rtype: RecordType) -> Vec<ResourceRecord> {
    zone.apex_rrset(rtype)
        .map(|rrset| rrset.records)
        .unwrap_or_default()
}

/// Distinct NS targets at or below `zone`, the only names that need glue.
pub(crate) fn glue_hosts<'a>(
    zone: &str,
    ns_records: impl Iterator<Item = &'a ResourceRecord>,
) -> Vec<String> {
    let mut hosts: Vec<String> = Vec::new();
    for rr in ns_records {
        if let Some(target) = rr.data.ns_target() {
            if is_in_bailiwick(target, zone) && !hosts.iter().any(|h| h == target) {
                hosts.push(target.to_string());
            }
        }
    }
    hosts
}

fn glue_of(zone: &dyn ZoneData, hosts: &[String], rtype: RecordType) -> Vec<ResourceRecord> {
    hosts
        .iter()
        .filter_map(|host| zone.get_rrset(host, rtype))
        .flat_map(|rrset| rrset.records)
        .collect()
}
