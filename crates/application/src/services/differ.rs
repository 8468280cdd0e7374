use ferrous_dsync_domain::{RecordType, ResourceRecord};
use tracing::trace;

/// Additions and removals that turn `old` into `new`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RRsetDiff {
    pub adds: Vec<ResourceRecord>,
    pub removes: Vec<ResourceRecord>,
}

impl RRsetDiff {
    pub fn differs(&self) -> bool {
        !self.adds.is_empty() || !self.removes.is_empty()
    }
}

/// Compares two collections of `rtype` records as sets.
///
/// Records are equal when owner, class and rdata match; TTLs are ignored.
/// RRSIGs are skipped on both sides. Quadratic, which is fine for the
/// small NS/glue/DNSKEY sets this is used on.
pub fn rrset_differ(
    zone: &str,
    new: &[ResourceRecord],
    old: &[ResourceRecord],
    rtype: RecordType,
) -> RRsetDiff {
    let relevant = |rr: &&ResourceRecord| {
        let t = rr.record_type();
        t == rtype && !t.is_signature()
    };

    let removes: Vec<ResourceRecord> = old
        .iter()
        .filter(relevant)
        .filter(|o| !new.iter().filter(relevant).any(|n| n.is_duplicate(o)))
        .cloned()
        .collect();

    let adds: Vec<ResourceRecord> = new
        .iter()
        .filter(relevant)
        .filter(|n| !old.iter().filter(relevant).any(|o| o.is_duplicate(n)))
        .cloned()
        .collect();

    trace!(
        zone = %zone,
        rtype = %rtype,
        adds = adds.len(),
        removes = removes.len(),
        "RRset diff computed"
    );

    RRsetDiff { adds, removes }
}
