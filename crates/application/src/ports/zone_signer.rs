use ferrous_dsync_domain::{DnssecActiveKeys, DomainError, RRset, ResourceRecord};

/// Produces RRSIGs for an RRset with the zone's active DNSSEC keys.
pub trait ZoneSigner: Send + Sync {
    /// DNSKEY, CDS and CDNSKEY RRsets are signed with the KSKs, everything
    /// else with the ZSKs.
    fn sign_rrset(
        &self,
        zone: &str,
        rrset: &RRset,
        keys: &DnssecActiveKeys,
    ) -> Result<Vec<ResourceRecord>, DomainError>;
}
