use async_trait::async_trait;
use ferrous_dsync_domain::config::ZoneOption;
use ferrous_dsync_domain::rr::{OwnerData, RRset, RecordData, RecordType, ResourceRecord};
use ferrous_dsync_domain::DomainError;
use std::sync::Arc;
use tokio::sync::oneshot;

/// NS RRset of a delegation point and the glue the parent holds for it.
#[derive(Debug, Clone)]
pub struct Delegation {
    pub ns: RRset,
    pub v4_glue: Vec<ResourceRecord>,
    pub v6_glue: Vec<ResourceRecord>,
}

/// Read access to one served zone plus the few mutations the update
/// pipeline performs.
pub trait ZoneData: Send + Sync {
    /// Apex, lower-case and absolute.
    fn name(&self) -> &str;

    fn has_option(&self, option: ZoneOption) -> bool;

    fn get_owner(&self, name: &str) -> Option<OwnerData>;

    fn get_rrset(&self, name: &str, rtype: RecordType) -> Option<RRset>;

    /// Closest delegation at or above `qname` inside this zone.
    fn find_delegation(&self, qname: &str) -> Option<Delegation>;

    fn owner_names(&self) -> Vec<String>;

    fn parent(&self) -> Option<String>;

    fn set_parent(&self, parent: &str);

    /// Parent nameserver addresses ("ip:port") used for delegation analysis.
    fn parent_servers(&self) -> Vec<String>;

    fn set_parent_servers(&self, servers: Vec<String>);

    fn multisigner_targets(&self) -> Vec<String>;

    /// Applies RFC 2136 actions (class IN adds, NONE deletes an RR, ANY
    /// deletes an RRset) and returns the owner/type pairs that changed.
    fn apply_actions(
        &self,
        actions: &[ResourceRecord],
    ) -> Result<Vec<(String, RecordType)>, DomainError>;

    /// Increments the SOA serial and returns the new value.
    fn bump_serial(&self) -> Result<u32, DomainError>;

    /// Replaces the RRSIGs covering `name`/`rtype`.
    fn set_rrsigs(&self, name: &str, rtype: RecordType, rrsigs: Vec<ResourceRecord>);

    /// Frozen copy, used to compare before/after an update.
    fn snapshot(&self) -> Arc<dyn ZoneData>;

    fn apex_rrset(&self, rtype: RecordType) -> Option<RRset> {
        self.get_rrset(self.name(), rtype)
    }

    fn soa_serial(&self) -> Option<u32> {
        self.apex_rrset(RecordType::SOA)
            .and_then(|rrset| rrset.records.into_iter().next())
            .and_then(|rr| match rr.data {
                RecordData::Soa(soa) => Some(soa.serial),
                _ => None,
            })
    }
}

/// The set of zones served by this engine.
pub trait ZoneStore: Send + Sync {
    fn get(&self, name: &str) -> Option<Arc<dyn ZoneData>>;

    fn names(&self) -> Vec<String>;

    fn insert(&self, zone: Arc<dyn ZoneData>);

    /// Served zone that is the closest enclosing zone of `name`, excluding
    /// `name` itself.
    fn find_enclosing(&self, name: &str) -> Option<Arc<dyn ZoneData>> {
        let mut candidate = ferrous_dsync_domain::name::parent_guess(name);
        while let Some(parent) = candidate {
            if let Some(zone) = self.get(&parent) {
                return Some(zone);
            }
            candidate = ferrous_dsync_domain::name::parent_guess(&parent);
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneUpdateCmd {
    ZoneUpdate,
}

#[derive(Debug, Clone, Default)]
pub struct ZoneUpdateResponse {
    pub error: bool,
    pub error_msg: String,
    pub changed: bool,
    pub serial: Option<u32>,
}

/// Request for the zone update pipeline; the only way the sync core
/// changes zone contents.
#[derive(Debug)]
pub struct ZoneUpdateRequest {
    pub cmd: ZoneUpdateCmd,
    pub zone_name: String,
    pub actions: Vec<ResourceRecord>,
    pub internal_update: bool,
    pub response: Option<oneshot::Sender<ZoneUpdateResponse>>,
}

impl ZoneUpdateRequest {
    pub fn internal(zone_name: &str, actions: Vec<ResourceRecord>) -> Self {
        Self {
            cmd: ZoneUpdateCmd::ZoneUpdate,
            zone_name: zone_name.to_string(),
            actions,
            internal_update: true,
            response: None,
        }
    }
}

#[async_trait]
pub trait ZoneUpdateQueue: Send + Sync {
    async fn submit(&self, request: ZoneUpdateRequest) -> Result<(), DomainError>;
}
