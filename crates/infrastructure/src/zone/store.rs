use arc_swap::{ArcSwap, ArcSwapOption};
use dashmap::DashMap;
use ferrous_dsync_application::ports::{Delegation, ZoneData, ZoneStore};
use ferrous_dsync_domain::config::ZoneOption;
use ferrous_dsync_domain::name::{fqdn, is_subdomain_of, parent_guess};
use ferrous_dsync_domain::{
    DomainError, OwnerData, RRset, RecordClass, RecordData, RecordType, ResourceRecord,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// RRsets of one owner name, keyed by type. RRSIGs live in the RRset of
/// the type they cover.
#[derive(Default)]
pub struct RRTypeStore {
    rrsets: DashMap<RecordType, RRset>,
}

impl RRTypeStore {
    pub fn get(&self, rtype: RecordType) -> Option<RRset> {
        self.rrsets.get(&rtype).map(|entry| entry.value().clone())
    }

    pub fn is_empty(&self) -> bool {
        self.rrsets.iter().all(|entry| entry.value().is_empty())
    }

    fn to_owner(&self, name: &str) -> OwnerData {
        OwnerData {
            name: name.to_string(),
            rrtypes: self
                .rrsets
                .iter()
                .filter(|entry| !entry.value().is_empty())
                .map(|entry| (*entry.key(), entry.value().clone()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn deep_clone(&self) -> Self {
        let rrsets = DashMap::new();
        for entry in self.rrsets.iter() {
            rrsets.insert(*entry.key(), entry.value().clone());
        }
        Self { rrsets }
    }
}

/// A served zone held in memory.
pub struct MemoryZone {
    name: String,
    options: Vec<ZoneOption>,
    owners: DashMap<String, RRTypeStore>,
    parent: ArcSwapOption<String>,
    parent_servers: ArcSwap<Vec<String>>,
    multisigner_targets: Vec<String>,
}

fn store_type(rr: &ResourceRecord) -> RecordType {
    match &rr.data {
        RecordData::Rrsig(sig) => sig.type_covered,
        _ => rr.record_type(),
    }
}

impl MemoryZone {
    pub fn new(name: &str, options: Vec<ZoneOption>) -> Self {
        Self {
            name: fqdn(name),
            options,
            owners: DashMap::new(),
            parent: ArcSwapOption::empty(),
            parent_servers: ArcSwap::from_pointee(Vec::new()),
            multisigner_targets: Vec::new(),
        }
    }

    /// Builds a zone from loaded records; the apex must carry an SOA.
    pub fn from_records(
        name: &str,
        options: Vec<ZoneOption>,
        records: Vec<ResourceRecord>,
    ) -> Result<Self, DomainError> {
        let zone = Self::new(name, options);
        for rr in records {
            if !is_subdomain_of(&rr.name, &zone.name) {
                return Err(DomainError::InvalidRecord(format!(
                    "{} is outside zone {}",
                    rr.name, zone.name
                )));
            }
            zone.insert(rr);
        }
        if zone.apex_rrset(RecordType::SOA).is_none() {
            return Err(DomainError::InvalidRecord(format!(
                "zone {} has no SOA at its apex",
                zone.name
            )));
        }
        Ok(zone)
    }

    pub fn with_parent_servers(self, servers: Vec<String>) -> Self {
        self.parent_servers.store(Arc::new(servers));
        self
    }

    pub fn with_multisigner_targets(mut self, targets: Vec<String>) -> Self {
        self.multisigner_targets = targets;
        self
    }

    /// Adds `rr`; returns false if an identical record was present.
    fn insert(&self, rr: ResourceRecord) -> bool {
        let rtype = store_type(&rr);
        let owner = self.owners.entry(rr.name.clone()).or_default();
        let mut rrset = owner
            .rrsets
            .entry(rtype)
            .or_insert_with(|| RRset::new(&rr.name, rtype));
        let before = (rrset.records.len(), rrset.rrsigs.len());
        let is_soa = rr.record_type() == RecordType::SOA;
        if is_soa {
            // One SOA per zone: an add replaces it
            if rrset.records.first().map(|soa| soa.data == rr.data) == Some(true) {
                return false;
            }
            rrset.records.clear();
        }
        rrset.push(rr);
        is_soa || before != (rrset.records.len(), rrset.rrsigs.len())
    }

    fn remove_record(&self, rr: &ResourceRecord) -> bool {
        let rtype = rr.record_type();
        if rr.name == self.name && rtype == RecordType::SOA {
            return false;
        }
        let removed = match self.owners.get(&rr.name) {
            Some(owner) => match owner.rrsets.get_mut(&rtype) {
                Some(mut rrset) => {
                    // The last apex NS cannot be deleted (RFC 2136 3.4.2.4)
                    if rr.name == self.name && rtype == RecordType::NS && rrset.len() <= 1 {
                        false
                    } else {
                        rrset.remove(rr)
                    }
                }
                None => false,
            },
            None => false,
        };
        self.prune(&rr.name);
        removed
    }

    fn remove_rrset(&self, name: &str, rtype: RecordType) -> Vec<RecordType> {
        let protected =
            |t: RecordType| name == self.name && matches!(t, RecordType::SOA | RecordType::NS);
        let mut removed = Vec::new();
        if let Some(owner) = self.owners.get(name) {
            let types: Vec<RecordType> = owner
                .rrsets
                .iter()
                .filter(|entry| !entry.value().is_empty())
                .map(|entry| *entry.key())
                .filter(|t| rtype == RecordType::ANY || *t == rtype)
                .filter(|t| !protected(*t))
                .collect();
            for t in types {
                owner.rrsets.remove(&t);
                removed.push(t);
            }
        }
        self.prune(name);
        removed
    }

    fn prune(&self, name: &str) {
        self.owners.remove_if(name, |_, owner| owner.is_empty());
    }

    fn deep_clone(&self) -> Self {
        let owners = DashMap::new();
        for entry in self.owners.iter() {
            owners.insert(entry.key().clone(), entry.value().deep_clone());
        }
        Self {
            name: self.name.clone(),
            options: self.options.clone(),
            owners,
            parent: ArcSwapOption::new(self.parent.load_full()),
            parent_servers: ArcSwap::new(self.parent_servers.load_full()),
            multisigner_targets: self.multisigner_targets.clone(),
        }
    }
}

impl ZoneData for MemoryZone {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_option(&self, option: ZoneOption) -> bool {
        self.options.contains(&option)
    }

    fn get_owner(&self, name: &str) -> Option<OwnerData> {
        let name = fqdn(name);
        let owner = self.owners.get(&name)?;
        let data = owner.to_owner(&name);
        (!data.is_empty()).then_some(data)
    }

    fn get_rrset(&self, name: &str, rtype: RecordType) -> Option<RRset> {
        let owner = self.owners.get(&fqdn(name))?;
        owner.get(rtype).filter(|rrset| !rrset.is_empty())
    }

    fn find_delegation(&self, qname: &str) -> Option<Delegation> {
        let mut candidate = Some(fqdn(qname));
        while let Some(name) = candidate {
            if name == self.name || !is_subdomain_of(&name, &self.name) {
                return None;
            }
            if let Some(ns) = self.get_rrset(&name, RecordType::NS) {
                let mut v4_glue = Vec::new();
                let mut v6_glue = Vec::new();
                for target in ns.records.iter().filter_map(|rr| rr.data.ns_target()) {
                    if !is_subdomain_of(target, &self.name) {
                        continue;
                    }
                    if let Some(a) = self.get_rrset(target, RecordType::A) {
                        v4_glue.extend(a.records);
                    }
                    if let Some(aaaa) = self.get_rrset(target, RecordType::AAAA) {
                        v6_glue.extend(aaaa.records);
                    }
                }
                return Some(Delegation {
                    ns,
                    v4_glue,
                    v6_glue,
                });
            }
            candidate = parent_guess(&name);
        }
        None
    }

    fn owner_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.owners.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    fn parent(&self) -> Option<String> {
        self.parent.load_full().map(|parent| parent.as_ref().clone())
    }

    fn set_parent(&self, parent: &str) {
        self.parent.store(Some(Arc::new(fqdn(parent))));
    }

    fn parent_servers(&self) -> Vec<String> {
        self.parent_servers.load().as_ref().clone()
    }

    fn set_parent_servers(&self, servers: Vec<String>) {
        self.parent_servers.store(Arc::new(servers));
    }

    fn multisigner_targets(&self) -> Vec<String> {
        self.multisigner_targets.clone()
    }

    fn apply_actions(
        &self,
        actions: &[ResourceRecord],
    ) -> Result<Vec<(String, RecordType)>, DomainError> {
        // Validate everything first so a bad action leaves the zone untouched
        for action in actions {
            if !is_subdomain_of(&action.name, &self.name) {
                return Err(DomainError::InvalidRecord(format!(
                    "{} is outside zone {}",
                    action.name, self.name
                )));
            }
        }

        let mut changed: Vec<(String, RecordType)> = Vec::new();
        let mut note = |name: &str, rtype: RecordType| {
            let key = (name.to_string(), rtype);
            if !changed.contains(&key) {
                changed.push(key);
            }
        };
        for action in actions {
            match action.class {
                RecordClass::ANY => {
                    for rtype in self.remove_rrset(&action.name, action.record_type()) {
                        note(&action.name, rtype);
                    }
                }
                RecordClass::NONE => {
                    if self.remove_record(action) {
                        note(&action.name, action.record_type());
                    }
                }
                _ => {
                    if self.insert(action.clone()) {
                        note(&action.name, action.record_type());
                    }
                }
            }
        }
        debug!(zone = %self.name, actions = actions.len(), changed = changed.len(), "Update applied");
        Ok(changed)
    }

    fn bump_serial(&self) -> Result<u32, DomainError> {
        let owner = self
            .owners
            .get(&self.name)
            .ok_or_else(|| DomainError::ZoneNotFound(self.name.clone()))?;
        let mut rrset = owner
            .rrsets
            .get_mut(&RecordType::SOA)
            .ok_or_else(|| DomainError::InvalidRecord(format!("zone {} has no SOA", self.name)))?;
        match rrset.records.first_mut().map(|rr| &mut rr.data) {
            Some(RecordData::Soa(soa)) => {
                soa.serial = soa.serial.wrapping_add(1);
                Ok(soa.serial)
            }
            _ => Err(DomainError::InvalidRecord(format!(
                "zone {} has no SOA",
                self.name
            ))),
        }
    }

    fn set_rrsigs(&self, name: &str, rtype: RecordType, rrsigs: Vec<ResourceRecord>) {
        if let Some(owner) = self.owners.get(&fqdn(name)) {
            if let Some(mut rrset) = owner.rrsets.get_mut(&rtype) {
                rrset.rrsigs = rrsigs;
            }
        }
    }

    fn snapshot(&self) -> Arc<dyn ZoneData> {
        Arc::new(self.deep_clone())
    }
}

/// All zones served by this process.
#[derive(Default)]
pub struct MemoryZoneStore {
    zones: DashMap<String, Arc<dyn ZoneData>>,
}

impl MemoryZoneStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ZoneStore for MemoryZoneStore {
    fn get(&self, name: &str) -> Option<Arc<dyn ZoneData>> {
        self.zones.get(&fqdn(name)).map(|entry| Arc::clone(entry.value()))
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.zones.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    fn insert(&self, zone: Arc<dyn ZoneData>) {
        self.zones.insert(zone.name().to_string(), zone);
    }
}
