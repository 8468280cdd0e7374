use ferrous_dsync_application::ports::{Delegation, ZoneData, ZoneStore};
use ferrous_dsync_domain::config::ZoneOption;
use ferrous_dsync_domain::name::{fqdn, is_subdomain_of, parent_guess};
use ferrous_dsync_domain::{
    DomainError, OwnerData, RRset, RecordClass, RecordData, RecordType, ResourceRecord,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

// ============================================================================
// Mock zone
// ============================================================================

/// Flat list of records behind a std lock; `ZoneData` is a sync port.
pub struct MockZone {
    name: String,
    options: Vec<ZoneOption>,
    records: RwLock<Vec<ResourceRecord>>,
    parent: RwLock<Option<String>>,
    parent_servers: RwLock<Vec<String>>,
    multisigner_targets: Vec<String>,
}

impl MockZone {
    pub fn new(name: &str, records: &[&str]) -> Self {
        Self {
            name: fqdn(name),
            options: Vec::new(),
            records: RwLock::new(records.iter().map(|t| t.parse().unwrap()).collect()),
            parent: RwLock::new(None),
            parent_servers: RwLock::new(Vec::new()),
            multisigner_targets: Vec::new(),
        }
    }

    pub fn with_parent(self, parent: &str) -> Self {
        *self.parent.write().unwrap() = Some(fqdn(parent));
        self
    }

    pub fn with_parent_servers(self, servers: &[&str]) -> Self {
        *self.parent_servers.write().unwrap() = servers.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_option(mut self, option: ZoneOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_multisigner_targets(mut self, targets: &[&str]) -> Self {
        self.multisigner_targets = targets.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn records(&self) -> Vec<ResourceRecord> {
        self.records.read().unwrap().clone()
    }

    fn clone_zone(&self) -> Self {
        Self {
            name: self.name.clone(),
            options: self.options.clone(),
            records: RwLock::new(self.records()),
            parent: RwLock::new(self.parent()),
            parent_servers: RwLock::new(self.parent_servers()),
            multisigner_targets: self.multisigner_targets.clone(),
        }
    }
}

impl ZoneData for MockZone {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_option(&self, option: ZoneOption) -> bool {
        self.options.contains(&option)
    }

    fn get_owner(&self, name: &str) -> Option<OwnerData> {
        let name = fqdn(name);
        let mut owner = OwnerData::new(&name);
        for rr in self.records.read().unwrap().iter().filter(|rr| rr.name == name) {
            owner
                .rrtypes
                .entry(rr.record_type())
                .or_insert_with(|| RRset::new(&name, rr.record_type()))
                .push(rr.clone());
        }
        (!owner.rrtypes.is_empty()).then_some(owner)
    }

    fn get_rrset(&self, name: &str, rtype: RecordType) -> Option<RRset> {
        self.get_owner(name).and_then(|owner| owner.get(rtype).cloned())
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
        let mut names: Vec<String> = self.records().into_iter().map(|rr| rr.name).collect();
        names.sort();
        names.dedup();
        names
    }

    fn parent(&self) -> Option<String> {
        self.parent.read().unwrap().clone()
    }

    fn set_parent(&self, parent: &str) {
        *self.parent.write().unwrap() = Some(fqdn(parent));
    }

    fn parent_servers(&self) -> Vec<String> {
        self.parent_servers.read().unwrap().clone()
    }

    fn set_parent_servers(&self, servers: Vec<String>) {
        *self.parent_servers.write().unwrap() = servers;
    }

    fn multisigner_targets(&self) -> Vec<String> {
        self.multisigner_targets.clone()
    }

    fn apply_actions(
        &self,
        actions: &[ResourceRecord],
    ) -> Result<Vec<(String, RecordType)>, DomainError> {
        let mut records = self.records.write().unwrap();
        let mut changed = Vec::new();
        for action in actions {
            let key = (action.name.clone(), action.record_type());
            let before = records.len();
            match action.class {
                RecordClass::ANY => records
                    .retain(|rr| !(rr.name == action.name && rr.record_type() == action.record_type())),
                RecordClass::NONE => records
                    .retain(|rr| !(rr.name == action.name && rr.data == action.data)),
                _ => {
                    if !records.iter().any(|rr| rr.is_duplicate(action)) {
                        records.push(action.clone());
                    }
                }
            }
            if records.len() != before && !changed.contains(&key) {
                changed.push(key);
            }
        }
        Ok(changed)
    }

    fn bump_serial(&self) -> Result<u32, DomainError> {
        let mut records = self.records.write().unwrap();
        for rr in records.iter_mut() {
            if let RecordData::Soa(soa) = &mut rr.data {
                soa.serial = soa.serial.wrapping_add(1);
                return Ok(soa.serial);
            }
        }
        Err(DomainError::ZoneNotFound(self.name.clone()))
    }

    fn set_rrsigs(&self, _name: &str, _rtype: RecordType, _rrsigs: Vec<ResourceRecord>) {}

    fn snapshot(&self) -> Arc<dyn ZoneData> {
        Arc::new(self.clone_zone())
    }
}

// ============================================================================
// Mock zone store
// ============================================================================

#[derive(Default)]
pub struct MockZoneStore {
    zones: RwLock<HashMap<String, Arc<dyn ZoneData>>>,
}

impl MockZoneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zone(self, zone: Arc<dyn ZoneData>) -> Self {
        self.insert(zone);
        self
    }
}

impl ZoneStore for MockZoneStore {
    fn get(&self, name: &str) -> Option<Arc<dyn ZoneData>> {
        self.zones.read().unwrap().get(&fqdn(name)).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.zones.read().unwrap().keys().cloned().collect()
    }

    fn insert(&self, zone: Arc<dyn ZoneData>) {
        self.zones
            .write()
            .unwrap()
            .insert(zone.name().to_string(), zone);
    }
}
