use dashmap::DashMap;
use ferrous_dsync_domain::{DnssecActiveKeys, KeyState, Sig0ActiveKeys};

/// Loaded signing keys per `(zone, state)`.
///
/// Entries are dropped for a whole zone (all four states) whenever a key of
/// that zone changes, and again when the changing transaction commits.
#[derive(Default)]
pub struct KeyCache {
    sig0: DashMap<(String, KeyState), Sig0ActiveKeys>,
    dnssec: DashMap<(String, KeyState), DnssecActiveKeys>,
}

impl KeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_sig0(&self, zone: &str, state: KeyState) -> Option<Sig0ActiveKeys> {
        self.sig0
            .get(&(zone.to_string(), state))
            .map(|entry| entry.value().clone())
    }

    pub fn put_sig0(&self, zone: &str, state: KeyState, keys: Sig0ActiveKeys) {
        self.sig0.insert((zone.to_string(), state), keys);
    }

    pub fn get_dnssec(&self, zone: &str, state: KeyState) -> Option<DnssecActiveKeys> {
        self.dnssec
            .get(&(zone.to_string(), state))
            .map(|entry| entry.value().clone())
    }

    pub fn put_dnssec(&self, zone: &str, state: KeyState, keys: DnssecActiveKeys) {
        self.dnssec.insert((zone.to_string(), state), keys);
    }

    pub fn invalidate(&self, zone: &str) {
        for state in KeyState::ALL {
            let key = (zone.to_string(), state);
            self.sig0.remove(&key);
            self.dnssec.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.sig0.len() + self.dnssec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
