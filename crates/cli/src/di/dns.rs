use ferrous_dsync_domain::Config;
use ferrous_dsync_infrastructure::crypto::RingZoneSigner;
use ferrous_dsync_infrastructure::dns::HickoryDnsMessenger;
use std::sync::Arc;

pub struct DnsServices {
    pub messenger: Arc<HickoryDnsMessenger>,
    pub signer: Arc<RingZoneSigner>,
}

impl DnsServices {
    pub fn new(config: &Config) -> Self {
        Self {
            messenger: Arc::new(HickoryDnsMessenger::new(
                config.resolver.timeout(),
                config.keygen.sig0_validity_secs,
            )),
            signer: Arc::new(RingZoneSigner::new(config.keygen.rrsig_validity_secs)),
        }
    }
}
