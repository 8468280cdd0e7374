mod helpers;

use ferrous_dsync_application::ports::{DnsMessenger, KeyStore, ZoneData, ZoneStore};
use ferrous_dsync_application::use_cases::{
    AnalyseDelegationUseCase, BootstrapSig0KeyUseCase, DsyncDiscoveryUseCase,
    PublishSig0KeyUseCase, RolloverAction, RolloverSig0KeyUseCase, SyncDelegationUseCase,
};
use ferrous_dsync_domain::config::ZoneOption;
use ferrous_dsync_domain::{Algorithm, DelegationSyncStatus, KeyState, RecordType, SyncScheme};
use ferrous_dsync_infrastructure::crypto::RingZoneSigner;
use ferrous_dsync_infrastructure::database::create_pool;
use ferrous_dsync_infrastructure::repositories::SqliteKeyStore;
use ferrous_dsync_infrastructure::zone::MemoryZoneStore;
use ferrous_dsync_jobs::{
    delegation_sync_channel, key_lifecycle_channel, notify_channel, zone_update_channel,
    DelegationCheckJob, DelegationSyncHandle, DelegationSyncRequest, DelegationSyncherJob,
    KeyBootstrapperJob, KeyLifecycleCommand, KeyLifecycleHandle, NotifierJob, SyncCommand,
    ZoneUpdaterJob,
};
use helpers::{child_zone, parent_zone, MockDnsMessenger};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

const WAIT: Duration = Duration::from_secs(5);
const RESOLVER: &str = "192.0.2.250:53";
const DSYNC_UPDATE: &str = "child._dsync.example. 3600 IN DSYNC ANY UPDATE 53 ns.example.";

struct Engines {
    zones: Arc<MemoryZoneStore>,
    keys: Arc<SqliteKeyStore>,
    messenger: Arc<MockDnsMessenger>,
    syncher: DelegationSyncHandle,
    key_lifecycle: KeyLifecycleHandle,
}

async fn start_engines(child_options: Vec<ZoneOption>) -> Engines {
    start_engines_with(child_options, MockDnsMessenger::new()).await
}

/// Parent and child both served locally; every engine running.
async fn start_engines_with(
    child_options: Vec<ZoneOption>,
    messenger: MockDnsMessenger,
) -> Engines {
    let zones = Arc::new(MemoryZoneStore::new());
    zones.insert(Arc::new(parent_zone()));
    let child = child_zone(child_options);
    child.set_parent("example.");
    zones.insert(Arc::new(child));

    let keys = Arc::new(SqliteKeyStore::new(
        create_pool("sqlite::memory:", 1).await.unwrap(),
    ));
    let messenger = Arc::new(messenger);
    let messenger_port: Arc<dyn DnsMessenger> = messenger.clone();

    let (syncher, sync_rx) = delegation_sync_channel(16);
    let (zone_updates, update_rx) = zone_update_channel(16);
    let (notifier, notify_rx) = notify_channel(16);
    let (key_lifecycle, key_rx) = key_lifecycle_channel(16);

    let dsync = Arc::new(DsyncDiscoveryUseCase::new(messenger_port.clone(), RESOLVER));
    let analyse = Arc::new(AnalyseDelegationUseCase::new(
        messenger_port.clone(),
        zones.clone(),
        dsync.clone(),
        RESOLVER,
    ));
    let bootstrap = Arc::new(BootstrapSig0KeyUseCase::new(
        messenger_port.clone(),
        keys.clone(),
        dsync.clone(),
        Algorithm::ED25519,
    ));
    let rollover = Arc::new(RolloverSig0KeyUseCase::new(
        messenger_port.clone(),
        keys.clone(),
        dsync.clone(),
        Arc::new(zone_updates.clone()),
        Algorithm::ED25519,
        WAIT,
    ));
    let sync = Arc::new(SyncDelegationUseCase::new(
        messenger_port.clone(),
        keys.clone(),
        dsync,
        Arc::new(zone_updates.clone()),
        Arc::new(notifier),
        vec![SyncScheme::Update, SyncScheme::Notify],
        WAIT,
    ));
    let publish = Arc::new(PublishSig0KeyUseCase::new(
        keys.clone(),
        Arc::new(zone_updates),
        Algorithm::ED25519,
        WAIT,
    ));

    ZoneUpdaterJob::new(
        zones.clone(),
        keys.clone(),
        Arc::new(RingZoneSigner::new(86400)),
        update_rx,
    )
    .with_syncher(syncher.clone())
    .start();
    NotifierJob::new(messenger_port, notify_rx).start();
    KeyBootstrapperJob::new(zones.clone(), bootstrap, rollover, key_rx).start();
    DelegationSyncherJob::new(
        zones.clone(),
        analyse,
        sync,
        publish,
        key_lifecycle.clone(),
        sync_rx,
    )
    .with_key_reply_timeout(WAIT)
    .start();

    Engines {
        zones,
        keys,
        messenger,
        syncher,
        key_lifecycle,
    }
}

/// A messenger whose resolver points the child at `ns.example.` for UPDATEs.
async fn dsync_messenger() -> MockDnsMessenger {
    let messenger = MockDnsMessenger::new();
    messenger
        .set_answer("child._dsync.example.", RecordType::DSYNC, DSYNC_UPDATE)
        .await;
    messenger
}

// ============================================================================
// Requests
// ============================================================================

#[tokio::test]
async fn test_status_reports_in_sync_delegation() {
    // Arrange
    let engines = start_engines(vec![ZoneOption::DelegationSyncChild]).await;

    // Act
    let response = engines
        .syncher
        .request(SyncCommand::Status, "child.example.", WAIT)
        .await
        .unwrap();

    // Assert
    assert!(!response.error, "{}", response.error_msg);
    let status = response.status.unwrap();
    assert!(status.in_sync);
    assert_eq!(status.parent, "example.");
}

#[tokio::test]
async fn test_status_reports_child_side_additions() {
    // Arrange
    let engines = start_engines(Vec::new()).await;
    let child = engines.zones.get("child.example.").unwrap();
    child
        .apply_actions(&[
            "child.example. 3600 IN NS ns2.child.example.".parse().unwrap(),
            "ns2.child.example. 3600 IN AAAA 2001:db8::54".parse().unwrap(),
        ])
        .unwrap();

    // Act
    let response = engines
        .syncher
        .request(SyncCommand::Status, "child.example.", WAIT)
        .await
        .unwrap();

    // Assert
    let status = response.status.unwrap();
    assert!(!status.in_sync);
    assert_eq!(status.ns_adds.len(), 1);
    assert_eq!(status.aaaa_adds.len(), 1);
    assert!(response.message.contains("out of sync"));
}

#[tokio::test]
async fn test_unknown_zone_is_an_error_reply() {
    // Arrange
    let engines = start_engines(Vec::new()).await;

    // Act
    let response = engines
        .syncher
        .request(SyncCommand::Status, "nowhere.test.", WAIT)
        .await
        .unwrap();

    // Assert
    assert!(response.error);
    assert!(response.status.is_none());
}

#[tokio::test]
async fn test_implicit_sync_needs_child_option() {
    // Arrange
    let engines = start_engines(Vec::new()).await;

    // Act
    let response = engines
        .syncher
        .request(SyncCommand::SyncDelegation, "child.example.", WAIT)
        .await
        .unwrap();

    // Assert
    assert!(response.error);
    assert!(response.error_msg.contains("delegation-sync-child"));
}

#[tokio::test]
async fn test_sync_uses_attached_status() {
    // Arrange
    let engines = start_engines(vec![ZoneOption::DelegationSyncChild]).await;
    let (tx, rx) = oneshot::channel();
    let mut request = DelegationSyncRequest::new(SyncCommand::SyncDelegation, "child.example.")
        .with_status(DelegationSyncStatus::new("child.example.", "example."));
    request.response = Some(tx);

    // Act
    engines.syncher.submit(request).await.unwrap();
    let response = rx.await.unwrap();

    // Assert
    assert!(!response.error);
    assert_eq!(response.message, "delegation already in sync");
    assert!(engines.messenger.updates().await.is_empty());
}

// ============================================================================
// Setup
// ============================================================================

#[tokio::test]
async fn test_setup_generates_and_publishes_sig0_key() {
    // Arrange
    let engines = start_engines(vec![ZoneOption::DelegationSyncChild]).await;

    // Act
    let first = engines
        .syncher
        .request(SyncCommand::Setup, "child.example.", WAIT)
        .await
        .unwrap();
    let second = engines
        .syncher
        .request(SyncCommand::Setup, "child.example.", WAIT)
        .await
        .unwrap();

    // Assert
    assert!(first.message.starts_with("SIG(0) key published"));
    assert!(second.message.starts_with("SIG(0) key already published"));
    let active = engines
        .keys
        .get_sig0_keys("child.example.", KeyState::Active)
        .await
        .unwrap();
    assert_eq!(active.keys.len(), 1);
    let child = engines.zones.get("child.example.").unwrap();
    let published = child.apex_rrset(RecordType::KEY).unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(child.soa_serial(), Some(2));
}

#[tokio::test]
async fn test_setup_bootstraps_key_with_dsync_update_target() {
    // Arrange
    let engines = start_engines_with(
        vec![ZoneOption::DelegationSyncChild],
        dsync_messenger().await,
    )
    .await;

    // Act
    let response = engines
        .syncher
        .request(SyncCommand::Setup, "child.example.", WAIT)
        .await
        .unwrap();

    // Assert
    assert!(!response.error, "{}", response.error_msg);
    assert!(
        response.message.contains("bootstrapped with parent example."),
        "{}",
        response.message
    );
    let queries = engines.messenger.queries().await;
    assert!(queries.contains(&("child._dsync.example.".to_string(), RecordType::DSYNC)));

    let active = engines
        .keys
        .get_sig0_keys("child.example.", KeyState::Active)
        .await
        .unwrap();
    let sent = engines.messenger.update_targets().await;
    assert_eq!(sent.len(), 1);
    let (update, targets) = &sent[0];
    assert_eq!(update.zone, "example.");
    assert_eq!(targets, &vec!["192.0.2.53:53".to_string()]);
    let added: Vec<_> = update.additions().collect();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].record_type(), RecordType::KEY);
    assert_eq!(added[0].data, active.keys[0].key_rr.data);
}

#[tokio::test]
async fn test_setup_carries_on_when_bootstrap_fails() {
    // Arrange
    let engines = start_engines(vec![ZoneOption::DelegationSyncChild]).await;

    // Act
    let response = engines
        .syncher
        .request(SyncCommand::Setup, "child.example.", WAIT)
        .await
        .unwrap();

    // Assert
    assert!(!response.error);
    assert!(response.message.contains("bootstrap with parent failed"));
    assert!(response.status.unwrap().in_sync);
}

#[tokio::test]
async fn test_setup_skips_bootstrap_without_child_option() {
    // Arrange
    let engines = start_engines_with(Vec::new(), dsync_messenger().await).await;

    // Act
    let response = engines
        .syncher
        .request(SyncCommand::Setup, "child.example.", WAIT)
        .await
        .unwrap();

    // Assert
    assert!(!response.error);
    assert!(!response.message.contains("bootstrap"));
    assert!(engines.messenger.updates().await.is_empty());
}

// ============================================================================
// Key bootstrapper
// ============================================================================

#[tokio::test]
async fn test_key_bootstrapper_generates_and_bootstraps_key() {
    // Arrange
    let engines = start_engines_with(
        vec![ZoneOption::DelegationSyncChild],
        dsync_messenger().await,
    )
    .await;

    // Act
    let response = engines
        .key_lifecycle
        .request(KeyLifecycleCommand::Bootstrap, "child.example.", WAIT)
        .await
        .unwrap();

    // Assert
    assert!(!response.error, "{}", response.error_msg);
    let outcome = response.bootstrap.unwrap();
    assert!(outcome.generated);
    assert_eq!(outcome.parent, "example.");
    let active = engines
        .keys
        .get_sig0_keys("child.example.", KeyState::Active)
        .await
        .unwrap();
    assert_eq!(active.keys[0].key_id, outcome.key_id);
}

#[tokio::test]
async fn test_key_bootstrapper_rolls_key_and_republishes() {
    // Arrange
    let engines = start_engines_with(
        vec![ZoneOption::DelegationSyncChild],
        dsync_messenger().await,
    )
    .await;
    engines
        .syncher
        .request(SyncCommand::Setup, "child.example.", WAIT)
        .await
        .unwrap();
    let old = engines
        .keys
        .get_sig0_keys("child.example.", KeyState::Active)
        .await
        .unwrap()
        .keys[0]
        .key_id;

    // Act
    let response = engines
        .key_lifecycle
        .request(
            KeyLifecycleCommand::Rollover(RolloverAction::Complete),
            "child.example.",
            WAIT,
        )
        .await
        .unwrap();

    // Assert
    assert!(!response.error, "{}", response.error_msg);
    let outcome = response.rollover.unwrap();
    assert!(outcome.completed);
    assert_eq!(outcome.old_key_id, old);
    let child = engines.zones.get("child.example.").unwrap();
    let published = child.apex_rrset(RecordType::KEY).unwrap();
    assert_eq!(published.len(), 1);
    let active = engines
        .keys
        .get_sig0_keys("child.example.", KeyState::Active)
        .await
        .unwrap();
    assert_eq!(active.keys[0].key_id, outcome.new_key_id);
    assert_eq!(published.records[0].data, active.keys[0].key_rr.data);
}

#[tokio::test]
async fn test_key_bootstrapper_reports_unknown_zone() {
    // Arrange
    let engines = start_engines(Vec::new()).await;

    // Act
    let response = engines
        .key_lifecycle
        .request(KeyLifecycleCommand::Bootstrap, "nowhere.test.", WAIT)
        .await
        .unwrap();

    // Assert
    assert!(response.error);
    assert!(response.bootstrap.is_none());
}

#[tokio::test]
async fn test_key_store_stays_usable_while_rollover_update_in_flight() {
    // Arrange
    let messenger = dsync_messenger().await;
    let engines = start_engines_with(vec![ZoneOption::DelegationSyncChild], messenger).await;
    engines
        .syncher
        .request(SyncCommand::Setup, "child.example.", WAIT)
        .await
        .unwrap();
    let before = engines.messenger.updates().await.len();
    engines.messenger.set_update_delay(Duration::from_secs(3)).await;

    // Act
    let handle = engines.key_lifecycle.clone();
    let rollover = tokio::spawn(async move {
        handle
            .request(
                KeyLifecycleCommand::Rollover(RolloverAction::Add),
                "child.example.",
                WAIT,
            )
            .await
    });
    while engines.messenger.updates().await.len() == before {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // Assert
    let listed = tokio::time::timeout(
        Duration::from_secs(2),
        engines.keys.list_sig0_keys(Some("child.example.")),
    )
    .await
    .expect("key store blocked while the UPDATE was in flight")
    .unwrap();
    assert!(listed.iter().any(|k| k.state == KeyState::Created));
    let active = tokio::time::timeout(
        Duration::from_secs(2),
        engines.keys.get_sig0_keys("child.example.", KeyState::Active),
    )
    .await
    .expect("key store blocked while the UPDATE was in flight")
    .unwrap();
    assert_eq!(active.keys.len(), 1);

    let response = rollover.await.unwrap().unwrap();
    assert!(!response.error, "{}", response.error_msg);
    assert!(!response.rollover.unwrap().completed);
}

// ============================================================================
// Periodic check
// ============================================================================

#[tokio::test]
async fn test_check_queues_only_child_zones() {
    // Arrange
    let zones = Arc::new(MemoryZoneStore::new());
    zones.insert(Arc::new(parent_zone()));
    zones.insert(Arc::new(child_zone(vec![ZoneOption::DelegationSyncChild])));
    let (handle, mut rx) = delegation_sync_channel(8);
    let job = DelegationCheckJob::new(zones, handle);

    // Act
    let queued = job.run_once().await;

    // Assert
    assert_eq!(queued, 1);
    let request = rx.try_recv().unwrap();
    assert_eq!(request.zone_name, "child.example.");
    assert_eq!(request.command, SyncCommand::SyncDelegation);
    assert!(request.sync_status.is_none());
}
