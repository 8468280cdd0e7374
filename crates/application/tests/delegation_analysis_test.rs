use ferrous_dsync_application::ports::{QueryResponse, ZoneData};
use ferrous_dsync_application::use_cases::{
    delegation_data_changed, AnalyseDelegationUseCase, DsyncDiscoveryUseCase,
};
use ferrous_dsync_domain::{DomainError, Rcode, RecordType};
use std::sync::Arc;

mod helpers;
use helpers::{response, rr, MockDnsMessenger, MockZone, MockZoneStore};

const RESOLVER: &str = "192.0.2.53:53";
const PARENT_NS1: &str = "192.0.2.1:53";
const PARENT_NS2: &str = "192.0.2.2:53";
const CHILD: &str = "child.example.com.";

fn child_zone() -> MockZone {
    MockZone::new(
        CHILD,
        &[
            "child.example.com. 3600 IN SOA ns1.child.example.com. hostmaster.child.example.com. 1 7200 3600 1209600 300",
            "child.example.com. 3600 IN NS ns1.child.example.com.",
            "child.example.com. 3600 IN NS ns.other.net.",
            "ns1.child.example.com. 3600 IN A 192.0.2.11",
        ],
    )
    .with_parent("example.com.")
    .with_parent_servers(&[PARENT_NS1, PARENT_NS2])
}

fn referral(server: &str, ns: &[&str], glue: &[&str]) -> QueryResponse {
    let mut resp = response(server, Rcode::NOERROR, &[], ns);
    resp.additional = glue.iter().map(|t| rr(t)).collect();
    resp
}

async fn script_parent(messenger: &MockDnsMessenger, server: &str, ns: &[&str], glue: &[&str]) {
    messenger
        .set_response(server, CHILD, RecordType::NS, referral(server, ns, glue))
        .await;
    for host in ["ns1.child.example.com.", "ns2.child.example.com."] {
        let a: Vec<&str> = glue
            .iter()
            .copied()
            .filter(|g| g.starts_with(host) && g.contains(" A "))
            .collect();
        messenger
            .set_response(server, host, RecordType::A, referral(server, ns, &a))
            .await;
    }
}

fn analyse(messenger: &MockDnsMessenger, zones: Arc<MockZoneStore>) -> AnalyseDelegationUseCase {
    let messenger = Arc::new(messenger.clone());
    let dsync = Arc::new(DsyncDiscoveryUseCase::new(messenger.clone(), RESOLVER));
    AnalyseDelegationUseCase::new(messenger, zones, dsync, RESOLVER)
}

// ============================================================================
// Remote parent
// ============================================================================

#[tokio::test]
async fn test_analysis_reports_in_sync_delegation() {
    // Arrange
    let messenger = MockDnsMessenger::new();
    script_parent(
        &messenger,
        PARENT_NS1,
        &[
            "child.example.com. 86400 IN NS ns1.child.example.com.",
            "child.example.com. 86400 IN NS ns.other.net.",
        ],
        &["ns1.child.example.com. 86400 IN A 192.0.2.11"],
    )
    .await;
    let zone = child_zone();

    // Act
    let status = analyse(&messenger, Arc::new(MockZoneStore::new()))
        .execute(&zone)
        .await
        .unwrap();

    // Assert
    assert!(status.in_sync, "unexpected changes: {}", status.summary());
    assert_eq!(status.parent, "example.com.");
}

#[tokio::test]
async fn test_analysis_reports_ns_addition() {
    let messenger = MockDnsMessenger::new();
    script_parent(
        &messenger,
        PARENT_NS1,
        &["child.example.com. 86400 IN NS ns1.child.example.com."],
        &["ns1.child.example.com. 86400 IN A 192.0.2.11"],
    )
    .await;
    let zone = child_zone();

    let status = analyse(&messenger, Arc::new(MockZoneStore::new()))
        .execute(&zone)
        .await
        .unwrap();

    assert!(!status.in_sync);
    assert_eq!(status.ns_adds.len(), 1);
    assert_eq!(status.ns_adds[0].data.ns_target(), Some("ns.other.net."));
    assert!(status.ns_removes.is_empty());
    assert!(status.a_adds.is_empty() && status.a_removes.is_empty());
}

#[tokio::test]
async fn test_analysis_reports_ns_removal_with_stale_glue() {
    let messenger = MockDnsMessenger::new();
    script_parent(
        &messenger,
        PARENT_NS1,
        &[
            "child.example.com. 86400 IN NS ns1.child.example.com.",
            "child.example.com. 86400 IN NS ns2.child.example.com.",
            "child.example.com. 86400 IN NS ns.other.net.",
        ],
        &[
            "ns1.child.example.com. 86400 IN A 192.0.2.11",
            "ns2.child.example.com. 86400 IN A 192.0.2.12",
        ],
    )
    .await;
    let zone = child_zone();

    let status = analyse(&messenger, Arc::new(MockZoneStore::new()))
        .execute(&zone)
        .await
        .unwrap();

    assert_eq!(status.ns_removes.len(), 1);
    assert_eq!(status.ns_removes[0].data.ns_target(), Some("ns2.child.example.com."));
    assert_eq!(status.a_removes.len(), 1);
    assert_eq!(status.a_removes[0].name, "ns2.child.example.com.");
    assert!(status.ns_adds.is_empty());
}

#[tokio::test]
async fn test_analysis_reports_glue_change() {
    let messenger = MockDnsMessenger::new();
    script_parent(
        &messenger,
        PARENT_NS1,
        &[
            "child.example.com. 86400 IN NS ns1.child.example.com.",
            "child.example.com. 86400 IN NS ns.other.net.",
        ],
        &["ns1.child.example.com. 86400 IN A 192.0.2.99"],
    )
    .await;
    let zone = child_zone();

    let status = analyse(&messenger, Arc::new(MockZoneStore::new()))
        .execute(&zone)
        .await
        .unwrap();

    assert!(status.ns_adds.is_empty() && status.ns_removes.is_empty());
    assert_eq!(status.a_adds, vec![rr("ns1.child.example.com. 3600 IN A 192.0.2.11")]);
    assert_eq!(status.a_removes.len(), 1);
    assert_eq!(status.a_removes[0].to_string(), "ns1.child.example.com.\t86400\tIN\tA\t192.0.2.99");
}

#[tokio::test]
async fn test_analysis_moves_past_silent_parent_server() {
    let messenger = MockDnsMessenger::new();
    messenger.set_silent(PARENT_NS1).await;
    script_parent(
        &messenger,
        PARENT_NS2,
        &[
            "child.example.com. 86400 IN NS ns1.child.example.com.",
            "child.example.com. 86400 IN NS ns.other.net.",
        ],
        &["ns1.child.example.com. 86400 IN A 192.0.2.11"],
    )
    .await;
    let zone = child_zone();

    let status = analyse(&messenger, Arc::new(MockZoneStore::new()))
        .execute(&zone)
        .await
        .unwrap();

    assert!(status.in_sync);
    let glue_servers: Vec<String> = messenger
        .queries()
        .await
        .into_iter()
        .filter(|q| q.2 == RecordType::A)
        .map(|q| q.0)
        .collect();
    assert!(glue_servers.iter().all(|s| s == PARENT_NS2));
}

#[tokio::test]
async fn test_analysis_fails_when_no_parent_server_answers() {
    let messenger = MockDnsMessenger::new();
    messenger.set_silent(PARENT_NS1).await;
    messenger.set_silent(PARENT_NS2).await;
    let zone = child_zone();

    let result = analyse(&messenger, Arc::new(MockZoneStore::new()))
        .execute(&zone)
        .await;

    assert!(matches!(result, Err(DomainError::DsyncDiscoveryFailed { .. })));
}

#[tokio::test]
async fn test_refused_glue_query_falls_through_to_next_parent_server() {
    // Arrange
    let messenger = MockDnsMessenger::new();
    let ns = [
        "child.example.com. 86400 IN NS ns1.child.example.com.",
        "child.example.com. 86400 IN NS ns.other.net.",
    ];
    let glue = ["ns1.child.example.com. 86400 IN A 192.0.2.11"];
    script_parent(&messenger, PARENT_NS1, &ns, &glue).await;
    script_parent(&messenger, PARENT_NS2, &ns, &glue).await;
    messenger
        .set_response(
            PARENT_NS1,
            "ns1.child.example.com.",
            RecordType::A,
            response(PARENT_NS1, Rcode::REFUSED, &[], &[]),
        )
        .await;
    let zone = child_zone();

    // Act
    let status = analyse(&messenger, Arc::new(MockZoneStore::new()))
        .execute(&zone)
        .await
        .unwrap();

    // Assert
    assert!(status.in_sync, "unexpected changes: {}", status.summary());
    assert!(status.a_adds.is_empty());
    let asked: Vec<String> = messenger
        .queries()
        .await
        .into_iter()
        .filter(|q| q.2 == RecordType::A)
        .map(|q| q.0)
        .collect();
    assert_eq!(asked, vec![PARENT_NS1.to_string(), PARENT_NS2.to_string()]);
}

#[tokio::test]
async fn test_unanswered_glue_query_fails_analysis_instead_of_reporting_adds() {
    // Arrange
    let messenger = MockDnsMessenger::new();
    script_parent(
        &messenger,
        PARENT_NS1,
        &[
            "child.example.com. 86400 IN NS ns1.child.example.com.",
            "child.example.com. 86400 IN NS ns.other.net.",
        ],
        &["ns1.child.example.com. 86400 IN A 192.0.2.11"],
    )
    .await;
    messenger
        .set_response(
            PARENT_NS1,
            "ns1.child.example.com.",
            RecordType::A,
            response(PARENT_NS1, Rcode::SERVFAIL, &[], &[]),
        )
        .await;
    messenger.set_silent(PARENT_NS2).await;
    let zone = child_zone();

    // Act
    let result = analyse(&messenger, Arc::new(MockZoneStore::new()))
        .execute(&zone)
        .await;

    // Assert
    match result {
        Err(DomainError::DsyncDiscoveryFailed { reason, .. }) => {
            assert!(reason.contains("ns1.child.example.com."), "{}", reason);
        }
        other => panic!("expected a glue failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_analysis_discovers_and_remembers_parent_servers() {
    // Arrange - no configured parent servers
    let messenger = MockDnsMessenger::new();
    messenger
        .set_response(
            RESOLVER,
            "example.com.",
            RecordType::NS,
            response(RESOLVER, Rcode::NOERROR, &["example.com. 3600 IN NS ns.example.com."], &[]),
        )
        .await;
    messenger.set_host("ns.example.com.", &["192.0.2.1"]).await;
    script_parent(
        &messenger,
        PARENT_NS1,
        &[
            "child.example.com. 86400 IN NS ns1.child.example.com.",
            "child.example.com. 86400 IN NS ns.other.net.",
        ],
        &["ns1.child.example.com. 86400 IN A 192.0.2.11"],
    )
    .await;
    let zone = MockZone::new(
        CHILD,
        &[
            "child.example.com. 3600 IN NS ns1.child.example.com.",
            "child.example.com. 3600 IN NS ns.other.net.",
            "ns1.child.example.com. 3600 IN A 192.0.2.11",
        ],
    )
    .with_parent("example.com.");

    // Act
    let status = analyse(&messenger, Arc::new(MockZoneStore::new()))
        .execute(&zone)
        .await
        .unwrap();

    // Assert
    assert!(status.in_sync);
    assert_eq!(zone.parent_servers(), vec![PARENT_NS1.to_string()]);
}

// ============================================================================
// Locally served parent
// ============================================================================

#[tokio::test]
async fn test_analysis_uses_local_parent_zone() {
    let messenger = MockDnsMessenger::new();
    let parent: Arc<dyn ZoneData> = Arc::new(MockZone::new(
        "example.com.",
        &[
            "example.com. 3600 IN NS ns.example.com.",
            "child.example.com. 3600 IN NS ns1.child.example.com.",
            "ns1.child.example.com. 3600 IN A 192.0.2.11",
        ],
    ));
    let zones = Arc::new(MockZoneStore::new().with_zone(parent));
    let zone = child_zone();

    let status = analyse(&messenger, zones).execute(&zone).await.unwrap();

    assert_eq!(status.ns_adds.len(), 1);
    assert!(status.a_adds.is_empty());
    assert!(messenger.queries().await.is_empty());
}

// ============================================================================
// Snapshot comparison
// ============================================================================

#[tokio::test]
async fn test_delegation_data_changed_between_snapshots() {
    let zone = child_zone();
    let before = zone.snapshot();
    zone.apply_actions(&[
        rr("child.example.com. 3600 IN NS ns2.child.example.com."),
        rr("ns2.child.example.com. 3600 IN AAAA 2001:db8::12"),
        rr("child.example.com. 3600 IN DNSKEY 257 3 15 AQIDBAUGBwgJCgsMDQ4PEBESExQVFhcYGRobHB0eHyA="),
    ])
    .unwrap();

    let status = delegation_data_changed(before.as_ref(), &zone);

    assert!(!status.in_sync);
    assert_eq!(status.ns_adds.len(), 1);
    assert_eq!(status.aaaa_adds.len(), 1);
    assert_eq!(status.dnskey_adds.len(), 1);
    assert!(status.has_delegation_changes());
    assert!(status.has_dnskey_changes());

    let unchanged = delegation_data_changed(&zone, &zone);
    assert!(unchanged.in_sync);
}
