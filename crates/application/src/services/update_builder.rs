use ferrous_dsync_domain::name::is_in_bailiwick;
use ferrous_dsync_domain::{RecordType, ResourceRecord, UpdateMessage};

/// Builds the UPDATE that replays a delegation diff at the parent.
///
/// Removals are sent as class NONE with TTL 0. Removing an in-bailiwick
/// NS also deletes that host's A and AAAA RRsets so no orphaned glue
/// stays behind.
pub fn create_update(
    parent_zone: &str,
    child: &str,
    adds: &[ResourceRecord],
    removes: &[ResourceRecord],
) -> UpdateMessage {
    let mut msg = UpdateMessage::new(parent_zone);

    for rr in removes {
        push_unique(&mut msg.actions, rr.as_delete());
        if let Some(target) = rr.data.ns_target() {
            if is_in_bailiwick(target, child) {
                push_unique(
                    &mut msg.actions,
                    ResourceRecord::delete_rrset(target, RecordType::A),
                );
                push_unique(
                    &mut msg.actions,
                    ResourceRecord::delete_rrset(target, RecordType::AAAA),
                );
            }
        }
    }

    for rr in adds {
        let mut add = rr.clone();
        add.class = ferrous_dsync_domain::RecordClass::IN;
        push_unique(&mut msg.actions, add);
    }

    msg
}

fn push_unique(actions: &mut Vec<ResourceRecord>, rr: ResourceRecord) {
    if !actions.iter().any(|existing| existing.is_duplicate(&rr)) {
        actions.push(rr);
    }
}
