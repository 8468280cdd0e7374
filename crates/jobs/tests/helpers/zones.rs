use ferrous_dsync_domain::config::ZoneOption;
use ferrous_dsync_domain::ResourceRecord;
use ferrous_dsync_infrastructure::zone::{parse_zone, MemoryZone};

pub const PARENT_ZONE: &str = "
$ORIGIN example.
@       3600 IN SOA ns1.example. hostmaster.example. 100 7200 3600 1209600 300
        3600 IN NS  ns1.example.
ns1     3600 IN A   192.0.2.1
child   3600 IN NS  ns1.child
ns1.child 3600 IN A 192.0.2.53
";

pub const CHILD_ZONE: &str = "
$ORIGIN child.example.
@       3600 IN SOA ns1.child.example. hostmaster.child.example. 1 7200 3600 1209600 300
        3600 IN NS  ns1
ns1     3600 IN A   192.0.2.53
www     3600 IN A   192.0.2.80
";

pub fn rr(text: &str) -> ResourceRecord {
    text.parse().unwrap()
}

pub fn parent_zone() -> MemoryZone {
    MemoryZone::from_records(
        "example.",
        vec![ZoneOption::AllowChildUpdates],
        parse_zone(PARENT_ZONE, "example.").unwrap(),
    )
    .unwrap()
}

pub fn child_zone(options: Vec<ZoneOption>) -> MemoryZone {
    MemoryZone::from_records(
        "child.example.",
        options,
        parse_zone(CHILD_ZONE, "child.example.").unwrap(),
    )
    .unwrap()
}
