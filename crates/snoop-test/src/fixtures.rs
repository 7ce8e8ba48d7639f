//! Interface status fixtures
//!
//! Provides `show interface status` outputs in the shapes seen on IOS
//! access and distribution switches.

/// Header line of the status table
pub const STATUS_HEADER: &str = "Port      Name   Status  Vlan  Duplex";

/// Separator line under the header
pub const STATUS_SEPARATOR: &str = "--------  -----  ------  ----  ------";

/// Mixed access/trunk switch: Gi1/0/2 is the only trunk
pub const SAMPLE_STATUS: &str = "\
Port      Name   Status  Vlan  Duplex
--------  -----  ------  ----  ------
Gi1/0/1          connected  10
Gi1/0/2          trunk      trunk
Fa1/0/3          notconnect 10";

/// Builds a status table from `(port, status, vlan)` rows
pub fn status_table(rows: &[(&str, &str, &str)]) -> String {
    let mut lines = vec![STATUS_HEADER.to_string(), STATUS_SEPARATOR.to_string()];
    for (port, status, vlan) in rows {
        lines.push(format!("{:<10}       {:<10} {}", port, status, vlan));
    }
    lines.join("\n")
}

/// Status with `count` connected access ports `Gi1/0/1..`
pub fn access_ports(count: usize) -> String {
    let names: Vec<String> = (1..=count).map(|i| format!("Gi1/0/{}", i)).collect();
    let rows: Vec<(&str, &str, &str)> = names
        .iter()
        .map(|n| (n.as_str(), "connected", "10"))
        .collect();
    status_table(&rows)
}

/// Status with only non-Ethernet interfaces
pub fn no_candidate_ports() -> String {
    status_table(&[("Te1/1/1", "connected", "1"), ("Po1", "connected", "1")])
}

/// Status output truncated to a single line
pub fn truncated_status() -> String {
    STATUS_HEADER.to_string()
}
