//! IOS command builders for DHCP snooping

/// Leave interface configuration context
pub const EXIT_CMD: &str = "exit";

/// Default interface status query
pub const DEFAULT_STATUS_CMD: &str = "show interface status";

/// Default save command
pub const DEFAULT_SAVE_CMD: &str = "write memory";

/// Default snooping VLAN scope
pub const DEFAULT_SNOOPING_VLANS: &str = "10,26-47,51,61,67";

/// Default DHCP packets per second accepted on access ports
pub const DEFAULT_ACCESS_RATE_LIMIT: u32 = 64;

/// Build interface context command
pub fn build_interface_cmd(port: &str) -> String {
    format!("interface {}", port)
}

/// Build trust batch for a trunk port
pub fn build_trust_cmds(port: &str) -> Vec<String> {
    vec![
        build_interface_cmd(port),
        "ip dhcp snooping trust".to_string(),
        EXIT_CMD.to_string(),
    ]
}

/// Build rate-limit batch for an access port
pub fn build_rate_limit_cmds(port: &str, rate: u32) -> Vec<String> {
    vec![
        build_interface_cmd(port),
        format!("ip dhcp snooping limit rate {}", rate),
        EXIT_CMD.to_string(),
    ]
}

/// Build snooping VLAN scope command
pub fn build_snooping_vlan_cmd(vlans: &str) -> String {
    format!("ip dhcp snooping vlan {}", vlans)
}

/// Build option 82 insertion command
pub fn build_option82_cmd(enabled: bool) -> String {
    if enabled {
        "ip dhcp snooping information option".to_string()
    } else {
        "no ip dhcp snooping information option".to_string()
    }
}

/// Build global snooping command set
///
/// Order: VLAN scope, option 82 handling, then the global enable.
pub fn build_global_cmds(vlans: &str, allow_untrusted: bool, option82: bool) -> Vec<String> {
    let mut cmds = vec![build_snooping_vlan_cmd(vlans)];
    if allow_untrusted {
        cmds.push("ip dhcp snooping information option allow-untrusted".to_string());
    }
    cmds.push(build_option82_cmd(option82));
    cmds.push("ip dhcp snooping".to_string());
    cmds
}
