//! Linux Specific OS interface

use crate::{
    cmd, cmd::ShellCommand, AddressAssignment, CapabilitySet, HostError, InterfaceName, LinkState,
};
use ipnetwork::IpNetwork;
use std::path::Path;

/// Grants file capabilities with libcap's `setcap`
///
/// # Arguments
/// * `executable` - Path of the binary to mark (e.g. `target/release/mini-tcp`)
/// * `capabilities` - Capability set in libcap text form (e.g. `cap_net_admin=eip`)
pub fn grant_command(
    executable: &Path,
    capabilities: &CapabilitySet,
) -> Result<ShellCommand, HostError> {
    Ok(cmd!("setcap", capabilities.to_string(), executable))
}

/// Assigns an IP address to a network interface
///
/// # Arguments
/// * `assignment` - Interface plus address and prefix (e.g. `192.167.1.0/24`)
pub fn address_command(assignment: &AddressAssignment) -> Result<ShellCommand, HostError> {
    Ok(cmd!(
        "ip",
        "address",
        "add",
        assignment.network().to_string(),
        "dev",
        assignment.interface().as_str()
    ))
}

/// Sets the administrative state of a network interface
pub fn link_command(interface: &InterfaceName, state: LinkState) -> Result<ShellCommand, HostError> {
    Ok(cmd!(
        "ip",
        "link",
        "set",
        "dev",
        interface.as_str(),
        state.to_string()
    ))
}

/// Lists the addresses of a network interface, one line per address
pub fn address_query_command(interface: &InterfaceName) -> Result<ShellCommand, HostError> {
    Ok(cmd!("ip", "-o", "address", "show", "dev", interface.as_str()))
}

/// Extracts the bound networks from `ip -o address show` output
///
/// Lines look like `5: mini-tcp-tun    inet 192.167.1.0/24 scope global mini-tcp-tun`; the token
/// after `inet`/`inet6` is the local address and prefix.
pub fn parse_addresses(output: &str) -> Vec<IpNetwork> {
    let mut found = Vec::new();
    for line in output.lines() {
        let mut tokens = line.split_whitespace();
        while let Some(token) = tokens.next() {
            if token == "inet" || token == "inet6" {
                if let Some(net) = tokens.next().and_then(|t| t.parse::<IpNetwork>().ok()) {
                    found.push(net);
                }
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tun() -> InterfaceName {
        InterfaceName::new("mini-tcp-tun").unwrap()
    }

    #[test]
    fn setcap_line() {
        let c = grant_command(Path::new("target/release/mini-tcp"), &CapabilitySet::net_admin())
            .unwrap();
        assert_eq!(c.to_string(), "setcap cap_net_admin=eip target/release/mini-tcp");
    }

    #[test]
    fn ip_address_line() {
        let a = AddressAssignment::parse(tun(), "192.167.1.0", 24).unwrap();
        assert_eq!(
            address_command(&a).unwrap().to_string(),
            "ip address add 192.167.1.0/24 dev mini-tcp-tun"
        );

        let a = AddressAssignment::parse(tun(), "fd00::1", 64).unwrap();
        assert_eq!(
            address_command(&a).unwrap().to_string(),
            "ip address add fd00::1/64 dev mini-tcp-tun"
        );
    }

    #[test]
    fn ip_address_show_output() {
        assert_eq!(
            address_query_command(&tun()).unwrap().to_string(),
            "ip -o address show dev mini-tcp-tun"
        );

        let out = "\
7: mini-tcp-tun    inet 192.167.1.0/24 scope global mini-tcp-tun\\       valid_lft forever preferred_lft forever
7: mini-tcp-tun    inet6 fd00::1/64 scope global \\       valid_lft forever preferred_lft forever
7: mini-tcp-tun    inet6 fe80::1/64 scope link \\       valid_lft forever preferred_lft forever
";
        let nets: Vec<String> = parse_addresses(out).iter().map(|n| n.to_string()).collect();
        assert_eq!(nets, vec!["192.167.1.0/24", "fd00::1/64", "fe80::1/64"]);
        assert!(parse_addresses("").is_empty());
    }

    #[test]
    fn ip_link_line() {
        assert_eq!(
            link_command(&tun(), LinkState::Up).unwrap().to_string(),
            "ip link set dev mini-tcp-tun up"
        );
        assert_eq!(
            link_command(&tun(), LinkState::Down).unwrap().to_string(),
            "ip link set dev mini-tcp-tun down"
        );
    }
}
