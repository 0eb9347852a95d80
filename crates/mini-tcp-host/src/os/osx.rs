//! MacOS Specific OS interface

use crate::{
    cmd, cmd::ShellCommand, AddressAssignment, CapabilitySet, HostError, InterfaceName, LinkState,
};
use ipnetwork::IpNetwork;
use std::{
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    path::Path,
};

/// MacOS has no file capabilities; the engine has to run as root instead
pub fn grant_command(
    executable: &Path,
    _capabilities: &CapabilitySet,
) -> Result<ShellCommand, HostError> {
    Err(HostError::Unsupported(format!(
        "file capabilities are not available on macos (cannot mark `{}`)",
        executable.display()
    )))
}

/// Assigns an IP address to a network interface as an alias
///
/// # Arguments
/// * `assignment` - Interface plus address and prefix (e.g. `192.167.1.0/24`)
pub fn address_command(assignment: &AddressAssignment) -> Result<ShellCommand, HostError> {
    let name = assignment.interface().as_str();
    let cmd = match assignment.network() {
        IpNetwork::V4(net) => cmd!(
            "ifconfig",
            name,
            "inet",
            net.ip().to_string(),
            "netmask",
            net.mask().to_string(),
            "alias"
        ),
        IpNetwork::V6(net) => cmd!(
            "ifconfig",
            name,
            "inet6",
            net.ip().to_string(),
            "prefixlen",
            net.prefix().to_string(),
            "alias"
        ),
    };
    Ok(cmd)
}

/// Shows the configuration of a network interface, including its addresses
pub fn address_query_command(interface: &InterfaceName) -> Result<ShellCommand, HostError> {
    Ok(cmd!("ifconfig", interface.as_str()))
}

/// Extracts the bound networks from `ifconfig <if>` output
///
/// IPv4 lines carry a hex netmask (`inet 192.167.1.0 netmask 0xffffff00`), IPv6 lines a
/// `prefixlen` and possibly a `%scope` suffix on the address.
pub fn parse_addresses(output: &str) -> Vec<IpNetwork> {
    let mut found = Vec::new();
    for line in output.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let net = match tokens.as_slice() {
            ["inet", ip, "netmask", mask, ..] => {
                let ip: Option<Ipv4Addr> = ip.parse().ok();
                let mask = u32::from_str_radix(mask.trim_start_matches("0x"), 16).ok();
                match (ip, mask) {
                    (Some(ip), Some(mask)) => {
                        IpNetwork::new(IpAddr::V4(ip), mask.count_ones() as u8).ok()
                    }
                    _ => None,
                }
            }
            ["inet6", ip, "prefixlen", prefix, ..] => {
                let ip = ip.split('%').next().and_then(|ip| ip.parse::<Ipv6Addr>().ok());
                let prefix = prefix.parse::<u8>().ok();
                match (ip, prefix) {
                    (Some(ip), Some(prefix)) => IpNetwork::new(IpAddr::V6(ip), prefix).ok(),
                    _ => None,
                }
            }
            _ => None,
        };
        found.extend(net);
    }
    found
}

/// Sets the administrative state of a network interface
pub fn link_command(interface: &InterfaceName, state: LinkState) -> Result<ShellCommand, HostError> {
    Ok(cmd!("ifconfig", interface.as_str(), state.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ifconfig_lines() {
        let tun = InterfaceName::new("utun9").unwrap();
        let a = AddressAssignment::parse(tun.clone(), "192.167.1.0", 24).unwrap();
        assert_eq!(
            address_command(&a).unwrap().to_string(),
            "ifconfig utun9 inet 192.167.1.0 netmask 255.255.255.0 alias"
        );
        assert_eq!(
            link_command(&tun, LinkState::Up).unwrap().to_string(),
            "ifconfig utun9 up"
        );
        assert_eq!(
            address_query_command(&tun).unwrap().to_string(),
            "ifconfig utun9"
        );
        assert!(matches!(
            grant_command(Path::new("mini-tcp"), &CapabilitySet::net_admin()),
            Err(HostError::Unsupported(_))
        ));
    }

    #[test]
    fn ifconfig_output() {
        let out = "\
utun9: flags=8051<UP,POINTOPOINT,RUNNING,MULTICAST> mtu 1500
\tinet 192.167.1.0 netmask 0xffffff00
\tinet6 fe80::1%utun9 prefixlen 64 scopeid 0x12
\tinet6 fd00::1 prefixlen 48
";
        let nets: Vec<String> = parse_addresses(out).iter().map(|n| n.to_string()).collect();
        assert_eq!(nets, vec!["192.167.1.0/24", "fe80::1/64", "fd00::1/48"]);
    }
}
