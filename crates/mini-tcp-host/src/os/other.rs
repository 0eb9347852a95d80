//! Fallback for platforms without a supported network administration toolset

use crate::{cmd::ShellCommand, AddressAssignment, CapabilitySet, HostError, InterfaceName, LinkState};
use ipnetwork::IpNetwork;
use std::{env::consts::OS, path::Path};

fn unsupported(what: &str) -> HostError {
    HostError::Unsupported(format!("{} is not implemented on {}", what, OS))
}

pub fn grant_command(
    _executable: &Path,
    _capabilities: &CapabilitySet,
) -> Result<ShellCommand, HostError> {
    Err(unsupported("capability grant"))
}

pub fn address_command(_assignment: &AddressAssignment) -> Result<ShellCommand, HostError> {
    Err(unsupported("address assignment"))
}

pub fn link_command(_interface: &InterfaceName, _state: LinkState) -> Result<ShellCommand, HostError> {
    Err(unsupported("link activation"))
}

pub fn address_query_command(_interface: &InterfaceName) -> Result<ShellCommand, HostError> {
    Err(unsupported("address lookup"))
}

pub fn parse_addresses(_output: &str) -> Vec<IpNetwork> {
    Vec::new()
}
