//! Validated inputs for the three provisioning operations
//!
//! Every type here is checked at construction, so a value that reaches a `HostAdmin` call is
//! already well-formed for the host tool that consumes it.

use crate::HostError;
use ipnetwork::IpNetwork;
use serde::Deserialize;
use std::{convert::TryFrom, fmt, net::IpAddr, str::FromStr};

/// Longest interface name the kernel accepts (`IFNAMSIZ` minus the trailing nul)
pub const MAX_INTERFACE_NAME_LEN: usize = 15;

/// Name of a network interface on the host (e.g. `mini-tcp-tun`, `utun4`)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InterfaceName(String);

impl InterfaceName {
    /// Validates and wraps an interface name
    ///
    /// # Arguments
    /// * `name` - Interface name to validate
    ///
    /// # Errors
    /// * `HostError::InvalidArgument` - empty, too long, `.`/`..`, or contains `/`, `:` or
    ///   whitespace
    pub fn new(name: impl Into<String>) -> Result<Self, HostError> {
        let name = name.into();

        if name.is_empty() {
            return Err(HostError::InvalidArgument(
                "interface name must not be empty".into(),
            ));
        }

        if name.len() > MAX_INTERFACE_NAME_LEN {
            return Err(HostError::InvalidArgument(format!(
                "interface name `{}` is longer than {} bytes",
                name, MAX_INTERFACE_NAME_LEN
            )));
        }

        if name == "." || name == ".." {
            return Err(HostError::InvalidArgument(format!(
                "`{}` is not a valid interface name",
                name
            )));
        }

        if name
            .chars()
            .any(|c| c == '/' || c == ':' || c.is_whitespace())
        {
            return Err(HostError::InvalidArgument(format!(
                "interface name `{}` contains a forbidden character",
                name
            )));
        }

        Ok(InterfaceName(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for InterfaceName {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InterfaceName::new(s)
    }
}

impl fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which capability sets (effective, inheritable, permitted) a grant applies to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CapabilityFlags {
    pub effective: bool,
    pub inheritable: bool,
    pub permitted: bool,
}

impl CapabilityFlags {
    /// `eip`: all three sets
    pub const ALL: CapabilityFlags = CapabilityFlags {
        effective: true,
        inheritable: true,
        permitted: true,
    };
}

impl Default for CapabilityFlags {
    fn default() -> Self {
        CapabilityFlags::ALL
    }
}

impl FromStr for CapabilityFlags {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = CapabilityFlags {
            effective: false,
            inheritable: false,
            permitted: false,
        };

        for c in s.chars() {
            let slot = match c.to_ascii_lowercase() {
                'e' => &mut flags.effective,
                'i' => &mut flags.inheritable,
                'p' => &mut flags.permitted,
                _ => {
                    return Err(HostError::InvalidArgument(format!(
                        "unknown capability flag `{}` in `{}` (expected some of `eip`)",
                        c, s
                    )))
                }
            };

            if *slot {
                return Err(HostError::InvalidArgument(format!(
                    "capability flag `{}` repeated in `{}`",
                    c, s
                )));
            }
            *slot = true;
        }

        if !(flags.effective || flags.inheritable || flags.permitted) {
            return Err(HostError::InvalidArgument(
                "at least one capability flag is required".into(),
            ));
        }

        Ok(flags)
    }
}

impl fmt::Display for CapabilityFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.effective {
            f.write_str("e")?;
        }
        if self.inheritable {
            f.write_str("i")?;
        }
        if self.permitted {
            f.write_str("p")?;
        }
        Ok(())
    }
}

/// A set of file capabilities to attach to an executable, rendered in libcap's text form
/// (e.g. `cap_net_admin=eip`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapabilitySet {
    names: Vec<String>,
    flags: CapabilityFlags,
}

impl CapabilitySet {
    /// Builds a capability set from capability names and the sets they apply to
    ///
    /// Names are case-insensitive and normalized to lowercase; duplicates are dropped.
    ///
    /// # Errors
    /// * `HostError::InvalidArgument` - no names given, or a name is not of the form `cap_*`
    pub fn new<I, S>(names: I, flags: CapabilityFlags) -> Result<Self, HostError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim().to_ascii_lowercase();
            let valid = name
                .strip_prefix("cap_")
                .map(|rest| {
                    !rest.is_empty()
                        && rest
                            .chars()
                            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
                })
                .unwrap_or(false);

            if !valid {
                return Err(HostError::InvalidArgument(format!(
                    "`{}` is not a capability name",
                    name
                )));
            }

            if !set.contains(&name) {
                set.push(name);
            }
        }

        if set.is_empty() {
            return Err(HostError::InvalidArgument(
                "at least one capability is required".into(),
            ));
        }

        Ok(CapabilitySet { names: set, flags })
    }

    /// `cap_net_admin=eip`, what the engine needs to open and configure its TUN device
    pub fn net_admin() -> Self {
        CapabilitySet {
            names: vec!["cap_net_admin".into()],
            flags: CapabilityFlags::ALL,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn flags(&self) -> CapabilityFlags {
        self.flags
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.names.join(","), self.flags)
    }
}

/// An address and prefix bound to a named interface
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressAssignment {
    interface: InterfaceName,
    network: IpNetwork,
}

impl AddressAssignment {
    /// Pairs an interface with an address/prefix, checking the prefix against the address family
    ///
    /// # Arguments
    /// * `interface` - Interface that will carry the address
    /// * `address` - IPv4 or IPv6 address
    /// * `prefix_len` - `0..=32` for IPv4, `0..=128` for IPv6
    ///
    /// # Errors
    /// * `HostError::InvalidArgument` - prefix out of range for the address family
    pub fn new(
        interface: InterfaceName,
        address: IpAddr,
        prefix_len: u32,
    ) -> Result<Self, HostError> {
        let out_of_range = || {
            let max = match address {
                IpAddr::V4(_) => 32,
                IpAddr::V6(_) => 128,
            };
            HostError::InvalidArgument(format!(
                "prefix length {} is out of range for {} (0..={})",
                prefix_len, address, max
            ))
        };

        let prefix = u8::try_from(prefix_len).map_err(|_| out_of_range())?;
        let network = IpNetwork::new(address, prefix).map_err(|_| out_of_range())?;

        Ok(AddressAssignment { interface, network })
    }

    /// Like `new`, but parses the address from its textual form
    ///
    /// # Errors
    /// * `HostError::InvalidArgument` - malformed address or prefix out of range
    pub fn parse(
        interface: InterfaceName,
        address: &str,
        prefix_len: u32,
    ) -> Result<Self, HostError> {
        let ip: IpAddr = address.trim().parse().map_err(|_| {
            HostError::InvalidArgument(format!("`{}` is not an IP address", address))
        })?;
        AddressAssignment::new(interface, ip, prefix_len)
    }

    pub fn interface(&self) -> &InterfaceName {
        &self.interface
    }

    /// Address and prefix, e.g. `192.167.1.0/24`
    pub fn network(&self) -> IpNetwork {
        self.network
    }
}

impl fmt::Display for AddressAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.network, self.interface)
    }
}

/// Administrative state of an interface
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    Up,
    Down,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Up => f.write_str("up"),
            LinkState::Down => f.write_str("down"),
        }
    }
}

/// What to do when the address is already assigned to the interface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistingAddressPolicy {
    /// Treat the existing assignment as a no-op success
    Skip,

    /// Abort the sequence with `HostError::Conflict`
    Fail,
}

impl Default for ExistingAddressPolicy {
    fn default() -> Self {
        ExistingAddressPolicy::Skip
    }
}

impl FromStr for ExistingAddressPolicy {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(ExistingAddressPolicy::Skip),
            "fail" => Ok(ExistingAddressPolicy::Fail),
            other => Err(HostError::InvalidArgument(format!(
                "unknown existing-address policy `{}` (expected `skip` or `fail`)",
                other
            ))),
        }
    }
}

impl fmt::Display for ExistingAddressPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExistingAddressPolicy::Skip => f.write_str("skip"),
            ExistingAddressPolicy::Fail => f.write_str("fail"),
        }
    }
}
