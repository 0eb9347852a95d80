//! Common Shared Test Functions

use crate::{
    AddressAssignment, CapabilitySet, ExistingAddressPolicy, HostAdmin, HostError, InterfaceName,
    LinkState, Provision,
};
use ipnetwork::IpNetwork;
use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

pub const ENGINE: &str = "target/release/mini-tcp";
pub const TUN: &str = "mini-tcp-tun";

/// A host operation as seen by `FakeHost`, recorded whether or not it succeeded
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Grant(PathBuf, String),
    Assign(String, IpNetwork),
    Query(String, IpNetwork),
    Link(String, LinkState),
}

#[derive(Debug, Default)]
pub struct FakeInterface {
    pub up: bool,
    pub addresses: Vec<IpNetwork>,
}

/// In-memory host that behaves like the kernel for the operations we issue
#[derive(Debug)]
pub struct FakeHost {
    pub privileged: bool,
    pub executables: HashSet<PathBuf>,
    pub capabilities: HashMap<PathBuf, String>,
    pub interfaces: HashMap<String, FakeInterface>,
    pub calls: Vec<Call>,
}

impl FakeHost {
    /// A privileged host with nothing on it
    pub fn new() -> Self {
        FakeHost {
            privileged: true,
            executables: HashSet::new(),
            capabilities: HashMap::new(),
            interfaces: HashMap::new(),
            calls: Vec::new(),
        }
    }

    /// The engine binary is built and has created its TUN device
    pub fn ready() -> Self {
        FakeHost::new().with_engine(ENGINE).with_interface(TUN)
    }

    pub fn with_engine(mut self, path: impl Into<PathBuf>) -> Self {
        self.executables.insert(path.into());
        self
    }

    pub fn with_interface(mut self, name: &str) -> Self {
        self.interfaces.insert(name.into(), FakeInterface::default());
        self
    }

    pub fn unprivileged(mut self) -> Self {
        self.privileged = false;
        self
    }

    pub fn interface(&self, name: &str) -> &FakeInterface {
        &self.interfaces[name]
    }

    fn check_privilege(&self, what: &str) -> Result<(), HostError> {
        match self.privileged {
            true => Ok(()),
            false => Err(HostError::PermissionDenied(format!("{}: Operation not permitted", what))),
        }
    }
}

impl HostAdmin for FakeHost {
    fn grant_capabilities(
        &mut self,
        executable: &Path,
        capabilities: &CapabilitySet,
    ) -> Result<(), HostError> {
        self.calls
            .push(Call::Grant(executable.to_path_buf(), capabilities.to_string()));

        if !self.executables.contains(executable) {
            return Err(HostError::NotFound(format!(
                "executable `{}` does not exist",
                executable.display()
            )));
        }
        self.check_privilege("setcap")?;

        self.capabilities
            .insert(executable.to_path_buf(), capabilities.to_string());
        Ok(())
    }

    fn assign_address(&mut self, assignment: &AddressAssignment) -> Result<(), HostError> {
        let name = assignment.interface().as_str();
        let network = assignment.network();
        self.calls.push(Call::Assign(name.into(), network));

        self.check_privilege("ip address add")?;
        let iface = self
            .interfaces
            .get_mut(name)
            .ok_or_else(|| HostError::NotFound(format!("Cannot find device \"{}\"", name)))?;

        // IPv4 allows the same address under several prefixes, IPv6 rejects the address itself
        let clash = iface.addresses.iter().any(|bound| match (bound, network) {
            (IpNetwork::V6(bound), IpNetwork::V6(wanted)) => bound.ip() == wanted.ip(),
            _ => *bound == network,
        });
        if clash {
            return Err(HostError::Conflict("RTNETLINK answers: File exists".into()));
        }
        iface.addresses.push(network);
        Ok(())
    }

    fn existing_address(&mut self, assignment: &AddressAssignment) -> Result<bool, HostError> {
        let name = assignment.interface().as_str();
        let network = assignment.network();
        self.calls.push(Call::Query(name.into(), network));

        let iface = self
            .interfaces
            .get(name)
            .ok_or_else(|| HostError::NotFound(format!("Cannot find device \"{}\"", name)))?;
        Ok(iface.addresses.contains(&network))
    }

    fn set_link_state(
        &mut self,
        interface: &InterfaceName,
        state: LinkState,
    ) -> Result<(), HostError> {
        let name = interface.as_str();
        self.calls.push(Call::Link(name.into(), state));

        self.check_privilege("ip link set")?;
        let iface = self
            .interfaces
            .get_mut(name)
            .ok_or_else(|| HostError::NotFound(format!("Cannot find device \"{}\"", name)))?;

        iface.up = state == LinkState::Up;
        Ok(())
    }
}

/// `cap_net_admin=eip` on the engine, `192.167.1.0/24` on `mini-tcp-tun`
pub fn plan(policy: ExistingAddressPolicy) -> Provision {
    Provision::new(
        ENGINE,
        CapabilitySet::net_admin(),
        TUN,
        "192.167.1.0",
        24,
        policy,
    )
    .expect("default plan is valid")
}
