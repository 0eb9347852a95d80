//! mini-tcp Host Library
//!
//! Prepares a host so the `mini-tcp` engine can exchange raw IP packets over its TUN device:
//! the engine binary gets `cap_net_admin`, the engine's interface gets an address, and the
//! interface is brought up. Every host mutation goes through the [`HostAdmin`] trait so the
//! sequence can run against the real host, a dry run, or a test double.

pub mod bootstrap;
pub mod cmd;
mod host;
mod types;

pub use bootstrap::{Bootstrap, BootstrapError, Outcome, Provision, Report, Step};
pub use host::{DryRun, NativeHost};
pub use types::{
    AddressAssignment, CapabilityFlags, CapabilitySet, ExistingAddressPolicy, InterfaceName,
    LinkState, MAX_INTERFACE_NAME_LEN,
};

use std::path::Path;

/// Failures reported by the host's network administration tooling
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// The host tool failed in a way that doesn't fit any other category
    #[error("host command failed: {0}")]
    Failed(String),
}

/// Side-effecting operations against the host's network configuration
///
/// The targets (file capabilities, the interface table) are global to the host; implementations
/// don't lock or retry, each call is attempted exactly once and blocks until the host answers.
pub trait HostAdmin {
    /// Attaches `capabilities` to the file at `executable`
    ///
    /// # Arguments
    /// * `executable` - Path to the engine binary
    /// * `capabilities` - Capabilities and the sets (effective/inheritable/permitted) to grant
    ///
    /// # Errors
    /// * `HostError::NotFound` - `executable` does not exist
    /// * `HostError::PermissionDenied` - caller may not change file capabilities
    /// * `HostError::Unsupported` - the host has no file capability mechanism
    fn grant_capabilities(
        &mut self,
        executable: &Path,
        capabilities: &CapabilitySet,
    ) -> Result<(), HostError>;

    /// Adds an address/prefix to an existing interface
    ///
    /// # Errors
    /// * `HostError::NotFound` - the interface does not exist
    /// * `HostError::Conflict` - the address is already assigned (for IPv6 the kernel reports
    ///   this whatever the existing prefix is)
    /// * `HostError::PermissionDenied` - caller may not administer interfaces
    fn assign_address(&mut self, assignment: &AddressAssignment) -> Result<(), HostError>;

    /// Reports whether exactly this address and prefix is bound to the interface
    ///
    /// # Errors
    /// * `HostError::NotFound` - the interface does not exist
    fn existing_address(&mut self, assignment: &AddressAssignment) -> Result<bool, HostError>;

    /// Transitions an interface's administrative state; a no-op if already in `state`
    ///
    /// # Errors
    /// * `HostError::NotFound` - the interface does not exist
    /// * `HostError::PermissionDenied` - caller may not administer interfaces
    fn set_link_state(
        &mut self,
        interface: &InterfaceName,
        state: LinkState,
    ) -> Result<(), HostError>;
}

impl<H: HostAdmin + ?Sized> HostAdmin for &mut H {
    fn grant_capabilities(
        &mut self,
        executable: &Path,
        capabilities: &CapabilitySet,
    ) -> Result<(), HostError> {
        (**self).grant_capabilities(executable, capabilities)
    }

    fn assign_address(&mut self, assignment: &AddressAssignment) -> Result<(), HostError> {
        (**self).assign_address(assignment)
    }

    fn existing_address(&mut self, assignment: &AddressAssignment) -> Result<bool, HostError> {
        (**self).existing_address(assignment)
    }

    fn set_link_state(
        &mut self,
        interface: &InterfaceName,
        state: LinkState,
    ) -> Result<(), HostError> {
        (**self).set_link_state(interface, state)
    }
}

#[cfg(test)]
mod tests;
