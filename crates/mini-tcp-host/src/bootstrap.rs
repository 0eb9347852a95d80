//! Bootstrap sequence: capability grant, address assignment, link activation
//!
//! The steps run strictly in order and the first failure aborts the rest. Nothing is rolled
//! back, so a run that fails at step 2 leaves the capability from step 1 on the binary.

use crate::{
    AddressAssignment, CapabilitySet, ExistingAddressPolicy, HostAdmin, HostError, InterfaceName,
    LinkState,
};
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// One of the three provisioning steps
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    GrantCapabilities,
    AssignAddress,
    ActivateLink,
}

impl Step {
    /// 1-based position of the step in the sequence
    pub fn number(self) -> u8 {
        match self {
            Step::GrantCapabilities => 1,
            Step::AssignAddress => 2,
            Step::ActivateLink => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Step::GrantCapabilities => "capability grant",
            Step::AssignAddress => "address assignment",
            Step::ActivateLink => "link activation",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.name())
    }
}

/// The step that failed and the host's reason
#[derive(Debug, thiserror::Error)]
#[error("{step} failed: {source}")]
pub struct BootstrapError {
    pub step: Step,
    #[source]
    pub source: HostError,
}

impl BootstrapError {
    pub fn new(step: Step, source: HostError) -> Self {
        BootstrapError { step, source }
    }
}

/// How a completed step left the host
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The host was changed (or the host tool reported success)
    Applied,

    /// The state was already present and the step was treated as a no-op
    AlreadyPresent,
}

/// Completed steps, in the order they ran
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub steps: Vec<(Step, Outcome)>,
}

impl Report {
    pub fn outcome(&self, step: Step) -> Option<Outcome> {
        self.steps.iter().find(|(s, _)| *s == step).map(|(_, o)| *o)
    }
}

/// Everything the sequence needs, validated before any host call is made
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Provision {
    engine: PathBuf,
    capabilities: CapabilitySet,
    assignment: AddressAssignment,
    on_existing_address: ExistingAddressPolicy,
}

impl Provision {
    /// Validates the raw inputs of a provisioning run
    ///
    /// Errors are attributed to the step that would have consumed the bad value, so an
    /// out-of-range prefix is reported as a failed address assignment even though no host call
    /// was made.
    ///
    /// # Arguments
    /// * `engine` - Path to the engine executable
    /// * `capabilities` - Capabilities to grant the engine
    /// * `interface` - Name of the interface the engine creates
    /// * `address` - Address literal to assign
    /// * `prefix_len` - Prefix length for `address`
    /// * `on_existing_address` - What to do when the address is already assigned
    pub fn new(
        engine: impl Into<PathBuf>,
        capabilities: CapabilitySet,
        interface: &str,
        address: &str,
        prefix_len: u32,
        on_existing_address: ExistingAddressPolicy,
    ) -> Result<Self, BootstrapError> {
        let engine = engine.into();
        if engine.as_os_str().is_empty() {
            return Err(BootstrapError::new(
                Step::GrantCapabilities,
                HostError::InvalidArgument("engine path must not be empty".into()),
            ));
        }

        let assignment = InterfaceName::new(interface)
            .and_then(|name| AddressAssignment::parse(name, address, prefix_len))
            .map_err(|e| BootstrapError::new(Step::AssignAddress, e))?;

        Ok(Provision {
            engine,
            capabilities,
            assignment,
            on_existing_address,
        })
    }

    pub fn engine(&self) -> &Path {
        &self.engine
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn assignment(&self) -> &AddressAssignment {
        &self.assignment
    }

    pub fn interface(&self) -> &InterfaceName {
        self.assignment.interface()
    }

    pub fn on_existing_address(&self) -> ExistingAddressPolicy {
        self.on_existing_address
    }
}

/// Runs the provisioning sequence against a host
pub struct Bootstrap<H> {
    host: H,
}

impl<H: HostAdmin> Bootstrap<H> {
    pub fn new(host: H) -> Self {
        Bootstrap { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Grants capabilities, assigns the address, then brings the link up
    ///
    /// # Arguments
    /// * `plan` - Validated provisioning inputs
    ///
    /// # Errors
    /// Returns the first failing step with the host's error. Later steps are not attempted.
    pub fn run(&mut self, plan: &Provision) -> Result<Report, BootstrapError> {
        let mut report = Report::default();

        tracing::info!(
            engine = %plan.engine().display(),
            capabilities = %plan.capabilities(),
            "granting capabilities"
        );
        self.host
            .grant_capabilities(plan.engine(), plan.capabilities())
            .map_err(|e| BootstrapError::new(Step::GrantCapabilities, e))?;
        report.steps.push((Step::GrantCapabilities, Outcome::Applied));

        tracing::info!(assignment = %plan.assignment(), "assigning address");
        let outcome = match self.host.assign_address(plan.assignment()) {
            Ok(()) => Outcome::Applied,
            Err(HostError::Conflict(detail))
                if plan.on_existing_address() == ExistingAddressPolicy::Skip =>
            {
                // an IPv6 address bound with another prefix is also reported as a conflict
                let identical = self
                    .host
                    .existing_address(plan.assignment())
                    .map_err(|e| BootstrapError::new(Step::AssignAddress, e))?;
                if !identical {
                    return Err(BootstrapError::new(
                        Step::AssignAddress,
                        HostError::Conflict(format!(
                            "{} (the address is bound to {} with a different prefix)",
                            detail,
                            plan.interface()
                        )),
                    ));
                }
                tracing::warn!(%detail, "address already assigned, continuing");
                Outcome::AlreadyPresent
            }
            Err(e) => return Err(BootstrapError::new(Step::AssignAddress, e)),
        };
        report.steps.push((Step::AssignAddress, outcome));

        tracing::info!(interface = %plan.interface(), "bringing link up");
        self.host
            .set_link_state(plan.interface(), LinkState::Up)
            .map_err(|e| BootstrapError::new(Step::ActivateLink, e))?;
        report.steps.push((Step::ActivateLink, Outcome::Applied));

        Ok(report)
    }
}
