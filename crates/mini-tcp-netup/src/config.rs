//! mini-tcp netup Config Format

use crate::cli::Overrides;
use color_eyre::eyre::{self, WrapErr};
use mini_tcp_host::{
    BootstrapError, CapabilityFlags, CapabilitySet, ExistingAddressPolicy, Provision, Step,
};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetupConfig {
    /// The engine binary that receives file capabilities
    pub engine: EngineConfig,

    /// The interface the engine creates and this tool configures
    pub interface: InterfaceConfig,
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Path to the engine executable
    pub path: PathBuf,

    /// Capability names to grant (e.g. `cap_net_admin`)
    pub capabilities: Vec<String>,

    /// Capability sets to grant them in, some of `eip`
    pub flags: String,
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterfaceConfig {
    /// Name of the TUN device the engine opens
    pub name: String,

    /// Address to assign to the device
    pub address: String,

    /// Prefix length of `address`
    pub prefix_len: u32,

    /// What to do when `address` is already on the device
    pub on_existing_address: ExistingAddressPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            path: PathBuf::from("target/release/mini-tcp"),
            capabilities: vec!["cap_net_admin".into()],
            flags: "eip".into(),
        }
    }
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        InterfaceConfig {
            name: "mini-tcp-tun".into(),
            address: "192.167.1.0".into(),
            prefix_len: 24,
            on_existing_address: ExistingAddressPolicy::Skip,
        }
    }
}

impl NetupConfig {
    /// Attempts to load and parse a configuration file
    ///
    /// # Arguments
    /// * `path` - Path to the TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> eyre::Result<NetupConfig> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
        let cfg: NetupConfig = toml::from_str(&contents)
            .wrap_err_with(|| format!("failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    /// Replaces configured values with any given on the command line
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(path) = &overrides.engine {
            self.engine.path = path.clone();
        }
        if let Some(name) = &overrides.interface {
            self.interface.name = name.clone();
        }
        if let Some(address) = &overrides.address {
            self.interface.address = address.clone();
        }
        if let Some(prefix_len) = overrides.prefix_len {
            self.interface.prefix_len = prefix_len;
        }
        if let Some(policy) = overrides.on_existing_address {
            self.interface.on_existing_address = policy;
        }
    }

    /// Validates the configuration into a provisioning plan
    ///
    /// # Errors
    /// The step that would consume the bad value, with `HostError::InvalidArgument`
    pub fn provision(&self) -> Result<Provision, BootstrapError> {
        let capabilities = self
            .engine
            .flags
            .parse::<CapabilityFlags>()
            .and_then(|flags| CapabilitySet::new(&self.engine.capabilities, flags))
            .map_err(|e| BootstrapError::new(Step::GrantCapabilities, e))?;

        Provision::new(
            self.engine.path.clone(),
            capabilities,
            &self.interface.name,
            &self.interface.address,
            self.interface.prefix_len,
            self.interface.on_existing_address,
        )
    }
}
