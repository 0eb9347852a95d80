//! Host backends: the native tooling for this platform and a dry run that only prints commands

#[cfg_attr(target_os = "linux", path = "os/linux.rs")]
#[cfg_attr(target_os = "macos", path = "os/osx.rs")]
#[cfg_attr(
    not(any(target_os = "linux", target_os = "macos")),
    path = "os/other.rs"
)]
mod os;

use crate::{
    cmd::{ShellCommand, ShellCommandError},
    AddressAssignment, CapabilitySet, HostAdmin, HostError, InterfaceName, LinkState,
};
use std::{fs, io, path::Path};

/// Configures the host by running the platform's own tools
///
/// * Linux: `setcap` (libcap) and `ip` (iproute2)
/// * MacOS: `ifconfig`; file capabilities are not supported
/// * Anything else: every operation is unsupported
#[derive(Debug, Default)]
pub struct NativeHost;

impl NativeHost {
    pub fn new() -> Self {
        NativeHost
    }

    fn run(cmd: ShellCommand) -> Result<String, HostError> {
        let line = cmd.to_string();
        cmd.execute().map_err(|error| {
            tracing::debug!(%line, %error, "host command failed");
            classify(&line, error)
        })
    }
}

impl HostAdmin for NativeHost {
    fn grant_capabilities(
        &mut self,
        executable: &Path,
        capabilities: &CapabilitySet,
    ) -> Result<(), HostError> {
        // setcap's own message for a missing file is ambiguous, so check up front
        let meta = fs::metadata(executable).map_err(|error| match error.kind() {
            io::ErrorKind::NotFound => {
                HostError::NotFound(format!("executable `{}` does not exist", executable.display()))
            }
            io::ErrorKind::PermissionDenied => HostError::PermissionDenied(format!(
                "cannot access `{}`: {}",
                executable.display(),
                error
            )),
            _ => HostError::Failed(format!("cannot access `{}`: {}", executable.display(), error)),
        })?;

        if !meta.is_file() {
            return Err(HostError::InvalidArgument(format!(
                "`{}` is not a regular file",
                executable.display()
            )));
        }

        Self::run(os::grant_command(executable, capabilities)?)?;
        Ok(())
    }

    fn assign_address(&mut self, assignment: &AddressAssignment) -> Result<(), HostError> {
        Self::run(os::address_command(assignment)?)?;
        Ok(())
    }

    fn existing_address(&mut self, assignment: &AddressAssignment) -> Result<bool, HostError> {
        let output = Self::run(os::address_query_command(assignment.interface())?)?;
        let bound = os::parse_addresses(&output);
        tracing::debug!(interface = %assignment.interface(), ?bound, "addresses on interface");
        Ok(bound.contains(&assignment.network()))
    }

    fn set_link_state(
        &mut self,
        interface: &InterfaceName,
        state: LinkState,
    ) -> Result<(), HostError> {
        Self::run(os::link_command(interface, state)?)?;
        Ok(())
    }
}

/// Records the commands the native backend would run without touching the host
#[derive(Debug, Default)]
pub struct DryRun {
    commands: Vec<String>,
}

impl DryRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Command lines collected so far, in execution order
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    fn record(&mut self, cmd: ShellCommand) {
        let line = cmd.to_string();
        tracing::info!(%line, "dry run");
        self.commands.push(line);
    }
}

impl HostAdmin for DryRun {
    fn grant_capabilities(
        &mut self,
        executable: &Path,
        capabilities: &CapabilitySet,
    ) -> Result<(), HostError> {
        self.record(os::grant_command(executable, capabilities)?);
        Ok(())
    }

    fn assign_address(&mut self, assignment: &AddressAssignment) -> Result<(), HostError> {
        self.record(os::address_command(assignment)?);
        Ok(())
    }

    /// A dry run never binds anything, so no address is ever present
    fn existing_address(&mut self, assignment: &AddressAssignment) -> Result<bool, HostError> {
        os::address_query_command(assignment.interface())?;
        Ok(false)
    }

    fn set_link_state(
        &mut self,
        interface: &InterfaceName,
        state: LinkState,
    ) -> Result<(), HostError> {
        self.record(os::link_command(interface, state)?);
        Ok(())
    }
}

/// Maps a failed host tool invocation onto the error taxonomy
///
/// iproute2, libcap and ifconfig all report errno text on stderr, so the classification keys
/// off those messages.
///
/// # Arguments
/// * `line` - Command line that was run, used as context in the message
/// * `error` - How the command failed
pub(crate) fn classify(line: &str, error: ShellCommandError) -> HostError {
    let (status, stderr) = match error {
        ShellCommandError::Io(error) => {
            return match error.kind() {
                io::ErrorKind::NotFound => HostError::Unsupported(format!(
                    "`{}`: required tool is not installed",
                    line
                )),
                io::ErrorKind::PermissionDenied => {
                    HostError::PermissionDenied(format!("`{}`: {}", line, error))
                }
                _ => HostError::Failed(format!("`{}`: {}", line, error)),
            }
        }
        ShellCommandError::Failed(status, _, stderr) => (status, stderr),
    };

    let detail = stderr.trim();
    let msg = if detail.is_empty() {
        format!("`{}` exited with {}", line, status)
    } else {
        format!("`{}`: {}", line, detail)
    };

    let lower = detail.to_ascii_lowercase();
    let has = |needle: &str| lower.contains(needle);

    if has("operation not permitted") || has("permission denied") {
        HostError::PermissionDenied(msg)
    } else if has("file exists") || has("already assigned") {
        HostError::Conflict(msg)
    } else if has("cannot find device")
        || has("does not exist")
        || has("no such device")
        || has("no such file or directory")
    {
        HostError::NotFound(msg)
    } else if has("invalid argument")
        || has("invalid prefix")
        || has("is expected rather than")
        || has("bad address")
    {
        HostError::InvalidArgument(msg)
    } else if has("not supported") {
        HostError::Unsupported(msg)
    } else {
        HostError::Failed(msg)
    }
}
