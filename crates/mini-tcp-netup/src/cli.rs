//! Command Line Options and Arguments

use clap::{ArgAction, Args, Parser, Subcommand};
use mini_tcp_host::ExistingAddressPolicy;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "mini-tcp-netup", version, about)]
pub struct Opts {
    /// A level of verbosity, and can be used multiple times
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Path to a configuration file (built-in defaults apply when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub subcmd: SubCommand,
}

/// Values that take precedence over the configuration file
#[derive(Debug, Default, Args)]
pub struct Overrides {
    /// Engine executable to grant capabilities to
    #[arg(long, global = true, value_name = "PATH")]
    pub engine: Option<PathBuf>,

    /// Interface created by the engine
    #[arg(long, global = true, value_name = "NAME")]
    pub interface: Option<String>,

    /// Address to assign to the interface
    #[arg(long, global = true, value_name = "IP")]
    pub address: Option<String>,

    /// Prefix length of the address
    #[arg(long, global = true, value_name = "N")]
    pub prefix_len: Option<u32>,

    /// `skip` or `fail` when the address is already assigned
    #[arg(long, global = true, value_name = "POLICY")]
    pub on_existing_address: Option<ExistingAddressPolicy>,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum SubCommand {
    /// Grants capabilities to the engine, assigns the address and brings the interface up
    Up,

    /// Prints the commands `up` would run without changing anything
    Plan,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Opts::command().debug_assert();
    }

    #[test]
    fn bare_up() {
        let opts = Opts::try_parse_from(&["mini-tcp-netup", "up"]).unwrap();
        assert_eq!(opts.subcmd, SubCommand::Up);
        assert_eq!(opts.verbosity, 0);
        assert!(opts.config.is_none());
        assert!(opts.overrides.interface.is_none());
    }

    #[test]
    fn overrides_after_subcommand() {
        let opts = Opts::try_parse_from(&[
            "mini-tcp-netup",
            "-vv",
            "plan",
            "--interface",
            "tun7",
            "--address",
            "10.1.0.1",
            "--prefix-len",
            "16",
            "--on-existing-address",
            "fail",
            "--engine",
            "/opt/mini-tcp",
        ])
        .unwrap();

        assert_eq!(opts.subcmd, SubCommand::Plan);
        assert_eq!(opts.verbosity, 2);
        assert_eq!(opts.overrides.interface.as_deref(), Some("tun7"));
        assert_eq!(opts.overrides.address.as_deref(), Some("10.1.0.1"));
        assert_eq!(opts.overrides.prefix_len, Some(16));
        assert_eq!(
            opts.overrides.on_existing_address,
            Some(ExistingAddressPolicy::Fail)
        );
        assert_eq!(opts.overrides.engine, Some(PathBuf::from("/opt/mini-tcp")));
    }

    #[test]
    fn rejects_unknown_policy() {
        let r = Opts::try_parse_from(&["mini-tcp-netup", "up", "--on-existing-address", "maybe"]);
        assert!(r.is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Opts::try_parse_from(&["mini-tcp-netup"]).is_err());
    }
}
