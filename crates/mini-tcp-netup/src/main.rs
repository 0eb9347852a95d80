//! mini-tcp netup
//!
//! One-shot host preparation for the mini-tcp engine: grant `cap_net_admin` to the engine
//! binary, assign an address to the TUN device the engine created, and bring the device up.
//! The first failing step aborts the run with a non-zero exit; completed steps are left as-is.

use clap::Parser;
use color_eyre::eyre;
use mini_tcp_host::{Bootstrap, DryRun, NativeHost, Outcome};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub mod cli;
pub mod config;

fn main() -> eyre::Result<()> {
    use cli::SubCommand;

    let opts = cli::Opts::parse();

    // init logging
    let level = match opts.verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };
    FmtSubscriber::builder().with_max_level(level).init();

    // init error/panic handling
    color_eyre::install()?;

    let mut cfg = match &opts.config {
        Some(path) => config::NetupConfig::load(path)?,
        None => config::NetupConfig::default(),
    };
    cfg.apply(&opts.overrides);
    tracing::debug!(?cfg, "effective configuration");

    let plan = cfg.provision()?;

    match opts.subcmd {
        SubCommand::Up => {
            let report = Bootstrap::new(NativeHost::new()).run(&plan)?;
            for (step, outcome) in &report.steps {
                match outcome {
                    Outcome::Applied => println!("{}: done", step),
                    Outcome::AlreadyPresent => println!("{}: already in place", step),
                }
            }
            println!(
                "{} is up with {}",
                plan.interface(),
                plan.assignment().network()
            );
        }
        SubCommand::Plan => {
            let mut bootstrap = Bootstrap::new(DryRun::new());
            bootstrap.run(&plan)?;
            for line in bootstrap.host().commands() {
                println!("{}", line);
            }
        }
    }

    Ok(())
}
