use anyhow::Context;
use clap::Parser;
use nix::unistd::Pid;
use procheat_core::cli::Cli;
use procheat_core::session::Session;
use procheat_core::{output, repl, signals};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    signals::install_signal_handlers().context("failed to install signal handlers")?;

    if !cli.quiet {
        eprintln!("[procheat] Interactive process-memory inspector. Type 'help' for commands.");
    }

    let mut session = Session::new();

    if let Some(pid) = cli.pid {
        match session.attach(Pid::from_raw(pid)) {
            Ok(()) => output::success(format!("Attached to {} (PID: {pid}).", session.proc_name())),
            Err(e) => {
                output::error(format!("Failed to attach to PID {pid}: {e}"));
                std::process::exit(1);
            }
        }
    }

    repl::run(&mut session, cli.pager.as_deref());
    Ok(())
}
