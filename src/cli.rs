//! CLI Configuration
//! - Startup argument parsing with clap

use clap::Parser;

/// procheat - Interactive process-memory inspector and mutator
#[derive(Parser)]
#[command(name = "procheat", version, about = "Interactive process-memory inspector and mutator")]
pub struct Cli {
    /// PID to attach to at startup (also: PROCHEAT_PID env var)
    #[arg(env = "PROCHEAT_PID")]
    pub pid: Option<i32>,

    /// Pager command used by `detect page` (also: PAGER env var)
    #[arg(long, env = "PAGER")]
    pub pager: Option<String>,

    /// Suppress the startup banner
    #[arg(long, short = 'q')]
    pub quiet: bool,
}
