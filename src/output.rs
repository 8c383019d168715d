//! Styled terminal output (C7, front-end adapter).
//!
//! Mirrors the original tool's four-style palette (default / bold-white /
//! green / yellow / red) but through `owo-colors` instead of hand-rolled
//! escape sequences.

use owo_colors::OwoColorize;

/// Print the REPL prompt: `procheat(name:pid)> ` when attached, `procheat> `
/// otherwise.
pub fn prompt(proc_name: Option<(&str, i32)>) {
    match proc_name {
        Some((name, pid)) => print!("{}", format!("procheat({name}:{pid})> ").bold().white()),
        None => print!("{}", "procheat> ".bold().white()),
    }
    use std::io::Write;
    let _ = std::io::stdout().flush();
}

/// A line of informational output, unstyled.
pub fn info(msg: impl std::fmt::Display) {
    println!("{msg}");
}

/// A success line, styled green.
pub fn success(msg: impl std::fmt::Display) {
    println!("{}", msg.to_string().green());
}

/// A warning line, styled yellow.
pub fn warn(msg: impl std::fmt::Display) {
    println!("{}", msg.to_string().yellow());
}

/// An error line, styled red. The REPL prints this and stays alive (spec
/// §7: "the front-end renders errors as one coloured line and keeps the
/// REPL alive").
pub fn error(msg: impl std::fmt::Display) {
    eprintln!("{}", msg.to_string().red());
}
