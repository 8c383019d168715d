//! External pager invocation, for `detect page` (C7).

use std::io::Write;
use std::process::{Command, Stdio};

/// Pipe `text` through `$PAGER`, falling back to `less`, inheriting the
/// REPL's stdout/stderr so the pager draws directly to the terminal.
///
/// Any failure to spawn or write falls back to printing `text` directly —
/// a missing pager shouldn't make `detect page` unusable.
pub fn page(text: &str) {
    let pager = std::env::var("PAGER").unwrap_or_else(|_| "less".to_string());

    let spawned = Command::new(&pager)
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn();

    match spawned {
        Ok(mut child) => {
            if let Some(stdin) = child.stdin.as_mut() {
                if stdin.write_all(text.as_bytes()).is_err() {
                    print!("{text}");
                    return;
                }
            }
            drop(child.stdin.take());
            let _ = child.wait();
        }
        Err(_) => print!("{text}"),
    }
}
