//! REPL (C7): command tokenizer and dispatch loop.
//!
//! Out-of-core: this module is a thin consumer of `session`, rendering
//! results through `output` and `pager`. End-of-input or an explicit
//! `exit` is the only way out (spec §7).

use crate::output;
use crate::pager;
use crate::scanner::{CompareOp, ScanWidth};
use crate::session::{Session, Slot};
use nix::unistd::Pid;
use std::io::{self, BufRead, Write};

const TRUNCATE_AT: usize = 20;

pub fn run(session: &mut Session, pager_cmd: Option<&str>) {
    if let Some(cmd) = pager_cmd {
        std::env::set_var("PAGER", cmd);
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print_prompt(session);
        let Some(Ok(line)) = lines.next() else {
            break;
        };
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = tokens.first() else {
            continue;
        };

        match command {
            "help" => handle_help(),
            "attach" => handle_attach(session, tokens.get(1).copied()),
            "fullscan" => handle_fullscan(session),
            "detect" => handle_detect(session, tokens.get(1).copied()),
            "search" => handle_search(session, tokens.get(1).copied(), tokens.get(2).copied()),
            "poke" => handle_poke(session, tokens.get(1).copied(), tokens.get(2).copied(), tokens.get(3).copied()),
            "exit" => break,
            other => output::error(format!("Unknown command: {other}. Try 'help'.")),
        }
    }
}

fn print_prompt(session: &Session) {
    match session.pid() {
        Some(pid) => output::prompt(Some((session.proc_name(), pid.as_raw()))),
        None => output::prompt(None),
    }
    let _ = io::stdout().flush();
}

fn handle_help() {
    output::warn("Available commands:");
    println!("  attach <pid>               : Attach to a process and run initial scan.");
    println!("  fullscan                   : Perform a second scan to compare against.");
    println!("  detect [page]              : Show changes between the previous and current scan.");
    println!("  poke <addr> <type> <value> : Write a value into target memory. Types: byte, word, dword, qword");
    println!("  search <type> <value>      : Search the newest scan for a value.");
    output::warn("                               Types: byte, word, dword, qword");
    println!("  help                       : Show this help message.");
    println!("  exit                       : Close the application.");
}

fn handle_attach(session: &mut Session, arg: Option<&str>) {
    let Some(arg) = arg else {
        output::error("Usage: attach <pid>");
        return;
    };
    let Ok(raw) = arg.parse::<i32>() else {
        output::error(format!("Invalid PID: {arg}"));
        return;
    };
    let pid = Pid::from_raw(raw);

    output::info(format!("Attaching to PID {raw}. Performing initial scan..."));
    match session.attach(pid) {
        Ok(()) => {
            output::success(format!(
                "Attached to {} (PID: {}). Initial scan complete.",
                session.proc_name(),
                raw
            ));
            output::warn("You can now run 'search' or perform a 'fullscan' for comparison.");
        }
        Err(e) => output::error(format!("Failed to attach to PID {raw}: {e}")),
    }
}

fn handle_fullscan(session: &mut Session) {
    if !session.is_attached() {
        output::error("You must attach to a process first using 'attach'.");
        return;
    }
    output::info(format!("Performing next scan on {} (PID: {})...", session.proc_name(), session.pid().unwrap()));
    match session.rescan() {
        Ok(()) => {
            output::success("Full scan completed successfully.");
            output::warn("You can now run 'detect' to see changes.");
        }
        Err(e) => output::error(format!("Failed to perform the fullscan: {e}")),
    }
}

fn handle_detect(session: &Session, mode: Option<&str>) {
    match session.diff_prev_current() {
        Ok(changes) => {
            if mode == Some("page") {
                let mut text = format!("Detected {} changes.\n", changes.len());
                for c in &changes {
                    text.push_str(&format!("  -> Change at 0x{:x}, value: 0x{:02x} -> 0x{:02x}\n", c.addr, c.old_byte, c.new_byte));
                }
                pager::page(&text);
            } else {
                output::success(format!("Detected {} changes.", changes.len()));
                for c in changes.iter().take(TRUNCATE_AT) {
                    println!("  -> Change at 0x{:x}, value: 0x{:02x} -> 0x{:02x}", c.addr, c.old_byte, c.new_byte);
                }
                if changes.len() > TRUNCATE_AT {
                    output::warn(format!("  ... (output truncated, use 'detect page' to see all {} changes)", changes.len()));
                }
            }
        }
        Err(e) => output::error(format!("Error: {e}. Use 'attach' then 'fullscan'.")),
    }
}

fn handle_search(session: &Session, type_str: Option<&str>, value_str: Option<&str>) {
    let (Some(type_str), Some(value_str)) = (type_str, value_str) else {
        output::error("Usage: search <type> <value>");
        output::warn("Types: byte, word, dword, qword");
        return;
    };
    let Some(width) = parse_width(type_str) else {
        output::error(format!("Unknown search type: {type_str}"));
        return;
    };
    let Some(value) = parse_number(value_str) else {
        output::error(format!("Invalid value: {value_str}"));
        return;
    };

    match session.search(Slot::Current, width, CompareOp::Equal, value) {
        Ok(hits) => {
            output::success(format!("Found {} matches for value {value} (0x{value:x}).", hits.len()));
            for hit in hits.iter().take(TRUNCATE_AT) {
                println!("  -> 0x{:x}", hit.addr);
            }
            if hits.len() > TRUNCATE_AT {
                output::warn(format!("  ... ({} more)", hits.len() - TRUNCATE_AT));
            }
        }
        Err(e) => output::error(format!("Error: {e}. Use 'attach'.")),
    }
}

fn handle_poke(session: &Session, addr_str: Option<&str>, type_str: Option<&str>, value_str: Option<&str>) {
    let (Some(addr_str), Some(type_str), Some(value_str)) = (addr_str, type_str, value_str) else {
        output::error("Usage: poke <addr> <type> <value>");
        return;
    };
    let Some(addr) = parse_number(addr_str) else {
        output::error(format!("Invalid address: {addr_str}"));
        return;
    };
    let Some(width) = parse_width(type_str) else {
        output::error(format!("Unknown type: {type_str}"));
        return;
    };
    let Some(value) = parse_number(value_str) else {
        output::error(format!("Invalid value: {value_str}"));
        return;
    };

    match session.poke(addr, width, value) {
        Ok(()) => output::success(format!("Wrote {type_str} 0x{value:x} -> 0x{addr:x}")),
        Err(e) => output::error(format!("poke failed: {e}")),
    }
}

fn parse_width(s: &str) -> Option<ScanWidth> {
    match s {
        "byte" => Some(ScanWidth::Byte),
        "word" => Some(ScanWidth::Word),
        "dword" => Some(ScanWidth::Dword),
        "qword" => Some(ScanWidth::Qword),
        _ => None,
    }
}

/// Accepts decimal or `0x`-prefixed hex, per the CLI surface (spec §6).
fn parse_number(s: &str) -> Option<u64> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        s.parse::<u64>().ok()
    }
}
