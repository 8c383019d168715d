//! Session state-machine invariants against a real attached process
//! (spec §8: invariants, and concrete scenario 2 — diff detects a single
//! bump).

use nix::unistd::Pid;
use procheat_core::scanner::{CompareOp, ScanWidth};
use procheat_core::session::{Session, Slot};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

struct Helper {
    child: Child,
    base: u64,
}

impl Helper {
    fn spawn() -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_procheat-test-helper"))
            .arg("single")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .expect("spawn test helper");

        let stdout = child.stdout.take().expect("helper stdout");
        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        reader.read_line(&mut line).expect("read helper base address");
        let base = u64::from_str_radix(line.trim().trim_start_matches("0x"), 16).expect("parse hex address");

        Helper { child, base }
    }

    fn pid(&self) -> Pid {
        Pid::from_raw(self.child.id() as i32)
    }
}

impl Drop for Helper {
    fn drop(&mut self) {
        if let Some(mut stdin) = self.child.stdin.take() {
            let _ = stdin.write_all(b"\n");
        }
        match self.child.wait_timeout(Duration::from_secs(5)) {
            Ok(Some(_)) => {}
            _ => {
                let _ = self.child.kill();
                let _ = self.child.wait();
            }
        }
    }
}

#[test]
fn diff_detects_a_single_byte_bump() {
    let helper = Helper::spawn();

    let mut session = Session::new();
    session.attach(helper.pid()).expect("attach"); // captures `initial`

    session
        .poke(helper.base, ScanWidth::Byte, 11)
        .expect("bump the tracked byte");
    session.rescan().expect("fullscan"); // previous <- initial (alias), current <- S

    let changes = session.diff_prev_current().expect("diff");
    assert!(changes.iter().any(|c| c.addr == helper.base && c.new_byte == 11));
}

#[test]
fn search_before_attach_reports_not_attached() {
    let session = Session::new();
    let err = session.search(Slot::Current, ScanWidth::Dword, CompareOp::Equal, 0);
    assert!(err.is_err());
    assert!(!session.is_attached());
}

#[test]
fn diff_before_rescan_reports_no_scan_data() {
    let helper = Helper::spawn();
    let mut session = Session::new();
    session.attach(helper.pid()).expect("attach");

    assert!(session.diff_prev_current().is_err());
}

#[test]
fn detach_after_history_releases_every_slot() {
    let helper = Helper::spawn();
    let mut session = Session::new();
    session.attach(helper.pid()).expect("attach");
    session.rescan().expect("fullscan");
    assert!(session.diff_prev_current().is_ok());

    session.detach();
    assert!(!session.is_attached());
    assert!(session.diff_prev_current().is_err());
    assert!(session
        .search(Slot::Initial, ScanWidth::Byte, CompareOp::Equal, 0)
        .is_err());
}

#[test]
fn poke_and_rediff_converges_to_empty_changeset() {
    let helper = Helper::spawn();
    let mut session = Session::new();
    session.attach(helper.pid()).expect("attach"); // initial: byte at base is 0

    session.poke(helper.base, ScanWidth::Byte, 77).expect("poke");
    session.rescan().expect("fullscan"); // previous = initial, current has 77

    let changes = session.diff_prev_current().expect("diff");
    for c in &changes {
        if c.addr == helper.base {
            session
                .poke(c.addr, ScanWidth::Byte, c.old_byte as u64)
                .expect("revert");
        }
    }

    session.rescan().expect("second fullscan");
    let reverted = session.diff_prev_current().expect("diff after revert");
    assert!(!reverted.iter().any(|c| c.addr == helper.base));
}
