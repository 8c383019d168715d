//! Session state (C6): three-slot scan history with alias-aware ownership.
//!
//! The source this is drawn from tracks `previous == initial` with a raw
//! pointer compare-then-free, and the bug class that recurs there is a
//! double-free when that alias isn't accounted for. `Rc<Snapshot>` turns
//! that into a non-issue: cloning a handle never frees anything, and a
//! slot is only ever actually dropped once its last handle goes away
//! (spec §9, "in languages with linear ownership this falls out for
//! free").

use crate::differ::{self, Change};
use crate::error::{SessionError, TargetError};
use crate::scanner::{self, CompareOp, Hit, ScanWidth};
use crate::snapshot::{self, Snapshot};
use crate::target;
use nix::unistd::Pid;
use std::rc::Rc;

/// Which scan slot an operation should read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Initial,
    Previous,
    Current,
}

/// Attach state, process identity, and up to three snapshot handles.
#[derive(Default)]
pub struct Session {
    pid: Option<Pid>,
    proc_name: String,
    initial: Option<Rc<Snapshot>>,
    previous: Option<Rc<Snapshot>>,
    current: Option<Rc<Snapshot>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.pid.is_some()
    }

    pub fn pid(&self) -> Option<Pid> {
        self.pid
    }

    pub fn proc_name(&self) -> &str {
        &self.proc_name
    }

    /// Detach (if attached), then attach to `pid` and capture its initial
    /// snapshot. On capture failure the session is left fully detached
    /// (spec §4.6: "on failure: revert to Detached, all slots released").
    pub fn attach(&mut self, pid: Pid) -> Result<(), SessionError> {
        self.release_all();

        let snap = match snapshot::capture(pid) {
            Ok(s) => s,
            Err(e) => return Err(SessionError::Target(e)),
        };

        self.proc_name = target::proc_name(pid).unwrap_or_default();
        self.pid = Some(pid);
        self.initial = Some(Rc::new(snap));
        self.previous = None;
        self.current = None;
        Ok(())
    }

    /// Capture a new snapshot and shift history per the §4.6 state
    /// machine: first post-attach rescan aliases `previous` to `initial`;
    /// every rescan after that drops the old `previous` (dropping an
    /// `Rc` only frees once the last handle is gone) and shifts
    /// `current` down into it.
    pub fn rescan(&mut self) -> Result<(), SessionError> {
        let pid = self.pid.ok_or(SessionError::NotAttached)?;
        let snap = snapshot::capture(pid).map_err(SessionError::Target)?;

        match self.current.take() {
            None => {
                // Attached-with-only-initial: previous aliases initial.
                self.previous = self.initial.clone();
            }
            Some(old_current) => {
                self.previous = Some(old_current);
            }
        }
        self.current = Some(Rc::new(snap));
        Ok(())
    }

    /// Diff `previous` against `current`.
    pub fn diff_prev_current(&self) -> Result<Vec<Change>, SessionError> {
        let previous = self.previous.as_ref().ok_or(SessionError::NoScanData)?;
        let current = self.current.as_ref().ok_or(SessionError::NoScanData)?;
        Ok(differ::diff(previous, current))
    }

    /// Search the newest available snapshot — `current`, falling back to
    /// `initial` if no rescan has happened yet — or an explicitly named
    /// slot.
    pub fn search(&self, slot: Slot, width: ScanWidth, op: CompareOp, value: u64) -> Result<Vec<Hit>, SessionError> {
        let snap = self.slot_snapshot(slot)?;
        Ok(scanner::search_numeric(snap, width, op, value))
    }

    /// Search for an exact byte pattern in the given slot.
    pub fn search_pattern(&self, slot: Slot, pattern: &[u8]) -> Result<Vec<Hit>, SessionError> {
        let snap = self.slot_snapshot(slot)?;
        Ok(scanner::search_exact(snap, pattern))
    }

    /// Write a typed value into the target at `address`.
    pub fn poke(&self, address: u64, width: ScanWidth, value: u64) -> Result<(), SessionError> {
        let pid = self.pid.ok_or(SessionError::NotAttached)?;
        let bytes = value.to_le_bytes();
        let n = width.bytes();
        target::poke_write(pid, address, &bytes[..n]).map_err(|e: TargetError| SessionError::Target(e))
    }

    /// Release all slots (alias-aware — dropping `Rc`s handles this) and
    /// clear attach state.
    pub fn detach(&mut self) {
        self.release_all();
    }

    fn slot_snapshot(&self, slot: Slot) -> Result<&Snapshot, SessionError> {
        let handle = match slot {
            Slot::Initial => self.initial.as_ref(),
            Slot::Previous => self.previous.as_ref(),
            Slot::Current => self.current.as_ref().or(self.initial.as_ref()),
        };
        handle.map(|rc| rc.as_ref()).ok_or(SessionError::NoScanData)
    }

    fn release_all(&mut self) {
        self.pid = None;
        self.proc_name.clear();
        self.initial = None;
        self.previous = None;
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn self_pid() -> Pid {
        Pid::from_raw(std::process::id() as i32)
    }

    #[test]
    fn attach_populates_initial_only() {
        let mut session = Session::new();
        session.attach(self_pid()).unwrap();
        assert!(session.is_attached());
        assert!(session.initial.is_some());
        assert!(session.previous.is_none());
        assert!(session.current.is_none());
    }

    #[test]
    fn first_rescan_aliases_previous_to_initial() {
        let mut session = Session::new();
        session.attach(self_pid()).unwrap();
        session.rescan().unwrap();

        let initial = session.initial.as_ref().unwrap();
        let previous = session.previous.as_ref().unwrap();
        assert!(Rc::ptr_eq(initial, previous));
        assert!(session.current.is_some());
    }

    #[test]
    fn second_rescan_shifts_current_into_previous_without_initial_alias() {
        let mut session = Session::new();
        session.attach(self_pid()).unwrap();
        session.rescan().unwrap();
        let first_current = session.current.clone().unwrap();

        session.rescan().unwrap();
        let previous = session.previous.as_ref().unwrap();
        assert!(Rc::ptr_eq(previous, &first_current));

        let initial = session.initial.as_ref().unwrap();
        assert!(!Rc::ptr_eq(previous, initial));
    }

    #[test]
    fn operations_before_attach_report_not_attached() {
        let session = Session::new();
        let err = session.search(Slot::Current, ScanWidth::Dword, CompareOp::Equal, 0);
        assert!(matches!(err, Err(SessionError::NotAttached)));
    }

    #[test]
    fn diff_before_any_rescan_reports_no_scan_data() {
        let mut session = Session::new();
        session.attach(self_pid()).unwrap();
        let err = session.diff_prev_current();
        assert!(matches!(err, Err(SessionError::NoScanData)));
    }

    #[test]
    fn search_current_falls_back_to_initial_before_first_rescan() {
        let mut session = Session::new();
        session.attach(self_pid()).unwrap();
        // Should not error even though `current` is still unset.
        let hits = session.search(Slot::Current, ScanWidth::Byte, CompareOp::GreaterThan, 0);
        assert!(hits.is_ok());
    }

    #[test]
    fn detach_clears_all_slots() {
        let mut session = Session::new();
        session.attach(self_pid()).unwrap();
        session.rescan().unwrap();
        session.detach();
        assert!(!session.is_attached());
        assert!(session.initial.is_none());
        assert!(session.previous.is_none());
        assert!(session.current.is_none());
    }

    #[test]
    fn re_attach_releases_previous_session_slots() {
        let mut session = Session::new();
        session.attach(self_pid()).unwrap();
        session.rescan().unwrap();
        session.attach(self_pid()).unwrap();
        assert!(session.previous.is_none());
        assert!(session.current.is_none());
        assert!(session.initial.is_some());
    }
}
