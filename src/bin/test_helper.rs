//! Test helper: a child process with a known, controlled memory layout,
//! spawned by the integration tests so they can attach to a real PID
//! (spec §8, "concrete scenarios").
//!
//! Usage: `procheat-test-helper <mode>`, where mode is one of:
//! - `single`   one 4 KiB RW page, `0x11223344` (LE dword) at offset 256
//! - `dual`     two RW pages, `0xAA` at page one offset 0, `0xBB` at page two offset 0
//! - `boundary` one 256 KiB RW region, `0xCD` at offsets 65535/65536/131071/131072
//!
//! Prints one `0x`-prefixed hex base address per allocated region to
//! stdout, then blocks reading a line from stdin — the parent test
//! closes or writes to stdin to let the helper exit.

use nix::sys::mman::{mmap, MapFlags, ProtFlags};
use std::io::BufRead;
use std::num::NonZeroUsize;
use std::os::fd::BorrowedFd;

const PAGE: usize = 4096;

fn alloc_region(len: usize) -> *mut u8 {
    unsafe {
        mmap::<BorrowedFd>(
            None,
            NonZeroUsize::new(len).expect("non-zero length"),
            ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
            MapFlags::MAP_PRIVATE | MapFlags::MAP_ANONYMOUS,
            None,
            0,
        )
        .expect("mmap should succeed")
        .as_ptr() as *mut u8
    }
}

fn main() {
    let mode = std::env::args().nth(1).unwrap_or_else(|| "single".to_string());

    match mode.as_str() {
        "single" => {
            let base = alloc_region(PAGE);
            unsafe {
                std::ptr::copy_nonoverlapping(0x1122_3344u32.to_le_bytes().as_ptr(), base.add(256), 4);
            }
            println!("0x{:x}", base as usize);
        }
        "dual" => {
            let p1 = alloc_region(PAGE);
            let p2 = alloc_region(PAGE);
            unsafe {
                *p1 = 0xAA;
                *p2 = 0xBB;
            }
            println!("0x{:x}", p1 as usize);
            println!("0x{:x}", p2 as usize);
        }
        "boundary" => {
            let len = 256 * 1024;
            let base = alloc_region(len);
            unsafe {
                for offset in [65535usize, 65536, 131071, 131072] {
                    *base.add(offset) = 0xCD;
                }
            }
            println!("0x{:x}", base as usize);
        }
        other => {
            eprintln!("unknown mode: {other}");
            std::process::exit(2);
        }
    }

    // Block until the parent test is done with us.
    let stdin = std::io::stdin();
    let mut line = String::new();
    let _ = stdin.lock().read_line(&mut line);
}
