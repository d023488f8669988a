#![doc = r#"
vicsim64 library crate: a Commodore 64 emulator core.

This crate exposes the emulator core modules for use by the `vicsim64`
binary and by tests. It models the main 6502, the banked memory map, the
two CIA chips, a register-level VIC-II and SID, the IEC serial bus, up to
four 1541 disk drives (each with its own 6502), and D64 disk images.

Modules:
- error: crate-wide error taxonomy
- cpu6502: generic 6502 CPU core (`CpuBus` trait + `Cpu6502<B>`)
- membus: the C64's banked 64 KiB address space
- cia: MOS 6526 CIA (used for both CIA1 and CIA2)
- vic: VIC-II register file and raster counter
- sid: SID register stub
- iec: wired-AND IEC serial bus
- drive1541: 1541 disk drive (its own 6502, VIA, DOS ROM)
- d64: D64 disk image reader
- executive: owns every component and drives the tick loop
- romset: ROM file loading and validation
- cli: command-line argument parsing
- config: resolves `Cli` into a runtime configuration
- server: remote-control line protocol parser/dispatcher

In tests, shared C64 fixture builders are available under `crate::test_utils`.
"#]

pub mod cia;
pub mod cli;
pub mod config;
pub mod cpu6502;
pub mod d64;
pub mod drive1541;
pub mod error;
pub mod executive;
pub mod iec;
pub mod membus;
pub mod romset;
pub mod server;
pub mod sid;
pub mod vic;

pub use cpu6502::{Cpu6502, CpuBus};
pub use error::{EmulatorError, Result};
pub use executive::{Executive, VideoStandard};
pub use membus::MemoryMap;

#[cfg(test)]
pub mod test_utils;
