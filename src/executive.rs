/*!
The Executive: the sole root of ownership for one emulator instance. It owns
the main CPU, the banked memory map (which in turn owns both CIAs, the VIC,
the SID, and the shared IEC bus), and up to four 1541 drives. Every tick
steps the main CPU exactly one instruction (or, if the PC lands on the
KERNAL's LOAD vector, intercepts it and services the request directly
against the attached D64 image) and then gives every attached drive the
same number of cycles to catch up.

Grounded in the teacher's `Bus::tick` cycle-interleaving loop, which drives
the PPU, APU, and DMA controller by the CPU cycle count a single `step()`
returned; generalized here from (PPU, APU, DMA) to (CIA1, CIA2, VIC — all
inside `MemoryMap::tick` — plus each attached `Drive1541::run_cycles`).

Per spec.md §9's Open Question resolution, the crate ships the KERNAL-hook
fallback as the primary, always-available LOAD/SAVE path; the second-CPU
DOS-ROM path runs alongside it (via `Drive1541::run_cycles`) whenever a DOS
ROM image was supplied, satisfying E5 (IEC wakeup) either way.
*/

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::cpu6502::{Cpu6502, CpuBus, CARRY};
use crate::d64::D64Image;
use crate::drive1541::Drive1541;
use crate::error::{EmulatorError, Result};
use crate::iec::IecBus;
use crate::membus::MemoryMap;

pub use crate::vic::VideoStandard;

/// KERNAL LOAD entry point. The Executive intercepts PC landing here instead
/// of stepping into the ROM routine.
const LOAD_VECTOR: u16 = 0xFFD5;
/// KERNAL SAVE entry point (optional — D64 write-back is a non-goal, so this
/// hook always reports success without writing anything back).
const SAVE_VECTOR: u16 = 0xFFD8;

const FNLEN: u16 = 0x00B7; // length of the filename last set by SETNAM
const FA: u16 = 0x00B9; // current device number, set by SETLFS
const FNADR_LO: u16 = 0x00BB; // pointer to the filename buffer

const VARTAB: u16 = 0x002D;
const ARYTAB: u16 = 0x002F;
const STREND: u16 = 0x0031;

pub const KEYBUF_START: u16 = 0x0277;
pub const KEYBUF_MAX: usize = 10;
pub const KEYBUF_COUNT: u16 = 0x00C6;

const SCREEN_START: u16 = 0x0400;
const SCREEN_END: u16 = 0x07E7;
// PETSCII "READY." in screen-code form (uppercase letters are $01-$1A).
const READY_SCREEN_CODES: [u8; 6] = [0x12, 0x05, 0x01, 0x04, 0x19, 0x2E];

const DRIVE_COUNT: usize = 4;
const FIRST_DEVICE: u8 = 8;

/// KERNAL status codes matching the 1541 convention (spec.md §7).
const STATUS_FILE_NOT_FOUND: u8 = 4;
const STATUS_DEVICE_NOT_PRESENT: u8 = 5;

pub struct Executive {
    cpu: Cpu6502<MemoryMap>,
    mem: MemoryMap,
    drives: Vec<Drive1541>,
    standard: VideoStandard,
    cycles_run: u64,
    should_stop: AtomicBool,
    pending_key_release: Option<(usize, usize)>,
}

impl Executive {
    /// Build a fresh system: RAM zeroed, ROM images loaded once, one main
    /// CPU, one MemoryMap (which owns both CIAs/VIC/SID), one IEC bus, and
    /// four Drive1541 instances on devices 8-11 (spec.md §3 Lifecycle).
    /// `drive_dos_rom` is shared (cloned) across every drive; pass `None` to
    /// run every drive on the KERNAL-hook fallback path only.
    pub fn new(
        basic_rom: Vec<u8>,
        kernal_rom: Vec<u8>,
        char_rom: Vec<u8>,
        drive_dos_rom: Option<Vec<u8>>,
        standard: VideoStandard,
    ) -> Self {
        let iec = Rc::new(RefCell::new(IecBus::new()));
        let mem = MemoryMap::new(basic_rom, kernal_rom, char_rom, standard, iec.clone());

        let drives = (0..DRIVE_COUNT)
            .map(|i| {
                let device_number = FIRST_DEVICE + i as u8;
                let driver_index = 1 + i; // driver 0 is the main C64 (iec::MAIN_CPU_DRIVER)
                Drive1541::new(device_number, driver_index, drive_dos_rom.clone(), iec.clone())
            })
            .collect();

        Executive {
            cpu: Cpu6502::new(),
            mem,
            drives,
            standard,
            cycles_run: 0,
            should_stop: AtomicBool::new(false),
            pending_key_release: None,
        }
    }

    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.mem);
        self.cycles_run = 0;
    }

    pub fn video_standard(&self) -> VideoStandard {
        self.standard
    }

    pub fn cycles_run(&self) -> u64 {
        self.cycles_run
    }

    pub fn cpu(&self) -> &Cpu6502<MemoryMap> {
        &self.cpu
    }

    pub fn mem(&self) -> &MemoryMap {
        &self.mem
    }

    pub fn mem_mut(&mut self) -> &mut MemoryMap {
        &mut self.mem
    }

    /// Whether the external "should-stop" flag has been raised (spec.md §5).
    /// Polled between ticks; no in-flight instruction is ever aborted.
    pub fn should_stop(&self) -> bool {
        self.should_stop.load(Ordering::Relaxed)
    }

    pub fn request_stop(&self) {
        self.should_stop.store(true, Ordering::Relaxed);
    }

    /// Advance the system by exactly one indivisible unit: one main-CPU
    /// instruction (or KERNAL LOAD/SAVE intercept), with every peripheral
    /// and every attached drive caught up by the same number of cycles.
    /// This is the operation an embedding caller's mutex must wrap whole
    /// (spec.md §5).
    pub fn tick(&mut self) -> u32 {
        let cycles = match self.cpu.pc {
            LOAD_VECTOR => self.hook_load(),
            SAVE_VECTOR => self.hook_save(),
            _ => self.cpu.step(&mut self.mem),
        };

        for drive in &mut self.drives {
            drive.run_cycles(cycles);
        }

        if let Some((row, col)) = self.pending_key_release.take() {
            self.mem.cia1.release_key(row, col);
        }

        self.cycles_run += cycles as u64;
        cycles
    }

    /// Run ticks until `should_stop()` is set or (if given) `max_cycles`
    /// total cycles have retired — the bounded-run mode from spec.md §6.
    pub fn run(&mut self, max_cycles: Option<u64>) {
        loop {
            if self.should_stop() {
                break;
            }
            if let Some(max) = max_cycles {
                if self.cycles_run >= max {
                    break;
                }
            }
            self.tick();
        }
    }

    // ------------------------------------------------------------------
    // KERNAL-hook LOAD/SAVE fallback (spec.md §4.7, §9)
    // ------------------------------------------------------------------

    fn hook_load(&mut self) -> u32 {
        let fnlen = self.mem.read(FNLEN) as usize;
        let ptr = self.mem.read_word(FNADR_LO);
        let name: String = (0..fnlen)
            .map(|i| self.mem.read(ptr.wrapping_add(i as u16)) as char)
            .collect();
        let device = self.mem.read(FA);

        match self.read_from_device(device, &name) {
            Ok(data) => {
                let _ = self.load_prg_bytes(&data);
                self.cpu.set_flag(CARRY, false);
                log::info!("LOAD \"{name}\" from device {device}: {} bytes", data.len());
            }
            Err(status) => {
                self.cpu.set_flag(CARRY, true);
                self.cpu.a = status;
                log::warn!("LOAD \"{name}\" from device {device} failed: status {status}");
            }
        }
        self.cpu.simulate_rts(&mut self.mem);
        6
    }

    /// SAVE is optional (spec.md §4.7) and D64 write-back is a non-goal
    /// (spec.md §1); the hook always reports success without writing
    /// anything back to the attached image.
    fn hook_save(&mut self) -> u32 {
        self.cpu.set_flag(CARRY, false);
        self.cpu.simulate_rts(&mut self.mem);
        6
    }

    fn read_from_device(&self, device: u8, name: &str) -> std::result::Result<Vec<u8>, u8> {
        let drive = self
            .drives
            .iter()
            .find(|d| d.device_number == device)
            .ok_or(STATUS_DEVICE_NOT_PRESENT)?;
        let disk = drive.disk().ok_or(STATUS_FILE_NOT_FOUND)?;

        if name.is_empty() || name == "$" {
            let listing = disk.directory_listing().map_err(|_| STATUS_FILE_NOT_FOUND)?;
            let mut prg = Vec::with_capacity(listing.len() + 2);
            prg.extend_from_slice(&0x0801u16.to_le_bytes());
            prg.extend_from_slice(&listing);
            Ok(prg)
        } else {
            disk.read_file(name).map_err(|_| STATUS_FILE_NOT_FOUND)
        }
    }

    /// Load raw PRG bytes (two-byte little-endian load address, then
    /// payload) into memory and update the BASIC pointers exactly as a
    /// successful KERNAL LOAD would (spec.md §6 PRG load convention).
    /// Shared by the KERNAL hook and the server's `LOAD <path>` command.
    pub fn load_prg_bytes(&mut self, data: &[u8]) -> Result<(u16, u16)> {
        if data.len() < 2 {
            return Err(EmulatorError::D64Malformed("PRG data shorter than its load-address header".into()));
        }
        let load_addr = u16::from_le_bytes([data[0], data[1]]);
        let mut addr = load_addr;
        for &b in &data[2..] {
            self.mem.write(addr, b);
            addr = addr.wrapping_add(1);
        }
        let end = addr;
        for base in [VARTAB, ARYTAB, STREND] {
            self.mem.write(base, (end & 0xFF) as u8);
            self.mem.write(base + 1, (end >> 8) as u8);
        }
        Ok((load_addr, end))
    }

    pub fn load_prg_file(&mut self, path: &Path) -> Result<(u16, u16)> {
        let data = std::fs::read(path).map_err(|source| EmulatorError::RomIo { path: path.to_path_buf(), source })?;
        self.load_prg_bytes(&data)
    }

    // ------------------------------------------------------------------
    // Disk attach/detach (spec.md §3 Lifecycle, §7)
    // ------------------------------------------------------------------

    pub fn attach_disk_image(&mut self, device: u8, image: D64Image) -> Result<()> {
        let drive = self
            .drives
            .iter_mut()
            .find(|d| d.device_number == device)
            .ok_or_else(|| EmulatorError::D64Malformed(format!("no drive present at device {device}")))?;
        drive.attach(image);
        Ok(())
    }

    pub fn attach_disk_path(&mut self, path: &Path, device: u8) -> Result<()> {
        let data = std::fs::read(path).map_err(|source| EmulatorError::D64Io { path: path.to_path_buf(), source })?;
        let image = D64Image::from_bytes(data)?;
        self.attach_disk_image(device, image)
    }

    pub fn detach_disk(&mut self, device: u8) {
        if let Some(drive) = self.drives.iter_mut().find(|d| d.device_number == device) {
            drive.detach();
        }
    }

    pub fn detach_all_disks(&mut self) {
        for drive in &mut self.drives {
            drive.detach();
        }
    }

    pub fn disk_attached(&self, device: u8) -> bool {
        self.drives.iter().any(|d| d.device_number == device && d.disk().is_some())
    }

    // ------------------------------------------------------------------
    // Debug/server primitives (spec.md §6)
    // ------------------------------------------------------------------

    pub fn peek(&mut self, addr: u16) -> u8 {
        self.mem.read(addr)
    }

    pub fn poke(&mut self, addr: u16, value: u8) {
        self.mem.write(addr, value);
    }

    /// Simulate one keypress-and-release. `scancode` packs the keyboard
    /// matrix position as `row * 8 + col` (spec.md §4.3).
    pub fn tap_key(&mut self, scancode: u8) {
        let row = ((scancode >> 3) & 0x07) as usize;
        let col = (scancode & 0x07) as usize;
        self.mem.cia1.press_key(row, col);
        self.pending_key_release = Some((row, col));
    }

    /// Inject bytes directly into the keyboard buffer at $0277, with a
    /// matching count at $00C6 (spec.md §6). Used both for front-end typed
    /// input and the post-boot auto-injection of `LOAD"$",8<RETURN>`.
    pub fn inject_keyboard_buffer(&mut self, bytes: &[u8]) {
        let n = bytes.len().min(KEYBUF_MAX);
        for (i, &b) in bytes.iter().take(n).enumerate() {
            self.mem.write(KEYBUF_START + i as u16, b);
        }
        self.mem.write(KEYBUF_COUNT, n as u8);
    }

    pub fn inject_petscii_line(&mut self, text: &str) {
        let mut bytes: Vec<u8> = text.bytes().collect();
        bytes.push(0x0D);
        self.inject_keyboard_buffer(&bytes);
    }

    /// True once `READY.` has appeared in screen RAM — the boot-detection
    /// condition `--autoquit` watches for (spec.md §6, E1).
    pub fn boot_ready_detected(&self) -> bool {
        let bytes: Vec<u8> = (SCREEN_START..=SCREEN_END).map(|a| self.mem.peek_raw(a)).collect();
        bytes.windows(READY_SCREEN_CODES.len()).any(|w| w == READY_SCREEN_CODES)
    }
}
