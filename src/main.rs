//! `vicsim64` binary entry point: parses the CLI surface (spec.md §6), loads
//! ROM images, builds one `Executive`, optionally mounts a D64 image and
//! starts the TCP/UDP remote-control listeners, then drives the tick loop
//! until told to stop. Rendering and windowing are out of scope (spec.md
//! §1) — this is the thin integration shell around the core crate.

use std::sync::{Arc, Mutex};

use clap::Parser;

use vicsim64::cli::Cli;
use vicsim64::config::Config;
use vicsim64::executive::Executive;
use vicsim64::membus::CHAR_ROM_SIZE;
use vicsim64::romset::RomSet;
use vicsim64::server;

fn main() {
    env_logger::Builder::new().filter_level(log::LevelFilter::Info).parse_default_env().init();

    let cli = Cli::parse();
    let config = Config::from_cli(&cli);

    let roms = match RomSet::load(&config.rom_search_paths, config.needs_character_rom(), false) {
        Ok(roms) => roms,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    if cli.graphics && roms.character.is_none() {
        log::warn!("--graphics requested but no character ROM was found; running headless");
    }
    let character_rom = roms.character.unwrap_or_else(|| vec![0u8; CHAR_ROM_SIZE]);

    let mut executive = Executive::new(roms.basic, roms.kernal, character_rom, roms.drive_dos, config.video_standard);
    executive.reset();

    if let Some(disk) = &config.initial_disk {
        if let Err(e) = executive.attach_disk_path(disk, 8) {
            log::error!("failed to attach disk {}: {e}", disk.display());
            std::process::exit(1);
        }
        log::info!("attached {} to device 8", disk.display());
    }

    let executive = Arc::new(Mutex::new(executive));

    if let Some(port) = config.tcp_port {
        let executive = executive.clone();
        std::thread::spawn(move || {
            if let Err(e) = server::run_tcp(executive, port) {
                log::error!("tcp server stopped: {e}");
            }
        });
    }
    if let Some(port) = config.udp_port {
        let executive = executive.clone();
        std::thread::spawn(move || {
            if let Err(e) = server::run_udp(executive, port) {
                log::error!("udp server stopped: {e}");
            }
        });
    }

    loop {
        let done = {
            let mut exec = executive.lock().expect("executive mutex poisoned");
            exec.tick();
            let hit_cycle_limit = config.max_cycles.map(|max| exec.cycles_run() >= max).unwrap_or(false);
            let booted = config.autoquit && exec.boot_ready_detected();
            exec.should_stop() || hit_cycle_limit || booted
        };
        if done {
            break;
        }
    }

    let cycles = executive.lock().expect("executive mutex poisoned").cycles_run();
    log::info!("vicsim64 exiting after {cycles} cycles");
}
