/*!
Resolves a parsed `Cli` into the runtime configuration the rest of the
crate builds against: pure data, no I/O, so tests can construct it
directly instead of going through argv.
*/

use std::path::PathBuf;

use crate::cli::Cli;
use crate::vic::VideoStandard;

const DEFAULT_ROM_DIR: &str = "roms";

#[derive(Debug, Clone)]
pub struct Config {
    pub rom_search_paths: Vec<PathBuf>,
    pub video_standard: VideoStandard,
    pub max_cycles: Option<u64>,
    pub autoquit: bool,
    pub initial_disk: Option<PathBuf>,
    pub tcp_port: Option<u16>,
    pub udp_port: Option<u16>,
    pub graphics: bool,
    pub color: bool,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Config {
        let mut rom_search_paths = cli.rom_dir.clone();
        rom_search_paths.push(PathBuf::from(DEFAULT_ROM_DIR));
        rom_search_paths.push(PathBuf::from("."));

        let video_standard = if cli.ntsc { VideoStandard::Ntsc } else { VideoStandard::Pal };

        Config {
            rom_search_paths,
            video_standard,
            max_cycles: cli.max_cycles,
            autoquit: cli.autoquit,
            initial_disk: cli.disk.clone(),
            tcp_port: cli.tcp_port,
            udp_port: cli.udp_port,
            graphics: cli.graphics,
            color: !cli.no_color,
        }
    }

    /// Character ROM is only required when the windowed front-end will
    /// actually render text/graphics.
    pub fn needs_character_rom(&self) -> bool {
        self.graphics
    }
}
