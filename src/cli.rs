/*!
Command-line surface (spec.md §6). Argument parsing itself is a boundary
concern owned by the eventual binary entry point, but the flag set and its
semantics are in scope: `Cli` is the typed contract the rest of the crate
(`config::Config`) is built against, in the `clap` derive style common
across the example pack's emulator manifests (none of which the teacher
itself uses, but `clap` appears in 7 of the 51 `other_examples` manifests —
an "enrich from the rest of the pack" addition).
*/

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "vicsim64", about = "A Commodore 64 emulator core")]
pub struct Cli {
    /// Run at most this many CPU cycles, then stop (bounded run).
    #[arg(long, value_name = "N")]
    pub max_cycles: Option<u64>,

    /// Exit automatically once `READY.` appears on screen after boot.
    #[arg(long)]
    pub autoquit: bool,

    /// Mount a D64 image to device 8 at startup.
    #[arg(long, value_name = "PATH")]
    pub disk: Option<PathBuf>,

    /// Listen for remote-control commands on this TCP port.
    #[arg(long, value_name = "N")]
    pub tcp_port: Option<u16>,

    /// Accept one remote-control command per UDP datagram on this port.
    #[arg(long, value_name = "N")]
    pub udp_port: Option<u16>,

    /// Enable the windowed video front-end (requires the `display` feature).
    #[arg(long)]
    pub graphics: bool,

    /// Disable ANSI color in terminal output.
    #[arg(long, alias = "no-colors")]
    pub no_color: bool,

    /// Additional directory to search for ROM images (repeatable).
    #[arg(long, value_name = "DIR")]
    pub rom_dir: Vec<PathBuf>,

    /// Use NTSC timing (263 lines/frame, 65 cycles/line) instead of PAL.
    #[arg(long, conflicts_with = "pal")]
    pub ntsc: bool,

    /// Use PAL timing (312 lines/frame, 63 cycles/line). Default.
    #[arg(long, conflicts_with = "ntsc")]
    pub pal: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_invocation() {
        let cli = Cli::parse_from(["vicsim64"]);
        assert!(cli.max_cycles.is_none());
        assert!(!cli.autoquit);
        assert!(!cli.ntsc);
    }

    #[test]
    fn no_colors_alias_sets_no_color() {
        let cli = Cli::parse_from(["vicsim64", "--no-colors"]);
        assert!(cli.no_color);
    }

    #[test]
    fn parses_full_flag_set() {
        let cli = Cli::parse_from([
            "vicsim64",
            "--max-cycles",
            "3000000",
            "--autoquit",
            "--disk",
            "game.d64",
            "--tcp-port",
            "6510",
            "--udp-port",
            "6511",
            "--graphics",
            "--rom-dir",
            "/opt/roms",
            "--ntsc",
        ]);
        assert_eq!(cli.max_cycles, Some(3_000_000));
        assert!(cli.autoquit);
        assert_eq!(cli.disk, Some(PathBuf::from("game.d64")));
        assert_eq!(cli.tcp_port, Some(6510));
        assert_eq!(cli.udp_port, Some(6511));
        assert!(cli.graphics);
        assert_eq!(cli.rom_dir, vec![PathBuf::from("/opt/roms")]);
        assert!(cli.ntsc);
    }

    #[test]
    fn ntsc_and_pal_are_mutually_exclusive() {
        let err = Cli::try_parse_from(["vicsim64", "--ntsc", "--pal"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
