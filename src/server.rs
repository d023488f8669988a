/*!
Remote-control line protocol (spec.md §6): one ASCII command per line over
TCP, one command per UDP datagram. Parsing and dispatch are fully in scope;
the actual accept loops are a thin boundary (spec.md §1 explicitly puts the
"TCP/UDP remote-control server" transport out of scope) sketched here with
plain `std::net` — no extra dependency — guarded by the same
`Arc<Mutex<Executive>>` the concurrency model in spec.md §5 calls for.
*/

use std::net::{TcpListener, TcpStream, UdpSocket};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use std::io::{BufRead, BufReader, Write};

use crate::executive::Executive;

const HELP_TEXT: &str = "\
POKE addr val          write a byte (banked address space)
PEEK addr              read a byte (banked address space)
KEY scancode           simulate one keypress-and-release (0-63)
LOAD path              load a PRG from the host filesystem
ATTACH-DISK path [dev] mount a D64 image (default device 8)
DETACH-DISKS           unmount every attached D64 image
RESET                  reset the main CPU
HELP                   show this text
QUIT                   disconnect (TCP) or acknowledge (UDP)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerCommand {
    Poke { addr: u16, val: u8 },
    Peek { addr: u16 },
    Key { scancode: u8 },
    Load { path: PathBuf },
    AttachDisk { path: PathBuf, device: u8 },
    DetachDisks,
    Reset,
    Help,
    Quit,
}

fn parse_number(s: &str) -> std::result::Result<u32, String> {
    if let Some(hex) = s.strip_prefix('$') {
        u32::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        s.parse::<u32>().map_err(|e| e.to_string())
    }
}

/// Parse one line of the protocol. Errors carry the reason text a caller
/// should echo back as `ERR: <reason>` (spec.md §7); the connection itself
/// always stays open on a parse error.
pub fn parse_line(line: &str) -> std::result::Result<ServerCommand, String> {
    let mut parts = line.trim().split_whitespace();
    let verb = parts.next().ok_or_else(|| "empty command".to_string())?;

    match verb.to_ascii_uppercase().as_str() {
        "POKE" => {
            let addr = parts.next().ok_or("POKE requires an address")?;
            let val = parts.next().ok_or("POKE requires a value")?;
            let addr = parse_number(addr).map_err(|e| format!("invalid address: {e}"))?;
            let val = parse_number(val).map_err(|e| format!("invalid value: {e}"))?;
            if addr > 0xFFFF {
                return Err(format!("address ${addr:X} out of range"));
            }
            if val > 0xFF {
                return Err(format!("value ${val:X} out of range"));
            }
            Ok(ServerCommand::Poke { addr: addr as u16, val: val as u8 })
        }
        "PEEK" => {
            let addr = parts.next().ok_or("PEEK requires an address")?;
            let addr = parse_number(addr).map_err(|e| format!("invalid address: {e}"))?;
            if addr > 0xFFFF {
                return Err(format!("address ${addr:X} out of range"));
            }
            Ok(ServerCommand::Peek { addr: addr as u16 })
        }
        "KEY" => {
            let code = parts.next().ok_or("KEY requires a scancode")?;
            let code = parse_number(code).map_err(|e| format!("invalid scancode: {e}"))?;
            if code > 63 {
                return Err(format!("scancode {code} out of range (0-63)"));
            }
            Ok(ServerCommand::Key { scancode: code as u8 })
        }
        "LOAD" => {
            let path = parts.next().ok_or("LOAD requires a path")?;
            Ok(ServerCommand::Load { path: PathBuf::from(path) })
        }
        "ATTACH-DISK" => {
            let path = parts.next().ok_or("ATTACH-DISK requires a path")?;
            let device = match parts.next() {
                Some(d) => parse_number(d).map_err(|e| format!("invalid device: {e}"))? as u8,
                None => 8,
            };
            Ok(ServerCommand::AttachDisk { path: PathBuf::from(path), device })
        }
        "DETACH-DISKS" => Ok(ServerCommand::DetachDisks),
        "RESET" => Ok(ServerCommand::Reset),
        "HELP" => Ok(ServerCommand::Help),
        "QUIT" => Ok(ServerCommand::Quit),
        other => Err(format!("unknown command: {other}")),
    }
}

/// Parse and execute one line against `exec`, returning the single-line
/// response (errors prefixed `ERR:`, per spec.md §7).
pub fn dispatch(exec: &mut Executive, line: &str) -> String {
    match parse_line(line) {
        Ok(ServerCommand::Poke { addr, val }) => {
            exec.poke(addr, val);
            "OK".to_string()
        }
        Ok(ServerCommand::Peek { addr }) => format!("{:02X}", exec.peek(addr)),
        Ok(ServerCommand::Key { scancode }) => {
            exec.tap_key(scancode);
            "OK".to_string()
        }
        Ok(ServerCommand::Load { path }) => match exec.load_prg_file(&path) {
            Ok((addr, end)) => format!("OK {addr:04X}-{:04X}", end.wrapping_sub(1)),
            Err(e) => format!("ERR: {e}"),
        },
        Ok(ServerCommand::AttachDisk { path, device }) => match exec.attach_disk_path(&path, device) {
            Ok(()) => "OK".to_string(),
            Err(_) => "ERR: invalid d64".to_string(),
        },
        Ok(ServerCommand::DetachDisks) => {
            exec.detach_all_disks();
            "OK".to_string()
        }
        Ok(ServerCommand::Reset) => {
            exec.reset();
            "OK".to_string()
        }
        Ok(ServerCommand::Help) => HELP_TEXT.to_string(),
        Ok(ServerCommand::Quit) => {
            exec.request_stop();
            "OK".to_string()
        }
        Err(reason) => format!("ERR: {reason}"),
    }
}

/// Accept TCP connections on `port` and dispatch one line at a time against
/// the shared, mutex-guarded `Executive`. One thread per connection; every
/// dispatch call holds the lock for the duration of its line (spec.md §5:
/// the mutex is held for the whole of one tick-equivalent operation).
pub fn run_tcp(executive: Arc<Mutex<Executive>>, port: u16) -> std::io::Result<()> {
    let listener = TcpListener::bind(("127.0.0.1", port))?;
    log::info!("server: TCP listening on 127.0.0.1:{port}");
    for stream in listener.incoming() {
        let stream = stream?;
        let executive = executive.clone();
        std::thread::spawn(move || {
            if let Err(e) = handle_tcp_client(stream, executive) {
                log::warn!("server: TCP client error: {e}");
            }
        });
    }
    Ok(())
}

fn handle_tcp_client(stream: TcpStream, executive: Arc<Mutex<Executive>>) -> std::io::Result<()> {
    let mut writer = stream.try_clone()?;
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let line = line?;
        let response = {
            let mut exec = executive.lock().expect("executive mutex poisoned");
            dispatch(&mut exec, &line)
        };
        writeln!(writer, "{response}")?;
        if line.trim().eq_ignore_ascii_case("QUIT") {
            break;
        }
    }
    Ok(())
}

/// Accept one command per UDP datagram on `port`, replying on the same
/// socket to the sender's address.
pub fn run_udp(executive: Arc<Mutex<Executive>>, port: u16) -> std::io::Result<()> {
    let socket = UdpSocket::bind(("127.0.0.1", port))?;
    log::info!("server: UDP listening on 127.0.0.1:{port}");
    let mut buf = [0u8; 2048];
    loop {
        let (n, src) = socket.recv_from(&mut buf)?;
        let line = String::from_utf8_lossy(&buf[..n]).into_owned();
        let response = {
            let mut exec = executive.lock().expect("executive mutex poisoned");
            dispatch(&mut exec, &line)
        };
        socket.send_to(response.as_bytes(), src)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executive::VideoStandard;
    use crate::test_utils::{blank_basic_rom, blank_char_rom, blank_kernal_rom};

    fn fresh_exec() -> Executive {
        Executive::new(blank_basic_rom(), blank_kernal_rom(), blank_char_rom(), None, VideoStandard::Pal)
    }

    #[test]
    fn parses_poke_with_hex_and_decimal_operands() {
        assert_eq!(parse_line("POKE $D020 5").unwrap(), ServerCommand::Poke { addr: 0xD020, val: 5 });
        assert_eq!(parse_line("poke 53280 6").unwrap(), ServerCommand::Poke { addr: 53280, val: 6 });
    }

    #[test]
    fn rejects_out_of_range_operands() {
        assert!(parse_line("POKE $10000 0").is_err());
        assert!(parse_line("POKE $D020 256").is_err());
        assert!(parse_line("KEY 64").is_err());
    }

    #[test]
    fn attach_disk_defaults_to_device_8() {
        assert_eq!(
            parse_line("ATTACH-DISK game.d64").unwrap(),
            ServerCommand::AttachDisk { path: PathBuf::from("game.d64"), device: 8 }
        );
        assert_eq!(
            parse_line("ATTACH-DISK game.d64 9").unwrap(),
            ServerCommand::AttachDisk { path: PathBuf::from("game.d64"), device: 9 }
        );
    }

    #[test]
    fn unknown_command_is_a_parse_error() {
        assert!(parse_line("FROBNICATE").is_err());
    }

    #[test]
    fn dispatch_poke_then_peek_round_trips() {
        let mut exec = fresh_exec();
        assert_eq!(dispatch(&mut exec, "POKE 2048 65"), "OK");
        assert_eq!(dispatch(&mut exec, "PEEK 2048"), "41");
    }

    #[test]
    fn dispatch_attach_disk_reports_invalid_d64() {
        let mut exec = fresh_exec();
        let path = std::env::temp_dir().join("vicsim64-server-test-bad.d64");
        std::fs::write(&path, vec![0u8; 42]).unwrap();
        assert_eq!(dispatch(&mut exec, &format!("ATTACH-DISK {}", path.display())), "ERR: invalid d64");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn dispatch_unknown_command_is_prefixed_err() {
        let mut exec = fresh_exec();
        let response = dispatch(&mut exec, "NONSENSE");
        assert!(response.starts_with("ERR:"));
    }

    #[test]
    fn dispatch_reset_clears_cycle_counter() {
        let mut exec = fresh_exec();
        exec.mem_mut().poke_raw(0xFFFC, 0x00);
        exec.mem_mut().poke_raw(0xFFFD, 0x08);
        exec.mem_mut().poke_raw(0x0800, 0xEA);
        exec.reset();
        exec.tick();
        assert!(exec.cycles_run() > 0);
        dispatch(&mut exec, "RESET");
        assert_eq!(exec.cycles_run(), 0);
    }
}
