/*!
D64 disk image reader: track/sector geometry, the BAM, the directory chain,
and file extraction. Read-only — write-back to disk images is an explicit
non-goal.

Grounded in the teacher's `cartridge.rs` parse-validate-construct shape
(`from_ines_bytes`'s precondition checks up front, typed errors, small
accessor methods afterward) adapted to D64 geometry and directory walking.
*/

use crate::error::EmulatorError;

pub const SIZE_35_TRACK: usize = 174_848;
pub const SIZE_40_TRACK: usize = 196_608;

const BAM_TRACK: u8 = 18;
const BAM_SECTOR: u8 = 0;
const DIR_START_TRACK: u8 = 18;
const DIR_START_SECTOR: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileType {
    Del,
    Seq,
    Prg,
    Usr,
    Rel,
}

impl FileType {
    fn from_byte(b: u8) -> Self {
        match b & 0x0F {
            1 => FileType::Seq,
            2 => FileType::Prg,
            3 => FileType::Usr,
            4 => FileType::Rel,
            _ => FileType::Del,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            FileType::Del => "DEL",
            FileType::Seq => "SEQ",
            FileType::Prg => "PRG",
            FileType::Usr => "USR",
            FileType::Rel => "REL",
        }
    }
}

#[derive(Clone, Debug)]
pub struct DirEntry {
    pub file_type: FileType,
    pub track: u8,
    pub sector: u8,
    pub name: String,
    pub blocks: u16,
}

#[derive(Clone, Debug)]
pub struct D64Image {
    data: Vec<u8>,
    tracks: u8,
}

fn petscii_trim(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0xA0).unwrap_or(bytes.len());
    bytes[..end].iter().map(|&b| b as char).collect()
}

impl D64Image {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, EmulatorError> {
        let tracks = match data.len() {
            SIZE_35_TRACK => 35,
            SIZE_40_TRACK => 40,
            other => {
                return Err(EmulatorError::D64Malformed(format!(
                    "unexpected image size {other} bytes (expected {SIZE_35_TRACK} or {SIZE_40_TRACK})"
                )))
            }
        };
        Ok(D64Image { data, tracks })
    }

    pub fn sectors_per_track(track: u8) -> u8 {
        match track {
            1..=17 => 21,
            18..=24 => 19,
            25..=30 => 18,
            31..=40 => 17,
            _ => 0,
        }
    }

    pub fn track_sector_offset(&self, track: u8, sector: u8) -> Result<usize, EmulatorError> {
        if track == 0 || track > self.tracks {
            return Err(EmulatorError::D64Malformed(format!(
                "track {track} out of range (1..={})",
                self.tracks
            )));
        }
        let spt = Self::sectors_per_track(track);
        if sector >= spt {
            return Err(EmulatorError::D64Malformed(format!(
                "sector {sector} out of range for track {track} (0..{spt})"
            )));
        }
        let mut offset = 0usize;
        for t in 1..track {
            offset += Self::sectors_per_track(t) as usize * 256;
        }
        offset += sector as usize * 256;
        Ok(offset)
    }

    pub fn read_sector(&self, track: u8, sector: u8) -> Result<&[u8], EmulatorError> {
        let offset = self.track_sector_offset(track, sector)?;
        Ok(&self.data[offset..offset + 256])
    }

    pub fn directory_entries(&self) -> Result<Vec<DirEntry>, EmulatorError> {
        let mut entries = Vec::new();
        let mut t = DIR_START_TRACK;
        let mut s = DIR_START_SECTOR;
        let mut visited = 0;
        loop {
            let sector = self.read_sector(t, s)?;
            let next_t = sector[0];
            let next_s = sector[1];
            for slot in 0..8 {
                let off = slot * 32;
                let first_track = sector[off + 3];
                if first_track == 0 {
                    continue;
                }
                entries.push(DirEntry {
                    file_type: FileType::from_byte(sector[off + 2]),
                    track: first_track,
                    sector: sector[off + 4],
                    name: petscii_trim(&sector[off + 5..off + 21]),
                    blocks: u16::from_le_bytes([sector[off + 30], sector[off + 31]]),
                });
            }
            visited += 1;
            if next_t == 0 || visited > 256 {
                break;
            }
            t = next_t;
            s = next_s;
        }
        Ok(entries)
    }

    pub fn read_file(&self, name: &str) -> Result<Vec<u8>, EmulatorError> {
        let entries = self.directory_entries()?;
        let entry = entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| EmulatorError::D64Malformed(format!("file not found: {name}")))?;

        let mut out = Vec::new();
        let mut t = entry.track;
        let mut s = entry.sector;
        let mut visited = 0;
        loop {
            let sector = self.read_sector(t, s)?;
            let next_t = sector[0];
            let next_s = sector[1];
            if next_t == 0 {
                let used = (next_s as usize).min(254);
                out.extend_from_slice(&sector[2..2 + used]);
                break;
            }
            out.extend_from_slice(&sector[2..256]);
            t = next_t;
            s = next_s;
            visited += 1;
            if visited > 4096 {
                return Err(EmulatorError::D64Malformed(format!("file chain for {name} did not terminate")));
            }
        }
        Ok(out)
    }

    pub fn disk_name(&self) -> Result<String, EmulatorError> {
        let bam = self.read_sector(BAM_TRACK, BAM_SECTOR)?;
        Ok(petscii_trim(&bam[0x90..0xA0]))
    }

    pub fn disk_id(&self) -> Result<String, EmulatorError> {
        let bam = self.read_sector(BAM_TRACK, BAM_SECTOR)?;
        Ok(petscii_trim(&bam[0xA2..0xA4]))
    }

    pub fn blocks_free(&self) -> Result<u32, EmulatorError> {
        let bam = self.read_sector(BAM_TRACK, BAM_SECTOR)?;
        let mut total = 0u32;
        for t in 1..=self.tracks.min(35) {
            if t == BAM_TRACK {
                continue;
            }
            total += bam[4 + (t as usize - 1) * 4] as u32;
        }
        Ok(total)
    }

    /// Render a `LOAD"$",8` style directory listing as a linked-list BASIC
    /// program: `0 "NAME            " ID 2A`, one line per file
    /// (`<blocks> "NAME"<padding>TYP`), then a trailing blocks-free line.
    pub fn directory_listing(&self) -> Result<Vec<u8>, EmulatorError> {
        let name = self.disk_name()?;
        let id = self.disk_id()?;
        let mut lines: Vec<(u16, String)> = Vec::new();
        lines.push((0, format!("\"{name:<16}\" {id} 2A")));

        for entry in self.directory_entries()? {
            let pad = 17usize.saturating_sub(entry.name.len());
            lines.push((
                entry.blocks,
                format!("\"{}\"{}{}", entry.name, " ".repeat(pad), entry.file_type.as_str()),
            ));
        }
        let free = self.blocks_free()?;
        lines.push((free as u16, "BLOCKS FREE.".to_string()));

        let mut out = Vec::new();
        let mut addr: u16 = 0x0801;
        for (i, (num, text)) in lines.iter().enumerate() {
            let blocks_field = if i == 0 {
                String::new()
            } else {
                format!("{num:<5}")
            };
            let body = format!("{blocks_field}{text}");
            let line_len = 4 + body.len() + 1;
            let next_addr = if i + 1 < lines.len() { addr.wrapping_add(line_len as u16) } else { 0 };
            out.extend_from_slice(&next_addr.to_le_bytes());
            out.extend_from_slice(&num.to_le_bytes());
            out.extend_from_slice(body.as_bytes());
            out.push(0);
            addr = addr.wrapping_add(line_len as u16);
        }
        Ok(out)
    }
}
