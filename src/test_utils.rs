//! Shared test fixtures, mirroring the teacher's `test_utils::build_ines`
//! family: small builders that assemble minimal-but-valid byte blobs so
//! individual test modules don't each hand-roll the same boilerplate.

use crate::d64::{D64Image, SIZE_35_TRACK};
use crate::membus::{BASIC_ROM_SIZE, CHAR_ROM_SIZE, KERNAL_ROM_SIZE};

pub fn blank_basic_rom() -> Vec<u8> {
    vec![0u8; BASIC_ROM_SIZE]
}

pub fn blank_kernal_rom() -> Vec<u8> {
    vec![0u8; KERNAL_ROM_SIZE]
}

pub fn blank_char_rom() -> Vec<u8> {
    vec![0u8; CHAR_ROM_SIZE]
}

fn spt(t: u8) -> u8 {
    match t {
        1..=17 => 21,
        18..=24 => 19,
        25..=30 => 18,
        31..=40 => 17,
        _ => 0,
    }
}

fn offset(t: u8, s: u8) -> usize {
    let mut o = 0usize;
    for tt in 1..t {
        o += spt(tt) as usize * 256;
    }
    o + s as usize * 256
}

/// Build a minimal, well-formed 35-track D64 image with a disk name/id and
/// up to 8 PRG files (one directory sector's worth), all chained on track 1.
pub fn build_test_d64(disk_name: &str, disk_id: &str, files: &[(&str, Vec<u8>)]) -> D64Image {
    assert!(files.len() <= 8, "fixture builder only supports one directory sector");

    let mut data = vec![0u8; SIZE_35_TRACK];

    let bam = offset(18, 0);
    for b in data[bam..bam + 256].iter_mut() {
        *b = 0xA0;
    }
    data[bam] = 18;
    data[bam + 1] = 1;
    let name_bytes = disk_name.as_bytes();
    for k in 0..16 {
        data[bam + 0x90 + k] = *name_bytes.get(k).unwrap_or(&0xA0);
    }
    let id_bytes = disk_id.as_bytes();
    for k in 0..2 {
        data[bam + 0xA2 + k] = *id_bytes.get(k).unwrap_or(&0xA0);
    }
    for t in 1u8..=35 {
        if t == 18 {
            continue;
        }
        data[bam + 4 + (t as usize - 1) * 4] = spt(t);
    }

    let dir = offset(18, 1);
    data[dir] = 0;
    data[dir + 1] = 0xFF;

    let mut cursor_sector: u8 = 0;
    for (i, (name, payload)) in files.iter().enumerate() {
        let first_track = 1u8;
        let first_sector = cursor_sector;
        let n_sectors = if payload.is_empty() { 1 } else { payload.len().div_ceil(254) };

        let slot = dir + i * 32;
        data[slot + 2] = 0x82; // closed, PRG
        data[slot + 3] = first_track;
        data[slot + 4] = first_sector;
        let name_bytes = name.as_bytes();
        for k in 0..16 {
            data[slot + 5 + k] = *name_bytes.get(k).unwrap_or(&0xA0);
        }
        let blocks = n_sectors as u16;
        data[slot + 30] = blocks.to_le_bytes()[0];
        data[slot + 31] = blocks.to_le_bytes()[1];

        let mut remaining = payload.as_slice();
        let mut sector = first_sector;
        for chunk_idx in 0..n_sectors {
            let sec_off = offset(first_track, sector);
            let is_last = chunk_idx == n_sectors - 1;
            let take = remaining.len().min(254);
            data[sec_off + 2..sec_off + 2 + take].copy_from_slice(&remaining[..take]);
            remaining = &remaining[take..];
            if is_last {
                data[sec_off] = 0;
                data[sec_off + 1] = take as u8;
            } else {
                data[sec_off] = first_track;
                data[sec_off + 1] = sector + 1;
                sector += 1;
            }
        }
        cursor_sector = sector + 1;
    }

    D64Image::from_bytes(data).unwrap()
}
