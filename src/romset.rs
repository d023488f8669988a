/*!
ROM file discovery and loading. Fatal at startup on a missing or
size-mismatched required ROM (spec.md §7): the emulator never partially
boots. Character ROM and the 1541 DOS ROM are optional — they are only
fatal when the caller asks for them (graphics mode, full IEC drive path
respectively).

Grounded in the teacher's `cartridge.rs::from_ines_file` shape:
read-file-then-delegate-to-byte-parser, typed errors up front.
*/

use std::path::PathBuf;

use crate::drive1541::DOS_ROM_SIZE;
use crate::error::{EmulatorError, Result};
use crate::membus::{BASIC_ROM_SIZE, CHAR_ROM_SIZE, KERNAL_ROM_SIZE};

const BASIC_FILENAME: &str = "basic.rom";
const KERNAL_FILENAME: &str = "kernal.rom";
const CHARACTER_FILENAME: &str = "characters.rom";
const DOS_FILENAME: &str = "1541.rom";

/// The four ROM images a fully-configured system can use. BASIC and KERNAL
/// are always loaded; Character and 1541 DOS are optional.
pub struct RomSet {
    pub basic: Vec<u8>,
    pub kernal: Vec<u8>,
    pub character: Option<Vec<u8>>,
    pub drive_dos: Option<Vec<u8>>,
}

impl RomSet {
    pub fn load(search_paths: &[PathBuf], need_character: bool, need_dos: bool) -> Result<RomSet> {
        let basic = Self::load_required(BASIC_FILENAME, BASIC_ROM_SIZE, search_paths)?;
        let kernal = Self::load_required(KERNAL_FILENAME, KERNAL_ROM_SIZE, search_paths)?;

        let character = if need_character {
            Some(Self::load_required(CHARACTER_FILENAME, CHAR_ROM_SIZE, search_paths)?)
        } else {
            Self::try_load(CHARACTER_FILENAME, CHAR_ROM_SIZE, search_paths)?
        };

        let drive_dos = if need_dos {
            Some(Self::load_required(DOS_FILENAME, DOS_ROM_SIZE, search_paths)?)
        } else {
            Self::try_load(DOS_FILENAME, DOS_ROM_SIZE, search_paths)?
        };

        Ok(RomSet { basic, kernal, character, drive_dos })
    }

    fn find(filename: &'static str, search_paths: &[PathBuf]) -> Option<PathBuf> {
        search_paths.iter().map(|dir| dir.join(filename)).find(|p| p.is_file())
    }

    fn load_required(filename: &'static str, expected_size: usize, search_paths: &[PathBuf]) -> Result<Vec<u8>> {
        let path = Self::find(filename, search_paths).ok_or_else(|| {
            log::error!("required ROM '{filename}' not found on search path {search_paths:?}");
            EmulatorError::RomMissing { name: filename, searched: search_paths.to_vec() }
        })?;
        let data = std::fs::read(&path).map_err(|source| EmulatorError::RomIo { path: path.clone(), source })?;
        if data.len() != expected_size {
            return Err(EmulatorError::RomSizeMismatch {
                name: filename,
                expected: expected_size,
                actual: data.len(),
            });
        }
        log::info!("loaded ROM '{filename}' from {path:?} ({} bytes)", data.len());
        Ok(data)
    }

    fn try_load(filename: &'static str, expected_size: usize, search_paths: &[PathBuf]) -> Result<Option<Vec<u8>>> {
        match Self::find(filename, search_paths) {
            Some(_) => Self::load_required(filename, expected_size, search_paths).map(Some),
            None => {
                log::debug!("optional ROM '{filename}' not found on search path, continuing without it");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vicsim64-romset-test-{tag}-{:p}", &tag));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_basic_rom_is_fatal() {
        let dir = scratch_dir("missing");
        let err = RomSet::load(&[dir], false, false).unwrap_err();
        assert!(matches!(err, EmulatorError::RomMissing { name: "basic.rom", .. }));
    }

    #[test]
    fn size_mismatch_is_fatal() {
        let dir = scratch_dir("mismatch");
        fs::write(dir.join(BASIC_FILENAME), vec![0u8; 10]).unwrap();
        fs::write(dir.join(KERNAL_FILENAME), vec![0u8; KERNAL_ROM_SIZE]).unwrap();
        let err = RomSet::load(&[dir], false, false).unwrap_err();
        assert!(matches!(err, EmulatorError::RomSizeMismatch { name: "basic.rom", .. }));
    }

    #[test]
    fn optional_roms_absent_without_need_flags() {
        let dir = scratch_dir("optional");
        fs::write(dir.join(BASIC_FILENAME), vec![0u8; BASIC_ROM_SIZE]).unwrap();
        fs::write(dir.join(KERNAL_FILENAME), vec![0u8; KERNAL_ROM_SIZE]).unwrap();
        let roms = RomSet::load(&[dir], false, false).unwrap();
        assert!(roms.character.is_none());
        assert!(roms.drive_dos.is_none());
    }

    #[test]
    fn required_character_rom_missing_is_fatal() {
        let dir = scratch_dir("need-char");
        fs::write(dir.join(BASIC_FILENAME), vec![0u8; BASIC_ROM_SIZE]).unwrap();
        fs::write(dir.join(KERNAL_FILENAME), vec![0u8; KERNAL_ROM_SIZE]).unwrap();
        let err = RomSet::load(&[dir], true, false).unwrap_err();
        assert!(matches!(err, EmulatorError::RomMissing { name: "characters.rom", .. }));
    }

    #[test]
    fn all_four_roms_load_successfully() {
        let dir = scratch_dir("all-four");
        fs::write(dir.join(BASIC_FILENAME), vec![0u8; BASIC_ROM_SIZE]).unwrap();
        fs::write(dir.join(KERNAL_FILENAME), vec![0u8; KERNAL_ROM_SIZE]).unwrap();
        fs::write(dir.join(CHARACTER_FILENAME), vec![0u8; CHAR_ROM_SIZE]).unwrap();
        fs::write(dir.join(DOS_FILENAME), vec![0u8; DOS_ROM_SIZE]).unwrap();
        let roms = RomSet::load(&[dir], true, true).unwrap();
        assert_eq!(roms.character.unwrap().len(), CHAR_ROM_SIZE);
        assert_eq!(roms.drive_dos.unwrap().len(), DOS_ROM_SIZE);
    }
}
