//! Battery RAM persistence.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

/// Keyed store for cartridge RAM images.
///
/// Keys are cartridge save identifiers (see
/// [`Header::save_identifier`](crate::cartridge::Header::save_identifier)).
pub trait SaveStorage {
    fn save(&mut self, id: &str, data: &[u8]) -> io::Result<()>;

    /// `Ok(None)` when nothing has been stored under `id` yet.
    fn load(&mut self, id: &str) -> io::Result<Option<Vec<u8>>>;
}

/// Saves kept in a map for the lifetime of the value. Useful for tests and
/// for hosts that do not want anything written to disk.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    saves: HashMap<String, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&[u8]> {
        self.saves.get(id).map(Vec::as_slice)
    }
}

impl SaveStorage for MemoryStorage {
    fn save(&mut self, id: &str, data: &[u8]) -> io::Result<()> {
        self.saves.insert(id.to_string(), data.to_vec());
        Ok(())
    }

    fn load(&mut self, id: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.saves.get(id).cloned())
    }
}

/// One `<id>.sav` file per cartridge inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.sav"))
    }
}

impl SaveStorage for FileStorage {
    fn save(&mut self, id: &str, data: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(id), data)
    }

    fn load(&mut self, id: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(id)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
