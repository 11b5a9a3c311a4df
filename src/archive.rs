//! EPUB archive access.
//!
//! A thin wrapper over a ZIP archive that resolves declared hrefs against
//! actual entry names. Packages authored on case-insensitive filesystems
//! routinely disagree with their own manifest about path casing, so lookups
//! go through a normalized lowercase index built once per open; reads always
//! use the entry's original name.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{Error, Result};
use crate::util::normalize_entry_path;

pub struct Archive {
    zip: ZipArchive<File>,
    /// Maps normalized lowercase path -> original entry name.
    index: HashMap<String, String>,
}

impl Archive {
    /// Open an EPUB file and index its entries.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::ArchiveUnreadable {
            path: path.to_path_buf(),
            source: ZipError::Io(e),
        })?;
        let zip = ZipArchive::new(file).map_err(|e| Error::ArchiveUnreadable {
            path: path.to_path_buf(),
            source: e,
        })?;
        let index = zip
            .file_names()
            .map(|name| (normalize_entry_path(name).to_lowercase(), name.to_string()))
            .collect();
        Ok(Self { zip, index })
    }

    /// Original entry name for a declared href, if present.
    ///
    /// Matching ignores slash direction, a leading slash, and case. Falls
    /// back to the percent-decoded href; package documents often encode
    /// spaces and non-ASCII in hrefs while entry names stay literal.
    pub fn resolve(&self, declared: &str) -> Option<&str> {
        let key = normalize_entry_path(declared).to_lowercase();
        if let Some(name) = self.index.get(&key) {
            return Some(name);
        }

        let decoded = percent_encoding::percent_decode_str(declared)
            .decode_utf8()
            .ok()?;
        let key = normalize_entry_path(&decoded).to_lowercase();
        self.index.get(&key).map(String::as_str)
    }

    /// Names of all entries, as stored in the archive.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.zip.file_names()
    }

    /// Read an entry's bytes by its exact stored name.
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut entry = match self.zip.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Err(Error::EntryNotFound(name.to_string())),
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}
