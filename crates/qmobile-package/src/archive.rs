//! Zip container access shared by the APK and IPA readers

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::Result;

/// An opened package archive
pub(crate) struct PackageArchive {
    archive: ZipArchive<BufReader<File>>,
    names: Vec<String>,
}

impl PackageArchive {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let archive = ZipArchive::new(BufReader::new(file))?;
        let names = archive.file_names().map(|n| n.to_string()).collect();
        Ok(Self { archive, names })
    }

    pub(crate) fn names(&self) -> &[String] {
        &self.names
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Read an entry fully, `None` when it does not exist
    pub(crate) fn read(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let mut entry = match self.archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        // Declared sizes come from the archive and are not trusted for allocation
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        Ok(Some(data))
    }

    /// Uncompressed size of an entry
    pub(crate) fn size(&mut self, name: &str) -> u64 {
        self.archive.by_name(name).map(|e| e.size()).unwrap_or(0)
    }

    /// Pick the largest entry among `candidates`
    pub(crate) fn largest<'a>(&mut self, candidates: impl IntoIterator<Item = &'a String>) -> Option<String> {
        let mut best: Option<(u64, String)> = None;
        for name in candidates {
            let size = self.size(name);
            if best.as_ref().map_or(true, |(s, _)| size > *s) {
                best = Some((size, name.clone()));
            }
        }
        best.map(|(_, name)| name)
    }
}

/// File name component of an archive entry path
pub(crate) fn base_name(entry: &str) -> &str {
    entry.rsplit('/').next().unwrap_or(entry)
}
