use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;

use encoding_rs::WINDOWS_1252;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::asset::Asset;
use crate::error::PackageError;

/// Loaded package: a stable-indexed list of assets.
///
/// Entries can be modified in place but never inserted, removed or
/// reordered, so an index taken during analysis stays valid until save.
#[derive(Debug, Clone, Default)]
pub struct Package {
    assets: Vec<Asset>,
}

impl Package {
    pub fn new(assets: Vec<Asset>) -> Self {
        Self { assets }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Asset> {
        self.assets.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Asset> {
        self.assets.get_mut(index)
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut [Asset] {
        &mut self.assets
    }

    /// Sum of all entry sizes in bytes.
    pub fn total_size(&self) -> u64 {
        self.assets.iter().map(|a| a.data.len() as u64).sum()
    }

    /// Index of the entry with this name (case-insensitive).
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.assets
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))
    }
}

/// Container format collaborator: turns raw bytes into a [`Package`] and back.
pub trait PackageFormat {
    fn load(&self, bytes: &[u8]) -> Result<Package, PackageError>;
    fn save(&self, package: &Package, path: &Path) -> Result<(), PackageError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PackageError::Format(format!("invalid output path {}", path.display())))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        // Write next to the destination, then rename over it. The temp file
        // is deleted on drop unless persisted.
        let mut temp = tempfile::Builder::new()
            .prefix(&format!(".{}.", file_name))
            .suffix(".tmp")
            .tempfile_in(dir)?;
        {
            let mut writer = ZipWriter::new(BufWriter::new(&mut temp));
            let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

            for asset in package.assets() {
                writer.start_file(asset.name.as_str(), options)?;
                writer.write_all(&asset.data)?;
            }
            writer.finish()?.flush()?;
        }

        temp.persist(path).map_err(|e| PackageError::Io(e.error))?;
        debug!(path = %path.display(), entries = package.len(), "saved zip package");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn sample() -> Package {
        Package::new(vec![
            Asset::new("tex/wall.tga", vec![1, 2, 3]),
            Asset::new("level.ldd", b"wall.tga".to_vec()),
        ])
    }

    #[test]
    fn test_zip_save_load_keeps_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pack.pkg");

        ZipPackageFormat.save(&sample(), &path).unwrap();
        let bytes = fs::read(&path).unwrap();
        let loaded = ZipPackageFormat.load(&bytes).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(0).unwrap().name, "tex/wall.tga");
        assert_eq!(loaded.get(1).unwrap().data, b"wall.tga");
        assert_eq!(loaded.total_size(), 11);
    }

    #[test]
    fn test_failed_save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pack.pkg");
        // A non-empty directory cannot be replaced by the rename
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();

        assert!(ZipPackageFormat.save(&sample(), &path).is_err());

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("pack.pkg")]);
        assert!(path.join("keep").exists());
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pack.pkg");
        fs::write(&path, b"old").unwrap();

        ZipPackageFormat.save(&sample(), &path).unwrap();
        assert_eq!(ZipPackageFormat.load(&fs::read(&path).unwrap()).unwrap().len(), 2);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(ZipPackageFormat.load(b"definitely not a zip").is_err());
    }

    #[test]
    fn test_find_by_name_ignores_case() {
        let p = sample();
        assert_eq!(p.find_by_name("TEX/WALL.TGA"), Some(0));
        assert_eq!(p.find_by_name("missing.dds"), None);
    }
}
