//! Asset library scanning
//!
//! A library is a directory of asset folders, each holding at least one
//! `.blend` file, plus any `.blend` files sitting directly in the library
//! root. Folder assets are named after the folder; root files after the file
//! stem. Scan order is sorted by entry name so pagination is stable.

use crate::error::SceneError;
use std::path::{Path, PathBuf};

/// Asset library configured on the host: a name and a directory
#[derive(Debug, Clone)]
pub struct AssetLibrary {
    pub name: String,
    pub path: PathBuf,
}

/// One asset discovered in a library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    pub name: String,
    pub blend_file: String,
}

fn scan_err(err: std::io::Error) -> SceneError {
    SceneError::LibraryScan(err.to_string())
}

fn blend_files(dir: &Path) -> Result<Vec<String>, SceneError> {
    let mut files: Vec<String> = std::fs::read_dir(dir)
        .map_err(scan_err)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(".blend"))
        .collect();
    files.sort();
    Ok(files)
}

/// List every asset in the library rooted at `path`
pub fn scan_library(path: &Path) -> Result<Vec<AssetEntry>, SceneError> {
    if !path.is_dir() {
        return Err(SceneError::LibraryPathMissing(path.display().to_string()));
    }

    let mut entries: Vec<_> = std::fs::read_dir(path)
        .map_err(scan_err)?
        .filter_map(|entry| entry.ok())
        .collect();
    entries.sort_by_key(|entry| entry.file_name());

    let mut assets = Vec::new();
    for entry in entries {
        let Ok(entry_name) = entry.file_name().into_string() else {
            continue;
        };
        let entry_path = entry.path();
        if entry_path.is_dir() {
            if let Some(first) = blend_files(&entry_path)?.into_iter().next() {
                assets.push(AssetEntry {
                    name: entry_name,
                    blend_file: first,
                });
            }
        } else if let Some(stem) = entry_name.strip_suffix(".blend") {
            assets.push(AssetEntry {
                name: stem.to_string(),
                blend_file: entry_name.clone(),
            });
        }
    }
    Ok(assets)
}

/// Resolve the `.blend` file backing `asset_name`: either the first file in
/// the asset's folder, or a root-level `<asset_name>.blend`
pub fn resolve_asset(path: &Path, asset_name: &str) -> Result<PathBuf, SceneError> {
    let asset_dir = path.join(asset_name);
    if asset_dir.is_dir() {
        if let Some(first) = blend_files(&asset_dir)?.into_iter().next() {
            return Ok(asset_dir.join(first));
        }
    } else {
        let candidate = path.join(format!("{asset_name}.blend"));
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    Err(SceneError::AssetNotFound(asset_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture_library() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        // Folder asset with two blend files; the first sorted one wins
        fs::create_dir(dir.path().join("Chair")).unwrap();
        fs::write(dir.path().join("Chair/chair_v2.blend"), b"").unwrap();
        fs::write(dir.path().join("Chair/chair_v1.blend"), b"").unwrap();
        // Folder without blend files is not an asset
        fs::create_dir(dir.path().join("notes")).unwrap();
        fs::write(dir.path().join("notes/readme.txt"), b"").unwrap();
        // Root-level blend file
        fs::write(dir.path().join("Table.blend"), b"").unwrap();
        dir
    }

    #[test]
    fn scan_finds_folder_and_root_assets() {
        let dir = fixture_library();
        let assets = scan_library(dir.path()).unwrap();
        assert_eq!(
            assets,
            vec![
                AssetEntry {
                    name: "Chair".into(),
                    blend_file: "chair_v1.blend".into()
                },
                AssetEntry {
                    name: "Table".into(),
                    blend_file: "Table.blend".into()
                },
            ]
        );
    }

    #[test]
    fn missing_library_path_errors() {
        let err = scan_library(Path::new("/nonexistent/library")).unwrap_err();
        assert!(matches!(err, SceneError::LibraryPathMissing(_)));
    }

    #[test]
    fn resolve_folder_asset() {
        let dir = fixture_library();
        let path = resolve_asset(dir.path(), "Chair").unwrap();
        assert!(path.ends_with("Chair/chair_v1.blend"));
    }

    #[test]
    fn resolve_root_asset() {
        let dir = fixture_library();
        let path = resolve_asset(dir.path(), "Table").unwrap();
        assert!(path.ends_with("Table.blend"));
    }

    #[test]
    fn resolve_unknown_asset_errors() {
        let dir = fixture_library();
        let err = resolve_asset(dir.path(), "Sofa").unwrap_err();
        assert_eq!(err.to_string(), "No .blend file found for asset: Sofa");
    }
}
