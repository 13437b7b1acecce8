//! Artifact path management for screenshots written into a project.
//!
//! Provides:
//! - Per-iteration screenshot paths (`.screenshot_iter_<n>.png`)
//! - Discovery of earlier iteration screenshots for side-by-side review
//! - Sidecar metadata describing how a capture was produced

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// File name prefix for validation iteration screenshots
pub const ITERATION_PREFIX: &str = ".screenshot_iter_";

/// Default output file for a standalone capture
pub const DEFAULT_CAPTURE_FILE: &str = "screenshot.png";

/// Path of the screenshot for validation iteration `iteration`
pub fn iteration_screenshot(dir: &Path, iteration: u32) -> PathBuf {
    dir.join(format!("{}{}.png", ITERATION_PREFIX, iteration))
}

/// Parse the iteration number out of an iteration screenshot file name
pub fn parse_iteration(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    name.strip_prefix(ITERATION_PREFIX)?
        .strip_suffix(".png")?
        .parse()
        .ok()
}

/// List iteration screenshots in `dir`, ordered by iteration number
pub fn list_iteration_screenshots(dir: &Path) -> std::io::Result<Vec<(u32, PathBuf)>> {
    let mut shots = Vec::new();
    if dir.is_dir() {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if let Some(n) = parse_iteration(&path) {
                shots.push((n, path));
            }
        }
    }
    shots.sort_by_key(|(n, _)| *n);
    Ok(shots)
}

/// Metadata written next to a capture as `<file>.json`
#[derive(Debug, Clone, Serialize)]
pub struct CaptureMetadata {
    pub url: String,
    pub captured_at: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub file_size: u64,
    pub retries: u32,
}

/// Path of the metadata sidecar for `image`
pub fn metadata_path(image: &Path) -> PathBuf {
    let mut name = image
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".json");
    image.with_file_name(name)
}

/// Write capture metadata next to the image
pub fn write_metadata(image: &Path, metadata: &CaptureMetadata) -> std::io::Result<PathBuf> {
    let path = metadata_path(image);
    fs::write(&path, serde_json::to_string_pretty(metadata)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_iteration_screenshot_path() {
        let path = iteration_screenshot(Path::new("/proj"), 2);
        assert_eq!(path, PathBuf::from("/proj/.screenshot_iter_2.png"));
        assert_eq!(parse_iteration(&path), Some(2));
        assert_eq!(parse_iteration(Path::new("/proj/screenshot.png")), None);
    }

    #[test]
    fn test_list_iteration_screenshots_sorted() {
        let dir = TempDir::new().unwrap();
        for n in [3, 1, 10] {
            fs::write(iteration_screenshot(dir.path(), n), b"png").unwrap();
        }
        fs::write(dir.path().join("other.png"), b"png").unwrap();

        let shots = list_iteration_screenshots(dir.path()).unwrap();
        let order: Vec<u32> = shots.iter().map(|(n, _)| *n).collect();
        assert_eq!(order, vec![1, 3, 10]);
    }

    #[test]
    fn test_metadata_sidecar() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("screenshot.png");
        let meta = CaptureMetadata {
            url: "http://localhost:8501".to_string(),
            captured_at: "2026-01-01T00:00:00Z".to_string(),
            width: Some(1920),
            height: Some(1080),
            file_size: 120_000,
            retries: 1,
        };
        let path = write_metadata(&image, &meta).unwrap();
        assert_eq!(path, dir.path().join("screenshot.png.json"));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["retries"], 1);
    }
}
