use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::PersistError;

/// Write a decoded artifact into the output directory under its derived
/// name. The format is inferred from the `.png` extension.
pub fn persist_artifact(
    img: &DynamicImage,
    output_dir: &Path,
    name: &str,
) -> Result<PathBuf, PersistError> {
    fs::create_dir_all(output_dir).map_err(PersistError::OutputDir)?;
    let path = output_dir.join(name);
    img.save(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persists_under_derived_name() {
        let dir = tempfile::tempdir().unwrap();
        let img = DynamicImage::new_rgba8(2, 2);
        let path = persist_artifact(&img, dir.path(), "Diffusion_000_test.png").unwrap();
        assert!(path.exists());
        assert_eq!(path.file_name().unwrap(), "Diffusion_000_test.png");
    }

    #[test]
    fn creates_missing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("textures");
        let img = DynamicImage::new_rgba8(2, 2);
        let path = persist_artifact(&img, &nested, "Diffusion_001_test.png").unwrap();
        assert!(path.exists());
    }
}
