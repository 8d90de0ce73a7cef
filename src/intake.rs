//! Photo intake: turns a source directory into the ordered asset list the
//! story script is generated against.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::story_script::Asset;

const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];
const UNSUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["heic", "heif", "gif", "bmp", "tif", "tiff"];

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("source directory does not exist: {0}")]
    Missing(PathBuf),
    #[error("source path is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("no supported images (jpg, jpeg, png, webp) found in {0}")]
    NoImages(PathBuf),
    #[error("found {found} images in {dir}, but at most {max} are supported")]
    TooManyImages { dir: PathBuf, found: usize, max: usize },
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IntakeError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Collects the images directly inside `source_dir`, sorted by file name,
/// and assigns them ids `img_001`, `img_002`, ...
pub async fn collect_assets(source_dir: &Path, max_images: usize) -> Result<Vec<Asset>, IntakeError> {
    let metadata = match tokio::fs::metadata(source_dir).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(IntakeError::Missing(source_dir.to_path_buf()))
        }
        Err(e) => return Err(IntakeError::io(source_dir, e)),
    };
    if !metadata.is_dir() {
        return Err(IntakeError::NotADirectory(source_dir.to_path_buf()));
    }

    let source_dir = tokio::fs::canonicalize(source_dir)
        .await
        .map_err(|e| IntakeError::io(source_dir, e))?;

    let mut entries = tokio::fs::read_dir(&source_dir)
        .await
        .map_err(|e| IntakeError::io(&source_dir, e))?;

    let mut images = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| IntakeError::io(&source_dir, e))? {
        let path = entry.path();
        let file_type = entry.file_type().await.map_err(|e| IntakeError::io(&path, e))?;
        if !file_type.is_file() {
            continue;
        }

        match classify(&path) {
            ImageKind::Supported => images.push(path),
            ImageKind::Unsupported => return Err(IntakeError::UnsupportedFormat(path)),
            ImageKind::Other => debug!(path = %path.display(), "Ignoring non-image file"),
        }
    }

    if images.is_empty() {
        return Err(IntakeError::NoImages(source_dir));
    }
    if images.len() > max_images {
        return Err(IntakeError::TooManyImages {
            dir: source_dir,
            found: images.len(),
            max: max_images,
        });
    }

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    info!(count = images.len(), dir = %source_dir.display(), "Collected images");

    Ok(images
        .iter()
        .enumerate()
        .map(|(index, path)| Asset::new(format!("img_{:03}", index + 1), path.display().to_string()))
        .collect())
}

enum ImageKind {
    Supported,
    Unsupported,
    Other,
}

fn classify(path: &Path) -> ImageKind {
    let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
        return ImageKind::Other;
    };
    let extension = extension.to_ascii_lowercase();
    if SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        ImageKind::Supported
    } else if UNSUPPORTED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        ImageKind::Unsupported
    } else {
        ImageKind::Other
    }
}
