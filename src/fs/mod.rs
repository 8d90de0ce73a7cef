//! File system operations abstraction for testing
//!
//! This module provides a trait-based abstraction over the file system
//! operations used to lay out a run's output directory, so that renderers and
//! artifact publication can be mocked in tests using the `mockall` crate.
//!
//! # Examples
//!
//! ```rust,no_run
//! use storyreel::fs::{FileSystemOperations, StandardFileSystem};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fs_ops: Arc<dyn FileSystemOperations> = Arc::new(StandardFileSystem);
//!
//!     fs_ops.create_dir_all(Path::new("output/20250101-120000-ab12cd")).await?;
//!     fs_ops
//!         .write(Path::new("output/20250101-120000-ab12cd/run.log"), b"started")
//!         .await?;
//!
//!     if fs_ops.exists(Path::new("output/20250101-120000-ab12cd/run.log")).await {
//!         println!("Run log was written");
//!     }
//!
//!     Ok(())
//! }
//! ```
use anyhow::{Context, Result};
use std::path::Path;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

/// Trait for file system operations that can be mocked in tests
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait::async_trait]
pub trait FileSystemOperations: Send + Sync {
    /// Create a directory and all its parent directories
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Write data to a file, creating the file if it doesn't exist
    async fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Check if a path exists
    async fn exists(&self, path: &Path) -> bool;
}

/// Standard implementation that uses actual file system operations
///
/// This is the production implementation of `FileSystemOperations`. Switch
/// to `MockFileSystemOperations` in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFileSystem;

#[async_trait::async_trait]
impl FileSystemOperations for StandardFileSystem {
    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path)
            .await
            .with_context(|| format!("failed to create directory {}", path.display()))
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        tokio::fs::write(path, contents)
            .await
            .with_context(|| format!("failed to write {}", path.display()))
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_standard_file_system_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("run").join("generated-code");
        let fs_ops = StandardFileSystem;

        fs_ops.create_dir_all(&nested).await.unwrap();
        let file = nested.join("main.tsx");
        assert!(!fs_ops.exists(&file).await);

        fs_ops.write(&file, b"export {}").await.unwrap();
        assert!(fs_ops.exists(&file).await);
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "export {}");
    }

    #[tokio::test]
    async fn test_write_error_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("missing").join("run.log");

        let err = StandardFileSystem.write(&file, b"x").await.unwrap_err();
        assert!(err.to_string().contains("run.log"));
    }
}
