use std::io;
use std::path::Path;

use async_trait::async_trait;

use super::FileSystem;
use crate::types::Metadata;

/// The local disk, accessed through `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

#[async_trait]
impl FileSystem for LocalFs {
    async fn lstat(&self, path: &Path) -> io::Result<Metadata> {
        let metadata = tokio::fs::symlink_metadata(path).await?;
        Ok(Metadata::from_fs_metadata(&metadata))
    }

    async fn list_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut read_dir = tokio::fs::read_dir(path).await?;
        let mut names = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            // Non-UTF-8 names are kept lossily; the lossy name will usually
            // fail its own lstat and be reported like any other bad entry.
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }
}
