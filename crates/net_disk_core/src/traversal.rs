//! Directory tree reading.
//!
//! A drop delivers either a hierarchy of file and directory handles or a flat
//! list of files. [`collect_uploads`] turns either shape into a flat list of
//! [`PendingUpload`]s whose paths are relative to the drop target.
//!
//! Directories are expanded breadth first from an explicit frontier. Every
//! directory in a frontier level is drained concurrently, and a level is fully
//! joined before the next one starts. Draining a directory means asking its
//! [`EntryReader`] for batches until it returns an empty one.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::errors::{Error, NetDiskResult};

#[cfg(test)]
#[path = "traversal_tests.rs"]
mod tests;

/// Number of entries a local directory reader returns per batch.
pub const LOCAL_READ_BATCH_SIZE: usize = 64;

/// A readable file from a drop.
#[async_trait]
pub trait FileHandle: Send + Sync {
    /// The file's own name, without any directory part.
    fn name(&self) -> &str;

    /// Reads the full content.
    async fn read(&self) -> NetDiskResult<Vec<u8>>;
}

/// Produces the children of a directory in batches.
#[async_trait]
pub trait EntryReader: Send {
    /// Returns the next batch of children. An empty batch means the directory
    /// is exhausted.
    async fn read_entries(&mut self) -> NetDiskResult<Vec<DroppedEntry>>;
}

/// A directory from a drop.
pub trait DirectoryHandle: Send + Sync {
    fn name(&self) -> &str;

    /// Opens a fresh reader over the directory's children.
    fn reader(&self) -> Box<dyn EntryReader>;
}

/// One item of a hierarchical drop.
pub enum DroppedEntry {
    File(Arc<dyn FileHandle>),
    Directory(Box<dyn DirectoryHandle>),
}

impl fmt::Debug for DroppedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DroppedEntry::File(file) => f.debug_tuple("File").field(&file.name()).finish(),
            DroppedEntry::Directory(dir) => f.debug_tuple("Directory").field(&dir.name()).finish(),
        }
    }
}

/// Everything delivered by one drop.
pub enum DropPayload {
    /// Entries that may include directories.
    Hierarchical(Vec<DroppedEntry>),
    /// Plain files only.
    Flat(Vec<Arc<dyn FileHandle>>),
}

impl fmt::Debug for DropPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropPayload::Hierarchical(entries) => {
                f.debug_tuple("Hierarchical").field(entries).finish()
            }
            DropPayload::Flat(files) => f
                .debug_tuple("Flat")
                .field(&files.iter().map(|file| file.name()).collect::<Vec<_>>())
                .finish(),
        }
    }
}

impl DropPayload {
    /// Builds a hierarchical payload from paths on the local disk.
    ///
    /// Paths that are neither a regular file nor a directory are skipped.
    ///
    /// # Errors
    ///
    /// Returns `Error::Traversal` when a path does not exist or cannot be
    /// inspected.
    pub async fn from_local_paths<P: AsRef<Path>>(paths: &[P]) -> NetDiskResult<Self> {
        Self::from_local_paths_with_batch_size(paths, LOCAL_READ_BATCH_SIZE).await
    }

    /// Same as [`DropPayload::from_local_paths`] with an explicit reader batch
    /// size.
    pub async fn from_local_paths_with_batch_size<P: AsRef<Path>>(
        paths: &[P],
        batch_size: usize,
    ) -> NetDiskResult<Self> {
        let mut entries = Vec::with_capacity(paths.len());

        for path in paths {
            let path = path.as_ref();
            let metadata = tokio::fs::metadata(path)
                .await
                .map_err(|e| Error::traversal(path.display().to_string(), e))?;
            let name = local_name(path).await;

            if metadata.is_dir() {
                entries.push(DroppedEntry::Directory(Box::new(
                    LocalDirectory::new(name, path).with_batch_size(batch_size),
                )));
            } else if metadata.is_file() {
                entries.push(DroppedEntry::File(Arc::new(LocalFile::new(name, path))));
            } else {
                warn!(path = %path.display(), "Skipping path that is neither a file nor a directory");
            }
        }

        Ok(DropPayload::Hierarchical(entries))
    }

    /// Returns `true` if the drop contains no entries at all.
    pub fn is_empty(&self) -> bool {
        match self {
            DropPayload::Hierarchical(entries) => entries.is_empty(),
            DropPayload::Flat(files) => files.is_empty(),
        }
    }
}

/// A file to upload and where it goes relative to the drop target.
#[derive(Clone)]
pub struct PendingUpload {
    pub content: Arc<dyn FileHandle>,
    pub relative_path: String,
}

impl fmt::Debug for PendingUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingUpload")
            .field("relative_path", &self.relative_path)
            .finish()
    }
}

/// Flattens a drop into the files it contains.
///
/// The order of the result is not significant. A directory whose reader fails
/// is logged and contributes no files; its siblings are unaffected.
pub async fn collect_uploads(payload: DropPayload) -> Vec<PendingUpload> {
    let entries = match payload {
        DropPayload::Flat(files) => {
            return files
                .into_iter()
                .map(|file| PendingUpload {
                    relative_path: file.name().to_string(),
                    content: file,
                })
                .collect();
        }
        DropPayload::Hierarchical(entries) => entries,
    };

    let mut uploads = Vec::new();
    let mut frontier = Vec::new();
    place_entries(entries, "", &mut uploads, &mut frontier);

    let mut level = 0usize;
    while !frontier.is_empty() {
        level += 1;
        debug!(level, directories = frontier.len(), "Draining directory level");

        let pending = std::mem::take(&mut frontier);
        let drained = join_all(
            pending
                .into_iter()
                .map(|(prefix, dir)| drain_directory(prefix, dir)),
        )
        .await;

        for (prefix, children) in drained {
            place_entries(children, &prefix, &mut uploads, &mut frontier);
        }
    }

    info!(files = uploads.len(), "Collected files from drop");
    uploads
}

type Frontier = Vec<(String, Box<dyn DirectoryHandle>)>;

fn place_entries(
    entries: Vec<DroppedEntry>,
    prefix: &str,
    uploads: &mut Vec<PendingUpload>,
    frontier: &mut Frontier,
) {
    for entry in entries {
        match entry {
            DroppedEntry::File(file) => uploads.push(PendingUpload {
                relative_path: format!("{}{}", prefix, file.name()),
                content: file,
            }),
            DroppedEntry::Directory(dir) => frontier.push((prefix.to_string(), dir)),
        }
    }
}

/// Reads every child of `dir`, returning them with the prefix they live under.
async fn drain_directory(
    prefix: String,
    dir: Box<dyn DirectoryHandle>,
) -> (String, Vec<DroppedEntry>) {
    let child_prefix = format!("{}{}/", prefix, dir.name());
    let mut reader = dir.reader();
    let mut children = Vec::new();

    loop {
        match reader.read_entries().await {
            Ok(batch) if batch.is_empty() => break,
            Ok(batch) => children.extend(batch),
            Err(e) => {
                warn!(directory = child_prefix.as_str(), error = %e, "Failed to read directory, skipping it");
                return (child_prefix, Vec::new());
            }
        }
    }

    (child_prefix, children)
}

async fn local_name(path: &Path) -> String {
    if let Some(name) = path.file_name() {
        return name.to_string_lossy().into_owned();
    }
    match tokio::fs::canonicalize(path).await {
        Ok(full) => full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| full.display().to_string()),
        Err(_) => path.display().to_string(),
    }
}

/// A file on the local disk.
#[derive(Debug, Clone)]
pub struct LocalFile {
    name: String,
    path: PathBuf,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl FileHandle for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self) -> NetDiskResult<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| Error::traversal(self.path.display().to_string(), e))
    }
}

/// A directory on the local disk.
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    name: String,
    path: PathBuf,
    batch_size: usize,
}

impl LocalDirectory {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            batch_size: LOCAL_READ_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

impl DirectoryHandle for LocalDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn reader(&self) -> Box<dyn EntryReader> {
        Box::new(LocalEntryReader {
            path: self.path.clone(),
            batch_size: self.batch_size,
            read_dir: None,
        })
    }
}

struct LocalEntryReader {
    path: PathBuf,
    batch_size: usize,
    read_dir: Option<tokio::fs::ReadDir>,
}

#[async_trait]
impl EntryReader for LocalEntryReader {
    async fn read_entries(&mut self) -> NetDiskResult<Vec<DroppedEntry>> {
        if self.read_dir.is_none() {
            let opened = tokio::fs::read_dir(&self.path)
                .await
                .map_err(|e| Error::traversal(self.path.display().to_string(), e))?;
            self.read_dir = Some(opened);
        }
        let Some(read_dir) = self.read_dir.as_mut() else {
            return Ok(Vec::new());
        };

        let mut batch = Vec::with_capacity(self.batch_size);
        while batch.len() < self.batch_size {
            let Some(entry) = read_dir
                .next_entry()
                .await
                .map_err(|e| Error::traversal(self.path.display().to_string(), e))?
            else {
                break;
            };

            let file_type = entry
                .file_type()
                .await
                .map_err(|e| Error::traversal(entry.path().display().to_string(), e))?;
            let name = entry.file_name().to_string_lossy().into_owned();

            if file_type.is_dir() {
                batch.push(DroppedEntry::Directory(Box::new(
                    LocalDirectory::new(name, entry.path()).with_batch_size(self.batch_size),
                )));
            } else if file_type.is_file() {
                batch.push(DroppedEntry::File(Arc::new(LocalFile::new(name, entry.path()))));
            } else {
                warn!(path = %entry.path().display(), "Skipping entry that is neither a file nor a directory");
            }
        }

        Ok(batch)
    }
}
