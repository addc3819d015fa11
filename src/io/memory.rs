use super::{DirEntry, EntryKind, FileSystem};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
    Other,
}

/// In-memory filesystem.
///
/// Paths are stored as given (no normalisation beyond dropping `.`), so
/// callers should use the same spelling when adding and querying.
#[derive(Debug, Default)]
pub struct MemoryFs {
    nodes: Mutex<BTreeMap<PathBuf, Node>>,
    read_only: bool,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `write_atomic` fails with `PermissionDenied`.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Add a file, creating its ancestor directories.
    pub fn add_file(&self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) -> &Self {
        let path = clean(path.as_ref());
        let mut nodes = self.lock();
        insert_ancestors(&mut nodes, &path);
        nodes.insert(path, Node::File(data.into()));
        self
    }

    /// Add an empty directory, creating its ancestors.
    pub fn add_dir(&self, path: impl AsRef<Path>) -> &Self {
        let path = clean(path.as_ref());
        let mut nodes = self.lock();
        insert_ancestors(&mut nodes, &path);
        nodes.insert(path, Node::Dir);
        self
    }

    /// Add something that is neither file nor directory, like a symlink.
    pub fn add_other(&self, path: impl AsRef<Path>) -> &Self {
        let path = clean(path.as_ref());
        let mut nodes = self.lock();
        insert_ancestors(&mut nodes, &path);
        nodes.insert(path, Node::Other);
        self
    }

    /// Contents of a file, if one exists at `path`.
    pub fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.lock().get(&clean(path.as_ref())) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Node>> {
        self.nodes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn clean(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn insert_ancestors(nodes: &mut BTreeMap<PathBuf, Node>, path: &Path) {
    for ancestor in path.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{}: no such file or directory", path.display()),
    )
}

#[async_trait]
impl FileSystem for MemoryFs {
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let path = clean(path);
        let nodes = self.lock();

        match nodes.get(&path) {
            Some(Node::Dir) => {}
            Some(_) => {
                return Err(io::Error::other(format!(
                    "{}: not a directory",
                    path.display()
                )));
            }
            None => return Err(not_found(&path)),
        }

        let entries = nodes
            .iter()
            .filter(|(child, _)| child.parent() == Some(path.as_path()))
            .map(|(child, node)| DirEntry {
                name: child
                    .file_name()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                path: child.clone(),
                kind: match node {
                    Node::File(_) => EntryKind::File,
                    Node::Dir => EntryKind::Dir,
                    Node::Other => EntryKind::Other,
                },
            })
            .collect();

        Ok(entries)
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.file(path).ok_or_else(|| not_found(path))
    }

    async fn write_atomic(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        if self.read_only {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "read-only filesystem",
            ));
        }
        self.add_file(path, data);
        Ok(())
    }
}
