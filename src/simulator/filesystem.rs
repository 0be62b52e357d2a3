use crate::file_transfer::DirectoryEntry;
use crate::protocol::ErrorCode;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Errno a non-empty directory removal fails with
pub const ENOTEMPTY: u8 = 39;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    File(Vec<u8>),
    /// Content produced on open; its size is not reported up front
    Generated(Vec<u8>),
    Directory,
}

/// Reason a filesystem call failed, as the remote would report it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsFailure {
    pub code: ErrorCode,
    pub errno: Option<u8>,
}

impl FsFailure {
    fn code(code: ErrorCode) -> Self {
        Self { code, errno: None }
    }

    fn errno(errno: u8) -> Self {
        Self {
            code: ErrorCode::FailErrno,
            errno: Some(errno),
        }
    }
}

/// Contents of an opened file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedFile {
    pub contents: Vec<u8>,
    /// Size to announce in the open reply, `None` for generated files
    pub announced_size: Option<u32>,
}

/// In-memory filesystem served by the simulated vehicle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualFs {
    nodes: BTreeMap<String, Node>,
    protected: BTreeSet<String>,
    errno_paths: BTreeMap<String, u8>,
}

impl Default for VirtualFs {
    fn default() -> Self {
        Self::new()
    }
}

/// Absolute, slash-separated, no trailing slash (except the root)
pub fn normalize(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty() && *p != ".").collect();
    format!("/{}", parts.join("/"))
}

fn parent_of(path: &str) -> Option<String> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/".to_string()),
        Some(idx) => Some(path[..idx].to_string()),
        None => None,
    }
}

fn name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

impl VirtualFs {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Directory);
        Self {
            nodes,
            protected: BTreeSet::new(),
            errno_paths: BTreeMap::new(),
        }
    }

    pub fn with_file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, Node::File(contents.into()));
        self
    }

    /// A file whose open reply carries no size, like a log generated on demand
    pub fn with_generated_file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, Node::Generated(contents.into()));
        self
    }

    pub fn with_directory(mut self, path: &str) -> Self {
        self.insert(path, Node::Directory);
        self
    }

    /// Removal of this path is refused with FileProtected
    pub fn protect(mut self, path: &str) -> Self {
        self.protected.insert(normalize(path));
        self
    }

    /// Access to this path fails with FailErrno carrying `errno`
    pub fn fail_with_errno(mut self, path: &str, errno: u8) -> Self {
        self.errno_paths.insert(normalize(path), errno);
        self
    }

    fn insert(&mut self, path: &str, node: Node) {
        let path = normalize(path);
        let mut ancestor = parent_of(&path);
        while let Some(dir) = ancestor {
            ancestor = parent_of(&dir);
            self.nodes.entry(dir).or_insert(Node::Directory);
        }
        self.nodes.insert(path, node);
    }

    /// Mirror a local directory tree
    pub async fn load_from_dir(root: &Path) -> std::io::Result<Self> {
        let mut fs = Self::new();
        let mut pending = vec![(root.to_path_buf(), "/".to_string())];

        while let Some((local, remote)) = pending.pop() {
            let mut dir = tokio::fs::read_dir(&local).await?;
            while let Some(entry) = dir.next_entry().await? {
                let name = entry.file_name().to_string_lossy().to_string();
                let remote_path = normalize(&format!("{}/{}", remote, name));
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    fs.insert(&remote_path, Node::Directory);
                    pending.push((entry.path(), remote_path));
                } else if file_type.is_file() {
                    let contents = tokio::fs::read(entry.path()).await?;
                    fs.insert(&remote_path, Node::File(contents));
                }
            }
        }

        Ok(fs)
    }

    pub fn exists(&self, path: &str) -> bool {
        self.nodes.contains_key(&normalize(path))
    }

    fn check_errno(&self, path: &str) -> Result<(), FsFailure> {
        match self.errno_paths.get(path) {
            Some(errno) => Err(FsFailure::errno(*errno)),
            None => Ok(()),
        }
    }

    /// Immediate children of a directory, sorted by name
    pub fn list(&self, path: &str) -> Result<Vec<DirectoryEntry>, FsFailure> {
        let path = normalize(path);
        self.check_errno(&path)?;
        match self.nodes.get(&path) {
            Some(Node::Directory) => {}
            Some(_) => return Err(FsFailure::code(ErrorCode::Fail)),
            None => return Err(FsFailure::code(ErrorCode::FileNotFound)),
        }

        let entries = self
            .nodes
            .iter()
            .filter(|(child, _)| parent_of(child).as_deref() == Some(path.as_str()))
            .map(|(child, node)| match node {
                Node::Directory => DirectoryEntry::directory(name_of(child)),
                Node::File(contents) | Node::Generated(contents) => {
                    DirectoryEntry::file(name_of(child), contents.len() as u64)
                }
            })
            .collect();
        Ok(entries)
    }

    pub fn open(&self, path: &str) -> Result<OpenedFile, FsFailure> {
        let path = normalize(path);
        self.check_errno(&path)?;
        match self.nodes.get(&path) {
            Some(Node::File(contents)) => Ok(OpenedFile {
                contents: contents.clone(),
                announced_size: Some(contents.len() as u32),
            }),
            Some(Node::Generated(contents)) => Ok(OpenedFile {
                contents: contents.clone(),
                announced_size: None,
            }),
            Some(Node::Directory) => Err(FsFailure::code(ErrorCode::Fail)),
            None => Err(FsFailure::code(ErrorCode::FileNotFound)),
        }
    }

    pub fn remove_file(&mut self, path: &str) -> Result<(), FsFailure> {
        let path = normalize(path);
        self.check_errno(&path)?;
        if self.protected.contains(&path) {
            return Err(FsFailure::code(ErrorCode::FileProtected));
        }
        match self.nodes.get(&path) {
            Some(Node::File(_)) | Some(Node::Generated(_)) => {
                self.nodes.remove(&path);
                Ok(())
            }
            Some(Node::Directory) => Err(FsFailure::code(ErrorCode::Fail)),
            None => Err(FsFailure::code(ErrorCode::FileNotFound)),
        }
    }

    pub fn remove_directory(&mut self, path: &str) -> Result<(), FsFailure> {
        let path = normalize(path);
        self.check_errno(&path)?;
        if path == "/" || self.protected.contains(&path) {
            return Err(FsFailure::code(ErrorCode::FileProtected));
        }
        match self.nodes.get(&path) {
            Some(Node::Directory) => {
                let has_children = self
                    .nodes
                    .keys()
                    .any(|child| parent_of(child).as_deref() == Some(path.as_str()));
                if has_children {
                    return Err(FsFailure::errno(ENOTEMPTY));
                }
                self.nodes.remove(&path);
                Ok(())
            }
            Some(_) => Err(FsFailure::code(ErrorCode::Fail)),
            None => Err(FsFailure::code(ErrorCode::FileNotFound)),
        }
    }
}
