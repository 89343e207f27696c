//! In-memory node tree backing the debugfs and procfs surfaces.
//!
//! Directories own their children, so removing a directory unlinks everything
//! beneath it. File content is produced by a [`FileOps`] implementation on
//! every read, nothing is cached.
use crate::error::FsError;
use bitflags::bitflags;
use spin::Mutex;
use std::{
    collections::BTreeMap,
    fmt,
    path::{Component, Path, PathBuf},
    sync::{Arc, Weak},
};

pub type Result<T, E = FsError> = std::result::Result<T, E>;

bitflags! {
    /// Permission bits of a node, same layout as `st_mode & 0o777`.
    pub struct Mode: u32 {
        const OWNER_READ = 0o400;
        const OWNER_WRITE = 0o200;
        const OWNER_EXEC = 0o100;
        const GROUP_READ = 0o040;
        const GROUP_WRITE = 0o020;
        const GROUP_EXEC = 0o010;
        const OTHER_READ = 0o004;
        const OTHER_WRITE = 0o002;
        const OTHER_EXEC = 0o001;
    }
}

impl Mode {
    /// Mode for directories, `0755`
    pub const DIR: Mode = Mode::from_bits_truncate(0o755);
}

/// Operations of a file node.
pub trait FileOps: Send + Sync {
    /// Produce the current content.
    fn read(&self) -> Result<Vec<u8>>;

    /// Consume `data`, returning how many bytes were accepted.
    ///
    /// Read-only files don't override this.
    fn write(&self, data: &[u8]) -> Result<usize> {
        let _ = data;
        Err(FsError::PermissionDenied)
    }
}

enum Kind {
    Directory(Mutex<BTreeMap<String, Arc<Node>>>),
    File(Box<dyn FileOps>),
}

/// A directory or file in a [`Filesystem`]
pub struct Node {
    name: String,
    mode: Mode,
    kind: Kind,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("dir", &self.is_dir())
            .finish()
    }
}

impl Node {
    fn new_dir(name: &str, mode: Mode) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_owned(),
            mode,
            kind: Kind::Directory(Mutex::new(BTreeMap::new())),
        })
    }

    fn new_file(name: &str, mode: Mode, ops: Box<dyn FileOps>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_owned(),
            mode,
            kind: Kind::File(ops),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, Kind::Directory(_))
    }

    fn entries(&self) -> Result<&Mutex<BTreeMap<String, Arc<Node>>>> {
        match &self.kind {
            Kind::Directory(children) => Ok(children),
            Kind::File(_) => Err(FsError::NotDirectory),
        }
    }

    fn insert(self: &Arc<Self>, child: Arc<Node>) -> Result<Entry> {
        let mut children = self.entries()?.lock();
        if children.contains_key(&child.name) {
            return Err(FsError::Exists(child.name.clone()));
        }
        children.insert(child.name.clone(), child.clone());
        Ok(Entry {
            parent: Arc::downgrade(self),
            node: child,
        })
    }

    /// Create a subdirectory `name`
    ///
    /// # Errors
    ///
    /// - [`FsError::Exists`] if `name` is already taken
    /// - [`FsError::NotDirectory`] if this is a file
    pub fn create_dir(self: &Arc<Self>, name: &str, mode: Mode) -> Result<Entry> {
        self.insert(Node::new_dir(name, mode))
    }

    /// Like [`Node::create_dir`], but returns the existing directory if there
    /// is one.
    pub fn get_or_create_dir(self: &Arc<Self>, name: &str, mode: Mode) -> Result<Entry> {
        let mut children = self.entries()?.lock();
        let node = match children.get(name) {
            Some(node) if node.is_dir() => node.clone(),
            Some(_) => return Err(FsError::NotDirectory),
            None => {
                let node = Node::new_dir(name, mode);
                children.insert(name.to_owned(), node.clone());
                node
            }
        };
        Ok(Entry {
            parent: Arc::downgrade(self),
            node,
        })
    }

    /// Create a file `name` backed by `ops`
    pub fn create_file(
        self: &Arc<Self>,
        name: &str,
        mode: Mode,
        ops: Box<dyn FileOps>,
    ) -> Result<Entry> {
        self.insert(Node::new_file(name, mode, ops))
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<Node>> {
        self.entries()?
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| FsError::NotFound(name.to_owned()))
    }

    /// Names of all children, in order.
    ///
    /// Empty for files.
    pub fn children(&self) -> Vec<String> {
        match &self.kind {
            Kind::Directory(c) => c.lock().keys().cloned().collect(),
            Kind::File(_) => Vec::new(),
        }
    }

    /// Unlink `name` and everything beneath it.
    pub fn remove(&self, name: &str) -> Result<Arc<Node>> {
        self.entries()?
            .lock()
            .remove(name)
            .ok_or_else(|| FsError::NotFound(name.to_owned()))
    }

    /// Unlink the directory `name`, but only if it has no children.
    ///
    /// Returns whether it was removed.
    pub fn remove_if_empty(&self, name: &str) -> Result<bool> {
        let mut children = self.entries()?.lock();
        let empty = match children.get(name) {
            Some(node) => node.children().is_empty(),
            None => return Err(FsError::NotFound(name.to_owned())),
        };
        if empty {
            children.remove(name);
        }
        Ok(empty)
    }

    pub fn read(&self) -> Result<Vec<u8>> {
        match &self.kind {
            Kind::File(ops) => ops.read(),
            Kind::Directory(_) => Err(FsError::IsDirectory),
        }
    }

    pub fn write(&self, data: &[u8]) -> Result<usize> {
        match &self.kind {
            Kind::File(ops) => ops.write(data),
            Kind::Directory(_) => Err(FsError::IsDirectory),
        }
    }
}

/// Handle to a node created under some parent.
///
/// The parent is only weakly referenced, a handle never keeps a removed
/// tree alive.
#[derive(Debug, Clone)]
pub struct Entry {
    parent: Weak<Node>,
    node: Arc<Node>,
}

impl Entry {
    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Whether the node is still linked where it was created.
    pub fn is_linked(&self) -> bool {
        self.parent
            .upgrade()
            .and_then(|p| p.lookup(&self.node.name).ok())
            .map_or(false, |n| Arc::ptr_eq(&n, &self.node))
    }

    /// Unlink the node, and everything beneath it, from its parent.
    ///
    /// Does nothing if the parent is gone or the node was already unlinked,
    /// and never removes a different node that reused the name.
    ///
    /// Returns whether anything was removed.
    pub fn remove(self) -> bool {
        let parent = match self.parent.upgrade() {
            Some(p) => p,
            None => return false,
        };
        let children = match parent.entries() {
            Ok(c) => c,
            Err(_) => return false,
        };
        let mut children = children.lock();
        let linked = children
            .get(&self.node.name)
            .map_or(false, |n| Arc::ptr_eq(n, &self.node));
        if linked {
            children.remove(&self.node.name);
        }
        linked
    }
}

/// A mounted node tree, such as `debugfs` or `procfs`.
#[derive(Debug)]
pub struct Filesystem {
    name: String,
    root: Arc<Node>,
}

impl Filesystem {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            root: Node::new_dir("", Mode::DIR),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    /// Find the node at `path`, relative to the root.
    ///
    /// A leading `/` is allowed.
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> Result<Arc<Node>> {
        let mut node = self.root.clone();
        for comp in path.as_ref().components() {
            match comp {
                Component::RootDir | Component::CurDir => continue,
                Component::Normal(name) => {
                    let name = name.to_str().ok_or(FsError::InvalidArgument)?;
                    node = node.lookup(name)?;
                }
                _ => return Err(FsError::InvalidArgument),
            }
        }
        Ok(node)
    }

    pub fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        self.resolve(path).is_ok()
    }

    pub fn read<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>> {
        self.resolve(path)?.read()
    }

    /// Read the file at `path` as text
    pub fn read_to_string<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let data = self.read(path)?;
        String::from_utf8(data).map_err(|_| FsError::InvalidArgument)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P, data: &[u8]) -> Result<usize> {
        self.resolve(path)?.write(data)
    }

    /// Every node below the root, depth first, with its path.
    pub fn walk(&self) -> Vec<(PathBuf, Arc<Node>)> {
        fn visit(dir: &Arc<Node>, path: &Path, out: &mut Vec<(PathBuf, Arc<Node>)>) {
            for name in dir.children() {
                let child = match dir.lookup(&name) {
                    Ok(c) => c,
                    // Raced with a removal
                    Err(_) => continue,
                };
                let child_path = path.join(&name);
                out.push((child_path.clone(), child.clone()));
                if child.is_dir() {
                    visit(&child, &child_path, out);
                }
            }
        }
        let mut out = Vec::new();
        visit(&self.root, Path::new(""), &mut out);
        out
    }
}
