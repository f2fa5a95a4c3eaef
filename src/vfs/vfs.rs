//! Virtual File System
//!
//! Routes path-based calls to the filesystem mounted at the matching prefix,
//! tracking the current working directory.

use std::sync::Arc;

use crate::errno::Errno;
use crate::error::{OsError, Result};
use crate::fs::path::{normalize_path, resolve_path};
use crate::fs::{FileSystem, FsStat, StatVfs, S_IFDIR, S_IFREG};
use crate::value::ScriptObject;

use super::mount_table::{Lookup, MountEntry, MountTable};

/// `statvfs` flag for read-only mounts
pub const ST_RDONLY: u64 = 1;

/// One `ilistdir` entry: name, type bits and inode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub name: String,
    pub kind: u32,
    pub inode: u64,
}

/// `stat` result, in the order scripts index it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatResult {
    pub mode: u32,
    pub ino: u64,
    pub dev: u64,
    pub nlink: u64,
    pub uid: u64,
    pub gid: u64,
    pub size: u64,
    pub atime: u64,
    pub mtime: u64,
    pub ctime: u64,
}

impl StatResult {
    fn directory() -> Self {
        Self { mode: S_IFDIR, ..Default::default() }
    }

    fn from_fs(stat: &FsStat) -> Self {
        Self {
            mode: stat.mode(),
            size: stat.size,
            atime: stat.mtime,
            mtime: stat.mtime,
            ctime: stat.mtime,
            ..Default::default()
        }
    }
}

/// What `umount` should detach.
pub enum UmountTarget {
    Path(String),
    Object(Arc<dyn ScriptObject>),
}

/// Options accepted by `mount`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MountOptions {
    pub readonly: bool,
    pub mkfs: bool,
}

pub struct Vfs {
    mounts: MountTable,
    cwd: String,
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new()
    }
}

impl Vfs {
    pub fn new() -> Self {
        Self {
            mounts: MountTable::new(),
            cwd: "/".to_string(),
        }
    }

    pub fn mounts(&self) -> &MountTable {
        &self.mounts
    }

    fn absolute(&self, path: &str) -> String {
        resolve_path(&self.cwd, path)
    }

    fn writable<'a>(entry: &'a MountEntry) -> Result<&'a MountEntry> {
        if entry.readonly {
            Err(OsError::Os(Errno::EROFS))
        } else {
            Ok(entry)
        }
    }

    /// Lookup for a mutating call: the virtual root cannot be modified.
    fn lookup_writable(&self, path: &str) -> Result<(&MountEntry, String)> {
        match self.mounts.lookup(&self.absolute(path))? {
            Lookup::Root => Err(OsError::Os(Errno::EPERM)),
            Lookup::Mounted { entry, path } => Ok((Self::writable(entry)?, path)),
        }
    }

    // ========================================================================
    // Mounting
    // ========================================================================

    /// Attach `fs` at `path`.
    pub async fn mount(
        &mut self,
        fs: Arc<dyn FileSystem>,
        object: Option<Arc<dyn ScriptObject>>,
        path: &str,
        options: MountOptions,
    ) -> Result<()> {
        if !path.starts_with('/') {
            return Err(OsError::Os(Errno::EINVAL));
        }
        let prefix = normalize_path(path);
        if self.mounts.contains(&prefix) {
            return Err(OsError::Os(Errno::EPERM));
        }
        if options.mkfs {
            fs.mkfs().await?;
        }
        fs.mount(options.readonly).await?;
        self.mounts.push(MountEntry {
            prefix: prefix.clone(),
            fs,
            object,
            readonly: options.readonly,
        })?;
        log::info!("mounted {}{}", prefix, if options.readonly { " (readonly)" } else { "" });
        Ok(())
    }

    /// Detach the filesystem mounted at a path or from a given object.
    pub async fn umount(&mut self, target: UmountTarget) -> Result<()> {
        let removed = match &target {
            UmountTarget::Path(path) => {
                let prefix = self.absolute(path);
                self.mounts.remove_by_prefix(&prefix)
            }
            UmountTarget::Object(object) => self.mounts.remove_by_object(object),
        };
        let entry = removed.ok_or(OsError::Os(Errno::EINVAL))?;

        if let Err(e) = entry.fs.umount().await {
            log::warn!("unmount hook for {} failed: {}", entry.prefix, e);
        }
        if self.cwd_within(&entry.prefix) {
            self.cwd = "/".to_string();
        }
        log::info!("unmounted {}", entry.prefix);
        Ok(())
    }

    /// Detach everything, e.g. on soft reset.
    pub async fn unmount_all(&mut self) -> usize {
        let count = self.mounts.unmount_all().await;
        self.cwd = "/".to_string();
        count
    }

    fn cwd_within(&self, prefix: &str) -> bool {
        prefix == "/"
            || self.cwd == prefix
            || self.cwd.strip_prefix(prefix).map_or(false, |rest| rest.starts_with('/'))
    }

    /// The filesystem `getfree` should report on: first literal-prefix match.
    pub fn resolve(&self, path: &str) -> Result<Arc<dyn FileSystem>> {
        self.mounts.resolve(path)
    }

    // ========================================================================
    // Directory navigation
    // ========================================================================

    pub async fn chdir(&mut self, path: &str) -> Result<()> {
        let target = self.absolute(path);
        match self.mounts.lookup(&target)? {
            Lookup::Root => {}
            Lookup::Mounted { entry, path } => {
                let stat = entry.fs.stat(&path).await?;
                if !stat.is_directory {
                    return Err(OsError::Os(Errno::ENOTDIR));
                }
            }
        }
        self.cwd = target;
        Ok(())
    }

    pub fn getcwd(&self) -> String {
        self.cwd.clone()
    }

    /// Directory entries of `path` (cwd when `None`), sorted by name.
    pub async fn ilistdir(&self, path: Option<&str>) -> Result<Vec<ListEntry>> {
        let target = self.absolute(path.unwrap_or("."));
        match self.mounts.lookup(&target)? {
            Lookup::Root => {
                let mut entries: Vec<ListEntry> = self
                    .mounts
                    .iter()
                    .filter_map(|e| e.prefix.strip_prefix('/'))
                    .filter(|name| !name.is_empty())
                    .map(|name| ListEntry {
                        name: name.to_string(),
                        kind: S_IFDIR,
                        inode: 0,
                    })
                    .collect();
                entries.sort_by(|a, b| a.name.cmp(&b.name));
                Ok(entries)
            }
            Lookup::Mounted { entry, path } => {
                let dirents = entry.fs.readdir_with_file_types(&path).await?;
                Ok(dirents
                    .into_iter()
                    .map(|d| ListEntry {
                        name: d.name,
                        kind: if d.is_directory { S_IFDIR } else { S_IFREG },
                        inode: 0,
                    })
                    .collect())
            }
        }
    }

    pub async fn listdir(&self, path: Option<&str>) -> Result<Vec<String>> {
        Ok(self.ilistdir(path).await?.into_iter().map(|e| e.name).collect())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub async fn mkdir(&self, path: &str) -> Result<()> {
        match self.mounts.lookup(&self.absolute(path))? {
            Lookup::Root => Err(OsError::Os(Errno::EEXIST)),
            Lookup::Mounted { path, .. } if path == "/" => Err(OsError::Os(Errno::EEXIST)),
            Lookup::Mounted { entry, path } => {
                Self::writable(entry)?.fs.mkdir(&path).await?;
                Ok(())
            }
        }
    }

    pub async fn remove(&self, path: &str) -> Result<()> {
        let (entry, rel) = self.lookup_writable(path)?;
        entry.fs.remove(&rel).await?;
        Ok(())
    }

    pub async fn rmdir(&self, path: &str) -> Result<()> {
        let (entry, rel) = self.lookup_writable(path)?;
        entry.fs.rmdir(&rel).await?;
        Ok(())
    }

    pub async fn rename(&self, old: &str, new: &str) -> Result<()> {
        let (old_entry, old_rel) = self.lookup_writable(old)?;
        let (new_entry, new_rel) = self.lookup_writable(new)?;
        if old_entry.prefix != new_entry.prefix {
            return Err(OsError::Os(Errno::EXDEV));
        }
        old_entry.fs.rename(&old_rel, &new_rel).await?;
        Ok(())
    }

    pub async fn write_file(&self, path: &str, content: &[u8]) -> Result<()> {
        let (entry, rel) = self.lookup_writable(path)?;
        entry.fs.write_file(&rel, content).await?;
        Ok(())
    }

    pub async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        match self.mounts.lookup(&self.absolute(path))? {
            Lookup::Root => Err(OsError::Os(Errno::EISDIR)),
            Lookup::Mounted { entry, path } => Ok(entry.fs.read_file(&path).await?),
        }
    }

    // ========================================================================
    // Status
    // ========================================================================

    pub async fn stat(&self, path: &str) -> Result<StatResult> {
        match self.mounts.lookup(&self.absolute(path))? {
            Lookup::Root => Ok(StatResult::directory()),
            Lookup::Mounted { entry, path } => {
                let stat = entry.fs.stat(&path).await?;
                Ok(StatResult::from_fs(&stat))
            }
        }
    }

    pub async fn statvfs(&self, path: &str) -> Result<StatVfs> {
        match self.mounts.lookup(&self.absolute(path))? {
            Lookup::Root => Ok(StatVfs::default()),
            Lookup::Mounted { entry, path } => {
                let mut st = entry.fs.statvfs(&path).await?;
                if entry.readonly {
                    st.flag |= ST_RDONLY;
                }
                Ok(st)
            }
        }
    }
}
