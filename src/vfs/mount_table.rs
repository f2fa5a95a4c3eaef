//! Mount Table
//!
//! Insertion-ordered list of (prefix, filesystem) associations. Two lookups
//! are offered:
//! - `resolve`: literal byte-prefix match, first entry wins. Used by `getfree`.
//! - `lookup`: path-segment match for the regular VFS operations, where a
//!   mount at `/flash` does not capture `/flashy`.

use std::sync::Arc;

use crate::errno::Errno;
use crate::error::{OsError, Result};
use crate::fs::FileSystem;
use crate::value::ScriptObject;

/// A filesystem attached at `prefix`.
#[derive(Clone)]
pub struct MountEntry {
    pub prefix: String,
    pub fs: Arc<dyn FileSystem>,
    /// The script object the filesystem was mounted from, if any
    pub object: Option<Arc<dyn ScriptObject>>,
    pub readonly: bool,
}

impl MountEntry {
    pub fn new(prefix: &str, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            prefix: prefix.to_string(),
            fs,
            object: None,
            readonly: false,
        }
    }

    /// Path relative to this mount, if `path` lies inside it.
    fn relative(&self, path: &str) -> Option<String> {
        if self.prefix == "/" {
            return Some(path.to_string());
        }
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            Some("/".to_string())
        } else if rest.starts_with('/') {
            Some(rest.to_string())
        } else {
            None
        }
    }
}

/// Result of a segment-aware lookup.
pub enum Lookup<'a> {
    /// The virtual root directory that lists the mount points
    Root,
    /// A path inside a mounted filesystem
    Mounted { entry: &'a MountEntry, path: String },
}

#[derive(Default)]
pub struct MountTable {
    entries: Vec<MountEntry>,
}

impl MountTable {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MountEntry> {
        self.entries.iter()
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.entries.iter().any(|e| e.prefix == prefix)
    }

    /// Append an entry; lookups see it after every earlier registration.
    pub fn push(&mut self, entry: MountEntry) -> Result<()> {
        if !entry.prefix.starts_with('/') {
            return Err(OsError::Os(Errno::EINVAL));
        }
        if self.contains(&entry.prefix) {
            return Err(OsError::Os(Errno::EPERM));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// First entry, in registration order, whose prefix is a literal prefix
    /// of `path`. No longest-match tie-breaking is done.
    pub fn resolve(&self, path: &str) -> Result<Arc<dyn FileSystem>> {
        self.entries
            .iter()
            .find(|e| path.as_bytes().starts_with(e.prefix.as_bytes()))
            .map(|e| e.fs.clone())
            .ok_or(OsError::Os(Errno::ENOENT))
    }

    /// Segment-aware lookup of a normalized absolute path.
    pub fn lookup(&self, path: &str) -> Result<Lookup<'_>> {
        for entry in &self.entries {
            if let Some(rel) = entry.relative(path) {
                return Ok(Lookup::Mounted { entry, path: rel });
            }
        }
        if path == "/" {
            Ok(Lookup::Root)
        } else {
            Err(OsError::Os(Errno::ENOENT))
        }
    }

    pub fn remove_by_prefix(&mut self, prefix: &str) -> Option<MountEntry> {
        let index = self.entries.iter().position(|e| e.prefix == prefix)?;
        Some(self.entries.remove(index))
    }

    pub fn remove_by_object(&mut self, object: &Arc<dyn ScriptObject>) -> Option<MountEntry> {
        let index = self.entries.iter().position(|e| match &e.object {
            Some(o) => Arc::ptr_eq(o, object),
            None => false,
        })?;
        Some(self.entries.remove(index))
    }

    /// Detach every filesystem, each exactly once, in registration order.
    /// Returns how many were detached.
    pub async fn unmount_all(&mut self) -> usize {
        // drained first so a failing hook can never see its entry again
        let entries: Vec<MountEntry> = self.entries.drain(..).collect();
        let count = entries.len();
        for entry in entries {
            if let Err(e) = entry.fs.umount().await {
                log::warn!("unmount of {} failed: {}", entry.prefix, e);
            } else {
                log::info!("unmounted {}", entry.prefix);
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FatFs, FatGeometry, FsError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn volume() -> Arc<dyn FileSystem> {
        Arc::new(FatFs::new(FatGeometry::default()).unwrap())
    }

    fn same(a: &Arc<dyn FileSystem>, b: &Arc<dyn FileSystem>) -> bool {
        Arc::ptr_eq(a, b)
    }

    #[test]
    fn test_resolve_first_match_wins() {
        let root = volume();
        let flash = volume();
        let mut table = MountTable::new();
        table.push(MountEntry::new("/", root.clone())).unwrap();
        table.push(MountEntry::new("/flash", flash.clone())).unwrap();

        // "/" was registered first, so it captures "/flash" too
        assert!(same(&table.resolve("/flash/main.py").unwrap(), &root));
        assert!(same(&table.resolve("/sd").unwrap(), &root));
    }

    #[test]
    fn test_resolve_registration_order() {
        let flash = volume();
        let root = volume();
        let mut table = MountTable::new();
        table.push(MountEntry::new("/flash", flash.clone())).unwrap();
        table.push(MountEntry::new("/", root.clone())).unwrap();

        assert!(same(&table.resolve("/flash/main.py").unwrap(), &flash));
        assert!(same(&table.resolve("/sd/data").unwrap(), &root));
    }

    #[test]
    fn test_resolve_is_literal_prefix() {
        let flash = volume();
        let mut table = MountTable::new();
        table.push(MountEntry::new("/flash", flash.clone())).unwrap();

        assert!(same(&table.resolve("/flashy").unwrap(), &flash));
        assert_eq!(table.resolve("/sd").err(), Some(OsError::Os(Errno::ENOENT)));
        assert_eq!(table.resolve("flash").err(), Some(OsError::Os(Errno::ENOENT)));
    }

    #[test]
    fn test_resolve_empty_table() {
        let table = MountTable::new();
        assert_eq!(table.resolve("/").err(), Some(OsError::Os(Errno::ENOENT)));
    }

    #[test]
    fn test_lookup_is_segment_aware() {
        let mut table = MountTable::new();
        table.push(MountEntry::new("/flash", volume())).unwrap();

        match table.lookup("/flash/lib/a.py").unwrap() {
            Lookup::Mounted { entry, path } => {
                assert_eq!(entry.prefix, "/flash");
                assert_eq!(path, "/lib/a.py");
            }
            Lookup::Root => panic!("expected mount"),
        }
        match table.lookup("/flash").unwrap() {
            Lookup::Mounted { path, .. } => assert_eq!(path, "/"),
            Lookup::Root => panic!("expected mount"),
        }
        assert!(matches!(table.lookup("/"), Ok(Lookup::Root)));
        assert!(table.lookup("/flashy").is_err());
    }

    #[test]
    fn test_duplicate_prefix_rejected() {
        let mut table = MountTable::new();
        table.push(MountEntry::new("/flash", volume())).unwrap();
        let err = table.push(MountEntry::new("/flash", volume())).unwrap_err();
        assert_eq!(err, OsError::Os(Errno::EPERM));
        assert_eq!(table.len(), 1);
    }

    struct CountingFs {
        unmounts: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl FileSystem for CountingFs {
        async fn umount(&self) -> std::result::Result<(), FsError> {
            self.unmounts.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(FsError::ReadOnly { operation: "umount".to_string() })
            } else {
                Ok(())
            }
        }
        async fn stat(&self, _p: &str) -> std::result::Result<crate::fs::FsStat, FsError> {
            unimplemented!()
        }
        async fn readdir_with_file_types(
            &self,
            _p: &str,
        ) -> std::result::Result<Vec<crate::fs::DirentEntry>, FsError> {
            unimplemented!()
        }
        async fn mkdir(&self, _p: &str) -> std::result::Result<(), FsError> {
            unimplemented!()
        }
        async fn remove(&self, _p: &str) -> std::result::Result<(), FsError> {
            unimplemented!()
        }
        async fn rmdir(&self, _p: &str) -> std::result::Result<(), FsError> {
            unimplemented!()
        }
        async fn rename(&self, _o: &str, _n: &str) -> std::result::Result<(), FsError> {
            unimplemented!()
        }
        async fn read_file(&self, _p: &str) -> std::result::Result<Vec<u8>, FsError> {
            unimplemented!()
        }
        async fn write_file(&self, _p: &str, _c: &[u8]) -> std::result::Result<(), FsError> {
            unimplemented!()
        }
        async fn statvfs(&self, _p: &str) -> std::result::Result<crate::fs::StatVfs, FsError> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn test_unmount_all_empty() {
        let mut table = MountTable::new();
        assert_eq!(table.unmount_all().await, 0);
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_unmount_all_runs_each_hook_once() {
        let a = Arc::new(CountingFs { unmounts: AtomicUsize::new(0), fail: false });
        let b = Arc::new(CountingFs { unmounts: AtomicUsize::new(0), fail: true });
        let mut table = MountTable::new();
        table.push(MountEntry::new("/flash", a.clone())).unwrap();
        table.push(MountEntry::new("/sd", b.clone())).unwrap();

        assert_eq!(table.unmount_all().await, 2);
        assert!(table.is_empty());
        // a second sweep finds nothing left to unmount
        assert_eq!(table.unmount_all().await, 0);
        assert_eq!(a.unmounts.load(Ordering::SeqCst), 1);
        assert_eq!(b.unmounts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_relative_prefix_rejected() {
        let mut table = MountTable::new();
        assert_eq!(
            table.push(MountEntry::new("", volume())).unwrap_err(),
            OsError::Os(Errno::EINVAL)
        );
        assert_eq!(
            table.push(MountEntry::new("flash", volume())).unwrap_err(),
            OsError::Os(Errno::EINVAL)
        );
        assert!(table.is_empty());
    }
}
