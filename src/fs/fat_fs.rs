//! In-Memory FAT Volume
//!
//! A RAM-backed volume with FAT cluster accounting: every file occupies
//! `ceil(len / cluster_bytes)` clusters and every directory except the root
//! occupies one. Writes that would exceed the data area fail with ENOSPC.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use tokio::sync::RwLock;

use super::path::{child_prefix, dirname, normalize_path};
use super::timestamp::FatTimestamp;
use super::types::*;
use crate::errno::FatResult;
use crate::os::DiskCache;

/// Sector size assumed when variable sector sizes are not supported.
pub const SECTOR_SIZE: u32 = 512;

/// Longest file name a FAT volume accepts (LFN).
pub const MAX_NAME_LEN: u64 = 255;

fn default_total_sectors() -> u32 {
    2048
}

fn default_sectors_per_cluster() -> u32 {
    8
}

fn default_sector_size() -> u32 {
    SECTOR_SIZE
}

/// Layout of a FAT volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FatGeometry {
    #[serde(default = "default_total_sectors")]
    pub total_sectors: u32,
    #[serde(default = "default_sectors_per_cluster")]
    pub sectors_per_cluster: u32,
    #[serde(default = "default_sector_size")]
    pub sector_size: u32,
}

impl Default for FatGeometry {
    fn default() -> Self {
        Self {
            total_sectors: default_total_sectors(),
            sectors_per_cluster: default_sectors_per_cluster(),
            sector_size: default_sector_size(),
        }
    }
}

impl FatGeometry {
    pub fn new(total_sectors: u32, sectors_per_cluster: u32, sector_size: u32) -> Self {
        Self { total_sectors, sectors_per_cluster, sector_size }
    }

    /// Check the geometry is one a FAT driver could format.
    pub fn validate(&self) -> Result<(), FsError> {
        let invalid = || FsError::InvalidArgument {
            path: "/".to_string(),
            operation: "mkfs".to_string(),
        };
        if self.sectors_per_cluster == 0
            || self.sectors_per_cluster > 128
            || !self.sectors_per_cluster.is_power_of_two()
        {
            return Err(invalid());
        }
        if cfg!(feature = "variable-sector-size") {
            if !matches!(self.sector_size, 512 | 1024 | 2048 | 4096) {
                return Err(invalid());
            }
        } else if self.sector_size != SECTOR_SIZE {
            return Err(invalid());
        }
        if self.total_clusters() == 0 {
            return Err(invalid());
        }
        Ok(())
    }

    pub fn total_clusters(&self) -> u32 {
        if self.sectors_per_cluster == 0 {
            return 0;
        }
        self.total_sectors / self.sectors_per_cluster
    }

    pub fn cluster_bytes(&self) -> u64 {
        self.sectors_per_cluster as u64 * self.sector_size as u64
    }
}

#[derive(Debug, Clone)]
enum FatEntry {
    File { content: Vec<u8>, stamp: FatTimestamp },
    Directory { stamp: FatTimestamp },
}

impl FatEntry {
    fn is_directory(&self) -> bool {
        matches!(self, FatEntry::Directory { .. })
    }

    fn stamp(&self) -> FatTimestamp {
        match self {
            FatEntry::File { stamp, .. } => *stamp,
            FatEntry::Directory { stamp } => *stamp,
        }
    }
}

#[derive(Debug, Default)]
struct VolumeState {
    formatted: bool,
    entries: HashMap<String, FatEntry>,
}

impl VolumeState {
    fn formatted(stamp: FatTimestamp) -> Self {
        let mut entries = HashMap::new();
        entries.insert("/".to_string(), FatEntry::Directory { stamp });
        Self { formatted: true, entries }
    }

    fn clusters_used(&self, cluster_bytes: u64) -> u64 {
        self.entries
            .iter()
            .map(|(path, entry)| match entry {
                FatEntry::File { content, .. } => clusters_for(content.len() as u64, cluster_bytes),
                FatEntry::Directory { .. } if path == "/" => 0,
                FatEntry::Directory { .. } => 1,
            })
            .sum()
    }

    fn require_formatted(&self, operation: &str) -> Result<(), FsError> {
        if self.formatted {
            Ok(())
        } else {
            Err(FsError::NoFilesystem { operation: operation.to_string() })
        }
    }

    fn require_parent_dir(&self, path: &str, original: &str, operation: &str) -> Result<(), FsError> {
        match self.entries.get(&dirname(path)) {
            Some(FatEntry::Directory { .. }) => Ok(()),
            Some(FatEntry::File { .. }) => Err(FsError::NotDirectory {
                path: original.to_string(),
                operation: operation.to_string(),
            }),
            None => Err(FsError::NotFound {
                path: original.to_string(),
                operation: operation.to_string(),
            }),
        }
    }

    fn has_children(&self, dir: &str) -> bool {
        let prefix = child_prefix(dir);
        self.entries.keys().any(|k| k != dir && k.starts_with(&prefix))
    }
}

fn clusters_for(len: u64, cluster_bytes: u64) -> u64 {
    if cluster_bytes == 0 {
        return 0;
    }
    (len + cluster_bytes - 1) / cluster_bytes
}

type Clock = Box<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// In-memory FAT volume.
pub struct FatFs {
    geometry: FatGeometry,
    state: RwLock<VolumeState>,
    clock: Clock,
    /// Write cache dirtied by every successful mutation
    cache: Option<Arc<dyn DiskCache>>,
}

impl FatFs {
    /// Create a freshly formatted volume.
    pub fn new(geometry: FatGeometry) -> Result<Self, FsError> {
        geometry.validate()?;
        let clock: Clock = Box::new(|| chrono::Local::now().naive_local());
        let state = VolumeState::formatted(FatTimestamp::from_datetime(&clock()));
        Ok(Self { geometry, state: RwLock::new(state), clock, cache: None })
    }

    /// Create a volume with no filesystem on it; it must be formatted with
    /// `mkfs` before use.
    pub fn blank(geometry: FatGeometry) -> Result<Self, FsError> {
        geometry.validate()?;
        Ok(Self {
            geometry,
            state: RwLock::new(VolumeState::default()),
            clock: Box::new(|| chrono::Local::now().naive_local()),
            cache: None,
        })
    }

    /// Replace the wall clock used to stamp entries.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    /// Route writes through the flash cache that `sync()` flushes.
    pub fn with_cache(mut self, cache: Arc<dyn DiskCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    fn mark_dirty(&self) {
        if let Some(cache) = &self.cache {
            cache.mark_dirty();
        }
    }

    pub fn geometry(&self) -> FatGeometry {
        self.geometry
    }

    fn now(&self) -> FatTimestamp {
        FatTimestamp::from_datetime(&(self.clock)())
    }

    fn no_space(path: &str, operation: &str) -> FsError {
        FsError::NoSpace {
            path: path.to_string(),
            operation: operation.to_string(),
        }
    }
}

// ============================================================================
// FatVolume implementation
// ============================================================================

#[async_trait]
impl FatVolume for FatFs {
    fn cluster_size(&self) -> u32 {
        self.geometry.sectors_per_cluster
    }

    fn sector_size(&self) -> u32 {
        self.geometry.sector_size
    }

    fn total_clusters(&self) -> u32 {
        self.geometry.total_clusters()
    }

    async fn free_clusters(&self) -> Result<u32, FatResult> {
        let state = self.state.read().await;
        if !state.formatted {
            return Err(FatResult::NoFilesystem);
        }
        let used = state.clusters_used(self.geometry.cluster_bytes());
        Ok((self.geometry.total_clusters() as u64).saturating_sub(used) as u32)
    }
}

// ============================================================================
// FileSystem trait implementation
// ============================================================================

#[async_trait]
impl FileSystem for FatFs {
    async fn mount(&self, _readonly: bool) -> Result<(), FsError> {
        self.state.read().await.require_formatted("mount")
    }

    async fn mkfs(&self) -> Result<(), FsError> {
        let stamp = self.now();
        let mut state = self.state.write().await;
        *state = VolumeState::formatted(stamp);
        log::debug!(
            "formatted FAT volume: {} clusters of {} bytes",
            self.geometry.total_clusters(),
            self.geometry.cluster_bytes()
        );
        self.mark_dirty();
        Ok(())
    }

    async fn stat(&self, path: &str) -> Result<FsStat, FsError> {
        let state = self.state.read().await;
        state.require_formatted("stat")?;
        let normalized = normalize_path(path);
        if normalized == "/" {
            // the root directory has no entry of its own on disk
            return Ok(FsStat { is_directory: true, size: 0, mtime: 0 });
        }
        match state.entries.get(&normalized) {
            Some(entry) => {
                let size = match entry {
                    FatEntry::File { content, .. } => content.len() as u64,
                    FatEntry::Directory { .. } => 0,
                };
                Ok(FsStat {
                    is_directory: entry.is_directory(),
                    size,
                    mtime: entry.stamp().seconds_since_2000(),
                })
            }
            None => Err(FsError::NotFound {
                path: path.to_string(),
                operation: "stat".to_string(),
            }),
        }
    }

    async fn readdir_with_file_types(&self, path: &str) -> Result<Vec<DirentEntry>, FsError> {
        let state = self.state.read().await;
        state.require_formatted("scandir")?;
        let normalized = normalize_path(path);

        match state.entries.get(&normalized) {
            Some(FatEntry::Directory { .. }) => {}
            Some(_) => {
                return Err(FsError::NotDirectory {
                    path: path.to_string(),
                    operation: "scandir".to_string(),
                })
            }
            None => {
                return Err(FsError::NotFound {
                    path: path.to_string(),
                    operation: "scandir".to_string(),
                })
            }
        }

        let prefix = child_prefix(&normalized);
        let mut entries: Vec<DirentEntry> = state
            .entries
            .iter()
            .filter(|(p, _)| **p != normalized)
            .filter_map(|(p, entry)| {
                let rest = p.strip_prefix(&prefix)?;
                if rest.is_empty() || rest.contains('/') {
                    return None;
                }
                Some(DirentEntry {
                    name: rest.to_string(),
                    is_directory: entry.is_directory(),
                })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn mkdir(&self, path: &str) -> Result<(), FsError> {
        let stamp = self.now();
        let mut state = self.state.write().await;
        state.require_formatted("mkdir")?;
        let normalized = normalize_path(path);

        if state.entries.contains_key(&normalized) {
            return Err(FsError::AlreadyExists {
                path: path.to_string(),
                operation: "mkdir".to_string(),
            });
        }
        state.require_parent_dir(&normalized, path, "mkdir")?;

        let used = state.clusters_used(self.geometry.cluster_bytes());
        if used + 1 > self.geometry.total_clusters() as u64 {
            return Err(Self::no_space(path, "mkdir"));
        }
        state.entries.insert(normalized, FatEntry::Directory { stamp });
        self.mark_dirty();
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), FsError> {
        let mut state = self.state.write().await;
        state.require_formatted("remove")?;
        let normalized = normalize_path(path);
        match state.entries.get(&normalized) {
            Some(FatEntry::File { .. }) => {
                state.entries.remove(&normalized);
                self.mark_dirty();
                Ok(())
            }
            Some(FatEntry::Directory { .. }) => Err(FsError::IsDirectory {
                path: path.to_string(),
                operation: "remove".to_string(),
            }),
            None => Err(FsError::NotFound {
                path: path.to_string(),
                operation: "remove".to_string(),
            }),
        }
    }

    async fn rmdir(&self, path: &str) -> Result<(), FsError> {
        let mut state = self.state.write().await;
        state.require_formatted("rmdir")?;
        let normalized = normalize_path(path);
        if normalized == "/" {
            return Err(FsError::InvalidArgument {
                path: path.to_string(),
                operation: "rmdir".to_string(),
            });
        }
        match state.entries.get(&normalized) {
            Some(FatEntry::Directory { .. }) => {
                if state.has_children(&normalized) {
                    return Err(FsError::NotEmpty {
                        path: path.to_string(),
                        operation: "rmdir".to_string(),
                    });
                }
                state.entries.remove(&normalized);
                self.mark_dirty();
                Ok(())
            }
            Some(FatEntry::File { .. }) => Err(FsError::NotDirectory {
                path: path.to_string(),
                operation: "rmdir".to_string(),
            }),
            None => Err(FsError::NotFound {
                path: path.to_string(),
                operation: "rmdir".to_string(),
            }),
        }
    }

    async fn rename(&self, old: &str, new: &str) -> Result<(), FsError> {
        let mut state = self.state.write().await;
        state.require_formatted("rename")?;
        let old_norm = normalize_path(old);
        let new_norm = normalize_path(new);

        let source = match state.entries.get(&old_norm) {
            Some(entry) if old_norm != "/" => entry.clone(),
            _ => {
                return Err(FsError::NotFound {
                    path: old.to_string(),
                    operation: "rename".to_string(),
                })
            }
        };
        if old_norm == new_norm {
            return Ok(());
        }
        state.require_parent_dir(&new_norm, new, "rename")?;

        if source.is_directory() && new_norm.starts_with(&child_prefix(&old_norm)) {
            return Err(FsError::InvalidArgument {
                path: new.to_string(),
                operation: "rename".to_string(),
            });
        }
        match state.entries.get(&new_norm) {
            Some(FatEntry::Directory { .. }) => {
                return Err(FsError::AlreadyExists {
                    path: new.to_string(),
                    operation: "rename".to_string(),
                })
            }
            Some(FatEntry::File { .. }) if source.is_directory() => {
                return Err(FsError::AlreadyExists {
                    path: new.to_string(),
                    operation: "rename".to_string(),
                })
            }
            // an existing file destination is replaced
            Some(FatEntry::File { .. }) => {
                state.entries.remove(&new_norm);
            }
            None => {}
        }

        let old_prefix = child_prefix(&old_norm);
        let moved: Vec<String> = state
            .entries
            .keys()
            .filter(|k| **k == old_norm || k.starts_with(&old_prefix))
            .cloned()
            .collect();
        for key in moved {
            if let Some(entry) = state.entries.remove(&key) {
                let new_key = format!("{}{}", new_norm, &key[old_norm.len()..]);
                state.entries.insert(new_key, entry);
            }
        }
        self.mark_dirty();
        Ok(())
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let state = self.state.read().await;
        state.require_formatted("open")?;
        match state.entries.get(&normalize_path(path)) {
            Some(FatEntry::File { content, .. }) => Ok(content.clone()),
            Some(FatEntry::Directory { .. }) => Err(FsError::IsDirectory {
                path: path.to_string(),
                operation: "read".to_string(),
            }),
            None => Err(FsError::NotFound {
                path: path.to_string(),
                operation: "open".to_string(),
            }),
        }
    }

    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        let stamp = self.now();
        let mut state = self.state.write().await;
        state.require_formatted("open")?;
        let normalized = normalize_path(path);

        let previous = match state.entries.get(&normalized) {
            Some(FatEntry::Directory { .. }) => {
                return Err(FsError::IsDirectory {
                    path: path.to_string(),
                    operation: "write".to_string(),
                })
            }
            Some(FatEntry::File { content, .. }) => content.len() as u64,
            None => {
                state.require_parent_dir(&normalized, path, "open")?;
                0
            }
        };

        let cluster_bytes = self.geometry.cluster_bytes();
        let used = state.clusters_used(cluster_bytes) - clusters_for(previous, cluster_bytes);
        let needed = clusters_for(content.len() as u64, cluster_bytes);
        if used + needed > self.geometry.total_clusters() as u64 {
            return Err(Self::no_space(path, "write"));
        }

        state.entries.insert(normalized, FatEntry::File {
            content: content.to_vec(),
            stamp,
        });
        self.mark_dirty();
        Ok(())
    }

    async fn statvfs(&self, _path: &str) -> Result<StatVfs, FsError> {
        let free = self.free_clusters().await.map_err(|result| FsError::Driver {
            result,
            operation: "statvfs".to_string(),
        })? as u64;
        let bsize = self.geometry.cluster_bytes();
        Ok(StatVfs {
            bsize,
            frsize: bsize,
            blocks: self.geometry.total_clusters() as u64,
            bfree: free,
            bavail: free,
            files: 0,
            ffree: 0,
            favail: 0,
            flag: 0,
            namemax: MAX_NAME_LEN,
        })
    }

    fn as_fat(&self) -> Option<&dyn FatVolume> {
        Some(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
