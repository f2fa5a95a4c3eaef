//! OS Context
//!
//! The process-wide state behind the `uos` module: mount table and cwd, the
//! dupterm slot, the RNG and the flash cache. The runtime owns one context and
//! calls into it from its single execution thread; mutation goes through
//! `&mut self`, so concurrent embeddings must wrap it in a lock.

use std::sync::Arc;

use crate::config::OsConfig;
use crate::error::Result;
use crate::fs::{FatFs, FatGeometry, FileSystem};
use crate::value::Value;
use crate::vfs::{MountOptions, Vfs};

use super::flash::{DiskCache, FlashCache};
use super::getfree::getfree;
use super::random::{urandom, HardwareRng, RandomSource};
use super::uname::{uname, UnameInfo};
use crate::term::TerminalRedirect;

pub struct OsContext {
    pub vfs: Vfs,
    pub dupterm: TerminalRedirect,
    rng: Box<dyn RandomSource>,
    flash: Arc<dyn DiskCache>,
}

impl Default for OsContext {
    fn default() -> Self {
        Self::new()
    }
}

impl OsContext {
    /// Context with nothing mounted.
    pub fn new() -> Self {
        Self {
            vfs: Vfs::new(),
            dupterm: TerminalRedirect::new(),
            rng: Box::new(HardwareRng::new()),
            flash: Arc::new(FlashCache::new()),
        }
    }

    pub fn with_rng<R: RandomSource + 'static>(mut self, rng: R) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn with_disk_cache(mut self, flash: Arc<dyn DiskCache>) -> Self {
        self.flash = flash;
        self
    }

    /// Boot a default context from `config`.
    pub async fn from_config(config: &OsConfig) -> Result<Self> {
        Self::new().boot(config).await
    }

    /// Boot layout: internal flash at `/flash`, any extra volumes after it,
    /// then change into the configured directory. Every volume writes through
    /// this context's disk cache.
    pub async fn boot(mut self, config: &OsConfig) -> Result<Self> {
        let flash: Arc<dyn FileSystem> = Arc::new(self.fat_volume(config.flash)?);
        self.vfs.mount(flash, None, "/flash", MountOptions::default()).await?;

        for mount in &config.mounts {
            let fs: Arc<dyn FileSystem> = Arc::new(self.fat_volume(mount.geometry)?);
            let options = MountOptions { readonly: mount.readonly, mkfs: false };
            self.vfs.mount(fs, None, &mount.path, options).await?;
        }

        self.vfs.chdir(&config.cwd).await?;
        Ok(self)
    }

    /// A formatted FAT volume attached to this context's disk cache.
    pub fn fat_volume(&self, geometry: FatGeometry) -> Result<FatFs> {
        Ok(FatFs::new(geometry)?.with_cache(self.flash.clone()))
    }

    pub fn uname(&self) -> &'static UnameInfo {
        uname()
    }

    pub async fn getfree(&self, path: &str) -> Result<u64> {
        getfree(&self.vfs, path).await
    }

    pub fn urandom(&mut self, n: i64) -> Result<Vec<u8>> {
        urandom(self.rng.as_mut(), n)
    }

    pub fn sync(&self) {
        self.flash.flush();
    }

    /// `dupterm()` reads the slot; `dupterm(x)` replaces it and returns None.
    pub fn dupterm(&mut self, target: Option<Value>) -> Result<Value> {
        match target {
            None => Ok(self.dupterm.get()),
            Some(target) => {
                self.dupterm.set(target)?;
                Ok(Value::None)
            }
        }
    }

    /// Soft reset: detach every filesystem.
    pub async fn unmount_all(&mut self) -> usize {
        self.vfs.unmount_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MountConfig;
    use crate::errno::Errno;
    use crate::error::OsError;
    use crate::term::Uart;

    #[tokio::test]
    async fn test_from_config_boot_layout() {
        let config = OsConfig::default();
        let ctx = OsContext::from_config(&config).await.unwrap();
        assert_eq!(ctx.vfs.getcwd(), "/flash");
        assert_eq!(ctx.vfs.listdir(Some("/")).await.unwrap(), vec!["flash"]);
        // 2048 sectors of 512 bytes, nothing written yet
        assert_eq!(ctx.getfree("/flash").await.unwrap(), 1024);
    }

    #[tokio::test]
    async fn test_from_config_extra_mounts() {
        let mut config = OsConfig::default();
        config.mounts.push(MountConfig {
            path: "/sd".to_string(),
            geometry: FatGeometry::new(64, 2, 512),
            readonly: true,
        });
        let ctx = OsContext::from_config(&config).await.unwrap();
        assert_eq!(ctx.getfree("/sd").await.unwrap(), 32);
        assert_eq!(ctx.vfs.mkdir("/sd/x").await, Err(OsError::Os(Errno::EROFS)));
    }

    #[tokio::test]
    async fn test_from_config_bad_cwd() {
        let mut config = OsConfig::default();
        config.cwd = "/nowhere".to_string();
        assert_eq!(
            OsContext::from_config(&config).await.err(),
            Some(OsError::Os(Errno::ENOENT))
        );
    }

    #[test]
    fn test_dupterm_lifecycle() {
        let mut ctx = OsContext::new();
        assert_eq!(ctx.dupterm(None).unwrap(), Value::None);

        let uart = Value::Object(Arc::new(Uart::new(1)));
        assert_eq!(ctx.dupterm(Some(uart.clone())).unwrap(), Value::None);
        assert_eq!(ctx.dupterm(None).unwrap(), uart);

        ctx.dupterm(Some(Value::None)).unwrap();
        assert_eq!(ctx.dupterm(None).unwrap(), Value::None);
    }

    #[test]
    fn test_sync_flushes_cache() {
        let cache = Arc::new(FlashCache::new());
        let ctx = OsContext::new().with_disk_cache(cache.clone());
        cache.mark_dirty();
        ctx.sync();
        assert_eq!(cache.writebacks(), 1);
    }

    #[test]
    fn test_urandom_seeded() {
        let mut a = OsContext::new().with_rng(HardwareRng::with_seed(1));
        let mut b = OsContext::new().with_rng(HardwareRng::with_seed(1));
        assert_eq!(a.urandom(32).unwrap(), b.urandom(32).unwrap());
        assert!(a.urandom(0).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unmount_all() {
        let mut ctx = OsContext::from_config(&OsConfig::default()).await.unwrap();
        assert_eq!(ctx.unmount_all().await, 1);
        assert_eq!(ctx.unmount_all().await, 0);
        assert_eq!(ctx.getfree("/flash").await, Err(OsError::Os(Errno::ENOENT)));
    }

    #[tokio::test]
    async fn test_writes_dirty_the_flash_cache() {
        let cache = Arc::new(FlashCache::new());
        let ctx = OsContext::new()
            .with_disk_cache(cache.clone())
            .boot(&OsConfig::default())
            .await
            .unwrap();
        assert!(!cache.is_dirty());

        ctx.vfs.write_file("/flash/a.txt", b"abc").await.unwrap();
        assert!(cache.is_dirty());
        ctx.sync();
        assert!(!cache.is_dirty());
        assert_eq!(cache.writebacks(), 1);

        // reads leave nothing to write back
        ctx.vfs.read_file("/flash/a.txt").await.unwrap();
        ctx.sync();
        assert_eq!(cache.writebacks(), 1);
    }
}
