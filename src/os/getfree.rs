//! Free space on a mounted FAT volume.

use crate::errno::Errno;
use crate::error::{OsError, Result};
use crate::fs::FatVolume;
use crate::vfs::Vfs;

#[cfg(feature = "variable-sector-size")]
fn sector_size(volume: &dyn FatVolume) -> u64 {
    volume.sector_size() as u64
}

#[cfg(not(feature = "variable-sector-size"))]
fn sector_size(_volume: &dyn FatVolume) -> u64 {
    crate::fs::SECTOR_SIZE as u64
}

/// Free kilobytes on the volume `path` resolves to. The byte count is
/// truncated, not rounded, when converted to kilobytes.
pub async fn getfree(vfs: &Vfs, path: &str) -> Result<u64> {
    let fs = vfs.resolve(path)?;
    // only FAT volumes carry cluster accounting
    let volume = fs.as_fat().ok_or(OsError::Os(Errno::ENODEV))?;

    let nclst = volume.free_clusters().await.map_err(|result| {
        log::warn!("getfree({}): {}", path, result);
        OsError::from(result)
    })?;

    let free_space = volume.cluster_size() as u64 * nclst as u64 * sector_size(volume);
    Ok(free_space / 1024)
}
