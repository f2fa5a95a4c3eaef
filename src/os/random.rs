//! Random bytes for `urandom`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::errno::Errno;
use crate::error::{OsError, Result};

/// Source of random bytes, one per call.
pub trait RandomSource: Send + Sync {
    fn next_byte(&mut self) -> u8;
}

/// Stand-in for the hardware RNG peripheral.
pub struct HardwareRng {
    rng: StdRng,
}

impl HardwareRng {
    pub fn new() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    /// Deterministic sequence, for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl Default for HardwareRng {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for HardwareRng {
    fn next_byte(&mut self) -> u8 {
        self.rng.gen()
    }
}

/// Exactly `n` bytes, each drawn with its own call to the source.
pub fn urandom(source: &mut dyn RandomSource, n: i64) -> Result<Vec<u8>> {
    if n < 0 {
        return Err(OsError::Value("negative length".to_string()));
    }
    // the buffer is reserved up front; a length the heap cannot hold is ENOMEM
    let len = usize::try_from(n).map_err(|_| OsError::Os(Errno::ENOMEM))?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| OsError::Os(Errno::ENOMEM))?;
    buf.extend((0..len).map(|_| source.next_byte()));
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingRng {
        calls: usize,
    }

    impl RandomSource for CountingRng {
        fn next_byte(&mut self) -> u8 {
            self.calls += 1;
            self.calls as u8
        }
    }

    #[test]
    fn test_exact_length() {
        let mut rng = HardwareRng::new();
        assert!(urandom(&mut rng, 0).unwrap().is_empty());
        assert_eq!(urandom(&mut rng, 16).unwrap().len(), 16);
        assert_eq!(urandom(&mut rng, 1000).unwrap().len(), 1000);
    }

    #[test]
    fn test_one_call_per_byte() {
        let mut rng = CountingRng { calls: 0 };
        let bytes = urandom(&mut rng, 4).unwrap();
        assert_eq!(bytes, vec![1, 2, 3, 4]);
        assert_eq!(rng.calls, 4);
    }

    #[test]
    fn test_negative_length() {
        let mut rng = CountingRng { calls: 0 };
        assert!(matches!(urandom(&mut rng, -1), Err(OsError::Value(_))));
        assert_eq!(rng.calls, 0);
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let a = urandom(&mut HardwareRng::with_seed(7), 8).unwrap();
        let b = urandom(&mut HardwareRng::with_seed(7), 8).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unallocatable_length_is_enomem() {
        let mut rng = CountingRng { calls: 0 };
        assert_eq!(urandom(&mut rng, i64::MAX), Err(OsError::Os(Errno::ENOMEM)));
        assert_eq!(rng.calls, 0);
    }
}
