//! Reusable render surfaces, pooled per (width, height).
//!
//! The renderer's scratch surface is reused across calls instead of being
//! allocated per tile. Callers never receive the pooled buffer itself; every
//! render copies its result out into a private raster before the surface
//! returns to the pool.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Pool of RGBA scratch buffers keyed by surface size.
#[derive(Debug, Default)]
pub struct SurfacePool {
    surfaces: Mutex<HashMap<(u32, u32), Vec<Vec<u8>>>>,
    allocations: AtomicU64,
    reuses: AtomicU64,
}

/// Snapshot of pool usage counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Surfaces allocated fresh.
    pub allocations: u64,
    /// Renders served from a pooled surface.
    pub reuses: u64,
    /// Surfaces currently parked in the pool.
    pub pooled: usize,
}

impl SurfacePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with a zeroed RGBA buffer of `width * height * 4` bytes.
    ///
    /// The buffer is taken from the pool when one of matching size is parked
    /// there, and returned to the pool afterwards.
    pub fn with_surface<R>(&self, width: u32, height: u32, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let size = width as usize * height as usize * 4;

        let reused = {
            let mut surfaces = self.surfaces.lock().unwrap_or_else(|e| e.into_inner());
            surfaces.get_mut(&(width, height)).and_then(Vec::pop)
        };

        let mut buf = match reused {
            Some(buf) => {
                self.reuses.fetch_add(1, Ordering::Relaxed);
                buf
            }
            None => {
                self.allocations.fetch_add(1, Ordering::Relaxed);
                vec![0u8; size]
            }
        };
        buf.resize(size, 0);
        buf.fill(0);

        let result = f(&mut buf);

        let mut surfaces = self.surfaces.lock().unwrap_or_else(|e| e.into_inner());
        surfaces.entry((width, height)).or_default().push(buf);

        result
    }

    /// Current usage counters.
    pub fn stats(&self) -> PoolStats {
        let surfaces = self.surfaces.lock().unwrap_or_else(|e| e.into_inner());
        PoolStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            reuses: self.reuses.load(Ordering::Relaxed),
            pooled: surfaces.values().map(Vec::len).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_reuse() {
        let pool = SurfacePool::new();

        pool.with_surface(16, 16, |buf| {
            assert_eq!(buf.len(), 16 * 16 * 4);
            buf[0] = 255;
        });
        pool.with_surface(16, 16, |buf| {
            // Cleared before reuse
            assert_eq!(buf[0], 0);
        });

        let stats = pool.stats();
        assert_eq!(stats.allocations, 1);
        assert_eq!(stats.reuses, 1);
        assert_eq!(stats.pooled, 1);
    }

    #[test]
    fn test_distinct_sizes_get_distinct_surfaces() {
        let pool = SurfacePool::new();
        pool.with_surface(8, 8, |_| {});
        pool.with_surface(4, 4, |_| {});

        let stats = pool.stats();
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.pooled, 2);
    }
}
