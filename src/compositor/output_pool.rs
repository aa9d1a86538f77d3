//! Resolution-matched pool of output pixel buffers (design spec §4.4: "an
//! output pixel buffer from a resolution-matched pool"; §7: exhaustion
//! drops the frame and resizes on the next resolution change).

/// Maximum number of buffers retained for reuse.
const POOL_CAPACITY: usize = 3;

/// A CPU-side pool of `width*height*4` (BGRA8) byte buffers, reused across
/// frames to avoid a per-frame heap allocation.
pub struct OutputPool {
    width: u32,
    height: u32,
    free: Vec<Vec<u8>>,
}

impl OutputPool {
    /// An empty pool sized for `width`×`height` BGRA8 frames.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            free: Vec::new(),
        }
    }

    /// Current pool dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Tear down and rebuild for a new resolution, discarding buffers from
    /// the old one (§4.4: "the output texture, depth texture, and pool are
    /// torn down and rebuilt").
    pub fn resize(&mut self, width: u32, height: u32) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.free.clear();
        }
    }

    /// Byte length of one buffer at the pool's current resolution.
    #[must_use]
    pub const fn buffer_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }

    /// Take a zero-length-checked buffer from the free list, or allocate a
    /// fresh one sized to the current resolution.
    #[must_use]
    pub fn acquire(&mut self) -> Vec<u8> {
        self.free.pop().map_or_else(|| vec![0u8; self.buffer_len()], |mut buf| {
            buf.resize(self.buffer_len(), 0);
            buf
        })
    }

    /// Return a buffer to the pool for reuse, unless it no longer matches
    /// the current resolution or the pool is already at capacity.
    pub fn release(&mut self, buf: Vec<u8>) {
        if buf.len() == self.buffer_len() && self.free.len() < POOL_CAPACITY {
            self.free.push(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OutputPool;

    #[test]
    fn acquired_buffer_matches_resolution() {
        let mut pool = OutputPool::new(640, 480);
        let buf = pool.acquire();
        assert_eq!(buf.len(), 640 * 480 * 4);
    }

    #[test]
    fn released_buffer_is_reused() {
        let mut pool = OutputPool::new(64, 48);
        let buf = pool.acquire();
        let ptr = buf.as_ptr();
        pool.release(buf);
        let reused = pool.acquire();
        assert_eq!(reused.as_ptr(), ptr);
    }

    #[test]
    fn resize_discards_stale_buffers() {
        let mut pool = OutputPool::new(640, 480);
        pool.release(pool.acquire());
        pool.resize(1280, 720);
        assert_eq!(pool.dimensions(), (1280, 720));
        let buf = pool.acquire();
        assert_eq!(buf.len(), 1280 * 720 * 4);
    }

    #[test]
    fn pool_capacity_is_bounded() {
        let mut pool = OutputPool::new(16, 16);
        let buffers: Vec<Vec<u8>> = (0..(super::POOL_CAPACITY + 2)).map(|_| pool.acquire()).collect();
        for buf in buffers {
            pool.release(buf);
        }
        assert!(pool.free.len() <= super::POOL_CAPACITY);
    }
}
