//! Producer side of the shared-memory ring (design spec §4.1, §8).
//!
//! `write_index` names the slot the producer will write into next and
//! always advances by exactly one (mod `BUFFER_COUNT`) per publish. A
//! separate `in_flight` counter (packed into the header's reserved region,
//! see [`header::header_offset::IN_FLIGHT`]) tracks frames published but
//! not yet released by the consumer; a write is admitted only while
//! `in_flight < BUFFER_COUNT`, giving the full `buffer_count` usable slots
//! the drop-accounting tests expect rather than the `buffer_count - 1` a
//! bare two-cursor comparison would allow.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use super::header::{header_offset, slot_offset, BUFFER_COUNT};
use super::shmem::SharedRegion;
use super::RingError;

/// Owns the producer end of a named shared-memory ring.
pub struct RingProducer {
    region: SharedRegion,
    frame_count: u64,
}

impl RingProducer {
    /// Create a new named ring at `width x height` and take the producer
    /// end.
    ///
    /// # Errors
    ///
    /// Returns [`RingError`] if the backing region cannot be created.
    pub fn create(name: &str, width: u32, height: u32) -> Result<Self, RingError> {
        let region = SharedRegion::create(name, width, height)?;
        Ok(Self {
            region,
            frame_count: 0,
        })
    }

    /// Attempt to claim the next slot for writing.
    ///
    /// Returns `None` ("full") if `buffer_count` frames are already
    /// in flight; the caller must drop the frame in that case rather than
    /// block.
    pub fn acquire_write(&mut self) -> Option<WriteGuard<'_>> {
        let base = self.region.base_ptr();
        // SAFETY: within the mapped region, see `header.rs` offsets.
        let in_flight = unsafe { atomic_u32(base, header_offset::IN_FLIGHT) }.load(Ordering::Acquire);
        if in_flight >= BUFFER_COUNT {
            return None;
        }
        let write_index = unsafe { atomic_u32(base, header_offset::WRITE_INDEX) }.load(Ordering::Relaxed);
        Some(WriteGuard {
            producer: self,
            slot_idx: write_index,
        })
    }

    /// Write one composited frame, dropping it silently if the ring is
    /// full (§4.5 drop-not-block).
    ///
    /// `pixels` must be exactly `width * height * 4` bytes (BGRA8) matching
    /// the resolution this ring was created with.
    ///
    /// # Errors
    ///
    /// Returns [`RingError::FrameSizeMismatch`] if `pixels` does not match
    /// the ring's configured pixel buffer size.
    pub fn publish(&mut self, pixels: &[u8], timestamp_ns: u64) -> Result<(), RingError> {
        let expected = self.region.layout().pixel_buffer_size;
        if pixels.len() != expected {
            return Err(RingError::FrameSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        if let Some(mut guard) = self.acquire_write() {
            guard.pixels_mut().copy_from_slice(pixels);
            guard.submit_write(timestamp_ns);
        }
        Ok(())
    }

    /// Total number of frames successfully published on this ring.
    #[must_use]
    pub const fn frames_published(&self) -> u64 {
        self.frame_count
    }
}

/// A claimed, not-yet-published write slot. Write pixels via
/// [`WriteGuard::pixels_mut`] then call [`WriteGuard::submit_write`] to
/// publish, or drop the guard to abandon the write without publishing.
pub struct WriteGuard<'a> {
    producer: &'a mut RingProducer,
    slot_idx: u32,
}

impl WriteGuard<'_> {
    /// Mutable view of this slot's pixel buffer, `width * height * 4`
    /// bytes.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        let layout = *self.producer.region.layout();
        let offset = layout.pixel_buffer_offset(self.slot_idx);
        let base = self.producer.region.base_ptr();
        // SAFETY: `offset..+pixel_buffer_size` is within the mapped region
        // and `in_flight < BUFFER_COUNT` was checked in `acquire_write`, so
        // this slot is not one the consumer still holds.
        unsafe { std::slice::from_raw_parts_mut(base.add(offset), layout.pixel_buffer_size) }
    }

    /// Publish this slot: mark it ready, fill its metadata, advance
    /// `write_index` by one, and increment `in_flight`, all under release
    /// ordering.
    pub fn submit_write(self, timestamp_ns: u64) {
        let layout = *self.producer.region.layout();
        let base = self.producer.region.base_ptr();
        let slot_base = layout.slot_entry_offset(self.slot_idx);
        self.producer.frame_count += 1;
        // SAFETY: slot entry and header offsets are within the mapped
        // region.
        unsafe {
            atomic_u64(base, slot_base + slot_offset::TIMESTAMP_NS).store(timestamp_ns, Ordering::Relaxed);
            atomic_u64(base, slot_base + slot_offset::FRAME_NUMBER)
                .store(self.producer.frame_count, Ordering::Relaxed);
            atomic_u32(base, slot_base + slot_offset::WIDTH).store(layout.width, Ordering::Relaxed);
            atomic_u32(base, slot_base + slot_offset::HEIGHT).store(layout.height, Ordering::Relaxed);
            atomic_u32(base, slot_base + slot_offset::READY).store(1, Ordering::Relaxed);

            atomic_u64(base, header_offset::FRAME_COUNT)
                .store(self.producer.frame_count, Ordering::Relaxed);
            atomic_u64(base, header_offset::LAST_UPDATE_NS).store(timestamp_ns, Ordering::Relaxed);
        }

        let next = (self.slot_idx + 1) % BUFFER_COUNT;
        // SAFETY: as above.
        unsafe { atomic_u32(base, header_offset::WRITE_INDEX) }.store(next, Ordering::Relaxed);
        // Release: every write above (including the in_flight bump) must be
        // visible once the consumer observes it.
        let in_flight = unsafe { atomic_u32(base, header_offset::IN_FLIGHT) };
        let _ = in_flight.fetch_add(1, Ordering::Release);
    }
}

/// # Safety
///
/// `base + offset` must be within a live mapping and 4-byte aligned.
unsafe fn atomic_u32(base: *mut u8, offset: usize) -> &'static AtomicU32 {
    &*base.add(offset).cast::<AtomicU32>()
}

/// # Safety
///
/// `base + offset` must be within a live mapping and 8-byte aligned.
unsafe fn atomic_u64(base: *mut u8, offset: usize) -> &'static AtomicU64 {
    &*base.add(offset).cast::<AtomicU64>()
}

#[cfg(test)]
mod tests {
    use super::RingProducer;

    #[test]
    fn publish_rejects_mismatched_frame_size() {
        let mut producer = RingProducer::create("producer-size-test", 4, 4).expect("create ring");
        let err = producer.publish(&[0u8; 4], 0).unwrap_err();
        assert!(matches!(err, super::RingError::FrameSizeMismatch { .. }));
    }

    #[test]
    fn publish_accepts_matching_frame_size() {
        let mut producer = RingProducer::create("producer-ok-test", 2, 2).expect("create ring");
        let pixels = vec![0u8; 2 * 2 * 4];
        producer.publish(&pixels, 1_000).expect("publish");
        producer.publish(&pixels, 2_000).expect("publish again");
    }

    #[test]
    fn write_index_advances_by_one_per_publish() {
        use super::super::header::header_offset;
        let mut producer = RingProducer::create("producer-advance-test", 2, 2).expect("create ring");
        let pixels = vec![0u8; 2 * 2 * 4];
        let base = producer.region.base_ptr();
        for expected in 1..=2u32 {
            producer.publish(&pixels, u64::from(expected)).expect("publish");
            let write_index = unsafe { super::atomic_u32(base, header_offset::WRITE_INDEX) }
                .load(std::sync::atomic::Ordering::Relaxed);
            assert_eq!(write_index, expected);
        }
    }

    #[test]
    fn exactly_buffer_count_frames_accepted_before_full() {
        use super::super::header::header_offset;
        let mut producer = RingProducer::create("producer-full-test", 2, 2).expect("create ring");
        let pixels = vec![0u8; 2 * 2 * 4];
        let base = producer.region.base_ptr();
        for _ in 0..10 {
            producer.publish(&pixels, 1).expect("publish never errors on full");
        }
        let in_flight = unsafe { super::atomic_u32(base, header_offset::IN_FLIGHT) }
            .load(std::sync::atomic::Ordering::Relaxed);
        assert_eq!(in_flight, super::BUFFER_COUNT);
        assert_eq!(producer.frame_count, u64::from(super::BUFFER_COUNT));
    }
}
