//! Consumer side of the shared-memory ring (design spec §4.1, §6, §8).

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use super::header::{header_offset, slot_offset, BUFFER_COUNT};
use super::shmem::SharedRegion;
use super::{FrameView, RingError};

/// Owns the consumer end of a named shared-memory ring.
pub struct RingConsumer {
    region: SharedRegion,
    read_index: u32,
}

impl RingConsumer {
    /// Attach to an existing named ring at `width x height`.
    ///
    /// # Errors
    ///
    /// Returns [`RingError`] if the region does not exist or its header
    /// does not match the expected resolution.
    pub fn attach(name: &str, width: u32, height: u32) -> Result<Self, RingError> {
        let region = SharedRegion::attach(name, width, height)?;
        let base = region.base_ptr();
        // SAFETY: header offsets are within the mapped region.
        let read_index = unsafe { atomic_u32(base, header_offset::READ_INDEX) }.load(Ordering::Acquire);
        Ok(Self { region, read_index })
    }

    /// Sequentially dequeue the oldest unreleased frame, if any.
    ///
    /// Returns `None` if no frame has been published since the last
    /// release. The returned [`ReadGuard`] must be released via
    /// [`ReadGuard::release_read`] to free the slot for reuse.
    pub fn acquire_read(&mut self) -> Option<ReadGuard<'_>> {
        let base = self.region.base_ptr();
        // SAFETY: header offsets are within the mapped region.
        let in_flight = unsafe { atomic_u32(base, header_offset::IN_FLIGHT) }.load(Ordering::Acquire);
        if in_flight == 0 {
            return None;
        }
        let slot_idx = self.read_index;
        let view = self.read_slot(slot_idx);
        Some(ReadGuard {
            consumer: self,
            slot_idx,
            view,
        })
    }

    /// Return the most recently published frame without mutating any
    /// cursor, for low-latency consumers that only care about the newest
    /// frame and are fine skipping whatever came between.
    ///
    /// Differs from "detached": the ring is always considered attached
    /// once [`RingConsumer::attach`] succeeds; a torn-down producer simply
    /// stops advancing `write_index`, and this keeps returning the last
    /// frame it published.
    #[must_use]
    pub fn peek_latest(&self) -> Option<FrameView<'_>> {
        let base = self.region.base_ptr();
        // SAFETY: header offsets are within the mapped region.
        let write_index = unsafe { atomic_u32(base, header_offset::WRITE_INDEX) }.load(Ordering::Acquire);
        let latest = (write_index + BUFFER_COUNT - 1) % BUFFER_COUNT;
        let in_flight = unsafe { atomic_u32(base, header_offset::IN_FLIGHT) }.load(Ordering::Acquire);
        if in_flight == 0 {
            return None;
        }
        Some(self.read_slot(latest))
    }

    // Note the explicit, self-independent `'a`: this intentionally does not
    // elide to `&self`'s lifetime (which would force the borrow used here
    // to stay alive for as long as the returned view, conflicting with
    // `ReadGuard` also holding a `&mut RingConsumer`). The pixel data is
    // addressed through a raw pointer copied out of `self.region`, not a
    // borrow of `self`, so its true lifetime is the region's, which always
    // outlives any single `ReadGuard`/`FrameView`.
    fn read_slot<'a>(&self, slot_idx: u32) -> FrameView<'a> {
        let layout = *self.region.layout();
        let base = self.region.base_ptr();
        let slot_base = layout.slot_entry_offset(slot_idx);
        // SAFETY: slot entry offsets are within the mapped region.
        let (timestamp_ns, frame_number, width, height) = unsafe {
            (
                atomic_u64(base, slot_base + slot_offset::TIMESTAMP_NS).load(Ordering::Relaxed),
                atomic_u64(base, slot_base + slot_offset::FRAME_NUMBER).load(Ordering::Relaxed),
                atomic_u32(base, slot_base + slot_offset::WIDTH).load(Ordering::Relaxed),
                atomic_u32(base, slot_base + slot_offset::HEIGHT).load(Ordering::Relaxed),
            )
        };
        let pixel_offset = layout.pixel_buffer_offset(slot_idx);
        // SAFETY: within the mapped region; borrows `self.region` for the
        // returned view's lifetime.
        let pixels = unsafe { std::slice::from_raw_parts(base.add(pixel_offset), layout.pixel_buffer_size) };
        FrameView {
            pixels,
            width,
            height,
            timestamp_ns,
            frame_number,
        }
    }
}

/// A dequeued-but-not-yet-released frame from [`RingConsumer::acquire_read`].
pub struct ReadGuard<'a> {
    consumer: &'a mut RingConsumer,
    slot_idx: u32,
    view: FrameView<'a>,
}

impl<'a> ReadGuard<'a> {
    /// The dequeued frame's data.
    #[must_use]
    pub const fn view(&self) -> &FrameView<'a> {
        &self.view
    }

    /// Clear `ready` on this slot, advance `read_index`, and decrement
    /// `in_flight`, freeing the slot for the producer to reuse.
    pub fn release_read(self) {
        let base = self.consumer.region.base_ptr();
        let layout = *self.consumer.region.layout();
        let slot_base = layout.slot_entry_offset(self.slot_idx);
        // SAFETY: offsets are within the mapped region.
        unsafe {
            atomic_u32(base, slot_base + slot_offset::READY).store(0, Ordering::Relaxed);
        }
        let next = (self.slot_idx + 1) % BUFFER_COUNT;
        self.consumer.read_index = next;
        // SAFETY: as above.
        unsafe { atomic_u32(base, header_offset::READ_INDEX) }.store(next, Ordering::Relaxed);
        let in_flight = unsafe { atomic_u32(base, header_offset::IN_FLIGHT) };
        // Release: the slot must look fully freed before the producer can
        // observe the decremented count and reuse it.
        let _ = in_flight.fetch_sub(1, Ordering::Release);
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
    use super::RingConsumer;
    use crate::ring::RingProducer;

    #[test]
    fn consumer_drains_in_publish_order() {
        let name = format!("consumer-test-{}", std::process::id());
        let mut producer = RingProducer::create(&name, 2, 2).expect("create");
        let mut consumer = RingConsumer::attach(&name, 2, 2).expect("attach");

        assert!(consumer.acquire_read().is_none());

        let pixels = vec![7u8; 2 * 2 * 4];
        producer.publish(&pixels, 42).expect("publish");
        producer.publish(&pixels, 43).expect("publish");

        let guard = consumer.acquire_read().expect("frame available");
        assert_eq!(guard.view().timestamp_ns, 42);
        assert_eq!(guard.view().frame_number, 1);
        guard.release_read();

        let guard2 = consumer.acquire_read().expect("second frame available");
        assert_eq!(guard2.view().timestamp_ns, 43);
        guard2.release_read();

        assert!(consumer.acquire_read().is_none());
    }

    #[test]
    fn backpressure_drops_and_recovers() {
        let name = format!("consumer-backpressure-{}", std::process::id());
        let mut producer = RingProducer::create(&name, 2, 2).expect("create");
        let mut consumer = RingConsumer::attach(&name, 2, 2).expect("attach");
        let pixels = vec![1u8; 2 * 2 * 4];

        for _ in 0..10 {
            producer.publish(&pixels, 1).expect("publish never errors");
        }
        assert_eq!(producer.frames_published(), 3);

        let guard = consumer.acquire_read().expect("one frame ready");
        guard.release_read();

        producer.publish(&pixels, 2).expect("publish after release succeeds");
        assert_eq!(producer.frames_published(), 4);
    }

    #[test]
    fn peek_latest_does_not_mutate_cursors() {
        let name = format!("consumer-peek-{}", std::process::id());
        let mut producer = RingProducer::create(&name, 2, 2).expect("create");
        let consumer = RingConsumer::attach(&name, 2, 2).expect("attach");
        let pixels = vec![9u8; 2 * 2 * 4];
        producer.publish(&pixels, 5).expect("publish");

        let first = consumer.peek_latest().expect("frame").timestamp_ns;
        let second = consumer.peek_latest().expect("frame").timestamp_ns;
        assert_eq!(first, second);
        assert_eq!(first, 5);
    }
}
