//! Wire layout of the shared-memory ring header and slot entries (design
//! spec §3, §4.1).
//!
//! Every field is laid out at an explicit byte offset so the layout is
//! stable across the producer/consumer process boundary regardless of
//! compiler struct-padding decisions. Offsets are chosen so every `u64`
//! field lands on an 8-byte boundary, which is required for correct atomic
//! access via [`std::sync::atomic::AtomicU64::from_ptr`].

/// `RingHeader.magic` value, `"ACMS"`-flavored per the design spec.
pub const MAGIC: u32 = 0x4143_4D53;
/// `RingHeader.version` value this crate writes and expects.
pub const VERSION: u32 = 1;
/// Fixed slot count (triple-buffered).
pub const BUFFER_COUNT: u32 = 3;
/// `RingHeader.pixel_format` value, ASCII `'BGRA'` packed little-endian.
pub const PIXEL_FORMAT_BGRA: u32 = 0x4247_5241;

/// Byte offsets of each [`RingHeader`] field.
pub mod header_offset {
    /// `magic: u32`.
    pub const MAGIC: usize = 0;
    /// `version: u32`.
    pub const VERSION: usize = 4;
    /// `buffer_count: u32`.
    pub const BUFFER_COUNT: usize = 8;
    /// `width: u32`.
    pub const WIDTH: usize = 12;
    /// `height: u32`.
    pub const HEIGHT: usize = 16;
    /// `pixel_format: u32`.
    pub const PIXEL_FORMAT: usize = 20;
    /// `read_index: u32`, consumer cursor.
    pub const READ_INDEX: usize = 24;
    /// `write_index: u32`, producer cursor.
    pub const WRITE_INDEX: usize = 28;
    /// `frame_count: u64`, monotone.
    pub const FRAME_COUNT: usize = 32;
    /// `last_update_ns: u64`.
    pub const LAST_UPDATE_NS: usize = 40;
    /// Reserved/zero padding, 64 bytes. The first 4 bytes double as an
    /// `in_flight: u32` counter (frames published minus frames released) so
    /// the producer can distinguish "empty" from "full" with `buffer_count`
    /// full-capacity slots — two bare indices cannot do this without either
    /// wasting a slot or an extra coordination field, and the spec leaves
    /// this layout detail open for the implementer to resolve.
    pub const RESERVED: usize = 48;
    /// `in_flight: u32`, packed into the first word of `reserved`.
    pub const IN_FLIGHT: usize = RESERVED;
}

/// Size of [`RingHeader`] on the wire, in bytes.
pub const HEADER_SIZE: usize = 112;

/// Byte offsets of each `SlotEntry` field, relative to the start of that
/// slot's entry record.
pub mod slot_offset {
    /// `ready: u32`.
    pub const READY: usize = 0;
    /// `timestamp_ns: u64`.
    pub const TIMESTAMP_NS: usize = 8;
    /// `frame_number: u64`.
    pub const FRAME_NUMBER: usize = 16;
    /// `width: u32`.
    pub const WIDTH: usize = 24;
    /// `height: u32`.
    pub const HEIGHT: usize = 28;
    /// `surface_handle: u64`.
    pub const SURFACE_HANDLE: usize = 32;
    /// Reserved/zero padding, 32 bytes.
    pub const RESERVED: usize = 40;
}

/// Size of one `SlotEntry` record on the wire, in bytes.
pub const SLOT_ENTRY_SIZE: usize = 72;

/// Round `value` up to the next multiple of `align` (`align` must be a
/// power of two).
#[must_use]
const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

/// Pixel buffer alignment, per design spec §3.
pub const PIXEL_BUFFER_ALIGN: usize = 64;

/// Computed byte offsets for a ring of the given resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingLayout {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Byte offset of the first `SlotEntry` record.
    pub slots_offset: usize,
    /// Byte offset of the first pixel buffer.
    pub pixels_offset: usize,
    /// Size in bytes of one pixel buffer (`width * height * 4`).
    pub pixel_buffer_size: usize,
    /// Total region size in bytes.
    pub total_size: usize,
}

impl RingLayout {
    /// Compute the layout for a `BUFFER_COUNT`-slot ring at `width x
    /// height`.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let slots_offset = HEADER_SIZE;
        let slots_size = (BUFFER_COUNT as usize) * SLOT_ENTRY_SIZE;
        let pixels_offset = align_up(slots_offset + slots_size, PIXEL_BUFFER_ALIGN);
        let pixel_buffer_size = (width as usize) * (height as usize) * 4;
        let total_size = pixels_offset + pixel_buffer_size * (BUFFER_COUNT as usize);
        Self {
            width,
            height,
            slots_offset,
            pixels_offset,
            pixel_buffer_size,
            total_size,
        }
    }

    /// Byte offset of slot `idx`'s `SlotEntry` record.
    #[must_use]
    pub fn slot_entry_offset(&self, idx: u32) -> usize {
        self.slots_offset + (idx as usize) * SLOT_ENTRY_SIZE
    }

    /// Byte offset of slot `idx`'s pixel buffer.
    #[must_use]
    pub fn pixel_buffer_offset(&self, idx: u32) -> usize {
        self.pixels_offset + (idx as usize) * self.pixel_buffer_size
    }
}

#[cfg(test)]
mod tests {
    use super::{header_offset, RingLayout, BUFFER_COUNT, HEADER_SIZE, SLOT_ENTRY_SIZE};

    #[test]
    fn header_fields_are_eight_byte_aligned_where_needed() {
        assert_eq!(header_offset::FRAME_COUNT % 8, 0);
        assert_eq!(header_offset::LAST_UPDATE_NS % 8, 0);
    }

    #[test]
    fn slot_entry_fields_are_eight_byte_aligned_where_needed() {
        use super::slot_offset;
        assert_eq!(slot_offset::TIMESTAMP_NS % 8, 0);
        assert_eq!(slot_offset::FRAME_NUMBER % 8, 0);
        assert_eq!(slot_offset::SURFACE_HANDLE % 8, 0);
        assert_eq!(SLOT_ENTRY_SIZE % 8, 0);
    }

    #[test]
    fn layout_is_non_overlapping_and_aligned() {
        let layout = RingLayout::new(640, 480);
        assert_eq!(layout.slots_offset, HEADER_SIZE);
        assert!(layout.pixels_offset >= layout.slots_offset + (BUFFER_COUNT as usize) * SLOT_ENTRY_SIZE);
        assert_eq!(layout.pixels_offset % super::PIXEL_BUFFER_ALIGN, 0);
        assert_eq!(layout.pixel_buffer_size, 640 * 480 * 4);
        assert_eq!(
            layout.total_size,
            layout.pixels_offset + layout.pixel_buffer_size * (BUFFER_COUNT as usize)
        );
    }

    #[test]
    fn slot_and_pixel_offsets_distinct_per_index() {
        let layout = RingLayout::new(16, 16);
        let off0 = layout.slot_entry_offset(0);
        let off1 = layout.slot_entry_offset(1);
        assert_eq!(off1 - off0, SLOT_ENTRY_SIZE);
        let p0 = layout.pixel_buffer_offset(0);
        let p1 = layout.pixel_buffer_offset(1);
        assert_eq!(p1 - p0, layout.pixel_buffer_size);
    }
}
