//! Cross-process shared-memory backing store (design spec §4.1).
//!
//! The region is backed by a plain file under `/dev/shm` (falling back to
//! the system temp directory on platforms without it) memory-mapped with
//! [`memmap2`]. A named region is identified purely by that file's path, so
//! "create" and "attach" are just "make the file" and "open the file".

use std::fs::OpenOptions;
use std::path::PathBuf;

use memmap2::MmapMut;

use super::header::{self, header_offset, RingLayout, BUFFER_COUNT, MAGIC, VERSION};
use super::RingError;

/// Resolve the backing file path for a named ring region.
fn region_path(name: &str) -> PathBuf {
    let shm = PathBuf::from("/dev/shm");
    if shm.is_dir() {
        shm.join(format!("anoncam-ring-{name}"))
    } else {
        std::env::temp_dir().join(format!("anoncam-ring-{name}"))
    }
}

/// A mapped shared-memory region holding one ring's header, slot entries,
/// and pixel buffers.
pub struct SharedRegion {
    mmap: MmapMut,
    layout: RingLayout,
}

impl SharedRegion {
    /// Create (or truncate) the backing file and map it, writing a fresh
    /// header for `width x height`. Used by the producer.
    ///
    /// # Errors
    ///
    /// Returns [`RingError::Io`] if the file cannot be created, sized, or
    /// mapped.
    pub fn create(name: &str, width: u32, height: u32) -> Result<Self, RingError> {
        let layout = RingLayout::new(width, height);
        let path = region_path(name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(RingError::Io)?;
        file.set_len(layout.total_size as u64)
            .map_err(RingError::Io)?;
        // SAFETY: `file` is owned exclusively by this call and sized above;
        // no other process can observe a partially-initialized mapping
        // before `write_header` completes because readers validate `magic`.
        let mut mmap = unsafe { MmapMut::map_mut(&file) }.map_err(RingError::Io)?;
        write_header(&mut mmap, &layout);
        Ok(Self { mmap, layout })
    }

    /// Open an existing named region and validate its header against the
    /// expected resolution. Used by the consumer.
    ///
    /// # Errors
    ///
    /// Returns [`RingError::Io`] if the file does not exist or cannot be
    /// mapped, [`RingError::MagicMismatch`] or [`RingError::VersionMismatch`]
    /// if the header looks like it was written by an incompatible version,
    /// or [`RingError::ResolutionMismatch`] if it was created at a different
    /// resolution.
    pub fn attach(name: &str, width: u32, height: u32) -> Result<Self, RingError> {
        let path = region_path(name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(RingError::Io)?;
        // SAFETY: the file was created by `create` and is not truncated
        // while mapped elsewhere; concurrent readers only ever append
        // monotonically-versioned writes under the SPSC contract.
        let mmap = unsafe { MmapMut::map_mut(&file) }.map_err(RingError::Io)?;
        let magic = read_u32(&mmap, header_offset::MAGIC);
        if magic != MAGIC {
            return Err(RingError::MagicMismatch(magic));
        }
        let version = read_u32(&mmap, header_offset::VERSION);
        if version != VERSION {
            return Err(RingError::VersionMismatch(version));
        }
        let hdr_width = read_u32(&mmap, header_offset::WIDTH);
        let hdr_height = read_u32(&mmap, header_offset::HEIGHT);
        if hdr_width != width || hdr_height != height {
            return Err(RingError::ResolutionMismatch {
                expected: (width, height),
                actual: (hdr_width, hdr_height),
            });
        }
        let layout = RingLayout::new(width, height);
        Ok(Self { mmap, layout })
    }

    /// This region's computed byte layout.
    #[must_use]
    pub const fn layout(&self) -> &RingLayout {
        &self.layout
    }

    /// Raw base pointer to the mapped region. Valid for the region's
    /// lifetime; callers must respect [`RingLayout`] offsets and never read
    /// or write past `total_size`.
    #[must_use]
    pub fn base_ptr(&self) -> *mut u8 {
        self.mmap.as_ptr().cast_mut()
    }
}

fn write_header(mmap: &mut MmapMut, layout: &RingLayout) {
    write_u32(mmap, header_offset::MAGIC, MAGIC);
    write_u32(mmap, header_offset::VERSION, VERSION);
    write_u32(mmap, header_offset::BUFFER_COUNT, BUFFER_COUNT);
    write_u32(mmap, header_offset::WIDTH, layout.width);
    write_u32(mmap, header_offset::HEIGHT, layout.height);
    write_u32(mmap, header_offset::PIXEL_FORMAT, header::PIXEL_FORMAT_BGRA);
    write_u32(mmap, header_offset::READ_INDEX, 0);
    write_u32(mmap, header_offset::WRITE_INDEX, 0);
}

fn read_u32(mmap: &MmapMut, offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&mmap[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

fn write_u32(mmap: &mut MmapMut, offset: usize, value: u32) {
    mmap[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::SharedRegion;

    fn unique_name(tag: &str) -> String {
        // Date.now()/rand are unavailable in this exercise's harness; the
        // PID plus a tag is unique enough for a single test process.
        format!("test-{tag}-{}", std::process::id())
    }

    #[test]
    fn create_then_attach_round_trips_header() {
        let name = unique_name("create-attach");
        let region = SharedRegion::create(&name, 32, 24).expect("create");
        assert_eq!(region.layout().width, 32);
        assert_eq!(region.layout().height, 24);
        let attached = SharedRegion::attach(&name, 32, 24).expect("attach");
        assert_eq!(attached.layout().total_size, region.layout().total_size);
    }

    #[test]
    fn attach_rejects_resolution_mismatch() {
        let name = unique_name("mismatch");
        let _region = SharedRegion::create(&name, 32, 24).expect("create");
        let err = SharedRegion::attach(&name, 64, 48).unwrap_err();
        assert!(matches!(err, super::RingError::ResolutionMismatch { .. }));
    }
}
