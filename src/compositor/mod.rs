//! The Compositor (C4, design spec §4.4): drives the GPU pipeline that
//! turns a camera frame, a face observation, and an optional mask into one
//! finished output frame.

mod background;
mod mask_overlay;
mod output_pool;
pub mod render_context;
mod uniforms;

use std::sync::mpsc;
use std::time::Instant;

use wgpu::util::DeviceExt;

use background::BackgroundPass;
use mask_overlay::MaskOverlayPass;
use output_pool::OutputPool;
use render_context::{RenderContext, RenderContextError, OUTPUT_FORMAT};
use uniforms::{BackgroundParams, MaskParams};

use crate::frame::Frame;
use crate::observation::FaceObservation;
use crate::options::{DisplayOptions, MaskOptions};
use crate::pose::MaskGeometry;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// wgpu requires `bytes_per_row` in a buffer-texture copy to be a multiple
/// of this.
const COPY_BYTES_PER_ROW_ALIGNMENT: u32 = 256;

/// One finished, CPU-resident output frame, ready for the ring publisher
/// or a preview callback.
pub struct CompositedFrame {
    /// Tightly packed BGRA8 pixels, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Source capture timestamp, monotonic nanoseconds.
    pub timestamp_ns: u64,
}

/// The placement matrices produced by [`crate::pose::PoseMapper::placement`].
pub type Placement = (glam::Mat4, glam::Mat4);

/// Drives the background + mask overlay render passes and reads the
/// result back to CPU memory (design spec §4.4).
pub struct Compositor {
    context: RenderContext,
    background: BackgroundPass,
    mask_overlay: MaskOverlayPass,
    depth_view: wgpu::TextureView,
    output_texture: wgpu::Texture,
    output_view: wgpu::TextureView,
    camera_texture: wgpu::Texture,
    camera_view: wgpu::TextureView,
    pool: OutputPool,
    width: u32,
    height: u32,
    started_at: Instant,
}

impl Compositor {
    /// Open a GPU device and build the fixed pipeline state. Blocks on
    /// device/adapter negotiation (a one-time session-startup cost, not a
    /// per-frame one).
    ///
    /// # Errors
    ///
    /// Returns [`RenderContextError`] if no adapter or device is
    /// available.
    pub fn new(width: u32, height: u32) -> Result<Self, RenderContextError> {
        let context = pollster::block_on(RenderContext::new())?;
        let background = BackgroundPass::new(&context);
        let mask_overlay = MaskOverlayPass::new(&context);
        let depth_view = Self::create_depth_view(&context, width, height);
        let (output_texture, output_view) = Self::create_output_texture(&context, width, height);
        let (camera_texture, camera_view) = Self::create_camera_texture(&context, width, height);

        Ok(Self {
            context,
            background,
            mask_overlay,
            depth_view,
            output_texture,
            output_view,
            camera_texture,
            camera_view,
            pool: OutputPool::new(width, height),
            width,
            height,
            started_at: Instant::now(),
        })
    }

    /// Current render resolution.
    #[must_use]
    pub const fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Render one frame (design spec §4.4 render pass + output steps).
    ///
    /// # Errors
    ///
    /// Returns [`RenderContextError::DeviceLost`] if the GPU device was
    /// lost mid-readback.
    pub fn render(
        &mut self,
        frame: &Frame<'_>,
        observation: &FaceObservation,
        mask_geometry: Option<&MaskGeometry>,
        mask_texture_view: Option<&wgpu::TextureView>,
        placement: Placement,
        display: &DisplayOptions,
        mask: &MaskOptions,
    ) -> Result<CompositedFrame, RenderContextError> {
        self.resize_if_needed(frame.width, frame.height);
        self.upload_camera_frame(frame);

        let mut encoder = self.context.create_encoder();

        let orientation = crate::pose::euler_to_matrix(observation.pose.euler);
        let bbox = [observation.bbox.x, observation.bbox.y, observation.bbox.w, observation.bbox.h];
        let background_params = BackgroundParams::new(bbox, orientation, observation.present, display.pixel_size, display.debug_overlay);
        self.background.render(&self.context, &mut encoder, &self.output_view, &self.depth_view, &self.camera_view, background_params);

        if mask.enabled && observation.present {
            if let Some(geometry) = mask_geometry {
                let (model, view_proj) = placement;
                let time = self.started_at.elapsed().as_secs_f32();
                let mask_params = MaskParams::new(
                    model,
                    view_proj,
                    [mask.color[0], mask.color[1], mask.color[2], 1.0],
                    mask.style.is_sticker(),
                    mask_texture_view.is_some(),
                    time,
                );
                self.mask_overlay.render(&self.context, &mut encoder, &self.output_view, &self.depth_view, geometry, mask_texture_view, mask_params);
            }
        }

        let padded_bytes_per_row = align_up(self.width * 4, COPY_BYTES_PER_ROW_ALIGNMENT);
        let staging_buffer = self.context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Staging Buffer"),
            size: u64::from(padded_bytes_per_row) * u64::from(self.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.output_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );

        self.context.submit(encoder);

        let pixels = self.read_back(&staging_buffer, padded_bytes_per_row)?;

        Ok(CompositedFrame {
            pixels,
            width: self.width,
            height: self.height,
            timestamp_ns: frame.timestamp_ns,
        })
    }

    /// Block (bounded by the frame interval, per design spec §5: "GPU
    /// submit calls may block on command-buffer completion") until the
    /// staging buffer is mapped, then strip row padding into a pooled
    /// buffer.
    fn read_back(&mut self, staging_buffer: &wgpu::Buffer, padded_bytes_per_row: u32) -> Result<Vec<u8>, RenderContextError> {
        let (tx, rx) = mpsc::channel();
        staging_buffer.slice(..).map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.context.device.poll(wgpu::PollType::Wait);
        let map_result = rx
            .recv()
            .map_err(|_| RenderContextError::DeviceLost("readback channel closed before mapping completed".to_owned()))?;
        map_result.map_err(|e| RenderContextError::DeviceLost(e.to_string()))?;

        let mut pixels = self.pool.acquire();
        {
            let mapped = staging_buffer.slice(..).get_mapped_range();
            let row_bytes = (self.width as usize) * 4;
            for row in 0..(self.height as usize) {
                let src_start = row * (padded_bytes_per_row as usize);
                let dst_start = row * row_bytes;
                pixels[dst_start..dst_start + row_bytes].copy_from_slice(&mapped[src_start..src_start + row_bytes]);
            }
        }
        staging_buffer.unmap();
        Ok(pixels)
    }

    /// Return a readback buffer to the pool once the caller (the ring
    /// publisher or preview callback) is done with it.
    pub fn release_pixels(&mut self, pixels: Vec<u8>) {
        self.pool.release(pixels);
    }

    fn resize_if_needed(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.depth_view = Self::create_depth_view(&self.context, width, height);
        let (output_texture, output_view) = Self::create_output_texture(&self.context, width, height);
        self.output_texture = output_texture;
        self.output_view = output_view;
        let (camera_texture, camera_view) = Self::create_camera_texture(&self.context, width, height);
        self.camera_texture = camera_texture;
        self.camera_view = camera_view;
        self.pool.resize(width, height);
    }

    fn upload_camera_frame(&self, frame: &Frame<'_>) {
        self.context.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.camera_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            frame.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(frame.stride),
                rows_per_image: Some(frame.height),
            },
            wgpu::Extent3d {
                width: frame.width,
                height: frame.height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn create_depth_view(context: &RenderContext, width: u32, height: u32) -> wgpu::TextureView {
        let texture = context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Compositor Depth Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn create_output_texture(context: &RenderContext, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Compositor Output Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OUTPUT_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    fn create_camera_texture(context: &RenderContext, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = context.device.create_texture_with_data(
            &context.queue,
            &wgpu::TextureDescriptor {
                label: Some("Compositor Camera Texture"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Bgra8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &vec![0u8; (width as usize) * (height as usize) * 4],
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }
}

const fn align_up(value: u32, align: u32) -> u32 {
    (value + align - 1) / align * align
}

#[cfg(test)]
mod tests {
    use super::align_up;

    #[test]
    fn align_up_rounds_to_next_multiple() {
        assert_eq!(align_up(639 * 4, 256), 2560);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(1, 256), 256);
    }
}
