//! Device-to-host transfers and the compositor
//!
//! Readback is the only place the host waits on the device. Everything here
//! blocks until the copy has landed in a mapped staging buffer.
//!
//! Caller-sized work is split to fit device limits: layer reads go through
//! staging buffers no larger than `staging_limit`, and frames wider or taller
//! than `tile_limit` are composited tile by tile.

use strata_core::error::{StrataError, StrataResult};
use strata_core::frame::Frame;
use strata_core::grid::Slot;

use super::config::ViewParams;
use super::GpuBackend;

/// Offscreen format used by `composite`; unorm so grey levels round-trip
const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// One rectangle of a tiled frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Tile {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

/// Cover a `width x height` frame with tiles of at most `max_width x max_height`
fn tiles(width: u32, height: u32, max_width: u32, max_height: u32) -> Vec<Tile> {
    let mut out = Vec::new();
    for y in (0..height).step_by(max_height.max(1) as usize) {
        for x in (0..width).step_by(max_width.max(1) as usize) {
            out.push(Tile {
                x,
                y,
                width: (width - x).min(max_width),
                height: (height - y).min(max_height),
            });
        }
    }
    out
}

/// Layers of `stride` bytes that fit one staging buffer of `limit` bytes
fn slots_per_batch(stride: u64, limit: u64) -> usize {
    (limit / stride.max(1)).max(1) as usize
}

/// Bytes per texture row once padded for `copy_texture_to_buffer`
fn padded_row_bytes(width: u32) -> u32 {
    (width * 4).div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT
}

impl GpuBackend {
    /// Copy the given slots to the host, concatenated in order
    pub(super) fn read_slots(&mut self, slots: &[Slot]) -> StrataResult<Vec<u8>> {
        for slot in slots {
            self.shape.check_slot(*slot)?;
        }

        let stride = self.shape.layer_stride_bytes() as u64;
        let mut out = Vec::with_capacity(self.shape.cells_per_layer() * slots.len());
        for batch in slots.chunks(slots_per_batch(stride, self.staging_limit)) {
            self.read_batch(batch, &mut out)?;
        }
        Ok(out)
    }

    /// One staging round trip for a batch that fits `staging_limit`
    fn read_batch(&mut self, slots: &[Slot], out: &mut Vec<u8>) -> StrataResult<()> {
        let stride = self.shape.layer_stride_bytes() as u64;
        let cells = self.shape.cells_per_layer();

        // Multi-slot batches get a staging buffer of their own
        let batch;
        let staging = if slots.len() == 1 {
            &self.buffers.staging
        } else {
            batch = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Batch Staging"),
                size: stride * slots.len() as u64,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            &batch
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        for (i, slot) in slots.iter().enumerate() {
            encoder.copy_buffer_to_buffer(
                &self.buffers.cells[slot.buffer.index()],
                self.shape.layer_offset(slot.layer) as u64,
                staging,
                i as u64 * stride,
                stride,
            );
        }
        self.queue.submit(Some(encoder.finish()));

        map_staging(&self.device, staging, |data| {
            for chunk in data.chunks_exact(stride as usize) {
                out.extend_from_slice(&chunk[..cells]);
            }
        })?;

        self.stats.bytes_read_back += stride * slots.len() as u64;
        Ok(())
    }

    /// Render `slot` into offscreen tiles covering `frame`, copying each one back
    pub(super) fn composite_offscreen(
        &mut self,
        slot: Slot,
        frame: &mut Frame,
    ) -> StrataResult<()> {
        let (width, height) = (frame.width(), frame.height());
        let max_dim = self.tile_limit.max(1);
        // Keep each tile's padded copy inside one staging buffer
        let rows_per_staging = self.staging_limit / padded_row_bytes(max_dim.min(width)) as u64;
        let max_rows = max_dim.min(rows_per_staging.clamp(1, u32::MAX as u64) as u32);

        let plan = tiles(width, height, max_dim, max_rows);
        if plan.len() > 1 {
            tracing::debug!(
                "🎮 Compositing {}x{} frame in {} tiles",
                width,
                height,
                plan.len()
            );
        }
        for tile in plan {
            self.composite_tile(slot, frame, tile)?;
        }
        Ok(())
    }

    fn composite_tile(&mut self, slot: Slot, frame: &mut Frame, tile: Tile) -> StrataResult<()> {
        let size = wgpu::Extent3d {
            width: tile.width,
            height: tile.height,
            depth_or_array_layers: 1,
        };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Composite Target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let params = ViewParams::new(
            &self.shape,
            slot,
            (frame.width(), frame.height()),
            (tile.x, tile.y),
        );
        self.draw_composite(slot, &view, OFFSCREEN_FORMAT, &params)?;

        // Texture copies need rows aligned to 256 bytes
        let row_bytes = tile.width as usize * 4;
        let padded_row = padded_row_bytes(tile.width);
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Composite Staging"),
            size: padded_row as u64 * tile.height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Composite Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(tile.height),
                },
            },
            size,
        );
        self.queue.submit(Some(encoder.finish()));

        let frame_row = frame.width() as usize * 4;
        let left = tile.x as usize * 4;
        let pixels = frame.pixels_mut();
        map_staging(&self.device, &staging, |data| {
            let rows = pixels
                .chunks_exact_mut(frame_row)
                .skip(tile.y as usize)
                .zip(data.chunks_exact(padded_row as usize));
            for (dst, src) in rows {
                dst[left..left + row_bytes].copy_from_slice(&src[..row_bytes]);
            }
        })?;

        self.stats.bytes_read_back += padded_row as u64 * tile.height as u64;
        Ok(())
    }

    /// Draw `slot` as greyscale into any `width x height` color target.
    ///
    /// Front ends owning a surface call this with the surface texture view;
    /// the pipeline for `format` is built on first use and cached.
    pub fn render_to_view(
        &mut self,
        slot: Slot,
        view: &wgpu::TextureView,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> StrataResult<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        let params = ViewParams::new(&self.shape, slot, (width, height), (0, 0));
        self.draw_composite(slot, view, format, &params)
    }

    fn draw_composite(
        &mut self,
        slot: Slot,
        view: &wgpu::TextureView,
        format: wgpu::TextureFormat,
        params: &ViewParams,
    ) -> StrataResult<()> {
        self.shape.check_slot(slot)?;
        self.prepare_composite_pipeline(format);
        let pipeline = self
            .composite_pipelines
            .get(&format)
            .ok_or_else(|| StrataError::gpu("Composite pipeline not built"))?;

        self.queue
            .write_buffer(&self.buffers.view_params, 0, bytemuck::bytes_of(params));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Composite Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Composite"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.bind_groups.view[slot.buffer.index()], &[]);
            pass.draw(0..3, 0..1);
        }
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }
}

/// Map a staging buffer, hand its contents to `read`, unmap
fn map_staging(
    device: &wgpu::Device,
    staging: &wgpu::Buffer,
    read: impl FnOnce(&[u8]),
) -> StrataResult<()> {
    let buffer_slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    let _ = device.poll(wgpu::PollType::Wait {
        submission_index: None, // Wait for most recent submission
        timeout: None,          // Wait indefinitely
    });

    rx.recv()
        .map_err(|e| StrataError::gpu(format!("Failed to receive map result: {}", e)))?
        .map_err(|e| StrataError::gpu(format!("Failed to map buffer: {:?}", e)))?;

    {
        let data = buffer_slice.get_mapped_range();
        read(&data);
    }

    staging.unmap();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiles_cover_frame_once() {
        let plan = tiles(9000, 2, 8192, 8192);
        assert_eq!(
            plan,
            vec![
                Tile { x: 0, y: 0, width: 8192, height: 2 },
                Tile { x: 8192, y: 0, width: 808, height: 2 },
            ]
        );

        let plan = tiles(7, 5, 3, 2);
        assert_eq!(plan.len(), 9);
        let area: u32 = plan.iter().map(|t| t.width * t.height).sum();
        assert_eq!(area, 35);
        assert_eq!(plan.last(), Some(&Tile { x: 6, y: 4, width: 1, height: 1 }));
    }

    #[test]
    fn test_single_tile_when_within_limit() {
        assert_eq!(tiles(640, 480, 8192, 8192).len(), 1);
    }

    #[test]
    fn test_batches_respect_staging_limit() {
        assert_eq!(slots_per_batch(28, 100), 3);
        // A single layer always fits, since it fits the generation buffer
        assert_eq!(slots_per_batch(28, 10), 1);
    }

    #[test]
    fn test_padded_rows() {
        assert_eq!(padded_row_bytes(1), 256);
        assert_eq!(padded_row_bytes(64), 256);
        assert_eq!(padded_row_bytes(65), 512);
    }
}
