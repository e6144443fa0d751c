//! # CPU Backend
//!
//! Generation store in host memory, updated in parallel with Rayon.
//!
//! This backend is ideal for:
//! - Development and debugging
//! - Systems without a GPU adapter
//! - Reference output for the GPU backend
//!
//! Buffers use the same layout as the device buffers (word-aligned layers),
//! so the two backends agree byte for byte.

use std::time::Instant;

use rayon::prelude::*;

use strata_core::brush::BrushStamp;
use strata_core::cell::ALIVE;
use strata_core::config::StrataConfig;
use strata_core::error::{StrataError, StrataResult};
use strata_core::frame::{self, Frame};
use strata_core::grid::{GridShape, Slot};
use strata_core::rule::{self, RuleParams};
use strata_core::traits::{BackendStats, GenerationBackend};

/// CPU generation backend using Rayon
pub struct CpuBackend {
    /// Fixed dimensions
    shape: GridShape,

    /// Buffer A (even generations) and buffer B (odd generations)
    buffers: [Vec<u8>; 2],

    /// Statistics
    stats: BackendStats,
}

impl CpuBackend {
    /// Allocate both buffers zero-initialized
    pub fn new(config: &StrataConfig) -> StrataResult<Self> {
        let shape = config.shape()?;
        let bytes = shape.buffer_bytes();
        tracing::info!(
            "🧮 CPU: Allocating 2 x {} KB for {}x{} cells, {} layers per buffer",
            bytes / 1024,
            shape.width,
            shape.height,
            shape.depth
        );

        Ok(Self {
            shape,
            buffers: [vec![0; bytes], vec![0; bytes]],
            stats: BackendStats {
                buffer_bytes: 2 * bytes as u64,
                ..Default::default()
            },
        })
    }

    fn layer(&self, slot: Slot) -> &[u8] {
        let offset = self.shape.layer_offset(slot.layer);
        &self.buffers[slot.buffer.index()][offset..offset + self.shape.cells_per_layer()]
    }

    fn layer_mut(&mut self, slot: Slot) -> &mut [u8] {
        let offset = self.shape.layer_offset(slot.layer);
        let len = self.shape.cells_per_layer();
        &mut self.buffers[slot.buffer.index()][offset..offset + len]
    }
}

impl GenerationBackend for CpuBackend {
    fn shape(&self) -> GridShape {
        self.shape
    }

    fn write_layer(&mut self, slot: Slot, cells: &[u8]) -> StrataResult<()> {
        self.shape.check_slot(slot)?;
        if cells.len() != self.shape.cells_per_layer() {
            return Err(StrataError::config(format!(
                "layer needs {} cells, got {}",
                self.shape.cells_per_layer(),
                cells.len()
            )));
        }
        self.layer_mut(slot).copy_from_slice(cells);
        Ok(())
    }

    fn stamp(&mut self, slot: Slot, stamp: &BrushStamp) -> StrataResult<()> {
        self.shape.check_slot(slot)?;
        let shape = self.shape;
        let (y0, y1) = stamp.row_span(&shape);
        let (x0, x1) = stamp.column_span(&shape);
        let width = shape.width as usize;

        let layer = self.layer_mut(slot);
        layer[y0 as usize * width..(y1 as usize + 1) * width]
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(dy, row)| {
                let y = y0 + dy as u32;
                for x in x0..=x1 {
                    if stamp.covers(x, y) {
                        row[x as usize] = ALIVE;
                    }
                }
            });

        self.stats.stamps_applied += 1;
        Ok(())
    }

    fn step(&mut self, from: Slot, to: Slot, rule: &RuleParams) -> StrataResult<()> {
        self.shape.check_slot(from)?;
        self.shape.check_slot(to)?;
        if from.buffer == to.buffer {
            return Err(StrataError::config("step must read and write different buffers"));
        }

        let start = Instant::now();
        let shape = self.shape;
        let width = shape.width as usize;
        let len = shape.cells_per_layer();
        let src_offset = shape.layer_offset(from.layer);
        let dst_offset = shape.layer_offset(to.layer);

        let [a, b] = &mut self.buffers;
        let (src, dst) = match from.buffer.index() {
            0 => (&a[..], &mut b[..]),
            _ => (&b[..], &mut a[..]),
        };
        let src = &src[src_offset..src_offset + len];
        let dst = &mut dst[dst_offset..dst_offset + len];

        dst.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                *out = rule::evolve_cell(src, &shape, x as u32, y as u32, rule);
            }
        });

        self.stats.generations_computed += 1;
        self.stats.last_step_us = start.elapsed().as_micros() as u64;
        tracing::debug!(
            "🧮 CPU step {:?}[{}] -> {:?}[{}] in {}us",
            from.buffer,
            from.layer,
            to.buffer,
            to.layer,
            self.stats.last_step_us
        );
        Ok(())
    }

    fn read_layer(&mut self, slot: Slot) -> StrataResult<Vec<u8>> {
        self.shape.check_slot(slot)?;
        let out = self.layer(slot).to_vec();
        self.stats.bytes_read_back += out.len() as u64;
        Ok(out)
    }

    fn composite(&mut self, slot: Slot, target: &mut Frame) -> StrataResult<()> {
        self.shape.check_slot(slot)?;
        let (fw, fh) = (target.width(), target.height());
        if fw == 0 || fh == 0 {
            return Ok(());
        }
        let shape = self.shape;
        let columns: Vec<u32> = (0..fw)
            .map(|px| frame::sample_cell(px, fw, shape.width))
            .collect();
        let layer = self.layer(slot);

        target
            .pixels_mut()
            .par_chunks_mut(fw as usize * 4)
            .enumerate()
            .for_each(|(py, row)| {
                let cy = frame::sample_cell(py as u32, fh, shape.height);
                frame::composite_row(layer, &shape, cy, &columns, row);
            });
        Ok(())
    }

    fn stats(&self) -> BackendStats {
        self.stats.clone()
    }

    fn sync(&mut self) -> StrataResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "CPU (Rayon)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::cell::DEAD;
    use strata_core::grid::BufferId;
    use strata_core::rule::EdgeMode;

    fn backend(w: u32, h: u32, d: u32) -> CpuBackend {
        CpuBackend::new(&StrataConfig::with_grid(w, h, d)).unwrap()
    }

    fn slot(buffer: BufferId, layer: u32) -> Slot {
        Slot { buffer, layer }
    }

    fn clamp_rule() -> RuleParams {
        RuleParams {
            threshold: 128,
            edge_mode: EdgeMode::Clamp,
        }
    }

    #[test]
    fn test_allocation_is_zeroed() {
        let mut cpu = backend(5, 5, 3);
        for layer in 0..3 {
            assert!(cpu.read_layer(slot(BufferId::A, layer)).unwrap().iter().all(|&v| v == DEAD));
            assert!(cpu.read_layer(slot(BufferId::B, layer)).unwrap().iter().all(|&v| v == DEAD));
        }
        assert_eq!(cpu.stats().buffer_bytes, 2 * 28 * 3);
    }

    #[test]
    fn test_stamp_touches_only_its_slot() {
        let mut cpu = backend(6, 6, 2);
        let stamp = BrushStamp {
            center_x: 2,
            center_y: 2,
            radius: 1.5,
        };
        cpu.stamp(slot(BufferId::A, 1), &stamp).unwrap();

        let painted = cpu.read_layer(slot(BufferId::A, 1)).unwrap();
        assert_eq!(painted.iter().filter(|&&v| v == ALIVE).count(), 9);
        assert!(cpu.read_layer(slot(BufferId::A, 0)).unwrap().iter().all(|&v| v == DEAD));
        assert!(cpu.read_layer(slot(BufferId::B, 1)).unwrap().iter().all(|&v| v == DEAD));
    }

    #[test]
    fn test_step_rejects_same_buffer() {
        let mut cpu = backend(3, 3, 2);
        let err = cpu
            .step(slot(BufferId::A, 0), slot(BufferId::A, 1), &clamp_rule())
            .unwrap_err();
        assert!(matches!(err, StrataError::Config(_)));
    }

    #[test]
    fn test_slot_beyond_depth_is_capacity_error() {
        let mut cpu = backend(3, 3, 2);
        assert!(cpu.read_layer(slot(BufferId::B, 2)).unwrap_err().is_capacity());
    }

    #[test]
    fn test_write_layer_length_checked() {
        let mut cpu = backend(3, 3, 1);
        assert!(cpu.write_layer(slot(BufferId::A, 0), &[0; 8]).is_err());
        cpu.write_layer(slot(BufferId::A, 0), &[ALIVE; 9]).unwrap();
        assert_eq!(cpu.read_layer(slot(BufferId::A, 0)).unwrap(), vec![ALIVE; 9]);
    }

    #[test]
    fn test_composite_matches_layer_at_native_size() {
        let mut cpu = backend(4, 2, 1);
        let cells = [0, 255, 130, 0, 255, 0, 0, 7];
        cpu.write_layer(slot(BufferId::A, 0), &cells).unwrap();

        let mut target = Frame::new(4, 2);
        cpu.composite(slot(BufferId::A, 0), &mut target).unwrap();
        for y in 0..2 {
            for x in 0..4 {
                assert_eq!(target.luma(x, y), cells[(y * 4 + x) as usize]);
            }
        }
    }
}
