//! # Traits - The Generation Store Seam
//!
//! `GenerationBackend` owns the two ping-pong buffers and performs every
//! operation that touches cell memory. The session decides *which* slots an
//! operation may touch; a backend only executes it. This allows the same run
//! to live in host memory (Rayon) or device memory (wgpu).

use crate::brush::BrushStamp;
use crate::error::StrataResult;
use crate::frame::Frame;
use crate::grid::{GridShape, Slot};
use crate::rule::RuleParams;

/// Storage and compute backend for one run
///
/// Implementations allocate both buffers zero-initialized at construction.
/// Every method either completes fully or fails without writing.
pub trait GenerationBackend: Send {
    /// Dimensions this backend was allocated with
    fn shape(&self) -> GridShape;

    /// Overwrite one slot with `W*H` bytes
    fn write_layer(&mut self, slot: Slot, cells: &[u8]) -> StrataResult<()>;

    /// Set every cell covered by `stamp` in `slot` to alive
    fn stamp(&mut self, slot: Slot, stamp: &BrushStamp) -> StrataResult<()>;

    /// Evaluate the rule on `from` and write the whole result into `to`.
    ///
    /// `from` and `to` always live in different buffers.
    fn step(&mut self, from: Slot, to: Slot, rule: &RuleParams) -> StrataResult<()>;

    /// Blocking copy of one slot to the host (exactly `W*H` bytes)
    fn read_layer(&mut self, slot: Slot) -> StrataResult<Vec<u8>>;

    /// Blocking copy of several slots, concatenated in the given order
    fn read_layers(&mut self, slots: &[Slot]) -> StrataResult<Vec<u8>> {
        let mut out = Vec::with_capacity(slots.len() * self.shape().cells_per_layer());
        for slot in slots {
            out.extend_from_slice(&self.read_layer(*slot)?);
        }
        Ok(out)
    }

    /// Render one slot into `frame` as greyscale
    fn composite(&mut self, slot: Slot, frame: &mut Frame) -> StrataResult<()>;

    /// Get statistics about the work done so far
    fn stats(&self) -> BackendStats;

    /// Wait for queued work to finish
    fn sync(&mut self) -> StrataResult<()>;

    /// Name of this backend (for logging)
    fn name(&self) -> &'static str;
}

impl<T: GenerationBackend + ?Sized> GenerationBackend for Box<T> {
    fn shape(&self) -> GridShape {
        (**self).shape()
    }

    fn write_layer(&mut self, slot: Slot, cells: &[u8]) -> StrataResult<()> {
        (**self).write_layer(slot, cells)
    }

    fn stamp(&mut self, slot: Slot, stamp: &BrushStamp) -> StrataResult<()> {
        (**self).stamp(slot, stamp)
    }

    fn step(&mut self, from: Slot, to: Slot, rule: &RuleParams) -> StrataResult<()> {
        (**self).step(from, to, rule)
    }

    fn read_layer(&mut self, slot: Slot) -> StrataResult<Vec<u8>> {
        (**self).read_layer(slot)
    }

    fn read_layers(&mut self, slots: &[Slot]) -> StrataResult<Vec<u8>> {
        (**self).read_layers(slots)
    }

    fn composite(&mut self, slot: Slot, frame: &mut Frame) -> StrataResult<()> {
        (**self).composite(slot, frame)
    }

    fn stats(&self) -> BackendStats {
        (**self).stats()
    }

    fn sync(&mut self) -> StrataResult<()> {
        (**self).sync()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Statistics from a generation backend
#[derive(Clone, Debug, Default)]
pub struct BackendStats {
    /// Step passes executed
    pub generations_computed: u64,

    /// Brush stamps applied
    pub stamps_applied: u64,

    /// Bytes copied back to the host
    pub bytes_read_back: u64,

    /// Time spent on the last step (microseconds)
    pub last_step_us: u64,

    /// Memory held by the two generation buffers
    pub buffer_bytes: u64,
}
