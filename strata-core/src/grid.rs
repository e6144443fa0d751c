//! # Grid Shape and Generation Addressing
//!
//! History lives in two fixed-capacity buffers, A and B, each holding `depth`
//! layers of `width x height` cells. Generation `g` is never stored at a
//! mutable "current grid" pointer; its address is derived:
//!
//! - `buffer = A` if `g` is even, `B` if odd
//! - `layer  = g >> 1`
//!
//! The pass computing generation `g + 1` therefore always reads one buffer and
//! writes the other, so a single dispatch never reads and writes the same
//! storage.

use serde::{Deserialize, Serialize};

use crate::error::{StrataError, StrataResult};

/// One of the two ping-pong generation buffers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferId {
    /// Even generations
    A,
    /// Odd generations
    B,
}

impl BufferId {
    /// The buffer holding the other parity
    pub fn other(self) -> Self {
        match self {
            BufferId::A => BufferId::B,
            BufferId::B => BufferId::A,
        }
    }

    /// 0 for A, 1 for B
    pub fn index(self) -> usize {
        match self {
            BufferId::A => 0,
            BufferId::B => 1,
        }
    }
}

/// Concrete storage address of one generation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Slot {
    pub buffer: BufferId,
    pub layer: u32,
}

/// Fixed dimensions of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    /// Cells per row
    pub width: u32,
    /// Rows per generation
    pub height: u32,
    /// Layers per buffer (D)
    pub depth: u32,
}

impl GridShape {
    pub fn new(width: u32, height: u32, depth: u32) -> StrataResult<Self> {
        if width == 0 || height == 0 {
            return Err(StrataError::config(format!(
                "grid must be at least 1x1, got {}x{}",
                width, height
            )));
        }
        if depth == 0 {
            return Err(StrataError::config("history depth must be at least 1"));
        }
        let shape = Self {
            width,
            height,
            depth,
        };
        // Whole-buffer byte offsets must fit the u32 math used by the shaders
        let buffer_bytes = shape.layer_stride_bytes() as u64 * depth as u64;
        if buffer_bytes > u32::MAX as u64 {
            return Err(StrataError::config(format!(
                "generation buffer of {} bytes exceeds 4 GiB",
                buffer_bytes
            )));
        }
        Ok(shape)
    }

    /// Cells in one generation (W*H)
    pub fn cells_per_layer(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Bytes reserved per layer, rounded up to a whole `u32` word
    pub fn layer_stride_bytes(&self) -> usize {
        (self.cells_per_layer() + 3) & !3
    }

    /// `u32` words per layer (four packed cells each)
    pub fn layer_words(&self) -> usize {
        self.layer_stride_bytes() / 4
    }

    /// Size of one generation buffer in bytes
    pub fn buffer_bytes(&self) -> usize {
        self.layer_stride_bytes() * self.depth as usize
    }

    /// Number of addressable generations (2D - 1)
    pub fn capacity(&self) -> u32 {
        2 * self.depth - 1
    }

    /// Highest generation index a run may reach (2D - 2)
    pub fn last_generation(&self) -> u32 {
        2 * self.depth - 2
    }

    /// Translate a generation index into its storage slot.
    ///
    /// Pure function of `g` and `depth`. Fails with `CapacityExceeded` when the
    /// layer falls outside the buffer.
    pub fn address_of(&self, generation: u32) -> StrataResult<Slot> {
        let layer = generation >> 1;
        if layer >= self.depth {
            return Err(StrataError::CapacityExceeded {
                generation,
                capacity: self.capacity(),
            });
        }
        let buffer = if generation % 2 == 0 {
            BufferId::A
        } else {
            BufferId::B
        };
        Ok(Slot { buffer, layer })
    }

    /// Reject a slot whose layer lies past the end of its buffer
    pub fn check_slot(&self, slot: Slot) -> StrataResult<()> {
        if slot.layer >= self.depth {
            return Err(StrataError::CapacityExceeded {
                generation: slot.layer * 2 + slot.buffer.index() as u32,
                capacity: self.capacity(),
            });
        }
        Ok(())
    }

    /// Byte offset of a layer inside its buffer
    pub fn layer_offset(&self, layer: u32) -> usize {
        layer as usize * self.layer_stride_bytes()
    }

    /// Row-major index of `(x, y)`
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parity_addressing() {
        let shape = GridShape::new(5, 5, 3).unwrap();
        let expected = [
            (BufferId::A, 0),
            (BufferId::B, 0),
            (BufferId::A, 1),
            (BufferId::B, 1),
            (BufferId::A, 2),
        ];
        for (g, (buffer, layer)) in expected.iter().enumerate() {
            let slot = shape.address_of(g as u32).unwrap();
            assert_eq!(slot.buffer, *buffer, "generation {}", g);
            assert_eq!(slot.layer, *layer, "generation {}", g);
        }
    }

    #[test]
    fn test_address_out_of_depth() {
        let shape = GridShape::new(5, 5, 3).unwrap();
        let err = shape.address_of(6).unwrap_err();
        assert!(err.is_capacity());
    }

    #[test]
    fn test_check_slot() {
        let shape = GridShape::new(5, 5, 3).unwrap();
        shape.check_slot(Slot { buffer: BufferId::B, layer: 2 }).unwrap();
        let err = shape
            .check_slot(Slot { buffer: BufferId::B, layer: 3 })
            .unwrap_err();
        assert!(matches!(err, StrataError::CapacityExceeded { generation: 7, capacity: 5 }));
    }

    #[test]
    fn test_consecutive_generations_alternate_buffers() {
        let shape = GridShape::new(4, 4, 8).unwrap();
        for g in 0..shape.last_generation() {
            let from = shape.address_of(g).unwrap();
            let to = shape.address_of(g + 1).unwrap();
            assert_eq!(from.buffer.other(), to.buffer);
        }
    }

    #[test]
    fn test_capacity() {
        let shape = GridShape::new(5, 5, 3).unwrap();
        assert_eq!(shape.capacity(), 5);
        assert_eq!(shape.last_generation(), 4);

        let single = GridShape::new(1, 1, 1).unwrap();
        assert_eq!(single.capacity(), 1);
        assert_eq!(single.last_generation(), 0);
    }

    #[test]
    fn test_layer_stride_is_word_aligned() {
        let shape = GridShape::new(5, 5, 3).unwrap();
        assert_eq!(shape.cells_per_layer(), 25);
        assert_eq!(shape.layer_stride_bytes(), 28);
        assert_eq!(shape.layer_words(), 7);
        assert_eq!(shape.buffer_bytes(), 84);
        assert_eq!(shape.layer_offset(2), 56);
    }

    #[test]
    fn test_rejects_empty_shapes() {
        assert!(GridShape::new(0, 5, 3).is_err());
        assert!(GridShape::new(5, 0, 3).is_err());
        assert!(GridShape::new(5, 5, 0).is_err());
    }
}
