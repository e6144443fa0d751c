//! # Frame - Host-Side Pixel Surface
//!
//! Backends composite into a caller-sized RGBA8 surface. The frame's
//! resolution is independent of the grid: each pixel samples the cell under
//! its centre (nearest neighbour), and the cell byte becomes a grey level.

use crate::grid::GridShape;

/// RGBA8 pixel surface of arbitrary resolution
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// Create a black, opaque frame
    pub fn new(width: u32, height: u32) -> Self {
        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        for px in pixels.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// RGBA value at `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Grey level at `(x, y)`
    pub fn luma(&self, x: u32, y: u32) -> u8 {
        self.pixels[(y as usize * self.width as usize + x as usize) * 4]
    }
}

/// Grid cell sampled by pixel `p` of an axis with `pixels` samples over `cells` cells
#[inline]
pub fn sample_cell(p: u32, pixels: u32, cells: u32) -> u32 {
    let uv = (p as f32 + 0.5) / pixels as f32;
    ((uv * cells as f32) as u32).min(cells - 1)
}

/// Composite a single pixel row sampling grid row `cy`
pub fn composite_row(layer: &[u8], shape: &GridShape, cy: u32, columns: &[u32], row: &mut [u8]) {
    for (px, &cx) in row.chunks_exact_mut(4).zip(columns) {
        let v = layer[shape.index(cx, cy)];
        px.copy_from_slice(&[v, v, v, 255]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_frame_is_black_and_opaque() {
        let frame = Frame::new(2, 3);
        assert_eq!(frame.pixels().len(), 24);
        assert_eq!(frame.pixel(1, 2), [0, 0, 0, 255]);
    }

    #[test]
    fn test_sample_cell_identity_when_sizes_match() {
        for p in 0..7 {
            assert_eq!(sample_cell(p, 7, 7), p);
        }
    }

    #[test]
    fn test_upscale_repeats_cells() {
        let shape = GridShape::new(2, 1, 1).unwrap();
        let layer = [0u8, 200];
        let columns: Vec<u32> = (0..4).map(|px| sample_cell(px, 4, shape.width)).collect();
        assert_eq!(columns, vec![0, 0, 1, 1]);

        let mut row = [0u8; 16];
        composite_row(&layer, &shape, 0, &columns, &mut row);
        assert_eq!(&row[..8], &[0, 0, 0, 255, 0, 0, 0, 255]);
        assert_eq!(&row[8..], &[200, 200, 200, 255, 200, 200, 200, 255]);
    }
}
