//! 2D cell-centered grids and the double-buffer ("ping-pong") discipline.
//!
//! Every solver field is a [`Grid2`]: a W x H rectangle of cells, each holding
//! a fixed number of f32 channels (1 = scalar, 2 = vector, 3 = color). Fields
//! that are both read and written within one pass are wrapped in
//! [`DoubleBuffered`], which enforces that reads target the current buffer and
//! writes target the next, with an explicit flip between passes.

use glam::Vec2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Rectangular grid of fixed-channel-count f32 cells, row-major from the
/// bottom-left corner (j increases upward). Dimensions are fixed at
/// construction and never change.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Grid2 {
    /// Number of cells in X
    pub width: usize,
    /// Number of cells in Y
    pub height: usize,
    /// f32 channels per cell (1, 2, or 3)
    pub channels: usize,
    data: Vec<f32>,
}

impl Grid2 {
    /// Create a zero-filled grid.
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        assert!(
            (1..=3).contains(&channels),
            "channel count must be 1..=3, got {}",
            channels
        );
        Self {
            width,
            height,
            channels,
            data: vec![0.0; width * height * channels],
        }
    }

    /// Get immutable access to the raw cell data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Get mutable access to the raw cell data.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    // ========== Index functions ==========

    /// Offset of cell (i, j)'s first channel in the data slice.
    #[inline]
    pub fn cell_index(&self, i: usize, j: usize) -> usize {
        (j * self.width + i) * self.channels
    }

    /// Offset of cell (i, j) with signed indices clamped to the grid
    /// (the edge-clamped addressing used by every stencil and sample).
    #[inline]
    pub fn clamped_index(&self, i: i32, j: i32) -> usize {
        let ci = i.clamp(0, self.width as i32 - 1) as usize;
        let cj = j.clamp(0, self.height as i32 - 1) as usize;
        self.cell_index(ci, cj)
    }

    /// Cell (i, j) as a channel slice.
    #[inline]
    pub fn at(&self, i: usize, j: usize) -> &[f32] {
        let base = self.cell_index(i, j);
        &self.data[base..base + self.channels]
    }

    /// Channel `c` of cell (i, j), edge-clamped.
    #[inline]
    pub fn value(&self, i: i32, j: i32, c: usize) -> f32 {
        self.data[self.clamped_index(i, j) + c]
    }

    // ========== Sampling ==========

    /// Bilinear sample at an arbitrary position, cell centers at integer
    /// coordinates, edge-clamped outside the grid. Writes one value per
    /// channel into `out`.
    pub fn sample_into(&self, pos: Vec2, out: &mut [f32]) {
        debug_assert_eq!(out.len(), self.channels);
        let i0 = pos.x.floor() as i32;
        let j0 = pos.y.floor() as i32;
        let tx = pos.x - i0 as f32;
        let ty = pos.y - j0 as f32;

        let b00 = self.clamped_index(i0, j0);
        let b10 = self.clamped_index(i0 + 1, j0);
        let b01 = self.clamped_index(i0, j0 + 1);
        let b11 = self.clamped_index(i0 + 1, j0 + 1);

        for c in 0..self.channels {
            let bottom = self.data[b00 + c] * (1.0 - tx) + self.data[b10 + c] * tx;
            let top = self.data[b01 + c] * (1.0 - tx) + self.data[b11 + c] * tx;
            out[c] = bottom * (1.0 - ty) + top * ty;
        }
    }

    // ========== Kernel executor ==========

    /// Compute every cell of this grid from a per-cell kernel, in parallel
    /// across rows.
    ///
    /// The kernel receives (i, j) and the destination cell's channel slice.
    /// It must read only from *other* grids (or captured parameters), never
    /// from this grid: no cell's output may depend on another output of the
    /// same invocation. That independence is what makes the map safe to run
    /// in any order or fully in parallel.
    pub fn fill_par<F>(&mut self, kernel: F)
    where
        F: Fn(usize, usize, &mut [f32]) + Sync,
    {
        let width = self.width;
        let channels = self.channels;
        self.data
            .par_chunks_mut(width * channels)
            .enumerate()
            .for_each(|(j, row)| {
                for (i, cell) in row.chunks_exact_mut(channels).enumerate() {
                    kernel(i, j, cell);
                }
            });
    }

    /// Reset every channel of every cell to zero.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }
}

/// Two identically-shaped grids plus a bit selecting which is readable.
///
/// Within one pass all reads go through [`current`](Self::current) and all
/// writes through the mutable half of [`split`](Self::split); after the pass
/// the caller flips. Nothing else may touch the pair while a flip is pending.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DoubleBuffered {
    bufs: [Grid2; 2],
    current: usize,
}

impl DoubleBuffered {
    /// Create a pair from one grid; both buffers start as copies of it.
    pub fn new(grid: Grid2) -> Self {
        Self {
            bufs: [grid.clone(), grid],
            current: 0,
        }
    }

    /// The readable buffer.
    #[inline]
    pub fn current(&self) -> &Grid2 {
        &self.bufs[self.current]
    }

    /// Mutable access to the readable buffer. Only for out-of-pipeline
    /// mutation (seeding at construction, clearing before a solve) — passes
    /// must write through [`split`](Self::split).
    #[inline]
    pub fn current_mut(&mut self) -> &mut Grid2 {
        &mut self.bufs[self.current]
    }

    /// Borrow (readable, writable) halves simultaneously for one pass.
    #[inline]
    pub fn split(&mut self) -> (&Grid2, &mut Grid2) {
        let (a, b) = self.bufs.split_at_mut(1);
        if self.current == 0 {
            (&a[0], &mut b[0])
        } else {
            (&b[0], &mut a[0])
        }
    }

    /// Exchange the roles of the two buffers. Call exactly once after every
    /// pass that wrote the pair.
    #[inline]
    pub fn flip(&mut self) {
        self.current = 1 - self.current;
    }
}
