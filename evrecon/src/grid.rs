//! Dense 2D grids and the per-pixel parallel primitive.
//!
//! Every piece of engine state is a [`Grid`] of the same [`Dimensions`].
//! Grids are stored row-major so a row maps onto one contiguous chunk, which
//! is what rayon's `par_chunks_mut` splits the work along.
//!
//! ```text
//!   x →  0   1   2  ...  width-1
//! y 0  [ 0 ][ 1 ][ 2 ] ...
//! ↓ 1  [ w ][w+1][w+2] ...
//! ```

use rayon::prelude::*;

/// Sensor dimensions shared by every grid in the engine.
///
/// Coordinates are `u16` to match the event-camera address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u16,
    pub height: u16,
}

impl Dimensions {
    /// Create a new set of dimensions.
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether `(x, y)` addresses a pixel of the sensor.
    pub fn contains(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    /// Whether either side is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A fixed-size, row-major 2D buffer.
///
/// The size is set at construction and never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Copy + Send + Sync> Grid<T> {
    /// Allocate a grid filled with `value`.
    pub fn new(dimensions: Dimensions, value: T) -> Self {
        Self {
            width: dimensions.width as usize,
            height: dimensions.height as usize,
            data: vec![value; dimensions.pixel_count()],
        }
    }

    /// Build a grid from row-major values.
    ///
    /// Returns `None` if `data` does not hold exactly `width × height` values.
    pub fn from_vec(dimensions: Dimensions, data: Vec<T>) -> Option<Self> {
        if data.len() != dimensions.pixel_count() {
            return None;
        }
        Some(Self {
            width: dimensions.width as usize,
            height: dimensions.height as usize,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width as u16, self.height as u16)
    }

    /// Flat index of `(x, y)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Value at `(x, y)`, or `None` outside the grid.
    pub fn get(&self, x: usize, y: usize) -> Option<T> {
        if x < self.width && y < self.height {
            Some(self.data[self.index(x, y)])
        } else {
            None
        }
    }

    /// Mutable reference to `(x, y)`, or `None` outside the grid.
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            Some(&mut self.data[idx])
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Overwrite every pixel with `value`.
    pub fn fill(&mut self, value: T) {
        self.data.par_iter_mut().for_each(|v| *v = value);
    }

    /// Whether `other` has the same width and height.
    pub fn same_shape<U>(&self, other: &Grid<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Run `f(x, y, value)` for every pixel, in parallel across rows.
    ///
    /// `f` must only depend on its arguments and on shared read-only data;
    /// pixels are visited in an unspecified order.
    pub fn for_each_pixel_mut<F>(&mut self, f: F)
    where
        F: Fn(usize, usize, &mut T) + Send + Sync,
    {
        let width = self.width;
        self.data
            .par_chunks_mut(width.max(1))
            .enumerate()
            .for_each(|(y, row)| {
                for (x, value) in row.iter_mut().enumerate() {
                    f(x, y, value);
                }
            });
    }
}
