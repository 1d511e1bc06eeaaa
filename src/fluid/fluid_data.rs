use std::fmt;
use std::ops::{Add, Mul, Sub};

use bytemuck::Pod;
use glam::{Vec2, Vec3, Vec4};
use rayon::prelude::*;

use crate::error::{FluidError, FluidResult};

/// Fixed-width numeric tuple stored per grid cell
pub trait Texel:
    Copy
    + Default
    + Send
    + Sync
    + PartialEq
    + fmt::Debug
    + Pod
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f32, Output = Self>
    + 'static
{
    const ZERO: Self;
    const CHANNELS: usize;

    /// Read one channel (0-based)
    fn channel(self, index: usize) -> f32;

    /// Build from channel values; missing channels are zero
    fn from_channels(values: &[f32]) -> Self;

    /// Euclidean length over all channels
    fn length(self) -> f32;

    fn is_finite(self) -> bool;

    /// Scale this value against a boundary with the given normal.
    ///
    /// Scalars are scaled as a whole. Vectors override this to scale only the
    /// normal component.
    fn boundary_scale(self, _normal: Vec2, factor: f32) -> Self {
        self * factor
    }
}

impl Texel for f32 {
    const ZERO: Self = 0.0;
    const CHANNELS: usize = 1;

    fn channel(self, index: usize) -> f32 {
        if index == 0 { self } else { 0.0 }
    }

    fn from_channels(values: &[f32]) -> Self {
        values.first().copied().unwrap_or(0.0)
    }

    fn length(self) -> f32 {
        self.abs()
    }

    fn is_finite(self) -> bool {
        f32::is_finite(self)
    }
}

impl Texel for Vec2 {
    const ZERO: Self = Vec2::ZERO;
    const CHANNELS: usize = 2;

    fn channel(self, index: usize) -> f32 {
        match index {
            0 => self.x,
            1 => self.y,
            _ => 0.0,
        }
    }

    fn from_channels(values: &[f32]) -> Self {
        let mut v = [0.0; 2];
        for (dst, src) in v.iter_mut().zip(values) {
            *dst = *src;
        }
        Vec2::from_array(v)
    }

    fn length(self) -> f32 {
        Vec2::length(self)
    }

    fn is_finite(self) -> bool {
        Vec2::is_finite(self)
    }

    fn boundary_scale(self, normal: Vec2, factor: f32) -> Self {
        let n = normal.normalize_or_zero();
        if n == Vec2::ZERO {
            return self * factor;
        }
        let normal_part = n * self.dot(n);
        let tangent_part = self - normal_part;
        normal_part * factor + tangent_part * factor.abs()
    }
}

impl Texel for Vec3 {
    const ZERO: Self = Vec3::ZERO;
    const CHANNELS: usize = 3;

    fn channel(self, index: usize) -> f32 {
        match index {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => 0.0,
        }
    }

    fn from_channels(values: &[f32]) -> Self {
        let mut v = [0.0; 3];
        for (dst, src) in v.iter_mut().zip(values) {
            *dst = *src;
        }
        Vec3::from_array(v)
    }

    fn length(self) -> f32 {
        Vec3::length(self)
    }

    fn is_finite(self) -> bool {
        Vec3::is_finite(self)
    }
}

impl Texel for Vec4 {
    const ZERO: Self = Vec4::ZERO;
    const CHANNELS: usize = 4;

    fn channel(self, index: usize) -> f32 {
        match index {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            3 => self.w,
            _ => 0.0,
        }
    }

    fn from_channels(values: &[f32]) -> Self {
        let mut v = [0.0; 4];
        for (dst, src) in v.iter_mut().zip(values) {
            *dst = *src;
        }
        Vec4::from_array(v)
    }

    fn length(self) -> f32 {
        Vec4::length(self)
    }

    fn is_finite(self) -> bool {
        Vec4::is_finite(self)
    }
}

/// Storage format of a field group (component count, 32-bit float precision)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexelFormat {
    R32F,
    Rg32F,
    Rgb32F,
    Rgba32F,
}

impl TexelFormat {
    /// Number of components per cell
    pub fn channels(&self) -> usize {
        match self {
            TexelFormat::R32F => 1,
            TexelFormat::Rg32F => 2,
            TexelFormat::Rgb32F => 3,
            TexelFormat::Rgba32F => 4,
        }
    }
}

/// Fixed-resolution 2D grid of texels, row-major
#[derive(Clone, PartialEq)]
pub struct Field<T: Texel> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Texel> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &T::CHANNELS)
            .finish()
    }
}

impl<T: Texel> Field<T> {
    /// Create a zero-initialized field. A zero-sized field is allowed and
    /// reads as zero everywhere.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::ZERO; width * height],
        }
    }

    /// Create a field by evaluating `f` for every cell
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> T + Sync) -> Self {
        let mut field = Self::new(width, height);
        field.compute(f);
        field
    }

    /// Wrap existing row-major data
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> FluidResult<Self> {
        if data.len() != width * height {
            return Err(FluidError::DataLength {
                expected: width * height,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Grid dimensions as (width, height)
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cell index from coordinates
    pub fn index(&self, x: usize, y: usize) -> usize {
        x + y * self.width
    }

    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let i = self.index(x, y);
        self.data[i] = value;
    }

    /// Read a cell with clamp-to-edge addressing
    pub fn at(&self, x: isize, y: isize) -> T {
        if self.is_empty() {
            return T::ZERO;
        }
        let cx = x.clamp(0, self.width as isize - 1) as usize;
        let cy = y.clamp(0, self.height as isize - 1) as usize;
        self.data[cx + cy * self.width]
    }

    /// Bilinear sample at a position in cell coordinates (cell centers on
    /// integers), clamped to the edge of the grid
    pub fn sample(&self, pos: Vec2) -> T {
        if self.is_empty() {
            return T::ZERO;
        }
        let x = pos.x.clamp(0.0, (self.width - 1) as f32);
        let y = pos.y.clamp(0.0, (self.height - 1) as f32);

        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let sx = x - x0 as f32;
        let sy = y - y0 as f32;

        let v00 = self.get(x0, y0);
        let v10 = self.get(x1, y0);
        let v01 = self.get(x0, y1);
        let v11 = self.get(x1, y1);

        let v0 = v00 * (1.0 - sx) + v10 * sx;
        let v1 = v01 * (1.0 - sx) + v11 * sx;

        v0 * (1.0 - sy) + v1 * sy
    }

    /// Write every cell from `f(x, y)`, rows in parallel
    pub fn compute(&mut self, f: impl Fn(usize, usize) -> T + Sync) {
        let width = self.width;
        if width == 0 {
            return;
        }
        self.data
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, cell) in row.iter_mut().enumerate() {
                    *cell = f(x, y);
                }
            });
    }

    pub fn fill(&mut self, value: T) {
        self.data.par_iter_mut().for_each(|cell| *cell = value);
    }

    /// Reset every cell to zero
    pub fn clear(&mut self) {
        self.fill(T::ZERO);
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Flat view of all channels
    pub fn as_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    /// True if no cell holds NaN or infinity
    pub fn is_finite(&self) -> bool {
        self.data.par_iter().all(|v| v.is_finite())
    }

    /// Largest per-cell length
    pub fn max_length(&self) -> f32 {
        self.data
            .par_iter()
            .map(|v| v.length())
            .reduce(|| 0.0, f32::max)
    }

    /// Borrow as an externally shaped array
    pub fn view(&self) -> FieldView<'_> {
        FieldView {
            width: self.width,
            height: self.height,
            channels: T::CHANNELS,
            data: self.as_flat(),
        }
    }
}

/// Borrowed external 2D array of interleaved f32 channels
#[derive(Debug, Clone, Copy)]
pub struct FieldView<'a> {
    width: usize,
    height: usize,
    channels: usize,
    data: &'a [f32],
}

impl<'a> FieldView<'a> {
    pub fn new(width: usize, height: usize, channels: usize, data: &'a [f32]) -> FluidResult<Self> {
        let expected = width * height * channels;
        if data.len() != expected || channels == 0 {
            return Err(FluidError::DataLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Read a cell as `T`; channels beyond the view are zero
    pub fn texel<T: Texel>(&self, x: usize, y: usize) -> T {
        let start = (x + y * self.width) * self.channels;
        let take = self.channels.min(T::CHANNELS);
        T::from_channels(&self.data[start..start + take])
    }

    /// Copy into an owned field of `T`
    pub fn to_field<T: Texel>(&self) -> Field<T> {
        Field::from_fn(self.width, self.height, |x, y| self.texel(x, y))
    }
}

/// Double-buffered field.
///
/// `front` holds the latest state. A pass swaps, then writes the new front
/// while reading the previous state from the back buffer.
#[derive(Clone, Debug)]
pub struct PingPong<T: Texel> {
    buffers: [Field<T>; 2],
    front: usize,
}

impl<T: Texel> PingPong<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            buffers: [Field::new(width, height), Field::new(width, height)],
            front: 0,
        }
    }

    /// Latest state
    pub fn front(&self) -> &Field<T> {
        &self.buffers[self.front]
    }

    /// Previous state
    pub fn back(&self) -> &Field<T> {
        &self.buffers[1 - self.front]
    }

    pub(crate) fn front_mut(&mut self) -> &mut Field<T> {
        &mut self.buffers[self.front]
    }

    /// Exchange front and back roles
    pub fn swap(&mut self) {
        self.front = 1 - self.front;
    }

    /// Swap, then run `pass(front, back)`
    pub fn step(&mut self, pass: impl FnOnce(&mut Field<T>, &Field<T>)) {
        self.swap();
        let [a, b] = &mut self.buffers;
        if self.front == 0 {
            pass(a, b);
        } else {
            pass(b, a);
        }
    }

    pub fn size(&self) -> (usize, usize) {
        self.buffers[0].size()
    }

    pub fn clear(&mut self) {
        self.buffers[0].clear();
        self.buffers[1].clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_clamps_to_edge() {
        let field = Field::from_fn(4, 4, |x, _| x as f32);

        assert_eq!(field.sample(Vec2::new(-3.0, 1.0)), 0.0);
        assert_eq!(field.sample(Vec2::new(10.0, 1.0)), 3.0);
        assert!((field.sample(Vec2::new(1.5, 2.0)) - 1.5).abs() < 1e-6);
        assert_eq!(field.at(-1, -1), 0.0);
        assert_eq!(field.at(7, 0), 3.0);
    }

    #[test]
    fn test_empty_field_reads_zero() {
        let wide: Field<Vec2> = Field::new(0, 4);
        let tall: Field<f32> = Field::new(3, 0);

        assert!(wide.is_empty());
        assert_eq!(wide.size(), (0, 4));
        assert_eq!(wide.sample(Vec2::new(1.5, 2.0)), Vec2::ZERO);
        assert_eq!(wide.at(-1, 2), Vec2::ZERO);
        assert_eq!(tall.sample(Vec2::ZERO), 0.0);
        assert_eq!(tall.max_length(), 0.0);
        assert!(tall.is_finite());
    }

    #[test]
    fn test_ping_pong_step_reads_previous_state() {
        let mut buffer: PingPong<f32> = PingPong::new(3, 2);
        buffer.front_mut().fill(2.0);

        buffer.step(|dst, src| dst.compute(|x, y| src.get(x, y) * 3.0));

        assert!(buffer.front().iter().all(|&v| v == 6.0));
        assert!(buffer.back().iter().all(|&v| v == 2.0));
    }

    #[test]
    fn test_view_pads_missing_channels() {
        let data = [1.0, 2.0, 3.0, 4.0];
        let view = FieldView::new(2, 1, 2, &data).unwrap();

        let texel: Vec4 = view.texel(1, 0);
        assert_eq!(texel, Vec4::new(3.0, 4.0, 0.0, 0.0));
        assert_eq!(view.texel::<f32>(0, 0), 1.0);
        assert!(FieldView::new(2, 2, 2, &data).is_err());
    }

    #[test]
    fn test_vector_reflect_only_flips_normal_component() {
        let v = Vec2::new(1.0, 2.0);

        assert_eq!(v.boundary_scale(Vec2::X, -1.0), Vec2::new(-1.0, 2.0));
        assert_eq!(v.boundary_scale(Vec2::X, 0.0), Vec2::ZERO);
        assert_eq!(v.boundary_scale(Vec2::X, 1.0), v);
        assert_eq!(3.0f32.boundary_scale(Vec2::X, -1.0), -3.0);
    }
}
