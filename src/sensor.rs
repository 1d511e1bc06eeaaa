//! Area sensor: reduces a region of a solver field to a direction and
//! magnitude summary for external logic.

use glam::{Vec2, Vec4};

use crate::fluid::{FieldView, FlowKind, FluidSolver};

/// Normalized region of interest; all values in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionOfInterest {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for RegionOfInterest {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}

impl RegionOfInterest {
    /// Build a region, clamped to the unit square
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        let x = x.clamp(0.0, 1.0);
        let y = y.clamp(0.0, 1.0);
        Self {
            x,
            y,
            width: width.clamp(0.0, 1.0 - x),
            height: height.clamp(0.0, 1.0 - y),
        }
    }

    /// Cell ranges covered on a grid; never empty
    fn cells(&self, width: usize, height: usize) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        let span = |start: f32, extent: f32, size: usize| {
            let first = ((start * size as f32).floor() as usize).min(size - 1);
            let last = (((start + extent) * size as f32).ceil() as usize).clamp(first + 1, size);
            first..last
        };
        (span(self.x, self.width, width), span(self.y, self.height, height))
    }
}

/// Reduced summary of a region
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AreaReading {
    /// Normalized mean of the first two channels; zero for scalar fields
    pub direction: Vec2,
    /// Mean per-cell length
    pub magnitude: f32,
    /// Mean of each channel
    pub components: Vec4,
}

/// Reduce a region of an arbitrary field
pub fn measure(field: &FieldView<'_>, roi: &RegionOfInterest) -> AreaReading {
    if field.width() == 0 || field.height() == 0 {
        return AreaReading::default();
    }

    let (xs, ys) = roi.cells(field.width(), field.height());
    let count = (xs.len() * ys.len()) as f32;

    let mut sum = Vec4::ZERO;
    let mut magnitude = 0.0;
    for y in ys {
        for x in xs.clone() {
            let v: Vec4 = field.texel(x, y);
            sum += v;
            magnitude += v.length();
        }
    }

    let components = sum / count;
    let direction = if field.channels() >= 2 {
        components.truncate().truncate().normalize_or_zero()
    } else {
        Vec2::ZERO
    };

    AreaReading {
        direction,
        magnitude: magnitude / count,
        components,
    }
}

/// Samples one flow kind of a solver over a fixed region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaSensor {
    pub kind: FlowKind,
    pub roi: RegionOfInterest,
}

impl AreaSensor {
    pub fn new(kind: FlowKind, roi: RegionOfInterest) -> Self {
        Self { kind, roi }
    }

    /// Read the solver; `None` if the solver holds no field for this kind
    pub fn read(&self, solver: &FluidSolver) -> Option<AreaReading> {
        let view = solver.flow_view(self.kind)?;
        Some(measure(&view, &self.roi))
    }
}
