//! Obstacle passes: mask union, boundary offsets and boundary conditions.

use glam::{Vec2, Vec3};

use crate::fluid::fluid_data::{Field, Texel};

/// Mask values above this count as solid
pub const OBSTACLE_THRESHOLD: f32 = 0.5;

/// Reflect the normal component (no penetration)
pub const REFLECT: f32 = -1.0;

/// Clear the value
pub const CLAMP: f32 = 0.0;

/// Hold the value (Neumann condition)
pub const HOLD: f32 = 1.0;

fn is_solid(value: f32) -> bool {
    value > OBSTACLE_THRESHOLD
}

/// Boolean union of an existing mask and a shape
pub fn add_boolean(dst: &mut Field<f32>, src: &Field<f32>, shape: &Field<f32>) {
    dst.compute(|x, y| {
        if is_solid(src.get(x, y)) || is_solid(shape.get(x, y)) {
            1.0
        } else {
            0.0
        }
    });
}

/// Derive per-cell boundary offsets from an obstacle mask.
///
/// Fluid cells get zero. Solid cells get `z = 1` and an `xy` step pointing
/// toward their fluid 4-neighbours; solid cells with no fluid neighbour keep
/// `xy = 0`. Out-of-grid neighbours count as the cell itself.
pub fn obstacle_offset(dst: &mut Field<Vec3>, obstacle: &Field<f32>) {
    dst.compute(|x, y| {
        if !is_solid(obstacle.get(x, y)) {
            return Vec3::ZERO;
        }

        let (x, y) = (x as isize, y as isize);
        let fluid = |dx: isize, dy: isize| {
            if is_solid(obstacle.at(x + dx, y + dy)) { 0.0 } else { 1.0 }
        };

        Vec3::new(fluid(1, 0) - fluid(-1, 0), fluid(0, 1) - fluid(0, -1), 1.0)
    });
}

/// Apply a boundary condition at solid cells.
///
/// Boundary cells take the neighbouring fluid value scaled by `factor` along
/// the boundary normal; interior solid cells are zeroed; fluid cells are
/// copied through.
pub fn apply_obstacle<T: Texel>(dst: &mut Field<T>, src: &Field<T>, offset: &Field<Vec3>, factor: f32) {
    dst.compute(|x, y| {
        let o = offset.get(x, y);
        if o.z < 0.5 {
            return src.get(x, y);
        }

        let normal: Vec2 = o.truncate();
        if normal == Vec2::ZERO {
            return T::ZERO;
        }

        let neighbour = src.at(x as isize + normal.x as isize, y as isize + normal.y as isize);
        neighbour.boundary_scale(normal, factor)
    });
}
