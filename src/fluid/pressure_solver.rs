use glam::Vec2;

use crate::fluid::fluid_compute::multiply;
use crate::fluid::fluid_data::{Field, PingPong};

/// Central-difference divergence of a velocity field
pub fn divergence(dst: &mut Field<f32>, velocity: &Field<Vec2>) {
    dst.compute(|x, y| {
        let (x, y) = (x as isize, y as isize);
        let left = velocity.at(x - 1, y);
        let right = velocity.at(x + 1, y);
        let bottom = velocity.at(x, y - 1);
        let top = velocity.at(x, y + 1);

        0.5 * ((right.x - left.x) + (top.y - bottom.y))
    });
}

/// One Jacobi iteration of the pressure Poisson equation `∇²p = divergence`
pub fn jacobi(dst: &mut Field<f32>, pressure: &Field<f32>, divergence: &Field<f32>) {
    dst.compute(|x, y| {
        let b = divergence.get(x, y);
        let (x, y) = (x as isize, y as isize);
        let neighbours = pressure.at(x - 1, y)
            + pressure.at(x + 1, y)
            + pressure.at(x, y - 1)
            + pressure.at(x, y + 1);

        (neighbours - b) * 0.25
    });
}

/// Subtract the pressure gradient from velocity
pub fn subtract_gradient(dst: &mut Field<Vec2>, velocity: &Field<Vec2>, pressure: &Field<f32>) {
    dst.compute(|x, y| {
        let v = velocity.get(x, y);
        let (x, y) = (x as isize, y as isize);
        let gradient = Vec2::new(
            pressure.at(x + 1, y) - pressure.at(x - 1, y),
            pressure.at(x, y + 1) - pressure.at(x, y - 1),
        ) * 0.5;

        v - gradient
    });
}

/// Seed pressure from the previous frame and relax it `iterations` times
pub fn solve_pressure(
    pressure: &mut PingPong<f32>,
    divergence: &Field<f32>,
    iterations: u32,
    retention: f32,
) {
    pressure.step(|dst, src| multiply(dst, src, retention));

    for _ in 0..iterations {
        pressure.step(|dst, src| jacobi(dst, src, divergence));
    }
}
