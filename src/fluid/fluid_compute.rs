use glam::{Vec2, Vec4};

use crate::fluid::fluid_data::{Field, Texel};

/// Map a cell of a `from` grid onto the cell coordinates of a `to` grid.
/// Identity when either grid is empty.
fn grid_scale(from: (usize, usize), to: (usize, usize)) -> Vec2 {
    if from.0 == 0 || from.1 == 0 || to.0 == 0 || to.1 == 0 {
        return Vec2::ONE;
    }
    Vec2::new(to.0 as f32 / from.0 as f32, to.1 as f32 / from.1 as f32)
}

fn remap(pos: Vec2, scale: Vec2) -> Vec2 {
    (pos + 0.5) * scale - 0.5
}

/// Semi-Lagrangian advection.
///
/// Traces each cell of `dst` back along `velocity` by `time_step` and samples
/// `src` there, then scales by `retention`. `velocity` may live on a different
/// grid than `src`/`dst`; displacements are measured in velocity-grid cells.
pub fn advect<T: Texel>(
    dst: &mut Field<T>,
    src: &Field<T>,
    velocity: &Field<Vec2>,
    time_step: f32,
    retention: f32,
) {
    let to_velocity = grid_scale(dst.size(), velocity.size());
    let to_dst = to_velocity.recip();

    dst.compute(|x, y| {
        let pos = Vec2::new(x as f32, y as f32);
        let v = velocity.sample(remap(pos, to_velocity));
        let traced = pos - v * time_step * to_dst;

        src.sample(traced) * retention
    });
}

/// One Jacobi iteration of implicit diffusion `(I - ν∇²)x = x₀`, using the
/// previous iterate as both guess and right-hand side
pub fn diffuse<T: Texel>(dst: &mut Field<T>, src: &Field<T>, viscosity: f32) {
    let r_beta = 1.0 / (1.0 + 4.0 * viscosity);

    dst.compute(|x, y| {
        let center = src.get(x, y);
        let (x, y) = (x as isize, y as isize);
        let neighbours = src.at(x - 1, y) + src.at(x + 1, y) + src.at(x, y - 1) + src.at(x, y + 1);

        (center + neighbours * viscosity) * r_beta
    });
}

/// Curl of velocity, stored as `(ω, |ω|)`
pub fn vorticity_velocity(dst: &mut Field<Vec2>, velocity: &Field<Vec2>) {
    dst.compute(|x, y| {
        let (x, y) = (x as isize, y as isize);
        let left = velocity.at(x - 1, y);
        let right = velocity.at(x + 1, y);
        let bottom = velocity.at(x, y - 1);
        let top = velocity.at(x, y + 1);

        let curl = 0.5 * ((right.y - left.y) - (top.x - bottom.x));
        Vec2::new(curl, curl.abs())
    });
}

/// Confinement force `ε·Δt·(N × ω)` with `N` the normalized gradient of `|ω|`
pub fn vorticity_confinement(
    dst: &mut Field<Vec2>,
    vorticity: &Field<Vec2>,
    time_step: f32,
    strength: f32,
) {
    dst.compute(|x, y| {
        let curl = vorticity.get(x, y).x;
        let (x, y) = (x as isize, y as isize);
        let eta = Vec2::new(
            vorticity.at(x + 1, y).y - vorticity.at(x - 1, y).y,
            vorticity.at(x, y + 1).y - vorticity.at(x, y - 1).y,
        ) * 0.5;
        let n = eta.normalize_or_zero();

        Vec2::new(n.y * curl, -n.x * curl) * (time_step * strength)
    });
}

/// `dst = src + addend * scale`
pub fn add_scaled<T: Texel>(dst: &mut Field<T>, src: &Field<T>, addend: &Field<T>, scale: f32) {
    dst.compute(|x, y| src.get(x, y) + addend.get(x, y) * scale);
}

/// `dst = src * factor`
pub fn multiply<T: Texel>(dst: &mut Field<T>, src: &Field<T>, factor: f32) {
    dst.compute(|x, y| src.get(x, y) * factor);
}

/// Pull values longer than `max_length` back toward it; `strength` 1 clamps
/// fully, 0 leaves them untouched
pub fn clamp_length<T: Texel>(dst: &mut Field<T>, src: &Field<T>, max_length: f32, strength: f32) {
    dst.compute(|x, y| {
        let v = src.get(x, y);
        let length = v.length();
        if length > max_length {
            let target = max_length / length;
            v * (1.0 + (target - 1.0) * strength)
        } else {
            v
        }
    });
}

/// Smoke buoyancy parameters for one frame
#[derive(Debug, Clone, Copy)]
pub struct BuoyancyForce {
    pub ambient_temperature: f32,
    pub time_step: f32,
    pub sigma: f32,
    pub weight: f32,
    pub gravity: Vec2,
}

/// Temperature-driven force against gravity, weighed down by density.
///
/// `density` may be on a different grid than `temperature`.
pub fn smoke_buoyancy(
    dst: &mut Field<Vec2>,
    temperature: &Field<f32>,
    density: &Field<Vec4>,
    force: &BuoyancyForce,
) {
    let to_density = grid_scale(temperature.size(), density.size());

    dst.compute(|x, y| {
        let t = temperature.get(x, y);
        if t <= force.ambient_temperature {
            return Vec2::ZERO;
        }

        let d = density
            .sample(remap(Vec2::new(x as f32, y as f32), to_density))
            .truncate()
            .length();
        let lift = (t - force.ambient_temperature) * force.sigma - d * force.weight;

        -force.gravity * force.time_step * lift
    });
}
