use glam::{Vec2, Vec3, Vec4};

use crate::error::{FluidError, FluidResult};
use crate::fluid::fluid_compute::{
    add_scaled, advect, clamp_length, diffuse, smoke_buoyancy, vorticity_confinement,
    vorticity_velocity, BuoyancyForce,
};
use crate::fluid::fluid_data::{Field, FieldView, PingPong, TexelFormat};
use crate::fluid::obstacle::{add_boolean, apply_obstacle, obstacle_offset, CLAMP, HOLD, REFLECT};
use crate::fluid::parameters::FluidParameters;
use crate::fluid::performance::{FrameStats, StageTimer};
use crate::fluid::pressure_solver::{divergence, solve_pressure, subtract_gradient};
use crate::fluid::FlowKind;

/// Temperature clamp applied before buoyancy
const MAX_TEMPERATURE: f32 = 2.0;

fn mask_channels(value: Vec4, channels: usize) -> Vec4 {
    let mut v = value.to_array();
    for c in v.iter_mut().skip(channels) {
        *c = 0.0;
    }
    Vec4::from_array(v)
}

fn check_size(kind: FlowKind, expected: (usize, usize), view: &FieldView<'_>) -> FluidResult<()> {
    if view.size() != expected {
        return Err(FluidError::ResolutionMismatch {
            kind,
            expected,
            actual: view.size(),
        });
    }
    Ok(())
}

/// Grid fluid solver.
///
/// Owns every field and runs the per-frame pipeline: advect, diffuse,
/// vorticity confinement, buoyancy, pressure projection, density transport.
/// Callers inject data only through the set/add methods.
pub struct FluidSolver {
    parameters: FluidParameters,

    simulation_size: (usize, usize),
    simulation_format: TexelFormat,
    density_size: (usize, usize),
    density_format: TexelFormat,

    velocity: PingPong<Vec2>,
    density: PingPong<Vec4>,
    pressure: PingPong<f32>,
    temperature: PingPong<f32>,
    divergence: Field<f32>,
    obstacle: Field<f32>,
    obstacle_offset: Field<Vec3>,

    // per-frame scratch
    vorticity_velocity: Field<Vec2>,
    vorticity_confinement: Field<Vec2>,
    buoyancy_force: Field<Vec2>,

    stats: FrameStats,
}

impl FluidSolver {
    /// Allocate with the default formats (two-channel simulation, RGBA density)
    pub fn new(simulation_size: (usize, usize), density_size: (usize, usize)) -> FluidResult<Self> {
        Self::with_formats(simulation_size, TexelFormat::Rg32F, density_size, TexelFormat::Rgba32F)
    }

    pub fn with_formats(
        simulation_size: (usize, usize),
        simulation_format: TexelFormat,
        density_size: (usize, usize),
        density_format: TexelFormat,
    ) -> FluidResult<Self> {
        let mut solver = Self {
            parameters: FluidParameters::default(),
            simulation_size: (1, 1),
            simulation_format,
            density_size: (1, 1),
            density_format,
            velocity: PingPong::new(1, 1),
            density: PingPong::new(1, 1),
            pressure: PingPong::new(1, 1),
            temperature: PingPong::new(1, 1),
            divergence: Field::new(1, 1),
            obstacle: Field::new(1, 1),
            obstacle_offset: Field::new(1, 1),
            vorticity_velocity: Field::new(1, 1),
            vorticity_confinement: Field::new(1, 1),
            buoyancy_force: Field::new(1, 1),
            stats: FrameStats::default(),
        };
        solver.allocate(
            simulation_size.0,
            simulation_size.1,
            simulation_format,
            density_size.0,
            density_size.1,
            density_format,
        )?;
        Ok(solver)
    }

    pub fn with_parameters(mut self, parameters: FluidParameters) -> Self {
        self.parameters = parameters.clamped();
        self
    }

    /// Reallocate with the default formats
    pub fn setup(
        &mut self,
        simulation_width: usize,
        simulation_height: usize,
        density_width: usize,
        density_height: usize,
    ) -> FluidResult<()> {
        self.allocate(
            simulation_width,
            simulation_height,
            TexelFormat::Rg32F,
            density_width,
            density_height,
            TexelFormat::Rgba32F,
        )
    }

    /// Discard every field and allocate zeroed ones at the given sizes
    pub fn allocate(
        &mut self,
        simulation_width: usize,
        simulation_height: usize,
        simulation_format: TexelFormat,
        density_width: usize,
        density_height: usize,
        density_format: TexelFormat,
    ) -> FluidResult<()> {
        for (width, height) in [(simulation_width, simulation_height), (density_width, density_height)] {
            if width == 0 || height == 0 {
                return Err(FluidError::InvalidDimensions { width, height });
            }
        }
        if simulation_format.channels() < 2 {
            return Err(FluidError::UnsupportedFormat {
                format: simulation_format,
                reason: "velocity needs at least two channels",
            });
        }

        let (sw, sh) = (simulation_width, simulation_height);
        let (dw, dh) = (density_width, density_height);

        self.simulation_size = (sw, sh);
        self.simulation_format = simulation_format;
        self.density_size = (dw, dh);
        self.density_format = density_format;

        self.velocity = PingPong::new(sw, sh);
        self.density = PingPong::new(dw, dh);
        self.pressure = PingPong::new(sw, sh);
        self.temperature = PingPong::new(sw, sh);
        self.divergence = Field::new(sw, sh);
        self.obstacle = Field::new(sw, sh);
        self.obstacle_offset = Field::new(sw, sh);
        self.vorticity_velocity = Field::new(sw, sh);
        self.vorticity_confinement = Field::new(sw, sh);
        self.buoyancy_force = Field::new(sw, sh);
        obstacle_offset(&mut self.obstacle_offset, &self.obstacle);

        log::info!(
            "Fluid solver allocated: simulation {}x{} {:?}, density {}x{} {:?}",
            sw, sh, simulation_format, dw, dh, density_format
        );
        Ok(())
    }

    /// Advance the simulation by `delta_time` seconds
    pub fn update(&mut self, delta_time: f32) {
        let mut timer = StageTimer::start();
        let mut stats = FrameStats::default();

        let params = self.parameters;
        let iterations = params.iterations();
        let time_step = delta_time.max(0.0) * params.speed() * self.simulation_size.0 as f32;

        // Step 1: Advect velocity through itself
        let retention = 1.0 - params.dissipation().velocity();
        self.velocity.step(|dst, src| advect(dst, src, src, time_step, retention));
        self.reflect_velocity();
        stats.advect_us = timer.lap();

        // Step 2: Viscous diffusion
        let viscosity = params.viscosity();
        if viscosity > 0.0 {
            for _ in 0..iterations {
                self.velocity.step(|dst, src| diffuse(dst, src, viscosity));
            }
            self.reflect_velocity();
        }
        stats.diffuse_us = timer.lap();

        // Step 3: Vorticity confinement
        let vorticity = params.vorticity();
        if vorticity > 0.0 {
            // confinement field doubles as scratch for the raw curl
            vorticity_velocity(&mut self.vorticity_confinement, self.velocity.front());
            apply_obstacle(
                &mut self.vorticity_velocity,
                &self.vorticity_confinement,
                &self.obstacle_offset,
                CLAMP,
            );
            vorticity_confinement(&mut self.vorticity_confinement, &self.vorticity_velocity, time_step, vorticity);
            self.velocity.step(|dst, src| add_scaled(dst, src, &self.vorticity_confinement, 1.0));
            self.reflect_velocity();
        }
        stats.vorticity_us = timer.lap();

        // Step 4: Smoke buoyancy
        let buoyancy = *params.buoyancy();
        if buoyancy.is_active() {
            let density_retention = 1.0 - params.dissipation().density();
            self.temperature.step(|dst, src| advect(dst, src, self.velocity.front(), time_step, density_retention));
            self.temperature.step(|dst, src| clamp_length(dst, src, MAX_TEMPERATURE, 1.0));
            self.temperature.step(|dst, src| apply_obstacle(dst, src, &self.obstacle_offset, HOLD));

            let force = BuoyancyForce {
                ambient_temperature: buoyancy.ambient_temperature(),
                time_step,
                sigma: buoyancy.sigma(),
                weight: buoyancy.weight(),
                gravity: buoyancy.gravity(),
            };
            smoke_buoyancy(&mut self.buoyancy_force, self.temperature.front(), self.density.front(), &force);
            self.velocity.step(|dst, src| add_scaled(dst, src, &self.buoyancy_force, 1.0));
            self.reflect_velocity();
        } else if buoyancy.enabled() {
            self.temperature.clear();
        }
        stats.buoyancy_us = timer.lap();

        // Step 5: Divergence and pressure solve
        divergence(&mut self.divergence, self.velocity.front());
        solve_pressure(
            &mut self.pressure,
            &self.divergence,
            iterations,
            1.0 - params.dissipation().pressure(),
        );
        self.pressure.step(|dst, src| apply_obstacle(dst, src, &self.obstacle_offset, HOLD));
        stats.pressure_us = timer.lap();

        // Step 6: Project onto the divergence-free field
        self.velocity.step(|dst, src| subtract_gradient(dst, src, self.pressure.front()));
        self.reflect_velocity();
        stats.project_us = timer.lap();

        // Step 7: Transport density
        let density_retention = 1.0 - params.dissipation().density();
        self.density.step(|dst, src| advect(dst, src, self.velocity.front(), time_step, density_retention));
        stats.density_us = timer.lap();

        stats.total_us = timer.total();
        self.stats = stats;
        log::trace!("Fluid frame: {:?}", stats);
    }

    fn reflect_velocity(&mut self) {
        let offset = &self.obstacle_offset;
        self.velocity.step(|dst, src| apply_obstacle(dst, src, offset, REFLECT));
    }

    /// Replace the field selected by `kind`
    pub fn set_flow(&mut self, kind: FlowKind, field: &FieldView<'_>) -> FluidResult<()> {
        match kind {
            FlowKind::Velocity => self.set_velocity(field),
            FlowKind::Density => self.set_density(field),
            FlowKind::Temperature => self.set_temperature(field),
            FlowKind::Pressure => self.set_pressure(field),
            FlowKind::Obstacle => self.set_obstacle(field),
            FlowKind::None
            | FlowKind::Input
            | FlowKind::Output
            | FlowKind::VelocityNorm
            | FlowKind::VelocitySplit => {
                log::warn!("FluidSolver::set_flow: no method to set flow of type {}", kind);
                Ok(())
            }
        }
    }

    /// Accumulate `strength * field` into the field selected by `kind`.
    /// Obstacles are unioned and ignore `strength`.
    pub fn add_flow(&mut self, kind: FlowKind, field: &FieldView<'_>, strength: f32) -> FluidResult<()> {
        match kind {
            FlowKind::Velocity => self.add_velocity(field, strength),
            FlowKind::Density => self.add_density(field, strength),
            FlowKind::Temperature => self.add_temperature(field, strength),
            FlowKind::Pressure => self.add_pressure(field, strength),
            FlowKind::Obstacle => self.add_obstacle(field),
            FlowKind::None
            | FlowKind::Input
            | FlowKind::Output
            | FlowKind::VelocityNorm
            | FlowKind::VelocitySplit => {
                log::warn!("FluidSolver::add_flow: no method to add flow of type {}", kind);
                Ok(())
            }
        }
    }

    pub fn set_velocity(&mut self, field: &FieldView<'_>) -> FluidResult<()> {
        check_size(FlowKind::Velocity, self.simulation_size, field)?;
        self.velocity.front_mut().compute(|x, y| field.texel(x, y));
        Ok(())
    }

    pub fn add_velocity(&mut self, field: &FieldView<'_>, strength: f32) -> FluidResult<()> {
        check_size(FlowKind::Velocity, self.simulation_size, field)?;
        let input: Field<Vec2> = field.to_field();
        self.velocity.step(|dst, src| add_scaled(dst, src, &input, strength));
        Ok(())
    }

    pub fn set_density(&mut self, field: &FieldView<'_>) -> FluidResult<()> {
        check_size(FlowKind::Density, self.density_size, field)?;
        let channels = self.density_format.channels();
        self.density
            .front_mut()
            .compute(|x, y| mask_channels(field.texel(x, y), channels));
        Ok(())
    }

    pub fn add_density(&mut self, field: &FieldView<'_>, strength: f32) -> FluidResult<()> {
        check_size(FlowKind::Density, self.density_size, field)?;
        let channels = self.density_format.channels();
        let (width, height) = self.density_size;
        let input = Field::from_fn(width, height, |x, y| mask_channels(field.texel(x, y), channels));
        self.density.step(|dst, src| add_scaled(dst, src, &input, strength));
        Ok(())
    }

    pub fn set_temperature(&mut self, field: &FieldView<'_>) -> FluidResult<()> {
        check_size(FlowKind::Temperature, self.simulation_size, field)?;
        self.temperature.front_mut().compute(|x, y| field.texel(x, y));
        Ok(())
    }

    pub fn add_temperature(&mut self, field: &FieldView<'_>, strength: f32) -> FluidResult<()> {
        check_size(FlowKind::Temperature, self.simulation_size, field)?;
        let input: Field<f32> = field.to_field();
        self.temperature.step(|dst, src| add_scaled(dst, src, &input, strength));
        Ok(())
    }

    pub fn set_pressure(&mut self, field: &FieldView<'_>) -> FluidResult<()> {
        check_size(FlowKind::Pressure, self.simulation_size, field)?;
        self.pressure.front_mut().compute(|x, y| field.texel(x, y));
        Ok(())
    }

    pub fn add_pressure(&mut self, field: &FieldView<'_>, strength: f32) -> FluidResult<()> {
        check_size(FlowKind::Pressure, self.simulation_size, field)?;
        let input: Field<f32> = field.to_field();
        self.pressure.step(|dst, src| add_scaled(dst, src, &input, strength));
        Ok(())
    }

    /// Replace the obstacle mask with `shape` and rebuild the offsets
    pub fn set_obstacle(&mut self, shape: &FieldView<'_>) -> FluidResult<()> {
        check_size(FlowKind::Obstacle, self.simulation_size, shape)?;
        let (width, height) = self.simulation_size;
        self.obstacle = Field::new(width, height);
        self.union_obstacle(shape);
        Ok(())
    }

    /// Union `shape` into the existing obstacle mask and rebuild the offsets
    pub fn add_obstacle(&mut self, shape: &FieldView<'_>) -> FluidResult<()> {
        check_size(FlowKind::Obstacle, self.simulation_size, shape)?;
        self.union_obstacle(shape);
        Ok(())
    }

    fn union_obstacle(&mut self, shape: &FieldView<'_>) {
        let shape: Field<f32> = shape.to_field();
        let (width, height) = self.simulation_size;
        let mut union = Field::new(width, height);
        add_boolean(&mut union, &self.obstacle, &shape);
        self.obstacle = union;
        obstacle_offset(&mut self.obstacle_offset, &self.obstacle);
    }

    /// Zero every field. Allocation and parameters are kept.
    pub fn reset(&mut self) {
        self.velocity.clear();
        self.density.clear();
        self.pressure.clear();
        self.temperature.clear();
        self.divergence.clear();
        self.obstacle.clear();
        self.obstacle_offset.clear();
        self.vorticity_velocity.clear();
        self.vorticity_confinement.clear();
        self.buoyancy_force.clear();
        self.stats = FrameStats::default();
        log::info!("Fluid solver reset");
    }

    /// Read-only view of the field held for `kind`, if any
    pub fn flow_view(&self, kind: FlowKind) -> Option<FieldView<'_>> {
        match kind {
            FlowKind::Velocity => Some(self.velocity.front().view()),
            FlowKind::Density => Some(self.density.front().view()),
            FlowKind::Temperature => Some(self.temperature.front().view()),
            FlowKind::Pressure => Some(self.pressure.front().view()),
            FlowKind::Obstacle => Some(self.obstacle.view()),
            FlowKind::None
            | FlowKind::Input
            | FlowKind::Output
            | FlowKind::VelocityNorm
            | FlowKind::VelocitySplit => None,
        }
    }

    pub fn parameters(&self) -> &FluidParameters {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut FluidParameters {
        &mut self.parameters
    }

    pub fn simulation_size(&self) -> (usize, usize) {
        self.simulation_size
    }

    pub fn density_size(&self) -> (usize, usize) {
        self.density_size
    }

    pub fn simulation_format(&self) -> TexelFormat {
        self.simulation_format
    }

    pub fn density_format(&self) -> TexelFormat {
        self.density_format
    }

    pub fn velocity(&self) -> &Field<Vec2> {
        self.velocity.front()
    }

    pub fn density(&self) -> &Field<Vec4> {
        self.density.front()
    }

    pub fn pressure(&self) -> &Field<f32> {
        self.pressure.front()
    }

    pub fn temperature(&self) -> &Field<f32> {
        self.temperature.front()
    }

    /// Divergence computed before the last projection
    pub fn divergence(&self) -> &Field<f32> {
        &self.divergence
    }

    pub fn obstacle(&self) -> &Field<f32> {
        &self.obstacle
    }

    pub fn obstacle_offset(&self) -> &Field<Vec3> {
        &self.obstacle_offset
    }

    pub fn vorticity_velocity(&self) -> &Field<Vec2> {
        &self.vorticity_velocity
    }

    pub fn vorticity_confinement(&self) -> &Field<Vec2> {
        &self.vorticity_confinement
    }

    /// Stage timings of the last `update`
    pub fn last_frame_stats(&self) -> &FrameStats {
        &self.stats
    }
}
