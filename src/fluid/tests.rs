use glam::{Vec2, Vec4};

use crate::error::FluidError;
use crate::fluid::*;

fn uniform_velocity(size: (usize, usize), v: Vec2) -> Field<Vec2> {
    Field::from_fn(size.0, size.1, |_, _| v)
}

#[test]
fn test_allocation_is_zeroed() {
    let solver = FluidSolver::new((32, 16), (64, 32)).unwrap();

    assert_eq!(solver.simulation_size(), (32, 16));
    assert_eq!(solver.density_size(), (64, 32));
    assert_eq!(solver.velocity().size(), (32, 16));
    assert_eq!(solver.density().size(), (64, 32));
    assert!(solver.velocity().iter().all(|v| *v == Vec2::ZERO));
    assert!(solver.density().iter().all(|v| *v == Vec4::ZERO));
    assert!(solver.obstacle_offset().iter().all(|o| o.z == 0.0));
}

#[test]
fn test_invalid_allocation_is_rejected() {
    assert!(matches!(
        FluidSolver::new((0, 4), (4, 4)),
        Err(FluidError::InvalidDimensions { width: 0, height: 4 })
    ));
    assert!(matches!(
        FluidSolver::with_formats((4, 4), TexelFormat::R32F, (4, 4), TexelFormat::Rgba32F),
        Err(FluidError::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_reallocate_discards_fields() {
    let mut solver = FluidSolver::new((8, 8), (8, 8)).unwrap();
    let input = uniform_velocity((8, 8), Vec2::new(1.0, 0.0));
    solver.set_flow(FlowKind::Velocity, &input.view()).unwrap();

    solver.setup(12, 10, 24, 20).unwrap();

    assert_eq!(solver.velocity().size(), (12, 10));
    assert_eq!(solver.density().size(), (24, 20));
    assert!(solver.velocity().iter().all(|v| *v == Vec2::ZERO));
}

#[test]
fn test_unhandled_flow_kind_is_noop() {
    let mut solver = FluidSolver::new((8, 8), (8, 8)).unwrap();
    let input = uniform_velocity((8, 8), Vec2::new(1.0, 0.0));

    solver.set_flow(FlowKind::VelocityNorm, &input.view()).unwrap();
    solver.add_flow(FlowKind::Input, &input.view(), 2.0).unwrap();

    assert!(solver.velocity().iter().all(|v| *v == Vec2::ZERO));
    assert!(solver.flow_view(FlowKind::Output).is_none());
}

#[test]
fn test_resolution_mismatch_is_checked() {
    let mut solver = FluidSolver::new((8, 8), (16, 16)).unwrap();
    let velocity = uniform_velocity((16, 16), Vec2::X);

    let result = solver.set_flow(FlowKind::Velocity, &velocity.view());
    assert!(matches!(
        result,
        Err(FluidError::ResolutionMismatch { kind: FlowKind::Velocity, expected: (8, 8), actual: (16, 16) })
    ));

    // density lives on its own grid
    let density = Field::from_fn(16, 16, |_, _| Vec4::ONE);
    assert!(solver.add_flow(FlowKind::Density, &density.view(), 1.0).is_ok());
    let obstacle: Field<f32> = Field::new(16, 16);
    assert!(solver.add_flow(FlowKind::Obstacle, &obstacle.view(), 1.0).is_err());
}

#[test]
fn test_add_flow_scales_and_accumulates() {
    let mut solver = FluidSolver::new((8, 8), (8, 8)).unwrap();
    let input = uniform_velocity((8, 8), Vec2::new(1.0, -1.0));

    solver.add_flow(FlowKind::Velocity, &input.view(), 0.5).unwrap();
    solver.add_flow(FlowKind::Velocity, &input.view(), 0.25).unwrap();

    assert_eq!(solver.velocity().get(3, 3), Vec2::new(0.75, -0.75));

    let temperature = Field::from_fn(8, 8, |_, _| 2.0f32);
    solver.set_flow(FlowKind::Temperature, &temperature.view()).unwrap();
    solver.add_flow(FlowKind::Temperature, &temperature.view(), -0.5).unwrap();
    assert_eq!(solver.temperature().get(0, 0), 1.0);

    solver.add_flow(FlowKind::Pressure, &temperature.view(), 1.0).unwrap();
    assert_eq!(solver.pressure().get(7, 7), 2.0);
}

#[test]
fn test_obstacle_ignores_strength() {
    let mut solver = FluidSolver::new((8, 8), (8, 8)).unwrap();
    let shape = Field::from_fn(8, 8, |x, _| if x == 4 { 1.0f32 } else { 0.0 });

    solver.add_flow(FlowKind::Obstacle, &shape.view(), 0.0).unwrap();

    assert_eq!(solver.obstacle().get(4, 2), 1.0);
    assert_eq!(solver.obstacle().get(3, 2), 0.0);
    assert_eq!(solver.obstacle_offset().get(4, 2).z, 1.0);
}

#[test]
fn test_density_format_masks_channels() {
    let mut solver = FluidSolver::with_formats((8, 8), TexelFormat::Rg32F, (8, 8), TexelFormat::R32F).unwrap();
    let dye = Field::from_fn(8, 8, |_, _| Vec4::ONE);

    solver.set_flow(FlowKind::Density, &dye.view()).unwrap();
    assert_eq!(solver.density().get(1, 1), Vec4::new(1.0, 0.0, 0.0, 0.0));

    solver.add_flow(FlowKind::Density, &dye.view(), 1.0).unwrap();
    assert_eq!(solver.density().get(1, 1), Vec4::new(2.0, 0.0, 0.0, 0.0));
}

#[test]
fn test_reset_keeps_parameters() {
    let mut solver = FluidSolver::new((8, 8), (8, 8)).unwrap();
    solver.parameters_mut().set_speed(0.9);
    solver.parameters_mut().set_iterations(7);
    let input = uniform_velocity((8, 8), Vec2::X);
    solver.set_flow(FlowKind::Velocity, &input.view()).unwrap();
    solver.set_flow(FlowKind::Obstacle, &Field::from_fn(8, 8, |_, _| 1.0f32).view()).unwrap();

    solver.reset();

    assert!(solver.velocity().iter().all(|v| *v == Vec2::ZERO));
    assert!(solver.obstacle().iter().all(|v| *v == 0.0));
    assert!(solver.obstacle_offset().iter().all(|o| o.z == 0.0));
    assert_eq!(solver.parameters().speed(), 0.9);
    assert_eq!(solver.parameters().iterations(), 7);
}

#[test]
fn test_vorticity_stage_populates_scratch_fields() {
    let mut solver = FluidSolver::new((32, 32), (32, 32)).unwrap();
    solver.parameters_mut().set_vorticity(1.0);
    let swirl = Field::from_fn(32, 32, |x, y| Vec2::new(-(y as f32 - 16.0), x as f32 - 16.0) * 0.01);
    solver.set_flow(FlowKind::Velocity, &swirl.view()).unwrap();

    solver.update(1.0 / 60.0);

    assert!(solver.vorticity_velocity().get(16, 16).x > 0.0);
    assert!(solver.vorticity_velocity().is_finite());
    assert!(solver.vorticity_confinement().is_finite());
    assert!(solver.velocity().is_finite());
}

#[test]
fn test_vorticity_disabled_leaves_scratch_untouched() {
    let mut solver = FluidSolver::new((16, 16), (16, 16)).unwrap();
    let swirl = Field::from_fn(16, 16, |x, y| Vec2::new(-(y as f32 - 8.0), x as f32 - 8.0) * 0.01);
    solver.set_flow(FlowKind::Velocity, &swirl.view()).unwrap();

    solver.update(1.0 / 60.0);

    assert!(solver.vorticity_velocity().iter().all(|v| *v == Vec2::ZERO));
}

#[test]
fn test_buoyancy_lifts_hot_fluid() {
    let mut solver = FluidSolver::new((16, 16), (16, 16)).unwrap();
    solver.parameters_mut().buoyancy_mut().set_enabled(true);
    let heat = Field::from_fn(16, 16, |_, _| 1.0f32);
    solver.set_flow(FlowKind::Temperature, &heat.view()).unwrap();

    solver.update(1.0 / 60.0);

    assert!(solver.velocity().get(8, 8).y > 0.0);
    assert!(solver.temperature().get(8, 8) > 0.75);
}

#[test]
fn test_buoyancy_gated_off_clears_temperature() {
    let mut solver = FluidSolver::new((16, 16), (16, 16)).unwrap();
    solver.parameters_mut().buoyancy_mut().set_enabled(true);
    solver.parameters_mut().buoyancy_mut().set_sigma(0.0);
    let heat = Field::from_fn(16, 16, |_, _| 1.0f32);
    solver.set_flow(FlowKind::Temperature, &heat.view()).unwrap();

    solver.update(1.0 / 60.0);

    assert!(solver.temperature().iter().all(|t| *t == 0.0));
    assert!(solver.velocity().iter().all(|v| *v == Vec2::ZERO));
}

#[test]
fn test_buoyancy_disabled_keeps_temperature_inert() {
    let mut solver = FluidSolver::new((16, 16), (16, 16)).unwrap();
    let heat = Field::from_fn(16, 16, |_, _| 1.0f32);
    solver.set_flow(FlowKind::Temperature, &heat.view()).unwrap();

    solver.update(1.0 / 60.0);

    assert!(solver.temperature().iter().all(|t| *t == 1.0));
    assert!(solver.velocity().iter().all(|v| *v == Vec2::ZERO));
}

#[test]
fn test_viscosity_smooths_velocity() {
    let mut solver = FluidSolver::new((16, 16), (16, 16)).unwrap();
    solver.parameters_mut().set_viscosity(1.0);
    let spike = Field::from_fn(16, 16, |x, y| if x == 8 && y == 8 { Vec2::new(0.0, 1.0) } else { Vec2::ZERO });
    solver.set_flow(FlowKind::Velocity, &spike.view()).unwrap();

    solver.update(1.0 / 60.0);

    assert!(solver.velocity().get(8, 8).y < 0.5);
    assert!(solver.velocity().is_finite());
}

#[test]
fn test_frame_stats_are_recorded() {
    let mut solver = FluidSolver::new((16, 16), (16, 16)).unwrap();

    solver.update(1.0 / 60.0);

    let stats = solver.last_frame_stats();
    assert!(stats.total_us >= stats.pressure_us);
}
