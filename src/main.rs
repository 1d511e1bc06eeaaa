/// Headless fluid-flow driver
///
/// Usage: fluid-flow [config.toml] [frames]
///
/// Runs a jet of dyed fluid past a disc obstacle and logs what a sensor
/// downstream of the disc sees, plus solver timings.

use anyhow::{Context, Result};
use glam::{Vec2, Vec4};

use fluid_flow::fluid::performance::record_frame;
use fluid_flow::fluid::{FluidPerformanceMonitor, PerformanceStatus, Texel};
use fluid_flow::{AreaSensor, Field, FlowKind, FluidParameters, FluidSolver, RegionOfInterest};

const SIMULATION_SIZE: (usize, usize) = (128, 128);
const DENSITY_SIZE: (usize, usize) = (256, 256);
const DEFAULT_FRAMES: u32 = 300;
const DELTA_TIME: f32 = 1.0 / 60.0;
const REPORT_INTERVAL: u32 = 60;

fn disc(size: (usize, usize), centre: Vec2, radius: f32) -> Field<f32> {
    Field::from_fn(size.0, size.1, |x, y| {
        if Vec2::new(x as f32, y as f32).distance(centre) <= radius {
            1.0
        } else {
            0.0
        }
    })
}

/// Rightward jet along the left edge, `half_height` cells either side of centre
fn jet<T: Texel>(size: (usize, usize), half_height: usize, value: T) -> Field<T> {
    let centre = size.1 / 2;
    Field::from_fn(size.0, size.1, |x, y| {
        if x < size.0 / 32 && y.abs_diff(centre) <= half_height {
            value
        } else {
            T::ZERO
        }
    })
}

fn load_parameters(path: Option<&str>) -> Result<FluidParameters> {
    match path {
        Some(path) => FluidParameters::load(path).with_context(|| format!("loading fluid parameters from {}", path)),
        None => Ok(FluidParameters::default()),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let parameters = load_parameters(args.first().map(String::as_str))?;
    let frames = match args.get(1) {
        Some(frames) => frames
            .parse::<u32>()
            .with_context(|| format!("invalid frame count '{}'", frames))?,
        None => DEFAULT_FRAMES,
    };

    let mut solver = FluidSolver::new(SIMULATION_SIZE, DENSITY_SIZE)
        .context("allocating fluid solver")?
        .with_parameters(parameters);

    let centre = Vec2::new(SIMULATION_SIZE.0 as f32 * 0.35, SIMULATION_SIZE.1 as f32 * 0.5);
    let obstacle = disc(SIMULATION_SIZE, centre, SIMULATION_SIZE.1 as f32 * 0.1);
    solver.set_flow(FlowKind::Obstacle, &obstacle.view())?;

    let velocity_jet = jet(SIMULATION_SIZE, SIMULATION_SIZE.1 / 16, Vec2::new(2.0, 0.0));
    let dye_jet = jet(DENSITY_SIZE, DENSITY_SIZE.1 / 16, Vec4::new(0.2, 0.6, 1.0, 1.0));
    let heat_jet = jet(SIMULATION_SIZE, SIMULATION_SIZE.1 / 16, 1.0f32);

    let wake = AreaSensor::new(FlowKind::Velocity, RegionOfInterest::new(0.5, 0.4, 0.2, 0.2));
    let dye = AreaSensor::new(FlowKind::Density, RegionOfInterest::new(0.5, 0.4, 0.2, 0.2));
    let mut monitor = FluidPerformanceMonitor::default();

    log::info!(
        "Running {} frames: simulation {:?}, density {:?}",
        frames,
        SIMULATION_SIZE,
        DENSITY_SIZE
    );

    for frame in 1..=frames {
        solver.add_flow(FlowKind::Velocity, &velocity_jet.view(), DELTA_TIME)?;
        solver.add_flow(FlowKind::Density, &dye_jet.view(), DELTA_TIME)?;
        if solver.parameters().buoyancy().enabled() {
            solver.add_flow(FlowKind::Temperature, &heat_jet.view(), DELTA_TIME)?;
        }

        solver.update(DELTA_TIME);
        record_frame(&mut monitor, solver.last_frame_stats());

        if frame % REPORT_INTERVAL == 0 || frame == frames {
            if let Some(reading) = wake.read(&solver) {
                log::info!(
                    "[frame {}] wake direction ({:.3}, {:.3}), speed {:.4}",
                    frame,
                    reading.direction.x,
                    reading.direction.y,
                    reading.magnitude
                );
            }
            if let Some(reading) = dye.read(&solver) {
                log::info!("[frame {}] dye {:.4}", frame, reading.magnitude);
            }

            let metrics = monitor.get_metrics();
            log::info!(
                "[frame {}] update {:.2} ms (pressure {:.2} ms, worst {:.2} ms)",
                frame,
                metrics.update_ms,
                metrics.pressure_solve_ms,
                metrics.worst_update_ms
            );
            if monitor.check_performance() == PerformanceStatus::Poor {
                log::warn!("Fluid update over frame budget");
            }
        }
    }

    if !solver.velocity().is_finite() || !solver.density().is_finite() {
        anyhow::bail!("simulation diverged");
    }

    log::info!("Done; max speed {:.4}", solver.velocity().max_length());
    Ok(())
}
