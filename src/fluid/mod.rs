/// Grid Fluid Dynamics System
///
/// Semi-Lagrangian, Jacobi-relaxed Navier-Stokes solver built from a fixed
/// catalogue of data-parallel passes over double-buffered 2D fields.
/// Every pass reads from source fields and writes one destination field,
/// rows in parallel.

pub mod fluid_data;
pub mod fluid_compute;
pub mod pressure_solver;
pub mod obstacle;
pub mod parameters;
pub mod flow;
pub mod fluid_solver;
pub mod performance;

pub use fluid_data::{Field, FieldView, PingPong, Texel, TexelFormat};
pub use flow::FlowKind;
pub use fluid_solver::FluidSolver;
pub use parameters::{BuoyancyParameters, DissipationParameters, FluidParameters, ParameterInfo, ParameterRange};
pub use performance::{FluidPerformanceMetrics, FluidPerformanceMonitor, FrameStats, PerformanceStatus};

#[cfg(test)]
mod tests;
