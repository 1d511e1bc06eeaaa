pub mod error;
pub mod fluid;
pub mod sensor;

pub use error::{FluidError, FluidResult};
pub use fluid::{Field, FieldView, FlowKind, FluidParameters, FluidSolver, TexelFormat};
pub use sensor::{AreaReading, AreaSensor, RegionOfInterest};
