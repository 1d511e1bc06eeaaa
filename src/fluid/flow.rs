use std::fmt;

/// Flow kinds exchanged between flow-toolkit stages.
///
/// The fluid solver consumes `Velocity`, `Density`, `Temperature`,
/// `Pressure` and `Obstacle`. The remaining kinds belong to other stages
/// (optical flow inputs, normalized/split velocity views).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    None,
    Input,
    Output,
    Velocity,
    VelocityNorm,
    VelocitySplit,
    Density,
    Temperature,
    Pressure,
    Obstacle,
}

impl FlowKind {
    pub const ALL: [FlowKind; 10] = [
        FlowKind::None,
        FlowKind::Input,
        FlowKind::Output,
        FlowKind::Velocity,
        FlowKind::VelocityNorm,
        FlowKind::VelocitySplit,
        FlowKind::Density,
        FlowKind::Temperature,
        FlowKind::Pressure,
        FlowKind::Obstacle,
    ];

    /// Stable name used by bindings and config files
    pub fn name(&self) -> &'static str {
        match self {
            FlowKind::None => "none",
            FlowKind::Input => "input",
            FlowKind::Output => "output",
            FlowKind::Velocity => "velocity",
            FlowKind::VelocityNorm => "velocity_norm",
            FlowKind::VelocitySplit => "velocity_split",
            FlowKind::Density => "density",
            FlowKind::Temperature => "temperature",
            FlowKind::Pressure => "pressure",
            FlowKind::Obstacle => "obstacle",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
