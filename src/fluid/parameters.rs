//! Range-clamped tunables for the fluid solver.
//!
//! Every value is clamped to its declared range on write and on load;
//! out-of-range input is never rejected.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{FluidError, FluidResult};

/// Declared range and default of a scalar parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ParameterRange {
    pub const fn new(min: f32, max: f32, default: f32) -> Self {
        Self { min, max, default }
    }

    /// Clamp into range; NaN falls back to the default
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

pub const SPEED: ParameterRange = ParameterRange::new(0.0, 1.0, 0.5);
pub const ITERATIONS: ParameterRange = ParameterRange::new(1.0, 100.0, 40.0);
pub const VISCOSITY: ParameterRange = ParameterRange::new(0.0, 1.0, 0.0);
pub const VORTICITY: ParameterRange = ParameterRange::new(0.0, 1.0, 0.0);
pub const DISSIPATION_VELOCITY: ParameterRange = ParameterRange::new(0.0, 0.025, 0.0015);
pub const DISSIPATION_DENSITY: ParameterRange = ParameterRange::new(0.0, 0.025, 0.0015);
pub const DISSIPATION_PRESSURE: ParameterRange = ParameterRange::new(0.0, 0.1, 0.025);
pub const BUOYANCY_SIGMA: ParameterRange = ParameterRange::new(0.0, 1.0, 0.5);
pub const BUOYANCY_WEIGHT: ParameterRange = ParameterRange::new(0.0, 1.0, 0.05);
pub const AMBIENT_TEMPERATURE: ParameterRange = ParameterRange::new(0.0, 1.0, 0.75);
pub const GRAVITY_X: ParameterRange = ParameterRange::new(-1.0, 1.0, 0.0);
pub const GRAVITY_Y: ParameterRange = ParameterRange::new(-1.0, 1.0, -0.980665);

fn clamp_iterations(value: f32) -> u32 {
    ITERATIONS.clamp(value).round() as u32
}

/// Accept any TOML number for `iterations` and clamp it like `set_iterations`
fn deserialize_iterations<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = f64::deserialize(deserializer)?;
    Ok(clamp_iterations(value as f32))
}

/// Name, current value and range of one tunable, for configuration UIs
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    pub name: &'static str,
    pub value: f32,
    pub min: f32,
    pub max: f32,
}

/// Exponential decay rates applied once per frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DissipationParameters {
    velocity: f32,
    density: f32,
    pressure: f32,
}

impl Default for DissipationParameters {
    fn default() -> Self {
        Self {
            velocity: DISSIPATION_VELOCITY.default,
            density: DISSIPATION_DENSITY.default,
            pressure: DISSIPATION_PRESSURE.default,
        }
    }
}

impl DissipationParameters {
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn pressure(&self) -> f32 {
        self.pressure
    }

    pub fn set_velocity(&mut self, value: f32) {
        self.velocity = DISSIPATION_VELOCITY.clamp(value);
    }

    pub fn set_density(&mut self, value: f32) {
        self.density = DISSIPATION_DENSITY.clamp(value);
    }

    pub fn set_pressure(&mut self, value: f32) {
        self.pressure = DISSIPATION_PRESSURE.clamp(value);
    }
}

/// Smoke buoyancy stage settings. Disabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuoyancyParameters {
    enabled: bool,
    sigma: f32,
    weight: f32,
    ambient_temperature: f32,
    gravity: Vec2,
}

impl Default for BuoyancyParameters {
    fn default() -> Self {
        Self {
            enabled: false,
            sigma: BUOYANCY_SIGMA.default,
            weight: BUOYANCY_WEIGHT.default,
            ambient_temperature: AMBIENT_TEMPERATURE.default,
            gravity: Vec2::new(GRAVITY_X.default, GRAVITY_Y.default),
        }
    }
}

impl BuoyancyParameters {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn sigma(&self) -> f32 {
        self.sigma
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn ambient_temperature(&self) -> f32 {
        self.ambient_temperature
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_sigma(&mut self, value: f32) {
        self.sigma = BUOYANCY_SIGMA.clamp(value);
    }

    pub fn set_weight(&mut self, value: f32) {
        self.weight = BUOYANCY_WEIGHT.clamp(value);
    }

    pub fn set_ambient_temperature(&mut self, value: f32) {
        self.ambient_temperature = AMBIENT_TEMPERATURE.clamp(value);
    }

    pub fn set_gravity(&mut self, value: Vec2) {
        self.gravity = Vec2::new(GRAVITY_X.clamp(value.x), GRAVITY_Y.clamp(value.y));
    }

    /// True when the stage should contribute a force this frame
    pub fn is_active(&self) -> bool {
        self.enabled && self.sigma > 0.0 && self.weight > 0.0
    }
}

/// Fluid solver parameter set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidParameters {
    speed: f32,
    #[serde(deserialize_with = "deserialize_iterations")]
    iterations: u32,
    viscosity: f32,
    vorticity: f32,
    dissipation: DissipationParameters,
    buoyancy: BuoyancyParameters,
}

impl Default for FluidParameters {
    fn default() -> Self {
        Self {
            speed: SPEED.default,
            iterations: ITERATIONS.default as u32,
            viscosity: VISCOSITY.default,
            vorticity: VORTICITY.default,
            dissipation: DissipationParameters::default(),
            buoyancy: BuoyancyParameters::default(),
        }
    }
}

const TOP_LEVEL_KEYS: &[&str] = &["speed", "iterations", "viscosity", "vorticity", "dissipation", "buoyancy"];
const DISSIPATION_KEYS: &[&str] = &["velocity", "density", "pressure"];
const BUOYANCY_KEYS: &[&str] = &["enabled", "sigma", "weight", "ambient_temperature", "gravity"];

fn warn_unknown_keys(table: &toml::Table, prefix: &str, known: &[&str]) {
    for key in table.keys().filter(|key| !known.contains(&key.as_str())) {
        log::warn!("Ignoring unknown fluid parameter: {}{}", prefix, key);
    }
}

impl FluidParameters {
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn viscosity(&self) -> f32 {
        self.viscosity
    }

    pub fn vorticity(&self) -> f32 {
        self.vorticity
    }

    pub fn dissipation(&self) -> &DissipationParameters {
        &self.dissipation
    }

    pub fn dissipation_mut(&mut self) -> &mut DissipationParameters {
        &mut self.dissipation
    }

    pub fn buoyancy(&self) -> &BuoyancyParameters {
        &self.buoyancy
    }

    pub fn buoyancy_mut(&mut self) -> &mut BuoyancyParameters {
        &mut self.buoyancy
    }

    pub fn set_speed(&mut self, value: f32) {
        self.speed = SPEED.clamp(value);
    }

    pub fn set_iterations(&mut self, value: u32) {
        self.iterations = clamp_iterations(value as f32);
    }

    pub fn set_viscosity(&mut self, value: f32) {
        self.viscosity = VISCOSITY.clamp(value);
    }

    pub fn set_vorticity(&mut self, value: f32) {
        self.vorticity = VORTICITY.clamp(value);
    }

    /// Re-apply every declared range
    pub fn clamped(mut self) -> Self {
        self.set_speed(self.speed);
        self.set_iterations(self.iterations);
        self.set_viscosity(self.viscosity);
        self.set_vorticity(self.vorticity);

        let dissipation = self.dissipation;
        self.dissipation.set_velocity(dissipation.velocity);
        self.dissipation.set_density(dissipation.density);
        self.dissipation.set_pressure(dissipation.pressure);

        let buoyancy = self.buoyancy;
        self.buoyancy.set_sigma(buoyancy.sigma);
        self.buoyancy.set_weight(buoyancy.weight);
        self.buoyancy.set_ambient_temperature(buoyancy.ambient_temperature);
        self.buoyancy.set_gravity(buoyancy.gravity);
        self
    }

    /// Every scalar tunable with its current value and range
    pub fn infos(&self) -> Vec<ParameterInfo> {
        let info = |name, value, range: ParameterRange| ParameterInfo {
            name,
            value,
            min: range.min,
            max: range.max,
        };

        vec![
            info("speed", self.speed, SPEED),
            info("iterations", self.iterations as f32, ITERATIONS),
            info("viscosity", self.viscosity, VISCOSITY),
            info("vorticity", self.vorticity, VORTICITY),
            info("dissipation.velocity", self.dissipation.velocity, DISSIPATION_VELOCITY),
            info("dissipation.density", self.dissipation.density, DISSIPATION_DENSITY),
            info("dissipation.pressure", self.dissipation.pressure, DISSIPATION_PRESSURE),
            info("buoyancy.sigma", self.buoyancy.sigma, BUOYANCY_SIGMA),
            info("buoyancy.weight", self.buoyancy.weight, BUOYANCY_WEIGHT),
            info("buoyancy.ambient_temperature", self.buoyancy.ambient_temperature, AMBIENT_TEMPERATURE),
            info("buoyancy.gravity.x", self.buoyancy.gravity.x, GRAVITY_X),
            info("buoyancy.gravity.y", self.buoyancy.gravity.y, GRAVITY_Y),
        ]
    }

    pub fn get_by_name(&self, name: &str) -> Option<f32> {
        self.infos()
            .into_iter()
            .find(|info| info.name == name)
            .map(|info| info.value)
    }

    /// Write a tunable by name, clamping to its range
    pub fn set_by_name(&mut self, name: &str, value: f32) -> FluidResult<()> {
        match name {
            "speed" => self.set_speed(value),
            "iterations" => self.iterations = clamp_iterations(value),
            "viscosity" => self.set_viscosity(value),
            "vorticity" => self.set_vorticity(value),
            "dissipation.velocity" => self.dissipation.set_velocity(value),
            "dissipation.density" => self.dissipation.set_density(value),
            "dissipation.pressure" => self.dissipation.set_pressure(value),
            "buoyancy.sigma" => self.buoyancy.set_sigma(value),
            "buoyancy.weight" => self.buoyancy.set_weight(value),
            "buoyancy.ambient_temperature" => self.buoyancy.set_ambient_temperature(value),
            "buoyancy.gravity.x" => {
                let gravity = Vec2::new(value, self.buoyancy.gravity.y);
                self.buoyancy.set_gravity(gravity);
            }
            "buoyancy.gravity.y" => {
                let gravity = Vec2::new(self.buoyancy.gravity.x, value);
                self.buoyancy.set_gravity(gravity);
            }
            _ => return Err(FluidError::UnknownParameter(name.to_string())),
        }
        Ok(())
    }

    /// Parse TOML; missing keys take defaults, values are clamped
    pub fn from_toml_str(source: &str) -> FluidResult<Self> {
        let table: toml::Table = toml::from_str(source)?;

        warn_unknown_keys(&table, "", TOP_LEVEL_KEYS);
        if let Some(toml::Value::Table(dissipation)) = table.get("dissipation") {
            warn_unknown_keys(dissipation, "dissipation.", DISSIPATION_KEYS);
        }
        if let Some(toml::Value::Table(buoyancy)) = table.get("buoyancy") {
            warn_unknown_keys(buoyancy, "buoyancy.", BUOYANCY_KEYS);
        }

        let parameters: FluidParameters = toml::Value::Table(table).try_into()?;
        Ok(parameters.clamped())
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> FluidResult<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        let parameters = Self::from_toml_str(&source)?;
        log::info!("Loaded fluid parameters from {}", path.as_ref().display());
        Ok(parameters)
    }

    pub fn to_toml_string(&self) -> FluidResult<String> {
        Ok(toml::to_string(self)?)
    }
}
