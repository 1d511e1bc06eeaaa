//! Loading solver parameters from TOML files on disk

use std::io::Write;

use fluid_flow::{FluidError, FluidParameters, FluidSolver};
use tempfile::NamedTempFile;

#[test]
fn test_load_parameters_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
speed = 0.8
iterations = 20
vorticity = 0.4

[dissipation]
density = 0.01

[buoyancy]
enabled = true
gravity = [0.0, -0.5]
"#
    )
    .unwrap();

    let parameters = FluidParameters::load(file.path()).unwrap();

    assert_eq!(parameters.speed(), 0.8);
    assert_eq!(parameters.iterations(), 20);
    assert_eq!(parameters.vorticity(), 0.4);
    assert_eq!(parameters.viscosity(), 0.0);
    assert_eq!(parameters.dissipation().density(), 0.01);
    assert!(parameters.buoyancy().enabled());
    assert_eq!(parameters.buoyancy().gravity().y, -0.5);

    let solver = FluidSolver::new((8, 8), (8, 8)).unwrap().with_parameters(parameters);
    assert_eq!(solver.parameters().iterations(), 20);
}

#[test]
fn test_out_of_range_file_values_are_clamped() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "speed = 4.0\niterations = 0\nunknown_knob = 1").unwrap();

    let parameters = FluidParameters::load(file.path()).unwrap();

    assert_eq!(parameters.speed(), 1.0);
    assert_eq!(parameters.iterations(), 1);
}

#[test]
fn test_iterations_accept_any_number() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "iterations = -5").unwrap();
    assert_eq!(FluidParameters::load(file.path()).unwrap().iterations(), 1);

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "iterations = 12.0").unwrap();
    assert_eq!(FluidParameters::load(file.path()).unwrap().iterations(), 12);

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "iterations = 12.6\nspeed = 1").unwrap();
    let parameters = FluidParameters::load(file.path()).unwrap();
    assert_eq!(parameters.iterations(), 13);
    assert_eq!(parameters.speed(), 1.0);

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "iterations = 100000").unwrap();
    assert_eq!(FluidParameters::load(file.path()).unwrap().iterations(), 100);
}

#[test]
fn test_saved_parameters_load_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fluid.toml");

    let mut parameters = FluidParameters::default();
    parameters.set_viscosity(0.25);
    parameters.buoyancy_mut().set_enabled(true);
    std::fs::write(&path, parameters.to_toml_string().unwrap()).unwrap();

    assert_eq!(FluidParameters::load(&path).unwrap(), parameters);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();

    let result = FluidParameters::load(dir.path().join("absent.toml"));

    assert!(matches!(result, Err(FluidError::Io(_))));
}

#[test]
fn test_malformed_file_is_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "speed = [").unwrap();

    assert!(matches!(FluidParameters::load(file.path()), Err(FluidError::Config(_))));
}
