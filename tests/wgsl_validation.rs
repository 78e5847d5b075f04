use naga::front::wgsl::parse_str;
use naga::valid::{Capabilities, ValidationFlags, Validator};

const PARTICLE_SHADER: &str = include_str!("../src/render/shader_particles.wgsl");

#[test]
fn particle_shader_parses_and_validates() {
    let module = parse_str(PARTICLE_SHADER)
        .unwrap_or_else(|e| panic!("WGSL parse error: {}", e.emit_to_string(PARTICLE_SHADER)));
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .unwrap_or_else(|e| panic!("WGSL validation error: {:?}", e));
}

#[test]
fn particle_shader_exposes_expected_entry_points() {
    let module = parse_str(PARTICLE_SHADER).expect("shader parses");
    let names: Vec<&str> = module
        .entry_points
        .iter()
        .map(|ep| ep.name.as_str())
        .collect();
    for expected in ["vs_main", "vs_glow", "fs_main", "fs_glow"] {
        assert!(names.contains(&expected), "missing entry point {}", expected);
    }
}
