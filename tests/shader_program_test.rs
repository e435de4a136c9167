//! Program lifecycle tests: compilation, linking, diagnostics, and uniform
//! resolution, all without touching a GPU device.

use relief_engine::error::EngineError;
use relief_engine::shader::{
    ProgramState, ShaderProgram, StageKind, UniformBlock, UniformValue, LOCATION_NOT_FOUND,
};

const VS_SOURCE: &str = r#"
struct Params {
    start_finish: vec4<f32>,
    samples: vec2<u32>,
    seed: u32,
}
@group(0) @binding(0) var<uniform> params: Params;

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) shade: f32,
}

@vertex
fn vs_main(@builtin(vertex_index) vid: u32) -> VsOut {
    var out: VsOut;
    out.clip = vec4<f32>(f32(vid), params.start_finish.x, 0.0, 1.0);
    out.shade = f32(params.seed);
    return out;
}
"#;

const FS_SOURCE: &str = r#"
struct Params {
    start_finish: vec4<f32>,
    samples: vec2<u32>,
    seed: u32,
}
@group(0) @binding(0) var<uniform> params: Params;

struct FsIn {
    @builtin(position) clip: vec4<f32>,
    @location(0) shade: f32,
}

@fragment
fn fs_main(in: FsIn) -> @location(0) vec4<f32> {
    return vec4<f32>(in.shade, params.start_finish.y, 0.0, 1.0);
}
"#;

const CS_SOURCE: &str = r#"
struct Params {
    start_finish: vec4<f32>,
    samples: vec2<u32>,
    seed: u32,
}
@group(0) @binding(0) var<uniform> params: Params;
@group(0) @binding(1) var<storage, read_write> out_data: array<f32>;

@compute @workgroup_size(8, 8, 1)
fn generate(@builtin(global_invocation_id) gid: vec3<u32>) {
    if (gid.x < params.samples.x && gid.y < params.samples.y) {
        out_data[gid.y * params.samples.x + gid.x] = f32(params.seed);
    }
}
"#;

fn linked_program() -> ShaderProgram {
    let mut program = ShaderProgram::new("test");
    assert!(program.compile_stage(StageKind::Vertex, VS_SOURCE).ok);
    assert!(program.compile_stage(StageKind::Fragment, FS_SOURCE).ok);
    assert!(program.link().ok);
    program
}

#[test]
fn invalid_stage_fails_link_with_diagnostics() {
    let mut program = ShaderProgram::new("broken");
    let result = program.compile_stage(StageKind::Vertex, "@vertex fn broken( {");
    assert!(!result.ok);
    assert!(!result.diagnostic.is_empty());

    // The second stage is still attempted and compiles fine.
    assert!(program.compile_stage(StageKind::Fragment, FS_SOURCE).ok);

    let link = program.link();
    assert!(!link.ok);
    assert!(!program.success());
    assert!(!program.info_log().is_empty());
    assert_eq!(program.state(), ProgramState::Failed);
}

#[test]
fn valid_program_links_with_empty_log() {
    let program = linked_program();
    assert!(program.success());
    assert!(program.info_log().is_empty());
    assert_eq!(program.state(), ProgramState::Linked);
}

#[test]
fn diagnostic_log_is_bounded() {
    let mut program = ShaderProgram::new("noisy");
    for _ in 0..20 {
        program.compile_stage(StageKind::Vertex, "fn nope( -> {{{{");
        program.link();
    }
    assert!(program.info_log().len() <= relief_engine::shader::INFO_LOG_CAPACITY);
}

#[test]
fn uniform_locations_reflect_block_layout() {
    let program = linked_program();
    assert_eq!(program.uniform_location("start_finish"), 0);
    assert_eq!(program.uniform_location("samples"), 16);
    assert_eq!(program.uniform_location("seed"), 24);
    assert_eq!(program.uniform_block_size(), Some(32));
}

#[test]
fn absent_name_returns_sentinel_and_push_is_a_no_op() {
    let program = linked_program();
    assert_eq!(program.uniform_location("missing"), LOCATION_NOT_FOUND);

    let mut block = UniformBlock::new(
        "test",
        &[
            ("missing", UniformValue::F32(123.0)),
            ("seed", UniformValue::U32(9)),
        ],
    );
    block.resolve(&program).expect("resolve should succeed");

    let mut staging = vec![0u8; 32];
    block.write_into(&mut staging);

    // The unknown parameter never lands anywhere; the known one does.
    assert_eq!(&staging[0..16], &[0u8; 16]);
    assert_eq!(&staging[24..28], &9u32.to_le_bytes());
}

#[test]
fn cached_values_land_at_resolved_offsets() {
    let program = linked_program();
    let mut block = UniformBlock::new(
        "test",
        &[
            ("start_finish", UniformValue::Vec4([1.0, 2.0, 3.0, 4.0])),
            ("samples", UniformValue::Vec2U([10, 20])),
            ("seed", UniformValue::U32(7)),
        ],
    );
    block.resolve(&program).expect("resolve should succeed");
    assert_eq!(block.span(), 32);

    let mut staging = vec![0u8; block.span() as usize];
    block.write_into(&mut staging);

    assert_eq!(&staging[0..4], &1.0f32.to_le_bytes());
    assert_eq!(&staging[12..16], &4.0f32.to_le_bytes());
    assert_eq!(&staging[16..20], &10u32.to_le_bytes());
    assert_eq!(&staging[20..24], &20u32.to_le_bytes());
    assert_eq!(&staging[24..28], &7u32.to_le_bytes());
}

#[test]
fn relinking_invalidates_resolved_blocks() {
    let mut program = linked_program();
    let mut block = UniformBlock::new("test", &[("seed", UniformValue::U32(1))]);
    block.resolve(&program).expect("resolve should succeed");
    assert!(block.ensure_current(&program).is_ok());

    // Recompile and relink; offsets from the old link must be refused.
    program.compile_stage(StageKind::Vertex, VS_SOURCE);
    assert!(program.link().ok);

    match block.ensure_current(&program) {
        Err(EngineError::StaleBindings {
            resolved, current, ..
        }) => {
            assert!(current > resolved);
        }
        other => panic!("expected StaleBindings, got {:?}", other.err()),
    }

    // Resolving again repairs the block.
    block.resolve(&program).expect("re-resolve should succeed");
    assert!(block.ensure_current(&program).is_ok());
}

#[test]
fn unresolved_block_refuses_to_push() {
    let program = linked_program();
    let block = UniformBlock::new("test", &[("seed", UniformValue::U32(1))]);
    assert!(matches!(
        block.ensure_current(&program),
        Err(EngineError::UnresolvedBindings { .. })
    ));
}

#[test]
fn fragment_input_missing_from_vertex_fails_link() {
    let fs_extra_input = r#"
struct FsIn {
    @location(0) shade: f32,
    @location(3) extra: f32,
}

@fragment
fn fs_main(in: FsIn) -> @location(0) vec4<f32> {
    return vec4<f32>(in.shade + in.extra, 0.0, 0.0, 1.0);
}
"#;
    let mut program = ShaderProgram::new("mismatched_io");
    assert!(program.compile_stage(StageKind::Vertex, VS_SOURCE).ok);
    assert!(program.compile_stage(StageKind::Fragment, fs_extra_input).ok);
    let link = program.link();
    assert!(!link.ok);
    assert!(program.info_log().contains("@location(3)"));
}

#[test]
fn disagreeing_uniform_blocks_fail_link() {
    let fs_other_block = r#"
struct Params {
    seed: u32,
    samples: vec2<u32>,
}
@group(0) @binding(0) var<uniform> params: Params;

@fragment
fn fs_main(@location(0) shade: f32) -> @location(0) vec4<f32> {
    return vec4<f32>(shade, f32(params.seed), 0.0, 1.0);
}
"#;
    let mut program = ShaderProgram::new("mismatched_uniforms");
    assert!(program.compile_stage(StageKind::Vertex, VS_SOURCE).ok);
    assert!(program.compile_stage(StageKind::Fragment, fs_other_block).ok);
    assert!(!program.link().ok);
    assert!(!program.success());
}

#[test]
fn compute_stage_reflection() {
    let mut program = ShaderProgram::new("field");
    assert!(program.compile_stage(StageKind::Compute, CS_SOURCE).ok);
    assert!(program.link().ok);
    assert!(program.success());
    assert_eq!(program.entry_point_name(StageKind::Compute), Some("generate"));
    assert_eq!(program.workgroup_size(), Some([8, 8, 1]));
}

#[test]
fn link_without_stages_fails() {
    let mut program = ShaderProgram::new("empty");
    assert!(!program.link().ok);
    assert!(!program.success());
    assert!(!program.info_log().is_empty());
}
