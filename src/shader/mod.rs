//! GPU program lifecycle
//!
//! Compiles WGSL stage sources with the naga front-end, links them into a
//! program with a reflected uniform layout, and reports failures through a
//! composite flag plus a bounded diagnostic log instead of aborting, so a
//! broken stage never takes down stage compilation that follows it.

use wgpu::naga;

pub mod bindings;
mod reflect;

pub use bindings::{UniformBlock, UniformValue};

pub(crate) use reflect::UniformBlockLayout;

/// Diagnostic log capacity in bytes; older text wins, overflow is dropped.
pub const INFO_LOG_CAPACITY: usize = 1024;

/// Returned by `uniform_location` for names absent from the uniform block.
pub const LOCATION_NOT_FOUND: i32 = -1;

/// Shader stage kinds accepted by the program manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
    Compute,
}

impl StageKind {
    pub fn label(self) -> &'static str {
        match self {
            StageKind::Vertex => "vertex",
            StageKind::Fragment => "fragment",
            StageKind::Compute => "compute",
        }
    }
}

/// Program lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramState {
    Uninitialized,
    Compiling,
    Linked,
    Failed,
}

/// Outcome of compiling one stage
#[derive(Debug)]
pub struct CompileResult {
    pub ok: bool,
    pub diagnostic: String,
}

/// Outcome of a link attempt
#[derive(Debug)]
pub struct LinkResult {
    pub ok: bool,
    pub diagnostic: String,
}

struct Stage {
    kind: StageKind,
    source: String,
    module: Option<naga::Module>,
    ok: bool,
}

/// A GPU program assembled from independently compiled stages.
///
/// Owned by the component that requested it; dropping it releases
/// everything. Render and compute pipelines are built from the linked
/// stages by their consumers.
pub struct ShaderProgram {
    name: String,
    stages: Vec<Stage>,
    state: ProgramState,
    info_log: String,
    has_errors: bool,
    generation: u64,
    layout: Option<UniformBlockLayout>,
}

impl ShaderProgram {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            state: ProgramState::Uninitialized,
            info_log: String::new(),
            has_errors: false,
            generation: 0,
            layout: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ProgramState {
        self.state
    }

    /// Composite flag: every stage compiled and the last link succeeded.
    pub fn success(&self) -> bool {
        self.state == ProgramState::Linked && !self.has_errors
    }

    /// Bounded diagnostic text; empty after a successful link.
    pub fn info_log(&self) -> &str {
        &self.info_log
    }

    /// Bumped on every successful link; uniform blocks resolved against an
    /// older generation refuse to push.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Compile one stage from source text. A failure is recorded in the
    /// composite flag and the log; it does not prevent compiling further
    /// stages. Compiling a kind again replaces the previous stage.
    pub fn compile_stage(&mut self, kind: StageKind, source: &str) -> CompileResult {
        self.state = ProgramState::Compiling;
        self.stages.retain(|s| s.kind != kind);

        let outcome = match naga::front::wgsl::parse_str(source) {
            Ok(module) => {
                let mut validator = naga::valid::Validator::new(
                    naga::valid::ValidationFlags::all(),
                    naga::valid::Capabilities::all(),
                );
                match validator.validate(&module) {
                    Ok(_) => Ok(module),
                    Err(error) => Err(format!(
                        "{} stage of '{}' failed validation: {}",
                        kind.label(),
                        self.name,
                        error.into_inner()
                    )),
                }
            }
            Err(error) => Err(format!(
                "{} stage of '{}' failed to parse:\n{}",
                kind.label(),
                self.name,
                error.emit_to_string(source)
            )),
        };

        match outcome {
            Ok(module) => {
                log::debug!("[ShaderProgram] '{}': {} stage compiled", self.name, kind.label());
                self.stages.push(Stage {
                    kind,
                    source: source.to_string(),
                    module: Some(module),
                    ok: true,
                });
                CompileResult {
                    ok: true,
                    diagnostic: String::new(),
                }
            }
            Err(diagnostic) => {
                log::warn!(
                    "[ShaderProgram] '{}': {} stage failed to compile",
                    self.name,
                    kind.label()
                );
                self.has_errors = true;
                self.append_log(&diagnostic);
                self.stages.push(Stage {
                    kind,
                    source: source.to_string(),
                    module: None,
                    ok: false,
                });
                CompileResult {
                    ok: false,
                    diagnostic,
                }
            }
        }
    }

    /// Attempt to link every compiled stage into a usable program.
    ///
    /// Stages that failed to compile are still considered here rather than
    /// gating the attempt on per-stage success; the link then fails with
    /// the accumulated diagnostics. This is a deliberate policy so that one
    /// link attempt surfaces every broken stage at once.
    pub fn link(&mut self) -> LinkResult {
        if self.stages.is_empty() {
            return self.fail_link("link attempted with no stages".to_string());
        }

        let failed: Vec<&'static str> = self
            .stages
            .iter()
            .filter(|s| !s.ok)
            .map(|s| s.kind.label())
            .collect();
        if !failed.is_empty() {
            return self.fail_link(format!("link failed: broken stages: {}", failed.join(", ")));
        }

        if let Some(message) = self.check_interfaces() {
            return self.fail_link(message);
        }

        let mut layout: Option<UniformBlockLayout> = None;
        for stage in &self.stages {
            let module = stage.module.as_ref().expect("compiled stage has a module");
            if let Some(block) = reflect::uniform_block(module) {
                if layout.is_none() {
                    layout = Some(block);
                }
            }
        }

        self.layout = layout;
        self.state = ProgramState::Linked;
        self.has_errors = false;
        self.info_log.clear();
        self.generation += 1;
        log::info!(
            "[ShaderProgram] '{}' linked (generation {})",
            self.name,
            self.generation
        );
        LinkResult {
            ok: true,
            diagnostic: String::new(),
        }
    }

    /// Byte offset of a named member of the program's uniform block, or
    /// [`LOCATION_NOT_FOUND`]. Absent names are not an error.
    pub fn uniform_location(&self, name: &str) -> i32 {
        self.layout
            .as_ref()
            .and_then(|block| block.member(name))
            .map(|member| member.offset as i32)
            .unwrap_or(LOCATION_NOT_FOUND)
    }

    /// Size in bytes of the uniform block, if the program declares one.
    pub fn uniform_block_size(&self) -> Option<u64> {
        self.layout.as_ref().map(|block| block.span as u64)
    }

    /// Bind point of the uniform block
    pub fn uniform_block_binding(&self) -> Option<(u32, u32)> {
        self.layout.as_ref().map(|block| (block.group, block.binding))
    }

    /// Source text of a stage, for building backend pipelines.
    pub fn stage_source(&self, kind: StageKind) -> Option<&str> {
        self.stage(kind).map(|s| s.source.as_str())
    }

    /// Entry point name of a linked stage.
    pub fn entry_point_name(&self, kind: StageKind) -> Option<&str> {
        let stage = self.stage(kind)?;
        let module = stage.module.as_ref()?;
        reflect::entry_point(module, kind).map(|ep| ep.name.as_str())
    }

    /// Workgroup dimensions of the compute entry point.
    pub fn workgroup_size(&self) -> Option<[u32; 3]> {
        let stage = self.stage(StageKind::Compute)?;
        let module = stage.module.as_ref()?;
        reflect::entry_point(module, StageKind::Compute).map(|ep| ep.workgroup_size)
    }

    pub(crate) fn uniform_layout(&self) -> Option<&UniformBlockLayout> {
        self.layout.as_ref()
    }

    fn stage(&self, kind: StageKind) -> Option<&Stage> {
        self.stages.iter().find(|s| s.kind == kind)
    }

    /// Cross-stage checks run at link time: entry point presence, the
    /// vertex→fragment location interface, and agreement between uniform
    /// blocks declared by more than one stage (offset-based pushes would
    /// otherwise land in the wrong slot).
    fn check_interfaces(&self) -> Option<String> {
        for stage in &self.stages {
            let module = stage.module.as_ref().expect("compiled stage has a module");
            if reflect::entry_point(module, stage.kind).is_none() {
                return Some(format!(
                    "link failed: no {} entry point declared",
                    stage.kind.label()
                ));
            }
        }

        if let (Some(vs), Some(fs)) = (self.stage(StageKind::Vertex), self.stage(StageKind::Fragment)) {
            let outputs = reflect::stage_outputs(vs.module.as_ref().unwrap(), StageKind::Vertex);
            let inputs = reflect::stage_inputs(fs.module.as_ref().unwrap(), StageKind::Fragment);
            let unmatched: Vec<String> = inputs
                .difference(&outputs)
                .map(|loc| format!("@location({})", loc))
                .collect();
            if !unmatched.is_empty() {
                return Some(format!(
                    "link failed: fragment inputs not written by the vertex stage: {}",
                    unmatched.join(", ")
                ));
            }
        }

        let mut first: Option<(StageKind, UniformBlockLayout)> = None;
        for stage in &self.stages {
            let module = stage.module.as_ref().unwrap();
            if let Some(block) = reflect::uniform_block(module) {
                match &first {
                    None => first = Some((stage.kind, block)),
                    Some((_, existing)) if *existing != block => {
                        return Some(format!(
                            "link failed: {} stage declares a uniform block that disagrees \
                             with an earlier stage",
                            stage.kind.label()
                        ));
                    }
                    Some(_) => {}
                }
            }
        }

        None
    }

    fn fail_link(&mut self, message: String) -> LinkResult {
        log::warn!("[ShaderProgram] '{}': {}", self.name, message);
        self.has_errors = true;
        self.append_log(&message);
        self.state = ProgramState::Failed;
        self.layout = None;
        LinkResult {
            ok: false,
            diagnostic: self.info_log.clone(),
        }
    }

    fn append_log(&mut self, text: &str) {
        let mut remaining = INFO_LOG_CAPACITY.saturating_sub(self.info_log.len());
        if !self.info_log.is_empty() {
            if remaining <= 1 {
                return;
            }
            self.info_log.push('\n');
            remaining -= 1;
        }
        if remaining == 0 {
            return;
        }
        let mut take = remaining.min(text.len());
        while take > 0 && !text.is_char_boundary(take) {
            take -= 1;
        }
        self.info_log.push_str(&text[..take]);
    }
}
