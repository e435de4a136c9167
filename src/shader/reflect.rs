//! Uniform-block and entry-point reflection over parsed shader modules

use std::collections::BTreeSet;
use wgpu::naga;

use super::StageKind;

/// One member of a program's uniform block
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MemberLayout {
    pub name: String,
    /// Byte offset inside the block
    pub offset: u32,
    /// Slot width in bytes, padding to the next member included
    pub size: u32,
}

/// Layout of the single `var<uniform>` block a program exposes
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UniformBlockLayout {
    pub group: u32,
    pub binding: u32,
    pub members: Vec<MemberLayout>,
    /// Total block size in bytes
    pub span: u32,
}

impl UniformBlockLayout {
    pub fn member(&self, name: &str) -> Option<&MemberLayout> {
        self.members.iter().find(|m| m.name == name)
    }
}

pub(crate) fn naga_stage(kind: StageKind) -> naga::ShaderStage {
    match kind {
        StageKind::Vertex => naga::ShaderStage::Vertex,
        StageKind::Fragment => naga::ShaderStage::Fragment,
        StageKind::Compute => naga::ShaderStage::Compute,
    }
}

/// Extract the uniform block declared by a module, if any. Programs in this
/// engine expose their parameters through one uniform struct; the first
/// uniform-space global wins.
pub(crate) fn uniform_block(module: &naga::Module) -> Option<UniformBlockLayout> {
    for (_, var) in module.global_variables.iter() {
        if var.space != naga::AddressSpace::Uniform {
            continue;
        }
        let ty = &module.types[var.ty];
        let naga::TypeInner::Struct { members, span } = &ty.inner else {
            continue;
        };

        let mut layout = Vec::with_capacity(members.len());
        for (index, member) in members.iter().enumerate() {
            let end = members
                .get(index + 1)
                .map(|next| next.offset)
                .unwrap_or(*span);
            layout.push(MemberLayout {
                name: member.name.clone().unwrap_or_default(),
                offset: member.offset,
                size: end - member.offset,
            });
        }

        let (group, binding) = var
            .binding
            .as_ref()
            .map(|b| (b.group, b.binding))
            .unwrap_or((0, 0));

        return Some(UniformBlockLayout {
            group,
            binding,
            members: layout,
            span: *span,
        });
    }
    None
}

/// Find the entry point for a stage
pub(crate) fn entry_point(module: &naga::Module, kind: StageKind) -> Option<&naga::EntryPoint> {
    let stage = naga_stage(kind);
    module.entry_points.iter().find(|ep| ep.stage == stage)
}

fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut BTreeSet<u32>,
) {
    if let Some(naga::Binding::Location { location, .. }) = binding {
        out.insert(*location);
        return;
    }
    if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
        for member in members {
            if let Some(naga::Binding::Location { location, .. }) = member.binding.as_ref() {
                out.insert(*location);
            }
        }
    }
}

/// `@location` slots a stage consumes
pub(crate) fn stage_inputs(module: &naga::Module, kind: StageKind) -> BTreeSet<u32> {
    let mut out = BTreeSet::new();
    if let Some(ep) = entry_point(module, kind) {
        for arg in &ep.function.arguments {
            collect_locations(module, arg.ty, arg.binding.as_ref(), &mut out);
        }
    }
    out
}

/// `@location` slots a stage produces
pub(crate) fn stage_outputs(module: &naga::Module, kind: StageKind) -> BTreeSet<u32> {
    let mut out = BTreeSet::new();
    if let Some(ep) = entry_point(module, kind) {
        if let Some(result) = &ep.function.result {
            collect_locations(module, result.ty, result.binding.as_ref(), &mut out);
        }
    }
    out
}
