//! Named-parameter bindings for a linked program
//!
//! Two-phase lifecycle: `resolve` once after a successful link, then `set`
//! cached values and `push` them to the program's uniform buffer each
//! frame. Resolution maps stable parameter names to byte offsets inside
//! the program's uniform block; a relink invalidates every resolved block.

use super::{ShaderProgram, LOCATION_NOT_FOUND};
use crate::error::{EngineError, EngineResult};

/// A typed value cached host-side until the next push
#[derive(Debug, Clone, Copy)]
pub enum UniformValue {
    F32(f32),
    U32(u32),
    Vec2U([u32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([[f32; 4]; 4]),
}

impl UniformValue {
    fn bytes(&self) -> &[u8] {
        match self {
            UniformValue::F32(v) => bytemuck::bytes_of(v),
            UniformValue::U32(v) => bytemuck::bytes_of(v),
            UniformValue::Vec2U(v) => bytemuck::bytes_of(v),
            UniformValue::Vec3(v) => bytemuck::bytes_of(v),
            UniformValue::Vec4(v) => bytemuck::bytes_of(v),
            UniformValue::Mat4(v) => bytemuck::bytes_of(v),
        }
    }
}

#[derive(Debug)]
struct Entry {
    name: &'static str,
    location: i32,
    slot_size: u32,
    value: UniformValue,
}

/// Per-program table of named parameters and their resolved offsets
pub struct UniformBlock {
    label: &'static str,
    entries: Vec<Entry>,
    resolved: bool,
    generation: u64,
    span: u64,
}

impl UniformBlock {
    /// A block with initial cached values; unresolved until
    /// [`UniformBlock::resolve`] runs against a linked program.
    pub fn new(label: &'static str, values: &[(&'static str, UniformValue)]) -> Self {
        Self {
            label,
            entries: values
                .iter()
                .map(|(name, value)| Entry {
                    name,
                    location: LOCATION_NOT_FOUND,
                    slot_size: 0,
                    value: *value,
                })
                .collect(),
            resolved: false,
            generation: 0,
            span: 0,
        }
    }

    /// Resolve every name against the program's uniform block. Must run
    /// exactly once after each successful link, before the first push.
    /// Names the program does not declare resolve to the not-found
    /// sentinel and are skipped by pushes without an error.
    pub fn resolve(&mut self, program: &ShaderProgram) -> EngineResult<()> {
        if !program.success() {
            return Err(EngineError::ProgramBuild {
                name: program.name().to_string(),
                log: program.info_log().to_string(),
            });
        }
        let layout = program
            .uniform_layout()
            .ok_or_else(|| EngineError::MissingUniformBlock {
                name: program.name().to_string(),
            })?;

        for entry in &mut self.entries {
            match layout.member(entry.name) {
                Some(member) => {
                    entry.location = member.offset as i32;
                    entry.slot_size = member.size;
                }
                None => {
                    log::debug!(
                        "[UniformBlock] '{}': parameter '{}' not found in program '{}'",
                        self.label,
                        entry.name,
                        program.name()
                    );
                    entry.location = LOCATION_NOT_FOUND;
                    entry.slot_size = 0;
                }
            }
        }

        self.span = layout.span as u64;
        self.generation = program.generation();
        self.resolved = true;
        log::debug!(
            "[UniformBlock] '{}' resolved against '{}' generation {}",
            self.label,
            program.name(),
            self.generation
        );
        Ok(())
    }

    /// Update a cached value. The new value reaches the GPU on the next
    /// push. Setting a name this block was not built with is ignored.
    pub fn set(&mut self, name: &str, value: UniformValue) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.value = value,
            None => log::warn!("[UniformBlock] '{}': set of unknown parameter '{}'", self.label, name),
        }
    }

    /// Size in bytes of the backing uniform buffer this block targets.
    pub fn span(&self) -> u64 {
        self.span
    }

    /// Fails when the program has been relinked since this block was
    /// resolved; offsets from a previous link must never be reused.
    pub fn ensure_current(&self, program: &ShaderProgram) -> EngineResult<()> {
        if !self.resolved {
            return Err(EngineError::UnresolvedBindings {
                block: self.label.to_string(),
            });
        }
        if self.generation != program.generation() {
            return Err(EngineError::StaleBindings {
                block: self.label.to_string(),
                resolved: self.generation,
                current: program.generation(),
            });
        }
        Ok(())
    }

    /// Push every cached value to the program's uniform buffer. Writes are
    /// issued independently per parameter, in no particular order, with no
    /// rollback if one is skipped; parameters resolved to the not-found
    /// sentinel are silent no-ops.
    pub fn push(
        &self,
        queue: &wgpu::Queue,
        buffer: &wgpu::Buffer,
        program: &ShaderProgram,
    ) -> EngineResult<()> {
        self.ensure_current(program)?;
        for entry in &self.entries {
            if entry.location == LOCATION_NOT_FOUND {
                continue;
            }
            let bytes = entry.value.bytes();
            if bytes.len() as u32 > entry.slot_size {
                log::warn!(
                    "[UniformBlock] '{}': value for '{}' is {} bytes but the slot holds {}",
                    self.label,
                    entry.name,
                    bytes.len(),
                    entry.slot_size
                );
                continue;
            }
            queue.write_buffer(buffer, entry.location as u64, bytes);
        }
        Ok(())
    }

    /// CPU-side variant of [`UniformBlock::push`]: write cached values into
    /// a staging image of the uniform block.
    pub fn write_into(&self, out: &mut [u8]) {
        for entry in &self.entries {
            if entry.location == LOCATION_NOT_FOUND {
                continue;
            }
            let bytes = entry.value.bytes();
            let start = entry.location as usize;
            if bytes.len() as u32 > entry.slot_size || start + bytes.len() > out.len() {
                continue;
            }
            out[start..start + bytes.len()].copy_from_slice(bytes);
        }
    }
}
