// pipeline.rs — Compilation state and stage orchestration
//
// Runs load → validate → emit over one program model, stopping after the
// requested terminal stage or at the first stage that reports errors. All
// diagnostics of a stage are collected before deciding to stop.
//
// Preconditions: `source` is the text of a JSON program model.
// Postconditions: artifacts for every completed stage are populated, or
//   `has_error` is set.
// Failure modes: any stage producing error-level diagnostics.
// Side effects: calls `on_stage_complete` after each stage.

use std::time::Instant;

use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::config::OptionsOverlay;
use crate::diag::{has_errors, Diagnostic};
use crate::emit::render_module;
use crate::model::{load_str, Program};
use crate::target::Target;
use crate::validate::validate;

// ── Stages ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Load,
    Validate,
    Emit,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::Validate => "validate",
            Stage::Emit => "emit",
        }
    }
}

// ── Provenance ─────────────────────────────────────────────────────────────

/// `source_hash`: SHA-256 of the raw model text.
/// `compiler_version`: crate version from `Cargo.toml`.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub source_hash: [u8; 32],
    pub compiler_version: &'static str,
}

impl Provenance {
    pub fn source_hash_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for b in &self.source_hash {
            use std::fmt::Write;
            let _ = write!(s, "{:02x}", b);
        }
        s
    }

    /// Serialize provenance as JSON for `--emit build-info`.
    pub fn to_json(&self) -> String {
        let value = json!({
            "source_hash": self.source_hash_hex(),
            "compiler_version": self.compiler_version,
        });
        format!("{:#}\n", value)
    }

    /// Comment lines for the top of generated modules.
    pub fn header_lines(&self) -> Vec<String> {
        vec![
            format!(
                "Generated by lfpy {}. Do not edit.",
                self.compiler_version
            ),
            format!("source sha256: {}", self.source_hash_hex()),
        ]
    }
}

pub fn compute_provenance(source: &str) -> Provenance {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    let mut source_hash = [0u8; 32];
    source_hash.copy_from_slice(&hasher.finalize());
    Provenance {
        source_hash,
        compiler_version: env!("CARGO_PKG_VERSION"),
    }
}

// ── State ──────────────────────────────────────────────────────────────────

/// Holds all compilation artifacts and accumulated diagnostics.
pub struct CompilationState {
    pub program: Option<Program>,
    pub generated: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub has_error: bool,
    pub provenance: Provenance,
}

impl CompilationState {
    pub fn new(source: &str) -> Self {
        CompilationState {
            program: None,
            generated: None,
            diagnostics: Vec::new(),
            has_error: false,
            provenance: compute_provenance(source),
        }
    }
}

/// Pipeline execution stopped because a stage reported errors. The
/// diagnostics are in `CompilationState::diagnostics`.
#[derive(Debug)]
pub struct PipelineError {
    pub failing_stage: Stage,
}

fn finish_stage(
    state: &mut CompilationState,
    stage: Stage,
    diags: Vec<Diagnostic>,
    started: Instant,
    on_stage_complete: &mut impl FnMut(Stage, &[Diagnostic]),
) -> Result<(), PipelineError> {
    on_stage_complete(stage, &diags);
    info!(
        stage = stage.name(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        diagnostics = diags.len(),
        "stage complete"
    );
    let is_err = has_errors(&diags);
    state.diagnostics.extend(diags);
    if is_err {
        state.has_error = true;
        return Err(PipelineError {
            failing_stage: stage,
        });
    }
    Ok(())
}

// ── Runner ─────────────────────────────────────────────────────────────────

/// Run every stage up to and including `terminal`.
pub fn run_pipeline<T: Target + ?Sized>(
    state: &mut CompilationState,
    source: &str,
    terminal: Stage,
    overlay: &OptionsOverlay,
    target: &T,
    mut on_stage_complete: impl FnMut(Stage, &[Diagnostic]),
) -> Result<(), PipelineError> {
    let started = Instant::now();
    let diags = match load_str(source) {
        Ok(mut program) => {
            overlay.apply(&mut program.options);
            state.program = Some(program);
            Vec::new()
        }
        Err(errors) => errors.iter().map(|e| e.to_diagnostic()).collect(),
    };
    finish_stage(state, Stage::Load, diags, started, &mut on_stage_complete)?;
    if terminal == Stage::Load {
        return Ok(());
    }

    let Some(program) = state.program.as_ref() else {
        return Ok(());
    };

    let started = Instant::now();
    let diags = validate(program);
    finish_stage(state, Stage::Validate, diags, started, &mut on_stage_complete)?;
    if terminal == Stage::Validate {
        return Ok(());
    }

    let Some(program) = state.program.as_ref() else {
        return Ok(());
    };
    let started = Instant::now();
    let header = if program.options.provenance_header {
        state.provenance.header_lines()
    } else {
        Vec::new()
    };
    let module = render_module(program, target, &header);
    state.generated = Some(module.source);
    finish_stage(
        state,
        Stage::Emit,
        module.diagnostics,
        started,
        &mut on_stage_complete,
    )
}
