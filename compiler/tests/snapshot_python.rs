// Snapshot tests: lock generated Python output to detect unintended changes.
//
// Uses the library API (load → validate → render_module) directly, without a
// provenance header so snapshots do not depend on fixture bytes. Snapshots are
// managed by `insta` and stored under `compiler/tests/snapshots/`.
//
// Run `cargo insta review` after intentional output changes to update baselines.

use std::path::{Path, PathBuf};

use lfpy::config::{OptionsOverlay, OverrideStyle};
use lfpy::target::PythonTarget;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn generate(name: &str, overlay: &OptionsOverlay) -> String {
    let mut program = lfpy::model::load_file(&fixture(name))
        .unwrap_or_else(|e| panic!("failed to load {}: {:?}", name, e));
    overlay.apply(&mut program.options);

    let diags = lfpy::validate::validate(&program);
    assert!(!lfpy::diag::has_errors(&diags), "validation errors: {:?}", diags);

    let module = lfpy::emit::render_module(&program, &PythonTarget, &[]);
    assert!(
        module.diagnostics.is_empty(),
        "emit diagnostics: {:?}",
        module.diagnostics
    );
    module.source
}

#[test]
fn sensors_targeted() {
    let generated = generate("sensors.json", &OptionsOverlay::default());
    insta::assert_snapshot!("sensors_targeted", generated);
}

#[test]
fn foo_bulk_merge() {
    // Style comes from the model's own options.
    let generated = generate("foo.json", &OptionsOverlay::default());
    insta::assert_snapshot!("foo_bulk_merge", generated);
}

#[test]
fn overlay_switches_style() {
    let overlay = OptionsOverlay {
        override_style: Some(OverrideStyle::Targeted),
        ..OptionsOverlay::default()
    };
    let generated = generate("foo.json", &overlay);
    assert!(generated.contains("def __init__(self):"));
    assert!(!generated.contains("kwargs"));
    assert!(generated.contains("main_mid_baz_lf._p = main_mid_lf.parentParam\n"));
}
