use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use lfpy::config::{OptionsOverlay, OverrideStyle};
use lfpy::pipeline::{run_pipeline, CompilationState, Stage};
use lfpy::target::PythonTarget;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum EmitStage {
    Python,
    Overrides,
    Tree,
    BuildInfo,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum StyleArg {
    Targeted,
    BulkMerge,
}

impl From<StyleArg> for OverrideStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Targeted => OverrideStyle::Targeted,
            StyleArg::BulkMerge => OverrideStyle::BulkMerge,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "lfpy",
    version,
    about = "Resolves reactor parameters and emits Python parameter code"
)]
struct Cli {
    /// Program model (JSON)
    source: PathBuf,

    /// Output file path (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// What to emit
    #[arg(long, value_enum, default_value_t = EmitStage::Python)]
    emit: EmitStage,

    /// How construction-time overrides reach instances
    #[arg(long, value_enum)]
    override_style: Option<StyleArg>,

    /// Spaces per indentation level
    #[arg(long)]
    indent: Option<usize>,

    /// Omit the provenance comment at the top of generated modules
    #[arg(long)]
    no_header: bool,

    /// Log stage progress to stderr
    #[arg(long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "lfpy=info" } else { "lfpy=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn write_output(path: Option<&Path>, text: &str) -> Result<(), ExitCode> {
    match path {
        Some(path) => std::fs::write(path, text).map_err(|e| {
            eprintln!("lfpy: error: {}: {}", path.display(), e);
            ExitCode::from(2)
        }),
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let source = match std::fs::read_to_string(&cli.source) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("lfpy: error: {}: {}", cli.source.display(), e);
            return ExitCode::from(2);
        }
    };

    let mut state = CompilationState::new(&source);
    if matches!(cli.emit, EmitStage::BuildInfo) {
        return match write_output(cli.output.as_deref(), &state.provenance.to_json()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(code) => code,
        };
    }

    let overlay = OptionsOverlay {
        indent: cli.indent,
        override_style: cli.override_style.map(Into::into),
        pylint_markers: None,
        provenance_header: cli.no_header.then_some(false),
    };
    let terminal = match cli.emit {
        EmitStage::Python => Stage::Emit,
        EmitStage::Overrides => Stage::Validate,
        EmitStage::Tree | EmitStage::BuildInfo => Stage::Load,
    };

    let result = run_pipeline(
        &mut state,
        &source,
        terminal,
        &overlay,
        &PythonTarget,
        |_, diags| {
            for d in diags {
                eprintln!("lfpy: {}", d);
            }
        },
    );
    if result.is_err() || state.has_error {
        return ExitCode::from(1);
    }

    let text = match (cli.emit, state.program.as_ref()) {
        (EmitStage::Python, _) => state.generated.take().unwrap_or_default(),
        (EmitStage::Tree, Some(program)) => lfpy::dump::render_tree(program, &PythonTarget),
        (EmitStage::Overrides, Some(program)) => {
            let (json, diags) = lfpy::dump::overrides_json(program, &PythonTarget);
            for d in &diags {
                eprintln!("lfpy: {}", d);
            }
            if lfpy::diag::has_errors(&diags) {
                return ExitCode::from(1);
            }
            json + "\n"
        }
        _ => String::new(),
    };

    match write_output(cli.output.as_deref(), &text) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => code,
    }
}
