// config.rs — Emission options
//
// Defaults, overlaid by the program model's optional `"options"` object,
// overlaid by CLI flags (applied by the binary).

use serde::Deserialize;

/// How construction-time overrides reach an instance's backing fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverrideStyle {
    /// Constructor takes no keyword map; each override is assigned to its
    /// backing field at the construction site.
    #[default]
    Targeted,
    /// Skeleton ends in `self.__dict__.update(kwargs)` and the construction
    /// site passes every resolved parameter as a keyword.
    BulkMerge,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmitOptions {
    /// Spaces per indentation level.
    pub indent: usize,
    /// Separator between the elements of a sequence literal. Must contain
    /// a comma, otherwise tuples collapse into a single expression.
    pub separator: String,
    pub override_style: OverrideStyle,
    /// Append `# pylint: disable=no-member` to accessor bodies.
    pub pylint_markers: bool,
    /// Start generated modules with a provenance comment.
    pub provenance_header: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        EmitOptions {
            indent: 4,
            separator: ", ".to_string(),
            override_style: OverrideStyle::Targeted,
            pylint_markers: true,
            provenance_header: true,
        }
    }
}

impl EmitOptions {
    /// Reject option values that would produce invalid Python.
    pub fn check(&self) -> Result<(), String> {
        if self.separator.trim() != "," {
            return Err(format!(
                "option `separator` must be a comma with optional spaces, got {:?}",
                self.separator
            ));
        }
        Ok(())
    }

    /// Indentation string for `level` nesting levels.
    pub fn indent_str(&self, level: usize) -> String {
        " ".repeat(self.indent * level)
    }
}

/// Highest-precedence option layer, filled from command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionsOverlay {
    pub indent: Option<usize>,
    pub override_style: Option<OverrideStyle>,
    pub pylint_markers: Option<bool>,
    pub provenance_header: Option<bool>,
}

impl OptionsOverlay {
    pub fn apply(&self, options: &mut EmitOptions) {
        if let Some(indent) = self.indent {
            options.indent = indent;
        }
        if let Some(style) = self.override_style {
            options.override_style = style;
        }
        if let Some(markers) = self.pylint_markers {
            options.pylint_markers = markers;
        }
        if let Some(header) = self.provenance_header {
            options.provenance_header = header;
        }
    }
}
