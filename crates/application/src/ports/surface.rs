//! Host text surface port.
//!
//! The editor needs a surface that can display plain text mixed with inline,
//! non-editable chips. This is the only platform-specific piece of the
//! editor; everything else works on the document string.

use courier_domain::{Marker, Run, Variable, VariableRegistry, VariableType, split_runs};

/// Screen coordinates used to anchor the picker and popover.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    /// Horizontal position in surface pixels.
    pub x: f32,
    /// Vertical position in surface pixels.
    pub y: f32,
}

impl ScreenPoint {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// What a chip widget displays for one marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipView {
    /// The marker's variable type.
    pub variable_type: VariableType,
    /// The marker's variable id.
    pub id: String,
    /// The marker text the chip stands for.
    pub raw: String,
    /// Text shown inside the chip.
    pub label: String,
    /// Whether the chip is flagged as needing configuration.
    pub needs_configuration: bool,
}

impl ChipView {
    /// Builds the view of a marker given its variable, if registered.
    #[must_use]
    pub fn new(marker: &Marker, variable: Option<&Variable>) -> Self {
        Self::describe(marker.variable_type, &marker.id, marker.raw.clone(), variable)
    }

    /// Builds the view for a variable that is already registered.
    #[must_use]
    pub fn for_variable(variable: &Variable) -> Self {
        Self::describe(
            variable.variable_type,
            &variable.id,
            Marker::format(variable.variable_type, &variable.id),
            Some(variable),
        )
    }

    fn describe(
        variable_type: VariableType,
        id: &str,
        raw: String,
        variable: Option<&Variable>,
    ) -> Self {
        let label = match variable {
            Some(v) if v.name != variable_type.tag() => v.name.clone(),
            _ => variable_type.label().to_string(),
        };
        Self {
            variable_type,
            id: id.to_string(),
            raw,
            label,
            needs_configuration: !variable.is_some_and(Variable::is_configured),
        }
    }
}

/// A run as displayed by a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceRun {
    /// Plain text, `\n` for line breaks.
    Text(String),
    /// An inline chip.
    Chip(ChipView),
}

impl SurfaceRun {
    /// The document text this run stands for.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Chip(chip) => &chip.raw,
        }
    }
}

/// Splits a document into surface runs, describing chips from the registry.
#[must_use]
pub fn surface_runs(document: &str, registry: &VariableRegistry) -> Vec<SurfaceRun> {
    split_runs(document)
        .into_iter()
        .map(|run| match run {
            Run::Text(text) => SurfaceRun::Text(text),
            Run::Marker(marker) => SurfaceRun::Chip(ChipView::new(&marker, registry.get(&marker.id))),
        })
        .collect()
}

/// An editable surface hosting text and inline chips.
///
/// Caret offsets are logical document characters: a chip counts as the
/// character length of its marker, each line boundary as one, and caret
/// anchors as zero.
///
/// Implementations must satisfy `extract()` reproducing the document the
/// runs were built from, and `set_caret_offset(n)` followed by
/// `caret_offset()` returning `Some(n)` for any `n` not strictly inside a
/// chip.
pub trait TextSurface {
    /// Replaces the displayed content.
    ///
    /// Each chip run becomes a non-editable widget followed by a zero-width
    /// caret anchor so the caret can sit directly after it.
    fn render(&mut self, runs: &[SurfaceRun]);

    /// Reconstructs the canonical document from the displayed content.
    fn extract(&self) -> String;

    /// The caret's logical offset, or `None` when the caret is outside the surface.
    fn caret_offset(&self) -> Option<usize>;

    /// Places the caret at a logical offset, clamped to the content.
    fn set_caret_offset(&mut self, offset: usize);

    /// Updates the label and configuration flag of every chip with the id.
    fn refresh_chip(&mut self, chip: &ChipView);

    /// Screen position of the caret, for anchoring the picker.
    fn caret_position(&self) -> Option<ScreenPoint>;

    /// Screen position of the first chip with the id, for anchoring the popover.
    fn chip_position(&self, id: &str) -> Option<ScreenPoint>;
}
