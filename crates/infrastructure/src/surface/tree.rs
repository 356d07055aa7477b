//! Headless content-tree surface.
//!
//! Content is a list of line blocks. Each line holds inline nodes: text
//! nodes and non-editable chip nodes. Two structural rules hold after every
//! operation:
//! - every line starts with a text node and ends with one;
//! - every chip is followed by a text node that starts with a caret anchor,
//!   so the caret can be placed directly after the chip.
//!
//! The caret always sits inside a text node. Its node offset counts anchors;
//! logical offsets do not.

use courier_application::ports::{ChipView, ScreenPoint, SurfaceRun, TextSurface};
use courier_domain::text::{byte_index, char_len};

/// Zero-width character placed after every chip.
pub const CARET_ANCHOR: char = '\u{200B}';

/// An inline node of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Editable text, possibly containing caret anchors.
    Text(String),
    /// A non-editable chip.
    Chip(ChipView),
}

impl Inline {
    /// Length in logical document characters.
    fn logical_len(&self) -> usize {
        match self {
            Self::Text(text) => visible_len(text),
            Self::Chip(chip) => char_len(&chip.raw),
        }
    }

    /// Width in display columns; chips show their label plus padding.
    fn columns(&self) -> usize {
        match self {
            Self::Text(text) => visible_len(text),
            Self::Chip(chip) => char_len(&chip.label) + 2,
        }
    }
}

/// A line block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    nodes: Vec<Inline>,
}

impl Line {
    fn empty() -> Self {
        Self {
            nodes: vec![Inline::Text(String::new())],
        }
    }

    /// The inline nodes of the line.
    #[must_use]
    pub fn nodes(&self) -> &[Inline] {
        &self.nodes
    }

    fn logical_len(&self) -> usize {
        self.nodes.iter().map(Inline::logical_len).sum()
    }

    fn text(&self) -> String {
        self.nodes
            .iter()
            .map(|node| match node {
                Inline::Text(text) => text.chars().filter(|&c| c != CARET_ANCHOR).collect(),
                Inline::Chip(chip) => chip.raw.clone(),
            })
            .collect()
    }

    fn push_text(&mut self, text: &str) {
        if let Some(Inline::Text(last)) = self.nodes.last_mut() {
            last.push_str(text);
        } else {
            self.nodes.push(Inline::Text(text.to_string()));
        }
    }
}

/// Caret position inside the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Line index.
    pub line: usize,
    /// Index of the text node within the line.
    pub node: usize,
    /// Character offset within the text node, anchors included.
    pub offset: usize,
}

/// A [`TextSurface`] over an in-memory content tree.
///
/// Stands in for a platform editing widget in tests and the command-line
/// front end, and offers the host-side native editing a widget would.
#[derive(Debug, Clone)]
pub struct TreeSurface {
    lines: Vec<Line>,
    caret: Option<Cursor>,
    char_width: f32,
    line_height: f32,
}

impl Default for TreeSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeSurface {
    /// Creates an empty, unfocused surface.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: vec![Line::empty()],
            caret: None,
            char_width: 8.0,
            line_height: 18.0,
        }
    }

    /// Sets the glyph metrics used for screen positions.
    #[must_use]
    pub const fn with_metrics(mut self, char_width: f32, line_height: f32) -> Self {
        self.char_width = char_width;
        self.line_height = line_height;
        self
    }

    /// The line blocks.
    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Every chip in document order.
    pub fn chips(&self) -> impl Iterator<Item = &ChipView> {
        self.lines.iter().flat_map(|line| {
            line.nodes.iter().filter_map(|node| match node {
                Inline::Chip(chip) => Some(chip),
                Inline::Text(_) => None,
            })
        })
    }

    /// The raw caret.
    #[must_use]
    pub const fn caret(&self) -> Option<Cursor> {
        self.caret
    }

    /// Returns true if the caret is in the surface.
    #[must_use]
    pub const fn is_focused(&self) -> bool {
        self.caret.is_some()
    }

    /// Puts the caret in the surface, at the end if it was outside.
    pub fn focus(&mut self) {
        if self.caret.is_none() {
            self.caret = Some(self.end_cursor());
        }
    }

    /// Moves the caret out of the surface.
    pub const fn blur(&mut self) {
        self.caret = None;
    }

    /// Inserts text at the caret as native typing would; `\n` splits the line.
    pub fn type_text(&mut self, text: &str) {
        let Some(mut cursor) = self.caret else {
            return;
        };
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                cursor = self.split_line(cursor);
            }
            if let Some(Inline::Text(node)) = self.node_mut(cursor) {
                let at = byte_index(node, cursor.offset);
                node.insert_str(at, part);
                cursor.offset += char_len(part);
            }
        }
        self.caret = Some(cursor);
    }

    /// Deletes backwards as native editing would.
    ///
    /// Removes the previous character, or the chip right before the caret
    /// together with its anchor, or joins the line with the previous one.
    pub fn backspace(&mut self) {
        let Some(cursor) = self.caret else {
            return;
        };

        if let Some(Inline::Text(node)) = self.node_mut(cursor) {
            let chars: Vec<char> = node.chars().collect();
            let before = cursor.offset.min(chars.len());
            if let Some(i) = (0..before).rev().find(|&i| chars[i] != CARET_ANCHOR) {
                let range = byte_index(node, i)..byte_index(node, i + 1);
                node.replace_range(range, "");
                self.caret = Some(Cursor {
                    offset: cursor.offset - 1,
                    ..cursor
                });
                return;
            }
        }

        if cursor.node >= 2 {
            self.remove_chip_before(cursor);
        } else if cursor.node == 0 {
            self.join_with_previous_line(cursor);
        }
    }

    fn node_mut(&mut self, cursor: Cursor) -> Option<&mut Inline> {
        self.lines
            .get_mut(cursor.line)
            .and_then(|line| line.nodes.get_mut(cursor.node))
    }

    fn end_cursor(&self) -> Cursor {
        let line = self.lines.len().saturating_sub(1);
        let (node, offset) = self.lines.last().map_or((0, 0), |l| {
            let node = l.nodes.len().saturating_sub(1);
            let offset = match l.nodes.last() {
                Some(Inline::Text(text)) => char_len(text),
                _ => 0,
            };
            (node, offset)
        });
        Cursor { line, node, offset }
    }

    fn split_line(&mut self, cursor: Cursor) -> Cursor {
        let Some(line) = self.lines.get_mut(cursor.line) else {
            return cursor;
        };
        if cursor.node >= line.nodes.len() {
            return cursor;
        }
        let mut rest = line.nodes.split_off(cursor.node + 1);
        let tail = match line.nodes.get_mut(cursor.node) {
            Some(Inline::Text(node)) => {
                let at = byte_index(node, cursor.offset);
                node.split_off(at)
            }
            _ => String::new(),
        };
        rest.insert(0, Inline::Text(tail));
        self.lines.insert(cursor.line + 1, Line { nodes: rest });
        Cursor {
            line: cursor.line + 1,
            node: 0,
            offset: 0,
        }
    }

    fn remove_chip_before(&mut self, cursor: Cursor) {
        let Some(line) = self.lines.get_mut(cursor.line) else {
            return;
        };
        if cursor.node >= line.nodes.len()
            || !matches!(line.nodes.get(cursor.node - 1), Some(Inline::Chip(_)))
        {
            return;
        }

        let rest: String = match line.nodes.remove(cursor.node) {
            Inline::Text(text) => text.chars().skip(cursor.offset).collect(),
            Inline::Chip(_) => String::new(),
        };
        line.nodes.remove(cursor.node - 1);

        if let Some(Inline::Text(previous)) = line.nodes.get_mut(cursor.node - 2) {
            let offset = char_len(previous);
            previous.push_str(&rest);
            self.caret = Some(Cursor {
                line: cursor.line,
                node: cursor.node - 2,
                offset,
            });
        }
    }

    fn join_with_previous_line(&mut self, cursor: Cursor) {
        if cursor.line == 0 || cursor.line >= self.lines.len() {
            return;
        }
        let line = self.lines.remove(cursor.line);
        let Some(previous) = self.lines.get_mut(cursor.line - 1) else {
            return;
        };

        let node = previous.nodes.len().saturating_sub(1);
        let offset = match previous.nodes.last() {
            Some(Inline::Text(text)) => char_len(text),
            _ => 0,
        };

        let mut nodes = line.nodes.into_iter();
        match nodes.next() {
            Some(Inline::Text(first)) => previous.push_text(&first),
            Some(chip) => previous.nodes.push(chip),
            None => {}
        }
        previous.nodes.extend(nodes);

        self.caret = Some(Cursor {
            line: cursor.line - 1,
            node,
            offset,
        });
    }

    fn locate(&self, offset: usize) -> Cursor {
        let mut remaining = offset;
        for (index, line) in self.lines.iter().enumerate() {
            let len = line.logical_len();
            if remaining <= len {
                return locate_in_line(index, line, remaining);
            }
            remaining -= len + 1;
        }
        self.end_cursor()
    }

    /// Screen point below the given column of a line.
    #[allow(clippy::cast_precision_loss)]
    fn point(&self, line: usize, column: usize) -> ScreenPoint {
        ScreenPoint::new(
            column as f32 * self.char_width,
            (line + 1) as f32 * self.line_height,
        )
    }
}

fn visible_len(text: &str) -> usize {
    text.chars().filter(|&c| c != CARET_ANCHOR).count()
}

/// Node offset of the `logical`-th visible character, past any anchors.
fn node_offset(text: &str, logical: usize) -> usize {
    let mut count = 0;
    for (index, ch) in text.chars().enumerate() {
        if ch == CARET_ANCHOR {
            continue;
        }
        if count == logical {
            return index;
        }
        count += 1;
    }
    char_len(text)
}

fn locate_in_line(line_index: usize, line: &Line, mut remaining: usize) -> Cursor {
    for (node_index, node) in line.nodes.iter().enumerate() {
        match node {
            Inline::Text(text) => {
                let len = visible_len(text);
                if remaining <= len {
                    return Cursor {
                        line: line_index,
                        node: node_index,
                        offset: node_offset(text, remaining),
                    };
                }
                remaining -= len;
            }
            // An offset inside a chip snaps to just after it.
            Inline::Chip(chip) => remaining = remaining.saturating_sub(char_len(&chip.raw)),
        }
    }
    let node = line.nodes.len().saturating_sub(1);
    let offset = match line.nodes.last() {
        Some(Inline::Text(text)) => char_len(text),
        _ => 0,
    };
    Cursor {
        line: line_index,
        node,
        offset,
    }
}

impl TextSurface for TreeSurface {
    fn render(&mut self, runs: &[SurfaceRun]) {
        let mut lines = vec![Line::empty()];
        for run in runs {
            match run {
                SurfaceRun::Text(text) => {
                    for (i, part) in text.split('\n').enumerate() {
                        if i > 0 {
                            lines.push(Line::empty());
                        }
                        if let Some(line) = lines.last_mut() {
                            line.push_text(part);
                        }
                    }
                }
                SurfaceRun::Chip(chip) => {
                    if let Some(line) = lines.last_mut() {
                        line.nodes.push(Inline::Chip(chip.clone()));
                        line.nodes.push(Inline::Text(CARET_ANCHOR.to_string()));
                    }
                }
            }
        }
        self.lines = lines;
        self.caret = None;

        tracing::trace!(
            target: "courier::surface",
            lines = self.lines.len(),
            runs = runs.len(),
            "rendered"
        );
    }

    fn extract(&self) -> String {
        self.lines.iter().map(Line::text).collect::<Vec<_>>().join("\n")
    }

    fn caret_offset(&self) -> Option<usize> {
        let cursor = self.caret?;
        let line = self.lines.get(cursor.line)?;

        let before_lines: usize = self
            .lines
            .iter()
            .take(cursor.line)
            .map(|l| l.logical_len() + 1)
            .sum();
        let before_nodes: usize = line
            .nodes
            .iter()
            .take(cursor.node)
            .map(Inline::logical_len)
            .sum();
        let within = match line.nodes.get(cursor.node)? {
            Inline::Text(text) => visible_len(&text.chars().take(cursor.offset).collect::<String>()),
            Inline::Chip(_) => 0,
        };

        Some(before_lines + before_nodes + within)
    }

    fn set_caret_offset(&mut self, offset: usize) {
        self.caret = Some(self.locate(offset));
    }

    fn refresh_chip(&mut self, view: &ChipView) {
        for line in &mut self.lines {
            for node in &mut line.nodes {
                if let Inline::Chip(chip) = node
                    && chip.id == view.id
                {
                    chip.label.clone_from(&view.label);
                    chip.needs_configuration = view.needs_configuration;
                }
            }
        }
    }

    fn caret_position(&self) -> Option<ScreenPoint> {
        let cursor = self.caret?;
        let line = self.lines.get(cursor.line)?;
        let mut column: usize = line.nodes.iter().take(cursor.node).map(Inline::columns).sum();
        if let Some(Inline::Text(text)) = line.nodes.get(cursor.node) {
            column += visible_len(&text.chars().take(cursor.offset).collect::<String>());
        }
        Some(self.point(cursor.line, column))
    }

    fn chip_position(&self, id: &str) -> Option<ScreenPoint> {
        self.lines.iter().enumerate().find_map(|(index, line)| {
            let position = line
                .nodes
                .iter()
                .position(|node| matches!(node, Inline::Chip(chip) if chip.id == id))?;
            let column = line.nodes.iter().take(position).map(Inline::columns).sum();
            Some(self.point(index, column))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use courier_application::ports::surface_runs;
    use courier_domain::{Variable, VariableRegistry, VariableType, parse_markers};
    use pretty_assertions::assert_eq;

    fn rendered(document: &str) -> TreeSurface {
        let mut surface = TreeSurface::new();
        surface.render(&surface_runs(document, &VariableRegistry::new()));
        surface
    }

    const DOCUMENTS: &[&str] = &[
        "",
        "plain",
        "{{uuid:a}}",
        "{{uuid:a}}{{timestamp:b}}",
        "\n{{uuid:a}}\n",
        "{\n  \"id\": {{uuid:a}},\n  \"note\": \"x {{base64-text:b}} y\"\n}",
        "héllo {{random-string:r}} wörld",
        "{{bogus:x}} {{uuid:}}",
    ];

    #[test]
    fn test_extract_round_trips_render() {
        for doc in DOCUMENTS {
            assert_eq!(&rendered(doc).extract(), doc);
        }
    }

    #[test]
    fn test_structure_invariants() {
        let surface = rendered("a{{uuid:a}}{{uuid:b}}\n{{uuid:c}}");
        for line in surface.lines() {
            assert!(matches!(line.nodes().first(), Some(Inline::Text(_))));
            assert!(matches!(line.nodes().last(), Some(Inline::Text(_))));
            for pair in line.nodes().windows(2) {
                if let [Inline::Chip(_), next] = pair {
                    assert!(matches!(next, Inline::Text(t) if t.starts_with(CARET_ANCHOR)));
                }
            }
        }
        assert_eq!(surface.chips().count(), 3);
    }

    #[test]
    fn test_caret_round_trip_outside_chips() {
        for doc in DOCUMENTS {
            let mut surface = rendered(doc);
            let markers = parse_markers(doc);
            for n in 0..=char_len(doc) {
                if markers
                    .iter()
                    .any(|m| m.char_span.start < n && n < m.char_span.end)
                {
                    continue;
                }
                surface.set_caret_offset(n);
                assert_eq!(surface.caret_offset(), Some(n), "offset {n} in {doc:?}");

                let before = surface.caret();
                surface.set_caret_offset(surface.caret_offset().unwrap());
                assert_eq!(surface.caret(), before);
            }
        }
    }

    #[test]
    fn test_caret_inside_chip_snaps_after_it() {
        let mut surface = rendered("ab{{uuid:a}}cd");
        surface.set_caret_offset(5);
        assert_eq!(surface.caret_offset(), Some(12));
    }

    #[test]
    fn test_caret_after_chip_sits_past_anchor() {
        let mut surface = rendered("{{uuid:a}}x");
        surface.set_caret_offset(10);
        assert_eq!(
            surface.caret(),
            Some(Cursor {
                line: 0,
                node: 2,
                offset: 1
            })
        );
    }

    #[test]
    fn test_caret_clamps_to_end() {
        let mut surface = rendered("ab\ncd");
        surface.set_caret_offset(99);
        assert_eq!(surface.caret_offset(), Some(5));
    }

    #[test]
    fn test_caret_outside_surface() {
        let mut surface = rendered("abc");
        assert_eq!(surface.caret_offset(), None);
        surface.focus();
        assert_eq!(surface.caret_offset(), Some(3));
        surface.blur();
        assert_eq!(surface.caret_offset(), None);
    }

    #[test]
    fn test_type_text_splits_lines() {
        let mut surface = rendered("a{{uuid:x}}b");
        surface.set_caret_offset(1);
        surface.type_text("1\n2");
        assert_eq!(surface.extract(), "a1\n2{{uuid:x}}b");
        assert_eq!(surface.caret_offset(), Some(4));
        assert_eq!(surface.lines().len(), 2);
    }

    #[test]
    fn test_native_backspace() {
        let mut surface = rendered("ab{{uuid:x}}c\nd");
        surface.set_caret_offset(12);
        surface.backspace();
        assert_eq!(surface.extract(), "abc\nd");
        assert_eq!(surface.caret_offset(), Some(2));

        surface.backspace();
        assert_eq!(surface.extract(), "ac\nd");

        surface.set_caret_offset(3);
        surface.backspace();
        assert_eq!(surface.extract(), "acd");
        assert_eq!(surface.caret_offset(), Some(2));
    }

    #[test]
    fn test_refresh_chip_updates_label() {
        let mut surface = rendered("{{file-base64:f}} {{file-base64:f}}");
        let variable = Variable::new("f", VariableType::FileBase64)
            .with_name("logo.png")
            .with_data("AAAA");
        surface.refresh_chip(&ChipView::for_variable(&variable));

        assert!(surface
            .chips()
            .all(|c| c.label == "logo.png" && !c.needs_configuration));
        assert_eq!(surface.extract(), "{{file-base64:f}} {{file-base64:f}}");
    }

    #[test]
    fn test_screen_positions() {
        let mut surface = rendered("ab\n{{uuid:a}}x").with_metrics(10.0, 20.0);
        assert_eq!(surface.chip_position("a"), Some(ScreenPoint::new(0.0, 40.0)));
        assert_eq!(surface.chip_position("missing"), None);

        surface.set_caret_offset(14);
        // "UUID" plus padding, then one character.
        assert_eq!(surface.caret_position(), Some(ScreenPoint::new(70.0, 40.0)));
    }
}
