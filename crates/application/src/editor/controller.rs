//! Editor controller
//!
//! Owns the canonical document and the variable registry, reacts to surface
//! events and keeps the surface, the registry and the owning form in sync.
//! Every transition ends the same way: the canonical document is taken,
//! referenced ids are diffed against the registry, orphans are pruned,
//! unknown markers are adopted, and the observer is notified of whatever
//! changed.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, TimeDelta, Utc};
use courier_domain::marker::{marker_ending_at, marker_multiset};
use courier_domain::text::{char_len, char_slice, leading_indent, line_before, splice};
use courier_domain::{
    BodySyntax, EditorSettings, Marker, SyntaxStatus, Variable, VariableRegistry, VariableType,
    generate_id,
};

use super::events::{EventOutcome, Key, SurfaceEvent};
use super::state::{EditorState, FileRequest};
use super::timer::FormatTimer;
use crate::error::{ApplicationError, ApplicationResult};
use crate::format;
use crate::ports::{
    ChipView, Clock, EditorObserver, FileLoadError, LoadedFile, TextSurface, surface_runs,
};

/// How the surface is brought up to date after a commit.
enum Refresh {
    /// The surface already shows the document.
    Keep,
    /// Rebuild the surface and place the caret.
    Rebuild(Option<usize>),
}

/// The editor state machine.
pub struct EditorController<S, O> {
    surface: S,
    observer: O,
    clock: Arc<dyn Clock>,
    settings: EditorSettings,
    syntax: BodySyntax,
    document: String,
    registry: VariableRegistry,
    state: EditorState,
    status: SyntaxStatus,
    timer: FormatTimer,
    file_requests: Vec<FileRequest>,
    /// Markers the surface currently shows as chips.
    rendered_markers: Vec<String>,
}

impl<S: TextSurface, O: EditorObserver> EditorController<S, O> {
    /// Creates a controller over an empty document and renders it.
    pub fn new(
        surface: S,
        observer: O,
        clock: Arc<dyn Clock>,
        settings: EditorSettings,
        syntax: BodySyntax,
    ) -> Self {
        let mut controller = Self {
            surface,
            observer,
            clock,
            settings,
            syntax,
            document: String::new(),
            registry: VariableRegistry::new(),
            state: EditorState::Idle,
            status: SyntaxStatus::Valid,
            timer: FormatTimer::new(),
            file_requests: Vec::new(),
            rendered_markers: Vec::new(),
        };
        controller.render();
        controller
    }

    /// The canonical document.
    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }

    /// The variables referenced by the document.
    #[must_use]
    pub const fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    /// The interaction state.
    #[must_use]
    pub const fn state(&self) -> &EditorState {
        &self.state
    }

    /// Whether the document currently parses for its syntax.
    #[must_use]
    pub const fn status(&self) -> &SyntaxStatus {
        &self.status
    }

    /// The body syntax.
    #[must_use]
    pub const fn syntax(&self) -> BodySyntax {
        self.syntax
    }

    /// The editor settings.
    #[must_use]
    pub const fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// The host surface.
    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// The host surface, for native editing by the host.
    pub const fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// The observer.
    #[must_use]
    pub const fn observer(&self) -> &O {
        &self.observer
    }

    /// When the pending auto-format is due.
    #[must_use]
    pub const fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.timer.deadline()
    }

    /// Drains the file selections the host has to perform.
    pub fn take_file_requests(&mut self) -> Vec<FileRequest> {
        std::mem::take(&mut self.file_requests)
    }

    /// Changes the body syntax and re-validates the document.
    pub fn set_syntax(&mut self, syntax: BodySyntax) {
        self.syntax = syntax;
        self.timer.cancel();
        self.status = format::validate(&self.document, syntax);
    }

    /// Replaces the settings. A pending auto-format keeps its deadline.
    pub fn set_settings(&mut self, settings: EditorSettings) {
        self.settings = settings;
    }

    /// Handles an input event from the surface.
    pub fn handle_event(&mut self, event: SurfaceEvent) -> EventOutcome {
        tracing::trace!(
            target: "courier::editor",
            state = self.state.name(),
            ?event,
            "surface event"
        );
        match event {
            SurfaceEvent::TextChanged => {
                self.on_text_changed();
                EventOutcome::Ignored
            }
            SurfaceEvent::Paste(text) => self.on_paste(&text),
            SurfaceEvent::KeyDown(key) => self.on_key_down(key),
            SurfaceEvent::ChipClicked { id } => self.on_chip_clicked(&id),
            SurfaceEvent::ClickedElsewhere => {
                self.close_overlays();
                EventOutcome::Ignored
            }
            SurfaceEvent::FocusLost => {
                self.state = match std::mem::take(&mut self.state) {
                    EditorState::PickerOpen { .. } => EditorState::Composing,
                    EditorState::Composing | EditorState::Idle => EditorState::Idle,
                    popover @ EditorState::PopoverOpen { .. } => popover,
                };
                EventOutcome::Ignored
            }
        }
    }

    /// Inserts a new variable of `variable_type` in place of the trigger.
    ///
    /// Returns the new variable's id.
    ///
    /// # Errors
    ///
    /// Returns an error if the picker is not open.
    pub fn select_variable_type(&mut self, variable_type: VariableType) -> ApplicationResult<String> {
        let EditorState::PickerOpen { trigger_offset, .. } = &self.state else {
            return Err(ApplicationError::InvalidState("the picker is not open".to_string()));
        };
        let trigger_offset = *trigger_offset;
        let trigger_end = trigger_offset + char_len(&self.settings.trigger);

        let range = if char_slice(&self.document, trigger_offset..trigger_end) == self.settings.trigger
        {
            trigger_offset..trigger_end
        } else {
            let caret = self.surface.caret_offset().unwrap_or(trigger_offset);
            caret..caret
        };

        let id = generate_id();
        let raw = Marker::format(variable_type, &id);
        let caret = range.start + char_len(&raw);
        let document = splice(&self.document, range, &raw);

        self.registry.upsert(Variable::new(id.clone(), variable_type));
        self.commit(document, Refresh::Rebuild(Some(caret)), true);

        tracing::debug!(
            target: "courier::editor",
            %variable_type,
            id = %id,
            "inserted variable"
        );

        self.state = match variable_type {
            VariableType::Base64Text => EditorState::PopoverOpen {
                anchor: self.surface.chip_position(&id),
                variable_id: id.clone(),
            },
            file => {
                if file.is_file_backed() {
                    self.request_file(&id, file);
                }
                EditorState::Composing
            }
        };

        Ok(id)
    }

    /// Closes the picker without inserting anything.
    pub fn dismiss_picker(&mut self) {
        if self.state.is_picker_open() {
            self.state = EditorState::Composing;
        }
    }

    /// Stores the popover text, base64 encoded, as the variable's data.
    ///
    /// # Errors
    ///
    /// Returns an error if no popover is open or its variable is gone.
    pub fn submit_popover(&mut self, text: &str) -> ApplicationResult<()> {
        let EditorState::PopoverOpen { variable_id, .. } = &self.state else {
            return Err(ApplicationError::InvalidState("no popover is open".to_string()));
        };
        let id = variable_id.clone();
        self.state = EditorState::Composing;

        let variable = self
            .registry
            .get_mut(&id)
            .ok_or_else(|| ApplicationError::UnknownVariable(id.clone()))?;
        variable.data = Some(STANDARD.encode(text));
        let view = ChipView::for_variable(variable);

        self.surface.refresh_chip(&view);
        self.observer.on_variables_change(self.registry.as_slice());
        Ok(())
    }

    /// Closes the popover without changing the variable.
    pub fn close_popover(&mut self) {
        if self.state.is_popover_open() {
            self.state = EditorState::Composing;
        }
    }

    /// Applies the document and variables held by the owning form.
    ///
    /// A document equal to the canonical one only refreshes the registry and
    /// the chip labels. Any other document rebuilds the surface and restores
    /// the caret, clamped to the new content.
    pub fn set_props(&mut self, document: &str, variables: &[Variable]) {
        let mut registry = VariableRegistry::from_variables(variables.iter().cloned());
        let diff = registry.sync_with_document(document);
        self.registry = registry;

        if document == self.document {
            for variable in &self.registry {
                self.surface.refresh_chip(&ChipView::for_variable(variable));
            }
        } else {
            let caret = self.surface.caret_offset();
            self.document = document.to_string();
            self.timer.cancel();
            self.status = format::validate(&self.document, self.syntax);
            self.close_overlays();
            self.render();
            if let Some(caret) = caret {
                self.surface.set_caret_offset(caret.min(char_len(&self.document)));
            }
            tracing::debug!(
                target: "courier::editor",
                chars = char_len(&self.document),
                "rebuilt surface from external document"
            );
        }

        if diff.is_changed() {
            self.observer.on_variables_change(self.registry.as_slice());
        }
    }

    /// Applies the outcome of a file read requested through a [`FileRequest`].
    ///
    /// Returns true if the variable was updated. Results for variables that
    /// are no longer registered are discarded; failures leave the variable
    /// as it was.
    pub fn complete_file_read(
        &mut self,
        id: &str,
        result: Result<LoadedFile, FileLoadError>,
    ) -> bool {
        let Some(variable) = self.registry.get_mut(id) else {
            tracing::debug!(
                target: "courier::editor",
                id,
                "discarding file read for a removed variable"
            );
            return false;
        };

        match result {
            Ok(file) => {
                variable.name = file.name;
                variable.mime_type = Some(file.mime_type);
                variable.data = Some(file.data);
                let view = ChipView::for_variable(variable);
                self.surface.refresh_chip(&view);
                self.observer.on_variables_change(self.registry.as_slice());
                true
            }
            Err(error) => {
                tracing::warn!(
                    target: "courier::editor",
                    id,
                    %error,
                    "file read failed"
                );
                false
            }
        }
    }

    /// Runs the auto-format if its deadline has passed.
    ///
    /// Returns true if the document was reformatted.
    pub fn poll(&mut self) -> bool {
        if self.timer.take_due(self.clock.now()) {
            self.format_now()
        } else {
            false
        }
    }

    /// Re-validates and reformats the document immediately.
    ///
    /// Returns true if the document was replaced. The caret moves to the end.
    /// While the picker or the popover is open nothing is rewritten; the
    /// format is deferred by another quiet period instead.
    pub fn format_now(&mut self) -> bool {
        if self.state.is_picker_open() || self.state.is_popover_open() {
            let delay = TimeDelta::from_std(self.settings.debounce()).unwrap_or_default();
            self.timer.schedule(self.clock.now() + delay);
            tracing::debug!(
                target: "courier::editor",
                state = self.state.name(),
                "auto-format deferred while an overlay is open"
            );
            return false;
        }
        self.timer.cancel();
        self.status = format::validate(&self.document, self.syntax);
        if !self.status.is_valid() {
            tracing::debug!(
                target: "courier::editor",
                "document became invalid before formatting"
            );
            return false;
        }
        let Some(formatted) =
            format::auto_format(&self.document, self.syntax, &self.settings.indent_unit)
        else {
            return false;
        };

        let end = char_len(&formatted);
        self.document = formatted;
        self.render();
        self.surface.set_caret_offset(end);
        self.observer.on_change(&self.document);

        tracing::debug!(target: "courier::editor", syntax = %self.syntax, "auto-formatted");
        true
    }

    fn on_text_changed(&mut self) {
        let document = self.surface.extract();
        let caret = self.surface.caret_offset();

        // Markers completed or broken by native typing need their chips rebuilt.
        let refresh = if marker_multiset(&document) == self.rendered_markers {
            Refresh::Keep
        } else {
            Refresh::Rebuild(caret)
        };
        self.commit(document, refresh, false);

        self.state = match caret {
            Some(caret) if self.trigger_precedes(caret) => {
                tracing::debug!(target: "courier::editor", caret, "opening variable picker");
                EditorState::PickerOpen {
                    anchor: self.surface.caret_position(),
                    trigger_offset: caret - char_len(&self.settings.trigger),
                }
            }
            _ => EditorState::Composing,
        };
    }

    fn on_paste(&mut self, text: &str) -> EventOutcome {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        self.insert_at_caret(&text)
    }

    fn on_key_down(&mut self, key: Key) -> EventOutcome {
        match key {
            Key::Enter => self.insert_line_break(),
            Key::Tab => {
                let unit = self.settings.indent_unit.clone();
                self.insert_at_caret(&unit)
            }
            Key::Backspace => self.delete_chip_before_caret(),
            Key::Escape => {
                if self.close_overlays() {
                    EventOutcome::Handled
                } else {
                    EventOutcome::Ignored
                }
            }
            Key::Other => EventOutcome::Ignored,
        }
    }

    fn on_chip_clicked(&mut self, id: &str) -> EventOutcome {
        let Some(variable_type) = self.registry.get(id).map(|v| v.variable_type) else {
            return EventOutcome::Ignored;
        };
        match variable_type {
            VariableType::Base64Text => {
                self.state = EditorState::PopoverOpen {
                    variable_id: id.to_string(),
                    anchor: self.surface.chip_position(id),
                };
                EventOutcome::Handled
            }
            file if file.is_file_backed() => {
                self.request_file(id, file);
                EventOutcome::Handled
            }
            _ => EventOutcome::Ignored,
        }
    }

    fn insert_line_break(&mut self) -> EventOutcome {
        let Some(caret) = self.surface.caret_offset() else {
            return EventOutcome::Ignored;
        };
        let line = line_before(&self.document, caret);
        let mut insert = format!("\n{}", leading_indent(line));
        if self.syntax.opens_block(line.trim_end()) {
            insert.push_str(&self.settings.indent_unit);
        }
        self.insert_text(caret, &insert);
        EventOutcome::Handled
    }

    fn insert_at_caret(&mut self, text: &str) -> EventOutcome {
        let Some(caret) = self.surface.caret_offset() else {
            return EventOutcome::Ignored;
        };
        self.insert_text(caret, text);
        EventOutcome::Handled
    }

    fn insert_text(&mut self, caret: usize, text: &str) {
        let document = splice(&self.document, caret..caret, text);
        self.commit(document, Refresh::Rebuild(Some(caret + char_len(text))), false);
        self.state = EditorState::Composing;
    }

    fn delete_chip_before_caret(&mut self) -> EventOutcome {
        let Some(caret) = self.surface.caret_offset() else {
            return EventOutcome::Ignored;
        };
        let Some(marker) = marker_ending_at(&self.document, caret) else {
            return EventOutcome::Ignored;
        };

        tracing::debug!(target: "courier::editor", id = %marker.id, "deleting chip");
        let document = splice(&self.document, marker.char_span.clone(), "");
        self.commit(document, Refresh::Rebuild(Some(marker.char_span.start)), false);
        self.state = EditorState::Composing;
        EventOutcome::Handled
    }

    fn close_overlays(&mut self) -> bool {
        if self.state.is_picker_open() || self.state.is_popover_open() {
            self.state = EditorState::Composing;
            true
        } else {
            false
        }
    }

    fn request_file(&mut self, id: &str, variable_type: VariableType) {
        tracing::debug!(target: "courier::editor", id, %variable_type, "requesting file");
        self.file_requests.push(FileRequest {
            variable_id: id.to_string(),
            variable_type,
        });
    }

    fn trigger_precedes(&self, caret: usize) -> bool {
        let trigger = &self.settings.trigger;
        let len = char_len(trigger);
        len > 0 && caret >= len && char_slice(&self.document, caret - len..caret) == trigger
    }

    /// Installs a new canonical document, reconciles the registry and
    /// notifies the observer.
    fn commit(&mut self, document: String, refresh: Refresh, registry_touched: bool) {
        let changed = document != self.document;
        let was_blank = self.document.trim().is_empty();
        self.document = document;

        let diff = self.registry.sync_with_document(&self.document);
        if !diff.pruned.is_empty() {
            let pruned: Vec<&str> = diff.pruned.iter().map(|v| v.id.as_str()).collect();
            tracing::debug!(target: "courier::editor", ?pruned, "pruned unreferenced variables");
        }
        if !diff.adopted.is_empty() {
            tracing::debug!(
                target: "courier::editor",
                adopted = ?diff.adopted,
                "adopted unknown markers"
            );
        }

        if let Refresh::Rebuild(caret) = refresh {
            self.render();
            if let Some(caret) = caret {
                self.surface.set_caret_offset(caret);
            }
        }

        if changed {
            self.reschedule_format(was_blank);
            self.observer.on_change(&self.document);
        }
        if registry_touched || diff.is_changed() {
            self.observer.on_variables_change(self.registry.as_slice());
        }
    }

    /// Cancels any pending format, re-validates, and schedules a format when
    /// the document just became valid or a format was already pending.
    fn reschedule_format(&mut self, was_blank: bool) {
        let was_pending = self.timer.is_pending();
        let was_valid = self.status.is_valid() && !was_blank;
        self.timer.cancel();
        self.status = format::validate(&self.document, self.syntax);

        if self.syntax == BodySyntax::Text || self.document.trim().is_empty() {
            return;
        }
        if self.status.is_valid() && (!was_valid || was_pending) {
            let delay = TimeDelta::from_std(self.settings.debounce()).unwrap_or_default();
            self.timer.schedule(self.clock.now() + delay);
            tracing::trace!(target: "courier::editor", "auto-format scheduled");
        }
    }

    fn render(&mut self) {
        let runs = surface_runs(&self.document, &self.registry);
        self.surface.render(&runs);
        self.rendered_markers = marker_multiset(&self.document);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::ports::{ScreenPoint, SurfaceRun};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    /// A surface that shows chips as their raw marker text.
    #[derive(Default)]
    struct StringSurface {
        text: String,
        caret: Option<usize>,
        renders: usize,
        refreshed: Vec<ChipView>,
    }

    impl StringSurface {
        fn type_text(&mut self, text: &str) {
            let caret = self.caret.unwrap_or(char_len(&self.text));
            self.text = splice(&self.text, caret..caret, text);
            self.caret = Some(caret + char_len(text));
        }
    }

    impl TextSurface for StringSurface {
        fn render(&mut self, runs: &[SurfaceRun]) {
            self.text = runs.iter().map(SurfaceRun::as_str).collect();
            self.renders += 1;
        }

        fn extract(&self) -> String {
            self.text.clone()
        }

        fn caret_offset(&self) -> Option<usize> {
            self.caret
        }

        fn set_caret_offset(&mut self, offset: usize) {
            self.caret = Some(offset.min(char_len(&self.text)));
        }

        fn refresh_chip(&mut self, chip: &ChipView) {
            self.refreshed.push(chip.clone());
        }

        fn caret_position(&self) -> Option<ScreenPoint> {
            self.caret.map(|c| ScreenPoint::new(c as f32, 0.0))
        }

        fn chip_position(&self, _id: &str) -> Option<ScreenPoint> {
            Some(ScreenPoint::default())
        }
    }

    #[derive(Default)]
    struct Recorder {
        changes: Vec<String>,
        variables: Vec<Vec<Variable>>,
    }

    impl EditorObserver for Recorder {
        fn on_change(&mut self, document: &str) {
            self.changes.push(document.to_string());
        }

        fn on_variables_change(&mut self, variables: &[Variable]) {
            self.variables.push(variables.to_vec());
        }
    }

    struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            )))
        }

        fn advance(&self, millis: i64) {
            *self.0.lock().unwrap() += TimeDelta::milliseconds(millis);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    type Editor = EditorController<StringSurface, Recorder>;

    fn editor_with_clock(syntax: BodySyntax, clock: Arc<ManualClock>) -> Editor {
        EditorController::new(
            StringSurface::default(),
            Recorder::default(),
            clock,
            EditorSettings::default(),
            syntax,
        )
    }

    fn editor(syntax: BodySyntax) -> Editor {
        editor_with_clock(syntax, ManualClock::new())
    }

    fn type_text(editor: &mut Editor, text: &str) {
        editor.surface_mut().type_text(text);
        editor.handle_event(SurfaceEvent::TextChanged);
    }

    #[test]
    fn test_trigger_opens_picker_and_timestamp_inserts_chip() {
        let mut editor = editor(BodySyntax::Json);
        type_text(&mut editor, r#"{"at": "#);
        type_text(&mut editor, "{{");
        assert!(editor.state().is_picker_open());

        let id = editor.select_variable_type(VariableType::Timestamp).unwrap();
        assert_eq!(editor.document(), format!(r#"{{"at": {{{{timestamp:{id}}}}}"#));
        assert_eq!(editor.state(), &EditorState::Composing);
        assert!(editor.registry().get(&id).is_some_and(|v| v.data.is_none()));
        assert!(editor.take_file_requests().is_empty());
        assert_eq!(editor.observer().changes.last().map(String::as_str), Some(editor.document()));
    }

    #[test]
    fn test_select_requires_open_picker() {
        let mut editor = editor(BodySyntax::Json);
        assert!(matches!(
            editor.select_variable_type(VariableType::Uuid),
            Err(ApplicationError::InvalidState(_))
        ));
    }

    #[test]
    fn test_typing_past_trigger_closes_picker() {
        let mut editor = editor(BodySyntax::Text);
        type_text(&mut editor, "{{");
        assert!(editor.state().is_picker_open());
        type_text(&mut editor, "x");
        assert_eq!(editor.state(), &EditorState::Composing);
    }

    #[test]
    fn test_base64_text_flow() {
        let mut editor = editor(BodySyntax::Text);
        type_text(&mut editor, "{{");
        let id = editor.select_variable_type(VariableType::Base64Text).unwrap();
        assert!(matches!(
            editor.state(),
            EditorState::PopoverOpen { variable_id, .. } if *variable_id == id
        ));

        editor.submit_popover("hello").unwrap();
        assert_eq!(
            editor.registry().get(&id).and_then(|v| v.data.as_deref()),
            Some("aGVsbG8=")
        );
        let refreshed = editor.surface().refreshed.last().unwrap();
        assert!(!refreshed.needs_configuration);
        assert_eq!(editor.state(), &EditorState::Composing);
    }

    #[test]
    fn test_backspace_after_chip_deletes_and_prunes() {
        let mut editor = editor(BodySyntax::Text);
        type_text(&mut editor, "a {{");
        let id = editor.select_variable_type(VariableType::Base64Text).unwrap();
        editor.close_popover();

        assert_eq!(
            editor.handle_event(SurfaceEvent::KeyDown(Key::Backspace)),
            EventOutcome::Handled
        );
        assert_eq!(editor.document(), "a ");
        assert!(!editor.registry().contains(&id));
        assert_eq!(editor.surface().caret, Some(2));
        assert_eq!(editor.observer().variables.last(), Some(&Vec::new()));

        assert_eq!(
            editor.handle_event(SurfaceEvent::KeyDown(Key::Backspace)),
            EventOutcome::Ignored
        );
    }

    #[test]
    fn test_backspace_keeps_variable_referenced_elsewhere() {
        let mut editor = editor(BodySyntax::Text);
        let doc = "{{uuid:a}} {{uuid:a}}";
        editor.set_props(doc, &[Variable::new("a", VariableType::Uuid)]);
        editor.surface_mut().set_caret_offset(char_len(doc));

        editor.handle_event(SurfaceEvent::KeyDown(Key::Backspace));
        assert_eq!(editor.document(), "{{uuid:a}} ");
        assert!(editor.registry().contains("a"));
    }

    #[test]
    fn test_native_edit_garbage_collects() {
        let mut editor = editor(BodySyntax::Text);
        editor.set_props("x{{uuid:a}}", &[Variable::new("a", VariableType::Uuid)]);
        editor.surface_mut().text = "x".to_string();
        editor.surface_mut().caret = Some(1);
        editor.handle_event(SurfaceEvent::TextChanged);

        assert!(editor.registry().is_empty());
        assert_eq!(editor.observer().variables.last(), Some(&Vec::new()));
    }

    #[test]
    fn test_enter_carries_indentation() {
        let mut editor = editor(BodySyntax::Json);
        type_text(&mut editor, "{");
        editor.handle_event(SurfaceEvent::KeyDown(Key::Enter));
        assert_eq!(editor.document(), "{\n  ");

        type_text(&mut editor, "\"a\": 1,");
        editor.handle_event(SurfaceEvent::KeyDown(Key::Enter));
        assert_eq!(editor.document(), "{\n  \"a\": 1,\n  ");
    }

    #[test]
    fn test_enter_after_xml_opening_tag() {
        let mut editor = editor(BodySyntax::Xml);
        type_text(&mut editor, "<root>");
        editor.handle_event(SurfaceEvent::KeyDown(Key::Enter));
        assert_eq!(editor.document(), "<root>\n  ");

        type_text(&mut editor, "<a/>");
        editor.handle_event(SurfaceEvent::KeyDown(Key::Enter));
        assert_eq!(editor.document(), "<root>\n  <a/>\n  ");
    }

    #[test]
    fn test_tab_inserts_indent_unit() {
        let mut editor = editor(BodySyntax::Text);
        type_text(&mut editor, "a");
        assert_eq!(
            editor.handle_event(SurfaceEvent::KeyDown(Key::Tab)),
            EventOutcome::Handled
        );
        assert_eq!(editor.document(), "a  ");
    }

    #[test]
    fn test_tab_follows_replaced_settings() {
        let mut editor = editor(BodySyntax::Text);
        editor.set_settings(EditorSettings {
            indent_unit: "\t".to_string(),
            ..EditorSettings::default()
        });
        type_text(&mut editor, "a");
        editor.handle_event(SurfaceEvent::KeyDown(Key::Tab));
        assert_eq!(editor.document(), "a\t");
        assert_eq!(editor.settings().indent_unit, "\t");
    }

    #[test]
    fn test_set_syntax_revalidates_document() {
        let mut editor = editor(BodySyntax::Json);
        editor.set_props("<a>{{uuid:v1}}</a>", &[Variable::new("v1", VariableType::Uuid)]);
        assert!(!editor.status().is_valid());

        editor.set_syntax(BodySyntax::Xml);
        assert_eq!(editor.syntax(), BodySyntax::Xml);
        assert!(editor.status().is_valid());
        assert_eq!(editor.next_deadline(), None);

        editor.set_syntax(BodySyntax::Json);
        assert!(!editor.status().is_valid());
    }

    #[test]
    fn test_paste_adopts_unknown_markers() {
        let mut editor = editor(BodySyntax::Text);
        type_text(&mut editor, "");
        editor.surface_mut().caret = Some(0);
        editor.handle_event(SurfaceEvent::Paste("a\r\n{{file-base64:f}}".to_string()));

        assert_eq!(editor.document(), "a\n{{file-base64:f}}");
        let adopted = editor.registry().get("f").unwrap();
        assert_eq!(adopted.variable_type, VariableType::FileBase64);
        assert!(!adopted.is_configured());
    }

    #[test]
    fn test_escape_and_focus_loss_close_picker() {
        let mut editor = editor(BodySyntax::Text);
        type_text(&mut editor, "{{");
        assert_eq!(
            editor.handle_event(SurfaceEvent::KeyDown(Key::Escape)),
            EventOutcome::Handled
        );
        assert_eq!(editor.state(), &EditorState::Composing);

        type_text(&mut editor, "{{");
        editor.handle_event(SurfaceEvent::FocusLost);
        assert_eq!(editor.state(), &EditorState::Composing);
        editor.handle_event(SurfaceEvent::FocusLost);
        assert_eq!(editor.state(), &EditorState::Idle);
    }

    #[test]
    fn test_popover_survives_focus_loss() {
        let mut editor = editor(BodySyntax::Text);
        editor.set_props("{{base64-text:b}}", &[]);
        editor.handle_event(SurfaceEvent::ChipClicked { id: "b".to_string() });
        editor.handle_event(SurfaceEvent::FocusLost);
        assert!(editor.state().is_popover_open());
        editor.handle_event(SurfaceEvent::ClickedElsewhere);
        assert_eq!(editor.state(), &EditorState::Composing);
    }

    #[test]
    fn test_file_requests_and_completion() {
        let mut editor = editor(BodySyntax::Text);
        type_text(&mut editor, "{{");
        let id = editor.select_variable_type(VariableType::FileDataUrl).unwrap();
        let requests = editor.take_file_requests();
        assert_eq!(
            requests,
            vec![FileRequest {
                variable_id: id.clone(),
                variable_type: VariableType::FileDataUrl,
            }]
        );

        let file = LoadedFile {
            name: "logo.png".to_string(),
            mime_type: "image/png".to_string(),
            data: "iVBOR".to_string(),
        };
        assert!(!editor.complete_file_read("gone", Ok(file.clone())));
        assert!(editor.complete_file_read(&id, Ok(file)));

        let variable = editor.registry().get(&id).unwrap();
        assert_eq!(variable.name, "logo.png");
        assert!(variable.is_configured());
        assert_eq!(editor.surface().refreshed.last().unwrap().label, "logo.png");

        editor.handle_event(SurfaceEvent::ChipClicked { id: id.clone() });
        assert_eq!(editor.take_file_requests().len(), 1);
    }

    #[test]
    fn test_failed_file_read_leaves_variable_unconfigured() {
        let mut editor = editor(BodySyntax::Text);
        editor.set_props("{{file-base64:f}}", &[]);
        let error = FileLoadError::NotFound("missing.bin".into());
        assert!(!editor.complete_file_read("f", Err(error)));
        assert!(!editor.registry().get("f").unwrap().is_configured());
    }

    #[test]
    fn test_auto_type_chip_click_is_ignored() {
        let mut editor = editor(BodySyntax::Text);
        editor.set_props("{{uuid:u}}", &[]);
        assert_eq!(
            editor.handle_event(SurfaceEvent::ChipClicked { id: "u".to_string() }),
            EventOutcome::Ignored
        );
    }

    #[test]
    fn test_debounced_format() {
        let clock = ManualClock::new();
        let mut editor = editor_with_clock(BodySyntax::Json, Arc::clone(&clock));

        type_text(&mut editor, r#"{"a":"#);
        assert!(!editor.status().is_valid());
        assert_eq!(editor.next_deadline(), None);

        type_text(&mut editor, "1}");
        assert!(editor.status().is_valid());
        assert!(editor.next_deadline().is_some());

        clock.advance(300);
        assert!(!editor.poll());

        type_text(&mut editor, " ");
        clock.advance(300);
        assert!(!editor.poll(), "every edit restarts the window");

        clock.advance(200);
        assert!(editor.poll());
        assert_eq!(editor.document(), "{\n  \"a\": 1\n}");
        assert_eq!(editor.surface().caret, Some(char_len(editor.document())));
        assert_eq!(editor.next_deadline(), None);
    }

    #[test]
    fn test_format_waits_for_open_picker() {
        let clock = ManualClock::new();
        let mut editor = editor_with_clock(BodySyntax::Json, Arc::clone(&clock));

        type_text(&mut editor, r#"{"a": "x"}"#);
        editor.surface_mut().set_caret_offset(8);
        type_text(&mut editor, "{{");
        assert!(editor.state().is_picker_open());
        assert!(editor.status().is_valid());

        clock.advance(600);
        assert!(!editor.poll());
        assert_eq!(editor.document(), r#"{"a": "x{{"}"#);
        assert!(editor.next_deadline().is_some());

        let id = editor.select_variable_type(VariableType::Uuid).unwrap();
        assert_eq!(editor.document(), format!(r#"{{"a": "x{{{{uuid:{id}}}}}"}}"#));

        clock.advance(600);
        assert!(editor.poll());
        assert_eq!(
            editor.document(),
            format!("{{\n  \"a\": \"x{{{{uuid:{id}}}}}\"\n}}")
        );
    }

    #[test]
    fn test_format_now_waits_for_open_popover() {
        let mut editor = editor(BodySyntax::Json);
        editor.set_props(
            "[{{base64-text:b}}]",
            &[Variable::new("b", VariableType::Base64Text)],
        );
        editor.handle_event(SurfaceEvent::ChipClicked { id: "b".to_string() });
        assert!(editor.state().is_popover_open());

        assert!(!editor.format_now());
        assert_eq!(editor.document(), "[{{base64-text:b}}]");
        assert!(editor.next_deadline().is_some());

        editor.close_popover();
        assert!(editor.format_now());
        assert_eq!(editor.document(), "[\n  {{base64-text:b}}\n]");
    }

    #[test]
    fn test_invalid_edit_cancels_pending_format() {
        let clock = ManualClock::new();
        let mut editor = editor_with_clock(BodySyntax::Json, Arc::clone(&clock));
        type_text(&mut editor, "[1]");
        assert!(editor.next_deadline().is_some());

        type_text(&mut editor, ",");
        clock.advance(1_000);
        assert!(!editor.poll());
        assert_eq!(editor.document(), "[1],");
    }

    #[test]
    fn test_editing_a_valid_document_does_not_schedule() {
        let mut editor = editor(BodySyntax::Json);
        editor.set_props("{\"a\": \"x\"}", &[]);
        editor.surface_mut().set_caret_offset(8);
        type_text(&mut editor, "y");
        assert_eq!(editor.document(), "{\"a\": \"xy\"}");
        assert_eq!(editor.next_deadline(), None);
    }

    #[test]
    fn test_format_now_keeps_markers() {
        let mut editor = editor(BodySyntax::Json);
        editor.set_props(r#"{"id":{{uuid:v1}}}"#, &[]);
        assert!(editor.format_now());
        assert_eq!(editor.document(), "{\n  \"id\": {{uuid:v1}}\n}");
        assert!(editor.registry().contains("v1"));
        assert!(!editor.format_now());
    }

    #[test]
    fn test_set_props_rebuilds_only_on_external_change() {
        let mut editor = editor(BodySyntax::Text);
        editor.set_props("hello world", &[]);
        editor.surface_mut().set_caret_offset(5);
        let renders = editor.surface().renders;

        let variables = [Variable::new("a", VariableType::Uuid).with_name("request id")];
        editor.set_props("hello world", &variables);
        assert_eq!(editor.surface().renders, renders);
        assert!(editor.registry().is_empty(), "orphans are pruned");

        editor.set_props("hi", &[]);
        assert_eq!(editor.surface().renders, renders + 1);
        assert_eq!(editor.surface().caret, Some(2));
    }

    #[test]
    fn test_set_props_refreshes_chip_labels() {
        let mut editor = editor(BodySyntax::Text);
        editor.set_props("{{uuid:a}}", &[Variable::new("a", VariableType::Uuid)]);
        editor.set_props(
            "{{uuid:a}}",
            &[Variable::new("a", VariableType::Uuid).with_name("request id")],
        );
        assert_eq!(editor.surface().refreshed.last().unwrap().label, "request id");
    }

    #[test]
    fn test_typed_marker_becomes_chip() {
        let mut editor = editor(BodySyntax::Text);
        let renders = editor.surface().renders;
        type_text(&mut editor, "{{uuid:a}}");
        assert_eq!(editor.surface().renders, renders + 1);
        assert!(editor.registry().contains("a"));
    }
}
