//! End-to-end editing flows on the tree surface, through to resolution.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::{Arc, Mutex};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use courier_application::ports::{Clock, EditorObserver, FileLoadError, TextSurface};
use courier_application::{
    EditorController, EditorState, Key, ResolveOptions, SurfaceEvent, VariableResolver,
};
use courier_domain::{BodySyntax, EditorSettings, Variable, VariableType};
use courier_infrastructure::{TreeSurface, from_json, to_json_stable};
use pretty_assertions::assert_eq;

struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(now)))
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

#[derive(Default)]
struct Form {
    documents: Vec<String>,
    variables: Vec<Vec<Variable>>,
}

impl EditorObserver for Form {
    fn on_change(&mut self, document: &str) {
        self.documents.push(document.to_string());
    }

    fn on_variables_change(&mut self, variables: &[Variable]) {
        self.variables.push(variables.to_vec());
    }
}

type Editor = EditorController<TreeSurface, Form>;

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 26, 12, 0, 0).unwrap()
}

fn editor(syntax: BodySyntax, clock: Arc<ManualClock>) -> Editor {
    EditorController::new(
        TreeSurface::new(),
        Form::default(),
        clock,
        EditorSettings::default(),
        syntax,
    )
}

fn type_text(editor: &mut Editor, text: &str) {
    let surface = editor.surface_mut();
    if !surface.is_focused() {
        surface.focus();
    }
    surface.type_text(text);
    editor.handle_event(SurfaceEvent::TextChanged);
}

fn resolve(editor: &Editor, clock: Arc<ManualClock>) -> String {
    let options = ResolveOptions::from_settings(editor.settings(), editor.syntax());
    VariableResolver::new(clock, options)
        .resolve(editor.document(), editor.registry().as_slice())
        .resolved
}

#[test]
fn timestamp_picked_from_trigger_resolves_to_clock_time() {
    let clock = ManualClock::at(noon());
    let mut editor = editor(BodySyntax::Json, Arc::clone(&clock));

    type_text(&mut editor, r#"{"sentAt": {{"#);
    assert!(editor.state().is_picker_open());

    let id = editor.select_variable_type(VariableType::Timestamp).unwrap();
    type_text(&mut editor, "}");

    assert_eq!(editor.document(), format!(r#"{{"sentAt": {{{{timestamp:{id}}}}}}}"#));
    assert_eq!(editor.surface().extract(), editor.document());
    assert_eq!(editor.surface().chips().count(), 1);
    assert_eq!(editor.state(), &EditorState::Composing);
    assert!(editor.status().is_valid());

    assert_eq!(resolve(&editor, clock), r#"{"sentAt": 1706270400}"#);
}

#[test]
fn base64_text_chip_is_configured_then_deleted() {
    let clock = ManualClock::at(noon());
    let mut editor = editor(BodySyntax::Text, Arc::clone(&clock));

    type_text(&mut editor, "token={{");
    let id = editor.select_variable_type(VariableType::Base64Text).unwrap();
    assert!(editor.state().is_popover_open());
    assert!(editor.surface().chips().all(|c| c.needs_configuration));

    editor.submit_popover("hello").unwrap();
    assert!(editor.surface().chips().all(|c| !c.needs_configuration));
    assert_eq!(
        editor.registry().get(&id).unwrap().data.as_deref(),
        Some(STANDARD.encode("hello").as_str())
    );
    assert_eq!(resolve(&editor, clock), "token=aGVsbG8=");

    let outcome = editor.handle_event(SurfaceEvent::KeyDown(Key::Backspace));
    assert!(outcome.is_handled());
    assert_eq!(editor.document(), "token=");
    assert!(editor.registry().is_empty());
    assert_eq!(editor.surface().chips().count(), 0);
    assert!(editor.observer().variables.last().unwrap().is_empty());
}

#[test]
fn repeated_uuid_resolves_to_one_value_per_send() {
    let clock = ManualClock::at(noon());
    let mut editor = editor(BodySyntax::Json, Arc::clone(&clock));
    editor.set_props(
        r#"{"id": {{uuid:v1}}, "echo": "{{uuid:v1}}"}"#,
        &[Variable::new("v1", VariableType::Uuid)],
    );

    let first: serde_json::Value = serde_json::from_str(&resolve(&editor, Arc::clone(&clock))).unwrap();
    let id = first["id"].as_str().unwrap();
    assert_eq!(id.len(), 36);
    assert_eq!(first["echo"].as_str(), Some(id));

    let second: serde_json::Value = serde_json::from_str(&resolve(&editor, clock)).unwrap();
    assert_ne!(second["id"].as_str(), Some(id));
}

#[test]
fn auto_format_waits_for_quiet_period() {
    let clock = ManualClock::at(noon());
    let mut editor = editor(BodySyntax::Json, Arc::clone(&clock));

    type_text(&mut editor, r#"{"a":1,"#);
    assert!(!editor.status().is_valid());
    assert_eq!(editor.next_deadline(), None);

    type_text(&mut editor, r#""b":[true]}"#);
    assert!(editor.status().is_valid());
    assert_eq!(editor.next_deadline(), Some(noon() + TimeDelta::milliseconds(500)));

    clock.advance(499);
    assert!(!editor.poll());

    clock.advance(1);
    assert!(editor.poll());
    let formatted = "{\n  \"a\": 1,\n  \"b\": [\n    true\n  ]\n}";
    assert_eq!(editor.document(), formatted);
    assert_eq!(editor.surface().extract(), formatted);
    assert_eq!(editor.surface().lines().len(), 6);
    assert_eq!(editor.observer().documents.last().map(String::as_str), Some(formatted));
    assert_eq!(editor.surface().caret_offset(), Some(formatted.chars().count()));
}

#[test]
fn native_deletion_garbage_collects_variables() {
    let clock = ManualClock::at(noon());
    let mut editor = editor(BodySyntax::Text, clock);
    editor.set_props(
        "a {{uuid:u}} b {{random-string:r}}",
        &[
            Variable::new("u", VariableType::Uuid),
            Variable::new("r", VariableType::RandomString),
        ],
    );
    assert_eq!(editor.registry().len(), 2);

    // Caret right after the random-string chip, then delete it natively.
    let end = editor.document().chars().count();
    editor.surface_mut().focus();
    editor.surface_mut().set_caret_offset(end);
    editor.surface_mut().backspace();
    editor.handle_event(SurfaceEvent::TextChanged);

    assert_eq!(editor.document(), "a {{uuid:u}} b ");
    assert_eq!(editor.registry().ids().into_iter().collect::<Vec<_>>(), vec!["u"]);
}

#[test]
fn file_read_for_deleted_chip_is_discarded() {
    let clock = ManualClock::at(noon());
    let mut editor = editor(BodySyntax::Text, clock);

    type_text(&mut editor, "{{");
    let id = editor.select_variable_type(VariableType::FileDataUrl).unwrap();
    let requests = editor.take_file_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].variable_id, id);

    editor.handle_event(SurfaceEvent::KeyDown(Key::Backspace));
    assert!(editor.registry().is_empty());

    let applied = editor.complete_file_read(
        &id,
        Ok(courier_application::ports::LoadedFile {
            name: "logo.png".to_string(),
            mime_type: "image/png".to_string(),
            data: "iVBORw==".to_string(),
        }),
    );
    assert!(!applied);
    assert!(editor.registry().is_empty());
}

#[test]
fn failed_file_read_keeps_chip_unconfigured() {
    let clock = ManualClock::at(noon());
    let mut editor = editor(BodySyntax::Json, Arc::clone(&clock));
    editor.set_props(
        r#"{"file": {{file-base64:f}}}"#,
        &[Variable::new("f", VariableType::FileBase64)],
    );

    editor.handle_event(SurfaceEvent::ChipClicked { id: "f".to_string() });
    assert_eq!(editor.take_file_requests().len(), 1);

    let applied = editor.complete_file_read(
        "f",
        Err(FileLoadError::NotFound("missing.bin".into())),
    );
    assert!(!applied);
    assert!(editor.surface().chips().all(|c| c.needs_configuration));
    assert_eq!(resolve(&editor, clock), r#"{"file": "[no data]"}"#);
}

#[test]
fn variables_file_round_trips_through_form() {
    let clock = ManualClock::at(noon());
    let mut editor = editor(BodySyntax::Json, clock);

    type_text(&mut editor, r#"{"n": {{"#);
    editor.select_variable_type(VariableType::RandomString).unwrap();
    type_text(&mut editor, "}");

    let saved = to_json_stable(&editor.registry().as_slice()).unwrap();
    let restored: Vec<Variable> = from_json(&saved).unwrap();

    let mut reopened = self::editor(BodySyntax::Json, ManualClock::at(noon()));
    reopened.set_props(editor.document(), &restored);
    assert_eq!(reopened.registry().as_slice(), editor.registry().as_slice());
    assert_eq!(reopened.surface().extract(), editor.document());
    assert!(reopened.observer().variables.is_empty());
}
