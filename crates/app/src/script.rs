//! Scripted editing sessions.
//!
//! A script drives the editor controller against the headless tree surface,
//! one step per line:
//!
//! ```text
//! # comment
//! type {"id": {{
//! pick uuid
//! key enter
//! paste "a":\n1
//! caret 4
//! popover secret
//! close
//! click <id>
//! file <id> logo.png
//! blur
//! format
//! syntax xml
//! wait 200
//! ```
//!
//! `type`, `paste` and `popover` arguments understand the escapes `\n`,
//! `\t` and `\\`. Relative `file` paths are resolved against the script's
//! directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use courier_application::ports::{EditorObserver, FileLoader, TextSurface};
use courier_application::{ApplicationError, EditorController, Key, SurfaceEvent};
use courier_domain::{BodySyntax, EditorSettings, Variable, VariableType};
use courier_infrastructure::{SystemClock, TokioFileLoader, TreeSurface};

/// Error raised while parsing or replaying a script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// The line is not a valid step.
    #[error("line {line}: {message}")]
    Parse {
        /// One-based line number.
        line: usize,
        /// What is wrong with the line.
        message: String,
    },

    /// The controller rejected the step.
    #[error("line {line}: {source}")]
    Step {
        /// One-based line number.
        line: usize,
        /// The controller error.
        #[source]
        source: ApplicationError,
    },
}

/// A single script step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Type text natively at the caret.
    Type(String),
    /// Paste text at the caret.
    Paste(String),
    /// Press a key.
    Key(Key),
    /// Move the caret to a logical offset.
    Caret(usize),
    /// Pick a variable type in the open picker.
    Pick(VariableType),
    /// Submit the popover.
    Popover(String),
    /// Close the popover.
    Close,
    /// Click the chip with the id.
    Click(String),
    /// Load a file into a file-backed variable.
    File {
        /// The variable receiving the file.
        id: String,
        /// The file to read.
        path: PathBuf,
    },
    /// Move focus away from the surface.
    Blur,
    /// Format right away.
    Format,
    /// Switch the body syntax and re-validate.
    Syntax(BodySyntax),
    /// Wait, then run any auto-format that became due.
    Wait(Duration),
}

/// A parsed step with its line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// One-based line number.
    pub line: usize,
    /// What to do.
    pub action: Action,
}

/// Parses a script. Blank lines and lines starting with `#` are skipped.
///
/// # Errors
///
/// Returns an error for the first line that is not a valid step.
pub fn parse_script(source: &str) -> Result<Vec<Step>, ScriptError> {
    let mut steps = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim_start();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let (command, argument) = text.split_once(' ').unwrap_or((text, ""));
        let action = parse_action(command, argument)
            .map_err(|message| ScriptError::Parse { line, message })?;
        steps.push(Step { line, action });
    }
    Ok(steps)
}

fn parse_action(command: &str, argument: &str) -> Result<Action, String> {
    let action = match command {
        "type" => Action::Type(unescape(argument)),
        "paste" => Action::Paste(unescape(argument)),
        "popover" => Action::Popover(unescape(argument)),
        "key" => Action::Key(parse_key(argument.trim())?),
        "caret" => Action::Caret(
            argument
                .trim()
                .parse()
                .map_err(|_| format!("invalid caret offset `{argument}`"))?,
        ),
        "pick" => Action::Pick(argument.trim().parse().map_err(|e| format!("{e}"))?),
        "close" => Action::Close,
        "click" => Action::Click(required(argument, "click needs a variable id")?),
        "file" => {
            let (id, path) = argument
                .trim()
                .split_once(' ')
                .ok_or_else(|| "file needs a variable id and a path".to_string())?;
            Action::File {
                id: id.to_string(),
                path: PathBuf::from(path.trim()),
            }
        }
        "blur" => Action::Blur,
        "format" => Action::Format,
        "syntax" => Action::Syntax(argument.trim().parse().map_err(|e| format!("{e}"))?),
        "wait" => Action::Wait(Duration::from_millis(
            argument
                .trim()
                .parse()
                .map_err(|_| format!("invalid wait `{argument}`"))?,
        )),
        other => return Err(format!("unknown step `{other}`")),
    };
    Ok(action)
}

fn required(argument: &str, message: &str) -> Result<String, String> {
    let argument = argument.trim();
    if argument.is_empty() {
        Err(message.to_string())
    } else {
        Ok(argument.to_string())
    }
}

fn parse_key(name: &str) -> Result<Key, String> {
    match name.to_ascii_lowercase().as_str() {
        "enter" => Ok(Key::Enter),
        "tab" => Ok(Key::Tab),
        "backspace" => Ok(Key::Backspace),
        "escape" | "esc" => Ok(Key::Escape),
        other => Err(format!("unknown key `{other}`")),
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Observer that logs what the owning form would receive.
#[derive(Debug, Default)]
pub struct SessionLog {
    /// Number of document changes seen.
    pub changes: usize,
}

impl EditorObserver for SessionLog {
    fn on_change(&mut self, document: &str) {
        self.changes += 1;
        tracing::debug!(
            target: "courier::session",
            bytes = document.len(),
            "document changed"
        );
    }

    fn on_variables_change(&mut self, variables: &[Variable]) {
        tracing::debug!(
            target: "courier::session",
            count = variables.len(),
            "variables changed"
        );
    }
}

/// An editing session on the headless tree surface.
pub struct Session {
    controller: EditorController<TreeSurface, SessionLog>,
    loader: TokioFileLoader,
    base_dir: PathBuf,
}

impl Session {
    /// Creates a session over an empty document.
    pub fn new(settings: EditorSettings, syntax: BodySyntax, base_dir: impl Into<PathBuf>) -> Self {
        let controller = EditorController::new(
            TreeSurface::new(),
            SessionLog::default(),
            Arc::new(SystemClock::new()),
            settings,
            syntax,
        );
        Self {
            controller,
            loader: TokioFileLoader::new(),
            base_dir: base_dir.into(),
        }
    }

    /// The controller driven by the session.
    pub const fn controller(&self) -> &EditorController<TreeSurface, SessionLog> {
        &self.controller
    }

    /// Replays every step in order.
    ///
    /// # Errors
    ///
    /// Stops at the first step the controller rejects.
    pub async fn run(&mut self, steps: &[Step]) -> Result<(), ScriptError> {
        for step in steps {
            self.apply(&step.action)
                .await
                .map_err(|source| ScriptError::Step {
                    line: step.line,
                    source,
                })?;
            for request in self.controller.take_file_requests() {
                tracing::info!(
                    target: "courier::session",
                    id = %request.variable_id,
                    variable_type = %request.variable_type,
                    "file requested"
                );
            }
        }
        Ok(())
    }

    async fn apply(&mut self, action: &Action) -> Result<(), ApplicationError> {
        match action {
            Action::Type(text) => {
                self.focus();
                self.controller.surface_mut().type_text(text);
                self.controller.handle_event(SurfaceEvent::TextChanged);
            }
            Action::Paste(text) => {
                self.focus();
                self.controller.handle_event(SurfaceEvent::Paste(text.clone()));
            }
            Action::Key(key) => {
                self.focus();
                self.press(*key);
            }
            Action::Caret(offset) => {
                self.focus();
                self.controller.surface_mut().set_caret_offset(*offset);
            }
            Action::Pick(variable_type) => {
                self.controller.select_variable_type(*variable_type)?;
            }
            Action::Popover(text) => self.controller.submit_popover(text)?,
            Action::Close => self.controller.close_popover(),
            Action::Click(id) => {
                self.controller
                    .handle_event(SurfaceEvent::ChipClicked { id: id.clone() });
            }
            Action::File { id, path } => {
                let path = self.resolve_path(path);
                let result = self.loader.load(&path).await;
                self.controller.complete_file_read(id, result);
            }
            Action::Blur => {
                self.controller.surface_mut().blur();
                self.controller.handle_event(SurfaceEvent::FocusLost);
            }
            Action::Format => {
                self.controller.format_now();
            }
            Action::Syntax(syntax) => self.controller.set_syntax(*syntax),
            Action::Wait(duration) => {
                tokio::time::sleep(*duration).await;
                self.controller.poll();
            }
        }
        Ok(())
    }

    /// Delivers a key press, falling back to native editing when the
    /// controller leaves the key alone.
    fn press(&mut self, key: Key) {
        if self.controller.handle_event(SurfaceEvent::KeyDown(key)).is_handled() {
            return;
        }
        match key {
            Key::Backspace => self.controller.surface_mut().backspace(),
            Key::Enter => self.controller.surface_mut().type_text("\n"),
            Key::Tab | Key::Escape | Key::Other => return,
        }
        self.controller.handle_event(SurfaceEvent::TextChanged);
    }

    fn focus(&mut self) {
        let surface = self.controller.surface_mut();
        if !surface.is_focused() {
            surface.focus();
        }
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}
