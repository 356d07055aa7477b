//! Tokio driver for the editor controller.
//!
//! The controller never waits on anything itself. The runtime owns it,
//! applies host commands from a channel, sleeps until the auto-format
//! deadline, and runs file reads on spawned tasks whose results come back
//! through a second channel.

use std::path::PathBuf;
use std::sync::Arc;

use courier_application::editor::{EditorController, FileRequest, SurfaceEvent};
use courier_application::ports::{
    Clock, EditorObserver, FileLoadError, FileLoader, LoadedFile, TextSurface,
};
use courier_domain::{BodySyntax, EditorSettings, Variable, VariableType};
use tokio::sync::mpsc;
use tokio::time::Instant;

/// A native edit applied to the host surface.
pub type NativeEdit<S> = Box<dyn FnOnce(&mut S) + Send>;

type LoadResult = (String, Result<LoadedFile, FileLoadError>);

/// Commands sent by the host to a running editor.
pub enum EditorCommand<S> {
    /// Deliver a surface event.
    Event(SurfaceEvent),
    /// Edit the surface natively, then deliver [`SurfaceEvent::TextChanged`].
    Native(NativeEdit<S>),
    /// Pick a variable type in the open picker.
    SelectVariable(VariableType),
    /// Submit the popover text.
    SubmitPopover(String),
    /// Close the popover.
    ClosePopover,
    /// Apply the owning form's document and variables.
    SetProps {
        /// The document held by the form.
        document: String,
        /// The variables held by the form.
        variables: Vec<Variable>,
    },
    /// Switch the body syntax; the document is re-validated.
    SetSyntax(BodySyntax),
    /// Replace the editor settings.
    SetSettings(EditorSettings),
    /// The user chose a file in answer to a [`FileRequest`].
    ChooseFile {
        /// The variable receiving the file.
        variable_id: String,
        /// The chosen file.
        path: PathBuf,
    },
    /// Stop the runtime.
    Shutdown,
}

/// Runs an [`EditorController`] on tokio.
pub struct EditorRuntime<S, O, L> {
    controller: EditorController<S, O>,
    loader: Arc<L>,
    clock: Arc<dyn Clock>,
    file_requests: mpsc::UnboundedSender<FileRequest>,
    loads_tx: mpsc::UnboundedSender<LoadResult>,
    loads_rx: mpsc::UnboundedReceiver<LoadResult>,
}

impl<S, O, L> EditorRuntime<S, O, L>
where
    S: TextSurface + Send,
    O: EditorObserver + Send,
    L: FileLoader + 'static,
{
    /// Creates a runtime. File selections the host must perform are sent to
    /// `file_requests`.
    pub fn new(
        controller: EditorController<S, O>,
        loader: Arc<L>,
        clock: Arc<dyn Clock>,
        file_requests: mpsc::UnboundedSender<FileRequest>,
    ) -> Self {
        let (loads_tx, loads_rx) = mpsc::unbounded_channel();
        Self {
            controller,
            loader,
            clock,
            file_requests,
            loads_tx,
            loads_rx,
        }
    }

    /// Processes commands until [`EditorCommand::Shutdown`] or until every
    /// sender is dropped, then returns the controller.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<EditorCommand<S>>,
    ) -> EditorController<S, O> {
        tracing::debug!(target: "courier::runtime", "editor runtime started");

        loop {
            let deadline = self.format_deadline();
            let sleep = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                command = commands.recv() => match command {
                    None | Some(EditorCommand::Shutdown) => break,
                    Some(command) => self.apply(command),
                },
                Some((id, result)) = self.loads_rx.recv() => {
                    self.controller.complete_file_read(&id, result);
                }
                () = sleep => {
                    self.controller.poll();
                }
            }
        }

        tracing::debug!(target: "courier::runtime", "editor runtime stopped");
        self.controller
    }

    fn apply(&mut self, command: EditorCommand<S>) {
        match command {
            EditorCommand::Event(event) => {
                self.controller.handle_event(event);
            }
            EditorCommand::Native(edit) => {
                edit(self.controller.surface_mut());
                self.controller.handle_event(SurfaceEvent::TextChanged);
            }
            EditorCommand::SelectVariable(variable_type) => {
                if let Err(error) = self.controller.select_variable_type(variable_type) {
                    tracing::warn!(target: "courier::runtime", %error, "variable not inserted");
                }
            }
            EditorCommand::SubmitPopover(text) => {
                if let Err(error) = self.controller.submit_popover(&text) {
                    tracing::warn!(target: "courier::runtime", %error, "popover not submitted");
                }
            }
            EditorCommand::ClosePopover => self.controller.close_popover(),
            EditorCommand::SetProps {
                document,
                variables,
            } => self.controller.set_props(&document, &variables),
            EditorCommand::SetSyntax(syntax) => self.controller.set_syntax(syntax),
            EditorCommand::SetSettings(settings) => self.controller.set_settings(settings),
            EditorCommand::ChooseFile { variable_id, path } => self.spawn_load(variable_id, path),
            EditorCommand::Shutdown => {}
        }

        for request in self.controller.take_file_requests() {
            if let Err(error) = self.file_requests.send(request) {
                tracing::warn!(
                    target: "courier::runtime",
                    id = %error.0.variable_id,
                    "file request dropped, host stopped listening"
                );
            }
        }
    }

    fn spawn_load(&self, variable_id: String, path: PathBuf) {
        tracing::debug!(
            target: "courier::runtime",
            id = %variable_id,
            path = %path.display(),
            "loading file"
        );
        let loader = Arc::clone(&self.loader);
        let loads = self.loads_tx.clone();
        tokio::spawn(async move {
            let result = loader.load(&path).await;
            let _ = loads.send((variable_id, result));
        });
    }

    /// The controller's wall-clock deadline mapped onto tokio time.
    fn format_deadline(&self) -> Option<Instant> {
        let deadline = self.controller.next_deadline()?;
        let delay = (deadline - self.clock.now()).to_std().unwrap_or_default();
        Some(Instant::now() + delay)
    }
}
