//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the editor core and external systems.
//! Each port is a trait that can be implemented by adapters in the
//! infrastructure layer or by the host application.

mod clock;
mod file_loader;
mod observer;
mod surface;

pub use clock::Clock;
pub use file_loader::{FileLoadError, FileLoader, LoadedFile};
pub use observer::EditorObserver;
pub use surface::{ChipView, ScreenPoint, SurfaceRun, TextSurface, surface_runs};
