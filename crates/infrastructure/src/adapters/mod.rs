//! Infrastructure adapters

mod file_loader;
mod system_clock;

pub use file_loader::TokioFileLoader;
pub use system_clock::SystemClock;
