pub mod file_probe;
pub mod notifier;
pub mod renderer;

pub use file_probe::FileProbe;
pub use notifier::DirectoryNotifier;
pub use renderer::{PageLayout, PdfRenderer, Renderer};
