pub mod page;

pub use page::{PageImage, PendingFile};
