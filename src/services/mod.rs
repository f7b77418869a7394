pub mod artifact_writer;
pub mod classifier;
pub mod quarantine;

pub use artifact_writer::{ArtifactWriter, FlushFailure};
pub use classifier::{Classification, Classifier};
pub use quarantine::{QuarantineMover, QuarantineOutcome};
