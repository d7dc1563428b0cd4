/// Filesystem adapters for sandbox artifacts and report output
mod artifact_reader;
mod file_writer;

pub use artifact_reader::FileSystemArtifacts;
pub use file_writer::{FileSystemWriter, StdoutPresenter};
