/// Mock implementations for testing
mod mock_container_runtime;
mod mock_progress_reporter;
mod mock_registry;

pub use mock_container_runtime::{InstallFixture, MockContainerRuntime, MANIFEST_INSTALL};
pub use mock_progress_reporter::MockProgressReporter;
pub use mock_registry::MockRegistry;
