/// Adapters layer - Infrastructure implementations
///
/// The npm registry, the Docker CLI, the sandbox filesystem and the
/// console, each behind one of the outbound ports.
pub mod outbound;
