pub mod diff_aggregator;
pub mod version_range;
pub mod version_resolver;

pub use diff_aggregator::{
    part_percent, traffic, DependencyShare, DiffAggregator, DiffStatistics, SizeDifference,
    TrafficChange,
};
pub use version_range::NpmRange;
pub use version_resolver::VersionResolver;
