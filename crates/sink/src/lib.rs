pub mod events;
pub mod recording_sink;
pub mod traits;
pub mod tracing_sink;

pub use events::{ArtifactEvent, ArtifactKind, AssetFetchEvent, ErrorEvent, FetchEvent, FinalCrawlStats};
pub use recording_sink::RecordingSink;
pub use traits::{CrawlFinalizer, MetadataSink};
pub use tracing_sink::TracingSink;
