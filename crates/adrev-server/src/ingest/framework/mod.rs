//! File feed ingestion framework
//!
//! The pieces every file-based feed shares:
//!
//! - [`lister`]: paginated object listing as a lazy stream
//! - [`dedup`]: watermark and extension filter
//! - [`decoder`]: [`RecordDecoder`] trait, implemented per feed
//! - [`sink`]: [`FeedSink`] trait and the stored procedure implementation
//! - [`retry`]: retry policy for transport failures
//! - [`pipeline`]: [`FileFeedPipeline`], which wires them together

pub mod csv_line;
pub mod decoder;
pub mod dedup;
pub mod lister;
pub mod pipeline;
pub mod retry;
pub mod sink;
pub mod types;

pub use decoder::{Decoded, RecordDecoder};
pub use dedup::{Admission, DedupFilter};
pub use lister::{list_objects, DEFAULT_PAGE_SIZE};
pub use pipeline::FileFeedPipeline;
pub use retry::RetryPolicy;
pub use sink::{FeedProcedures, FeedSink, ProcedureSink, ToProcedure, FILENAME_PARAM};
pub use types::{FeedKind, FeedRunOutcome, RunStats, Watermark};
