//! PlaceExchange feed
//!
//! Daily CSV or XLSX exports dropped into an S3 bucket. The play date comes
//! from the filename; rows are kept when their organization matches the
//! tenant marker.

pub mod filename;
pub mod layout;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod storage;

pub use layout::ColumnLayout;
pub use models::PlaceExchangeRecord;
pub use parser::PlaceExchangeDecoder;
pub use pipeline::{build_pipeline, PlaceExchangePipeline};
pub use storage::PROCEDURES;
