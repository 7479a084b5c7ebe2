//! # Sales Value Matrix
//!
//! Classifies uploaded sales/agency records on two axes, feature adoption
//! ("value") and sales-funnel engagement, and projects the result into
//! chart-ready data for a quadrant scatter plot or a feature adoption heatmap.
//!
//! ## Pipeline
//!
//! - **Encoding detection**: statistical guess with a confidence threshold and
//!   a UTF-8 fallback (byte-order marks always win)
//! - **Loading**: zip-based workbooks (`.xlsx`, `.xlsm`) are recognised by
//!   their signature, anything else is read as delimited text; malformed
//!   lines are skipped with a warning
//! - **Normalization**: column keys are trimmed, lowercased and
//!   underscore-separated, original headers are kept for display
//! - **Inference**: yes/no columns are detected once per upload
//! - **Classification**: value score, engagement level, quadrant and size
//!
//! ## Usage
//!
//! ```no_run
//! use sales_matrix::Session;
//! use sales_matrix::ViewMode;
//!
//! let mut session = Session::default();
//! let bytes = std::fs::read("agencies.csv").unwrap();
//! let summary = session.upload(&bytes, Some("agencies.csv")).unwrap();
//! println!("{summary}");
//!
//! session.set_view(ViewMode::Heatmap);
//! let rendering = session.render().unwrap();
//! println!("{}", serde_json::to_string(&rendering).unwrap());
//! ```

mod error;
mod helpers;
pub mod matrix;
pub mod pipeline;
pub mod session;
mod spreadsheet;
pub mod table;

pub use crate::error::SalesMatrixError;
pub use crate::helpers::encoding::detect_encoding;
pub use crate::helpers::encoding::detect_encoding_or_utf8;
pub use crate::helpers::encoding::parse_encoding;
pub use crate::helpers::encoding::DetectedEncoding;
pub use crate::helpers::encoding::EncodingSource;
pub use crate::helpers::encoding::DEFAULT_MIN_CONFIDENCE;
pub use crate::matrix::ClassifierOptions;
pub use crate::matrix::Quadrant;
pub use crate::matrix::Snapshot;
pub use crate::pipeline::build_snapshot;
pub use crate::pipeline::PipelineOptions;
pub use crate::session::controls::Selection;
pub use crate::session::controls::ViewMode;
pub use crate::session::detail::DetailLookupFailure;
pub use crate::session::Session;
pub use crate::spreadsheet::SpreadsheetError;
pub use crate::table::column::ColumnInferenceSkip;
pub use crate::table::column::InferenceOptions;
pub use crate::table::loader::LoadError;
pub use crate::table::loader::LoadOptions;
pub use crate::table::Value;
