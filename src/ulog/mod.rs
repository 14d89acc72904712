//! ULog stream decoding
//!
//! This module turns a ULog byte stream into records: frame headers, the
//! format registry, payload decoders, and the indexing reader built on them.

pub mod cursor;
pub mod decode;
pub mod frame;
pub mod reader;
pub mod registry;

pub use reader::{LogSummary, UlogReader};
