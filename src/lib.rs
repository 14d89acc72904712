//! Reader for ULog flight-controller telemetry logs.
//!
//! ULog is the self-describing binary log format written by PX4 autopilots.
//! A log declares its own message schemas inline, so this crate learns the
//! layout of every record while reading and needs no external definitions.
//!
//! # Features
//!
//! - **Indexing**: counts records, timestamps, and the flattened field catalog at open time
//! - **Metadata**: system name, hardware and firmware versions, parameters
//! - **Seeking**: jump to the first record at or after a timestamp
//! - **Resilience**: corrupt or unknown frames are logged and skipped, never fatal
//!
//! ## Example
//!
//! ```rust,no_run
//! use ulog_reader::UlogReader;
//! use std::collections::HashMap;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut reader = UlogReader::open("/path/to/flight.ulg")?;
//!     println!("{} from {}", reader.format_name(), reader.system_name());
//!
//!     let mut update = HashMap::new();
//!     while let Some(timestamp) = reader.read_update(&mut update)? {
//!         if let Some(temp) = update.get("sensor_baro_0.temperature") {
//!             println!("{timestamp}: {temp}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Stream decoding
pub mod ulog;

// Core exports
pub use config::ReaderOptions;
pub use error::*;
pub use types::*;
pub use ulog::{LogSummary, UlogReader};
