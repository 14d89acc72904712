//! ULog file reader
//!
//! Decodes the self-describing ULog stream, builds summary statistics and the
//! field catalog at open time, and then serves sequential reads and
//! timestamp seeks.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use ulog_reader::UlogReader;
//! use std::collections::HashMap;
//!
//! fn dump() -> ulog_reader::Result<()> {
//!     let mut reader = UlogReader::open("flight.ulg")?;
//!     println!("{} records, {} fields", reader.size_updates(), reader.fields().len());
//!
//!     reader.seek(reader.start_micros().unwrap_or(0) + 5_000_000)?;
//!     let mut update = HashMap::new();
//!     while let Some(timestamp) = reader.read_update(&mut update)? {
//!         println!("{timestamp}: {} values", update.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Open-time cost
//!
//! Opening scans the file twice. The first pass counts records, registers
//! schemas, and finds the highest instance index used by every message ID; the
//! second pass walks the FORMAT records before the first DATA record and
//! expands them into the field catalog for every instance seen anywhere in the
//! file. Both passes are linear, after which seeks cost only the distance
//! scanned.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use super::cursor::{ByteCursor, EndOfStream};
use super::decode::{
    Decoded, PayloadError, data_msg_id, decode_data, decode_format, decode_keyed_value,
};
use super::frame::{DATA_HEADER_SIZE, FrameHeader, MessageType};
use super::registry::FormatRegistry;
use crate::types::{
    FieldCatalog, Message, MessageFormat, MessageInfo, MessageParameter, Value, catalog_instance,
};
use crate::{DecodeError, DecodeErrorKind, ReaderOptions, Result, UlogError};

/// Name of the log format served by [`UlogReader`].
pub const FORMAT_NAME: &str = "ULog";

pub const INFO_SYSTEM_NAME: &str = "sys_name";
pub const INFO_HARDWARE_VERSION: &str = "ver_hw";
pub const INFO_SOFTWARE_VERSION: &str = "ver_sw";
pub const INFO_UTC_TIME_REFERENCE: &str = "time_ref_utc";

/// Version map key for the hardware version.
pub const VERSION_HARDWARE: &str = "HW";
/// Version map key for the firmware version.
pub const VERSION_FIRMWARE: &str = "FW";

/// Statistics gathered while opening a log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSummary {
    pub format: String,
    pub system_name: String,
    pub size_updates: u64,
    pub start_micros: Option<u64>,
    pub duration_micros: Option<u64>,
    pub utc_time_reference_micros: Option<i64>,
    pub version: HashMap<String, Value>,
    pub parameter_count: usize,
    pub field_count: usize,
    pub error_count: usize,
}

/// Reader over one ULog stream.
///
/// All session state (schemas, statistics, the error log) belongs to this
/// instance. Open several readers over the same file for parallel access.
pub struct UlogReader {
    cursor: ByteCursor,
    path: PathBuf,
    options: ReaderOptions,
    registry: FormatRegistry,
    /// Schemas in force at `data_start`, restored before every seek
    data_start_registry: FormatRegistry,
    data_start: Option<u64>,
    fields: FieldCatalog,
    max_multi_id: HashMap<u8, u8>,
    size_updates: u64,
    start_micros: Option<u64>,
    end_micros: Option<u64>,
    utc_time_reference: Option<i64>,
    system_name: String,
    version: HashMap<String, Value>,
    parameters: HashMap<String, Value>,
    info: HashMap<String, Value>,
    errors: Vec<DecodeError>,
    dropped_errors: u64,
    record_errors: bool,
}

impl UlogReader {
    /// Open a ULog file and index it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ReaderOptions::default())
    }

    /// Open a ULog file with explicit options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ReaderOptions) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening ULog file: {}", path.display());
        let data =
            std::fs::read(path).map_err(|e| UlogError::file_error(path.to_path_buf(), e))?;
        Ok(Self::from_parts(data, path.to_path_buf(), options))
    }

    /// Index an in-memory log.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ReaderOptions::default())
    }

    pub fn from_bytes_with_options(data: &[u8], options: ReaderOptions) -> Result<Self> {
        Ok(Self::from_parts(data.to_vec(), PathBuf::from("<memory>"), options))
    }

    /// Read a whole stream into memory and index it.
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        Self::from_reader_with_options(source, ReaderOptions::default())
    }

    pub fn from_reader_with_options<R: Read>(
        mut source: R,
        options: ReaderOptions,
    ) -> Result<Self> {
        let mut data = Vec::new();
        source
            .read_to_end(&mut data)
            .map_err(|e| UlogError::file_error(PathBuf::from("<reader>"), e))?;
        Ok(Self::from_parts(data, PathBuf::from("<reader>"), options))
    }

    fn from_parts(data: Vec<u8>, path: PathBuf, options: ReaderOptions) -> Self {
        let mut reader = UlogReader {
            cursor: ByteCursor::new(data),
            path,
            options,
            registry: FormatRegistry::new(),
            data_start_registry: FormatRegistry::new(),
            data_start: None,
            fields: FieldCatalog::new(),
            max_multi_id: HashMap::new(),
            size_updates: 0,
            start_micros: None,
            end_micros: None,
            utc_time_reference: None,
            system_name: String::new(),
            version: HashMap::new(),
            parameters: HashMap::new(),
            info: HashMap::new(),
            errors: Vec::new(),
            dropped_errors: 0,
            record_errors: true,
        };
        reader.update_statistics();
        reader
    }

    fn update_statistics(&mut self) {
        self.cursor.set_position(0);
        loop {
            let (offset, message) = match self.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(err) => {
                    warn!("Statistics scan of {} stopped early: {}", self.path.display(), err);
                    break;
                }
            };
            self.size_updates += 1;

            match message {
                Message::Format(_) => {}
                Message::Parameter(MessageParameter { key, value }) => {
                    self.parameters.insert(key, value);
                }
                Message::Info(info) => self.apply_info(info),
                Message::Data(data) => {
                    self.data_start.get_or_insert(offset);
                    self.start_micros.get_or_insert(data.timestamp);
                    self.end_micros = Some(data.timestamp);
                    let max = self.max_multi_id.entry(data.format.msg_id).or_insert(data.multi_id);
                    *max = (*max).max(data.multi_id);
                }
            }
        }
        debug!(
            "Pass 1: {} records, {} formats, {} message IDs with data",
            self.size_updates,
            self.registry.len(),
            self.max_multi_id.len()
        );

        // Second pass: instance counts are known now, expand the schemas that
        // precede the first DATA record into the catalog. Pass 1 already
        // recorded every error on this stretch.
        self.record_errors = false;
        self.registry = FormatRegistry::new();
        self.cursor.set_position(0);
        loop {
            match self.next_frame() {
                Ok(Some((_, Message::Format(format)))) => self.catalog_format(&format),
                Ok(Some((_, Message::Data(_)))) | Ok(None) | Err(_) => break,
                Ok(Some(_)) => {}
            }
        }
        self.record_errors = true;
        self.data_start_registry = self.registry.clone();
        debug!(
            "Pass 2: {} catalog fields, {} formats before first data",
            self.fields.len(),
            self.data_start_registry.len()
        );

        self.cursor.set_position(0);
    }

    fn apply_info(&mut self, info: MessageInfo) {
        match info.key.as_str() {
            INFO_SYSTEM_NAME => {
                self.system_name =
                    info.value.as_str().map_or_else(|| info.value.to_string(), str::to_string);
            }
            INFO_HARDWARE_VERSION => {
                self.version.insert(VERSION_HARDWARE.to_string(), info.value.clone());
            }
            INFO_SOFTWARE_VERSION => {
                self.version.insert(VERSION_FIRMWARE.to_string(), info.value.clone());
            }
            INFO_UTC_TIME_REFERENCE => match info.value.as_i64() {
                Some(reference) => self.utc_time_reference = Some(reference),
                None => warn!("Ignoring non-integer {} value {}", INFO_UTC_TIME_REFERENCE, info.value),
            },
            _ => {}
        }
        self.info.insert(info.key, info.value);
    }

    fn catalog_format(&mut self, format: &MessageFormat) {
        if format.is_private() && !self.options.include_private_formats {
            return;
        }
        // Formats without any DATA record have no instances to expand.
        let Some(&max_multi_id) = self.max_multi_id.get(&format.msg_id) else {
            return;
        };
        for multi_id in 0..=max_multi_id {
            catalog_instance(&mut self.fields, format, multi_id);
        }
    }

    fn record_error(&mut self, offset: u64, kind: DecodeErrorKind) {
        if !self.record_errors {
            return;
        }
        let error = DecodeError::new(offset, kind);
        if self.errors.len() < self.options.max_recorded_errors {
            warn!("{}", error);
            self.errors.push(error);
        } else {
            if self.dropped_errors == 0 {
                warn!(
                    "Error log full ({} entries), further decode errors are only counted",
                    self.options.max_recorded_errors
                );
            }
            self.dropped_errors += 1;
        }
    }

    fn truncated(&mut self, offset: u64, eos: EndOfStream) -> UlogError {
        self.record_error(
            offset,
            DecodeErrorKind::UnexpectedEndOfStream { needed: eos.needed, available: eos.available },
        );
        UlogError::unexpected_end_of_stream(offset, eos.needed, eos.available)
    }

    /// Decode frames until one yields a record; returns it with its frame offset.
    fn next_frame(&mut self) -> Result<Option<(u64, Message)>> {
        loop {
            let frame_offset = self.cursor.position();
            let header = match FrameHeader::read(&mut self.cursor) {
                Ok(Some(header)) => header,
                Ok(None) => return Ok(None),
                Err(eos) => return Err(self.truncated(frame_offset, eos)),
            };
            if let Err(eos) = self.cursor.fill(header.size) {
                return Err(self.truncated(header.offset, eos));
            }

            let Some(msg_type) = header.message_type() else {
                self.record_error(
                    header.offset,
                    DecodeErrorKind::UnknownMessageType { msg_type: header.tag },
                );
                self.cursor.set_position(header.end());
                continue;
            };

            let outcome = self.decode_payload(msg_type, header.size);
            // The declared size is authoritative for where the next frame starts.
            self.cursor.set_position(header.end());

            match outcome {
                Ok(Decoded { record, consumed }) => {
                    if consumed != header.size {
                        self.record_error(
                            header.offset,
                            DecodeErrorKind::SizeMismatch { parsed: consumed, declared: header.size },
                        );
                    }
                    if let Message::Format(format) = &record {
                        self.registry.register(Arc::clone(format));
                    }
                    trace!("Decoded {:?} record at {:#x}", msg_type, header.offset);
                    return Ok(Some((header.offset, record)));
                }
                Err(kind) => self.record_error(header.offset, kind),
            }
        }
    }

    fn decode_payload(
        &self,
        msg_type: MessageType,
        declared: usize,
    ) -> Result<Decoded<Message>, DecodeErrorKind> {
        let payload = self.cursor.rest();
        let mismatch = |err: PayloadError, parsed: usize| match err {
            PayloadError::Malformed(details) => DecodeErrorKind::Malformed { details },
            PayloadError::Truncated { needed, .. } => {
                DecodeErrorKind::SizeMismatch { parsed: parsed.max(needed), declared }
            }
        };

        match msg_type {
            MessageType::Format => decode_format(payload)
                .map(|d| Decoded { record: Message::Format(Arc::new(d.record)), consumed: d.consumed })
                .map_err(|e| mismatch(e, 0)),
            MessageType::Data => {
                let msg_id = data_msg_id(payload).map_err(|e| mismatch(e, 0))?;
                let format = self
                    .registry
                    .get(msg_id)
                    .ok_or(DecodeErrorKind::UnknownDataMessageId { msg_id })?;
                let expected = DATA_HEADER_SIZE + format.values_len();
                decode_data(format, payload)
                    .map(|d| Decoded { record: Message::Data(d.record), consumed: d.consumed })
                    .map_err(|e| mismatch(e, expected))
            }
            MessageType::Info => decode_keyed_value(payload)
                .map(|d| {
                    let (key, value) = d.record;
                    Decoded { record: Message::Info(MessageInfo { key, value }), consumed: d.consumed }
                })
                .map_err(|e| mismatch(e, 0)),
            MessageType::Parameter => decode_keyed_value(payload)
                .map(|d| {
                    let (key, value) = d.record;
                    Decoded {
                        record: Message::Parameter(MessageParameter { key, value }),
                        consumed: d.consumed,
                    }
                })
                .map_err(|e| mismatch(e, 0)),
        }
    }

    /// Read the next record from the current position.
    ///
    /// Malformed frames are recorded in [`errors`](Self::errors) and skipped.
    /// Returns `Ok(None)` at a clean end of stream and
    /// [`UlogError::UnexpectedEndOfStream`] when the stream ends mid-frame.
    pub fn read_message(&mut self) -> Result<Option<Message>> {
        Ok(self.next_frame()?.map(|(_, message)| message))
    }

    /// Read up to and including the next DATA record and merge its fields into `update`.
    ///
    /// Returns the record's timestamp, or `Ok(None)` once the stream is exhausted.
    pub fn read_update(&mut self, update: &mut HashMap<String, Value>) -> Result<Option<u64>> {
        while let Some(message) = self.read_message()? {
            if let Message::Data(data) = message {
                data.flatten_into(update);
                return Ok(Some(data.timestamp));
            }
        }
        Ok(None)
    }

    /// Position the reader at the first DATA record with a timestamp `>= timestamp`.
    ///
    /// Only frame headers and DATA timestamps are decoded while scanning.
    /// `seek(0)` rewinds to the first DATA record without scanning. Returns
    /// `Ok(false)` when no such record exists, leaving the reader at the end of
    /// the stream.
    ///
    /// Schemas are reset to those declared before the first DATA record and
    /// brought forward by the FORMAT records the scan steps over, so records
    /// read after a seek always decode with the schema in force at their offset.
    pub fn seek(&mut self, timestamp: u64) -> Result<bool> {
        let start = self.data_start.unwrap_or(self.cursor.len() as u64);
        self.registry = self.data_start_registry.clone();
        self.cursor.set_position(start);
        if timestamp == 0 {
            return Ok(true);
        }

        loop {
            let header = match FrameHeader::read(&mut self.cursor) {
                Ok(Some(header)) if self.cursor.fill(header.size).is_ok() => header,
                _ => break,
            };

            match header.message_type() {
                Some(MessageType::Data) if header.size >= DATA_HEADER_SIZE => {
                    let Ok((msg_id, record_time)) = read_data_key(&mut self.cursor) else {
                        break;
                    };
                    if record_time >= timestamp {
                        self.cursor.set_position(header.offset);
                        trace!("Seek to {} landed at {:#x}", timestamp, header.offset);
                        return Ok(true);
                    }
                    if !self.registry.contains(msg_id) {
                        self.cursor.set_position(header.offset);
                        return Err(UlogError::UnknownDataMessageId { offset: header.offset, msg_id });
                    }
                }
                Some(MessageType::Format) => match decode_format(self.cursor.rest()) {
                    Ok(decoded) => self.registry.register(Arc::new(decoded.record)),
                    Err(err) => {
                        warn!("Seek skipped undecodable FORMAT at {:#x}: {:?}", header.offset, err)
                    }
                },
                _ => {}
            }
            self.cursor.set_position(header.end());
        }

        debug!("No record at or after {} us", timestamp);
        self.cursor.set_position(self.cursor.len() as u64);
        Ok(false)
    }

    /// Name of the log format.
    pub fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }

    /// Get the file path this reader was opened from
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Value of the `sys_name` INFO record, empty when absent.
    pub fn system_name(&self) -> &str {
        &self.system_name
    }

    /// Hardware (`"HW"`) and firmware (`"FW"`) versions.
    pub fn version(&self) -> &HashMap<String, Value> {
        &self.version
    }

    pub fn parameters(&self) -> &HashMap<String, Value> {
        &self.parameters
    }

    /// Every INFO record seen during indexing, last value per key.
    pub fn info(&self) -> &HashMap<String, Value> {
        &self.info
    }

    /// Number of records decoded during indexing (all record types).
    pub fn size_updates(&self) -> u64 {
        self.size_updates
    }

    /// Timestamp of the first DATA record.
    pub fn start_micros(&self) -> Option<u64> {
        self.start_micros
    }

    /// Last minus first DATA timestamp.
    pub fn duration_micros(&self) -> Option<u64> {
        Some(self.end_micros?.saturating_sub(self.start_micros?))
    }

    /// UTC time of boot from the `time_ref_utc` INFO record.
    pub fn utc_time_reference_micros(&self) -> Option<i64> {
        self.utc_time_reference
    }

    /// Every addressable field name with its element type.
    pub fn fields(&self) -> &FieldCatalog {
        &self.fields
    }

    /// Recoverable decode errors, in the order they were found.
    pub fn errors(&self) -> &[DecodeError] {
        &self.errors
    }

    /// Errors not kept because the log reached its configured cap.
    pub fn dropped_errors(&self) -> u64 {
        self.dropped_errors
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
        self.dropped_errors = 0;
    }

    /// Schema currently registered for a message ID.
    pub fn message_format(&self, msg_id: u8) -> Option<&Arc<MessageFormat>> {
        self.registry.get(msg_id)
    }

    pub fn formats(&self) -> impl Iterator<Item = &Arc<MessageFormat>> {
        self.registry.iter()
    }

    /// Offset of the first DATA record.
    pub fn data_start(&self) -> Option<u64> {
        self.data_start
    }

    /// Current byte offset in the stream.
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Total stream length in bytes.
    pub fn len(&self) -> usize {
        self.cursor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.is_empty()
    }

    pub fn summary(&self) -> LogSummary {
        LogSummary {
            format: FORMAT_NAME.to_string(),
            system_name: self.system_name.clone(),
            size_updates: self.size_updates,
            start_micros: self.start_micros,
            duration_micros: self.duration_micros(),
            utc_time_reference_micros: self.utc_time_reference,
            version: self.version.clone(),
            parameter_count: self.parameters.len(),
            field_count: self.fields.len(),
            error_count: self.errors.len(),
        }
    }

    /// Release the reader and its buffered data.
    pub fn close(self) {
        debug!("Closing {}", self.path.display());
    }
}

/// Read msg ID and timestamp of a DATA payload, skipping the multi ID.
fn read_data_key(cursor: &mut ByteCursor) -> std::result::Result<(u8, u64), EndOfStream> {
    let msg_id = cursor.read_u8()?;
    cursor.skip(1)?;
    let timestamp = cursor.read_u64_le()?;
    Ok((msg_id, timestamp))
}
