//! Test utilities for building synthetic logs
//!
//! Real flight logs are large binary blobs, so tests and benchmarks assemble
//! their input with [`LogBuilder`] instead. The builder writes frames exactly as
//! firmware would, including deliberately malformed ones.

#![cfg(any(test, feature = "benchmark"))]

use crate::types::{FieldType, MessageFormat};
use crate::ulog::frame::{
    FrameHeader, MESSAGE_TYPE_DATA, MESSAGE_TYPE_FORMAT, MESSAGE_TYPE_INFO,
    MESSAGE_TYPE_PARAMETER,
};

/// Byte-level writer for log streams.
#[derive(Debug, Clone, Default)]
pub struct LogBuilder {
    bytes: Vec<u8>,
}

impl LogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset the next frame will start at.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn build(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    /// Raw frame whose declared size matches the payload.
    pub fn frame(&mut self, tag: u8, payload: &[u8]) -> &mut Self {
        let size = u16::try_from(payload.len()).expect("payload exceeds u16 frame size");
        self.frame_with_size(tag, size, payload)
    }

    /// Raw frame with an arbitrary declared size.
    pub fn frame_with_size(&mut self, tag: u8, size: u16, payload: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(&FrameHeader::encode(tag, size));
        self.bytes.extend_from_slice(payload);
        self
    }

    /// FORMAT frame from a `;`-separated descriptor list.
    pub fn format(&mut self, msg_id: u8, name: &str, descriptors: &str) -> &mut Self {
        let payload = MessageFormat::from_descriptors(msg_id, name, descriptors)
            .and_then(|format| format.encode())
            .expect("invalid test format");
        self.frame(MESSAGE_TYPE_FORMAT, &payload)
    }

    fn data_payload(msg_id: u8, multi_id: u8, timestamp: u64, values: &[u8]) -> Vec<u8> {
        let mut payload = Vec::with_capacity(10 + values.len());
        payload.push(msg_id);
        payload.push(multi_id);
        payload.extend_from_slice(&timestamp.to_le_bytes());
        payload.extend_from_slice(values);
        payload
    }

    /// DATA frame; `values` are the already-encoded field bytes.
    pub fn data(&mut self, msg_id: u8, multi_id: u8, timestamp: u64, values: &[u8]) -> &mut Self {
        let payload = Self::data_payload(msg_id, multi_id, timestamp, values);
        self.frame(MESSAGE_TYPE_DATA, &payload)
    }

    /// DATA frame with a declared size that may disagree with its schema.
    pub fn data_with_size(
        &mut self,
        msg_id: u8,
        multi_id: u8,
        timestamp: u64,
        values: &[u8],
        size: u16,
    ) -> &mut Self {
        let payload = Self::data_payload(msg_id, multi_id, timestamp, values);
        self.frame_with_size(MESSAGE_TYPE_DATA, size, &payload)
    }

    fn keyed_payload(code: char, count: u8, key: &str, value: &[u8]) -> Vec<u8> {
        let mut payload = vec![code as u8, count, key.len() as u8];
        payload.extend_from_slice(key.as_bytes());
        payload.extend_from_slice(value);
        payload
    }

    /// INFO frame holding a NUL-padded `char[len]` string.
    pub fn info_str(&mut self, key: &str, value: &str, len: u8) -> &mut Self {
        let mut raw = value.as_bytes().to_vec();
        raw.resize(len as usize, 0);
        let payload = Self::keyed_payload(FieldType::Char.code(), len, key, &raw);
        self.frame(MESSAGE_TYPE_INFO, &payload)
    }

    /// INFO frame holding one scalar of the given type code.
    pub fn info_scalar(&mut self, key: &str, code: char, value: &[u8]) -> &mut Self {
        let payload = Self::keyed_payload(code, 1, key, value);
        self.frame(MESSAGE_TYPE_INFO, &payload)
    }

    /// PARAMETER frame holding one scalar of the given type code.
    pub fn parameter(&mut self, key: &str, code: char, value: &[u8]) -> &mut Self {
        let payload = Self::keyed_payload(code, 1, key, value);
        self.frame(MESSAGE_TYPE_PARAMETER, &payload)
    }
}

/// A plausible log: metadata, parameters, a private format, and `records`
/// DATA records spread over two sensor instances, 4 ms apart from t = 1 s.
pub fn sample_log(records: usize) -> Vec<u8> {
    let mut log = LogBuilder::new();
    log.info_str("sys_name", "PX4", 16)
        .info_str("ver_hw", "PX4_FMU_V5", 16)
        .info_str("ver_sw", "v1.14.0", 16)
        .info_scalar("time_ref_utc", 'q', &1_700_000_000_000_000i64.to_le_bytes())
        .parameter("MC_ROLL_P", 'f', &6.5f32.to_le_bytes())
        .parameter("SYS_AUTOSTART", 'i', &4001i32.to_le_bytes())
        .format(0, "sensor_accel", "f[3]:xyz;f:temperature;B:error_count")
        .format(1, "vehicle_status", "B:arming_state;?:failsafe")
        .format(2, "_sync", "B:seq");

    for idx in 0..records {
        let timestamp = 1_000_000 + idx as u64 * 4_000;
        let mut accel = Vec::with_capacity(17);
        for axis in [0.01f32, -0.02, 9.81] {
            accel.extend_from_slice(&(axis + idx as f32 * 1e-4).to_le_bytes());
        }
        accel.extend_from_slice(&35.5f32.to_le_bytes());
        accel.push(0);
        log.data(0, (idx % 2) as u8, timestamp, &accel);

        if idx % 10 == 0 {
            log.data(1, 0, timestamp, &[2, 0]);
        }
        if idx % 25 == 0 {
            log.data(2, 0, timestamp, &[(idx % 256) as u8]);
        }
    }
    log.build()
}

/// Route `tracing` output through the test harness. Safe to call repeatedly.
#[cfg(test)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
