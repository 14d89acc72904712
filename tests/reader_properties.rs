//! Property tests for indexing and seeking over generated logs
//!
//! Logs are written with a minimal frame writer built on the public
//! `MessageFormat::encode`, so these tests only touch the public API.

use anyhow::{Context, Result, ensure};
use proptest::prelude::*;
use std::collections::HashMap;
use ulog_reader::{FieldFormat, FieldType, MessageFormat, UlogReader, Value};

fn frame(out: &mut Vec<u8>, tag: u8, payload: &[u8]) {
    out.push(tag);
    out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    out.extend_from_slice(payload);
}

fn format_frame(out: &mut Vec<u8>, format: &MessageFormat) -> Result<()> {
    let payload = format.encode().context("Encoding format")?;
    frame(out, b'F', &payload);
    Ok(())
}

fn data_frame(out: &mut Vec<u8>, msg_id: u8, multi_id: u8, timestamp: u64, values: &[u8]) {
    let mut payload = vec![msg_id, multi_id];
    payload.extend_from_slice(&timestamp.to_le_bytes());
    payload.extend_from_slice(values);
    frame(out, b'D', &payload);
}

fn counter_log(timestamps: &[u64]) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    format_frame(
        &mut bytes,
        &MessageFormat::new(7, "counter", vec![FieldFormat::new("n", FieldType::UInt32, 1)]),
    )?;
    for (idx, &timestamp) in timestamps.iter().enumerate() {
        data_frame(&mut bytes, 7, 0, timestamp, &(idx as u32).to_le_bytes());
    }
    Ok(bytes)
}

prop_compose! {
    fn arb_fields()(
        shapes in prop::collection::vec(
            (prop::sample::select(FieldType::ALL.to_vec()), 1usize..5),
            1..6,
        ),
    ) -> Vec<FieldFormat> {
        shapes
            .into_iter()
            .enumerate()
            .map(|(idx, (field_type, size))| FieldFormat::new(format!("f{idx}"), field_type, size))
            .collect()
    }
}

proptest! {
    #[test]
    fn seek_lands_on_first_timestamp_at_or_after_target(
        mut timestamps in prop::collection::vec(1u64..1_000_000, 1..60),
        target in 0u64..1_100_000,
    ) {
        timestamps.sort_unstable();
        let bytes = counter_log(&timestamps).unwrap();
        let mut reader = UlogReader::from_bytes(&bytes).unwrap();
        let mut update = HashMap::new();

        let expected = timestamps.iter().position(|&t| t >= target);
        let found = reader.seek(target).unwrap();
        prop_assert_eq!(found, expected.is_some());

        match expected {
            Some(idx) => {
                prop_assert_eq!(reader.read_update(&mut update).unwrap(), Some(timestamps[idx]));
                prop_assert_eq!(update.get("counter_0.n"), Some(&Value::UInt32(idx as u32)));
            }
            None => prop_assert_eq!(reader.read_update(&mut update).unwrap(), None),
        }
    }

    #[test]
    fn catalog_has_one_leaf_per_element_and_instance(
        fields in arb_fields(),
        max_multi_id in 0u8..4,
    ) {
        let format = MessageFormat::new(3, "topic", fields);
        let values = vec![0u8; format.values_len()];
        let mut bytes = Vec::new();
        format_frame(&mut bytes, &format).unwrap();
        data_frame(&mut bytes, 3, max_multi_id, 1, &values);

        let reader = UlogReader::from_bytes(&bytes).unwrap();
        let leaves: usize = format.fields.iter().map(|f| f.size).sum();
        prop_assert_eq!(reader.fields().len(), leaves * (max_multi_id as usize + 1));
        prop_assert!(reader.errors().is_empty());
    }

    #[test]
    fn size_updates_counts_every_decoded_record(records in 0usize..40) {
        let timestamps: Vec<u64> = (0..records as u64).map(|t| t * 100 + 1).collect();
        let bytes = counter_log(&timestamps).unwrap();
        let reader = UlogReader::from_bytes(&bytes).unwrap();

        prop_assert_eq!(reader.size_updates(), records as u64 + 1);
        prop_assert_eq!(reader.start_micros(), timestamps.first().copied());
        prop_assert_eq!(
            reader.duration_micros(),
            timestamps.last().map(|last| last - timestamps[0])
        );
    }
}

#[test]
fn reading_after_exhaustion_keeps_returning_none() -> Result<()> {
    let bytes = counter_log(&[10, 20])?;
    let mut reader = UlogReader::from_bytes(&bytes)?;
    let mut update = HashMap::new();

    ensure!(reader.read_update(&mut update)? == Some(10));
    ensure!(reader.read_update(&mut update)? == Some(20));
    ensure!(reader.read_update(&mut update)?.is_none());
    ensure!(reader.read_update(&mut update)?.is_none());
    ensure!(update.len() == 1, "fields merge into one entry per name");
    Ok(())
}

#[test]
fn independent_readers_do_not_share_state() -> Result<()> {
    let bytes = counter_log(&[5, 6, 7])?;
    let mut first = UlogReader::from_bytes(&bytes)?;
    let mut second = UlogReader::from_bytes(&bytes)?;

    ensure!(first.seek(7)?);
    ensure!(second.position() == 0);
    ensure!(second.read_update(&mut HashMap::new())? == Some(5));
    ensure!(first.read_update(&mut HashMap::new())? == Some(7));
    Ok(())
}

#[test]
fn options_load_from_yaml() -> Result<()> {
    let options = ulog_reader::ReaderOptions::from_yaml_str(
        "max_recorded_errors: 1\ninclude_private_formats: true\n",
    )?;
    let mut bytes = counter_log(&[1])?;
    frame(&mut bytes, b'?', &[]);
    frame(&mut bytes, b'?', &[]);

    let reader = UlogReader::from_bytes_with_options(&bytes, options)?;
    ensure!(reader.errors().len() == 1);
    ensure!(reader.dropped_errors() == 1);
    Ok(())
}
