//! TypeScript Generation Tests
//!
//! Validates that decoded log types can be exported to TypeScript when the
//! tauri feature is enabled.

#[cfg(feature = "tauri")]
#[test]
fn test_core_types_implement_specta_type() {
    use specta::Type;

    // If this compiles, the types are properly configured for TypeScript export.
    fn assert_type<T: Type>() {}

    assert_type::<ulog_reader::FieldType>();
    assert_type::<ulog_reader::Value>();
    assert_type::<ulog_reader::FieldFormat>();
    assert_type::<ulog_reader::MessageFormat>();
}

#[cfg(not(feature = "tauri"))]
#[test]
fn test_tauri_feature_disabled() {
    // Types still compile without specta::Type
    let _ = ulog_reader::FieldType::Float32;
}
