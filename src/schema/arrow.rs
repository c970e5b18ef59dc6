// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema};
use std::sync::Arc;

use super::types::{FieldKind, FieldSpec};

/// Map a canonical field kind into an Arrow DataType.
///
/// - Text   → Utf8
/// - Number → Float64
pub fn map_to_arrow_type(kind: FieldKind) -> DataType {
    match kind {
        FieldKind::Text => DataType::Utf8,
        FieldKind::Number => DataType::Float64,
    }
}

/// Build an ArrowSchema (inside an Arc) from a slice of field specs.
pub fn build_arrow_schema(specs: &[FieldSpec]) -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = specs
        .iter()
        .map(|spec| ArrowField::new(spec.name, map_to_arrow_type(spec.kind), true))
        .collect();

    Arc::new(ArrowSchema::new(fields))
}

/// All-Utf8 schema for a raw extract, one nullable column per source header.
pub fn raw_string_schema<S: AsRef<str>>(headers: &[S]) -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = headers
        .iter()
        .map(|h| ArrowField::new(h.as_ref(), DataType::Utf8, true))
        .collect();
    Arc::new(ArrowSchema::new(fields))
}
