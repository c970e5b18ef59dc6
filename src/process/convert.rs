use crate::process::utils;
use arrow::{
    array::{Array, ArrayRef, Float64Builder, StringArray},
    datatypes::DataType,
};
use std::sync::Arc;

/// A coerced column plus the number of non-empty cells that could not be parsed.
pub struct Coerced {
    pub array: ArrayRef,
    pub failed: usize,
}

/// Coerce a Utf8 column to Float64. Unparsable cells become null.
pub fn coerce_to_f64(arr: &ArrayRef) -> Coerced {
    if arr.data_type() == &DataType::Float64 {
        return Coerced {
            array: arr.clone(),
            failed: 0,
        };
    }

    let mut failed = 0;
    let mut b = Float64Builder::with_capacity(arr.len());
    match arr.as_any().downcast_ref::<StringArray>() {
        Some(sarr) => {
            for opt in sarr.iter() {
                let v = opt.and_then(|s| {
                    let parsed = utils::parse_number(s);
                    if parsed.is_none() && !s.trim().is_empty() {
                        failed += 1;
                    }
                    parsed
                });
                b.append_option(v);
            }
        }
        None => {
            // non-string, non-float input: every present cell is a failed coercion
            failed = arr.len() - arr.null_count();
            b.append_nulls(arr.len());
        }
    }

    Coerced {
        array: Arc::new(b.finish()) as ArrayRef,
        failed,
    }
}

/// Trim + unquote every cell of a Utf8 column; empty cells become null.
pub fn clean_text(arr: &ArrayRef) -> ArrayRef {
    match arr.as_any().downcast_ref::<StringArray>() {
        Some(sarr) => {
            let cleaned: StringArray = sarr
                .iter()
                .map(|opt| opt.map(utils::clean_str).filter(|s| !s.is_empty()))
                .collect();
            Arc::new(cleaned) as ArrayRef
        }
        None => arr.clone(),
    }
}
