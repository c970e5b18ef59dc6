pub mod arrow;
pub mod mapping;
pub mod types;

pub use self::arrow::{build_arrow_schema, map_to_arrow_type, raw_string_schema};
pub use types::{FieldKind, FieldSpec, Scope};
