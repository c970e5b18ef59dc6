// src/process/mod.rs
//
// Table plumbing shared by the prep stages: raw loading, header cleaning,
// projection onto canonical fields and numeric coercion.

pub mod convert;
pub mod load;
pub mod names;
pub mod project;
pub mod utils;

pub use load::{load_csv_table, parse_csv_table};
pub use names::{clean_name, clean_names};
pub use project::project;
pub use utils::normalize_state_name;
