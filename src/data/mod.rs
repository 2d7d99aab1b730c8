pub mod source;
pub mod traces;
pub mod transform;
pub mod types;

use serde_json::{Map, Value};

/// One table row: column name to cell value, in column order
pub type Row = Map<String, Value>;

// Re-export key types for convenience
pub use source::{DataFile, LoadedTable};
pub use traces::{FormattedChart, axis_type, format_for_traces};
pub use transform::{TransformConfig, process_data};
pub use types::{ColumnType, ColumnTypes, infer_column_types};

/// Column names across all rows, in first-seen order
pub fn column_names(rows: &[Row]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !names.iter().any(|name| name == key) {
                names.push(key.clone());
            }
        }
    }
    names
}
