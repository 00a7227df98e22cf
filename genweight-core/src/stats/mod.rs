//! Mergeable weight statistics

pub mod counter;
pub mod counter_map;
pub mod table;

// Re-export main types
pub use counter::{CompensatedSum, Counter};
pub use counter_map::CounterMap;
pub use table::{ColumnNames, CounterTable, TableEntry, TableValue};
