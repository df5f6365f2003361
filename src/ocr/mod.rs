pub mod bridge;
pub mod tables;
pub mod tsv;

pub use bridge::{OcrBridge, ScratchDir};
pub use tables::{load_tables, select_table, table_regions, TableRecord};
pub use tsv::parse_tsv;
