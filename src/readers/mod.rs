pub mod kma_reader;

pub use kma_reader::{decode_text, ColumnMap, KmaReader};
