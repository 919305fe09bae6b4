pub mod batch_reader;
pub mod columnar_table;

pub use batch_reader::TableBatchReader;
pub use columnar_table::Table;
