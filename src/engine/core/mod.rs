pub mod array;
pub mod column;
pub mod table;

pub use array::{Array, ArrayBuilder};
pub use column::Column;
pub use table::{Table, TableBatchReader};
