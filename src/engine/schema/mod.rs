pub mod field;
pub mod table_schema;

pub use field::Field;
pub use table_schema::{Schema, SchemaRef};
