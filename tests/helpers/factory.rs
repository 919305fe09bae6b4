pub use super::factories::{ColumnFactory, TableFactory};

pub struct Factory;

impl Factory {
    pub fn column() -> ColumnFactory {
        ColumnFactory::new()
    }

    pub fn table() -> TableFactory {
        TableFactory::new()
    }
}
