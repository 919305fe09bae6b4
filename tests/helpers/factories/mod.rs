pub mod column_factory;
pub mod table_factory;

pub use column_factory::ColumnFactory;
pub use table_factory::TableFactory;

#[cfg(test)]
mod table_factory_test;
