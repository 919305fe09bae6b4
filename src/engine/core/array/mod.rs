pub mod builder;
pub mod typed_array;

pub use builder::ArrayBuilder;
pub use typed_array::Array;
