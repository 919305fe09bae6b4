pub mod codec;
pub mod core;
pub mod errors;
pub mod schema;
pub mod store;
pub mod types;

pub use errors::*;
