pub mod helpers;
pub mod memory_store;

pub use helpers::*;
pub use memory_store::*;
