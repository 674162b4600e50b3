pub mod keys;
pub mod object_store;
pub mod s3;

pub use keys::*;
pub use object_store::*;
pub use s3::*;
