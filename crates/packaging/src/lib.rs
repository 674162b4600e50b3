pub mod archive;
pub mod cleanup;
pub mod installer;
pub mod service;
pub mod staging;

pub use archive::*;
pub use cleanup::*;
pub use installer::*;
pub use service::*;
pub use staging::*;
