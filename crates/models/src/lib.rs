pub mod config;
pub mod error;
pub mod layer;
pub mod request;
pub mod response;

pub use config::*;
pub use error::*;
pub use layer::*;
pub use request::*;
pub use response::*;
