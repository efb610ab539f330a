pub mod error;

pub use error::LogmoError;
