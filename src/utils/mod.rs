pub mod clamp;
pub mod color;

pub use clamp::{Clamp, clamp};
pub use color::Rgba;
