// src/lib.rs
pub mod error;
pub mod input_format;
pub mod pipeline;

pub use error::*;
pub use pipeline::*;

pub use input_format::{open_input, InputFormat, LineSource};
