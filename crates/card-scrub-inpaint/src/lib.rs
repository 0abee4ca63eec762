//! Binary masks and the inpainting methods that fill them.

pub mod config;
pub mod error;
pub mod mask;
pub mod methods;

pub use config::{Configuration, InpaintMethod, InpaintMethodParseError};
pub use error::InpaintError;
pub use mask::Mask;
pub use methods::{Inpainter, PhotoInpainter};

#[cfg(test)]
mod tests;
