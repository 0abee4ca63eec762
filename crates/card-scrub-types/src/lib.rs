//! Value types shared by the OCR, inpainting and pipeline crates.

mod rect;
mod word;

pub use rect::PixelRect;
pub use word::{LineKey, WordBox};
