mod backend;
mod backends;
mod engine;
mod error;
mod request;
mod response;

pub use backend::{Backend, Configuration};
pub use backends::tesseract::{TesseractConfig, TesseractEngine, parse_tsv};
pub use engine::{NoopOcrEngine, OcrEngine};
pub use error::OcrError;
pub use request::OcrRequest;
pub use response::OcrResponse;

pub use card_scrub_types::{LineKey, PixelRect, WordBox};
