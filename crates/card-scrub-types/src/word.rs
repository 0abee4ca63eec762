use crate::PixelRect;

/// Identifies the text line a word belongs to, as reported by the OCR engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LineKey {
    pub page: u32,
    pub block: u32,
    pub paragraph: u32,
    pub line: u32,
}

impl LineKey {
    pub const fn new(page: u32, block: u32, paragraph: u32, line: u32) -> Self {
        Self {
            page,
            block,
            paragraph,
            line,
        }
    }
}

/// One recognized text token with its bounding rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct WordBox {
    pub text: String,
    pub rect: PixelRect,
    pub confidence: Option<f32>,
    pub line: LineKey,
}

impl WordBox {
    pub fn new(text: impl Into<String>, rect: PixelRect) -> Self {
        Self {
            text: text.into(),
            rect,
            confidence: None,
            line: LineKey::default(),
        }
    }

    pub fn with_confidence(mut self, value: f32) -> Self {
        self.confidence = Some(value);
        self
    }

    pub fn on_line(mut self, line: LineKey) -> Self {
        self.line = line;
        self
    }
}
