use card_scrub_types::WordBox;

/// Word boxes recognized in one image, in the engine's reading order.
#[derive(Debug, Clone, Default)]
pub struct OcrResponse {
    pub words: Vec<WordBox>,
}

impl OcrResponse {
    pub fn new(words: Vec<WordBox>) -> Self {
        Self { words }
    }

    pub fn empty() -> Self {
        Self { words: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn into_words(self) -> Vec<WordBox> {
        self.words
    }
}
