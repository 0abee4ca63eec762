use image::RgbImage;

/// OCR invocation metadata.
#[derive(Debug)]
pub struct OcrRequest<'a> {
    image: &'a RgbImage,
}

impl<'a> OcrRequest<'a> {
    pub fn new(image: &'a RgbImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &'a RgbImage {
        self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
