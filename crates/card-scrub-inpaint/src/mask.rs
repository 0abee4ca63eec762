use card_scrub_types::PixelRect;
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::morphology;
use imageproc::rect::Rect;

const MASK_ON: u8 = 255;

/// Single-channel binary mask; set pixels are 255, everything else 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    image: GrayImage,
}

impl Mask {
    /// All-zero mask of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width, height),
        }
    }

    /// Rasterizes the union of `rects` (clamped to the mask bounds).
    pub fn from_rects(width: u32, height: u32, rects: &[PixelRect]) -> Self {
        let mut mask = Self::new(width, height);
        for rect in rects {
            mask.fill_rect(rect);
        }
        mask
    }

    /// Treats every non-zero pixel of `image` as set.
    pub fn from_image(mut image: GrayImage) -> Self {
        for pixel in image.pixels_mut() {
            if pixel[0] != 0 {
                pixel[0] = MASK_ON;
            }
        }
        Self { image }
    }

    pub fn fill_rect(&mut self, rect: &PixelRect) {
        let (width, height) = self.image.dimensions();
        let clamped = rect.clamp_to(width, height);
        if clamped.is_empty() {
            return;
        }
        let area = Rect::at(clamped.x as i32, clamped.y as i32).of_size(clamped.width, clamped.height);
        draw_filled_rect_mut(&mut self.image, area, Luma([MASK_ON]));
    }

    /// Grows the set area with a square `kernel x kernel` structuring element,
    /// `iterations` times. A kernel below 2 or zero iterations leaves the mask unchanged.
    ///
    /// Even kernels are rounded up to the next odd size so the element stays centered.
    pub fn dilate(&mut self, kernel: u32, iterations: u32) {
        let radius = (kernel / 2).min(u32::from(u8::MAX)) as u8;
        if radius == 0 || iterations == 0 || self.is_empty() {
            return;
        }
        for _ in 0..iterations {
            self.image = morphology::dilate(&self.image, Norm::LInf, radius);
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y)[0] != 0
    }

    /// True when no pixel is set.
    pub fn is_empty(&self) -> bool {
        self.image.as_raw().iter().all(|&value| value == 0)
    }

    pub fn count(&self) -> usize {
        self.image.as_raw().iter().filter(|&&value| value != 0).count()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rects_unions_and_clamps() {
        let rects = [
            PixelRect::new(1, 1, 3, 2),
            PixelRect::new(2, 2, 3, 2),
            PixelRect::new(8, 8, 10, 10),
        ];
        let mask = Mask::from_rects(10, 10, &rects);
        assert!(mask.is_set(1, 1));
        assert!(mask.is_set(4, 3));
        assert!(!mask.is_set(4, 4));
        assert!(mask.is_set(9, 9));
        // 6 + 6 - 2 overlap + 4 clamped
        assert_eq!(mask.count(), 14);
    }

    #[test]
    fn empty_rect_is_ignored() {
        let mask = Mask::from_rects(5, 5, &[PixelRect::new(2, 2, 0, 3)]);
        assert!(mask.is_empty());
    }

    #[test]
    fn zero_kernel_and_iterations_is_noop() {
        let mut empty = Mask::new(6, 4);
        empty.dilate(0, 0);
        assert_eq!(empty, Mask::new(6, 4));

        let mut mask = Mask::from_rects(6, 6, &[PixelRect::new(2, 2, 1, 1)]);
        let before = mask.clone();
        mask.dilate(0, 3);
        assert_eq!(mask, before);
        mask.dilate(5, 0);
        assert_eq!(mask, before);
    }

    #[test]
    fn dilation_grows_by_half_kernel_per_iteration() {
        let mut mask = Mask::from_rects(20, 20, &[PixelRect::new(10, 10, 1, 1)]);
        mask.dilate(5, 1);
        assert_eq!(mask.count(), 25);
        assert!(mask.is_set(8, 8));
        assert!(mask.is_set(12, 12));
        assert!(!mask.is_set(13, 12));

        mask.dilate(3, 2);
        assert_eq!(mask.count(), 81);
    }

    #[test]
    fn from_image_binarizes() {
        let mut image = GrayImage::new(3, 1);
        image.put_pixel(1, 0, Luma([7]));
        let mask = Mask::from_image(image);
        assert_eq!(mask.as_image().get_pixel(1, 0)[0], 255);
        assert_eq!(mask.count(), 1);
    }
}
