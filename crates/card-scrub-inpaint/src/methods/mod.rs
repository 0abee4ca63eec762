mod photo;

use image::DynamicImage;

use crate::{InpaintError, InpaintMethod, Mask};

pub use photo::PhotoInpainter;

/// Reconstructs masked pixels from their surroundings.
///
/// Pixels outside the mask are returned unchanged, and an empty mask yields
/// a copy of the source pixels.
pub trait Inpainter: Send + Sync {
    fn method(&self) -> InpaintMethod;

    fn radius(&self) -> f64;

    fn inpaint(&self, image: &DynamicImage, mask: &Mask) -> Result<DynamicImage, InpaintError>;
}

fn ensure_same_dimensions(image: &DynamicImage, mask: &Mask) -> Result<(), InpaintError> {
    let (image_width, image_height) = (image.width(), image.height());
    let (mask_width, mask_height) = mask.dimensions();
    if image_width != mask_width || image_height != mask_height {
        return Err(InpaintError::DimensionMismatch {
            image_width,
            image_height,
            mask_width,
            mask_height,
        });
    }
    Ok(())
}
