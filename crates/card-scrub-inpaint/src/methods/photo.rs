use image::{DynamicImage, GrayImage, ImageBuffer, LumaA, RgbImage, Rgba};
use opencv::core::{CV_8UC1, CV_8UC3, Mat, Scalar};
use opencv::photo;
use opencv::prelude::*;
use tracing::debug;

use super::{Inpainter, ensure_same_dimensions};
use crate::{InpaintError, InpaintMethod, Mask};

/// Inpainting through OpenCV's `photo` module.
///
/// Colour data is handed to OpenCV as one 8-bit plane (gray) or three
/// (RGB). Alpha, when present, is carried over from the source untouched.
/// Images with more than 8 bits per channel are narrowed to 8 bits.
#[derive(Debug, Clone)]
pub struct PhotoInpainter {
    method: InpaintMethod,
    radius: f64,
}

impl PhotoInpainter {
    pub fn new(method: InpaintMethod, radius: f64) -> Self {
        Self { method, radius }
    }

    fn flags(&self) -> i32 {
        match self.method {
            InpaintMethod::Telea => photo::INPAINT_TELEA,
            InpaintMethod::NavierStokes => photo::INPAINT_NS,
        }
    }
}

impl Inpainter for PhotoInpainter {
    fn method(&self) -> InpaintMethod {
        self.method
    }

    fn radius(&self) -> f64 {
        self.radius
    }

    fn inpaint(&self, image: &DynamicImage, mask: &Mask) -> Result<DynamicImage, InpaintError> {
        ensure_same_dimensions(image, mask)?;
        if mask.is_empty() {
            return Ok(image.clone());
        }

        let (width, height) = mask.dimensions();
        let planes = Planes::split(image);
        let src = to_mat(&planes.color, width, height, planes.layout.color_type())?;
        let mask_mat = to_mat(mask.as_image().as_raw(), width, height, CV_8UC1)?;

        let mut dst = Mat::default();
        photo::inpaint(&src, &mask_mat, &mut dst, self.radius, self.flags())?;
        debug!(
            method = %self.method,
            radius = self.radius,
            masked = mask.count(),
            "inpainted"
        );

        let color = dst.data_bytes()?.to_vec();
        planes.join(color, width, height)
    }
}

fn to_mat(raw: &[u8], width: u32, height: u32, kind: i32) -> Result<Mat, InpaintError> {
    let mut mat =
        Mat::new_rows_cols_with_default(height as i32, width as i32, kind, Scalar::all(0.0))?;
    mat.data_bytes_mut()?.copy_from_slice(raw);
    Ok(mat)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Luma,
    LumaAlpha,
    Rgb,
    Rgba,
}

impl Layout {
    fn color_type(self) -> i32 {
        match self {
            Layout::Luma | Layout::LumaAlpha => CV_8UC1,
            Layout::Rgb | Layout::Rgba => CV_8UC3,
        }
    }

    fn color_channels(self) -> usize {
        match self {
            Layout::Luma | Layout::LumaAlpha => 1,
            Layout::Rgb | Layout::Rgba => 3,
        }
    }
}

/// Colour samples packed for OpenCV plus the alpha plane kept aside.
struct Planes {
    layout: Layout,
    color: Vec<u8>,
    alpha: Vec<u8>,
}

impl Planes {
    fn split(image: &DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(buffer) => Self::opaque(Layout::Luma, buffer.as_raw().clone()),
            DynamicImage::ImageRgb8(buffer) => Self::opaque(Layout::Rgb, buffer.as_raw().clone()),
            DynamicImage::ImageLumaA8(buffer) => Self::with_alpha(Layout::LumaAlpha, buffer.as_raw()),
            DynamicImage::ImageRgba8(buffer) => Self::with_alpha(Layout::Rgba, buffer.as_raw()),
            other if other.color().has_alpha() => Self::with_alpha(Layout::Rgba, other.to_rgba8().as_raw()),
            other => Self::opaque(Layout::Rgb, other.to_rgb8().into_raw()),
        }
    }

    fn opaque(layout: Layout, color: Vec<u8>) -> Self {
        Self {
            layout,
            color,
            alpha: Vec::new(),
        }
    }

    fn with_alpha(layout: Layout, raw: &[u8]) -> Self {
        let stride = layout.color_channels() + 1;
        let mut color = Vec::with_capacity(raw.len() / stride * (stride - 1));
        let mut alpha = Vec::with_capacity(raw.len() / stride);
        for pixel in raw.chunks_exact(stride) {
            color.extend_from_slice(&pixel[..stride - 1]);
            alpha.push(pixel[stride - 1]);
        }
        Self {
            layout,
            color,
            alpha,
        }
    }

    fn join(self, color: Vec<u8>, width: u32, height: u32) -> Result<DynamicImage, InpaintError> {
        let channels = self.layout.color_channels();
        let raw = if self.alpha.is_empty() {
            color
        } else {
            let mut raw = Vec::with_capacity(color.len() + self.alpha.len());
            for (pixel, alpha) in color.chunks_exact(channels).zip(&self.alpha) {
                raw.extend_from_slice(pixel);
                raw.push(*alpha);
            }
            raw
        };
        let size = InpaintError::BufferSize { width, height };
        let image = match self.layout {
            Layout::Luma => DynamicImage::ImageLuma8(GrayImage::from_raw(width, height, raw).ok_or(size)?),
            Layout::Rgb => DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, raw).ok_or(size)?),
            Layout::LumaAlpha => DynamicImage::ImageLumaA8(
                ImageBuffer::<LumaA<u8>, _>::from_raw(width, height, raw).ok_or(size)?,
            ),
            Layout::Rgba => DynamicImage::ImageRgba8(
                ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, raw).ok_or(size)?,
            ),
        };
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_is_split_and_rejoined() {
        let raw = [1, 2, 3, 40, 5, 6, 7, 80];
        let planes = Planes::with_alpha(Layout::Rgba, &raw);
        assert_eq!(planes.color, vec![1, 2, 3, 5, 6, 7]);
        assert_eq!(planes.alpha, vec![40, 80]);

        let joined = planes.join(vec![9, 9, 9, 8, 8, 8], 2, 1).unwrap().to_rgba8();
        assert_eq!(joined.as_raw(), &vec![9, 9, 9, 40, 8, 8, 8, 80]);
    }

    #[test]
    fn wide_images_are_narrowed() {
        let image = DynamicImage::new_rgb16(3, 2);
        let planes = Planes::split(&image);
        assert_eq!(planes.layout, Layout::Rgb);
        assert_eq!(planes.color.len(), 18);
        assert!(planes.alpha.is_empty());
    }

    #[test]
    fn flags_follow_method() {
        assert_eq!(PhotoInpainter::new(InpaintMethod::Telea, 3.0).flags(), photo::INPAINT_TELEA);
        assert_eq!(
            PhotoInpainter::new(InpaintMethod::NavierStokes, 3.0).flags(),
            photo::INPAINT_NS
        );
    }
}
