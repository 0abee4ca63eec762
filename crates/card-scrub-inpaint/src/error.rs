use thiserror::Error;

#[derive(Debug, Error)]
pub enum InpaintError {
    #[error(
        "mask is {mask_width}x{mask_height} but image is {image_width}x{image_height}"
    )]
    DimensionMismatch {
        image_width: u32,
        image_height: u32,
        mask_width: u32,
        mask_height: u32,
    },
    #[error("inpaint radius must be positive and finite, got {0}")]
    InvalidRadius(f64),
    #[error("inpainted buffer does not fit {width}x{height}")]
    BufferSize { width: u32, height: u32 },
    #[error("opencv: {0}")]
    OpenCv(#[from] opencv::Error),
}
