use card_scrub_types::PixelRect;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

use crate::{Configuration, InpaintError, InpaintMethod, Mask};

fn card_with_text(width: u32, height: u32, background: Rgb<u8>, text: PixelRect) -> RgbImage {
    let mut image = RgbImage::from_pixel(width, height, background);
    for y in text.y..text.bottom() {
        for x in text.x..text.right() {
            if (x + y) % 3 != 0 {
                image.put_pixel(x, y, Rgb([5, 5, 5]));
            }
        }
    }
    image
}

fn close_to(pixel: &Rgb<u8>, expected: Rgb<u8>) -> bool {
    pixel
        .0
        .iter()
        .zip(expected.0)
        .all(|(&a, b)| a.abs_diff(b) <= 2)
}

fn all_methods() -> Vec<Configuration> {
    InpaintMethod::available()
        .into_iter()
        .map(|method| Configuration {
            method,
            radius: 3.0,
        })
        .collect()
}

#[test]
fn uniform_background_is_restored() {
    let text = PixelRect::new(10, 8, 20, 6);
    let background = Rgb([200, 180, 40]);
    let image = card_with_text(48, 24, background, text);
    let mask = Mask::from_rects(48, 24, &[text.expand(1, 1, 48, 24)]);

    for config in all_methods() {
        let inpainter = config.create_inpainter().unwrap();
        let out = inpainter
            .inpaint(&DynamicImage::ImageRgb8(image.clone()), &mask)
            .unwrap()
            .to_rgb8();
        for pixel in out.pixels() {
            assert!(close_to(pixel, background), "method {}: {pixel:?}", config.method);
        }
    }
}

#[test]
fn pixels_outside_mask_are_untouched() {
    let image = RgbImage::from_fn(30, 30, |x, y| Rgb([(x * 7) as u8, (y * 5) as u8, ((x * y) % 251) as u8]));
    let mut mask = Mask::from_rects(30, 30, &[PixelRect::new(5, 5, 6, 3), PixelRect::new(20, 18, 4, 9)]);
    mask.dilate(3, 1);

    for config in all_methods() {
        let out = config
            .create_inpainter()
            .unwrap()
            .inpaint(&DynamicImage::ImageRgb8(image.clone()), &mask)
            .unwrap()
            .to_rgb8();
        for (x, y, pixel) in out.enumerate_pixels() {
            if !mask.is_set(x, y) {
                assert_eq!(pixel, image.get_pixel(x, y), "method {} at ({x},{y})", config.method);
            }
        }
    }
}

#[test]
fn empty_mask_returns_source_pixels() {
    let image = RgbaImage::from_fn(9, 7, |x, y| Rgba([x as u8, y as u8, 3, 128]));
    let source = DynamicImage::ImageRgba8(image);
    let mask = Mask::new(9, 7);
    for config in all_methods() {
        let out = config.create_inpainter().unwrap().inpaint(&source, &mask).unwrap();
        assert_eq!(out, source);
    }
}

#[test]
fn alpha_channel_is_preserved_outside_mask() {
    let image = RgbaImage::from_pixel(16, 16, Rgba([30, 60, 90, 77]));
    let mask = Mask::from_rects(16, 16, &[PixelRect::new(6, 6, 3, 3)]);
    let out = Configuration::default()
        .create_inpainter()
        .unwrap()
        .inpaint(&DynamicImage::ImageRgba8(image), &mask)
        .unwrap();
    assert!(out.color().has_alpha());
    for pixel in out.to_rgba8().pixels() {
        assert_eq!(pixel[3], 77);
        assert!(close_to(&Rgb([pixel[0], pixel[1], pixel[2]]), Rgb([30, 60, 90])));
    }
}

#[test]
fn grayscale_stays_grayscale() {
    let image = GrayImage::from_pixel(20, 12, Luma([140]));
    let mask = Mask::from_rects(20, 12, &[PixelRect::new(8, 4, 4, 4)]);
    for config in all_methods() {
        let out = config
            .create_inpainter()
            .unwrap()
            .inpaint(&DynamicImage::ImageLuma8(image.clone()), &mask)
            .unwrap();
        let gray = out.as_luma8().expect("layout kept");
        assert!(gray.pixels().all(|p| p[0].abs_diff(140) <= 2), "method {}", config.method);
    }
}

#[test]
fn inpainter_reports_its_configuration() {
    let inpainter = Configuration {
        method: InpaintMethod::NavierStokes,
        radius: 5.5,
    }
    .create_inpainter()
    .unwrap();
    assert_eq!(inpainter.method(), InpaintMethod::NavierStokes);
    assert_eq!(inpainter.radius(), 5.5);
}

#[test]
fn mismatched_mask_is_rejected() {
    let image = DynamicImage::new_rgb8(10, 10);
    let mask = Mask::new(10, 11);
    let err = Configuration::default()
        .create_inpainter()
        .unwrap()
        .inpaint(&image, &mask)
        .unwrap_err();
    assert!(matches!(
        err,
        InpaintError::DimensionMismatch {
            mask_height: 11,
            image_height: 10,
            ..
        }
    ));
}

#[test]
fn invalid_radius_is_rejected() {
    for radius in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let config = Configuration {
            method: InpaintMethod::Telea,
            radius,
        };
        assert!(config.create_inpainter().is_err());
    }
}

#[test]
fn method_names_parse() {
    assert_eq!("telea".parse::<InpaintMethod>().unwrap(), InpaintMethod::Telea);
    assert_eq!("NS".parse::<InpaintMethod>().unwrap(), InpaintMethod::NavierStokes);
    assert_eq!(
        "navier-stokes".parse::<InpaintMethod>().unwrap(),
        InpaintMethod::NavierStokes
    );
    let err = "patchmatch".parse::<InpaintMethod>().unwrap_err();
    assert_eq!(err.to_string(), "unknown inpaint method 'patchmatch'");
    for method in InpaintMethod::available() {
        assert_eq!(method.as_str().parse::<InpaintMethod>().unwrap(), method);
    }
}
