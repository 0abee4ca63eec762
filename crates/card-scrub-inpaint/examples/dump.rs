use std::env;
use std::error::Error;
use std::path::PathBuf;

use card_scrub_inpaint::{Configuration, InpaintMethod, Mask};

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    let (Some(image_path), Some(mask_path), Some(output_path)) = (args.next(), args.next(), args.next())
    else {
        return Err("usage: inpaint-dump <image> <mask> <output> [telea|ns] [radius]".into());
    };
    let method = args
        .next()
        .map(|name| name.parse::<InpaintMethod>())
        .transpose()?
        .unwrap_or_default();
    let radius = args.next().map(|value| value.parse::<f64>()).transpose()?.unwrap_or(3.0);

    let image = image::open(PathBuf::from(&image_path))?;
    let mask = Mask::from_image(image::open(PathBuf::from(&mask_path))?.to_luma8());
    println!(
        "inpainting {} masked pixels of {image_path} with {method} (radius {radius})",
        mask.count()
    );

    let inpainter = Configuration { method, radius }.create_inpainter()?;
    let output = inpainter.inpaint(&image, &mask)?;
    output.save(&output_path)?;
    println!("wrote {output_path}");
    Ok(())
}
