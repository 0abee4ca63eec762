use std::env;
use std::error::Error;
use std::path::PathBuf;

use card_scrub_ocr::{Backend, Configuration, OcrRequest, TesseractConfig};

const DEFAULT_INPUT_IMAGE: &str = "./demo/card.png";

fn main() -> Result<(), Box<dyn Error>> {
    let input_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_IMAGE));
    if !input_path.exists() {
        return Err(format!("input image {:?} does not exist", input_path).into());
    }
    let backend = env::args()
        .nth(2)
        .map(|name| name.parse::<Backend>())
        .transpose()?
        .unwrap_or(Backend::Tesseract);

    let image = image::open(&input_path)?.to_rgb8();
    let config = Configuration {
        backend,
        tesseract: TesseractConfig::default(),
    };
    let engine = config.create_engine()?;
    engine.warm_up()?;

    let response = engine.recognize(&OcrRequest::new(&image))?;
    if response.is_empty() {
        println!("No text recognized in {:?}", input_path);
        return Ok(());
    }

    println!(
        "OCR results for {:?} (backend={}):",
        input_path,
        engine.name()
    );
    for word in response.words {
        let conf = word
            .confidence
            .map(|value| format!("{value:.1}"))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "- line={}.{}.{} rect=({},{},{},{}) confidence={conf} text='{}'",
            word.line.block,
            word.line.paragraph,
            word.line.line,
            word.rect.x,
            word.rect.y,
            word.rect.width,
            word.rect.height,
            word.text
        );
    }

    Ok(())
}
