use card_scrub_types::{LineKey, PixelRect, WordBox};

use crate::OcrError;

const WORD_LEVEL: u32 = 5;

const COLUMNS: [&str; 12] = [
    "level", "page_num", "block_num", "par_num", "line_num", "word_num", "left", "top",
    "width", "height", "conf", "text",
];

struct ColumnIndex {
    level: usize,
    page: usize,
    block: usize,
    paragraph: usize,
    line: usize,
    left: usize,
    top: usize,
    width: usize,
    height: usize,
    conf: usize,
    text: usize,
}

impl ColumnIndex {
    fn from_header(header: &str) -> Result<Self, OcrError> {
        let names: Vec<&str> = header.trim_end_matches('\r').split('\t').collect();
        let find = |name: &str| {
            names
                .iter()
                .position(|candidate| candidate.trim() == name)
                .ok_or_else(|| OcrError::malformed(1, format!("missing column '{name}'")))
        };
        Ok(Self {
            level: find(COLUMNS[0])?,
            page: find(COLUMNS[1])?,
            block: find(COLUMNS[2])?,
            paragraph: find(COLUMNS[3])?,
            line: find(COLUMNS[4])?,
            left: find(COLUMNS[6])?,
            top: find(COLUMNS[7])?,
            width: find(COLUMNS[8])?,
            height: find(COLUMNS[9])?,
            conf: find(COLUMNS[10])?,
            text: find(COLUMNS[11])?,
        })
    }
}

/// Parses Tesseract TSV output into word boxes.
///
/// Only word-level rows with non-blank text are kept. A negative confidence
/// (Tesseract's marker for "not a word") maps to `None`.
pub fn parse_tsv(output: &str) -> Result<Vec<WordBox>, OcrError> {
    let mut lines = output.lines();
    let Some(header) = lines.next() else {
        return Ok(Vec::new());
    };
    if header.trim().is_empty() {
        return Ok(Vec::new());
    }
    let columns = ColumnIndex::from_header(header)?;

    let mut words = Vec::new();
    for (offset, row) in lines.enumerate() {
        let line_no = offset + 2;
        let row = row.trim_end_matches('\r');
        if row.is_empty() {
            continue;
        }
        let fields: Vec<&str> = row.split('\t').collect();
        let level = parse_u32(&fields, columns.level, line_no, "level")?;
        if level != WORD_LEVEL {
            continue;
        }
        let text = fields.get(columns.text).map(|s| s.trim()).unwrap_or("");
        if text.is_empty() {
            continue;
        }

        let rect = PixelRect::new(
            parse_coordinate(&fields, columns.left, line_no, "left")?,
            parse_coordinate(&fields, columns.top, line_no, "top")?,
            parse_coordinate(&fields, columns.width, line_no, "width")?,
            parse_coordinate(&fields, columns.height, line_no, "height")?,
        );
        let line = LineKey::new(
            parse_u32(&fields, columns.page, line_no, "page_num")?,
            parse_u32(&fields, columns.block, line_no, "block_num")?,
            parse_u32(&fields, columns.paragraph, line_no, "par_num")?,
            parse_u32(&fields, columns.line, line_no, "line_num")?,
        );
        let confidence = field(&fields, columns.conf, line_no, "conf")?
            .parse::<f32>()
            .map_err(|_| OcrError::malformed(line_no, "conf is not a number"))?;

        let mut word = WordBox::new(text, rect).on_line(line);
        if confidence >= 0.0 {
            word = word.with_confidence(confidence);
        }
        words.push(word);
    }
    Ok(words)
}

fn field<'a>(
    fields: &[&'a str],
    index: usize,
    line_no: usize,
    name: &str,
) -> Result<&'a str, OcrError> {
    fields
        .get(index)
        .map(|value| value.trim())
        .ok_or_else(|| OcrError::malformed(line_no, format!("missing '{name}' field")))
}

fn parse_u32(fields: &[&str], index: usize, line_no: usize, name: &str) -> Result<u32, OcrError> {
    field(fields, index, line_no, name)?
        .parse::<u32>()
        .map_err(|_| OcrError::malformed(line_no, format!("'{name}' is not an unsigned integer")))
}

// Tesseract occasionally reports slightly negative offsets for glyphs touching the border.
fn parse_coordinate(
    fields: &[&str],
    index: usize,
    line_no: usize,
    name: &str,
) -> Result<u32, OcrError> {
    let value = field(fields, index, line_no, name)?
        .parse::<i64>()
        .map_err(|_| OcrError::malformed(line_no, format!("'{name}' is not an integer")))?;
    Ok(value.clamp(0, i64::from(u32::MAX)) as u32)
}
