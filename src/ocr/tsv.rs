use crate::core::error::InputError;
use crate::core::geometry::Rect;
use crate::core::model::Token;

const REQUIRED: [&str; 6] = ["left", "top", "width", "height", "conf", "text"];

/// Parses Tesseract `tsv` output into word tokens.
///
/// Coordinates are multiplied by `scale` to map image pixels back to page units.
/// Rows without text or with a negative confidence (page, block and line levels) are
/// skipped. Confidence values are truncated to integers.
pub fn parse_tsv(input: &str, scale: f64) -> Result<Vec<Token>, InputError> {
    let mut lines = input.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
    let Some((_, header)) = lines.next() else {
        return Ok(Vec::new());
    };

    let columns: Vec<&str> = header.split('\t').map(str::trim).collect();
    let mut idx = [0usize; 6];
    for (slot, name) in idx.iter_mut().zip(REQUIRED) {
        *slot = columns
            .iter()
            .position(|c| *c == name)
            .ok_or(InputError::MissingColumn(name))?;
    }
    let [left_i, top_i, width_i, height_i, conf_i, text_i] = idx;

    let mut tokens = Vec::new();
    for (line_no, line) in lines {
        let line_no = line_no + 1;
        let fields: Vec<&str> = line.split('\t').collect();
        // Tesseract drops the trailing text column on rows that have no text.
        if fields.len() + 1 < columns.len() {
            return Err(InputError::ColumnCount {
                line: line_no,
                expected: columns.len(),
                got: fields.len(),
            });
        }

        let text = fields.get(text_i).map(|t| t.trim()).unwrap_or_default();
        if text.is_empty() {
            continue;
        }

        let number = |i: usize, column: &'static str| -> Result<f64, InputError> {
            let raw = fields.get(i).copied().unwrap_or_default().trim();
            raw.parse::<f64>().map_err(|_| InputError::NonNumeric {
                line: line_no,
                column,
                value: raw.to_string(),
            })
        };

        let conf = number(conf_i, "conf")?;
        if conf < 0.0 {
            continue;
        }

        let left = number(left_i, "left")? * scale;
        let top = number(top_i, "top")? * scale;
        let width = number(width_i, "width")? * scale;
        let height = number(height_i, "height")? * scale;

        tokens.push(Token::new(
            text,
            Rect::new(left, top, left + width, top + height),
            conf.trunc() as i32,
        ));
    }

    Ok(tokens)
}
