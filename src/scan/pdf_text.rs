// Native PDF text layer extraction
//
// Walks each page's content streams tracking the text cursor (Td/Tm) and
// decoding show-text operators (Tj/TJ), then reassembles reading order by
// sorting runs top-to-bottom and left-to-right. Runs whose baselines sit
// within `LINE_TOLERANCE` points of each other join into one line.
use crate::types::{ChronyxError, Result};
use lopdf::{Dictionary, Document, Object};

const LINE_TOLERANCE: f32 = 3.0;

/// One positioned piece of shown text.
struct TextRun {
    text: String,
    x: f32,
    y: f32,
}

pub fn page_count(document: &Document) -> usize {
    document.get_pages().len()
}

/// Flatten the whole document's native text layer into newline-separated
/// lines in reading order. Pages with no text contribute nothing.
pub fn extract_document_text(document: &Document) -> Result<String> {
    let mut out = String::new();
    for (_, page_id) in document.get_pages() {
        let page = document
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|e| ChronyxError::Pdf(format!("bad page object: {e}")))?;
        let page_text = extract_page_text(document, page)?;
        if !page_text.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&page_text);
        }
    }
    Ok(out)
}

fn extract_page_text(document: &Document, page: &Dictionary) -> Result<String> {
    // A page without Contents is legal: blank page.
    let Ok(contents) = page.get(b"Contents") else {
        return Ok(String::new());
    };
    let data = content_data(document, contents)?;

    let mut runs = Vec::new();
    let mut cursor_x = 0.0f32;
    let mut cursor_y = 0.0f32;

    let content = String::from_utf8_lossy(&data);
    for line in content.lines() {
        let line = line.trim();
        if line.ends_with(" Td") || line.ends_with(" TD") {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 3 {
                if let (Ok(tx), Ok(ty)) = (parts[0].parse::<f32>(), parts[1].parse::<f32>()) {
                    cursor_x += tx;
                    cursor_y += ty;
                }
            }
        } else if line.ends_with(" Tm") {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 7 {
                if let (Ok(e), Ok(f)) = (parts[4].parse::<f32>(), parts[5].parse::<f32>()) {
                    cursor_x = e;
                    cursor_y = f;
                }
            }
        } else if line.contains("TJ") {
            if let Some(text) = decode_tj_array(line) {
                runs.push(TextRun { text, x: cursor_x, y: cursor_y });
            }
        } else if line.contains("Tj") {
            if let Some(text) = decode_tj(line) {
                runs.push(TextRun { text, x: cursor_x, y: cursor_y });
            }
        }
    }

    Ok(assemble_lines(runs))
}

/// Sort runs into reading order and merge same-baseline runs into lines.
fn assemble_lines(mut runs: Vec<TextRun>) -> String {
    runs.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<String> = Vec::new();
    let mut last_y: Option<f32> = None;
    for run in runs {
        match (last_y, lines.last_mut()) {
            (Some(y), Some(line)) if (y - run.y).abs() <= LINE_TOLERANCE => {
                if !line.is_empty() && !line.ends_with(' ') {
                    line.push(' ');
                }
                line.push_str(&run.text);
            }
            _ => {
                lines.push(run.text);
                last_y = Some(run.y);
            }
        }
    }
    lines.join("\n")
}

/// Contents may be a stream, a reference, or an array of either.
fn content_data(document: &Document, contents: &Object) -> Result<Vec<u8>> {
    match contents {
        Object::Reference(id) => {
            let obj = document
                .get_object(*id)
                .map_err(|e| ChronyxError::Pdf(format!("dangling content ref: {e}")))?;
            content_data(document, obj)
        }
        Object::Stream(stream) => Ok(stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone())),
        Object::Array(items) => {
            let mut data = Vec::new();
            for item in items {
                data.extend_from_slice(&content_data(document, item)?);
            }
            Ok(data)
        }
        _ => Ok(Vec::new()),
    }
}

fn decode_tj(line: &str) -> Option<String> {
    let start = line.find('(')?;
    let end = line.rfind(')')?;
    (end > start).then(|| decode_pdf_string(&line[start + 1..end]))
}

fn decode_tj_array(line: &str) -> Option<String> {
    let start = line.find('[')?;
    let end = line.rfind(']')?;
    if end <= start {
        return None;
    }
    let mut result = String::new();
    let mut in_string = false;
    let mut current = String::new();
    for ch in line[start + 1..end].chars() {
        if ch == '(' && !in_string {
            in_string = true;
            current.clear();
        } else if ch == ')' && in_string {
            in_string = false;
            result.push_str(&decode_pdf_string(&current));
        } else if in_string {
            current.push(ch);
        }
    }
    (!result.is_empty()).then_some(result)
}

/// Literal-string unescaping, enough for Latin text layers.
fn decode_pdf_string(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some(other) => result.push(other),
                None => {}
            }
        } else {
            result.push(ch);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    fn single_page_doc(content: &str) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content_id =
            doc.add_object(Stream::new(dictionary! {}, content.as_bytes().to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn tj_text_comes_back_verbatim() {
        let doc = single_page_doc("BT\n/F1 12 Tf\n72 720 Td\n(PAN: ABCDE1234F) Tj\nET");
        let text = extract_document_text(&doc).unwrap();
        assert!(text.contains("PAN: ABCDE1234F"), "got {text:?}");
    }

    #[test]
    fn runs_on_one_baseline_join_into_a_line() {
        let doc = single_page_doc(
            "BT\n/F1 12 Tf\n72 720 Td\n(Gross Salary:) Tj\n1 0 0 1 180 720 Tm\n(Rs. 12,50,000) Tj\nET",
        );
        let text = extract_document_text(&doc).unwrap();
        assert_eq!(text, "Gross Salary: Rs. 12,50,000");
    }

    #[test]
    fn lines_come_out_top_to_bottom() {
        let doc = single_page_doc(
            "BT\n/F1 12 Tf\n72 200 Td\n(below) Tj\n1 0 0 1 72 700 Tm\n(above) Tj\nET",
        );
        let text = extract_document_text(&doc).unwrap();
        assert_eq!(text, "above\nbelow");
    }

    #[test]
    fn truncated_text_matrix_is_ignored() {
        // A Tm without all six operands must leave the cursor where the
        // preceding Td put it, not reposition with garbage.
        let doc = single_page_doc(
            "BT\n/F1 12 Tf\n72 200 Td\n(first) Tj\n72 700 Tm\n(second) Tj\nET",
        );
        let text = extract_document_text(&doc).unwrap();
        assert_eq!(text, "first second");
    }

    #[test]
    fn page_without_contents_is_empty() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        assert_eq!(extract_document_text(&doc).unwrap(), "");
    }
}
