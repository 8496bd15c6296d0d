// Form-16 scanner: PDF text layer, OCR fallback, rule-table field extraction
pub mod extractor;
pub mod fields;
pub mod ocr;
pub mod page_images;
pub mod pdf_text;
pub mod pipeline;
pub mod rules;

pub use extractor::extract_fields;
pub use fields::{ExtractedField, Field, FieldSet, FieldValue};
pub use pipeline::{scan_document, ScanOutcome, ScanProgress, ScanStage, TextSource};
