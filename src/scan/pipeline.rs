// Scan orchestration: validate, try the native text layer, fall back to OCR,
// then run field extraction. Failure anywhere is atomic: the caller gets an
// error and no partial field set.
use crate::config::ScanConfig;
use crate::scan::extractor::extract_fields;
use crate::scan::fields::FieldSet;
use crate::scan::ocr::OcrEngine;
use crate::scan::{page_images, pdf_text};
use crate::types::{ChronyxError, Result};
use chrono::{DateTime, Local};
use lopdf::Document;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStage {
    Validating,
    NativeText,
    Ocr { page: usize, total: usize },
    ExtractingFields,
}

/// Progress report sent over the channel; `fraction` is monotone in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScanProgress {
    pub stage: ScanStage,
    pub fraction: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    NativeText,
    Ocr,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub fields: FieldSet,
    pub source: TextSource,
    pub pages: usize,
    pub elapsed_ms: u64,
    pub scanned_at: DateTime<Local>,
}

/// Scan one Form-16 PDF end to end.
///
/// Validation rejects non-PDF paths and oversized files before any parsing.
/// Progress is best-effort: a dropped receiver never aborts the scan.
pub async fn scan_document(
    path: &Path,
    config: &ScanConfig,
    progress: Option<UnboundedSender<ScanProgress>>,
) -> Result<ScanOutcome> {
    let started = Instant::now();
    report(&progress, ScanStage::Validating, 0.0);

    let is_pdf = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(ChronyxError::InputRejected(format!(
            "{} is not a PDF",
            path.display()
        )));
    }
    let size = std::fs::metadata(path)?.len();
    if size > config.max_file_bytes() {
        return Err(ChronyxError::InputRejected(format!(
            "file is {} bytes, limit is {} MB",
            size, config.max_file_size_mb
        )));
    }

    let document =
        Document::load(path).map_err(|e| ChronyxError::Pdf(format!("PDF parse failed: {e}")))?;
    let pages = pdf_text::page_count(&document);

    report(&progress, ScanStage::NativeText, 0.1);
    let native = pdf_text::extract_document_text(&document)?;

    let (text, source) = if native.trim().chars().count() >= config.min_native_text_chars {
        log::info!("{}: native text layer ({} chars)", path.display(), native.len());
        (native, TextSource::NativeText)
    } else {
        log::info!(
            "{}: text layer too thin ({} chars), falling back to OCR",
            path.display(),
            native.trim().len()
        );
        (ocr_document(&document, config, &progress, pages)?, TextSource::Ocr)
    };

    report(&progress, ScanStage::ExtractingFields, 0.9);
    let fields = extract_fields(&text);
    report(&progress, ScanStage::ExtractingFields, 1.0);

    Ok(ScanOutcome {
        fields,
        source,
        pages,
        elapsed_ms: started.elapsed().as_millis() as u64,
        scanned_at: Local::now(),
    })
}

fn ocr_document(
    document: &Document,
    config: &ScanConfig,
    progress: &Option<UnboundedSender<ScanProgress>>,
    pages: usize,
) -> Result<String> {
    let mut engine =
        OcrEngine::load(&config.model_dir).map_err(|e| ChronyxError::Ocr(e.to_string()))?;

    let total = pages.min(config.max_ocr_pages);
    let mut text = String::new();
    for (index, (_, page_id)) in document.get_pages().into_iter().take(total).enumerate() {
        report(
            progress,
            ScanStage::Ocr { page: index + 1, total },
            0.1 + 0.8 * (index as f32 / total.max(1) as f32),
        );
        let Some(image) = page_images::page_image(document, page_id)? else {
            log::warn!("page {} has no embedded image, skipping", index + 1);
            continue;
        };
        let page_text = engine
            .recognize(&image)
            .map_err(|e| ChronyxError::Ocr(format!("page {}: {e}", index + 1)))?;
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&page_text);
    }
    Ok(text)
}

fn report(progress: &Option<UnboundedSender<ScanProgress>>, stage: ScanStage, fraction: f32) {
    if let Some(tx) = progress {
        // Receiver may be gone; the scan does not care.
        let _ = tx.send(ScanProgress { stage, fraction });
    }
}
