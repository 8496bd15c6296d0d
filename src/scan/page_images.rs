// Embedded page image recovery
//
// Scanner-produced PDFs wrap each page in one full-page image XObject. We
// pull the largest image on the page and hand it to OCR, which avoids
// carrying a full page rasterizer.
use crate::types::{ChronyxError, Result};
use image::DynamicImage;
use lopdf::{Dictionary, Document, Object};

/// The largest image XObject on the page, decoded. `None` when the page has
/// no images at all (then there is nothing OCR could read either).
pub fn page_image(document: &Document, page_id: (u32, u16)) -> Result<Option<DynamicImage>> {
    let page = document
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| ChronyxError::Pdf(format!("bad page object: {e}")))?;

    let Ok(resources) = page.get(b"Resources") else {
        return Ok(None);
    };
    let Some(resources) = resolve(document, resources)?.as_dict().ok() else {
        return Ok(None);
    };
    let Ok(xobjects) = resources.get(b"XObject") else {
        return Ok(None);
    };
    let Some(xobjects) = resolve(document, xobjects)?.as_dict().ok() else {
        return Ok(None);
    };

    let mut best: Option<(i64, &lopdf::Stream)> = None;
    for (_, entry) in xobjects.iter() {
        let Object::Stream(stream) = resolve(document, entry)? else {
            continue;
        };
        if !is_image(&stream.dict) {
            continue;
        }
        let area = dim(&stream.dict, b"Width").unwrap_or(0) * dim(&stream.dict, b"Height").unwrap_or(0);
        if best.map_or(true, |(best_area, _)| area > best_area) {
            best = Some((area, stream));
        }
    }

    match best {
        Some((_, stream)) => decode_image(stream).map(Some),
        None => Ok(None),
    }
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> Result<&'a Object> {
    match object {
        Object::Reference(id) => document
            .get_object(*id)
            .map_err(|e| ChronyxError::Pdf(format!("dangling reference: {e}"))),
        other => Ok(other),
    }
}

fn is_image(dict: &Dictionary) -> bool {
    matches!(dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Image")
}

fn dim(dict: &Dictionary, key: &[u8]) -> Option<i64> {
    dict.get(key).ok().and_then(|o| o.as_i64().ok())
}

fn decode_image(stream: &lopdf::Stream) -> Result<DynamicImage> {
    if has_filter(&stream.dict, b"DCTDecode") {
        // JPEG passthrough: the stream body is the JPEG file.
        return image::load_from_memory(&stream.content)
            .map_err(|e| ChronyxError::Pdf(format!("embedded JPEG decode: {e}")));
    }

    // Flate (or unfiltered) raw samples.
    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    let width = dim(&stream.dict, b"Width")
        .ok_or_else(|| ChronyxError::Pdf("image without Width".into()))? as u32;
    let height = dim(&stream.dict, b"Height")
        .ok_or_else(|| ChronyxError::Pdf("image without Height".into()))? as u32;

    let gray = matches!(stream.dict.get(b"ColorSpace"), Ok(Object::Name(n)) if n == b"DeviceGray");
    if gray {
        image::GrayImage::from_raw(width, height, data)
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(|| ChronyxError::Pdf("gray image sample count mismatch".into()))
    } else {
        image::RgbImage::from_raw(width, height, data)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| ChronyxError::Pdf("rgb image sample count mismatch".into()))
    }
}

fn has_filter(dict: &Dictionary, filter: &[u8]) -> bool {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => name == filter,
        Ok(Object::Array(items)) => items
            .iter()
            .any(|o| matches!(o, Object::Name(name) if name == filter)),
        _ => false,
    }
}
