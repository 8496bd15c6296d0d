// TrOCR fallback for scanned pages
//
// ONNX encoder/decoder pair with greedy autoregressive decoding. Models live
// under the configured model directory: trocr_encoder.onnx, trocr.onnx and
// tokenizer.json.
use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use image::DynamicImage;
use ort::{
    init, inputs,
    session::builder::GraphOptimizationLevel,
    session::Session,
    value::Value,
};
use std::path::Path;
use tokenizers::tokenizer::Tokenizer;

const IMAGE_SIDE: u32 = 384;
const MAX_TOKENS: usize = 256;
const BOS_TOKEN_ID: i64 = 0;
const EOS_TOKEN_ID: u32 = 2;

pub struct OcrEngine {
    encoder: Session,
    decoder: Session,
    tokenizer: Tokenizer,
}

impl OcrEngine {
    /// True if all three model artifacts are present under `model_dir`.
    pub fn available(model_dir: &Path) -> bool {
        model_dir.join("trocr_encoder.onnx").exists()
            && model_dir.join("trocr.onnx").exists()
            && model_dir.join("tokenizer.json").exists()
    }

    pub fn load(model_dir: &Path) -> Result<Self> {
        if !Self::available(model_dir) {
            return Err(anyhow!("OCR models not found under {}", model_dir.display()));
        }
        let _ = init();

        log::debug!("loading OCR encoder");
        let encoder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(model_dir.join("trocr_encoder.onnx"))?;

        log::debug!("loading OCR decoder");
        let decoder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(model_dir.join("trocr.onnx"))?;

        let tokenizer = Tokenizer::from_file(model_dir.join("tokenizer.json"))
            .map_err(|e| anyhow!("tokenizer load failed: {e}"))?;

        Ok(Self { encoder, decoder, tokenizer })
    }

    /// Recognize the text on one page image.
    pub fn recognize(&mut self, page: &DynamicImage) -> Result<String> {
        let pixels = preprocess(page);

        let encoder_input = Value::from_array((
            [1_usize, 3, IMAGE_SIDE as usize, IMAGE_SIDE as usize],
            pixels.into_boxed_slice(),
        ))?;
        let encoder_outputs = self.encoder.run(inputs![encoder_input])?;
        let (enc_shape, enc_data) = encoder_outputs[0].try_extract_tensor::<f32>()?;
        let enc_shape = enc_shape.clone();
        let enc_data: Vec<f32> = enc_data.to_vec();

        let mut decoder_input_ids: Vec<i64> = vec![BOS_TOKEN_ID];
        let mut generated: Vec<u32> = Vec::new();

        for step in 0..MAX_TOKENS {
            let input_ids = Value::from_array((
                [1_usize, decoder_input_ids.len()],
                decoder_input_ids.clone().into_boxed_slice(),
            ))?;
            let hidden_states =
                Value::from_array((enc_shape.clone(), enc_data.clone().into_boxed_slice()))?;
            let use_cache = Value::from_array(([1_usize], vec![false].into_boxed_slice()))?;

            let outputs = self.decoder.run(inputs![
                "input_ids" => input_ids,
                "encoder_hidden_states" => hidden_states,
                "use_cache_branch" => use_cache
            ])?;

            let (logits_shape, logits_data) = outputs[0].try_extract_tensor::<f32>()?;
            let vocab_size = logits_shape[2] as usize;
            let last_start = ((logits_shape[1] - 1) * logits_shape[2]) as usize;
            let last_logits = &logits_data[last_start..last_start + vocab_size];

            let next_token = argmax(last_logits).context("empty logits")? as u32;

            if next_token == EOS_TOKEN_ID {
                log::debug!("EOS at step {step}");
                break;
            }
            generated.push(next_token);
            decoder_input_ids.push(next_token as i64);

            if stuck_in_repetition(&generated) {
                log::debug!("repetition loop at step {step}, stopping");
                break;
            }
        }

        let text = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| anyhow!("token decode failed: {e}"))?;
        log::debug!("OCR produced {} tokens, {} chars", generated.len(), text.len());
        Ok(text)
    }
}

/// Grayscale, back to RGB, resize to the model's fixed input size, then
/// normalized CHW floats.
fn preprocess(page: &DynamicImage) -> Vec<f32> {
    let gray = page.to_luma8();
    let mut rgb = image::RgbImage::new(gray.width(), gray.height());
    for (x, y, pixel) in gray.enumerate_pixels() {
        let v = pixel[0];
        rgb.put_pixel(x, y, image::Rgb([v, v, v]));
    }
    let resized = DynamicImage::ImageRgb8(rgb)
        .resize_exact(IMAGE_SIDE, IMAGE_SIDE, FilterType::Lanczos3)
        .to_rgb8();

    let side = IMAGE_SIDE as usize;
    let mut pixels = Vec::with_capacity(3 * side * side);
    for channel in 0..3 {
        for y in 0..IMAGE_SIDE {
            for x in 0..IMAGE_SIDE {
                pixels.push(resized.get_pixel(x, y)[channel] as f32 / 255.0);
            }
        }
    }
    pixels
}

fn argmax(logits: &[f32]) -> Option<usize> {
    logits
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, _)| idx)
}

/// Greedy decoding can lock onto a cycle; bail out on a 5x single-token run
/// or a 2-token pattern repeated four times.
fn stuck_in_repetition(generated: &[u32]) -> bool {
    if generated.len() >= 5 {
        let tail = &generated[generated.len() - 5..];
        if tail.iter().all(|&t| t == tail[0]) {
            return true;
        }
    }
    if generated.len() >= 8 {
        let tail = &generated[generated.len() - 8..];
        if (0..6).all(|i| tail[i] == tail[i + 2]) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preprocess_yields_normalized_chw() {
        let image = DynamicImage::new_rgb8(100, 60);
        let pixels = preprocess(&image);
        assert_eq!(pixels.len(), 3 * 384 * 384);
        assert!(pixels.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn argmax_picks_the_highest_logit() {
        assert_eq!(argmax(&[0.1, 3.5, -2.0, 3.4]), Some(1));
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[f32::NAN, 1.0, 0.5]), Some(1));
    }

    #[test]
    fn repetition_guard_trips_on_cycles() {
        assert!(stuck_in_repetition(&[7, 7, 7, 7, 7]));
        assert!(stuck_in_repetition(&[1, 2, 1, 2, 1, 2, 1, 2]));
        assert!(!stuck_in_repetition(&[1, 2, 3, 4, 5, 6, 7, 8]));
    }

    #[test]
    fn missing_models_are_detected() {
        assert!(!OcrEngine::available(Path::new("/nonexistent/models")));
    }
}
