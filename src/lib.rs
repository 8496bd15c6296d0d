// Chronyx core - headless engines behind the Noteflow ink surface and the
// Form-16 scanner. No windowing, no backend: pointer events in, strokes and
// field sets out.

pub mod config;
pub mod ink;
pub mod scan;
pub mod types;
pub mod wizard;

pub use types::{ChronyxError, Result};
