// Noteflow ink surface: stroke capture, undo/redo, CPU rasterization
pub mod history;
pub mod render;
pub mod stroke;
pub mod surface;

pub use render::Renderer;
pub use stroke::{Color, Point, Stroke, Tool};
pub use surface::{DrawingSurface, PointerEvent, PointerKind, Viewport};
