// Drawing surface: pointer capture over a persistent raster
//
// Owns the committed stroke list, the undo/redo history and the live pixmap.
// The host feeds it abstract pointer events and gets notified with the
// updated stroke list on every committed change; persistence is the host's
// job.
use crate::ink::history::{History, Snapshot};
use crate::ink::render::Renderer;
use crate::ink::stroke::{Color, Point, Stroke, Tool};
use crate::types::{ChronyxError, Result};
use std::sync::Arc;
use tiny_skia as sk;

/// Pressure reported for pointers that have no pressure axis.
const DEFAULT_PRESSURE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

#[derive(Debug, Clone, Copy)]
pub struct PointerEvent {
    pub x: f32,
    pub y: f32,
    pub pressure: f32,
    pub kind: PointerKind,
}

impl PointerEvent {
    pub fn mouse(x: f32, y: f32) -> Self {
        Self { x, y, pressure: DEFAULT_PRESSURE, kind: PointerKind::Mouse }
    }

    pub fn touch(x: f32, y: f32) -> Self {
        Self { x, y, pressure: DEFAULT_PRESSURE, kind: PointerKind::Touch }
    }

    pub fn pen(x: f32, y: f32, pressure: f32) -> Self {
        Self { x, y, pressure: pressure.clamp(0.0, 1.0), kind: PointerKind::Pen }
    }
}

/// Screen-to-canvas transform. The host positions the canvas; we only need
/// the inverse mapping for incoming pointer coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub offset_x: f32,
    pub offset_y: f32,
    pub scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { offset_x: 0.0, offset_y: 0.0, scale: 1.0 }
    }
}

impl Viewport {
    fn to_canvas(&self, event: &PointerEvent) -> Point {
        Point::new(
            (event.x - self.offset_x) / self.scale,
            (event.y - self.offset_y) / self.scale,
            event.pressure,
        )
    }
}

struct ActiveStroke {
    stroke: Stroke,
    /// Press position, retained separately as the shape anchor.
    anchor: Point,
}

type ChangeSink = Box<dyn FnMut(&[Arc<Stroke>]) + Send>;

pub struct DrawingSurface {
    pixmap: sk::Pixmap,
    committed: Snapshot,
    history: History,
    active: Option<ActiveStroke>,
    tool: Tool,
    color: Color,
    brush_width: f32,
    viewport: Viewport,
    /// Palm rejection: once a stylus is seen, mouse events are ignored for
    /// the rest of the session.
    stylus_seen: bool,
    on_change: Option<ChangeSink>,
}

impl DrawingSurface {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = sk::Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| ChronyxError::Render(format!("bad canvas size {width}x{height}")))?;
        Ok(Self {
            pixmap,
            committed: Vec::new(),
            history: History::new(),
            active: None,
            tool: Tool::Pen,
            color: Color::BLACK,
            brush_width: 3.0,
            viewport: Viewport::default(),
            stylus_seen: false,
            on_change: None,
        })
    }

    /// Construct with an initial stroke list (JSON-interchange shape).
    pub fn with_strokes(width: u32, height: u32, strokes: Vec<Stroke>) -> Result<Self> {
        let mut surface = Self::new(width, height)?;
        surface.committed = strokes.into_iter().map(Arc::new).collect();
        surface.redraw();
        Ok(surface)
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_brush_width(&mut self, width: f32) {
        self.brush_width = width.max(0.1);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Host sink invoked with the committed list after every change.
    pub fn set_change_sink(&mut self, sink: impl FnMut(&[Arc<Stroke>]) + Send + 'static) {
        self.on_change = Some(Box::new(sink));
    }

    pub fn pointer_down(&mut self, event: PointerEvent) {
        if self.rejects(&event) || self.active.is_some() {
            return;
        }
        // Every destructive action is undoable: snapshot before mutating.
        // Rolled back if this gesture ends up committing nothing.
        self.history.record(&self.committed);
        let point = self.viewport.to_canvas(&event);
        let mut stroke = Stroke::new(self.tool, self.color, self.brush_width);
        stroke.points.push(point);
        self.active = Some(ActiveStroke { stroke, anchor: point });
    }

    pub fn pointer_move(&mut self, event: PointerEvent) {
        if self.rejects(&event) {
            return;
        }
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let point = self.viewport.to_canvas(&event);
        active.stroke.points.push(point);

        if active.stroke.tool.is_shape() {
            // Shapes re-render from scratch with a dashed preview.
            let (tool, color, width) = (active.stroke.tool, active.stroke.color, active.stroke.width);
            let (anchor, cursor) = (active.anchor, point);
            Renderer::replay(&self.committed, &mut self.pixmap);
            Renderer::paint_shape_preview(tool, color, width, anchor, cursor, &mut self.pixmap);
        } else {
            // Freehand paints incrementally for low-latency feedback.
            let n = active.stroke.points.len();
            let before = if n >= 3 { active.stroke.points[n - 3] } else { active.stroke.points[n - 2] };
            let through = active.stroke.points[n - 2];
            Renderer::paint_segment(
                active.stroke.tool,
                active.stroke.color,
                active.stroke.width,
                before,
                through,
                point,
                &mut self.pixmap,
            );
        }
    }

    pub fn pointer_up(&mut self, event: PointerEvent) {
        if self.rejects(&event) {
            return;
        }
        self.finish_stroke();
    }

    /// Leaving the surface ends the stroke the same way a release does.
    pub fn pointer_leave(&mut self) {
        self.finish_stroke();
    }

    pub fn undo(&mut self) {
        if let Some(snapshot) = self.history.undo(&self.committed) {
            self.committed = snapshot;
            self.redraw();
            self.notify();
        }
    }

    pub fn redo(&mut self) {
        if let Some(snapshot) = self.history.redo(&self.committed) {
            self.committed = snapshot;
            self.redraw();
            self.notify();
        }
    }

    pub fn clear(&mut self) {
        self.history.record(&self.committed);
        self.committed.clear();
        self.redraw();
        self.notify();
    }

    /// Resize re-renders everything; it never fails. Zero dimensions clamp
    /// to one pixel.
    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(pixmap) = sk::Pixmap::new(width.max(1), height.max(1)) {
            self.pixmap = pixmap;
            self.redraw();
        }
    }

    /// Rasterize the canvas to a PNG data URL.
    pub fn export(&self) -> Result<String> {
        Renderer::export_data_url(&self.pixmap)
    }

    pub fn committed(&self) -> &[Arc<Stroke>] {
        &self.committed
    }

    /// Serializable stroke list for host persistence.
    pub fn strokes(&self) -> Vec<Stroke> {
        self.committed.iter().map(|s| (**s).clone()).collect()
    }

    pub fn pixmap(&self) -> &sk::Pixmap {
        &self.pixmap
    }

    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }

    fn finish_stroke(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        // Fewer than 2 points is a tap, not a stroke.
        if active.stroke.points.len() < 2 {
            self.history.discard_record();
            return;
        }

        // Eraser passes change pixels, not the vector list: the committed
        // strokes never contain an eraser stroke.
        if active.stroke.tool == Tool::Eraser {
            self.history.discard_record();
            return;
        }

        self.committed.push(Arc::new(active.stroke));
        self.redraw();
        self.notify();
    }

    fn redraw(&mut self) {
        Renderer::replay(&self.committed, &mut self.pixmap);
    }

    fn notify(&mut self) {
        if let Some(sink) = self.on_change.as_mut() {
            sink(&self.committed);
        }
    }

    fn rejects(&mut self, event: &PointerEvent) -> bool {
        match event.kind {
            PointerKind::Pen => {
                self.stylus_seen = true;
                false
            }
            PointerKind::Mouse => self.stylus_seen,
            PointerKind::Touch => false,
        }
    }
}
