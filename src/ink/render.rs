// CPU rasterization of committed strokes
//
// Strokes are replayed in insertion order. Freehand tools draw a chain of
// quadratic segments through successive midpoints, one stroked subpath per
// segment so the width can follow pressure. Shape tools ignore every point
// between press and release.
use crate::ink::stroke::{pressure_width, Color, Point, Stroke, Tool};
use crate::types::{ChronyxError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use kurbo::Shape;
use std::sync::Arc;
use tiny_skia as sk;

/// Path flattening tolerance for kurbo-built shapes, in canvas units.
const SHAPE_TOLERANCE: f64 = 0.1;

pub struct Renderer;

impl Renderer {
    /// Clear the pixmap and replay every committed stroke in order.
    pub fn replay(strokes: &[Arc<Stroke>], pixmap: &mut sk::Pixmap) {
        pixmap.fill(sk::Color::TRANSPARENT);
        for stroke in strokes {
            Self::paint_stroke(stroke, pixmap);
        }
    }

    pub fn paint_stroke(stroke: &Stroke, pixmap: &mut sk::Pixmap) {
        if stroke.points.len() < 2 {
            return;
        }
        if stroke.tool.is_shape() {
            Self::paint_shape(stroke, pixmap, false);
        } else {
            Self::paint_freehand(stroke, pixmap);
        }
    }

    /// Incremental segment used for low-latency feedback while the pointer
    /// moves: anchors at the midpoints around `through`, matching what the
    /// full replay will draw for the same three points.
    pub fn paint_segment(
        tool: Tool,
        color: Color,
        width: f32,
        before: Point,
        through: Point,
        after: Point,
        pixmap: &mut sk::Pixmap,
    ) {
        let start = before.midpoint(&through);
        let end = through.midpoint(&after);
        let mut pb = sk::PathBuilder::new();
        pb.move_to(start.x, start.y);
        pb.quad_to(through.x, through.y, end.x, end.y);
        if let Some(path) = pb.finish() {
            let paint = Self::paint_for(tool, color);
            let stroke = Self::stroke_style(pressure_width(width, through.pressure), None);
            pixmap.stroke_path(&path, &paint, &stroke, sk::Transform::identity(), None);
        }
    }

    /// Dashed outline of a shape in progress, anchored at press position and
    /// the current pointer.
    pub fn paint_shape_preview(
        tool: Tool,
        color: Color,
        width: f32,
        anchor: Point,
        cursor: Point,
        pixmap: &mut sk::Pixmap,
    ) {
        let mut preview = Stroke::new(tool, color, width);
        preview.points.push(anchor);
        preview.points.push(cursor);
        Self::paint_shape(&preview, pixmap, true);
    }

    /// Rasterize the pixmap to a PNG data URL. Pure: does not mutate state.
    pub fn export_data_url(pixmap: &sk::Pixmap) -> Result<String> {
        let png = pixmap
            .encode_png()
            .map_err(|e| ChronyxError::Render(format!("PNG encode failed: {e}")))?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }

    fn paint_freehand(stroke: &Stroke, pixmap: &mut sk::Pixmap) {
        let points = &stroke.points;
        let paint = Self::paint_for(stroke.tool, stroke.color);

        if points.len() == 2 {
            let mut pb = sk::PathBuilder::new();
            pb.move_to(points[0].x, points[0].y);
            pb.line_to(points[1].x, points[1].y);
            if let Some(path) = pb.finish() {
                let style =
                    Self::stroke_style(pressure_width(stroke.width, points[1].pressure), None);
                pixmap.stroke_path(&path, &paint, &style, sk::Transform::identity(), None);
            }
            return;
        }

        // Midpoint chain: each interior point is the control of one quadratic
        // segment, stroked at its own pressure width.
        let mut anchor = points[0];
        for i in 1..points.len() - 1 {
            let next_anchor = points[i].midpoint(&points[i + 1]);
            let mut pb = sk::PathBuilder::new();
            pb.move_to(anchor.x, anchor.y);
            pb.quad_to(points[i].x, points[i].y, next_anchor.x, next_anchor.y);
            if let Some(path) = pb.finish() {
                let style =
                    Self::stroke_style(pressure_width(stroke.width, points[i].pressure), None);
                pixmap.stroke_path(&path, &paint, &style, sk::Transform::identity(), None);
            }
            anchor = next_anchor;
        }

        // Tail from the last midpoint to the release point.
        let last = points[points.len() - 1];
        let mut pb = sk::PathBuilder::new();
        pb.move_to(anchor.x, anchor.y);
        pb.line_to(last.x, last.y);
        if let Some(path) = pb.finish() {
            let style = Self::stroke_style(pressure_width(stroke.width, last.pressure), None);
            pixmap.stroke_path(&path, &paint, &style, sk::Transform::identity(), None);
        }
    }

    fn paint_shape(stroke: &Stroke, pixmap: &mut sk::Pixmap, dashed: bool) {
        let Some((first, last)) = stroke.endpoints() else {
            return;
        };
        let a = kurbo::Point::new(first.x as f64, first.y as f64);
        let b = kurbo::Point::new(last.x as f64, last.y as f64);

        let path = match stroke.tool {
            Tool::Line => Self::shape_path(&kurbo::Line::new(a, b)),
            Tool::Rectangle => Self::shape_path(&kurbo::Rect::from_points(a, b)),
            Tool::Circle => {
                let rect = kurbo::Rect::from_points(a, b);
                let ellipse = kurbo::Ellipse::new(
                    rect.center(),
                    (rect.width() * 0.5, rect.height() * 0.5),
                    0.0,
                );
                Self::shape_path(&ellipse)
            }
            _ => None,
        };

        if let Some(path) = path {
            let paint = Self::paint_for(stroke.tool, stroke.color);
            let dash = if dashed {
                sk::StrokeDash::new(vec![6.0, 4.0], 0.0)
            } else {
                None
            };
            let style = Self::stroke_style(stroke.width, dash);
            pixmap.stroke_path(&path, &paint, &style, sk::Transform::identity(), None);
        }
    }

    fn shape_path(shape: &impl Shape) -> Option<sk::Path> {
        let mut pb = sk::PathBuilder::new();
        for el in shape.path_elements(SHAPE_TOLERANCE) {
            match el {
                kurbo::PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
                kurbo::PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
                kurbo::PathEl::QuadTo(c, p) => {
                    pb.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32)
                }
                kurbo::PathEl::CurveTo(c1, c2, p) => pb.cubic_to(
                    c1.x as f32,
                    c1.y as f32,
                    c2.x as f32,
                    c2.y as f32,
                    p.x as f32,
                    p.y as f32,
                ),
                kurbo::PathEl::ClosePath => pb.close(),
            }
        }
        pb.finish()
    }

    fn paint_for(tool: Tool, color: Color) -> sk::Paint<'static> {
        let mut paint = sk::Paint::default();
        paint.anti_alias = true;
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.blend_mode = match tool {
            // Overlapping highlighter passes darken instead of occluding.
            Tool::Highlighter => sk::BlendMode::Multiply,
            // Eraser punches transparency out of the bitmap.
            Tool::Eraser => sk::BlendMode::DestinationOut,
            _ => sk::BlendMode::SourceOver,
        };
        paint
    }

    fn stroke_style(width: f32, dash: Option<sk::StrokeDash>) -> sk::Stroke {
        sk::Stroke {
            width: width.max(0.1),
            line_cap: sk::LineCap::Round,
            line_join: sk::LineJoin::Round,
            dash,
            ..sk::Stroke::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixmap() -> sk::Pixmap {
        sk::Pixmap::new(64, 64).unwrap()
    }

    fn pen_stroke(points: &[(f32, f32)]) -> Stroke {
        let mut stroke = Stroke::new(Tool::Pen, Color::BLACK, 4.0);
        for &(x, y) in points {
            stroke.points.push(Point::new(x, y, 0.8));
        }
        stroke
    }

    fn painted_pixels(pixmap: &sk::Pixmap) -> usize {
        pixmap.data().chunks(4).filter(|px| px[3] != 0).count()
    }

    #[test]
    fn pen_stroke_marks_pixels() {
        let mut pm = pixmap();
        Renderer::paint_stroke(&pen_stroke(&[(8.0, 8.0), (30.0, 30.0), (56.0, 20.0)]), &mut pm);
        assert!(painted_pixels(&pm) > 0);
    }

    #[test]
    fn single_point_stroke_draws_nothing() {
        let mut pm = pixmap();
        Renderer::paint_stroke(&pen_stroke(&[(8.0, 8.0)]), &mut pm);
        assert_eq!(painted_pixels(&pm), 0);
    }

    #[test]
    fn eraser_removes_previous_ink() {
        let mut pm = pixmap();
        Renderer::paint_stroke(&pen_stroke(&[(8.0, 32.0), (56.0, 32.0)]), &mut pm);
        let before = painted_pixels(&pm);

        let mut eraser = Stroke::new(Tool::Eraser, Color::BLACK, 12.0);
        eraser.points.push(Point::new(8.0, 32.0, 1.0));
        eraser.points.push(Point::new(56.0, 32.0, 1.0));
        Renderer::paint_stroke(&eraser, &mut pm);

        assert!(painted_pixels(&pm) < before);
    }

    #[test]
    fn highlighter_multiplies_instead_of_occluding() {
        let mut pm = pixmap();
        pm.fill(sk::Color::WHITE);
        let mut marker = Stroke::new(Tool::Highlighter, Color::MARKER_YELLOW, 10.0);
        marker.points.push(Point::new(8.0, 32.0, 0.5));
        marker.points.push(Point::new(56.0, 32.0, 0.5));
        Renderer::paint_stroke(&marker, &mut pm);
        let once = pm.data().to_vec();
        Renderer::paint_stroke(&marker, &mut pm);
        // A second pass darkens: the buffer must change.
        assert_ne!(pm.data(), &once[..]);
    }

    #[test]
    fn shape_ignores_intermediate_points() {
        let mut a = pixmap();
        let mut rect = Stroke::new(Tool::Rectangle, Color::BLACK, 2.0);
        rect.points.push(Point::new(10.0, 10.0, 0.5));
        rect.points.push(Point::new(50.0, 40.0, 0.5));
        Renderer::paint_stroke(&rect, &mut a);

        let mut b = pixmap();
        let mut wandering = rect.clone();
        wandering
            .points
            .insert(1, Point::new(3.0, 60.0, 0.5));
        wandering
            .points
            .insert(2, Point::new(60.0, 3.0, 0.5));
        Renderer::paint_stroke(&wandering, &mut b);

        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn export_is_a_png_data_url() {
        let pm = pixmap();
        let url = Renderer::export_data_url(&pm).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }
}
