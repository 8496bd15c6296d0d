// Stroke data model for the ink surface
use serde::{Deserialize, Serialize};

/// A captured pointer sample in canvas coordinates. Pressure is 0..=1;
/// mouse and touch report a constant 0.5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub pressure: f32,
}

impl Point {
    pub fn new(x: f32, y: f32, pressure: f32) -> Self {
        Self { x, y, pressure }
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point {
            x: (self.x + other.x) * 0.5,
            y: (self.y + other.y) * 0.5,
            pressure: (self.pressure + other.pressure) * 0.5,
        }
    }
}

/// Closed tool set of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Pen,
    Highlighter,
    Eraser,
    Line,
    Rectangle,
    Circle,
}

impl Tool {
    /// Shape tools are rendered from their first and last point only.
    pub fn is_shape(&self) -> bool {
        matches!(self, Tool::Line | Tool::Rectangle | Tool::Circle)
    }

    pub fn is_freehand(&self) -> bool {
        matches!(self, Tool::Pen | Tool::Highlighter | Tool::Eraser)
    }
}

/// RGBA stroke color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const MARKER_YELLOW: Color = Color { r: 255, g: 235, b: 59, a: 160 };
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// A committed vector stroke: ordered point list plus rendering attributes.
/// The surface never commits a stroke with fewer than 2 points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<Point>,
    pub color: Color,
    pub width: f32,
    pub tool: Tool,
}

impl Stroke {
    pub fn new(tool: Tool, color: Color, width: f32) -> Self {
        Self { points: Vec::new(), color, width, tool }
    }

    /// Press and release coordinates. Shape geometry depends on nothing else.
    pub fn endpoints(&self) -> Option<(Point, Point)> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Some((*first, *last)),
            _ => None,
        }
    }
}

/// Pressure-to-width taper used for freehand segments.
pub fn pressure_width(base: f32, pressure: f32) -> f32 {
    base * (pressure * 0.6 + 0.4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressure_taper_range() {
        // Zero pressure still leaves 40% of the base width.
        assert_eq!(pressure_width(10.0, 0.0), 4.0);
        assert_eq!(pressure_width(10.0, 1.0), 10.0);
    }

    #[test]
    fn tool_classification() {
        assert!(Tool::Rectangle.is_shape());
        assert!(!Tool::Eraser.is_shape());
        assert!(Tool::Eraser.is_freehand());
    }

    #[test]
    fn stroke_json_roundtrip() {
        let mut stroke = Stroke::new(Tool::Pen, Color::BLACK, 3.0);
        stroke.points.push(Point::new(1.0, 2.0, 0.5));
        stroke.points.push(Point::new(3.0, 4.0, 0.7));
        let json = serde_json::to_string(&stroke).unwrap();
        assert!(json.contains("\"pen\""));
        let back: Stroke = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stroke);
    }
}
