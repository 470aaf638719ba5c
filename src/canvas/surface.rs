use std::io::Cursor;

use anyhow::{Context, Result};
use image::{ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

pub const MIN_BRUSH_WIDTH: u32 = 1;
pub const MAX_BRUSH_WIDTH: u32 = 50;
const DEFAULT_BRUSH_WIDTH: u32 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ToolKind {
    Brush,
    Eraser,
}

impl Default for ToolKind {
    fn default() -> Self {
        ToolKind::Brush
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToolState {
    pub kind: ToolKind,
    pub color: [u8; 3],
    pub width_px: u32,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            kind: ToolKind::Brush,
            color: [0, 0, 0],
            width_px: DEFAULT_BRUSH_WIDTH,
        }
    }
}

/// Raster the player draws on. Erasing restores the background color, so a
/// cleared surface is pixel-identical to a freshly created one.
#[derive(Debug, Clone)]
pub struct DrawingSurface {
    pixels: RgbaImage,
    background: Rgba<u8>,
    tool: ToolState,
    last_point: Option<Point>,
}

impl DrawingSurface {
    pub fn new(width: u32, height: u32, background: [u8; 3]) -> Self {
        let background = opaque(background);
        Self {
            pixels: RgbaImage::from_pixel(width.max(1), height.max(1), background),
            background,
            tool: ToolState::default(),
            last_point: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn tool(&self) -> ToolState {
        self.tool
    }

    pub fn set_tool(&mut self, kind: ToolKind) {
        self.tool.kind = kind;
    }

    pub fn set_color(&mut self, color: [u8; 3]) {
        self.tool.color = color;
    }

    /// Sets the stroke width, clamped to `[MIN_BRUSH_WIDTH, MAX_BRUSH_WIDTH]`.
    pub fn set_brush_width(&mut self, width_px: u32) {
        self.tool.width_px = width_px.clamp(MIN_BRUSH_WIDTH, MAX_BRUSH_WIDTH);
    }

    pub fn is_stroking(&self) -> bool {
        self.last_point.is_some()
    }

    pub fn start_stroke(&mut self, point: Point) {
        self.last_point = Some(point);
    }

    pub fn extend_stroke(&mut self, point: Point) {
        let Some(from) = self.last_point else {
            return;
        };

        let color = match self.tool.kind {
            ToolKind::Brush => opaque(self.tool.color),
            ToolKind::Eraser => self.background,
        };
        let radius = self.tool.width_px as f32 / 2.0;
        self.paint_segment(from, point, radius, color);
        self.last_point = Some(point);
    }

    pub fn end_stroke(&mut self) {
        self.last_point = None;
    }

    pub fn clear(&mut self) {
        let background = self.background;
        for pixel in self.pixels.pixels_mut() {
            *pixel = background;
        }
        self.last_point = None;
    }

    /// Encodes the current contents as PNG.
    pub fn export_raster(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.pixels
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .context("failed to encode drawing as PNG")?;
        Ok(bytes)
    }

    /// Paints every pixel whose center lies within `radius` of the segment,
    /// which yields round caps and joins between consecutive segments.
    fn paint_segment(&mut self, from: Point, to: Point, radius: f32, color: Rgba<u8>) {
        let (width, height) = (self.pixels.width() as f32, self.pixels.height() as f32);

        let min_x = (from.x.min(to.x) - radius).floor().max(0.0);
        let min_y = (from.y.min(to.y) - radius).floor().max(0.0);
        let max_x = (from.x.max(to.x) + radius).ceil().min(width - 1.0);
        let max_y = (from.y.max(to.y) + radius).ceil().min(height - 1.0);
        if min_x > max_x || min_y > max_y {
            return;
        }

        for py in min_y as u32..=max_y as u32 {
            for px in min_x as u32..=max_x as u32 {
                let center = Point::new(px as f32 + 0.5, py as f32 + 0.5);
                if distance_to_segment(center, from, to) <= radius {
                    self.pixels.put_pixel(px, py, color);
                }
            }
        }
    }
}

fn opaque([r, g, b]: [u8; 3]) -> Rgba<u8> {
    Rgba([r, g, b, 255])
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [u8; 3] = [255, 255, 255];
    const RED: [u8; 3] = [200, 30, 30];

    fn stroke(surface: &mut DrawingSurface, points: &[(f32, f32)]) {
        let mut iter = points.iter();
        if let Some(&(x, y)) = iter.next() {
            surface.start_stroke(Point::new(x, y));
        }
        for &(x, y) in iter {
            surface.extend_stroke(Point::new(x, y));
        }
        surface.end_stroke();
    }

    #[test]
    fn start_stroke_leaves_no_mark() {
        let mut surface = DrawingSurface::new(40, 40, WHITE);
        let blank = surface.pixels().clone();

        surface.start_stroke(Point::new(20.0, 20.0));
        surface.end_stroke();

        assert_eq!(surface.pixels(), &blank);
    }

    #[test]
    fn extend_without_active_stroke_is_noop() {
        let mut surface = DrawingSurface::new(40, 40, WHITE);
        let blank = surface.pixels().clone();

        surface.extend_stroke(Point::new(10.0, 10.0));
        surface.end_stroke();
        surface.end_stroke();

        assert_eq!(surface.pixels(), &blank);
        assert!(!surface.is_stroking());
    }

    #[test]
    fn brush_paints_along_path_with_round_caps() {
        let mut surface = DrawingSurface::new(100, 100, WHITE);
        surface.set_color(RED);
        surface.set_brush_width(10);
        stroke(&mut surface, &[(20.0, 50.0), (80.0, 50.0)]);

        let red = Rgba([RED[0], RED[1], RED[2], 255]);
        assert_eq!(surface.pixels().get_pixel(50, 50), &red);
        assert_eq!(surface.pixels().get_pixel(50, 46), &red);
        // Round cap extends past the endpoint by the radius.
        assert_eq!(surface.pixels().get_pixel(83, 50), &red);
        // Corners of the square cap envelope stay untouched.
        assert_eq!(surface.pixels().get_pixel(84, 45), &opaque(WHITE));
        assert_eq!(surface.pixels().get_pixel(50, 60), &opaque(WHITE));
    }

    #[test]
    fn brush_width_is_clamped() {
        let mut surface = DrawingSurface::new(10, 10, WHITE);
        surface.set_brush_width(0);
        assert_eq!(surface.tool().width_px, MIN_BRUSH_WIDTH);
        surface.set_brush_width(500);
        assert_eq!(surface.tool().width_px, MAX_BRUSH_WIDTH);
    }

    #[test]
    fn clear_then_export_matches_fresh_surface() {
        let fresh = DrawingSurface::new(64, 48, WHITE);

        let mut surface = DrawingSurface::new(64, 48, WHITE);
        surface.set_color(RED);
        surface.set_brush_width(12);
        stroke(&mut surface, &[(5.0, 5.0), (60.0, 40.0), (10.0, 40.0)]);
        assert_ne!(surface.pixels(), fresh.pixels());

        surface.clear();

        assert_eq!(surface.pixels(), fresh.pixels());
        assert_eq!(
            surface.export_raster().unwrap(),
            fresh.export_raster().unwrap()
        );
    }

    #[test]
    fn eraser_removes_exactly_the_stroke_path() {
        let mut surface = DrawingSurface::new(100, 100, WHITE);
        surface.set_color(RED);
        surface.set_brush_width(20);
        stroke(&mut surface, &[(10.0, 50.0), (90.0, 50.0)]);
        let brushed = surface.pixels().clone();

        surface.set_tool(ToolKind::Eraser);
        surface.set_brush_width(4);
        stroke(&mut surface, &[(10.0, 50.0), (90.0, 50.0)]);

        let red = Rgba([RED[0], RED[1], RED[2], 255]);
        assert_eq!(surface.pixels().get_pixel(50, 50), &opaque(WHITE));
        assert_eq!(surface.pixels().get_pixel(50, 45), &red);

        for (x, y, pixel) in surface.pixels().enumerate_pixels() {
            let center = Point::new(x as f32 + 0.5, y as f32 + 0.5);
            let under_eraser =
                distance_to_segment(center, Point::new(10.0, 50.0), Point::new(90.0, 50.0)) <= 2.0;
            if under_eraser {
                assert_eq!(pixel, &opaque(WHITE), "pixel ({x},{y}) not erased");
            } else {
                assert_eq!(pixel, brushed.get_pixel(x, y), "pixel ({x},{y}) changed");
            }
        }
    }

    #[test]
    fn erasing_matching_stroke_restores_blank_surface() {
        let fresh = DrawingSurface::new(80, 80, WHITE);
        let mut surface = DrawingSurface::new(80, 80, WHITE);
        let path = [(10.0, 10.0), (70.0, 30.0), (40.0, 70.0)];

        surface.set_brush_width(8);
        stroke(&mut surface, &path);
        surface.set_tool(ToolKind::Eraser);
        stroke(&mut surface, &path);

        assert_eq!(surface.pixels(), fresh.pixels());
    }

    #[test]
    fn erasing_blank_region_is_noop() {
        let mut surface = DrawingSurface::new(50, 50, WHITE);
        let blank = surface.pixels().clone();

        surface.set_tool(ToolKind::Eraser);
        surface.set_brush_width(30);
        stroke(&mut surface, &[(0.0, 0.0), (49.0, 49.0)]);

        assert_eq!(surface.pixels(), &blank);
    }

    #[test]
    fn strokes_outside_bounds_are_clipped() {
        let mut surface = DrawingSurface::new(20, 20, WHITE);
        surface.set_brush_width(4);
        stroke(&mut surface, &[(-50.0, -50.0), (-30.0, -30.0)]);
        stroke(&mut surface, &[(15.0, 10.0), (120.0, 10.0)]);

        assert_eq!(surface.pixels().get_pixel(19, 10), &Rgba([0, 0, 0, 255]));
        assert_eq!(surface.pixels().get_pixel(0, 0), &opaque(WHITE));
    }

    #[test]
    fn export_decodes_to_surface_contents() {
        let mut surface = DrawingSurface::new(30, 20, [10, 20, 30]);
        surface.set_color(RED);
        stroke(&mut surface, &[(2.0, 2.0), (28.0, 18.0)]);

        let png = surface.export_raster().unwrap();
        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png)
            .unwrap()
            .to_rgba8();
        assert_eq!(&decoded, surface.pixels());
    }
}
