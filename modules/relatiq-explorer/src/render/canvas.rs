use relatiq_common::Point;

/// 2D drawing surface in graph coordinates. The host applies the camera
/// transform; sizes passed here are already divided by the zoom scale where
/// they should stay constant on screen.
///
/// Text is centered on `at` both horizontally and vertically.
pub trait Canvas {
    fn clear(&mut self, color: &str);

    fn fill_circle(&mut self, center: Point, radius: f64, color: &str);

    fn stroke_circle(&mut self, center: Point, radius: f64, line_width: f64, color: &str);

    fn line(&mut self, from: Point, to: Point, line_width: f64, color: &str);

    /// `origin` is the top-left corner.
    fn fill_rect(&mut self, origin: Point, width: f64, height: f64, color: &str);

    fn text(&mut self, text: &str, at: Point, font_size: f64, color: &str);

    /// Rendered width of `text` at `font_size`.
    fn measure_text(&self, text: &str, font_size: f64) -> f64;
}
