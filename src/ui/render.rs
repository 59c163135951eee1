/// Track rendering
///
/// Fits the source frame into the drawing surface without cropping, draws
/// the whole trajectory and highlights one sampled frame. Widths and radii
/// are divided by the fit scale so they keep the same on-screen size at any
/// zoom.

use iced::{Border, Color, Rectangle, Size, Vector};

use crate::state::data::{ImageSize, Point, Track};

/// Reported when the track carries no usable frame dimensions
pub const NO_FRAME_SIZE: &str = "Track has no frame size";

const FRAME_BORDER: Color = Color { r: 0.667, g: 0.667, b: 0.667, a: 1.0 };
const TRAJECTORY: Color = Color { r: 0.0, g: 0.667, b: 0.467, a: 1.0 };
const HIGHLIGHT: Color = Color { r: 0.824, g: 0.157, b: 0.157, a: 0.15 };
const MARKER: Color = Color { r: 0.867, g: 0.133, b: 0.133, a: 1.0 };

/// Screen-space sizes in logical pixels
const FRAME_BORDER_WIDTH: f32 = 1.0;
const TRAJECTORY_WIDTH: f64 = 2.0;
const MARKER_RADIUS: f64 = 4.0;

/// Something a track can be drawn onto.
///
/// Coordinates are logical pixels until `translate`/`scale` are applied;
/// `save`/`restore` bracket those transforms.
pub trait Surface {
    /// Drawable area in logical pixels
    fn size(&self) -> Size;
    fn clear(&mut self);
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, offset: Vector);
    fn scale(&mut self, factor: f32);
    fn stroke_rect(&mut self, rect: Rectangle, color: Color, width: f32);
    fn stroke_polyline(&mut self, points: &[iced::Point], color: Color, width: f32);
    fn fill_rect(&mut self, rect: Rectangle, color: Color);
    fn fill_circle(&mut self, center: iced::Point, radius: f32, color: Color);
}

/// Why a track cannot be drawn. Not an error, just an early return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPrecondition {
    /// No track loaded, or a track without points
    Empty,
    /// Image width or height missing or not positive
    NoFrameSize,
}

impl RenderPrecondition {
    pub fn message(self) -> &'static str {
        match self {
            RenderPrecondition::Empty => "",
            RenderPrecondition::NoFrameSize => NO_FRAME_SIZE,
        }
    }
}

fn prepare(track: Option<&Track>) -> Result<(&Track, (f64, f64)), RenderPrecondition> {
    let track = match track {
        Some(track) if !track.points.is_empty() => track,
        _ => return Err(RenderPrecondition::Empty),
    };
    let dimensions = track
        .image
        .dimensions()
        .ok_or(RenderPrecondition::NoFrameSize)?;
    Ok((track, dimensions))
}

/// Letterbox fit of the source frame into a surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameFit {
    /// Source pixels to logical pixels
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl FrameFit {
    /// Largest scale showing the whole frame, centered on the free axis
    pub fn compute(surface: Size, image: (f64, f64)) -> Self {
        let (image_w, image_h) = image;
        let surface_w = f64::from(surface.width);
        let surface_h = f64::from(surface.height);

        let scale = (surface_w / image_w).min(surface_h / image_h);

        FrameFit {
            scale,
            offset_x: (surface_w - image_w * scale) / 2.0,
            offset_y: (surface_h - image_h * scale) / 2.0,
        }
    }

    fn is_drawable(&self) -> bool {
        self.scale.is_finite() && self.scale > 0.0
    }
}

/// Draw `track` with the point at `frame_index` highlighted.
///
/// `on_info` receives the description of the selected point, an empty
/// string when there is nothing to show, or [`NO_FRAME_SIZE`]. It is not
/// called when `frame_index` is out of range.
pub fn draw_track<S, F>(surface: &mut S, track: Option<&Track>, frame_index: usize, on_info: F)
where
    S: Surface + ?Sized,
    F: FnOnce(String),
{
    surface.clear();

    let (track, image) = match prepare(track) {
        Ok(ready) => ready,
        Err(precondition) => {
            on_info(precondition.message().to_string());
            return;
        }
    };

    let fit = FrameFit::compute(surface.size(), image);
    let selected = track.points.get(frame_index);

    // Surface not laid out yet: nothing visible to draw
    if !fit.is_drawable() {
        if let Some(point) = selected {
            on_info(describe(track, point));
        }
        return;
    }

    surface.save();
    surface.translate(Vector::new(fit.offset_x as f32, fit.offset_y as f32));
    surface.scale(fit.scale as f32);

    let (image_w, image_h) = image;
    surface.stroke_rect(
        Rectangle::new(iced::Point::ORIGIN, Size::new(image_w as f32, image_h as f32)),
        FRAME_BORDER,
        FRAME_BORDER_WIDTH,
    );

    let centers: Vec<iced::Point> = track.points.iter().map(center_of).collect();
    surface.stroke_polyline(&centers, TRAJECTORY, (TRAJECTORY_WIDTH / fit.scale) as f32);

    if let Some(point) = selected {
        surface.fill_rect(
            Rectangle::new(
                iced::Point::new(point.xmin as f32, point.ymin as f32),
                Size::new(point.width() as f32, point.height() as f32),
            ),
            HIGHLIGHT,
        );
        surface.fill_circle(center_of(point), (MARKER_RADIUS / fit.scale) as f32, MARKER);

        on_info(describe(track, point));
    }

    surface.restore();
}

/// The text `draw_track` would report for this selection, without drawing.
/// `None` when the index is out of range.
pub fn selection_info(track: Option<&Track>, frame_index: usize) -> Option<String> {
    match prepare(track) {
        Ok((track, _)) => track
            .points
            .get(frame_index)
            .map(|point| describe(track, point)),
        Err(precondition) => Some(precondition.message().to_string()),
    }
}

fn center_of(point: &Point) -> iced::Point {
    let (x, y) = point.center();
    iced::Point::new(x as f32, y as f32)
}

/// "run r · track t · frame f · center (x, y)" with the center rounded
pub fn describe(track: &Track, point: &Point) -> String {
    let (cx, cy) = point.center();
    format!(
        "run {} · track {} · frame {} · center ({}, {})",
        track.run_ix,
        track.track_ix,
        point.frame_ix,
        round_half_up(cx),
        round_half_up(cy),
    )
}

/// Halves round toward positive infinity, so -2.5 becomes -2
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Displayed and backing size of the track canvas
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Displayed size in logical pixels
    pub display: Size,
    /// Physical pixels per logical pixel, when the platform reported one
    pub device_pixel_ratio: Option<f32>,
    /// Backing pixel buffer (width, height)
    pub buffer: (u32, u32),
    /// Scale applied to drawing so it can work in logical pixels
    pub transform_scale: f32,
    pub border: Option<Border>,
}

impl Viewport {
    pub fn new(display: Size) -> Self {
        let mut viewport = Viewport {
            display,
            device_pixel_ratio: None,
            buffer: (0, 0),
            transform_scale: 1.0,
            border: None,
        };
        resize_canvas(&mut viewport, None);
        viewport
    }

    pub fn pixel_ratio(&self) -> f32 {
        match self.device_pixel_ratio {
            Some(ratio) if ratio.is_finite() && ratio > 0.0 => ratio,
            _ => 1.0,
        }
    }
}

fn default_border() -> Border {
    Border {
        color: Color::from_rgb8(0x0d, 0x10, 0x4b),
        width: 4.0,
        ..Border::default()
    }
}

/// Size the canvas for the given source frame shape.
///
/// With a shape, the displayed height follows the frame's aspect ratio and
/// a border is added if none is set yet. The backing buffer always tracks
/// the displayed size times the device pixel ratio.
pub fn resize_canvas(viewport: &mut Viewport, frame_shape: Option<&ImageSize>) {
    let ratio = viewport.pixel_ratio();

    if let Some((w, h)) = frame_shape.and_then(ImageSize::dimensions) {
        viewport.display.height = (f64::from(viewport.display.width) * h / w) as f32;
        if viewport.border.is_none() {
            viewport.border = Some(default_border());
        }
    }

    viewport.buffer = (
        (viewport.display.width * ratio).max(0.0) as u32,
        (viewport.display.height * ratio).max(0.0) as u32,
    );
    viewport.transform_scale = ratio;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::Identifier;

    /// Records every call so tests can inspect what was drawn
    #[derive(Debug)]
    struct Recorder {
        size: Size,
        ops: Vec<Op>,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Clear,
        Save,
        Restore,
        Translate(Vector),
        Scale(f32),
        StrokeRect(Rectangle, f32),
        Polyline(Vec<iced::Point>, f32),
        FillRect(Rectangle),
        Circle(iced::Point, f32),
    }

    impl Recorder {
        fn new(width: f32, height: f32) -> Self {
            Recorder { size: Size::new(width, height), ops: Vec::new() }
        }
    }

    impl Surface for Recorder {
        fn size(&self) -> Size {
            self.size
        }
        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }
        fn save(&mut self) {
            self.ops.push(Op::Save);
        }
        fn restore(&mut self) {
            self.ops.push(Op::Restore);
        }
        fn translate(&mut self, offset: Vector) {
            self.ops.push(Op::Translate(offset));
        }
        fn scale(&mut self, factor: f32) {
            self.ops.push(Op::Scale(factor));
        }
        fn stroke_rect(&mut self, rect: Rectangle, _color: Color, width: f32) {
            self.ops.push(Op::StrokeRect(rect, width));
        }
        fn stroke_polyline(&mut self, points: &[iced::Point], _color: Color, width: f32) {
            self.ops.push(Op::Polyline(points.to_vec(), width));
        }
        fn fill_rect(&mut self, rect: Rectangle, _color: Color) {
            self.ops.push(Op::FillRect(rect));
        }
        fn fill_circle(&mut self, center: iced::Point, radius: f32, _color: Color) {
            self.ops.push(Op::Circle(center, radius));
        }
    }

    fn point(frame_ix: i64, xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Point {
        Point { frame_ix, xmin, ymin, xmax, ymax }
    }

    fn sample_track() -> Track {
        Track {
            run_ix: Identifier::new("r1"),
            track_ix: Identifier::new("t1"),
            image: ImageSize::new(640.0, 480.0),
            points: vec![
                point(0, 10.0, 10.0, 30.0, 30.0),
                point(5, 50.0, 60.0, 70.0, 80.0),
            ],
        }
    }

    fn draw(surface: &mut Recorder, track: Option<&Track>, index: usize) -> Option<String> {
        let mut info = None;
        draw_track(surface, track, index, |text| info = Some(text));
        info
    }

    #[test]
    fn test_selected_point_is_described() {
        let track = sample_track();
        let mut surface = Recorder::new(640.0, 480.0);

        let info = draw(&mut surface, Some(&track), 1).unwrap();

        assert_eq!(info, "run r1 · track t1 · frame 5 · center (60, 70)");
        assert!(surface.ops.contains(&Op::Circle(iced::Point::new(60.0, 70.0), 4.0)));
        assert!(surface.ops.contains(&Op::FillRect(Rectangle::new(
            iced::Point::new(50.0, 60.0),
            Size::new(20.0, 20.0)
        ))));
    }

    #[test]
    fn test_every_valid_index_reports_its_frame_and_center() {
        let mut track = sample_track();
        track.points.push(point(9, 1.0, 2.0, 4.0, 5.0));

        for (index, p) in track.points.iter().enumerate() {
            let mut surface = Recorder::new(300.0, 300.0);
            let info = draw(&mut surface, Some(&track), index).unwrap();
            let (cx, cy) = p.center();
            let expected = format!(
                "frame {} · center ({}, {})",
                p.frame_ix,
                (cx + 0.5).floor() as i64,
                (cy + 0.5).floor() as i64
            );
            assert!(info.ends_with(&expected), "{info}");
        }
    }

    #[test]
    fn test_empty_track_clears_and_reports_nothing() {
        let mut track = sample_track();
        track.points.clear();

        for index in [0, 3, 100] {
            let mut surface = Recorder::new(640.0, 480.0);
            assert_eq!(draw(&mut surface, Some(&track), index), Some(String::new()));
            assert_eq!(surface.ops, vec![Op::Clear]);
        }

        let mut surface = Recorder::new(640.0, 480.0);
        assert_eq!(draw(&mut surface, None, 0), Some(String::new()));
        assert_eq!(surface.ops, vec![Op::Clear]);
    }

    #[test]
    fn test_missing_frame_size_only_clears() {
        let sizes = [
            ImageSize::new(0.0, 480.0),
            ImageSize::new(640.0, 0.0),
            ImageSize::new(-640.0, 480.0),
            ImageSize::default(),
        ];

        for image in sizes {
            let mut track = sample_track();
            track.image = image;
            let mut surface = Recorder::new(640.0, 480.0);

            assert_eq!(draw(&mut surface, Some(&track), 0).as_deref(), Some(NO_FRAME_SIZE));
            assert_eq!(surface.ops, vec![Op::Clear]);
        }
    }

    #[test]
    fn test_out_of_range_index_draws_trajectory_without_info() {
        let track = sample_track();
        let mut surface = Recorder::new(640.0, 480.0);

        assert_eq!(draw(&mut surface, Some(&track), 2), None);
        assert!(surface.ops.iter().any(|op| matches!(op, Op::Polyline(points, _) if points.len() == 2)));
        assert!(!surface.ops.iter().any(|op| matches!(op, Op::Circle(..) | Op::FillRect(..))));
        assert_eq!(surface.ops.last(), Some(&Op::Restore));
    }

    #[test]
    fn test_widths_are_zoom_compensated() {
        let track = sample_track();
        // Half-size canvas, so the fit scale is 0.5
        let mut surface = Recorder::new(320.0, 240.0);
        draw(&mut surface, Some(&track), 0);

        assert!(surface.ops.contains(&Op::Scale(0.5)));
        assert!(surface.ops.contains(&Op::Polyline(
            vec![iced::Point::new(20.0, 20.0), iced::Point::new(60.0, 70.0)],
            4.0
        )));
        assert!(surface.ops.contains(&Op::Circle(iced::Point::new(20.0, 20.0), 8.0)));
        assert!(surface.ops.contains(&Op::StrokeRect(
            Rectangle::new(iced::Point::ORIGIN, Size::new(640.0, 480.0)),
            1.0
        )));
    }

    #[test]
    fn test_fit_is_maximal_without_cropping() {
        let cases = [
            (Size::new(640.0, 480.0), (640.0, 480.0)),
            (Size::new(1000.0, 300.0), (1920.0, 1080.0)),
            (Size::new(300.0, 1000.0), (1920.0, 1080.0)),
            (Size::new(123.0, 457.0), (17.0, 3.0)),
            (Size::new(800.0, 800.0), (1.0, 1.0)),
        ];

        for (surface, image) in cases {
            let fit = FrameFit::compute(surface, image);
            let scaled_w = image.0 * fit.scale;
            let scaled_h = image.1 * fit.scale;
            let (sw, sh) = (f64::from(surface.width), f64::from(surface.height));
            let eps = 1e-9 * sw.max(sh);

            assert!(scaled_w <= sw + eps && scaled_h <= sh + eps);
            assert!((scaled_w - sw).abs() < eps || (scaled_h - sh).abs() < eps);
            assert!((fit.offset_x * 2.0 + scaled_w - sw).abs() < eps);
            assert!((fit.offset_y * 2.0 + scaled_h - sh).abs() < eps);
        }
    }

    #[test]
    fn test_pillarbox_offsets() {
        let fit = FrameFit::compute(Size::new(1000.0, 480.0), (640.0, 480.0));
        assert_eq!(fit.scale, 1.0);
        assert_eq!(fit.offset_x, 180.0);
        assert_eq!(fit.offset_y, 0.0);
    }

    #[test]
    fn test_unlaid_surface_still_reports() {
        let track = sample_track();
        let mut surface = Recorder::new(0.0, 0.0);

        let info = draw(&mut surface, Some(&track), 0);

        assert_eq!(info.as_deref(), Some("run r1 · track t1 · frame 0 · center (20, 20)"));
        assert_eq!(surface.ops, vec![Op::Clear]);
    }

    #[test]
    fn test_selection_info_matches_draw() {
        let track = sample_track();
        for index in 0..4 {
            let mut surface = Recorder::new(640.0, 480.0);
            assert_eq!(selection_info(Some(&track), index), draw(&mut surface, Some(&track), index));
        }
        assert_eq!(selection_info(None, 0), Some(String::new()));
    }

    #[test]
    fn test_rounding_matches_half_up() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(59.49), 59);
    }

    #[test]
    fn test_resize_follows_frame_aspect() {
        let mut viewport = Viewport::new(Size::new(800.0, 300.0));
        viewport.device_pixel_ratio = Some(2.0);

        resize_canvas(&mut viewport, Some(&ImageSize::new(1920.0, 1080.0)));

        assert!((viewport.display.height / viewport.display.width - 1080.0 / 1920.0).abs() < 1e-6);
        assert_eq!(viewport.display.height, 450.0);
        assert_eq!(viewport.buffer, (1600, 900));
        assert_eq!(viewport.transform_scale, 2.0);
        assert!(viewport.border.is_some());
    }

    #[test]
    fn test_resize_keeps_existing_border() {
        let mut viewport = Viewport::new(Size::new(640.0, 480.0));
        let custom = Border { width: 1.0, ..Border::default() };
        viewport.border = Some(custom);

        resize_canvas(&mut viewport, Some(&ImageSize::new(4.0, 3.0)));

        assert_eq!(viewport.border, Some(custom));
    }

    #[test]
    fn test_resize_without_shape_only_updates_buffer() {
        let mut viewport = Viewport::new(Size::new(640.0, 300.0));
        viewport.device_pixel_ratio = Some(f32::NAN);

        resize_canvas(&mut viewport, None);

        assert_eq!(viewport.display, Size::new(640.0, 300.0));
        assert_eq!(viewport.buffer, (640, 300));
        assert_eq!(viewport.transform_scale, 1.0);
        assert!(viewport.border.is_none());
    }
}
