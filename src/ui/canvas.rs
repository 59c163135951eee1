use iced::widget::canvas::{self, Frame, Path, Program, Stroke};
use iced::mouse::{self, Cursor};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme, Vector};

use super::render::{self, Surface};
use crate::state::data::Track;
use crate::Message;

/// Canvas program drawing the loaded track with one frame highlighted.
/// Mouse wheel over the canvas steps through frames.
pub struct TrackCanvas<'a> {
    pub track: Option<&'a Track>,
    pub frame_index: usize,
}

impl<'a> Program<Message> for TrackCanvas<'a> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());

        // Info text is owned by the session, nothing to report from here
        render::draw_track(&mut FrameSurface::new(&mut frame), self.track, self.frame_index, |_| {});

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        _state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        if let canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) = event {
            if !cursor.is_over(bounds) {
                return (canvas::event::Status::Ignored, None);
            }

            let y = match delta {
                mouse::ScrollDelta::Lines { y, .. } => y,
                mouse::ScrollDelta::Pixels { y, .. } => y,
            };

            // Scrolling down moves forward in time
            let step = if y < 0.0 {
                1
            } else if y > 0.0 {
                -1
            } else {
                return (canvas::event::Status::Ignored, None);
            };
            return (canvas::event::Status::Captured, Some(Message::Step(step)));
        }

        (canvas::event::Status::Ignored, None)
    }
}

/// Translate followed by uniform scale
#[derive(Debug, Clone, Copy, PartialEq)]
struct Affine {
    offset: Vector,
    scale: f32,
}

impl Affine {
    const IDENTITY: Affine = Affine {
        offset: Vector { x: 0.0, y: 0.0 },
        scale: 1.0,
    };

    fn translated(self, by: Vector) -> Self {
        Affine {
            offset: self.offset + by * self.scale,
            scale: self.scale,
        }
    }

    fn scaled(self, factor: f32) -> Self {
        Affine {
            offset: self.offset,
            scale: self.scale * factor,
        }
    }

    fn point(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.offset.x, p.y * self.scale + self.offset.y)
    }

    fn length(&self, len: f32) -> f32 {
        len * self.scale
    }

    fn rect(&self, rect: Rectangle) -> (Point, Size) {
        (
            self.point(rect.position()),
            Size::new(self.length(rect.width), self.length(rect.height)),
        )
    }
}

/// [`Surface`] over an iced canvas frame.
///
/// Transforms are applied here rather than through the frame so stroke
/// widths and radii land in screen space the same way on every backend.
pub struct FrameSurface<'f> {
    frame: &'f mut Frame,
    transform: Affine,
    saved: Vec<Affine>,
}

impl<'f> FrameSurface<'f> {
    pub fn new(frame: &'f mut Frame) -> Self {
        Self {
            frame,
            transform: Affine::IDENTITY,
            saved: Vec::new(),
        }
    }
}

impl Surface for FrameSurface<'_> {
    fn size(&self) -> Size {
        self.frame.size()
    }

    fn clear(&mut self) {
        // Frames start empty on every draw
    }

    fn save(&mut self) {
        self.saved.push(self.transform);
    }

    fn restore(&mut self) {
        self.transform = self.saved.pop().unwrap_or(Affine::IDENTITY);
    }

    fn translate(&mut self, offset: Vector) {
        self.transform = self.transform.translated(offset);
    }

    fn scale(&mut self, factor: f32) {
        self.transform = self.transform.scaled(factor);
    }

    fn stroke_rect(&mut self, rect: Rectangle, color: Color, width: f32) {
        let (top_left, size) = self.transform.rect(rect);
        self.frame.stroke(
            &Path::rectangle(top_left, size),
            Stroke::default()
                .with_color(color)
                .with_width(self.transform.length(width)),
        );
    }

    fn stroke_polyline(&mut self, points: &[Point], color: Color, width: f32) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };

        let transform = self.transform;
        let path = Path::new(|builder| {
            builder.move_to(transform.point(*first));
            for p in rest {
                builder.line_to(transform.point(*p));
            }
        });

        self.frame.stroke(
            &path,
            Stroke::default()
                .with_color(color)
                .with_width(transform.length(width)),
        );
    }

    fn fill_rect(&mut self, rect: Rectangle, color: Color) {
        let (top_left, size) = self.transform.rect(rect);
        self.frame.fill_rectangle(top_left, size, color);
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        let circle = Path::circle(self.transform.point(center), self.transform.length(radius));
        self.frame.fill(&circle, color);
    }
}
