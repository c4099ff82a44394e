use iced::alignment;
use iced::mouse::{self, Cursor};
use iced::touch;
use iced::widget::canvas::{self, Frame, Geometry, Path, Program, Text};
use iced::{Color, Pixels, Point, Rectangle, Renderer, Size, Theme};

use super::fit;
use crate::state::data::DisplayImage;
use crate::Message;

/// Width of the vertical boundary line
const HANDLE_WIDTH: f32 = 4.0;
/// Radius of the round grip in the middle of the line
const KNOB_RADIUS: f32 = 16.0;
/// Horizontal distance from the line that still counts as grabbing it
const HANDLE_GRAB_RADIUS: f32 = KNOB_RADIUS;

const BACKGROUND: Color = Color::from_rgb(0.06, 0.09, 0.16);
const LABEL_PADDING: f32 = 16.0;

/// Position of the reveal boundary, in percent of the widget width from the left edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderPosition(f32);

impl SliderPosition {
    pub const DEFAULT: f32 = 50.0;

    /// Clamp any value into [0, 100]
    pub fn new(percent: f32) -> Self {
        if percent.is_nan() {
            return Self::default();
        }
        Self(percent.clamp(0.0, 100.0))
    }

    /// Position for a pointer at absolute `x` over a widget spanning `left..left + width`
    ///
    /// Pointers outside the widget clamp to the nearest edge. Returns `None`
    /// when the widget has no width.
    pub fn from_pointer(x: f32, left: f32, width: f32) -> Option<Self> {
        if !(width > 0.0) {
            return None;
        }
        let percent = (x - left) / width * 100.0;
        if percent.is_nan() {
            return None;
        }
        Some(Self::new(percent))
    }

    pub fn percent(self) -> f32 {
        self.0
    }
}

impl Default for SliderPosition {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Input device driving a drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pointer {
    Mouse,
    Finger(touch::Finger),
}

/// An active drag, held from pointer-down until pointer-up or cancel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Grab {
    pointer: Pointer,
}

/// Interaction state of one mounted comparison
///
/// Lives in the widget tree, so it starts over (boundary at 50%, no grab)
/// every time a comparison is mounted and any grab is dropped with it on
/// teardown.
#[derive(Debug, Default)]
pub struct SliderState {
    position: SliderPosition,
    grab: Option<Grab>,
}

impl SliderState {
    pub fn position(&self) -> SliderPosition {
        self.position
    }

    pub fn is_tracking(&self) -> bool {
        self.grab.is_some()
    }

    /// Start tracking `pointer`; a second pointer never steals an active grab
    fn grab(&mut self, pointer: Pointer) -> bool {
        if self.grab.is_some() {
            return false;
        }
        self.grab = Some(Grab { pointer });
        true
    }

    /// Follow the grabbing pointer to absolute `x`
    fn track(&mut self, pointer: Pointer, x: f32, bounds: Rectangle) -> bool {
        match self.grab {
            Some(grab) if grab.pointer == pointer => {
                if let Some(position) = SliderPosition::from_pointer(x, bounds.x, bounds.width) {
                    self.position = position;
                }
                true
            }
            _ => false,
        }
    }

    /// End the grab held by `pointer`
    fn release(&mut self, pointer: Pointer) -> bool {
        match self.grab {
            Some(grab) if grab.pointer == pointer => {
                self.grab = None;
                true
            }
            _ => false,
        }
    }

    /// Absolute x coordinate of the boundary inside `bounds`
    fn boundary_x(&self, bounds: Rectangle) -> f32 {
        bounds.x + bounds.width * self.position.percent() / 100.0
    }

    fn is_over_handle(&self, bounds: Rectangle, point: Point) -> bool {
        bounds.contains(point) && (point.x - self.boundary_x(bounds)).abs() <= HANDLE_GRAB_RADIUS
    }
}

/// Before/after comparison of the original and the processed photo
///
/// The processed photo fills the widget; the original is drawn on top,
/// clipped to the left of the boundary.
#[derive(Debug, Clone)]
pub struct Comparison {
    original: DisplayImage,
    processed: DisplayImage,
}

impl Comparison {
    pub fn new(original: DisplayImage, processed: DisplayImage) -> Self {
        Self { original, processed }
    }
}

impl Program<Message> for Comparison {
    type State = SliderState;

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        // Moves and releases are handled wherever the pointer is, so a drag
        // keeps working after leaving the widget.
        let handled = match event {
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => cursor
                .position()
                .is_some_and(|pos| state.is_over_handle(bounds, pos) && state.grab(Pointer::Mouse)),
            canvas::Event::Mouse(mouse::Event::CursorMoved { position }) => {
                state.track(Pointer::Mouse, position.x, bounds)
            }
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left))
            | canvas::Event::Mouse(mouse::Event::CursorLeft) => state.release(Pointer::Mouse),

            canvas::Event::Touch(touch::Event::FingerPressed { id, position }) => {
                state.is_over_handle(bounds, position) && state.grab(Pointer::Finger(id))
            }
            canvas::Event::Touch(touch::Event::FingerMoved { id, position }) => {
                state.track(Pointer::Finger(id), position.x, bounds)
            }
            canvas::Event::Touch(touch::Event::FingerLifted { id, .. })
            | canvas::Event::Touch(touch::Event::FingerLost { id, .. }) => {
                state.release(Pointer::Finger(id))
            }
            _ => false,
        };

        if handled {
            (canvas::event::Status::Captured, None)
        } else {
            (canvas::event::Status::Ignored, None)
        }
    }

    fn draw(
        &self,
        state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let size = bounds.size();

        frame.fill_rectangle(Point::ORIGIN, size, BACKGROUND);

        // Both layers are fitted into the same bounds so the clip edge lines up
        let processed = fit::contain(Size::new(self.processed.width, self.processed.height), size);
        frame.draw_image(processed, canvas::Image::new(self.processed.handle.clone()));

        let boundary = size.width * state.position().percent() / 100.0;
        frame.with_clip(
            Rectangle::new(Point::ORIGIN, Size::new(boundary, size.height)),
            |frame| {
                let original =
                    fit::contain(Size::new(self.original.width, self.original.height), size);
                frame.draw_image(original, canvas::Image::new(self.original.handle.clone()));
            },
        );

        // Handle
        frame.fill_rectangle(
            Point::new(boundary - HANDLE_WIDTH / 2.0, 0.0),
            Size::new(HANDLE_WIDTH, size.height),
            Color::WHITE,
        );
        let center = Point::new(boundary, size.height / 2.0);
        frame.fill(&Path::circle(center, KNOB_RADIUS), Color::WHITE);
        frame.fill_text(Text {
            content: "◂ ▸".to_string(),
            position: center,
            color: Color::from_rgb(0.12, 0.16, 0.23),
            size: Pixels(14.0),
            horizontal_alignment: alignment::Horizontal::Center,
            vertical_alignment: alignment::Vertical::Center,
            ..Text::default()
        });

        // Labels
        frame.fill_text(Text {
            content: "Original".to_string(),
            position: Point::new(LABEL_PADDING, LABEL_PADDING),
            color: Color::WHITE,
            size: Pixels(13.0),
            ..Text::default()
        });
        frame.fill_text(Text {
            content: "Depth Effect".to_string(),
            position: Point::new(size.width - LABEL_PADDING, LABEL_PADDING),
            color: Color::from_rgb(0.65, 0.68, 1.0),
            size: Pixels(13.0),
            horizontal_alignment: alignment::Horizontal::Right,
            ..Text::default()
        });

        vec![frame.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        let hovering = cursor
            .position()
            .is_some_and(|pos| state.is_over_handle(bounds, pos));

        if state.is_tracking() || hovering {
            mouse::Interaction::ResizingHorizontally
        } else {
            mouse::Interaction::default()
        }
    }
}
