//! Pure drag-selection state machine.
//!
//! The machine consumes pointer and cancel events in overlay-local
//! coordinates and settles into one of two terminal phases: a committed
//! rectangle or a cancellation. It owns no window or timing concerns, so
//! every path through it can be exercised headlessly.

use crate::util::{Point, Rect};

/// Drags this small in either direction are treated as accidental clicks.
pub const MIN_COMMIT_EXTENT: i32 = 5;

/// One input to the selection machine, in overlay-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    /// Primary button pressed; starts a drag at the anchor point.
    PointerDown(Point),
    /// Pointer moved while the button is held.
    PointerMove(Point),
    /// Primary button released; ends the drag.
    PointerUp(Point),
    /// User abandoned the selection (Escape, window closed).
    Cancel,
}

/// Where the machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    /// Waiting for the first button press.
    Idle,
    /// Button held; a live rectangle follows the pointer.
    Dragging,
    /// Terminal: the user committed this overlay-local rectangle.
    Committed(Rect),
    /// Terminal: no capture should happen.
    Cancelled,
}

/// Selection machine state. Terminal phases absorb all further events.
#[derive(Debug)]
pub struct SelectionState {
    phase: SelectionPhase,
    anchor: Option<Point>,
    pointer: Option<Point>,
    needs_redraw: bool,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionState {
    pub fn new() -> Self {
        Self {
            phase: SelectionPhase::Idle,
            anchor: None,
            pointer: None,
            // The first frame must paint the dimmed desktop.
            needs_redraw: true,
        }
    }

    pub fn phase(&self) -> SelectionPhase {
        self.phase
    }

    /// True once the machine reached `Committed` or `Cancelled`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.phase,
            SelectionPhase::Committed(_) | SelectionPhase::Cancelled
        )
    }

    /// The live rectangle while a drag is in progress.
    ///
    /// May have zero width or height right after the button went down;
    /// renderers filter that out before highlighting.
    pub fn drag_rect(&self) -> Option<Rect> {
        if self.phase != SelectionPhase::Dragging {
            return None;
        }
        let anchor = self.anchor?;
        let pointer = self.pointer?;
        Some(Rect::from_drag(anchor, pointer))
    }

    /// Returns whether the scene changed since the last call, and resets
    /// the flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    /// Advance the machine by one event.
    pub fn handle(&mut self, event: SelectionEvent) {
        match (self.phase, event) {
            (SelectionPhase::Idle, SelectionEvent::PointerDown(point)) => {
                self.anchor = Some(point);
                self.pointer = Some(point);
                self.phase = SelectionPhase::Dragging;
                self.needs_redraw = true;
            }
            (SelectionPhase::Dragging, SelectionEvent::PointerMove(point)) => {
                if self.pointer != Some(point) {
                    self.pointer = Some(point);
                    self.needs_redraw = true;
                }
            }
            (SelectionPhase::Dragging, SelectionEvent::PointerUp(point)) => {
                self.pointer = Some(point);
                let rect = Rect::from_drag(self.anchor.unwrap_or(point), point);
                self.phase = if rect.width > MIN_COMMIT_EXTENT && rect.height > MIN_COMMIT_EXTENT {
                    SelectionPhase::Committed(rect)
                } else {
                    SelectionPhase::Cancelled
                };
            }
            (SelectionPhase::Idle | SelectionPhase::Dragging, SelectionEvent::Cancel) => {
                self.phase = SelectionPhase::Cancelled;
            }
            // Moves and releases before the first press, presses while
            // already dragging, and anything after a terminal phase.
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn drag_commits_normalized_rect() {
        let mut machine = SelectionState::new();
        machine.handle(SelectionEvent::PointerDown(point(300, 200)));
        machine.handle(SelectionEvent::PointerMove(point(100, 120)));
        machine.handle(SelectionEvent::PointerUp(point(100, 120)));

        // Up-left drag: origin is the release point.
        assert_eq!(
            machine.phase(),
            SelectionPhase::Committed(Rect {
                x: 100,
                y: 120,
                width: 200,
                height: 80
            })
        );
        assert!(machine.is_terminal());
    }

    #[test]
    fn micro_drag_cancels_instead_of_committing() {
        let mut machine = SelectionState::new();
        machine.handle(SelectionEvent::PointerDown(point(100, 100)));
        machine.handle(SelectionEvent::PointerMove(point(102, 101)));
        machine.handle(SelectionEvent::PointerUp(point(102, 101)));

        assert_eq!(machine.phase(), SelectionPhase::Cancelled);
    }

    #[test]
    fn one_thin_dimension_cancels() {
        let mut machine = SelectionState::new();
        machine.handle(SelectionEvent::PointerDown(point(0, 0)));
        machine.handle(SelectionEvent::PointerUp(point(400, 5)));
        assert_eq!(machine.phase(), SelectionPhase::Cancelled);

        // Both extents one past the threshold commit.
        let mut machine = SelectionState::new();
        machine.handle(SelectionEvent::PointerDown(point(0, 0)));
        machine.handle(SelectionEvent::PointerUp(point(6, 6)));
        assert!(matches!(machine.phase(), SelectionPhase::Committed(_)));
    }

    #[test]
    fn escape_cancels_mid_drag() {
        let mut machine = SelectionState::new();
        machine.handle(SelectionEvent::PointerDown(point(50, 50)));
        machine.handle(SelectionEvent::PointerMove(point(400, 300)));
        machine.handle(SelectionEvent::Cancel);

        assert_eq!(machine.phase(), SelectionPhase::Cancelled);
        assert_eq!(machine.drag_rect(), None);
    }

    #[test]
    fn terminal_phases_absorb_further_events() {
        let mut machine = SelectionState::new();
        machine.handle(SelectionEvent::PointerDown(point(0, 0)));
        machine.handle(SelectionEvent::PointerUp(point(100, 100)));
        let committed = machine.phase();

        machine.handle(SelectionEvent::PointerDown(point(5, 5)));
        machine.handle(SelectionEvent::Cancel);
        assert_eq!(machine.phase(), committed);
    }

    #[test]
    fn moves_before_the_first_press_are_ignored() {
        let mut machine = SelectionState::new();
        machine.handle(SelectionEvent::PointerMove(point(10, 10)));
        machine.handle(SelectionEvent::PointerUp(point(10, 10)));

        assert_eq!(machine.phase(), SelectionPhase::Idle);
        assert_eq!(machine.drag_rect(), None);
    }

    #[test]
    fn redraw_flags_follow_pointer_changes() {
        let mut machine = SelectionState::new();
        assert!(machine.take_redraw());
        assert!(!machine.take_redraw());

        machine.handle(SelectionEvent::PointerDown(point(10, 10)));
        assert!(machine.take_redraw());

        // A move to the same spot changes nothing.
        machine.handle(SelectionEvent::PointerMove(point(10, 10)));
        assert!(!machine.take_redraw());

        machine.handle(SelectionEvent::PointerMove(point(20, 20)));
        assert!(machine.take_redraw());
    }

    #[test]
    fn live_rect_follows_the_drag() {
        let mut machine = SelectionState::new();
        machine.handle(SelectionEvent::PointerDown(point(10, 10)));
        assert_eq!(
            machine.drag_rect(),
            Some(Rect {
                x: 10,
                y: 10,
                width: 0,
                height: 0
            })
        );

        machine.handle(SelectionEvent::PointerMove(point(60, 40)));
        assert_eq!(
            machine.drag_rect(),
            Some(Rect {
                x: 10,
                y: 10,
                width: 50,
                height: 30
            })
        );
    }
}
