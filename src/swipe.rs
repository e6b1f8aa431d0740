//! Horizontal swipe navigation between months.
//!
//! The month strip is idle until a touch starts, follows the finger while
//! dragging and settles either back to its rest position or one full width
//! to the side, in which case the displayed month changes once the settle
//! animation completes.

use std::time::Duration;

/// Horizontal movement before a touch counts as a drag.
pub const DRAG_THRESHOLD: f32 = 5.0;

pub const SETTLE_DURATION: Duration = Duration::from_millis(300);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Previous,
    Next,
}

impl Step {
    pub fn months(self) -> i32 {
        match self {
            Step::Previous => -1,
            Step::Next => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SwipeState {
    Idle,
    Dragging { start_x: f32, offset: f32 },
    Settling { target: f32, step: Option<Step> },
}

#[derive(Clone, Copy, Debug)]
pub struct Swipe {
    state: SwipeState,
    did_drag: bool,
}

impl Default for Swipe {
    fn default() -> Self {
        Swipe {
            state: SwipeState::Idle,
            did_drag: false,
        }
    }
}

impl Swipe {
    pub fn state(&self) -> SwipeState {
        self.state
    }

    /// Current horizontal displacement of the month strip.
    pub fn offset(&self) -> f32 {
        match self.state {
            SwipeState::Idle => 0.0,
            SwipeState::Dragging { offset, .. } => offset,
            SwipeState::Settling { target, .. } => target,
        }
    }

    /// True while a committed month change is animating.
    pub fn is_animating(&self) -> bool {
        matches!(self.state, SwipeState::Settling { step: Some(_), .. })
    }

    /// Time to wait before calling [`Swipe::transition_end`]. `None`
    /// unless settling.
    pub fn settle_duration(&self) -> Option<Duration> {
        match self.state {
            SwipeState::Settling { .. } => Some(SETTLE_DURATION),
            _ => None,
        }
    }

    /// A tap right after a drag must not select a day.
    pub fn did_drag(&self) -> bool {
        self.did_drag
    }

    pub fn touch_start(&mut self, x: f32) {
        if self.is_animating() {
            return;
        }

        self.did_drag = false;
        self.state = SwipeState::Dragging {
            start_x: x,
            offset: 0.0,
        };
    }

    pub fn touch_move(&mut self, x: f32) {
        if let SwipeState::Dragging { start_x, offset } = self.state {
            let delta = x - start_x;
            if !self.did_drag && delta.abs() > DRAG_THRESHOLD {
                self.did_drag = true;
            }

            self.state = SwipeState::Dragging {
                start_x,
                offset: if self.did_drag { delta } else { offset },
            };
        }
    }

    /// Releases the strip. Past a quarter of `width` it settles onto the
    /// neighbouring month, otherwise it snaps back.
    pub fn touch_end(&mut self, width: f32) {
        if let SwipeState::Dragging { offset, .. } = self.state {
            self.state = if offset.abs() > width / 4.0 {
                if offset < 0.0 {
                    SwipeState::Settling {
                        target: -width,
                        step: Some(Step::Next),
                    }
                } else {
                    SwipeState::Settling {
                        target: width,
                        step: Some(Step::Previous),
                    }
                }
            } else {
                SwipeState::Settling {
                    target: 0.0,
                    step: None,
                }
            };
        }
    }

    /// Called when the settle animation completes. Yields the month step to
    /// apply, if any.
    pub fn transition_end(&mut self) -> Option<Step> {
        match self.state {
            SwipeState::Settling { step, .. } => {
                self.state = SwipeState::Idle;
                step
            }
            _ => None,
        }
    }
}
