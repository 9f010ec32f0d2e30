// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pointer and box interaction state machine.
//!
//! The canvas translates raw egui input into [`PointerEvent`]s expressed in
//! natural image pixels. This module turns those events into prompt sets
//! without knowing anything about rendering, so every transition can be
//! driven directly from tests.

use crate::models::prompt::{BoxPrompt, PointPrompt, PromptSet};
use std::time::{Duration, Instant};

/// How pointer input is turned into prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Every (throttled) pointer move becomes a single positive point.
    #[default]
    Hover,
    /// Press, drag and release to commit a bounding box.
    Box,
}

/// Discrete pointer input in natural image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Moved(f32, f32),
    Pressed(f32, f32),
    Released(f32, f32),
    /// Pointer left the image area.
    Left,
}

/// What the application should do after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome {
    None,
    /// Replace the shared prompt set and run inference.
    Prompt(PromptSet),
    /// Drop the current mask and prompts.
    ClearMask,
}

/// Rate limiter for hover moves.
///
/// The first call passes, later calls pass only once `interval` has
/// elapsed since the last admitted one. Rejected moves are not lost:
/// [`Interaction`] keeps the latest one and flushes it when it is due.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    pub fn admit(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Time left until the next call would be admitted.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last {
            Some(last) => self.interval.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// In-progress box drag.
#[derive(Debug, Clone, Copy)]
struct Drag {
    start: (f32, f32),
    current: (f32, f32),
}

/// Pointer interaction state.
#[derive(Debug, Clone)]
pub struct Interaction {
    mode: Mode,
    drag: Option<Drag>,
    throttle: Throttle,
    /// Latest hover position the throttle held back
    pending_hover: Option<(f32, f32)>,
}

impl Interaction {
    pub fn new(hover_interval: Duration) -> Self {
        Self {
            mode: Mode::Hover,
            drag: None,
            throttle: Throttle::new(hover_interval),
            pending_hover: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch modes, discarding any uncommitted drag.
    ///
    /// Returns `false` when `mode` is already active.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        self.drag = None;
        self.pending_hover = None;
        self.throttle.reset();
        log::info!("Switched interaction mode to {:?}", mode);
        true
    }

    pub fn is_drawing(&self) -> bool {
        self.drag.is_some()
    }

    /// Live rectangle of the drag in progress, never committed to shared state.
    pub fn preview(&self) -> Option<BoxPrompt> {
        self.drag
            .map(|drag| BoxPrompt::from_corners(drag.start, drag.current))
    }

    pub fn cancel_drawing(&mut self) {
        if self.drag.take().is_some() {
            log::debug!("Cancelled box drawing");
        }
    }

    /// Forget the drag and any held-back hover move, e.g. when the image changes.
    pub fn reset(&mut self) {
        self.drag = None;
        self.pending_hover = None;
        self.throttle.reset();
    }

    /// Time until a held-back hover move is due, if one is waiting.
    pub fn pending_flush_in(&self, now: Instant) -> Option<Duration> {
        self.pending_hover.map(|_| self.throttle.remaining(now))
    }

    /// Emit the last held-back hover move once the throttle interval has passed.
    pub fn flush(&mut self, now: Instant) -> InteractionOutcome {
        match self.pending_hover {
            Some((x, y)) if self.mode == Mode::Hover && self.throttle.admit(now) => {
                self.pending_hover = None;
                hover_prompt(x, y)
            }
            _ => InteractionOutcome::None,
        }
    }

    /// Feed one pointer event through the state machine.
    pub fn handle(&mut self, event: PointerEvent, now: Instant) -> InteractionOutcome {
        match self.mode {
            Mode::Hover => self.handle_hover(event, now),
            Mode::Box => self.handle_box(event),
        }
    }

    fn handle_hover(&mut self, event: PointerEvent, now: Instant) -> InteractionOutcome {
        match event {
            // Touch input arrives as a press, treat it like a move
            PointerEvent::Moved(x, y) | PointerEvent::Pressed(x, y) => {
                if !self.throttle.admit(now) {
                    self.pending_hover = Some((x, y));
                    return InteractionOutcome::None;
                }
                self.pending_hover = None;
                hover_prompt(x, y)
            }
            PointerEvent::Released(..) => InteractionOutcome::None,
            PointerEvent::Left => {
                self.pending_hover = None;
                self.throttle.reset();
                InteractionOutcome::ClearMask
            }
        }
    }

    fn handle_box(&mut self, event: PointerEvent) -> InteractionOutcome {
        match event {
            PointerEvent::Pressed(x, y) => {
                self.drag = Some(Drag {
                    start: (x, y),
                    current: (x, y),
                });
                InteractionOutcome::None
            }
            PointerEvent::Moved(x, y) => {
                if let Some(ref mut drag) = self.drag {
                    drag.current = (x, y);
                }
                InteractionOutcome::None
            }
            PointerEvent::Released(x, y) => match self.drag.take() {
                Some(drag) => {
                    let committed = BoxPrompt::from_corners(drag.start, (x, y));
                    log::info!(
                        "Committed box at ({:.1}, {:.1}) size {:.1}x{:.1}",
                        committed.x,
                        committed.y,
                        committed.width,
                        committed.height
                    );
                    InteractionOutcome::Prompt(PromptSet::Box(committed))
                }
                None => InteractionOutcome::None,
            },
            // A drag may continue outside the image; egui keeps reporting it
            PointerEvent::Left => InteractionOutcome::None,
        }
    }
}

fn hover_prompt(x: f32, y: f32) -> InteractionOutcome {
    log::debug!("Hover prompt at ({:.1}, {:.1})", x, y);
    InteractionOutcome::Prompt(PromptSet::Points(vec![PointPrompt::positive(x, y)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(15);

    #[test]
    fn test_hover_emits_single_positive_point() {
        let mut interaction = Interaction::new(INTERVAL);
        let outcome = interaction.handle(PointerEvent::Moved(500.0, 500.0), Instant::now());
        assert_eq!(
            outcome,
            InteractionOutcome::Prompt(PromptSet::Points(vec![PointPrompt::positive(500.0, 500.0)]))
        );
    }

    #[test]
    fn test_hover_moves_are_throttled() {
        let mut interaction = Interaction::new(INTERVAL);
        let t0 = Instant::now();

        assert!(matches!(
            interaction.handle(PointerEvent::Moved(1.0, 1.0), t0),
            InteractionOutcome::Prompt(_)
        ));
        assert_eq!(
            interaction.handle(PointerEvent::Moved(2.0, 2.0), t0 + Duration::from_millis(5)),
            InteractionOutcome::None
        );
        assert!(matches!(
            interaction.handle(PointerEvent::Moved(3.0, 3.0), t0 + Duration::from_millis(16)),
            InteractionOutcome::Prompt(_)
        ));
    }

    #[test]
    fn test_last_throttled_move_is_flushed() {
        let mut interaction = Interaction::new(INTERVAL);
        let t0 = Instant::now();

        interaction.handle(PointerEvent::Moved(100.0, 50.0), t0);
        assert_eq!(
            interaction.handle(PointerEvent::Moved(140.0, 50.0), t0 + Duration::from_millis(8)),
            InteractionOutcome::None
        );
        assert_eq!(
            interaction.pending_flush_in(t0 + Duration::from_millis(8)),
            Some(Duration::from_millis(7))
        );

        // Not due yet
        assert_eq!(interaction.flush(t0 + Duration::from_millis(10)), InteractionOutcome::None);

        assert_eq!(
            interaction.flush(t0 + Duration::from_millis(15)),
            InteractionOutcome::Prompt(PromptSet::Points(vec![PointPrompt::positive(140.0, 50.0)]))
        );
        assert_eq!(interaction.pending_flush_in(t0 + Duration::from_millis(15)), None);
        assert_eq!(interaction.flush(t0 + Duration::from_millis(40)), InteractionOutcome::None);
    }

    #[test]
    fn test_admitted_move_supersedes_pending_one() {
        let mut interaction = Interaction::new(INTERVAL);
        let t0 = Instant::now();

        interaction.handle(PointerEvent::Moved(1.0, 1.0), t0);
        interaction.handle(PointerEvent::Moved(2.0, 2.0), t0 + Duration::from_millis(5));
        interaction.handle(PointerEvent::Moved(3.0, 3.0), t0 + Duration::from_millis(20));

        assert_eq!(interaction.pending_flush_in(t0 + Duration::from_millis(20)), None);
        assert_eq!(interaction.flush(t0 + Duration::from_millis(50)), InteractionOutcome::None);
    }

    #[test]
    fn test_leave_and_mode_switch_drop_pending_move() {
        let mut interaction = Interaction::new(INTERVAL);
        let t0 = Instant::now();

        interaction.handle(PointerEvent::Moved(1.0, 1.0), t0);
        interaction.handle(PointerEvent::Moved(2.0, 2.0), t0 + Duration::from_millis(5));
        interaction.handle(PointerEvent::Left, t0 + Duration::from_millis(6));
        assert_eq!(interaction.flush(t0 + Duration::from_millis(30)), InteractionOutcome::None);

        interaction.handle(PointerEvent::Moved(1.0, 1.0), t0 + Duration::from_millis(30));
        interaction.handle(PointerEvent::Moved(2.0, 2.0), t0 + Duration::from_millis(31));
        interaction.set_mode(Mode::Box);
        assert_eq!(interaction.pending_flush_in(t0 + Duration::from_millis(31)), None);
        assert_eq!(interaction.flush(t0 + Duration::from_millis(60)), InteractionOutcome::None);
    }

    #[test]
    fn test_hover_leave_clears_mask() {
        let mut interaction = Interaction::new(INTERVAL);
        assert_eq!(
            interaction.handle(PointerEvent::Left, Instant::now()),
            InteractionOutcome::ClearMask
        );
    }

    #[test]
    fn test_leave_resets_throttle() {
        let mut interaction = Interaction::new(INTERVAL);
        let t0 = Instant::now();
        interaction.handle(PointerEvent::Moved(1.0, 1.0), t0);
        interaction.handle(PointerEvent::Left, t0);
        assert!(matches!(
            interaction.handle(PointerEvent::Moved(2.0, 2.0), t0 + Duration::from_millis(1)),
            InteractionOutcome::Prompt(_)
        ));
    }

    #[test]
    fn test_box_drag_commits_on_release() {
        let mut interaction = Interaction::new(INTERVAL);
        interaction.set_mode(Mode::Box);
        let now = Instant::now();

        assert_eq!(interaction.handle(PointerEvent::Pressed(100.0, 100.0), now), InteractionOutcome::None);
        assert!(interaction.is_drawing());

        assert_eq!(interaction.handle(PointerEvent::Moved(200.0, 250.0), now), InteractionOutcome::None);
        assert_eq!(
            interaction.preview(),
            Some(BoxPrompt { x: 100.0, y: 100.0, width: 100.0, height: 150.0 })
        );

        let outcome = interaction.handle(PointerEvent::Released(300.0, 400.0), now);
        assert_eq!(
            outcome,
            InteractionOutcome::Prompt(PromptSet::Box(BoxPrompt {
                x: 100.0,
                y: 100.0,
                width: 200.0,
                height: 300.0
            }))
        );
        assert!(!interaction.is_drawing());
        assert_eq!(interaction.preview(), None);
    }

    #[test]
    fn test_box_moves_without_press_do_nothing() {
        let mut interaction = Interaction::new(INTERVAL);
        interaction.set_mode(Mode::Box);
        let now = Instant::now();
        assert_eq!(interaction.handle(PointerEvent::Moved(5.0, 5.0), now), InteractionOutcome::None);
        assert_eq!(interaction.handle(PointerEvent::Released(5.0, 5.0), now), InteractionOutcome::None);
    }

    #[test]
    fn test_zero_movement_drag_commits_degenerate_box() {
        let mut interaction = Interaction::new(INTERVAL);
        interaction.set_mode(Mode::Box);
        let now = Instant::now();
        interaction.handle(PointerEvent::Pressed(42.0, 24.0), now);
        match interaction.handle(PointerEvent::Released(42.0, 24.0), now) {
            InteractionOutcome::Prompt(PromptSet::Box(b)) => assert!(b.is_degenerate()),
            other => panic!("expected a box prompt, got {:?}", other),
        }
    }

    #[test]
    fn test_switching_mode_mid_draw_discards_box() {
        let mut interaction = Interaction::new(INTERVAL);
        interaction.set_mode(Mode::Box);
        let now = Instant::now();
        interaction.handle(PointerEvent::Pressed(10.0, 10.0), now);
        interaction.handle(PointerEvent::Moved(50.0, 50.0), now);

        assert!(interaction.set_mode(Mode::Hover));
        assert!(!interaction.is_drawing());

        // Releasing in hover mode must not produce a box
        assert_eq!(interaction.handle(PointerEvent::Released(50.0, 50.0), now), InteractionOutcome::None);

        // And coming back to box mode starts clean
        interaction.set_mode(Mode::Box);
        assert_eq!(interaction.handle(PointerEvent::Released(60.0, 60.0), now), InteractionOutcome::None);
    }

    #[test]
    fn test_set_same_mode_is_noop() {
        let mut interaction = Interaction::new(INTERVAL);
        assert!(!interaction.set_mode(Mode::Hover));
        assert!(interaction.set_mode(Mode::Box));
        assert!(!interaction.set_mode(Mode::Box));
    }

    #[test]
    fn test_leave_during_drag_keeps_drawing() {
        let mut interaction = Interaction::new(INTERVAL);
        interaction.set_mode(Mode::Box);
        let now = Instant::now();
        interaction.handle(PointerEvent::Pressed(10.0, 10.0), now);
        assert_eq!(interaction.handle(PointerEvent::Left, now), InteractionOutcome::None);
        assert!(interaction.is_drawing());
    }

    #[test]
    fn test_cancel_drawing() {
        let mut interaction = Interaction::new(INTERVAL);
        interaction.set_mode(Mode::Box);
        interaction.handle(PointerEvent::Pressed(10.0, 10.0), Instant::now());
        interaction.cancel_drawing();
        assert!(interaction.preview().is_none());
    }

    #[test]
    fn test_throttle_zero_interval_admits_everything() {
        let mut throttle = Throttle::new(Duration::ZERO);
        let now = Instant::now();
        assert!(throttle.admit(now));
        assert!(throttle.admit(now));
    }
}
