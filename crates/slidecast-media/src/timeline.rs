//! The slideshow animation timeline.
//!
//! A virtual-clock state machine over the current image index and the
//! cross-fade progress. The render cadence (60 Hz) is independent of the
//! capture rate: the capture loop asks for the frame plan at each capture
//! timestamp and the timeline consumes however many render ticks fit.

/// Render cadence of the animation loop (ticks per second).
const RENDER_HZ: f64 = 60.0;

/// Cross-fade window in seconds.
pub const TRANSITION_SECS: f64 = 0.5;

/// What to draw for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePlan {
    /// Fully drawn image
    pub base_index: usize,
    /// Incoming image and its transition progress in [0, 1), drawn on top
    /// at opacity `1 - progress`
    pub incoming: Option<(usize, f64)>,
    /// All images have been shown
    pub finished: bool,
}

/// Timeline state machine.
#[derive(Debug, Clone)]
pub struct Animation {
    image_count: usize,
    per_image_secs: f64,
    transition_secs: f64,
    render_interval: f64,
    clock: f64,
    current_index: usize,
    /// 1.0 means settled on the current image
    transition_progress: f64,
    finished: bool,
}

impl Animation {
    /// Per-image display duration is `total_secs / image_count`.
    pub fn new(image_count: usize, total_secs: f64) -> Self {
        debug_assert!(image_count > 0);
        Self {
            image_count,
            per_image_secs: total_secs / image_count as f64,
            transition_secs: TRANSITION_SECS,
            render_interval: 1.0 / RENDER_HZ,
            clock: 0.0,
            current_index: 0,
            transition_progress: 1.0,
            finished: false,
        }
    }

    pub fn per_image_secs(&self) -> f64 {
        self.per_image_secs
    }

    /// Seconds at which the last image has been fully displayed.
    pub fn end_secs(&self) -> f64 {
        self.per_image_secs * self.image_count as f64
    }

    /// Consume render ticks up to virtual time `t` and return the plan.
    pub fn advance_to(&mut self, t: f64) -> FramePlan {
        while !self.finished && self.clock + self.render_interval <= t {
            self.tick();
        }
        self.plan()
    }

    /// One 60 Hz render tick.
    fn tick(&mut self) {
        self.clock += self.render_interval;

        let expected = (self.clock / self.per_image_secs) as usize;
        if expected > self.current_index {
            if expected >= self.image_count {
                self.finished = true;
                self.current_index = self.image_count - 1;
                self.transition_progress = 1.0;
                return;
            }
            // Image change: restart the cross-fade
            self.current_index = expected;
            self.transition_progress = 0.0;
            return;
        }

        if self.transition_progress < 1.0 {
            self.transition_progress =
                (self.transition_progress + self.render_interval / self.transition_secs).min(1.0);
        }
    }

    fn plan(&self) -> FramePlan {
        if self.finished {
            return FramePlan {
                base_index: self.image_count - 1,
                incoming: None,
                finished: true,
            };
        }
        if self.transition_progress < 1.0 && self.current_index > 0 {
            FramePlan {
                base_index: self.current_index - 1,
                incoming: Some((self.current_index, self.transition_progress)),
                finished: false,
            }
        } else {
            FramePlan {
                base_index: self.current_index,
                incoming: None,
                finished: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_image_shows_without_transition() {
        let mut animation = Animation::new(4, 8.0);
        let plan = animation.advance_to(1.0);
        assert_eq!(plan.base_index, 0);
        assert!(plan.incoming.is_none());
        assert!(!plan.finished);
    }

    #[test]
    fn test_cross_fade_at_image_boundary() {
        let mut animation = Animation::new(4, 8.0);
        // per-image 2.0s; just after the first boundary the fade is active
        let plan = animation.advance_to(2.1);
        assert_eq!(plan.base_index, 0);
        let (incoming, progress) = plan.incoming.unwrap();
        assert_eq!(incoming, 1);
        // ~0.1s of 60Hz ticks at 1/(60*0.5) progress each
        assert!(progress > 0.1 && progress < 0.3, "progress {progress}");
    }

    #[test]
    fn test_transition_settles_after_window() {
        let mut animation = Animation::new(4, 8.0);
        let plan = animation.advance_to(2.0 + TRANSITION_SECS + 0.1);
        assert_eq!(plan.base_index, 1);
        assert!(plan.incoming.is_none());
    }

    #[test]
    fn test_progress_rate_is_frame_interval_over_window() {
        let mut animation = Animation::new(2, 4.0);
        animation.advance_to(2.0);
        // Exactly 0.25s into the fade: progress = 0.25 / 0.5
        let plan = animation.advance_to(2.25);
        let (_, progress) = plan.incoming.unwrap();
        assert!((progress - 0.5).abs() < 0.05, "progress {progress}");
    }

    #[test]
    fn test_finishes_when_last_image_elapses() {
        let mut animation = Animation::new(3, 6.0);
        assert!(!animation.advance_to(5.9).finished);
        let plan = animation.advance_to(6.05);
        assert!(plan.finished);
        assert_eq!(plan.base_index, 2);

        // Finished is terminal
        let plan = animation.advance_to(10.0);
        assert!(plan.finished);
    }

    #[test]
    fn test_coarse_sampling_skips_to_latest_image() {
        let mut animation = Animation::new(4, 8.0);
        // A single coarse jump across two boundaries lands on image 2
        let plan = animation.advance_to(5.0);
        assert!(plan.base_index == 2 || matches!(plan.incoming, Some((2, _))));
    }

    #[test]
    fn test_single_image_never_transitions() {
        let mut animation = Animation::new(1, 3.0);
        let plan = animation.advance_to(2.9);
        assert_eq!(plan.base_index, 0);
        assert!(plan.incoming.is_none());
        assert!(animation.advance_to(3.1).finished);
    }
}
