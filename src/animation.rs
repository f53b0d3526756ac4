//! Time-driven interpolation primitives.
//!
//! A [`Transition`] interpolates one scalar between a start and a target
//! value over a fixed duration.  [`ScaleAnimation`] bundles the four scalars
//! of a window's scale transform into one transition group: they share a
//! nominal duration but each can be restarted without disturbing the
//! others.
//!
//! Time is passed in explicitly as a [`Duration`] measured from an
//! arbitrary epoch (the host's monotonic clock), so every sample is a pure
//! function of `now` and tests can step time deterministically.

use crate::bezier::CubicBezier;
use std::time::Duration;

/// The transform the host applies to a window while it is scaled.
///
/// Scaling happens about the centre of the window's untransformed geometry,
/// then the translation is added.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub translation_x: f64,
    pub translation_y: f64,
    pub alpha: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        scale_x: 1.0,
        scale_y: 1.0,
        translation_x: 0.0,
        translation_y: 0.0,
        alpha: 1.0,
    };

    /// Where a window with untransformed geometry `geometry` ends up on
    /// screen under this transform.
    pub fn apply_to(&self, geometry: &crate::command::Rect) -> crate::command::Rect {
        let center = geometry.center();
        let width = geometry.width * self.scale_x;
        let height = geometry.height * self.scale_y;
        crate::command::Rect::new(
            center.x + self.translation_x - width / 2.0,
            center.y + self.translation_y - height / 2.0,
            width,
            height,
        )
    }

    /// Whether this is the identity placement (opacity ignored).
    pub fn is_identity_placement(&self) -> bool {
        self.scale_x == 1.0
            && self.scale_y == 1.0
            && self.translation_x == 0.0
            && self.translation_y == 0.0
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Interpolation of a single scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    from: f64,
    to: f64,
    started_at: Duration,
    duration: Duration,
    curve: CubicBezier,
}

impl Transition {
    /// A transition that has already finished at `value`.
    pub fn settled(value: f64) -> Self {
        Self {
            from: value,
            to: value,
            started_at: Duration::ZERO,
            duration: Duration::ZERO,
            curve: CubicBezier::ease(),
        }
    }

    /// Restart the interpolation from `from` to `to`, beginning at `now`.
    pub fn start(&mut self, now: Duration, from: f64, to: f64, duration: Duration, curve: CubicBezier) {
        self.from = from;
        self.to = to;
        self.started_at = now;
        self.duration = duration;
        self.curve = curve;
    }

    /// Redirect towards `to`, starting from the value currently displayed so
    /// an in-flight animation never snaps.
    pub fn retarget(&mut self, now: Duration, to: f64, duration: Duration, curve: CubicBezier) {
        let from = self.sample(now);
        self.start(now, from, to, duration, curve);
    }

    /// Normalised progress in `[0, 1]`.  A zero duration is always complete.
    pub fn progress(&self, now: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Interpolated value at `now`.  Pinned to exactly the target once the
    /// duration has elapsed.
    pub fn sample(&self, now: Duration) -> f64 {
        let p = self.progress(now);
        if p >= 1.0 {
            return self.to;
        }
        self.curve.interpolate(self.from, self.to, p)
    }

    pub fn is_running(&self, now: Duration) -> bool {
        self.progress(now) < 1.0
    }

    /// The value this transition is heading towards.
    pub fn target(&self) -> f64 {
        self.to
    }
}

/// The transition group driving a window's scale and translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleAnimation {
    pub scale_x: Transition,
    pub scale_y: Transition,
    pub translation_x: Transition,
    pub translation_y: Transition,
}

impl ScaleAnimation {
    /// A settled group resting at `at`'s scale and translation.
    pub fn new(at: &Transform) -> Self {
        Self {
            scale_x: Transition::settled(at.scale_x),
            scale_y: Transition::settled(at.scale_y),
            translation_x: Transition::settled(at.translation_x),
            translation_y: Transition::settled(at.translation_y),
        }
    }

    /// Retarget every member towards `target` (alpha is ignored).
    pub fn animate_to(&mut self, now: Duration, target: &Transform, duration: Duration, curve: CubicBezier) {
        self.scale_x.retarget(now, target.scale_x, duration, curve);
        self.scale_y.retarget(now, target.scale_y, duration, curve);
        self.translation_x
            .retarget(now, target.translation_x, duration, curve);
        self.translation_y
            .retarget(now, target.translation_y, duration, curve);
    }

    /// Sample all members into a transform carrying `alpha`.
    pub fn sample(&self, now: Duration, alpha: f64) -> Transform {
        Transform {
            scale_x: self.scale_x.sample(now),
            scale_y: self.scale_y.sample(now),
            translation_x: self.translation_x.sample(now),
            translation_y: self.translation_y.sample(now),
            alpha,
        }
    }

    /// The transform the group is heading towards.
    pub fn target(&self, alpha: f64) -> Transform {
        Transform {
            scale_x: self.scale_x.target(),
            scale_y: self.scale_y.target(),
            translation_x: self.translation_x.target(),
            translation_y: self.translation_y.target(),
            alpha,
        }
    }

    pub fn is_running(&self, now: Duration) -> bool {
        self.scale_x.is_running(now)
            || self.scale_y.is_running(now)
            || self.translation_x.is_running(now)
            || self.translation_y.is_running(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Rect;

    const MS_100: Duration = Duration::from_millis(100);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn settled_transition_is_not_running() {
        let t = Transition::settled(3.0);
        assert!(!t.is_running(ms(0)));
        assert_eq!(t.sample(ms(0)), 3.0);
    }

    #[test]
    fn sample_pins_to_target_after_duration() {
        let mut t = Transition::settled(0.0);
        t.start(ms(1000), 0.0, 10.0, MS_100, CubicBezier::ease());
        assert!(t.is_running(ms(1050)));
        assert_eq!(t.sample(ms(1100)), 10.0);
        assert_eq!(t.sample(ms(5000)), 10.0);
        assert!(!t.is_running(ms(1100)));
    }

    #[test]
    fn sample_before_start_returns_origin() {
        let mut t = Transition::settled(0.0);
        t.start(ms(1000), 2.0, 10.0, MS_100, CubicBezier::linear());
        assert_eq!(t.sample(ms(500)), 2.0);
    }

    #[test]
    fn values_move_monotonically_towards_target() {
        let mut t = Transition::settled(0.0);
        t.start(ms(0), 5.0, -5.0, ms(300), CubicBezier::ease_in_out());
        let mut prev = t.sample(ms(0));
        for step in 1..=30 {
            let v = t.sample(ms(step * 10));
            assert!(v <= prev + 1e-9, "value went backwards at step {step}");
            prev = v;
        }
        assert_eq!(prev, -5.0);
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let mut t = Transition::settled(0.0);
        t.start(ms(10), 0.0, 1.0, Duration::ZERO, CubicBezier::ease());
        assert!(!t.is_running(ms(10)));
        assert_eq!(t.sample(ms(10)), 1.0);
    }

    #[test]
    fn retarget_starts_from_current_sample() {
        let mut t = Transition::settled(0.0);
        t.start(ms(0), 0.0, 100.0, MS_100, CubicBezier::linear());
        let midway = t.sample(ms(50));
        t.retarget(ms(50), 0.0, MS_100, CubicBezier::linear());
        assert!((t.sample(ms(50)) - midway).abs() < 1e-9, "retarget must not snap");
        assert!(t.is_running(ms(100)));
        assert_eq!(t.sample(ms(150)), 0.0);
    }

    #[test]
    fn group_members_progress_independently() {
        let mut group = ScaleAnimation::new(&Transform::IDENTITY);
        let target = Transform {
            scale_x: 0.5,
            scale_y: 0.5,
            translation_x: 40.0,
            translation_y: -20.0,
            alpha: 1.0,
        };
        group.animate_to(ms(0), &target, MS_100, CubicBezier::linear());
        // Restart just one member halfway through.
        group
            .translation_x
            .retarget(ms(50), 80.0, MS_100, CubicBezier::linear());
        assert!(group.is_running(ms(120)));
        let at_100 = group.sample(ms(100), 1.0);
        assert_eq!(at_100.scale_x, 0.5);
        assert_eq!(at_100.translation_y, -20.0);
        assert!(at_100.translation_x < 80.0);
        assert!(!group.is_running(ms(150)));
        assert_eq!(group.sample(ms(150), 1.0).translation_x, 80.0);
    }

    #[test]
    fn transform_scales_about_centre() {
        let g = Rect::new(100.0, 100.0, 200.0, 100.0);
        let t = Transform {
            scale_x: 0.5,
            scale_y: 0.5,
            translation_x: 10.0,
            translation_y: 0.0,
            alpha: 1.0,
        };
        let shown = t.apply_to(&g);
        assert_eq!(shown, Rect::new(160.0, 125.0, 100.0, 50.0));
        assert_eq!(Transform::IDENTITY.apply_to(&g), g);
    }
}
