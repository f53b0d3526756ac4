//! CSS-like cubic Bézier easing curves.

use serde::{Deserialize, Serialize};

/// A cubic Bézier timing curve with endpoints fixed at `(0,0)` and `(1,1)`,
/// as in CSS `cubic-bezier(x1, y1, x2, y2)`.
///
/// Control x-coordinates must lie in `[0, 1]` for the curve to be a function
/// of time; every curve built from the presets below is also monotonic in
/// its output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    // Polynomial coefficients of x(t) and y(t): ((a*t + b)*t + c)*t.
    ax: f64,
    bx: f64,
    cx: f64,
    ay: f64,
    by: f64,
    cy: f64,
}

impl CubicBezier {
    /// CSS `ease`.
    pub fn ease() -> Self {
        Self::new(0.25, 0.10, 0.25, 1.00)
    }

    /// CSS `ease-out`.
    pub fn ease_out() -> Self {
        Self::new(0.0, 0.0, 0.58, 1.0)
    }

    /// CSS `ease-in-out`.
    pub fn ease_in_out() -> Self {
        Self::new(0.42, 0.0, 0.58, 1.0)
    }

    /// A straight line; `sample(u) == u`.
    pub fn linear() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let cx = 3.0 * x1;
        let bx = 3.0 * (x2 - x1) - cx;
        let ax = 1.0 - cx - bx;
        let cy = 3.0 * y1;
        let by = 3.0 * (y2 - y1) - cy;
        let ay = 1.0 - cy - by;
        Self {
            ax,
            bx,
            cx,
            ay,
            by,
            cy,
        }
    }

    /// Eased progress for normalised time `u` (clamped to `[0, 1]`).
    ///
    /// The endpoints are exact: `sample(0.0) == 0.0` and `sample(1.0) == 1.0`.
    pub fn sample(&self, u: f64) -> f64 {
        let u = u.clamp(0.0, 1.0);
        if u <= 0.0 {
            return 0.0;
        }
        if u >= 1.0 {
            return 1.0;
        }
        let t = self.solve_t_for_x(u);
        (((self.ay * t + self.by) * t + self.cy) * t).clamp(0.0, 1.0)
    }

    /// Interpolate between `a` and `b` along the curve.
    pub fn interpolate(&self, a: f64, b: f64, u: f64) -> f64 {
        a + (b - a) * self.sample(u)
    }

    fn x_at(&self, t: f64) -> f64 {
        ((self.ax * t + self.bx) * t + self.cx) * t
    }

    // Solve x(t) = u for t in [0,1].
    fn solve_t_for_x(&self, u: f64) -> f64 {
        // Newton-Raphson
        let mut t = u;
        for _ in 0..8 {
            let x = self.x_at(t) - u;
            if x.abs() < 1e-9 {
                return t;
            }
            let dx = (3.0 * self.ax * t + 2.0 * self.bx) * t + self.cx;
            if dx.abs() < 1e-9 {
                break;
            }
            t -= x / dx;
            if !(0.0..=1.0).contains(&t) {
                break;
            }
        }

        // Bisection fallback
        let mut lo = 0.0;
        let mut hi = 1.0;
        t = u;
        for _ in 0..48 {
            let x = self.x_at(t);
            if (x - u).abs() < 1e-10 {
                return t;
            }
            if x < u {
                lo = t;
            } else {
                hi = t;
            }
            t = 0.5 * (lo + hi);
        }
        t
    }
}

/// Named easing presets selectable from the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    #[default]
    Ease,
    EaseOut,
    EaseInOut,
}

impl Easing {
    pub fn curve(self) -> CubicBezier {
        match self {
            Easing::Linear => CubicBezier::linear(),
            Easing::Ease => CubicBezier::ease(),
            Easing::EaseOut => CubicBezier::ease_out(),
            Easing::EaseInOut => CubicBezier::ease_in_out(),
        }
    }
}
