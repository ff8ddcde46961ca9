//! Closed camera flight path.
//!
//! A biased random walk produces the control points; a centripetal
//! Catmull-Rom spline closes them into a loop that is sampled by arc length,
//! so the camera moves at constant speed.

use glam::{DMat4, DVec3};
use rand::Rng;
use tracing::debug;

use crate::config::CameraPathParams;
use crate::error::{Result, TerrainError};

/// Spans shorter than this (in parameter spacing) fall back to unit spacing
const MIN_KNOT_SPACING: f64 = 1e-4;

/// Camera placement for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: DVec3,
    /// Point the camera looks at
    pub target: DVec3,
}

impl CameraPose {
    /// Right-handed world-to-view transform with +Y up
    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.position, self.target, DVec3::Y)
    }
}

/// Cubic segment coefficients for one axis
struct Cubic {
    c0: f64,
    c1: f64,
    c2: f64,
    c3: f64,
}

impl Cubic {
    /// Hermite form of a non-uniform Catmull-Rom span from `x1` to `x2`
    fn nonuniform_catmull_rom(
        x0: f64,
        x1: f64,
        x2: f64,
        x3: f64,
        dt0: f64,
        dt1: f64,
        dt2: f64,
    ) -> Self {
        let t1 = ((x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1) * dt1;
        let t2 = ((x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2) * dt1;

        Cubic {
            c0: x1,
            c1: t1,
            c2: -3.0 * x1 + 3.0 * x2 - 2.0 * t1 - t2,
            c3: 2.0 * x1 - 2.0 * x2 + t1 + t2,
        }
    }

    fn eval(&self, t: f64) -> f64 {
        let t2 = t * t;
        self.c0 + self.c1 * t + self.c2 * t2 + self.c3 * t2 * t
    }
}

/// Closed centripetal Catmull-Rom curve with a traversal period
#[derive(Debug, Clone)]
pub struct CameraPath {
    points: Vec<DVec3>,
    /// Cumulative chord length at evenly spaced curve parameters
    arc_lengths: Vec<f64>,
    period_seconds: f64,
    look_ahead: f64,
}

impl CameraPath {
    /// Walk a new set of control points and close them into a loop
    ///
    /// Draws two values from `rng` per walk step.
    pub fn generate<R: Rng + ?Sized>(params: &CameraPathParams, rng: &mut R) -> Result<Self> {
        let mut points = Vec::with_capacity(params.segments + 2);
        let mut x = params.start_x;
        let mut z = params.start_z;

        for _ in 0..=params.segments {
            x += (rng.r#gen::<f64>() - params.bias) * params.step;
            z += (rng.r#gen::<f64>() - params.bias) * params.step;
            points.push(DVec3::new(x, params.height, z));
        }

        // Repeat the first point so the loop seam passes through it
        points.push(points[0]);

        debug!(control_points = points.len(), "camera path walked");

        Self::from_points(
            points,
            params.period_seconds,
            params.look_ahead,
            params.arc_length_divisions,
        )
    }

    /// Build a closed path through the given control points
    ///
    /// # Arguments
    /// * `points` - Control points, visited in order and wrapped around
    /// * `period_seconds` - Time for one full loop
    /// * `look_ahead` - Curve fraction between the camera and its target
    /// * `arc_length_divisions` - Resolution of the arc-length table
    pub fn from_points(
        points: Vec<DVec3>,
        period_seconds: f64,
        look_ahead: f64,
        arc_length_divisions: usize,
    ) -> Result<Self> {
        if points.len() < 2 {
            return Err(TerrainError::TooFewControlPoints(points.len()));
        }
        if !(period_seconds.is_finite() && period_seconds > 0.0) {
            return Err(TerrainError::InvalidPeriod(period_seconds));
        }

        let mut path = CameraPath {
            points,
            arc_lengths: Vec::new(),
            period_seconds,
            look_ahead,
        };
        path.arc_lengths = path.compute_arc_lengths(arc_length_divisions.max(1));
        Ok(path)
    }

    pub fn control_points(&self) -> &[DVec3] {
        &self.points
    }

    pub fn period_seconds(&self) -> f64 {
        self.period_seconds
    }

    /// Approximate length of the whole loop
    pub fn length(&self) -> f64 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    /// Point on the curve at raw parameter `t`, where `[0, 1]` covers the loop once
    pub fn point(&self, t: f64) -> DVec3 {
        let l = self.points.len();
        let p = l as f64 * t;
        let span = p.floor();
        let weight = p - span;
        let i = (span as i64).rem_euclid(l as i64) as usize;

        let p0 = self.points[(i + l - 1) % l];
        let p1 = self.points[i];
        let p2 = self.points[(i + 1) % l];
        let p3 = self.points[(i + 2) % l];

        // Centripetal parameterisation: knot spacing is sqrt of chord length
        let mut dt0 = p0.distance_squared(p1).powf(0.25);
        let mut dt1 = p1.distance_squared(p2).powf(0.25);
        let mut dt2 = p2.distance_squared(p3).powf(0.25);

        if dt1 < MIN_KNOT_SPACING {
            dt1 = 1.0;
        }
        if dt0 < MIN_KNOT_SPACING {
            dt0 = dt1;
        }
        if dt2 < MIN_KNOT_SPACING {
            dt2 = dt1;
        }

        let axis = |a: f64, b: f64, c: f64, d: f64| {
            Cubic::nonuniform_catmull_rom(a, b, c, d, dt0, dt1, dt2).eval(weight)
        };

        DVec3::new(
            axis(p0.x, p1.x, p2.x, p3.x),
            axis(p0.y, p1.y, p2.y, p3.y),
            axis(p0.z, p1.z, p2.z, p3.z),
        )
    }

    /// Point at fraction `u` of the loop's length
    pub fn point_at(&self, u: f64) -> DVec3 {
        self.point(self.arc_to_parameter(u))
    }

    /// Camera pose after `elapsed_seconds` of flight
    pub fn pose_at(&self, elapsed_seconds: f64) -> CameraPose {
        let t = elapsed_seconds.rem_euclid(self.period_seconds) / self.period_seconds;
        CameraPose {
            position: self.point_at(t),
            target: self.point_at((t + self.look_ahead) % 1.0),
        }
    }

    fn compute_arc_lengths(&self, divisions: usize) -> Vec<f64> {
        let mut lengths = Vec::with_capacity(divisions + 1);
        let mut last = self.point(0.0);
        let mut sum = 0.0;
        lengths.push(sum);

        for p in 1..=divisions {
            let current = self.point(p as f64 / divisions as f64);
            sum += current.distance(last);
            lengths.push(sum);
            last = current;
        }

        lengths
    }

    /// Map an arc-length fraction to the raw curve parameter
    fn arc_to_parameter(&self, u: f64) -> f64 {
        let lengths = &self.arc_lengths;
        let last = lengths.len() - 1;
        let target = u * lengths[last];

        let mut low = 0isize;
        let mut high = last as isize;
        while low <= high {
            let i = low + (high - low) / 2;
            let diff = lengths[i as usize] - target;
            if diff < 0.0 {
                low = i + 1;
            } else if diff > 0.0 {
                high = i - 1;
            } else {
                high = i;
                break;
            }
        }

        let i = high.max(0) as usize;
        if lengths[i] == target || i == last {
            return i as f64 / last as f64;
        }

        let before = lengths[i];
        let segment = lengths[i + 1] - before;
        if segment <= 0.0 {
            return i as f64 / last as f64;
        }

        (i as f64 + (target - before) / segment) / last as f64
    }
}
