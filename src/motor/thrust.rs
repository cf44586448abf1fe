/// Empirical propeller thrust curve.
///
/// `force = max(0, sqrt(knee² + rpm²) - knee - offset) * scale`
///
/// The curve is quadratic well below `knee` and close to linear above it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThrustCurve {
    /// Speed where the curve bends from quadratic to linear (in rpm)
    pub knee: f32,

    /// Dead band before any thrust is produced (in rpm)
    pub offset: f32,

    /// Newtons per rpm on the linear part
    pub scale: f32,
}

impl Default for ThrustCurve {
    fn default() -> Self {
        Self {
            knee: 8000.,
            offset: 50.,
            scale: 1.0e-3,
        }
    }
}

impl ThrustCurve {
    /// Thrust in Newtons produced at `rpm`.
    pub fn force(&self, rpm: f32) -> f32 {
        let rpm = rpm.max(0.);
        let raw = (self.knee * self.knee + rpm * rpm).sqrt() - self.knee - self.offset;
        raw.max(0.) * self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_below_dead_band() {
        let curve = ThrustCurve::default();
        assert_eq!(curve.force(0.), 0.);
        assert_eq!(curve.force(500.), 0.);
        assert!(curve.force(1500.) > 0.);
    }

    #[test]
    fn non_negative_and_monotonic() {
        let curve = ThrustCurve::default();
        let mut last = 0.;
        for step in 0..=2000 {
            let force = curve.force(step as f32 * 7.5);
            assert!(force >= 0.);
            assert!(force >= last, "thrust decreased at step {step}");
            last = force;
        }
    }

    #[test]
    fn known_points() {
        let curve = ThrustCurve::default();
        // sqrt(8000² + 6000²) = 10000
        assert_relative_eq!(curve.force(6000.), 1.95, max_relative = 1e-4);
    }
}
