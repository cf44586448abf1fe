use embedded_time::duration::Milliseconds;

/// Fires once every `period` seconds of accumulated simulation time.
///
/// A carrying interval keeps the fractional leftover (`elapsed % period`) so the
/// average rate is preserved for any step size. A resetting interval drops it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    period: f32,
    elapsed: f32,

    /// Time since the interval last fired, leftover excluded
    since_fired: f32,
    carry: bool,
}

impl Interval {
    /// Create an interval that carries leftover time into the next period.
    pub fn new(period: f32) -> Self {
        Self {
            period,
            elapsed: 0.,
            since_fired: 0.,
            carry: true,
        }
    }

    /// Create an interval that restarts from zero each time it fires.
    pub fn resetting(period: f32) -> Self {
        Self {
            carry: false,
            ..Self::new(period)
        }
    }

    pub fn from_millis(period: Milliseconds<u32>) -> Self {
        Self::new(crate::config::seconds(period))
    }

    pub fn period(&self) -> f32 {
        self.period
    }

    /// Time accumulated since the interval last fired.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Accumulate `dt` seconds.
    ///
    /// Returns the time since the previous firing when the period is reached,
    /// at most once per call. The returned times sum to the time advanced.
    pub fn advance(&mut self, dt: f32) -> Option<f32> {
        self.elapsed += dt;
        self.since_fired += dt;
        if self.elapsed < self.period {
            return None;
        }

        self.elapsed = if self.carry {
            self.elapsed % self.period
        } else {
            0.
        };
        Some(core::mem::take(&mut self.since_fired))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn carries_leftover() {
        let mut interval = Interval::new(0.022);
        assert_eq!(interval.advance(0.015), None);
        let fired = interval.advance(0.015).unwrap();
        assert_abs_diff_eq!(fired, 0.030, epsilon = 1e-6);
        assert_abs_diff_eq!(interval.elapsed(), 0.008, epsilon = 1e-6);

        // The 8 ms leftover was already reported; only the new step counts
        let fired = interval.advance(0.015).unwrap();
        assert_abs_diff_eq!(fired, 0.015, epsilon = 1e-6);
    }

    #[test]
    fn fired_times_sum_to_advanced_time() {
        let mut interval = Interval::new(0.022);
        let mut reported = 0f64;
        for _ in 0..1000 {
            if let Some(dt) = interval.advance(0.015) {
                reported += dt as f64;
            }
        }
        let pending = interval.since_fired as f64;
        assert_abs_diff_eq!(reported + pending, 15., epsilon = 1e-3);
        assert!(pending < 0.022 + 0.015);
    }

    #[test]
    fn resetting_drops_leftover() {
        let mut interval = Interval::resetting(0.022);
        interval.advance(0.015);
        assert!(interval.advance(0.015).is_some());
        assert_eq!(interval.elapsed(), 0.);
    }

    #[test]
    fn fires_once_per_call_for_long_steps() {
        let mut interval = Interval::new(0.01);
        assert!(interval.advance(0.035).is_some());
        assert_abs_diff_eq!(interval.elapsed(), 0.005, epsilon = 1e-6);
    }
}
