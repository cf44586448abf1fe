use super::RotorPosition;
use nalgebra::Vector3;

/// Throttle command for each rotor, indexed in [`RotorPosition::ALL`] order.
pub type RotorCommand = [f32; 4];

/// Mixes base throttle with roll, pitch and yaw commands for a "plus" quad.
///
/// Every factor column sums to zero, so the mix never changes the total
/// throttle across the four rotors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadMixer {
    /// Roll, pitch and yaw factors for each rotor.
    pub factors: [Vector3<f32>; 4],
}

impl Default for QuadMixer {
    fn default() -> Self {
        Self {
            factors: RotorPosition::ALL.map(RotorPosition::mix_factor),
        }
    }
}

impl QuadMixer {
    /// Throttle for each rotor.
    pub fn mix(&self, base: f32, roll: f32, pitch: f32, yaw: f32) -> RotorCommand {
        let moment = Vector3::new(roll, pitch, yaw);
        self.factors.map(|factor| {
            factor.zip_fold(&moment, base, |acc, factor, moment| factor * moment + acc)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn conserves_total_throttle() {
        let mixer = QuadMixer::default();
        let out = mixer.mix(0.5, 0.1, -0.07, 0.03);
        assert_abs_diff_eq!(out.iter().sum::<f32>(), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn roll_drives_z_rotors() {
        let out = QuadMixer::default().mix(0.5, 0.1, 0., 0.);
        assert_eq!(out[RotorPosition::Xm.index()], 0.5);
        assert_eq!(out[RotorPosition::Xp.index()], 0.5);
        assert_abs_diff_eq!(out[RotorPosition::Zm.index()], 0.6);
        assert_abs_diff_eq!(out[RotorPosition::Zp.index()], 0.4);
    }

    #[test]
    fn pitch_drives_x_rotors() {
        let out = QuadMixer::default().mix(0.5, 0., 0.1, 0.);
        assert_abs_diff_eq!(out[RotorPosition::Xm.index()], 0.4);
        assert_abs_diff_eq!(out[RotorPosition::Xp.index()], 0.6);
        assert_eq!(out[RotorPosition::Zm.index()], 0.5);
    }

    #[test]
    fn yaw_follows_spin_direction() {
        let out = QuadMixer::default().mix(0.5, 0., 0., 0.1);
        for position in RotorPosition::ALL {
            let expected = 0.5 + 0.1 * position.spin_direction();
            assert_abs_diff_eq!(out[position.index()], expected);
        }
    }
}
