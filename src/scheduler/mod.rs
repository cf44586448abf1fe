//! Fixed-period control scheduling, decoupled from the physics step.

use crate::control::{ControlInput, ControlOutput, ControlPolicy, FlightController};
use crate::motor::{QuadMixer, RotorActuator, RotorCommand};
use crate::sensor::{FlightSensors, SensorSnapshot};
use embedded_time::duration::Milliseconds;

mod interval;
pub use interval::Interval;

/// Runs the control policy once per control period of accumulated simulation time.
///
/// Leftover time below the period carries into the next step, so the average
/// control rate holds for any physics step size.
#[derive(Debug)]
pub struct FlightControlLoop {
    timer: Interval,
    policy: ControlPolicy,
    mixer: QuadMixer,
    ticks: u64,
    last_output: ControlOutput,
    last_command: RotorCommand,
}

impl FlightControlLoop {
    pub fn new(period: Milliseconds<u32>, policy: ControlPolicy) -> Self {
        Self {
            timer: Interval::from_millis(period),
            policy,
            mixer: QuadMixer::default(),
            ticks: 0,
            last_output: ControlOutput::default(),
            last_command: [0.; 4],
        }
    }

    /// Accumulate `dt` seconds and run a control tick if the period is reached.
    ///
    /// Returns `true` if new throttles were written to the rotors.
    pub fn update(
        &mut self,
        dt: f32,
        input: &ControlInput,
        sensors: &mut FlightSensors,
        rotors: &mut [RotorActuator; 4],
    ) -> bool {
        let tick_dt = match self.timer.advance(dt) {
            Some(elapsed) => elapsed,
            None => return false,
        };

        let snapshot = sensors.sample();
        self.tick(tick_dt, input, &snapshot, rotors);
        true
    }

    /// Run the policy once and write the mixed throttles to the rotors.
    pub fn tick(
        &mut self,
        dt: f32,
        input: &ControlInput,
        sensors: &SensorSnapshot,
        rotors: &mut [RotorActuator; 4],
    ) {
        let output = self.policy.control(dt, input, sensors);
        let command = self
            .mixer
            .mix(output.base, output.roll, output.pitch, output.yaw);

        for rotor in rotors.iter_mut() {
            rotor.set_throttle(command[rotor.position().index()]);
        }

        self.ticks += 1;
        self.last_output = output;
        self.last_command = command;

        log::trace!(
            "control tick {} dt={:.4} base={:.3} roll={:.4} pitch={:.4} yaw={:.3}",
            self.ticks,
            dt,
            output.base,
            output.roll,
            output.pitch,
            output.yaw
        );
    }

    pub fn policy(&self) -> &ControlPolicy {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut ControlPolicy {
        &mut self.policy
    }

    pub fn period(&self) -> f32 {
        self.timer.period()
    }

    /// Number of control ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn last_output(&self) -> &ControlOutput {
        &self.last_output
    }

    /// Unclamped throttles of the last tick, in [`RotorPosition::ALL`](crate::motor::RotorPosition::ALL) order.
    pub fn last_command(&self) -> &RotorCommand {
        &self.last_command
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RotorConfig, SensorConfig};
    use crate::control::DirectControl;
    use crate::motor::RotorPosition;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::sync::{Arc, Mutex};

    fn rig() -> (FlightSensors, [RotorActuator; 4]) {
        let sensors = FlightSensors::new(&SensorConfig::default(), StdRng::seed_from_u64(0));
        let rotors = RotorPosition::ALL.map(|position| {
            RotorActuator::new(
                position,
                &RotorConfig::default(),
                StdRng::seed_from_u64(position.index() as u64),
            )
        });
        (sensors, rotors)
    }

    #[test]
    fn tick_count_matches_elapsed_time() {
        let (mut sensors, mut rotors) = rig();
        let mut control = FlightControlLoop::new(
            Milliseconds::new(22),
            ControlPolicy::DirectControl(DirectControl),
        );
        let input = ControlInput::hover(0.5);
        let mut rng = StdRng::seed_from_u64(42);

        let mut total = 0f64;
        while total < 100. {
            let dt: f32 = rng.gen_range(0.0005..0.007);
            total += dt as f64;
            control.update(dt, &input, &mut sensors, &mut rotors);
        }

        let expected = total / 0.022;
        let diff = (control.ticks() as f64 - expected).abs();
        assert!(diff <= 1., "ticks {} expected {expected}", control.ticks());
    }

    #[test]
    fn leftover_is_retained() {
        let (mut sensors, mut rotors) = rig();
        let mut control = FlightControlLoop::new(
            Milliseconds::new(22),
            ControlPolicy::DirectControl(DirectControl),
        );
        let input = ControlInput::default();

        // 0.015 s steps never divide 22 ms; resetting would give one tick per two steps
        for _ in 0..1000 {
            control.update(0.015, &input, &mut sensors, &mut rotors);
        }
        assert_eq!(control.ticks(), 681);
    }

    #[test]
    fn policy_time_matches_elapsed_time() {
        let (mut sensors, mut rotors) = rig();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let policy = ControlPolicy::delegated(
            move |dt: f32, input: &ControlInput, _sensors: &SensorSnapshot| {
                recorder.lock().unwrap().push(dt);
                ControlOutput {
                    base: input.throttle,
                    ..ControlOutput::default()
                }
            },
        );
        let mut control = FlightControlLoop::new(Milliseconds::new(22), policy);
        let input = ControlInput::default();

        // 15 ms steps never divide the period
        for _ in 0..1000 {
            control.update(0.015, &input, &mut sensors, &mut rotors);
        }

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len() as u64, control.ticks());
        let total: f64 = seen.iter().map(|dt| *dt as f64).sum();
        assert!(total <= 15. + 1e-3, "policy saw {total} s of 15 s");
        assert!(total >= 15. - 0.022 - 0.015, "policy saw {total} s of 15 s");
        for dt in seen.iter() {
            assert!(*dt == 0.015 || (*dt - 0.030).abs() < 1e-4, "tick dt {dt}");
        }
    }

    #[test]
    fn tick_writes_quantized_throttles() {
        let (mut sensors, mut rotors) = rig();
        let mut control = FlightControlLoop::new(
            Milliseconds::new(22),
            ControlPolicy::DirectControl(DirectControl),
        );
        let input = ControlInput::new(0.5, 0., 0.2, 0.);

        assert!(!control.update(0.02, &input, &mut sensors, &mut rotors));
        assert_eq!(rotors[0].throttle(), 0.);
        assert!(control.update(0.005, &input, &mut sensors, &mut rotors));

        let xm = rotors[RotorPosition::Xm.index()].throttle();
        let xp = rotors[RotorPosition::Xp.index()].throttle();
        assert!(xp > xm);
        assert_eq!(xp, crate::motor::quantize_throttle(0.7));
        assert_eq!(control.last_output().pitch, 0.2);
    }

    #[test]
    fn saturation_happens_at_the_rotor() {
        let (mut sensors, mut rotors) = rig();
        let mut control = FlightControlLoop::new(
            Milliseconds::new(22),
            ControlPolicy::DirectControl(DirectControl),
        );
        let input = ControlInput::new(0.9, 0., 0.5, 0.);
        control.update(0.03, &input, &mut sensors, &mut rotors);

        assert!(control.last_command()[RotorPosition::Xp.index()] > 1.);
        assert_eq!(rotors[RotorPosition::Xp.index()].throttle(), 1.);
    }
}
