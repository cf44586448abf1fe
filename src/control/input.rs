/// Pilot input: throttle in [0, 1], yaw, pitch and roll centered on zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlInput {
    pub throttle: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

/// A single inbound control command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    Throttle(f32),
    Yaw(f32),
    Pitch(f32),
    Roll(f32),
}

impl ControlInput {
    pub fn new(throttle: f32, yaw: f32, pitch: f32, roll: f32) -> Self {
        Self {
            throttle,
            yaw,
            pitch,
            roll,
        }
    }

    /// Level input at `throttle`.
    pub fn hover(throttle: f32) -> Self {
        Self {
            throttle,
            ..Self::default()
        }
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Throttle(value) => self.throttle = value,
            Command::Yaw(value) => self.yaw = value,
            Command::Pitch(value) => self.pitch = value,
            Command::Roll(value) => self.roll = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_updates_single_field() {
        let mut input = ControlInput::hover(0.5);
        input.apply(Command::Roll(0.2));
        input.apply(Command::Yaw(-0.1));
        assert_eq!(input, ControlInput::new(0.5, -0.1, 0., 0.2));
    }
}
