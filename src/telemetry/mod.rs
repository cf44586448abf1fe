//! Line based key/value telemetry.
//!
//! Every line carries one `<key> <value>` pair. The vehicle publishes a
//! [`TelemetryFrame`] and accepts `throttle`, `yaw`, `pitch` and `roll`
//! commands as raw integers.

use crate::control::Command;
use crate::motor::RotorPosition;
use core::fmt::{self, Write};
use nalgebra::Vector3;

pub mod udp;
pub use udp::TelemetryLink;

/// Scale applied to raw command values.
pub const COMMAND_SCALE: f32 = 0.01;

/// Offset recentering the scaled yaw, pitch and roll commands on zero.
pub const AXIS_OFFSET: f32 = 0.5;

/// Published vehicle state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TelemetryFrame {
    /// Body rates (in rad/s)
    pub gyro: Vector3<f32>,

    /// Integrated body rates (in rad)
    pub gyro_integral: Vector3<f32>,

    /// Specific force in the body frame (in m/s^2)
    pub accel: Vector3<f32>,

    pub position: Vector3<f32>,
    pub speed: Vector3<f32>,

    /// Commanded throttle per rotor, in [`RotorPosition::ALL`] order
    pub throttle: [f32; 4],

    /// Throttle latched by each motor controller. Kept for inspection only;
    /// the line protocol carries the commanded throttle.
    pub pwm_throttle: [f32; 4],

    pub rpm: [f32; 4],

    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,

    pub angle_x: f32,
    pub angle_z: f32,
    pub angle_x_real: f32,
    pub angle_z_real: f32,

    /// Simulated time (in seconds)
    pub time: f64,
}

impl TelemetryFrame {
    /// Encode the frame as newline terminated `<key> <value>` lines.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TelemetryFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn vector(f: &mut fmt::Formatter<'_>, key: &str, value: &Vector3<f32>) -> fmt::Result {
            for (axis, component) in ["X", "Y", "Z"].iter().zip(value.iter()) {
                writeln!(f, "{key}{axis} {component}")?;
            }
            Ok(())
        }

        fn per_rotor(f: &mut fmt::Formatter<'_>, key: &str, values: &[f32; 4]) -> fmt::Result {
            for position in RotorPosition::ALL {
                writeln!(f, "{key}{} {}", position.name(), values[position.index()])?;
            }
            Ok(())
        }

        vector(f, "gyro", &self.gyro)?;
        vector(f, "gyroInt", &self.gyro_integral)?;
        vector(f, "accel", &self.accel)?;
        vector(f, "pos", &self.position)?;
        vector(f, "speed", &self.speed)?;
        per_rotor(f, "throttle", &self.throttle)?;
        per_rotor(f, "rpm", &self.rpm)?;

        let scalars = [
            ("pitch", self.pitch),
            ("yaw", self.yaw),
            ("roll", self.roll),
            ("angleX", self.angle_x),
            ("angleZ", self.angle_z),
            ("angleXreal", self.angle_x_real),
            ("angleZreal", self.angle_z_real),
        ];
        for (key, value) in scalars {
            writeln!(f, "{key} {value}")?;
        }
        writeln!(f, "time {}", self.time)
    }
}

/// Parse a single inbound command line.
///
/// Returns `None` for blank lines, unknown keys and malformed values.
pub fn parse_command(line: &str) -> Option<Command> {
    let mut fields = line.split_whitespace();
    let key = fields.next()?;

    let value = match (fields.next().map(str::parse::<f32>), fields.next()) {
        (Some(Ok(value)), None) => value * COMMAND_SCALE,
        _ => {
            log::debug!("ignoring malformed telemetry line {:?}", line);
            return None;
        }
    };

    let command = match key {
        "throttle" => Command::Throttle(value),
        "yaw" => Command::Yaw(value - AXIS_OFFSET),
        "pitch" => Command::Pitch(value - AXIS_OFFSET),
        "roll" => Command::Roll(value - AXIS_OFFSET),
        _ => {
            log::debug!("ignoring unknown telemetry key {:?}", key);
            return None;
        }
    };
    Some(command)
}

/// Parse every recognized command of a payload, in order.
pub fn parse_commands(payload: &str) -> impl Iterator<Item = Command> + '_ {
    payload.lines().filter_map(parse_command)
}

/// Encode a command the way a ground station sends it.
pub fn encode_command(command: Command, out: &mut String) -> fmt::Result {
    let (key, value) = match command {
        Command::Throttle(value) => ("throttle", value),
        Command::Yaw(value) => ("yaw", value + AXIS_OFFSET),
        Command::Pitch(value) => ("pitch", value + AXIS_OFFSET),
        Command::Roll(value) => ("roll", value + AXIS_OFFSET),
    };
    writeln!(out, "{key} {}", (value / COMMAND_SCALE).round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn value(command: Option<Command>) -> f32 {
        match command {
            Some(Command::Throttle(v) | Command::Yaw(v) | Command::Pitch(v) | Command::Roll(v)) => v,
            None => panic!("no command"),
        }
    }

    #[test]
    fn frame_keys_in_order() {
        let frame = TelemetryFrame {
            time: 1.5,
            ..TelemetryFrame::default()
        };
        let encoded = frame.encode();
        let keys: Vec<_> = encoded
            .lines()
            .map(|line| line.split(' ').next().unwrap())
            .collect();

        assert_eq!(
            keys,
            [
                "gyroX", "gyroY", "gyroZ", "gyroIntX", "gyroIntY", "gyroIntZ", "accelX",
                "accelY", "accelZ", "posX", "posY", "posZ", "speedX", "speedY", "speedZ",
                "throttleXm", "throttleXp", "throttleZm", "throttleZp", "rpmXm", "rpmXp",
                "rpmZm", "rpmZp", "pitch", "yaw", "roll", "angleX", "angleZ", "angleXreal",
                "angleZreal", "time",
            ]
        );
        assert!(encoded.ends_with("time 1.5\n"));
    }

    #[test]
    fn frame_values() {
        let frame = TelemetryFrame {
            rpm: [1000., 2000., 3000., 4000.],
            pwm_throttle: [0.25; 4],
            ..TelemetryFrame::default()
        };
        let encoded = frame.encode();
        assert!(encoded.contains("rpmXp 2000\n"));
        assert!(encoded.contains("rpmZp 4000\n"));
        assert!(!encoded.contains("0.25"));
    }

    #[test]
    fn commands_are_scaled() {
        assert_abs_diff_eq!(value(parse_command("throttle 55")), 0.55, epsilon = 1e-6);
        assert_abs_diff_eq!(value(parse_command("yaw 50")), 0., epsilon = 1e-6);
        assert_abs_diff_eq!(value(parse_command("pitch 0")), -0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(value(parse_command("roll 100")), 0.5, epsilon = 1e-6);
        assert!(matches!(parse_command("pitch 30"), Some(Command::Pitch(_))));
    }

    #[test]
    fn bad_lines_are_ignored() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("altitude 30"), None);
        assert_eq!(parse_command("throttle"), None);
        assert_eq!(parse_command("throttle fast"), None);
        assert_eq!(parse_command("throttle 1 2"), None);

        let commands: Vec<_> = parse_commands("speed 3\nthrottle 40\n\nroll x\nyaw 60\n").collect();
        assert_eq!(commands.len(), 2);
        assert!(matches!(commands[0], Command::Throttle(_)));
        assert!(matches!(commands[1], Command::Yaw(_)));
    }

    #[test]
    fn encoded_commands_parse_back() {
        let mut payload = String::new();
        encode_command(Command::Throttle(0.75), &mut payload).unwrap();
        encode_command(Command::Roll(-0.25), &mut payload).unwrap();
        assert_eq!(payload, "throttle 75\nroll 25\n");

        let commands: Vec<_> = parse_commands(&payload).collect();
        assert_abs_diff_eq!(value(Some(commands[1])), -0.25, epsilon = 1e-6);
    }
}
