//! Driver command state.
//!
//! One [`Steer`] and one [`Control`] value are active at any time. They are
//! written by whatever drives the car (keyboard handler, network glue, a
//! script) and read by the vehicle once per tick.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Steering command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Steer {
    Left,
    Right,
    #[default]
    None,
}

/// Throttle/brake command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Control {
    Forward,
    Brake,
    #[default]
    None,
}

impl Steer {
    /// Lowercase name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Steer::Left => "left",
            Steer::Right => "right",
            Steer::None => "none",
        }
    }
}

impl Control {
    /// Lowercase name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Control::Forward => "forward",
            Control::Brake => "brake",
            Control::None => "none",
        }
    }
}

impl fmt::Display for Steer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Steer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Steer::Left),
            "right" => Ok(Steer::Right),
            "none" | "" => Ok(Steer::None),
            _ => Err(Error::UnknownCommand {
                kind: "steer",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for Control {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" => Ok(Control::Forward),
            "brake" => Ok(Control::Brake),
            "none" | "" => Ok(Control::None),
            _ => Err(Error::UnknownCommand {
                kind: "control",
                value: s.to_string(),
            }),
        }
    }
}

/// The pair of commands the vehicle reads each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriverCommands {
    pub steer: Steer,
    pub control: Control,
}

impl DriverCommands {
    /// Map a set of held keys to commands.
    ///
    /// `w` drives forward and `s` brakes, `a` steers left and `d` steers
    /// right. When both keys of a pair are held the later one in that list
    /// (`s`, `d`) wins. Case is ignored.
    pub fn from_held_keys(keys: impl IntoIterator<Item = char>) -> Self {
        let (mut w, mut s, mut a, mut d) = (false, false, false, false);
        for key in keys {
            match key.to_ascii_lowercase() {
                'w' => w = true,
                's' => s = true,
                'a' => a = true,
                'd' => d = true,
                _ => {}
            }
        }

        let control = if s {
            Control::Brake
        } else if w {
            Control::Forward
        } else {
            Control::None
        };
        let steer = if d {
            Steer::Right
        } else if a {
            Steer::Left
        } else {
            Steer::None
        };

        Self { steer, control }
    }

    /// Apply a single command.
    pub fn apply(&mut self, command: DriverCommand) {
        match command {
            DriverCommand::Steer(steer) => self.steer = steer,
            DriverCommand::Control(control) => self.control = control,
        }
    }
}

/// A single command message, used for cross-thread handoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum DriverCommand {
    Steer(Steer),
    Control(Control),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_none() {
        let commands = DriverCommands::default();
        assert_eq!(commands.steer, Steer::None);
        assert_eq!(commands.control, Control::None);
    }

    #[test]
    fn test_held_keys_mapping() {
        let c = DriverCommands::from_held_keys("w".chars());
        assert_eq!((c.control, c.steer), (Control::Forward, Steer::None));

        let c = DriverCommands::from_held_keys("wd".chars());
        assert_eq!((c.control, c.steer), (Control::Forward, Steer::Right));

        let c = DriverCommands::from_held_keys("A".chars());
        assert_eq!((c.control, c.steer), (Control::None, Steer::Left));

        let c = DriverCommands::from_held_keys("xyz".chars());
        assert_eq!(c, DriverCommands::default());
    }

    #[test]
    fn test_brake_and_right_win_over_their_pair() {
        let c = DriverCommands::from_held_keys("wsad".chars());
        assert_eq!(c.control, Control::Brake);
        assert_eq!(c.steer, Steer::Right);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("left".parse::<Steer>().unwrap(), Steer::Left);
        assert_eq!(" RIGHT ".parse::<Steer>().unwrap(), Steer::Right);
        assert_eq!("brake".parse::<Control>().unwrap(), Control::Brake);
        assert_eq!("".parse::<Control>().unwrap(), Control::None);
        assert!(matches!(
            "sideways".parse::<Steer>(),
            Err(Error::UnknownCommand { kind: "steer", .. })
        ));
        for steer in [Steer::Left, Steer::Right, Steer::None] {
            assert_eq!(steer.as_str().parse::<Steer>().unwrap(), steer);
        }
    }

    #[test]
    fn test_apply_command() {
        let mut commands = DriverCommands::default();
        commands.apply(DriverCommand::Control(Control::Forward));
        commands.apply(DriverCommand::Steer(Steer::Left));
        assert_eq!(commands.control, Control::Forward);
        assert_eq!(commands.steer, Steer::Left);
    }

    #[test]
    fn test_command_json() {
        let command: DriverCommand =
            serde_json::from_str(r#"{ "kind": "steer", "value": "right" }"#).unwrap();
        assert_eq!(command, DriverCommand::Steer(Steer::Right));
    }
}
