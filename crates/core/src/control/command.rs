use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Live control request for the frame worker.
///
/// `Detect` is the idle default: detection runs but the recognizer is left
/// alone unless guarding mode escalates the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum Command {
    #[default]
    Detect = 0,
    EnrollAsFoe = 1,
    EnrollAsFriend = 2,
    Recognize = 3,
    Delete = 4,
}

impl Command {
    pub const ALL: &[Command] = &[
        Command::Detect,
        Command::EnrollAsFoe,
        Command::EnrollAsFriend,
        Command::Recognize,
        Command::Delete,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Inverse of [`Command::as_u8`]. Unknown discriminants decode as `Detect`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Command::EnrollAsFoe,
            2 => Command::EnrollAsFriend,
            3 => Command::Recognize,
            4 => Command::Delete,
            _ => Command::Detect,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Detect => "detect",
            Command::EnrollAsFoe => "enroll-foe",
            Command::EnrollAsFriend => "enroll-friend",
            Command::Recognize => "recognize",
            Command::Delete => "delete",
        };
        f.write_str(name)
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detect" => Ok(Command::Detect),
            "enroll-foe" | "foe" => Ok(Command::EnrollAsFoe),
            "enroll-friend" | "friend" => Ok(Command::EnrollAsFriend),
            "recognize" | "recognise" => Ok(Command::Recognize),
            "delete" => Ok(Command::Delete),
            other => Err(format!("unknown command '{other}'")),
        }
    }
}
