//! Shot types, lies and outcome locations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strategic role of a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShotType {
    Tee,
    App,
    Arg,
    LngPutt,
    ShtPutt,
    Penalty,
    Unknown,
}

impl ShotType {
    /// Shot types that receive an expected-strokes model.
    pub const MODELED: [ShotType; 5] = [
        ShotType::Tee,
        ShotType::App,
        ShotType::Arg,
        ShotType::LngPutt,
        ShotType::ShtPutt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShotType::Tee => "TEE",
            ShotType::App => "APP",
            ShotType::Arg => "ARG",
            ShotType::LngPutt => "LNG_PUTT",
            ShotType::ShtPutt => "SHT_PUTT",
            ShotType::Penalty => "PENALTY",
            ShotType::Unknown => "UNKNOWN",
        }
    }

    pub fn is_putt(&self) -> bool {
        matches!(self, ShotType::LngPutt | ShotType::ShtPutt)
    }
}

impl fmt::Display for ShotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ShotType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TEE" => Ok(ShotType::Tee),
            "APP" => Ok(ShotType::App),
            "ARG" => Ok(ShotType::Arg),
            "LNG_PUTT" => Ok(ShotType::LngPutt),
            "SHT_PUTT" => Ok(ShotType::ShtPutt),
            "PENALTY" => Ok(ShotType::Penalty),
            "UNKNOWN" => Ok(ShotType::Unknown),
            other => Err(format!("unknown shot type: {}", other)),
        }
    }
}

/// Refined lie the ball is played from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Surface {
    Tee,
    Fairway,
    Rough,
    Bunker,
    Green,
    Trouble,
    Water,
    Penalty,
    Unknown,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Tee => "Tee",
            Surface::Fairway => "Fairway",
            Surface::Rough => "Rough",
            Surface::Bunker => "Bunker",
            Surface::Green => "Green",
            Surface::Trouble => "Trouble",
            Surface::Water => "Water",
            Surface::Penalty => "Penalty",
            Surface::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Side of the target the ball finished on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Penalty,
    None,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Left => "Left",
            Direction::Right => "Right",
            Direction::Penalty => "Penalty",
            Direction::None => "None",
        };
        write!(f, "{}", s)
    }
}

/// Where the ball finished after the shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ToLocation {
    Green,
    Hole,
    Fairway,
    Rough,
    Bunker,
    Trouble,
    Water,
    Penalty,
    Unknown,
}

impl ToLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToLocation::Green => "Green",
            ToLocation::Hole => "Hole",
            ToLocation::Fairway => "Fairway",
            ToLocation::Rough => "Rough",
            ToLocation::Bunker => "Bunker",
            ToLocation::Trouble => "Trouble",
            ToLocation::Water => "Water",
            ToLocation::Penalty => "Penalty",
            ToLocation::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ToLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
