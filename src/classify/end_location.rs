//! Outcome classification from a shot's end location code.

use tracing::warn;

use crate::models::{Direction, ToLocation};

pub fn direction_of(code: &str) -> Direction {
    match code {
        "ELI" | "ELF" | "ELR" | "EG5" | "EG6" | "EG7" => Direction::Left,
        "ERI" | "ERF" | "ERR" | "EG1" | "EG2" | "EG3" => Direction::Right,
        _ => Direction::None,
    }
}

/// Location family of an end code, `None` when unrecognized.
pub fn location_of(code: &str) -> Option<ToLocation> {
    let location = match code {
        "OGR" => ToLocation::Green,
        "hole" => ToLocation::Hole,
        "ELF" | "ERF" | "ERI" | "ELI" | "OFW" | "OIR" | "OCO" => ToLocation::Fairway,
        "ERR" | "ELR" | "ORO" | "OCA" | "OWL" | "OBR" | "OTO" | "OLN" => ToLocation::Rough,
        "OST" | "EG1" | "EG2" | "EG3" | "EG4" | "EG5" | "EG6" | "EG7" | "EG8" | "OGS" => {
            ToLocation::Bunker
        }
        "ONA" | "OTH" | "OUK" | "OTB" | "ODO" => ToLocation::Trouble,
        "OWA" => ToLocation::Water,
        _ => return None,
    };
    Some(location)
}

/// Direction and location of a shot's outcome. Total: unknown codes give
/// `(None, Unknown)` with a warning.
pub fn classify_end_location(code: &str) -> (Direction, ToLocation) {
    let direction = direction_of(code);
    let location = location_of(code).unwrap_or_else(|| {
        warn!("Unknown end location code '{}'", code);
        ToLocation::Unknown
    });
    (direction, location)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_table() {
        for code in ["ELI", "ELF", "ELR", "EG5", "EG6", "EG7"] {
            assert_eq!(direction_of(code), Direction::Left, "{}", code);
        }
        for code in ["ERI", "ERF", "ERR", "EG1", "EG2", "EG3"] {
            assert_eq!(direction_of(code), Direction::Right, "{}", code);
        }
        assert_eq!(direction_of("OGR"), Direction::None);
        assert_eq!(direction_of("EG4"), Direction::None);
    }

    #[test]
    fn test_location_table() {
        assert_eq!(classify_end_location("hole"), (Direction::None, ToLocation::Hole));
        assert_eq!(classify_end_location("OGR"), (Direction::None, ToLocation::Green));
        assert_eq!(classify_end_location("ELF"), (Direction::Left, ToLocation::Fairway));
        assert_eq!(classify_end_location("ERR"), (Direction::Right, ToLocation::Rough));
        assert_eq!(classify_end_location("EG2"), (Direction::Right, ToLocation::Bunker));
        assert_eq!(classify_end_location("EG8"), (Direction::None, ToLocation::Bunker));
        assert_eq!(classify_end_location("ODO"), (Direction::None, ToLocation::Trouble));
        assert_eq!(classify_end_location("OWA"), (Direction::None, ToLocation::Water));
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(classify_end_location("???"), (Direction::None, ToLocation::Unknown));
        assert_eq!(location_of("HOLE"), None);
    }
}
