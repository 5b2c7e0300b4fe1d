//! Shot type classification from the lie a shot is played from.

use tracing::warn;

use crate::config::ClassifierConfig;
use crate::models::{ShotType, Surface};

/// Lie family of a raw feed code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lie {
    Tee,
    Green,
    Collar,
    Fairway,
    Rough,
    Bunker,
    Trouble,
    Water,
}

impl Lie {
    pub fn from_code(code: &str) -> Option<Lie> {
        match code {
            "OTB" => Some(Lie::Tee),
            "OGR" => Some(Lie::Green),
            "OCO" => Some(Lie::Collar),
            "OFW" | "OIR" | "OWD" => Some(Lie::Fairway),
            "ORO" | "OBR" | "OWL" => Some(Lie::Rough),
            "OST" | "OGS" => Some(Lie::Bunker),
            "ONA" | "OTH" | "OUK" => Some(Lie::Trouble),
            "OWA" => Some(Lie::Water),
            _ => None,
        }
    }

    fn surface(&self) -> Surface {
        match self {
            Lie::Tee => Surface::Tee,
            Lie::Green => Surface::Green,
            Lie::Collar => Surface::Fairway,
            Lie::Fairway => Surface::Fairway,
            Lie::Rough => Surface::Rough,
            Lie::Bunker => Surface::Bunker,
            Lie::Trouble => Surface::Trouble,
            Lie::Water => Surface::Water,
        }
    }
}

/// Maps a shot's lie, start distance and hole par to its type and refined surface.
#[derive(Debug, Clone, Default)]
pub struct ShotTypeClassifier {
    config: ClassifierConfig,
}

impl ShotTypeClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify one shot. Total: unknown lies give `(Unknown, Unknown)`.
    ///
    /// Distances are inches. A zero shot distance marks a penalty stroke.
    pub fn classify(
        &self,
        from_code: &str,
        start_distance: u32,
        par: u8,
        shot_distance: u32,
    ) -> (ShotType, Surface) {
        if shot_distance == 0 {
            return (ShotType::Penalty, Surface::Penalty);
        }

        let Some(lie) = Lie::from_code(from_code) else {
            warn!("Unknown lie code '{}', classifying shot as UNKNOWN", from_code);
            return (ShotType::Unknown, Surface::Unknown);
        };

        let start = f64::from(start_distance);
        match lie {
            Lie::Tee => {
                if self.config.tee_shot_pars.contains(&par) {
                    (ShotType::Tee, Surface::Tee)
                } else {
                    (ShotType::App, Surface::Tee)
                }
            }
            Lie::Green | Lie::Collar => {
                if start > self.config.long_putt_inches() {
                    if lie == Lie::Collar {
                        (ShotType::Arg, Surface::Fairway)
                    } else {
                        (ShotType::LngPutt, Surface::Green)
                    }
                } else {
                    (ShotType::ShtPutt, Surface::Green)
                }
            }
            Lie::Fairway | Lie::Rough | Lie::Bunker | Lie::Trouble | Lie::Water => {
                if start > self.config.arg_inches() {
                    (ShotType::App, lie.surface())
                } else {
                    (ShotType::Arg, lie.surface())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> ShotTypeClassifier {
        ShotTypeClassifier::default()
    }

    #[test]
    fn test_penalty_wins() {
        assert_eq!(
            classifier().classify("OTB", 14400, 4, 0),
            (ShotType::Penalty, Surface::Penalty)
        );
        assert_eq!(
            classifier().classify("XYZ", 100, 4, 0),
            (ShotType::Penalty, Surface::Penalty)
        );
    }

    #[test]
    fn test_tee_shots_by_par() {
        let c = classifier();
        assert_eq!(c.classify("OTB", 14400, 4, 10000), (ShotType::Tee, Surface::Tee));
        assert_eq!(c.classify("OTB", 19800, 5, 10000), (ShotType::Tee, Surface::Tee));
        assert_eq!(c.classify("OTB", 6000, 3, 5800), (ShotType::App, Surface::Tee));
    }

    #[test]
    fn test_putts() {
        let c = classifier();
        assert_eq!(c.classify("OGR", 145, 4, 140), (ShotType::LngPutt, Surface::Green));
        assert_eq!(c.classify("OGR", 144, 4, 140), (ShotType::ShtPutt, Surface::Green));
        assert_eq!(c.classify("OGR", 20, 4, 20), (ShotType::ShtPutt, Surface::Green));
    }

    #[test]
    fn test_collar() {
        let c = classifier();
        assert_eq!(c.classify("OCO", 300, 4, 290), (ShotType::Arg, Surface::Fairway));
        assert_eq!(c.classify("OCO", 100, 4, 95), (ShotType::ShtPutt, Surface::Green));
    }

    #[test]
    fn test_off_green_threshold() {
        let c = classifier();
        assert_eq!(c.classify("OFW", 1081, 4, 1000), (ShotType::App, Surface::Fairway));
        assert_eq!(c.classify("OFW", 1080, 4, 1000), (ShotType::Arg, Surface::Fairway));
        assert_eq!(c.classify("ORO", 6480, 4, 6000), (ShotType::App, Surface::Rough));
        assert_eq!(c.classify("OGS", 500, 4, 450), (ShotType::Arg, Surface::Bunker));
        assert_eq!(c.classify("OTH", 2000, 4, 1500), (ShotType::App, Surface::Trouble));
        assert_eq!(c.classify("OWA", 400, 4, 300), (ShotType::Arg, Surface::Water));
    }

    #[test]
    fn test_unknown_code_is_total() {
        assert_eq!(
            classifier().classify("ZZZ", 400, 4, 300),
            (ShotType::Unknown, Surface::Unknown)
        );
    }

    #[test]
    fn test_configurable_thresholds() {
        let c = ShotTypeClassifier::new(ClassifierConfig {
            long_putt_feet: 20.0,
            arg_green_yards: 50.0,
            ..ClassifierConfig::default()
        });
        assert_eq!(c.classify("OGR", 200, 4, 190), (ShotType::ShtPutt, Surface::Green));
        assert_eq!(c.classify("OFW", 1500, 4, 1400), (ShotType::Arg, Surface::Fairway));
    }

    #[test]
    fn test_every_known_code_classifies() {
        let codes = [
            "OTB", "OGR", "OCO", "OFW", "OIR", "OWD", "ORO", "OBR", "OWL", "OST", "OGS", "ONA",
            "OTH", "OUK", "OWA",
        ];
        for code in codes {
            assert!(Lie::from_code(code).is_some(), "{}", code);
            let (shot_type, _) = classifier().classify(code, 500, 4, 100);
            assert_ne!(shot_type, ShotType::Unknown, "{}", code);
        }
    }
}
