//! Mode selection
//!
//! Picks one response persona through a fixed priority cascade. The cascade is
//! an ordered table of rules and the first rule that yields a mode wins:
//!
//! 1. crisis language
//! 2. anxiety at crisis band or panic language
//! 3. anxiety at high band
//! 4. explicit preference (below high band)
//! 5. youth
//! 6. cognitive archetype
//! 7. control archetype
//! 8. terse messaging
//! 9. technical curiosity
//! 10. reflective language
//! 11. default

use crate::config::EngineConfig;
use crate::phrases::PhraseKind;
use crate::types::{ArchetypeScores, ArchetypeTrait, Mode};

/// Everything the cascade looks at
#[derive(Debug, Clone, Copy)]
pub struct ModeContext<'a> {
    pub anxiety: f64,
    pub crisis: bool,
    pub panic_language: bool,
    pub preferred_mode: Option<Mode>,
    pub age: Option<u32>,
    pub archetype: Option<ArchetypeScores>,
    pub avg_message_length: Option<f64>,
    pub message: &'a str,
    pub config: &'a EngineConfig,
}

impl ModeContext<'_> {
    fn below_high(&self) -> bool {
        self.anxiety < self.config.bands.high
    }

    fn prefers_minimal(&self) -> bool {
        self.preferred_mode == Some(Mode::Minimal)
    }

    /// Soft, unless the user asked for as few words as possible
    fn safe_mode(&self) -> Mode {
        if self.prefers_minimal() {
            Mode::Minimal
        } else {
            Mode::Soft
        }
    }

    fn dominant_trait_is(&self, wanted: ArchetypeTrait) -> bool {
        self.archetype.is_some_and(|scores| {
            let (dominant, score) = scores.dominant();
            dominant == wanted && score > self.config.archetype_dominance
        })
    }
}

/// One step of the cascade
pub struct ModeRule {
    pub name: &'static str,
    pub select: fn(&ModeContext) -> Option<Mode>,
}

/// The cascade, in priority order
pub const MODE_RULES: &[ModeRule] = &[
    ModeRule {
        name: "crisis",
        select: |c| c.crisis.then_some(Mode::CrisisProtocol),
    },
    ModeRule {
        name: "acute_distress",
        select: |c| (c.anxiety >= c.config.bands.crisis || c.panic_language).then(|| c.safe_mode()),
    },
    ModeRule {
        name: "high_anxiety",
        select: |c| (c.anxiety >= c.config.bands.high).then(|| c.safe_mode()),
    },
    ModeRule {
        name: "preference",
        select: |c| c.preferred_mode.filter(|_| c.below_high()),
    },
    ModeRule {
        name: "youth",
        select: |c| {
            c.age
                .is_some_and(|age| age < c.config.youth_age_threshold)
                .then_some(Mode::Kid)
        },
    },
    ModeRule {
        name: "cognitive_archetype",
        select: |c| {
            (c.below_high() && c.dominant_trait_is(ArchetypeTrait::Cognitive))
                .then_some(Mode::Clinical)
        },
    },
    ModeRule {
        name: "control_archetype",
        select: |c| {
            (c.below_high() && c.dominant_trait_is(ArchetypeTrait::Control))
                .then_some(Mode::Classic)
        },
    },
    ModeRule {
        name: "terse",
        select: |c| {
            let terse = c
                .avg_message_length
                .is_some_and(|len| len < c.config.terse_message_chars);
            (terse && c.below_high()).then_some(Mode::Minimal)
        },
    },
    ModeRule {
        name: "technical",
        select: |c| {
            c.config
                .phrases
                .matches(PhraseKind::TechnicalCue, c.message)
                .then_some(Mode::Nerd)
        },
    },
    ModeRule {
        name: "reflective",
        select: |c| {
            c.config
                .phrases
                .matches(PhraseKind::ReflectiveCue, c.message)
                .then_some(Mode::Mystic)
        },
    },
];

/// Priority-cascade mode selector
pub struct ModeSelector;

impl ModeSelector {
    pub fn select(ctx: &ModeContext) -> Mode {
        Self::select_with_rule(ctx).0
    }

    /// Selected mode and the rule that chose it
    pub fn select_with_rule(ctx: &ModeContext) -> (Mode, &'static str) {
        MODE_RULES
            .iter()
            .find_map(|rule| (rule.select)(ctx).map(|mode| (mode, rule.name)))
            .unwrap_or((Mode::Classic, "default"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx<'a>(config: &'a EngineConfig, anxiety: f64, message: &'a str) -> ModeContext<'a> {
        ModeContext {
            anxiety,
            crisis: false,
            panic_language: false,
            preferred_mode: None,
            age: Some(35),
            archetype: None,
            avg_message_length: Some(80.0),
            message,
            config,
        }
    }

    fn archetype(cognitive: f64, control: f64) -> Option<ArchetypeScores> {
        Some(ArchetypeScores {
            cognitive,
            control,
            somatic: 20.0,
            social: 20.0,
        })
    }

    #[test]
    fn test_rule_order() {
        let names: Vec<&str> = MODE_RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "crisis",
                "acute_distress",
                "high_anxiety",
                "preference",
                "youth",
                "cognitive_archetype",
                "control_archetype",
                "terse",
                "technical",
                "reflective",
            ]
        );
    }

    #[test]
    fn test_crisis_dominates_everything() {
        let config = EngineConfig::default();
        let prefs = [None, Some(Mode::Minimal), Some(Mode::Nerd), Some(Mode::Kid)];
        for step in 0..=20 {
            let anxiety = step as f64 * 0.5;
            for preferred_mode in prefs {
                for panic_language in [false, true] {
                    let c = ModeContext {
                        crisis: true,
                        panic_language,
                        preferred_mode,
                        age: Some(8),
                        archetype: archetype(95.0, 10.0),
                        ..ctx(&config, anxiety, "how does lift work")
                    };
                    assert_eq!(ModeSelector::select(&c), Mode::CrisisProtocol);
                }
            }
        }
    }

    #[test]
    fn test_acute_distress() {
        let config = EngineConfig::default();
        let (mode, rule) = ModeSelector::select_with_rule(&ctx(&config, 9.0, ""));
        assert_eq!((mode, rule), (Mode::Soft, "acute_distress"));

        let c = ModeContext {
            panic_language: true,
            ..ctx(&config, 2.0, "")
        };
        assert_eq!(ModeSelector::select(&c), Mode::Soft);

        let c = ModeContext {
            preferred_mode: Some(Mode::Minimal),
            ..ctx(&config, 9.5, "")
        };
        assert_eq!(ModeSelector::select(&c), Mode::Minimal);
    }

    #[test]
    fn test_high_anxiety_overrides_preference() {
        let config = EngineConfig::default();
        let c = ModeContext {
            preferred_mode: Some(Mode::Nerd),
            ..ctx(&config, 7.0, "how does the autopilot work")
        };
        assert_eq!(
            ModeSelector::select_with_rule(&c),
            (Mode::Soft, "high_anxiety")
        );
    }

    #[test]
    fn test_never_playful_at_crisis_band() {
        let config = EngineConfig::default();
        let prefs = [None, Some(Mode::Classic), Some(Mode::Nerd), Some(Mode::Mystic)];
        for anxiety in [9.0, 9.5, 10.0] {
            for preferred_mode in prefs {
                for message in ["how does lift work", "I pray a lot", ""] {
                    let c = ModeContext {
                        preferred_mode,
                        ..ctx(&config, anxiety, message)
                    };
                    let mode = ModeSelector::select(&c);
                    assert!(
                        !matches!(mode, Mode::Classic | Mode::Nerd | Mode::Mystic),
                        "{anxiety} {preferred_mode:?} {message:?} -> {mode:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_preference_beats_personalization() {
        let config = EngineConfig::default();
        let c = ModeContext {
            preferred_mode: Some(Mode::Mystic),
            age: Some(9),
            archetype: archetype(90.0, 0.0),
            ..ctx(&config, 6.9, "how does lift work")
        };
        assert_eq!(
            ModeSelector::select_with_rule(&c),
            (Mode::Mystic, "preference")
        );
    }

    #[test]
    fn test_youth() {
        let config = EngineConfig::default();
        let c = ModeContext {
            age: Some(10),
            ..ctx(&config, 3.0, "")
        };
        assert_eq!(ModeSelector::select(&c), Mode::Kid);

        let c = ModeContext {
            age: None,
            ..ctx(&config, 3.0, "")
        };
        assert_eq!(ModeSelector::select(&c), Mode::Classic);
    }

    #[test]
    fn test_archetypes() {
        let config = EngineConfig::default();
        let c = ModeContext {
            archetype: archetype(75.0, 30.0),
            ..ctx(&config, 4.0, "")
        };
        assert_eq!(ModeSelector::select(&c), Mode::Clinical);

        let c = ModeContext {
            archetype: archetype(30.0, 71.0),
            ..ctx(&config, 4.0, "how does lift work")
        };
        assert_eq!(
            ModeSelector::select_with_rule(&c),
            (Mode::Classic, "control_archetype")
        );

        // A dominant trait at exactly the threshold does not count
        let c = ModeContext {
            archetype: archetype(70.0, 10.0),
            ..ctx(&config, 4.0, "")
        };
        assert_eq!(ModeSelector::select_with_rule(&c).1, "default");
    }

    #[test]
    fn test_terse_then_cues() {
        let config = EngineConfig::default();
        let c = ModeContext {
            avg_message_length: Some(12.0),
            ..ctx(&config, 5.0, "how does lift work")
        };
        assert_eq!(ModeSelector::select(&c), Mode::Minimal);

        let c = ctx(&config, 5.0, "How does the plane stay up? Is it physics?");
        assert_eq!(ModeSelector::select(&c), Mode::Nerd);

        let c = ctx(&config, 5.0, "I've been meditating and trying to let go");
        assert_eq!(ModeSelector::select(&c), Mode::Mystic);

        let c = ctx(&config, 5.0, "ok");
        assert_eq!(ModeSelector::select_with_rule(&c), (Mode::Classic, "default"));
    }

    #[test]
    fn test_custom_youth_threshold() {
        let config = EngineConfig {
            youth_age_threshold: 18,
            ..Default::default()
        };
        let c = ModeContext {
            age: Some(16),
            ..ctx(&config, 3.0, "")
        };
        assert_eq!(ModeSelector::select(&c), Mode::Kid);
    }
}
