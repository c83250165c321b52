//! Response pattern selection
//!
//! Pure lookup from anxiety band to the shape a reply should take. Higher bands
//! always mean fewer words and a sooner tool offer.

use crate::config::AnxietyBands;
use crate::types::{
    AnxietyBand, EducationDepth, EmpowermentFraming, ResponsePattern, SentenceStyle,
    ToolUrgency, ValidationDepth, Verbosity,
};

/// Selector mapping anxiety to a response shape
pub struct ResponsePatternSelector;

impl ResponsePatternSelector {
    /// Band an anxiety value falls into
    pub fn band(anxiety: f64, bands: &AnxietyBands) -> AnxietyBand {
        if anxiety >= bands.crisis {
            AnxietyBand::Crisis
        } else if anxiety >= bands.high {
            AnxietyBand::High
        } else if anxiety >= bands.moderate {
            AnxietyBand::Moderate
        } else {
            AnxietyBand::Low
        }
    }

    /// Pattern for an anxiety value, scaled to the user's verbosity
    pub fn select(anxiety: f64, bands: &AnxietyBands, verbosity: Verbosity) -> ResponsePattern {
        let mut pattern = Self::for_band(Self::band(anxiety, bands));
        pattern.target_words =
            (pattern.target_words as f64 * verbosity.word_scale()).round() as u32;
        pattern
    }

    /// Base pattern for a band
    pub fn for_band(band: AnxietyBand) -> ResponsePattern {
        match band {
            AnxietyBand::Crisis => ResponsePattern {
                band,
                validation: ValidationDepth::Brief,
                education: EducationDepth::Skip,
                tool_urgency: ToolUrgency::Immediate,
                empowerment: EmpowermentFraming::Grounding,
                target_words: 30,
                sentence_style: SentenceStyle::VeryShort,
                humor_allowed: false,
                explanation_depth: 0,
            },
            AnxietyBand::High => ResponsePattern {
                band,
                validation: ValidationDepth::Direct,
                education: EducationDepth::Minimal,
                tool_urgency: ToolUrgency::OfferNow,
                empowerment: EmpowermentFraming::Reassurance,
                target_words: 60,
                sentence_style: SentenceStyle::Short,
                humor_allowed: false,
                explanation_depth: 1,
            },
            AnxietyBand::Moderate => ResponsePattern {
                band,
                validation: ValidationDepth::Full,
                education: EducationDepth::Moderate,
                tool_urgency: ToolUrgency::Offer,
                empowerment: EmpowermentFraming::Agency,
                target_words: 120,
                sentence_style: SentenceStyle::Conversational,
                humor_allowed: false,
                explanation_depth: 2,
            },
            AnxietyBand::Low => ResponsePattern {
                band,
                validation: ValidationDepth::Light,
                education: EducationDepth::DeepDiveOk,
                tool_urgency: ToolUrgency::IfRequested,
                empowerment: EmpowermentFraming::Curiosity,
                target_words: 200,
                sentence_style: SentenceStyle::Expansive,
                humor_allowed: true,
                explanation_depth: 3,
            },
        }
    }
}
