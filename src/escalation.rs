//! Escalation to the human-presented authority voice
//!
//! An ordered table of rules, first match wins. When any rule fires the
//! orchestrator drops whatever tool the ranker chose.

use crate::config::EngineConfig;
use crate::history::{elapsed_seconds, SampleHistory};
use crate::phrases::PhraseKind;
use crate::types::{ConversationContext, EscalationDecision, EscalationReason, Trend};
use tracing::debug;

/// Everything the escalation rules look at
#[derive(Debug, Clone, Copy)]
pub struct EscalationContext<'a> {
    pub anxiety: f64,
    pub anxiety_history: &'a SampleHistory,
    pub anxiety_trend: Trend,
    pub panic_language: bool,
    pub dissociation: bool,
    pub conversation: &'a ConversationContext,
    pub message: &'a str,
    pub config: &'a EngineConfig,
}

pub struct EscalationRule {
    pub reason: EscalationReason,
    pub applies: fn(&EscalationContext) -> bool,
}

/// Escalation rules in priority order
pub const ESCALATION_RULES: &[EscalationRule] = &[
    EscalationRule {
        reason: EscalationReason::SustainedHighAnxiety,
        applies: |c| {
            let e = &c.config.escalation;
            c.anxiety >= e.sustained_anxiety
                && sustained_seconds(
                    c.anxiety_history,
                    e.sustained_floor,
                    c.config.sample_interval_sec,
                ) >= e.sustained_duration_sec
        },
    },
    EscalationRule {
        reason: EscalationReason::CatastrophicThinking,
        applies: |c| {
            c.panic_language
                && c.config
                    .phrases
                    .matches(PhraseKind::Catastrophic, c.message)
        },
    },
    EscalationRule {
        reason: EscalationReason::ToolsNotWorking,
        applies: |c| {
            let e = &c.config.escalation;
            c.conversation.tools_offered >= e.min_tools_offered
                && c.conversation.tools_accepted >= e.min_tools_accepted
                && c.anxiety_trend == Trend::Rising
        },
    },
    EscalationRule {
        reason: EscalationReason::Dissociation,
        applies: |c| c.dissociation,
    },
    EscalationRule {
        reason: EscalationReason::ReassuranceIneffective,
        applies: |c| {
            let e = &c.config.escalation;
            c.conversation.validation_only_count >= e.validation_attempts
                && c.anxiety >= e.reassurance_min_anxiety
        },
    },
    EscalationRule {
        reason: EscalationReason::UserRequest,
        applies: |c| {
            c.config
                .phrases
                .matches(PhraseKind::HumanRequest, c.message)
        },
    },
];

/// Seconds the most recent run of samples has stayed at or above `floor`.
///
/// Walks the history newest to oldest. Each qualifying sample contributes the
/// time since its predecessor, or the fallback interval when it has none.
pub fn sustained_seconds(history: &SampleHistory, floor: f64, fallback_sec: f64) -> f64 {
    let samples: Vec<_> = history.iter().collect();
    let mut total = 0.0;

    for (i, sample) in samples.iter().enumerate().rev() {
        if sample.value < floor {
            break;
        }
        total += match i.checked_sub(1) {
            Some(prev) => elapsed_seconds(samples[prev], sample, fallback_sec),
            None => fallback_sec,
        };
    }

    total
}

/// Decider for the human handoff
pub struct EscalationDecider;

impl EscalationDecider {
    pub fn decide(ctx: &EscalationContext) -> EscalationDecision {
        match ESCALATION_RULES.iter().find(|rule| (rule.applies)(ctx)) {
            Some(rule) => {
                debug!(reason = rule.reason.as_str(), anxiety = ctx.anxiety, "escalating");
                EscalationDecision::escalate(rule.reason)
            }
            None => EscalationDecision::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Sample;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    fn make_ctx<'a>(
        config: &'a EngineConfig,
        history: &'a SampleHistory,
        conversation: &'a ConversationContext,
        anxiety: f64,
        message: &'a str,
    ) -> EscalationContext<'a> {
        EscalationContext {
            anxiety,
            anxiety_history: history,
            anxiety_trend: Trend::Stable,
            panic_language: false,
            dissociation: false,
            conversation,
            message,
            config,
        }
    }

    fn reason(ctx: &EscalationContext) -> Option<EscalationReason> {
        EscalationDecider::decide(ctx).reason
    }

    #[test]
    fn test_rule_order() {
        let reasons: Vec<&str> = ESCALATION_RULES.iter().map(|r| r.reason.as_str()).collect();
        assert_eq!(
            reasons,
            vec![
                "sustained_high_anxiety",
                "catastrophic_thinking",
                "tools_not_working",
                "dissociation",
                "reassurance_ineffective",
                "user_request",
            ]
        );
    }

    #[test]
    fn test_no_escalation_by_default() {
        let config = EngineConfig::default();
        let history = SampleHistory::default();
        let conversation = ConversationContext::default();
        let ctx = make_ctx(&config, &history, &conversation, 6.0, "hi");
        let decision = EscalationDecider::decide(&ctx);
        assert_eq!(decision, EscalationDecision::none());
        assert_eq!(decision.template, None);
    }

    #[test]
    fn test_sustained_high_anxiety() {
        let config = EngineConfig::default();
        let conversation = ConversationContext::default();

        let history = SampleHistory::from_values(&[4.0, 7.5, 8.0, 8.5, 9.0, 8.5]);
        let ctx = make_ctx(&config, &history, &conversation, 8.5, "");
        assert_eq!(reason(&ctx), Some(EscalationReason::SustainedHighAnxiety));
        assert_eq!(
            EscalationDecider::decide(&ctx).template,
            Some("charlie_sustained_support")
        );

        // Four minutes is not enough
        let history = SampleHistory::from_values(&[4.0, 8.0, 8.5, 9.0, 8.5]);
        let ctx = make_ctx(&config, &history, &conversation, 8.5, "");
        assert_eq!(reason(&ctx), None);

        // Current anxiety must itself be high
        let history = SampleHistory::from_values(&[8.0, 8.0, 8.0, 8.0, 8.0, 7.5]);
        let ctx = make_ctx(&config, &history, &conversation, 7.5, "");
        assert_eq!(reason(&ctx), None);
    }

    #[test]
    fn test_sustained_uses_timestamps() {
        let start = Utc::now();
        let mut history = SampleHistory::new(10);
        for (minute, value) in [(0, 3.0), (1, 8.0), (2, 8.0), (12, 8.5)] {
            history.push(Sample::at(value, start + Duration::minutes(minute)));
        }
        // Gaps of 10, 1 and 1 minutes behind the three high samples
        assert_eq!(sustained_seconds(&history, 7.0, 60.0), 720.0);
    }

    #[test]
    fn test_sustained_without_predecessor() {
        let history = SampleHistory::from_values(&[7.0, 7.0, 7.0]);
        assert_eq!(sustained_seconds(&history, 7.0, 60.0), 180.0);
        assert_eq!(sustained_seconds(&SampleHistory::default(), 7.0, 60.0), 0.0);
    }

    #[test]
    fn test_catastrophic_thinking_needs_panic() {
        let config = EngineConfig::default();
        let history = SampleHistory::default();
        let conversation = ConversationContext::default();

        let ctx = EscalationContext {
            panic_language: true,
            ..make_ctx(&config, &history, &conversation, 9.5, "I think we're going down")
        };
        assert_eq!(reason(&ctx), Some(EscalationReason::CatastrophicThinking));

        let ctx = make_ctx(&config, &history, &conversation, 9.5, "I think we're going down");
        assert_eq!(reason(&ctx), None);
    }

    #[test]
    fn test_tools_not_working() {
        let config = EngineConfig::default();
        let history = SampleHistory::default();
        let conversation = ConversationContext {
            tools_offered: 2,
            tools_accepted: 1,
            ..Default::default()
        };

        let ctx = EscalationContext {
            anxiety_trend: Trend::Rising,
            ..make_ctx(&config, &history, &conversation, 7.0, "")
        };
        let decision = EscalationDecider::decide(&ctx);
        assert!(decision.escalate);
        assert_eq!(decision.reason, Some(EscalationReason::ToolsNotWorking));

        let ctx = make_ctx(&config, &history, &conversation, 7.0, "");
        assert_eq!(reason(&ctx), None);
    }

    #[test]
    fn test_dissociation() {
        let config = EngineConfig::default();
        let history = SampleHistory::default();
        let conversation = ConversationContext::default();
        let ctx = EscalationContext {
            dissociation: true,
            ..make_ctx(&config, &history, &conversation, 3.0, "")
        };
        assert_eq!(reason(&ctx), Some(EscalationReason::Dissociation));
    }

    #[test]
    fn test_reassurance_ineffective() {
        let config = EngineConfig::default();
        let history = SampleHistory::default();
        let conversation = ConversationContext {
            validation_only_count: 3,
            ..Default::default()
        };
        let ctx = make_ctx(&config, &history, &conversation, 7.0, "");
        assert_eq!(reason(&ctx), Some(EscalationReason::ReassuranceIneffective));

        let ctx = make_ctx(&config, &history, &conversation, 6.5, "");
        assert_eq!(reason(&ctx), None);
    }

    #[test]
    fn test_user_request() {
        let config = EngineConfig::default();
        let history = SampleHistory::default();
        let conversation = ConversationContext::default();
        let ctx = make_ctx(&config, &history, &conversation, 4.0, "Can I talk to a real pilot?");
        let decision = EscalationDecider::decide(&ctx);
        assert_eq!(decision.reason, Some(EscalationReason::UserRequest));
        assert_eq!(decision.template, Some("charlie_introduction"));
    }

    #[test]
    fn test_earlier_rule_wins() {
        let config = EngineConfig::default();
        let history = SampleHistory::default();
        let conversation = ConversationContext {
            tools_offered: 3,
            tools_accepted: 2,
            validation_only_count: 5,
            ..Default::default()
        };
        let ctx = EscalationContext {
            anxiety_trend: Trend::Rising,
            dissociation: true,
            ..make_ctx(&config, &history, &conversation, 8.0, "get me a real person")
        };
        assert_eq!(reason(&ctx), Some(EscalationReason::ToolsNotWorking));
    }
}
