//! Intervention ranking
//!
//! Generates the calming tools that fit the moment, scores each on four
//! components and ranks them with weights chosen by the predicted trajectory.
//!
//! ## Candidates
//!
//! - Box breathing: always
//! - Physiological sigh: only when it has worked for this user before
//! - Takeoff countdown: only in high-salience phases
//! - Aviation education: only for control-seeking users at anxiety <= 6
//! - Validation only: always, the zero-risk fallback

use crate::config::EngineConfig;
use crate::types::{
    FlightPhase, HistoricalProfile, InterventionCandidate, ResponsePattern, ToolId, ToolUrgency,
    TrajectoryOutcome,
};
use tracing::debug;

/// Highest anxiety at which education is offered
const EDUCATION_MAX_ANXIETY: f64 = 6.0;

/// Extra meta-anxiety risk for a tool the user found unhelpful before
const INEFFECTIVE_RISK_PENALTY: f64 = 0.3;

/// Highest risk a tool may carry when a spike is predicted
const SPIKE_MAX_RISK: f64 = 0.2;

/// Component scores for a tool: (relief, skill, agency, risk)
fn base_scores(tool: ToolId) -> (f64, f64, f64, f64) {
    match tool {
        ToolId::BoxBreathing => (0.7, 0.7, 0.6, 0.1),
        ToolId::PhysiologicalSigh => (0.9, 0.4, 0.5, 0.1),
        ToolId::TakeoffCountdown => (0.8, 0.2, 0.4, 0.15),
        ToolId::AviationEducation => (0.3, 0.85, 0.8, 0.3),
        ToolId::ValidationOnly => (0.3, 0.0, 0.1, 0.0),
    }
}

/// Composite weights for one trajectory outcome. `risk` is negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub relief: f64,
    pub skill: f64,
    pub agency: f64,
    pub risk: f64,
}

impl ScoreWeights {
    pub fn for_outcome(outcome: TrajectoryOutcome) -> Self {
        match outcome {
            TrajectoryOutcome::LikelySpike => Self {
                relief: 0.5,
                skill: 0.2,
                agency: 0.2,
                risk: -0.2,
            },
            TrajectoryOutcome::LikelyPlateau => Self {
                relief: 0.3,
                skill: 0.3,
                agency: 0.3,
                risk: -0.1,
            },
            TrajectoryOutcome::LikelyCalm => Self {
                relief: 0.2,
                skill: 0.4,
                agency: 0.3,
                risk: -0.1,
            },
        }
    }

    fn composite(&self, c: &InterventionCandidate) -> f64 {
        self.relief * c.immediate_relief
            + self.skill * c.skill_building
            + self.agency * c.agency
            + self.risk * c.meta_anxiety_risk
    }
}

/// What the ranker needs to know about the user and the moment
#[derive(Debug, Clone, Copy)]
pub struct RankingInput<'a> {
    pub outcome: TrajectoryOutcome,
    pub anxiety: f64,
    pub phase: FlightPhase,
    /// Control-seeking flag or a dominant control archetype
    pub control_seeking: bool,
    pub profile: &'a HistoricalProfile,
}

/// Tool chosen for the reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToolSelection {
    pub tool: Option<ToolId>,
    pub launched: bool,
    /// The ranking settled on validating without a tool
    pub validation_only: bool,
}

/// Ranker for calming tools
pub struct InterventionRanker;

impl InterventionRanker {
    /// Candidates for this moment with component scores, unranked
    pub fn candidates(input: &RankingInput) -> Vec<InterventionCandidate> {
        let profile = input.profile;
        let mut tools = vec![ToolId::BoxBreathing];

        if profile.tools_effective.contains(&ToolId::PhysiologicalSigh)
            && !profile.tools_ineffective.contains(&ToolId::PhysiologicalSigh)
        {
            tools.push(ToolId::PhysiologicalSigh);
        }
        if input.phase.is_high_salience() {
            tools.push(ToolId::TakeoffCountdown);
        }
        if input.control_seeking && input.anxiety <= EDUCATION_MAX_ANXIETY {
            tools.push(ToolId::AviationEducation);
        }
        tools.push(ToolId::ValidationOnly);

        tools
            .into_iter()
            .map(|tool| {
                let (relief, skill, agency, mut risk) = base_scores(tool);
                if profile.tools_ineffective.contains(&tool) {
                    risk = (risk + INEFFECTIVE_RISK_PENALTY).min(1.0);
                }
                InterventionCandidate {
                    tool,
                    immediate_relief: relief,
                    skill_building: skill,
                    agency,
                    meta_anxiety_risk: risk,
                    composite: 0.0,
                }
            })
            .collect()
    }

    /// Scored candidates, best first. Equal scores keep generation order.
    pub fn rank(input: &RankingInput) -> Vec<InterventionCandidate> {
        let weights = ScoreWeights::for_outcome(input.outcome);
        let mut ranked: Vec<InterventionCandidate> = Self::candidates(input)
            .into_iter()
            .map(|mut c| {
                c.composite = weights.composite(&c);
                c
            })
            .collect();

        if input.outcome == TrajectoryOutcome::LikelySpike
            && ranked.iter().any(|c| c.meta_anxiety_risk <= SPIKE_MAX_RISK)
        {
            ranked.retain(|c| c.meta_anxiety_risk <= SPIKE_MAX_RISK);
        }

        ranked.sort_by(|a, b| b.composite.total_cmp(&a.composite));
        ranked
    }

    /// Pick the tool for the reply from a ranking
    pub fn select(
        ranked: &[InterventionCandidate],
        pattern: &ResponsePattern,
        anxiety: f64,
        config: &EngineConfig,
    ) -> ToolSelection {
        if pattern.tool_urgency == ToolUrgency::IfRequested {
            return ToolSelection::default();
        }

        let Some(top) = ranked.first() else {
            return ToolSelection::default();
        };

        if top.tool == ToolId::ValidationOnly {
            return ToolSelection {
                tool: None,
                launched: false,
                validation_only: true,
            };
        }

        let launched = pattern.tool_urgency == ToolUrgency::Immediate
            && anxiety >= config.auto_launch_min_anxiety;
        debug!(tool = top.tool.as_str(), composite = top.composite, launched, "tool selected");

        ToolSelection {
            tool: Some(top.tool),
            launched,
            validation_only: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnxietyBands;
    use crate::pattern::ResponsePatternSelector;
    use crate::types::Verbosity;
    use pretty_assertions::assert_eq;

    fn make_profile(effective: &[ToolId], ineffective: &[ToolId]) -> HistoricalProfile {
        HistoricalProfile {
            tools_effective: effective.to_vec(),
            tools_ineffective: ineffective.to_vec(),
            ..Default::default()
        }
    }

    fn make_input(
        outcome: TrajectoryOutcome,
        anxiety: f64,
        phase: FlightPhase,
        control_seeking: bool,
        profile: &HistoricalProfile,
    ) -> RankingInput<'_> {
        RankingInput {
            outcome,
            anxiety,
            phase,
            control_seeking,
            profile,
        }
    }

    fn tools(ranked: &[InterventionCandidate]) -> Vec<ToolId> {
        ranked.iter().map(|c| c.tool).collect()
    }

    #[test]
    fn test_candidate_generation() {
        let profile = make_profile(&[], &[]);
        let input = make_input(
            TrajectoryOutcome::LikelyPlateau,
            5.0,
            FlightPhase::Cruise,
            false,
            &profile,
        );
        assert_eq!(
            tools(&InterventionRanker::candidates(&input)),
            vec![ToolId::BoxBreathing, ToolId::ValidationOnly]
        );

        let profile = make_profile(&[ToolId::PhysiologicalSigh], &[]);
        let input = make_input(
            TrajectoryOutcome::LikelyPlateau,
            5.0,
            FlightPhase::Takeoff,
            true,
            &profile,
        );
        assert_eq!(
            tools(&InterventionRanker::candidates(&input)),
            vec![
                ToolId::BoxBreathing,
                ToolId::PhysiologicalSigh,
                ToolId::TakeoffCountdown,
                ToolId::AviationEducation,
                ToolId::ValidationOnly,
            ]
        );
    }

    #[test]
    fn test_education_needs_low_anxiety() {
        let profile = make_profile(&[], &[]);
        let input = make_input(
            TrajectoryOutcome::LikelyCalm,
            6.5,
            FlightPhase::Cruise,
            true,
            &profile,
        );
        let candidates = tools(&InterventionRanker::candidates(&input));
        assert!(!candidates.contains(&ToolId::AviationEducation));

        let input = make_input(
            TrajectoryOutcome::LikelyCalm,
            6.0,
            FlightPhase::Cruise,
            true,
            &profile,
        );
        let candidates = tools(&InterventionRanker::candidates(&input));
        assert!(candidates.contains(&ToolId::AviationEducation));
    }

    #[test]
    fn test_sigh_needs_history() {
        let profile = make_profile(&[ToolId::PhysiologicalSigh], &[ToolId::PhysiologicalSigh]);
        let input = make_input(
            TrajectoryOutcome::LikelySpike,
            8.0,
            FlightPhase::Cruise,
            false,
            &profile,
        );
        let candidates = tools(&InterventionRanker::candidates(&input));
        assert!(!candidates.contains(&ToolId::PhysiologicalSigh));
    }

    #[test]
    fn test_spike_prefers_fast_relief() {
        let profile = make_profile(&[ToolId::PhysiologicalSigh], &[]);
        let input = make_input(
            TrajectoryOutcome::LikelySpike,
            8.0,
            FlightPhase::Cruise,
            false,
            &profile,
        );
        let ranked = InterventionRanker::rank(&input);
        assert_eq!(ranked[0].tool, ToolId::PhysiologicalSigh);

        let profile = make_profile(&[], &[]);
        let input = make_input(
            TrajectoryOutcome::LikelySpike,
            8.0,
            FlightPhase::Cruise,
            false,
            &profile,
        );
        assert_eq!(InterventionRanker::rank(&input)[0].tool, ToolId::BoxBreathing);
    }

    #[test]
    fn test_plateau_and_calm_rankings() {
        let profile = make_profile(&[ToolId::PhysiologicalSigh], &[]);
        let input = make_input(
            TrajectoryOutcome::LikelyPlateau,
            5.0,
            FlightPhase::Cruise,
            true,
            &profile,
        );
        assert_eq!(InterventionRanker::rank(&input)[0].tool, ToolId::BoxBreathing);

        let input = make_input(
            TrajectoryOutcome::LikelyCalm,
            5.0,
            FlightPhase::Cruise,
            true,
            &profile,
        );
        assert_eq!(InterventionRanker::rank(&input)[0].tool, ToolId::AviationEducation);
    }

    #[test]
    fn test_spike_never_selects_risky_tool() {
        let tried = [ToolId::BoxBreathing, ToolId::PhysiologicalSigh, ToolId::TakeoffCountdown];
        let none: &[ToolId] = &[];
        let phases = [FlightPhase::Cruise, FlightPhase::Takeoff, FlightPhase::DoorClose];
        for phase in phases {
            for control_seeking in [false, true] {
                for ineffective in [none, &tried[..1], &tried[..]] {
                    let profile = make_profile(&[ToolId::PhysiologicalSigh], ineffective);
                    for step in 0..=20 {
                        let anxiety = step as f64 * 0.5;
                        let input = make_input(
                            TrajectoryOutcome::LikelySpike,
                            anxiety,
                            phase,
                            control_seeking,
                            &profile,
                        );
                        let ranked = InterventionRanker::rank(&input);
                        assert!(ranked[0].meta_anxiety_risk <= SPIKE_MAX_RISK);
                        assert!(ranked.iter().all(|c| c.meta_anxiety_risk <= SPIKE_MAX_RISK));
                    }
                }
            }
        }
    }

    #[test]
    fn test_ineffective_penalty() {
        let profile = make_profile(&[], &[ToolId::BoxBreathing]);
        let input = make_input(
            TrajectoryOutcome::LikelyPlateau,
            5.0,
            FlightPhase::Cruise,
            false,
            &profile,
        );
        let candidates = InterventionRanker::candidates(&input);
        assert!((candidates[0].meta_anxiety_risk - 0.4).abs() < 1e-9);

        // In a spike the penalized breathing drops out, leaving validation
        let input = make_input(
            TrajectoryOutcome::LikelySpike,
            8.0,
            FlightPhase::Cruise,
            false,
            &profile,
        );
        assert_eq!(tools(&InterventionRanker::rank(&input)), vec![ToolId::ValidationOnly]);
    }

    #[test]
    fn test_select_respects_urgency() {
        let config = EngineConfig::default();
        let bands = AnxietyBands::default();
        let profile = make_profile(&[], &[]);

        let input = make_input(
            TrajectoryOutcome::LikelyPlateau,
            2.0,
            FlightPhase::Cruise,
            false,
            &profile,
        );
        let ranked = InterventionRanker::rank(&input);
        let pattern = ResponsePatternSelector::select(2.0, &bands, Verbosity::Normal);
        assert_eq!(
            InterventionRanker::select(&ranked, &pattern, 2.0, &config),
            ToolSelection::default()
        );

        let pattern = ResponsePatternSelector::select(5.0, &bands, Verbosity::Normal);
        let selection = InterventionRanker::select(&ranked, &pattern, 5.0, &config);
        assert_eq!(selection.tool, Some(ToolId::BoxBreathing));
        assert!(!selection.launched);
    }

    #[test]
    fn test_auto_launch_only_when_immediate() {
        let config = EngineConfig::default();
        let bands = AnxietyBands::default();
        let profile = make_profile(&[], &[]);
        let input = make_input(
            TrajectoryOutcome::LikelySpike,
            9.5,
            FlightPhase::Cruise,
            false,
            &profile,
        );
        let ranked = InterventionRanker::rank(&input);

        let pattern = ResponsePatternSelector::select(9.5, &bands, Verbosity::Normal);
        assert!(InterventionRanker::select(&ranked, &pattern, 9.5, &config).launched);

        // High band offers now but never launches
        let pattern = ResponsePatternSelector::select(8.5, &bands, Verbosity::Normal);
        assert!(!InterventionRanker::select(&ranked, &pattern, 8.5, &config).launched);
    }

    #[test]
    fn test_validation_only_winner() {
        let config = EngineConfig::default();
        let ranked = vec![InterventionCandidate {
            tool: ToolId::ValidationOnly,
            immediate_relief: 0.3,
            skill_building: 0.0,
            agency: 0.1,
            meta_anxiety_risk: 0.0,
            composite: 0.17,
        }];
        let pattern =
            ResponsePatternSelector::select(9.5, &AnxietyBands::default(), Verbosity::Normal);
        let selection = InterventionRanker::select(&ranked, &pattern, 9.5, &config);
        assert_eq!(
            selection,
            ToolSelection {
                tool: None,
                launched: false,
                validation_only: true,
            }
        );
    }
}
