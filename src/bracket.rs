use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::config::{Phase, SlotSource, TournamentConfig};
use crate::error::{EngineError, EngineResult};
use crate::knockout;
use crate::model::{KnockoutPrediction, Side, TeamId};
use crate::seeding::Seeds;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BracketSlot {
    Team { team: TeamId },
    Placeholder { description: String, source: SlotSource },
}

impl BracketSlot {
    fn placeholder(source: &SlotSource) -> Self {
        BracketSlot::Placeholder {
            description: source.describe(),
            source: source.clone(),
        }
    }

    pub fn team(&self) -> Option<TeamId> {
        match self {
            BracketSlot::Team { team } => Some(*team),
            BracketSlot::Placeholder { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchState {
    /// At least one slot is still a placeholder.
    Unresolved,
    /// Both teams known, no prediction yet.
    Ready,
    Predicted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnockoutMatch {
    pub match_number: u32,
    pub phase: Phase,
    pub home_slot: BracketSlot,
    pub away_slot: BracketSlot,
    pub prediction: Option<KnockoutPrediction>,
}

impl KnockoutMatch {
    pub fn slot(&self, side: Side) -> &BracketSlot {
        match side {
            Side::Home => &self.home_slot,
            Side::Away => &self.away_slot,
        }
    }

    fn slot_mut(&mut self, side: Side) -> &mut BracketSlot {
        match side {
            Side::Home => &mut self.home_slot,
            Side::Away => &mut self.away_slot,
        }
    }

    pub fn teams(&self) -> Option<(TeamId, TeamId)> {
        Some((self.home_slot.team()?, self.away_slot.team()?))
    }

    pub fn state(&self) -> MatchState {
        if self.prediction.is_some() {
            MatchState::Predicted
        } else if self.teams().is_some() {
            MatchState::Ready
        } else {
            MatchState::Unresolved
        }
    }

    pub fn winner(&self) -> Option<TeamId> {
        self.prediction.as_ref().map(knockout::winner)
    }

    pub fn loser(&self) -> Option<TeamId> {
        self.prediction.as_ref().map(knockout::loser)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feed {
    Winner,
    Loser,
}

#[derive(Debug, Clone, Copy)]
struct Dependent {
    target: u32,
    side: Side,
    feed: Feed,
}

/// What one mutation changed downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationReport {
    /// Slots whose content changed, as (match number, side).
    pub rewritten: Vec<(u32, Side)>,
    /// Matches whose prediction was dropped because a team changed.
    pub cleared: Vec<u32>,
}

/// The knockout tree, seeded once and then changed only by predictions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bracket {
    matches: Vec<KnockoutMatch>,
    #[serde(skip)]
    sources: HashMap<(u32, Side), SlotSource>,
    #[serde(skip)]
    index: HashMap<u32, usize>,
    #[serde(skip)]
    dependents: HashMap<u32, Vec<Dependent>>,
}

impl Bracket {
    pub fn new(config: &TournamentConfig, seeds: &Seeds) -> Self {
        let mut topology: Vec<_> = config.matches.iter().collect();
        topology.sort_by_key(|m| (m.phase, m.match_number));

        let mut matches = Vec::with_capacity(topology.len());
        let mut sources = HashMap::new();
        let mut index = HashMap::new();
        let mut dependents: HashMap<u32, Vec<Dependent>> = HashMap::new();

        for m in topology {
            let mut slot_for = |side: Side| {
                let source = m.source(side);
                sources.insert((m.match_number, side), source.clone());
                match source {
                    SlotSource::Winner { source_match } => {
                        dependents.entry(*source_match).or_default().push(Dependent {
                            target: m.match_number,
                            side,
                            feed: Feed::Winner,
                        });
                    }
                    SlotSource::Loser { source_match } => {
                        dependents.entry(*source_match).or_default().push(Dependent {
                            target: m.match_number,
                            side,
                            feed: Feed::Loser,
                        });
                    }
                    _ => {}
                }
                match seeds.get(&(m.match_number, side)) {
                    Some(team) => BracketSlot::Team { team: *team },
                    None => BracketSlot::placeholder(source),
                }
            };
            let home_slot = slot_for(Side::Home);
            let away_slot = slot_for(Side::Away);
            index.insert(m.match_number, matches.len());
            matches.push(KnockoutMatch {
                match_number: m.match_number,
                phase: m.phase,
                home_slot,
                away_slot,
                prediction: None,
            });
        }

        Bracket {
            matches,
            sources,
            index,
            dependents,
        }
    }

    pub fn matches(&self) -> &[KnockoutMatch] {
        &self.matches
    }

    pub fn matches_in(&self, phase: Phase) -> impl Iterator<Item = &KnockoutMatch> {
        self.matches.iter().filter(move |m| m.phase == phase)
    }

    pub fn get(&self, match_number: u32) -> Option<&KnockoutMatch> {
        self.index.get(&match_number).map(|idx| &self.matches[*idx])
    }

    pub fn state(&self, match_number: u32) -> EngineResult<MatchState> {
        self.get(match_number)
            .map(KnockoutMatch::state)
            .ok_or(EngineError::UnknownMatch(match_number))
    }

    pub fn champion(&self) -> Option<TeamId> {
        self.matches_in(Phase::Final).next().and_then(KnockoutMatch::winner)
    }

    pub fn predicted_count(&self) -> usize {
        self.matches.iter().filter(|m| m.prediction.is_some()).count()
    }

    /// Attach a prediction and push its outcome through the tree.
    ///
    /// Re-predicting a match re-propagates; a downstream slot that changes
    /// team drops that match's prediction, and so on down the bracket.
    pub fn predict(
        &mut self,
        match_number: u32,
        prediction: KnockoutPrediction,
    ) -> EngineResult<PropagationReport> {
        let idx = self.position(match_number)?;
        let Some(actual) = self.matches[idx].teams() else {
            return Err(EngineError::MatchNotReady(match_number));
        };
        let mut prediction = prediction;
        prediction.match_id = match_number;
        knockout::validate(&prediction)?;
        let predicted = (prediction.home_team, prediction.away_team);
        if predicted != actual {
            return Err(EngineError::TeamMismatch {
                match_number,
                predicted,
                actual,
            });
        }

        self.matches[idx].prediction = Some(prediction);
        let report = self.propagate(match_number);
        debug!(
            match_number,
            rewritten = report.rewritten.len(),
            cleared = ?report.cleared,
            "knockout prediction applied"
        );
        Ok(report)
    }

    /// Remove a prediction; everything it fed reverts to placeholders.
    pub fn clear_prediction(&mut self, match_number: u32) -> EngineResult<PropagationReport> {
        let idx = self.position(match_number)?;
        if self.matches[idx].prediction.take().is_none() {
            return Ok(PropagationReport::default());
        }
        Ok(self.propagate(match_number))
    }

    fn position(&self, match_number: u32) -> EngineResult<usize> {
        self.index
            .get(&match_number)
            .copied()
            .ok_or(EngineError::UnknownMatch(match_number))
    }

    fn propagate(&mut self, root: u32) -> PropagationReport {
        let mut report = PropagationReport::default();
        let mut stack = vec![root];

        while let Some(current) = stack.pop() {
            let Some(idx) = self.index.get(&current).copied() else {
                continue;
            };
            let (winner, loser) = (self.matches[idx].winner(), self.matches[idx].loser());
            let deps = self.dependents.get(&current).cloned().unwrap_or_default();

            for dep in deps {
                let team = match dep.feed {
                    Feed::Winner => winner,
                    Feed::Loser => loser,
                };
                let Some(target_idx) = self.index.get(&dep.target).copied() else {
                    continue;
                };
                let next = match (team, self.sources.get(&(dep.target, dep.side))) {
                    (Some(team), _) => BracketSlot::Team { team },
                    (None, Some(source)) => BracketSlot::placeholder(source),
                    (None, None) => continue,
                };

                let target = &mut self.matches[target_idx];
                if *target.slot(dep.side) == next {
                    continue;
                }
                *target.slot_mut(dep.side) = next;
                report.rewritten.push((dep.target, dep.side));
                if target.prediction.take().is_some() {
                    debug!(from = current, cleared = dep.target, "cascade cleared prediction");
                    report.cleared.push(dep.target);
                    stack.push(dep.target);
                }
            }
        }
        report
    }
}
