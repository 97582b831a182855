use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, info_span};

use crate::best_third::rank_best_thirds;
use crate::bracket::Bracket;
use crate::config::{Phase, TournamentConfig};
use crate::error::{EngineError, EngineResult};
use crate::model::{
    BestThirdPlaceEntry, Group, GroupId, GroupTable, KnockoutPrediction, MatchPrediction, TeamId,
};
use crate::seeding::seed_round_of_32;
use crate::tiebreak::resolve_group;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPrediction {
    pub group: Group,
    #[serde(default)]
    pub matches: Vec<MatchPrediction>,
    /// User-chosen orders for tied teams, one list per cluster.
    #[serde(default)]
    pub manual_orders: Vec<Vec<TeamId>>,
}

/// One participant's whole prediction, as stored by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionSnapshot {
    #[serde(default)]
    pub groups: Vec<GroupPrediction>,
    #[serde(default)]
    pub best_third_manual_orders: Vec<Vec<TeamId>>,
    #[serde(default)]
    pub knockout: Vec<KnockoutPrediction>,
}

impl PredictionSnapshot {
    pub fn group_mut(&mut self, group: GroupId) -> Option<&mut GroupPrediction> {
        self.groups.iter_mut().find(|g| g.group.id == group)
    }

    /// Insert or replace the group-stage prediction with the same match id.
    pub fn upsert_group_match(&mut self, group: GroupId, prediction: MatchPrediction) -> bool {
        let Some(entry) = self.group_mut(group) else {
            return false;
        };
        match entry.matches.iter_mut().find(|m| m.match_id == prediction.match_id) {
            Some(existing) => *existing = prediction,
            None => entry.matches.push(prediction),
        }
        true
    }

    pub fn upsert_knockout(&mut self, prediction: KnockoutPrediction) {
        match self
            .knockout
            .iter_mut()
            .find(|k| k.match_id == prediction.match_id)
        {
            Some(existing) => *existing = prediction,
            None => self.knockout.push(prediction),
        }
    }

    pub fn set_group_manual_order(&mut self, group: GroupId, order: Vec<TeamId>) -> bool {
        let Some(entry) = self.group_mut(group) else {
            return false;
        };
        entry.manual_orders.retain(|o| !o.iter().any(|id| order.contains(id)));
        entry.manual_orders.push(order);
        true
    }

    pub fn set_best_third_manual_order(&mut self, order: Vec<TeamId>) {
        self.best_third_manual_orders
            .retain(|o| !o.iter().any(|id| order.contains(id)));
        self.best_third_manual_orders.push(order);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum GroupOutcome {
    Resolved { table: GroupTable },
    Incomplete { group: GroupId, predicted: usize },
}

impl GroupOutcome {
    pub fn table(&self) -> Option<&GroupTable> {
        match self {
            GroupOutcome::Resolved { table } => Some(table),
            GroupOutcome::Incomplete { .. } => None,
        }
    }
}

/// Read model derived from a snapshot; never edited directly.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSnapshot {
    pub groups: Vec<GroupOutcome>,
    pub best_thirds: Option<Vec<BestThirdPlaceEntry>>,
    pub bracket: Bracket,
    /// Stored knockout predictions dropped because their teams changed.
    pub invalidated: Vec<u32>,
}

impl ResolvedSnapshot {
    pub fn table(&self, group: GroupId) -> Option<&GroupTable> {
        self.groups
            .iter()
            .filter_map(GroupOutcome::table)
            .find(|t| t.group == group)
    }

    pub fn all_groups_resolved(&self) -> bool {
        self.groups.iter().all(|g| g.table().is_some())
    }

    pub fn has_tiebreak_conflict(&self) -> bool {
        let in_groups = self
            .groups
            .iter()
            .filter_map(GroupOutcome::table)
            .any(GroupTable::has_tiebreak_conflict);
        let in_thirds = self
            .best_thirds
            .as_ref()
            .is_some_and(|entries| entries.iter().any(|e| e.has_tiebreak_conflict));
        in_groups || in_thirds
    }

    pub fn is_complete(&self) -> bool {
        self.all_groups_resolved()
            && !self.has_tiebreak_conflict()
            && self.bracket.champion().is_some()
    }

    /// SHA-256 over the canonical JSON of the read model, base64url.
    pub fn fingerprint(&self) -> serde_json::Result<String> {
        let bytes = serde_json::to_vec(self)?;
        let digest = Sha256::digest(&bytes);
        Ok(URL_SAFE_NO_PAD.encode(digest))
    }
}

/// Derive every read model from a snapshot.
///
/// Pure and idempotent: call it after each mutation instead of patching
/// previous results. Knockout predictions are only accepted once every group
/// is resolved (`GroupsIncomplete` otherwise); without any, a partial bracket
/// of placeholders is still built. Predictions are replayed round by round;
/// one whose teams no longer match the bracket is dropped and reported.
pub fn resolve(
    config: &TournamentConfig,
    snapshot: &PredictionSnapshot,
) -> EngineResult<ResolvedSnapshot> {
    let _span = info_span!("resolve").entered();
    config.validate()?;

    let mut groups = Vec::with_capacity(config.groups.len());
    for group_id in &config.groups {
        let Some(entry) = snapshot.groups.iter().find(|g| g.group.id == *group_id) else {
            groups.push(GroupOutcome::Incomplete {
                group: *group_id,
                predicted: 0,
            });
            continue;
        };
        match resolve_group(&entry.group, &entry.matches, &entry.manual_orders) {
            Ok(table) => groups.push(GroupOutcome::Resolved { table }),
            Err(EngineError::IncompleteGroup { group, found }) => {
                groups.push(GroupOutcome::Incomplete {
                    group,
                    predicted: found,
                });
            }
            Err(err) => return Err(err),
        }
    }

    let tables: Vec<GroupTable> = groups
        .iter()
        .filter_map(GroupOutcome::table)
        .cloned()
        .collect();
    if !snapshot.knockout.is_empty() && tables.len() < config.groups.len() {
        return Err(EngineError::GroupsIncomplete {
            resolved: tables.len(),
            expected: config.groups.len(),
        });
    }
    let best_thirds = if tables.len() == config.groups.len() {
        Some(rank_best_thirds(
            &tables,
            config.groups.len(),
            config.qualified_thirds,
            &snapshot.best_third_manual_orders,
        )?)
    } else {
        debug!(resolved = tables.len(), "best thirds pending");
        None
    };

    let seeds = seed_round_of_32(config, &tables, best_thirds.as_deref())?;
    let mut bracket = Bracket::new(config, &seeds);

    let mut replay: Vec<(Phase, &KnockoutPrediction)> = Vec::with_capacity(snapshot.knockout.len());
    for pred in &snapshot.knockout {
        let topology = config
            .topology(pred.match_id)
            .ok_or(EngineError::UnknownMatch(pred.match_id))?;
        replay.push((topology.phase, pred));
    }
    replay.sort_by_key(|(phase, pred)| (*phase, pred.match_id));

    let mut invalidated = Vec::new();
    for (_, pred) in replay {
        let current = bracket.get(pred.match_id).and_then(|m| m.teams());
        if current != Some((pred.home_team, pred.away_team)) {
            debug!(match_number = pred.match_id, "stored prediction no longer matches bracket");
            invalidated.push(pred.match_id);
            continue;
        }
        bracket.predict(pred.match_id, pred.clone())?;
    }

    info!(
        groups_resolved = tables.len(),
        knockout_predicted = bracket.predicted_count(),
        invalidated = invalidated.len(),
        "snapshot resolved"
    );
    Ok(ResolvedSnapshot {
        groups,
        best_thirds,
        bracket,
        invalidated,
    })
}

/// Resolve many participants at once; output order follows input order.
pub fn resolve_many(
    config: &TournamentConfig,
    snapshots: &[PredictionSnapshot],
) -> Vec<EngineResult<ResolvedSnapshot>> {
    snapshots.par_iter().map(|s| resolve(config, s)).collect()
}
