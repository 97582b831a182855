use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::model::{BestThirdPlaceEntry, GroupTable, TeamId};
use crate::tiebreak::{RankKey, rank};

impl RankKey for BestThirdPlaceEntry {
    fn team(&self) -> TeamId {
        self.team
    }
    fn points(&self) -> u32 {
        self.points
    }
    fn goal_difference(&self) -> i32 {
        self.goal_difference
    }
    fn goals_for(&self) -> u32 {
        self.goals_for
    }
}

/// Rank the third-placed team of every group and mark the top `qualifying`.
///
/// Requires a resolved table for each of `expected_groups`; anything less is
/// `GroupsIncomplete`. Always a full recomputation: one edited score can
/// reorder the whole list. Ties keep group order until a manual order for that
/// cluster is supplied.
pub fn rank_best_thirds(
    tables: &[GroupTable],
    expected_groups: usize,
    qualifying: usize,
    manual_orders: &[Vec<TeamId>],
) -> EngineResult<Vec<BestThirdPlaceEntry>> {
    if tables.len() < expected_groups {
        return Err(EngineError::GroupsIncomplete {
            resolved: tables.len(),
            expected: expected_groups,
        });
    }

    let mut sorted: Vec<&GroupTable> = tables.iter().collect();
    sorted.sort_by_key(|t| t.group);

    let mut entries = Vec::with_capacity(sorted.len());
    for table in sorted {
        let Some(third) = table.at_position(3) else {
            return Err(EngineError::InvalidConfig(format!(
                "group {} table has no third place",
                table.group
            )));
        };
        entries.push(BestThirdPlaceEntry {
            team: third.team,
            from_group_id: table.group,
            points: third.points,
            goal_difference: third.goal_difference,
            goals_for: third.goals_for,
            ranking_position: 0,
            qualified: false,
            has_tiebreak_conflict: false,
            tiebreak_group: None,
            manual_tiebreak_order: None,
        });
    }

    let ranked = rank(entries, manual_orders)?;
    let mut out = ranked.ordered;
    for (idx, entry) in out.iter_mut().enumerate() {
        entry.ranking_position = (idx + 1) as u8;
        entry.qualified = idx < qualifying;
        if let Some(cluster) = ranked.clusters.iter().find(|c| c.contains(entry.team)) {
            entry.has_tiebreak_conflict = cluster.has_conflict();
            entry.tiebreak_group = Some(cluster.teams.clone());
            entry.manual_tiebreak_order = cluster.manual_order.clone();
        }
    }

    let cutoff_conflict = out
        .iter()
        .any(|e| e.has_tiebreak_conflict && straddles_cutoff(e, &out, qualifying));
    if cutoff_conflict {
        debug!(qualifying, "unresolved tiebreak across the qualification line");
    }
    let qualified: String = out
        .iter()
        .filter(|e| e.qualified)
        .map(|e| e.from_group_id)
        .collect();
    debug!(qualified = %qualified, "ranked third-placed teams");
    Ok(out)
}

fn straddles_cutoff(
    entry: &BestThirdPlaceEntry,
    all: &[BestThirdPlaceEntry],
    qualifying: usize,
) -> bool {
    let Some(cluster) = entry.tiebreak_group.as_ref() else {
        return false;
    };
    let inside = all
        .iter()
        .filter(|e| cluster.contains(&e.team))
        .filter(|e| e.qualified)
        .count();
    inside > 0 && inside < cluster.len() && qualifying > 0
}
