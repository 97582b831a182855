use std::cmp::Ordering;

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::model::{Group, GroupTable, MatchPrediction, TeamId, TeamStanding, TiebreakGroup};
use crate::standings::compute_standings;

/// Anything ranked by the points / goal difference / goals-for chain.
pub trait RankKey {
    fn team(&self) -> TeamId;
    fn points(&self) -> u32;
    fn goal_difference(&self) -> i32;
    fn goals_for(&self) -> u32;
}

impl RankKey for TeamStanding {
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

fn compare<T: RankKey>(a: &T, b: &T) -> Ordering {
    b.points()
        .cmp(&a.points())
        .then_with(|| b.goal_difference().cmp(&a.goal_difference()))
        .then_with(|| b.goals_for().cmp(&a.goals_for()))
}

#[derive(Debug, Clone)]
pub struct Ranked<T> {
    pub ordered: Vec<T>,
    pub clusters: Vec<TiebreakGroup>,
}

/// Order `entries` by the three-criterion chain.
///
/// The sort is stable, so entries still level keep the input order until a
/// manual order for exactly that cluster is supplied. A manual order sharing
/// teams with a cluster must be a permutation of it; manual orders sharing no
/// team with any cluster are stale and ignored.
pub fn rank<T: RankKey>(
    mut entries: Vec<T>,
    manual_orders: &[Vec<TeamId>],
) -> EngineResult<Ranked<T>> {
    entries.sort_by(compare);

    let mut clusters = Vec::new();
    let mut start = 0;
    while start < entries.len() {
        let mut end = start + 1;
        while end < entries.len() && compare(&entries[start], &entries[end]) == Ordering::Equal {
            end += 1;
        }
        if end - start >= 2 {
            let tied: Vec<TeamId> = entries[start..end].iter().map(RankKey::team).collect();
            let manual = find_manual_order(&tied, manual_orders)?;
            if let Some(order) = manual.as_ref() {
                entries[start..end].sort_by_key(|e| {
                    order.iter().position(|id| *id == e.team()).unwrap_or(usize::MAX)
                });
            }
            clusters.push(TiebreakGroup {
                teams: entries[start..end].iter().map(RankKey::team).collect(),
                first_position: (start + 1) as u8,
                manual_order: manual,
            });
        }
        start = end;
    }

    Ok(Ranked {
        ordered: entries,
        clusters,
    })
}

fn find_manual_order(
    tied: &[TeamId],
    manual_orders: &[Vec<TeamId>],
) -> EngineResult<Option<Vec<TeamId>>> {
    let Some(order) = manual_orders
        .iter()
        .find(|order| order.iter().any(|id| tied.contains(id)))
    else {
        return Ok(None);
    };
    if !is_permutation(order, tied) {
        return Err(EngineError::InvalidManualOrder {
            tied: tied.to_vec(),
            order: order.clone(),
        });
    }
    Ok(Some(order.clone()))
}

fn is_permutation(order: &[TeamId], tied: &[TeamId]) -> bool {
    if order.len() != tied.len() {
        return false;
    }
    let mut a = order.to_vec();
    let mut b = tied.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

/// Standings + tie-breaks for one group: the full group-stage pipeline.
pub fn resolve_group(
    group: &Group,
    predictions: &[MatchPrediction],
    manual_orders: &[Vec<TeamId>],
) -> EngineResult<GroupTable> {
    let rows = compute_standings(group, predictions)?;
    let ranked = rank(rows, manual_orders)?;
    let mut standings = ranked.ordered;
    for (idx, row) in standings.iter_mut().enumerate() {
        row.position = (idx + 1) as u8;
    }
    for cluster in ranked.clusters.iter().filter(|c| c.has_conflict()) {
        debug!(group = %group.id, teams = ?cluster.teams, "unresolved group tiebreak");
    }
    Ok(GroupTable {
        group: group.id,
        standings,
        tiebreaks: ranked.clusters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(team: TeamId, points: u32, gd: i32, gf: u32) -> TeamStanding {
        TeamStanding {
            points,
            goal_difference: gd,
            goals_for: gf,
            ..TeamStanding::new(team)
        }
    }

    #[test]
    fn goals_for_separates_after_goal_difference() {
        let ranked = rank(vec![row(1, 4, 1, 2), row(2, 4, 1, 3)], &[]).unwrap();
        let order: Vec<_> = ranked.ordered.iter().map(|r| r.team).collect();
        assert_eq!(order, vec![2, 1]);
        assert!(ranked.clusters.is_empty());
    }

    #[test]
    fn stale_manual_order_is_ignored() {
        let ranked = rank(vec![row(1, 4, 1, 2), row(2, 3, 1, 3)], &[vec![7, 8]]).unwrap();
        assert!(ranked.clusters.is_empty());
    }

    #[test]
    fn duplicated_ids_are_not_a_permutation() {
        assert!(!is_permutation(&[1, 1], &[1, 2]));
        assert!(is_permutation(&[2, 1], &[1, 2]));
    }
}
