mod common;

use wc26_predictor::EngineError;
use wc26_predictor::best_third::rank_best_thirds;
use wc26_predictor::model::{GroupTable, MatchPrediction};
use wc26_predictor::snapshot::PredictionSnapshot;
use wc26_predictor::tiebreak::resolve_group;

use common::complete_snapshot;

fn tables(snapshot: &PredictionSnapshot) -> Vec<GroupTable> {
    snapshot
        .groups
        .iter()
        .map(|g| resolve_group(&g.group, &g.matches, &g.manual_orders).unwrap())
        .collect()
}

/// Replace the third-place decider (t2 v t3) of a fixture group.
fn set_third_match(snapshot: &mut PredictionSnapshot, group: char, home: i32, away: i32) {
    let entry = snapshot.group_mut(group).unwrap();
    let t2 = entry.group.teams[2].id;
    let t3 = entry.group.teams[3].id;
    let id = entry
        .matches
        .iter()
        .find(|m| m.home_team == t2 && m.away_team == t3)
        .unwrap()
        .match_id;
    snapshot.upsert_group_match(group, MatchPrediction::regulation(id, t2, t3, home, away));
}

#[test]
fn twelve_groups_rank_and_top_eight_qualify() {
    let snapshot = complete_snapshot();
    let ranked = rank_best_thirds(&tables(&snapshot), 12, 8, &[]).unwrap();

    let order: String = ranked.iter().map(|e| e.from_group_id).collect();
    assert_eq!(order, "ABCDEFGHLIJK");
    let qualified: String = ranked
        .iter()
        .filter(|e| e.qualified)
        .map(|e| e.from_group_id)
        .collect();
    assert_eq!(qualified, "ABCDEFGH");
    assert!(ranked.iter().all(|e| !e.has_tiebreak_conflict));
    assert_eq!(ranked[8].ranking_position, 9);
    assert!(!ranked[8].qualified);
}

#[test]
fn eleven_groups_are_not_enough() {
    let snapshot = complete_snapshot();
    let mut all = tables(&snapshot);
    all.pop();
    let err = rank_best_thirds(&all, 12, 8, &[]).unwrap_err();
    assert_eq!(
        err,
        EngineError::GroupsIncomplete {
            resolved: 11,
            expected: 12
        }
    );
}

#[test]
fn tied_thirds_are_flagged_and_keep_group_order() {
    let mut snapshot = complete_snapshot();
    // B's third now matches A's third exactly: 3 pts, +2, 4 goals.
    set_third_match(&mut snapshot, 'B', 4, 0);
    let ranked = rank_best_thirds(&tables(&snapshot), 12, 8, &[]).unwrap();

    assert_eq!(ranked[0].team, 3);
    assert_eq!(ranked[1].team, 7);
    assert!(ranked[0].has_tiebreak_conflict);
    assert_eq!(ranked[0].tiebreak_group, Some(vec![3, 7]));
    assert!(!ranked[2].has_tiebreak_conflict);
}

#[test]
fn manual_orders_apply_per_cluster() {
    let mut snapshot = complete_snapshot();
    set_third_match(&mut snapshot, 'B', 4, 0);
    // I's third now level with H's third on the qualification line.
    set_third_match(&mut snapshot, 'I', 1, 0);
    let all = tables(&snapshot);

    let unresolved = rank_best_thirds(&all, 12, 8, &[]).unwrap();
    assert_eq!(unresolved[7].team, 31);
    assert_eq!(unresolved[8].team, 35);
    assert!(unresolved[7].qualified && !unresolved[8].qualified);

    let ranked = rank_best_thirds(&all, 12, 8, &[vec![35, 31]]).unwrap();
    assert_eq!(ranked[7].team, 35);
    assert!(ranked[7].qualified);
    assert_eq!(ranked[8].team, 31);
    assert!(!ranked[8].qualified);
    assert_eq!(ranked[7].manual_tiebreak_order, Some(vec![35, 31]));
    // The A/B cluster is untouched by the H/I order.
    assert_eq!((ranked[0].team, ranked[1].team), (3, 7));
    assert!(ranked[0].has_tiebreak_conflict);
}

#[test]
fn manual_order_mixing_clusters_is_rejected() {
    let mut snapshot = complete_snapshot();
    set_third_match(&mut snapshot, 'B', 4, 0);
    let err = rank_best_thirds(&tables(&snapshot), 12, 8, &[vec![7, 11]]).unwrap_err();
    assert!(matches!(err, EngineError::InvalidManualOrder { .. }));
}
