use crate::error::{EngineError, EngineResult};
use crate::model::{Group, MatchPrediction, TeamStanding};

pub const GROUP_SIZE: usize = 4;
pub const GROUP_MATCHES: usize = 6;
/// Highest score accepted for one side of a match.
pub const MAX_SCORE: i32 = 99;

/// Build the raw (unordered) table for one group from its six predictions.
///
/// Only regulation scores count; extra time and penalties never apply in the
/// group stage. Rows come back in the group's own team order with
/// `position == 0`; ordering is the tie-break resolver's job.
pub fn compute_standings(
    group: &Group,
    predictions: &[MatchPrediction],
) -> EngineResult<Vec<TeamStanding>> {
    if group.teams.len() != GROUP_SIZE {
        return Err(EngineError::InvalidConfig(format!(
            "group {} has {} teams, expected {GROUP_SIZE}",
            group.id,
            group.teams.len()
        )));
    }

    for (idx, pred) in predictions.iter().enumerate() {
        check_score(pred.match_id, pred.home_score)?;
        check_score(pred.match_id, pred.away_score)?;
        for team in [pred.home_team, pred.away_team] {
            if !group.contains(team) {
                return Err(EngineError::UnknownTeam {
                    group: group.id,
                    team,
                });
            }
        }
        if pred.home_team == pred.away_team {
            return Err(EngineError::UnknownTeam {
                group: group.id,
                team: pred.home_team,
            });
        }
        if predictions[..idx].iter().any(|prev| prev.same_fixture(pred)) {
            return Err(EngineError::DuplicateFixture {
                group: group.id,
                home: pred.home_team,
                away: pred.away_team,
            });
        }
    }

    // Six distinct fixtures among four teams is the full round robin.
    if predictions.len() < GROUP_MATCHES {
        return Err(EngineError::IncompleteGroup {
            group: group.id,
            found: predictions.len(),
        });
    }

    let mut rows: Vec<TeamStanding> =
        group.teams.iter().map(|t| TeamStanding::new(t.id)).collect();
    for pred in predictions {
        let home = pred.home_score as u32;
        let away = pred.away_score as u32;
        if let Some(row) = rows.iter_mut().find(|r| r.team == pred.home_team) {
            apply_result(row, home, away);
        }
        if let Some(row) = rows.iter_mut().find(|r| r.team == pred.away_team) {
            apply_result(row, away, home);
        }
    }
    Ok(rows)
}

pub(crate) fn check_score(match_id: u32, score: i32) -> EngineResult<()> {
    if !(0..=MAX_SCORE).contains(&score) {
        return Err(EngineError::InvalidScore { match_id, score });
    }
    Ok(())
}

fn apply_result(row: &mut TeamStanding, scored: u32, conceded: u32) {
    row.played += 1;
    row.goals_for += scored;
    row.goals_against += conceded;
    if scored > conceded {
        row.won += 1;
    } else if scored < conceded {
        row.lost += 1;
    } else {
        row.drawn += 1;
    }
    row.points = 3 * row.won + row.drawn;
    row.goal_difference = row.goals_for as i32 - row.goals_against as i32;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Team;

    fn group() -> Group {
        Group {
            id: 'A',
            teams: (1..=4)
                .map(|id| Team {
                    id,
                    name: format!("Team {id}"),
                    fifa_code: format!("T{id:02}"),
                })
                .collect(),
        }
    }

    #[test]
    fn draw_gives_one_point_each() {
        let mut row = TeamStanding::new(1);
        apply_result(&mut row, 2, 2);
        assert_eq!(row.points, 1);
        assert_eq!(row.drawn, 1);
        assert_eq!(row.goal_difference, 0);
    }

    #[test]
    fn reversed_fixture_counts_as_duplicate() {
        let preds = vec![
            MatchPrediction::regulation(1, 1, 2, 1, 0),
            MatchPrediction::regulation(2, 2, 1, 0, 0),
        ];
        let err = compute_standings(&group(), &preds).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateFixture { group: 'A', .. }));
    }

    #[test]
    fn score_above_cap_is_rejected_before_accumulating() {
        let preds: Vec<MatchPrediction> = [(1, 2), (3, 4), (1, 3), (2, 4), (1, 4), (2, 3)]
            .iter()
            .enumerate()
            .map(|(idx, &(h, a))| {
                let score = if idx % 2 == 0 { i32::MAX } else { 0 };
                MatchPrediction::regulation(idx as u32 + 1, h, a, score, 0)
            })
            .collect();
        let err = compute_standings(&group(), &preds).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidScore {
                match_id: 1,
                score: i32::MAX
            }
        );
    }

    #[test]
    fn score_at_cap_is_accepted() {
        let preds: Vec<MatchPrediction> = [(1, 2), (3, 4), (1, 3), (2, 4), (1, 4), (2, 3)]
            .iter()
            .enumerate()
            .map(|(idx, &(h, a))| MatchPrediction::regulation(idx as u32 + 1, h, a, MAX_SCORE, 0))
            .collect();
        let rows = compute_standings(&group(), &preds).unwrap();
        assert_eq!(rows[0].goals_for, 3 * MAX_SCORE as u32);
        assert_eq!(rows[0].goal_difference, 3 * MAX_SCORE);
    }

    #[test]
    fn outsider_team_is_rejected() {
        let preds = vec![MatchPrediction::regulation(1, 1, 9, 1, 0)];
        let err = compute_standings(&group(), &preds).unwrap_err();
        assert_eq!(err, EngineError::UnknownTeam { group: 'A', team: 9 });
    }
}
