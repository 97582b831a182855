#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use wc26_predictor::model::{Group, MatchPrediction, Team, TeamId};
use wc26_predictor::snapshot::PredictionSnapshot;

pub fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

pub fn complete_snapshot() -> PredictionSnapshot {
    serde_json::from_str(&read_fixture("snapshot_complete.json")).expect("fixture should parse")
}

pub fn group(id: char, first_team: TeamId) -> Group {
    Group {
        id,
        teams: (first_team..first_team + 4)
            .map(|team| Team {
                id: team,
                name: format!("Team {team}"),
                fifa_code: format!("T{team:02}"),
            })
            .collect(),
    }
}

/// Six fixtures in round-robin order, scores given per fixture.
pub fn round_robin(
    group: &Group,
    first_match: u32,
    scores: [(i32, i32); 6],
) -> Vec<MatchPrediction> {
    let ids: Vec<TeamId> = group.teams.iter().map(|t| t.id).collect();
    let pairs = [(0, 1), (2, 3), (0, 2), (1, 3), (0, 3), (1, 2)];
    pairs
        .iter()
        .zip(scores)
        .enumerate()
        .map(|(idx, (&(h, a), (hs, as_)))| {
            MatchPrediction::regulation(first_match + idx as u32, ids[h], ids[a], hs, as_)
        })
        .collect()
}
