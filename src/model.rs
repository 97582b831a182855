use serde::{Deserialize, Serialize};

pub type TeamId = u32;
pub type GroupId = char;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub fifa_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub teams: Vec<Team>,
}

impl Group {
    pub fn contains(&self, team: TeamId) -> bool {
        self.teams.iter().any(|t| t.id == team)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

/// One predicted scoreline. Group matches only read the regulation score;
/// knockout matches may carry extra time and a penalties winner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPrediction {
    pub match_id: u32,
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub home_score: i32,
    pub away_score: i32,
    #[serde(default, rename = "homeScoreET", skip_serializing_if = "Option::is_none")]
    pub home_score_et: Option<i32>,
    #[serde(default, rename = "awayScoreET", skip_serializing_if = "Option::is_none")]
    pub away_score_et: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalties_winner: Option<Side>,
}

/// Knockout predictions share the group-stage shape; `match_id` is the
/// bracket match number.
pub type KnockoutPrediction = MatchPrediction;

impl MatchPrediction {
    pub fn regulation(
        match_id: u32,
        home_team: TeamId,
        away_team: TeamId,
        home_score: i32,
        away_score: i32,
    ) -> Self {
        Self {
            match_id,
            home_team,
            away_team,
            home_score,
            away_score,
            home_score_et: None,
            away_score_et: None,
            penalties_winner: None,
        }
    }

    pub fn with_extra_time(mut self, home: i32, away: i32) -> Self {
        self.home_score_et = Some(home);
        self.away_score_et = Some(away);
        self
    }

    pub fn with_penalties(mut self, winner: Side) -> Self {
        self.penalties_winner = Some(winner);
        self
    }

    /// Both extra-time scores, only when both are present.
    pub fn extra_time(&self) -> Option<(i32, i32)> {
        Some((self.home_score_et?, self.away_score_et?))
    }

    pub fn team(&self, side: Side) -> TeamId {
        match side {
            Side::Home => self.home_team,
            Side::Away => self.away_team,
        }
    }

    pub(crate) fn same_fixture(&self, other: &MatchPrediction) -> bool {
        (self.home_team == other.home_team && self.away_team == other.away_team)
            || (self.home_team == other.away_team && self.away_team == other.home_team)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStanding {
    pub team: TeamId,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i32,
    pub points: u32,
    /// 1-based rank after tie-breaks; 0 until the table is ordered.
    pub position: u8,
}

impl TeamStanding {
    pub fn new(team: TeamId) -> Self {
        Self {
            team,
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
            points: 0,
            position: 0,
        }
    }
}

/// Teams still level on points, goal difference and goals for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TiebreakGroup {
    /// Teams in their final relative order.
    pub teams: Vec<TeamId>,
    /// First position occupied by the cluster (1-based).
    pub first_position: u8,
    pub manual_order: Option<Vec<TeamId>>,
}

impl TiebreakGroup {
    pub fn has_conflict(&self) -> bool {
        self.manual_order.is_none()
    }

    pub fn contains(&self, team: TeamId) -> bool {
        self.teams.contains(&team)
    }
}

/// A group table after tie-breaks, sorted by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTable {
    pub group: GroupId,
    pub standings: Vec<TeamStanding>,
    pub tiebreaks: Vec<TiebreakGroup>,
}

impl GroupTable {
    pub fn at_position(&self, position: u8) -> Option<&TeamStanding> {
        self.standings.iter().find(|s| s.position == position)
    }

    pub fn has_tiebreak_conflict(&self) -> bool {
        self.tiebreaks.iter().any(TiebreakGroup::has_conflict)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestThirdPlaceEntry {
    pub team: TeamId,
    pub from_group_id: GroupId,
    pub points: u32,
    pub goal_difference: i32,
    pub goals_for: u32,
    pub ranking_position: u8,
    pub qualified: bool,
    pub has_tiebreak_conflict: bool,
    pub tiebreak_group: Option<Vec<TeamId>>,
    pub manual_tiebreak_order: Option<Vec<TeamId>>,
}
