use std::fmt;

use thiserror::Error;

use crate::model::{GroupId, TeamId};

/// Which of the four knockout consistency rules a prediction broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnockoutRule {
    SameTeams,
    TieWithoutExtraTime,
    ExtraTimeTieWithoutPenalties,
    PenaltiesAfterDecisiveExtraTime,
}

impl fmt::Display for KnockoutRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            KnockoutRule::SameTeams => "home and away teams must differ",
            KnockoutRule::TieWithoutExtraTime => {
                "a tie after regulation needs both extra-time scores"
            }
            KnockoutRule::ExtraTimeTieWithoutPenalties => {
                "a tie after extra time needs a penalties winner"
            }
            KnockoutRule::PenaltiesAfterDecisiveExtraTime => {
                "extra time already produced a winner, penalties must be absent"
            }
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("group {group}: expected 6 match predictions, got {found}")]
    IncompleteGroup { group: GroupId, found: usize },

    #[error("group {group}: fixture {home} v {away} predicted more than once")]
    DuplicateFixture {
        group: GroupId,
        home: TeamId,
        away: TeamId,
    },

    #[error("group {group}: team {team} cannot play this fixture")]
    UnknownTeam { group: GroupId, team: TeamId },

    #[error("match {match_id}: invalid score {score}")]
    InvalidScore { match_id: u32, score: i32 },

    #[error("manual order {order:?} is not a permutation of tied teams {tied:?}")]
    InvalidManualOrder { tied: Vec<TeamId>, order: Vec<TeamId> },

    #[error("{resolved} of {expected} groups have complete standings")]
    GroupsIncomplete { resolved: usize, expected: usize },

    #[error("knockout match {match_number}: {rule}")]
    KnockoutPredictionInvalid { match_number: u32, rule: KnockoutRule },

    #[error("unknown knockout match {0}")]
    UnknownMatch(u32),

    #[error("knockout match {0} does not have two concrete teams yet")]
    MatchNotReady(u32),

    #[error(
        "knockout match {match_number}: prediction is for {predicted:?}, bracket has {actual:?}"
    )]
    TeamMismatch {
        match_number: u32,
        predicted: (TeamId, TeamId),
        actual: (TeamId, TeamId),
    },

    #[error("invalid tournament config: {0}")]
    InvalidConfig(String),

    #[error("no seeding slot assignment for third-placed groups {0}")]
    SeedingUnsatisfiable(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
