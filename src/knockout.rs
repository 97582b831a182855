use crate::error::{EngineError, EngineResult, KnockoutRule};
use crate::model::{KnockoutPrediction, Side, TeamId};
use crate::standings::check_score;

/// Check a knockout prediction's internal consistency.
///
/// Scores must be non-negative, then all four rules must hold:
/// distinct teams, a regulation tie goes to extra time, an extra-time tie goes
/// to penalties, and a decisive extra time has no penalties winner.
pub fn validate(pred: &KnockoutPrediction) -> EngineResult<()> {
    let id = pred.match_id;
    check_score(id, pred.home_score)?;
    check_score(id, pred.away_score)?;
    for score in [pred.home_score_et, pred.away_score_et].into_iter().flatten() {
        check_score(id, score)?;
    }

    let invalid = |rule| EngineError::KnockoutPredictionInvalid {
        match_number: id,
        rule,
    };

    if pred.home_team == pred.away_team {
        return Err(invalid(KnockoutRule::SameTeams));
    }
    if pred.home_score == pred.away_score && pred.extra_time().is_none() {
        return Err(invalid(KnockoutRule::TieWithoutExtraTime));
    }
    if let Some((home_et, away_et)) = pred.extra_time() {
        if home_et == away_et && pred.penalties_winner.is_none() {
            return Err(invalid(KnockoutRule::ExtraTimeTieWithoutPenalties));
        }
        if home_et != away_et && pred.penalties_winner.is_some() {
            return Err(invalid(KnockoutRule::PenaltiesAfterDecisiveExtraTime));
        }
    }
    Ok(())
}

/// Regulation, then extra time, then penalties. Assumes `validate` passed.
pub fn winning_side(pred: &KnockoutPrediction) -> Side {
    if pred.home_score != pred.away_score {
        return if pred.home_score > pred.away_score {
            Side::Home
        } else {
            Side::Away
        };
    }
    if let Some((home_et, away_et)) = pred.extra_time() {
        if home_et != away_et {
            return if home_et > away_et { Side::Home } else { Side::Away };
        }
    }
    pred.penalties_winner.unwrap_or(Side::Home)
}

pub fn winner(pred: &KnockoutPrediction) -> TeamId {
    pred.team(winning_side(pred))
}

pub fn loser(pred: &KnockoutPrediction) -> TeamId {
    pred.team(winning_side(pred).other())
}
