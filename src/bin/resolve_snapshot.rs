use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use wc26_predictor::bracket::{BracketSlot, KnockoutMatch};
use wc26_predictor::config::{Phase, TournamentConfig};
use wc26_predictor::model::{Team, TeamId};
use wc26_predictor::snapshot::{GroupOutcome, PredictionSnapshot, ResolvedSnapshot};

const DEFAULT_SNAPSHOT: &str = "tests/fixtures/snapshot_complete.json";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Output<'a> {
    resolved_at: String,
    fingerprint: String,
    complete: bool,
    #[serde(flatten)]
    resolved: &'a ResolvedSnapshot,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT));

    let config = TournamentConfig::from_env()?;
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("read snapshot {}", path.display()))?;
    let snapshot: PredictionSnapshot =
        serde_json::from_str(&raw).context("invalid snapshot json")?;
    let resolved = wc26_predictor::resolve(&config, &snapshot)?;

    let json_output = std::env::var("WC26_OUTPUT")
        .map(|v| v.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_output {
        let out = Output {
            resolved_at: Utc::now().to_rfc3339(),
            fingerprint: resolved.fingerprint()?,
            complete: resolved.is_complete(),
            resolved: &resolved,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let teams: HashMap<TeamId, &Team> = snapshot
        .groups
        .iter()
        .flat_map(|g| g.group.teams.iter())
        .map(|t| (t.id, t))
        .collect();
    let code = |id: TeamId| {
        teams
            .get(&id)
            .map(|t| t.fifa_code.clone())
            .unwrap_or_else(|| format!("#{id}"))
    };

    for outcome in &resolved.groups {
        match outcome {
            GroupOutcome::Resolved { table } => {
                println!("Group {}", table.group);
                for row in &table.standings {
                    println!(
                        "  {} {:<4} P{} W{} D{} L{} {:>2}:{:<2} {:+} {:>2} pts",
                        row.position,
                        code(row.team),
                        row.played,
                        row.won,
                        row.drawn,
                        row.lost,
                        row.goals_for,
                        row.goals_against,
                        row.goal_difference,
                        row.points
                    );
                }
                for tie in table.tiebreaks.iter().filter(|t| t.has_conflict()) {
                    let names: Vec<String> = tie.teams.iter().map(|id| code(*id)).collect();
                    println!("  unresolved tie: {}", names.join(", "));
                }
            }
            GroupOutcome::Incomplete { group, predicted } => {
                println!("Group {group}: {predicted}/6 matches predicted");
            }
        }
    }

    match resolved.best_thirds.as_ref() {
        Some(entries) => {
            println!("Third-placed teams");
            for e in entries {
                println!(
                    "  {:>2} {:<4} ({}) {:>2} pts {:+} {}{}",
                    e.ranking_position,
                    code(e.team),
                    e.from_group_id,
                    e.points,
                    e.goal_difference,
                    if e.qualified { "Q" } else { "-" },
                    if e.has_tiebreak_conflict { " tie" } else { "" }
                );
            }
        }
        None => println!("Third-placed teams: waiting for all groups"),
    }

    let slot = |slot: &BracketSlot| match slot {
        BracketSlot::Team { team } => code(*team),
        BracketSlot::Placeholder { description, .. } => format!("[{description}]"),
    };
    let mut last_phase: Option<Phase> = None;
    for m in resolved.bracket.matches() {
        if last_phase != Some(m.phase) {
            println!("{}", m.phase.label());
            last_phase = Some(m.phase);
        }
        println!("  {:>2} {}", m.match_number, describe_match(m, &slot));
    }

    match resolved.bracket.champion() {
        Some(team) => println!("Champion: {}", code(team)),
        None => println!("Champion: not predicted"),
    }
    if !resolved.invalidated.is_empty() {
        println!("Invalidated predictions: {:?}", resolved.invalidated);
    }
    println!("Fingerprint: {}", resolved.fingerprint()?);

    Ok(())
}

fn describe_match(m: &KnockoutMatch, slot: &dyn Fn(&BracketSlot) -> String) -> String {
    let mut line = format!("{} v {}", slot(&m.home_slot), slot(&m.away_slot));
    if let Some(pred) = m.prediction.as_ref() {
        line.push_str(&format!("  {}-{}", pred.home_score, pred.away_score));
        if let Some((h, a)) = pred.extra_time() {
            line.push_str(&format!(" aet {h}-{a}"));
        }
        if let Some(side) = pred.penalties_winner {
            line.push_str(&format!(" pens {side:?}"));
        }
    }
    line
}
