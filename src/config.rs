use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::model::{GroupId, Side};

pub const CONFIG_ENV: &str = "WC26_TOURNAMENT_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "R32")]
    RoundOf32,
    #[serde(rename = "R16")]
    RoundOf16,
    #[serde(rename = "QF")]
    QuarterFinal,
    #[serde(rename = "SF")]
    SemiFinal,
    #[serde(rename = "3P")]
    ThirdPlace,
    #[serde(rename = "F")]
    Final,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::RoundOf32 => "Round of 32",
            Phase::RoundOf16 => "Round of 16",
            Phase::QuarterFinal => "Quarter-final",
            Phase::SemiFinal => "Semi-final",
            Phase::ThirdPlace => "Third place",
            Phase::Final => "Final",
        }
    }

    fn expected_matches(self) -> usize {
        match self {
            Phase::RoundOf32 => 16,
            Phase::RoundOf16 => 8,
            Phase::QuarterFinal => 4,
            Phase::SemiFinal => 2,
            Phase::ThirdPlace => 1,
            Phase::Final => 1,
        }
    }
}

/// Where a bracket slot's team comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SlotSource {
    #[serde(rename_all = "camelCase")]
    GroupPosition { group: GroupId, position: u8 },
    #[serde(rename_all = "camelCase")]
    BestThird { eligible: Vec<GroupId> },
    #[serde(rename_all = "camelCase")]
    Winner { source_match: u32 },
    #[serde(rename_all = "camelCase")]
    Loser { source_match: u32 },
}

impl SlotSource {
    pub fn describe(&self) -> String {
        match self {
            SlotSource::GroupPosition { group, position: 1 } => format!("Winner Group {group}"),
            SlotSource::GroupPosition { group, position: 2 } => format!("Runner-up Group {group}"),
            SlotSource::GroupPosition { group, position } => format!("#{position} Group {group}"),
            SlotSource::BestThird { eligible } => {
                let groups: Vec<String> = eligible.iter().map(|g| g.to_string()).collect();
                format!("3rd Group {}", groups.join("/"))
            }
            SlotSource::Winner { source_match } => format!("Winner Match {source_match}"),
            SlotSource::Loser { source_match } => format!("Loser Match {source_match}"),
        }
    }

    pub fn source_match(&self) -> Option<u32> {
        match self {
            SlotSource::Winner { source_match } | SlotSource::Loser { source_match } => {
                Some(*source_match)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchTopology {
    pub match_number: u32,
    pub phase: Phase,
    pub home: SlotSource,
    pub away: SlotSource,
}

impl MatchTopology {
    pub fn source(&self, side: Side) -> &SlotSource {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }
}

/// Fixed tournament layout: groups, R32 seeding and bracket topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentConfig {
    pub groups: Vec<GroupId>,
    pub qualified_thirds: usize,
    pub matches: Vec<MatchTopology>,
    /// Sorted qualifying-group letters -> group for each third-place slot, in
    /// slot order (match number, home before away).
    #[serde(default)]
    pub third_place_combinations: BTreeMap<String, Vec<GroupId>>,
}

// Round-of-32 pairings for the 48-team format, one entry per match.
const R32_SEEDING: [(&str, &str); 16] = [
    ("2A", "2B"),
    ("1E", "3ABCDF"),
    ("1F", "2C"),
    ("1C", "2F"),
    ("1I", "3CDFGH"),
    ("2E", "2I"),
    ("1A", "3CEFHI"),
    ("1L", "3EHIJK"),
    ("1D", "3BEFIJ"),
    ("1G", "3AEHIJ"),
    ("2K", "2L"),
    ("1H", "2J"),
    ("1B", "3EFGIJ"),
    ("1J", "2H"),
    ("1K", "3DEIJL"),
    ("2D", "2G"),
];

static WORLD_CUP_2026: Lazy<TournamentConfig> = Lazy::new(|| {
    let mut matches = Vec::with_capacity(32);
    for (idx, (home, away)) in R32_SEEDING.iter().enumerate() {
        matches.push(MatchTopology {
            match_number: idx as u32 + 1,
            phase: Phase::RoundOf32,
            home: parse_seed(home),
            away: parse_seed(away),
        });
    }

    // Matches N and N+1 of a round feed the home/away slots of the next one.
    let rounds = [
        (Phase::RoundOf16, 17u32, 8u32, 1u32),
        (Phase::QuarterFinal, 25, 4, 17),
        (Phase::SemiFinal, 29, 2, 25),
        (Phase::Final, 31, 1, 29),
    ];
    for (phase, first, count, feeder) in rounds {
        for i in 0..count {
            matches.push(MatchTopology {
                match_number: first + i,
                phase,
                home: SlotSource::Winner { source_match: feeder + 2 * i },
                away: SlotSource::Winner { source_match: feeder + 2 * i + 1 },
            });
        }
    }
    matches.push(MatchTopology {
        match_number: 32,
        phase: Phase::ThirdPlace,
        home: SlotSource::Loser { source_match: 29 },
        away: SlotSource::Loser { source_match: 30 },
    });

    TournamentConfig {
        groups: ('A'..='L').collect(),
        qualified_thirds: 8,
        matches,
        third_place_combinations: BTreeMap::new(),
    }
});

fn parse_seed(code: &str) -> SlotSource {
    let mut chars = code.chars();
    match chars.next() {
        Some('3') => SlotSource::BestThird {
            eligible: chars.collect(),
        },
        Some('2') => SlotSource::GroupPosition {
            group: chars.next().unwrap_or('?'),
            position: 2,
        },
        _ => SlotSource::GroupPosition {
            group: chars.next().unwrap_or('?'),
            position: 1,
        },
    }
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self::world_cup_2026()
    }
}

impl TournamentConfig {
    pub fn world_cup_2026() -> Self {
        WORLD_CUP_2026.clone()
    }

    /// Same layout without the third-place play-off.
    pub fn without_third_place_playoff(mut self) -> Self {
        self.matches.retain(|m| m.phase != Phase::ThirdPlace);
        self
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read tournament config {}", path.display()))?;
        let config: TournamentConfig =
            serde_json::from_str(&raw).context("invalid tournament config json")?;
        config.validate()?;
        Ok(config)
    }

    /// `.env` first, then `WC26_TOURNAMENT_CONFIG`, else the built-in layout.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(&PathBuf::from(path.trim())),
            _ => Ok(Self::world_cup_2026()),
        }
    }

    pub fn topology(&self, match_number: u32) -> Option<&MatchTopology> {
        self.matches.iter().find(|m| m.match_number == match_number)
    }

    /// Third-place slots as (match number, side), in slot order.
    pub fn third_place_slots(&self) -> Vec<(u32, Side, &[GroupId])> {
        let mut slots = Vec::new();
        let mut r32: Vec<&MatchTopology> = self
            .matches
            .iter()
            .filter(|m| m.phase == Phase::RoundOf32)
            .collect();
        r32.sort_by_key(|m| m.match_number);
        for m in r32 {
            for side in [Side::Home, Side::Away] {
                if let SlotSource::BestThird { eligible } = m.source(side) {
                    slots.push((m.match_number, side, eligible.as_slice()));
                }
            }
        }
        slots
    }

    pub fn validate(&self) -> EngineResult<()> {
        let invalid = |msg: String| Err(EngineError::InvalidConfig(msg));

        let groups: HashSet<GroupId> = self.groups.iter().copied().collect();
        if groups.len() != self.groups.len() || groups.is_empty() {
            return invalid("group ids must be non-empty and unique".to_string());
        }
        if self.qualified_thirds > self.groups.len() {
            return invalid(format!(
                "{} qualifying thirds from {} groups",
                self.qualified_thirds,
                self.groups.len()
            ));
        }

        let mut by_number: HashMap<u32, &MatchTopology> = HashMap::new();
        for m in &self.matches {
            if by_number.insert(m.match_number, m).is_some() {
                return invalid(format!("match {} defined twice", m.match_number));
            }
        }

        for phase in [
            Phase::RoundOf32,
            Phase::RoundOf16,
            Phase::QuarterFinal,
            Phase::SemiFinal,
            Phase::Final,
        ] {
            let count = self.matches.iter().filter(|m| m.phase == phase).count();
            if count != phase.expected_matches() {
                return invalid(format!(
                    "{} has {count} matches, expected {}",
                    phase.label(),
                    phase.expected_matches()
                ));
            }
        }
        if self.matches.iter().filter(|m| m.phase == Phase::ThirdPlace).count() > 1 {
            return invalid("at most one third-place play-off".to_string());
        }

        let mut seeded: HashSet<(GroupId, u8)> = HashSet::new();
        let mut third_slots = 0usize;
        let mut winner_feeds: HashMap<u32, usize> = HashMap::new();
        let mut loser_feeds: HashMap<u32, usize> = HashMap::new();

        for m in &self.matches {
            let number = m.match_number;
            for side in [Side::Home, Side::Away] {
                let source = m.source(side);
                match source {
                    SlotSource::GroupPosition { group, position } => {
                        if m.phase != Phase::RoundOf32 {
                            return invalid(format!("match {number}: group seed outside R32"));
                        }
                        if !groups.contains(group) || !(1..=2).contains(position) {
                            return invalid(format!(
                                "match {number}: bad seed {}",
                                source.describe()
                            ));
                        }
                        if !seeded.insert((*group, *position)) {
                            return invalid(format!("{} seeded twice", source.describe()));
                        }
                    }
                    SlotSource::BestThird { eligible } => {
                        if m.phase != Phase::RoundOf32 {
                            return invalid(format!("match {number}: third seed outside R32"));
                        }
                        if eligible.is_empty() || eligible.iter().any(|g| !groups.contains(g)) {
                            return invalid(format!(
                                "match {number}: bad seed {}",
                                source.describe()
                            ));
                        }
                        third_slots += 1;
                    }
                    SlotSource::Winner { source_match } | SlotSource::Loser { source_match } => {
                        let Some(feeder) = by_number.get(source_match) else {
                            return invalid(format!(
                                "match {}: unknown source match {source_match}",
                                m.match_number
                            ));
                        };
                        if feeder.phase >= m.phase || feeder.phase == Phase::ThirdPlace {
                            return invalid(format!(
                                "match {}: source match {source_match} is not an earlier round",
                                m.match_number
                            ));
                        }
                        let feeds = if matches!(source, SlotSource::Winner { .. }) {
                            &mut winner_feeds
                        } else {
                            if m.phase != Phase::ThirdPlace {
                                return invalid(format!(
                                    "match {number}: only the play-off takes losers"
                                ));
                            }
                            &mut loser_feeds
                        };
                        *feeds.entry(*source_match).or_default() += 1;
                    }
                }
            }
        }

        if seeded.len() != self.groups.len() * 2 {
            return invalid(format!(
                "{} group seeds, expected every winner and runner-up",
                seeded.len()
            ));
        }
        if third_slots != self.qualified_thirds {
            return invalid(format!(
                "{third_slots} third-place slots, expected {}",
                self.qualified_thirds
            ));
        }
        for m in &self.matches {
            let wins = winner_feeds.get(&m.match_number).copied().unwrap_or(0);
            let expected = match m.phase {
                Phase::Final | Phase::ThirdPlace => 0,
                _ => 1,
            };
            if wins != expected {
                return invalid(format!(
                    "winner of match {} feeds {wins} slots, expected {expected}",
                    m.match_number
                ));
            }
            if loser_feeds.get(&m.match_number).copied().unwrap_or(0) > 1 {
                return invalid(format!(
                    "loser of match {} feeds more than one slot",
                    m.match_number
                ));
            }
        }

        let slot_count = third_slots;
        for (key, groups_in_order) in &self.third_place_combinations {
            if groups_in_order.len() != slot_count || key.chars().count() != slot_count {
                return invalid(format!("third-place combination {key} has the wrong size"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_valid() {
        let config = TournamentConfig::world_cup_2026();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.matches.len(), 32);
        assert_eq!(config.third_place_slots().len(), 8);
    }

    #[test]
    fn seed_codes_parse() {
        assert_eq!(
            parse_seed("2C"),
            SlotSource::GroupPosition {
                group: 'C',
                position: 2
            }
        );
        assert_eq!(
            parse_seed("3ABCDF"),
            SlotSource::BestThird {
                eligible: vec!['A', 'B', 'C', 'D', 'F']
            }
        );
    }

    #[test]
    fn double_fed_slot_is_rejected() {
        let mut config = TournamentConfig::world_cup_2026();
        if let Some(m) = config.matches.iter_mut().find(|m| m.match_number == 18) {
            m.home = SlotSource::Winner { source_match: 1 };
        }
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn playoff_slots_describe_semi_final_losers() {
        let config = TournamentConfig::world_cup_2026();
        let playoff = config.topology(32).unwrap();
        assert_eq!(playoff.phase, Phase::ThirdPlace);
        assert_eq!(playoff.home.describe(), "Loser Match 29");
        assert_eq!(playoff.away.describe(), "Loser Match 30");
    }

    #[test]
    fn playoff_can_be_dropped() {
        let config = TournamentConfig::world_cup_2026().without_third_place_playoff();
        assert_eq!(config.validate(), Ok(()));
        assert!(config.topology(32).is_none());
    }
}
