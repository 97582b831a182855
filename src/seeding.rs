use std::collections::HashMap;

use tracing::debug;

use crate::config::{Phase, SlotSource, TournamentConfig};
use crate::error::{EngineError, EngineResult};
use crate::model::{BestThirdPlaceEntry, GroupId, GroupTable, Side, TeamId};

/// Concrete teams known for R32 slots. Missing keys stay placeholders.
pub type Seeds = HashMap<(u32, Side), TeamId>;

/// Fill the Round of 32 from whatever group results are known.
///
/// Group winners and runners-up are placed as soon as their group resolves.
/// Third-place slots are only filled once the best-third ranking exists.
pub fn seed_round_of_32(
    config: &TournamentConfig,
    tables: &[GroupTable],
    best_thirds: Option<&[BestThirdPlaceEntry]>,
) -> EngineResult<Seeds> {
    let by_group: HashMap<GroupId, &GroupTable> = tables.iter().map(|t| (t.group, t)).collect();
    let mut seeds = Seeds::new();

    for m in config.matches.iter().filter(|m| m.phase == Phase::RoundOf32) {
        for side in [Side::Home, Side::Away] {
            if let SlotSource::GroupPosition { group, position } = m.source(side) {
                let team = by_group
                    .get(group)
                    .and_then(|t| t.at_position(*position))
                    .map(|s| s.team);
                if let Some(team) = team {
                    seeds.insert((m.match_number, side), team);
                }
            }
        }
    }

    if let Some(entries) = best_thirds {
        let qualified: Vec<&BestThirdPlaceEntry> = entries.iter().filter(|e| e.qualified).collect();
        let mut qualifying_groups: Vec<GroupId> =
            qualified.iter().map(|e| e.from_group_id).collect();
        qualifying_groups.sort_unstable();

        let slots = config.third_place_slots();
        let assignment = assign_third_places(config, &qualifying_groups)?;
        for ((match_number, side, _), group) in slots.iter().zip(assignment) {
            if let Some(entry) = qualified.iter().find(|e| e.from_group_id == group) {
                seeds.insert((*match_number, *side), entry.team);
            }
        }
    }

    debug!(seeded = seeds.len(), "seeded round of 32");
    Ok(seeds)
}

/// Group whose third-placed team goes into each third-place slot, in slot order.
///
/// An explicit combination from the config wins; otherwise the first
/// assignment respecting every slot's eligible groups, searching slots in
/// order and groups alphabetically.
pub fn assign_third_places(
    config: &TournamentConfig,
    qualifying: &[GroupId],
) -> EngineResult<Vec<GroupId>> {
    let mut sorted = qualifying.to_vec();
    sorted.sort_unstable();
    let key: String = sorted.iter().collect();

    if let Some(fixed) = config.third_place_combinations.get(&key) {
        return Ok(fixed.clone());
    }

    let eligible: Vec<&[GroupId]> = config
        .third_place_slots()
        .into_iter()
        .map(|(_, _, e)| e)
        .collect();
    let mut used = vec![false; sorted.len()];
    let mut out = Vec::with_capacity(eligible.len());
    if eligible.len() == sorted.len() && backtrack(&eligible, &sorted, &mut used, &mut out) {
        return Ok(out);
    }
    Err(EngineError::SeedingUnsatisfiable(key))
}

fn backtrack(
    slots: &[&[GroupId]],
    groups: &[GroupId],
    used: &mut [bool],
    out: &mut Vec<GroupId>,
) -> bool {
    let Some(eligible) = slots.get(out.len()) else {
        return true;
    };
    for (idx, group) in groups.iter().enumerate() {
        if used[idx] || !eligible.contains(group) {
            continue;
        }
        used[idx] = true;
        out.push(*group);
        if backtrack(slots, groups, used, out) {
            return true;
        }
        out.pop();
        used[idx] = false;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_combination_overrides_search() {
        let mut config = TournamentConfig::world_cup_2026();
        let fixed: Vec<GroupId> = "HGFEDCBA".chars().collect();
        config
            .third_place_combinations
            .insert("ABCDEFGH".to_string(), fixed.clone());
        let qualifying: Vec<GroupId> = "BADCFEHG".chars().collect();
        let got = assign_third_places(&config, &qualifying).unwrap();
        assert_eq!(got, fixed);
    }

    #[test]
    fn search_respects_eligibility() {
        let config = TournamentConfig::world_cup_2026();
        let qualifying: Vec<GroupId> = "EFGHIJKL".chars().collect();
        let got = assign_third_places(&config, &qualifying).unwrap();
        for ((_, _, eligible), group) in config.third_place_slots().iter().zip(&got) {
            assert!(eligible.contains(group));
        }
        let mut sorted = got.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, qualifying);
    }
}
