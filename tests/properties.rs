mod common;

use proptest::prelude::*;

use wc26_predictor::knockout::{validate, winner};
use wc26_predictor::model::{KnockoutPrediction, Side};
use wc26_predictor::standings::compute_standings;
use wc26_predictor::tiebreak::resolve_group;

use common::{group, round_robin};

fn scores() -> impl Strategy<Value = [(i32, i32); 6]> {
    prop::array::uniform6((0..8i32, 0..8i32))
}

proptest! {
    #[test]
    fn goals_for_equal_goals_against(scores in scores()) {
        let g = group('A', 1);
        let rows = compute_standings(&g, &round_robin(&g, 1, scores)).unwrap();
        let gf: u32 = rows.iter().map(|r| r.goals_for).sum();
        let ga: u32 = rows.iter().map(|r| r.goals_against).sum();
        prop_assert_eq!(gf, ga);
        for r in &rows {
            prop_assert_eq!(r.points, 3 * r.won + r.drawn);
            prop_assert_eq!(r.played, 3);
        }
    }

    #[test]
    fn resolving_twice_gives_same_table(scores in scores()) {
        let g = group('B', 10);
        let preds = round_robin(&g, 1, scores);
        prop_assert_eq!(
            resolve_group(&g, &preds, &[]).unwrap(),
            resolve_group(&g, &preds, &[]).unwrap()
        );
    }

    #[test]
    fn positions_are_a_permutation(scores in scores()) {
        let g = group('C', 20);
        let table = resolve_group(&g, &round_robin(&g, 1, scores), &[]).unwrap();
        let positions: Vec<u8> = table.standings.iter().map(|s| s.position).collect();
        prop_assert_eq!(positions, vec![1, 2, 3, 4]);
        for pair in table.standings.windows(2) {
            prop_assert!(pair[0].points >= pair[1].points);
        }
    }

    #[test]
    fn manual_order_fully_orders_a_level_group(
        order in Just(vec![30u32, 31, 32, 33]).prop_shuffle()
    ) {
        let g = group('D', 30);
        let preds = round_robin(&g, 1, [(1, 1); 6]);
        let table = resolve_group(&g, &preds, &[order.clone()]).unwrap();
        let got: Vec<u32> = table.standings.iter().map(|s| s.team).collect();
        prop_assert_eq!(got, order);
        prop_assert!(!table.has_tiebreak_conflict());
    }

    #[test]
    fn valid_knockout_prediction_has_a_participant_as_winner(
        home in 0..5i32,
        away in 0..5i32,
        et in prop::option::of((0..3i32, 0..3i32)),
        pens in prop::option::of(prop_oneof![Just(Side::Home), Just(Side::Away)]),
    ) {
        let mut pred = KnockoutPrediction::regulation(1, 7, 8, home, away);
        if let Some((h, a)) = et {
            pred = pred.with_extra_time(h, a);
        }
        pred.penalties_winner = pens;
        if validate(&pred).is_ok() {
            let w = winner(&pred);
            prop_assert!(w == 7 || w == 8);
            if home != away {
                prop_assert_eq!(w, if home > away { 7 } else { 8 });
            }
        }
    }
}
