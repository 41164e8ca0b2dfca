use hanoiviz::{Move, PegState, move_count, solve};

#[test]
fn emits_exactly_two_pow_n_minus_one_moves() {
    for n in 0..=8u32 {
        let moves = solve(n, 0, 1, 2);
        assert_eq!(moves.len() as u64, move_count(n), "n={n}");
    }
}

#[test]
fn simulation_never_breaks_the_stacking_rules() {
    // PegState::apply errors on an empty-source pop or a smaller-block-below
    // violation, so a clean run is the property.
    for n in 0..=8u32 {
        let mut state = PegState::new(n, 0).unwrap();
        for mv in solve(n, 0, 1, 2) {
            state.apply(mv).unwrap();
            assert_eq!(state.total_blocks(), n as usize);
        }
        assert!(state.is_solved(2, n), "n={n}");
    }
}

#[test]
fn peg_choice_is_respected() {
    // Solving onto peg 1 with peg 2 as the spare.
    let mut state = PegState::new(4, 0).unwrap();
    for mv in solve(4, 0, 2, 1) {
        state.apply(mv).unwrap();
    }
    assert!(state.is_solved(1, 4));
}

#[test]
fn one_block_sequence() {
    assert_eq!(solve(1, 0, 1, 2), vec![Move { from: 0, to: 2 }]);
}

#[test]
fn two_block_sequence() {
    assert_eq!(
        solve(2, 0, 1, 2),
        vec![
            Move { from: 0, to: 1 },
            Move { from: 0, to: 2 },
            Move { from: 1, to: 2 },
        ]
    );
}

#[test]
fn three_block_sequence() {
    let expected = [
        (0, 2),
        (0, 1),
        (2, 1),
        (0, 2),
        (1, 0),
        (1, 2),
        (0, 2),
    ];
    let moves: Vec<(usize, usize)> = solve(3, 0, 1, 2)
        .into_iter()
        .map(|m| (m.from, m.to))
        .collect();
    assert_eq!(moves, expected);
}
