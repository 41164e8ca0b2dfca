//! Tower of Hanoi move generation and peg-stack bookkeeping.
//!
//! Blocks are identified by size rank `1..=n` (1 is the smallest). Each peg
//! holds an ordered stack, largest at the bottom; a block may only rest on an
//! empty peg or on a strictly larger block.

use crate::error::{HanoivizError, HanoivizResult};

pub const PEG_COUNT: usize = 3;

/// Relocation of the topmost block of `from` onto `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Move {
    pub from: usize,
    pub to: usize,
}

/// Number of moves the canonical solution takes for `n` blocks.
pub fn move_count(n: u32) -> u64 {
    if n >= 64 {
        u64::MAX
    } else {
        (1u64 << n) - 1
    }
}

/// Canonical solution for `n` blocks: solve `n-1` from source to auxiliary,
/// relocate the largest block to the target, then solve `n-1` from auxiliary
/// to target. `n = 0` produces no moves.
pub fn solve(n: u32, source: usize, auxiliary: usize, target: usize) -> Vec<Move> {
    let mut out = Vec::with_capacity(move_count(n).min(1 << 24) as usize);
    solve_into(n, source, auxiliary, target, &mut out);
    out
}

fn solve_into(n: u32, source: usize, auxiliary: usize, target: usize, out: &mut Vec<Move>) {
    if n == 0 {
        return;
    }
    solve_into(n - 1, source, target, auxiliary, out);
    out.push(Move {
        from: source,
        to: target,
    });
    solve_into(n - 1, auxiliary, source, target, out);
}

/// The three-peg stack model, mutated in lockstep with the visual moves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PegState {
    pegs: [Vec<u32>; PEG_COUNT],
}

impl PegState {
    /// All `n` blocks stacked on `source`, largest (`rank n`) at the bottom.
    pub fn new(n: u32, source: usize) -> HanoivizResult<Self> {
        if source >= PEG_COUNT {
            return Err(HanoivizError::validation("source peg index out of range"));
        }
        let mut pegs: [Vec<u32>; PEG_COUNT] = [Vec::new(), Vec::new(), Vec::new()];
        pegs[source] = (1..=n).rev().collect();
        Ok(Self { pegs })
    }

    pub fn peg(&self, idx: usize) -> &[u32] {
        &self.pegs[idx]
    }

    pub fn top(&self, idx: usize) -> Option<u32> {
        self.pegs[idx].last().copied()
    }

    pub fn total_blocks(&self) -> usize {
        self.pegs.iter().map(Vec::len).sum()
    }

    /// Pop from the source, push onto the target, returning the moved rank.
    pub fn apply(&mut self, mv: Move) -> HanoivizResult<u32> {
        if mv.from >= PEG_COUNT || mv.to >= PEG_COUNT {
            return Err(HanoivizError::validation("move peg index out of range"));
        }
        if mv.from == mv.to {
            return Err(HanoivizError::validation(
                "move source and target must differ",
            ));
        }
        let Some(rank) = self.pegs[mv.from].pop() else {
            return Err(HanoivizError::validation(format!(
                "cannot pop empty peg {}",
                mv.from
            )));
        };
        if let Some(top) = self.pegs[mv.to].last().copied() {
            if top < rank {
                self.pegs[mv.from].push(rank);
                return Err(HanoivizError::validation(format!(
                    "cannot place block {rank} on smaller block {top}"
                )));
            }
        }
        self.pegs[mv.to].push(rank);
        Ok(rank)
    }

    /// All blocks on `target`, in descending size order from the bottom.
    pub fn is_solved(&self, target: usize, n: u32) -> bool {
        if target >= PEG_COUNT {
            return false;
        }
        let expected: Vec<u32> = (1..=n).rev().collect();
        self.pegs[target] == expected
            && self
                .pegs
                .iter()
                .enumerate()
                .all(|(i, p)| i == target || p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_blocks_means_no_moves() {
        assert!(solve(0, 0, 1, 2).is_empty());
        assert_eq!(move_count(0), 0);
    }

    #[test]
    fn single_block_goes_straight_to_target() {
        assert_eq!(solve(1, 0, 1, 2), vec![Move { from: 0, to: 2 }]);
    }

    #[test]
    fn empty_pop_is_an_error() {
        let mut state = PegState::new(2, 0).unwrap();
        assert!(state.apply(Move { from: 1, to: 2 }).is_err());
    }

    #[test]
    fn larger_on_smaller_is_an_error_and_leaves_state_intact() {
        let mut state = PegState::new(2, 0).unwrap();
        state.apply(Move { from: 0, to: 1 }).unwrap();
        let before = state.clone();
        assert!(state.apply(Move { from: 0, to: 1 }).is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn block_count_is_conserved() {
        let mut state = PegState::new(3, 0).unwrap();
        for mv in solve(3, 0, 1, 2) {
            state.apply(mv).unwrap();
            assert_eq!(state.total_blocks(), 3);
        }
        assert!(state.is_solved(2, 3));
    }
}
