//! Likelihood multipliers keyed by (player answer, expected answer).

use crate::model::answer::{Answer, PlayerAnswer};
use serde::{Deserialize, Serialize};

/// Rows are indexed by [`PlayerAnswer`], columns by [`Answer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityTable {
    pub yes: [f64; 4],
    pub no: [f64; 4],
    pub maybe: [f64; 4],
}

impl Default for CompatibilityTable {
    fn default() -> Self {
        // Columns: yes, no, maybe, unknown. The unknown column is a flat mild
        // penalty whatever the player says.
        Self {
            yes: [1.25, 0.25, 0.70, 0.75],
            no: [0.35, 1.20, 0.70, 0.75],
            maybe: [0.85, 0.85, 1.10, 0.80],
        }
    }
}

impl CompatibilityTable {
    pub fn multiplier(&self, player: PlayerAnswer, expected: Answer) -> f64 {
        self.row(player)[expected.index()]
    }

    pub fn row(&self, player: PlayerAnswer) -> &[f64; 4] {
        match player {
            PlayerAnswer::Yes => &self.yes,
            PlayerAnswer::No => &self.no,
            PlayerAnswer::Maybe => &self.maybe,
        }
    }

    /// True when every entry is finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        PlayerAnswer::ALL
            .iter()
            .flat_map(|answer| self.row(*answer).iter())
            .all(|value| value.is_finite() && *value > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_is_favoured_and_cross_is_penalised() {
        let table = CompatibilityTable::default();
        assert!(table.multiplier(PlayerAnswer::Yes, Answer::Yes) > 1.0);
        assert!(table.multiplier(PlayerAnswer::No, Answer::No) > 1.0);
        assert!(table.multiplier(PlayerAnswer::Yes, Answer::No) < 1.0);
        assert!(table.multiplier(PlayerAnswer::No, Answer::Yes) < 1.0);
        assert!(table.multiplier(PlayerAnswer::Maybe, Answer::Maybe) > 1.0);
    }

    #[test]
    fn reference_values_are_exact() {
        let table = CompatibilityTable::default();
        assert_eq!(table.multiplier(PlayerAnswer::Yes, Answer::Yes), 1.25);
        assert_eq!(table.multiplier(PlayerAnswer::No, Answer::Yes), 0.35);
        assert_eq!(table.multiplier(PlayerAnswer::Maybe, Answer::Unknown), 0.80);
        for answer in [PlayerAnswer::Yes, PlayerAnswer::No] {
            assert_eq!(table.multiplier(answer, Answer::Unknown), 0.75);
        }
        assert!(table.is_valid());
    }

    #[test]
    fn zero_entries_are_invalid() {
        let mut table = CompatibilityTable::default();
        table.no[2] = 0.0;
        assert!(!table.is_valid());
    }
}
