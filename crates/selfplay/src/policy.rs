//! Turning root visit counts into policy training targets.

use alphazero_chess::codec;
use alphazero_core::{AlphaZeroError, Policy, Result};
use alphazero_mcts::MctsDist;

/// Maps a search distribution to a normalized policy vector of length
/// [`codec::POLICY_SIZE`], sharpened or flattened by a temperature.
#[derive(Clone, Copy, Debug)]
pub struct PolicyTargetEncoder {
    temperature: f32,
}

impl PolicyTargetEncoder {
    pub fn new(temperature: f32) -> Self {
        Self { temperature }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Encode the visit counts as a training target.
    ///
    /// Temperature 1 reproduces the raw visit proportions; values
    /// below 1 sharpen toward the most-visited move and a temperature
    /// of zero (or below) collapses to a one-hot on it. A distribution
    /// with no visits at all cannot be normalized and is rejected.
    pub fn encode(&self, dist: &MctsDist) -> Result<Policy> {
        let total: u64 = dist.moves.iter().map(|m| u64::from(m.visits)).sum();
        if total == 0 {
            return Err(AlphaZeroError::DegenerateDistribution);
        }

        if self.temperature <= 0.0 {
            // Moves arrive in policy index order, so a strict maximum
            // scan breaks visit ties toward the lowest index.
            let mut best = &dist.moves[0];
            for m in &dist.moves[1..] {
                if m.visits > best.visits {
                    best = m;
                }
            }
            return Policy::one_hot(codec::POLICY_SIZE, codec::encode(best.mv)?);
        }

        let exponent = 1.0 / self.temperature;
        let mut target = vec![0.0; codec::POLICY_SIZE];
        for m in &dist.moves {
            target[codec::encode(m.mv)?] = (m.visits as f32).powf(exponent);
        }
        Policy::from_unnormalized(target)
    }
}

impl Default for PolicyTargetEncoder {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphazero_chess::{codec, Color, Position};
    use alphazero_mcts::MoveVisits;

    fn dist_from_visits(uci_visits: &[(&str, u32)]) -> MctsDist {
        let pos = Position::startpos();
        let mut moves: Vec<MoveVisits> = uci_visits
            .iter()
            .map(|&(uci, visits)| MoveVisits {
                mv: codec::from_uci(uci).unwrap(),
                visits,
            })
            .collect();
        moves.sort_by_key(|m| codec::encode(m.mv).unwrap());
        MctsDist {
            fen: pos.fen(),
            side_to_move: Color::White,
            root_value: 0.0,
            moves,
        }
    }

    #[test]
    fn test_unit_temperature_matches_visit_proportions() {
        let dist = dist_from_visits(&[("e2e4", 60), ("d2d4", 30), ("g1f3", 10)]);
        let target = PolicyTargetEncoder::new(1.0).encode(&dist).unwrap();

        let e4 = codec::encode(codec::from_uci("e2e4").unwrap()).unwrap();
        let d4 = codec::encode(codec::from_uci("d2d4").unwrap()).unwrap();
        let nf3 = codec::encode(codec::from_uci("g1f3").unwrap()).unwrap();
        assert!((target[e4] - 0.6).abs() < 1e-5);
        assert!((target[d4] - 0.3).abs() < 1e-5);
        assert!((target[nf3] - 0.1).abs() < 1e-5);
        assert!((target.sum() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_temperature_is_one_hot() {
        let dist = dist_from_visits(&[("e2e4", 60), ("d2d4", 30), ("g1f3", 10)]);
        let target = PolicyTargetEncoder::new(0.0).encode(&dist).unwrap();

        let e4 = codec::encode(codec::from_uci("e2e4").unwrap()).unwrap();
        assert_eq!(target[e4], 1.0);
        assert_eq!(target.argmax(), e4);
        assert!((target.sum() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_temperature_tie_goes_to_lowest_index() {
        let dist = dist_from_visits(&[("e2e4", 40), ("d2d4", 40)]);
        let target = PolicyTargetEncoder::new(0.0).encode(&dist).unwrap();

        let d4 = codec::encode(codec::from_uci("d2d4").unwrap()).unwrap();
        let e4 = codec::encode(codec::from_uci("e2e4").unwrap()).unwrap();
        assert!(d4 < e4);
        assert_eq!(target.argmax(), d4);
    }

    #[test]
    fn test_low_temperature_sharpens() {
        let dist = dist_from_visits(&[("e2e4", 60), ("d2d4", 40)]);
        let flat = PolicyTargetEncoder::new(1.0).encode(&dist).unwrap();
        let sharp = PolicyTargetEncoder::new(0.5).encode(&dist).unwrap();

        let e4 = codec::encode(codec::from_uci("e2e4").unwrap()).unwrap();
        assert!(sharp[e4] > flat[e4]);
    }

    #[test]
    fn test_high_temperature_flattens() {
        let dist = dist_from_visits(&[("e2e4", 60), ("d2d4", 40)]);
        let flat = PolicyTargetEncoder::new(1.0).encode(&dist).unwrap();
        let flatter = PolicyTargetEncoder::new(2.0).encode(&dist).unwrap();

        let e4 = codec::encode(codec::from_uci("e2e4").unwrap()).unwrap();
        assert!(flatter[e4] < flat[e4]);
    }

    #[test]
    fn test_all_zero_visits_rejected() {
        let dist = dist_from_visits(&[("e2e4", 0), ("d2d4", 0)]);
        assert!(matches!(
            PolicyTargetEncoder::default().encode(&dist),
            Err(AlphaZeroError::DegenerateDistribution)
        ));
    }
}
