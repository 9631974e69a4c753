//! Validated probability distribution over policy indices.
//!
//! The `Policy` type enforces at construction that entries are
//! non-negative and sum to 1.0 (±1e-5), so a training target that
//! reaches the replay buffer is normalized by construction.

use crate::{AlphaZeroError, Result};

/// Tolerance for policy sum validation.
const POLICY_SUM_TOLERANCE: f32 = 1e-5;

/// A probability distribution over policy indices.
///
/// Invariant: all entries are non-negative and sum to 1.0 (±1e-5).
#[derive(Clone, Debug, PartialEq)]
pub struct Policy(Vec<f32>);

impl Policy {
    /// Create a policy from an already-normalized distribution.
    ///
    /// # Errors
    /// Returns `AlphaZeroError::InvalidPolicy` if the vector is empty,
    /// contains a negative or non-finite entry, or does not sum to 1.0.
    pub fn new(probs: Vec<f32>) -> Result<Self> {
        if probs.is_empty() {
            return Err(AlphaZeroError::InvalidPolicy(
                "policy cannot be empty".to_string(),
            ));
        }
        if probs.iter().any(|&p| !p.is_finite() || p < 0.0) {
            return Err(AlphaZeroError::InvalidPolicy(
                "policy contains negative or non-finite entries".to_string(),
            ));
        }
        let sum: f32 = probs.iter().sum();
        if (sum - 1.0).abs() > POLICY_SUM_TOLERANCE {
            return Err(AlphaZeroError::InvalidPolicy(format!(
                "policy sum {} is not 1.0 (tolerance {})",
                sum, POLICY_SUM_TOLERANCE
            )));
        }
        Ok(Self(probs))
    }

    /// Create a policy from raw non-negative scores, normalizing them.
    ///
    /// # Errors
    /// Returns an error if any entry is negative or all entries are zero.
    pub fn from_unnormalized(values: Vec<f32>) -> Result<Self> {
        if values.is_empty() {
            return Err(AlphaZeroError::InvalidPolicy(
                "policy cannot be empty".to_string(),
            ));
        }
        if values.iter().any(|&v| !v.is_finite() || v < 0.0) {
            return Err(AlphaZeroError::InvalidPolicy(
                "policy contains negative or non-finite entries".to_string(),
            ));
        }
        let sum: f32 = values.iter().sum();
        if sum == 0.0 {
            return Err(AlphaZeroError::InvalidPolicy(
                "cannot normalize: all values are zero".to_string(),
            ));
        }
        let normalized = values.iter().map(|&v| v / sum).collect();
        Ok(Self(normalized))
    }

    /// Create a one-hot policy with all mass on the given index.
    pub fn one_hot(len: usize, index: usize) -> Result<Self> {
        if index >= len {
            return Err(AlphaZeroError::InvalidPolicy(format!(
                "one-hot index {} out of range for length {}",
                index, len
            )));
        }
        let mut probs = vec![0.0; len];
        probs[index] = 1.0;
        Ok(Self(probs))
    }

    /// Number of policy indices.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all entries (~1.0 for a valid policy).
    pub fn sum(&self) -> f32 {
        self.0.iter().sum()
    }

    /// Index of the maximum entry; the lowest index wins exact ties.
    pub fn argmax(&self) -> usize {
        let mut best = 0;
        for (i, &p) in self.0.iter().enumerate() {
            if p > self.0[best] {
                best = i;
            }
        }
        best
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Consume the policy, returning the underlying vector.
    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &f32> {
        self.0.iter()
    }
}

impl std::ops::Index<usize> for Policy {
    type Output = f32;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_new_valid() {
        let policy = Policy::new(vec![0.3, 0.5, 0.2]).unwrap();
        assert_eq!(policy.len(), 3);
        assert!((policy.sum() - 1.0).abs() < POLICY_SUM_TOLERANCE);
    }

    #[test]
    fn test_policy_new_invalid_sum() {
        assert!(Policy::new(vec![0.3, 0.3, 0.3]).is_err());
    }

    #[test]
    fn test_policy_new_negative() {
        assert!(Policy::new(vec![0.5, -0.2, 0.7]).is_err());
    }

    #[test]
    fn test_policy_new_nan() {
        assert!(Policy::new(vec![f32::NAN, 1.0]).is_err());
    }

    #[test]
    fn test_policy_new_empty() {
        assert!(Policy::new(vec![]).is_err());
    }

    #[test]
    fn test_policy_from_unnormalized() {
        let policy = Policy::from_unnormalized(vec![1.0, 2.0, 1.0]).unwrap();
        assert!((policy[0] - 0.25).abs() < 1e-5);
        assert!((policy[1] - 0.50).abs() < 1e-5);
        assert!((policy[2] - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_policy_from_unnormalized_all_zero() {
        assert!(Policy::from_unnormalized(vec![0.0, 0.0]).is_err());
    }

    #[test]
    fn test_policy_one_hot() {
        let policy = Policy::one_hot(4, 2).unwrap();
        assert_eq!(policy.as_slice(), &[0.0, 0.0, 1.0, 0.0]);
        assert!(Policy::one_hot(4, 4).is_err());
    }

    #[test]
    fn test_policy_argmax_tie_breaks_low() {
        let policy = Policy::new(vec![0.4, 0.4, 0.2]).unwrap();
        assert_eq!(policy.argmax(), 0);
    }
}
