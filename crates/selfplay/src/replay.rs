//! Bounded storage for training examples.

use alphazero_core::{AlphaZeroError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One (observation, policy target, value target) triple.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub observation: Vec<f32>,
    pub policy: Vec<f32>,
    /// Game outcome from the perspective of the player who was to
    /// move when the observation was taken.
    pub value: f32,
}

/// Fixed-capacity ring of training examples. Once full, every push
/// overwrites the oldest example still stored.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    capacity: usize,
    data: Vec<TrainingExample>,
    write_index: usize,
    games_completed: u64,
}

/// Serializable image of a buffer, with examples in oldest-first
/// order.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub capacity: usize,
    pub games_completed: u64,
    pub examples: Vec<TrainingExample>,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "replay buffer capacity must be positive");
        Self {
            capacity,
            data: Vec::new(),
            write_index: 0,
            games_completed: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn games_completed(&self) -> u64 {
        self.games_completed
    }

    /// Store one example, evicting the oldest when at capacity.
    pub fn push(&mut self, example: TrainingExample) {
        if self.data.len() < self.capacity {
            self.data.push(example);
        } else {
            self.data[self.write_index] = example;
            self.write_index += 1;
            if self.write_index == self.capacity {
                self.write_index = 0;
            }
        }
    }

    /// Store a finished game's examples and count the game.
    pub fn append(&mut self, examples: Vec<TrainingExample>) {
        for example in examples {
            self.push(example);
        }
        self.games_completed += 1;
    }

    /// Draw `batch_size` distinct examples uniformly at random. Asking
    /// for more than is stored is an underflow, not a short batch.
    pub fn sample<'a, R: Rng>(
        &'a self,
        rng: &mut R,
        batch_size: usize,
    ) -> Result<Vec<&'a TrainingExample>> {
        if batch_size > self.data.len() {
            return Err(AlphaZeroError::BufferUnderflow {
                have: self.data.len(),
                need: batch_size,
            });
        }
        Ok(rand::seq::index::sample(rng, self.data.len(), batch_size)
            .into_iter()
            .map(|i| &self.data[i])
            .collect())
    }

    /// Examples in insertion order, oldest first.
    pub fn iter_ordered(&self) -> impl Iterator<Item = &TrainingExample> {
        let (newer, older) = if self.data.len() < self.capacity {
            (&self.data[..0], &self.data[..])
        } else {
            self.data.split_at(self.write_index)
        };
        older.iter().chain(newer.iter())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            capacity: self.capacity,
            games_completed: self.games_completed,
            examples: self.iter_ordered().cloned().collect(),
        }
    }

    /// Rebuild a buffer from a snapshot. Examples beyond the snapshot
    /// capacity are impossible by construction and rejected.
    pub fn restore(snapshot: Snapshot) -> Result<Self> {
        if snapshot.capacity == 0 {
            return Err(AlphaZeroError::CorruptSnapshot(
                "snapshot capacity is zero".into(),
            ));
        }
        if snapshot.examples.len() > snapshot.capacity {
            return Err(AlphaZeroError::CorruptSnapshot(format!(
                "snapshot holds {} examples for capacity {}",
                snapshot.examples.len(),
                snapshot.capacity
            )));
        }
        Ok(Self {
            capacity: snapshot.capacity,
            data: snapshot.examples,
            write_index: 0,
            games_completed: snapshot.games_completed,
        })
    }
}
