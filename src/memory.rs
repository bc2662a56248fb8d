//! Bounded transition buffer with uniform minibatch sampling.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::thread_rng;

use crate::error::RlError;

/// A single recorded step: `(s, a, r, s', done)`.
///
/// The action is stored as its discrete index. Transitions are immutable once
/// recorded; the buffer is their sole owner and drops them on eviction.
#[derive(Debug, Clone)]
pub struct Transition<S> {
    pub state: S,
    pub action: usize,
    pub reward: f32,
    pub next_state: S,
    pub done: bool,
}

/// Fixed-capacity store of recent transitions.
///
/// Eviction is oldest-first: once `len() == capacity`, every `add` pops the
/// front entry before appending. Sampling is uniform without replacement and
/// never mutates the stored entries.
#[derive(Debug, Clone)]
pub struct ReplayBuffer<S> {
    buffer: VecDeque<Transition<S>>,
    capacity: usize,
}

impl<S: Clone> ReplayBuffer<S> {
    /// Create a buffer holding at most `capacity` transitions.
    pub fn new(capacity: usize) -> Result<Self, RlError> {
        if capacity == 0 {
            return Err(RlError::config("buffer capacity must be positive"));
        }
        Ok(Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Append a transition, evicting the oldest entry when full.
    pub fn add(&mut self, transition: Transition<S>) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    /// Draw `batch_size` transitions uniformly at random, without replacement.
    ///
    /// Returns the entire contents when fewer than `batch_size` entries are
    /// stored. Fails only on an empty buffer. No ordering guarantee.
    pub fn sample(&self, batch_size: usize) -> Result<Vec<Transition<S>>, RlError> {
        if self.buffer.is_empty() {
            return Err(RlError::EmptyBuffer);
        }
        let mut rng = thread_rng();
        let entries: Vec<&Transition<S>> = self.buffer.iter().collect();
        Ok(entries
            .choose_multiple(&mut rng, batch_size.min(entries.len()))
            .map(|t| (*t).clone())
            .collect())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every stored transition, keeping the capacity.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(tag: f32) -> Transition<[f32; 2]> {
        Transition {
            state: [tag, 0.0],
            action: 0,
            reward: tag,
            next_state: [tag, 1.0],
            done: false,
        }
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            ReplayBuffer::<[f32; 2]>::new(0),
            Err(RlError::Configuration(_))
        ));
    }

    #[test]
    fn test_len_never_exceeds_capacity() {
        let mut buffer = ReplayBuffer::new(3).unwrap();
        for i in 0..10 {
            buffer.add(transition(i as f32));
            assert!(buffer.len() <= 3);
        }
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_eviction_is_oldest_first() {
        let mut buffer = ReplayBuffer::new(2).unwrap();
        buffer.add(transition(0.0));
        buffer.add(transition(1.0));
        buffer.add(transition(2.0));

        // Rewards 1 and 2 survive; 0 was the oldest and must be gone.
        let mut rewards: Vec<f32> = buffer.sample(2).unwrap().iter().map(|t| t.reward).collect();
        rewards.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(rewards, vec![1.0, 2.0]);
    }

    #[test]
    fn test_sample_empty_buffer_fails() {
        let buffer = ReplayBuffer::<[f32; 2]>::new(4).unwrap();
        assert!(matches!(buffer.sample(1), Err(RlError::EmptyBuffer)));
    }

    #[test]
    fn test_sample_larger_than_len_returns_everything() {
        let mut buffer = ReplayBuffer::new(100).unwrap();
        for i in 0..3 {
            buffer.add(transition(i as f32));
        }
        assert_eq!(buffer.sample(10).unwrap().len(), 3);
    }

    #[test]
    fn test_sample_exact_batch_size() {
        let mut buffer = ReplayBuffer::new(100).unwrap();
        for i in 0..10 {
            buffer.add(transition(i as f32));
        }
        assert_eq!(buffer.sample(5).unwrap().len(), 5);
    }

    #[test]
    fn test_sampling_does_not_mutate() {
        let mut buffer = ReplayBuffer::new(100).unwrap();
        for i in 0..6 {
            buffer.add(transition(i as f32));
        }
        let _ = buffer.sample(4).unwrap();
        let _ = buffer.sample(4).unwrap();
        assert_eq!(buffer.len(), 6);

        // Every original reward is still present after sampling.
        let mut rewards: Vec<f32> = buffer.sample(6).unwrap().iter().map(|t| t.reward).collect();
        rewards.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(rewards, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_clear() {
        let mut buffer = ReplayBuffer::new(8).unwrap();
        buffer.add(transition(1.0));
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 8);
    }
}
