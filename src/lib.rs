//! Actor-critic reinforcement learning with a replay-buffer-backed critic.
//!
//! The crate separates four concerns:
//! - [`memory`]: a bounded transition buffer with uniform minibatch sampling,
//! - [`algo::critic`]: a state-value estimator trained on bootstrapped
//!   temporal-difference targets, optionally through a frozen target
//!   snapshot,
//! - [`algo::actor`]: a categorical policy trained by advantage-weighted
//!   policy gradient with batch advantage normalization,
//! - [`algo::actor_critic`]: the episode loop coordinating both — per-step
//!   off-policy critic updates, per-episode (or per-step) on-policy actor
//!   updates, reward shaping, target refresh cadence and learning-rate
//!   decay.
//!
//! Environments plug in through the [`env::Environment`] trait; a
//! [gym_rs](https://github.com/MathisWellmann/gym-rs) cart-pole wrapper
//! ships in [`gym`].

pub mod algo;
pub mod decay;
pub mod env;
pub mod error;
pub mod gym;
pub mod memory;
pub mod nn;
pub mod traits;

pub use error::RlError;
