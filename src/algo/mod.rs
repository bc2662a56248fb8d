//! The actor-critic training core.

pub mod actor;
pub mod actor_critic;
pub mod critic;

pub use actor::{Policy, PolicyModel};
pub use actor_critic::{
    ActorCriticAgent, ActorCriticConfig, ActorUpdate, EpisodeStats, RewardShaping, TrainingState,
};
pub use critic::{ValueEstimator, ValueModel};
