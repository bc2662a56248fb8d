//! Actor-critic training loop with a replay-buffer-backed critic.
//!
//! One episode follows `RESET → (SELECT_ACTION → STEP_ENV → SHAPE_REWARD →
//! RECORD → UPDATE_CRITIC → ACCUMULATE)* → TERMINAL → UPDATE_ACTOR`. The
//! critic learns off-policy from buffer minibatches at every step; the actor
//! learns on-policy, either once per episode from the accumulated trace or
//! once per step from the single transition.

use burn::{
    module::AutodiffModule, prelude::*, tensor::backend::AutodiffBackend,
};
use tracing::{debug, error, info};

use crate::algo::actor::{Policy, PolicyModel};
use crate::algo::critic::{ValueEstimator, ValueModel};
use crate::decay::StepDecay;
use crate::env::Environment;
use crate::error::RlError;
use crate::memory::{ReplayBuffer, Transition};
use crate::traits::ToTensor;

/// When the actor takes its gradient step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorUpdate {
    /// One batched update per episode from the full accumulated trace.
    PerEpisode,
    /// One update per environment step from the single transition.
    PerStep,
}

/// Explicit reward shaping for failure-avoidance benchmarks.
///
/// When configured, the shaped value *replaces* the environment reward:
/// a terminal step at 1-based step count `<= early_failure_step_threshold`
/// earns `early_failure_reward`, a later terminal step earns
/// `late_failure_reward`, and every non-terminal step earns `step_reward`.
#[derive(Debug, Clone, Copy)]
pub struct RewardShaping {
    pub early_failure_step_threshold: usize,
    pub early_failure_reward: f32,
    pub late_failure_reward: f32,
    pub step_reward: f32,
}

impl RewardShaping {
    fn shape(&self, done: bool, completed_steps: usize) -> f32 {
        if !done {
            self.step_reward
        } else if completed_steps <= self.early_failure_step_threshold {
            self.early_failure_reward
        } else {
            self.late_failure_reward
        }
    }
}

/// Hyperparameters for [`ActorCriticAgent`], validated at construction.
#[derive(Debug, Clone)]
pub struct ActorCriticConfig {
    /// Discount factor γ.
    pub gamma: f32,
    /// Initial actor learning rate.
    pub lr_actor: f64,
    /// Initial critic learning rate.
    pub lr_critic: f64,
    /// Replay buffer capacity.
    pub buffer_capacity: usize,
    /// Minibatch size for critic updates.
    pub batch_size: usize,
    /// Bootstrap critic targets through a frozen snapshot.
    pub use_target_network: bool,
    /// Refresh the snapshot at the start of every Nth episode.
    pub target_refresh_interval: usize,
    /// Actor update cadence.
    pub actor_update: ActorUpdate,
    /// Multiplicative learning-rate decay factor.
    pub lr_decay_factor: f64,
    /// Episodes between learning-rate decay steps.
    pub lr_decay_interval: usize,
    /// Optional gradient-value clipping for both optimizers.
    pub gradient_clip: Option<f32>,
    /// Optional reward shaping; absent, the raw reward passes through.
    pub shaping: Option<RewardShaping>,
    /// Hard bound on episode length for environments that never terminate.
    pub max_steps_per_episode: usize,
}

impl Default for ActorCriticConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            lr_actor: 1e-2,
            lr_critic: 1e-2,
            buffer_capacity: 2000,
            batch_size: 32,
            use_target_network: false,
            target_refresh_interval: 100,
            actor_update: ActorUpdate::PerEpisode,
            lr_decay_factor: 0.1,
            lr_decay_interval: 500,
            gradient_clip: None,
            shaping: None,
            max_steps_per_episode: 500,
        }
    }
}

impl ActorCriticConfig {
    pub fn validate(&self) -> Result<(), RlError> {
        if !(self.gamma > 0.0 && self.gamma <= 1.0) {
            return Err(RlError::config("gamma must be in (0, 1]"));
        }
        if !(self.lr_actor > 0.0 && self.lr_actor.is_finite()) {
            return Err(RlError::config("actor learning rate must be positive"));
        }
        if !(self.lr_critic > 0.0 && self.lr_critic.is_finite()) {
            return Err(RlError::config("critic learning rate must be positive"));
        }
        if self.buffer_capacity == 0 {
            return Err(RlError::config("buffer capacity must be positive"));
        }
        if self.batch_size == 0 {
            return Err(RlError::config("batch size must be positive"));
        }
        if self.target_refresh_interval == 0 {
            return Err(RlError::config("target refresh interval must be positive"));
        }
        if self.max_steps_per_episode == 0 {
            return Err(RlError::config("max steps per episode must be positive"));
        }
        // Decay factor and interval are validated by StepDecay.
        StepDecay::new(self.lr_actor, self.lr_decay_factor, self.lr_decay_interval)?;
        Ok(())
    }
}

/// Per-episode result of one [`ActorCriticAgent::go`] call.
#[derive(Debug, Clone, Copy)]
pub struct EpisodeStats {
    pub episode: usize,
    /// Sum of (shaped) rewards over the episode.
    pub reward: f32,
    pub steps: usize,
    /// Mean critic loss per step.
    pub critic_loss: f32,
    /// Mean actor objective per step.
    pub actor_objective: f32,
}

/// Accumulated per-episode histories, one entry per completed episode.
///
/// This is the explicit home for everything the run tracks over time —
/// consumers (plotting frontends, progress printers) read it instead of the
/// loop keeping ambient counters.
#[derive(Debug, Clone, Default)]
pub struct TrainingState {
    pub episodes: usize,
    pub total_steps: usize,
    pub rewards: Vec<f32>,
    pub timesteps: Vec<usize>,
    pub critic_losses: Vec<f32>,
    pub actor_objectives: Vec<f32>,
}

impl TrainingState {
    fn record(&mut self, stats: &EpisodeStats) {
        self.episodes += 1;
        self.total_steps += stats.steps;
        self.rewards.push(stats.reward);
        self.timesteps.push(stats.steps);
        self.critic_losses.push(stats.critic_loss);
        self.actor_objectives.push(stats.actor_objective);
    }
}

/// Per-episode accumulation for the batched actor update.
///
/// Targets and predicted values are recorded at step time, before the
/// critic's own update for that step, so the advantage reflects the
/// estimates the action was taken under.
#[derive(Debug, Clone)]
struct EpisodeTrace<S> {
    states: Vec<S>,
    actions: Vec<usize>,
    targets: Vec<f32>,
    values: Vec<f32>,
}

impl<S> EpisodeTrace<S> {
    fn new() -> Self {
        Self {
            states: Vec::new(),
            actions: Vec::new(),
            targets: Vec::new(),
            values: Vec::new(),
        }
    }

    fn push(&mut self, state: S, action: usize, target: f32, value: f32) {
        self.states.push(state);
        self.actions.push(action);
        self.targets.push(target);
        self.values.push(value);
    }

    fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Actor-critic agent driving episodes against an [`Environment`].
///
/// ### Generics
/// - `B` - A burn autodiff backend
/// - `P` - The [`PolicyModel`] for the actor
/// - `V` - The [`ValueModel`] for the critic
/// - `E` - The [`Environment`] in which the agent learns; its action space
///   must be discrete and its state conversion lightweight, since states are
///   cloned into the buffer at every step.
pub struct ActorCriticAgent<B, P, V, E>
where
    B: AutodiffBackend,
    P: AutodiffModule<B>,
    V: AutodiffModule<B>,
    E: Environment,
{
    policy: Policy<B, P>,
    critic: ValueEstimator<B, V>,
    buffer: ReplayBuffer<E::State>,
    batch_size: usize,
    actor_update: ActorUpdate,
    shaping: Option<RewardShaping>,
    target_refresh_interval: usize,
    actor_schedule: StepDecay,
    critic_schedule: StepDecay,
    max_steps_per_episode: usize,
    episodes_elapsed: usize,
    history: TrainingState,
}

impl<B, P, V, E> ActorCriticAgent<B, P, V, E>
where
    B: AutodiffBackend<FloatElem = f32>,
    P: PolicyModel<B>,
    V: ValueModel<B>,
    E: Environment,
    E::Action: From<usize>,
    Vec<E::State>: ToTensor<B, 2, Float>,
{
    /// Initialize a new agent from untrained actor and critic networks.
    pub fn new(
        actor: P,
        critic: V,
        config: ActorCriticConfig,
        device: &'static B::Device,
    ) -> Result<Self, RlError> {
        config.validate()?;
        let actor_schedule =
            StepDecay::new(config.lr_actor, config.lr_decay_factor, config.lr_decay_interval)?;
        let critic_schedule =
            StepDecay::new(config.lr_critic, config.lr_decay_factor, config.lr_decay_interval)?;
        Ok(Self {
            policy: Policy::new(actor, config.lr_actor, config.gradient_clip, device),
            critic: ValueEstimator::new(
                critic,
                config.lr_critic,
                config.gamma,
                config.use_target_network,
                config.gradient_clip,
                device,
            ),
            buffer: ReplayBuffer::new(config.buffer_capacity)?,
            batch_size: config.batch_size,
            actor_update: config.actor_update,
            shaping: config.shaping,
            target_refresh_interval: config.target_refresh_interval,
            actor_schedule,
            critic_schedule,
            max_steps_per_episode: config.max_steps_per_episode,
            episodes_elapsed: 0,
            history: TrainingState::default(),
        })
    }

    /// Run one episode.
    ///
    /// Buffer and numerical failures abort the episode: they are logged with
    /// the episode index and propagated, leaving the run to the caller to
    /// stop rather than continuing with corrupted state.
    pub fn go(&mut self, env: &mut E) -> Result<EpisodeStats, RlError> {
        let episode = self.episodes_elapsed;
        match self.run_episode(env) {
            Ok(stats) => Ok(stats),
            Err(err) => {
                error!(episode, error = %err, "aborting training run");
                Err(err)
            }
        }
    }

    /// Drive `episodes` episodes, logging progress every ten.
    pub fn train(&mut self, env: &mut E, episodes: usize) -> Result<(), RlError> {
        for _ in 0..episodes {
            let stats = self.go(env)?;
            if (stats.episode + 1) % 10 == 0 {
                info!(
                    episode = stats.episode + 1,
                    actor_lr = self.policy.lr(),
                    critic_lr = self.critic.lr(),
                    reward = stats.reward,
                    steps = stats.steps,
                    critic_loss = stats.critic_loss,
                    actor_objective = stats.actor_objective,
                    "training progress"
                );
            }
        }
        Ok(())
    }

    fn run_episode(&mut self, env: &mut E) -> Result<EpisodeStats, RlError> {
        let episode = self.episodes_elapsed;

        if episode % self.target_refresh_interval == 0 {
            self.critic.refresh_target();
        }

        let mut state = env.reset();
        let mut trace = EpisodeTrace::new();
        let mut episode_reward = 0.0_f32;
        let mut steps = 0_usize;
        let mut critic_loss_sum = 0.0_f32;
        let mut actor_objective_sum = 0.0_f32;

        loop {
            let (action, _log_prob) = self.policy.act(&state)?;
            let outcome = env.step(E::Action::from(action));

            let reward = match &self.shaping {
                Some(shaping) => shaping.shape(outcome.done, steps + 1),
                None => outcome.reward,
            };

            // Estimates recorded before this step's critic update.
            let value = self.critic.evaluate(&state);
            let target = self.critic.td_target(reward, outcome.done, &outcome.state);

            self.buffer.add(Transition {
                state: state.clone(),
                action,
                reward,
                next_state: outcome.state.clone(),
                done: outcome.done,
            });

            let batch = self.buffer.sample(self.batch_size)?;
            critic_loss_sum += self.critic.update(&batch)?;

            match self.actor_update {
                ActorUpdate::PerEpisode => trace.push(state.clone(), action, target, value),
                ActorUpdate::PerStep => {
                    if let Some(objective) =
                        self.policy
                            .update(vec![state.clone()], &[action], &[target - value])?
                    {
                        actor_objective_sum += objective;
                    }
                }
            }

            episode_reward += reward;
            steps += 1;
            state = outcome.state;

            if outcome.done || steps >= self.max_steps_per_episode {
                break;
            }
        }

        if self.actor_update == ActorUpdate::PerEpisode && !trace.is_empty() {
            let advantages: Vec<f32> = trace
                .targets
                .iter()
                .zip(&trace.values)
                .map(|(target, value)| target - value)
                .collect();
            if let Some(objective) =
                self.policy.update(trace.states, &trace.actions, &advantages)?
            {
                actor_objective_sum += objective;
            }
        }

        self.episodes_elapsed += 1;
        self.policy.set_lr(self.actor_schedule.at(self.episodes_elapsed));
        self.critic.set_lr(self.critic_schedule.at(self.episodes_elapsed));

        let stats = EpisodeStats {
            episode,
            reward: episode_reward,
            steps,
            critic_loss: critic_loss_sum / steps as f32,
            actor_objective: actor_objective_sum / steps as f32,
        };
        self.history.record(&stats);
        debug!(
            episode,
            reward = stats.reward,
            steps = stats.steps,
            critic_loss = stats.critic_loss,
            "episode complete"
        );
        Ok(stats)
    }

    pub fn history(&self) -> &TrainingState {
        &self.history
    }

    pub fn episodes_elapsed(&self) -> usize {
        self.episodes_elapsed
    }

    pub fn total_steps(&self) -> usize {
        self.history.total_steps
    }

    pub fn critic(&self) -> &ValueEstimator<B, V> {
        &self.critic
    }

    pub fn policy(&self) -> &Policy<B, P> {
        &self.policy
    }
}
