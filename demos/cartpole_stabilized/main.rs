//! Cart-pole with a stabilized critic: bootstrapped targets come from a
//! frozen snapshot refreshed every 100 episodes. Any terminal step inside
//! the 500-step horizon counts as an early failure.

use acrl::{
    algo::{ActorCriticAgent, ActorCriticConfig, RewardShaping},
    env::Environment,
    gym::CartPole,
    nn::MLPConfig,
};
use burn::backend::{
    ndarray::{NdArray, NdArrayDevice},
    Autodiff,
};
use gym_rs::utils::renderer::RenderMode;
use once_cell::sync::Lazy;

type Backend = Autodiff<NdArray>;

static DEVICE: Lazy<NdArrayDevice> = Lazy::new(NdArrayDevice::default);

const NUM_EPISODES: usize = 5000;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut env = CartPole::new(RenderMode::None);

    let actor = MLPConfig::new(env.observation_dim(), vec![24, 24], env.action_count())
        .init::<Backend>(&DEVICE);
    let critic = MLPConfig::new(env.observation_dim(), vec![24, 24], 1).init::<Backend>(&DEVICE);

    let config = ActorCriticConfig {
        use_target_network: true,
        target_refresh_interval: 100,
        shaping: Some(RewardShaping {
            early_failure_step_threshold: 500,
            early_failure_reward: -500.0,
            late_failure_reward: 50.0,
            step_reward: 20.0,
        }),
        max_steps_per_episode: 500,
        ..ActorCriticConfig::default()
    };

    let mut agent =
        ActorCriticAgent::new(actor, critic, config, &DEVICE).expect("valid configuration");

    agent
        .train(&mut env, NUM_EPISODES)
        .expect("training failed");

    let history = agent.history();
    let recent: f32 = history.rewards.iter().rev().take(10).sum::<f32>() / 10.0;
    println!(
        "Training complete: {} episodes, {} environment steps, mean shaped reward over the last 10 episodes: {recent:.1}",
        history.episodes, history.total_steps
    );
}
