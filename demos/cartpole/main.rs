//! Cart-pole benchmark: no target network, one batched actor update per
//! episode, shaped rewards discouraging early failure.

use acrl::{
    algo::{ActorCriticAgent, ActorCriticConfig, ActorUpdate, RewardShaping},
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

const NUM_EPISODES: usize = 500;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut env = CartPole::new(RenderMode::None);

    // Actor: state (4) → hidden (24) → hidden (24) → actions (2)
    // Critic: state (4) → hidden (24) → hidden (24) → value (1)
    let actor = MLPConfig::new(env.observation_dim(), vec![24, 24], env.action_count())
        .init::<Backend>(&DEVICE);
    let critic = MLPConfig::new(env.observation_dim(), vec![24, 24], 1).init::<Backend>(&DEVICE);

    let config = ActorCriticConfig {
        shaping: Some(RewardShaping {
            early_failure_step_threshold: 170,
            early_failure_reward: -500.0,
            late_failure_reward: 50.0,
            step_reward: 20.0,
        }),
        actor_update: ActorUpdate::PerEpisode,
        max_steps_per_episode: 200,
        ..ActorCriticConfig::default()
    };

    let mut agent =
        ActorCriticAgent::new(actor, critic, config, &DEVICE).expect("valid configuration");

    for episode in 0..NUM_EPISODES {
        let stats = agent.go(&mut env).expect("training failed");
        let raw = env.report.take();

        if (episode + 1) % 10 == 0 {
            println!(
                "Episode {:>4} | shaped reward {:>8.1} | raw reward {:>6.1} | steps {:>3} | critic loss {:>12.4} | actor objective {:>12.4}",
                episode + 1,
                stats.reward,
                raw.get("reward").copied().unwrap_or(0.0),
                stats.steps,
                stats.critic_loss,
                stats.actor_objective,
            );
        }
    }

    let history = agent.history();
    println!(
        "\nTraining complete: {} episodes, {} environment steps.",
        history.episodes, history.total_steps
    );
}
