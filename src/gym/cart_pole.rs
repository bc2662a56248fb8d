use gym_rs::core::{ActionReward, Env};
use gym_rs::envs::classical_control::cartpole::{CartPoleEnv, CartPoleObservation};
use gym_rs::utils::renderer::RenderMode;
use strum::FromRepr;

use crate::env::{Environment, Report, StepOutcome};

fn obs2arr(observation: CartPoleObservation) -> [f32; 4] {
    Vec::from(observation)
        .into_iter()
        .map(|x| x as f32)
        .collect::<Vec<_>>()
        .try_into()
        .expect("vec is length 4")
}

/// Actions for the [`CartPole`] environment
/// 0 = push left, 1 = push right
#[derive(FromRepr, Clone, Copy, Debug)]
pub enum CPAction {
    PushLeft = 0,
    PushRight = 1,
}

impl From<usize> for CPAction {
    fn from(value: usize) -> Self {
        Self::from_repr(value).expect("CPAction::from is only called with valid values [0, 1]")
    }
}

/// The classic cart-pole balancing environment with discrete actions
///
/// This implementation is a thin wrapper around [gym_rs](https://github.com/MathisWellmann/gym-rs).
/// The wrapper's [`Report`] accumulates the raw environment reward, before
/// any shaping the training loop applies.
#[derive(Debug, Clone)]
pub struct CartPole {
    gym_env: CartPoleEnv,
    pub report: Report,
}

impl CartPole {
    pub fn new(render_mode: RenderMode) -> Self {
        Self {
            gym_env: CartPoleEnv::new(render_mode),
            report: Report::new(vec!["reward"]),
        }
    }
}

impl Environment for CartPole {
    type State = [f32; 4]; // [x, x_dot, theta, theta_dot]
    type Action = CPAction;

    fn reset(&mut self) -> Self::State {
        obs2arr(self.gym_env.reset(None, false, None).0)
    }

    fn step(&mut self, action: Self::Action) -> StepOutcome<Self::State> {
        let ActionReward {
            observation,
            reward,
            done,
            ..
        } = self.gym_env.step(action as usize);

        self.report.entry("reward").and_modify(|x| *x += *reward);

        StepOutcome {
            state: obs2arr(observation),
            reward: *reward as f32,
            done,
        }
    }

    fn action_count(&self) -> usize {
        2
    }

    fn observation_dim(&self) -> usize {
        4
    }
}
