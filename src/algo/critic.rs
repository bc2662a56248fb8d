//! Value estimator ("critic"): state-value regression against bootstrapped
//! temporal-difference targets, with an optional frozen target snapshot.

use burn::{
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    nn::loss::{MseLoss, Reduction},
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::error::RlError;
use crate::memory::Transition;
use crate::nn::MLP;
use crate::traits::{BoolToTensor, ToTensor};

/// A burn module usable as a value network.
///
/// The forward pass maps a batch of states to value estimates, shape
/// `(batch, 1)`.
pub trait ValueModel<B: AutodiffBackend>: AutodiffModule<B> {
    fn forward(&self, states: Tensor<B, 2>) -> Tensor<B, 2>;
}

impl<B: AutodiffBackend> ValueModel<B> for MLP<B> {
    fn forward(&self, states: Tensor<B, 2>) -> Tensor<B, 2> {
        MLP::forward(self, states)
    }
}

/// State-value function approximator.
///
/// When constructed with `use_target_network`, a frozen copy of the live
/// network provides the bootstrapped next-state values. The copy is only
/// ever written by [`ValueEstimator::refresh_target`] — a wholesale
/// parameter copy — never by gradient steps; the caller owns the refresh
/// cadence.
pub struct ValueEstimator<B, M>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    net: M,
    target_net: Option<M>,
    optimizer: OptimizerAdaptor<Adam, M, B>,
    lr: f64,
    gamma: f32,
    device: &'static B::Device,
}

impl<B, M> ValueEstimator<B, M>
where
    B: AutodiffBackend<FloatElem = f32>,
    M: ValueModel<B>,
{
    pub fn new(
        net: M,
        lr: f64,
        gamma: f32,
        use_target_network: bool,
        gradient_clip: Option<f32>,
        device: &'static B::Device,
    ) -> Self {
        let optimizer = match gradient_clip {
            Some(clip) => AdamConfig::new()
                .with_grad_clipping(Some(GradientClippingConfig::Value(clip)))
                .init(),
            None => AdamConfig::new().init(),
        };
        let target_net = use_target_network.then(|| net.clone());
        Self {
            net,
            target_net,
            optimizer,
            lr,
            gamma,
            device,
        }
    }

    /// Value estimate for a single state through the live network.
    pub fn evaluate<S>(&self, state: &S) -> f32
    where
        S: Clone,
        Vec<S>: ToTensor<B, 2, Float>,
    {
        let input = vec![state.clone()].to_tensor(self.device);
        self.net.forward(input).into_scalar()
    }

    /// Value estimate through the frozen snapshot when one is configured,
    /// through the live network otherwise.
    pub fn evaluate_target<S>(&self, state: &S) -> f32
    where
        S: Clone,
        Vec<S>: ToTensor<B, 2, Float>,
    {
        let input = vec![state.clone()].to_tensor(self.device);
        match &self.target_net {
            Some(target) => target.forward(input).into_scalar(),
            None => self.net.forward(input).into_scalar(),
        }
    }

    /// Bootstrapped regression target for one transition:
    /// `reward + gamma * (1 - done) * evaluate_target(next_state)`.
    ///
    /// A terminal transition has no valid successor, so its target is the
    /// reward alone, whatever the recorded next state.
    pub fn td_target<S>(&self, reward: f32, done: bool, next_state: &S) -> f32
    where
        S: Clone,
        Vec<S>: ToTensor<B, 2, Float>,
    {
        if done {
            reward
        } else {
            reward + self.gamma * self.evaluate_target(next_state)
        }
    }

    /// One gradient step minimizing the MSE between predicted values and the
    /// bootstrapped targets of `batch`. Returns the scalar loss.
    pub fn update<S>(&mut self, batch: &[Transition<S>]) -> Result<f32, RlError>
    where
        S: Clone,
        Vec<S>: ToTensor<B, 2, Float>,
    {
        if batch.is_empty() {
            return Err(RlError::MalformedBatch("empty critic update batch".into()));
        }
        let batch_size = batch.len();

        // Non-terminal mask keeps tensor shapes aligned while zeroing the
        // bootstrap term of terminal transitions.
        let non_terminal_mask = batch
            .iter()
            .map(|t| !t.done)
            .collect::<Vec<_>>()
            .to_bool_tensor(self.device)
            .unsqueeze_dim::<2>(1);

        let states: Tensor<B, 2> = batch
            .iter()
            .map(|t| t.state.clone())
            .collect::<Vec<_>>()
            .to_tensor(self.device);
        let next_states: Tensor<B, 2> = batch
            .iter()
            .map(|t| t.next_state.clone())
            .collect::<Vec<_>>()
            .to_tensor(self.device);
        let rewards = batch
            .iter()
            .map(|t| t.reward)
            .collect::<Vec<_>>()
            .to_tensor(self.device)
            .unsqueeze_dim::<2>(1);

        let next_values = match &self.target_net {
            Some(target) => target.forward(next_states),
            None => self.net.forward(next_states),
        }
        .detach();

        let bootstrapped =
            Tensor::zeros([batch_size, 1], self.device).mask_where(non_terminal_mask, next_values);
        let targets = rewards + bootstrapped * self.gamma;

        let predicted = self.net.forward(states);
        let loss = MseLoss::new().forward(predicted, targets, Reduction::Mean);

        let loss_value: f32 = loss.clone().into_scalar();
        if !loss_value.is_finite() {
            return Err(RlError::NumericalInstability(format!(
                "critic loss is not finite: {loss_value}"
            )));
        }

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.net);
        self.net = self.optimizer.step(self.lr, self.net.clone(), grads);

        Ok(loss_value)
    }

    /// Wholesale parameter copy from the live network into the frozen
    /// snapshot. No-op when no snapshot is configured.
    pub fn refresh_target(&mut self) {
        if self.target_net.is_some() {
            self.target_net = Some(self.net.clone());
        }
    }

    pub fn has_target(&self) -> bool {
        self.target_net.is_some()
    }

    pub fn lr(&self) -> f64 {
        self.lr
    }

    pub fn set_lr(&mut self, lr: f64) {
        self.lr = lr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::MLPConfig;
    use burn::backend::ndarray::{NdArray, NdArrayDevice};
    use burn::backend::Autodiff;
    use once_cell::sync::Lazy;

    type TestBackend = Autodiff<NdArray>;

    static DEVICE: Lazy<NdArrayDevice> = Lazy::new(NdArrayDevice::default);

    fn estimator(use_target: bool) -> ValueEstimator<TestBackend, MLP<TestBackend>> {
        let net = MLPConfig::new(2, vec![8], 1).init::<TestBackend>(&DEVICE);
        ValueEstimator::new(net, 1e-2, 0.99, use_target, None, &DEVICE)
    }

    fn transition(reward: f32, done: bool) -> Transition<[f32; 2]> {
        Transition {
            state: [0.1, -0.2],
            action: 0,
            reward,
            next_state: [0.3, 0.4],
            done,
        }
    }

    #[test]
    fn test_terminal_target_is_exactly_the_reward() {
        let critic = estimator(false);
        assert_eq!(critic.td_target(-500.0, true, &[9.0_f32, 9.0]), -500.0);
        assert_eq!(critic.td_target(50.0, true, &[0.0_f32, 0.0]), 50.0);
    }

    #[test]
    fn test_non_terminal_target_bootstraps_next_value() {
        let critic = estimator(false);
        let next = [0.3_f32, 0.4];
        let expected = 20.0 + 0.99 * critic.evaluate_target(&next);
        let target = critic.td_target(20.0, false, &next);
        assert!((target - expected).abs() < 1e-5);
    }

    #[test]
    fn test_update_terminal_batch_matches_reward_regression() {
        let mut critic = estimator(false);
        let t = transition(5.0, true);
        let predicted = critic.evaluate(&t.state);

        // With a single terminal transition the MSE reduces to
        // (V(s) - reward)^2 — the next state must not contribute.
        let loss = critic.update(std::slice::from_ref(&t)).unwrap();
        let expected = (predicted - 5.0).powi(2);
        assert!((loss - expected).abs() < 1e-4, "loss {loss} vs {expected}");
    }

    #[test]
    fn test_update_non_terminal_batch_uses_bootstrapped_target() {
        let mut critic = estimator(false);
        let t = transition(2.0, false);
        let predicted = critic.evaluate(&t.state);
        let target = critic.td_target(2.0, false, &t.next_state);

        let loss = critic.update(std::slice::from_ref(&t)).unwrap();
        let expected = (predicted - target).powi(2);
        assert!((loss - expected).abs() < 1e-4, "loss {loss} vs {expected}");
    }

    #[test]
    fn test_update_loss_is_finite_and_non_negative() {
        let mut critic = estimator(false);
        let batch: Vec<_> = (0..8)
            .map(|i| transition(i as f32, i % 4 == 3))
            .collect();
        for _ in 0..10 {
            let loss = critic.update(&batch).unwrap();
            assert!(loss.is_finite());
            assert!(loss >= 0.0);
        }
    }

    #[test]
    fn test_update_rejects_empty_batch() {
        let mut critic = estimator(false);
        let empty: [Transition<[f32; 2]>; 0] = [];
        assert!(matches!(
            critic.update(&empty),
            Err(RlError::MalformedBatch(_))
        ));
    }

    #[test]
    fn test_target_snapshot_frozen_until_refresh() {
        let mut critic = estimator(true);
        let probe = [0.5_f32, -0.5];
        let frozen = critic.evaluate_target(&probe);

        let batch: Vec<_> = (0..4).map(|i| transition(10.0 + i as f32, false)).collect();
        for _ in 0..20 {
            critic.update(&batch).unwrap();
        }

        // Gradient steps moved the live network but not the snapshot.
        assert_ne!(critic.evaluate(&probe), frozen);
        assert_eq!(critic.evaluate_target(&probe), frozen);

        critic.refresh_target();
        assert_eq!(critic.evaluate_target(&probe), critic.evaluate(&probe));
    }

    #[test]
    fn test_without_target_network_evaluate_target_tracks_live() {
        let mut critic = estimator(false);
        assert!(!critic.has_target());
        let probe = [0.2_f32, 0.8];
        assert_eq!(critic.evaluate_target(&probe), critic.evaluate(&probe));

        critic.refresh_target(); // no-op
        let batch = vec![transition(3.0, false)];
        critic.update(&batch).unwrap();
        assert_eq!(critic.evaluate_target(&probe), critic.evaluate(&probe));
    }
}
