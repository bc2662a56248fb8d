//! Policy ("actor"): a categorical distribution over discrete actions,
//! trained by advantage-weighted policy gradient.

use burn::{
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::activation::{log_softmax, softmax},
    tensor::backend::AutodiffBackend,
};
use rand::{
    distributions::{Distribution, WeightedIndex},
    thread_rng,
};
use tracing::debug;

use crate::error::RlError;
use crate::nn::MLP;
use crate::traits::ToTensor;

/// A burn module usable as a policy network.
///
/// The forward pass maps a batch of states to action logits (pre-softmax),
/// shape `(batch, num_actions)`.
pub trait PolicyModel<B: AutodiffBackend>: AutodiffModule<B> {
    fn forward(&self, states: Tensor<B, 2>) -> Tensor<B, 2>;
}

impl<B: AutodiffBackend> PolicyModel<B> for MLP<B> {
    fn forward(&self, states: Tensor<B, 2>) -> Tensor<B, 2> {
        MLP::forward(self, states)
    }
}

/// Normalize a batch of advantages to zero mean and unit variance.
///
/// Returns `None` when the batch variance is (near-)zero: after mean
/// subtraction every term would vanish, so the caller skips the update
/// instead of dividing by zero.
pub(crate) fn normalized_advantages(advantages: &[f32]) -> Option<Vec<f32>> {
    let n = advantages.len() as f32;
    let mean = advantages.iter().sum::<f32>() / n;
    let variance = advantages.iter().map(|a| (a - mean).powi(2)).sum::<f32>() / n;
    let std = variance.sqrt();
    if std <= f32::EPSILON {
        return None;
    }
    Some(advantages.iter().map(|a| (a - mean) / (std + 1e-8)).collect())
}

/// Stochastic policy over a fixed discrete action set.
pub struct Policy<B, M>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    net: M,
    optimizer: OptimizerAdaptor<Adam, M, B>,
    lr: f64,
    device: &'static B::Device,
}

impl<B, M> Policy<B, M>
where
    B: AutodiffBackend<FloatElem = f32>,
    M: PolicyModel<B>,
{
    pub fn new(net: M, lr: f64, gradient_clip: Option<f32>, device: &'static B::Device) -> Self {
        let optimizer = match gradient_clip {
            Some(clip) => AdamConfig::new()
                .with_grad_clipping(Some(GradientClippingConfig::Value(clip)))
                .init(),
            None => AdamConfig::new().init(),
        };
        Self {
            net,
            optimizer,
            lr,
            device,
        }
    }

    /// Sample one action for `state` from the categorical distribution.
    ///
    /// Returns the action index and the log-probability of that action.
    /// Repeated calls with the same state may yield different actions; the
    /// stochasticity is the exploration mechanism.
    pub fn act<S>(&self, state: &S) -> Result<(usize, f32), RlError>
    where
        S: Clone,
        Vec<S>: ToTensor<B, 2, Float>,
    {
        let input = vec![state.clone()].to_tensor(self.device);
        let logits = self.net.forward(input);
        let probs = softmax(logits.clone(), 1);
        let log_probs = log_softmax(logits, 1);

        let probs_data = probs.to_data();
        let probs_slice = probs_data.as_slice::<f32>().unwrap();
        let dist = WeightedIndex::new(probs_slice).map_err(|e| {
            RlError::NumericalInstability(format!("invalid action distribution: {e}"))
        })?;
        let action = dist.sample(&mut thread_rng());

        let log_prob_data = log_probs.to_data();
        let log_prob = log_prob_data.as_slice::<f32>().unwrap()[action];

        Ok((action, log_prob))
    }

    /// One policy-gradient step from recorded `(state, action)` pairs and
    /// their advantages: `sum(-log_prob_i * advantage_i)`.
    ///
    /// Log-probabilities are recomputed in a single batched forward pass;
    /// the parameters have not changed since the pairs were recorded, so the
    /// recomputed values equal the ones observed by [`Policy::act`].
    ///
    /// Advantages are normalized to zero mean and unit variance across the
    /// batch. A batch of one (the single-transition update mode) uses the
    /// raw advantage; a larger batch with zero variance skips the step and
    /// returns `Ok(None)`.
    pub fn update<S>(
        &mut self,
        states: Vec<S>,
        actions: &[usize],
        advantages: &[f32],
    ) -> Result<Option<f32>, RlError>
    where
        Vec<S>: ToTensor<B, 2, Float>,
    {
        if states.is_empty() {
            return Err(RlError::MalformedBatch("empty policy update batch".into()));
        }
        if states.len() != actions.len() || actions.len() != advantages.len() {
            return Err(RlError::MalformedBatch(format!(
                "mismatched lengths: {} states, {} actions, {} advantages",
                states.len(),
                actions.len(),
                advantages.len()
            )));
        }

        let scaled = if advantages.len() == 1 {
            advantages.to_vec()
        } else {
            match normalized_advantages(advantages) {
                Some(scaled) => scaled,
                None => {
                    debug!("skipping actor update: zero-variance advantage batch");
                    return Ok(None);
                }
            }
        };

        let states = states.to_tensor(self.device);
        let action_indices: Vec<i32> = actions.iter().map(|&a| a as i32).collect();
        let action_indices = Tensor::<B, 1, Int>::from_data(
            TensorData::from(action_indices.as_slice()).convert::<B::IntElem>(),
            self.device,
        )
        .unsqueeze_dim::<2>(1);

        let logits = self.net.forward(states);
        let log_probs = log_softmax(logits, 1);
        let chosen: Tensor<B, 1> = log_probs.gather(1, action_indices).squeeze_dims(&[1]);

        let advantages: Tensor<B, 1> = scaled.to_tensor(self.device);
        let objective = (chosen * advantages).sum().neg();

        let objective_value: f32 = objective.clone().into_scalar();
        if !objective_value.is_finite() {
            return Err(RlError::NumericalInstability(format!(
                "actor objective is not finite: {objective_value}"
            )));
        }

        let grads = objective.backward();
        let grads = GradientsParams::from_grads(grads, &self.net);
        self.net = self.optimizer.step(self.lr, self.net.clone(), grads);

        Ok(Some(objective_value))
    }

    pub fn lr(&self) -> f64 {
        self.lr
    }

    pub fn set_lr(&mut self, lr: f64) {
        self.lr = lr;
    }
}
