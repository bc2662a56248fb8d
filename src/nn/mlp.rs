//! Multi-Layer Perceptron - generic feedforward network
//!
//! One MLP type serves as both the actor and the critic: configure the
//! output dimension as the action count for a policy head or as 1 for a
//! value head.

use burn::{
    module::Module,
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::{activation::relu, backend::Backend},
};

/// Configuration for the [`MLP`].
#[derive(Config, Debug)]
pub struct MLPConfig {
    /// Input dimension
    pub input_dim: usize,
    /// Hidden layer dimensions (e.g., [24, 24] for two hidden layers of 24 units each)
    pub hidden_layers: Vec<usize>,
    /// Output dimension
    pub output_dim: usize,
}

/// Feedforward network with ReLU hidden activations and a linear output
/// layer.
#[derive(Module, Debug)]
pub struct MLP<B: Backend> {
    layers: Vec<Linear<B>>,
}

impl MLPConfig {
    /// Initialize the MLP with the given configuration
    pub fn init<B: Backend>(&self, device: &B::Device) -> MLP<B> {
        let mut layers = Vec::new();

        if self.hidden_layers.is_empty() {
            layers.push(LinearConfig::new(self.input_dim, self.output_dim).init(device));
        } else {
            layers.push(LinearConfig::new(self.input_dim, self.hidden_layers[0]).init(device));

            for i in 0..self.hidden_layers.len() - 1 {
                layers.push(
                    LinearConfig::new(self.hidden_layers[i], self.hidden_layers[i + 1])
                        .init(device),
                );
            }

            let last_hidden = *self.hidden_layers.last().unwrap();
            layers.push(LinearConfig::new(last_hidden, self.output_dim).init(device));
        }

        MLP { layers }
    }
}

impl<B: Backend> MLP<B> {
    /// Forward pass; the last dimension is the feature dimension.
    pub fn forward<const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        let mut x: Tensor<B, D> = input;

        for layer in &self.layers[..self.layers.len() - 1] {
            x = layer.forward(x);
            x = relu(x);
        }

        x = self.layers.last().unwrap().forward(x);

        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::{NdArray, NdArrayDevice};

    #[test]
    fn test_mlp_forward_2d() {
        let device = NdArrayDevice::default();

        // 4 → [24, 24] → 2
        let config = MLPConfig::new(4, vec![24, 24], 2);
        let mlp = config.init::<NdArray>(&device);

        let input = Tensor::<NdArray, 2>::random(
            [8, 4],
            burn::tensor::Distribution::Uniform(-1.0, 1.0),
            &device,
        );

        let output: Tensor<NdArray, 2> = mlp.forward(input);
        assert_eq!(output.shape().dims, [8, 2]);
    }

    #[test]
    fn test_mlp_value_head_shape() {
        let device = NdArrayDevice::default();

        // 4 → [24, 24] → 1
        let config = MLPConfig::new(4, vec![24, 24], 1);
        let mlp = config.init::<NdArray>(&device);

        let input = Tensor::<NdArray, 2>::random([3, 4], burn::tensor::Distribution::Default, &device);
        let output: Tensor<NdArray, 2> = mlp.forward(input);
        assert_eq!(output.shape().dims, [3, 1]);
    }

    #[test]
    fn test_mlp_no_hidden_layers() {
        let device = NdArrayDevice::default();

        // Direct connection: 4 → 2
        let config = MLPConfig::new(4, vec![], 2);
        let mlp = config.init::<NdArray>(&device);

        let input = Tensor::<NdArray, 2>::random([1, 4], burn::tensor::Distribution::Default, &device);
        let output = mlp.forward(input);

        assert_eq!(output.shape().dims, [1, 2]);
    }
}
