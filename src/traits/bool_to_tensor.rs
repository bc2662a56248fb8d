use burn::{
    prelude::*,
    tensor::{backend::Backend, TensorData},
};

/// Conversion of host-side flag vectors into boolean mask tensors.
pub trait BoolToTensor<B: Backend> {
    fn to_bool_tensor(self, device: &B::Device) -> Tensor<B, 1, Bool>;
}

impl<B: Backend> BoolToTensor<B> for Vec<bool> {
    fn to_bool_tensor(self, device: &B::Device) -> Tensor<B, 1, Bool> {
        let len = self.len();
        let int_data: Vec<i32> = self.into_iter().map(i32::from).collect();
        let int_tensor: Tensor<B, 1, Int> =
            Tensor::from_data(TensorData::new(int_data, [len]), device);
        int_tensor.greater_elem(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::{NdArray, NdArrayDevice};

    #[test]
    fn test_flags_round_trip() {
        let device = NdArrayDevice::default();
        let mask: Tensor<NdArray, 1, Bool> = vec![true, false, true].to_bool_tensor(&device);
        let data = mask.to_data();
        assert_eq!(data.as_slice::<bool>().unwrap(), &[true, false, true]);
    }
}
