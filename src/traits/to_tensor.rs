use burn::{
    prelude::*,
    tensor::{backend::Backend, BasicOps, Element, TensorData},
};

/// Conversion of host-side batches into tensors.
///
/// Implemented for `Vec<T>` so a batch of states (or scalars) moves to the
/// device in one call; fixed-size-array state types get rank-2 batching for
/// free through the impl below.
pub trait ToTensor<B: Backend, const D: usize, K: BasicOps<B>> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, D, K>;
}

impl<B, E, K> ToTensor<B, 1, K> for Vec<E>
where
    B: Backend,
    E: Element,
    K: BasicOps<B, Elem = E>,
{
    #[inline]
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 1, K> {
        let len = self.len();
        Tensor::from_data(TensorData::new(self, [len]), device)
    }
}

impl<B, E, K, const A: usize> ToTensor<B, 2, K> for Vec<[E; A]>
where
    B: Backend,
    E: Element,
    K: BasicOps<B, Elem = E>,
{
    #[inline]
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 2, K> {
        let batch_size = self.len();
        let mut flat = Vec::with_capacity(batch_size * A);
        for array in self.iter() {
            flat.extend_from_slice(array);
        }
        Tensor::from_data(TensorData::new(flat, [batch_size, A]), device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::{NdArray, NdArrayDevice};

    #[test]
    fn test_vec_f32_to_tensor_1d() {
        let device = NdArrayDevice::default();
        let data = vec![1.0_f32, 2.0, 3.0, 4.0];
        let tensor: Tensor<NdArray, 1> = data.to_tensor(&device);

        assert_eq!(tensor.shape().dims, [4]);
        let tensor_data = tensor.to_data();
        assert_eq!(tensor_data.as_slice::<f32>().unwrap(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_vec_array_to_tensor_2d() {
        let device = NdArrayDevice::default();

        let states = vec![
            [1.0_f32, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
        ];
        let tensor: Tensor<NdArray, 2> = states.to_tensor(&device);

        assert_eq!(tensor.shape().dims, [3, 4]);
        let tensor_data = tensor.to_data();
        let expected = [
            1.0, 2.0, 3.0, 4.0, //
            5.0, 6.0, 7.0, 8.0, //
            9.0, 10.0, 11.0, 12.0,
        ];
        assert_eq!(tensor_data.as_slice::<f32>().unwrap(), &expected);
    }

    #[test]
    fn test_single_state_batches_to_one_row() {
        let device = NdArrayDevice::default();

        let states = vec![[1.0_f32, 2.0, 3.0]];
        let tensor: Tensor<NdArray, 2> = states.to_tensor(&device);

        assert_eq!(tensor.shape().dims, [1, 3]);
    }
}
