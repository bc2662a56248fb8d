//! Learning-rate schedules.

use crate::error::RlError;

/// Step decay: the value is multiplied by `factor` once every `interval`
/// episodes.
///
/// The schedule is a pure function of the episode index, so the value for
/// any episode can be queried without mutating state.
#[derive(Debug, Clone, Copy)]
pub struct StepDecay {
    initial: f64,
    factor: f64,
    interval: usize,
}

impl StepDecay {
    pub fn new(initial: f64, factor: f64, interval: usize) -> Result<Self, RlError> {
        if initial <= 0.0 {
            return Err(RlError::config("decay initial value must be positive"));
        }
        if factor <= 0.0 || factor > 1.0 {
            return Err(RlError::config("decay factor must be in (0, 1]"));
        }
        if interval == 0 {
            return Err(RlError::config("decay interval must be positive"));
        }
        Ok(Self {
            initial,
            factor,
            interval,
        })
    }

    /// Value after `episode` completed episodes.
    pub fn at(&self, episode: usize) -> f64 {
        self.initial * self.factor.powi((episode / self.interval) as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_before_first_interval() {
        let decay = StepDecay::new(1e-2, 0.1, 500).unwrap();
        assert_eq!(decay.at(0), 1e-2);
        assert_eq!(decay.at(499), 1e-2);
    }

    #[test]
    fn test_steps_down_at_each_interval() {
        let decay = StepDecay::new(1e-2, 0.1, 500).unwrap();
        assert!((decay.at(500) - 1e-3).abs() < 1e-12);
        assert!((decay.at(999) - 1e-3).abs() < 1e-12);
        assert!((decay.at(1000) - 1e-4).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(StepDecay::new(0.0, 0.1, 500).is_err());
        assert!(StepDecay::new(1e-2, 0.0, 500).is_err());
        assert!(StepDecay::new(1e-2, 1.5, 500).is_err());
        assert!(StepDecay::new(1e-2, 0.1, 0).is_err());
    }
}
