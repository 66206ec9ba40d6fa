//! Scheduling the learning rate of BC updates.
use serde::{Deserialize, Serialize};

/// Learning rate as a function of the training step of the RL trainer.
///
/// Closures `Fn(usize) -> f64` implement this trait.
pub trait LrSchedule {
    /// Learning rate at `step`.
    fn value(&self, step: usize) -> f64;
}

impl<F> LrSchedule for F
where
    F: Fn(usize) -> f64,
{
    fn value(&self, step: usize) -> f64 {
        self(step)
    }
}

/// Linear interpolation from `initial` to `final_value` over `steps` steps.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct LinearSchedule {
    /// Value at step 0.
    pub initial: f64,

    /// Value after `steps` steps.
    pub final_value: f64,

    /// Steps when the value reaches `final_value`.
    pub steps: usize,
}

impl LinearSchedule {
    /// Creates a schedule.
    pub fn new(initial: f64, final_value: f64, steps: usize) -> Self {
        Self {
            initial,
            final_value,
            steps,
        }
    }
}

impl LrSchedule for LinearSchedule {
    fn value(&self, step: usize) -> f64 {
        if step >= self.steps {
            self.final_value
        } else {
            let d = self.final_value - self.initial;
            self.initial + d * (step as f64 / self.steps as f64)
        }
    }
}
