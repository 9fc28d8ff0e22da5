/// Floating point comparisons against the master's fractional values.
///
/// `epsilon` guards single values, `sum_epsilon` guards sums of many values
/// where rounding error accumulates. Near-ties always compare as "not
/// violated".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub epsilon: f64,
    pub sum_epsilon: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance {
            epsilon: 1e-9,
            sum_epsilon: 1e-6,
        }
    }
}

impl Tolerance {
    pub fn new(epsilon: f64, sum_epsilon: f64) -> Self {
        Tolerance {
            epsilon,
            sum_epsilon,
        }
    }

    pub fn is_positive(&self, value: f64) -> bool {
        value > self.epsilon
    }

    pub fn is_integral(&self, value: f64) -> bool {
        (value - value.round()).abs() <= self.epsilon
    }

    pub fn is_gt(&self, lhs: f64, rhs: f64) -> bool {
        lhs - rhs > self.epsilon
    }

    pub fn is_sum_le(&self, lhs: f64, rhs: f64) -> bool {
        lhs - rhs <= self.sum_epsilon
    }

    pub fn is_sum_gt(&self, lhs: f64, rhs: f64) -> bool {
        !self.is_sum_le(lhs, rhs)
    }
}
