//! SUM accumulator.
//!
//! Integers and floats are summed separately so retraction stays exact:
//! the result is an integer while every live value is an integer, and a
//! float once any live value is a float.

use super::Accumulator;
use super::live::LiveValues;
use crate::error::PlanStreamError;
use crate::value::Value;

#[derive(Debug, Default)]
pub struct Sum {
    int_sum: i64,
    float_sum: f64,
    float_count: u64,
    live: LiveValues,
}

impl Sum {
    /// Number of live values.
    pub fn count(&self) -> u64 {
        self.live.len() as u64
    }

    /// The running total as a float, for averaging.
    pub fn total_f64(&self) -> f64 {
        self.int_sum as f64 + self.float_sum
    }
}

fn not_numeric(op: &str, value: &Value) -> PlanStreamError {
    PlanStreamError::Evaluation(format!(
        "sum cannot {op} {} value {value}",
        value.type_name()
    ))
}

impl Accumulator for Sum {
    fn check_incorporate(&self, value: &Value) -> Result<(), PlanStreamError> {
        match value {
            Value::Int(i) => match self.int_sum.checked_add(*i) {
                Some(_) => Ok(()),
                None => Err(PlanStreamError::Evaluation(format!(
                    "integer overflow adding {i} to sum {}",
                    self.int_sum
                ))),
            },
            Value::Float(_) => Ok(()),
            other => Err(not_numeric("incorporate", other)),
        }
    }

    fn incorporate(&mut self, value: &Value) -> Result<(), PlanStreamError> {
        self.check_incorporate(value)?;
        match value {
            Value::Int(i) => self.int_sum += i,
            Value::Float(f) => {
                self.float_sum += f;
                self.float_count += 1;
            }
            _ => {}
        }
        self.live.insert(value);
        Ok(())
    }

    fn check_undo(&self, value: &Value) -> Result<(), PlanStreamError> {
        if !matches!(value, Value::Int(_) | Value::Float(_)) {
            return Err(not_numeric("undo", value));
        }
        if self.live.multiplicity(value) == 0 {
            return Err(PlanStreamError::InconsistentRetraction(format!(
                "sum never saw value {value}"
            )));
        }
        if let Value::Int(i) = value {
            // The remaining values can sum past the range their prefix sums stayed in.
            if self.int_sum.checked_sub(*i).is_none() {
                return Err(PlanStreamError::Evaluation(format!(
                    "integer overflow retracting {i} from sum {}",
                    self.int_sum
                )));
            }
        }
        Ok(())
    }

    fn undo(&mut self, value: &Value) -> Result<(), PlanStreamError> {
        self.check_undo(value)?;
        self.live.remove(value);
        match value {
            Value::Int(i) => self.int_sum -= i,
            Value::Float(f) => {
                self.float_count -= 1;
                // Reset instead of subtracting down to rounding noise.
                self.float_sum = if self.float_count == 0 {
                    0.0
                } else {
                    self.float_sum - f
                };
            }
            _ => {}
        }
        Ok(())
    }

    fn current(&self) -> Result<Value, PlanStreamError> {
        if self.live.is_empty() {
            return Err(PlanStreamError::EmptyAggregate(
                "sum over no values".into(),
            ));
        }
        if self.float_count == 0 {
            Ok(Value::Int(self.int_sum))
        } else {
            Ok(Value::Float(self.total_f64()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_sum_stays_integer() {
        let mut s = Sum::default();
        s.incorporate(&Value::Int(5)).unwrap();
        s.incorporate(&Value::Int(3)).unwrap();
        s.undo(&Value::Int(5)).unwrap();
        assert_eq!(s.current().unwrap(), Value::Int(3));
    }

    #[test]
    fn test_float_contribution_switches_to_float_and_back() {
        let mut s = Sum::default();
        s.incorporate(&Value::Int(2)).unwrap();
        s.incorporate(&Value::Float(0.5)).unwrap();
        assert_eq!(s.current().unwrap(), Value::Float(2.5));
        s.undo(&Value::Float(0.5)).unwrap();
        assert_eq!(s.current().unwrap(), Value::Int(2));
    }

    #[test]
    fn test_empty_sum_is_empty_aggregate() {
        let mut s = Sum::default();
        assert!(matches!(
            s.current().unwrap_err(),
            PlanStreamError::EmptyAggregate(_)
        ));
        s.incorporate(&Value::Int(1)).unwrap();
        s.undo(&Value::Int(1)).unwrap();
        assert!(s.current().is_err());
    }

    #[test]
    fn test_undo_without_values_is_inconsistent() {
        let mut s = Sum::default();
        assert!(matches!(
            s.undo(&Value::Int(1)).unwrap_err(),
            PlanStreamError::InconsistentRetraction(_)
        ));
        s.incorporate(&Value::Int(1)).unwrap();
        assert!(s.undo(&Value::Float(1.0)).is_err());
    }

    #[test]
    fn test_undo_of_value_never_held_leaves_total_alone() {
        let mut s = Sum::default();
        s.incorporate(&Value::Int(5)).unwrap();
        s.incorporate(&Value::Int(1)).unwrap();
        for stranger in [Value::Int(7), Value::Int(100), Value::Float(5.0)] {
            assert!(matches!(
                s.undo(&stranger).unwrap_err(),
                PlanStreamError::InconsistentRetraction(_)
            ));
        }
        assert_eq!(s.count(), 2);
        assert_eq!(s.current().unwrap(), Value::Int(6));
    }

    #[test]
    fn test_non_numeric_rejected() {
        let mut s = Sum::default();
        assert!(matches!(
            s.incorporate(&Value::from("x")).unwrap_err(),
            PlanStreamError::Evaluation(_)
        ));
        assert!(s.check_undo(&Value::from("x")).is_err());
    }

    #[test]
    fn test_overflow_rejected() {
        let mut s = Sum::default();
        s.incorporate(&Value::Int(i64::MAX)).unwrap();
        assert!(s.check_incorporate(&Value::Int(1)).is_err());
        assert!(s.incorporate(&Value::Int(1)).is_err());
        assert_eq!(s.count(), 1);
        assert_eq!(s.current().unwrap(), Value::Int(i64::MAX));
    }

    #[test]
    fn test_retraction_overflow_is_evaluation_error() {
        let mut s = Sum::default();
        for v in [i64::MIN, i64::MAX, i64::MAX] {
            s.incorporate(&Value::Int(v)).unwrap();
        }
        let err = s.undo(&Value::Int(i64::MIN)).unwrap_err();
        assert!(matches!(err, PlanStreamError::Evaluation(_)));
        assert_eq!(s.current().unwrap(), Value::Int(i64::MAX - 1));
    }
}
