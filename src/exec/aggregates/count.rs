//! COUNT accumulator.

use super::Accumulator;
use super::live::LiveValues;
use crate::error::PlanStreamError;
use crate::value::Value;

#[derive(Debug, Default)]
pub struct Count {
    live: LiveValues,
}

impl Accumulator for Count {
    fn incorporate(&mut self, value: &Value) -> Result<(), PlanStreamError> {
        self.live.insert(value);
        Ok(())
    }

    fn check_undo(&self, value: &Value) -> Result<(), PlanStreamError> {
        if self.live.multiplicity(value) == 0 {
            return Err(PlanStreamError::InconsistentRetraction(format!(
                "count never saw value {value}"
            )));
        }
        Ok(())
    }

    fn undo(&mut self, value: &Value) -> Result<(), PlanStreamError> {
        self.check_undo(value)?;
        self.live.remove(value);
        Ok(())
    }

    /// Zero for an empty group, never an error.
    fn current(&self) -> Result<Value, PlanStreamError> {
        Ok(Value::Int(self.live.len() as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_ignores_value_content() {
        let mut c = Count::default();
        c.incorporate(&Value::from("a")).unwrap();
        c.incorporate(&Value::Bool(false)).unwrap();
        assert_eq!(c.current().unwrap(), Value::Int(2));
    }

    #[test]
    fn test_empty_count_is_zero() {
        assert_eq!(Count::default().current().unwrap(), Value::Int(0));
    }

    #[test]
    fn test_undo_below_zero_is_inconsistent() {
        let mut c = Count::default();
        let err = c.undo(&Value::Int(1)).unwrap_err();
        assert!(matches!(err, PlanStreamError::InconsistentRetraction(_)));
    }

    #[test]
    fn test_undo_of_value_never_counted_is_inconsistent() {
        let mut c = Count::default();
        c.incorporate(&Value::Int(5)).unwrap();
        c.incorporate(&Value::Int(5)).unwrap();
        let err = c.undo(&Value::Int(7)).unwrap_err();
        assert!(matches!(err, PlanStreamError::InconsistentRetraction(_)));
        assert_eq!(c.current().unwrap(), Value::Int(2));
        c.undo(&Value::Int(5)).unwrap();
        assert_eq!(c.current().unwrap(), Value::Int(1));
    }
}
