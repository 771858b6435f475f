use std::cmp::Ordering;

use super::error::{RecordError, RecordResult};
use super::record::Record;
use super::value::Value;

/// Operators available in scan conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
    Not,
    Equal,
    Smaller,
}

impl Operator {
    fn arity(self) -> usize {
        match self {
            Operator::Not => 1,
            _ => 2,
        }
    }
}

/// Predicate over a single record
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(Value),
    /// Attribute by position in the schema
    Attr(usize),
    Op(Operator, Vec<Expr>),
}

impl Expr {
    pub fn attr(idx: usize) -> Self {
        Expr::Attr(idx)
    }

    pub fn constant(value: Value) -> Self {
        Expr::Const(value)
    }

    pub fn equal(left: Expr, right: Expr) -> Self {
        Expr::Op(Operator::Equal, vec![left, right])
    }

    pub fn smaller(left: Expr, right: Expr) -> Self {
        Expr::Op(Operator::Smaller, vec![left, right])
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::Op(Operator::And, vec![left, right])
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Op(Operator::Or, vec![left, right])
    }

    pub fn not(inner: Expr) -> Self {
        Expr::Op(Operator::Not, vec![inner])
    }

    /// Evaluate against `record`
    pub fn eval(&self, record: &Record) -> RecordResult<Value> {
        match self {
            Expr::Const(v) => Ok(v.clone()),
            Expr::Attr(idx) => record.get_attr(*idx).cloned(),
            Expr::Op(op, args) => {
                if args.len() != op.arity() {
                    return Err(RecordError::SchemaMismatch(format!(
                        "{:?} takes {} operands, got {}",
                        op,
                        op.arity(),
                        args.len()
                    )));
                }
                let values = args
                    .iter()
                    .map(|a| a.eval(record))
                    .collect::<RecordResult<Vec<_>>>()?;
                apply(*op, &values)
            }
        }
    }

    /// Evaluate and require a boolean result
    pub fn matches(&self, record: &Record) -> RecordResult<bool> {
        self.eval(record)?
            .as_bool()
            .ok_or(RecordError::ExprNotBoolean)
    }
}

fn apply(op: Operator, values: &[Value]) -> RecordResult<Value> {
    match op {
        Operator::Not => {
            let v = values[0].as_bool().ok_or(RecordError::BooleanArgNotBoolean)?;
            Ok(Value::Bool(!v))
        }
        Operator::And | Operator::Or => {
            let l = values[0].as_bool().ok_or(RecordError::BooleanArgNotBoolean)?;
            let r = values[1].as_bool().ok_or(RecordError::BooleanArgNotBoolean)?;
            Ok(Value::Bool(if op == Operator::And { l && r } else { l || r }))
        }
        Operator::Equal | Operator::Smaller => {
            let (l, r) = (&values[0], &values[1]);
            let ordering = match l.compare(r) {
                Some(o) => o,
                // Same type but unordered: NaN floats
                None if l.type_name() == r.type_name() => return Ok(Value::Bool(false)),
                None => {
                    return Err(RecordError::CompareDifferentTypes(
                        l.type_name(),
                        r.type_name(),
                    ));
                }
            };
            let result = match op {
                Operator::Equal => ordering == Ordering::Equal,
                _ => ordering == Ordering::Less,
            };
            Ok(Value::Bool(result))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record::new(vec![
            Value::Int(3),
            Value::String("cc".to_string()),
            Value::Bool(true),
        ])
    }

    #[test]
    fn test_equal_and_smaller() {
        let r = sample();
        let eq = Expr::equal(Expr::attr(0), Expr::constant(Value::Int(3)));
        assert!(eq.matches(&r).unwrap());

        let lt = Expr::smaller(Expr::attr(1), Expr::constant(Value::String("cd".into())));
        assert!(lt.matches(&r).unwrap());

        let not_lt = Expr::smaller(Expr::constant(Value::Int(5)), Expr::attr(0));
        assert!(!not_lt.matches(&r).unwrap());
    }

    #[test]
    fn test_boolean_operators() {
        let r = sample();
        let t = Expr::attr(2);
        let f = Expr::not(Expr::attr(2));
        assert!(!f.matches(&r).unwrap());
        assert!(!Expr::and(t.clone(), f.clone()).matches(&r).unwrap());
        assert!(Expr::or(t, f).matches(&r).unwrap());
    }

    #[test]
    fn test_type_errors() {
        let r = sample();
        let mixed = Expr::equal(Expr::attr(0), Expr::attr(1));
        assert!(matches!(
            mixed.matches(&r),
            Err(RecordError::CompareDifferentTypes("INT", "STRING"))
        ));

        let not_int = Expr::not(Expr::attr(0));
        assert!(matches!(
            not_int.matches(&r),
            Err(RecordError::BooleanArgNotBoolean)
        ));

        let int_result = Expr::attr(0);
        assert!(matches!(
            int_result.matches(&r),
            Err(RecordError::ExprNotBoolean)
        ));
    }

    #[test]
    fn test_bad_arity_and_attr() {
        let r = sample();
        let bad = Expr::Op(Operator::Equal, vec![Expr::attr(0)]);
        assert!(bad.eval(&r).is_err());
        assert!(matches!(
            Expr::attr(9).eval(&r),
            Err(RecordError::InvalidAttribute(9))
        ));
    }
}
