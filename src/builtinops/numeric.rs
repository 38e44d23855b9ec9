//! Arithmetic and comparison on the two numeric kinds.
//!
//! Every operator works on a pair of numbers. `Int op Int` stays exact;
//! as soon as either side is a `Float` the other is promoted and the result
//! is a `Float`. Variadic arithmetic is a left fold of the pairwise operator
//! over the argument list.

use super::Arity;
use crate::Error;
use crate::ast::{FloatType, IntType, Value};

/// Pairwise arithmetic operators behind `+ - * / % ^ max min`
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Max,
    Min,
}

impl ArithOp {
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => "%",
            ArithOp::Pow => "^",
            ArithOp::Max => "max",
            ArithOp::Min => "min",
        }
    }

    fn overflow(self) -> Error {
        Error::IntegerOverflow(match self {
            ArithOp::Add => "addition",
            ArithOp::Sub => "subtraction",
            ArithOp::Mul => "multiplication",
            ArithOp::Div => "division",
            ArithOp::Mod => "modulo",
            ArithOp::Pow => "exponentiation",
            ArithOp::Max => "max",
            ArithOp::Min => "min",
        })
    }

    fn apply_int(self, x: IntType, y: IntType) -> Result<IntType, Error> {
        let result = match self {
            ArithOp::Add => x.checked_add(y),
            ArithOp::Sub => x.checked_sub(y),
            ArithOp::Mul => x.checked_mul(y),
            ArithOp::Div | ArithOp::Mod if y == 0 => return Err(Error::DivisionByZero),
            ArithOp::Div => x.checked_div(y),
            ArithOp::Mod => x.checked_rem(y),
            ArithOp::Pow => match u32::try_from(y) {
                Ok(exp) => x.checked_pow(exp),
                // Negative exponents truncate toward zero like a cast of the real result
                Err(_) if y < 0 => Some((x as FloatType).powf(y as FloatType) as IntType),
                Err(_) => None,
            },
            ArithOp::Max => Some(x.max(y)),
            ArithOp::Min => Some(x.min(y)),
        };
        result.ok_or_else(|| self.overflow())
    }

    fn apply_float(self, x: FloatType, y: FloatType) -> Result<FloatType, Error> {
        Ok(match self {
            ArithOp::Add => x + y,
            ArithOp::Sub => x - y,
            ArithOp::Mul => x * y,
            ArithOp::Div | ArithOp::Mod if y == 0.0 => return Err(Error::DivisionByZero),
            ArithOp::Div => x / y,
            ArithOp::Mod => x % y,
            ArithOp::Pow => x.powf(y),
            ArithOp::Max => x.max(y),
            ArithOp::Min => x.min(y),
        })
    }

    /// Apply the operator to one pair of numbers, promoting Int to Float on mixed operands
    pub(crate) fn apply(self, x: &Value, y: &Value) -> Result<Value, Error> {
        match (x, y) {
            (Value::Int(a), Value::Int(b)) => self.apply_int(*a, *b).map(Value::Int),
            (Value::Int(a), Value::Float(b)) => self.apply_float(*a as FloatType, *b).map(Value::Float),
            (Value::Float(a), Value::Int(b)) => self.apply_float(*a, *b as FloatType).map(Value::Float),
            (Value::Float(a), Value::Float(b)) => self.apply_float(*a, *b).map(Value::Float),
            (Value::Int(_) | Value::Float(_), other) | (other, _) => {
                Err(Error::arg_type(self.symbol(), other, "Number"))
            }
        }
    }
}

/// Left fold of `op` over `args`; a single number is returned unchanged.
pub(crate) fn fold(op: ArithOp, args: Vec<Value>) -> Result<Value, Error> {
    if let Some(bad) = args.iter().find(|arg| !arg.is_number()) {
        return Err(Error::arg_type(op.symbol(), bad, "Number"));
    }

    let mut args = args.into_iter();
    let Some(mut acc) = args.next() else {
        return Err(Error::arg_count(op.symbol(), 0, Arity::AtLeast(1)));
    };
    for y in args {
        acc = op.apply(&acc, &y)?;
    }
    Ok(acc)
}

/// Comparison operators behind `= >= <= > <`
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CmpOp {
    Eq,
    Ge,
    Le,
    Gt,
    Lt,
}

impl CmpOp {
    fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ge => ">=",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Lt => "<",
        }
    }

    fn test<T: PartialOrd>(self, x: T, y: T) -> bool {
        match self {
            CmpOp::Eq => x == y,
            CmpOp::Ge => x >= y,
            CmpOp::Le => x <= y,
            CmpOp::Gt => x > y,
            CmpOp::Lt => x < y,
        }
    }
}

/// Compare exactly two numbers, returning a `Bool`
pub(crate) fn compare(op: CmpOp, args: Vec<Value>) -> Result<Value, Error> {
    let [x, y] = args.as_slice() else {
        return Err(Error::arg_count(op.symbol(), args.len(), Arity::Exact(2)));
    };

    let result = match (x, y) {
        (Value::Int(a), Value::Int(b)) => op.test(a, b),
        (Value::Int(a), Value::Float(b)) => op.test(*a as FloatType, *b),
        (Value::Float(a), Value::Int(b)) => op.test(*a, *b as FloatType),
        (Value::Float(a), Value::Float(b)) => op.test(a, b),
        (Value::Int(_) | Value::Float(_), other) | (other, _) => {
            return Err(Error::arg_type(op.symbol(), other, "Number"));
        }
    };
    Ok(Value::Bool(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{sym, val};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_int_arithmetic() {
        let test_cases = vec![
            (ArithOp::Add, 7, 3, Ok(val(10))),
            (ArithOp::Sub, 7, 3, Ok(val(4))),
            (ArithOp::Mul, 7, 3, Ok(val(21))),
            (ArithOp::Div, 7, 3, Ok(val(2))),
            (ArithOp::Div, -7, 2, Ok(val(-3))),
            (ArithOp::Mod, 7, 3, Ok(val(1))),
            (ArithOp::Mod, -7, 3, Ok(val(-1))),
            (ArithOp::Pow, 2, 10, Ok(val(1024))),
            (ArithOp::Pow, 2, -1, Ok(val(0))),
            (ArithOp::Pow, 1, -3, Ok(val(1))),
            (ArithOp::Max, 7, 3, Ok(val(7))),
            (ArithOp::Min, 7, 3, Ok(val(3))),
            (ArithOp::Div, 1, 0, Err(Error::DivisionByZero)),
            (ArithOp::Mod, 1, 0, Err(Error::DivisionByZero)),
            (ArithOp::Add, IntType::MAX, 1, Err(Error::IntegerOverflow("addition"))),
            (ArithOp::Mul, IntType::MIN, -1, Err(Error::IntegerOverflow("multiplication"))),
            (ArithOp::Div, IntType::MIN, -1, Err(Error::IntegerOverflow("division"))),
            (ArithOp::Pow, 10, 40, Err(Error::IntegerOverflow("exponentiation"))),
        ];

        for (op, x, y, expected) in test_cases {
            assert_eq!(op.apply(&val(x), &val(y)), expected, "{x} {} {y}", op.symbol());
        }
    }

    #[test]
    fn test_promotion() {
        assert_eq!(ArithOp::Add.apply(&val(1), &val(0.5)), Ok(val(1.5)));
        assert_eq!(ArithOp::Sub.apply(&val(0.5), &val(1)), Ok(val(-0.5)));
        assert_eq!(ArithOp::Mul.apply(&val(2.0), &val(2.5)), Ok(val(5.0)));
        assert_eq!(ArithOp::Div.apply(&val(1), &val(4.0)), Ok(val(0.25)));
        assert_eq!(ArithOp::Mod.apply(&val(7.5), &val(2)), Ok(val(1.5)));
        assert_eq!(ArithOp::Pow.apply(&val(2), &val(3.0)), Ok(val(8.0)));
        assert_eq!(ArithOp::Max.apply(&val(3), &val(2.0)), Ok(val(3.0)));
        assert_eq!(ArithOp::Min.apply(&val(3), &val(2.0)), Ok(val(2.0)));
    }

    #[test]
    fn test_division_by_zero_all_kinds() {
        for op in [ArithOp::Div, ArithOp::Mod] {
            for (x, y) in [
                (val(1), val(0)),
                (val(1), val(0.0)),
                (val(1.0), val(0)),
                (val(1.0), val(0.0)),
            ] {
                assert_eq!(op.apply(&x, &y), Err(Error::DivisionByZero), "{x} {} {y}", op.symbol());
            }
        }
    }

    #[test]
    fn test_fold() {
        assert_eq!(fold(ArithOp::Add, vec![val(1), val(2), val(3)]), Ok(val(6)));
        assert_eq!(fold(ArithOp::Sub, vec![val(10), val(1), val(2)]), Ok(val(7)));
        // One argument comes back unchanged, without negation
        assert_eq!(fold(ArithOp::Sub, vec![val(5)]), Ok(val(5)));
        assert_eq!(fold(ArithOp::Add, vec![val(1), val(2), val(0.5)]), Ok(val(3.5)));
        // The first error stops the fold
        assert_eq!(
            fold(ArithOp::Div, vec![val(1), val(0), val(0.5)]),
            Err(Error::DivisionByZero)
        );
        // Every argument is type-checked before any arithmetic happens
        assert_eq!(
            fold(ArithOp::Div, vec![val(1), val(0), sym("x")]),
            Err(Error::WrongArgType {
                func: "/",
                got: "Symbol",
                expected: "Number",
            })
        );
        assert!(matches!(
            fold(ArithOp::Add, vec![]),
            Err(Error::WrongArgCount { func: "+", got: 0, .. })
        ));
    }

    #[test]
    fn test_compare() {
        let test_cases = vec![
            (CmpOp::Eq, val(1), val(1), true),
            (CmpOp::Eq, val(1), val(1.0), true),
            (CmpOp::Eq, val(1.5), val(1), false),
            (CmpOp::Lt, val(1), val(2), true),
            (CmpOp::Lt, val(2.0), val(2), false),
            (CmpOp::Le, val(2.0), val(2), true),
            (CmpOp::Gt, val(3), val(2.5), true),
            (CmpOp::Ge, val(-1), val(0), false),
        ];

        for (op, x, y, expected) in test_cases {
            assert_eq!(
                compare(op, vec![x.clone(), y.clone()]),
                Ok(Value::Bool(expected)),
                "{x} {} {y}",
                op.symbol()
            );
        }

        assert_eq!(
            compare(CmpOp::Eq, vec![sym("a"), sym("a")]),
            Err(Error::WrongArgType {
                func: "=",
                got: "Symbol",
                expected: "Number",
            })
        );
        assert_eq!(
            compare(CmpOp::Lt, vec![val(1), val(true)]),
            Err(Error::WrongArgType {
                func: "<",
                got: "Boolean",
                expected: "Number",
            })
        );
        assert!(matches!(
            compare(CmpOp::Gt, vec![val(1), val(2), val(3)]),
            Err(Error::WrongArgCount { func: ">", got: 3, .. })
        ));
    }
}
