//! This module defines the runtime value model of the interpreter. The main enum,
//! [`Value`], covers numbers, first-class errors, symbols, booleans, S-expression
//! lists and functions (builtins and user-defined closures). Values have plain
//! value semantics: cloning is a structural deep copy, so a value moved into a
//! binding is never aliased by the expression it came from. The list operations
//! (`append`, `join`, `pop`, `take`) are the primitives the builtins are written
//! with. Ergonomic helpers such as [`val`], [`sym`] and [`nil`] build values in
//! tests.

use crate::Error;
use crate::builtinops::Builtin;
use crate::evaluator::Environment;

/// Type alias for exact integers in the interpreter
pub type IntType = i64;

/// Type alias for floating point numbers in the interpreter
pub type FloatType = f64;

/// The symbol that separates fixed formals from the rest-argument formal
pub(crate) const VARARGS_MARKER: &str = "&";

/// Core runtime datum
///
/// A `List` is both literal data and unevaluated program syntax; the
/// evaluator decides which by context.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Exact integers
    Int(IntType),
    /// Floating point numbers
    Float(FloatType),
    /// First-class runtime errors, propagated as ordinary values
    Err(Error),
    /// Identifiers, resolved through the environment when evaluated
    Sym(String),
    /// Booleans (produced by comparisons and `not`)
    Bool(bool),
    /// S-expressions; the empty list is nil
    List(Vec<Value>),
    /// A primitive implemented natively. Copying shares the dispatch target.
    Builtin(Builtin),
    /// A user-defined function
    Function(Box<Closure>),
}

/// A user-defined function with its own private environment.
///
/// `formals` shrinks as arguments are bound, so a partially applied closure
/// is simply a closure with fewer formals left and some bindings already in
/// `env`.
#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub formals: Vec<String>,
    pub body: Value,
    pub env: Environment,
}

impl Closure {
    pub(crate) fn new(formals: Vec<String>, body: Value) -> Self {
        Closure {
            formals,
            body,
            env: Environment::new(),
        }
    }
}

// From trait implementations for Value - enables .into() conversion
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<FloatType> for Value {
    fn from(x: FloatType) -> Self {
        Value::Float(x)
    }
}

impl From<Error> for Value {
    fn from(err: Error) -> Self {
        Value::Err(err)
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Int(n as IntType)
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(IntType); // Special case - no casting
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(|x| x.into()).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::List(arr.into_iter().map(|x| x.into()).collect())
    }
}

/// Helper function for creating symbols
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Sym(name.as_ref().to_owned())
}

/// Helper function for creating Values from anything convertible
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper function for creating empty lists (nil)
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn nil() -> Value {
    Value::List(vec![])
}

impl Value {
    /// Human-readable name of the variant, used in type errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Err(_) => "Error",
            Value::Sym(_) => "Symbol",
            Value::Bool(_) => "Boolean",
            Value::List(_) => "S-Expression",
            Value::Builtin(_) | Value::Function(_) => "Function",
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Check if a value represents nil (empty list)
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::List(list) if list.is_empty())
    }

    /// Truthiness used by `if`, `and`, `or` and `not`.
    ///
    /// Numbers are false iff zero, symbols iff their name is empty, lists
    /// iff empty. Functions and errors are always true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Bool(b) => *b,
            Value::Sym(name) => !name.is_empty(),
            Value::List(elements) => !elements.is_empty(),
            Value::Err(_) | Value::Builtin(_) | Value::Function(_) => true,
        }
    }

    /// The elements of a list; any other value counts as a one-element list
    pub(crate) fn into_elements(self) -> Vec<Value> {
        match self {
            Value::List(elements) => elements,
            other => vec![other],
        }
    }

    /// Append `v` as the new last element. The list grows by exactly one.
    pub fn append(self, v: Value) -> Value {
        let mut elements = self.into_elements();
        elements.push(v);
        Value::List(elements)
    }

    /// Splice the elements of `other` onto the end of this list.
    ///
    /// A non-list `other` is appended as a single element instead.
    pub fn join(self, other: Value) -> Value {
        match other {
            Value::List(tail) => {
                let mut elements = self.into_elements();
                elements.extend(tail);
                Value::List(elements)
            }
            single => self.append(single),
        }
    }

    /// Remove and return the element at `index`, shifting later elements down.
    pub fn pop(&mut self, index: usize) -> Result<Value, Error> {
        match self {
            Value::List(elements) if index < elements.len() => Ok(elements.remove(index)),
            Value::List(elements) => Err(Error::IndexOutOfRange {
                index,
                len: elements.len(),
            }),
            other => Err(Error::WrongArgType {
                func: "pop",
                got: other.type_name(),
                expected: "S-Expression",
            }),
        }
    }

    /// Extract the element at `index` and drop the rest of the list.
    pub fn take(mut self, index: usize) -> Result<Value, Error> {
        self.pop(index)
    }
}

fn write_list(f: &mut std::fmt::Formatter<'_>, elements: &[Value]) -> std::fmt::Result {
    write!(f, "(")?;
    for (i, elem) in elements.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{elem}")?;
    }
    write!(f, ")")
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x:.6}"),
            Value::Err(err) => write!(f, "Runtime Error: {err}"),
            Value::Sym(name) => write!(f, "{name}"),
            Value::Bool(b) => write!(f, "{}", if *b { "T" } else { "F" }),
            Value::List(elements) => write_list(f, elements),
            Value::Builtin(builtin) => write!(f, "<builtin function {}>", builtin.name()),
            Value::Function(closure) => {
                write!(f, "(lambda (")?;
                for (i, formal) in closure.formals.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{formal}")?;
                }
                write!(f, ") {})", closure.body)
            }
        }
    }
}
