//! Built-in operations registry.
//!
//! Every primitive of the language is one variant of [`Builtin`]. The
//! [`BUILTIN_OPS`] table maps each variant to the name it is bound to in the
//! global environment and to its [`Arity`], which is validated before the
//! implementation runs.
//!
//! ```text
//! (car '(1 2 3))          ; 1
//! (join '(1) '(2 3))      ; (1 2 3)
//! (let 'x 5)              ; () and x is now bound in the current scope
//! (max 1 2.5 2)           ; 2.500000
//! ```
//!
//! ## Calling convention
//!
//! Builtins receive the current environment and the *evaluated* argument
//! list, with the function itself already removed:
//!
//! ```text
//! (car (quote (+ 1 2)))  ->  car receives ((+ 1 2))  ->  returns +
//! (list (1 2) 3)         ->  list receives ((1 2) 3)
//! ```
//!
//! This is why one-argument functions such as `car` reach through an extra
//! layer of list. `if` is the one exception: the evaluator hands it the
//! unevaluated branches so that only the chosen one runs.
//!
//! ## Error Handling
//!
//! - **Arity**: checked against the table before dispatch (`WrongArgCount`)
//! - **Types**: each builtin checks its own arguments (`WrongArgType`)
//! - **Arithmetic**: division or modulo by zero and integer overflow are errors
//!
//! Errors are returned, never panicked; the evaluator turns them into
//! [`Value::Err`].
//!
//! ## Adding New Operations
//!
//! 1. Add a variant to [`Builtin`]
//! 2. Add a row to [`BUILTIN_OPS`] with its name and arity
//! 3. Dispatch it in [`Builtin::apply`]
//! 4. Add tests covering edge cases and error conditions

pub(crate) mod numeric;

use crate::Error;
use crate::ast::{Closure, IntType, Value};
use crate::evaluator::{Environment, eval_value};
use numeric::{ArithOp, CmpOp};
use std::str::FromStr;

/// Arity specification for builtin operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arity {
    /// Exactly N arguments
    Exact(usize),
    /// At least N arguments
    AtLeast(usize),
    /// Between min and max arguments, inclusive
    Range(usize, usize),
    /// Any number of arguments
    Any,
}

impl Arity {
    /// Check an argument count, reporting the violation against `func`
    pub(crate) fn validate(self, func: &'static str, arg_count: usize) -> Result<(), Error> {
        let ok = match self {
            Arity::Exact(n) => arg_count == n,
            Arity::AtLeast(n) => arg_count >= n,
            Arity::Range(min, max) => (min..=max).contains(&arg_count),
            Arity::Any => true,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::arg_count(func, arg_count, self))
        }
    }
}

/// Identity of a primitive operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    // List operations
    Car,
    Cdr,
    List,
    Eval,
    Join,
    Length,
    // Functions
    Lambda,
    // Control flow and logic
    If,
    Not,
    And,
    Or,
    // Environment
    Let,
    Set,
    Env,
    Exit,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Max,
    Min,
    // Comparison
    Eq,
    Ge,
    Le,
    Gt,
    Lt,
}

/// Definition of a built-in operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuiltinOp {
    /// The name the operation is bound to in the global environment
    pub id: &'static str,
    pub builtin: Builtin,
    /// Expected number of arguments
    pub arity: Arity,
}

const fn op(id: &'static str, builtin: Builtin, arity: Arity) -> BuiltinOp {
    BuiltinOp { id, builtin, arity }
}

/// Global registry of all built-in operations, in registration order
pub static BUILTIN_OPS: &[BuiltinOp] = &[
    // List operations
    op("car", Builtin::Car, Arity::AtLeast(1)), // extra arguments are discarded
    op("cdr", Builtin::Cdr, Arity::AtLeast(1)),
    op("list", Builtin::List, Arity::Any),
    op("eval", Builtin::Eval, Arity::Exact(1)),
    op("join", Builtin::Join, Arity::AtLeast(1)),
    op("length", Builtin::Length, Arity::Exact(1)),
    op("lambda", Builtin::Lambda, Arity::Exact(2)),
    // Control flow and logic
    op("if", Builtin::If, Arity::Exact(3)),
    op("not", Builtin::Not, Arity::Exact(1)),
    op("and", Builtin::And, Arity::Any),
    op("or", Builtin::Or, Arity::Any),
    // Environment
    op("let", Builtin::Let, Arity::AtLeast(2)),
    op("set", Builtin::Set, Arity::AtLeast(2)),
    op("env", Builtin::Env, Arity::Any),
    op("exit", Builtin::Exit, Arity::Range(0, 1)),
    // Arithmetic
    op("+", Builtin::Add, Arity::AtLeast(1)),
    op("-", Builtin::Sub, Arity::AtLeast(1)),
    op("*", Builtin::Mul, Arity::AtLeast(1)),
    op("/", Builtin::Div, Arity::AtLeast(1)),
    op("%", Builtin::Mod, Arity::AtLeast(1)),
    op("^", Builtin::Pow, Arity::AtLeast(1)),
    op("max", Builtin::Max, Arity::AtLeast(1)),
    op("min", Builtin::Min, Arity::AtLeast(1)),
    // Comparison
    op("=", Builtin::Eq, Arity::Exact(2)),
    op(">=", Builtin::Ge, Arity::Exact(2)),
    op("<=", Builtin::Le, Arity::Exact(2)),
    op(">", Builtin::Gt, Arity::Exact(2)),
    op("<", Builtin::Lt, Arity::Exact(2)),
];

/// Find a builtin operation by the name it is bound to
pub fn find_builtin_op(id: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_OPS.iter().find(|op| op.id == id)
}

impl FromStr for Builtin {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        find_builtin_op(name)
            .map(|op| op.builtin)
            .ok_or_else(|| Error::UnknownOperator(name.to_owned()))
    }
}

impl Builtin {
    /// The registry row of this builtin
    pub fn op(self) -> &'static BuiltinOp {
        // Rows are in variant order; `registry_is_complete` checks it.
        &BUILTIN_OPS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.op().id
    }

    /// Validate arity, then run the builtin on already-evaluated arguments.
    pub(crate) fn apply(self, env: &mut Environment, args: Vec<Value>) -> Result<Value, Error> {
        let op = self.op();
        op.arity.validate(op.id, args.len())?;

        match self {
            Builtin::Car => builtin_car(args),
            Builtin::Cdr => builtin_cdr(args),
            Builtin::List => Ok(Value::List(args)),
            Builtin::Eval => builtin_eval(env, args),
            Builtin::Join => builtin_join(args),
            Builtin::Length => builtin_length(args),
            Builtin::Lambda => builtin_lambda(args),
            Builtin::If => builtin_if(args),
            Builtin::Not => builtin_not(args),
            Builtin::And => Ok(builtin_and(args)),
            Builtin::Or => Ok(builtin_or(args)),
            Builtin::Let => builtin_bind(env, args, Scope::Local),
            Builtin::Set => builtin_bind(env, args, Scope::Global),
            Builtin::Env => Ok(builtin_env(env)),
            Builtin::Exit => builtin_exit(args),
            Builtin::Add => numeric::fold(ArithOp::Add, args),
            Builtin::Sub => numeric::fold(ArithOp::Sub, args),
            Builtin::Mul => numeric::fold(ArithOp::Mul, args),
            Builtin::Div => numeric::fold(ArithOp::Div, args),
            Builtin::Mod => numeric::fold(ArithOp::Mod, args),
            Builtin::Pow => numeric::fold(ArithOp::Pow, args),
            Builtin::Max => numeric::fold(ArithOp::Max, args),
            Builtin::Min => numeric::fold(ArithOp::Min, args),
            Builtin::Eq => numeric::compare(CmpOp::Eq, args),
            Builtin::Ge => numeric::compare(CmpOp::Ge, args),
            Builtin::Le => numeric::compare(CmpOp::Le, args),
            Builtin::Gt => numeric::compare(CmpOp::Gt, args),
            Builtin::Lt => numeric::compare(CmpOp::Lt, args),
        }
    }
}

//
// Builtin Function Implementations
//

/// First argument as a non-empty list; anything after it is dropped
fn first_list(func: &'static str, args: Vec<Value>) -> Result<Vec<Value>, Error> {
    match Value::List(args).take(0)? {
        list if list.is_nil() => Err(Error::EmptyList(func)),
        Value::List(elements) => Ok(elements),
        other => Err(Error::arg_type(func, &other, "S-Expression")),
    }
}

fn builtin_car(args: Vec<Value>) -> Result<Value, Error> {
    Value::List(first_list("car", args)?).take(0)
}

fn builtin_cdr(args: Vec<Value>) -> Result<Value, Error> {
    let mut list = Value::List(first_list("cdr", args)?);
    list.pop(0)?;
    Ok(list)
}

fn builtin_eval(env: &mut Environment, args: Vec<Value>) -> Result<Value, Error> {
    let expr = Value::List(args).take(0)?;
    eval_value(expr, env)
}

fn builtin_join(args: Vec<Value>) -> Result<Value, Error> {
    let mut args = args.into_iter();
    let head = match args.next() {
        Some(head @ Value::List(_)) => head,
        Some(other) => return Err(Error::arg_type("join", &other, "S-Expression")),
        None => return Err(Error::arg_count("join", 0, Arity::AtLeast(1))),
    };
    Ok(args.fold(head, Value::join))
}

fn builtin_length(args: Vec<Value>) -> Result<Value, Error> {
    match Value::List(args).take(0)? {
        Value::List(elements) => IntType::try_from(elements.len())
            .map(Value::Int)
            .map_err(|_| Error::IntegerOverflow("length")),
        other => Err(Error::arg_type("length", &other, "S-Expression")),
    }
}

fn builtin_lambda(args: Vec<Value>) -> Result<Value, Error> {
    let mut args = Value::List(args);
    let formals = match args.pop(0)? {
        Value::List(formals) => formals,
        other => return Err(Error::arg_type("lambda", &other, "S-Expression")),
    };
    let body = args.take(0)?;

    let formals = formals
        .into_iter()
        .map(|formal| match formal {
            Value::Sym(name) => Ok(name),
            other => Err(Error::arg_type("lambda", &other, "Symbol")),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Value::Function(Box::new(Closure::new(formals, body))))
}

/// `if` on already-evaluated branches just selects one.
///
/// The evaluator normally intercepts `if` before its arguments are
/// evaluated; see `evaluator::eval_if`.
fn builtin_if(args: Vec<Value>) -> Result<Value, Error> {
    let mut args = Value::List(args);
    let condition = args.pop(0)?;
    args.take(if condition.is_truthy() { 0 } else { 1 })
}

fn builtin_not(args: Vec<Value>) -> Result<Value, Error> {
    let value = Value::List(args).take(0)?;
    Ok(Value::Bool(!value.is_truthy()))
}

/// First falsy argument, else the last one; `T` when there are none
fn builtin_and(args: Vec<Value>) -> Value {
    let mut last = Value::Bool(true);
    for arg in args {
        if !arg.is_truthy() {
            return arg;
        }
        last = arg;
    }
    last
}

/// First truthy argument, else the last one; `F` when there are none
fn builtin_or(args: Vec<Value>) -> Value {
    let mut last = Value::Bool(false);
    for arg in args {
        if arg.is_truthy() {
            return arg;
        }
        last = arg;
    }
    last
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Scope {
    Local,
    Global,
}

/// `let` and `set`: either `(let 'name value)` or `(let '(a b ...) va vb ...)`
fn builtin_bind(env: &mut Environment, args: Vec<Value>, scope: Scope) -> Result<Value, Error> {
    let func = match scope {
        Scope::Local => "let",
        Scope::Global => "set",
    };

    let mut values = args.into_iter();
    let names = match values.next() {
        Some(Value::Sym(name)) => vec![name],
        Some(Value::List(symbols)) => symbols
            .into_iter()
            .map(|symbol| match symbol {
                Value::Sym(name) => Ok(name),
                other => Err(Error::arg_type(func, &other, "Symbol")),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => return Err(Error::arg_type(func, &other, "Symbol")),
        None => return Err(Error::arg_count(func, 0, Arity::AtLeast(2))),
    };

    let values: Vec<Value> = values.collect();
    if names.len() != values.len() {
        return Err(Error::arg_count(
            func,
            values.len() + 1,
            Arity::Exact(names.len() + 1),
        ));
    }

    for (name, value) in names.into_iter().zip(values) {
        match scope {
            Scope::Local => env.bind_local(name, value),
            Scope::Global => env.bind_global(name, value),
        }
    }
    Ok(Value::List(vec![]))
}

/// Debug dump of every visible binding; not part of the evaluation contract
fn builtin_env(env: &Environment) -> Value {
    for (name, value) in env.get_all_bindings() {
        println!("{name} = {value}");
    }
    Value::List(vec![])
}

fn builtin_exit(args: Vec<Value>) -> Result<Value, Error> {
    let code = match args.as_slice() {
        [] => 0,
        [Value::Int(code)] => i32::try_from(*code).map_err(|_| Error::IntegerOverflow("exit"))?,
        [other] => return Err(Error::arg_type("exit", other, "Integer")),
        _ => {
            let op = Builtin::Exit.op();
            return Err(Error::arg_count(op.id, args.len(), op.arity));
        }
    };
    tracing::info!(code, "exit requested");
    std::process::exit(code)
}
