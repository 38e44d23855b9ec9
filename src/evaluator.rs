use crate::Error;
use crate::ast::{Closure, VARARGS_MARKER, Value};
use crate::builtinops::{BUILTIN_OPS, Builtin};
use std::collections::BTreeMap;

/// The symbol that marks an unevaluated (quoted) expression
pub(crate) const QUOTE: &str = "quote";

/// Environment for variable bindings
///
/// Bindings are a small ordered list scanned linearly; scopes are
/// function-call sized so this beats hashing. `parent` is only set on a
/// closure's environment while its body runs (see [`eval`]), and is handed
/// back to the caller afterwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Environment {
    bindings: Vec<(String, Value)>,
    parent: Option<Box<Environment>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            bindings: Vec::new(),
            parent: None,
        }
    }

    /// Look `name` up here, then along the parent chain.
    ///
    /// The caller gets its own copy of the stored value.
    pub fn get(&self, name: &str) -> Result<Value, Error> {
        match self.bindings.iter().find(|(key, _)| key == name) {
            Some((_, value)) => Ok(value.clone()),
            None => match &self.parent {
                Some(parent) => parent.get(name),
                None => Err(Error::UnboundSymbol(name.to_owned())),
            },
        }
    }

    /// Bind in this scope only, replacing an existing binding of the same name (`let`)
    pub fn bind_local(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.bindings.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = value,
            None => self.bindings.push((name, value)),
        }
    }

    /// Bind in the root of the parent chain (`set`)
    pub fn bind_global(&mut self, name: impl Into<String>, value: Value) {
        match self.parent.as_deref_mut() {
            Some(parent) => parent.bind_global(name, value),
            None => self.bind_local(name, value),
        }
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    /// Get all bindings in this environment and its parents
    /// Returns a Vec of (name, value) pairs sorted by name
    pub fn get_all_bindings(&self) -> Vec<(String, Value)> {
        let mut bindings = BTreeMap::new();

        // Start with parent bindings (so they can be overridden by local bindings)
        if let Some(parent) = &self.parent {
            bindings.extend(parent.get_all_bindings());
        }
        for (name, value) in &self.bindings {
            bindings.insert(name.clone(), value.clone());
        }

        bindings.into_iter().collect()
    }
}

/// Evaluate a value (public API)
///
/// Failures come back as [`Value::Err`]; evaluation itself never fails.
pub fn eval(expr: Value, env: &mut Environment) -> Value {
    eval_value(expr, env).unwrap_or_else(Value::Err)
}

/// Evaluate with errors on the `Err` side, so callers can use `?`
pub(crate) fn eval_value(expr: Value, env: &mut Environment) -> Result<Value, Error> {
    match expr {
        // Variable lookup
        Value::Sym(name) => env.get(&name),

        // Function application or special forms
        Value::List(elements) => eval_sexpr(elements, env),

        // An error already in the tree is the result
        Value::Err(err) => Err(err),

        // Self-evaluating forms
        other => Ok(other),
    }
}

/// Evaluate an S-expression.
///
/// `quote` is recognised by its literal head symbol and `if` by its head
/// evaluating to the `if` builtin; both receive their arguments
/// unevaluated. Everything else is evaluated left to right, stopping at
/// the first error.
fn eval_sexpr(elements: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let mut elements = elements.into_iter();

    let Some(head) = elements.next() else {
        // () is nil
        return Ok(Value::List(vec![]));
    };

    if let Value::Sym(name) = &head
        && name == QUOTE
    {
        return eval_quote(elements.collect());
    }

    let head = eval_element(head, env)?;
    if matches!(head, Value::Builtin(Builtin::If)) && !elements.as_slice().is_empty() {
        return eval_if(elements.collect(), env);
    }

    let mut args = Vec::with_capacity(elements.len());
    for element in elements {
        args.push(eval_element(element, env)?);
    }

    if args.is_empty() {
        // A single element is just grouping
        return Ok(head);
    }

    apply(head, args, env)
}

/// Evaluate one element of a list; an error value ends the whole list
fn eval_element(expr: Value, env: &mut Environment) -> Result<Value, Error> {
    match eval_value(expr, env)? {
        Value::Err(err) => Err(err),
        value => Ok(value),
    }
}

/// Evaluate quote special form
fn eval_quote(args: Vec<Value>) -> Result<Value, Error> {
    match <[Value; 1]>::try_from(args) {
        Ok([quoted]) => Ok(quoted),
        Err(args) => Err(Error::WrongArgCount {
            func: QUOTE,
            got: args.len(),
            expected: crate::builtinops::Arity::Exact(1),
        }),
    }
}

/// Evaluate if special form: the condition, then exactly one branch
fn eval_if(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let op = Builtin::If.op();
    op.arity.validate(op.id, args.len())?;

    let mut args = Value::List(args);
    let condition = eval_element(args.pop(0)?, env)?;
    let branch = args.take(if condition.is_truthy() { 0 } else { 1 })?;
    eval_value(branch, env)
}

/// Apply a function value to evaluated arguments
pub(crate) fn apply(func: Value, args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    match func {
        Value::Builtin(builtin) => builtin.apply(env, args),
        Value::Function(closure) => call_closure(*closure, args, env),
        other => Err(Error::NotAFunction(other.type_name())),
    }
}

/// After a `&` marker exactly one formal must remain: the rest parameter
fn rest_formal(formals: &mut Vec<String>) -> Result<String, Error> {
    match formals.as_slice() {
        [_] => Ok(formals.remove(0)),
        _ => Err(Error::MalformedVarargs),
    }
}

/// Bind arguments to formals left to right.
///
/// Once every formal is bound the body runs with the caller's environment
/// as parent for this one invocation. With formals left over the partially
/// bound closure itself is the result.
fn call_closure(
    mut closure: Closure,
    args: Vec<Value>,
    env: &mut Environment,
) -> Result<Value, Error> {
    let given = args.len();
    let expected = closure.formals.len();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if closure.formals.is_empty() {
            return Err(Error::TooManyArguments {
                got: given,
                expected,
            });
        }

        let formal = closure.formals.remove(0);
        if formal == VARARGS_MARKER {
            let rest = rest_formal(&mut closure.formals)?;
            let collected = std::iter::once(arg).chain(args.by_ref()).collect();
            closure.env.bind_local(rest, Value::List(collected));
            break;
        }
        closure.env.bind_local(formal, arg);
    }

    // No arguments left for a trailing `& rest`
    if closure.formals.first().is_some_and(|formal| formal == VARARGS_MARKER) {
        closure.formals.remove(0);
        let rest = rest_formal(&mut closure.formals)?;
        closure.env.bind_local(rest, Value::List(vec![]));
    }

    if !closure.formals.is_empty() {
        tracing::debug!(
            bound = given,
            remaining = closure.formals.len(),
            "partial application"
        );
        return Ok(Value::Function(Box::new(closure)));
    }

    let Closure {
        body, env: mut local, ..
    } = closure;
    tracing::trace!(args = given, "applying closure");
    local.parent = Some(Box::new(std::mem::take(env)));
    let result = eval_value(body, &mut local);
    if let Some(caller) = local.parent.take() {
        *env = *caller;
    }
    result
}

/// Create a global environment with built-in functions
pub fn create_global_env() -> Environment {
    let mut env = Environment::new();
    for op in BUILTIN_OPS {
        env.bind_global(op.id, Value::Builtin(op.builtin));
    }
    env
}

#[cfg(test)]
mod environment_tests {
    use super::*;
    use crate::ast::val;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_get_missing_symbol() {
        let env = Environment::new();
        assert_eq!(env.get("nope"), Err(Error::UnboundSymbol("nope".into())));
    }

    #[test]
    fn test_bind_local_replaces() {
        let mut env = Environment::new();
        env.bind_local("x", val(1));
        env.bind_local("y", val(2));
        env.bind_local("x", val(3));
        assert_eq!(env.get("x"), Ok(val(3)));
        assert_eq!(
            env.get_all_bindings(),
            vec![("x".to_owned(), val(3)), ("y".to_owned(), val(2))]
        );
    }

    #[test]
    fn test_parent_chain() {
        let mut root = Environment::new();
        root.bind_local("x", val(1));
        root.bind_local("shadowed", val(1));

        let mut child = Environment::new();
        child.bind_local("shadowed", val(2));
        child.parent = Some(Box::new(root));

        assert!(child.has_parent());
        assert_eq!(child.get("x"), Ok(val(1)));
        assert_eq!(child.get("shadowed"), Ok(val(2)));

        // Global bindings land at the root, local ones stay here
        child.bind_global("g", val(10));
        child.bind_local("l", val(20));
        let root = child.parent.take().map(|root| *root).unwrap_or_default();
        assert_eq!(root.get("g"), Ok(val(10)));
        assert_eq!(root.get("l"), Err(Error::UnboundSymbol("l".into())));
        assert_eq!(child.get("l"), Ok(val(20)));
    }

    #[test]
    fn test_lookup_returns_copy() {
        let mut env = Environment::new();
        env.bind_local("xs", val([1, 2]));
        let mut copy = env.get("xs").unwrap_or_else(Value::Err);
        assert_eq!(copy.pop(0), Ok(val(1)));
        assert_eq!(env.get("xs"), Ok(val([1, 2])));
    }

    #[test]
    fn test_global_env_has_builtins() {
        let env = create_global_env();
        for op in BUILTIN_OPS {
            assert_eq!(env.get(op.id), Ok(Value::Builtin(op.builtin)));
        }
        assert!(!env.has_parent());
    }
}
