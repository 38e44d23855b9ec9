//! Converts a parser tree into [`Value`]s.
//!
//! The tree is the generic shape produced by grammar libraries: every node
//! has a tag string, the literal text it matched and ordered children. Tags
//! are composite (`expr|number|regex`), so nodes are classified by
//! substring. The root is tagged `>` and starts and ends with `regex`
//! anchor nodes; delimiter tokens of S-expressions are `char` nodes whose
//! contents is the bracket itself.

use std::num::IntErrorKind;

use crate::Error;
use crate::ast::{FloatType, IntType, Value};

/// Tag of the document root
pub const ROOT_TAG: &str = ">";

/// Tag of the start and end anchors around the root's children
pub const ANCHOR_TAG: &str = "regex";

/// One node of the parser's tree
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub tag: String,
    pub contents: String,
    pub children: Vec<Node>,
}

impl Node {
    pub fn leaf(tag: impl Into<String>, contents: impl Into<String>) -> Self {
        Node {
            tag: tag.into(),
            contents: contents.into(),
            children: Vec::new(),
        }
    }

    pub fn branch(tag: impl Into<String>, children: Vec<Node>) -> Self {
        Node {
            tag: tag.into(),
            contents: String::new(),
            children,
        }
    }

    /// A document root wrapping `children` between its two anchors
    pub fn root(children: Vec<Node>) -> Self {
        let mut all = Vec::with_capacity(children.len() + 2);
        all.push(Node::leaf(ANCHOR_TAG, ""));
        all.extend(children);
        all.push(Node::leaf(ANCHOR_TAG, ""));
        Node::branch(ROOT_TAG, all)
    }

    fn is_anchor(&self) -> bool {
        self.tag == ANCHOR_TAG
    }

    fn is_delimiter(&self) -> bool {
        matches!(self.contents.as_str(), "(" | ")" | "{" | "}")
    }
}

/// Read a whole tree into a value.
///
/// Problems with individual nodes (an out of range integer, an unknown
/// tag) become [`Value::Err`] in place of that node.
pub fn read(node: &Node) -> Value {
    tracing::trace!(tag = %node.tag, contents = %node.contents, "read");

    if node.tag.contains("number") {
        return read_number(&node.contents).unwrap_or_else(Value::Err);
    }
    if node.tag.contains("symbol") {
        return Value::Sym(node.contents.clone());
    }

    // The root is read as a list of everything between the anchors
    if node.tag == ROOT_TAG {
        return Value::List(
            node.children
                .iter()
                .filter(|child| !child.is_anchor())
                .map(read)
                .collect(),
        );
    }

    if node.tag.contains("sexpr") {
        return Value::List(
            node.children
                .iter()
                .filter(|child| !child.is_delimiter() && !child.is_anchor())
                .map(read)
                .collect(),
        );
    }

    Value::Err(Error::UnknownNode(node.tag.clone()))
}

/// Integer unless the literal contains a `.`
///
/// The whole literal must parse. A lone `.` or `1.2.3` is an
/// `InvalidNumber` error, never a prefix read as `0.0` or `1.2`.
fn read_number(text: &str) -> Result<Value, Error> {
    if text.contains('.') {
        let x: FloatType = text
            .parse()
            .map_err(|_| Error::InvalidNumber(text.to_owned()))?;
        tracing::debug!(text, x, "float parsed");
        return Ok(Value::Float(x));
    }

    match text.parse::<IntType>() {
        Ok(n) => Ok(Value::Int(n)),
        Err(err) => match err.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                Err(Error::NumberOutOfRange(text.to_owned()))
            }
            _ => Err(Error::InvalidNumber(text.to_owned())),
        },
    }
}
