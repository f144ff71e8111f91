//! Field paths and simple comparison predicates.
//!
//! Supports expressions of the form: "path OP literal" where
//! OP ∈ {==, !=, <, <=, >, >=}. `path` is a dotted field path (`user.age`,
//! `tags.0`) or `it` for the item itself. The literal is parsed as JSON when
//! possible and taken as a bare string otherwise.

use std::cmp::Ordering;
use std::fmt;

use seqfuse_core::prelude::{Error, Result, Value};

/// Dotted path into records and lists. Empty = the item itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(src: &str) -> Result<Self> {
        let src = src.trim();
        if src.is_empty() {
            return Err(Error::Expr("empty field path".into()));
        }
        if src == "it" || src == "." {
            return Ok(Self { segments: vec![] });
        }

        let mut segments = Vec::new();
        for seg in src.split('.') {
            let seg = seg.trim();
            if seg.is_empty() {
                return Err(Error::Expr(format!("empty segment in field path '{}'", src)));
            }
            segments.push(seg.to_string());
        }
        Ok(Self { segments })
    }

    pub fn is_identity(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn resolve<'a>(&self, item: &'a Value) -> Option<&'a Value> {
        item.get_path(self.segments.iter().map(String::as_str))
    }

    /// Resolved value, or `Null` when any segment is missing.
    pub fn extract(&self, item: &Value) -> Value {
        self.resolve(item).cloned().unwrap_or(Value::Null)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            f.write_str("it")
        } else {
            f.write_str(&self.segments.join("."))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

// Two-char operators first so "<=" is not read as "<".
const OPS: [(&str, CmpOp); 6] = [
    ("==", CmpOp::Eq),
    ("!=", CmpOp::Ne),
    ("<=", CmpOp::Le),
    (">=", CmpOp::Ge),
    ("<", CmpOp::Lt),
    (">", CmpOp::Gt),
];

/// Parsed `path OP literal` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub path: FieldPath,
    pub op: CmpOp,
    pub literal: Value,
}

impl Comparison {
    /// Parse a predicate like "age > 18" or "name == Alice".
    pub fn parse(expr: &str) -> Result<Self> {
        let (pos, sym, op) = find_operator(expr)
            .ok_or_else(|| Error::Expr(format!("unparseable predicate: {}", expr)))?;

        let path = FieldPath::parse(&expr[..pos])
            .map_err(|e| Error::Expr(format!("{} (in '{}')", e, expr)))?;
        let raw = expr[pos + sym.len()..].trim();
        if raw.is_empty() {
            return Err(Error::Expr(format!("missing literal in predicate: {}", expr)));
        }

        Ok(Self {
            path,
            op,
            literal: parse_literal(raw),
        })
    }

    /// Evaluate against an item. Missing fields resolve to `Null`; ordering
    /// comparisons against incomparable values are false.
    pub fn matches(&self, item: &Value) -> bool {
        let lhs = self.path.resolve(item).unwrap_or(&Value::Null);
        let ord = compare_loose(lhs, &self.literal);
        match self.op {
            CmpOp::Eq => ord == Some(Ordering::Equal),
            CmpOp::Ne => ord != Some(Ordering::Equal),
            CmpOp::Lt => ord == Some(Ordering::Less),
            CmpOp::Le => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
            CmpOp::Gt => ord == Some(Ordering::Greater),
            CmpOp::Ge => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.path, self.op.symbol(), self.literal)
    }
}

fn find_operator(expr: &str) -> Option<(usize, &'static str, CmpOp)> {
    let bytes = expr.as_bytes();
    for pos in 0..bytes.len() {
        for (sym, op) in OPS {
            if bytes[pos..].starts_with(sym.as_bytes()) {
                return Some((pos, sym, op));
            }
        }
    }
    None
}

fn parse_literal(raw: &str) -> Value {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(raw) {
        return Value::from(json);
    }
    let unquoted = raw
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(raw);
    Value::from(unquoted)
}

/// Ordering that treats `Int` and `Float` as one numeric domain. Values of
/// different kinds are incomparable (`None`), except `Null == Null`.
pub fn compare_loose(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            a.as_f64()?.partial_cmp(&b.as_f64()?)
        }
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        (Value::List(_), Value::List(_)) | (Value::Record(_), Value::Record(_)) => {
            Some(a.cmp(b))
        }
        _ => None,
    }
}
