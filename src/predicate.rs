/// Comparisons driven by operator tokens such as `"<="` or `"not-in"`.
///
/// Tokens are resolved to a closed set of operators first. Any token outside
/// that set makes the comparison evaluate to `false`.
use std::str::FromStr;

/// Integer comparison operators: `<`, `>`, `==`, `>=`, `<=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntOp {
    Lt,
    Gt,
    Eq,
    Ge,
    Le,
}

impl IntOp {
    /// Resolve an operator token, `None` if it is not recognized.
    pub fn parse(token: &str) -> Option<IntOp> {
        match token {
            "<" => Some(IntOp::Lt),
            ">" => Some(IntOp::Gt),
            "==" => Some(IntOp::Eq),
            ">=" => Some(IntOp::Ge),
            "<=" => Some(IntOp::Le),
            _ => None,
        }
    }

    pub fn eval(self, left: i64, right: i64) -> bool {
        match self {
            IntOp::Lt => left < right,
            IntOp::Gt => left > right,
            IntOp::Eq => left == right,
            IntOp::Ge => left >= right,
            IntOp::Le => left <= right,
        }
    }
}

/// String comparison operators: `==`, `!=`, `in`, `not-in`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrOp {
    Eq,
    Ne,
    /// The operand occurs somewhere in the source string.
    In,
    /// The operand does not occur in the source string.
    NotIn,
}

impl StrOp {
    /// Resolve an operator token, `None` if it is not recognized.
    pub fn parse(token: &str) -> Option<StrOp> {
        match token {
            "==" => Some(StrOp::Eq),
            "!=" => Some(StrOp::Ne),
            "in" => Some(StrOp::In),
            "not-in" => Some(StrOp::NotIn),
            _ => None,
        }
    }

    pub fn eval(self, src: &str, operand: &str) -> bool {
        match self {
            StrOp::Eq => src == operand,
            StrOp::Ne => src != operand,
            StrOp::In => src.contains(operand),
            StrOp::NotIn => !src.contains(operand),
        }
    }
}

/// Returned by `FromStr` for a token outside the operator set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperator(pub String);

impl std::fmt::Display for UnknownOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown comparison operator: {:?}", self.0)
    }
}

impl std::error::Error for UnknownOperator {}

impl FromStr for IntOp {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IntOp::parse(s).ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

impl FromStr for StrOp {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrOp::parse(s).ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

/// Operand value that stands for the empty string.
pub const NULL_OPERAND: &str = "null";

/// Compare two integers with an operator token. Unknown tokens yield `false`.
pub fn int_cond_assert(left: i64, right: i64, op: &str) -> bool {
    match IntOp::parse(op) {
        Some(op) => op.eval(left, right),
        None => false,
    }
}

/// Compare `src` against `operand` with an operator token.
///
/// An operand of `"null"` is compared as the empty string. Unknown tokens
/// yield `false`.
pub fn string_cond_assert(src: &str, operand: &str, op: &str) -> bool {
    let operand = if operand == NULL_OPERAND { "" } else { operand };
    match StrOp::parse(op) {
        Some(op) => op.eval(src, operand),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_operators() {
        assert!(int_cond_assert(1, 2, "<"));
        assert!(!int_cond_assert(2, 2, "<"));
        assert!(int_cond_assert(3, 2, ">"));
        assert!(int_cond_assert(2, 2, "=="));
        assert!(!int_cond_assert(2, 3, "=="));
        assert!(int_cond_assert(2, 2, ">="));
        assert!(int_cond_assert(3, 2, ">="));
        assert!(!int_cond_assert(1, 2, ">="));
        assert!(int_cond_assert(2, 2, "<="));
        assert!(!int_cond_assert(3, 2, "<="));
    }

    #[test]
    fn test_int_unknown_operator_is_false() {
        for op in ["!=", "=", "", "lt", "<>", " <", "in"] {
            assert!(!int_cond_assert(1, 2, op), "op {op:?}");
            assert!(!int_cond_assert(2, 2, op), "op {op:?}");
            assert!(!int_cond_assert(3, 2, op), "op {op:?}");
        }
    }

    #[test]
    fn test_string_operators() {
        assert!(string_cond_assert("abc", "abc", "=="));
        assert!(!string_cond_assert("abc", "abd", "=="));
        assert!(string_cond_assert("abc", "abd", "!="));
        assert!(string_cond_assert("hello world", "lo w", "in"));
        assert!(!string_cond_assert("hello world", "xyz", "in"));
        assert!(string_cond_assert("hello world", "xyz", "not-in"));
        assert!(!string_cond_assert("hello world", "world", "not-in"));
    }

    #[test]
    fn test_string_unknown_operator_is_false() {
        for op in ["=", "<", "IN", "notin", "", "contains"] {
            assert!(!string_cond_assert("abc", "abc", op), "op {op:?}");
            assert!(!string_cond_assert("abc", "b", op), "op {op:?}");
        }
    }

    #[test]
    fn test_null_operand_is_empty_string() {
        for op in ["==", "!=", "in", "not-in", "bogus"] {
            for src in ["", "abc"] {
                assert_eq!(
                    string_cond_assert(src, "null", op),
                    string_cond_assert(src, "", op),
                    "src {src:?} op {op:?}"
                );
            }
        }
        assert!(string_cond_assert("", "null", "=="));
        // Every string contains the empty string
        assert!(string_cond_assert("abc", "null", "in"));
        assert!(!string_cond_assert("abc", "null", "not-in"));
    }

    #[test]
    fn test_null_only_applies_to_operand() {
        assert!(!string_cond_assert("null", "", "=="));
    }

    #[test]
    fn test_from_str() {
        assert_eq!(">=".parse::<IntOp>().unwrap(), IntOp::Ge);
        assert_eq!("not-in".parse::<StrOp>().unwrap(), StrOp::NotIn);
        let err = "=>".parse::<IntOp>().unwrap_err();
        assert_eq!(err, UnknownOperator("=>".to_string()));
    }
}
