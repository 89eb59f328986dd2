//! Operator overloads that a template may declare at parent level.
//!
//! Operators are dispatched on instantiations, never on instances: given a
//! template `B` with a parent-level [`Operator::Add`], `B[3] + B[4]` calls the
//! overload with both instantiations as operands.
//!
//! Binary operators follow the usual left-then-reflected protocol: the left
//! operand's overload runs first and, if it is missing or declines, the right
//! operand's reflected (`_r`) overload is tried.

use std::fmt;

/// Operator kinds for parent-level overload registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    // === Binary Operators ===
    /// `+` addition
    Add,
    /// `+` addition (reflected - called on right operand)
    AddR,
    /// `-` subtraction
    Sub,
    /// `-` subtraction (reflected)
    SubR,
    /// `*` multiplication
    Mul,
    /// `*` multiplication (reflected)
    MulR,
    /// `/` division
    Div,
    /// `/` division (reflected)
    DivR,
    /// `%` modulo
    Mod,
    /// `%` modulo (reflected)
    ModR,
    /// `&` bitwise AND
    And,
    /// `&` bitwise AND (reflected)
    AndR,
    /// `|` bitwise OR
    Or,
    /// `|` bitwise OR (reflected)
    OrR,
    /// `^` bitwise XOR
    Xor,
    /// `^` bitwise XOR (reflected)
    XorR,

    // === Unary Operators ===
    /// `-` unary negation
    Neg,
}

impl Operator {
    /// Get the overload method name for this operator.
    pub const fn method_name(&self) -> &'static str {
        match self {
            Operator::Add => "opAdd",
            Operator::AddR => "opAdd_r",
            Operator::Sub => "opSub",
            Operator::SubR => "opSub_r",
            Operator::Mul => "opMul",
            Operator::MulR => "opMul_r",
            Operator::Div => "opDiv",
            Operator::DivR => "opDiv_r",
            Operator::Mod => "opMod",
            Operator::ModR => "opMod_r",
            Operator::And => "opAnd",
            Operator::AndR => "opAnd_r",
            Operator::Or => "opOr",
            Operator::OrR => "opOr_r",
            Operator::Xor => "opXor",
            Operator::XorR => "opXor_r",
            Operator::Neg => "opNeg",
        }
    }

    /// Get the source-level symbol, used in error messages.
    pub const fn symbol(&self) -> &'static str {
        match self {
            Operator::Add | Operator::AddR => "+",
            Operator::Sub | Operator::SubR => "-",
            Operator::Mul | Operator::MulR => "*",
            Operator::Div | Operator::DivR => "/",
            Operator::Mod | Operator::ModR => "%",
            Operator::And | Operator::AndR => "&",
            Operator::Or | Operator::OrR => "|",
            Operator::Xor | Operator::XorR => "^",
            Operator::Neg => "-",
        }
    }

    /// Check if this is a unary operator.
    pub const fn is_unary(&self) -> bool {
        matches!(self, Operator::Neg)
    }

    /// Get the reflected counterpart of a forward binary operator.
    pub const fn reflected(&self) -> Option<Operator> {
        match self {
            Operator::Add => Some(Operator::AddR),
            Operator::Sub => Some(Operator::SubR),
            Operator::Mul => Some(Operator::MulR),
            Operator::Div => Some(Operator::DivR),
            Operator::Mod => Some(Operator::ModR),
            Operator::And => Some(Operator::AndR),
            Operator::Or => Some(Operator::OrR),
            Operator::Xor => Some(Operator::XorR),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.method_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names() {
        assert_eq!(Operator::Add.method_name(), "opAdd");
        assert_eq!(Operator::AddR.method_name(), "opAdd_r");
        assert_eq!(Operator::Neg.method_name(), "opNeg");
    }

    #[test]
    fn reflected_pairs() {
        assert_eq!(Operator::Add.reflected(), Some(Operator::AddR));
        assert_eq!(Operator::Xor.reflected(), Some(Operator::XorR));
        assert_eq!(Operator::AddR.reflected(), None);
        assert_eq!(Operator::Neg.reflected(), None);
    }

    #[test]
    fn arity() {
        assert!(Operator::Neg.is_unary());
        assert!(!Operator::Add.is_unary());
        assert!(!Operator::XorR.is_unary());
    }

    #[test]
    fn symbols_shared_by_reflected_variants() {
        assert_eq!(Operator::Sub.symbol(), Operator::SubR.symbol());
        assert_eq!(format!("{}", Operator::Mul), "opMul");
    }
}
