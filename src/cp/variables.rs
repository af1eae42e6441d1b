//! CP variable types.

/// An integer variable with a domain [min, max].
///
/// Represents a decision variable that takes integer values within
/// the specified bounds. Can be fixed to a single value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntVar {
    /// Variable name (unique identifier within a model).
    pub name: String,
    /// Minimum value.
    pub min: i64,
    /// Maximum value.
    pub max: i64,
    /// Fixed value, if any.
    pub fixed: Option<i64>,
}

impl IntVar {
    /// Creates a new integer variable with the given bounds.
    pub fn new(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            fixed: None,
        }
    }

    /// Creates a fixed integer variable.
    pub fn fixed(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            min: value,
            max: value,
            fixed: Some(value),
        }
    }

    /// Whether this variable is fixed to a single value.
    pub fn is_fixed(&self) -> bool {
        self.fixed.is_some()
    }

    /// Domain size (max - min + 1). Zero for an inverted domain.
    pub fn domain_size(&self) -> i64 {
        (self.max - self.min + 1).max(0)
    }

    /// Whether `value` lies in the declared domain.
    pub fn contains(&self, value: i64) -> bool {
        match self.fixed {
            Some(v) => v == value,
            None => self.min <= value && value <= self.max,
        }
    }
}

/// An atomic condition `var == value`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Literal {
    /// Name of the integer variable.
    pub var: String,
    /// Value the variable is compared against.
    pub value: i64,
}

impl Literal {
    pub fn new(var: impl Into<String>, value: i64) -> Self {
        Self {
            var: var.into(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_var() {
        let v = IntVar::new("x", 0, 10);
        assert_eq!(v.domain_size(), 11);
        assert!(!v.is_fixed());
        assert!(v.contains(0));
        assert!(v.contains(10));
        assert!(!v.contains(11));

        let f = IntVar::fixed("y", 5);
        assert!(f.is_fixed());
        assert_eq!(f.domain_size(), 1);
        assert!(f.contains(5));
        assert!(!f.contains(4));
    }

    #[test]
    fn test_inverted_domain_is_empty() {
        let v = IntVar::new("x", 0, -1);
        assert_eq!(v.domain_size(), 0);
        assert!(!v.contains(0));
    }

    #[test]
    fn test_literal() {
        let lit = Literal::new("p3", 2);
        assert_eq!(lit.var, "p3");
        assert_eq!(lit.value, 2);
    }
}
