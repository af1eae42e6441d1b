//! CP model definition.

use super::variables::{IntVar, Literal};
use std::collections::{HashMap, HashSet};

/// Relation between a count and its bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Comparison {
    /// `count <= bound`
    AtMost,
    /// `count >= bound`
    AtLeast,
    /// `count == bound`
    Exactly,
}

impl Comparison {
    /// Applies the comparison to a concrete count.
    pub fn holds(self, count: i64, bound: i64) -> bool {
        match self {
            Comparison::AtMost => count <= bound,
            Comparison::AtLeast => count >= bound,
            Comparison::Exactly => count == bound,
        }
    }
}

/// A constraint in the CP model.
///
/// Finite-domain constraints over integer variables. Every counting
/// rule is expressed through [`Constraint::Count`], a sum of indicator
/// terms `[var == value]` compared against a bound.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Constraint {
    /// Domain restriction: `min <= var <= max`.
    Between { var: String, min: i64, max: i64 },

    /// Indicator-sum constraint.
    ///
    /// `sum(var == value for var in vars) <cmp> bound`.
    Count {
        /// Names of the counted variables.
        vars: Vec<String>,
        /// Value each indicator tests for.
        value: i64,
        /// How the count relates to `bound`.
        cmp: Comparison,
        /// Right-hand side.
        bound: i64,
    },

    /// Two variables take the same value.
    Equal { var1: String, var2: String },

    /// Two variables take different values.
    NotEqual { var1: String, var2: String },

    /// Reified implication: if `condition` holds then `then` must hold.
    Implies {
        condition: Literal,
        then: Box<Constraint>,
    },
}

impl Constraint {
    /// Names of all variables this constraint mentions, in order of appearance.
    pub fn variables(&self) -> Vec<&str> {
        match self {
            Constraint::Between { var, .. } => vec![var.as_str()],
            Constraint::Count { vars, .. } => vars.iter().map(String::as_str).collect(),
            Constraint::Equal { var1, var2 } | Constraint::NotEqual { var1, var2 } => {
                vec![var1.as_str(), var2.as_str()]
            }
            Constraint::Implies { condition, then } => {
                let mut names = vec![condition.var.as_str()];
                names.extend(then.variables());
                names
            }
        }
    }

    /// Evaluates the constraint under a complete assignment.
    ///
    /// A variable missing from `values` makes the constraint false.
    pub fn evaluate(&self, values: &HashMap<String, i64>) -> bool {
        match self {
            Constraint::Between { var, min, max } => values
                .get(var)
                .is_some_and(|v| *min <= *v && *v <= *max),
            Constraint::Count {
                vars,
                value,
                cmp,
                bound,
            } => {
                let mut count = 0i64;
                for name in vars {
                    match values.get(name) {
                        Some(v) if v == value => count += 1,
                        Some(_) => {}
                        None => return false,
                    }
                }
                cmp.holds(count, *bound)
            }
            Constraint::Equal { var1, var2 } => match (values.get(var1), values.get(var2)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            Constraint::NotEqual { var1, var2 } => match (values.get(var1), values.get(var2)) {
                (Some(a), Some(b)) => a != b,
                _ => false,
            },
            Constraint::Implies { condition, then } => match values.get(&condition.var) {
                Some(v) if *v == condition.value => then.evaluate(values),
                Some(_) => true,
                None => false,
            },
        }
    }
}

/// A count of variables taking a given value, awaiting its bound.
///
/// Built with [`CpModel::count`]; turns into a [`Constraint::Count`].
#[derive(Debug, Clone)]
pub struct CountExpr {
    vars: Vec<String>,
    value: i64,
}

impl CountExpr {
    pub fn new(vars: Vec<String>, value: i64) -> Self {
        Self { vars, value }
    }

    /// `count <= bound`
    pub fn at_most(self, bound: i64) -> Constraint {
        self.compare(Comparison::AtMost, bound)
    }

    /// `count >= bound`
    pub fn at_least(self, bound: i64) -> Constraint {
        self.compare(Comparison::AtLeast, bound)
    }

    /// `count == bound`
    pub fn exactly(self, bound: i64) -> Constraint {
        self.compare(Comparison::Exactly, bound)
    }

    fn compare(self, cmp: Comparison, bound: i64) -> Constraint {
        Constraint::Count {
            vars: self.vars,
            value: self.value,
            cmp,
            bound,
        }
    }
}

/// A constraint programming model.
///
/// Contains integer variables (in declaration order) and a conjunction
/// of constraints.
///
/// # Examples
///
/// ```
/// use u_seating::cp::{CpModel, IntVar};
///
/// let mut model = CpModel::new("example");
/// model.add_int_var(IntVar::new("a", 0, 1));
/// model.add_int_var(IntVar::new("b", 0, 1));
/// let at_most_one = CpModel::count(["a", "b"], 0).at_most(1);
/// model.add_constraint(at_most_one);
/// assert!(model.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CpModel {
    /// Model name.
    pub name: String,
    /// Integer variables, in declaration order.
    pub int_vars: Vec<IntVar>,
    /// Constraints (implicitly conjoined).
    pub constraints: Vec<Constraint>,
    index: HashMap<String, usize>,
}

impl CpModel {
    /// Creates a new empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds an integer variable. Re-adding a name replaces its bounds.
    pub fn add_int_var(&mut self, var: IntVar) {
        match self.index.get(&var.name) {
            Some(&i) => self.int_vars[i] = var,
            None => {
                self.index.insert(var.name.clone(), self.int_vars.len());
                self.int_vars.push(var);
            }
        }
    }

    /// Adds a constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Adds every constraint from an iterator.
    pub fn extend_constraints(&mut self, constraints: impl IntoIterator<Item = Constraint>) {
        self.constraints.extend(constraints);
    }

    /// Starts a count of `vars` equal to `value`.
    pub fn count<I, S>(vars: I, value: i64) -> CountExpr
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CountExpr::new(vars.into_iter().map(Into::into).collect(), value)
    }

    /// Looks up a variable by name.
    pub fn int_var(&self, name: &str) -> Option<&IntVar> {
        self.index.get(name).map(|&i| &self.int_vars[i])
    }

    /// Position of a variable in declaration order.
    pub fn var_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Validates the model for consistency.
    ///
    /// Checks that all referenced variable names exist and that no
    /// variable has an empty declared domain.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for var in &self.int_vars {
            if !seen.insert(var.name.as_str()) {
                return Err(format!("duplicate variable: {}", var.name));
            }
            if var.domain_size() == 0 {
                return Err(format!(
                    "empty domain for {}: [{}, {}]",
                    var.name, var.min, var.max
                ));
            }
        }
        for constraint in &self.constraints {
            for name in constraint.variables() {
                if !self.index.contains_key(name) {
                    return Err(format!("undefined variable: {name}"));
                }
            }
        }
        Ok(())
    }

    /// Whether `values` satisfies every declared domain and constraint.
    pub fn is_satisfied_by(&self, values: &HashMap<String, i64>) -> bool {
        self.int_vars
            .iter()
            .all(|v| values.get(&v.name).is_some_and(|&x| v.contains(x)))
            && self.constraints.iter().all(|c| c.evaluate(values))
    }

    /// Constraints violated by `values`.
    pub fn violated<'a>(&'a self, values: &HashMap<String, i64>) -> Vec<&'a Constraint> {
        self.constraints
            .iter()
            .filter(|c| !c.evaluate(values))
            .collect()
    }

    /// Returns the number of integer variables.
    pub fn var_count(&self) -> usize {
        self.int_vars.len()
    }

    /// Returns the number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}
