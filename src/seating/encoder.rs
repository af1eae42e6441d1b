//! Translation of seating rules into a CP constraint set.

use super::model::{dominance_threshold, SeatingModel};
use crate::cp::{Constraint, CpModel, IntVar, Literal};
use crate::error::Result;
use tracing::debug;

/// An encoded seating problem.
///
/// This is the only shape the solver adapter depends on: a CP model and
/// the names of the person variables in ascending person order.
#[derive(Debug, Clone)]
pub struct SeatingConstraints {
    pub model: CpModel,
    /// `person_vars[i]` is the variable holding person `i`'s table.
    pub person_vars: Vec<String>,
    /// Number of tables; valid values are `0..table_count`.
    pub table_count: usize,
}

/// Strategy turning a [`SeatingModel`] into [`SeatingConstraints`].
///
/// Implement this to substitute an alternate encoding; see
/// [`SeatingPlanner::with_encoder`](super::SeatingPlanner::with_encoder).
pub trait ConstraintEncoder {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Builds the full conjunctive constraint set.
    fn encode(&self, model: &SeatingModel) -> Result<SeatingConstraints>;
}

/// Built-in encoder selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EncoderKind {
    /// One integer table variable per person ([`IntegerEncoder`]).
    #[default]
    Integer,
}

impl EncoderKind {
    /// Instantiates the selected encoder.
    pub fn build(self) -> Box<dyn ConstraintEncoder> {
        match self {
            EncoderKind::Integer => Box::new(IntegerEncoder),
        }
    }
}

/// Default encoding: variable `p{i}` ranges over table indices.
///
/// Clause families are public so alternate encoders can reuse a subset.
/// Every counting clause goes through [`CpModel::count`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerEncoder;

impl IntegerEncoder {
    /// Variable name for person `p`.
    pub fn person_var(p: usize) -> String {
        format!("p{p}")
    }

    fn vars(people: &[usize]) -> Vec<String> {
        people.iter().map(|&p| Self::person_var(p)).collect()
    }

    fn all_vars(model: &SeatingModel) -> Vec<String> {
        (0..model.person_count()).map(Self::person_var).collect()
    }

    /// A count bound: anything above the number of persons is equivalent
    /// to the number of persons.
    fn count_bound(limit: usize, model: &SeatingModel) -> i64 {
        i64::try_from(limit.min(model.person_count())).unwrap_or(i64::MAX)
    }

    /// A CP model with one variable per person over `[0, M-1]` and no
    /// constraints yet.
    pub fn declare(&self, model: &SeatingModel) -> SeatingConstraints {
        let last_table = model.table_count() as i64 - 1;
        let mut cp = CpModel::new("seating");
        let person_vars = Self::all_vars(model);
        for name in &person_vars {
            cp.add_int_var(IntVar::new(name.clone(), 0, last_table));
        }
        SeatingConstraints {
            model: cp,
            person_vars,
            table_count: model.table_count(),
        }
    }

    /// Each person variable lies in `[0, M-1]`.
    pub fn domain_clauses(&self, model: &SeatingModel) -> Vec<Constraint> {
        let last_table = model.table_count() as i64 - 1;
        Self::all_vars(model)
            .into_iter()
            .map(|var| Constraint::Between {
                var,
                min: 0,
                max: last_table,
            })
            .collect()
    }

    /// Per table: persons seated there <= capacity.
    pub fn capacity_clauses(&self, model: &SeatingModel) -> Vec<Constraint> {
        let everyone = Self::all_vars(model);
        model
            .tables
            .iter()
            .enumerate()
            .map(|(t, &capacity)| {
                CpModel::count(everyone.clone(), t as i64).at_most(Self::count_bound(capacity, model))
            })
            .collect()
    }

    /// Couples share a table.
    pub fn couple_clauses(&self, model: &SeatingModel) -> Vec<Constraint> {
        model
            .couples
            .iter()
            .map(|pair| Constraint::Equal {
                var1: Self::person_var(pair.first),
                var2: Self::person_var(pair.second),
            })
            .collect()
    }

    /// Enemies sit apart.
    pub fn enemy_clauses(&self, model: &SeatingModel) -> Vec<Constraint> {
        model
            .enemies
            .iter()
            .map(|pair| Constraint::NotEqual {
                var1: Self::person_var(pair.first),
                var2: Self::person_var(pair.second),
            })
            .collect()
    }

    /// Friend cohesion.
    ///
    /// Several friends: wherever `p` sits, at least one friend sits too.
    /// A single friend is bound to `p` exactly like a couple partner.
    pub fn friend_clauses(&self, model: &SeatingModel) -> Vec<Constraint> {
        let mut out = Vec::new();
        for (p, friends) in model.friends.iter().enumerate() {
            match friends.as_slice() {
                [] => {}
                [friend] => out.push(Constraint::Equal {
                    var1: Self::person_var(p),
                    var2: Self::person_var(*friend),
                }),
                many => {
                    let friend_vars = Self::vars(many);
                    for t in 0..model.table_count() as i64 {
                        out.push(Constraint::Implies {
                            condition: Literal::new(Self::person_var(p), t),
                            then: Box::new(CpModel::count(friend_vars.clone(), t).at_least(1)),
                        });
                    }
                }
            }
        }
        out
    }

    /// Group dominance: per (table, group) with the group larger than the
    /// table's threshold, at most `threshold` members sit there.
    pub fn dominance_clauses(&self, model: &SeatingModel) -> Vec<Constraint> {
        let mut out = Vec::new();
        for (t, &capacity) in model.tables.iter().enumerate() {
            let threshold = dominance_threshold(capacity);
            for members in model.groups.values() {
                if members.len() > threshold {
                    out.push(
                        CpModel::count(Self::vars(members), t as i64)
                            .at_most(Self::count_bound(threshold, model)),
                    );
                }
            }
        }
        out
    }
}

impl ConstraintEncoder for IntegerEncoder {
    fn name(&self) -> &str {
        "integer"
    }

    fn encode(&self, model: &SeatingModel) -> Result<SeatingConstraints> {
        let mut encoded = self.declare(model);
        let families = [
            ("domain", self.domain_clauses(model)),
            ("capacity", self.capacity_clauses(model)),
            ("couple", self.couple_clauses(model)),
            ("enemy", self.enemy_clauses(model)),
            ("friend", self.friend_clauses(model)),
            ("dominance", self.dominance_clauses(model)),
        ];
        for (family, clauses) in families {
            debug!(event = "encode", family = family, clauses = clauses.len());
            encoded.model.extend_constraints(clauses);
        }
        Ok(encoded)
    }
}
