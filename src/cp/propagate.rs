//! Finite domains and constraint propagation.
//!
//! A [`CpModel`] is compiled into an index-based form where every
//! variable owns a bitmap [`Domain`]. [`Problem::propagate_all`] prunes
//! domains to a fixpoint using a watch-list queue, or reports a
//! conflict when some domain becomes empty.

use super::model::{Comparison, Constraint, CpModel};
use std::collections::VecDeque;

/// Widest domain a variable may declare.
pub const MAX_DOMAIN_WIDTH: i64 = 1 << 16;

/// A set of candidate values `min + i` for each set bit `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Domain {
    min: i64,
    bits: Vec<bool>,
    size: usize,
}

impl Domain {
    pub(crate) fn range(min: i64, max: i64) -> Self {
        let width = (max - min + 1).max(0) as usize;
        Self {
            min,
            bits: vec![true; width],
            size: width,
        }
    }

    fn slot(&self, value: i64) -> Option<usize> {
        let offset = value.checked_sub(self.min)?;
        if offset < 0 || offset as usize >= self.bits.len() {
            None
        } else {
            Some(offset as usize)
        }
    }

    pub(crate) fn contains(&self, value: i64) -> bool {
        self.slot(value).is_some_and(|i| self.bits[i])
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub(crate) fn fixed_value(&self) -> Option<i64> {
        if self.size == 1 {
            self.values().next()
        } else {
            None
        }
    }

    pub(crate) fn is_fixed_to(&self, value: i64) -> bool {
        self.size == 1 && self.contains(value)
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = i64> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter(|&(_, &set)| set)
            .map(move |(i, _)| self.min + i as i64)
    }

    /// Removes `value`. Returns whether the domain changed.
    pub(crate) fn remove(&mut self, value: i64) -> bool {
        match self.slot(value) {
            Some(i) if self.bits[i] => {
                self.bits[i] = false;
                self.size -= 1;
                true
            }
            _ => false,
        }
    }

    /// Reduces the domain to `{value}` (or empty if absent).
    pub(crate) fn fix(&mut self, value: i64) -> bool {
        if self.is_fixed_to(value) {
            return false;
        }
        let keep = self.contains(value);
        self.bits.iter_mut().for_each(|b| *b = false);
        self.size = 0;
        if keep {
            if let Some(i) = self.slot(value) {
                self.bits[i] = true;
                self.size = 1;
            }
        }
        true
    }

    /// Keeps only values in `[lo, hi]`.
    pub(crate) fn retain_range(&mut self, lo: i64, hi: i64) -> bool {
        let mut changed = false;
        for i in 0..self.bits.len() {
            let v = self.min + i as i64;
            if self.bits[i] && (v < lo || v > hi) {
                self.bits[i] = false;
                self.size -= 1;
                changed = true;
            }
        }
        changed
    }

    /// Keeps only values also present in `other`.
    pub(crate) fn intersect(&mut self, other: &Domain) -> bool {
        let mut changed = false;
        for i in 0..self.bits.len() {
            if self.bits[i] && !other.contains(self.min + i as i64) {
                self.bits[i] = false;
                self.size -= 1;
                changed = true;
            }
        }
        changed
    }

    pub(crate) fn disjoint(&self, other: &Domain) -> bool {
        self.values().all(|v| !other.contains(v))
    }
}

/// Index-based constraint.
#[derive(Debug, Clone)]
pub(crate) enum Prop {
    Between {
        var: usize,
        min: i64,
        max: i64,
    },
    Count {
        vars: Vec<usize>,
        value: i64,
        cmp: Comparison,
        bound: i64,
    },
    Equal(usize, usize),
    NotEqual(usize, usize),
    Implies {
        var: usize,
        value: i64,
        then: Box<Prop>,
    },
}

impl Prop {
    fn compile(constraint: &Constraint, model: &CpModel) -> Result<Self, String> {
        let idx = |name: &str| {
            model
                .var_index(name)
                .ok_or_else(|| format!("undefined variable: {name}"))
        };
        Ok(match constraint {
            Constraint::Between { var, min, max } => Prop::Between {
                var: idx(var)?,
                min: *min,
                max: *max,
            },
            Constraint::Count {
                vars,
                value,
                cmp,
                bound,
            } => Prop::Count {
                vars: vars.iter().map(|v| idx(v)).collect::<Result<_, _>>()?,
                value: *value,
                cmp: *cmp,
                bound: *bound,
            },
            Constraint::Equal { var1, var2 } => Prop::Equal(idx(var1)?, idx(var2)?),
            Constraint::NotEqual { var1, var2 } => Prop::NotEqual(idx(var1)?, idx(var2)?),
            Constraint::Implies { condition, then } => Prop::Implies {
                var: idx(&condition.var)?,
                value: condition.value,
                then: Box::new(Prop::compile(then, model)?),
            },
        })
    }

    pub(crate) fn collect_vars(&self, out: &mut Vec<usize>) {
        match self {
            Prop::Between { var, .. } => out.push(*var),
            Prop::Count { vars, .. } => out.extend_from_slice(vars),
            Prop::Equal(a, b) | Prop::NotEqual(a, b) => {
                out.push(*a);
                out.push(*b);
            }
            Prop::Implies { var, then, .. } => {
                out.push(*var);
                then.collect_vars(out);
            }
        }
    }

    /// Degree of violation under a complete assignment (0 = satisfied).
    pub(crate) fn violation(&self, values: &[i64]) -> i64 {
        match self {
            Prop::Between { var, min, max } => {
                let v = values[*var];
                i64::from(v < *min || v > *max)
            }
            Prop::Count {
                vars,
                value,
                cmp,
                bound,
            } => {
                let count = vars.iter().filter(|&&v| values[v] == *value).count() as i64;
                match cmp {
                    Comparison::AtMost => (count - bound).max(0),
                    Comparison::AtLeast => (bound - count).max(0),
                    Comparison::Exactly => (count - bound).abs(),
                }
            }
            Prop::Equal(a, b) => i64::from(values[*a] != values[*b]),
            Prop::NotEqual(a, b) => i64::from(values[*a] == values[*b]),
            Prop::Implies { var, value, then } => {
                if values[*var] == *value {
                    then.violation(values)
                } else {
                    0
                }
            }
        }
    }

    /// Whether the constraint can no longer be satisfied by any
    /// assignment drawn from `domains`.
    fn is_refuted(&self, domains: &[Domain]) -> bool {
        match self {
            Prop::Between { var, min, max } => domains[*var].values().all(|v| v < *min || v > *max),
            Prop::Count {
                vars,
                value,
                cmp,
                bound,
            } => {
                let (fixed, possible) = count_support(vars, *value, domains);
                match cmp {
                    Comparison::AtMost => fixed > *bound,
                    Comparison::AtLeast => possible < *bound,
                    Comparison::Exactly => fixed > *bound || possible < *bound,
                }
            }
            Prop::Equal(a, b) => domains[*a].disjoint(&domains[*b]),
            Prop::NotEqual(a, b) => {
                a == b
                    || matches!(
                        (domains[*a].fixed_value(), domains[*b].fixed_value()),
                        (Some(x), Some(y)) if x == y
                    )
            }
            Prop::Implies { var, value, then } => {
                domains[*var].is_fixed_to(*value) && then.is_refuted(domains)
            }
        }
    }

    /// Prunes `domains`. Pushes every variable whose domain shrank
    /// onto `changed`. Returns `Err(())` on a wiped-out domain.
    fn prune(&self, domains: &mut [Domain], changed: &mut Vec<usize>) -> Result<(), ()> {
        match self {
            Prop::Between { var, min, max } => {
                if domains[*var].retain_range(*min, *max) {
                    changed.push(*var);
                }
                check(&domains[*var])
            }
            Prop::Count {
                vars,
                value,
                cmp,
                bound,
            } => {
                let (fixed, possible) = count_support(vars, *value, domains);
                let upper = matches!(cmp, Comparison::AtMost | Comparison::Exactly);
                let lower = matches!(cmp, Comparison::AtLeast | Comparison::Exactly);
                if (upper && fixed > *bound) || (lower && possible < *bound) {
                    return Err(());
                }
                if upper && fixed == *bound {
                    for &v in vars {
                        if !domains[v].is_fixed_to(*value) && domains[v].remove(*value) {
                            changed.push(v);
                            check(&domains[v])?;
                        }
                    }
                } else if lower && possible == *bound {
                    for &v in vars {
                        if domains[v].contains(*value) && domains[v].fix(*value) {
                            changed.push(v);
                        }
                    }
                }
                Ok(())
            }
            Prop::Equal(a, b) => {
                if a == b {
                    return Ok(());
                }
                let snapshot = domains[*b].clone();
                if domains[*a].intersect(&snapshot) {
                    changed.push(*a);
                }
                let snapshot = domains[*a].clone();
                if domains[*b].intersect(&snapshot) {
                    changed.push(*b);
                }
                check(&domains[*a])
            }
            Prop::NotEqual(a, b) => {
                if a == b {
                    return Err(());
                }
                if let Some(x) = domains[*a].fixed_value() {
                    if domains[*b].remove(x) {
                        changed.push(*b);
                    }
                }
                if let Some(y) = domains[*b].fixed_value() {
                    if domains[*a].remove(y) {
                        changed.push(*a);
                    }
                }
                check(&domains[*a])?;
                check(&domains[*b])
            }
            Prop::Implies { var, value, then } => {
                if !domains[*var].contains(*value) {
                    return Ok(());
                }
                if domains[*var].is_fixed_to(*value) {
                    return then.prune(domains, changed);
                }
                if then.is_refuted(domains) && domains[*var].remove(*value) {
                    changed.push(*var);
                }
                check(&domains[*var])
            }
        }
    }
}

fn check(domain: &Domain) -> Result<(), ()> {
    if domain.is_empty() {
        Err(())
    } else {
        Ok(())
    }
}

/// (variables fixed to `value`, variables that may still take `value`)
fn count_support(vars: &[usize], value: i64, domains: &[Domain]) -> (i64, i64) {
    let mut fixed = 0;
    let mut possible = 0;
    for &v in vars {
        if domains[v].contains(value) {
            possible += 1;
            if domains[v].size() == 1 {
                fixed += 1;
            }
        }
    }
    (fixed, possible)
}

/// A model compiled for search.
#[derive(Debug, Clone)]
pub(crate) struct Problem {
    pub(crate) names: Vec<String>,
    pub(crate) domains: Vec<Domain>,
    pub(crate) props: Vec<Prop>,
    /// For each variable, the constraints that mention it.
    pub(crate) watches: Vec<Vec<usize>>,
}

impl Problem {
    pub(crate) fn compile(model: &CpModel) -> Result<Self, String> {
        model.validate()?;

        let mut domains = Vec::with_capacity(model.int_vars.len());
        for var in &model.int_vars {
            if var.domain_size() > MAX_DOMAIN_WIDTH {
                return Err(format!(
                    "domain of {} too wide: {} values",
                    var.name,
                    var.domain_size()
                ));
            }
            let mut domain = Domain::range(var.min, var.max);
            if let Some(v) = var.fixed {
                domain.fix(v);
            }
            domains.push(domain);
        }

        let props = model
            .constraints
            .iter()
            .map(|c| Prop::compile(c, model))
            .collect::<Result<Vec<_>, _>>()?;

        let mut watches = vec![Vec::new(); domains.len()];
        let mut scratch = Vec::new();
        for (ci, prop) in props.iter().enumerate() {
            scratch.clear();
            prop.collect_vars(&mut scratch);
            scratch.sort_unstable();
            scratch.dedup();
            for &v in &scratch {
                watches[v].push(ci);
            }
        }

        Ok(Self {
            names: model.int_vars.iter().map(|v| v.name.clone()).collect(),
            domains,
            props,
            watches,
        })
    }

    pub(crate) fn var_count(&self) -> usize {
        self.domains.len()
    }

    /// Propagates every constraint to a fixpoint.
    ///
    /// Returns `false` when a conflict is detected.
    pub(crate) fn propagate_all(&self, domains: &mut [Domain]) -> bool {
        if domains.iter().any(Domain::is_empty) {
            return false;
        }
        self.run_queue(domains, (0..self.props.len()).collect())
    }

    /// Propagates the constraints watching `var` after it changed.
    pub(crate) fn propagate_from(&self, domains: &mut [Domain], var: usize) -> bool {
        self.run_queue(domains, self.watches[var].iter().copied().collect())
    }

    fn run_queue(&self, domains: &mut [Domain], mut queue: VecDeque<usize>) -> bool {
        let mut queued = vec![false; self.props.len()];
        for &ci in &queue {
            queued[ci] = true;
        }
        let mut changed = Vec::new();

        while let Some(ci) = queue.pop_front() {
            queued[ci] = false;
            changed.clear();
            if self.props[ci].prune(domains, &mut changed).is_err() {
                return false;
            }
            for &v in &changed {
                for &w in &self.watches[v] {
                    if !queued[w] {
                        queued[w] = true;
                        queue.push_back(w);
                    }
                }
            }
        }
        true
    }

    /// Total violation of a complete assignment.
    pub(crate) fn total_violation(&self, values: &[i64]) -> i64 {
        self.props.iter().map(|p| p.violation(values)).sum()
    }
}
