//! Event data, validation and the derived friend relation.

use crate::cp::MAX_DOMAIN_WIDTH;
use crate::error::{Result, SeatingError};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Share of a table's capacity a single group may occupy, as a fraction.
pub const DOMINANCE_NUMERATOR: usize = 7;
pub const DOMINANCE_DENOMINATOR: usize = 10;

/// Most tables an event may have: one table variable spans every table.
pub const MAX_TABLES: usize = MAX_DOMAIN_WIDTH as usize;

/// Largest number of members of one oversized group allowed at a table:
/// `floor(0.7 * capacity)`, computed exactly in integers without overflow.
pub fn dominance_threshold(capacity: usize) -> usize {
    capacity / DOMINANCE_DENOMINATOR * DOMINANCE_NUMERATOR
        + capacity % DOMINANCE_DENOMINATOR * DOMINANCE_NUMERATOR / DOMINANCE_DENOMINATOR
}

/// An unordered pair of person indices.
///
/// With the `serde` feature a pair reads from either `[first, second]` or
/// `{ first, second }`, and is written as the latter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "PairRepr"))]
pub struct Pair {
    pub first: usize,
    pub second: usize,
}

impl Pair {
    pub fn new(first: usize, second: usize) -> Self {
        Self { first, second }
    }

    /// Order-independent key: `(min, max)`.
    pub fn key(&self) -> (usize, usize) {
        (self.first.min(self.second), self.first.max(self.second))
    }

    /// Whether both pairs name the same two persons, in either order.
    pub fn same_as(&self, other: &Pair) -> bool {
        self.key() == other.key()
    }
}

impl From<(usize, usize)> for Pair {
    fn from((first, second): (usize, usize)) -> Self {
        Self::new(first, second)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum PairRepr {
    Tuple(usize, usize),
    Named { first: usize, second: usize },
}

#[cfg(feature = "serde")]
impl From<PairRepr> for Pair {
    fn from(repr: PairRepr) -> Self {
        match repr {
            PairRepr::Tuple(first, second) | PairRepr::Named { first, second } => {
                Self::new(first, second)
            }
        }
    }
}

/// Raw event data.
///
/// # Examples
///
/// ```
/// use u_seating::seating::EventData;
///
/// let data = EventData::unnamed(4, vec![2, 2])
///     .with_couple(0, 1)
///     .with_enemy(1, 2)
///     .with_group("college", vec![2, 3]);
/// assert_eq!(data.persons.len(), 4);
/// assert_eq!(data.groups["college"], vec![2, 3]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EventData {
    /// Person names; the position is the person id.
    pub persons: Vec<String>,
    /// Table capacities; the position is the table id.
    pub tables: Vec<usize>,
    /// Named groups of person ids.
    pub groups: BTreeMap<String, Vec<usize>>,
    /// Pairs that must share a table.
    pub couples: Vec<Pair>,
    /// Pairs that must not share a table.
    pub enemies: Vec<Pair>,
}

impl EventData {
    pub fn new(persons: Vec<String>, tables: Vec<usize>) -> Self {
        Self {
            persons,
            tables,
            ..Self::default()
        }
    }

    /// `n` persons named `guest-0` .. `guest-{n-1}`.
    pub fn unnamed(n: usize, tables: Vec<usize>) -> Self {
        Self::new((0..n).map(|i| format!("guest-{i}")).collect(), tables)
    }

    pub fn with_group(mut self, name: impl Into<String>, members: Vec<usize>) -> Self {
        self.groups.insert(name.into(), members);
        self
    }

    pub fn with_couple(mut self, first: usize, second: usize) -> Self {
        self.couples.push(Pair::new(first, second));
        self
    }

    pub fn with_enemy(mut self, first: usize, second: usize) -> Self {
        self.enemies.push(Pair::new(first, second));
        self
    }

    /// Checks referential integrity.
    ///
    /// Rejects: no tables, more than [`MAX_TABLES`] tables, zero
    /// capacities, empty groups, out-of-range person ids, repeated group
    /// members, self-pairs and duplicate couples or enemy pairs.
    pub fn validate(&self) -> Result<()> {
        let n = self.persons.len();

        if self.tables.is_empty() {
            return Err(invalid("at least one table is required"));
        }
        if self.tables.len() > MAX_TABLES {
            return Err(invalid(format!(
                "{} tables exceed the supported maximum of {MAX_TABLES}",
                self.tables.len()
            )));
        }
        if let Some(t) = self.tables.iter().position(|&c| c == 0) {
            return Err(invalid(format!("table {t} has capacity 0")));
        }

        for (name, members) in &self.groups {
            if members.is_empty() {
                return Err(invalid(format!("group '{name}' has no members")));
            }
            let mut seen = HashSet::new();
            for &p in members {
                if p >= n {
                    return Err(invalid(format!(
                        "group '{name}' references person {p}, but only {n} persons exist"
                    )));
                }
                if !seen.insert(p) {
                    return Err(invalid(format!("group '{name}' lists person {p} twice")));
                }
            }
        }

        check_pairs("couple", &self.couples, n)?;
        check_pairs("enemy pair", &self.enemies, n)?;
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> SeatingError {
    SeatingError::InputValidation(msg.into())
}

fn check_pairs(kind: &str, pairs: &[Pair], n: usize) -> Result<()> {
    let mut seen = HashSet::new();
    for pair in pairs {
        for p in [pair.first, pair.second] {
            if p >= n {
                return Err(invalid(format!(
                    "{kind} ({}, {}) references person {p}, but only {n} persons exist",
                    pair.first, pair.second
                )));
            }
        }
        if pair.first == pair.second {
            return Err(invalid(format!(
                "{kind} ({}, {}) pairs a person with themself",
                pair.first, pair.second
            )));
        }
        if !seen.insert(pair.key()) {
            return Err(invalid(format!(
                "duplicate {kind} ({}, {})",
                pair.first, pair.second
            )));
        }
    }
    Ok(())
}

/// Friend lists derived from group co-membership.
///
/// `friends[p]` holds, sorted, every other person sharing at least one
/// group with `p`. Persons in no group get an empty list. Pure: the same
/// groups always give the same result.
pub fn derive_friends(groups: &BTreeMap<String, Vec<usize>>, n: usize) -> Vec<Vec<usize>> {
    let mut sets: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    for members in groups.values() {
        for &member in members {
            if let Some(set) = sets.get_mut(member) {
                set.extend(members.iter().copied().filter(|&m| m != member));
            }
        }
    }
    sets.into_iter().map(|s| s.into_iter().collect()).collect()
}

/// Validated event data plus the derived friend relation.
///
/// Built once per solve; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatingModel {
    pub persons: Vec<String>,
    pub tables: Vec<usize>,
    pub groups: BTreeMap<String, Vec<usize>>,
    pub couples: Vec<Pair>,
    pub enemies: Vec<Pair>,
    /// `friends[p]`: see [`derive_friends`].
    pub friends: Vec<Vec<usize>>,
}

impl SeatingModel {
    /// Validates `data` and derives friends. `data` is left untouched.
    pub fn new(data: &EventData) -> Result<Self> {
        data.validate()?;
        Ok(Self {
            persons: data.persons.clone(),
            tables: data.tables.clone(),
            groups: data.groups.clone(),
            couples: data.couples.clone(),
            enemies: data.enemies.clone(),
            friends: derive_friends(&data.groups, data.persons.len()),
        })
    }

    pub fn person_count(&self) -> usize {
        self.persons.len()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Total seats across all tables.
    pub fn total_capacity(&self) -> usize {
        self.tables.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(entries: &[(&str, &[usize])]) -> BTreeMap<String, Vec<usize>> {
        entries
            .iter()
            .map(|&(k, v)| (k.to_string(), v.to_vec()))
            .collect()
    }

    #[test]
    fn test_dominance_threshold() {
        assert_eq!(dominance_threshold(1), 0);
        assert_eq!(dominance_threshold(3), 2);
        assert_eq!(dominance_threshold(10), 7);
        assert_eq!(dominance_threshold(30), 21);
        assert_eq!(dominance_threshold(8), 5);
        assert_eq!(dominance_threshold(1_000_000_007), 700_000_004);
    }

    #[test]
    fn test_dominance_threshold_near_usize_max() {
        let t = dominance_threshold(usize::MAX);
        assert!(t < usize::MAX);
        assert_eq!(t, usize::MAX / 10 * 7 + usize::MAX % 10 * 7 / 10);
    }

    #[test]
    fn test_pair_unordered() {
        assert!(Pair::new(1, 2).same_as(&Pair::new(2, 1)));
        assert!(!Pair::new(1, 2).same_as(&Pair::new(1, 3)));
        assert_eq!(Pair::from((5, 4)).key(), (4, 5));
    }

    #[test]
    fn test_derive_friends_union_across_groups() {
        let g = groups(&[("family", &[0, 1, 2]), ("work", &[2, 3])]);
        let friends = derive_friends(&g, 5);

        assert_eq!(friends[0], vec![1, 2]);
        assert_eq!(friends[1], vec![0, 2]);
        assert_eq!(friends[2], vec![0, 1, 3]);
        assert_eq!(friends[3], vec![2]);
        assert!(friends[4].is_empty());
    }

    #[test]
    fn test_derive_friends_idempotent() {
        let g = groups(&[("a", &[0, 3]), ("b", &[3, 1, 2]), ("c", &[4])]);
        assert_eq!(derive_friends(&g, 5), derive_friends(&g, 5));
    }

    #[test]
    fn test_singleton_group_gives_no_friends() {
        let g = groups(&[("solo", &[1])]);
        let friends = derive_friends(&g, 2);
        assert!(friends[0].is_empty());
        assert!(friends[1].is_empty());
    }

    #[test]
    fn test_model_does_not_mutate_input() {
        let data = EventData::unnamed(3, vec![2, 2]).with_group("g", vec![0, 1]);
        let before = data.clone();
        let model = SeatingModel::new(&data).unwrap();

        assert_eq!(data, before);
        assert_eq!(model.friends[0], vec![1]);
        assert_eq!(model.person_count(), 3);
        assert_eq!(model.table_count(), 2);
        assert_eq!(model.total_capacity(), 4);
    }

    fn rejects(data: EventData, needle: &str) {
        match SeatingModel::new(&data) {
            Err(SeatingError::InputValidation(msg)) => {
                assert!(msg.contains(needle), "expected '{needle}' in '{msg}'")
            }
            other => panic!("expected InputValidation, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_no_tables() {
        rejects(EventData::unnamed(1, vec![]), "at least one table");
    }

    #[test]
    fn test_rejects_too_many_tables() {
        rejects(
            EventData::unnamed(1, vec![1; MAX_TABLES + 1]),
            "supported maximum",
        );
        assert!(EventData::unnamed(1, vec![1; MAX_TABLES]).validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_capacity() {
        rejects(EventData::unnamed(1, vec![2, 0]), "table 1 has capacity 0");
    }

    #[test]
    fn test_rejects_empty_group() {
        rejects(
            EventData::unnamed(2, vec![2]).with_group("ghosts", vec![]),
            "no members",
        );
    }

    #[test]
    fn test_rejects_group_member_out_of_range() {
        rejects(
            EventData::unnamed(2, vec![2]).with_group("g", vec![0, 2]),
            "references person 2",
        );
    }

    #[test]
    fn test_rejects_repeated_group_member() {
        rejects(
            EventData::unnamed(2, vec![2]).with_group("g", vec![1, 1]),
            "twice",
        );
    }

    #[test]
    fn test_rejects_couple_out_of_range() {
        rejects(EventData::unnamed(2, vec![2]).with_couple(0, 5), "couple (0, 5)");
    }

    #[test]
    fn test_rejects_self_pair() {
        rejects(EventData::unnamed(2, vec![2]).with_enemy(1, 1), "themself");
    }

    #[test]
    fn test_rejects_duplicate_pair_in_either_order() {
        rejects(
            EventData::unnamed(3, vec![3])
                .with_couple(0, 1)
                .with_couple(1, 0),
            "duplicate couple",
        );
        rejects(
            EventData::unnamed(3, vec![3])
                .with_enemy(0, 2)
                .with_enemy(0, 2),
            "duplicate enemy pair",
        );
    }

    #[test]
    fn test_accepts_same_pair_as_couple_and_enemy() {
        // Contradictory but well-formed; left to the solver.
        let data = EventData::unnamed(2, vec![2])
            .with_couple(0, 1)
            .with_enemy(0, 1);
        assert!(SeatingModel::new(&data).is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_pairs_deserialize_from_lists_and_tables() {
        let data: EventData = toml::from_str(
            r#"
            persons = ["ann", "bob", "cy"]
            tables = [2, 2]
            couples = [[0, 1]]
            enemies = [{ first = 1, second = 2 }]
            "#,
        )
        .unwrap();

        assert_eq!(data.couples, vec![Pair::new(0, 1)]);
        assert_eq!(data.enemies, vec![Pair::new(1, 2)]);
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_accepts_no_persons() {
        let model = SeatingModel::new(&EventData::unnamed(0, vec![1])).unwrap();
        assert!(model.friends.is_empty());
    }
}
