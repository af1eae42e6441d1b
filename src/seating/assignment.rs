//! Solved seating and an independent invariant checker.

use super::model::{dominance_threshold, Pair, SeatingModel};
use std::fmt;

/// Table index per person: element `i` is the table of person `i`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Assignment {
    tables: Vec<usize>,
}

impl Assignment {
    pub fn new(tables: Vec<usize>) -> Self {
        Self { tables }
    }

    /// Table of `person`, if the person exists.
    pub fn table_of(&self, person: usize) -> Option<usize> {
        self.tables.get(person).copied()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.tables
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.tables
    }

    /// Number of persons seated at `table`.
    pub fn occupancy(&self, table: usize) -> usize {
        self.tables.iter().filter(|&&t| t == table).count()
    }

    /// Occupants of each of `table_count` tables, in person order.
    ///
    /// Persons mapped outside `[0, table_count)` are omitted.
    pub fn by_table(&self, table_count: usize) -> Vec<Vec<usize>> {
        let mut chart = vec![Vec::new(); table_count];
        for (person, &table) in self.tables.iter().enumerate() {
            if let Some(seats) = chart.get_mut(table) {
                seats.push(person);
            }
        }
        chart
    }

    /// Every invariant of `model` this assignment breaks.
    ///
    /// Empty for a valid seating. Checks are computed directly from the
    /// event data, independently of any encoder or solver.
    pub fn violations(&self, model: &SeatingModel) -> Vec<Violation> {
        let mut out = Vec::new();
        let m = model.table_count();

        if self.len() != model.person_count() {
            out.push(Violation::WrongLength {
                expected: model.person_count(),
                actual: self.len(),
            });
            return out;
        }

        for (person, &table) in self.tables.iter().enumerate() {
            if table >= m {
                out.push(Violation::TableOutOfRange { person, table });
            }
        }

        for (table, &capacity) in model.tables.iter().enumerate() {
            let seated = self.occupancy(table);
            if seated > capacity {
                out.push(Violation::OverCapacity {
                    table,
                    seated,
                    capacity,
                });
            }
        }

        let at = |p: usize| self.tables[p];
        for &pair in &model.couples {
            if at(pair.first) != at(pair.second) {
                out.push(Violation::CoupleSplit(pair));
            }
        }
        for &pair in &model.enemies {
            if at(pair.first) == at(pair.second) {
                out.push(Violation::EnemiesTogether(pair));
            }
        }

        for (person, friends) in model.friends.iter().enumerate() {
            match friends.as_slice() {
                [] => {}
                [friend] => {
                    if at(person) != at(*friend) {
                        out.push(Violation::LoneFriendSplit {
                            person,
                            friend: *friend,
                        });
                    }
                }
                many => {
                    if many.iter().all(|&f| at(f) != at(person)) {
                        out.push(Violation::FriendIsolated { person });
                    }
                }
            }
        }

        for (table, &capacity) in model.tables.iter().enumerate() {
            let threshold = dominance_threshold(capacity);
            for (group, members) in &model.groups {
                if members.len() <= threshold {
                    continue;
                }
                let seated = members.iter().filter(|&&p| at(p) == table).count();
                if seated > threshold {
                    out.push(Violation::GroupDominates {
                        group: group.clone(),
                        table,
                        seated,
                        threshold,
                    });
                }
            }
        }

        out
    }

    /// Whether no invariant of `model` is broken.
    pub fn is_valid_for(&self, model: &SeatingModel) -> bool {
        self.violations(model).is_empty()
    }
}

impl From<Assignment> for Vec<usize> {
    fn from(a: Assignment) -> Self {
        a.tables
    }
}

/// A broken seating invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    WrongLength {
        expected: usize,
        actual: usize,
    },
    TableOutOfRange {
        person: usize,
        table: usize,
    },
    OverCapacity {
        table: usize,
        seated: usize,
        capacity: usize,
    },
    CoupleSplit(Pair),
    EnemiesTogether(Pair),
    /// A person with a single friend is not seated with that friend.
    LoneFriendSplit {
        person: usize,
        friend: usize,
    },
    /// A person with several friends has none of them at their table.
    FriendIsolated {
        person: usize,
    },
    GroupDominates {
        group: String,
        table: usize,
        seated: usize,
        threshold: usize,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::WrongLength { expected, actual } => {
                write!(f, "assignment covers {actual} persons, expected {expected}")
            }
            Violation::TableOutOfRange { person, table } => {
                write!(f, "person {person} assigned to missing table {table}")
            }
            Violation::OverCapacity {
                table,
                seated,
                capacity,
            } => write!(f, "table {table} seats {seated} > capacity {capacity}"),
            Violation::CoupleSplit(p) => {
                write!(f, "couple ({}, {}) seated apart", p.first, p.second)
            }
            Violation::EnemiesTogether(p) => {
                write!(f, "enemies ({}, {}) seated together", p.first, p.second)
            }
            Violation::LoneFriendSplit { person, friend } => {
                write!(f, "person {person} seated apart from only friend {friend}")
            }
            Violation::FriendIsolated { person } => {
                write!(f, "person {person} has no friend at their table")
            }
            Violation::GroupDominates {
                group,
                table,
                seated,
                threshold,
            } => write!(
                f,
                "group '{group}' has {seated} members at table {table} (limit {threshold})"
            ),
        }
    }
}
