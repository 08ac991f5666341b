use std::fmt::Display;
use std::ops::Not;

/// Representation of a variable; DIMACS variable `v` maps to `v - 1`.
pub type Var = u32;

/// Handle to a hash-consed node in a `GuardEngine`. Equal handles mean structurally equal
/// guards within the same engine.
#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Guard(pub(crate) u32);

impl Guard {
    #[inline(always)]
    pub fn idx(&self) -> usize {
        self.0 as usize
    }
}

// Reserved handles; every engine interns the constants first.
pub const G_FALSE: Guard = Guard(0);
pub const G_TRUE: Guard = Guard(1);

/// A node of the guard DAG. Operands of And/Or are stored in ascending order so that
/// commuted constructions share a node.
#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Node {
    False,
    True,
    Var(Var),
    Not(Guard),
    And(Guard, Guard),
    Or(Guard, Guard),
}

// Represent false, true, or UNDEF (i.e. not yet decided under a partial assignment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum LBool {
    True = 0,
    False = 1,
    #[default]
    Undef = 2,
}

impl From<bool> for LBool {
    #[inline(always)]
    fn from(value: bool) -> Self {
        if value {
            LBool::True
        } else {
            LBool::False
        }
    }
}

impl Not for LBool {
    type Output = Self;
    fn not(self) -> LBool {
        match self {
            LBool::True => LBool::False,
            LBool::False => LBool::True,
            LBool::Undef => LBool::Undef,
        }
    }
}

impl LBool {
    pub fn and(self, rhs: LBool) -> LBool {
        match (self, rhs) {
            (LBool::False, _) | (_, LBool::False) => LBool::False,
            (LBool::True, LBool::True) => LBool::True,
            _ => LBool::Undef,
        }
    }

    pub fn or(self, rhs: LBool) -> LBool {
        !(!self).and(!rhs)
    }
}

// Status markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Sat,
    Unsat,
}

impl Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveStatus::Sat => write!(f, "SAT"),
            SolveStatus::Unsat => write!(f, "UNSAT"),
        }
    }
}
