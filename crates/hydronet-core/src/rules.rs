//! # Kind Rules
//!
//! The static rule tables of the engine, one row per [`NodeKind`]:
//!
//! - **Connectivity**: the directed allow-list of downstream kinds.
//! - **Degree constraints**: `(min_in, max_in, min_out, max_out)`, kept
//!   separately for flow links and control links.
//! - **Kind flags**: whether a kind issues control signals (its outgoing links
//!   are control links) and whether it is exempt from the anti-parallel rule.
//! - **Attribute schema**: the attribute tables a kind may carry.
//!
//! Rows are reached through an exhaustive `match`, so adding a kind without
//! rules does not compile.

use crate::{LinkKind, NodeKind};
use std::fmt;

// =============================================================================
// DEGREE BOUNDS
// =============================================================================

/// An upper bound on the number of links of one kind at one end of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DegreeBound {
    Count(u32),
    Unbounded,
}

impl DegreeBound {
    /// Whether a node that currently has `current` links may gain one more.
    #[must_use]
    pub const fn admits_another(&self, current: usize) -> bool {
        match self {
            DegreeBound::Count(max) => current < *max as usize,
            DegreeBound::Unbounded => true,
        }
    }

    /// Whether `current` links respect this bound.
    #[must_use]
    pub const fn holds(&self, current: usize) -> bool {
        match self {
            DegreeBound::Count(max) => current <= *max as usize,
            DegreeBound::Unbounded => true,
        }
    }
}

impl fmt::Display for DegreeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegreeBound::Count(n) => write!(f, "{}", n),
            DegreeBound::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// In/out degree bounds of one node kind for one link kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DegreeConstraint {
    pub min_in: u32,
    pub max_in: DegreeBound,
    pub min_out: u32,
    pub max_out: DegreeBound,
}

const fn bounds(
    min_in: u32,
    max_in: DegreeBound,
    min_out: u32,
    max_out: DegreeBound,
) -> DegreeConstraint {
    DegreeConstraint {
        min_in,
        max_in,
        min_out,
        max_out,
    }
}

const ZERO: DegreeBound = DegreeBound::Count(0);
const ONE: DegreeBound = DegreeBound::Count(1);
const MANY: DegreeBound = DegreeBound::Unbounded;

const NONE: DegreeConstraint = bounds(0, ZERO, 0, ZERO);
const ONE_IN_ONE_OUT: DegreeConstraint = bounds(1, ONE, 1, ONE);
const CONTROLLABLE: DegreeConstraint = bounds(0, ONE, 0, ZERO);
const BROADCASTER: DegreeConstraint = bounds(0, ZERO, 1, MANY);

// =============================================================================
// KIND RULES
// =============================================================================

/// Every static rule that applies to one node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindRules {
    /// Kinds permitted directly downstream of this kind.
    pub downstream: &'static [NodeKind],
    pub flow: DegreeConstraint,
    pub control: DegreeConstraint,
    /// Outgoing links of this kind carry control signals.
    pub issues_control: bool,
    /// Links to or from this kind may run anti-parallel to an existing link.
    pub anti_parallel_exempt: bool,
    /// Attribute tables this kind may carry.
    pub tables: &'static [&'static str],
}

use NodeKind::{
    Basin, ContinuousControl, DiscreteControl, FlowBoundary, FlowDemand, LevelBoundary,
    LevelDemand, LinearResistance, ManningResistance, Outlet, PidControl, Pump,
    TabulatedRatingCurve, Terminal, UserDemand,
};

const TO_STORAGE: &[NodeKind] = &[LevelBoundary, Basin, Terminal];

const BASIN: KindRules = KindRules {
    downstream: &[
        LinearResistance,
        UserDemand,
        Outlet,
        TabulatedRatingCurve,
        ManningResistance,
        Pump,
    ],
    flow: bounds(0, MANY, 0, MANY),
    control: CONTROLLABLE,
    issues_control: false,
    anti_parallel_exempt: false,
    tables: &[
        "static",
        "time",
        "state",
        "profile",
        "subgrid",
        "area",
        "concentration",
        "concentration_external",
        "concentration_state",
    ],
};

const CONTINUOUS_CONTROL: KindRules = KindRules {
    downstream: &[Outlet, Pump],
    flow: NONE,
    control: BROADCASTER,
    issues_control: true,
    anti_parallel_exempt: false,
    tables: &["variable", "function"],
};

const DISCRETE_CONTROL: KindRules = KindRules {
    downstream: &[
        LinearResistance,
        PidControl,
        Outlet,
        TabulatedRatingCurve,
        ManningResistance,
        Pump,
    ],
    flow: NONE,
    control: BROADCASTER,
    issues_control: true,
    anti_parallel_exempt: false,
    tables: &["variable", "compound_variable", "condition", "logic"],
};

const FLOW_BOUNDARY: KindRules = KindRules {
    downstream: TO_STORAGE,
    flow: bounds(0, ZERO, 1, MANY),
    control: NONE,
    issues_control: false,
    anti_parallel_exempt: false,
    tables: &["static", "time", "concentration"],
};

const FLOW_DEMAND: KindRules = KindRules {
    downstream: &[
        LinearResistance,
        Outlet,
        TabulatedRatingCurve,
        ManningResistance,
        Pump,
    ],
    flow: NONE,
    control: bounds(0, ZERO, 1, ONE),
    issues_control: true,
    anti_parallel_exempt: false,
    tables: &["static", "time"],
};

const LEVEL_BOUNDARY: KindRules = KindRules {
    downstream: &[Outlet, TabulatedRatingCurve, LinearResistance, Pump],
    flow: bounds(0, MANY, 0, MANY),
    control: NONE,
    issues_control: false,
    anti_parallel_exempt: false,
    tables: &["static", "time", "concentration"],
};

const LEVEL_DEMAND: KindRules = KindRules {
    downstream: &[Basin],
    flow: NONE,
    control: BROADCASTER,
    issues_control: true,
    anti_parallel_exempt: false,
    tables: &["static", "time"],
};

const LINEAR_RESISTANCE: KindRules = KindRules {
    downstream: &[LevelBoundary, Basin],
    flow: ONE_IN_ONE_OUT,
    control: CONTROLLABLE,
    issues_control: false,
    anti_parallel_exempt: false,
    tables: &["static"],
};

const MANNING_RESISTANCE: KindRules = KindRules {
    downstream: &[Basin],
    flow: ONE_IN_ONE_OUT,
    control: CONTROLLABLE,
    issues_control: false,
    anti_parallel_exempt: false,
    tables: &["static"],
};

const OUTLET: KindRules = KindRules {
    downstream: TO_STORAGE,
    flow: ONE_IN_ONE_OUT,
    control: CONTROLLABLE,
    issues_control: false,
    anti_parallel_exempt: false,
    tables: &["static"],
};

const PID_CONTROL: KindRules = KindRules {
    downstream: &[Outlet, Pump],
    flow: NONE,
    control: bounds(0, ONE, 1, ONE),
    issues_control: true,
    anti_parallel_exempt: false,
    tables: &["static", "time"],
};

const PUMP: KindRules = KindRules {
    downstream: TO_STORAGE,
    flow: ONE_IN_ONE_OUT,
    control: CONTROLLABLE,
    issues_control: false,
    anti_parallel_exempt: false,
    tables: &["static"],
};

const TABULATED_RATING_CURVE: KindRules = KindRules {
    downstream: TO_STORAGE,
    flow: ONE_IN_ONE_OUT,
    control: CONTROLLABLE,
    issues_control: false,
    anti_parallel_exempt: false,
    tables: &["static", "time"],
};

const TERMINAL: KindRules = KindRules {
    downstream: &[],
    flow: bounds(1, MANY, 0, ZERO),
    control: NONE,
    issues_control: false,
    anti_parallel_exempt: false,
    tables: &["static"],
};

const USER_DEMAND: KindRules = KindRules {
    downstream: TO_STORAGE,
    flow: ONE_IN_ONE_OUT,
    control: NONE,
    issues_control: false,
    anti_parallel_exempt: true,
    tables: &["static", "time"],
};

/// The rule row of a node kind.
#[must_use]
pub const fn rules(kind: NodeKind) -> &'static KindRules {
    match kind {
        Basin => &BASIN,
        ContinuousControl => &CONTINUOUS_CONTROL,
        DiscreteControl => &DISCRETE_CONTROL,
        FlowBoundary => &FLOW_BOUNDARY,
        FlowDemand => &FLOW_DEMAND,
        LevelBoundary => &LEVEL_BOUNDARY,
        LevelDemand => &LEVEL_DEMAND,
        LinearResistance => &LINEAR_RESISTANCE,
        ManningResistance => &MANNING_RESISTANCE,
        Outlet => &OUTLET,
        PidControl => &PID_CONTROL,
        Pump => &PUMP,
        TabulatedRatingCurve => &TABULATED_RATING_CURVE,
        Terminal => &TERMINAL,
        UserDemand => &USER_DEMAND,
    }
}

// =============================================================================
// LOOKUPS
// =============================================================================

/// Whether `down` may sit directly downstream of `up`.
#[must_use]
pub fn can_connect(up: NodeKind, down: NodeKind) -> bool {
    rules(up).downstream.contains(&down)
}

/// Kinds permitted directly downstream of `up`.
#[must_use]
pub fn permitted_downstream(up: NodeKind) -> &'static [NodeKind] {
    rules(up).downstream
}

/// Degree bounds of `kind` for links of `link_kind`.
#[must_use]
pub fn degree_constraint(kind: NodeKind, link_kind: LinkKind) -> DegreeConstraint {
    let row = rules(kind);
    match link_kind {
        LinkKind::Flow => row.flow,
        LinkKind::Control => row.control,
    }
}

/// The kind of every link leaving a node of `source`.
#[must_use]
pub fn link_kind_for(source: NodeKind) -> LinkKind {
    if rules(source).issues_control {
        LinkKind::Control
    } else {
        LinkKind::Flow
    }
}

/// Whether `kind` may carry an attribute table named `table`.
#[must_use]
pub fn has_table(kind: NodeKind, table: &str) -> bool {
    rules(kind).tables.contains(&table)
}

// =============================================================================
// TESTS
// =============================================================================
