//! Worst-case employee exposure per plan

mod bound;

pub use bound::{BoundBasis, BoundPool, UnboundedReason, WorstCaseBound, WorstCaseBoundCalculator, MAX_CLOSURE_PASSES};
