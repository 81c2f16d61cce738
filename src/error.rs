//! Error types for configuration-contract violations and input loading
//!
//! Invariant violations inside the engine (a quota pool going negative, a pool
//! asked to absorb a charge type it does not restrict) are not represented here:
//! they are bugs in the engine itself and abort via `assert!`.

use thiserror::Error;

/// Errors raised when the engine is driven with inputs that break its contract
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown region `{0}`")]
    UnknownRegion(String),

    #[error("unknown status `{0}`")]
    UnknownStatus(String),

    #[error("unknown plan `{0}`")]
    UnknownPlan(String),

    #[error("service `{service}` references unknown category `{category}`")]
    UnknownCategory { service: String, category: String },

    #[error("plan `{plan}` group `{group}` references unknown category `{category}`")]
    UnknownGroupCategory {
        plan: String,
        group: String,
        category: String,
    },

    #[error("plan `{plan}` has no coverage for service `{service}`")]
    MissingCoverage { plan: String, service: String },

    #[error("plan `{plan}` has an empty coverage list for service `{service}`")]
    EmptyCoverage { plan: String, service: String },

    #[error("plan `{plan}` service `{service}` references unknown combined limit `{limit}`")]
    UnknownCombinedLimit {
        plan: String,
        service: String,
        limit: String,
    },

    #[error("no {what} configured for region `{region}`, status `{status}`, coverage level `{coverage_level}`")]
    MissingAmount {
        what: String,
        region: String,
        status: String,
        coverage_level: String,
    },

    #[error("no coverage level matches a household with spouse: {spouse}, children: {children}")]
    NoMatchingCoverageLevel { spouse: bool, children: u32 },

    #[error("plan `{plan}` is not offered in region `{region}`")]
    PlanNotInRegion { plan: String, region: String },

    #[error("household has no members")]
    EmptyHousehold,

    #[error("unknown household role `{0}`")]
    InvalidRole(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result alias used throughout the engine
pub type Result<T> = std::result::Result<T, EngineError>;
