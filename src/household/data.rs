//! Household composition, utilization and per-call calculation arguments

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::evaluation::RankingPriority;
use crate::funds::FundPolicy;

/// Relationship of a household member to the employee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Spouse,
    Child,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "employee" => Some(Role::Employee),
            "spouse" => Some(Role::Spouse),
            "child" => Some(Role::Child),
            _ => None,
        }
    }
}

/// One covered person and their projected annual utilization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub role: Role,

    /// Annual count per service id
    #[serde(default)]
    pub utilization: BTreeMap<String, f64>,
}

impl Member {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            utilization: BTreeMap::new(),
        }
    }

    /// Builder-style helper to add utilization
    pub fn with_service(mut self, service_id: &str, count: f64) -> Self {
        self.utilization.insert(service_id.to_string(), count);
        self
    }

    pub fn count_for(&self, service_id: &str) -> f64 {
        self.utilization.get(service_id).copied().unwrap_or(0.0)
    }
}

/// The people being covered, in evaluation order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub members: Vec<Member>,
}

impl Household {
    pub fn new(members: Vec<Member>) -> Self {
        Self { members }
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn has_spouse(&self) -> bool {
        self.members.iter().any(|m| m.role == Role::Spouse)
    }

    pub fn children(&self) -> u32 {
        self.members.iter().filter(|m| m.role == Role::Child).count() as u32
    }
}

/// Adjustment applied to a plan's configured premiums
///
/// A bare number adjusts the employee premium; an object adjusts both sides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PremiumAdjustment {
    Employee(f64),
    Split { employee: f64, employer: f64 },
}

impl PremiumAdjustment {
    /// (employee, employer) deltas
    pub fn deltas(&self) -> (f64, f64) {
        match *self {
            PremiumAdjustment::Employee(delta) => (delta, 0.0),
            PremiumAdjustment::Split { employee, employer } => (employee, employer),
        }
    }
}

/// Per-plan funding inputs supplied by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanFunding {
    /// Balance rolled over from the prior year
    #[serde(default)]
    pub rollover: f64,

    /// Employee's voluntary current-year contribution
    #[serde(default)]
    pub voluntary: f64,

    /// Employer match on the voluntary contribution
    #[serde(default, rename = "match")]
    pub match_amount: f64,

    #[serde(default)]
    pub premium_adjustment: Option<PremiumAdjustment>,
}

impl PlanFunding {
    /// Same premium adjustment, with every employee-side funding input zeroed
    pub fn without_employee_funding(&self) -> Self {
        Self {
            rollover: 0.0,
            voluntary: 0.0,
            match_amount: 0.0,
            premium_adjustment: self.premium_adjustment,
        }
    }
}

/// Everything one comparison call needs besides the configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationArgs {
    pub region: String,
    pub status: String,
    pub household: Household,

    /// Funding inputs keyed by plan id (absent plan = no funding inputs)
    #[serde(default)]
    pub funding: BTreeMap<String, PlanFunding>,

    #[serde(default)]
    pub fund_policy: FundPolicy,

    #[serde(default)]
    pub priority: RankingPriority,

    /// Also compute the comparison with employee funding removed
    #[serde(default)]
    pub include_no_employee_funding: bool,
}

impl CalculationArgs {
    pub fn new(region: &str, status: &str, household: Household) -> Self {
        Self {
            region: region.to_string(),
            status: status.to_string(),
            household,
            funding: BTreeMap::new(),
            fund_policy: FundPolicy::default(),
            priority: RankingPriority::default(),
            include_no_employee_funding: false,
        }
    }

    pub fn funding_for(&self, plan_id: &str) -> PlanFunding {
        self.funding.get(plan_id).copied().unwrap_or_default()
    }

    /// Arguments for the "no employee funding" comparison variant
    pub fn without_employee_funding(&self) -> Self {
        Self {
            funding: self
                .funding
                .iter()
                .map(|(id, f)| (id.clone(), f.without_employee_funding()))
                .collect(),
            fund_policy: FundPolicy::EmployerCoreOnly,
            include_no_employee_funding: false,
            ..self.clone()
        }
    }
}
