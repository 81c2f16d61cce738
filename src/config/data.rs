//! Benefits configuration data structures matching the validated JSON format

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::amount::Amount;

/// Service ids with this prefix and a unit cost of exactly 1.0 carry a dollar
/// amount in their utilization count instead of a number of uses
pub const ADDITIONAL_SERVICES_PREFIX: &str = "additionalServices";

/// Complete benefits configuration (already validated and normalized upstream)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenefitsConfig {
    pub regions: Vec<Region>,
    pub statuses: Vec<Status>,

    /// Coverage levels in configured order; the first one that fits a household wins
    pub coverage_levels: Vec<CoverageLevel>,

    pub categories: Vec<Category>,

    /// Services in configured order
    pub services: Vec<Service>,

    /// Plans in configured order
    pub plans: Vec<Plan>,
}

impl BenefitsConfig {
    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn status(&self, id: &str) -> Option<&Status> {
        self.statuses.iter().find(|s| s.id == id)
    }

    pub fn plan(&self, id: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Coverage tier offered for a household composition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageLevel {
    pub id: String,

    /// Whether a spouse may be covered at this level
    #[serde(default)]
    pub spouse_covered: bool,

    /// Maximum number of covered children
    #[serde(default)]
    pub max_children: u32,
}

impl CoverageLevel {
    /// Whether this level covers a household with the given composition
    pub fn fits(&self, has_spouse: bool, children: u32) -> bool {
        (self.spouse_covered || !has_spouse) && children <= self.max_children
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A billable service belonging to exactly one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub category_id: String,

    /// Unit cost, flat or keyed by region
    pub cost: Amount,
}

impl Service {
    /// Whether this service stores a dollar amount in its utilization count
    pub fn is_additional_services_dollars(&self, unit_cost: f64) -> bool {
        self.id.starts_with(ADDITIONAL_SERVICES_PREFIX) && unit_cost == 1.0
    }
}

/// Savings account type attached to a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Hsa,
    Fsa,
    Hra,
}

impl AccountType {
    /// HSA and FSA plans are preferred by the savings account ranking
    pub fn is_preferred_savings_account(&self) -> bool {
        matches!(self, AccountType::Hsa | AccountType::Fsa)
    }
}

/// Charge types a quota pool can restrict
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChargeType {
    Deductible,
    Copay,
    Coinsurance,
}

impl ChargeType {
    pub const ALL: [ChargeType; 3] = [ChargeType::Deductible, ChargeType::Copay, ChargeType::Coinsurance];
}

fn all_charge_types() -> Vec<ChargeType> {
    ChargeType::ALL.to_vec()
}

/// Deductible or out-of-pocket-maximum group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaGroup {
    pub id: String,

    /// Categories whose charges draw from this group
    pub categories: Vec<String>,

    /// Charge types restricted by this group (OOP maximums only; deductibles
    /// always restrict the deductible charge)
    #[serde(default = "all_charge_types")]
    pub charge_types: Vec<ChargeType>,

    /// Per-person limit
    #[serde(default)]
    pub person: Option<Amount>,

    /// Family-wide limit
    #[serde(default)]
    pub family: Option<Amount>,
}

impl QuotaGroup {
    pub fn restricts_all_charge_types(&self) -> bool {
        ChargeType::ALL.iter().all(|c| self.charge_types.contains(c))
    }
}

/// Reimbursement cap shared by every service referencing its id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedLimit {
    pub id: String,

    #[serde(default)]
    pub person_reimburse_limit: Option<Amount>,

    #[serde(default)]
    pub family_reimburse_limit: Option<Amount>,
}

/// Plan core fund (employer/plan money)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanFunds {
    /// Only usable against categories eligible for all funds
    #[serde(default)]
    pub restricted: Option<Amount>,

    /// Usable against every fund-eligible category
    #[serde(default)]
    pub unrestricted: Option<Amount>,
}

/// Which funds may pay a category's cost sharing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FundEligibility {
    #[default]
    AllFunds,
    NonRestrictedFunds,
    #[serde(rename = "none")]
    Ineligible,
}

/// Annual premiums
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Premiums {
    pub employee: Amount,
    #[serde(default)]
    pub employer: Option<Amount>,
}

/// When the deductible is drawn relative to copay and coinsurance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeductibleTiming {
    #[serde(rename = "none")]
    NotApplied,
    BeforeCopay,
    AfterCopay,
    BeforeCoinsurance,
}

impl DeductibleTiming {
    pub fn applies(&self) -> bool {
        !matches!(self, DeductibleTiming::NotApplied)
    }
}

/// One tier of cost-sharing rules for a service under a plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageEntry {
    /// Unset draws the deductible after the copay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deductible: Option<DeductibleTiming>,

    #[serde(default)]
    pub copay: Option<f64>,

    #[serde(default, rename = "copayNotTowardsOOPMax")]
    pub copay_not_towards_oop_max: bool,

    #[serde(default)]
    pub coinsurance: Option<f64>,

    #[serde(default)]
    pub coinsurance_min_dollar: Option<f64>,

    #[serde(default)]
    pub coinsurance_max_dollar: Option<f64>,

    #[serde(default, rename = "coinsuranceNotTowardsOOPMax")]
    pub coinsurance_not_towards_oop_max: bool,

    /// Cap on the member's total charges for one use
    #[serde(default)]
    pub single_use_cost_max: Option<f64>,

    #[serde(default)]
    pub combined_limit_id: Option<String>,

    #[serde(default)]
    pub not_covered: bool,

    #[serde(default)]
    pub covered_count: Option<f64>,

    #[serde(default)]
    pub dollar_limit: Option<f64>,

    #[serde(default)]
    pub additional_premium: Option<f64>,
}

impl CoverageEntry {
    pub fn deductible_timing(&self) -> DeductibleTiming {
        self.deductible.unwrap_or(DeductibleTiming::AfterCopay)
    }

    /// Units of `available` this tier covers at `unit_cost`
    pub fn covered_count(&self, available: f64, unit_cost: f64) -> f64 {
        if self.not_covered {
            return 0.0;
        }
        let mut covered = available;
        if let Some(count) = self.covered_count {
            covered = covered.min(count.max(0.0));
        }
        if let Some(limit) = self.dollar_limit {
            if unit_cost > 0.0 {
                covered = covered.min((limit / unit_cost).max(0.0));
            }
        }
        covered
    }

    /// Whether this tier caps the units or dollars it covers
    pub fn caps_coverage(&self) -> bool {
        self.covered_count.is_some() || self.dollar_limit.is_some()
    }
}

/// Coverage for a service as written: one entry or an ordered list of tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coverage {
    Tiers(Vec<CoverageEntry>),
    Single(CoverageEntry),
}

impl Coverage {
    /// Normalize to an ordered list of tiers
    pub fn tiers(&self) -> Vec<CoverageEntry> {
        match self {
            Coverage::Single(entry) => vec![entry.clone()],
            Coverage::Tiers(entries) => entries.clone(),
        }
    }
}

/// A candidate plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Regions offering this plan (empty = every region)
    #[serde(default)]
    pub regions: Vec<String>,

    #[serde(default)]
    pub account_type: Option<AccountType>,

    #[serde(default)]
    pub deductibles: Vec<QuotaGroup>,

    #[serde(default)]
    pub out_of_pocket_maximums: Vec<QuotaGroup>,

    #[serde(default)]
    pub combined_limits: Vec<CombinedLimit>,

    #[serde(default)]
    pub funds: Option<PlanFunds>,

    /// Fund eligibility per category id (absent = all funds)
    #[serde(default)]
    pub fund_eligibility: BTreeMap<String, FundEligibility>,

    pub premiums: Premiums,

    /// Coverage per service id
    pub coverages: BTreeMap<String, Coverage>,
}

impl Plan {
    pub fn is_offered_in(&self, region: &str) -> bool {
        self.regions.is_empty() || self.regions.iter().any(|r| r == region)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
