//! Load household utilization from CSV and funding inputs from JSON
//!
//! Utilization CSV columns: `Member,Role,Service,Count`. Rows are grouped by
//! the `Member` label in first-seen order; a row with an empty `Service` just
//! declares the member.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use csv::Reader;

use crate::error::{EngineError, Result};

use super::data::{Household, Member, PlanFunding, Role};

/// Raw CSV row
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "Member")]
    member: String,
    #[serde(rename = "Role")]
    role: String,
    #[serde(rename = "Service", default)]
    service: String,
    #[serde(rename = "Count", default)]
    count: Option<f64>,
}

/// Load a household from a utilization CSV file
pub fn load_household<P: AsRef<Path>>(path: P) -> Result<Household> {
    let file = File::open(path)?;
    load_household_from_reader(file)
}

/// Load a household from any reader
pub fn load_household_from_reader<R: std::io::Read>(reader: R) -> Result<Household> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut labels: Vec<String> = Vec::new();
    let mut members: Vec<Member> = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        let role = Role::parse(&row.role).ok_or_else(|| EngineError::InvalidRole(row.role.clone()))?;

        let idx = match labels.iter().position(|l| *l == row.member) {
            Some(idx) => idx,
            None => {
                labels.push(row.member.clone());
                members.push(Member::new(role));
                members.len() - 1
            }
        };

        let service = row.service.trim();
        if !service.is_empty() {
            let count = row.count.unwrap_or(0.0);
            *members[idx].utilization.entry(service.to_string()).or_insert(0.0) += count;
        }
    }

    Ok(Household::new(members))
}

/// Load per-plan funding inputs (`{"planId": {"rollover": .., "voluntary": .., "match": ..}}`)
pub fn load_funding<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, PlanFunding>> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
