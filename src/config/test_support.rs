//! Shared configuration fixtures for unit tests

use super::data::BenefitsConfig;

/// Two-plan configuration: a copay PPO and an HSA-eligible high deductible plan
pub const SAMPLE_CONFIG_JSON: &str = r#"{
    "regions": [ { "id": "north" }, { "id": "south" } ],
    "statuses": [ { "id": "fullTime" } ],
    "coverageLevels": [
        { "id": "employeeOnly" },
        { "id": "employeeSpouse", "spouseCovered": true },
        { "id": "employeeChildren", "maxChildren": 99 },
        { "id": "family", "spouseCovered": true, "maxChildren": 99 }
    ],
    "categories": [ { "id": "medical" }, { "id": "drug" } ],
    "services": [
        { "id": "officeVisit", "categoryId": "medical", "cost": 150 },
        { "id": "hospitalStay", "categoryId": "medical", "cost": { "byRegion": { "north": 500 }, "default": 600 } },
        { "id": "genericDrug", "categoryId": "drug", "cost": 20 }
    ],
    "plans": [
        {
            "id": "ppo",
            "name": "PPO Copay",
            "deductibles": [
                { "id": "ded", "categories": ["medical"], "person": 200, "family": 400 }
            ],
            "outOfPocketMaximums": [
                { "id": "oop", "categories": ["medical", "drug"], "person": 1000, "family": 2000 }
            ],
            "funds": { "unrestricted": 500 },
            "premiums": {
                "employee": { "byCoverageLevel": { "employeeOnly": 1200 }, "default": 3000 },
                "employer": 6000
            },
            "coverages": {
                "officeVisit": { "deductible": "none", "copay": 25 },
                "hospitalStay": { "deductible": "beforeCopay", "coinsurance": 0.2 },
                "genericDrug": { "deductible": "none", "copay": 10 }
            }
        },
        {
            "id": "hdhp",
            "name": "High Deductible",
            "accountType": "hsa",
            "deductibles": [
                { "id": "ded", "categories": ["medical", "drug"], "person": 1500, "family": 3000 }
            ],
            "outOfPocketMaximums": [
                { "id": "oop", "categories": ["medical", "drug"], "person": 3000, "family": 6000 }
            ],
            "funds": { "unrestricted": 750 },
            "premiums": { "employee": 600, "employer": 5000 },
            "coverages": {
                "officeVisit": { "deductible": "beforeCoinsurance", "coinsurance": 0.1 },
                "hospitalStay": { "deductible": "beforeCoinsurance", "coinsurance": 0.1 },
                "genericDrug": { "deductible": "beforeCoinsurance", "coinsurance": 0.1 }
            }
        }
    ]
}"#;

pub fn sample_config() -> BenefitsConfig {
    serde_json::from_str(SAMPLE_CONFIG_JSON).expect("sample config parses")
}

/// Single-category ("medical") configuration around one plan, for focused tests
pub fn single_category_config(services: serde_json::Value, plan: serde_json::Value) -> BenefitsConfig {
    serde_json::from_value(serde_json::json!({
        "regions": [ { "id": "north" } ],
        "statuses": [ { "id": "fullTime" } ],
        "coverageLevels": [ { "id": "family", "spouseCovered": true, "maxChildren": 99 } ],
        "categories": [ { "id": "medical" } ],
        "services": services,
        "plans": [ plan ]
    }))
    .expect("test config parses")
}

/// Amount key matching `single_category_config`
pub fn test_key() -> super::AmountKey<'static> {
    super::AmountKey {
        region: "north",
        status: "fullTime",
        coverage_level: "family",
    }
}
