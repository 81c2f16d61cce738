//! Load a validated benefits configuration from JSON

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::Result;

use super::data::BenefitsConfig;

/// Load a configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BenefitsConfig> {
    let file = File::open(path.as_ref())?;
    let config = load_config_from_reader(BufReader::new(file))?;
    log::info!(
        "Loaded configuration from {}: {} plans, {} services",
        path.as_ref().display(),
        config.plans.len(),
        config.services.len()
    );
    Ok(config)
}

/// Load a configuration from any reader (e.g., string buffer, network stream)
pub fn load_config_from_reader<R: std::io::Read>(reader: R) -> Result<BenefitsConfig> {
    Ok(serde_json::from_reader(reader)?)
}
