//! Show the operator descriptor and parameter declarations

use anyhow::{Context as _, Result};
use clap::Args;
use frame_inference_core::{
    operator_descriptor, parameter_definitions, GeneralInfo, ParameterSet,
};
use std::path::PathBuf;

#[derive(Args)]
pub struct ParamsCommand {
    /// Write a YAML file with default parameter values instead of printing
    #[arg(long, value_name = "FILE")]
    write: Option<PathBuf>,
}

impl ParamsCommand {
    pub fn execute(self) -> Result<()> {
        if let Some(path) = &self.write {
            let yaml = ParameterSet::default().to_yaml()?;
            std::fs::write(path, yaml)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote default parameters to {}", path.display());
            return Ok(());
        }

        let summary = serde_json::json!({
            "operator": operator_descriptor(),
            "general_info": GeneralInfo::default(),
            "parameters": parameter_definitions(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        Ok(())
    }
}
