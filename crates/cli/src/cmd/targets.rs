//! Implementation of the `pbxgen targets` command.

use anyhow::{Context, Result};

use pbxgen_lib::reader::{PbxprojReader, ProjectReader};

use crate::output::{format_count, print_info, print_json, symbols};

pub fn cmd_targets(project: &str, json: bool) -> Result<()> {
  let foreign = PbxprojReader::new()
    .read_project(project)
    .with_context(|| format!("Failed to read project: {}", project))?;

  if json {
    return print_json(&foreign.targets);
  }

  print_info(&format!("{}: {}", project, format_count(foreign.targets.len(), "target")));
  for target in &foreign.targets {
    let name = target.name.as_deref().unwrap_or("<unnamed>");
    let product = target.product_path();
    let product_type = target.product_type.as_deref().unwrap_or("aggregate");
    println!("  {} {} {} {} ({})", symbols::INFO, name, symbols::ARROW, product, product_type);
  }
  Ok(())
}
