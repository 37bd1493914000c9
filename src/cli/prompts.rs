//! Interactive prompts using dialoguer

use std::path::Path;

use anyhow::Result;
use dialoguer::Confirm;

/// Prompt user to confirm proceeding with an action
pub fn confirm_step(message: &str) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(message)
        .default(true)
        .interact()?;
    Ok(confirmed)
}

/// Prompt user to confirm replacing existing output files.
/// Returns true without prompting when none of `paths` exist.
pub fn confirm_overwrite(paths: &[&Path]) -> Result<bool> {
    let existing: Vec<&Path> = paths.iter().copied().filter(|p| p.exists()).collect();
    if existing.is_empty() {
        return Ok(true);
    }

    let names: Vec<String> = existing.iter().map(|p| p.display().to_string()).collect();
    let message = format!("Overwrite {}?", names.join(", "));
    confirm_step(&message)
}
