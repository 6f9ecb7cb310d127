use serde_json::json;

use depfix_core::{DepfixConfig, DepfixResult};
use depfix_pip::PipClient;

/// Execute the outdated command.
pub async fn execute(config: &DepfixConfig, json_output: bool) -> DepfixResult<i32> {
    let pip = PipClient::new(&config.python);
    let outdated = pip.list_outdated().await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&json!({ "outdated": outdated }))?);
    } else if outdated.is_empty() {
        println!("All packages up to date.");
    } else {
        println!("Outdated packages:");
        for package in &outdated {
            println!("- {} {} -> {}", package.name, package.version, package.latest_version);
        }
    }
    Ok(crate::EXIT_OK)
}
