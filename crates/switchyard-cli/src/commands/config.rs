//! `switchyard config`

use crate::console::CliConsole;
use switchyard_core::SwitchyardConfig;

pub fn show(config: &SwitchyardConfig) -> anyhow::Result<()> {
    let console = CliConsole::new(true);
    println!("{}", serde_json::to_string_pretty(config)?);

    console.print_header("Credentials");
    for name in config.providers.keys() {
        match config.api_key(name) {
            Some(_) => console.success(&format!("{}: API key configured", name)),
            None => console.warn(&format!("{}: no API key", name)),
        }
    }
    Ok(())
}
