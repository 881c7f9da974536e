//! `switchyard chain <intent>`

use crate::console::CliConsole;
use colored::*;
use switchyard_core::{Intent, Ladder};

pub fn show(label: &str, verbose: bool) -> anyhow::Result<()> {
    let console = CliConsole::new(verbose);
    let ladder = Ladder::default();
    let intent = Intent::parse(label);

    console.print_header(&format!("Fallback ladder: {}", intent));
    if intent == Intent::Ambiguous && !label.trim().eq_ignore_ascii_case("ambiguous") {
        console.warn(&format!("'{}' is not a known intent, using the ambiguous chain", label));
    }

    for (index, entry) in ladder.chain_for(intent).iter().enumerate() {
        println!(
            "  {}. {} {} {}",
            index + 1,
            entry.provider.magenta().bold(),
            entry.model.green(),
            format!("({})", entry.reason).dimmed()
        );
    }

    console.info(&format!(
        "known intents: {}",
        Intent::ALL.map(|i| i.as_str()).join(", ")
    ));
    Ok(())
}
