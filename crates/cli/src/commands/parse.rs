use std::path::Path;

use deckhand_core::MessageContainer;

use super::{load_deck, print_messages};
use crate::config::Settings;
use crate::OutputFormat;

pub(crate) fn cmd_parse(file: &Path, settings: &Settings, output: OutputFormat, quiet: bool) {
    let mut messages = MessageContainer::new();
    let deck = load_deck(file, settings, &mut messages, output, quiet);
    print_messages(&messages, quiet);

    match output {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "deck": deck,
                "messages": messages,
            });
            let pretty = serde_json::to_string_pretty(&json)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            for (index, keyword) in deck.keywords().iter().enumerate() {
                println!(
                    "{:>4}  {:<8}  {:>3}  {}",
                    index,
                    keyword.name,
                    keyword.len(),
                    keyword.location
                );
            }
            if !quiet {
                println!();
                println!(
                    "{} keyword(s), {} warning(s)",
                    deck.len(),
                    messages.warnings().count()
                );
            }
        }
    }
}
