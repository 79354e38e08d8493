pub(crate) mod keywords;
pub(crate) mod parse;
pub(crate) mod schedule;

use std::path::Path;
use std::process;

use deckhand_core::{Deck, DeckError, MessageContainer, Parser};

use crate::config::Settings;
use crate::OutputFormat;

/// Print a library error and exit with status 1.
pub(crate) fn fail(e: &DeckError, output: OutputFormat, quiet: bool) -> ! {
    match output {
        OutputFormat::Json => {
            let err_json = serde_json::to_string_pretty(&e.to_json_value())
                .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", e));
            eprintln!("{}", err_json);
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("error: {}", e);
            }
        }
    }
    process::exit(1);
}

/// Warnings and delayed errors go to stderr, one per line.
pub(crate) fn print_messages(messages: &MessageContainer, quiet: bool) {
    if quiet {
        return;
    }
    for message in messages {
        eprintln!("{}", message);
    }
}

/// Parse `file` with the configured dictionary and error policy, exiting
/// on failure.
pub(crate) fn load_deck(
    file: &Path,
    settings: &Settings,
    messages: &mut MessageContainer,
    output: OutputFormat,
    quiet: bool,
) -> Deck {
    let parser = Parser::new(settings.dictionary.clone());
    match parser.parse_file(file, &settings.context, messages) {
        Ok(deck) => deck,
        Err(e) => {
            print_messages(messages, quiet);
            fail(&e, output, quiet);
        }
    }
}
