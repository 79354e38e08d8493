use deckhand_core::{KeywordSize, ParserKeyword};

use crate::config::Settings;
use crate::OutputFormat;

pub(crate) fn cmd_keywords(settings: &Settings, output: OutputFormat) {
    match output {
        OutputFormat::Json => {
            let pretty = serde_json::to_string_pretty(&settings.dictionary)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            for keyword in settings.dictionary.iter() {
                println!(
                    "{:<8}  {:<24}  {}",
                    keyword.name,
                    describe_size(&keyword.size),
                    sections(keyword)
                );
            }
        }
    }
}

fn describe_size(size: &KeywordSize) -> String {
    match size {
        KeywordSize::SlashTerminated => "slash terminated".to_owned(),
        KeywordSize::Fixed(n) => format!("{} record(s)", n),
        KeywordSize::OtherKeyword {
            keyword,
            item,
            shift: 0,
        } => format!("{}.{}", keyword, item),
        KeywordSize::OtherKeyword {
            keyword,
            item,
            shift,
        } => format!("{}.{} {:+}", keyword, item, shift),
        KeywordSize::Unknown => "until next keyword".to_owned(),
    }
}

fn sections(keyword: &ParserKeyword) -> String {
    if keyword.sections.is_empty() {
        return "any section".to_owned();
    }
    keyword
        .sections
        .iter()
        .map(|s| s.name())
        .collect::<Vec<_>>()
        .join(",")
}
