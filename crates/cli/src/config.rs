//! Layered CLI settings: built-in defaults, `DECKHAND_ERRORS_*` environment
//! variables, a `deckhand.toml` file, then command-line flags.

use std::path::{Path, PathBuf};

use deckhand_core::{Action, KeywordDictionary, ParseContext};
use serde::Deserialize;

const DEFAULT_CONFIG: &str = "deckhand.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigFile {
    #[serde(default)]
    pub errors: ErrorsSection,
    #[serde(default)]
    pub keywords: KeywordsSection,
}

/// Error-key patterns per action, in the syntax of `ParseContext::update`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ErrorsSection {
    #[serde(default)]
    pub throw: Vec<String>,
    #[serde(default)]
    pub warn: Vec<String>,
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub delay: Vec<String>,
    #[serde(default)]
    pub ignore_keywords: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct KeywordsSection {
    /// JSON schema files, relative to the config file.
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

/// Patterns given on the command line.
pub(crate) struct Overrides<'a> {
    pub throw: &'a [String],
    pub warn: &'a [String],
    pub ignore: &'a [String],
}

pub(crate) struct Settings {
    pub context: ParseContext,
    pub dictionary: KeywordDictionary,
}

/// Built-in actions for the command line: everything throws except
/// schedule keywords without a handler, which are skipped.
pub(crate) fn cli_defaults() -> ParseContext {
    let mut context = ParseContext::with_defaults();
    context.update(ParseContext::SCHEDULE_UNHANDLED_KEYWORD, Action::Ignore);
    context
}

impl ConfigFile {
    pub fn parse(text: &str) -> Result<ConfigFile, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    fn apply_errors(&self, context: &mut ParseContext) {
        let errors = &self.errors;
        for (patterns, action) in [
            (&errors.throw, Action::ThrowException),
            (&errors.warn, Action::Warn),
            (&errors.ignore, Action::Ignore),
            (&errors.delay, Action::Delay),
        ] {
            for pattern in patterns {
                context.update(pattern, action);
            }
        }
        for name in &errors.ignore_keywords {
            context.ignore_keyword(name);
        }
    }
}

impl Settings {
    /// Read the explicit config file, or `deckhand.toml` when present.
    pub fn resolve(explicit: Option<&Path>, overrides: &Overrides<'_>) -> Result<Settings, String> {
        let located = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG);
                path.is_file().then_some(path)
            }
        };

        let (file, base) = match located {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .map_err(|e| format!("error reading config '{}': {}", path.display(), e))?;
                let file = ConfigFile::parse(&text)
                    .map_err(|e| format!("error parsing config '{}': {}", path.display(), e))?;
                tracing::debug!(path = %path.display(), "loaded config");
                let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
                (file, base)
            }
            None => (ConfigFile::default(), PathBuf::new()),
        };

        let mut context = cli_defaults();
        context.apply_env_with(|var| std::env::var(var).ok());
        Settings::from_layers(context, &file, &base, overrides)
    }

    /// Apply the config file and then the command-line patterns on top of
    /// `context`, and build the keyword dictionary.
    pub fn from_layers(
        mut context: ParseContext,
        file: &ConfigFile,
        base: &Path,
        overrides: &Overrides<'_>,
    ) -> Result<Settings, String> {
        file.apply_errors(&mut context);
        for (patterns, action) in [
            (overrides.throw, Action::ThrowException),
            (overrides.warn, Action::Warn),
            (overrides.ignore, Action::Ignore),
        ] {
            for pattern in patterns {
                context.update(pattern, action);
            }
        }

        let mut dictionary = KeywordDictionary::builtin().map_err(|e| e.to_string())?;
        for relative in &file.keywords.files {
            let path = base.join(relative);
            let added = dictionary.load_file(&path).map_err(|e| e.to_string())?;
            tracing::info!(path = %path.display(), added, "loaded keyword schemas");
        }

        Ok(Settings {
            context,
            dictionary,
        })
    }
}
