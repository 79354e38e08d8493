//! Deck parser: turns deck text into a [`Deck`].
//!
//! Input is consumed line by line from a stack of open files (the root deck
//! plus nested `INCLUDE`s). Between keywords every non-empty line must be a
//! keyword heading; inside a keyword, lines are gathered into
//! slash-terminated records and scanned against the keyword's schema.
//! Recoverable anomalies go through the [`ParseContext`].

use crate::deck::{Deck, DeckKeyword, Location, Section};
use crate::error::DeckError;
use crate::item::parse_record;
use crate::lexer::{clean_source, del_after_slash, make_deck_name, valid_deck_name, RawRecord, SourceLine};
use crate::messages::MessageContainer;
use crate::parse_context::ParseContext;
use crate::schema::{KeywordDictionary, KeywordSize, ParserKeyword, MAX_KEYWORD_LENGTH};
use crate::source::{FileSystemProvider, SourceProvider};
use crate::value::DeckValue;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Display name used for text parsed with [`Parser::parse_string`].
pub const STRING_INPUT: &str = "<string>";

pub struct Parser {
    dictionary: KeywordDictionary,
}

impl Parser {
    pub fn new(dictionary: KeywordDictionary) -> Self {
        Parser { dictionary }
    }

    /// Parser over the embedded keyword dictionary.
    pub fn with_builtin() -> Result<Self, DeckError> {
        Ok(Parser::new(KeywordDictionary::builtin()?))
    }

    pub fn dictionary(&self) -> &KeywordDictionary {
        &self.dictionary
    }

    /// Parse deck text. `INCLUDE` paths resolve against the current
    /// directory.
    pub fn parse_string(
        &self,
        text: &str,
        context: &ParseContext,
        messages: &mut MessageContainer,
    ) -> Result<Deck, DeckError> {
        let state = ParserState::new(
            self,
            context,
            messages,
            &FileSystemProvider,
            PathBuf::from("."),
            None,
        );
        state.run(STRING_INPUT, None, text)
    }

    pub fn parse_file(
        &self,
        path: &Path,
        context: &ParseContext,
        messages: &mut MessageContainer,
    ) -> Result<Deck, DeckError> {
        self.parse_with_provider(path, &FileSystemProvider, context, messages)
    }

    /// Parse the deck rooted at `root`, reading every file through
    /// `provider`.
    pub fn parse_with_provider(
        &self,
        root: &Path,
        provider: &dyn SourceProvider,
        context: &ParseContext,
        messages: &mut MessageContainer,
    ) -> Result<Deck, DeckError> {
        let text = provider.read_source(root).map_err(|e| DeckError::Io {
            path: root.display().to_string(),
            message: e.to_string(),
        })?;
        let root_dir = root.parent().map(Path::to_path_buf).unwrap_or_default();
        let state = ParserState::new(
            self,
            context,
            messages,
            provider,
            root_dir,
            Some(root.to_path_buf()),
        );
        state.run(
            &root.display().to_string(),
            provider.canonicalize(root).ok(),
            &text,
        )
    }
}

// ──────────────────────────────────────────────
// Parser state
// ──────────────────────────────────────────────

struct InputFile {
    name: String,
    canonical: Option<PathBuf>,
    lines: Vec<SourceLine>,
    pos: usize,
}

enum RecordRead {
    /// A slash-terminated record; `lone` when the line was just `/`.
    Record { record: RawRecord, lone: bool },
    /// The next line is a keyword heading.
    NextKeyword,
    /// The current file ended; carries an unterminated record, if any.
    EndOfInput(Option<RawRecord>),
}

enum Flow {
    Continue,
    Stop,
}

struct ParserState<'a> {
    parser: &'a Parser,
    context: &'a ParseContext,
    messages: &'a mut MessageContainer,
    provider: &'a dyn SourceProvider,
    root_dir: PathBuf,
    inputs: Vec<InputFile>,
    aliases: HashMap<String, String>,
    deck: Deck,
    section: Section,
    skipping_unknown: bool,
    last_sized_by_other: bool,
}

impl<'a> ParserState<'a> {
    fn new(
        parser: &'a Parser,
        context: &'a ParseContext,
        messages: &'a mut MessageContainer,
        provider: &'a dyn SourceProvider,
        root_dir: PathBuf,
        data_file: Option<PathBuf>,
    ) -> Self {
        ParserState {
            parser,
            context,
            messages,
            provider,
            root_dir,
            inputs: Vec::new(),
            aliases: HashMap::new(),
            deck: Deck::new(data_file),
            section: Section::Runspec,
            skipping_unknown: false,
            last_sized_by_other: false,
        }
    }

    fn run(mut self, name: &str, canonical: Option<PathBuf>, text: &str) -> Result<Deck, DeckError> {
        self.inputs.push(InputFile {
            name: name.to_owned(),
            canonical,
            lines: clean_source(text),
            pos: 0,
        });

        loop {
            let line = match self.next_line() {
                Some(line) => line,
                None if self.inputs.len() > 1 => {
                    if let Some(done) = self.inputs.pop() {
                        tracing::info!(file = %done.name, "leaving include file");
                    }
                    continue;
                }
                None => break,
            };
            if line.text.is_empty() {
                continue;
            }
            if let Flow::Stop = self.handle_line(line)? {
                break;
            }
        }

        self.messages.check_delayed()?;
        Ok(self.deck)
    }

    fn file_name(&self) -> String {
        self.inputs
            .last()
            .map(|f| f.name.clone())
            .unwrap_or_default()
    }

    fn next_line(&mut self) -> Option<SourceLine> {
        let input = self.inputs.last_mut()?;
        let line = input.lines.get(input.pos)?.clone();
        input.pos += 1;
        Some(line)
    }

    fn unread_line(&mut self) {
        if let Some(input) = self.inputs.last_mut() {
            input.pos = input.pos.saturating_sub(1);
        }
    }

    /// Canonical dictionary name for a heading word, if it names a known
    /// keyword directly or through its first eight characters.
    fn recognize(&self, name: &str) -> Option<String> {
        if self.parser.dictionary.contains(name) {
            return Some(name.to_owned());
        }
        if name.len() > MAX_KEYWORD_LENGTH {
            let short = &name[..MAX_KEYWORD_LENGTH];
            if self.parser.dictionary.contains(short) {
                return Some(short.to_owned());
            }
        }
        None
    }

    fn is_keyword_line(&self, text: &str) -> bool {
        let name = make_deck_name(text);
        valid_deck_name(&name) && self.recognize(&name).is_some()
    }

    fn handle_line(&mut self, line: SourceLine) -> Result<Flow, DeckError> {
        let name = make_deck_name(&line.text);
        let location = Location::new(name.clone(), self.file_name(), line.line);

        if !valid_deck_name(&name) {
            if !self.skipping_unknown {
                self.handle_random_text(&line, &location)?;
            }
            return Ok(Flow::Continue);
        }

        let keyword = match self.recognize(&name) {
            Some(keyword) => keyword,
            None => {
                if !self.skipping_unknown && !self.context.is_keyword_ignored(&name) {
                    self.context.handle_error(
                        ParseContext::PARSE_UNKNOWN_KEYWORD,
                        &format!("unknown keyword {}", name),
                        Some(&location),
                        self.messages,
                    )?;
                }
                self.skipping_unknown = true;
                return Ok(Flow::Continue);
            }
        };
        self.skipping_unknown = false;

        if keyword != name {
            self.context.handle_error(
                ParseContext::PARSE_LONG_KEYWORD,
                &format!(
                    "keyword {} is longer than {} characters, read as {}",
                    name, MAX_KEYWORD_LENGTH, keyword
                ),
                Some(&location),
                self.messages,
            )?;
        }

        let location = Location::new(keyword.clone(), location.file, location.line);
        let parser = self.parser;
        let schema = match parser.dictionary.get(&keyword) {
            Some(schema) => schema,
            None => return Ok(Flow::Continue),
        };
        self.handle_keyword(schema, location)
    }

    fn handle_random_text(&mut self, line: &SourceLine, location: &Location) -> Result<(), DeckError> {
        let (key, message) = if line.text == "/" {
            (ParseContext::PARSE_RANDOM_SLASH, "extra '/' between keywords".to_owned())
        } else if self.last_sized_by_other {
            (
                ParseContext::PARSE_EXTRA_RECORDS,
                format!("too many records for the preceding keyword: '{}'", line.text),
            )
        } else {
            (
                ParseContext::PARSE_RANDOM_TEXT,
                format!("unrecognized text between keywords: '{}'", line.text),
            )
        };
        let location = Location::new("", location.file.clone(), location.line);
        self.context
            .handle_error(key, &message, Some(&location), self.messages)
    }

    fn handle_keyword(&mut self, schema: &ParserKeyword, location: Location) -> Result<Flow, DeckError> {
        let name = schema.name.as_str();
        match name {
            "END" => {
                tracing::debug!(file = %location.file, line = location.line, "END keyword, stopping");
                return Ok(Flow::Stop);
            }
            "ENDINC" => {
                if self.inputs.len() > 1 {
                    if let Some(input) = self.inputs.last_mut() {
                        input.pos = input.lines.len();
                    }
                }
                return Ok(Flow::Continue);
            }
            _ => {}
        }

        if let Some(section) = Section::from_keyword(name) {
            self.section = section;
        }
        if !schema.valid_in(self.section) {
            tracing::debug!(keyword = name, section = %self.section, "keyword outside its sections");
        }

        let raw_records = self.read_records(schema, &location)?;
        self.last_sized_by_other = matches!(schema.size, KeywordSize::OtherKeyword { .. });

        let keyword = if raw_records.len() == 1 && raw_records[0].is_reset_marker() {
            DeckKeyword::reset_marker(location, self.section)
        } else {
            let mut keyword = DeckKeyword::new(location, self.section);
            for (i, raw) in raw_records.into_iter().enumerate() {
                let record = parse_record(
                    schema.record_schema(i),
                    raw,
                    &keyword.location,
                    self.context,
                    self.messages,
                )?;
                keyword.records.push(record);
            }
            keyword
        };

        match name {
            "INCLUDE" => self.handle_include(&keyword)?,
            "PATHS" => self.handle_paths(&keyword)?,
            _ => {
                tracing::debug!(
                    index = self.deck.len(),
                    keyword = name,
                    file = %keyword.location.file,
                    line = keyword.location.line,
                    "read keyword"
                );
                self.deck.add_keyword(keyword);
            }
        }
        Ok(Flow::Continue)
    }

    // ──────────────────────────────────────────────
    // Records
    // ──────────────────────────────────────────────

    fn read_records(&mut self, schema: &ParserKeyword, location: &Location) -> Result<Vec<RawRecord>, DeckError> {
        let mut records = Vec::new();
        match &schema.size {
            KeywordSize::Fixed(count) => self.read_counted(*count, location, &mut records)?,
            KeywordSize::OtherKeyword { keyword, item, shift } => {
                let count = self.size_from_keyword(keyword, item, *shift, location)?;
                self.read_counted(count, location, &mut records)?
            }
            KeywordSize::SlashTerminated => loop {
                match self.read_raw_record(location)? {
                    RecordRead::Record { lone: true, .. } => break,
                    RecordRead::Record { record, .. } => records.push(record),
                    RecordRead::NextKeyword | RecordRead::EndOfInput(None) => {
                        tracing::warn!(
                            keyword = %location.keyword,
                            location = %location,
                            "keyword ended without terminating '/'"
                        );
                        break;
                    }
                    RecordRead::EndOfInput(Some(_)) => return Err(unterminated(location)),
                }
            },
            KeywordSize::Unknown => loop {
                match self.read_raw_record(location)? {
                    RecordRead::Record { record, .. } => records.push(record),
                    RecordRead::NextKeyword | RecordRead::EndOfInput(None) => break,
                    RecordRead::EndOfInput(Some(partial)) => {
                        records.push(partial);
                        break;
                    }
                }
            },
        }
        Ok(records)
    }

    fn read_counted(&mut self, count: usize, location: &Location, records: &mut Vec<RawRecord>) -> Result<(), DeckError> {
        while records.len() < count {
            match self.read_raw_record(location)? {
                RecordRead::Record { record, .. } => records.push(record),
                RecordRead::NextKeyword | RecordRead::EndOfInput(_) => {
                    return Err(DeckError::lexical(
                        location,
                        format!(
                            "keyword {} expects {} record(s), found {}",
                            location.keyword,
                            count,
                            records.len()
                        ),
                    ))
                }
            }
        }
        Ok(())
    }

    /// Accumulate lines until an unquoted `/`.
    fn read_raw_record(&mut self, location: &Location) -> Result<RecordRead, DeckError> {
        let mut buffer = String::new();
        loop {
            let Some(line) = self.next_line() else {
                if buffer.trim().is_empty() {
                    return Ok(RecordRead::EndOfInput(None));
                }
                let record = RawRecord::parse(&buffer).map_err(|m| DeckError::lexical(location, m))?;
                return Ok(RecordRead::EndOfInput(Some(record)));
            };
            if line.text.is_empty() {
                continue;
            }
            if buffer.trim().is_empty() && self.is_keyword_line(&line.text) {
                self.unread_line();
                return Ok(RecordRead::NextKeyword);
            }

            let line_location = Location::new(location.keyword.clone(), location.file.clone(), line.line);
            let (kept, terminated) = del_after_slash(&line.text);
            if terminated {
                let body = &kept[..kept.len() - 1];
                let lone = buffer.trim().is_empty() && body.trim().is_empty();
                buffer.push(' ');
                buffer.push_str(body);
                let record = RawRecord::parse(&buffer).map_err(|m| DeckError::lexical(&line_location, m))?;
                return Ok(RecordRead::Record { record, lone });
            }
            buffer.push(' ');
            buffer.push_str(kept);
        }
    }

    /// Record count for a keyword sized by an item of another keyword.
    fn size_from_keyword(&mut self, keyword: &str, item: &str, shift: i64, location: &Location) -> Result<usize, DeckError> {
        let from_deck = match self.deck.last(keyword) {
            Some(kw) => {
                let value = kw.record(0)?.get(item)?;
                Some(value.get_int(0)?)
            }
            None => None,
        };
        let base = match from_deck {
            Some(n) => n,
            None => {
                self.context.handle_error(
                    ParseContext::PARSE_MISSING_DIMS_KEYWORD,
                    &format!(
                        "keyword {} needs {} to size itself, using the default of {}",
                        location.keyword, keyword, item
                    ),
                    Some(location),
                    self.messages,
                )?;
                self.parser
                    .dictionary
                    .get(keyword)
                    .and_then(|kw| kw.record_schema(0).iter().find(|i| i.name == item))
                    .and_then(|i| match &i.default {
                        Some(DeckValue::Int(n)) => Some(*n),
                        _ => None,
                    })
                    .unwrap_or(0)
            }
        };
        match base.checked_add(shift) {
            Some(count) => Ok(usize::try_from(count).unwrap_or(0)),
            None => {
                self.context.handle_error(
                    ParseContext::PARSE_MISSING_DIMS_KEYWORD,
                    &format!(
                        "keyword {}: record count {} from {} overflows",
                        location.keyword, base, keyword
                    ),
                    Some(location),
                    self.messages,
                )?;
                Ok(0)
            }
        }
    }

    // ──────────────────────────────────────────────
    // INCLUDE and PATHS
    // ──────────────────────────────────────────────

    fn handle_paths(&mut self, keyword: &DeckKeyword) -> Result<(), DeckError> {
        for record in keyword.iter() {
            let name = record.get("PathName")?.get_trimmed_string(0)?;
            let value = record.get("PathValue")?.get_trimmed_string(0)?;
            self.aliases.insert(name, value);
        }
        Ok(())
    }

    fn expand_aliases(&self, path: &str) -> String {
        let mut out = String::new();
        let mut rest = path;
        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let end = after.find('/').unwrap_or(after.len());
            let alias = &after[..end];
            match self.aliases.get(alias) {
                Some(value) => out.push_str(value),
                None => {
                    out.push('$');
                    out.push_str(alias);
                }
            }
            rest = &after[end..];
        }
        out.push_str(rest);
        out
    }

    fn handle_include(&mut self, keyword: &DeckKeyword) -> Result<(), DeckError> {
        let location = &keyword.location;
        let raw_path = keyword.record(0)?.get("IncludeFile")?.get_trimmed_string(0)?;
        let mut include = self.expand_aliases(&raw_path);
        if include.contains('\\') {
            tracing::warn!(path = %include, location = %location, "backslashes in include path replaced with '/'");
            include = include.replace('\\', "/");
        }

        let path = self.provider.resolve_include(&self.root_dir, &include);
        let text = match self.provider.read_source(&path) {
            Ok(text) => text,
            Err(e) => {
                return self.context.handle_error(
                    ParseContext::PARSE_MISSING_INCLUDE,
                    &format!("include file {} not readable: {}", path.display(), e),
                    Some(location),
                    self.messages,
                );
            }
        };

        let canonical = self.provider.canonicalize(&path).ok();
        if canonical.is_some() && self.inputs.iter().any(|f| f.canonical == canonical) {
            return Err(DeckError::lexical(
                location,
                format!("include cycle through {}", path.display()),
            ));
        }

        tracing::info!(file = %path.display(), "entering include file");
        self.inputs.push(InputFile {
            name: path.display().to_string(),
            canonical,
            lines: clean_source(&text),
            pos: 0,
        });
        Ok(())
    }
}

fn unterminated(location: &Location) -> DeckError {
    DeckError::lexical(
        location,
        format!("record of keyword {} is not terminated by '/'", location.keyword),
    )
}
