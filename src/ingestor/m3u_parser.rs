//! Extended M3U playlist parser
//!
//! Parsing is a single-state machine over trimmed lines. The only state is the
//! pending channel name taken from the last `#EXTINF` line:
//!
//! | state            | line                    | next state       | output         |
//! |------------------|-------------------------|------------------|----------------|
//! | any              | `#EXTINF...,<title>`    | `HasPendingName` | -              |
//! | any              | `#EXTINF` without title | `NoPendingName`  | -              |
//! | `HasPendingName` | url line                | `NoPendingName`  | `(name, url)`  |
//! | `NoPendingName`  | url line                | `NoPendingName`  | - (dropped)    |
//! | any              | blank / other `#` line  | unchanged        | -              |
//!
//! A second `#EXTINF` line before any URL replaces the pending name, so a URL
//! is only ever paired with the metadata line directly preceding it.

pub const EXTM3U_HEADER: &str = "#EXTM3U";
pub const EXTINF_MARKER: &str = "#EXTINF";

const UTF8_BOM: char = '\u{feff}';

/// A `(name, url)` pair produced by the parser, not yet validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParserState {
    #[default]
    NoPendingName,
    HasPendingName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind<'a> {
    /// `#EXTINF` line, with its title when the line carries one
    Metadata(Option<&'a str>),
    Url(&'a str),
    Ignored,
}

fn classify(line: &str) -> LineKind<'_> {
    if line.starts_with(EXTINF_MARKER) {
        LineKind::Metadata(extract_title(line))
    } else if line.is_empty() || line.starts_with('#') {
        LineKind::Ignored
    } else {
        LineKind::Url(line)
    }
}

/// Title of an `#EXTINF` line: the text after the first comma that is not
/// inside a double-quoted attribute value, trimmed
///
/// Returns `None` when there is no comma or nothing follows it. A title made
/// only of whitespace comes back as `Some("")` and is rejected later by
/// validation, which still consumes the URL line that follows.
pub fn extract_title(line: &str) -> Option<&str> {
    let mut in_quotes = false;
    let mut split_at = None;

    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                split_at = Some(index);
                break;
            }
            _ => {}
        }
    }

    // An unbalanced quote swallows every comma; fall back to the first one
    let comma = split_at.or_else(|| line.find(','))?;
    let rest = &line[comma + 1..];
    if rest.is_empty() {
        None
    } else {
        Some(rest.trim())
    }
}

/// Apply one line to the parser state
pub fn transition(state: ParserState, line: &str) -> (ParserState, Option<Candidate>) {
    match (classify(line.trim()), state) {
        (LineKind::Metadata(Some(title)), _) => {
            (ParserState::HasPendingName(title.to_string()), None)
        }
        (LineKind::Metadata(None), _) => (ParserState::NoPendingName, None),
        (LineKind::Url(url), ParserState::HasPendingName(name)) => (
            ParserState::NoPendingName,
            Some(Candidate {
                name,
                url: url.to_string(),
            }),
        ),
        (LineKind::Url(_), ParserState::NoPendingName) => (ParserState::NoPendingName, None),
        (LineKind::Ignored, state) => (state, None),
    }
}

/// Parser over a complete playlist body
///
/// The body is borrowed; `candidates()` can be called any number of times and
/// each call starts again from the first line.
#[derive(Debug, Clone, Copy)]
pub struct M3uParser<'a> {
    content: &'a str,
}

impl<'a> M3uParser<'a> {
    pub fn new(content: &'a str) -> Self {
        Self { content }
    }

    pub fn candidates(&self) -> Candidates<'a> {
        let content = self.content.strip_prefix(UTF8_BOM).unwrap_or(self.content);
        Candidates {
            lines: content.lines(),
            state: ParserState::default(),
        }
    }

    /// Whether the body starts with the `#EXTM3U` header
    pub fn has_header(&self) -> bool {
        self.content
            .trim_start_matches(UTF8_BOM)
            .trim_start()
            .starts_with(EXTM3U_HEADER)
    }
}

/// Lazy candidate sequence, one line at a time
#[derive(Debug, Clone)]
pub struct Candidates<'a> {
    lines: std::str::Lines<'a>,
    state: ParserState,
}

impl Iterator for Candidates<'_> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            let (next, candidate) = transition(std::mem::take(&mut self.state), line);
            self.state = next;
            if candidate.is_some() {
                return candidate;
            }
        }
        None
    }
}

/// Parse a playlist body into its candidate sequence
pub fn parse(content: &str) -> Candidates<'_> {
    M3uParser::new(content).candidates()
}
