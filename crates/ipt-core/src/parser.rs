use crate::counters::Counters;
use crate::error::{ParseError, ParseErrorKind, SaveError};
use crate::model::{Chain, Rule, Table, Tables};
use crate::rule::tokenize_rule;
use std::io::BufRead;
use tracing::debug;

/// Parse save output that is already in memory.
pub fn parse_lines<I, S>(lines: I) -> Result<Tables, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = SaveParser::new();
    for line in lines {
        parser.handle_line(line.as_ref());
    }
    parser.finish()
}

/// Parse save output line by line from a reader.
///
/// A read error is returned as soon as it happens, regardless of any parse
/// errors collected before it.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<Tables, SaveError> {
    let mut parser = SaveParser::new();
    for line in reader.lines() {
        parser.handle_line(&line?);
    }
    Ok(parser.finish()?)
}

/// Incremental parser for `iptables-save -c` output.
///
/// Errors do not stop the scan: every bad line is recorded and the parser
/// moves on, but [`SaveParser::finish`] only reports the first one.
#[derive(Debug, Default)]
pub struct SaveParser {
    result: Tables,
    current_table: Option<String>,
    table: Table,
    line: usize,
    errors: Vec<ParseError>,
}

impl SaveParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next line of input
    pub fn handle_line(&mut self, line: &str) {
        self.line += 1;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            return;
        }
        if line == "COMMIT" {
            self.flush();
            return;
        }
        if let Some(name) = line.strip_prefix('*') {
            self.flush();
            if !name.is_empty() {
                self.current_table = Some(name.to_string());
            }
            return;
        }
        if line.starts_with(':') {
            self.handle_chain(line);
            return;
        }
        if line.starts_with('[') {
            self.handle_rule(line);
            return;
        }
        self.push_error(ParseErrorKind::Unhandled, line);
    }

    /// Every error seen so far, in line order
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Number of lines consumed so far
    pub fn lines_read(&self) -> usize {
        self.line
    }

    /// Commit any open table and return the result, or the first error.
    pub fn finish(mut self) -> Result<Tables, ParseError> {
        self.flush();
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.result),
        }
    }

    // Without an active table this is a no-op; chains seen so far carry
    // over into the next table.
    fn flush(&mut self) {
        if let Some(name) = self.current_table.take() {
            let table = std::mem::take(&mut self.table);
            self.result.insert(name, table);
        }
    }

    fn handle_chain(&mut self, line: &str) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let &[name, policy, counters] = fields.as_slice() else {
            self.push_error(ParseErrorKind::FieldCount, line);
            return;
        };

        let name = name.strip_prefix(':').unwrap_or(name);
        if name.is_empty() {
            self.push_error(ParseErrorKind::Unhandled, line);
            return;
        }

        let Some(Counters { packets, bytes }) = Counters::parse(counters) else {
            self.push_error(ParseErrorKind::Counters, line);
            return;
        };

        self.table
            .insert(name.to_string(), Chain::new(policy, packets, bytes));
    }

    fn handle_rule(&mut self, line: &str) {
        let parsed = tokenize_rule(line);
        let Some(counters) = parsed.counters else {
            self.push_error(ParseErrorKind::Counters, line);
            return;
        };
        let Some(chain) = parsed.chain.as_deref() else {
            self.push_error(ParseErrorKind::MissingChain, line);
            return;
        };

        // Rules may reference a chain that was never declared.
        let rule = Rule::new(counters.packets, counters.bytes, &parsed.rule_text());
        self.table
            .entry(chain.to_string())
            .or_default()
            .rules
            .push(rule);
    }

    fn push_error(&mut self, kind: ParseErrorKind, line: &str) {
        let err = ParseError::new(kind, self.line, line);
        debug!(line = err.line, "{}", err);
        self.errors.push(err);
    }
}
