/// One executable unit of a Cypher script.
///
/// Statements come out of the line-oriented splitter or the explicit
/// constructor for in-memory lists; raw strings are never handed to
/// execution directly, so nothing can bypass the splitting rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    text: String,
    line: usize,
}

impl Statement {
    /// Build a statement from already-split text. `line` is the 1-based
    /// source line where it starts (or the ordinal position for in-memory
    /// lists).
    pub fn new(text: impl Into<String>, line: usize) -> Self {
        Self {
            text: text.into(),
            line,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line(&self) -> usize {
        self.line
    }

    /// Truncated copy for error messages and logs.
    pub fn preview(&self, max_chars: usize) -> String {
        truncate_chars(&self.text, max_chars)
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Truncate to `max_chars` characters, appending `...` when cut.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars).collect();
        out.push_str("...");
        out
    }
}

/// Line-oriented splitter state: feed raw lines in, collect statements out.
///
/// Rules: lines blank after trimming and lines starting with `//` or `#`
/// are skipped; trimmed lines accumulate until one ends with `;`, which
/// closes the statement; a non-empty remainder at end of input is a
/// statement of its own. The trailing `;` is not part of the statement
/// text, since the driver runs one statement per call.
#[derive(Debug, Default)]
pub struct StatementAccumulator {
    parts: Vec<String>,
    lines_seen: usize,
    start_line: usize,
}

impl StatementAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one raw input line; returns a statement when the line
    /// completes one.
    pub fn push_line(&mut self, raw: &str) -> Option<Statement> {
        self.lines_seen += 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
            return None;
        }
        if self.parts.is_empty() {
            self.start_line = self.lines_seen;
        }
        self.parts.push(line.to_string());
        if line.ends_with(';') { self.take() } else { None }
    }

    /// Flush the pending fragment at end of input, if any.
    pub fn finish(&mut self) -> Option<Statement> {
        if self.parts.is_empty() {
            None
        } else {
            self.take()
        }
    }

    fn take(&mut self) -> Option<Statement> {
        let mut text = self.parts.join(" ");
        self.parts.clear();
        if text.ends_with(';') {
            text.pop();
        }
        let text = text.trim_end();
        if text.is_empty() {
            return None;
        }
        Some(Statement::new(text, self.start_line))
    }
}

/// Split a whole script into statements.
///
/// The streaming reader applies the same accumulator one line at a time;
/// both paths must stay in lockstep.
pub fn split_script(content: &str) -> Vec<Statement> {
    let mut accumulator = StatementAccumulator::new();
    let mut statements = Vec::new();
    for line in content.lines() {
        if let Some(statement) = accumulator.push_line(line) {
            statements.push(statement);
        }
    }
    if let Some(rest) = accumulator.finish() {
        statements.push(rest);
    }
    statements
}

/// Turn an in-memory command list into statements, one per element.
///
/// Elements that are blank or pure comments are skipped; a trailing `;`
/// is stripped the same way the splitter strips it. `line` is the 1-based
/// position in the input list.
pub fn statements_from_commands(commands: &[String]) -> Vec<Statement> {
    commands
        .iter()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with('#') {
                return None;
            }
            let text = trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end();
            if text.is_empty() {
                return None;
            }
            Some(Statement::new(text, idx + 1))
        })
        .collect()
}
