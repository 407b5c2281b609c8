use std::path::Path;

use tracing::debug;

use cypherload_core::constants::{IN_MEMORY_PATH, STATEMENT_PREVIEW_CHARS};
use cypherload_core::results::ValidationResult;
use cypherload_core::statement::{Statement, split_script, statements_from_commands};

use crate::patterns;

/// Keywords a statement must contain at least one of, checked
/// case-insensitively.
const KEYWORDS: [&str; 8] = [
    "CREATE", "MERGE", "MATCH", "RETURN", "WHERE", "SET", "DELETE", "REMOVE",
];

/// Static script checks: splitting, structural balance, effect estimation
/// and dangerous-operation scanning. Never touches the database; every
/// outcome is data inside the returned [`ValidationResult`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationService;

impl ValidationService {
    pub fn new() -> Self {
        Self
    }

    /// Validate a script file.
    ///
    /// A missing, unreadable or empty file is reported as an error inside
    /// the result rather than returned as an Err, so callers treat every
    /// outcome uniformly.
    pub fn validate_file(&self, path: &Path) -> ValidationResult {
        let mut result = ValidationResult::new(path.display().to_string());

        if !path.exists() {
            result.add_error(format!("file not found: {}", path.display()));
            return result;
        }
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                result.add_error(format!("failed to read {}: {}", path.display(), e));
                return result;
            }
        };
        result.file_size_bytes = content.len() as u64;
        if content.trim().is_empty() {
            result.add_error(format!("file is empty: {}", path.display()));
            return result;
        }

        self.check_statements(&split_script(&content), &mut result);
        debug!(
            path = %path.display(),
            total_commands = result.total_commands,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "script validated"
        );
        result
    }

    /// Validate statements already held in memory, one per list element.
    pub fn validate_commands(&self, commands: &[String]) -> ValidationResult {
        let mut result = ValidationResult::new(IN_MEMORY_PATH);
        result.file_size_bytes = commands.iter().map(|c| c.len() as u64).sum();
        self.check_statements(&statements_from_commands(commands), &mut result);
        result
    }

    fn check_statements(&self, statements: &[Statement], result: &mut ValidationResult) {
        result.total_commands = statements.len() as u64;
        for statement in statements {
            self.check_balance(statement, result);

            // Administrative statements (DROP ..., dbms.* calls) contain no
            // data keyword; the dangerous-operation match already recognized
            // their shape, so they get a warning instead of a keyword error.
            let dangerous = patterns::dangerous_operations(statement.text());
            if dangerous.is_empty() {
                self.check_keyword(statement, result);
            }
            for label in dangerous {
                result.add_warning(format!(
                    "line {}: dangerous operation ({}): {}",
                    statement.line(),
                    label,
                    statement.preview(STATEMENT_PREVIEW_CHARS)
                ));
            }

            result.estimated_nodes += patterns::count_node_creations(statement.text());
            result.estimated_relationships +=
                patterns::count_relationship_creations(statement.text());
        }
    }

    /// Bracket-balance checks for one statement. Violations append
    /// line-numbered errors; later statements are still checked.
    fn check_balance(&self, statement: &Statement, result: &mut ValidationResult) {
        let text = statement.text();

        for (open, close, what) in [
            ('(', ')', "parentheses"),
            ('[', ']', "brackets"),
            ('{', '}', "braces"),
        ] {
            if count_char(text, open) != count_char(text, close) {
                result.add_error(format!(
                    "line {}: unbalanced {}: {}",
                    statement.line(),
                    what,
                    statement.preview(STATEMENT_PREVIEW_CHARS)
                ));
            }
        }
    }

    fn check_keyword(&self, statement: &Statement, result: &mut ValidationResult) {
        let upper = statement.text().to_uppercase();
        if !KEYWORDS.iter().any(|keyword| upper.contains(keyword)) {
            result.add_error(format!(
                "line {}: no recognized Cypher keyword: {}",
                statement.line(),
                statement.preview(STATEMENT_PREVIEW_CHARS)
            ));
        }
    }
}

fn count_char(text: &str, needle: char) -> usize {
    text.chars().filter(|&c| c == needle).count()
}
