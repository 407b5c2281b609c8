//! Regex shapes behind effect estimation and dangerous-operation scanning.
//!
//! Estimation is a heuristic: the counts come from textual pattern matches,
//! never from the database, so a full `CREATE (a)-[:R]->(b)` pattern is
//! allowed to match both the arrow shape and the full creation shape. The
//! authoritative numbers are the execution-summary counters reported after
//! upload.

use regex::Regex;
use std::sync::LazyLock;

/// Shapes that open a node creation: `CREATE (` and `MERGE (`.
static NODE_CREATION: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\bCREATE\s*\(").expect("node creation regex must compile"),
        Regex::new(r"(?i)\bMERGE\s*\(").expect("node creation regex must compile"),
    ]
});

/// Shapes that create a relationship: a directed arrow, and the full
/// node-arrow-node creation pattern.
static RELATIONSHIP_CREATION: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"-\s*\[[^\]]*\]\s*->").expect("relationship regex must compile"),
        Regex::new(r"(?i)\b(?:CREATE|MERGE)\s*\([^)]*\)\s*-\s*\[[^\]]*\]\s*->\s*\([^)]*\)")
            .expect("relationship regex must compile"),
    ]
});

/// Destructive or administrative operations worth flagging before upload.
/// A match is a warning, never an error; the script stays uploadable.
static DANGEROUS_OPERATIONS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        (
            "DROP DATABASE",
            Regex::new(r"(?i)\bDROP\s+DATABASE\b").expect("dangerous op regex must compile"),
        ),
        (
            "DROP CONSTRAINT",
            Regex::new(r"(?i)\bDROP\s+CONSTRAINT\b").expect("dangerous op regex must compile"),
        ),
        (
            "DROP INDEX",
            Regex::new(r"(?i)\bDROP\s+INDEX\b").expect("dangerous op regex must compile"),
        ),
        (
            "unfiltered DELETE",
            Regex::new(r"(?i)\bMATCH\s*\(\s*\w+\s*\)\s*(?:DETACH\s+)?DELETE\b")
                .expect("dangerous op regex must compile"),
        ),
        (
            "dbms.shutdown call",
            Regex::new(r"(?i)dbms\.shutdown").expect("dangerous op regex must compile"),
        ),
        (
            "dbms.kill call",
            Regex::new(r"(?i)dbms\.kill").expect("dangerous op regex must compile"),
        ),
    ]
});

/// Count node-creation shapes in one statement.
pub fn count_node_creations(text: &str) -> u64 {
    NODE_CREATION
        .iter()
        .map(|re| re.find_iter(text).count() as u64)
        .sum()
}

/// Count relationship-creation shapes in one statement.
pub fn count_relationship_creations(text: &str) -> u64 {
    RELATIONSHIP_CREATION
        .iter()
        .map(|re| re.find_iter(text).count() as u64)
        .sum()
}

/// Labels of every dangerous operation the statement matches.
pub fn dangerous_operations(text: &str) -> Vec<&'static str> {
    DANGEROUS_OPERATIONS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(label, _)| *label)
        .collect()
}
