//! Lexical inspection of SQL text.
//!
//! This is not a parser. It finds the leading keyword and the text between
//! the first `SELECT` and the first `FROM`, nothing more. String literals,
//! quoted identifiers, function calls with commas (`coalesce(a, b)`),
//! subqueries and aliases (`a AS x`) all tokenize incorrectly.

use std::sync::LazyLock;

use regex::Regex;

const SELECT: &str = "SELECT";
const FROM: &str = "FROM";

static COLUMN_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[,\s]+").expect("column separator pattern is valid")
});

/// Returns true if the first whitespace-delimited token is `SELECT`, ignoring case.
pub fn is_select_query(query: &str) -> bool {
    query
        .split_whitespace()
        .next()
        .is_some_and(|token| token.eq_ignore_ascii_case(SELECT))
}

/// Best-effort extraction of the projected column names of a `SELECT`.
///
/// Returns `None` for anything that is not a `SELECT`. Keywords are matched
/// case-insensitively; the returned names keep their original case. When no
/// `FROM` follows, everything after `SELECT` is treated as the projection.
pub fn sniff_columns(query: &str) -> Option<Vec<String>> {
    if !is_select_query(query) {
        return None;
    }

    let query = query.trim();
    // ASCII uppercasing keeps byte offsets aligned with `query`.
    let upper = query.to_ascii_uppercase();

    let start = upper.find(SELECT)? + SELECT.len();
    let end = upper[start..]
        .find(FROM)
        .map_or(query.len(), |offset| start + offset);

    let columns = COLUMN_SEPARATOR
        .split(&query[start..end])
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect();

    Some(columns)
}
