use lazy_static::lazy_static;
use polars::prelude::*;
use regex::Regex;

lazy_static! {
    // ISSN shape: four digits, optional hyphen, three digits plus check digit
    // (0-9 or X). Examples: 1050-5164, 10505164, 0003-080x
    pub static ref ISSN_PATTERN: Regex = Regex::new(r"^(\d{4})-?(\d{3}[\dXx])$").unwrap();
}

/// Normalize a free-text journal/serial title for exact-string matching.
///
/// Missing and empty input both map to `None` so a missing title can never
/// equal another missing title in a join. Non-missing input is lower-cased and
/// the `" & "` variant is rewritten to `" and "`. No other rewriting: the
/// downstream joins depend on exact string equality of this output.
pub fn normalize_title(text: Option<&str>) -> Option<String> {
    let text = text?;
    if text.trim().is_empty() {
        return None;
    }
    Some(text.to_lowercase().replace(" & ", " and "))
}

/// Column-wise twin of [`normalize_title`].
///
/// Applied to the serials and subscription tables so the engine-side keys are
/// produced by the same transformation as the in-memory tally keys. Empty and
/// whitespace-only titles become null, matching the scalar version.
pub fn normalized_title_expr(expr: Expr) -> Expr {
    let lowered = expr
        .str()
        .to_lowercase()
        .str()
        .replace_all(lit(" & "), lit(" and "), true);

    when(
        lowered
            .clone()
            .str()
            .strip_chars(lit(NULL))
            .str()
            .len_chars()
            .gt(lit(0)),
    )
    .then(lowered)
    .otherwise(lit(NULL))
}

/// Canonicalize an ISSN or eISSN to `NNNN-NNNC` form.
///
/// Accepts the hyphenated and bare 8-character forms, upper-cases the check
/// digit, and maps anything else (including missing) to `None`.
pub fn normalize_issn(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    let caps = ISSN_PATTERN.captures(raw)?;
    Some(format!("{}-{}", &caps[1], caps[2].to_uppercase()))
}
