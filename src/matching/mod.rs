use anyhow::{Context, Result};
use polars::prelude::*;

/// Inner join of tally rows against the serials registry on normalized title.
///
/// Ambiguous registry titles fan out: one output row per matching serial.
/// Tallies whose title matches no serial drop out of journal-level analysis
/// here. Null titles on either side never match.
pub fn join_serials(tally: LazyFrame, serials: LazyFrame) -> LazyFrame {
    tally.join(
        serials,
        [col("normalized_title")],
        [col("normalized_title")],
        JoinArgs::new(JoinType::Inner),
    )
}

/// Left-outer join of serial-matched rows against subscription holdings.
///
/// A row matches a holding when the normalized titles are equal, or when the
/// serial's ISSN equals the holding's ISSN or eISSN, or when the serial's
/// eISSN equals either identifier. The disjunction is realized as five
/// equi-join branches over row-indexed sides; a (row, holding) pair matching
/// several branches still yields one output row. Missing keys never
/// participate in a comparison. Duplicate holdings fan out.
///
/// Rows with no matching holding keep all-null subscription columns — the
/// "cited but not subscribed" signal.
pub fn join_subscriptions(matches: LazyFrame, subscriptions: LazyFrame) -> Result<LazyFrame> {
    let left = matches.with_row_index("match_id", None);
    let holdings = subscriptions.with_row_index("holding_id", None);

    let left_keys = left.clone().select([
        col("match_id"),
        col("normalized_title"),
        col("issn"),
        col("eissn"),
    ]);
    let holding_keys = holdings.clone().select([
        col("holding_id"),
        col("normalized_subscription_title"),
        col("subscription_issn"),
        col("subscription_eissn"),
    ]);

    let branches: Vec<LazyFrame> = [
        ("normalized_title", "normalized_subscription_title"),
        ("issn", "subscription_issn"),
        ("issn", "subscription_eissn"),
        ("eissn", "subscription_issn"),
        ("eissn", "subscription_eissn"),
    ]
    .into_iter()
    .map(|(left_key, holding_key)| {
        left_keys
            .clone()
            .join(
                holding_keys.clone(),
                [col(left_key)],
                [col(holding_key)],
                JoinArgs::new(JoinType::Inner),
            )
            .select([col("match_id"), col("holding_id")])
    })
    .collect();

    let pairs = concat(&branches, UnionArgs::default())
        .context("Failed to combine subscription join branches")?
        .unique(
            Some(vec!["match_id".into(), "holding_id".into()]),
            UniqueKeepStrategy::First,
        );

    Ok(left
        .join(
            pairs,
            [col("match_id")],
            [col("match_id")],
            JoinArgs::new(JoinType::Left),
        )
        .join(
            holdings,
            [col("holding_id")],
            [col("holding_id")],
            JoinArgs::new(JoinType::Left),
        )
        .select([col("*").exclude([
            "match_id",
            "holding_id",
            "normalized_subscription_title",
        ])]))
}

/// Rows whose subscription side is entirely null after the left-outer join
pub fn unsubscribed_expr() -> Expr {
    col("subscription_title")
        .is_null()
        .and(col("subscription_issn").is_null())
        .and(col("subscription_eissn").is_null())
}
