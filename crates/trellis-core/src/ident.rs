//! Canonical node id construction.
//!
//! The walker and the assembler share these pure functions so that
//! re-extracting the same sources always lands on the same ids, which is
//! what makes aggregation idempotent. Ids carry no scope or type
//! qualification beyond the declaring unit; in particular [`variable`]
//! keys on the bare name alone, so same-named variables in unrelated
//! units collapse onto one node. That collapse is a documented precision
//! trade, not an accident.

/// Id of a declaration (callable, member callable, or type) in a unit.
pub fn scoped(unit: &str, name: &str) -> String {
    format!("{unit}:{name}")
}

/// Id of a variable node, keyed by bare name only.
pub fn variable(name: &str) -> String {
    format!("var:{name}")
}

/// Id of a decorator tag node.
pub fn decorator(name: &str) -> String {
    format!("decorator:{name}")
}

/// Id of a raise-statement site.
pub fn exception_site(line: u32) -> String {
    format!("exception_at_line:{line}")
}

/// Id of a try-block site.
pub fn handler_site(line: u32) -> String {
    format!("try_block_at_line:{line}")
}

/// Id of a valued-return site.
pub fn return_site(line: u32) -> String {
    format!("return_value_at_line:{line}")
}

/// Id of a detected external service.
pub fn service(name: &str) -> String {
    format!("external_service:{name}")
}

/// Trailing segment of a dotted path: `a.b.c` → `c`.
pub fn bare_name(dotted: &str) -> &str {
    dotted.rsplit('.').next().unwrap_or(dotted)
}
