//! Portable predicate helpers shared by list queries.

use sea_orm::sea_query::{Expr, Func, IntoColumnRef, SimpleExpr};

/// Case-insensitive substring match that behaves the same on SQLite and
/// PostgreSQL. The term is bound as a parameter.
pub fn contains_ci<C: IntoColumnRef>(column: C, term: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(format!("%{}%", term.to_lowercase()))
}

/// Trims a free-text filter; blank means "no filter".
pub fn search_term(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_search_is_ignored() {
        assert_eq!(search_term(None), None);
        assert_eq!(search_term(Some("   ")), None);
        assert_eq!(search_term(Some(" apple ")), Some("apple"));
    }
}
