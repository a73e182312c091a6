use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub fn create_conn(database_url: &str) -> Result<DbPool, diesel::r2d2::PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder().build(manager)
}

/// Clamp user-supplied pagination into a sane window. Page numbers are
/// 1-based; `per_page` falls back to the caller-provided default.
pub fn paginate(page: Option<i64>, per_page: Option<i64>, default_per_page: i64) -> (i64, i64) {
    let per_page = per_page.unwrap_or(default_per_page).clamp(1, 100);
    let page = page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;
    (per_page, offset)
}

/// Strip everything but word characters, whitespace, hyphens, dots and
/// apostrophes from a simple-search query before building a LIKE pattern.
pub fn sanitize_search(query: &str) -> String {
    query
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '_' | '-' | '.' | '\''))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_defaults() {
        assert_eq!(paginate(None, None, 20), (20, 0));
        assert_eq!(paginate(Some(3), Some(10), 20), (10, 20));
    }

    #[test]
    fn paginate_clamps_bad_input() {
        assert_eq!(paginate(Some(0), Some(0), 20), (1, 0));
        assert_eq!(paginate(Some(-5), Some(10_000), 20), (100, 0));
    }

    #[test]
    fn sanitize_strips_like_metacharacters() {
        assert_eq!(sanitize_search("O'Brien %;()"), "O'Brien");
        assert_eq!(sanitize_search("  acme inc.  "), "acme inc.");
    }
}
