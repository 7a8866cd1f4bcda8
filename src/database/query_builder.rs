use sqlx::{Postgres, QueryBuilder};

use crate::database::repository::Page;
use crate::policy::Visibility;

/// Append the post read filter as a single boolean condition on alias `p`
pub fn push_post_visibility(qb: &mut QueryBuilder<'_, Postgres>, visibility: &Visibility) {
    match *visibility {
        Visibility::Everything => {
            qb.push("TRUE");
        }
        Visibility::Published => {
            qb.push("p.published");
        }
        Visibility::PublishedOrAuthoredBy(user_id) => {
            qb.push("(p.published OR p.author_id = ");
            qb.push_bind(user_id);
            qb.push(")");
        }
    }
}

/// Append newest-first ordering and the page window for table alias `alias`
pub fn push_order_and_page(qb: &mut QueryBuilder<'_, Postgres>, alias: &str, page: Page) {
    qb.push(format!(
        " ORDER BY {alias}.created_at DESC, {alias}.id DESC",
        alias = alias
    ));
    if let Some(limit) = page.limit {
        qb.push(" LIMIT ");
        qb.push_bind(limit);
    }
    if page.offset > 0 {
        qb.push(" OFFSET ");
        qb.push_bind(page.offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(visibility: Visibility, page: Page) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM posts p WHERE ");
        push_post_visibility(&mut qb, &visibility);
        push_order_and_page(&mut qb, "p", page);
        qb.sql().to_string()
    }

    #[test]
    fn union_filter_is_one_predicate() {
        let sql = render(Visibility::PublishedOrAuthoredBy(3), Page { limit: Some(10), offset: 20 });
        assert_eq!(
            sql,
            "SELECT * FROM posts p WHERE (p.published OR p.author_id = $1) \
             ORDER BY p.created_at DESC, p.id DESC LIMIT $2 OFFSET $3"
        );
    }

    #[test]
    fn anonymous_filter_and_unbounded_page() {
        let sql = render(Visibility::Published, Page::default());
        assert_eq!(
            sql,
            "SELECT * FROM posts p WHERE p.published ORDER BY p.created_at DESC, p.id DESC"
        );
    }
}
