//! Review moderation handlers.

use askama::Template;
use askama_web::WebTemplate;
use atelier_core::ReviewId;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use super::PageQuery;
use crate::api::Review;
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin};
use crate::routes::{PageLinks, flash_failure, with_page};
use crate::services::flash;
use crate::state::AppState;

/// Review list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/reviews.html")]
pub struct ReviewsTemplate {
    pub page: PageContext,
    pub reviews: Vec<Review>,
    pub links: PageLinks,
}

/// Display every review.
#[instrument(skip(state, admin, page), fields(admin_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let reviews = state
        .api()
        .admin_list_reviews(&admin.token, query.page.unwrap_or(1))
        .await?;
    let links = PageLinks::new(&reviews.pagination, |n| with_page("/admin/reviews", n));
    Ok(ReviewsTemplate {
        page,
        reviews: reviews.items,
        links,
    }
    .into_response())
}

/// Delete a review.
#[instrument(skip(state, session, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ReviewId>,
) -> Result<Redirect> {
    match state.api().admin_delete_review(&admin.token, &id).await {
        Ok(()) => flash::success(&session, "Review deleted").await?,
        Err(e) => flash_failure(&session, e.into()).await?,
    }
    Ok(Redirect::to("/admin/reviews"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_renders_inside_admin_layout() {
        let html = ReviewsTemplate {
            page: PageContext {
                path: "/admin/reviews".to_owned(),
                ..PageContext::default()
            },
            reviews: Vec::new(),
            links: PageLinks::default(),
        }
        .render()
        .unwrap();
        assert!(html.contains(r#"<nav class="admin-nav" aria-label="Admin">"#));
        assert!(html.contains(r#"<a href="/admin/reviews" class="active">Reviews</a>"#));
        assert!(html.contains("No reviews yet."));
        assert!(html.contains("<title>Reviews - Atelier Admin</title>"));
    }
}
