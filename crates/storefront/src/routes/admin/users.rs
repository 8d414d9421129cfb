//! Account management handlers.
//!
//! Admins cannot change their own role or delete their own account from
//! here; the console would lock them out mid-request.

use askama::Template;
use askama_web::WebTemplate;
use atelier_core::{Role, UserId};
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::PageQuery;
use crate::api::User;
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin};
use crate::models::CurrentUser;
use crate::routes::{PageLinks, flash_failure, with_page};
use crate::services::{ServiceError, flash};
use crate::state::AppState;

const OWN_ACCOUNT: &str = "You can't change your own account here";

/// Role change form.
#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub role: Role,
}

/// One row of the user list.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub user: User,
    pub is_self: bool,
    pub href: String,
    /// The role the toggle button switches to.
    pub other_role: &'static str,
}

/// User list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct UsersTemplate {
    pub page: PageContext,
    pub rows: Vec<UserRow>,
    pub links: PageLinks,
}

fn rows(users: Vec<User>, admin: &CurrentUser) -> Vec<UserRow> {
    users
        .into_iter()
        .map(|user| UserRow {
            is_self: user.id == admin.id,
            href: format!("/admin/users/{}", urlencoding::encode(user.id.as_str())),
            other_role: match user.role {
                Role::Admin => Role::User.as_str(),
                Role::User => Role::Admin.as_str(),
            },
            user,
        })
        .collect()
}

/// Display every account.
#[instrument(skip(state, admin, page), fields(admin_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let users = state
        .api()
        .admin_list_users(&admin.token, query.page.unwrap_or(1))
        .await?;
    let links = PageLinks::new(&users.pagination, |n| with_page("/admin/users", n));
    Ok(UsersTemplate {
        page,
        rows: rows(users.items, &admin),
        links,
    }
    .into_response())
}

/// Promote or demote an account.
#[instrument(skip(state, session, admin), fields(admin_id = %admin.id))]
pub async fn update_role(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    Form(form): Form<RoleForm>,
) -> Result<Redirect> {
    let result = if id == admin.id {
        Err(ServiceError::Rejected(OWN_ACCOUNT))
    } else {
        state
            .api()
            .admin_update_user_role(&admin.token, &id, form.role)
            .await
            .map_err(ServiceError::from)
    };
    match result {
        Ok(user) => {
            tracing::info!(user_id = %user.id, role = %user.role, "Role changed");
            flash::success(&session, format!("{} is now {}", user.name, user.role)).await?;
        }
        Err(e) => flash_failure(&session, e).await?,
    }
    Ok(Redirect::to("/admin/users"))
}

/// Delete an account.
#[instrument(skip(state, session, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Redirect> {
    let result = if id == admin.id {
        Err(ServiceError::Rejected(OWN_ACCOUNT))
    } else {
        state
            .api()
            .admin_delete_user(&admin.token, &id)
            .await
            .map_err(ServiceError::from)
    };
    match result {
        Ok(()) => flash::success(&session, "Account deleted").await?,
        Err(e) => flash_failure(&session, e).await?,
    }
    Ok(Redirect::to("/admin/users"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, role: Role) -> User {
        User {
            id: UserId::new(id),
            name: id.to_owned(),
            email: format!("{id}@example.com"),
            phone: None,
            role,
            created_at: None,
        }
    }

    #[test]
    fn test_rows_flag_self_and_offer_other_role() {
        let admin = CurrentUser {
            id: UserId::new("a1"),
            name: "Admin".to_owned(),
            email: "a1@example.com".to_owned(),
            role: Role::Admin,
            token: "t".to_owned(),
        };
        let rows = rows(vec![user("a1", Role::Admin), user("u1", Role::User)], &admin);
        assert!(rows[0].is_self);
        assert_eq!(rows[0].other_role, "user");
        assert!(!rows[1].is_self);
        assert_eq!(rows[1].other_role, "admin");
        assert_eq!(rows[1].href, "/admin/users/u1");
    }
}
