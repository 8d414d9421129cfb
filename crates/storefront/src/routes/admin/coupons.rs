//! Coupon management handlers.

use askama::Template;
use askama_web::WebTemplate;
use atelier_core::CouponId;
use atelier_core::validation::validate_coupon;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::Coupon;
use crate::api::admin::CouponInput;
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin};
use crate::routes::{flash_failure, inline_error};
use crate::services::{ServiceError, flash};
use crate::state::AppState;

/// Coupon form data. `expire` is a `<input type="date">` value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CouponForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub expire: String,
    #[serde(default)]
    pub discount: String,
}

impl CouponForm {
    fn to_input(&self) -> std::result::Result<CouponInput, ServiceError> {
        let name = self.name.trim().to_uppercase();
        let discount = self.discount.trim().parse::<u8>().unwrap_or(0);
        validate_coupon(&name, discount)?;
        let expire = NaiveDate::parse_from_str(self.expire.trim(), "%Y-%m-%d")
            .map_err(|_| ServiceError::Rejected("Enter a valid expiry date"))?;
        Ok(CouponInput {
            name,
            expire,
            discount,
        })
    }
}

impl From<&Coupon> for CouponForm {
    fn from(coupon: &Coupon) -> Self {
        Self {
            name: coupon.name.clone(),
            expire: coupon.expire.date_naive().format("%Y-%m-%d").to_string(),
            discount: coupon.discount.to_string(),
        }
    }
}

/// One row of the coupon list.
#[derive(Debug, Clone)]
pub struct CouponRow {
    pub coupon: Coupon,
    pub expires_on: String,
    pub expired: bool,
    pub href: String,
}

/// List and create template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/coupons.html")]
pub struct CouponsTemplate {
    pub page: PageContext,
    pub rows: Vec<CouponRow>,
    pub form: CouponForm,
    pub error: Option<String>,
}

/// Edit template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/coupon_edit.html")]
pub struct CouponEditTemplate {
    pub page: PageContext,
    pub action: String,
    pub form: CouponForm,
    pub error: Option<String>,
}

fn coupon_path(id: &CouponId) -> String {
    format!("/admin/coupons/{}", urlencoding::encode(id.as_str()))
}

fn rows(coupons: Vec<Coupon>) -> Vec<CouponRow> {
    let now = Utc::now();
    coupons
        .into_iter()
        .map(|coupon| CouponRow {
            expires_on: coupon.expire.format("%b %-d, %Y").to_string(),
            expired: coupon.is_expired(now),
            href: coupon_path(&coupon.id),
            coupon,
        })
        .collect()
}

/// Display the coupon list.
#[instrument(skip(state, admin, page), fields(admin_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
) -> Result<Response> {
    let coupons = state.api().admin_list_coupons(&admin.token).await?;
    Ok(CouponsTemplate {
        page,
        rows: rows(coupons),
        form: CouponForm::default(),
        error: None,
    }
    .into_response())
}

/// Create a coupon.
#[instrument(skip(state, session, admin, page, form), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
    Form(form): Form<CouponForm>,
) -> Result<Response> {
    let result = match form.to_input() {
        Ok(input) => state
            .api()
            .admin_create_coupon(&admin.token, &input)
            .await
            .map_err(ServiceError::from),
        Err(e) => Err(e),
    };
    match result {
        Ok(coupon) => {
            flash::success(&session, format!("Created coupon {}", coupon.name)).await?;
            Ok(Redirect::to("/admin/coupons").into_response())
        }
        Err(e) => {
            let error = inline_error(e)?;
            let coupons = state.api().admin_list_coupons(&admin.token).await?;
            Ok(CouponsTemplate {
                page,
                rows: rows(coupons),
                form,
                error: Some(error),
            }
            .into_response())
        }
    }
}

/// Display the edit form.
#[instrument(skip(state, admin, page), fields(admin_id = %admin.id))]
pub async fn edit(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
    Path(id): Path<CouponId>,
) -> Result<Response> {
    let coupon = state.api().admin_get_coupon(&admin.token, &id).await?;
    Ok(CouponEditTemplate {
        page,
        action: coupon_path(&id),
        form: CouponForm::from(&coupon),
        error: None,
    }
    .into_response())
}

/// Update a coupon.
#[instrument(skip(state, session, admin, page, form), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
    Path(id): Path<CouponId>,
    Form(form): Form<CouponForm>,
) -> Result<Response> {
    let result = match form.to_input() {
        Ok(input) => state
            .api()
            .admin_update_coupon(&admin.token, &id, &input)
            .await
            .map_err(ServiceError::from),
        Err(e) => Err(e),
    };
    match result {
        Ok(coupon) => {
            flash::success(&session, format!("Saved coupon {}", coupon.name)).await?;
            Ok(Redirect::to("/admin/coupons").into_response())
        }
        Err(e) => Ok(CouponEditTemplate {
            page,
            action: coupon_path(&id),
            form,
            error: Some(inline_error(e)?),
        }
        .into_response()),
    }
}

/// Delete a coupon.
#[instrument(skip(state, session, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CouponId>,
) -> Result<Redirect> {
    match state.api().admin_delete_coupon(&admin.token, &id).await {
        Ok(()) => flash::success(&session, "Coupon deleted").await?,
        Err(e) => flash_failure(&session, e.into()).await?,
    }
    Ok(Redirect::to("/admin/coupons"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, expire: &str, discount: &str) -> CouponForm {
        CouponForm {
            name: name.to_owned(),
            expire: expire.to_owned(),
            discount: discount.to_owned(),
        }
    }

    #[test]
    fn test_valid_coupon_is_uppercased() {
        let input = form(" summer10 ", "2026-08-31", "10").to_input().unwrap();
        assert_eq!(input.name, "SUMMER10");
        assert_eq!(input.discount, 10);
        assert_eq!(input.expire, NaiveDate::from_ymd_opt(2026, 8, 31).unwrap());
    }

    #[test]
    fn test_discount_out_of_range() {
        let err = form("X", "2026-08-31", "150").to_input().err().unwrap();
        assert_eq!(err.user_message(), "Discount must be between 1 and 100");
    }

    #[test]
    fn test_bad_date_is_rejected() {
        assert!(matches!(
            form("X", "31/08/2026", "10").to_input(),
            Err(ServiceError::Rejected(_))
        ));
    }
}
