//! Product reviews.

use atelier_core::{ProductId, ReviewId};
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::{ApiClient, ApiError, Page, Review};

/// Review create/update body.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewInput<'a> {
    pub title: &'a str,
    pub ratings: u8,
}

fn review_path(id: &ReviewId) -> String {
    format!("/reviews/{}", urlencoding::encode(id.as_str()))
}

impl ApiClient {
    /// Reviews for one product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn list_product_reviews(
        &self,
        product_id: &ProductId,
    ) -> Result<Page<Review>, ApiError> {
        let path = format!(
            "/products/{}/reviews",
            urlencoding::encode(product_id.as_str())
        );
        self.send_page(self.request(Method::GET, &path, None)).await
    }

    /// Post a review. The API allows one review per user per product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the review.
    #[instrument(skip(self, token, input), fields(product_id = %product_id))]
    pub async fn create_review(
        &self,
        token: &str,
        product_id: &ProductId,
        input: &ReviewInput<'_>,
    ) -> Result<Review, ApiError> {
        let path = format!(
            "/products/{}/reviews",
            urlencoding::encode(product_id.as_str())
        );
        let review = self
            .send_data(self.request(Method::POST, &path, Some(token)).json(input))
            .await?;
        // Rating aggregates on the product changed.
        self.invalidate_catalog();
        Ok(review)
    }

    /// Edit one of the user's reviews.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update.
    #[instrument(skip(self, token, input), fields(review_id = %id))]
    pub async fn update_review(
        &self,
        token: &str,
        id: &ReviewId,
        input: &ReviewInput<'_>,
    ) -> Result<Review, ApiError> {
        let review = self
            .send_data(
                self.request(Method::PUT, &review_path(id), Some(token))
                    .json(input),
            )
            .await?;
        self.invalidate_catalog();
        Ok(review)
    }

    /// Delete one of the user's reviews.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the removal.
    #[instrument(skip(self, token), fields(review_id = %id))]
    pub async fn delete_review(&self, token: &str, id: &ReviewId) -> Result<(), ApiError> {
        self.send_unit(self.request(Method::DELETE, &review_path(id), Some(token)))
            .await?;
        self.invalidate_catalog();
        Ok(())
    }
}
