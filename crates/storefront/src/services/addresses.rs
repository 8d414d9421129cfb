//! Address context.
//!
//! Addresses are read fresh from the API on every page; they change rarely
//! and may be edited from another device.

use atelier_core::AddressId;
use atelier_core::validation::{AddressFields, validate_address};
use tracing::instrument;

use super::ServiceResult;
use crate::api::{Address, AddressInput, ApiClient};
use crate::models::CurrentUser;

/// Validate the form and build the API body.
///
/// # Errors
///
/// Returns the first validation error.
pub fn address_input(fields: &AddressFields<'_>) -> ServiceResult<AddressInput> {
    let phone = validate_address(fields)?;
    Ok(AddressInput {
        alias: fields.alias.trim().to_owned(),
        details: fields.details.trim().to_owned(),
        phone,
        city: fields.city.trim().to_owned(),
        postal_code: fields.postal_code.trim().to_owned(),
    })
}

/// Saved-address operations for one signed-in user.
pub struct AddressService<'a> {
    api: &'a ApiClient,
    user: &'a CurrentUser,
}

impl<'a> AddressService<'a> {
    #[must_use]
    pub const fn new(api: &'a ApiClient, user: &'a CurrentUser) -> Self {
        Self { api, user }
    }

    /// List saved addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn list(&self) -> ServiceResult<Vec<Address>> {
        Ok(self.api.list_addresses(&self.user.token).await?)
    }

    /// Find one saved address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn find(&self, id: &AddressId) -> ServiceResult<Option<Address>> {
        Ok(self.list().await?.into_iter().find(|a| &a.id == id))
    }

    /// Validate and save a new address.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, or an API error.
    #[instrument(skip(self, fields), fields(user_id = %self.user.id))]
    pub async fn add(&self, fields: &AddressFields<'_>) -> ServiceResult<Vec<Address>> {
        let input = address_input(fields)?;
        Ok(self.api.add_address(&self.user.token, &input).await?)
    }

    /// Validate and replace a saved address.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, or an API error.
    #[instrument(skip(self, fields), fields(user_id = %self.user.id, address_id = %id))]
    pub async fn update(
        &self,
        id: &AddressId,
        fields: &AddressFields<'_>,
    ) -> ServiceResult<Vec<Address>> {
        let input = address_input(fields)?;
        Ok(self
            .api
            .update_address(&self.user.token, id, &input)
            .await?)
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    #[instrument(skip(self), fields(user_id = %self.user.id, address_id = %id))]
    pub async fn remove(&self, id: &AddressId) -> ServiceResult<Vec<Address>> {
        Ok(self.api.remove_address(&self.user.token, id).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::ServiceError;
    use atelier_core::validation::ValidationError;

    #[test]
    fn test_address_input_normalizes() {
        let input = address_input(&AddressFields {
            alias: " Home ",
            details: "12 Nile St",
            phone: "010 1234 5678",
            city: "Cairo",
            postal_code: "11511",
        })
        .unwrap();
        assert_eq!(input.alias, "Home");
        assert_eq!(input.phone, "01012345678");
    }

    #[test]
    fn test_address_input_rejects_bad_phone() {
        let err = address_input(&AddressFields {
            alias: "Home",
            details: "12 Nile St",
            phone: "12",
            city: "Cairo",
            postal_code: "11511",
        })
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ValidationError::Phone)));
    }
}
