//! Records mirrored from the commerce API.
//!
//! The API is trusted: these types only decode what it sends. Most fields
//! default so that partially populated references (a cart item's product,
//! an order's user) decode into the same struct as the full record.

use atelier_core::pricing::CheckoutSummary;
use atelier_core::{
    AddressId, BrandId, CartId, CartItemId, CategoryId, CouponId, Money, OrderId, OrderStatus,
    PaymentMethod, ProductId, ReviewId, Role, UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Envelope & pagination
// =============================================================================

/// Success envelope wrapping every API response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub data: T,
    pub results: Option<u32>,
    pub pagination_result: Option<Pagination>,
    pub token: Option<String>,
    pub num_of_cart_items: Option<u32>,
}

/// Pagination block returned with list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub limit: u32,
    pub number_of_pages: u32,
    pub next: Option<u32>,
    pub prev: Option<u32>,
}

impl Pagination {
    /// A single page holding `len` items, used when the API omits the block.
    #[must_use]
    pub fn single(len: usize) -> Self {
        Self {
            current_page: 1,
            limit: u32::try_from(len).unwrap_or(u32::MAX),
            number_of_pages: 1,
            next: None,
            prev: None,
        }
    }

    /// Whether there is more than one page to navigate.
    #[must_use]
    pub const fn is_paged(&self) -> bool {
        self.number_of_pages > 1
    }
}

/// One page of a list endpoint.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of items in this page as reported by the API.
    pub results: u32,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub(crate) fn from_envelope(envelope: Envelope<Vec<T>>) -> Self {
        let pagination = envelope
            .pagination_result
            .unwrap_or_else(|| Pagination::single(envelope.data.len()));
        let results = envelope
            .results
            .unwrap_or_else(|| u32::try_from(envelope.data.len()).unwrap_or(u32::MAX));
        Self {
            items: envelope.data,
            results,
            pagination,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Users
// =============================================================================

/// An account as returned by `/auth/*` and `/users/*`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub created_at: Option<DateTime<Utc>>,
}

/// A user reference that may or may not be populated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum UserRef {
    Populated(User),
    Id(UserId),
}

impl UserRef {
    /// Display name, falling back to the id.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Populated(user) if !user.name.is_empty() => &user.name,
            Self::Populated(user) => user.id.as_str(),
            Self::Id(id) => id.as_str(),
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Category {
    #[serde(rename = "_id", alias = "id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub image: Option<String>,
}

/// A product brand.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Brand {
    #[serde(rename = "_id", alias = "id")]
    pub id: BrandId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub image: Option<String>,
}

/// A category or brand reference on a product: populated `{ _id, name }`
/// or a bare id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum NamedRef {
    Populated {
        #[serde(rename = "_id", alias = "id")]
        id: String,
        #[serde(default)]
        name: String,
    },
    Id(String),
}

impl NamedRef {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Populated { id, .. } | Self::Id(id) => id,
        }
    }

    /// Display name; empty when only the id is known.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Populated { name, .. } => name,
            Self::Id(_) => "",
        }
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub sold: u32,
    #[serde(default)]
    pub price: Money,
    pub price_after_discount: Option<Money>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub image_cover: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: Option<NamedRef>,
    pub brand: Option<NamedRef>,
    #[serde(default)]
    pub ratings_average: f32,
    #[serde(default)]
    pub ratings_quantity: u32,
}

impl Product {
    /// Price the customer pays: the sale price when it undercuts the list price.
    #[must_use]
    pub fn display_price(&self) -> Money {
        match self.price_after_discount {
            Some(sale) if sale < self.price => sale,
            _ => self.price,
        }
    }

    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.display_price() < self.price
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.quantity > 0
    }

    /// Average rating rounded to whole stars (0..=5).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn stars(&self) -> u8 {
        self.ratings_average.clamp(0.0, 5.0).round() as u8
    }

    #[must_use]
    pub fn category_name(&self) -> &str {
        self.category.as_ref().map_or("", NamedRef::name)
    }

    #[must_use]
    pub fn brand_name(&self) -> &str {
        self.brand.as_ref().map_or("", NamedRef::name)
    }
}

/// A product reference that may or may not be populated.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ProductRef {
    Populated(Box<Product>),
    Id(ProductId),
}

impl ProductRef {
    #[must_use]
    pub const fn id(&self) -> &ProductId {
        match self {
            Self::Populated(product) => &product.id,
            Self::Id(id) => id,
        }
    }

    /// Title, or an empty string when the product was not populated.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Populated(product) => &product.title,
            Self::Id(_) => "",
        }
    }

    /// Cover image URL, or an empty string when the product was not populated.
    #[must_use]
    pub fn image(&self) -> &str {
        match self {
            Self::Populated(product) => &product.image_cover,
            Self::Id(_) => "",
        }
    }
}

/// A product review.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id", alias = "id")]
    pub id: ReviewId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub ratings: u8,
    pub user: Option<UserRef>,
    pub product: Option<ProductRef>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Review {
    #[must_use]
    pub fn author(&self) -> &str {
        self.user.as_ref().map_or("Anonymous", UserRef::name)
    }

    /// Whether `user` wrote this review.
    #[must_use]
    pub fn is_by(&self, user: &UserId) -> bool {
        match &self.user {
            Some(UserRef::Populated(u)) => &u.id == user,
            Some(UserRef::Id(id)) => id == user,
            None => false,
        }
    }
}

/// A discount coupon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Coupon {
    #[serde(rename = "_id", alias = "id")]
    pub id: CouponId,
    pub name: String,
    pub expire: DateTime<Utc>,
    /// Percentage, `1..=100`.
    pub discount: u8,
}

impl Coupon {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire < now
    }
}

// =============================================================================
// Cart & wishlist
// =============================================================================

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(rename = "_id", alias = "id")]
    pub id: CartItemId,
    pub product: ProductRef,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub price: Money,
    pub color: Option<String>,
    pub size: Option<String>,
}

const fn one() -> u32 {
    1
}

impl CartItem {
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

/// The current user's cart.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(rename = "_id", alias = "id")]
    pub id: CartId,
    #[serde(default)]
    pub cart_items: Vec<CartItem>,
    #[serde(default)]
    pub total_cart_price: Money,
    pub total_price_after_discount: Option<Money>,
}

impl Cart {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart_items.is_empty()
    }

    /// Total units across every line.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart_items.iter().map(|i| i.quantity).sum()
    }

    #[must_use]
    pub fn item(&self, id: &CartItemId) -> Option<&CartItem> {
        self.cart_items.iter().find(|i| &i.id == id)
    }

    /// Totals for the cart and checkout summary panels.
    #[must_use]
    pub fn summary(&self) -> CheckoutSummary {
        CheckoutSummary::compute(
            self.cart_items.iter().map(|i| (i.price, i.quantity)),
            self.total_price_after_discount,
        )
    }
}

/// `POST /cart` body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart<'a> {
    pub product_id: &'a ProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<&'a str>,
}

// =============================================================================
// Addresses
// =============================================================================

/// A saved address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "_id", alias = "id")]
    pub id: AddressId,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
}

/// Address create/update body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub alias: String,
    pub details: String,
    pub phone: String,
    pub city: String,
    pub postal_code: String,
}

impl From<&Address> for AddressInput {
    fn from(address: &Address) -> Self {
        Self {
            alias: address.alias.clone(),
            details: address.details.clone(),
            phone: address.phone.clone(),
            city: address.city.clone(),
            postal_code: address.postal_code.clone(),
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Address snapshot stored on an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
}

impl From<AddressInput> for ShippingAddress {
    fn from(input: AddressInput) -> Self {
        Self {
            details: input.details,
            phone: input.phone,
            city: input.city,
            postal_code: input.postal_code,
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id", alias = "id")]
    pub id: OrderId,
    pub user: Option<UserRef>,
    #[serde(default)]
    pub cart_items: Vec<CartItem>,
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_method_type: PaymentMethod,
    #[serde(default)]
    pub total_order_price: Money,
    #[serde(default)]
    pub shipping_price: Money,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Last six characters of the id, as shown in tables.
    #[must_use]
    pub fn short_id(&self) -> &str {
        let id = self.id.as_str();
        let start = id
            .char_indices()
            .rev()
            .nth(5)
            .map_or(0, |(index, _)| index);
        id.get(start..).unwrap_or(id)
    }

    /// Σ price × quantity over the order lines.
    #[must_use]
    pub fn items_subtotal(&self) -> Money {
        self.cart_items.iter().map(CartItem::line_total).sum()
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart_items.iter().map(|i| i.quantity).sum()
    }

    /// Placement date formatted for tables.
    #[must_use]
    pub fn placed_on(&self) -> String {
        self.created_at
            .map_or_else(String::new, |d| d.format("%b %-d, %Y").to_string())
    }

    #[must_use]
    pub fn customer_name(&self) -> &str {
        self.user.as_ref().map_or("", UserRef::name)
    }
}

/// `POST /orders/{cartId}` body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashOrderRequest {
    pub shipping_address: ShippingAddress,
}

/// `GET /orders/checkout-session/{cartId}` response.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionResponse {
    pub session: HostedSession,
}

/// Hosted payment page.
#[derive(Debug, Clone, Deserialize)]
pub struct HostedSession {
    pub url: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cart_item_accepts_bare_or_populated_product() {
        let bare: CartItem = serde_json::from_value(json!({
            "_id": "i1", "product": "p1", "quantity": 2, "price": 100
        }))
        .unwrap();
        assert_eq!(bare.product.id().as_str(), "p1");
        assert_eq!(bare.product.title(), "");

        let populated: CartItem = serde_json::from_value(json!({
            "_id": "i2",
            "product": { "_id": "p2", "title": "Linen Shirt", "imageCover": "shirt.jpg" },
            "quantity": 1,
            "price": "349.50",
            "color": "sand"
        }))
        .unwrap();
        assert_eq!(populated.product.id().as_str(), "p2");
        assert_eq!(populated.product.title(), "Linen Shirt");
        assert_eq!(populated.color.as_deref(), Some("sand"));
    }

    #[test]
    fn test_cart_summary() {
        let cart: Cart = serde_json::from_value(json!({
            "_id": "c1",
            "cartItems": [{ "_id": "i1", "product": "p1", "quantity": 2, "price": 100 }],
            "totalCartPrice": 200
        }))
        .unwrap();
        let summary = cart.summary();
        assert_eq!(summary.subtotal, Money::from_units(200));
        assert_eq!(summary.shipping, Money::from_units(50));
        assert_eq!(summary.total, Money::from_units(250));
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_page_without_pagination_block() {
        let envelope: Envelope<Vec<Category>> = serde_json::from_value(json!({
            "results": 2,
            "data": [
                { "_id": "c1", "name": "Shirts" },
                { "_id": "c2", "name": "Trousers" }
            ]
        }))
        .unwrap();
        let page = Page::from_envelope(envelope);
        assert_eq!(page.results, 2);
        assert_eq!(page.pagination.number_of_pages, 1);
        assert!(!page.pagination.is_paged());
    }

    #[test]
    fn test_product_display_price() {
        let product: Product = serde_json::from_value(json!({
            "_id": "p1", "title": "Wool Coat", "price": 900, "priceAfterDiscount": 750,
            "category": { "_id": "c1", "name": "Outerwear" }, "brand": "b1",
            "ratingsAverage": 4.6
        }))
        .unwrap();
        assert_eq!(product.display_price(), Money::from_units(750));
        assert!(product.is_on_sale());
        assert_eq!(product.category_name(), "Outerwear");
        assert_eq!(product.brand_name(), "");
        assert_eq!(product.stars(), 5);
    }

    #[test]
    fn test_order_short_id_and_defaults() {
        let order: Order = serde_json::from_value(json!({
            "_id": "6650f1c2a1b2c3d4",
            "status": "shipped",
            "paymentMethodType": "card",
            "totalOrderPrice": 250
        }))
        .unwrap();
        assert_eq!(order.short_id(), "b2c3d4");
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.payment_method_type, PaymentMethod::Card);
        assert!(!order.is_paid);
    }
}
