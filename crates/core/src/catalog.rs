//! Product listing filter composition.
//!
//! The shop page keeps its whole filter state in the URL query string so
//! every listing is linkable. [`ProductQuery`] parses that state, edits it
//! (toggle a category, change sort, paginate) and renders it two ways: back
//! into a shop URL, and into the query pairs the commerce API understands.

use rust_decimal::Decimal;

use crate::{BrandId, CategoryId};

/// Products per page on the shop listing.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Upper bound accepted for `limit`.
pub const MAX_PAGE_SIZE: u32 = 60;

/// Listing sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    BestSelling,
    TopRated,
}

impl SortOrder {
    /// Every option, in the order shown in the sort dropdown.
    pub const ALL: [Self; 5] = [
        Self::Newest,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::BestSelling,
        Self::TopRated,
    ];

    /// Value used in the shop URL.
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::BestSelling => "best_selling",
            Self::TopRated => "top_rated",
        }
    }

    /// Value sent to the API's `sort` parameter.
    #[must_use]
    pub const fn api_value(self) -> &'static str {
        match self {
            Self::Newest => "-createdAt",
            Self::PriceAsc => "price",
            Self::PriceDesc => "-price",
            Self::BestSelling => "-sold",
            Self::TopRated => "-ratingsAverage",
        }
    }

    /// Human label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::BestSelling => "Best selling",
            Self::TopRated => "Top rated",
        }
    }

    fn from_param(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_param() == value)
    }
}

/// Composed filter state for the product listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub keyword: Option<String>,
    pub categories: Vec<CategoryId>,
    pub brands: Vec<BrandId>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub min_rating: Option<u8>,
    pub sort: SortOrder,
    pub page: u32,
    pub limit: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            keyword: None,
            categories: Vec::new(),
            brands: Vec::new(),
            price_min: None,
            price_max: None,
            min_rating: None,
            sort: SortOrder::default(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ProductQuery {
    /// Parse the shop page's query pairs. Unknown keys and unparsable values
    /// are ignored rather than rejected so a hand-edited URL still renders.
    #[must_use]
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key {
                "keyword" => query.keyword = Some(value.to_owned()),
                "category" => push_unique(&mut query.categories, CategoryId::new(value)),
                "brand" => push_unique(&mut query.brands, BrandId::new(value)),
                "price_min" => query.price_min = value.parse().ok(),
                "price_max" => query.price_max = value.parse().ok(),
                "rating" => query.min_rating = value.parse().ok().filter(|r| (1..=5).contains(r)),
                "sort" => query.sort = SortOrder::from_param(value).unwrap_or_default(),
                "page" => query.page = value.parse().ok().filter(|p| *p >= 1).unwrap_or(1),
                "limit" => {
                    query.limit = value
                        .parse()
                        .ok()
                        .filter(|l| (1..=MAX_PAGE_SIZE).contains(l))
                        .unwrap_or(DEFAULT_PAGE_SIZE);
                }
                _ => {}
            }
        }
        query.normalize_price_range();
        query
    }

    /// Swap inverted bounds and drop negative ones.
    fn normalize_price_range(&mut self) {
        self.price_min = self.price_min.filter(|p| !p.is_sign_negative());
        self.price_max = self.price_max.filter(|p| !p.is_sign_negative());
        if let (Some(min), Some(max)) = (self.price_min, self.price_max)
            && min > max
        {
            self.price_min = Some(max);
            self.price_max = Some(min);
        }
    }

    /// Add the category if absent, remove it if present. Resets to page 1.
    #[must_use]
    pub fn toggle_category(mut self, id: &CategoryId) -> Self {
        toggle(&mut self.categories, id);
        self.page = 1;
        self
    }

    /// Add the brand if absent, remove it if present. Resets to page 1.
    #[must_use]
    pub fn toggle_brand(mut self, id: &BrandId) -> Self {
        toggle(&mut self.brands, id);
        self.page = 1;
        self
    }

    /// Change the sort order. Resets to page 1.
    #[must_use]
    pub const fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self.page = 1;
        self
    }

    /// Jump to a page (clamped to at least 1).
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Drop every filter but keep the keyword and sort.
    #[must_use]
    pub fn cleared(self) -> Self {
        Self {
            keyword: self.keyword,
            sort: self.sort,
            limit: self.limit,
            ..Self::default()
        }
    }

    /// Whether the category is currently selected.
    #[must_use]
    pub fn has_category(&self, id: &str) -> bool {
        self.categories.iter().any(|c| c.as_str() == id)
    }

    /// Whether the brand is currently selected.
    #[must_use]
    pub fn has_brand(&self, id: &str) -> bool {
        self.brands.iter().any(|b| b.as_str() == id)
    }

    /// Number of active filters, for the "Filters (3)" badge.
    #[must_use]
    pub fn active_filter_count(&self) -> usize {
        self.categories.len()
            + self.brands.len()
            + usize::from(self.price_min.is_some())
            + usize::from(self.price_max.is_some())
            + usize::from(self.min_rating.is_some())
    }

    /// Query pairs for the commerce API's `GET /products`.
    #[must_use]
    pub fn api_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_owned(), self.page.to_string()),
            ("limit".to_owned(), self.limit.to_string()),
            ("sort".to_owned(), self.sort.api_value().to_owned()),
        ];
        if let Some(keyword) = &self.keyword {
            pairs.push(("keyword".to_owned(), keyword.clone()));
        }
        pairs.extend(
            self.categories
                .iter()
                .map(|c| ("category[in]".to_owned(), c.to_string())),
        );
        pairs.extend(
            self.brands
                .iter()
                .map(|b| ("brand[in]".to_owned(), b.to_string())),
        );
        if let Some(min) = self.price_min {
            pairs.push(("price[gte]".to_owned(), min.to_string()));
        }
        if let Some(max) = self.price_max {
            pairs.push(("price[lte]".to_owned(), max.to_string()));
        }
        if let Some(rating) = self.min_rating {
            pairs.push(("ratingsAverage[gte]".to_owned(), rating.to_string()));
        }
        pairs
    }

    /// Query pairs for the shop page URL (inverse of [`Self::from_pairs`]).
    /// Defaults are omitted to keep links short.
    #[must_use]
    pub fn shop_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(keyword) = &self.keyword {
            pairs.push(("keyword", keyword.clone()));
        }
        pairs.extend(self.categories.iter().map(|c| ("category", c.to_string())));
        pairs.extend(self.brands.iter().map(|b| ("brand", b.to_string())));
        if let Some(min) = self.price_min {
            pairs.push(("price_min", min.to_string()));
        }
        if let Some(max) = self.price_max {
            pairs.push(("price_max", max.to_string()));
        }
        if let Some(rating) = self.min_rating {
            pairs.push(("rating", rating.to_string()));
        }
        if self.sort != SortOrder::default() {
            pairs.push(("sort", self.sort.as_param().to_owned()));
        }
        if self.page > 1 {
            pairs.push(("page", self.page.to_string()));
        }
        if self.limit != DEFAULT_PAGE_SIZE {
            pairs.push(("limit", self.limit.to_string()));
        }
        pairs
    }
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

fn toggle<T: PartialEq + Clone>(items: &mut Vec<T>, item: &T) {
    if let Some(pos) = items.iter().position(|i| i == item) {
        items.remove(pos);
    } else {
        items.push(item.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query_hits_first_page_newest() {
        let pairs = ProductQuery::default().api_pairs();
        assert_eq!(
            pairs,
            vec![
                ("page".to_owned(), "1".to_owned()),
                ("limit".to_owned(), "12".to_owned()),
                ("sort".to_owned(), "-createdAt".to_owned()),
            ]
        );
    }

    #[test]
    fn test_full_filter_composition() {
        let query = ProductQuery::from_pairs([
            ("keyword", "linen"),
            ("category", "c1"),
            ("category", "c2"),
            ("category", "c1"),
            ("brand", "b1"),
            ("price_min", "100"),
            ("price_max", "500"),
            ("rating", "4"),
            ("sort", "price_desc"),
            ("page", "3"),
        ]);

        assert_eq!(query.active_filter_count(), 6);
        let api = query.api_pairs();
        let has = |k: &str, v: &str| api.iter().any(|(ak, av)| ak == k && av == v);
        assert!(has("keyword", "linen"));
        assert!(has("category[in]", "c1"));
        assert!(has("category[in]", "c2"));
        assert!(has("brand[in]", "b1"));
        assert!(has("price[gte]", "100"));
        assert!(has("price[lte]", "500"));
        assert!(has("ratingsAverage[gte]", "4"));
        assert!(has("sort", "-price"));
        assert!(has("page", "3"));
        assert_eq!(api.iter().filter(|(k, _)| k == "category[in]").count(), 2);
    }

    #[test]
    fn test_inverted_price_range_is_swapped() {
        let query = ProductQuery::from_pairs([("price_min", "900"), ("price_max", "100")]);
        assert_eq!(query.price_min, Some(Decimal::from(100)));
        assert_eq!(query.price_max, Some(Decimal::from(900)));
    }

    #[test]
    fn test_garbage_values_fall_back_to_defaults() {
        let query = ProductQuery::from_pairs([
            ("page", "0"),
            ("limit", "9999"),
            ("sort", "random"),
            ("rating", "11"),
            ("price_min", "cheap"),
        ]);
        assert_eq!(query, ProductQuery::default());
    }

    #[test]
    fn test_toggle_resets_page() {
        let query = ProductQuery::default()
            .with_page(4)
            .toggle_category(&CategoryId::new("c1"));
        assert_eq!(query.page, 1);
        assert!(query.has_category("c1"));

        let query = query.toggle_category(&CategoryId::new("c1"));
        assert!(!query.has_category("c1"));
    }

    #[test]
    fn test_cleared_keeps_keyword_and_sort() {
        let query = ProductQuery::from_pairs([
            ("keyword", "denim"),
            ("brand", "b1"),
            ("sort", "top_rated"),
        ])
        .cleared();
        assert_eq!(query.keyword.as_deref(), Some("denim"));
        assert_eq!(query.sort, SortOrder::TopRated);
        assert_eq!(query.active_filter_count(), 0);
    }

    #[test]
    fn test_shop_pairs_round_trip() {
        let original = ProductQuery::from_pairs([
            ("keyword", "shirt"),
            ("brand", "b9"),
            ("sort", "best_selling"),
            ("page", "2"),
        ]);
        let pairs = original.shop_pairs();
        let reparsed = ProductQuery::from_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())));
        assert_eq!(reparsed, original);
    }
}
