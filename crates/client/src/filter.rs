//! Catalog filtering and sorting for the product grid.

use std::str::FromStr;

use rust_decimal::Decimal;

use pencraft_core::Money;
use pencraft_core::api::Product;

/// Upper bound of the default price range.
pub const DEFAULT_MAX_PRICE: i64 = 5000;

/// Product grid ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Catalog order.
    #[default]
    Popular,
    PriceAsc,
    PriceDesc,
    /// Newest first.
    New,
    /// Highest rating first.
    Rating,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popular" => Ok(Self::Popular),
            "price-asc" => Ok(Self::PriceAsc),
            "price-desc" => Ok(Self::PriceDesc),
            "new" => Ok(Self::New),
            "rating" => Ok(Self::Rating),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

/// Filter state of the catalog sidebar. Empty sets mean "no restriction".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    pub categories: Vec<String>,
    pub min_price: Money,
    pub max_price: Money,
    pub brands: Vec<String>,
    /// A product passes if its rating reaches any of these.
    pub min_ratings: Vec<Decimal>,
    /// Case-insensitive substring of the name.
    pub search: String,
    pub sort: SortOrder,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            min_price: Money::ZERO,
            max_price: Money::from_rubles(DEFAULT_MAX_PRICE),
            brands: Vec::new(),
            min_ratings: Vec::new(),
            search: String::new(),
            sort: SortOrder::Popular,
        }
    }
}

impl ProductFilter {
    /// Whether `product` passes every active filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if !self.categories.is_empty() && !self.categories.contains(&product.category) {
            return false;
        }
        if product.price < self.min_price || product.price > self.max_price {
            return false;
        }
        if !self.brands.is_empty() && !self.brands.contains(&product.brand) {
            return false;
        }
        if !self.min_ratings.is_empty() && !self.min_ratings.iter().any(|r| product.rating >= *r)
        {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        needle.is_empty() || product.name.to_lowercase().contains(&needle)
    }

    /// Matching products in display order.
    #[must_use]
    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        let mut matched: Vec<Product> = products
            .iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect();

        match self.sort {
            SortOrder::Popular => {}
            SortOrder::PriceAsc => matched.sort_by(|a, b| a.price.cmp(&b.price)),
            SortOrder::PriceDesc => matched.sort_by(|a, b| b.price.cmp(&a.price)),
            SortOrder::New => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::Rating => matched.sort_by(|a, b| b.rating.cmp(&a.rating)),
        }
        matched
    }
}

/// Display name for a brand slug. Unknown slugs are shown as-is.
#[must_use]
pub fn brand_display_name(brand: &str) -> &str {
    match brand {
        "pencraft" => "PenCraft",
        "artline" => "ArtLine",
        "moleskine" => "Moleskine",
        "faber-castell" => "Faber-Castell",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use pencraft_core::ProductId;

    fn product(id: i32, name: &str, price: i64, category: &str, brand: &str, rating: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            price: Money::from_rubles(price),
            stock: 10,
            category: category.to_string(),
            brand: brand.to_string(),
            rating: Decimal::new(rating, 1),
            description: String::new(),
            image: String::new(),
            created_at: Utc::now() - Duration::days(i64::from(10 - id)),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product(1, "Гелевая ручка Premium", 250, "pens", "pencraft", 48),
            product(2, "Блокнот с твердой обложкой", 480, "paper", "moleskine", 46),
            product(3, "Набор маркеров для скетчинга", 1200, "creative", "faber-castell", 49),
            product(4, "Органайзер для стола", 890, "organizers", "pencraft", 45),
            product(5, "Набор цветных карандашей", 750, "creative", "faber-castell", 47),
        ]
    }

    fn ids(products: &[Product]) -> Vec<i32> {
        products.iter().map(|p| p.id.as_i32()).collect()
    }

    #[test]
    fn test_default_filter_keeps_catalog_order() {
        assert_eq!(ids(&ProductFilter::default().apply(&catalog())), [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_category_and_brand_sets() {
        let filter = ProductFilter {
            categories: vec!["creative".to_string(), "pens".to_string()],
            brands: vec!["faber-castell".to_string()],
            ..ProductFilter::default()
        };
        assert_eq!(ids(&filter.apply(&catalog())), [3, 5]);
    }

    #[test]
    fn test_price_range_is_inclusive() {
        let filter = ProductFilter {
            min_price: Money::from_rubles(480),
            max_price: Money::from_rubles(890),
            ..ProductFilter::default()
        };
        assert_eq!(ids(&filter.apply(&catalog())), [2, 4, 5]);
    }

    #[test]
    fn test_rating_is_any_of() {
        let filter = ProductFilter {
            min_ratings: vec![Decimal::new(48, 1), Decimal::new(49, 1)],
            ..ProductFilter::default()
        };
        assert_eq!(ids(&filter.apply(&catalog())), [1, 3]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let filter = ProductFilter {
            search: "НАБОР".to_string(),
            ..ProductFilter::default()
        };
        assert_eq!(ids(&filter.apply(&catalog())), [3, 5]);
    }

    #[test]
    fn test_sort_orders() {
        let sorted = |sort| {
            ids(&ProductFilter {
                sort,
                ..ProductFilter::default()
            }
            .apply(&catalog()))
        };
        assert_eq!(sorted(SortOrder::PriceAsc), [1, 2, 5, 4, 3]);
        assert_eq!(sorted(SortOrder::PriceDesc), [3, 4, 5, 2, 1]);
        assert_eq!(sorted(SortOrder::Rating), [3, 1, 5, 2, 4]);
        assert_eq!(sorted(SortOrder::New), [5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!("price-asc".parse::<SortOrder>(), Ok(SortOrder::PriceAsc));
        assert_eq!("popular".parse::<SortOrder>(), Ok(SortOrder::Popular));
        assert!("cheapest".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_brand_display_names() {
        assert_eq!(brand_display_name("faber-castell"), "Faber-Castell");
        assert_eq!(brand_display_name("pencraft"), "PenCraft");
        assert_eq!(brand_display_name("noname"), "noname");
    }
}
