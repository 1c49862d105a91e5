//! Catalog seeding and listing.
//!
//! `seed` loads the five launch products into an empty catalog. A catalog
//! that already has products is left alone unless `--force` is given, in
//! which case the launch products are appended.

use rust_decimal::Decimal;
use tracing::info;

use pencraft_core::Money;
use pencraft_storefront::db::products::NewProduct;
use pencraft_storefront::db::{ProductQuery, ProductRepository};

use super::{CommandError, connect};

/// The launch catalog.
fn launch_products() -> Vec<NewProduct> {
    let product = |name: &str,
                   price: i64,
                   image: &str,
                   category: &str,
                   brand: &str,
                   rating: i64,
                   description: &str,
                   stock: i32| NewProduct {
        name: name.to_owned(),
        price: Money::from_rubles(price),
        stock,
        category: category.to_owned(),
        brand: brand.to_owned(),
        rating: Decimal::new(rating, 1),
        description: description.to_owned(),
        image: image.to_owned(),
    };

    vec![
        product(
            "Гелевая ручка Premium",
            250,
            "linear-gradient(135deg, #8B5FBF, #6D3B9E)",
            "pens",
            "pencraft",
            48,
            "Плавное письмо, эргономичный дизайн",
            50,
        ),
        product(
            "Блокнот с твердой обложкой",
            480,
            "linear-gradient(135deg, #FF7E5F, #FF5722)",
            "paper",
            "moleskine",
            46,
            "160 страниц, бумага высокого качества",
            30,
        ),
        product(
            "Набор маркеров для скетчинга",
            1200,
            "linear-gradient(135deg, #4ECDC4, #2BBBAD)",
            "creative",
            "faber-castell",
            49,
            "24 цвета, двойной наконечник",
            20,
        ),
        product(
            "Органайзер для стола",
            890,
            "linear-gradient(135deg, #FFB74D, #FF9800)",
            "organizers",
            "pencraft",
            45,
            "Деревянный, 5 отделений",
            15,
        ),
        product(
            "Набор цветных карандашей",
            750,
            "linear-gradient(135deg, #9575CD, #7E57C2)",
            "creative",
            "faber-castell",
            47,
            "36 цветов, высокая пигментация",
            25,
        ),
    ]
}

/// Insert the launch catalog.
///
/// # Errors
///
/// Returns `CommandError` if the connection or an insert fails.
pub async fn products(force: bool) -> Result<(), CommandError> {
    let pool = connect().await?;
    let repo = ProductRepository::new(&pool);

    let existing = repo.count().await?;
    if existing > 0 && !force {
        info!(
            existing,
            "Catalog already has products, skipping (use --force to append)"
        );
        return Ok(());
    }

    for new_product in launch_products() {
        let product = repo.insert(&new_product).await?;
        info!(id = %product.id, name = %product.name, "Inserted product");
    }

    info!("Seeding complete!");
    Ok(())
}

/// Log every catalog product.
///
/// # Errors
///
/// Returns `CommandError` if the connection or the query fails.
pub async fn list() -> Result<(), CommandError> {
    let pool = connect().await?;
    let page = ProductRepository::new(&pool)
        .list(&ProductQuery::default())
        .await?;

    info!("Products: {}", page.total_items);
    for product in page.products {
        info!(
            "  #{} {} - {} ({}, {}, stock {})",
            product.id,
            product.name,
            product.price,
            product.category,
            product.brand,
            product.stock
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_catalog() {
        let products = launch_products();
        assert_eq!(products.len(), 5);
        assert!(products.iter().all(|p| p.stock > 0 && p.price > Money::ZERO));
        assert_eq!(products[2].rating, Decimal::new(49, 1));
        assert_eq!(
            products.iter().filter(|p| p.category == "creative").count(),
            2
        );
    }
}
