//! Seed the vehicle stock with generated data.
//!
//! Stands in for the dealer feed import in development and staging: fills
//! the `vehicles` table with plausible Spanish-market stock so the chat
//! context and the stock-summary endpoint have something to aggregate.
//!
//! # Usage
//!
//! ```bash
//! # Add 100 vehicles (the default)
//! dd-cli seed
//!
//! # The daily refresh: wipe the stock and regenerate it
//! dd-cli seed --count 150 --replace
//!
//! # Single-brand stock, useful for testing the brand aggregates
//! dd-cli seed --count 30 --brand BMW
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`, matching the admin service)

use chrono::{Datelike, Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;

use dealerdesk_admin::db::{InventoryRepository, RepositoryError};
use dealerdesk_admin::models::Vehicle;
use dealerdesk_core::{Vin, VinError};

/// Brands the generator draws from when none is given.
const BRANDS: [&str; 15] = [
    "BMW",
    "Mercedes-Benz",
    "Audi",
    "Volkswagen",
    "Ford",
    "Renault",
    "Peugeot",
    "Citroën",
    "Opel",
    "Fiat",
    "Toyota",
    "Honda",
    "Mazda",
    "Hyundai",
    "Kia",
];

/// Model ranges for the brands we know; anything else gets the generic one.
const MODELS: [(&str, &[&str]); 6] = [
    ("BMW", &["Serie 3", "Serie 5", "X3", "X5", "Z4"]),
    ("Mercedes-Benz", &["Clase A", "Clase C", "Clase E", "GLC", "GLE"]),
    ("Audi", &["A3", "A4", "A6", "Q3", "Q5"]),
    ("Volkswagen", &["Golf", "Passat", "Tiguan", "Polo"]),
    ("Ford", &["Focus", "Mondeo", "Kuga", "Fiesta"]),
    ("Renault", &["Clio", "Megane", "Scenic", "Captur"]),
];

const GENERIC_MODEL: [&str; 1] = ["Modelo Genérico"];

const COLORS: [&str; 10] = [
    "Blanco", "Negro", "Gris", "Plata", "Azul", "Rojo", "Marrón", "Verde", "Amarillo", "Naranja",
];

/// VIN alphabet per ISO 3779 (no I, O or Q).
const VIN_CHARSET: &[u8] = b"ABCDEFGHJKLMNPRSTUVWXYZ0123456789";

/// Consonants used on Spanish plates (vowels and Ñ/Q are excluded).
const PLATE_LETTERS: &[u8] = b"BCDFGHJKLMNPRSTVWXYZ";

const DIGITS: &[u8] = b"0123456789";

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Generated an invalid VIN: {0}")]
    Vin(#[from] VinError),
}

/// Seed the stock with `count` generated vehicles.
///
/// With `replace`, the existing stock is deleted first. With `brand`, every
/// generated vehicle carries that brand.
///
/// # Errors
///
/// Returns an error if the connection string is missing or a database
/// operation fails.
pub async fn run(count: usize, brand: Option<&str>, replace: bool) -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("ADMIN_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| SeedError::MissingEnvVar("ADMIN_DATABASE_URL"))?;

    // ThreadRng is not Send, so generate the batch before touching the pool.
    let vehicles = {
        let mut rng = rand::rng();
        (0..count)
            .map(|_| generate_vehicle(&mut rng, brand))
            .collect::<Result<Vec<_>, _>>()?
    };

    info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;
    let repository = InventoryRepository::new(&pool);

    if replace {
        let removed = repository.clear().await?;
        info!(removed, "Cleared existing stock");
    }

    for vehicle in &vehicles {
        repository.insert_vehicle(vehicle).await?;
    }

    info!(count, "Seeded vehicles");
    Ok(())
}

/// Generate one plausible vehicle.
fn generate_vehicle(rng: &mut impl Rng, brand: Option<&str>) -> Result<Vehicle, SeedError> {
    let brand = match brand {
        Some(brand) => brand,
        None => pick(rng, &BRANDS),
    };

    let models = MODELS
        .iter()
        .find(|(b, _)| *b == brand)
        .map_or(GENERIC_MODEL.as_slice(), |(_, models)| *models);

    let vin = Vin::parse(&random_string(rng, VIN_CHARSET, Vin::LENGTH))?;

    // Current Spanish plate format: four digits then three consonants.
    let license_plate = format!(
        "{}{}",
        random_string(rng, DIGITS, 4),
        random_string(rng, PLATE_LETTERS, 3)
    );

    // Registration between one month and ten years ago.
    let registered = Utc::now() - Duration::days(rng.random_range(30..=3650));

    let price: i64 = rng.random_range(5_000..=150_000);

    Ok(Vehicle {
        vin,
        license_plate: Some(license_plate),
        brand: Some(brand.to_string()),
        model: Some(pick(rng, models).to_string()),
        year: Some(registered.year()),
        mileage: Some(rng.random_range(1_000..=250_000)),
        sale_price: Some(Decimal::from(price)),
        color: Some(pick(rng, &COLORS).to_string()),
        days_in_stock: Some(rng.random_range(1..=365)),
        reserved: rng.random_bool(0.5),
        published: rng.random_bool(0.5),
        created_at: Utc::now(),
    })
}

fn pick<'a>(rng: &mut impl Rng, options: &[&'a str]) -> &'a str {
    let idx = rng.random_range(0..options.len());
    options.get(idx).copied().expect("idx within bounds")
}

fn random_string(rng: &mut impl Rng, charset: &[u8], length: usize) -> String {
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..charset.len());
            char::from(*charset.get(idx).expect("idx within bounds"))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_vehicle_has_valid_vin_and_plate() {
        let mut rng = rand::rng();

        for _ in 0..50 {
            let vehicle = generate_vehicle(&mut rng, None).unwrap();

            assert_eq!(vehicle.vin.as_str().len(), Vin::LENGTH);

            let plate = vehicle.license_plate.unwrap();
            assert_eq!(plate.len(), 7);
            assert!(plate.chars().take(4).all(|c| c.is_ascii_digit()));
            assert!(plate.bytes().skip(4).all(|b| PLATE_LETTERS.contains(&b)));
        }
    }

    #[test]
    fn test_generated_attributes_stay_in_range() {
        let mut rng = rand::rng();
        let this_year = Utc::now().year();

        for _ in 0..50 {
            let vehicle = generate_vehicle(&mut rng, None).unwrap();

            let year = vehicle.year.unwrap();
            assert!(year >= this_year - 11 && year <= this_year);

            let mileage = vehicle.mileage.unwrap();
            assert!((1_000..=250_000).contains(&mileage));

            let price = vehicle.sale_price.unwrap();
            assert!(price >= Decimal::from(5_000) && price <= Decimal::from(150_000));

            let days = vehicle.days_in_stock.unwrap();
            assert!((1..=365).contains(&days));
        }
    }

    #[test]
    fn test_brand_filter_keeps_models_coherent() {
        let mut rng = rand::rng();

        for _ in 0..20 {
            let vehicle = generate_vehicle(&mut rng, Some("BMW")).unwrap();
            assert_eq!(vehicle.brand.as_deref(), Some("BMW"));

            let model = vehicle.model.unwrap();
            assert!(["Serie 3", "Serie 5", "X3", "X5", "Z4"].contains(&model.as_str()));
        }
    }

    #[test]
    fn test_unknown_brand_gets_generic_model() {
        let mut rng = rand::rng();

        let vehicle = generate_vehicle(&mut rng, Some("Tesla")).unwrap();
        assert_eq!(vehicle.brand.as_deref(), Some("Tesla"));
        assert_eq!(vehicle.model.as_deref(), Some("Modelo Genérico"));
    }

    #[test]
    fn test_known_brands_have_model_ranges() {
        for (brand, models) in MODELS {
            assert!(BRANDS.contains(&brand));
            assert!(!models.is_empty());
        }
    }
}
