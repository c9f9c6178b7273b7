//! Vehicle stock domain models.
//!
//! The stock table is refreshed daily by the seeder (or, in production, by
//! the dealer feed import), so most vehicle attributes are nullable: feeds
//! routinely omit mileage, price or color for freshly registered units.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dealerdesk_core::Vin;

/// A vehicle in stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    /// Vehicle identification number (primary key).
    pub vin: Vin,
    /// License plate, when registered.
    pub license_plate: Option<String>,
    /// Brand (e.g., "BMW").
    pub brand: Option<String>,
    /// Model (e.g., "Serie 3").
    pub model: Option<String>,
    /// Registration year.
    pub year: Option<i32>,
    /// Mileage in kilometers.
    pub mileage: Option<i32>,
    /// Asking price in euros.
    pub sale_price: Option<Decimal>,
    /// Body color.
    pub color: Option<String>,
    /// Days the vehicle has been in stock.
    pub days_in_stock: Option<i32>,
    /// Whether the vehicle is reserved by a customer.
    pub reserved: bool,
    /// Whether the vehicle is published on the web.
    pub published: bool,
    /// When the row was inserted.
    pub created_at: DateTime<Utc>,
}

/// Aggregate counters and means over the whole stock.
///
/// Means are computed over non-null values only and reported as 0 when no
/// row carries the attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockSummary {
    /// Total vehicles in stock.
    pub total: i64,
    /// Vehicles not reserved.
    pub available: i64,
    /// Vehicles reserved by a customer.
    pub reserved: i64,
    /// Vehicles published on the web.
    pub published: i64,
    /// Mean asking price in euros.
    pub avg_price: f64,
    /// Mean mileage in kilometers.
    pub avg_mileage: f64,
    /// Mean days in stock.
    pub avg_days_in_stock: f64,
}

/// Per-brand aggregate for the top-brands ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandSummary {
    /// Brand name.
    pub brand: String,
    /// Number of vehicles of this brand.
    pub total: i64,
    /// Mean asking price for the brand.
    pub avg_price: f64,
    /// Mean mileage for the brand.
    pub avg_mileage: f64,
}

/// One non-empty bucket of the price histogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBucket {
    /// Bucket label (e.g., "10k-20k").
    pub label: String,
    /// Vehicles whose price falls in the bucket.
    pub count: i64,
}

/// Fixed sale-price bands for the stock histogram, in euros.
///
/// Each entry is `(lower inclusive, upper exclusive, label)`; the last band
/// is open-ended. Vehicles without a price fall outside every band.
pub const PRICE_BANDS: [(u32, Option<u32>, &str); 5] = [
    (0, Some(10_000), "0-10k"),
    (10_000, Some(20_000), "10k-20k"),
    (20_000, Some(30_000), "20k-30k"),
    (30_000, Some(50_000), "30k-50k"),
    (50_000, None, "50k+"),
];
