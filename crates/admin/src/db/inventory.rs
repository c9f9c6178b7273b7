//! Database operations for the vehicle stock.
//!
//! The stock is read through aggregates only: the chat context and the
//! stock-summary endpoint never page through individual vehicles.

use std::future::Future;

use sqlx::PgPool;
use tracing::{debug, instrument};

use super::RepositoryError;
use crate::models::vehicle::{BrandSummary, PRICE_BANDS, PriceBucket, StockSummary, Vehicle};

// =============================================================================
// Stats Source
// =============================================================================

/// Read access to the stock aggregates the AI context is built from.
///
/// Implemented by [`InventoryRepository`] for Postgres and by the in-memory
/// inventory in the context service for tests.
pub trait InventoryStats: Send + Sync {
    /// Aggregate counters and means over the whole stock.
    fn stock_summary(&self)
    -> impl Future<Output = Result<StockSummary, RepositoryError>> + Send;

    /// Top 10 brands by vehicle count, with per-brand means.
    fn brand_summary(&self)
    -> impl Future<Output = Result<Vec<BrandSummary>, RepositoryError>> + Send;

    /// Vehicle counts per fixed price band, empty bands omitted.
    fn price_histogram(&self)
    -> impl Future<Output = Result<Vec<PriceBucket>, RepositoryError>> + Send;
}

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for the stock summary query.
#[derive(Debug, sqlx::FromRow)]
struct StockSummaryRow {
    total: i64,
    available: i64,
    reserved: i64,
    published: i64,
    avg_price: f64,
    avg_mileage: f64,
    avg_days_in_stock: f64,
}

impl From<StockSummaryRow> for StockSummary {
    fn from(row: StockSummaryRow) -> Self {
        Self {
            total: row.total,
            available: row.available,
            reserved: row.reserved,
            published: row.published,
            avg_price: row.avg_price,
            avg_mileage: row.avg_mileage,
            avg_days_in_stock: row.avg_days_in_stock,
        }
    }
}

/// Internal row type for the per-brand aggregate query.
#[derive(Debug, sqlx::FromRow)]
struct BrandRow {
    brand: String,
    total: i64,
    avg_price: f64,
    avg_mileage: f64,
}

impl From<BrandRow> for BrandSummary {
    fn from(row: BrandRow) -> Self {
        Self {
            brand: row.brand,
            total: row.total,
            avg_price: row.avg_price,
            avg_mileage: row.avg_mileage,
        }
    }
}

/// Internal row type for the price histogram query, one count per band.
#[derive(Debug, sqlx::FromRow)]
struct HistogramRow {
    bucket_0: i64,
    bucket_1: i64,
    bucket_2: i64,
    bucket_3: i64,
    bucket_4: i64,
}

impl HistogramRow {
    const fn counts(&self) -> [i64; 5] {
        [
            self.bucket_0,
            self.bucket_1,
            self.bucket_2,
            self.bucket_3,
            self.bucket_4,
        ]
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for vehicle stock database operations.
pub struct InventoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InventoryRepository<'a> {
    /// Create a new inventory repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a vehicle, replacing any previous row with the same VIN.
    ///
    /// The daily refresh re-feeds the whole stock, so an existing VIN means
    /// updated attributes, not a conflict. `created_at` keeps the first
    /// insertion timestamp.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, vehicle), fields(vin = %vehicle.vin))]
    pub async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO vehicles
                (vin, license_plate, brand, model, year, mileage,
                 sale_price, color, days_in_stock, reserved, published)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (vin) DO UPDATE SET
                license_plate = EXCLUDED.license_plate,
                brand = EXCLUDED.brand,
                model = EXCLUDED.model,
                year = EXCLUDED.year,
                mileage = EXCLUDED.mileage,
                sale_price = EXCLUDED.sale_price,
                color = EXCLUDED.color,
                days_in_stock = EXCLUDED.days_in_stock,
                reserved = EXCLUDED.reserved,
                published = EXCLUDED.published
            ",
        )
        .bind(&vehicle.vin)
        .bind(vehicle.license_plate.as_deref())
        .bind(vehicle.brand.as_deref())
        .bind(vehicle.model.as_deref())
        .bind(vehicle.year)
        .bind(vehicle.mileage)
        .bind(vehicle.sale_price)
        .bind(vehicle.color.as_deref())
        .bind(vehicle.days_in_stock)
        .bind(vehicle.reserved)
        .bind(vehicle.published)
        .execute(self.pool)
        .await?;

        debug!("Upserted vehicle");
        Ok(())
    }

    /// Delete the whole stock. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM vehicles")
            .execute(self.pool)
            .await?;

        let removed = result.rows_affected();
        debug!(removed, "Cleared stock");
        Ok(removed)
    }
}

impl InventoryStats for InventoryRepository<'_> {
    /// Means skip null attributes and come back rounded to 2 decimals;
    /// an empty table yields zeros across the board.
    async fn stock_summary(&self) -> Result<StockSummary, RepositoryError> {
        let row: StockSummaryRow = sqlx::query_as(
            r"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE NOT reserved) AS available,
                   COUNT(*) FILTER (WHERE reserved) AS reserved,
                   COUNT(*) FILTER (WHERE published) AS published,
                   COALESCE(CAST(ROUND(AVG(sale_price), 2) AS DOUBLE PRECISION), 0) AS avg_price,
                   COALESCE(CAST(ROUND(AVG(mileage), 2) AS DOUBLE PRECISION), 0) AS avg_mileage,
                   COALESCE(CAST(ROUND(AVG(days_in_stock), 2) AS DOUBLE PRECISION), 0) AS avg_days_in_stock
            FROM vehicles
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Brands tie-break alphabetically so the ranking is stable across
    /// refreshes. Vehicles without a brand are not counted.
    async fn brand_summary(&self) -> Result<Vec<BrandSummary>, RepositoryError> {
        let rows: Vec<BrandRow> = sqlx::query_as(
            r"
            SELECT brand,
                   COUNT(*) AS total,
                   COALESCE(CAST(ROUND(AVG(sale_price), 2) AS DOUBLE PRECISION), 0) AS avg_price,
                   COALESCE(CAST(ROUND(AVG(mileage), 2) AS DOUBLE PRECISION), 0) AS avg_mileage
            FROM vehicles
            WHERE brand IS NOT NULL
            GROUP BY brand
            ORDER BY total DESC, brand
            LIMIT 10
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn price_histogram(&self) -> Result<Vec<PriceBucket>, RepositoryError> {
        let row: HistogramRow = sqlx::query_as(
            r"
            SELECT COUNT(*) FILTER (WHERE sale_price >= 0     AND sale_price < 10000) AS bucket_0,
                   COUNT(*) FILTER (WHERE sale_price >= 10000 AND sale_price < 20000) AS bucket_1,
                   COUNT(*) FILTER (WHERE sale_price >= 20000 AND sale_price < 30000) AS bucket_2,
                   COUNT(*) FILTER (WHERE sale_price >= 30000 AND sale_price < 50000) AS bucket_3,
                   COUNT(*) FILTER (WHERE sale_price >= 50000) AS bucket_4
            FROM vehicles
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(PRICE_BANDS
            .iter()
            .zip(row.counts())
            .filter(|&(_, count)| count > 0)
            .map(|(&(_, _, label), count)| PriceBucket {
                label: label.to_string(),
                count,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_row_counts_keep_band_order() {
        let row = HistogramRow {
            bucket_0: 1,
            bucket_1: 2,
            bucket_2: 3,
            bucket_3: 4,
            bucket_4: 5,
        };

        assert_eq!(row.counts(), [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_price_bands_cover_ascending_ranges() {
        for ((_, upper, _), (lower, _, _)) in PRICE_BANDS.iter().zip(PRICE_BANDS.iter().skip(1)) {
            assert_eq!(*upper, Some(*lower));
        }
        let (_, last_upper, _) = PRICE_BANDS.last().expect("at least one band");
        assert!(last_upper.is_none());
    }
}
