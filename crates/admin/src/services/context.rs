//! Stock context for the AI assistant.
//!
//! Builds the natural-language snapshot of the current stock that gets
//! injected into the system prompt: general counters, the top-10 brands and
//! the price distribution, all in the fixed wording the assistant was tuned
//! against. The block is Spanish prose but numbers keep the feed's reporting
//! format (comma-grouped thousands, dot decimals).

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::db::{InventoryStats, RepositoryError};
use crate::models::vehicle::{BrandSummary, PRICE_BANDS, PriceBucket, StockSummary, Vehicle};

/// Build the context block from any stats source.
///
/// One aggregate pass over the stock, then pure rendering. No side effects.
///
/// # Errors
///
/// Propagates the store error when an aggregate query fails.
pub async fn build_context<S: InventoryStats>(stats: &S) -> Result<String, RepositoryError> {
    let summary = stats.stock_summary().await?;
    let brands = stats.brand_summary().await?;
    let buckets = stats.price_histogram().await?;

    Ok(render_context(&summary, &brands, &buckets))
}

/// Render the fixed-format stock block.
///
/// The wording and spacing are load-bearing: the assistant's instructions
/// reference these exact section headers.
#[must_use]
pub fn render_context(
    summary: &StockSummary,
    brands: &[BrandSummary],
    buckets: &[PriceBucket],
) -> String {
    let mut context = format!(
        "\nINFORMACIÓN DEL STOCK ACTUAL:\n\
         \n\
         Resumen General:\n\
         - Total de vehículos: {}\n\
         - Disponibles: {}\n\
         - Reservados: {}\n\
         - Publicados en internet: {}\n\
         - Precio promedio: {} €\n\
         - Kilómetros promedio: {} km\n\
         - Días promedio en stock: {} días\n\
         \n\
         Marcas Principales (Top 10):\n",
        summary.total,
        summary.available,
        summary.reserved,
        summary.published,
        format_price(summary.avg_price),
        format_km(summary.avg_mileage),
        format_days(summary.avg_days_in_stock),
    );

    for brand in brands {
        context.push_str(&format!(
            "- {}: {} unidades, precio medio {} €\n",
            brand.brand,
            brand.total,
            format_price(brand.avg_price)
        ));
    }

    context.push_str("\nDistribución por Precio:\n");
    for bucket in buckets {
        context.push_str(&format!("- {}: {} vehículos\n", bucket.label, bucket.count));
    }

    context.push_str(
        "\nPuedes ayudar al usuario a:\n\
         1. Buscar vehículos por marca, modelo, precio, kilómetros, año, color\n\
         2. Obtener estadísticas del stock\n\
         3. Comparar vehículos\n\
         4. Sugerir vehículos según criterios\n\
         5. Información sobre disponibilidad y precios\n",
    );

    context
}

// =============================================================================
// Number Formatting
// =============================================================================

/// Price with comma-grouped thousands and two decimals (`31,250.00`).
fn format_price(value: f64) -> String {
    group_thousands(&format!("{value:.2}"))
}

/// Mileage rounded to an integer with comma-grouped thousands (`87,412`).
fn format_km(value: f64) -> String {
    group_thousands(&format!("{value:.0}"))
}

/// Days rounded to an integer, no grouping.
fn format_days(value: f64) -> String {
    format!("{value:.0}")
}

/// Insert `,` separators into the integer part of a plain decimal string.
fn group_thousands(raw: &str) -> String {
    let (integer, fraction) = raw
        .split_once('.')
        .map_or((raw, None), |(int, frac)| (int, Some(frac)));
    let (sign, digits) = integer
        .strip_prefix('-')
        .map_or(("", integer), |rest| ("-", rest));

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match fraction {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

// =============================================================================
// In-Memory Stats Source
// =============================================================================

/// Stats source over an in-process vehicle list.
///
/// Computes the same aggregates as the Postgres queries, including the
/// round-to-2-decimals on means, so context tests run without a database.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventory {
    vehicles: Vec<Vehicle>,
}

impl InMemoryInventory {
    /// Create a stats source over the given vehicles.
    #[must_use]
    pub const fn new(vehicles: Vec<Vehicle>) -> Self {
        Self { vehicles }
    }
}

impl InventoryStats for InMemoryInventory {
    #[allow(clippy::cast_possible_wrap)]
    async fn stock_summary(&self) -> Result<StockSummary, RepositoryError> {
        let total = self.vehicles.len() as i64;
        let reserved = self.vehicles.iter().filter(|v| v.reserved).count() as i64;
        let published = self.vehicles.iter().filter(|v| v.published).count() as i64;

        Ok(StockSummary {
            total,
            available: total - reserved,
            reserved,
            published,
            avg_price: mean(self.vehicles.iter().filter_map(price_as_f64)),
            avg_mileage: mean(self.vehicles.iter().filter_map(|v| v.mileage.map(f64::from))),
            avg_days_in_stock: mean(
                self.vehicles
                    .iter()
                    .filter_map(|v| v.days_in_stock.map(f64::from)),
            ),
        })
    }

    #[allow(clippy::cast_possible_wrap)]
    async fn brand_summary(&self) -> Result<Vec<BrandSummary>, RepositoryError> {
        let mut groups: BTreeMap<&str, Vec<&Vehicle>> = BTreeMap::new();
        for vehicle in &self.vehicles {
            if let Some(brand) = vehicle.brand.as_deref() {
                groups.entry(brand).or_default().push(vehicle);
            }
        }

        let mut brands: Vec<BrandSummary> = groups
            .into_iter()
            .map(|(brand, vehicles)| BrandSummary {
                brand: brand.to_string(),
                total: vehicles.len() as i64,
                avg_price: mean(vehicles.iter().copied().filter_map(price_as_f64)),
                avg_mileage: mean(vehicles.iter().filter_map(|v| v.mileage.map(f64::from))),
            })
            .collect();

        brands.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.brand.cmp(&b.brand)));
        brands.truncate(10);
        Ok(brands)
    }

    #[allow(clippy::cast_possible_wrap)]
    async fn price_histogram(&self) -> Result<Vec<PriceBucket>, RepositoryError> {
        let buckets = PRICE_BANDS
            .iter()
            .filter_map(|&(lower, upper, label)| {
                let count = self
                    .vehicles
                    .iter()
                    .filter_map(|v| v.sale_price)
                    .filter(|price| {
                        *price >= Decimal::from(lower)
                            && upper.is_none_or(|u| *price < Decimal::from(u))
                    })
                    .count();

                (count > 0).then(|| PriceBucket {
                    label: label.to_string(),
                    count: count as i64,
                })
            })
            .collect();

        Ok(buckets)
    }
}

fn price_as_f64(vehicle: &Vehicle) -> Option<f64> {
    vehicle.sale_price.and_then(|price| price.to_f64())
}

/// Mean over the given values rounded to 2 decimals, 0 when empty.
///
/// Rounds half away from zero, as the SQL `ROUND` does.
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (count, sum) = values.fold((0_u32, 0.0), |(count, sum), v| (count + 1, sum + v));
    if count == 0 {
        0.0
    } else {
        let raw = sum / f64::from(count);
        (raw * 100.0).round() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price_groups_thousands() {
        assert_eq!(format_price(31_250.0), "31,250.00");
        assert_eq!(format_price(1_234_567.891), "1,234,567.89");
    }

    #[test]
    fn test_format_price_small_values_ungrouped() {
        assert_eq!(format_price(0.0), "0.00");
        assert_eq!(format_price(999.5), "999.50");
    }

    #[test]
    fn test_format_km_groups_and_truncates_decimals() {
        assert_eq!(format_km(87_412.3), "87,412");
        assert_eq!(format_km(0.0), "0");
    }

    #[test]
    fn test_format_days_never_groups() {
        assert_eq!(format_days(142.4), "142");
        assert_eq!(format_days(1424.0), "1424");
    }

    #[test]
    fn test_mean_skips_nothing_and_rounds() {
        let values = [10.0, 11.0, 11.5];
        assert!((mean(values.into_iter()) - 10.83).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mean_of_empty_is_zero() {
        assert!(mean(std::iter::empty()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_render_context_with_empty_stock() {
        let summary = StockSummary {
            total: 0,
            available: 0,
            reserved: 0,
            published: 0,
            avg_price: 0.0,
            avg_mileage: 0.0,
            avg_days_in_stock: 0.0,
        };

        let context = render_context(&summary, &[], &[]);

        assert!(context.contains("- Total de vehículos: 0\n"));
        assert!(context.contains("- Precio promedio: 0.00 €\n"));
        assert!(context.contains("- Kilómetros promedio: 0 km\n"));
        assert!(context.contains("- Días promedio en stock: 0 días\n"));
        assert!(context.contains("Marcas Principales (Top 10):\n\nDistribución por Precio:\n"));
    }

    #[test]
    fn test_render_context_lists_brands_and_buckets() {
        let summary = StockSummary {
            total: 3,
            available: 2,
            reserved: 1,
            published: 2,
            avg_price: 21_833.33,
            avg_mileage: 74_000.0,
            avg_days_in_stock: 88.0,
        };
        let brands = vec![BrandSummary {
            brand: "BMW".to_string(),
            total: 2,
            avg_price: 27_250.0,
            avg_mileage: 65_000.0,
        }];
        let buckets = vec![
            PriceBucket {
                label: "10k-20k".to_string(),
                count: 1,
            },
            PriceBucket {
                label: "20k-30k".to_string(),
                count: 2,
            },
        ];

        let context = render_context(&summary, &brands, &buckets);

        assert!(context.contains("- Precio promedio: 21,833.33 €\n"));
        assert!(context.contains("- BMW: 2 unidades, precio medio 27,250.00 €\n"));
        assert!(context.contains("- 10k-20k: 1 vehículos\n"));
        assert!(context.contains("- 20k-30k: 2 vehículos\n"));
    }
}
