//! Integration tests for the stock context block.
//!
//! These tests run `build_context` end to end over the in-memory stats
//! source and pin the exact wording the assistant's instructions reference.

use chrono::Utc;
use rust_decimal::Decimal;

use dealerdesk_admin::db::InventoryStats;
use dealerdesk_admin::models::Vehicle;
use dealerdesk_admin::services::{InMemoryInventory, build_context};
use dealerdesk_core::Vin;

// =============================================================================
// Fixtures
// =============================================================================

fn vehicle(
    serial: u32,
    brand: &str,
    price: i64,
    mileage: i32,
    days_in_stock: i32,
    reserved: bool,
    published: bool,
) -> Vehicle {
    Vehicle {
        vin: Vin::parse(&format!("WVWZZZ1JZXW{serial:06}")).expect("valid vin"),
        license_plate: Some(format!("{serial:04}KTR")),
        brand: Some(brand.to_string()),
        model: None,
        year: Some(2021),
        mileage: Some(mileage),
        sale_price: Some(Decimal::from(price)),
        color: Some("Gris".to_string()),
        days_in_stock: Some(days_in_stock),
        reserved,
        published,
        created_at: Utc::now(),
    }
}

// =============================================================================
// Full Block Rendering
// =============================================================================

#[tokio::test]
async fn test_context_block_is_rendered_exactly() {
    let inventory = InMemoryInventory::new(vec![
        vehicle(1, "BMW", 25_000, 40_000, 10, false, true),
        vehicle(2, "BMW", 35_000, 60_000, 30, true, false),
    ]);

    let context = build_context(&inventory).await.expect("build context");

    let expected = concat!(
        "\nINFORMACIÓN DEL STOCK ACTUAL:\n",
        "\n",
        "Resumen General:\n",
        "- Total de vehículos: 2\n",
        "- Disponibles: 1\n",
        "- Reservados: 1\n",
        "- Publicados en internet: 1\n",
        "- Precio promedio: 30,000.00 €\n",
        "- Kilómetros promedio: 50,000 km\n",
        "- Días promedio en stock: 20 días\n",
        "\n",
        "Marcas Principales (Top 10):\n",
        "- BMW: 2 unidades, precio medio 30,000.00 €\n",
        "\n",
        "Distribución por Precio:\n",
        "- 20k-30k: 1 vehículos\n",
        "- 30k-50k: 1 vehículos\n",
        "\n",
        "Puedes ayudar al usuario a:\n",
        "1. Buscar vehículos por marca, modelo, precio, kilómetros, año, color\n",
        "2. Obtener estadísticas del stock\n",
        "3. Comparar vehículos\n",
        "4. Sugerir vehículos según criterios\n",
        "5. Información sobre disponibilidad y precios\n",
    );

    assert_eq!(context, expected);
}

#[tokio::test]
async fn test_empty_stock_renders_zeros() {
    let context = build_context(&InMemoryInventory::default())
        .await
        .expect("build context");

    assert!(context.contains("- Total de vehículos: 0\n"));
    assert!(context.contains("- Disponibles: 0\n"));
    assert!(context.contains("- Precio promedio: 0.00 €\n"));
    assert!(context.contains("- Kilómetros promedio: 0 km\n"));
    assert!(context.contains("- Días promedio en stock: 0 días\n"));

    // No brand lines and no price buckets, but both headers stay.
    assert!(context.contains("Marcas Principales (Top 10):\n\nDistribución por Precio:\n"));
}

// =============================================================================
// Aggregate Behavior
// =============================================================================

#[tokio::test]
async fn test_available_and_reserved_sum_to_total() {
    let inventory = InMemoryInventory::new(vec![
        vehicle(1, "Audi", 12_000, 90_000, 120, true, true),
        vehicle(2, "Audi", 14_000, 80_000, 60, false, true),
        vehicle(3, "Kia", 9_000, 30_000, 15, true, false),
        vehicle(4, "Kia", 11_000, 50_000, 45, false, false),
        vehicle(5, "Kia", 16_000, 70_000, 90, false, true),
    ]);

    let summary = inventory.stock_summary().await.expect("summary");

    assert_eq!(summary.total, 5);
    assert_eq!(summary.reserved, 2);
    assert_eq!(summary.available + summary.reserved, summary.total);
    assert_eq!(summary.published, 3);
}

#[tokio::test]
async fn test_top_brands_rank_by_count_then_name() {
    let mut vehicles = Vec::new();
    for serial in 0..3 {
        vehicles.push(vehicle(serial, "Renault", 15_000, 60_000, 30, false, true));
    }
    // Two brands tied at 2 units; the alphabetical one must come first.
    for serial in 10..12 {
        vehicles.push(vehicle(serial, "Toyota", 22_000, 40_000, 20, false, true));
    }
    for serial in 20..22 {
        vehicles.push(vehicle(serial, "Ford", 18_000, 50_000, 25, false, true));
    }

    let brands = InMemoryInventory::new(vehicles)
        .brand_summary()
        .await
        .expect("brands");

    let names: Vec<&str> = brands.iter().map(|b| b.brand.as_str()).collect();
    assert_eq!(names, vec!["Renault", "Ford", "Toyota"]);

    for (current, next) in brands.iter().zip(brands.iter().skip(1)) {
        assert!(current.total >= next.total);
    }
}

#[tokio::test]
async fn test_top_brands_keep_at_most_ten() {
    let brands = [
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
    ];

    let vehicles: Vec<Vehicle> = brands
        .iter()
        .enumerate()
        .map(|(i, brand)| {
            vehicle(
                u32::try_from(i).expect("small index"),
                brand,
                20_000,
                50_000,
                30,
                false,
                true,
            )
        })
        .collect();

    let summary = InMemoryInventory::new(vehicles)
        .brand_summary()
        .await
        .expect("brands");

    assert_eq!(summary.len(), 10);
}

#[tokio::test]
async fn test_price_histogram_skips_empty_bands() {
    let inventory = InMemoryInventory::new(vec![
        vehicle(1, "Fiat", 5_000, 120_000, 200, false, true),
        vehicle(2, "Audi", 25_000, 30_000, 12, false, true),
    ]);

    let buckets = inventory.price_histogram().await.expect("histogram");

    let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["0-10k", "20k-30k"]);
    assert!(buckets.iter().all(|b| b.count == 1));
}

#[tokio::test]
async fn test_histogram_counts_sum_to_priced_vehicles() {
    let mut unpriced = vehicle(4, "Seat", 1, 95_000, 80, false, false);
    unpriced.sale_price = None;

    let inventory = InMemoryInventory::new(vec![
        vehicle(1, "Seat", 8_000, 110_000, 140, false, true),
        vehicle(2, "Seat", 12_000, 70_000, 60, true, true),
        vehicle(3, "Seat", 62_000, 10_000, 9, false, true),
        unpriced,
    ]);

    let buckets = inventory.price_histogram().await.expect("histogram");

    // The vehicle without a price is excluded from every band.
    let counted: i64 = buckets.iter().map(|b| b.count).sum();
    assert_eq!(counted, 3);
}

#[tokio::test]
async fn test_price_histogram_last_band_is_open_ended() {
    let inventory = InMemoryInventory::new(vec![vehicle(
        1, "Porsche", 185_000, 12_000, 5, false, true,
    )]);

    let buckets = inventory.price_histogram().await.expect("histogram");

    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets.first().expect("one bucket").label, "50k+");
}
