//! # Seed Data Generator
//!
//! Inserts a demo offer form for development.
//!
//! ## Usage
//! ```bash
//! # One form for the default supplier
//! cargo run -p offer-db --bin seed
//!
//! # Specify database path and supplier
//! cargo run -p offer-db --bin seed -- --db ./data/offer.db --supplier "Maler Meier"
//! ```
//!
//! ## Generated Form
//! A draft drywall and painting bill of quantities: positions with
//! ordinal numbers, quantities and units, one lump-sum position, no prices.
//! The form id is printed so it can be passed to the `offer` CLI.

use chrono::Utc;
use offer_core::{FormMeta, FormPosition, FormStatus, OfferTerms};
use offer_db::{Database, DbConfig};
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use uuid::Uuid;

/// (ordinal, description, quantity, unit, long text)
const POSITIONS: &[(&str, &str, Option<&str>, &str, &str)] = &[
    (
        "01.0010",
        "Baustelleneinrichtung",
        None,
        "psch",
        "Einrichten und Räumen der Baustelle inkl. Schuttcontainer.",
    ),
    (
        "01.0020",
        "GK-Ständerwand 100 mm",
        Some("184.5"),
        "m²",
        "Metallständerwand, beidseitig einlagig beplankt, Q2.",
    ),
    (
        "01.0030",
        "Vorsatzschale 50 mm",
        Some("62"),
        "m²",
        "Freistehende Vorsatzschale mit Mineralwolle 40 mm.",
    ),
    (
        "01.0040",
        "Revisionsöffnung 30x30",
        Some("6"),
        "Stk",
        "Revisionsklappe, flächenbündig, gespachtelt.",
    ),
    (
        "02.0010",
        "Dispersionsanstrich Wand",
        Some("412.75"),
        "m²",
        "Zweifacher Anstrich, scheuerbeständig Klasse 2, weiß.",
    ),
    (
        "02.0020",
        "Tiefengrund",
        Some("412.75"),
        "m²",
        "Grundierung auf Gipskarton, lösemittelfrei.",
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./offer_dev.db");
    let mut supplier = String::from("Trockenbau Schmidt GmbH");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--supplier" | "-s" => {
                if i + 1 < args.len() {
                    supplier = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Offer Form Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: ./offer_dev.db)");
                println!("  -s, --supplier <NAME>    Supplier the form is addressed to");
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Offer Form Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!("Supplier: {}", supplier);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let now = Utc::now();
    let form_id = Uuid::new_v4().to_string();

    let meta = FormMeta {
        id: form_id.clone(),
        supplier_name: supplier,
        status: FormStatus::Draft,
        calculation_id: Some(format!("KALK-{}", now.format("%Y%m%d"))),
        general_comment: None,
        created_at: now,
        updated_at: now,
    };
    db.forms().insert_meta(&meta, &OfferTerms::default()).await?;

    for (ordinal, description, quantity, unit, long_text) in POSITIONS {
        let position = FormPosition {
            id: Uuid::new_v4().to_string(),
            form_id: form_id.clone(),
            ordinal: Some(ordinal.to_string()),
            description: description.to_string(),
            quantity: quantity.map(Decimal::from_str).transpose()?,
            unit: Some(unit.to_string()),
            unit_price_net: None,
            item_number: None,
            long_text: Some(long_text.to_string()),
            comment: None,
            created_at: now,
            updated_at: now,
        };
        db.forms().insert_position(&position).await?;
    }

    println!("✓ Inserted {} positions", POSITIONS.len());
    println!("✓ Forms in database: {}", db.forms().count().await?);
    println!();
    println!("Form id: {}", form_id);
    println!("Try:     offer show {}", form_id);

    db.close().await;
    Ok(())
}
