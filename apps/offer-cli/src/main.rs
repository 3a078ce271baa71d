//! # offer: Supplier Offer Form CLI
//!
//! ```bash
//! offer create "Trockenbau Schmidt GmbH" --positions lv.json
//! offer show <form-id>
//! offer price <form-id> <position-id> "1.234,50"
//! offer terms <form-id> --discount 3 --vat 19 --cash-discount 2 --days 14
//! offer submit <form-id> --confirm-incomplete
//! offer outbox
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::{error, info};

use offer_cli::{
    init_tracing, AppConfig, AppError, FormOverview, NewPosition, OfferService, TermsChange,
};
use offer_core::{
    format_number, parse_number_input, DiscountKind, OfferForm, ParsedNumber, PricingWarning,
};

#[derive(Parser)]
#[command(
    name = "offer",
    about = env!("CARGO_PKG_DESCRIPTION"),
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[arg(long, global = true, help = "Path to offer.toml (default: platform config dir)")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a draft form for a supplier
    Create {
        supplier: String,
        #[arg(long, help = "Calculation the request for quotation belongs to")]
        calculation: Option<String>,
        #[arg(long, help = "JSON file with the positions to price")]
        positions: Option<PathBuf>,
    },

    /// Show positions, totals and warnings
    Show { form_id: String },

    /// Enter a net unit price, German notation ("1.234,50"); empty clears it
    Price {
        form_id: String,
        position_id: String,
        price: String,
    },

    /// Set a position comment; omit the text to clear it
    Comment {
        form_id: String,
        position_id: String,
        text: Option<String>,
    },

    /// Set the comment for the whole offer; omit the text to clear it
    GeneralComment { form_id: String, text: Option<String> },

    /// Change discount, VAT and cash discount
    Terms {
        form_id: String,
        #[arg(long, value_parser = parse_german_decimal, help = "Discount, in percent unless --fixed")]
        discount: Option<Decimal>,
        #[arg(long, conflicts_with = "percent", help = "The discount is a fixed amount in €")]
        fixed: bool,
        #[arg(long, help = "The discount is a percentage")]
        percent: bool,
        #[arg(long, value_parser = parse_german_decimal, help = "VAT rate in percent")]
        vat: Option<Decimal>,
        #[arg(long, value_parser = parse_german_decimal, help = "Cash discount (Skonto) in percent")]
        cash_discount: Option<Decimal>,
        #[arg(long, help = "Payment days for the cash discount")]
        days: Option<u32>,
    },

    /// Hand in the offer and queue document generation
    Submit {
        form_id: String,
        #[arg(long, help = "Submit even though some positions have no price")]
        confirm_incomplete: bool,
    },

    /// List document requests waiting for delivery
    Outbox {
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
}

/// clap value parser for German number input.
fn parse_german_decimal(text: &str) -> Result<Decimal, String> {
    match parse_number_input(text) {
        ParsedNumber::Value(value) => Ok(value),
        ParsedNumber::Empty => Err("a number is required".to_string()),
        ParsedNumber::Invalid => Err(format!("'{}' is not a number", text)),
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => {}
        Err(err) => {
            let code = err
                .downcast_ref::<AppError>()
                .map(AppError::exit_code)
                .unwrap_or(1);
            error!(error = %err, "Command failed");
            eprintln!("error: {err}");
            std::process::exit(code);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config)?;
    let service = OfferService::connect(config).await?;

    let result = dispatch(&service, cli.command).await;
    service.close().await;
    result
}

async fn dispatch(service: &OfferService, command: Command) -> Result<()> {
    match command {
        Command::Create {
            supplier,
            calculation,
            positions,
        } => {
            let positions = match positions {
                Some(path) => read_positions(path)?,
                None => Vec::new(),
            };
            let form = service
                .create_form(&supplier, calculation.as_deref(), positions)
                .await?;
            println!("{}", form.meta.id);
        }

        Command::Show { form_id } => {
            let overview = service.overview(&form_id).await?;
            print_overview(&overview);
        }

        Command::Price {
            form_id,
            position_id,
            price,
        } => {
            let form = service.set_price(&form_id, &position_id, &price).await?;
            print_totals(&form);
        }

        Command::Comment {
            form_id,
            position_id,
            text,
        } => {
            service
                .set_comment(&form_id, &position_id, text.as_deref())
                .await?;
            println!("Comment saved.");
        }

        Command::GeneralComment { form_id, text } => {
            service.set_general_comment(&form_id, text.as_deref()).await?;
            println!("Comment saved.");
        }

        Command::Terms {
            form_id,
            discount,
            fixed,
            percent,
            vat,
            cash_discount,
            days,
        } => {
            let discount_kind = match (fixed, percent) {
                (true, _) => Some(DiscountKind::Fixed),
                (_, true) => Some(DiscountKind::Percentage),
                _ => None,
            };
            let change = TermsChange {
                discount_kind,
                discount_value: discount,
                vat_rate_percent: vat,
                cash_discount_rate_percent: cash_discount,
                cash_discount_days: days,
            };
            if change.is_empty() {
                println!("Nothing to change.");
                return Ok(());
            }
            let form = service.update_terms(&form_id, &change).await?;
            print_totals(&form);
        }

        Command::Submit {
            form_id,
            confirm_incomplete,
        } => {
            let receipt = service.submit(&form_id, confirm_incomplete).await?;
            info!(form_id = %receipt.form_id, outbox_id = %receipt.document.id, "Submitted");

            println!("Offer {} submitted.", receipt.form_id);
            if receipt.missing_prices > 0 {
                println!("{} position(s) without price.", receipt.missing_prices);
            }
            println!(
                "Final gross total: {} €",
                format_number(receipt.pricing.final_gross_total)
            );
            println!("Document request queued ({}).", receipt.document.id);
        }

        Command::Outbox { limit } => {
            let entries = service.pending_documents(limit).await?;
            if entries.is_empty() {
                println!("No pending document requests.");
            }
            for entry in entries {
                println!(
                    "{}  form {}  attempts {}  {}{}",
                    entry.created_at.format("%Y-%m-%d %H:%M"),
                    entry.form_id,
                    entry.attempts,
                    entry.webhook_url,
                    entry
                        .last_error
                        .map(|e| format!("  last error: {e}"))
                        .unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}

fn read_positions(path: PathBuf) -> Result<Vec<NewPosition>> {
    let text = std::fs::read_to_string(&path).map_err(|source| AppError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

// =============================================================================
// Output
// =============================================================================

fn money(value: Decimal) -> String {
    format!("{} €", format_number(value))
}

fn print_overview(overview: &FormOverview) {
    let form = &overview.form;

    println!("Offer for {}", form.meta.supplier_name);
    println!("Form {}  status: {}", form.meta.id, form.meta.status.as_str());
    println!();

    for position in &form.positions {
        let quantity = position
            .quantity
            .map(|q| format!("{} {}", format_number(q), position.unit.as_deref().unwrap_or("")))
            .unwrap_or_else(|| "psch".to_string());
        let price = position
            .unit_price_net
            .map(money)
            .unwrap_or_else(|| "—".to_string());

        println!(
            "{:<12} {:<40} {:>14} {:>14} {:>14}",
            position.ordinal.as_deref().unwrap_or("-"),
            position.description,
            quantity,
            price,
            money(position.line_total())
        );
        println!("             id {}", position.id);
        if let Some(ref comment) = position.comment {
            println!("             » {}", comment);
        }
    }

    let p = &overview.pricing;
    println!();
    println!("Net total:              {:>16}", money(p.net_total));
    println!(
        "Discount ({} %):{:>24}",
        format_number(overview.discount.percentage),
        money(p.discount_amount)
    );
    println!("Net after discount:     {:>16}", money(p.net_after_discount));
    println!(
        "VAT ({} %):{:>29}",
        format_number(form.terms.vat_rate_percent),
        money(p.vat_amount)
    );
    println!("Gross total:            {:>16}", money(p.gross_total));
    if form.terms.cash_discount_rate_percent > Decimal::ZERO {
        println!(
            "Cash discount {} % / {} days: {:>10}",
            format_number(form.terms.cash_discount_rate_percent),
            form.terms.cash_discount_days,
            money(p.cash_discount_amount)
        );
    }
    println!("Final gross total:      {:>16}", money(p.final_gross_total));
    println!("Final net total:        {:>16}", money(p.final_net_total));

    if let Some(ref comment) = form.meta.general_comment {
        println!();
        println!("Comment: {}", comment);
    }

    if overview.missing_prices > 0 {
        println!();
        println!("{} position(s) without price.", overview.missing_prices);
    }

    for warning in &overview.warnings {
        println!("warning: {}", describe_warning(warning));
    }
}

fn print_totals(form: &OfferForm) {
    let p = form.pricing().rounded();
    println!(
        "Net {}  ·  Gross {}  ·  Final {}",
        money(p.net_total),
        money(p.gross_total),
        money(p.final_gross_total)
    );
    for warning in form.warnings() {
        println!("warning: {}", describe_warning(&warning));
    }
}

fn describe_warning(warning: &PricingWarning) -> String {
    match warning {
        PricingWarning::DiscountExceedsNetTotal {
            discount_amount,
            net_total,
        } => format!(
            "discount {} exceeds the net total {}",
            money(*discount_amount),
            money(*net_total)
        ),
        PricingWarning::NegativeGrossTotal { final_gross_total } => {
            format!("final gross total is negative ({})", money(*final_gross_total))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::str::FromStr;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_german_decimal() {
        assert_eq!(
            parse_german_decimal("1.234,5").unwrap(),
            Decimal::from_str("1234.5").unwrap()
        );
        assert!(parse_german_decimal("").is_err());
        assert!(parse_german_decimal("abc").is_err());
    }

    #[test]
    fn test_terms_arguments() {
        let cli = Cli::try_parse_from([
            "offer", "terms", "abc", "--discount", "150,00", "--fixed", "--days", "14",
        ])
        .unwrap();

        match cli.command {
            Command::Terms {
                discount,
                fixed,
                days,
                vat,
                ..
            } => {
                assert_eq!(discount, Some(Decimal::from(150)));
                assert!(fixed);
                assert_eq!(days, Some(14));
                assert_eq!(vat, None);
            }
            _ => panic!("expected terms"),
        }

        assert!(Cli::try_parse_from(["offer", "terms", "abc", "--fixed", "--percent"]).is_err());
    }
}
