//! CLI argument definitions using clap
//!
//! Commands:
//! - promo-admin list
//! - promo-admin create <name>
//! - promo-admin activate <id>
//! - promo-admin deactivate-all
//! - promo-admin rename <id> <name> <version>
//! - promo-admin delete <id>
//! - promo-admin price <cents>x<qty>...

use clap::{Parser, Subcommand};
use promo_core::CartLine;
use std::path::PathBuf;

/// Operator tool for storefront promotions
#[derive(Parser, Debug)]
#[command(name = "promo-admin")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to promotions.toml (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List all promotions; the active one is marked with `*`
    List,

    /// Create a new, inactive buy-3-pay-2 promotion
    Create { name: String },

    /// Make a promotion the only active one
    Activate { id: String },

    /// Switch every promotion off
    DeactivateAll,

    /// Rename a promotion if its version is still `expected_version`
    Rename {
        id: String,
        name: String,
        expected_version: i64,
    },

    /// Delete a promotion
    Delete { id: String },

    /// Price a cart against the live promotion
    Price {
        /// Cart items as `<cents>x<qty>`, e.g. `1299x2`
        #[arg(required = true, value_parser = parse_cart_item)]
        items: Vec<CartItem>,
    },
}

/// One `<cents>x<qty>` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartItem {
    pub price_cents: i64,
    pub quantity: i64,
}

fn parse_cart_item(item: &str) -> Result<CartItem, String> {
    let (price, qty) = item
        .split_once('x')
        .ok_or_else(|| format!("{:?} must look like <cents>x<qty>", item))?;

    Ok(CartItem {
        price_cents: price
            .parse()
            .map_err(|e| format!("bad price in {:?}: {}", item, e))?,
        quantity: qty
            .parse()
            .map_err(|e| format!("bad quantity in {:?}: {}", item, e))?,
    })
}

/// Turns parsed items into cart lines named `item-1`, `item-2`, ...
pub fn cart_lines(items: &[CartItem]) -> Vec<CartLine> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| CartLine::new(format!("item-{}", i + 1), item.price_cents, item.quantity))
        .collect()
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
