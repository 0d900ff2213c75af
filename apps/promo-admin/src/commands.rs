//! # Operator Commands
//!
//! ```text
//! promo-admin [--config PATH] <command>   (see `cli`)
//!
//!   list                              all promotions, active first marker
//!   create <name>                     new inactive buy-3-pay-2 promotion
//!   activate <id>                     make <id> the only active promotion
//!   deactivate-all                    switch every promotion off
//!   rename <id> <name> <version>      compare-and-swap rename
//!   delete <id>                       remove a promotion
//!   price <cents>x<qty> ...           price a cart against the live promotion
//! ```

use anyhow::Result;
use promo_core::PromotionKind;
use promo_sync::{ActivationController, ChangeNotifier, ClientConfig, PromotionClient, PromotionStore};
use std::sync::Arc;
use tracing::debug;

use crate::cli::{cart_lines, Command};

/// What every command runs against.
pub struct AdminState {
    pub store: Arc<dyn PromotionStore>,
    pub notifier: ChangeNotifier,
    pub client: ClientConfig,
}

/// Runs `command` against an opened store.
pub async fn execute(command: Command, state: &AdminState) -> Result<()> {
    let controller = ActivationController::new(state.store.clone(), state.notifier.clone());

    match command {
        Command::List => {
            for promo in controller.list_all().await? {
                println!(
                    "{} {}  {:<32} v{}  {}",
                    if promo.is_active { "*" } else { " " },
                    promo.id,
                    promo.name,
                    promo.version,
                    promo.kind
                );
            }
        }
        Command::Create { name } => {
            let promo = controller.create_promotion(&name, PromotionKind::BuyThreePayTwo).await?;
            println!("created {} ({})", promo.id, promo.name);
        }
        Command::Activate { id } => {
            let promo = controller.set_active(&id).await?;
            println!("active: {} ({})", promo.id, promo.name);
        }
        Command::DeactivateAll => {
            let changed = controller.deactivate_all().await?;
            println!("deactivated {}", changed);
        }
        Command::Rename { id, name, expected_version } => {
            let promo = controller.rename_promotion(&id, &name, expected_version).await?;
            println!("renamed {} to {:?} (v{})", promo.id, promo.name, promo.version);
        }
        Command::Delete { id } => {
            controller.delete_promotion(&id).await?;
            println!("deleted {}", id);
        }
        Command::Price { items } => {
            let lines = cart_lines(&items);
            let mut client =
                PromotionClient::spawn(state.store.clone(), &state.notifier, state.client.clone());
            let snapshot = client.wait_until_resolved().await?;
            debug!(generation = snapshot.generation, "Client resolved");

            let result = client.price(&lines)?;
            client.close().await;

            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
