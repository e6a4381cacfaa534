//! Subcommand handlers. Each one is a single service call plus rendering.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};

use crate::output::Output;
use topup_core::{Money, PaymentMethod};
use topup_service::{PurchaseRequest, TopupService, TopupStore};

#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// Product to price
    pub product_id: String,

    /// Redeemed voucher instance to apply
    #[arg(long)]
    pub voucher: Option<String>,
}

#[derive(Debug, Args)]
pub struct PurchaseArgs {
    /// Product to buy
    pub product_id: String,

    /// Player account id inside the game
    #[arg(long = "game-account")]
    pub game_account: String,

    /// Payment method: gopay, ovo, dana or bank
    #[arg(long, default_value = "gopay")]
    pub pay: String,

    /// Redeemed voucher instance to apply
    #[arg(long)]
    pub voucher: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Create a profile for the acting user
    Create {
        /// Display name
        name: String,
    },
    /// Show balance and recent purchases
    Show,
}

fn user(user: Option<&str>) -> Result<&str> {
    user.context("no acting user: pass --user or set TOPUP_USER")
}

pub async fn catalog<S: TopupStore>(service: &TopupService<S>, out: &Output) -> Result<()> {
    let games = service.catalog().await?;
    if out.is_json() {
        return out.json(&games);
    }

    out.header("Games");
    if games.is_empty() {
        out.info("No games yet. Run the seed binary to add a demo catalog.");
    }
    for game in &games {
        out.kv(&game.slug, &game.name);
    }
    Ok(())
}

pub async fn products<S: TopupStore>(
    service: &TopupService<S>,
    out: &Output,
    slug: &str,
) -> Result<()> {
    let page = service.game_products(slug).await?;
    if out.is_json() {
        return out.json(&page);
    }

    out.header(&page.game.name);
    if let Some(description) = &page.game.description {
        out.info(description);
    }
    for product in &page.products {
        out.info(&format!(
            "{:<24} {:>14}   {}",
            product.name,
            out.money(product.price()),
            product.id
        ));
    }
    Ok(())
}

pub async fn quote<S: TopupStore>(
    service: &TopupService<S>,
    out: &Output,
    user_id: Option<&str>,
    args: QuoteArgs,
) -> Result<()> {
    let user_id = user(user_id)?;
    let quote = service
        .quote(user_id, &args.product_id, args.voucher.as_deref())
        .await?;
    if out.is_json() {
        return out.json(&quote);
    }

    out.header("Quote");
    out.kv("Price", &out.money(quote.base_price));
    if let Some(pct) = quote.discount_percentage {
        out.kv("Discount", &format!("{} (-{})", pct, out.money(quote.discount)));
    }
    out.kv("Total", &out.money(quote.final_price));
    out.kv(
        "Points",
        &topup_core::loyalty::accrue_points(quote.final_price).to_string(),
    );
    Ok(())
}

pub async fn purchase<S: TopupStore>(
    service: &TopupService<S>,
    out: &Output,
    user_id: Option<&str>,
    args: PurchaseArgs,
) -> Result<()> {
    let user_id = user(user_id)?;
    let receipt = service
        .purchase(
            user_id,
            PurchaseRequest {
                product_id: args.product_id,
                user_game_id: args.game_account,
                payment_method: args.pay,
                user_voucher_id: args.voucher,
            },
        )
        .await?;
    if out.is_json() {
        return out.json(&receipt);
    }

    let txn = &receipt.transaction;
    out.success(&format!("Top-up successful: {}", receipt.product.name));
    out.kv("Transaction", &txn.id);
    out.kv("Game account", &txn.user_game_id);
    out.kv("Paid with", txn.payment_method.display_name());
    if !receipt.quote.discount.is_zero() {
        out.kv("Discount", &out.money(receipt.quote.discount));
    }
    out.kv("Total", &out.money(txn.total()));
    out.kv("Points earned", &txn.points_earned.to_string());
    Ok(())
}

pub async fn redeem<S: TopupStore>(
    service: &TopupService<S>,
    out: &Output,
    user_id: Option<&str>,
    voucher_id: &str,
) -> Result<()> {
    let user_id = user(user_id)?;
    let receipt = service.redeem_voucher(user_id, voucher_id).await?;
    if out.is_json() {
        return out.json(&receipt);
    }

    out.success(&format!("Redeemed {}", receipt.voucher.name));
    out.kv("Voucher", &receipt.user_voucher.id);
    out.kv("Points spent", &receipt.points_spent.to_string());
    out.kv("Balance", &receipt.new_balance.to_string());
    Ok(())
}

pub async fn vault<S: TopupStore>(
    service: &TopupService<S>,
    out: &Output,
    user_id: Option<&str>,
) -> Result<()> {
    let user_id = user(user_id)?;
    let vault = service.vault(user_id).await?;
    if out.is_json() {
        return out.json(&vault);
    }

    out.header(&format!("Vault: {} points", vault.loyalty_points));

    out.header("Redeemable vouchers");
    for v in &vault.available_vouchers {
        out.info(&format!(
            "{:<20} {:>4}%  {:>5} pts   {}",
            v.name, v.discount_percentage, v.points_required, v.id
        ));
    }

    out.header("My vouchers");
    if vault.owned_vouchers.is_empty() {
        out.info("None yet.");
    }
    for owned in &vault.owned_vouchers {
        let state = if owned.user_voucher.is_used {
            "used"
        } else {
            "available"
        };
        out.info(&format!(
            "{:<20} {:<10} {}",
            owned.voucher.name, state, owned.user_voucher.id
        ));
    }

    history(out, &vault.history);
    Ok(())
}

pub async fn rename<S: TopupStore>(
    service: &TopupService<S>,
    out: &Output,
    user_id: Option<&str>,
    name: &str,
) -> Result<()> {
    let user_id = user(user_id)?;
    let profile = service.rename_profile(user_id, name).await?;
    if out.is_json() {
        return out.json(&profile);
    }
    out.success(&format!("Profile renamed to {}", profile.name));
    Ok(())
}

pub async fn profile<S: TopupStore>(
    service: &TopupService<S>,
    out: &Output,
    user_id: Option<&str>,
    command: ProfileCommand,
) -> Result<()> {
    let user_id = user(user_id)?;
    match command {
        ProfileCommand::Create { name } => {
            let profile = service.create_profile(user_id, &name).await?;
            if out.is_json() {
                return out.json(&profile);
            }
            out.success(&format!("Profile created for {}", profile.id));
        }
        ProfileCommand::Show => {
            let view = service.profile(user_id).await?;
            if out.is_json() {
                return out.json(&view);
            }
            out.header(&view.profile.name);
            out.kv("User", &view.profile.id);
            out.kv("Points", &view.profile.loyalty_points.to_string());
            history(out, &view.history);
        }
    }
    Ok(())
}

pub fn payment_methods(out: &Output) -> Result<()> {
    if out.is_json() {
        return out.json(&PaymentMethod::ALL);
    }
    out.header("Payment methods");
    for method in PaymentMethod::ALL {
        out.kv(method.as_str(), method.display_name());
    }
    Ok(())
}

fn history(out: &Output, rows: &[topup_core::TransactionSummary]) {
    out.header("Recent purchases");
    if rows.is_empty() {
        out.info("No purchases yet.");
    }
    for row in rows {
        let txn = &row.transaction;
        out.info(&format!(
            "{}  {:<16} {:<16} {:>14}  +{} pts",
            txn.created_at.format("%Y-%m-%d %H:%M"),
            row.game_name,
            row.product_name,
            out.money(Money::from_units(txn.total_price)),
            txn.points_earned
        ));
    }
}
