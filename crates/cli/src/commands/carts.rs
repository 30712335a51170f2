//! Cart inspection commands.
//!
//! # Usage
//!
//! ```bash
//! mg-cli carts show --device <id> [--user <uuid>]
//! ```

use std::sync::Arc;

use marigold_core::{DeviceId, Identity, ScopeKey, UserId};
use marigold_storefront::cart::Cart;
use marigold_storefront::checkout::{CheckoutConfig, OrderSummary};
use marigold_storefront::devices::namespace;
use marigold_storefront::store::{Namespaced, SnapshotBackend};

use super::CliError;

/// Render a cart and its totals as printable lines.
fn render(cart: &Cart, config: &CheckoutConfig) -> Vec<String> {
    let currency = config.currency;
    let mut lines: Vec<String> = cart
        .items()
        .iter()
        .map(|line| {
            format!(
                "{:>4} x {} ({}) @ {} = {}",
                line.quantity,
                line.product.name,
                line.id(),
                currency.format(line.product.unit_price.amount()),
                currency.format(line.line_total()),
            )
        })
        .collect();

    let summary = OrderSummary::for_cart(cart, config);
    lines.push(format!("items:    {}", summary.item_count));
    lines.push(format!("subtotal: {}", currency.format(summary.subtotal)));
    lines.push(format!("shipping: {}", currency.format(summary.shipping)));
    lines.push(format!("tax:      {}", currency.format(summary.tax)));
    lines.push(format!("total:    {}", summary.display_total()));
    lines
}

/// Read a cart snapshot without touching it.
///
/// A missing snapshot is an empty cart. A snapshot that does not parse is
/// reported and left in place for inspection.
fn read_cart(
    backend: Arc<dyn SnapshotBackend>,
    device: DeviceId,
    identity: Identity,
) -> Result<Cart, CliError> {
    let key = ScopeKey::Cart(identity).to_string();
    let Some(raw) = Namespaced::new(backend, &namespace(device)).read(&key)? else {
        return Ok(Cart::new());
    };
    serde_json::from_str(&raw).map_err(|source| CliError::CorruptSnapshot {
        key: format!("{}/{key}", namespace(device)),
        source,
    })
}

/// Print the guest cart of `device`, or the saved cart of `user` on it.
///
/// # Errors
///
/// Returns `CliError` if the snapshot cannot be read or does not parse.
#[allow(clippy::print_stdout)]
pub fn show(
    backend: Arc<dyn SnapshotBackend>,
    device: DeviceId,
    user: Option<UserId>,
) -> Result<(), CliError> {
    let identity = Identity::from_user(user);
    let cart = read_cart(backend, device, identity)?;

    println!("cart:{identity} on device {device}");
    for line in render(&cart, &CheckoutConfig::default()) {
        println!("{line}");
    }
    Ok(())
}
