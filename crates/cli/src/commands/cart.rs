//! Cart commands.
//!
//! The cart lives entirely on this machine; every mutation is persisted
//! before the command returns, so it survives across invocations.

use sandpiper_client::StorefrontRuntime;
use sandpiper_core::{ProductId, VariantId};

/// Print the cart contents and subtotal.
#[allow(clippy::print_stdout)]
pub fn list(runtime: &StorefrontRuntime) {
    let cart = runtime.cart();
    if cart.is_empty() {
        println!("Cart is empty");
        return;
    }

    for item in cart.items() {
        let variant = item
            .variant_id
            .as_ref()
            .map(|id| format!(" [{id}]"))
            .unwrap_or_default();
        println!(
            "{:>3} x {}{}  @ {}  = {}",
            item.quantity,
            item.product.name,
            variant,
            item.product.price.display(),
            item.line_total(),
        );
    }
    println!("---");
    println!("{} items, subtotal {}", cart.item_count(), cart.subtotal());
}

/// Fetch a product by slug and add it to the cart.
#[allow(clippy::print_stdout)]
pub async fn add(
    runtime: &mut StorefrontRuntime,
    slug: &str,
    quantity: u32,
    variant: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let product = runtime.api().get_product(slug).await?;
    let variant_id = variant.map(VariantId::new);
    let snapshot = product.snapshot(variant_id.as_ref());

    runtime.cart_mut().add_item(snapshot, quantity, variant_id)?;

    println!(
        "Added {quantity} x {} ({} items in cart)",
        product.name,
        runtime.cart().item_count()
    );
    Ok(())
}

/// Remove an item from the cart.
#[allow(clippy::print_stdout)]
pub fn remove(
    runtime: &mut StorefrontRuntime,
    product_id: &str,
    variant: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let variant_id = variant.map(VariantId::new);
    runtime
        .cart_mut()
        .remove_item(&ProductId::new(product_id), variant_id.as_ref())?;

    println!("{} items in cart", runtime.cart().item_count());
    Ok(())
}

/// Set an item's quantity; zero removes it.
#[allow(clippy::print_stdout)]
pub fn set(
    runtime: &mut StorefrontRuntime,
    product_id: &str,
    quantity: u32,
    variant: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let variant_id = variant.map(VariantId::new);
    runtime.cart_mut().update_quantity(
        &ProductId::new(product_id),
        quantity,
        variant_id.as_ref(),
    )?;

    println!("{} items in cart", runtime.cart().item_count());
    Ok(())
}

/// Empty the cart.
#[allow(clippy::print_stdout)]
pub fn clear(runtime: &mut StorefrontRuntime) -> Result<(), Box<dyn std::error::Error>> {
    runtime.cart_mut().clear()?;
    println!("Cart cleared");
    Ok(())
}
