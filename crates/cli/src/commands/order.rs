//! Order commands.

use sandpiper_client::{OrderInput, ShippingAddress, StorefrontRuntime};

/// Place an order from the current cart, clearing it on success.
#[allow(clippy::print_stdout)]
pub async fn place(
    runtime: &mut StorefrontRuntime,
    address: ShippingAddress,
    payment_method: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if runtime.cart().is_empty() {
        println!("Cart is empty; nothing to order");
        return Ok(());
    }

    let input = OrderInput::from_cart(runtime.cart().items(), address, payment_method);
    let order = runtime.api().place_order(&input).await?;

    // The engine never clears itself on remote events; confirmed orders do.
    runtime.cart_mut().clear()?;

    println!(
        "Order {} placed: total {} ({:?}/{:?})",
        order.order_number, order.total, order.status, order.payment_status
    );
    Ok(())
}

/// List past orders for the authenticated user.
#[allow(clippy::print_stdout)]
pub async fn list(runtime: &StorefrontRuntime) -> Result<(), Box<dyn std::error::Error>> {
    let orders = runtime.api().get_orders().await?;

    if orders.is_empty() {
        println!("No orders yet");
        return Ok(());
    }
    for order in &orders {
        println!(
            "{:<12} {:>10}  {:?}/{:?}",
            order.order_number, order.total, order.status, order.payment_status
        );
    }
    Ok(())
}
