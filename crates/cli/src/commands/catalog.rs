//! Catalog browsing commands.

use sandpiper_client::StorefrontRuntime;

/// List a page of products.
#[allow(clippy::print_stdout)]
pub async fn list(
    runtime: &StorefrontRuntime,
    page: u32,
    search: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = runtime.api().get_products(Some(page), search).await?;

    for product in &result.items {
        println!("{:<28} {:>10}  ({})", product.slug, product.price, product.id);
    }
    println!(
        "page {}/{} ({} products)",
        result.pagination.page, result.pagination.pages, result.pagination.total
    );
    Ok(())
}

/// Show one product in detail.
#[allow(clippy::print_stdout)]
pub async fn show(
    runtime: &StorefrontRuntime,
    slug: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let product = runtime.api().get_product(slug).await?;

    println!("{} ({})", product.name, product.id);
    println!("price: {}  stock: {}", product.price, product.stock);
    if !product.description.is_empty() {
        println!("{}", product.description);
    }
    for variant in &product.variants {
        println!(
            "  variant {}: {} @ {} (stock {})",
            variant.id, variant.name, variant.price, variant.stock
        );
    }
    Ok(())
}
