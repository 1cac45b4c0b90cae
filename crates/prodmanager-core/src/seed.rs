use crate::error::AppError;
use crate::models::NewProduct;
use crate::traits::ProductStore;

/// The demo catalog inserted into an empty store.
pub fn demo_products() -> Vec<NewProduct> {
    vec![
        NewProduct {
            title: "MacBook Pro".into(),
            description: "High-performance laptop for professionals".into(),
            price: 1999.99,
            image: "https://images.unsplash.com/photo-1541807084-5c52b6b3adef?w=400".into(),
        },
        NewProduct {
            title: "iPhone 15".into(),
            description: "Latest smartphone with advanced features".into(),
            price: 999.99,
            image: "https://images.unsplash.com/photo-1592750475338-74b7b21085ab?w=400".into(),
        },
        NewProduct {
            title: "AirPods Pro".into(),
            description: "Wireless earbuds with noise cancellation".into(),
            price: 249.99,
            image: "https://images.unsplash.com/photo-1606220838315-056192d5e927?w=400".into(),
        },
    ]
}

/// Insert the demo catalog if the store holds no products.
///
/// Returns the number of products inserted (0 when the store was not empty).
pub async fn seed_demo_products(store: &dyn ProductStore) -> Result<usize, AppError> {
    if store.count().await? > 0 {
        return Ok(0);
    }

    let products = demo_products();
    for product in &products {
        store.create(product).await?;
    }
    Ok(products.len())
}
