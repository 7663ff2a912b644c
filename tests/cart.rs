use std::sync::Arc;

use opensase_storefront::domain::aggregates::{NewProduct, Product};
use opensase_storefront::domain::value_objects::Caller;
use opensase_storefront::services::{AddToCartRequest, CartService, CatalogService};
use opensase_storefront::store::MemoryStore;
use opensase_storefront::CommerceError;
use rust_decimal::Decimal;
use uuid::Uuid;

async fn setup(stock: i32) -> (Arc<MemoryStore>, CartService, Product) {
    let store = Arc::new(MemoryStore::new());
    let catalog = CatalogService::new(store.clone());
    let product = catalog.create_product(&Caller::admin(Uuid::new_v4()), NewProduct {
        name: "Kettle".into(), description: "Stovetop kettle".into(), category: "kitchen".into(),
        brand: "Acme".into(), stock, price: Decimal::new(1000, 2),
    }).await.unwrap();
    (store.clone(), CartService::new(store.clone(), store), product)
}

fn add(product: &Product, quantity: i32) -> AddToCartRequest {
    AddToCartRequest { product_id: product.id, quantity }
}

#[tokio::test]
async fn test_first_add_creates_cart_with_line() {
    let (_, carts, product) = setup(5).await;
    let user = Uuid::new_v4();

    let cart = carts.add_to_cart(user, add(&product, 3)).await.unwrap();

    assert_eq!(cart.user_id(), user);
    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.items()[0].quantity, 3);
    assert_eq!(cart.total_price(), Decimal::new(3000, 2));
    let resolved = carts.resolve_cart_by_user_id(user).await.unwrap();
    assert_eq!(resolved.id(), cart.id());
    assert_eq!(resolved.total_price(), Decimal::new(3000, 2));
}

#[tokio::test]
async fn test_repeated_add_increments_and_clamps() {
    let (_, carts, product) = setup(5).await;
    let user = Uuid::new_v4();

    carts.add_to_cart(user, add(&product, 2)).await.unwrap();
    let cart = carts.add_to_cart(user, add(&product, 2)).await.unwrap();
    assert_eq!(cart.items()[0].quantity, 4);

    let cart = carts.add_to_cart(user, add(&product, -10)).await.unwrap();
    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.items()[0].quantity, 1);
}

#[tokio::test]
async fn test_new_line_needs_positive_quantity() {
    let (_, carts, product) = setup(5).await;
    for quantity in [0, -1] {
        let err = carts.add_to_cart(Uuid::new_v4(), add(&product, quantity)).await.unwrap_err();
        assert!(matches!(err, CommerceError::BadRequest(_)));
    }
}

#[tokio::test]
async fn test_add_more_than_stock_is_rejected() {
    let (_, carts, product) = setup(2).await;
    let user = Uuid::new_v4();

    let err = carts.add_to_cart(user, add(&product, 3)).await.unwrap_err();
    assert!(matches!(err, CommerceError::BadRequest(_)));
    assert!(matches!(carts.resolve_cart_by_user_id(user).await, Err(CommerceError::NotFound(_))));
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let (_, carts, _) = setup(2).await;
    let req = AddToCartRequest { product_id: Uuid::new_v4(), quantity: 1 };
    assert!(matches!(carts.add_to_cart(Uuid::new_v4(), req).await, Err(CommerceError::NotFound(_))));
}

#[tokio::test]
async fn test_cart_reads_live_catalog_price() {
    let (store, carts, product) = setup(5).await;
    let user = Uuid::new_v4();
    carts.add_to_cart(user, add(&product, 2)).await.unwrap();

    store.set_price(product.id, Decimal::new(1250, 2)).await.unwrap();

    let cart = carts.resolve_cart_by_user_id(user).await.unwrap();
    assert_eq!(cart.items()[0].unit_price, Decimal::new(1250, 2));
    assert_eq!(cart.total_price(), Decimal::new(2500, 2));
}

#[tokio::test]
async fn test_overflowing_price_is_rejected_not_panicking() {
    let (store, carts, product) = setup(5).await;
    store.set_price(product.id, Decimal::MAX).await.unwrap();

    let err = carts.add_to_cart(Uuid::new_v4(), add(&product, 2)).await.unwrap_err();
    assert!(matches!(err, CommerceError::Validation(_)));
}
