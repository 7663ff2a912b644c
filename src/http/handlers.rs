use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::extract::{JsonBody, Path, Query};
use super::AppState;
use crate::domain::aggregates::{Cart, NewProduct, Order, Product};
use crate::domain::value_objects::Caller;
use crate::services::{self, AddToCartRequest, CheckoutRequest};
use crate::CommerceError;

type ApiResult<T> = Result<T, CommerceError>;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn list_products(State(s): State<AppState>, Query(p): Query<ListParams>) -> ApiResult<Json<Vec<Product>>> {
    let page = services::page(p.page, p.limit)?;
    Ok(Json(s.catalog.resolve_all_products(page).await?))
}

pub async fn get_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Product>> {
    Ok(Json(s.catalog.resolve_product_by_id(id).await?))
}

pub async fn create_product(State(s): State<AppState>, caller: Caller, JsonBody(r): JsonBody<NewProduct>) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = s.catalog.create_product(&caller, r).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn add_to_cart(State(s): State<AppState>, caller: Caller, JsonBody(r): JsonBody<AddToCartRequest>) -> ApiResult<(StatusCode, Json<Cart>)> {
    let cart = s.carts.add_to_cart(caller.user_id, r).await?;
    Ok((StatusCode::CREATED, Json(cart)))
}

pub async fn get_cart(State(s): State<AppState>, caller: Caller) -> ApiResult<Json<Cart>> {
    Ok(Json(s.carts.resolve_cart_by_user_id(caller.user_id).await?))
}

pub async fn checkout(
    State(s): State<AppState>,
    caller: Caller,
    Path(cart_id): Path<Uuid>,
    JsonBody(r): JsonBody<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = s.checkout.checkout(cart_id, &caller, r).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_orders(State(s): State<AppState>, caller: Caller, Query(p): Query<ListParams>) -> ApiResult<Json<Vec<Order>>> {
    let page = services::page(p.page, p.limit)?;
    Ok(Json(s.orders.resolve_all_orders(&caller, page).await?))
}
