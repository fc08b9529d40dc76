//! Product catalog HTTP handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use shared::{CreateProductInput, Product, UpdateProductInput};
use uuid::Uuid;

use crate::error::AppResult;
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::services::{product::CreatedProduct, ProductService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn product_service(state: AppState) -> ProductService {
    ProductService::new(
        state.db,
        state.config.inventory.default_low_stock_threshold,
    )
}

/// Create a product together with its inventory summary
pub async fn create_product(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateProductInput>,
) -> AppResult<(StatusCode, Json<CreatedProduct>)> {
    let product = product_service(state).create(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// List products, optionally filtered by category
pub async fn list_products(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ProductListQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let category = query.category.as_deref().filter(|c| !c.is_empty());
    let products = product_service(state).list(category).await?;
    Ok(Json(products))
}

/// Get a product by id
pub async fn get_product(
    State(state): State<AppState>,
    PathParam(product_id): PathParam<Uuid>,
) -> AppResult<Json<Product>> {
    let product = product_service(state).get(product_id).await?;
    Ok(Json(product))
}

/// Update a product
pub async fn update_product(
    State(state): State<AppState>,
    PathParam(product_id): PathParam<Uuid>,
    JsonBody(input): JsonBody<UpdateProductInput>,
) -> AppResult<Json<Product>> {
    let product = product_service(state).update(product_id, input).await?;
    Ok(Json(product))
}

/// Delete a product and, by cascade, its inventory history
pub async fn delete_product(
    State(state): State<AppState>,
    PathParam(product_id): PathParam<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    product_service(state).delete(product_id).await?;
    Ok(Json(MessageResponse {
        message: "Product deleted successfully",
    }))
}

/// List distinct product categories
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    let categories = product_service(state).categories().await?;
    Ok(Json(categories))
}
