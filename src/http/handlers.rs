use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;
use crate::domain::aggregates::{
    Category, CategoryInput, Checkout, DashboardItem, DashboardItemInput, Order, OrderDraft, OrderStatus, Product,
    ProductInput, Sale, SaleDraft, Tag, TagInput, UserIdentity,
};
use crate::http::{AppState, Caller, InternalCaller};
use crate::services::analytics::{DashboardData, VisitorCount};
use crate::services::checkout::{CheckoutRequest, PaymentIntentRequest, PaymentIntentResponse, PaymentSucceeded};
use crate::services::orders::AdminOrderView;
use crate::services::sales::RecordedSale;
use crate::Result;

#[derive(Debug, Serialize)] pub struct Created { pub id: Uuid }
#[derive(Debug, Deserialize)] pub struct StatusUpdate { pub status: OrderStatus }
#[derive(Debug, Deserialize)] pub struct VisitRequest { pub path: String }
#[derive(Debug, Deserialize)] pub struct InternalOrderRequest { pub session_id: String, pub identity_key: Option<String>, pub order: OrderDraft }

// =============================================================================
// Public
// =============================================================================

pub async fn create_order(State(s): State<AppState>, caller: Caller, Json(draft): Json<OrderDraft>) -> Result<(StatusCode, Json<Created>)> {
    let id = s.services.orders.create_order(caller.identity(), draft).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

pub async fn list_products(State(s): State<AppState>) -> Json<Vec<Product>> {
    Json(s.services.catalog.list_published_products().await)
}

pub async fn get_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Product>> {
    Ok(Json(s.services.catalog.get_published_product(id).await?))
}

pub async fn list_categories(State(s): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(s.services.catalog.list_categories().await?))
}

pub async fn list_tags(State(s): State<AppState>) -> Result<Json<Vec<Tag>>> {
    Ok(Json(s.services.catalog.list_tags().await?))
}

pub async fn create_payment_intent(State(s): State<AppState>, caller: Caller, Json(r): Json<PaymentIntentRequest>) -> Result<(StatusCode, Json<PaymentIntentResponse>)> {
    let intent = s.services.checkout.create_payment_intent(caller.identity(), r).await?;
    Ok((StatusCode::CREATED, Json(intent)))
}

// =============================================================================
// Authenticated caller
// =============================================================================

pub async fn my_orders(State(s): State<AppState>, caller: Caller) -> Result<Json<Vec<Order>>> {
    Ok(Json(s.services.orders.get_user_orders(caller.identity()).await?))
}

pub async fn track_visit(State(s): State<AppState>, caller: Caller, Json(r): Json<VisitRequest>) -> Result<(StatusCode, Json<Created>)> {
    let id = s.services.analytics.track_visit(caller.identity(), &r.path).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

pub async fn store_user(State(s): State<AppState>, caller: Caller) -> Result<Json<Created>> {
    Ok(Json(Created { id: s.services.users.store(caller.identity()).await? }))
}

pub async fn current_user(State(s): State<AppState>, caller: Caller) -> Result<Json<Option<UserIdentity>>> {
    Ok(Json(s.services.users.current_user(caller.identity()).await?))
}

// =============================================================================
// Internal
// =============================================================================

pub async fn create_order_internal(State(s): State<AppState>, _: InternalCaller, Json(r): Json<InternalOrderRequest>) -> Result<Json<Created>> {
    let id = s.services.orders.create_order_internal(r.identity_key, r.session_id, r.order).await?;
    Ok(Json(Created { id }))
}

pub async fn create_checkout(State(s): State<AppState>, _: InternalCaller, Json(r): Json<CheckoutRequest>) -> Result<Json<Checkout>> {
    Ok(Json(s.services.checkout.create_checkout(r).await?))
}

pub async fn get_checkout(State(s): State<AppState>, _: InternalCaller, Path(session_id): Path<String>) -> Result<Json<Checkout>> {
    Ok(Json(s.services.checkout.get_checkout(&session_id).await?))
}

pub async fn complete_checkout(State(s): State<AppState>, _: InternalCaller, Path(session_id): Path<String>) -> Result<Json<Checkout>> {
    Ok(Json(s.services.checkout.mark_checkout_completed(&session_id).await?))
}

pub async fn payment_succeeded(State(s): State<AppState>, _: InternalCaller, Json(event): Json<PaymentSucceeded>) -> Result<Json<Created>> {
    Ok(Json(Created { id: s.services.checkout.payment_succeeded(event).await? }))
}

// =============================================================================
// Admin
// =============================================================================

pub async fn admin_orders(State(s): State<AppState>, caller: Caller) -> Result<Json<Vec<AdminOrderView>>> {
    Ok(Json(s.services.orders.get_orders(caller.identity()).await?))
}

pub async fn update_order_status(State(s): State<AppState>, caller: Caller, Path(id): Path<Uuid>, Json(r): Json<StatusUpdate>) -> Result<Json<Value>> {
    s.services.orders.update_order_status(caller.identity(), id, r.status).await?;
    Ok(Json(json!({"id": id, "status": r.status})))
}

pub async fn admin_products(State(s): State<AppState>, caller: Caller) -> Result<Json<Vec<Product>>> {
    Ok(Json(s.services.catalog.list_all_products(caller.identity()).await?))
}

pub async fn create_product(State(s): State<AppState>, caller: Caller, Json(r): Json<ProductInput>) -> Result<(StatusCode, Json<Product>)> {
    Ok((StatusCode::CREATED, Json(s.services.catalog.create_product(caller.identity(), r).await?)))
}

pub async fn update_product(State(s): State<AppState>, caller: Caller, Path(id): Path<Uuid>, Json(r): Json<ProductInput>) -> Result<Json<Product>> {
    Ok(Json(s.services.catalog.update_product(caller.identity(), id, r).await?))
}

pub async fn delete_product(State(s): State<AppState>, caller: Caller, Path(id): Path<Uuid>) -> Result<StatusCode> {
    s.services.catalog.delete_product(caller.identity(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_category(State(s): State<AppState>, caller: Caller, Json(r): Json<CategoryInput>) -> Result<(StatusCode, Json<Category>)> {
    Ok((StatusCode::CREATED, Json(s.services.catalog.create_category(caller.identity(), r).await?)))
}

pub async fn update_category(State(s): State<AppState>, caller: Caller, Path(id): Path<Uuid>, Json(r): Json<CategoryInput>) -> Result<Json<Category>> {
    Ok(Json(s.services.catalog.update_category(caller.identity(), id, r).await?))
}

pub async fn delete_category(State(s): State<AppState>, caller: Caller, Path(id): Path<Uuid>) -> Result<StatusCode> {
    s.services.catalog.delete_category(caller.identity(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_tag(State(s): State<AppState>, caller: Caller, Json(r): Json<TagInput>) -> Result<(StatusCode, Json<Tag>)> {
    Ok((StatusCode::CREATED, Json(s.services.catalog.create_tag(caller.identity(), r).await?)))
}

pub async fn delete_tag(State(s): State<AppState>, caller: Caller, Path(id): Path<Uuid>) -> Result<StatusCode> {
    s.services.catalog.delete_tag(caller.identity(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn dashboard(State(s): State<AppState>, caller: Caller) -> Result<Json<DashboardData>> {
    Ok(Json(s.services.analytics.dashboard_data(caller.identity()).await?))
}

pub async fn add_dashboard_item(State(s): State<AppState>, caller: Caller, Json(r): Json<DashboardItemInput>) -> Result<(StatusCode, Json<DashboardItem>)> {
    Ok((StatusCode::CREATED, Json(s.services.analytics.add_dashboard_item(caller.identity(), r).await?)))
}

pub async fn visitor_count(State(s): State<AppState>, caller: Caller) -> Result<Json<VisitorCount>> {
    Ok(Json(s.services.analytics.visitor_count(caller.identity()).await?))
}

pub async fn list_sales(State(s): State<AppState>, caller: Caller) -> Result<Json<Vec<Sale>>> {
    Ok(Json(s.services.sales.list_sales(caller.identity()).await?))
}

pub async fn create_sale(State(s): State<AppState>, caller: Caller, Json(r): Json<SaleDraft>) -> Result<(StatusCode, Json<RecordedSale>)> {
    Ok((StatusCode::CREATED, Json(s.services.sales.create_sale(caller.identity(), r).await?)))
}
