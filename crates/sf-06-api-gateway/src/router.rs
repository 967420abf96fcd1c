//! Storefront routes.
//!
//! | Method & path          | Action                                             |
//! |------------------------|----------------------------------------------------|
//! | `GET /products?page=N` | listing page + cart item count + token             |
//! | `GET /products/:id`    | product detail + cart item count + token           |
//! | `GET /cart`            | cart summary + token                               |
//! | `GET /cart/summary`    | item count and total                               |
//! | `GET /csrf-token`      | live token                                         |
//! | `GET /health`          | liveness + storage probe                           |
//! | `POST /cart/add`       | validate payload, merge into cart                  |
//! | `POST /cart/update`    | replace quantity (0 removes)                       |
//! | `POST /cart/remove`    | remove line                                        |
//! | `POST /cart/clear`     | remove every line                                  |
//! | `POST /session/destroy`| retire session, expire cookie                      |
//!
//! Every `POST` consumes the forgery token before anything else happens and
//! answers with the fresh cart summary and the next token.

use crate::dispatch::{RequestDispatcher, RequestSession};
use crate::domain::config::StorefrontConfig;
use crate::domain::cookie::SessionCookie;
use crate::domain::error::{ApiError, ApiResult};
use crate::domain::payload::{CartForm, Payload, CSRF_HEADER};
use crate::middleware::{create_cors_layer, RateLimitLayer, TracingLayer};
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sf_01_session_identity::SessionApi;
use sf_02_forgery_guard::ForgeryGuardApi;
use sf_04_cart_service::{CartApi, CartSummary};
use sf_05_catalog::{CatalogApi, ProductPage};
use shared_types::{KeyPrefix, KeyValueStore, Money, Product, SessionId};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<RequestDispatcher>,
    pub cart: Arc<dyn CartApi>,
    pub catalog: Arc<dyn CatalogApi>,
    /// Probed by `/health`.
    pub store: Arc<dyn KeyValueStore>,
    pub cookie: SessionCookie,
    pub page_size: usize,
}

impl AppState {
    pub fn new(
        config: &StorefrontConfig,
        sessions: Arc<dyn SessionApi>,
        guard: Arc<dyn ForgeryGuardApi>,
        cart: Arc<dyn CartApi>,
        catalog: Arc<dyn CatalogApi>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            dispatcher: Arc::new(RequestDispatcher::new(sessions, guard)),
            cart,
            catalog,
            store,
            cookie: SessionCookie::from_config(&config.session),
            page_size: config.catalog.page_size,
        }
    }
}

/// Build the HTTP router with its middleware stack.
pub fn build_router(state: AppState, config: &StorefrontConfig, rate_limit: &RateLimitLayer) -> Router {
    let mut router = Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(product_detail))
        .route("/cart", get(view_cart))
        .route("/cart/summary", get(cart_totals))
        .route("/cart/add", post(add_to_cart))
        .route("/cart/update", post(update_quantity))
        .route("/cart/remove", post(remove_from_cart))
        .route("/cart/clear", post(clear_cart))
        .route("/session/destroy", post(destroy_session))
        .route("/csrf-token", get(csrf_token))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(rate_limit.clone());

    if let Some(cors) = create_cors_layer(&config.cors) {
        router = router.layer(cors);
    }

    router
        .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
        .layer(TracingLayer::new())
}

// =============================================================================
// RESPONSE BODIES
// =============================================================================

#[derive(Serialize)]
struct ProductListView {
    #[serde(flatten)]
    listing: ProductPage,
    cart_item_count: u64,
    csrf_token: String,
}

#[derive(Serialize)]
struct ProductView {
    product: Product,
    cart_item_count: u64,
    csrf_token: String,
}

#[derive(Serialize)]
struct CartView {
    #[serde(flatten)]
    cart: CartSummary,
    csrf_token: String,
}

#[derive(Serialize)]
struct CartTotals {
    item_count: u64,
    total: Money,
}

#[derive(Serialize)]
struct TokenView {
    csrf_token: String,
}

#[derive(Serialize)]
struct MutationView {
    cart: CartSummary,
    csrf_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    /// Anything but a positive integer means page 1.
    fn page(&self) -> usize {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<usize>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1)
    }
}

// =============================================================================
// READ HANDLERS
// =============================================================================

async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Response {
    let page = query.page();
    read(state, &headers, move |state, session| {
        Ok(ProductListView {
            listing: state.catalog.get_page(page, state.page_size)?,
            cart_item_count: state.cart.item_count(session)?,
            csrf_token: state.dispatcher.token_for(session)?.as_str().to_string(),
        })
    })
    .await
}

async fn product_detail(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    read(state, &headers, move |state, session| {
        let id = raw_id
            .trim()
            .parse::<i64>()
            .map_err(|_| ApiError::bad_request("Invalid product ID"))?;
        let product = state
            .catalog
            .get_product(id)?
            .ok_or_else(|| ApiError::not_found("Product not found"))?;
        Ok(ProductView {
            product,
            cart_item_count: state.cart.item_count(session)?,
            csrf_token: state.dispatcher.token_for(session)?.as_str().to_string(),
        })
    })
    .await
}

async fn view_cart(State(state): State<AppState>, headers: HeaderMap) -> Response {
    read(state, &headers, |state, session| {
        Ok(CartView {
            cart: state.cart.summary(session)?,
            csrf_token: state.dispatcher.token_for(session)?.as_str().to_string(),
        })
    })
    .await
}

async fn cart_totals(State(state): State<AppState>, headers: HeaderMap) -> Response {
    read(state, &headers, |state, session| {
        let summary = state.cart.summary(session)?;
        Ok(CartTotals {
            item_count: summary.item_count,
            total: summary.total,
        })
    })
    .await
}

async fn csrf_token(State(state): State<AppState>, headers: HeaderMap) -> Response {
    read(state, &headers, |state, session| {
        Ok(TokenView {
            csrf_token: state.dispatcher.token_for(session)?.as_str().to_string(),
        })
    })
    .await
}

async fn health_check(State(state): State<AppState>) -> Response {
    let probe = blocking(move || {
        state
            .store
            .get(&KeyPrefix::meta("health"))
            .map_err(|e| ApiError::storage_unavailable(&e))
    })
    .await;
    match probe {
        Ok(_) => Json(serde_json::json!({
            "status": "healthy",
            "service": "storefront",
            "version": env!("CARGO_PKG_VERSION")
        }))
        .into_response(),
        Err(err) => err.into_response(),
    }
}

// =============================================================================
// MUTATION HANDLERS
// =============================================================================

async fn add_to_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
    Payload(form): Payload<CartForm>,
) -> Response {
    let raw = form.raw_input();
    mutate(state, &headers, &form, move |state, session| {
        let line = state.cart.validate_cart_data(&raw)?;
        state.cart.add_to_cart(
            session,
            line.product_id.get() as i64,
            i64::from(line.quantity.get()),
        )?;
        Ok(())
    })
    .await
}

async fn update_quantity(
    State(state): State<AppState>,
    headers: HeaderMap,
    Payload(form): Payload<CartForm>,
) -> Response {
    let parsed = form.product_and_quantity();
    mutate(state, &headers, &form, move |state, session| {
        let (product_id, quantity) = parsed.map_err(ApiError::invalid_input)?;
        state.cart.update_quantity(session, product_id, quantity)?;
        Ok(())
    })
    .await
}

async fn remove_from_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
    Payload(form): Payload<CartForm>,
) -> Response {
    let parsed = form.product_id();
    mutate(state, &headers, &form, move |state, session| {
        let product_id = parsed.map_err(ApiError::invalid_input)?;
        state.cart.remove_from_cart(session, product_id)?;
        Ok(())
    })
    .await
}

async fn clear_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
    Payload(form): Payload<CartForm>,
) -> Response {
    mutate(state, &headers, &form, |state, session| {
        state.cart.clear(session)?;
        Ok(())
    })
    .await
}

async fn destroy_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Payload(form): Payload<CartForm>,
) -> Response {
    let presented = state.cookie.read(&headers);
    let candidate = candidate_token(&form, &headers);
    let cookie = state.cookie.clone();

    let outcome = blocking(move || {
        let session = state
            .dispatcher
            .authorize_mutation(presented.as_deref(), candidate.as_deref())?;
        state.dispatcher.destroy(&session.id)
    })
    .await;

    match outcome {
        Ok(()) => {
            let mut response = Json(serde_json::json!({ "destroyed": true })).into_response();
            cookie.attach_expired(&mut response);
            response
        }
        Err(err) => err.into_response(),
    }
}

// =============================================================================
// PLUMBING
// =============================================================================

/// Run synchronous subsystem calls off the async workers.
async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(&e))?
}

/// Body field first, then the header.
fn candidate_token(form: &CartForm, headers: &HeaderMap) -> Option<String> {
    form.csrf_token.clone().or_else(|| {
        headers
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    })
}

async fn read<T, F>(state: AppState, headers: &HeaderMap, op: F) -> Response
where
    F: FnOnce(&AppState, &SessionId) -> ApiResult<T> + Send + 'static,
    T: Serialize + Send + 'static,
{
    let presented = state.cookie.read(headers);
    let cookie = state.cookie.clone();

    let outcome = blocking(move || {
        let session = state.dispatcher.resolve(presented.as_deref())?;
        let result = op(&state, &session.id);
        Ok((session, result))
    })
    .await;

    respond(&cookie, outcome)
}

/// Authorize, run `op`, then answer with the fresh summary and next token.
///
/// Once the token is consumed the session has moved, so even a failing `op`
/// answers with the new cookie and the next token.
async fn mutate<F>(state: AppState, headers: &HeaderMap, form: &CartForm, op: F) -> Response
where
    F: FnOnce(&AppState, &SessionId) -> ApiResult<()> + Send + 'static,
{
    let presented = state.cookie.read(headers);
    let candidate = candidate_token(form, headers);
    let cookie = state.cookie.clone();

    let outcome = blocking(move || {
        let session = state
            .dispatcher
            .authorize_mutation(presented.as_deref(), candidate.as_deref())?;
        let changed = op(&state, &session.id);
        let result = state.dispatcher.token_for(&session.id).and_then(|token| {
            let token = token.as_str().to_string();
            match changed.and_then(|()| Ok(state.cart.summary(&session.id)?)) {
                Ok(cart) => Ok(MutationView {
                    cart,
                    csrf_token: token,
                }),
                Err(err) => Err(err.with_csrf_token(token)),
            }
        });
        Ok((session, result))
    })
    .await;

    respond(&cookie, outcome)
}

fn respond<T: Serialize>(
    cookie: &SessionCookie,
    outcome: ApiResult<(RequestSession, ApiResult<T>)>,
) -> Response {
    let (session, result) = match outcome {
        Ok(outcome) => outcome,
        Err(err) => return err.into_response(),
    };
    let mut response = match result {
        Ok(body) => Json(body).into_response(),
        Err(err) => err.into_response(),
    };
    if session.rotated {
        cookie.attach(&mut response, &session.id);
    }
    response
}
