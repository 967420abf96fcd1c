//! # End-to-End Flows
//!
//! HTTP requests through the router built from the runtime container, over
//! both store backends and across a process restart.

#[cfg(test)]
mod tests {
    use crate::fixtures::{test_config, Fixture, BACKENDS};
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use sf_06_api_gateway::StorefrontGateway;
    use std::time::Duration;
    use storefront_runtime::{Maintenance, StorefrontContainer};
    use tower::ServiceExt;

    fn router(container: &StorefrontContainer) -> Router {
        StorefrontGateway::new(container.config.clone(), container.app_state())
            .unwrap()
            .router()
    }

    /// Cookie-keeping client.
    struct Browser {
        router: Router,
        cookie: Option<String>,
        token: Option<String>,
    }

    impl Browser {
        fn new(router: Router) -> Self {
            Self {
                router,
                cookie: None,
                token: None,
            }
        }

        async fn request(&mut self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(cookie) = &self.cookie {
                builder = builder.header(header::COOKIE, cookie.as_str());
            }
            let body = match body {
                Some(mut value) => {
                    if let (Some(token), Some(map)) = (&self.token, value.as_object_mut()) {
                        map.insert("csrf_token".into(), Value::String(token.clone()));
                    }
                    builder = builder.header(header::CONTENT_TYPE, "application/json");
                    Body::from(value.to_string())
                }
                None => Body::empty(),
            };

            let response = self
                .router
                .clone()
                .oneshot(builder.body(body).unwrap())
                .await
                .unwrap();
            let status = response.status();
            if let Some(set) = response
                .headers()
                .get(header::SET_COOKIE)
                .and_then(|v| v.to_str().ok())
            {
                self.cookie = set.split(';').next().map(str::to_string);
            }
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            if let Some(token) = value.get("csrf_token").and_then(Value::as_str) {
                self.token = Some(token.to_string());
            }
            (status, value)
        }

        async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
            self.request(Method::GET, uri, None).await
        }

        async fn post(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
            self.request(Method::POST, uri, Some(body)).await
        }
    }

    fn quantities(cart: &Value) -> Vec<(u64, u64)> {
        cart["lines"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| (l["product_id"].as_u64().unwrap(), l["quantity"].as_u64().unwrap()))
            .collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_add_update_remove_on_every_backend() {
        for backend in BACKENDS {
            let fixture = Fixture::new(backend, 8);
            let mut browser = Browser::new(router(&fixture.container));

            let (status, _) = browser.get("/products").await;
            assert_eq!(status, StatusCode::OK);

            let (_, body) = browser
                .post("/cart/add", json!({ "product_id": 7, "quantity": 2 }))
                .await;
            assert_eq!(quantities(&body["cart"]), vec![(7, 2)], "{:?}", backend);

            let (_, body) = browser
                .post("/cart/add", json!({ "product_id": 7, "quantity": 3 }))
                .await;
            assert_eq!(quantities(&body["cart"]), vec![(7, 5)], "{:?}", backend);
            assert_eq!(body["cart"]["total"], "50.00");

            let (_, body) = browser
                .post("/cart/update", json!({ "product_id": 7, "quantity": 1 }))
                .await;
            assert_eq!(quantities(&body["cart"]), vec![(7, 1)], "{:?}", backend);

            let (status, body) = browser
                .post("/cart/remove", json!({ "product_id": 7 }))
                .await;
            assert_eq!(status, StatusCode::OK);
            assert!(quantities(&body["cart"]).is_empty(), "{:?}", backend);
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cart_survives_restart() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = test_config();
        config.storage.data_dir = dir.path().to_path_buf();
        config.storage.sync_writes = false;

        let (cookie, token) = {
            let container = StorefrontContainer::open(config.clone()).unwrap();
            seed(&container, 3);
            let mut browser = Browser::new(router(&container));
            browser.get("/products").await;
            let (status, _) = browser
                .post("/cart/add", json!({ "product_id": 3, "quantity": 4 }))
                .await;
            assert_eq!(status, StatusCode::OK);
            (browser.cookie.clone(), browser.token.clone())
        };

        let container = StorefrontContainer::open(config).unwrap();
        let mut browser = Browser::new(router(&container));
        browser.cookie = cookie;
        browser.token = token;

        let (status, body) = browser.get("/cart").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(quantities(&body), vec![(3, 4)]);

        // The token issued before the restart is still the live one.
        let (status, body) = browser
            .post("/cart/add", json!({ "product_id": 3, "quantity": 1 }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(quantities(&body["cart"]), vec![(3, 5)]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_idle_visitor_gets_fresh_session_and_cart_is_purged() {
        let mut config = test_config();
        config.cart.abandoned_retention = Some(Duration::from_secs(24 * 3600));
        let fixture = Fixture::with_config(crate::fixtures::Backend::Memory, 2, config);
        let container = &fixture.container;
        let mut browser = Browser::new(router(container));

        browser.get("/products").await;
        browser
            .post("/cart/add", json!({ "product_id": 1, "quantity": 1 }))
            .await;
        let stale_cookie = browser.cookie.clone();

        // Two days later: the session has expired and the cart is abandoned.
        fixture.clock.advance(Duration::from_secs(48 * 3600));
        let maintenance = Maintenance::new(
            container.sessions.clone(),
            container.cart_store.clone(),
            container.clock.clone(),
            container.config.cart.abandoned_retention,
        );
        let report = maintenance.run_once().unwrap();
        assert_eq!(report.expired_sessions, 1);
        assert_eq!(report.purged_lines, 1);

        let (status, body) = browser.get("/cart").await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(browser.cookie, stale_cookie);
        assert!(quantities(&body).is_empty());
    }

    fn seed(container: &StorefrontContainer, products: usize) {
        use sf_05_catalog::{CatalogApi, PriceField, RawProductInput};
        for n in 1..=products {
            container
                .catalog
                .create_product(&RawProductInput {
                    name: Some(format!("Item {}", n)),
                    price: Some(PriceField::Text("2.50".to_string())),
                    ..Default::default()
                })
                .unwrap();
        }
    }
}
