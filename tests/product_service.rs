mod support;

use std::io;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use axum::http::Method;
use catalog::application::products::{
    CreateProductCommand, ProductError, UpdateStockCommand,
};
use catalog::cache::CacheClient;
use catalog::cache::keys::entity_key;
use catalog::domain::ids::ProductId;
use catalog::domain::sku::{MAX_SKU_ATTEMPTS, is_valid_sku};
use serde_json::json;
use tracing::Level;

use support::{TestApp, memory_client};

fn lamp() -> CreateProductCommand {
    CreateProductCommand {
        name: "Desk Lamp".to_string(),
        description: "Adjustable arm, warm light".to_string(),
        price: 24.0,
        stock: 50,
        is_active: true,
    }
}

#[tokio::test]
async fn sku_collisions_are_retried_until_a_free_code_is_found() {
    let app = TestApp::with_client(memory_client());
    app.store.collide_skus(2);

    let product = app.service.create_product(lamp()).await.expect("create");

    assert!(is_valid_sku(&product.sku));
    assert_eq!(app.store.create_attempts.load(Ordering::SeqCst), 3);
    assert!(app.store.stored(product.id.as_str()).await.is_some());
}

#[tokio::test]
async fn exhausted_sku_attempts_surface_as_conflict() {
    let app = TestApp::with_client(memory_client());
    app.store.collide_skus(usize::MAX);

    let err = app
        .service
        .create_product(lamp())
        .await
        .expect_err("every sku collides");
    assert!(matches!(
        err,
        ProductError::SkuExhausted { attempts } if attempts == MAX_SKU_ATTEMPTS
    ));
    assert_eq!(
        app.store.create_attempts.load(Ordering::SeqCst),
        MAX_SKU_ATTEMPTS
    );

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Desk Lamp",
                "description": "Adjustable arm, warm light",
                "price": 24.0,
                "stock": 50,
            })),
        )
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["code"], json!("sku_exhausted"));
}

#[tokio::test]
async fn failed_writes_leave_cached_entries_in_place() {
    let cache = memory_client();
    let app = TestApp::with_client(cache.clone());

    let product = app.service.create_product(lamp()).await.expect("create");
    let id = product.id.to_string();
    let (status, _) = app
        .request(Method::GET, &format!("/api/v1/products/{id}"), None)
        .await;
    assert_eq!(status, 200);
    let (status, _) = app.request(Method::GET, "/api/v1/products", None).await;
    assert_eq!(status, 200);
    assert_eq!(cache.len(), 2);

    app.store.fail_writes(true);
    let failing = [
        (
            Method::PATCH,
            format!("/api/v1/products/{id}"),
            Some(json!({ "price": 30.0 })),
        ),
        (
            Method::PATCH,
            format!("/api/v1/products/{id}/stock"),
            Some(json!({ "stock": 1, "reason": "damaged" })),
        ),
        (Method::DELETE, format!("/api/v1/products/{id}"), None),
    ];
    for (method, uri, body) in failing {
        let (status, _) = app.request(method.clone(), &uri, body).await;
        assert_eq!(status, 500, "{method} {uri} should fail");
        assert_eq!(cache.len(), 2, "{method} {uri} touched the cache");
    }

    app.store.fail_writes(false);
    let (status, _) = app
        .request(
            Method::DELETE,
            "/api/v1/products/65920080abcdef0123456789",
            None,
        )
        .await;
    assert_eq!(status, 404);
    assert_eq!(cache.len(), 2);

    let key = entity_key(&ProductId::parse(&id).expect("valid id"));
    assert!(cache.get(&key).await.expect("memory cache").is_some());
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        let bytes = self.0.lock().expect("log buffer").clone();
        String::from_utf8(bytes).expect("utf8 logs")
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn low_stock_warning_fires_at_the_threshold() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(Level::WARN)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let app = TestApp::with_client(memory_client());
    let product = app.service.create_product(lamp()).await.expect("create");
    let id = product.id.to_string();

    app.service
        .update_stock(
            &id,
            UpdateStockCommand {
                stock: 11,
                reason: "cycle count".to_string(),
            },
        )
        .await
        .expect("stock above threshold");
    assert!(!logs.contents().contains("Product stock is low"));

    app.service
        .update_stock(
            &id,
            UpdateStockCommand {
                stock: 10,
                reason: "sold".to_string(),
            },
        )
        .await
        .expect("stock at threshold");
    let output = logs.contents();
    assert!(output.contains("Product stock is low"), "logs: {output}");
    assert!(output.contains("threshold=10"), "logs: {output}");
    assert!(output.contains(&format!("product_id={id}")), "logs: {output}");
}
