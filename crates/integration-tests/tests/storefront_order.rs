//! End-to-end order flows against the storefront.

use gante_integration_tests::{TestContext, WHATSAPP_NUMBER, client};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn post(ctx: &TestContext, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = ctx.client.post(ctx.storefront.url(path));
    let request = match body {
        Some(body) => request.json(&body),
        None => request,
    };
    let resp = request.send().await.expect("Request failed");
    let status = resp.status();
    (status, resp.json().await.unwrap_or(Value::Null))
}

async fn get(ctx: &TestContext, path: &str) -> (StatusCode, Value) {
    let resp = ctx
        .client
        .get(ctx.storefront.url(path))
        .send()
        .await
        .expect("Request failed");
    let status = resp.status();
    (status, resp.json().await.unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_frozen_order_to_whatsapp_link() {
    let ctx = TestContext::new().await;

    let (status, _) = post(&ctx, "/order/frozen/size", Some(json!({"size_id": "medio"}))).await;
    assert_eq!(status, StatusCode::OK);

    for flavor in ["g2", "g6"] {
        let (status, body) = post(&ctx, &format!("/order/frozen/flavors/{flavor}/add"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accepted"], true);
    }
    // The medium cup holds two flavors.
    let (_, body) = post(&ctx, "/order/frozen/flavors/g1/add", None).await;
    assert_eq!(body["accepted"], false);

    let (status, _) = post(&ctx, "/order/frozen/toppings/t4/toggle", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(&ctx, "/order/frozen/commit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["item"]["description"],
        "Gelato Medio - Pistacchio, Limone + Granola (x1)"
    );
    assert_eq!(body["item"]["price"], "19.00");
    assert_eq!(body["order"]["total_display"], "R$ 19,00");

    let (status, checkout) = post(&ctx, "/order/checkout", Some(json!({"name": "Ana"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(checkout["total"], "19.00");

    let message = checkout["message"].as_str().unwrap_or_default();
    assert!(message.starts_with("*Pedido Gante Gelato & Chocolates*"));
    assert!(message.contains("*Cliente:* Ana"));
    assert!(message.contains("*1.* Gelato Medio - Pistacchio, Limone + Granola (x1)"));
    assert!(message.contains("*Retirada na loja*"));
    assert!(message.contains("*TOTAL: R$ 19,00*"));

    let url = checkout["url"].as_str().unwrap_or_default();
    assert!(url.starts_with(&format!("https://wa.me/{WHATSAPP_NUMBER}?text=")));
    assert!(url.contains("R%24%2019%2C00"));

    // Checkout starts a fresh order.
    let (_, order) = get(&ctx, "/order").await;
    assert_eq!(order["items"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_mixed_order_with_delivery_fee() {
    let ctx = TestContext::with_storefront_vars(&[("DELIVERY_FEE", "5,00")]).await;

    post(&ctx, "/order/confection/box", Some(json!({"box_id": "box6"}))).await;
    let (status, _) = post(&ctx, "/order/confection/items/c1/add", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post(&ctx, "/order/confection/commit", None).await;
    assert_eq!(status, StatusCode::OK);

    post(&ctx, "/order/misc/items/d1/add", None).await;
    let (status, body) = post(&ctx, "/order/misc/commit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["items"].as_array().map(Vec::len), Some(2));

    let (status, body) = post(
        &ctx,
        "/order/checkout",
        Some(json!({"name": "Bruno", "delivery": true, "address": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());

    // A refused checkout keeps the order.
    let (_, order) = get(&ctx, "/order").await;
    assert_eq!(order["items"].as_array().map(Vec::len), Some(2));

    let (status, checkout) = post(
        &ctx,
        "/order/checkout",
        Some(json!({"name": "Bruno", "delivery": true, "address": "Rua das Flores, 10"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let message = checkout["message"].as_str().unwrap_or_default();
    assert!(message.contains("*Entrega:* Rua das Flores, 10"));
    assert!(message.contains("Taxa de entrega: R$ 5,00"));
}

#[tokio::test]
async fn test_orders_are_per_session() {
    let ctx = TestContext::new().await;
    post(&ctx, "/order/misc/items/d1/add", None).await;
    post(&ctx, "/order/misc/commit", None).await;

    let other = client();
    let resp = other
        .get(ctx.storefront.url("/order"))
        .send()
        .await
        .expect("Request failed");
    let order: Value = resp.json().await.unwrap_or(Value::Null);
    assert_eq!(order["items"].as_array().map(Vec::len), Some(0));

    let (_, mine) = get(&ctx, "/order").await;
    assert_eq!(mine["items"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_remove_item_and_reset() {
    let ctx = TestContext::new().await;
    post(&ctx, "/order/misc/items/d1/add", None).await;
    let (_, body) = post(&ctx, "/order/misc/commit", None).await;
    let id = body["item"]["id"].as_str().unwrap_or_default().to_string();

    let resp = ctx
        .client
        .delete(ctx.storefront.url(&format!("/order/items/{id}")))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ctx
        .client
        .delete(ctx.storefront.url(&format!("/order/items/{id}")))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    post(&ctx, "/order/frozen/size", Some(json!({"size_id": "pequeno"}))).await;
    let (status, order) = post(&ctx, "/order/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(order["frozen"]["size"].is_null());
}

#[tokio::test]
async fn test_boxed_confections_must_fill_the_box() {
    let ctx = TestContext::with_storefront_vars(&[("ORDER_CONFECTION_POLICY", "boxed")]).await;

    post(&ctx, "/order/confection/box", Some(json!({"box_id": "box6"}))).await;
    post(&ctx, "/order/confection/items/c1/add", None).await;
    let (status, _) = post(&ctx, "/order/confection/commit", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    for _ in 0..5 {
        post(&ctx, "/order/confection/items/c2/add", None).await;
    }
    let (status, _) = post(&ctx, "/order/confection/quantity", Some(json!({"quantity": 2}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(&ctx, "/order/confection/commit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["price"], "96.00");
    assert_eq!(body["item"]["quantity"], 2);
}
