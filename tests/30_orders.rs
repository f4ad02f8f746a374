mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{TestClient, TestServer};

async fn menu(admin: &TestClient) -> Result<()> {
    for product in [
        json!({ "name": "Latte", "price": "4.25", "stock": 10 }),
        json!({ "name": "Muffin", "price": "3.00", "stock": 2 }),
    ] {
        let (status, _) = admin.post("/api/products", product).await?;
        anyhow::ensure!(status == StatusCode::CREATED);
    }
    Ok(())
}

fn stock_of(products: &Value, id: u64) -> Option<u64> {
    products["data"]
        .as_array()?
        .iter()
        .find(|p| p["id"].as_u64() == Some(id))?["stock"]
        .as_u64()
}

#[tokio::test]
async fn placing_an_order_records_sales_and_takes_stock() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.admin().await?;
    menu(&admin).await?;
    let staff = server.staff("sam").await?;

    let (status, receipt) = staff
        .post(
            "/api/orders",
            json!({ "items": [
                { "product_id": 1, "quantity": 2 },
                { "product_id": 2, "quantity": 1 },
                { "product_id": 1, "quantity": 1 }
            ]}),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["data"]["username"], "sam");
    assert_eq!(receipt["data"]["total"], "15.75");
    assert_eq!(receipt["data"]["item_count"], 4);
    assert_eq!(receipt["data"]["lines"].as_array().map(Vec::len), Some(2));

    let (_, products) = staff.get("/api/products").await?;
    assert_eq!(stock_of(&products, 1), Some(7));
    assert_eq!(stock_of(&products, 2), Some(1));

    let order_id = receipt["data"]["order_id"].as_str().unwrap_or_default().to_string();
    let (status, sales) = staff.get(&format!("/api/sales?order_id={}", order_id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sales["data"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn short_stock_rejects_the_whole_order() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.admin().await?;
    menu(&admin).await?;

    let (status, body) = admin
        .post(
            "/api/orders",
            json!({ "items": [
                { "product_id": 1, "quantity": 1 },
                { "product_id": 2, "quantity": 3 }
            ]}),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (_, products) = admin.get("/api/products").await?;
    assert_eq!(stock_of(&products, 1), Some(10));

    let (status, body) = admin.post("/api/orders", json!({ "items": [] })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = admin.post("/api/orders", json!({ "items": [{ "product_id": 9, "quantity": 1 }] })).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, sales) = admin.get("/api/sales").await?;
    assert_eq!(sales["data"], json!([]));
    Ok(())
}

#[tokio::test]
async fn staff_only_see_their_own_sales() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.admin().await?;
    menu(&admin).await?;
    let sam = server.staff("sam").await?;
    let alex = server.staff("alex").await?;

    sam.post("/api/orders", json!({ "items": [{ "product_id": 1, "quantity": 1 }] })).await?;
    alex.post("/api/orders", json!({ "items": [{ "product_id": 1, "quantity": 2 }] })).await?;

    let (_, sales) = sam.get("/api/sales?username=alex").await?;
    let lines = sales["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["username"], "sam");

    let (_, sales) = admin.get("/api/sales").await?;
    assert_eq!(sales["data"].as_array().map(Vec::len), Some(2));

    let (_, sales) = admin.get("/api/sales?username=alex").await?;
    assert_eq!(sales["data"][0]["quantity"], 2);

    let (status, summary) = admin.get("/api/sales/summary").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["data"]["order_count"], 2);
    assert_eq!(summary["data"]["item_count"], 3);
    assert_eq!(summary["data"]["revenue"], "12.75");
    assert_eq!(summary["data"]["products"][0]["product_name"], "Latte");

    let (_, summary) = sam.get("/api/sales/summary").await?;
    assert_eq!(summary["data"]["order_count"], 1);
    Ok(())
}

#[tokio::test]
async fn sales_filters_are_validated() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.admin().await?;

    let (status, body) = admin.get("/api/sales?from=yesterday").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = admin.get("/api/sales?from=2024-01-01&to=2024-12-31&limit=5").await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
