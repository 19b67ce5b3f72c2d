//! Vendor adapter tests against a local HTTP server serving captured-style
//! Amazon markup.

use rust_decimal::Decimal;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use price_sentry::config::ScraperConfig;
use price_sentry::models::{PriceQuote, Vendor};
use price_sentry::vendor::amazon::AmazonAdapter;
use price_sentry::vendor::VendorAdapter;

fn config(base_url: &str) -> ScraperConfig {
    ScraperConfig {
        base_url: base_url.to_string(),
        request_timeout: 5,
        settle_delay_ms: 0,
        max_candidates: 30,
        user_agent: "TestAgent/1.0".to_string(),
    }
}

fn result_block(href: &str, image: &str) -> String {
    format!(
        r#"<div>
            <img src="{image}"/>
            <a href="{href}">result</a>
            <span>4.5 out of 5 stars</span>
        </div>"#
    )
}

fn results_page(blocks: &[String]) -> String {
    format!(
        r#"<html><body><div id="search"><div class="s-main-slot">{}</div></div></body></html>"#,
        blocks.concat()
    )
}

fn product_page(title: &str, whole: &str, fraction: &str) -> String {
    format!(
        r#"<html><body>
            <span id="productTitle"> {title} </span>
            <div id="corePrice_feature_div">
                <span class="a-price-whole">{whole}<span>.</span></span>
                <span class="a-price-fraction">{fraction}</span>
            </div>
        </body></html>"#
    )
}

async fn mount_search(server: &MockServer, keyword: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", keyword))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_product(server: &MockServer, product_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(product_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_search_returns_qualified_products() {
    let server = MockServer::start().await;
    let adapter = AmazonAdapter::new(&config(&server.uri())).unwrap();

    let blocks = vec![
        result_block("/dp/B01", "https://img.example.com/1.jpg"),
        result_block("/dp/B02", "https://img.example.com/2.jpg"),
    ];
    mount_search(&server, "headphones", results_page(&blocks)).await;
    mount_product(
        &server,
        "/dp/B01",
        product_page("Sony WH-1000XM5 Headphones", "348", "99"),
    )
    .await;
    mount_product(
        &server,
        "/dp/B02",
        product_page("Bose QC45 Headphones", "279", "00"),
    )
    .await;

    let products = adapter.search("headphones", None, 5).await.unwrap();
    assert_eq!(products.len(), 2);

    assert_eq!(products[0].title, "Sony WH-1000XM5 Headphones");
    assert_eq!(products[0].vendor, Vendor::Amazon);
    assert_eq!(
        products[0].price,
        PriceQuote::Available(Decimal::new(34_899, 2))
    );
    assert_eq!(products[0].image_url, "https://img.example.com/1.jpg");
    assert!(products[0].link.ends_with("/dp/B01"));
    assert!(!products[0].link_id.is_empty());
}

#[tokio::test]
async fn test_search_respects_max_results() {
    let server = MockServer::start().await;
    let adapter = AmazonAdapter::new(&config(&server.uri())).unwrap();

    let blocks: Vec<String> = (0..4)
        .map(|i| result_block(&format!("/dp/B{i:02}"), "https://img.example.com/x.jpg"))
        .collect();
    mount_search(&server, "headphones", results_page(&blocks)).await;
    for i in 0..4 {
        mount_product(
            &server,
            &format!("/dp/B{i:02}"),
            product_page(&format!("Headphones model {i}"), "99", "99"),
        )
        .await;
    }

    let products = adapter.search("headphones", None, 2).await.unwrap();
    assert_eq!(products.len(), 2);
}

#[tokio::test]
async fn test_search_include_filter() {
    let server = MockServer::start().await;
    let adapter = AmazonAdapter::new(&config(&server.uri())).unwrap();

    let blocks = vec![
        result_block("/dp/B01", "https://img.example.com/1.jpg"),
        result_block("/dp/B02", "https://img.example.com/2.jpg"),
    ];
    mount_search(&server, "headphones", results_page(&blocks)).await;
    mount_product(
        &server,
        "/dp/B01",
        product_page("Sony WH-1000XM5 Headphones", "348", "99"),
    )
    .await;
    mount_product(
        &server,
        "/dp/B02",
        product_page("Bose QC45 Headphones", "279", "00"),
    )
    .await;

    let products = adapter
        .search("headphones", Some("sony xm5"), 5)
        .await
        .unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].title, "Sony WH-1000XM5 Headphones");
}

#[tokio::test]
async fn test_search_unexpected_markup_yields_no_results() {
    let server = MockServer::start().await;
    let adapter = AmazonAdapter::new(&config(&server.uri())).unwrap();

    mount_search(
        &server,
        "headphones",
        "<html><body><p>Robot check</p></body></html>".to_string(),
    )
    .await;

    let products = adapter.search("headphones", None, 5).await.unwrap();
    assert!(products.is_empty());
}

#[tokio::test]
async fn test_search_broken_product_page_is_skipped() {
    let server = MockServer::start().await;
    let adapter = AmazonAdapter::new(&config(&server.uri())).unwrap();

    let blocks = vec![
        result_block("/dp/B01", "https://img.example.com/1.jpg"),
        result_block("/dp/B02", "https://img.example.com/2.jpg"),
    ];
    mount_search(&server, "headphones", results_page(&blocks)).await;
    // B01 is down; B02 loads fine
    Mock::given(method("GET"))
        .and(path("/dp/B01"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_product(
        &server,
        "/dp/B02",
        product_page("Bose QC45 Headphones", "279", "00"),
    )
    .await;

    let products = adapter.search("headphones", None, 5).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].title, "Bose QC45 Headphones");
}

#[tokio::test]
async fn test_search_keeps_unpriced_product() {
    let server = MockServer::start().await;
    let adapter = AmazonAdapter::new(&config(&server.uri())).unwrap();

    let blocks = vec![result_block("/dp/B01", "https://img.example.com/1.jpg")];
    mount_search(&server, "headphones", results_page(&blocks)).await;
    mount_product(
        &server,
        "/dp/B01",
        // Title but no price container - listed, currently unavailable
        r#"<html><body><span id="productTitle">Sold Out Headphones</span></body></html>"#
            .to_string(),
    )
    .await;

    let products = adapter.search("headphones", None, 5).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].price, PriceQuote::Unavailable);
}

#[tokio::test]
async fn test_fetch_price_available() {
    let server = MockServer::start().await;
    let adapter = AmazonAdapter::new(&config(&server.uri())).unwrap();

    mount_product(&server, "/dp/B01", product_page("Headphones", "89", "50")).await;

    let price = adapter
        .fetch_price(&format!("{}/dp/B01", server.uri()))
        .await
        .unwrap();
    assert_eq!(price, PriceQuote::Available(Decimal::new(8_950, 2)));
}

#[tokio::test]
async fn test_fetch_price_unavailable_markup() {
    let server = MockServer::start().await;
    let adapter = AmazonAdapter::new(&config(&server.uri())).unwrap();

    mount_product(
        &server,
        "/dp/B01",
        "<html><body><p>Currently unavailable.</p></body></html>".to_string(),
    )
    .await;

    let price = adapter
        .fetch_price(&format!("{}/dp/B01", server.uri()))
        .await
        .unwrap();
    assert_eq!(price, PriceQuote::Unavailable);
}

#[tokio::test]
async fn test_fetch_price_http_error_propagates() {
    let server = MockServer::start().await;
    let adapter = AmazonAdapter::new(&config(&server.uri())).unwrap();

    Mock::given(method("GET"))
        .and(path("/dp/B01"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = adapter.fetch_price(&format!("{}/dp/B01", server.uri())).await;
    assert!(result.is_err());
}
