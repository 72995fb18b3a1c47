use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use price_scout::{
    App, Config, ListingSource, OrchestrationError, RawListing, SearchTerm, SourceError,
    SourceLauncher,
};
use serde_json::{json, Value};
use tower::ServiceExt;

/// 模拟的词条行为
#[derive(Clone)]
enum Behavior {
    Listings(Vec<RawListing>),
    Fail,
    Hang,
    /// 等待一段时间后返回空结果
    Slow(Duration),
}

/// 按词条返回预设结果的商品来源，记录调用次数
#[derive(Default)]
struct FakeCatalog {
    behaviors: HashMap<String, Behavior>,
    fetch_calls: AtomicUsize,
    launches: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    fail_launch: bool,
}

impl FakeCatalog {
    fn with(mut self, term: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(term.to_string(), behavior);
        self
    }

    fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

struct FakeSession(Arc<FakeCatalog>);

#[async_trait]
impl ListingSource for FakeSession {
    async fn fetch_listings(&self, term: &SearchTerm) -> Result<Vec<RawListing>, SourceError> {
        self.0.fetch_calls.fetch_add(1, Ordering::SeqCst);
        match self.0.behaviors.get(term.as_str()) {
            Some(Behavior::Listings(listings)) => Ok(listings.clone()),
            Some(Behavior::Fail) => Err(SourceError::Navigation {
                url: format!("https://www.kabum.com.br/busca/{}", term),
                source: "net::ERR_TIMED_OUT".into(),
            }),
            Some(Behavior::Hang) => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Vec::new())
            }
            Some(Behavior::Slow(delay)) => {
                let now = self.0.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.0.peak_in_flight.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(*delay).await;
                self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(Vec::new())
            }
            None => Err(SourceError::NoListings),
        }
    }
}

struct FakeLauncher(Arc<FakeCatalog>);

#[async_trait]
impl SourceLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Arc<dyn ListingSource>, OrchestrationError> {
        self.0.launches.fetch_add(1, Ordering::SeqCst);
        if self.0.fail_launch {
            return Err(OrchestrationError::SourceUnavailable(
                "chromium not installed".to_string(),
            ));
        }
        Ok(Arc::new(FakeSession(self.0.clone())))
    }
}

fn test_config() -> Config {
    Config {
        retry_delay_ms: 1,
        attempt_timeout_secs: 60,
        ..Config::default()
    }
}

fn test_app(config: Config, catalog: FakeCatalog) -> (Router, Arc<FakeCatalog>) {
    let catalog = Arc::new(catalog);
    let app = App::with_launcher(config, Arc::new(FakeLauncher(catalog.clone())));
    (app.router(), catalog)
}

async fn get_text(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, text) = get_text(app, uri).await;
    let body = serde_json::from_str(&text).unwrap_or(Value::Null);
    (status, body)
}

fn listing(name: &str, price: &str, reviews: u64) -> RawListing {
    RawListing {
        name: Some(name.to_string()),
        price_text: Some(price.to_string()),
        review_text: Some(format!("({})", reviews)),
        rating_text: Some("4 of 5 stars".to_string()),
        image: Some("https://images.kabum.com.br/p.jpg".to_string()),
        link: Some(format!("/produto/{}", name)),
        sponsored: false,
    }
}

fn gpu_listings() -> Vec<RawListing> {
    vec![
        listing("gpu-a", "R$ 1.000,00", 5),
        listing("gpu-b", "R$ 800,00", 50),
        listing("gpu-c", "R$ 1.200,00", 1),
    ]
}

#[tokio::test]
async fn test_single_term_bundles() {
    let (app, _) = test_app(
        test_config(),
        FakeCatalog::default().with("gpu", Behavior::Listings(gpu_listings())),
    );

    let (status, body) = get(&app, "/search?q=gpu").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"]["gpu"].as_array().unwrap().len(), 3);

    let cheapest = &body["cheapestCombination"];
    assert_eq!(cheapest["products"].as_array().unwrap().len(), 1);
    assert_eq!(cheapest["products"][0]["name"], "gpu-b");
    assert_eq!(cheapest["products"][0]["price"], 800.0);
    assert_eq!(cheapest["totalPrice"], 800.0);

    let most_reviewed = &body["mostReviewedCombination"];
    assert_eq!(most_reviewed["products"].as_array().unwrap().len(), 1);
    assert_eq!(most_reviewed["products"][0]["reviewCount"], 50);
    assert_eq!(most_reviewed["totalPrice"], 800.0);
    assert_eq!(
        most_reviewed["products"][0]["productUrl"],
        "https://www.kabum.com.br/produto/gpu-b"
    );
}

#[tokio::test]
async fn test_failed_term_is_isolated() {
    let (app, catalog) = test_app(
        test_config(),
        FakeCatalog::default()
            .with("gpu", Behavior::Listings(gpu_listings()))
            .with("ssd", Behavior::Fail),
    );

    let (status, body) = get(&app, "/search?q=gpu,ssd").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"]["ssd"], json!([]));
    assert_eq!(body["results"]["gpu"].as_array().unwrap().len(), 3);
    for bundle in ["cheapestCombination", "mostReviewedCombination"] {
        let products = body[bundle]["products"].as_array().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0]["searchTerm"], "gpu");
    }
    // gpu 一次 + ssd 首次加两次重试
    assert_eq!(catalog.fetch_calls(), 4);
}

#[tokio::test]
async fn test_empty_query_is_bad_request() {
    let (app, catalog) = test_app(test_config(), FakeCatalog::default());

    for uri in ["/search?q=", "/search", "/search?q=%20,%20"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["error"].is_string(), "{}", uri);
    }
    assert_eq!(catalog.launches(), 0);
    assert_eq!(catalog.fetch_calls(), 0);
}

#[tokio::test]
async fn test_out_of_stock_gives_empty_bundles() {
    let (app, _) = test_app(
        test_config(),
        FakeCatalog::default().with(
            "mouse",
            Behavior::Listings(vec![
                listing("mouse-a", "---", 10),
                listing("mouse-b", "R$ 0,00", 99),
            ]),
        ),
    );

    let (status, body) = get(&app, "/search?q=mouse").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"]["mouse"].as_array().unwrap().len(), 2);
    assert_eq!(body["results"]["mouse"][0]["isAvailable"], false);
    for bundle in ["cheapestCombination", "mostReviewedCombination"] {
        assert_eq!(body[bundle]["products"], json!([]));
        assert_eq!(body[bundle]["totalPrice"], 0.0);
    }
}

#[tokio::test]
async fn test_repeat_query_served_from_cache() {
    let (app, catalog) = test_app(
        test_config(),
        FakeCatalog::default().with("gpu", Behavior::Listings(gpu_listings())),
    );

    let (_, first) = get(&app, "/search?q=gpu").await;
    let (status, second) = get(&app, "/search?q=gpu").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(catalog.fetch_calls(), 1);
    assert_eq!(catalog.launches(), 1);
}

#[tokio::test]
async fn test_expired_cache_triggers_fresh_fetch() {
    let config = Config {
        cache_ttl_secs: 1,
        ..test_config()
    };
    let (app, catalog) = test_app(
        config,
        FakeCatalog::default().with("gpu", Behavior::Listings(gpu_listings())),
    );

    get(&app, "/search?q=gpu").await;
    tokio::time::sleep(Duration::from_millis(1500)).await;
    let (status, _) = get(&app, "/search?q=gpu").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(catalog.fetch_calls(), 2);
}

#[tokio::test]
async fn test_concurrent_identical_queries_fetch_once() {
    let (app, catalog) = test_app(
        test_config(),
        FakeCatalog::default().with("gpu", Behavior::Listings(gpu_listings())),
    );

    let requests: Vec<_> = (0..5)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { get(&app, "/search?q=gpu").await })
        })
        .collect();
    for request in requests {
        let (status, _) = request.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(catalog.launches(), 1);
    assert_eq!(catalog.fetch_calls(), 1);
}

#[tokio::test]
async fn test_request_deadline_returns_partial_results() {
    let config = Config {
        request_deadline_secs: 1,
        ..test_config()
    };
    let (app, _) = test_app(
        config,
        FakeCatalog::default()
            .with("gpu", Behavior::Listings(gpu_listings()))
            .with("ssd", Behavior::Hang),
    );

    let started = Instant::now();
    let (status, body) = get(&app, "/search?q=ssd,gpu").await;

    assert_eq!(status, StatusCode::OK);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(body["results"]["ssd"], json!([]));
    assert_eq!(body["results"]["gpu"].as_array().unwrap().len(), 3);
    assert_eq!(body["cheapestCombination"]["totalPrice"], 800.0);
}

#[tokio::test]
async fn test_results_keep_query_order() {
    let (app, _) = test_app(
        test_config(),
        FakeCatalog::default()
            .with("ssd", Behavior::Listings(vec![listing("ssd-a", "R$ 300,00", 2)]))
            .with("gpu", Behavior::Listings(gpu_listings())),
    );

    let (_, text) = get_text(&app, "/search?q=ssd,gpu").await;
    let body: Value = serde_json::from_str(&text).unwrap();

    let ssd_at = text.find(r#""ssd":["#).unwrap();
    let gpu_at = text.find(r#""gpu":["#).unwrap();
    assert!(ssd_at < gpu_at);
    let terms: Vec<&Value> = body["cheapestCombination"]["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| &p["searchTerm"])
        .collect();
    assert_eq!(terms, vec!["ssd", "gpu"]);
    assert_eq!(body["cheapestCombination"]["totalPrice"], 300.0 + 800.0);
}

#[tokio::test]
async fn test_concurrent_terms_respect_limit() {
    for limit in [1, 2] {
        let config = Config {
            max_concurrent_terms: limit,
            ..test_config()
        };
        let mut catalog = FakeCatalog::default();
        for term in ["a", "b", "c", "d", "e"] {
            catalog = catalog.with(term, Behavior::Slow(Duration::from_millis(100)));
        }
        let (app, catalog) = test_app(config, catalog);

        let (status, body) = get(&app, "/search?q=a,b,c,d,e").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"].as_object().unwrap().len(), 5);
        assert_eq!(catalog.fetch_calls(), 5);
        assert_eq!(catalog.peak_in_flight(), limit, "limit={}", limit);
    }
}

#[tokio::test]
async fn test_thousands_separator_in_reviews_picks_popular() {
    let mut popular = listing("popular", "R$ 500,00", 0);
    popular.review_text = Some("(1.234)".to_string());
    let niche = listing("niche", "R$ 400,00", 50);
    let (app, _) = test_app(
        test_config(),
        FakeCatalog::default().with("mouse", Behavior::Listings(vec![niche, popular])),
    );

    let (status, body) = get(&app, "/search?q=mouse").await;

    assert_eq!(status, StatusCode::OK);
    let pick = &body["mostReviewedCombination"]["products"][0];
    assert_eq!(pick["name"], "popular");
    assert_eq!(pick["reviewCount"], 1234);
}

#[tokio::test]
async fn test_launch_failure_is_server_error() {
    let catalog = FakeCatalog {
        fail_launch: true,
        ..FakeCatalog::default()
    };
    let (app, _) = test_app(test_config(), catalog);

    let (status, body) = get(&app, "/search?q=gpu").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("chromium not installed"));
}

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app(test_config(), FakeCatalog::default());

    let (status, body) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
