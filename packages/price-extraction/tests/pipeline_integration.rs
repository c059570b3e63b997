//! End-to-end runs through router, controller, reporter and batch runner.

use price_extraction::pipeline::{load_route_file, PatternSpec};
use price_extraction::testing::{MockAnalyzer, MockBrowser};
use price_extraction::{
    report, BatchRunner, DomainRouter, EscalationController, ExtractionRequest, PipelineConfig,
    Resolution, RouteSpec, StrategyTier, VecSink,
};
use rust_decimal::Decimal;
use std::sync::Arc;

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn controller(router: DomainRouter, config: PipelineConfig) -> EscalationController {
    EscalationController::new(Arc::new(router), config)
}

#[tokio::test]
async fn test_market_price_from_custom_route() {
    let url = "https://funds.example/etf/abc";
    let router = DomainRouter::builder()
        .with_spec(RouteSpec::new("funds", "funds.example").with_pattern(
            PatternSpec::new(r"(?i)market price.*?\$\s*([\d.,]+)", "market price").currency(),
        ))
        .build()
        .unwrap();
    let mut browser =
        MockBrowser::new().with_text_page(url, "Market Price as of 05/20/2025 $23.15");

    let request = ExtractionRequest::new(url);
    let resolution = controller(router, PipelineConfig::default())
        .resolve(&mut browser, &request)
        .await;

    match &resolution {
        Resolution::Succeeded { value, tier, strategy, .. } => {
            assert_eq!(*value, d("23.15"));
            assert_eq!(*tier, StrategyTier::Custom);
            assert_eq!(strategy, "funds");
        }
        other => panic!("expected success, got {:?}", other),
    }
    assert_eq!(
        report(&request, &resolution).to_json(),
        serde_json::json!({"market price": 23.15})
    );
}

#[tokio::test]
async fn test_notes_outstanding_from_route_file() {
    let json = r#"[
        {
            "name": "example-etn",
            "host": "etn.example.com",
            "path_prefix": "/notes",
            "patterns": [
                { "regex": "(?i)notes outstanding\\s*([\\d,.]+)", "label": "notes outstanding" },
                { "regex": "(?i)creation unit\\s*([\\d,.]+)", "label": "notes outstanding" }
            ]
        }
    ]"#;
    let path = std::env::temp_dir().join(format!("routes-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, json).unwrap();
    let specs = load_route_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let router = DomainRouter::builder().with_specs(specs).build().unwrap();
    let url = "https://www.etn.example.com/notes/ABC";
    assert_eq!(router.route(url).route(), "example-etn");

    let mut browser = MockBrowser::new()
        .with_text_page(url, "Notes Outstanding 5,853,000 Creation Unit 630,000");
    let request = ExtractionRequest::new(url).with_labels(["notes outstanding"]);
    let resolution = controller(router, PipelineConfig::default())
        .resolve(&mut browser, &request)
        .await;

    assert_eq!(resolution.value(), Some(d("5853000")));
    assert_eq!(
        report(&request, &resolution).value("notes outstanding"),
        Some(d("5853000"))
    );
}

#[tokio::test]
async fn test_fund_size_rejection_escalates_to_generic() {
    let url = "https://fund.example/product";
    let router = DomainRouter::builder()
        .with_spec(
            RouteSpec::new("fund", "fund.example")
                .with_pattern(PatternSpec::new(r"(?i)eur\s*([\d.,]+)\s*m\b", "market price")),
        )
        .build()
        .unwrap();
    let text = "Fund Size EUR 1,089 m. \
                The share class tracks a broad basket of European equities and accumulates income. \
                Market Price EUR 41.27";
    let mut browser = MockBrowser::new().with_text_page(url, text);

    let resolution = controller(router, PipelineConfig::default().with_ai_fallback(false))
        .resolve(&mut browser, &ExtractionRequest::new(url))
        .await;

    match resolution {
        Resolution::Succeeded { value, tier, .. } => {
            assert_eq!(value, d("41.27"));
            assert_eq!(tier, StrategyTier::Generic);
        }
        other => panic!("expected generic success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_everything_fails_without_ai_reports_error() {
    let url = "https://unknown.example/fund";
    let router = DomainRouter::builder()
        .with_analyzer(Arc::new(MockAnalyzer::returning(Some(d("99.99")))))
        .build()
        .unwrap();
    let mut browser = MockBrowser::new().with_text_page(url, "Fund Size EUR 1,089 m");

    let request = ExtractionRequest::new(url);
    let resolution = controller(router, PipelineConfig::default().with_ai_fallback(false))
        .resolve(&mut browser, &request)
        .await;

    assert!(!resolution.is_success());
    assert!(resolution
        .attempts()
        .iter()
        .all(|a| a.tier != StrategyTier::Ai));

    let result = report(&request, &resolution);
    let message = result.error_message().unwrap();
    assert!(message.starts_with("exhausted_all_tiers"));
    assert_eq!(result.keys().collect::<Vec<_>>(), vec!["error"]);
}

#[tokio::test]
async fn test_ai_rescues_once_after_all_tiers_miss() {
    let url = "https://unknown.example/quote";
    let analyzer = MockAnalyzer::returning(Some(d("23.15")));
    let observer = analyzer.clone();
    let router = DomainRouter::builder()
        .with_analyzer(Arc::new(analyzer))
        .build()
        .unwrap();
    let mut browser = MockBrowser::new().with_text_page(url, "Quote temporarily unavailable");

    let request = ExtractionRequest::new(url).with_labels(["market price", "nav"]);
    let resolution = controller(router, PipelineConfig::default())
        .resolve(&mut browser, &request)
        .await;

    assert_eq!(resolution.value(), Some(d("23.15")));
    assert!(matches!(
        resolution,
        Resolution::Succeeded { tier: StrategyTier::Ai, .. }
    ));
    assert_eq!(observer.calls(), vec![url]);
}

#[tokio::test]
async fn test_request_can_opt_out_of_ai() {
    let url = "https://unknown.example/quote";
    let analyzer = MockAnalyzer::returning(Some(d("23.15")));
    let observer = analyzer.clone();
    let router = DomainRouter::builder()
        .with_analyzer(Arc::new(analyzer))
        .build()
        .unwrap();
    let mut browser = MockBrowser::new().with_text_page(url, "Quote temporarily unavailable");

    let resolution = controller(router, PipelineConfig::default())
        .resolve(&mut browser, &ExtractionRequest::new(url).without_ai_fallback())
        .await;

    assert!(!resolution.is_success());
    assert!(observer.calls().is_empty());
}

#[tokio::test]
async fn test_batch_over_builtin_catalog() {
    let ishares = "https://www.ishares.com/us/products/239726/";
    let ipath = "https://www.ipathetn.com/US/16/en/details.app?instrumentId=1";
    let router = DomainRouter::builder()
        .with_builtin_catalog()
        .build()
        .unwrap();
    let runner = BatchRunner::new(controller(router, PipelineConfig::default()));

    let mut browser = MockBrowser::new()
        .with_text_page(ishares, "Key Facts Closing Price 542.18 Shares Outstanding 1,012,450,000")
        .with_text_page(ipath, "Closing Indicative Note Value $41.72 Notes Outstanding 5,853,000")
        .with_timeout("https://slow.example/fund");
    let observer = browser.clone();
    let mut sink = VecSink::new();

    let requests = vec![
        ExtractionRequest::new(ishares).with_labels(["closing price"]),
        ExtractionRequest::new("https://slow.example/fund"),
        ExtractionRequest::new(ipath).with_labels(["notes outstanding"]),
    ];
    let summary = tokio_test::assert_ok!(runner.run(&mut browser, requests, &mut sink).await);

    assert_eq!((summary.processed, summary.succeeded, summary.failed), (3, 2, 1));
    assert_eq!(sink.rows[0].result.value("closing price"), Some(d("542.18")));
    assert_eq!(sink.rows[0].tier, Some(StrategyTier::Custom));
    assert!(sink.rows[1].result.is_error());
    assert_eq!(sink.rows[2].result.value("notes outstanding"), Some(d("5853000")));
    assert_eq!(
        sink.rows.iter().map(|r| r.index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(observer.shutdown_count(), 1);
}
