//! End-to-end pipeline runs against mock mirrors

use std::path::Path;
use std::time::Duration;

use live_catalog::config::{Config, ProviderConfig};
use live_catalog::errors::AppError;
use live_catalog::output::CatalogReader;
use live_catalog::pipeline::{CatalogPipeline, RunLock};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FALLBACK_COUNT: usize = 8;

fn playlist(entries: &[(&str, &str)]) -> String {
    let mut body = String::from("#EXTM3U\n");
    for (name, url) in entries {
        body.push_str(&format!("#EXTINF:-1 group-title=\"Test\",{name}\n{url}\n"));
    }
    body
}

fn test_config(output: &Path, providers: Vec<ProviderConfig>) -> Config {
    let mut config = Config::default();
    config.output.directory = output.to_path_buf();
    config.fetch.timeout = Duration::from_secs(2);
    config.pipeline.inter_provider_delay = Duration::ZERO;
    config.providers = providers;
    config
}

async fn mount(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

fn plain_lines(output: &Path) -> Vec<String> {
    std::fs::read_to_string(output.join("result.txt"))
        .expect("plain list should exist")
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_failing_mirror_falls_through_to_next() {
    let server = MockServer::start().await;
    let temp = TempDir::new().expect("failed to create temp dir");

    mount(&server, "/primary.m3u", ResponseTemplate::new(503)).await;
    mount(
        &server,
        "/secondary.m3u",
        ResponseTemplate::new(200).set_body_string(playlist(&[
            ("Alpha", "http://stream/alpha"),
            ("Beta", "https://stream/beta"),
        ])),
    )
    .await;

    let config = test_config(
        temp.path(),
        vec![ProviderConfig::new(
            "mirrored",
            vec![
                format!("{}/primary.m3u", server.uri()),
                format!("{}/secondary.m3u", server.uri()),
            ],
        )],
    );

    let summary = CatalogPipeline::from_config(config)
        .unwrap()
        .run()
        .await
        .expect("run should succeed");

    let report = &summary.providers[0];
    assert_eq!(report.attempts, 2);
    assert_eq!(report.accepted, 2);
    assert!(report.mirror.as_deref().unwrap().ends_with("/secondary.m3u"));
    assert_eq!(summary.total, 2 + FALLBACK_COUNT);

    let lines = plain_lines(temp.path());
    assert_eq!(lines[0], "Alpha,http://stream/alpha");
    assert_eq!(lines[1], "Beta,https://stream/beta");
    assert_eq!(lines[2], "CCTV-1 综合,http://39.135.55.105:6610/PLTV/88888910/224/3221225618/index.m3u8");
}

#[tokio::test]
async fn test_successful_first_mirror_skips_the_rest() {
    let server = MockServer::start().await;
    let temp = TempDir::new().expect("failed to create temp dir");

    mount(
        &server,
        "/primary.m3u",
        ResponseTemplate::new(200).set_body_string(playlist(&[("Alpha", "http://stream/alpha")])),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/secondary.m3u"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = test_config(
        temp.path(),
        vec![ProviderConfig::new(
            "mirrored",
            vec![
                format!("{}/primary.m3u", server.uri()),
                format!("{}/secondary.m3u", server.uri()),
            ],
        )],
    );

    let summary = CatalogPipeline::from_config(config)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.providers[0].attempts, 1);

    server.verify().await;
}

#[tokio::test]
async fn test_every_provider_failing_still_publishes_fallback() {
    let server = MockServer::start().await;
    let temp = TempDir::new().expect("failed to create temp dir");

    mount(&server, "/gone.m3u", ResponseTemplate::new(404)).await;
    mount(
        &server,
        "/html.m3u",
        ResponseTemplate::new(200).set_body_string("<html><body>blocked</body></html>"),
    )
    .await;

    let config = test_config(
        temp.path(),
        vec![
            ProviderConfig::new("first", vec![format!("{}/gone.m3u", server.uri())]),
            ProviderConfig::new(
                "second",
                vec![
                    format!("{}/html.m3u", server.uri()),
                    "http://127.0.0.1:1/unreachable.m3u".to_string(),
                ],
            ),
        ],
    );

    let summary = CatalogPipeline::from_config(config)
        .unwrap()
        .run()
        .await
        .expect("provider failures must not fail the run");

    assert_eq!(summary.failed_providers(), 2);
    assert_eq!(summary.total, FALLBACK_COUNT);
    assert!(summary.providers.iter().all(|p| p.error.is_some()));
    assert_eq!(summary.providers[0].attempts, 1);
    assert_eq!(summary.providers[1].attempts, 2);

    let playlist = std::fs::read_to_string(temp.path().join("result.m3u")).unwrap();
    assert!(playlist.starts_with("#EXTM3U\n#EXTINF:-1,CCTV-1 综合\n"));
    assert_eq!(playlist.lines().count(), 1 + 2 * FALLBACK_COUNT);
}

#[tokio::test]
async fn test_provider_order_wins_over_completion_order() {
    let server = MockServer::start().await;
    let temp = TempDir::new().expect("failed to create temp dir");

    // provider A answers last but is configured first
    mount(
        &server,
        "/a.m3u",
        ResponseTemplate::new(200)
            .set_body_string(playlist(&[("Ch1", "http://a"), ("OnlyA", "http://only-a")]))
            .set_delay(Duration::from_millis(300)),
    )
    .await;
    mount(
        &server,
        "/b.m3u",
        ResponseTemplate::new(200)
            .set_body_string(playlist(&[("OnlyB", "http://only-b"), ("Ch1", "http://a")])),
    )
    .await;

    let mut config = test_config(
        temp.path(),
        vec![
            ProviderConfig::new("a", vec![format!("{}/a.m3u", server.uri())]),
            ProviderConfig::new("b", vec![format!("{}/b.m3u", server.uri())]),
        ],
    );
    config.pipeline.max_concurrent_fetches = 2;

    let summary = CatalogPipeline::from_config(config)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.duplicates_removed(), 1);
    assert_eq!(summary.providers[0].name, "a");
    assert_eq!(summary.providers[1].name, "b");

    let lines = plain_lines(temp.path());
    assert_eq!(
        &lines[..3],
        &["Ch1,http://a", "OnlyA,http://only-a", "OnlyB,http://only-b"]
    );
}

#[tokio::test]
async fn test_snapshot_matches_published_catalog() {
    let server = MockServer::start().await;
    let temp = TempDir::new().expect("failed to create temp dir");

    mount(
        &server,
        "/list.m3u",
        ResponseTemplate::new(200).set_body_string(playlist(&[
            ("浙江卫视", "http://39.135.55.105:6610/PLTV/88888910/224/3221225814/index.m3u8"),
            ("Sports HD", "https://sports/live"),
            ("Bad", "rtmp://nope"),
        ])),
    )
    .await;

    let config = test_config(
        temp.path(),
        vec![ProviderConfig::new("only", vec![format!("{}/list.m3u", server.uri())])],
    );
    let output = config.output.clone();

    let summary = CatalogPipeline::from_config(config)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.providers[0].rejected, 1);
    // the provider's 浙江卫视 entry duplicates the fallback one
    assert_eq!(summary.total, 2 + FALLBACK_COUNT - 1);

    let snapshot = CatalogReader::new(output).load_snapshot().await.unwrap();
    assert!(snapshot.is_consistent());
    assert_eq!(snapshot.total, summary.total);
    assert_eq!(snapshot.timestamp, summary.timestamp);
    assert_eq!(snapshot.version, env!("CARGO_PKG_VERSION"));

    let from_snapshot: Vec<String> = snapshot
        .channels
        .iter()
        .map(|c| format!("{},{}", c.name(), c.url()))
        .collect();
    assert_eq!(from_snapshot, plain_lines(temp.path()));
}

#[tokio::test]
async fn test_rerun_overwrites_artifacts() {
    let server = MockServer::start().await;
    let temp = TempDir::new().expect("failed to create temp dir");
    mount(
        &server,
        "/list.m3u",
        ResponseTemplate::new(200).set_body_string(playlist(&[("Alpha", "http://alpha")])),
    )
    .await;

    let mut config = test_config(
        temp.path(),
        vec![ProviderConfig::new("only", vec![format!("{}/list.m3u", server.uri())])],
    );
    CatalogPipeline::from_config(config.clone())
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(plain_lines(temp.path()).len(), 1 + FALLBACK_COUNT);

    config.providers.clear();
    CatalogPipeline::from_config(config)
        .unwrap()
        .run()
        .await
        .unwrap();
    let lines = plain_lines(temp.path());
    assert_eq!(lines.len(), FALLBACK_COUNT);
    assert!(!lines.iter().any(|l| l.starts_with("Alpha")));
}

#[tokio::test]
async fn test_concurrent_run_is_refused() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let config = test_config(temp.path(), vec![]);

    let held = RunLock::acquire(temp.path()).unwrap();
    let err = CatalogPipeline::from_config(config.clone())
        .unwrap()
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::OperationInProgress { .. }));

    drop(held);
    assert!(
        CatalogPipeline::from_config(config)
            .unwrap()
            .run()
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_lock_left_by_dead_process_does_not_block_runs() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let config = test_config(temp.path(), vec![]);
    std::fs::write(
        RunLock::lock_path(temp.path()),
        "pid=4194303\nstarted_at=2026-01-01T00:00:00+00:00\n",
    )
    .unwrap();

    for _ in 0..2 {
        let summary = CatalogPipeline::from_config(config.clone())
            .unwrap()
            .run()
            .await
            .expect("an unheld lock file must not refuse the run");
        assert_eq!(summary.total, FALLBACK_COUNT);
    }
    assert!(temp.path().join("sources.json").exists());
}
