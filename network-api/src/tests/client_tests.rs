use std::sync::Arc;

use api_types::{EndpointWithRest, HistorySegment};
use pretty_assertions::assert_eq;
use rstest::rstest;
use tokio_util::sync::CancellationToken;

use super::fake_transport::*;
use crate::{
    client::{has_fresh_segment, NetworkClient},
    endpoint::Endpoint,
    error::{NetworkError, ProbeError, RejectedEndpoint},
    health::HealthVerdict,
    transport::HttpTransport,
};

const A: &str = "https://a.example.com";
const B: &str = "https://b.example.com";
const C: &str = "https://c.example.com";

async fn client(
    transport: &Arc<FakeTransport>,
    endpoints: &[&str],
    restrict_to_healthy: bool,
) -> Result<NetworkClient<Arc<FakeTransport>>, NetworkError> {
    NetworkClient::builder(transport.clone())
        .endpoints(endpoints.iter().copied())
        .restrict_to_healthy(restrict_to_healthy)
        .config(test_config())
        .build()
        .await
}

fn endpoint_names<T: HttpTransport>(client: &NetworkClient<T>) -> Vec<&str> {
    client.endpoints().iter().map(|endpoint| endpoint.as_str()).collect()
}

#[tokio::test]
async fn test_requires_an_endpoint() {
    let transport = FakeTransport::new();
    let error = client(&transport, &[], false).await.err().unwrap();
    assert!(matches!(error, NetworkError::Configuration(_)));
}

#[tokio::test]
async fn test_rejects_invalid_endpoint() {
    let transport = FakeTransport::new();
    let error = client(&transport, &[A, "not a url"], false).await.err().unwrap();
    assert!(matches!(error, NetworkError::Configuration(_)));
}

#[tokio::test]
async fn test_unrestricted_client_does_not_probe() {
    let transport = FakeTransport::new();
    let client = client(&transport, &[A, B], false).await.unwrap();

    assert_eq!(endpoint_names(&client), vec![A, B]);
    assert_eq!(client.reference_height(), None);
    assert_eq!(transport.total_calls(), 0);
}

#[tokio::test]
async fn test_no_healthy_endpoint_when_every_probe_fails() {
    let transport = FakeTransport::new();
    transport.on(&statistics_url(A), status_reply(503));

    let error = client(&transport, &[A, B, C], true).await.err().unwrap();

    match error {
        NetworkError::NoHealthyEndpoint { failures, .. } => {
            assert_eq!(failures.len(), 3);
            assert_eq!(failures[0].endpoint.as_str(), A);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_restricts_to_healthy_endpoints_in_order() {
    let transport = FakeTransport::new();
    transport
        .on(&statistics_url(A), statistics_reply(10_000, Some(9_990)))
        .on(&statistics_url(B), statistics_reply(9_000, None))
        .on(&statistics_url(C), statistics_reply(9_600, None));

    let client = client(&transport, &[A, B, C], true).await.unwrap();

    assert_eq!(client.reference_height(), Some(10_000));
    assert_eq!(endpoint_names(&client), vec![A, C]);
}

#[tokio::test]
async fn test_straggler_does_not_lower_reference() {
    let transport = FakeTransport::new();
    transport
        .on(&statistics_url(A), statistics_reply(100, None))
        .on(&statistics_url(B), statistics_reply(50_000, None));

    let client = client(&transport, &[A, B], true).await.unwrap();

    assert_eq!(client.reference_height(), Some(50_000));
    assert_eq!(endpoint_names(&client), vec![B]);
}

#[tokio::test]
async fn test_no_healthy_endpoint_when_all_data_planes_lag() {
    let transport = FakeTransport::new();
    transport
        .on(&statistics_url(A), statistics_reply(10_000, Some(1_000)))
        .on(&statistics_url(B), statistics_reply(10_000, Some(2_000)));

    let error = client(&transport, &[A, B], true).await.err().unwrap();
    assert!(matches!(error, NetworkError::NoHealthyEndpoint { .. }));
}

#[tokio::test]
async fn test_statistics_falls_back_without_retrying() {
    let transport = FakeTransport::new();
    transport
        .on(&statistics_url(A), status_reply(500))
        .on(&statistics_url(B), statistics_reply(42, None));

    let client = client(&transport, &[A, B], false).await.unwrap();
    let status = client.statistics().await.unwrap();

    assert_eq!(status.block_height, 42);
    assert_eq!(transport.calls_to(&statistics_url(A)), 1);
}

#[tokio::test]
async fn test_statistics_aggregates_every_failure() {
    let transport = FakeTransport::new();
    transport.on(&statistics_url(A), status_reply(500));

    let client = client(&transport, &[A, B], false).await.unwrap();

    match client.statistics().await.unwrap_err() {
        NetworkError::AllEndpointsFailed(aggregate) => {
            let failures = aggregate.failures();
            assert_eq!(failures.len(), 2);
            assert_eq!(failures[0].endpoint.as_str(), A);
            assert!(matches!(failures[0].error, ProbeError::Status { status: 500, .. }));
            assert_eq!(failures[1].endpoint.as_str(), B);
            assert!(matches!(failures[1].error, ProbeError::Transport { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_snapshots_first_success_wins() {
    let transport = FakeTransport::new();
    transport
        .on(&snapshots_url(A), snapshots_reply(&[(100, "AA")]))
        .on(&snapshots_url(B), snapshots_reply(&[(200, "BB")]));

    let client = client(&transport, &[A, B], false).await.unwrap();
    let snapshots = client.snapshots().await.unwrap();

    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].block_hash, "AA");
    assert_eq!(transport.calls_to(&snapshots_url(B)), 0);
}

#[tokio::test]
async fn test_stale_segments_fall_through_to_next_endpoint() {
    let transport = FakeTransport::new();
    transport
        .on(&segments_url(A), segments_reply(&[449, 549, 649]))
        .on(&segments_url(B), segments_reply(&[450, 550, 650]));

    let client = client(&transport, &[A, B], false).await.unwrap();
    let segments = client.history_segments(1_000).await.unwrap();

    assert_eq!(
        segments.iter().filter_map(HistorySegment::end_height).collect::<Vec<_>>(),
        vec![450, 550, 650]
    );
    assert_eq!(transport.calls_to(&segments_url(A)), 1);
}

#[tokio::test]
async fn test_all_stale_segments_fail() {
    let transport = FakeTransport::new();
    transport.on(&segments_url(A), segments_reply(&[100, 200, 300]));

    let client = client(&transport, &[A], false).await.unwrap();

    match client.history_segments(1_000).await.unwrap_err() {
        NetworkError::AllEndpointsFailed(aggregate) => match &aggregate.failures()[0].error {
            ProbeError::StaleSegments {
                newest,
                network_height,
                threshold,
                ..
            } => {
                assert_eq!(*newest, Some(300));
                assert_eq!(*network_height, 1_000);
                assert_eq!(*threshold, 350);
            }
            other => panic!("unexpected failure: {other:?}"),
        },
        other => panic!("unexpected error: {other:?}"),
    }
}

#[rstest]
#[case::boundary(&[650], 1_000, true)]
#[case::one_below_boundary(&[649], 1_000, false)]
#[case::young_network(&[10], 200, true)]
#[case::network_equals_threshold(&[1], 350, true)]
#[case::placeholders_never_fresh(&[0], 100, false)]
#[case::empty(&[], 100, false)]
fn test_segment_freshness(#[case] to_heights: &[u64], #[case] network_height: u64, #[case] fresh: bool) {
    let segments: Vec<HistorySegment> = to_heights
        .iter()
        .map(|to| HistorySegment {
            from_height: Some(0),
            to_height: Some(*to),
            segment_id: format!("Qm{to}"),
        })
        .collect();

    assert_eq!(has_fresh_segment(&segments, network_height, 350), fresh);
}

#[tokio::test]
async fn test_cancelled_client_fails_fast() {
    let transport = FakeTransport::new();
    transport.on(&statistics_url(A), statistics_reply(1, None));

    let cancel = CancellationToken::new();
    let client = NetworkClient::builder(transport.clone())
        .endpoints([A, B])
        .config(test_config())
        .cancellation(cancel.clone())
        .build()
        .await
        .unwrap();

    cancel.cancel();

    assert!(matches!(client.statistics().await, Err(NetworkError::Cancelled)));
    assert!(matches!(client.snapshots().await, Err(NetworkError::Cancelled)));
    assert_eq!(transport.total_calls(), 0);
}

#[tokio::test]
async fn test_healthy_endpoints_returns_companions_of_healthy_rest() {
    let transport = FakeTransport::new();
    transport
        .on(&statistics_url(A), statistics_reply(5_000, None))
        .on(&statistics_url(B), statistics_reply(4_000, None));

    let client = client(&transport, &[A], false).await.unwrap();
    let candidates = vec![
        EndpointWithRest::new(A, "a.example.com:26657"),
        EndpointWithRest::new(B, "b.example.com:26657"),
        EndpointWithRest::new(C, "c.example.com:26657"),
        EndpointWithRest::new("not a url", "d.example.com:26657"),
    ];

    let healthy = client.healthy_endpoints(&candidates).await.unwrap();
    assert_eq!(healthy, vec!["a.example.com:26657".to_string()]);
}

#[tokio::test]
async fn test_records_metrics() {
    let metrics = Arc::new(metrics::Metrics::new().unwrap());
    let transport = FakeTransport::new();
    transport
        .on(&statistics_url(A), statistics_reply(7_000, None))
        .on(&statistics_url(B), statistics_reply(1_000, None));

    NetworkClient::builder(transport.clone())
        .endpoints([A, B])
        .restrict_to_healthy(true)
        .config(test_config())
        .metrics(metrics.clone())
        .build()
        .await
        .unwrap();

    let rendered = metrics.gather().unwrap();
    assert!(rendered.contains("bootstrap_network_reference_height 7000"));
    assert!(rendered.contains("bootstrap_healthy_endpoints 1"));
    assert!(rendered.contains(r#"bootstrap_endpoint_health_total{verdict="behind_network"} 1"#));
    assert!(rendered.contains(r#"bootstrap_probe_requests_total{resource="statistics",result="ok"} 4"#));
}

#[tokio::test]
async fn test_rejected_endpoints_carry_verdicts() {
    let transport = FakeTransport::new();
    transport
        .on(&statistics_url(A), statistics_reply(10_000, Some(9_000)))
        .on(&statistics_url(B), statistics_reply(9_000, None));

    let error = client(&transport, &[A, B], true).await.err().unwrap();

    match error {
        NetworkError::NoHealthyEndpoint { failures, rejected, .. } => {
            assert!(failures.is_empty());
            assert_eq!(
                rejected,
                vec![
                    RejectedEndpoint::new(Endpoint::parse(A).unwrap(), HealthVerdict::DataPlaneBehind { lag: 1_000 }),
                    RejectedEndpoint::new(Endpoint::parse(B).unwrap(), HealthVerdict::BehindNetwork { lag: 1_000 }),
                ]
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_network_head_ignores_lagging_first_endpoint() {
    let transport = FakeTransport::new();
    transport
        .on(&statistics_url(A), statistics_reply(100, None))
        .on(&statistics_url(B), statistics_reply(50_000, None))
        .on(&segments_url(A), segments_reply(&[200, 300, 400]))
        .on(&segments_url(B), segments_reply(&[49_800, 49_900, 50_000]));

    let client = client(&transport, &[A, B], false).await.unwrap();

    assert_eq!(client.statistics().await.unwrap().block_height, 100);

    let head = client.network_head().await.unwrap();
    assert_eq!(head, 50_000);

    let segments = client.history_segments(head).await.unwrap();
    assert_eq!(
        segments.iter().filter_map(HistorySegment::end_height).max(),
        Some(50_000)
    );
    assert_eq!(transport.calls_to(&segments_url(A)), 1);
}

#[tokio::test]
async fn test_network_head_reuses_reference_of_restricted_client() {
    let transport = FakeTransport::new();
    transport
        .on(&statistics_url(A), statistics_reply(8_000, None))
        .on(&statistics_url(B), statistics_reply(8_100, None));

    let client = client(&transport, &[A, B], true).await.unwrap();
    let calls = transport.total_calls();

    assert_eq!(client.network_head().await.unwrap(), 8_100);
    assert_eq!(transport.total_calls(), calls);
}
