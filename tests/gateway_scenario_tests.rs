//! End-to-end behavior of the synthesis gateway with a stub provider.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Notify;

use fourier_gateway::core::credentials::{Credential, CredentialHolder, CredentialPolicy};
use fourier_gateway::core::gateway::{GatewayError, SynthesisGateway};
use fourier_gateway::core::rate_limit::{CallerKey, RateLimiter};
use fourier_gateway::core::tts::{ProviderResult, SpeechProvider, SynthesisRequest, Voice};

const FIXTURE: &str = include_str!("fixtures/service_account.json");

#[derive(Default)]
struct StubProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl SpeechProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn synthesize(
        &self,
        _request: &SynthesisRequest,
        _credential: &Credential,
    ) -> ProviderResult<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Let other in-flight calls interleave
        tokio::task::yield_now().await;
        Ok(Bytes::from_static(b"AUDIO"))
    }

    async fn list_voices(&self, _credential: &Credential) -> ProviderResult<Vec<Voice>> {
        Ok(Vec::new())
    }
}

/// Provider whose synthesis never completes once entered.
#[derive(Default)]
struct HangingProvider {
    entered: Notify,
}

#[async_trait]
impl SpeechProvider for HangingProvider {
    fn name(&self) -> &'static str {
        "hanging"
    }

    async fn synthesize(
        &self,
        _request: &SynthesisRequest,
        _credential: &Credential,
    ) -> ProviderResult<Bytes> {
        self.entered.notify_one();
        std::future::pending().await
    }

    async fn list_voices(&self, _credential: &Credential) -> ProviderResult<Vec<Voice>> {
        Ok(Vec::new())
    }
}

fn dev_holder() -> CredentialHolder {
    CredentialHolder::new(CredentialPolicy {
        allow_insecure_endpoints: true,
        ..Default::default()
    })
}

fn gateway(provider: Arc<StubProvider>, quota: u32, window: Duration) -> SynthesisGateway {
    SynthesisGateway::new(
        RateLimiter::new(quota, window),
        provider,
        5000,
        Duration::from_secs(30),
    )
}

#[tokio::test(start_paused = true)]
async fn test_quota_two_scenario() {
    let provider = Arc::new(StubProvider::default());
    let gateway = gateway(provider.clone(), 2, Duration::from_secs(60));
    let caller = CallerKey::from("session-1");
    let holder = dev_holder();
    let request = SynthesisRequest::new("hello");

    // Calls 1-2: no credential uploaded yet
    for _ in 0..2 {
        let err = gateway
            .synthesize(&caller, &holder, &request)
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::NoCredential);
    }
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);

    holder.set(FIXTURE.as_bytes()).unwrap();

    // Calls 3-4: audio passes through untouched
    for _ in 0..2 {
        let audio = gateway.synthesize(&caller, &holder, &request).await.unwrap();
        assert_eq!(audio, Bytes::from_static(b"AUDIO"));
    }

    // Call 5: quota spent
    match gateway.synthesize(&caller, &holder, &request).await {
        Err(GatewayError::RateLimited { retry_after }) => {
            assert!(retry_after <= Duration::from_secs(60));
            assert!(retry_after > Duration::from_secs(59));
        }
        other => panic!("expected rate limit, got {other:?}"),
    }
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_quota_three_then_reset_after_window() {
    let provider = Arc::new(StubProvider::default());
    let gateway = gateway(provider.clone(), 3, Duration::from_secs(60));
    let caller = CallerKey::from("session-1");
    let holder = dev_holder();
    holder.set(FIXTURE.as_bytes()).unwrap();
    let request = SynthesisRequest::new("hello");

    for _ in 0..3 {
        assert!(gateway.synthesize(&caller, &holder, &request).await.is_ok());
    }
    assert!(matches!(
        gateway.synthesize(&caller, &holder, &request).await,
        Err(GatewayError::RateLimited { .. })
    ));

    tokio::time::advance(Duration::from_secs(60)).await;
    assert!(gateway.synthesize(&caller, &holder, &request).await.is_ok());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_callers_have_separate_quotas() {
    let provider = Arc::new(StubProvider::default());
    let gateway = gateway(provider, 1, Duration::from_secs(60));
    let holder = dev_holder();
    holder.set(FIXTURE.as_bytes()).unwrap();
    let request = SynthesisRequest::new("hello");

    let alice = CallerKey::from("alice");
    let bob = CallerKey::from("bob");
    assert!(gateway.synthesize(&alice, &holder, &request).await.is_ok());
    assert!(gateway.synthesize(&alice, &holder, &request).await.is_err());
    assert!(gateway.synthesize(&bob, &holder, &request).await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_never_exceed_quota() {
    let provider = Arc::new(StubProvider::default());
    let gateway = Arc::new(gateway(provider.clone(), 5, Duration::from_secs(3600)));
    let holder = Arc::new(dev_holder());
    holder.set(FIXTURE.as_bytes()).unwrap();
    let caller = CallerKey::from("busy");

    let tasks: Vec<_> = (0..40)
        .map(|_| {
            let gateway = Arc::clone(&gateway);
            let holder = Arc::clone(&holder);
            let caller = caller.clone();
            tokio::spawn(async move {
                gateway
                    .synthesize(&caller, &holder, &SynthesisRequest::new("hello"))
                    .await
                    .is_ok()
            })
        })
        .collect();

    let mut allowed = 0;
    for task in tasks {
        if task.await.unwrap() {
            allowed += 1;
        }
    }
    assert_eq!(allowed, 5);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_dropped_synthesis_counts_once_and_keeps_credential() {
    let provider = Arc::new(HangingProvider::default());
    let gateway = Arc::new(SynthesisGateway::new(
        RateLimiter::new(3, Duration::from_secs(3600)),
        provider.clone(),
        5000,
        Duration::from_secs(30),
    ));
    let holder = Arc::new(dev_holder());
    holder.set(FIXTURE.as_bytes()).unwrap();
    let caller = CallerKey::from("impatient");

    let task = {
        let gateway = Arc::clone(&gateway);
        let holder = Arc::clone(&holder);
        let caller = caller.clone();
        tokio::spawn(async move {
            gateway
                .synthesize(&caller, &holder, &SynthesisRequest::new("hello"))
                .await
        })
    };
    provider.entered.notified().await;
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    assert_eq!(gateway.limiter().remaining(&caller), 2);
    assert!(holder.is_set());

    // The caller's window is still usable after the drop
    let followup = tokio::time::timeout(
        Duration::from_millis(50),
        gateway.synthesize(&caller, &holder, &SynthesisRequest::new("again")),
    )
    .await;
    assert!(followup.is_err(), "hanging provider should still be pending");
    assert_eq!(gateway.limiter().remaining(&caller), 1);
}

#[tokio::test]
async fn test_over_length_text_never_reaches_provider() {
    let provider = Arc::new(StubProvider::default());
    let gateway = gateway(provider.clone(), 10, Duration::from_secs(60));
    let holder = dev_holder();
    holder.set(FIXTURE.as_bytes()).unwrap();

    let err = gateway
        .synthesize(
            &CallerKey::from("s"),
            &holder,
            &SynthesisRequest::new("a".repeat(5001)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::InvalidInput(_)));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}
