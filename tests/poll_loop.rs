//! Tests for the wait loop: tick accounting, budget boundaries, terminal
//! classification, cancellation, and transport failure. Uses scripted probes
//! and a counting pacer so no real time passes.

use std::collections::VecDeque;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use easel::dispatch::MediaKind;
use easel::dispatch::generation::{
    GenerationDispatch, Pacer, PollStatus, StatusProbe, SubmittedJob, drive,
};
use easel::dispatch::registry::GenerationVendorType;
use easel::error::EaselError;

/// Replays a fixed sequence of observations, then reports in-progress forever.
struct ScriptedProbe {
    script: VecDeque<Result<PollStatus, EaselError>>,
    fetches: u64,
}

impl ScriptedProbe {
    fn new(script: Vec<Result<PollStatus, EaselError>>) -> Self {
        Self {
            script: script.into(),
            fetches: 0,
        }
    }
}

impl StatusProbe for ScriptedProbe {
    async fn fetch(&mut self) -> Result<PollStatus, EaselError> {
        self.fetches += 1;
        self.script
            .pop_front()
            .unwrap_or(Ok(PollStatus::InProgress))
    }
}

/// Counts pauses instead of sleeping.
struct CountingPacer {
    pauses: u64,
}

impl Pacer for CountingPacer {
    async fn pause(&mut self) {
        self.pauses += 1;
    }
}

/// Cancels a token after a given number of pauses.
struct CancellingPacer {
    token: CancellationToken,
    cancel_after: u64,
    pauses: u64,
}

impl Pacer for CancellingPacer {
    async fn pause(&mut self) {
        self.pauses += 1;
        if self.pauses == self.cancel_after {
            self.token.cancel();
        }
    }
}

fn image_job() -> SubmittedJob {
    SubmittedJob {
        id: "gen_abc123".to_string(),
        kind: MediaKind::Image,
        model: "photon-1".to_string(),
        provider: "luma".to_string(),
    }
}

fn video_job() -> SubmittedJob {
    SubmittedJob {
        id: "gen_vid456".to_string(),
        kind: MediaKind::Video,
        model: "ray-2".to_string(),
        provider: "luma".to_string(),
    }
}

fn completed(url: &str) -> Result<PollStatus, EaselError> {
    Ok(PollStatus::Completed {
        url: Some(url.to_string()),
    })
}

const IMAGE_BUDGET: Duration = Duration::from_secs(300);

// ---------------------------------------------------------------------------
// Success paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn completed_on_first_tick_returns_without_pausing() {
    let mut probe = ScriptedProbe::new(vec![completed("https://cdn.example/img.jpg")]);
    let mut pacer = CountingPacer { pauses: 0 };

    let url = drive(&mut probe, &mut pacer, &image_job(), IMAGE_BUDGET, None)
        .await
        .unwrap();

    assert_eq!(url, "https://cdn.example/img.jpg");
    assert_eq!(probe.fetches, 1);
    assert_eq!(pacer.pauses, 0);
}

#[tokio::test]
async fn completes_exactly_at_the_budget_boundary() {
    // 299 in-progress observations, completion on the 300th and final fetch.
    let mut script: Vec<Result<PollStatus, EaselError>> =
        std::iter::repeat_with(|| Ok(PollStatus::InProgress))
            .take(299)
            .collect();
    script.push(completed("https://cdn.example/img.jpg"));

    let mut probe = ScriptedProbe::new(script);
    let mut pacer = CountingPacer { pauses: 0 };

    let url = drive(&mut probe, &mut pacer, &image_job(), IMAGE_BUDGET, None)
        .await
        .unwrap();

    assert_eq!(url, "https://cdn.example/img.jpg");
    assert_eq!(probe.fetches, 300);
    assert_eq!(pacer.pauses, 299);
}

// ---------------------------------------------------------------------------
// Terminal failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn times_out_when_budget_is_exhausted() {
    // Empty script: the probe reports in-progress forever.
    let mut probe = ScriptedProbe::new(vec![]);
    let mut pacer = CountingPacer { pauses: 0 };

    let err = drive(&mut probe, &mut pacer, &image_job(), IMAGE_BUDGET, None)
        .await
        .unwrap_err();

    match err {
        EaselError::Timeout { budget_secs } => assert_eq!(budget_secs, 300),
        other => panic!("expected Timeout, got {other:?}"),
    }
    // Exactly one fetch per budget second, no pause after the last one.
    assert_eq!(probe.fetches, 300);
    assert_eq!(pacer.pauses, 299);
}

#[tokio::test]
async fn vendor_failure_reason_is_preserved() {
    let mut probe = ScriptedProbe::new(vec![
        Ok(PollStatus::InProgress),
        Ok(PollStatus::Failed("nsfw_content".to_string())),
    ]);
    let mut pacer = CountingPacer { pauses: 0 };

    let err = drive(&mut probe, &mut pacer, &image_job(), IMAGE_BUDGET, None)
        .await
        .unwrap_err();

    match err {
        EaselError::GenerationFailed { provider, reason } => {
            assert_eq!(provider, "luma");
            assert_eq!(reason, "nsfw_content");
        }
        other => panic!("expected GenerationFailed, got {other:?}"),
    }
    assert_eq!(probe.fetches, 2);
}

#[tokio::test]
async fn completed_without_asset_is_a_hard_failure() {
    let mut probe = ScriptedProbe::new(vec![Ok(PollStatus::Completed { url: None })]);
    let mut pacer = CountingPacer { pauses: 0 };

    let err = drive(
        &mut probe,
        &mut pacer,
        &video_job(),
        Duration::from_secs(1800),
        None,
    )
    .await
    .unwrap_err();

    match err {
        EaselError::MissingAsset { provider, kind } => {
            assert_eq!(provider, "luma");
            assert_eq!(kind, MediaKind::Video);
        }
        other => panic!("expected MissingAsset, got {other:?}"),
    }
}

#[tokio::test]
async fn transport_error_stops_the_wait_immediately() {
    let mut probe = ScriptedProbe::new(vec![
        Ok(PollStatus::InProgress),
        Err(EaselError::Upstream {
            provider: "luma".to_string(),
            message: "connection reset".to_string(),
            status: None,
        }),
        completed("https://cdn.example/never-reached.jpg"),
    ]);
    let mut pacer = CountingPacer { pauses: 0 };

    let err = drive(&mut probe, &mut pacer, &image_job(), IMAGE_BUDGET, None)
        .await
        .unwrap_err();

    assert!(matches!(err, EaselError::Upstream { .. }));
    // The wait ends on the failed fetch; the later completion is never seen.
    assert_eq!(probe.fetches, 2);
    assert_eq!(pacer.pauses, 1);
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pre_cancelled_token_exits_before_any_fetch() {
    let token = CancellationToken::new();
    token.cancel();

    let mut probe = ScriptedProbe::new(vec![completed("https://cdn.example/img.jpg")]);
    let mut pacer = CountingPacer { pauses: 0 };

    let err = drive(
        &mut probe,
        &mut pacer,
        &image_job(),
        IMAGE_BUDGET,
        Some(&token),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, EaselError::Cancelled(0)));
    assert_eq!(probe.fetches, 0);
}

#[tokio::test]
async fn cancellation_is_observed_on_the_next_tick() {
    let token = CancellationToken::new();
    let mut probe = ScriptedProbe::new(vec![]);
    let mut pacer = CancellingPacer {
        token: token.clone(),
        cancel_after: 2,
        pauses: 0,
    };

    let err = drive(
        &mut probe,
        &mut pacer,
        &image_job(),
        IMAGE_BUDGET,
        Some(&token),
    )
    .await
    .unwrap_err();

    // Two fetches happen before the cancel lands; the third tick's check
    // exits the loop without another vendor call.
    assert!(matches!(err, EaselError::Cancelled(2)));
    assert_eq!(probe.fetches, 2);
    assert_eq!(pacer.pauses, 2);
}

// ---------------------------------------------------------------------------
// Submit validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_rejects_empty_prompt_before_any_vendor_call() {
    let dispatch = GenerationDispatch::new();
    let req = easel::dispatch::GenerationRequest {
        prompt: "   ".to_string(),
        kind: MediaKind::Image,
        aspect_ratio: None,
        model: "photon-1".to_string(),
        cancellation_token: None,
    };

    // No vendor is reachable in tests; an InvalidRequest here proves the
    // prompt check fires before any network I/O is attempted.
    let err = dispatch
        .submit(&req, "luma", &GenerationVendorType::DreamMachine, "key")
        .await
        .unwrap_err();

    assert!(matches!(err, EaselError::InvalidRequest(_)));
}
