use super::*;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::retry::testing::RecordingSleeper;

#[derive(Debug)]
struct ScriptedBackend {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    calls: Mutex<u32>,
}

impl ScriptedBackend {
    fn new(script: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> u32 {
        *self.calls.lock().expect("lock")
    }
}

impl GenerationBackend for ScriptedBackend {
    fn complete(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        *self.calls.lock().expect("lock") += 1;
        self.script
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::new(GenerationErrorKind::Timeout, "script exhausted")))
    }
}

fn failure(kind: GenerationErrorKind) -> Result<String, GenerationError> {
    Err(GenerationError::new(kind, "scripted failure"))
}

fn generator(backend: &Arc<ScriptedBackend>, sleeper: &Arc<RecordingSleeper>) -> ResilientGenerator {
    ResilientGenerator::new(backend.clone()).with_sleeper(sleeper.clone())
}

#[test]
fn two_failures_then_success() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        failure(GenerationErrorKind::Timeout),
        failure(GenerationErrorKind::ConnectionFailed),
        Ok("done".to_string()),
    ]));
    let sleeper = Arc::new(RecordingSleeper::default());

    let text = generator(&backend, &sleeper)
        .generate("prompt", 100, 0.3)
        .expect("third attempt succeeds");

    assert_eq!(text, "done");
    assert_eq!(backend.calls(), 3);
    assert_eq!(
        sleeper.recorded(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
}

#[test]
fn permanent_failure_stops_after_three_attempts() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        failure(GenerationErrorKind::BackendRejected),
        failure(GenerationErrorKind::StreamInterrupted),
        failure(GenerationErrorKind::Timeout),
        Ok("never reached".to_string()),
    ]));
    let sleeper = Arc::new(RecordingSleeper::default());

    let err = generator(&backend, &sleeper)
        .generate("prompt", 100, 0.3)
        .expect_err("all attempts fail");

    assert_eq!(err.kind, GenerationErrorKind::Timeout);
    assert_eq!(err.attempts, 3);
    assert_eq!(backend.calls(), 3);
    assert_eq!(sleeper.recorded().len(), 2);
}

#[test]
fn unconfigured_is_not_retried() {
    let backend = Arc::new(ScriptedBackend::new(vec![failure(
        GenerationErrorKind::Unconfigured,
    )]));
    let sleeper = Arc::new(RecordingSleeper::default());

    let err = generator(&backend, &sleeper)
        .generate("prompt", 100, 0.3)
        .expect_err("unconfigured");

    assert_eq!(err.kind, GenerationErrorKind::Unconfigured);
    assert_eq!(err.attempts, 1);
    assert_eq!(backend.calls(), 1);
    assert!(sleeper.recorded().is_empty());
}

#[test]
fn custom_policy_limits_attempts() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        failure(GenerationErrorKind::Timeout),
        Ok("unused".to_string()),
    ]));
    let sleeper = Arc::new(RecordingSleeper::default());

    let err = generator(&backend, &sleeper)
        .with_policy(BackoffPolicy {
            max_attempts: 1,
            ..BackoffPolicy::default()
        })
        .generate("prompt", 100, 0.3)
        .expect_err("single attempt");

    assert_eq!(err.attempts, 1);
    assert!(sleeper.recorded().is_empty());
}

#[test]
fn summary_budget_tiers() {
    assert_eq!(summary_token_budget(10), 220);
    assert_eq!(summary_token_budget(200), 600);
    assert_eq!(summary_token_budget(300), 1050);
    assert_eq!(summary_token_budget(400), 1300);
    assert_eq!(summary_token_budget(500), 2000);
}

#[test]
fn error_display_names_kind_and_attempts() {
    let err = GenerationError::new(GenerationErrorKind::BackendRejected, "HTTP 500");
    let rendered = err.to_string();
    assert!(rendered.contains("backend rejected"));
    assert!(rendered.contains("1 attempt"));
    assert!(rendered.contains("HTTP 500"));
}
