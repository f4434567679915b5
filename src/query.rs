//! Single-query state machine
//!
//! Drives one plate check end to end: normalize, acquire a session, submit,
//! classify, retrying transient failures with a bounded backoff. Every
//! failure is converted into a terminal [`QueryOutcome`] here; nothing
//! escapes to the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, warn};

use crate::classify::Classifier;
use crate::session::{PlateSession, SessionProvider};
use crate::types::{PlateQuery, PlateStatus, QueryOutcome};

/// Retry policy for transient session failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per plate, including the first
    pub max_retries: u32,
    /// Fixed delay between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Run one plate check to its terminal outcome.
///
/// A fresh session is acquired per attempt and released on every return
/// path. `interrupt` is checked before each attempt and inside the backoff
/// wait; an interrupted query returns an error outcome, which callers
/// discard before exiting.
pub fn run_query<P: SessionProvider>(
    provider: &P,
    raw_plate: &str,
    policy: &RetryPolicy,
    classifier: &Classifier,
    interrupt: &AtomicBool,
) -> QueryOutcome {
    let mut query = match PlateQuery::new(raw_plate) {
        Ok(query) => query,
        // Malformed input will not become valid on retry
        Err(e) => {
            return QueryOutcome::new(raw_plate.trim(), PlateStatus::Error, e.to_string());
        }
    };

    loop {
        query.attempt_count += 1;

        if interrupt.load(Ordering::Relaxed) {
            return QueryOutcome::new(
                query.normalized_plate,
                PlateStatus::Error,
                "interrupted",
            );
        }

        debug!(
            "plate {}: attempt {}/{}",
            query.normalized_plate, query.attempt_count, policy.max_retries
        );

        let mut session = match provider.open() {
            Ok(session) => session,
            // The environment cannot run sessions; retrying cannot help
            Err(e) => {
                return QueryOutcome::new(
                    query.normalized_plate,
                    PlateStatus::Error,
                    format!("session launch failed: {}", e),
                );
            }
        };

        match session.submit(&query.normalized_plate) {
            Ok(raw_response) => {
                session.close();
                let (status, message) = classifier.classify(&raw_response);
                return QueryOutcome::new(query.normalized_plate, status, message);
            }
            Err(e) => {
                session.close();
                if e.is_transient() && query.attempt_count < policy.max_retries {
                    warn!(
                        "plate {}: {} (attempt {}/{}), retrying in {:?}",
                        query.normalized_plate,
                        e,
                        query.attempt_count,
                        policy.max_retries,
                        policy.backoff
                    );
                    if !sleep_interruptible(policy.backoff, interrupt) {
                        return QueryOutcome::new(
                            query.normalized_plate,
                            PlateStatus::Error,
                            "interrupted",
                        );
                    }
                    continue;
                }
                return QueryOutcome::new(query.normalized_plate, PlateStatus::Error, e.to_string());
            }
        }
    }
}

/// Sleep in small slices so an interrupt takes effect within ~100ms.
/// Returns false if the wait was cut short by the interrupt flag.
pub(crate) fn sleep_interruptible(total: Duration, interrupt: &AtomicBool) -> bool {
    const SLICE: Duration = Duration::from_millis(100);
    let mut remaining = total;
    while !remaining.is_zero() {
        if interrupt.load(Ordering::Relaxed) {
            return false;
        }
        let step = remaining.min(SLICE);
        std::thread::sleep(step);
        remaining -= step;
    }
    !interrupt.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{PlateSession, SessionError, SessionProvider};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Scripted provider: each open() hands out the next submit result and
    /// counts sessions opened.
    struct ScriptedProvider {
        script: RefCell<VecDeque<Result<String, SessionError>>>,
        opens: RefCell<u32>,
        launch_error: bool,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<String, SessionError>>) -> Self {
            Self {
                script: RefCell::new(script.into()),
                opens: RefCell::new(0),
                launch_error: false,
            }
        }

        fn failing_launch() -> Self {
            Self {
                script: RefCell::new(VecDeque::new()),
                opens: RefCell::new(0),
                launch_error: true,
            }
        }

        fn opens(&self) -> u32 {
            *self.opens.borrow()
        }
    }

    struct ScriptedSession {
        result: Option<Result<String, SessionError>>,
    }

    impl PlateSession for ScriptedSession {
        fn submit(&mut self, _plate: &str) -> Result<String, SessionError> {
            self.result
                .take()
                .unwrap_or(Err(SessionError::Protocol("script exhausted".into())))
        }

        fn close(&mut self) {}
    }

    impl SessionProvider for ScriptedProvider {
        type Session = ScriptedSession;

        fn open(&self) -> Result<ScriptedSession, SessionError> {
            *self.opens.borrow_mut() += 1;
            if self.launch_error {
                return Err(SessionError::Launch("no compatible browser runtime".into()));
            }
            Ok(ScriptedSession {
                result: self.script.borrow_mut().pop_front(),
            })
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff: Duration::ZERO,
        }
    }

    fn no_interrupt() -> AtomicBool {
        AtomicBool::new(false)
    }

    #[test]
    fn successful_check_classifies_response() {
        let provider = ScriptedProvider::new(vec![Ok(
            "Congratulations! EZYPLTE is available.".to_string()
        )]);
        let outcome = run_query(
            &provider,
            "ezy plte",
            &fast_policy(3),
            &Classifier::default(),
            &no_interrupt(),
        );
        assert_eq!(outcome.plate, "EZYPLTE");
        assert_eq!(outcome.status, PlateStatus::Available);
        assert_eq!(outcome.message, "Congratulations! EZYPLTE is available.");
        assert_eq!(provider.opens(), 1);
    }

    #[test]
    fn timeout_on_every_attempt_fails_after_exactly_max_retries() {
        let provider = ScriptedProvider::new(vec![
            Err(SessionError::Timeout("result".into())),
            Err(SessionError::Timeout("result".into())),
            Err(SessionError::Timeout("result".into())),
            Err(SessionError::Timeout("result".into())),
        ]);
        let outcome = run_query(
            &provider,
            "ABC123",
            &fast_policy(3),
            &Classifier::default(),
            &no_interrupt(),
        );
        assert_eq!(outcome.status, PlateStatus::Error);
        assert!(outcome.message.contains("timed out"));
        // exactly three sessions, never a fourth
        assert_eq!(provider.opens(), 3);
    }

    #[test]
    fn transient_failure_then_success_retries() {
        let provider = ScriptedProvider::new(vec![
            Err(SessionError::ElementNotFound("plate input".into())),
            Ok("Sorry, this plate is NOT available.".to_string()),
        ]);
        let outcome = run_query(
            &provider,
            "ABC123",
            &fast_policy(3),
            &Classifier::default(),
            &no_interrupt(),
        );
        assert_eq!(outcome.status, PlateStatus::Unavailable);
        assert_eq!(provider.opens(), 2);
    }

    #[test]
    fn launch_failure_is_not_retried() {
        let provider = ScriptedProvider::failing_launch();
        let outcome = run_query(
            &provider,
            "ABC123",
            &fast_policy(3),
            &Classifier::default(),
            &no_interrupt(),
        );
        assert_eq!(outcome.status, PlateStatus::Error);
        assert!(outcome.message.contains("session launch failed"));
        assert_eq!(provider.opens(), 1);
    }

    #[test]
    fn protocol_failure_is_not_retried() {
        let provider = ScriptedProvider::new(vec![Err(SessionError::Protocol(
            "connection reset".into(),
        ))]);
        let outcome = run_query(
            &provider,
            "ABC123",
            &fast_policy(3),
            &Classifier::default(),
            &no_interrupt(),
        );
        assert_eq!(outcome.status, PlateStatus::Error);
        assert_eq!(provider.opens(), 1);
    }

    #[test]
    fn invalid_plate_never_opens_a_session() {
        let provider = ScriptedProvider::new(vec![]);
        let outcome = run_query(
            &provider,
            "AB-12!",
            &fast_policy(3),
            &Classifier::default(),
            &no_interrupt(),
        );
        assert_eq!(outcome.status, PlateStatus::Error);
        assert!(outcome.message.contains("Invalid plate"));
        assert_eq!(provider.opens(), 0);
    }

    #[test]
    fn unknown_response_preserves_raw_text() {
        let provider = ScriptedProvider::new(vec![Ok("Unexpected maintenance page".to_string())]);
        let outcome = run_query(
            &provider,
            "ABC123",
            &fast_policy(3),
            &Classifier::default(),
            &no_interrupt(),
        );
        assert_eq!(outcome.status, PlateStatus::Unknown);
        assert_eq!(outcome.message, "Unexpected maintenance page");
    }

    #[test]
    fn interrupt_cuts_backoff_short() {
        let interrupt = AtomicBool::new(true);
        assert!(!sleep_interruptible(Duration::from_secs(60), &interrupt));

        let clear = AtomicBool::new(false);
        assert!(sleep_interruptible(Duration::from_millis(1), &clear));
    }
}
