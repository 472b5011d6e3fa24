use std::fmt;
use std::time::Duration;

/// What one fetch attempt observed, after the response body (if any)
/// has been validated as an image by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSignal {
    /// 200 with a body that decoded into a usable image.
    Ready,
    /// 404: the backend has not produced the artifact yet.
    NotReady,
    /// 200 with an empty body.
    EmptyBody,
    /// 200 with a body that failed to decode (truncated mid-write).
    CorruptBody,
    /// No response at all: connection refused, DNS failure, timeout.
    Unreachable,
    /// Any status code other than 200/404.
    UnexpectedStatus(u16),
}

/// Why a job was moved to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    AttemptsExhausted,
    BackendUnreachable,
    UnexpectedStatus(u16),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttemptsExhausted => write!(f, "maximum fetch attempts exceeded"),
            Self::BackendUnreachable => write!(f, "backend unreachable"),
            Self::UnexpectedStatus(code) => write!(f, "unexpected HTTP status {code}"),
        }
    }
}

/// What the polling cycle does next. The engine executes the decision;
/// this type never touches a clock itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    Complete,
    RetryAfter(Duration),
    Fail(FailureReason),
}

/// Retry bounds and delays for one polling cycle.
///
/// The not-ready and recheck delays are intentionally distinct: a 404
/// means the backend is still sampling and a longer wait is cheap, while
/// an empty or truncated body usually means the file is mid-write and
/// will be whole almost immediately.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub not_ready_delay: Duration,
    pub recheck_delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            not_ready_delay: Duration::from_secs(2),
            recheck_delay: Duration::from_secs(1),
        }
    }
}

impl PollPolicy {
    /// Gate for the next attempt, checked before the attempt counter is
    /// bumped. Once `attempt_count` reaches the bound, no further fetch
    /// is made and the job must fail.
    pub fn attempt_allowed(&self, attempt_count: u32) -> bool {
        attempt_count < self.max_attempts
    }

    /// Map an observed fetch signal to the next move.
    pub fn decide(&self, signal: FetchSignal) -> PollDecision {
        match signal {
            FetchSignal::Ready => PollDecision::Complete,
            FetchSignal::NotReady => PollDecision::RetryAfter(self.not_ready_delay),
            FetchSignal::EmptyBody | FetchSignal::CorruptBody => {
                PollDecision::RetryAfter(self.recheck_delay)
            }
            FetchSignal::Unreachable => PollDecision::Fail(FailureReason::BackendUnreachable),
            FetchSignal::UnexpectedStatus(code) => {
                PollDecision::Fail(FailureReason::UnexpectedStatus(code))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_table() {
        let policy = PollPolicy::default();
        assert_eq!(policy.decide(FetchSignal::Ready), PollDecision::Complete);
        assert_eq!(
            policy.decide(FetchSignal::NotReady),
            PollDecision::RetryAfter(Duration::from_secs(2))
        );
        assert_eq!(
            policy.decide(FetchSignal::EmptyBody),
            PollDecision::RetryAfter(Duration::from_secs(1))
        );
        assert_eq!(
            policy.decide(FetchSignal::CorruptBody),
            PollDecision::RetryAfter(Duration::from_secs(1))
        );
        assert_eq!(
            policy.decide(FetchSignal::Unreachable),
            PollDecision::Fail(FailureReason::BackendUnreachable)
        );
        assert_eq!(
            policy.decide(FetchSignal::UnexpectedStatus(500)),
            PollDecision::Fail(FailureReason::UnexpectedStatus(500))
        );
    }

    #[test]
    fn attempts_stop_at_the_bound() {
        let policy = PollPolicy {
            max_attempts: 3,
            ..PollPolicy::default()
        };
        assert!(policy.attempt_allowed(0));
        assert!(policy.attempt_allowed(2));
        assert!(!policy.attempt_allowed(3));
        assert!(!policy.attempt_allowed(4));
    }

    #[test]
    fn not_ready_waits_longer_than_recheck() {
        let policy = PollPolicy::default();
        assert!(policy.not_ready_delay > policy.recheck_delay);
    }
}
