use std::ops::ControlFlow;

use super::errors::ValidationError;

/// Why the validator suspended the current query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YieldReason {
    /// Records are unsigned here, the parent's DS must be fetched
    FetchDs,
    /// The zone cut moved or its keys no longer fit, fetch DNSKEY again
    RefetchKeys,
    /// Key material was adjusted in place, validate the same answer again
    Revalidate,
    /// The planner must rediscover the zone cut
    AwaitCut,
}

/// Result of one validation step.
///
/// Sub-steps return `Continue` to let the pipeline proceed; the
/// orchestrator itself never returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome {
    /// Nothing for the validator to do, previous state stands
    PassThrough,
    Continue,
    Yield(YieldReason),
    Fail(ValidationError),
    Done,
}

impl Outcome {
    /// Lift into `ControlFlow` so steps compose with `?`
    pub fn flow(self) -> ControlFlow<Outcome> {
        match self {
            Outcome::Continue => ControlFlow::Continue(()),
            other => ControlFlow::Break(other),
        }
    }
}

impl From<ValidationError> for Outcome {
    fn from(err: ValidationError) -> Self {
        Outcome::Fail(err)
    }
}
