//! Ordered response-recovery policies.
//!
//! DESIGN
//! ======
//! A failed response is offered to each policy in list order. The first
//! policy that rejects or resubmits decides the outcome; if all pass, the
//! client logs diagnostic context and surfaces the failure as-is. The default
//! order puts the terminal plan-limit statuses ahead of the auth refresh.

use std::fmt;

use super::request::ApiRequest;
use crate::error::ApiError;

pub const DEFAULT_QUOTA_MESSAGE: &str = "Subscription limit reached. Please upgrade your plan.";
pub const DEFAULT_PAYLOAD_MESSAGE: &str = "File size exceeds your plan limit. Please upgrade or use a smaller file.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponsePolicy {
    /// 402: reject with the backend's quota message.
    QuotaExceeded,
    /// 413: reject with the backend's size-limit message.
    PayloadTooLarge,
    /// 401 on a first attempt: refresh the token pair once and resubmit.
    RefreshOnce,
}

pub const DEFAULT_RESPONSE_POLICIES: [ResponsePolicy; 3] =
    [ResponsePolicy::QuotaExceeded, ResponsePolicy::PayloadTooLarge, ResponsePolicy::RefreshOnce];

impl ResponsePolicy {
    /// Status this policy reacts to.
    #[must_use]
    pub fn status(self) -> u16 {
        match self {
            Self::QuotaExceeded => 402,
            Self::PayloadTooLarge => 413,
            Self::RefreshOnce => 401,
        }
    }
}

/// How many times a request has been submitted before this one.
///
/// Threaded by value through the resubmission loop; a resubmitted request
/// carries `FIRST.next()`, which no policy will resubmit again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Attempt(u8);

impl Attempt {
    pub const FIRST: Self = Self(0);

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    #[must_use]
    pub fn is_retry(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of offering a failure to one policy.
#[derive(Debug)]
pub(crate) enum Verdict {
    /// Not this policy's concern; try the next one.
    Pass,
    Reject(ApiError),
    Resubmit(ApiRequest),
}

#[cfg(test)]
#[path = "policy_test.rs"]
mod tests;
