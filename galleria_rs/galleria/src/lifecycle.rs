//! Request lifecycle for plot submissions.
//!
//! Every submit takes a fresh token. Only the most recently issued token is
//! current; a response that arrives for an older one is dropped so a slow
//! request can never overwrite the chart of a newer one.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestTracker {
    issued: u64,
    in_flight: Option<RequestToken>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token for a new submit. Returns the token it supersedes, if any,
    /// so the caller can abort the underlying transport.
    pub fn begin(&mut self) -> (RequestToken, Option<RequestToken>) {
        self.issued += 1;
        let token = RequestToken(self.issued);
        let superseded = self.in_flight.replace(token);
        (token, superseded)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.in_flight == Some(token)
    }

    /// Close out `token`. Returns false when the token is stale or already done.
    pub fn finish(&mut self, token: RequestToken) -> bool {
        if self.is_current(token) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    /// Forget the in-flight request, if any.
    pub fn cancel(&mut self) -> Option<RequestToken> {
        self.in_flight.take()
    }

    pub fn in_flight(&self) -> Option<RequestToken> {
        self.in_flight
    }
}

/// State of the status line as far as requests are concerned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlotStatus {
    Idle,
    Pending(RequestToken),
    Ready,
    Failed(String),
}

impl Default for PlotStatus {
    fn default() -> Self {
        PlotStatus::Idle
    }
}

impl PlotStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, PlotStatus::Pending(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PlotStatus::Failed(msg) => Some(msg.as_str()),
            _ => None,
        }
    }
}
