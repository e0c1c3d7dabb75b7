//! Purge lifecycle: submit a batch, optionally poll until the CDN finishes

use std::future::Future;
use std::io::{self, BufRead};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::api::types::{BearerToken, PurgeFlags, PurgeRequest};
use crate::api::{ApiError, StrikeTrackerClient};

/// Delay between purge status checks
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum PurgeError {
    #[error("No URLs to purge")]
    EmptyBatch,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Terminal state of a purge run
#[derive(Debug, Clone, PartialEq)]
pub enum PurgeOutcome {
    /// Batch accepted, completion not awaited
    Submitted { job_id: String },
    /// Batch accepted and progress reached 1.0
    Completed { job_id: String, polls: u64 },
}

/// Build a batch from one URL per line; blank lines are skipped
pub fn read_requests<R: BufRead>(input: R, flags: PurgeFlags) -> io::Result<Vec<PurgeRequest>> {
    let mut requests = Vec::new();
    for line in input.lines() {
        let line = line?;
        let url = line.trim();
        if url.is_empty() {
            continue;
        }
        requests.push(PurgeRequest::new(url, flags));
    }
    Ok(requests)
}

/// Call `fetch` until it reports progress of 1.0, sleeping `interval`
/// between attempts. Returns the number of attempts made.
///
/// There is no attempt limit and no timeout; the first failed fetch ends
/// the loop with that error.
pub async fn poll_until_complete<F, Fut, E>(
    mut fetch: F,
    interval: Duration,
    mut on_poll: impl FnMut(f64),
) -> Result<u64, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<f64, E>>,
{
    let mut polls = 0;
    loop {
        let progress = fetch().await?;
        polls += 1;
        on_poll(progress);
        debug!("Purge progress {:.2} after {} polls", progress, polls);

        if progress >= 1.0 {
            return Ok(polls);
        }
        tokio::time::sleep(interval).await;
    }
}

/// Submits purge batches for one account
pub struct PurgeWorkflow<'a> {
    client: &'a StrikeTrackerClient,
    token: &'a BearerToken,
    account: &'a str,
    interval: Duration,
}

impl<'a> PurgeWorkflow<'a> {
    pub fn new(client: &'a StrikeTrackerClient, token: &'a BearerToken, account: &'a str) -> Self {
        Self {
            client,
            token,
            account,
            interval: POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Submit `requests`; when `poll` is set, wait for completion,
    /// calling `on_poll` once per status check.
    pub async fn run(
        &self,
        requests: &[PurgeRequest],
        poll: bool,
        on_poll: impl FnMut(f64),
    ) -> Result<PurgeOutcome, PurgeError> {
        if requests.is_empty() {
            return Err(PurgeError::EmptyBatch);
        }

        let job_id = self
            .client
            .submit_purge(self.token, self.account, requests)
            .await?;
        info!("Submitted purge job {} with {} urls", job_id, requests.len());

        if !poll {
            return Ok(PurgeOutcome::Submitted { job_id });
        }

        let polls = poll_until_complete(
            || self.client.fetch_purge_status(self.token, self.account, &job_id),
            self.interval,
            on_poll,
        )
        .await?;
        info!("Purge job {} complete", job_id);

        Ok(PurgeOutcome::Completed { job_id, polls })
    }
}
