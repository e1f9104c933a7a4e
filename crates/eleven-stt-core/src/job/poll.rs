use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::errors::{Result, SttError};
use crate::job::{transcript_path, Job, JobStatus};
use crate::transport::{RequestSpec, Transport};

/// Query the job until it completes or fails, at most `max_attempts` times.
///
/// Queries are strictly sequential. Each one goes through the transport, so a
/// transient error inside an attempt is retried there and does not use up a
/// poll attempt. No sleep follows the final query.
pub async fn poll(
    transport: &Transport,
    job_id: &str,
    interval: Duration,
    max_attempts: u32,
) -> Result<Job> {
    let spec = RequestSpec::get(transcript_path(job_id));
    let spec = &spec;
    poll_with(job_id, interval, max_attempts, move || transport.execute_json(spec)).await
}

async fn poll_with<F, Fut>(
    job_id: &str,
    interval: Duration,
    max_attempts: u32,
    mut fetch: F,
) -> Result<Job>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    for attempt in 1..=max_attempts {
        let job = Job::from_payload(job_id, fetch().await?);
        tracing::debug!(%job_id, attempt, max_attempts, status = %job.status, "Polled job");

        match job.status {
            JobStatus::Completed => {
                tracing::info!(%job_id, attempts = attempt, "Transcription completed");
                return Ok(job);
            }
            JobStatus::Failed => {
                let reason = job.failure_reason().unwrap_or_default();
                tracing::warn!(%job_id, %reason, "Transcription failed");
                return Err(SttError::JobFailed(reason));
            }
            JobStatus::Pending if attempt < max_attempts => tokio::time::sleep(interval).await,
            JobStatus::Pending => {}
        }
    }

    Err(SttError::JobTimeout {
        attempts: max_attempts,
    })
}
