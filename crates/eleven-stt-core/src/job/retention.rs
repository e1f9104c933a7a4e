use crate::errors::{Result, SttError};
use crate::job::transcript_path;
use crate::transport::{RequestSpec, Transport};

/// Delete the stored transcript. A 404 means it is already gone and counts
/// as success, so releasing twice is harmless.
pub async fn release(transport: &Transport, job_id: &str) -> Result<()> {
    match transport.execute(&RequestSpec::delete(transcript_path(job_id))).await {
        Ok(_) => {
            tracing::debug!(%job_id, "Deleted remote transcript");
            Ok(())
        }
        Err(SttError::Transport(e)) if e.status() == Some(404) => {
            tracing::debug!(%job_id, "Remote transcript already gone");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
