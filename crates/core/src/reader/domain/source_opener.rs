use std::path::Path;

use crate::reader::domain::cancellation::CancellationSignal;
use crate::reader::domain::reader_error::ReaderError;
use crate::reader::domain::retry_policy::RetryPolicy;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_source::VideoSource;

/// Opens `path` on `source`, polling until it becomes readable.
///
/// Missing and not-ready failures are retried under `policy`, waiting through
/// `cancellation` between attempts. Other backend failures are returned at
/// once. When the policy runs out the error is `SourceUnavailable`.
pub fn open_with_retry(
    source: &mut dyn VideoSource,
    path: &Path,
    policy: &RetryPolicy,
    cancellation: &mut dyn CancellationSignal,
) -> Result<VideoMetadata, ReaderError> {
    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        let err = match source.open(path) {
            Ok(metadata) => {
                if attempt > 1 {
                    log::info!("Opened {} after {attempt} attempts", path.display());
                }
                return Ok(metadata);
            }
            Err(e) if e.is_retryable() => e,
            Err(e) => return Err(e.into()),
        };

        if !policy.allows(attempt + 1) {
            log::error!("Giving up on {}: {err}", path.display());
            return Err(ReaderError::SourceUnavailable {
                path: path.to_path_buf(),
                attempts: attempt,
            });
        }

        let delay = policy.delay_for(attempt);
        log::warn!("Waiting for {} ({err}); retry {attempt} in {delay:?}", path.display());
        if cancellation.wait(delay) {
            return Err(ReaderError::Cancelled);
        }
    }
}
