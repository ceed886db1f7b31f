use log::{debug, info};
use std::path::Path;

use crate::error::{Error, Result};
use crate::session::{SearchSession, PAYLOAD_TOO_LARGE};

/// Upload a local image and return the address of its results page.
///
/// `Ok(None)` means the endpoint refused the file as too large, which counts
/// as "no matches". A reply without a redirect for any other reason is a
/// protocol violation, and a connectivity failure propagates unchanged; both
/// end the run.
pub fn submit<S: SearchSession + ?Sized>(
    session: &S,
    endpoint: &str,
    image: &Path,
) -> Result<Option<String>> {
    debug!("Uploading {} to {}", image.display(), endpoint);
    let reply = session.upload(endpoint, image)?;

    match reply.location {
        Some(location) => Ok(Some(location)),
        None if reply.status == PAYLOAD_TOO_LARGE => {
            info!("Upload rejected as too large: {}", image.display());
            Ok(None)
        }
        None => Err(Error::Protocol(format!(
            "upload of {} answered {} without a redirect",
            image.display(),
            reply.status
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySession, UploadReply, UploadScript};
    use tempfile::tempdir;

    const ENDPOINT: &str = "http://www.google.com/searchbyimage/upload";

    fn image() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("img.png");
        std::fs::write(&path, b"PNG").unwrap();
        (dir, path)
    }

    #[test]
    fn test_submit_returns_redirect_target() {
        let (_dir, path) = image();
        let session = MemorySession::redirecting_to("www.header@url.com");

        let result = submit(&session, ENDPOINT, &path).unwrap();
        assert_eq!(result.as_deref(), Some("www.header@url.com"));
        assert_eq!(session.calls().len(), 1);
    }

    #[test]
    fn test_submit_too_large_is_absence() {
        let (_dir, path) = image();
        let session = MemorySession::with_upload(UploadScript::Reply(UploadReply {
            status: 413,
            location: None,
        }));

        assert_eq!(submit(&session, ENDPOINT, &path).unwrap(), None);
    }

    #[test]
    fn test_submit_missing_redirect_is_protocol_error() {
        let (_dir, path) = image();
        let session = MemorySession::with_upload(UploadScript::Reply(UploadReply {
            status: 200,
            location: None,
        }));

        let result = submit(&session, ENDPOINT, &path);
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[test]
    fn test_submit_without_connection_fails() {
        let (_dir, path) = image();
        let session = MemorySession::with_upload(UploadScript::Disconnected);

        let result = submit(&session, ENDPOINT, &path);
        assert!(matches!(result, Err(Error::Connection(_))));
    }
}
