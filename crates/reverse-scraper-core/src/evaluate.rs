//! Candidate evaluation: fetch every capped link, measure it, and classify
//! it against the source image.

use log::debug;

use crate::probe::{measure_bytes, Dimensions};
use crate::session::{SearchSession, FORBIDDEN};

/// What fetching a candidate link produced
#[derive(Debug)]
pub enum CandidateImage {
    /// The body decoded as an image
    Decoded {
        bytes: Vec<u8>,
        dimensions: Dimensions,
        forbidden: bool,
    },
    /// Unreachable, unrecognized, or over the pixel limit
    Invalid { reason: String, forbidden: bool },
}

impl CandidateImage {
    pub fn forbidden(&self) -> bool {
        match self {
            CandidateImage::Decoded { forbidden, .. } | CandidateImage::Invalid { forbidden, .. } => {
                *forbidden
            }
        }
    }
}

/// Classification of one candidate against the source
#[derive(Debug)]
pub enum Verdict {
    Invalid { reason: String },
    TooSmall { dimensions: Dimensions },
    Larger { dimensions: Dimensions, bytes: Vec<u8> },
}

/// Outcome for one candidate link
#[derive(Debug)]
pub struct Evaluation {
    pub link: String,
    /// The server answered 403 while the candidate was fetched
    pub forbidden: bool,
    pub verdict: Verdict,
}

impl Evaluation {
    pub fn is_larger(&self) -> bool {
        matches!(self.verdict, Verdict::Larger { .. })
    }
}

/// Fetch a candidate and try to read it as an image
pub fn fetch_candidate<S: SearchSession + ?Sized>(
    session: &S,
    link: &str,
    max_pixels: u64,
) -> CandidateImage {
    let fetched = match session.fetch(link) {
        Ok(fetched) => fetched,
        Err(e) => {
            return CandidateImage::Invalid {
                reason: e.to_string(),
                forbidden: false,
            }
        }
    };

    let forbidden = fetched.status == FORBIDDEN;
    match measure_bytes(&fetched.body, max_pixels) {
        Ok(dimensions) => CandidateImage::Decoded {
            bytes: fetched.body,
            dimensions,
            forbidden,
        },
        Err(e) => CandidateImage::Invalid {
            reason: e.to_string(),
            forbidden,
        },
    }
}

/// Compare a fetched candidate against the source dimensions
pub fn classify(candidate: CandidateImage, source: &Dimensions) -> Verdict {
    match candidate {
        CandidateImage::Invalid { reason, .. } => Verdict::Invalid { reason },
        CandidateImage::Decoded {
            bytes, dimensions, ..
        } => {
            if dimensions.exceeds(source) {
                Verdict::Larger { dimensions, bytes }
            } else {
                Verdict::TooSmall { dimensions }
            }
        }
    }
}

/// Evaluate every link, in order. One candidate's failure never stops the
/// others.
pub fn evaluate_candidates<S: SearchSession + ?Sized>(
    session: &S,
    links: &[String],
    source: &Dimensions,
    max_pixels: u64,
) -> Vec<Evaluation> {
    links
        .iter()
        .map(|link| {
            let candidate = fetch_candidate(session, link, max_pixels);
            let forbidden = candidate.forbidden();
            let verdict = classify(candidate, source);
            debug!("Candidate {} -> {:?}", link, VerdictKind::from(&verdict));
            Evaluation {
                link: link.clone(),
                forbidden,
                verdict,
            }
        })
        .collect()
}

/// Byte-free view of a verdict for logging
#[derive(Debug)]
enum VerdictKind {
    Invalid,
    TooSmall(Dimensions),
    Larger(Dimensions),
}

impl From<&Verdict> for VerdictKind {
    fn from(verdict: &Verdict) -> Self {
        match verdict {
            Verdict::Invalid { .. } => VerdictKind::Invalid,
            Verdict::TooSmall { dimensions } => VerdictKind::TooSmall(*dimensions),
            Verdict::Larger { dimensions, .. } => VerdictKind::Larger(*dimensions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::DEFAULT_MAX_PIXELS;
    use crate::session::MemorySession;
    use crate::test_utils::png_bytes;

    fn session() -> MemorySession {
        MemorySession::redirecting_to("https://results")
            .resource("https://a.com/big.png", 200, png_bytes(300, 200))
            .resource("https://a.com/same.png", 200, png_bytes(100, 100))
            .resource("https://a.com/tall.png", 200, png_bytes(10, 101))
            .resource("https://a.com/page.jpg", 200, b"<html>nope</html>".to_vec())
            .resource("https://a.com/blocked.png", 403, png_bytes(400, 400))
            .resource("https://a.com/denied.png", 403, b"Forbidden".to_vec())
    }

    #[test]
    fn test_fetch_candidate_decodes() {
        let candidate = fetch_candidate(&session(), "https://a.com/big.png", DEFAULT_MAX_PIXELS);
        match candidate {
            CandidateImage::Decoded {
                dimensions,
                forbidden,
                ..
            } => {
                assert_eq!(dimensions, Dimensions::new(300, 200));
                assert!(!forbidden);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fetch_candidate_invalid_cases() {
        let session = session();
        for link in ["https://a.com/page.jpg", "https://a.com/unreachable.jpg"] {
            let candidate = fetch_candidate(&session, link, DEFAULT_MAX_PIXELS);
            assert!(matches!(candidate, CandidateImage::Invalid { forbidden: false, .. }));
        }

        let candidate = fetch_candidate(&session, "https://a.com/denied.png", DEFAULT_MAX_PIXELS);
        assert!(matches!(candidate, CandidateImage::Invalid { forbidden: true, .. }));
    }

    #[test]
    fn test_pixel_limit_makes_candidate_invalid() {
        let candidate = fetch_candidate(&session(), "https://a.com/big.png", 1_000);
        assert!(matches!(candidate, CandidateImage::Invalid { .. }));
    }

    #[test]
    fn test_evaluate_candidates_classifies_in_order() {
        let links: Vec<String> = [
            "https://a.com/page.jpg",
            "https://a.com/big.png",
            "https://a.com/same.png",
            "https://a.com/tall.png",
            "https://a.com/blocked.png",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let session = session();
        let results = evaluate_candidates(
            &session,
            &links,
            &Dimensions::new(100, 100),
            DEFAULT_MAX_PIXELS,
        );

        assert_eq!(results.len(), 5);
        assert!(matches!(results[0].verdict, Verdict::Invalid { .. }));
        assert!(results[1].is_larger());
        assert!(matches!(results[2].verdict, Verdict::TooSmall { .. }));
        assert!(results[3].is_larger());
        assert!(results[4].is_larger());
        assert!(results[4].forbidden);
        assert!(!results[1].forbidden);

        // Every candidate was tried, in order
        let fetched: Vec<String> = session
            .calls()
            .into_iter()
            .filter_map(|call| call.strip_prefix("FETCH ").map(str::to_string))
            .collect();
        assert_eq!(fetched, links);
    }
}
