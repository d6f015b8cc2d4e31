//! Decides whether an origin response goes back to the client as is or the
//! gateway synthesizes a directory listing instead

use crate::origin::ResponseMeta;
use actix_web::http::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackDecision {
    /// Return the origin response unmodified
    ReturnOrigin,
    /// Proceed with listing the bucket
    SynthesizeListing,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackPolicy {
    /// When set, a zero-length 404 for a slash-terminated path wins over the
    /// synthesized listing. Some backends need an explicit zero-byte object
    /// to represent an empty folder.
    pub overwrite_zero_byte_object: bool,
}

impl FallbackPolicy {
    pub fn new(overwrite_zero_byte_object: bool) -> Self {
        Self {
            overwrite_zero_byte_object,
        }
    }

    /// The checks are ordered; reordering them changes the outcome.
    pub fn decide<R: ResponseMeta + ?Sized>(&self, response: &R) -> FallbackDecision {
        if response.status() != StatusCode::NOT_FOUND {
            return FallbackDecision::ReturnOrigin;
        }
        if !response.url().ends_with('/') {
            return FallbackDecision::SynthesizeListing;
        }
        let zero_byte = response.header("content-length") == Some("0");
        if self.overwrite_zero_byte_object && zero_byte {
            return FallbackDecision::ReturnOrigin;
        }
        FallbackDecision::SynthesizeListing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::origin::OriginResponse;

    fn response(status: StatusCode, url: &str, content_length: Option<&str>) -> OriginResponse {
        let resp = OriginResponse::new(status, url);
        match content_length {
            Some(len) => resp.with_header("content-length", len),
            None => resp,
        }
    }

    #[test]
    fn test_non_404_always_returns_origin() {
        let policies = [FallbackPolicy::new(false), FallbackPolicy::new(true)];
        for policy in policies {
            for status in [StatusCode::OK, StatusCode::FORBIDDEN, StatusCode::INTERNAL_SERVER_ERROR] {
                for url in ["https://h/a/", "https://h/a"] {
                    let resp = response(status, url, Some("0"));
                    assert_eq!(policy.decide(&resp), FallbackDecision::ReturnOrigin);
                }
            }
        }
    }

    #[test]
    fn test_404_file_path_always_synthesizes() {
        for policy in [FallbackPolicy::new(false), FallbackPolicy::new(true)] {
            for len in [None, Some("0"), Some("12")] {
                let resp = response(StatusCode::NOT_FOUND, "https://h/a/file.jar", len);
                assert_eq!(policy.decide(&resp), FallbackDecision::SynthesizeListing);
            }
        }
    }

    #[test]
    fn test_404_directory_default_policy_synthesizes() {
        let policy = FallbackPolicy::default();
        for len in [None, Some("0"), Some("12")] {
            let resp = response(StatusCode::NOT_FOUND, "https://h/a/", len);
            assert_eq!(policy.decide(&resp), FallbackDecision::SynthesizeListing);
        }
    }

    #[test]
    fn test_404_directory_zero_byte_with_overwrite_returns_origin() {
        let policy = FallbackPolicy::new(true);

        let zero = response(StatusCode::NOT_FOUND, "https://h/a/", Some("0"));
        assert_eq!(policy.decide(&zero), FallbackDecision::ReturnOrigin);

        let non_zero = response(StatusCode::NOT_FOUND, "https://h/a/", Some("153"));
        assert_eq!(policy.decide(&non_zero), FallbackDecision::SynthesizeListing);

        let missing = response(StatusCode::NOT_FOUND, "https://h/a/", None);
        assert_eq!(policy.decide(&missing), FallbackDecision::SynthesizeListing);
    }
}
