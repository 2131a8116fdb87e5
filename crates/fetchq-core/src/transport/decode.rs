//! Turning a raw response into the payload a caller asked for.
//!
//! A decode error is just another task failure: it is reported through the
//! failure handler as [`TaskError::Decode`].

use sha2::{Digest, Sha256};

use crate::task::{TaskError, TaskResult};

use super::headers::media_type;
use super::Response;

/// Converts a successful response into a payload.
pub trait Decode: Send + 'static {
    type Output: Send + 'static;

    fn decode(&self, response: Response) -> TaskResult<Self::Output>;
}

/// Hands back the response unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBody;

impl Decode for RawBody {
    type Output = Response;

    fn decode(&self, response: Response) -> TaskResult<Response> {
        Ok(response)
    }
}

/// Size and SHA-256 of a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyDigest {
    pub url: String,
    pub len: u64,
    /// Lowercase hex.
    pub sha256: String,
}

/// Hashes the body and drops it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Body;

impl Decode for Sha256Body {
    type Output = BodyDigest;

    fn decode(&self, response: Response) -> TaskResult<BodyDigest> {
        let digest = Sha256::digest(&response.body);
        Ok(BodyDigest {
            url: response.url,
            len: response.body.len() as u64,
            sha256: hex::encode(digest),
        })
    }
}

/// Rejects responses whose `Content-Type` is not in the allow list, then
/// decodes with `inner`.
///
/// Entries are media types (`image/png`) or type wildcards (`image/*`).
/// `*/*` accepts everything, including responses without a `Content-Type`.
#[derive(Debug, Clone)]
pub struct AcceptContentTypes<D> {
    accepted: Vec<String>,
    inner: D,
}

impl<D: Decode> AcceptContentTypes<D> {
    pub fn new<I, S>(accepted: I, inner: D) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            accepted: accepted
                .into_iter()
                .map(|s| s.as_ref().trim().to_ascii_lowercase())
                .collect(),
            inner,
        }
    }

    fn accepts(&self, media: &str) -> bool {
        let top = media.split('/').next().unwrap_or_default();
        self.accepted.iter().any(|a| match a.strip_suffix("/*") {
            Some(prefix) => prefix == top,
            None => a == media,
        })
    }
}

impl<D: Decode> Decode for AcceptContentTypes<D> {
    type Output = D::Output;

    fn decode(&self, response: Response) -> TaskResult<D::Output> {
        if self.accepted.iter().any(|a| a == "*/*") {
            return self.inner.decode(response);
        }
        let media = match response.content_type.as_deref() {
            Some(ct) => media_type(ct),
            None => return Err(TaskError::Decode("response has no Content-Type".into())),
        };
        if !self.accepts(&media) {
            return Err(TaskError::Decode(format!(
                "unacceptable content type {} (accepted: {})",
                media,
                self.accepted.join(", ")
            )));
        }
        self.inner.decode(response)
    }
}
