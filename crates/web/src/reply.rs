//! Reply state recorded by actions and interceptors.
//!
//! Nothing is written to the wire here; the server layer turns a [`Reply`] into a response
//! unless the action marked it [`Reply::done`] after writing the body itself.

use bytes::Bytes;
use http::header::{HeaderName, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, StatusCode};
use mime::Mime;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub url: String,
    pub status: StatusCode,
}

#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    content_type: Option<Mime>,
    body: Bytes,
    redirect: Option<RedirectTarget>,
    done: bool,
}

impl Default for Reply {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            content_type: None,
            body: Bytes::new(),
            redirect: None,
            done: false,
        }
    }
}

impl Reply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    pub fn header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    pub fn content_type(&mut self, content_type: Mime) -> &mut Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn body(&mut self, body: impl Into<Bytes>) -> &mut Self {
        self.body = body.into();
        self
    }

    /// Sets a `text/plain; charset=utf-8` body.
    pub fn text(&mut self, text: impl Into<String>) -> &mut Self {
        let text: String = text.into();
        self.content_type(mime::TEXT_PLAIN_UTF_8).body(text)
    }

    /// Sets an `application/json` body.
    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<&mut Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        Ok(self.content_type(mime::APPLICATION_JSON).body(body))
    }

    pub fn redirect(&mut self, url: impl Into<String>, status: StatusCode) -> &mut Self {
        self.status = status;
        self.redirect = Some(RedirectTarget { url: url.into(), status });
        self
    }

    /// Marks the response as already written by the action.
    pub fn done(&mut self) -> &mut Self {
        self.done = true;
        self
    }

    #[inline]
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    #[inline]
    pub fn mime(&self) -> Option<&Mime> {
        self.content_type.as_ref()
    }

    #[inline]
    pub fn body_bytes(&self) -> &Bytes {
        &self.body
    }

    #[inline]
    pub fn redirect_target(&self) -> Option<&RedirectTarget> {
        self.redirect.as_ref()
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Response headers including `Content-Type`, when one was set.
    pub fn response_headers(&self) -> HeaderMap {
        let mut headers = self.headers.clone();
        if let Some(content_type) = &self.content_type {
            if let Ok(value) = HeaderValue::from_str(content_type.as_ref()) {
                headers.insert(CONTENT_TYPE, value);
            }
        }
        headers
    }

    pub(crate) fn reset(&mut self) {
        self.status = StatusCode::OK;
        self.headers.clear();
        self.content_type = None;
        self.body = Bytes::new();
        self.redirect = None;
        self.done = false;
    }
}
