//! Terminal verbs: one request per call, no retries.
//!
//! Non-2xx statuses are returned as ordinary [`Response`]s; only transport
//! and decode failures become errors.


use std::collections::BTreeMap;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Map;

use crate::resource::{Resource, compose_url};
use crate::response::{self, Payload, Response};
use crate::RestError;

impl Resource<'_, '_> {
    /// GET this resource.
    pub async fn get(&self) -> Result<Response, RestError> {
        self.send(Method::GET, None).await
    }

    /// GET with `query` replacing the resource's query parameters for this call.
    pub async fn get_with_query<I, K, V>(&self, query: I) -> Result<Response, RestError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let url = self.url_with_query(query);
        self.send_to(Method::GET, url, None).await
    }

    /// POST `payload` as JSON.
    pub async fn post<P: Serialize + ?Sized>(&self, payload: &P) -> Result<Response, RestError> {
        let body = encode(payload)?;
        self.send(Method::POST, Some(body)).await
    }

    /// PUT `payload` as JSON.
    pub async fn put<P: Serialize + ?Sized>(&self, payload: &P) -> Result<Response, RestError> {
        let body = encode(payload)?;
        self.send(Method::PUT, Some(body)).await
    }

    /// PATCH `payload` as JSON.
    pub async fn patch<P: Serialize + ?Sized>(&self, payload: &P) -> Result<Response, RestError> {
        let body = encode(payload)?;
        self.send(Method::PATCH, Some(body)).await
    }

    pub async fn delete(&self) -> Result<Response, RestError> {
        self.send(Method::DELETE, None).await
    }

    pub async fn head(&self) -> Result<Response, RestError> {
        self.send(Method::HEAD, None).await
    }

    pub async fn options(&self) -> Result<Response, RestError> {
        self.send(Method::OPTIONS, None).await
    }

    fn url_with_query<I, K, V>(&self, query: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let query: BTreeMap<String, String> = query
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        compose_url(self.client().base_url(), self.path(), &query)
    }

    async fn send(&self, method: Method, body: Option<Vec<u8>>) -> Result<Response, RestError> {
        let url = self.parse_url();
        self.send_to(method, url, body).await
    }

    async fn send_to(
        &self,
        method: Method,
        url: String,
        body: Option<Vec<u8>>,
    ) -> Result<Response, RestError> {
        let client = self.client();

        let mut headers = client.headers().clone();
        for (name, value) in self.headers() {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| RestError::InvalidHeader(format!("invalid header name: {e}")))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| RestError::InvalidHeader(format!("invalid header value: {e}")))?;
            headers.insert(name, value);
        }

        let mut request = client.http.request(method.clone(), url.as_str()).headers(headers);
        request = client.authorize(request);
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body);
        }

        tracing::debug!(%method, url = %url, "Sending request");
        let resp = request.send().await?;

        let status = resp.status();
        let resp_headers = resp.headers().clone();
        let final_url = resp.url().clone();
        let resp_body = resp.bytes().await?;

        if status.is_success() {
            tracing::debug!(%method, url = %url, status = status.as_u16(), "Request completed");
        } else {
            tracing::warn!(
                %method,
                url = %url,
                status = status.as_u16(),
                "Request returned non-success status"
            );
        }

        let mut destination = self.take_destination();
        let payload = if destination.is_some() {
            Payload::Bound
        } else {
            Payload::Untyped(Map::new())
        };
        let mut response = Response {
            status,
            headers: resp_headers,
            url: final_url,
            body: resp_body,
            payload,
        };

        let decoded = response::decode(&response.body, destination.as_deref_mut());
        self.restore_destination(destination);

        match decoded {
            Ok(payload) => {
                response.payload = payload;
                Ok(response)
            }
            Err(source) => {
                tracing::warn!(url = %url, error = %source, "Failed to decode response body");
                Err(RestError::Decode {
                    response: Box::new(response),
                    source,
                })
            }
        }
    }
}

fn encode<P: Serialize + ?Sized>(payload: &P) -> Result<Vec<u8>, RestError> {
    serde_json::to_vec(payload).map_err(RestError::Encode)
}
