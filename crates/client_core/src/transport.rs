//! HTTP access to the form service.

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::AnswerMap,
    error::ServiceError,
    protocol::{
        download_docx_route, generate_docx_route, generate_json_route, get_questions_route,
        restart_route, submit_answers_route, Acknowledgement, MessageResponse, QuestionBatch,
        SubmitAnswersRequest,
    },
};
use tracing::debug;
use url::Url;

use crate::error::TransportError;

/// The six calls the workflow makes against the form service. Acknowledgement
/// bodies are surfaced as their optional `message` only.
#[async_trait]
pub trait FormService: Send + Sync {
    async fn fetch_questions(&self) -> Result<QuestionBatch, TransportError>;
    async fn submit_answers(&self, answers: &AnswerMap) -> Result<Option<String>, TransportError>;
    async fn generate_json(&self) -> Result<String, TransportError>;
    async fn render_document(&self) -> Result<Option<String>, TransportError>;
    async fn download_document(&self) -> Result<Vec<u8>, TransportError>;
    async fn restart(&self) -> Result<Option<String>, TransportError>;
}

pub struct HttpFormService {
    http: Client,
    base_url: Url,
}

impl HttpFormService {
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, TransportError> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url = Url::parse(&normalized).map_err(|source| TransportError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, route: &'static str) -> Result<Url, TransportError> {
        self.base_url
            .join(route.trim_start_matches('/'))
            .map_err(|source| TransportError::InvalidUrl {
                url: format!("{}{}", self.base_url, route.trim_start_matches('/')),
                source,
            })
    }

    async fn send(
        &self,
        route: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, TransportError> {
        let res = request.send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(TransportError::Status { route, status });
        }
        Ok(res)
    }

    async fn post_acknowledged(&self, route: &'static str) -> Result<Option<String>, TransportError> {
        let url = self.endpoint(route)?;
        let res = self.send(route, self.http.post(url)).await?;
        read_acknowledgement(route, res).await
    }
}

async fn read_json<T: DeserializeOwned>(
    route: &'static str,
    res: Response,
) -> Result<T, TransportError> {
    let body = res.bytes().await?;
    serde_json::from_slice(&body).map_err(|source| TransportError::Decode { route, source })
}

async fn read_acknowledgement(
    route: &'static str,
    res: Response,
) -> Result<Option<String>, TransportError> {
    let body = res.bytes().await?;
    let message = serde_json::from_slice::<Acknowledgement>(&body)
        .ok()
        .and_then(|ack| ack.message);
    debug!(route, ack = message.as_deref().unwrap_or(""), "service acknowledged");
    Ok(message)
}

fn is_json_response(res: &Response) -> bool {
    res.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("application/json")
        })
}

#[async_trait]
impl FormService for HttpFormService {
    async fn fetch_questions(&self) -> Result<QuestionBatch, TransportError> {
        let route = get_questions_route();
        let url = self.endpoint(route)?;
        let res = self.send(route, self.http.get(url)).await?;
        read_json(route, res).await
    }

    async fn submit_answers(&self, answers: &AnswerMap) -> Result<Option<String>, TransportError> {
        let route = submit_answers_route();
        let url = self.endpoint(route)?;
        let request = self.http.post(url).json(&SubmitAnswersRequest {
            answers: answers.clone(),
        });
        let res = self.send(route, request).await?;
        read_acknowledgement(route, res).await
    }

    async fn generate_json(&self) -> Result<String, TransportError> {
        let route = generate_json_route();
        let url = self.endpoint(route)?;
        let res = self.send(route, self.http.post(url)).await?;
        let body: MessageResponse = read_json(route, res).await?;
        Ok(body.message)
    }

    async fn render_document(&self) -> Result<Option<String>, TransportError> {
        self.post_acknowledged(generate_docx_route()).await
    }

    async fn download_document(&self) -> Result<Vec<u8>, TransportError> {
        let route = download_docx_route();
        let url = self.endpoint(route)?;
        let res = self.send(route, self.http.get(url)).await?;
        // The service reports a missing document as a JSON body with status 200.
        if is_json_response(&res) {
            let body: ServiceError = read_json(route, res).await?;
            return Err(TransportError::Service {
                route,
                message: body.error,
            });
        }
        let bytes = res.bytes().await?;
        if bytes.is_empty() {
            return Err(TransportError::EmptyBody { route });
        }
        Ok(bytes.to_vec())
    }

    async fn restart(&self) -> Result<Option<String>, TransportError> {
        self.post_acknowledged(restart_route()).await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
