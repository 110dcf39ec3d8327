use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Response};

use crate::config::OpenAiChatConfig;
use crate::error::{parse_error_message, OpenAiChatError};
use crate::events::{ChatStreamEvent, FinishReason};
use crate::payload::ChatCompletionRequest;
use crate::sse::SseStreamParser;
use crate::url::normalize_chat_url;

/// Optional cancellation signal shared across request and stream loops.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);
const DEFAULT_USER_AGENT: &str = concat!("complibot/", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
pub struct OpenAiChatClient {
    http: Client,
    config: OpenAiChatConfig,
}

#[derive(Debug, Clone)]
pub struct StreamResult {
    pub events: Vec<ChatStreamEvent>,
    pub finish_reason: Option<FinishReason>,
}

impl OpenAiChatClient {
    pub fn new(config: OpenAiChatConfig) -> Result<Self, OpenAiChatError> {
        if config.api_key.trim().is_empty() {
            return Err(OpenAiChatError::MissingApiKey);
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OpenAiChatConfig {
        &self.config
    }

    pub fn normalized_endpoint(&self) -> String {
        normalize_chat_url(&self.config.base_url)
    }

    pub fn build_headers(&self) -> Result<HeaderMap, OpenAiChatError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            header_value("authorization", &format!("Bearer {}", self.config.api_key.trim()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let user_agent = self
            .config
            .user_agent
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_USER_AGENT);
        headers.insert(USER_AGENT, header_value("user-agent", user_agent)?);

        if let Some(organization) = self
            .config
            .organization
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            headers.insert(
                HeaderName::from_static("openai-organization"),
                header_value("openai-organization", organization)?,
            );
        }

        for (key, value) in &self.config.extra_headers {
            let name = HeaderName::from_bytes(key.trim().to_ascii_lowercase().as_bytes())
                .map_err(|_| OpenAiChatError::InvalidHeader(format!("invalid header key: {key}")))?;
            headers.insert(name, header_value(key, value.trim())?);
        }

        Ok(headers)
    }

    pub fn build_request(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<reqwest::RequestBuilder, OpenAiChatError> {
        if request.model.trim().is_empty() {
            return Err(OpenAiChatError::MissingModel);
        }

        let mut payload = request.clone();
        payload.stream = true;

        Ok(self
            .http
            .post(self.normalized_endpoint())
            .headers(self.build_headers()?)
            .json(&payload))
    }

    /// Sends the request once. Non-success statuses become [`OpenAiChatError::Status`].
    pub async fn send(
        &self,
        request: &ChatCompletionRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Response, OpenAiChatError> {
        if is_cancelled(cancellation) {
            return Err(OpenAiChatError::Cancelled);
        }

        let response = await_or_cancel(self.build_request(request)?.send(), cancellation).await??;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = await_or_cancel(response.text(), cancellation)
            .await?
            .unwrap_or_default();
        let message = parse_error_message(status, &body);
        tracing::warn!(%status, %message, model = %request.model, "chat completion request rejected");
        Err(OpenAiChatError::Status { status, message })
    }

    pub async fn stream_with_handler<F>(
        &self,
        request: &ChatCompletionRequest,
        cancellation: Option<&CancellationSignal>,
        mut on_event: F,
    ) -> Result<Option<FinishReason>, OpenAiChatError>
    where
        F: FnMut(ChatStreamEvent),
    {
        let response = self.send(request, cancellation).await?;
        let mut bytes = response.bytes_stream();
        let mut parser = SseStreamParser::default();
        let mut finish_reason = None;

        loop {
            let Some(chunk) = await_or_cancel(bytes.next(), cancellation).await? else {
                break;
            };
            if is_cancelled(cancellation) {
                return Err(OpenAiChatError::Cancelled);
            }
            let chunk = chunk?;
            for event in parser.feed(&chunk) {
                process_stream_event(event, &mut finish_reason, &mut on_event)?;
            }
            if parser.is_done() {
                break;
            }
        }

        if is_cancelled(cancellation) {
            return Err(OpenAiChatError::Cancelled);
        }

        Ok(finish_reason)
    }

    pub async fn stream(
        &self,
        request: &ChatCompletionRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<StreamResult, OpenAiChatError> {
        let mut events = Vec::new();
        let finish_reason = self
            .stream_with_handler(request, cancellation, |event| events.push(event))
            .await?;

        Ok(StreamResult {
            events,
            finish_reason,
        })
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, OpenAiChatError> {
    HeaderValue::from_str(value)
        .map_err(|_| OpenAiChatError::InvalidHeader(format!("invalid header value for {name}")))
}

pub(crate) fn process_stream_event<F>(
    event: ChatStreamEvent,
    finish_reason: &mut Option<FinishReason>,
    on_event: &mut F,
) -> Result<(), OpenAiChatError>
where
    F: FnMut(ChatStreamEvent),
{
    match &event {
        ChatStreamEvent::Error { code, message } => {
            return Err(OpenAiChatError::StreamFailed {
                code: code.clone(),
                message: message
                    .clone()
                    .or_else(|| code.clone())
                    .unwrap_or_else(|| "unknown stream error".to_owned()),
            });
        }
        ChatStreamEvent::Finished { reason } => *finish_reason = Some(reason.clone()),
        _ => {}
    }

    on_event(event);
    Ok(())
}

fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, OpenAiChatError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(OpenAiChatError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(OpenAiChatError::Cancelled);
            }
            return Ok(output);
        }
    }
}
