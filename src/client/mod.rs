//! Notification API Client
//!
//! The widget talks to the server through the [`NotificationApi`] trait.
//! [`HttpNotificationClient`] is the reqwest implementation used against a
//! real site.
//!
//! ## Endpoints
//!
//! - `GET {count_url}?max=N` returns `{ unread_count }`
//! - `GET {list_url}?max=N&offset=O&mark_as_read=1` returns `{ list, unread_count }`
//! - `POST {toggle_url}/{key}/?json=1` returns `{ id, status, unread }`
//! - `POST {mark_all_url}?json=1` returns `{ status }`

mod csrf;
mod http;

pub use csrf::{csrf_safe_method, same_origin, token_from_cookie_header, CsrfPolicy};
pub use http::HttpNotificationClient;

use crate::model::{CountResponse, ListResponse, MarkAllResponse, ToggleResponse};
use async_trait::async_trait;
use thiserror::Error;

/// Parameters of a list page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub offset: usize,
    pub max: u32,
    pub mark_as_read: bool,
}

/// Server side of the notification widget
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Fetch the number of unread notifications
    async fn unread_count(&self, max: u32) -> Result<CountResponse, ApiError>;

    /// Fetch one page of notifications, newest first
    async fn list(&self, query: ListQuery) -> Result<ListResponse, ApiError>;

    /// Flip the read state of one notification
    async fn toggle(&self, key: &str) -> Result<ToggleResponse, ApiError>;

    /// Mark every notification of the user as read
    async fn mark_all_read(&self) -> Result<MarkAllResponse, ApiError>;
}

/// Errors that can occur when talking to the notification endpoints
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Server unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid JSON body: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[cfg(test)]
pub(crate) mod scripted {
    //! Scripted API double for widget tests.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    /// One scripted answer; gated answers resolve when the test sends them.
    pub(crate) enum Reply<T> {
        Ready(Result<T, ApiError>),
        Gated(oneshot::Receiver<Result<T, ApiError>>),
    }

    impl<T> Reply<T> {
        async fn resolve(self) -> Result<T, ApiError> {
            match self {
                Reply::Ready(result) => result,
                Reply::Gated(rx) => rx.await.unwrap_or(Err(ApiError::Unavailable)),
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Call {
        Count,
        List(ListQuery),
        Toggle(String),
        MarkAll,
    }

    /// Answers requests from per-endpoint queues; an empty queue answers
    /// `Unavailable`.
    #[derive(Default)]
    pub(crate) struct ScriptedApi {
        counts: Mutex<VecDeque<Reply<CountResponse>>>,
        lists: Mutex<VecDeque<Reply<ListResponse>>>,
        toggles: Mutex<VecDeque<Reply<ToggleResponse>>>,
        mark_alls: Mutex<VecDeque<Reply<MarkAllResponse>>>,
        calls: Mutex<Vec<Call>>,
    }

    fn pop<T>(queue: &Mutex<VecDeque<Reply<T>>>) -> Reply<T> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Ready(Err(ApiError::Unavailable)))
    }

    impl ScriptedApi {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn push_count(&self, unread_count: u32) {
            self.counts
                .lock()
                .unwrap()
                .push_back(Reply::Ready(Ok(CountResponse { unread_count })));
        }

        pub(crate) fn push_count_error(&self, err: ApiError) {
            self.counts.lock().unwrap().push_back(Reply::Ready(Err(err)));
        }

        pub(crate) fn gate_count(&self) -> oneshot::Sender<Result<CountResponse, ApiError>> {
            let (tx, rx) = oneshot::channel();
            self.counts.lock().unwrap().push_back(Reply::Gated(rx));
            tx
        }

        pub(crate) fn push_list(&self, response: ListResponse) {
            self.lists.lock().unwrap().push_back(Reply::Ready(Ok(response)));
        }

        pub(crate) fn push_list_error(&self, err: ApiError) {
            self.lists.lock().unwrap().push_back(Reply::Ready(Err(err)));
        }

        pub(crate) fn gate_list(&self) -> oneshot::Sender<Result<ListResponse, ApiError>> {
            let (tx, rx) = oneshot::channel();
            self.lists.lock().unwrap().push_back(Reply::Gated(rx));
            tx
        }

        pub(crate) fn push_toggle(&self, response: ToggleResponse) {
            self.toggles
                .lock()
                .unwrap()
                .push_back(Reply::Ready(Ok(response)));
        }

        pub(crate) fn push_toggle_error(&self, err: ApiError) {
            self.toggles.lock().unwrap().push_back(Reply::Ready(Err(err)));
        }

        pub(crate) fn push_mark_all(&self) {
            self.mark_alls
                .lock()
                .unwrap()
                .push_back(Reply::Ready(Ok(MarkAllResponse {
                    status: Some("ok".to_string()),
                })));
        }

        pub(crate) fn push_mark_all_error(&self, err: ApiError) {
            self.mark_alls
                .lock()
                .unwrap()
                .push_back(Reply::Ready(Err(err)));
        }

        pub(crate) fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub(crate) fn count_calls(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, Call::Count))
                .count()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl NotificationApi for ScriptedApi {
        async fn unread_count(&self, _max: u32) -> Result<CountResponse, ApiError> {
            self.record(Call::Count);
            let reply = pop(&self.counts);
            reply.resolve().await
        }

        async fn list(&self, query: ListQuery) -> Result<ListResponse, ApiError> {
            self.record(Call::List(query));
            let reply = pop(&self.lists);
            reply.resolve().await
        }

        async fn toggle(&self, key: &str) -> Result<ToggleResponse, ApiError> {
            self.record(Call::Toggle(key.to_string()));
            let reply = pop(&self.toggles);
            reply.resolve().await
        }

        async fn mark_all_read(&self) -> Result<MarkAllResponse, ApiError> {
            self.record(Call::MarkAll);
            let reply = pop(&self.mark_alls);
            reply.resolve().await
        }
    }
}
