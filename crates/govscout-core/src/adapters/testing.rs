use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// Records every request and replays scripted responses in order; once the
/// script runs out the fallback answers every further call.
#[derive(Debug)]
pub(crate) struct RecordingHttpClient {
    script: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    fallback: Result<HttpResponse, HttpError>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingHttpClient {
    pub(crate) fn json(body: &str) -> Self {
        Self::scripted(Vec::new(), Ok(HttpResponse::ok_json(body)))
    }

    pub(crate) fn failure() -> Self {
        Self::scripted(Vec::new(), Err(HttpError::new("connection refused")))
    }

    pub(crate) fn scripted(
        script: Vec<Result<HttpResponse, HttpError>>,
        fallback: Result<HttpResponse, HttpError>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn recorded_requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .clone()
    }
}

impl HttpClient for RecordingHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .push(request);
        let response = self
            .script
            .lock()
            .expect("script should not be poisoned")
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        Box::pin(async move { response })
    }
}
