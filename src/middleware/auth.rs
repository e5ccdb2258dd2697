use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    extract::Request,
    response::{IntoResponse, Response},
};
use pin_project_lite::pin_project;
use tower::{Layer, Service};

use crate::{Error, auth::SessionManager, util::bearer_token};

/// Rejects requests without a valid access token and hands the decoded
/// [`AccessClaims`](crate::auth::AccessClaims) to handlers as an extension.
#[derive(Clone)]
pub struct AuthLayer {
    sessions: Arc<SessionManager>,
}

impl AuthLayer {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            sessions: self.sessions.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    sessions: Arc<SessionManager>,
}

impl<S> Service<Request> for AuthMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = AuthFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let Some(token) = bearer_token(req.headers()) else {
            return AuthFuture::rejected(Error::missing_token("Access token is required"));
        };
        match self.sessions.authenticate(token) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                AuthFuture::authorized(self.inner.call(req))
            }
            Err(err) => AuthFuture::rejected(err),
        }
    }
}

pin_project! {
    #[project = AuthFutureProj]
    pub enum AuthFuture<F> {
        Authorized {
            #[pin]
            inner: F,
        },
        Rejected {
            response: Option<Response>,
        },
    }
}

impl<F> AuthFuture<F> {
    fn rejected(error: Error) -> Self {
        Self::Rejected {
            response: Some(error.into_response()),
        }
    }

    fn authorized(inner: F) -> Self {
        Self::Authorized { inner }
    }
}

impl<F, E> Future for AuthFuture<F>
where
    F: Future<Output = Result<Response, E>>,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            AuthFutureProj::Authorized { inner } => inner.poll(cx),
            AuthFutureProj::Rejected { response } => {
                let response = response.take().expect("AuthFuture polled after completion");
                Poll::Ready(Ok(response))
            }
        }
    }
}
