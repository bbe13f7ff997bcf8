use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use http::{Method, header};
use pingora::http::ResponseHeader;
use pingora::prelude::*;

use crate::configuration::Upstream;
use crate::endpoints::{self, Reply};
use crate::guard::{Admission, Endpoint, Guard};
use crate::metric::{Metrics, Outcome};

/// Per-request state carried from `request_filter` to `response_filter`.
#[derive(Debug, Default)]
pub struct GatewayCtx {
    outcome: Option<Outcome>,
    clear_binding: bool,
}

/// Reverse proxy that enforces the token check ahead of the protected application.
pub struct CsrfGateway {
    guard: Arc<Guard>,
    upstream: SocketAddr,
    tls: bool,
    sni: String,
    metrics: Arc<Metrics>,
}

impl CsrfGateway {
    pub fn new(guard: Arc<Guard>, upstream: &Upstream, metrics: Arc<Metrics>) -> Result<Self> {
        let address = upstream.address.parse::<SocketAddr>().map_err(|e| {
            Error::explain(
                ErrorType::InternalError,
                format!("invalid upstream address {}: {e}", upstream.address),
            )
        })?;

        Ok(Self {
            guard,
            upstream: address,
            tls: upstream.tls,
            sni: upstream.sni.clone(),
            metrics,
        })
    }

    async fn respond(&self, session: &mut Session, reply: Reply, outcome: Outcome) -> Result<bool> {
        self.metrics.record(outcome, reply.status.as_u16());

        let mut header = ResponseHeader::build(reply.status, Some(5))?;
        header.insert_header(header::CONTENT_TYPE, "application/json")?;
        header.insert_header(header::CONTENT_LENGTH, reply.body.len().to_string())?;
        header.insert_header(header::CACHE_CONTROL, "no-store")?;
        if let Some(cookie) = reply.set_cookie {
            header.append_header(header::SET_COOKIE, cookie.header_value())?;
        }

        // The request body, if any, is never read.
        session.set_keepalive(None);
        session
            .write_response_header(Box::new(header), false)
            .await?;
        session.write_response_body(Some(reply.body), true).await?;
        Ok(true)
    }
}

#[async_trait]
impl ProxyHttp for CsrfGateway {
    type CTX = GatewayCtx;

    fn new_ctx(&self) -> Self::CTX {
        GatewayCtx::default()
    }

    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool>
    where
        Self::CTX: Send + Sync,
    {
        let request = session.req_header();
        let method = request.method.clone();
        let path = request.uri.path().to_owned();

        match self.guard.endpoint(&path) {
            Some(Endpoint::Issue) if method == Method::GET => {
                let reply = endpoints::issue_reply(&self.guard);
                let outcome = if reply.status.is_success() {
                    log::debug!("issued csrf token");
                    Outcome::Issued
                } else {
                    Outcome::IssuanceFailed
                };
                return self.respond(session, reply, outcome).await;
            }
            Some(Endpoint::Issue) => {
                return self
                    .respond(
                        session,
                        endpoints::method_not_allowed(),
                        Outcome::MethodNotAllowed,
                    )
                    .await;
            }
            Some(Endpoint::Validate) => {
                let reply = endpoints::validate_reply(&self.guard, &session.req_header().headers);
                return self.respond(session, reply, Outcome::Validated).await;
            }
            None => {}
        }

        let admission = self
            .guard
            .admit(&method, &path, &session.req_header().headers);

        if let Some(reply) = endpoints::rejection_reply(admission) {
            log::warn!("rejected {method} {path}: {admission:?}");
            return self.respond(session, reply, admission.into()).await;
        }

        ctx.outcome = Some(admission.into());
        ctx.clear_binding = admission == Admission::Verified && self.guard.is_logout(&path);
        Ok(false)
    }

    async fn response_filter(
        &self,
        _session: &mut Session,
        upstream_response: &mut ResponseHeader,
        ctx: &mut Self::CTX,
    ) -> Result<()>
    where
        Self::CTX: Send + Sync,
    {
        let status = upstream_response.status;
        if let Some(outcome) = ctx.outcome {
            self.metrics.record(outcome, status.as_u16());
        }

        if ctx.clear_binding && status.is_success() {
            let removal = self.guard.store().clear();
            upstream_response.append_header(header::SET_COOKIE, removal.header_value())?;
        }
        Ok(())
    }

    async fn upstream_peer(
        &self,
        _session: &mut Session,
        _ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        Ok(Box::new(HttpPeer::new(
            self.upstream,
            self.tls,
            self.sni.clone(),
        )))
    }
}
