use std::sync::Arc;

use pingora::prelude::*;
use pingora::server::RunArgs;
use pingora::server::Server as PingoraServer;
use pingora::server::configuration::Opt;

use crate::configuration::GatewayConfig;
use crate::gateway::CsrfGateway;
use crate::guard::Guard;
use crate::metric::Metrics;

pub struct Server {
    server: PingoraServer,
}

impl Server {
    pub fn new(opt: Option<Opt>) -> Result<Self> {
        let server = PingoraServer::new(opt)?;
        Ok(Server { server })
    }

    pub fn bootstrap(&mut self, config: GatewayConfig, metrics: Arc<Metrics>) -> Result<()> {
        self.server.bootstrap();

        config.validate().map_err(|e| {
            Error::explain(ErrorType::InternalError, format!("invalid gateway config: {e}"))
        })?;

        let guard = Guard::new(&config).map_err(|e| {
            Error::explain(
                ErrorType::InternalError,
                format!("invalid csrf header name: {e}"),
            )
        })?;
        let gateway = CsrfGateway::new(Arc::new(guard), &config.upstream, metrics)?;

        if !config.production {
            log::warn!("production is off: binding cookie is sent without the Secure flag");
        }
        log::info!(
            "csrf gateway listening on {} in front of {}",
            config.listen,
            config.upstream.address
        );

        let mut gateway_service = http_proxy_service(&self.server.configuration, gateway);
        gateway_service.add_tcp(&config.listen);
        self.server.add_service(gateway_service);

        Ok(())
    }

    pub fn run_forever(self) {
        self.server.run_forever();
    }

    pub fn run(self, args: RunArgs) {
        self.server.run(args);
    }
}
