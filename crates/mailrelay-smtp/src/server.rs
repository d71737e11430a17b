//! TCP accept loop.

use crate::config::ServerConfig;
use crate::error::Result;
use crate::handler::MessageHandler;
use crate::session::Session;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{Instrument, debug, info, info_span, warn};

/// SMTP server spawning one [`Session`] task per connection.
#[derive(Debug)]
pub struct Server<H> {
    config: Arc<ServerConfig>,
    handler: Arc<H>,
}

impl<H: MessageHandler> Server<H> {
    /// Creates a server.
    #[must_use]
    pub fn new(config: ServerConfig, handler: H) -> Self {
        Self {
            config: Arc::new(config),
            handler: Arc::new(handler),
        }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Creates a session for a connection accepted elsewhere.
    #[must_use]
    pub fn session(&self) -> Session<H> {
        Session::new(Arc::clone(&self.config), Arc::clone(&self.handler))
    }

    /// Binds the configured address and serves connections until an
    /// accept error occurs.
    ///
    /// # Errors
    ///
    /// Returns an error if binding or accepting fails.
    pub async fn listen_and_serve(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.listen_addr).await?;
        info!(addr = %listener.local_addr()?, domain = %self.config.domain, "Starting SMTP server");
        self.serve(listener).await
    }

    /// Serves connections from an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns an error if accepting a connection fails.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            if let Err(error) = stream.set_nodelay(true) {
                debug!(%error, "Failed to set TCP_NODELAY");
            }

            let session = self.session();
            let span = info_span!("session", %peer);
            tokio::spawn(
                async move {
                    debug!("Connection accepted");
                    match session.run(stream).await {
                        Ok(()) => debug!("Connection closed"),
                        Err(error) => warn!(%error, "Session ended with error"),
                    }
                }
                .instrument(span),
            );
        }
    }
}
