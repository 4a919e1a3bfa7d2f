use tracing::info;

/// Log target used by `TracingLogger`
pub const LOG_TARGET: &str = "esbcenter";

/// Sink for outbound requests and inbound responses
///
/// The transport reports a failing logger with a warning and carries on; a
/// logger can never fail a request.
pub trait RequestLogger: Send + Sync {
    /// Record an outbound request
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - URL path
    /// * `query` - Raw query string, as sent
    /// * `body` - Request body
    fn log_request(&self, method: &str, path: &str, query: &str, body: &str) -> anyhow::Result<()>;

    /// Record an inbound response
    fn log_response(&self, status: u16, body: &str) -> anyhow::Result<()>;
}

/// Logger that writes to `tracing` at INFO on the `esbcenter` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl RequestLogger for TracingLogger {
    fn log_request(&self, method: &str, path: &str, query: &str, body: &str) -> anyhow::Result<()> {
        info!(
            target: LOG_TARGET,
            "Api:request Path:{} Query:{} Method:{} Body:{}", path, query, method, body
        );
        Ok(())
    }

    fn log_response(&self, status: u16, body: &str) -> anyhow::Result<()> {
        info!(target: LOG_TARGET, "Api:response Status:{} Body:{}", status, body);
        Ok(())
    }
}

/// Logger that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl RequestLogger for NoopLogger {
    fn log_request(&self, _: &str, _: &str, _: &str, _: &str) -> anyhow::Result<()> {
        Ok(())
    }

    fn log_response(&self, _: u16, _: &str) -> anyhow::Result<()> {
        Ok(())
    }
}
