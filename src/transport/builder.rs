//! Builder for [`EnvelopeTransport`].
//!
//! Exposes identification, timeouts, engine sizing and flush polling. Values
//! left unset fall back to [`TransportConfig::default`].

use std::{sync::Arc, time::Duration};

use crate::error::BuildError;

use super::{
    config::TransportConfig,
    engine::HttpEngine,
    hooks::TransportHooks,
    lifecycle::EnvelopeTransport,
    ureq_engine::UreqEngine,
};

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(BuildError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

/// Builder for constructing [`EnvelopeTransport`] instances.
#[derive(Clone, Debug, Default)]
pub struct TransportBuilder {
    user_agent: Option<String>,
    client_name: Option<String>,
    poll_interval_ms: Option<u64>,
    capacity: Option<usize>,
    workers: Option<usize>,
    connect_timeout_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    warn_interval_ms: Option<u64>,
    accept_invalid_certs: bool,
}

impl TransportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `User-Agent` identifying the embedding application.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the client identifier placed in the auth header.
    pub fn with_client_name(mut self, client_name: impl Into<String>) -> Self {
        self.client_name = Some(client_name.into());
        self
    }

    option_setter!(
        #[doc = "Set the flush polling interval in milliseconds."]
        with_poll_interval_ms,
        poll_interval_ms,
        u64
    );
    option_setter!(
        #[doc = "Set the engine queue capacity."]
        with_capacity,
        capacity,
        usize
    );
    option_setter!(
        #[doc = "Set the number of engine worker threads."]
        with_workers,
        workers,
        usize
    );
    option_setter!(
        #[doc = "Set the connect timeout in milliseconds."]
        with_connect_timeout_ms,
        connect_timeout_ms,
        u64
    );
    option_setter!(
        #[doc = "Set the per-request timeout in milliseconds."]
        with_request_timeout_ms,
        request_timeout_ms,
        u64
    );
    option_setter!(
        #[doc = "Set the interval between loss warnings in milliseconds."]
        with_warn_interval_ms,
        warn_interval_ms,
        u64
    );

    /// Skip TLS certificate and hostname validation.
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    fn validate(&self) -> Result<(), BuildError> {
        self.validate_identity()?;
        self.validate_sizes()?;
        self.validate_timeouts()?;
        Ok(())
    }

    fn validate_identity(&self) -> Result<(), BuildError> {
        for (field, value) in [
            ("user_agent", &self.user_agent),
            ("client_name", &self.client_name),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(BuildError::InvalidConfig(format!(
                    "{field} must not be empty"
                )));
            }
        }
        Ok(())
    }

    fn validate_sizes(&self) -> Result<(), BuildError> {
        if let Some(capacity) = self.capacity {
            ensure_positive!(capacity, "capacity")?;
        }
        if let Some(workers) = self.workers {
            ensure_positive!(workers, "workers")?;
        }
        Ok(())
    }

    fn validate_timeouts(&self) -> Result<(), BuildError> {
        if let Some(interval) = self.poll_interval_ms {
            ensure_positive!(interval, "poll_interval_ms")?;
        }
        if let Some(timeout) = self.connect_timeout_ms {
            ensure_positive!(timeout, "connect_timeout_ms")?;
        }
        if let Some(timeout) = self.request_timeout_ms {
            ensure_positive!(timeout, "request_timeout_ms")?;
        }
        Ok(())
    }

    /// Validate the builder and produce the resulting configuration.
    pub fn build_config(&self) -> Result<TransportConfig, BuildError> {
        self.validate()?;

        let defaults = TransportConfig::default();
        Ok(TransportConfig {
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            client_name: self.client_name.clone().unwrap_or(defaults.client_name),
            poll_interval: self
                .poll_interval_ms
                .map_or(defaults.poll_interval, Duration::from_millis),
            capacity: self.capacity.unwrap_or(defaults.capacity),
            workers: self.workers.unwrap_or(defaults.workers),
            connect_timeout: self
                .connect_timeout_ms
                .map_or(defaults.connect_timeout, Duration::from_millis),
            request_timeout: self
                .request_timeout_ms
                .map_or(defaults.request_timeout, Duration::from_millis),
            warn_interval: self
                .warn_interval_ms
                .map_or(defaults.warn_interval, Duration::from_millis),
            accept_invalid_certs: self.accept_invalid_certs,
        })
    }

    /// Build a transport delivering through the ureq engine.
    pub fn build(&self) -> Result<Arc<EnvelopeTransport>, BuildError> {
        let config = self.build_config()?;
        let engine = UreqEngine::with_config(&config)?;
        Ok(EnvelopeTransport::new(config, Arc::new(engine)))
    }

    /// Build a transport delivering through `engine`.
    pub fn build_with_engine(
        &self,
        engine: Arc<dyn HttpEngine>,
    ) -> Result<Arc<EnvelopeTransport>, BuildError> {
        let config = self.build_config()?;
        Ok(EnvelopeTransport::new(config, engine))
    }

    /// Build a ureq-backed transport and return only its callback table.
    ///
    /// The transport stays alive through its self-reference until
    /// [`TransportHooks::on_free`].
    pub fn build_hooks(&self) -> Result<TransportHooks, BuildError> {
        Ok(self.build()?.hooks())
    }
}
