// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP client used to reach the log service.
//!
//! Built with rustls. With the `fips` feature the process must install a FIPS
//! crypto provider before the first logger is created, e.g.
//! `rustls::crypto::default_fips_provider().install_default()`, and the
//! client trusts the platform's native roots only.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};
#[cfg(feature = "fips")]
use tracing::debug;

use crate::error::ConfigError;

/// Builds the log service client. Every request, connect included, is bounded by `timeout`.
pub fn build_client(timeout: Duration) -> Result<Client, ConfigError> {
    tls_builder()?
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigError::Invalid(format!("failed to build log service client: {e}")))
}

#[cfg(not(feature = "fips"))]
fn tls_builder() -> Result<ClientBuilder, ConfigError> {
    Ok(Client::builder().use_rustls_tls())
}

#[cfg(feature = "fips")]
fn tls_builder() -> Result<ClientBuilder, ConfigError> {
    let provider = rustls::crypto::CryptoProvider::get_default()
        .filter(|provider| provider.fips())
        .ok_or_else(|| tls_error("no FIPS crypto provider installed"))?;

    let config = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_protocol_versions(rustls::ALL_VERSIONS)
        .map_err(|e| tls_error(&e.to_string()))?
        .with_root_certificates(native_roots()?)
        .with_no_client_auth();
    if !config.fips() {
        return Err(tls_error("client configuration is not FIPS-compliant"));
    }

    debug!("Log service client uses a FIPS crypto provider");
    Ok(Client::builder().use_preconfigured_tls(config))
}

#[cfg(feature = "fips")]
fn native_roots() -> Result<rustls::RootCertStore, ConfigError> {
    let mut roots = rustls::RootCertStore::empty();
    let (added, ignored) =
        roots.add_parsable_certificates(rustls_native_certs::load_native_certs().certs);
    if ignored > 0 {
        debug!("Ignored {ignored} unparsable native root certificates");
    }
    if added == 0 {
        return Err(tls_error("no usable native root certificates"));
    }
    Ok(roots)
}

#[cfg(feature = "fips")]
fn tls_error(reason: &str) -> ConfigError {
    ConfigError::Invalid(format!("log service TLS: {reason}"))
}
