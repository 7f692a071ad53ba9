//! Network SSO node
//!
//! Serves every site of a multi-domain network from one process and signs
//! users in across domains with the nonce/assertion handshake.
//!
//! `network-sso hash-password <password>` prints a credential hash for the
//! `users` section of the configuration file.

mod config;
mod credentials;
mod error;
mod logging;
mod routes;
mod state;

use config::NodeConfig;
use credentials::CredentialHasher;
use routes::app_router;
use state::AppState;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::info;

/// Interval between sweeps of expired nonces and sessions.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    let mut args = std::env::args().skip(1);
    if args.next().as_deref() == Some("hash-password") {
        hash_password(args.next());
        return;
    }

    let config = match NodeConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.logging.level, &config.logging.format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        env = %config.app_env,
        sites = config.network.sites.len(),
        users = config.network.users.len(),
        "Starting network SSO node"
    );

    match config.validate_security_config() {
        Ok(warnings) => {
            for warning in &warnings {
                tracing::warn!(target: "security", "{}", warning);
            }
            if !warnings.is_empty() {
                tracing::warn!(
                    target: "security",
                    count = warnings.len(),
                    "Insecure configuration detected (allowed in {} mode)",
                    config.app_env
                );
            }
        }
        Err(errors) => {
            for error in &errors {
                tracing::error!(target: "security", "{}", error);
            }
            eprintln!(
                "FATAL: {} insecure setting(s) detected in production mode. \
                 Set a strong network secret or use APP_ENV=development.",
                errors.len()
            );
            std::process::exit(1);
        }
    }

    let state = AppState::from_config(&config, CredentialHasher::new());

    // Background cleanup of expired nonces and sessions
    {
        let sso = state.sso.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(CLEANUP_INTERVAL).await;
                match sso.nonces.cleanup_expired().await {
                    Ok(count) if count > 0 => {
                        tracing::debug!(deleted = count, "Cleaned up expired handshake nonces");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to clean up expired handshake nonces");
                    }
                }
                let sessions = sso.sessions.cleanup_expired().await;
                if sessions > 0 {
                    tracing::debug!(deleted = sessions, "Cleaned up expired sessions");
                }
            }
        });
    }

    let app = app_router(state);

    let addr: SocketAddr = match config.bind_addr().parse() {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("Invalid bind address '{}': {e}", config.bind_addr());
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to address {addr}: {e}");
            std::process::exit(1);
        }
    };

    info!(%addr, "Server listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

fn hash_password(password: Option<String>) {
    let Some(password) = password else {
        eprintln!("Usage: network-sso hash-password <password>");
        std::process::exit(2);
    };
    match CredentialHasher::new().hash(&password) {
        Ok(hash) => println!("{hash}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
