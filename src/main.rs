//! SirenEye triage service: binary entrypoint.
//! Boots the Axum HTTP server, wiring config, collaborators, and middleware.

use shuttle_axum::ShuttleAxum;

use sireneye::{api, bootstrap::AppRuntime, metrics::Metrics, telemetry};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    telemetry::init_tracing();

    let rt = AppRuntime::from_default_config()
        .map_err(|e| shuttle_runtime::Error::Custom(e.context("building app runtime")))?;

    if std::env::var("SIRENEYE_QUICK_PROBE").is_ok_and(|v| v == "1") {
        rt.quick_probe().await;
    }

    let mut router = api::router(rt.state);
    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = %e, "prometheus recorder not installed; /metrics disabled"),
    }

    Ok(router.into())
}
