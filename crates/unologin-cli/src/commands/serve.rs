use std::net::SocketAddr;

use axum::routing::{any, post};
use axum::{Json, Router, middleware};
use clap::Args;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::info;
use unologin_api::LoginPayload;
use unologin_axum::{AuthContext, Unologin, logout_handler, parse_login, require_login};
use unologin_core::UnologinConfig;

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,
}

#[derive(Debug, Serialize)]
struct Me {
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<LoginPayload>,
}

/// Reference wiring: login callback outside the pipeline, `parse_login` on
/// everything else, `require_login` on `/me/*`.
pub fn build_app(uno: Unologin) -> Router {
    let protected = Router::new()
        .route("/me", any(whoami))
        .route("/me/{*rest}", any(whoami))
        .route_layer(middleware::from_fn_with_state(uno.clone(), require_login));

    Router::new()
        .merge(protected)
        .route("/logout", post(logout_handler))
        .fallback(whoami)
        .layer(middleware::from_fn_with_state(uno.clone(), parse_login))
        .merge(uno.login_routes())
        .with_state(uno)
}

async fn whoami(ctx: Option<AuthContext>) -> Json<Me> {
    Json(Me {
        user: ctx.map(|c| c.user),
    })
}

pub async fn cmd_serve(config: UnologinConfig, args: &ServeArgs) -> anyhow::Result<()> {
    let login_path = config.login_path.clone();
    let uno = Unologin::from_config(config)?;
    let app = build_app(uno);

    let listener = TcpListener::bind(args.bind)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {e}", args.bind))?;
    info!(addr = %args.bind, %login_path, "serving");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;
    Ok(())
}
