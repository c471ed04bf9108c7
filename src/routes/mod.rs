//! Route composition.
//!
//! ```text
//! GET  /             → probes::index
//! GET  /health       → probes::health
//! GET  /ready        → probes::ready
//! *    /pancard/*    → RouteGroups::pancard      (KYC)
//! *    /bankaccount/* → RouteGroups::bank_account (bank account verification)
//! *    anything else → 404
//! ```
//!
//! The two groups are owned elsewhere. By default each one forwards to the
//! upstream named in `[upstreams]`; embedders and tests can mount any
//! `Router` instead.

pub mod probes;
pub mod upstream;

use std::time::Duration;

use axum::extract::Request;
use axum::http::Uri;
use axum::routing::get;
use axum::Router;
use tower::ServiceExt;

use crate::config::GatewayConfig;
use crate::http::server::AppState;

pub const PANCARD_PREFIX: &str = "/pancard";
pub const BANK_ACCOUNT_PREFIX: &str = "/bankaccount";

/// The collaborator routers mounted under their prefixes.
pub struct RouteGroups {
    pub pancard: Router,
    pub bank_account: Router,
}

impl RouteGroups {
    pub fn new(pancard: Router, bank_account: Router) -> Self {
        Self {
            pancard,
            bank_account,
        }
    }

    /// Forward each group to its configured upstream.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let timeout = Duration::from_secs(config.timeouts.upstream_secs);
        let client = upstream::http_client(timeout);
        Self {
            pancard: upstream::forwarding_router(
                "pancard verification",
                PANCARD_PREFIX,
                config.upstreams.pancard.as_deref(),
                client.clone(),
                timeout,
            ),
            bank_account: upstream::forwarding_router(
                "bank account verification",
                BANK_ACCOUNT_PREFIX,
                config.upstreams.bank_account.as_deref(),
                client,
                timeout,
            ),
        }
    }
}

/// All routes, without middleware.
pub fn routes(state: AppState, groups: RouteGroups) -> Router {
    let router = Router::new()
        .route("/", get(probes::index))
        .route("/health", get(probes::health))
        .route("/ready", get(probes::ready))
        .with_state(state);
    let router = mount(router, PANCARD_PREFIX, groups.pancard);
    mount(router, BANK_ACCOUNT_PREFIX, groups.bank_account).fallback(probes::not_found)
}

/// Nest `group` under `prefix`.
///
/// `nest` covers `/prefix` and `/prefix/{*rest}` but a catch-all never
/// matches an empty tail, so `/prefix/` is routed to the group's root here.
fn mount(router: Router, prefix: &'static str, group: Router) -> Router {
    let root = group.clone().map_request(to_group_root);
    router
        .nest(prefix, group)
        .route_service(&format!("{}/", prefix), root)
}

fn to_group_root(mut request: Request) -> Request {
    let root = match request.uri().query() {
        Some(query) => format!("/?{}", query),
        None => "/".to_string(),
    };
    if let Ok(uri) = root.parse::<Uri>() {
        *request.uri_mut() = uri;
    }
    request
}
