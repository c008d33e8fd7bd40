use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use std::sync::Arc;

use crate::{
    balances, expenses, groups, health, memberships,
    metrics::{self, MetricsSink},
    settlements, splits, users,
};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub metrics: Arc<dyn MetricsSink>,
}

impl ServerState {
    pub fn new(engine: Engine, metrics: Arc<dyn MetricsSink>) -> Self {
        Self {
            engine: Arc::new(engine),
            metrics,
        }
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health::check))
        .route("/metrics", get(metrics::export))
        .route("/api/users/register", post(users::register))
        .route("/api/users/login", get(users::login))
        .route("/api/users", get(users::list))
        .route(
            "/api/users/{id}",
            get(users::get).put(users::update).delete(users::delete),
        )
        .route("/api/groups", post(groups::create).get(groups::list))
        .route(
            "/api/groups/{id}",
            get(groups::get).put(groups::update).delete(groups::delete),
        )
        .route("/api/groups/user/{user_id}", get(groups::list_for_user))
        .route("/api/members", post(memberships::add))
        .route(
            "/api/members/{group_id}/{user_id}",
            axum::routing::delete(memberships::remove),
        )
        .route("/api/members/group/{group_id}", get(memberships::list))
        .route("/api/expenses", post(expenses::create))
        .route(
            "/api/expenses/{id}",
            get(expenses::get)
                .put(expenses::update)
                .delete(expenses::delete),
        )
        .route("/api/expenses/group/{group_id}", get(expenses::list_for_group))
        .route("/api/expenses/user/{user_id}", get(expenses::list_for_user))
        .route("/api/splits", post(splits::create))
        .route("/api/splits/{id}", put(splits::update))
        .route("/api/splits/expense/{expense_id}", get(splits::list_for_expense))
        .route("/api/splits/user/{user_id}", get(splits::list_for_user))
        .route(
            "/api/balance/user/{user_id}/group/{group_id}",
            get(balances::user_balance),
        )
        .route("/api/balance/group/{group_id}", get(balances::group_balances))
        .route("/api/settle", post(settlements::create).get(settlements::list))
        .route("/api/settle/{id}", get(settlements::get))
        .route(
            "/api/settle/group/{group_id}",
            get(settlements::list_for_group),
        )
        .route("/api/settle/user/{user_id}", get(settlements::list_for_user))
        .layer(middleware::from_fn_with_state(state.clone(), metrics::track))
        .with_state(state)
}

pub async fn run(state: ServerState, addr: &str) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(state, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
