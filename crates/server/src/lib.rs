use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod balances;
mod expenses;
mod groups;
mod health;
mod memberships;
pub mod metrics;
mod server;
mod settlements;
mod splits;
mod users;

pub mod types {
    pub mod user {
        pub use api_types::user::{LoginQuery, User, UserRegister, UserUpdate};
    }

    pub mod group {
        pub use api_types::group::{Group, GroupNew, GroupUpdate};
    }

    pub mod membership {
        pub use api_types::membership::{Member, MemberNew};
    }

    pub mod expense {
        pub use api_types::expense::{
            Expense, ExpenseCreated, ExpenseDetail, ExpenseNew, ExpenseUpdate,
        };
    }

    pub mod split {
        pub use api_types::split::{Split, SplitNew, SplitShare, SplitUpdate};
    }

    pub mod settlement {
        pub use api_types::settlement::{GroupSettlements, Settlement, SettlementNew};
    }

    pub mod balance {
        pub use api_types::balance::{
            Direction, GroupBalanceEntry, GroupBalanceQuery, GroupBalances, UserBalance,
        };
    }
}

pub enum ServerError {
    Engine(EngineError),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_) | EngineError::InvalidInput(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let ServerError::Engine(err) = self;
        let (status, error) = (status_for_engine_error(&err), message_for_engine_error(err));

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::InvalidAmount("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let res = ServerError::from(EngineError::InvalidInput("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn store_failures_map_to_500() {
        let err = EngineError::Database(DbErr::Custom("disk full".to_string()));
        assert_eq!(message_for_engine_error(err), "internal server error");

        let err = EngineError::Database(DbErr::Custom("disk full".to_string()));
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
