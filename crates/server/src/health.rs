use axum::Json;

use api_types::health::Health;

pub async fn check() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}
