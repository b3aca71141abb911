//! Service banner and liveness handlers

use axum::Json;
use serde_json::{json, Value};

/// GET / - banner with an endpoint directory for people poking at the API
pub async fn index() -> Json<Value> {
    Json(json!({
        "status": "running",
        "message": "Thesis review API server is running",
        "endpoints": {
            "test": "/api/test",
            "register": "/api/register",
            "login": "/api/login",
            "thesis": "/api/thesis",
            "stats": "/api/stats",
        }
    }))
}

/// GET /api/test - liveness check
pub async fn test() -> Json<Value> {
    Json(json!({ "message": "API is working!" }))
}
