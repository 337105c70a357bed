use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 2,
        "code": "CBG_002",
        "name": "Klaten",
        "address": "Jl. Pemuda 12",
        "lat": -7.705,
        "lng": 110.606,
        "radius_meters": 200.0,
        "is_active": true
    })
)]
pub struct Branch {
    pub id: u64,
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub lat: f64,
    pub lng: f64,
    /// Allowed punch radius around (`lat`, `lng`); always > 0
    pub radius_meters: f64,
    pub is_active: bool,
}
