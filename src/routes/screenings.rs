use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::screenings::SeatMap, error::AppResult, response::ApiResponse,
    services::seat_service, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/seats", get(seat_map))
}

#[utoipa::path(
    get,
    path = "/api/screenings/{id}/seats",
    params(("id" = Uuid, Path, description = "Screening ID")),
    responses(
        (status = 200, description = "Reserved seats of the screening", body = ApiResponse<SeatMap>),
        (status = 404, description = "Screening not found")
    ),
    tag = "Screenings"
)]
pub async fn seat_map(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SeatMap>>> {
    let resp = seat_service::get_seat_map(&state, id).await?;
    Ok(Json(resp))
}
