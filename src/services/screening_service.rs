use sea_orm::{ConnectionTrait, EntityTrait, QuerySelect, sea_query::LockType};
use uuid::Uuid;

use crate::{
    entity::screenings::{Entity as Screenings, Model as ScreeningModel},
    error::{AppResult, BookingError},
};

pub async fn find_screening<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<ScreeningModel> {
    Screenings::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| BookingError::ScreeningNotFound.into())
}

/// Locks the screening row so that seat checks and inserts for the same
/// screening run one at a time.
pub async fn lock_screening<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<ScreeningModel> {
    Screenings::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or_else(|| BookingError::ScreeningNotFound.into())
}
