pub mod access;
pub mod app;
pub mod assignments;
pub mod auth;
pub mod comments;
pub mod config;
pub mod err;
pub mod events;
pub mod models;
pub mod notices;
pub mod store;
pub mod users;

use axum::Json;
use serde::Serialize;

use crate::err::Error;

pub type Payload<T> = Result<Json<T>, Error>;

pub fn proceeds<V>(value: V) -> Payload<V>
where
    V: Serialize,
{
    Ok(Json(value))
}

pub fn breaks<V>(err: Error) -> Payload<V>
where
    V: Serialize,
{
    Err(err)
}
