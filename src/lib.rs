pub mod attendance;
pub mod auth;
pub mod config;
pub mod directory;
pub mod err;
pub mod ledger;
pub mod models;
pub mod routes;
pub mod state;
pub mod stats;
pub mod store;
pub mod students;
pub mod validate;

use serde::Serialize;

use crate::err::{Error, Fine, Maybe, Nothing};

pub type Payload<T> = Result<Maybe<T>, Error>;

pub fn proceeds<V>(value: V) -> Payload<V>
where
    V: Serialize,
{
    Ok(Fine(value))
}

pub fn breaks<V>(err: Error) -> Payload<V>
where
    V: Serialize,
{
    Ok(Nothing(err))
}
