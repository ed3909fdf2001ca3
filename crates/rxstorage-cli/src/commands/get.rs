//! Get command implementation.

use anyhow::{Context, Result};
use clap::Args;

use rxstorage_http::{ApiClient, Author, Category, Entity, Item, Location, PositionSchema};

use crate::cli::{ApiArgs, EntityKind};
use crate::output;
use crate::session::Connection;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Entity kind
    #[arg(value_enum)]
    pub entity: EntityKind,

    /// Entity id
    pub id: i64,
}

pub async fn run(args: GetArgs, api: &ApiArgs) -> Result<()> {
    let conn = Connection::open(api)?;
    let client = &conn.client;

    let result = match args.entity {
        EntityKind::Items => get::<Item>(client, args.id).await,
        EntityKind::Categories => get::<Category>(client, args.id).await,
        EntityKind::Locations => get::<Location>(client, args.id).await,
        EntityKind::Authors => get::<Author>(client, args.id).await,
        EntityKind::PositionSchemas => get::<PositionSchema>(client, args.id).await,
    };

    conn.finish(result).await
}

async fn get<E: Entity>(client: &ApiClient, id: i64) -> Result<()> {
    let entity: E = client
        .get::<E>(id)
        .await
        .with_context(|| format!("Failed to get {} {}", E::PATH, id))?;

    output::json_pretty(&entity)
}
