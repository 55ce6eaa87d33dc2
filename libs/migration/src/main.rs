//! Migration CLI for the directory schema.
//!
//! `cargo run -p migration -- up` applies pending migrations to `DATABASE_URL`;
//! `status`, `down` and `fresh` work as usual for SeaORM migrators.

use migration::Migrator;
use sea_orm_migration::cli;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
