//! Prints the live structure of the onboarding table, plus row counts per
//! wizard step.

use anyhow::Context;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;

const TABLE: &str = "onboarding_applications";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;

    let columns: Vec<(String, String, String, Option<String>)> = sqlx::query_as(
        "SELECT column_name, data_type, is_nullable, column_default
         FROM information_schema.columns
         WHERE table_schema = 'public' AND table_name = $1
         ORDER BY ordinal_position",
    )
    .bind(TABLE)
    .fetch_all(&pool)
    .await?;

    if columns.is_empty() {
        println!("Table '{}' not found. Start the server with RUN_MIGRATIONS=true to create it.", TABLE);
        return Ok(());
    }

    println!("{} ({} columns):", TABLE, columns.len());
    for (name, data_type, nullable, default) in columns {
        let null = if nullable == "YES" { "" } else { " NOT NULL" };
        match default {
            Some(d) => println!("  - {}: {}{} DEFAULT {}", name, data_type, null, d),
            None => println!("  - {}: {}{}", name, data_type, null),
        }
    }

    let progress: Vec<(i32, i64)> = sqlx::query_as(
        "SELECT step_completed, COUNT(*) FROM onboarding_applications
         GROUP BY step_completed ORDER BY step_completed",
    )
    .fetch_all(&pool)
    .await?;

    println!();
    println!("Applications by step completed:");
    for (step, count) in progress {
        println!("  - step {}: {}", step, count);
    }

    pool.close().await;
    Ok(())
}
