#![warn(clippy::all)]

use std::io;

use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use log::info;

use db::{build_pool, run_migrations, SqliteConcordance, SqliteConnectionPool};

use crate::config::Config;
use crate::controllers::api;

/// Represents the [server data](actix_web.web.Data.html) for the application.
pub struct ServerData {
    pub db: SqliteConnectionPool,
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();

    // Set up logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Get env configuration
    let config = Config::from_env().map_err(io::Error::other)?;

    let pool = build_pool(&config.database_url, config.pool_size).map_err(io::Error::other)?;

    // Create the tables if this is a new SQLite database
    {
        let mut conn = pool.get().map_err(io::Error::other)?;
        run_migrations(&mut conn).map_err(io::Error::other)?;
    }

    info!(
        "Serving {} on {}:{}",
        config.database_url, config.host, config.port
    );

    let data = web::Data::new(ServerData { db: pool });
    let server_data = data.clone();

    HttpServer::new(move || {
        // Wire up the application
        App::new()
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .app_data(server_data.clone())
            .configure(controllers::routes::<SqliteConcordance>)
            .default_service(web::route().to(api::not_found))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    // Last handle to the pool; dropping it closes every connection
    drop(data);
    info!("Server stopped");

    Ok(())
}

mod config;
mod controllers;
mod error;
#[cfg(test)]
mod test;
