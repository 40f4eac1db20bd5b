use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};

use attendance::config::Config;
use attendance::db::init_db;
use attendance::docs::ApiDoc;
use attendance::routes;
use attendance::store::{MemoryStore, MySqlStore, Store};

use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance service is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "attendance.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(addr = %config.server_addr, "Server starting...");

    let store = match &config.database_url {
        Some(url) => Store::MySql(MySqlStore::new(init_db(url).await?)),
        None => {
            warn!("DATABASE_URL not set, records are kept in memory only");
            Store::Memory(MemoryStore::new())
        }
    };

    let store = Data::new(store);
    let config_data = Data::new(config.clone());
    let limiter = routes::build_limiter(config.rate_per_min)?;
    let api_prefix = config.api_prefix.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard matches JS/CSS assets
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(store.clone())
            .app_data(config_data.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &api_prefix, limiter.clone()))
    })
    .bind(&config.server_addr)?
    .run()
    .await?;

    Ok(())
}
