use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

use sams::attendance::mailer::{HttpMailer, Mailer};
use sams::attendance::roster::{Roster, SqlRoster};
use sams::attendance::store::{RecordStore, SqlRecordStore};
use sams::attendance::{AbsenceNotifier, Reconciler};
use sams::config::Config;
use sams::db::init_db;
use sams::docs::ApiDoc;
use sams::routes;
use sams::utils::username_cache;
use sams::utils::username_filter;

use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "School Attendance Management System"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
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

    info!("Server starting...");

    let pool = init_db(&config.database_url).await;

    let pool_for_filter_warmup = pool.clone();
    let pool_for_cache_warmup = pool.clone();

    actix_web::rt::spawn(async move {
        if let Err(e) = username_filter::warmup_username_filter(&pool_for_filter_warmup, 100).await
        {
            eprintln!("Failed to warmup username filter: {:?}", e);
        }
    });

    actix_web::rt::spawn(async move {
        // Warm up last 30 days of recent users in batches of 250
        if let Err(e) = username_cache::warmup_username_cache(&pool_for_cache_warmup, 30, 250).await
        {
            eprintln!("Failed to warmup username cache: {:?}", e);
        }
    });

    // Attendance core: SQL collaborators behind their trait seams
    let store: Arc<dyn RecordStore> = Arc::new(SqlRecordStore::new(pool.clone()));
    let roster: Arc<dyn Roster> = Arc::new(SqlRoster::new(pool.clone()));
    let mailer: Arc<dyn Mailer> = Arc::new(HttpMailer::new(
        config.mail_api_url.clone(),
        config.mail_api_token.clone(),
        config.mail_from.clone(),
    ));

    let reconciler = Data::new(Reconciler::new(Arc::clone(&store), Arc::clone(&roster)));
    let notifier = Data::new(AbsenceNotifier::new(store, roster, Arc::clone(&mailer)));
    let mailer_data: Data<dyn Mailer> = Data::from(mailer);

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(reconciler.clone())
            .app_data(notifier.clone())
            .app_data(mailer_data.clone())
            .service(index)
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
