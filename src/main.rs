use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use lottery_backend::{
    config::Config,
    database::{SeaOrmStore, create_pool, run_migrations},
    handlers,
    middlewares::create_cors,
    services::{DrawService, LotteryService},
    swagger::swagger_config,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 进程级未处理异常：记录后直接退出，由外部守护进程重启，避免带着未知状态继续服务
    std::panic::set_hook(Box::new(|info| {
        log::error!("Unrecoverable panic, aborting: {info}");
        std::process::abort();
    }));

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration");

    // 创建数据库连接池
    let pool = Arc::new(
        create_pool(&config.database)
            .await
            .expect("Failed to create database connection pool"),
    );

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // 创建服务
    let store = Arc::new(SeaOrmStore::new(pool.clone()));
    let draw_service = DrawService::new(store, config.lottery.clone());
    let lottery_service = LotteryService::new(pool.clone());

    log::info!(
        "Starting HTTP server at {}:{} (participant mode: {})",
        config.server.host,
        config.server.port,
        config.lottery.participant_mode
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .app_data(web::Data::new(draw_service.clone()))
            .app_data(web::Data::new(lottery_service.clone()))
            .configure(swagger_config)
            .configure(handlers::lottery_config)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    log::info!("HTTP server stopped, closing database pool");
    match Arc::try_unwrap(pool) {
        Ok(pool) => {
            if let Err(e) = pool.close().await {
                log::error!("Failed to close database pool: {e}");
            }
        }
        Err(_) => log::warn!("Database pool still shared at shutdown, leaving it to drop"),
    }
    Ok(())
}
