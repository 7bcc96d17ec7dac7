use std::sync::Arc;

use crate::api::RelayResponse;
use crate::config::ServerConfig;
use actix_web::{
    App, HttpResponse, HttpServer, Responder, error::InternalError, get, http::StatusCode, post,
    web,
};
use anyhow::Context;
use jpush::{JPushClient, JPushError, PushRequest, PushService, SetTagsAndAlias};
use log::*;
use serde::Serialize;

mod api;
mod config;

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().body("OK")
}

#[post("/push")]
async fn push(req: web::Json<PushRequest>, service: web::Data<dyn PushService>) -> HttpResponse {
    info!("Received push request for platform: {:?}", req.platform);
    respond(service.push(&req).await)
}

#[post("/push/validate")]
async fn validate(
    req: web::Json<PushRequest>,
    service: web::Data<dyn PushService>,
) -> HttpResponse {
    info!("Received validate request for platform: {:?}", req.platform);
    respond(service.validate(&req).await)
}

#[get("/devices/{registration_id}")]
async fn get_device(
    registration_id: web::Path<String>,
    service: web::Data<dyn PushService>,
) -> HttpResponse {
    respond(service.tags_and_alias(&registration_id).await)
}

#[post("/devices/{registration_id}")]
async fn set_device(
    registration_id: web::Path<String>,
    params: web::Json<SetTagsAndAlias>,
    service: web::Data<dyn PushService>,
) -> HttpResponse {
    let mut params = params.into_inner();
    params.registration_id = registration_id.into_inner();
    info!("Updating tags and alias for device {}", params.registration_id);
    respond(service.set_tags_and_alias(&params).await)
}

fn respond<T: Serialize>(result: jpush::Result<T>) -> HttpResponse {
    match result {
        Ok(data) => HttpResponse::Ok().json(RelayResponse::ok(data)),
        Err(e) => {
            error!("JPush call failed: {}", e);
            HttpResponse::build(error_status(&e)).json(RelayResponse::<()>::err(e.to_string()))
        }
    }
}

fn error_status(err: &JPushError) -> StatusCode {
    match err {
        JPushError::InvalidAudience(_)
        | JPushError::InvalidArgument(_)
        | JPushError::Serialization(_) => StatusCode::BAD_REQUEST,
        JPushError::Transport(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
        JPushError::Transport(_) | JPushError::Delivery { .. } | JPushError::Deserialization(_) => {
            StatusCode::BAD_GATEWAY
        }
        JPushError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// 请求体解析失败时同样返回 `RelayResponse`
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        warn!("Rejected request body: {}", message);
        InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(RelayResponse::<()>::err(message)),
        )
        .into()
    })
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(health)
        .service(validate)
        .service(push)
        .service(get_device)
        .service(set_device);
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // .env 可能包含 RUST_LOG，必须先于日志初始化加载
    let dotenv = dotenvy::dotenv();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    if let Ok(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    let config = ServerConfig::from_env()?;
    let client = JPushClient::new(config.jpush).context("failed to create JPush client")?;
    info!("JPush client ready for app key {}", client.app_key());

    let service: Arc<dyn PushService> = Arc::new(client);
    let service_data = web::Data::from(service);

    info!("Listening on {}", config.bind_addr);
    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(service_data.clone())
            .configure(routes)
    })
    .bind(&config.bind_addr)?
    .run()
    .await?;

    Ok(())
}
