use crate::error::AppError;
use crate::models::*;
use crate::services::{DrawService, LotteryService};
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/lottery/draw",
    tag = "lottery",
    request_body(content = DrawRequest, description = "参与者名称，可省略整个请求体"),
    responses(
        (status = 200, description = "抽奖成功", body = DrawResponse),
        (status = 400, description = "没有可抽的奖品或参数错误", body = ApiError),
        (status = 500, description = "抽奖事务失败，已回滚", body = ApiError),
        (status = 503, description = "数据库连接池耗尽", body = ApiError)
    )
)]
/// 进行一次抽奖:
/// 1. 锁定有库存的奖品
/// 2. 按权重随机选择
/// 3. 写记录并扣减库存，失败整体回滚
pub async fn draw(
    service: web::Data<DrawService>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let name = match parse_draw_request(&body) {
        Ok(name) => name,
        Err(e) => return Ok(e.error_response()),
    };
    match service.draw(name).await {
        Ok(result) => Ok(HttpResponse::Ok().json(result)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/lottery/prizes",
    tag = "lottery",
    responses(
        (status = 200, description = "获取奖品列表成功", body = [PrizeResponse])
    )
)]
/// 获取全部奖品（含剩余库存与权重）
pub async fn get_prizes(service: web::Data<LotteryService>) -> Result<HttpResponse> {
    match service.list_prizes().await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/lottery/records",
    tag = "lottery",
    params(
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)"),
        ("participant_id" = Option<i64>, Query, description = "参与者ID")
    ),
    responses(
        (status = 200, description = "获取抽奖记录成功")
    )
)]
/// 分页获取抽奖记录（倒序）
pub async fn get_records(
    service: web::Data<LotteryService>,
    query: web::Query<DrawRecordQuery>,
) -> Result<HttpResponse> {
    match service.list_records(&query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

// 空请求体视为匿名抽奖；非空但无法解析的请求体一律 400
fn parse_draw_request(body: &[u8]) -> Result<Option<String>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice::<DrawRequest>(body)
        .map(|req| req.name)
        .map_err(|e| AppError::InvalidInput(format!("请求体格式错误: {e}")))
}

/// 路由配置
pub fn lottery_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/lottery")
            .route("/draw", web::post().to(draw))
            .route("/prizes", web::get().to(get_prizes))
            .route("/records", web::get().to(get_records)),
    );
}
