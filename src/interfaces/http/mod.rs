use std::sync::Arc;

use actix_cors::Cors;
use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{
    delete, dev::Server, get, post, put, web, App, HttpResponse, HttpServer, Responder,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use validator::Validate;

use crate::application::use_cases::scrub_file::SourceFile;
use crate::domain::account::{Account, Subscription};
use crate::domain::error::{AppError, Result};
use crate::domain::scrub_options::{ScrubOptions, ScrubOptionsPatch};
use crate::domain::stats::{FreeScrubStats, ScrubStats};
use crate::domain::store::GLOBAL_LIST_ID;
use crate::domain::suppression::ComplianceList;
use crate::infrastructure::bootstrap::AppState;
use crate::infrastructure::workbook::OutputFormat;

pub struct HttpState {
    pub app: Arc<AppState>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FreeScrubRequest {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    #[validate(length(min = 1))]
    pub file_base64: String,
    #[serde(default)]
    pub output_format: OutputFormat,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AccountScrubRequest {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    #[validate(length(min = 1))]
    pub file_base64: String,
    /// Overrides the account's stored options for this job only.
    #[serde(default)]
    pub options: Option<ScrubOptions>,
    #[serde(default)]
    pub output_format: OutputFormat,
}

#[derive(Debug, Serialize)]
pub struct ScrubResponse {
    pub file_name: String,
    pub file_base64: String,
    pub mime_type: &'static str,
    pub column: String,
    pub stats: ScrubStats,
    pub credits_remaining: f64,
}

#[derive(Debug, Serialize)]
pub struct FreeScrubResponse {
    pub file_name: String,
    pub file_base64: String,
    pub mime_type: &'static str,
    pub stats: FreeScrubStats,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreditsRequest {
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionRequest {
    /// `null` detaches the subscription.
    pub subscription: Option<Subscription>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NumbersRequest {
    #[validate(length(min = 1, max = 10000))]
    pub numbers: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FileUploadRequest {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    #[validate(length(min = 1))]
    pub file_base64: String,
    #[serde(default)]
    pub replace: bool,
}

#[derive(Debug, Serialize)]
pub struct RemovedResponse {
    pub removed: u64,
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[post("/scrub/free")]
async fn scrub_free(data: web::Data<HttpState>, req: web::Json<FreeScrubRequest>) -> HttpResponse {
    let result = async {
        validate(&*req)?;
        let file = decode_upload(&data, &req.file_name, &req.file_base64)?;
        data.app.scrub_file.scrub_free(&file, req.output_format).await
    }
    .await;

    match result {
        Ok(report) => HttpResponse::Ok().json(FreeScrubResponse {
            file_name: report.file_name,
            file_base64: STANDARD.encode(&report.bytes),
            mime_type: report.mime_type,
            stats: report.stats,
        }),
        Err(e) => error_response(&e),
    }
}

#[post("/accounts")]
async fn create_account(
    data: web::Data<HttpState>,
    req: web::Json<CreateAccountRequest>,
) -> HttpResponse {
    let result = async {
        validate(&*req)?;
        data.app.accounts.create(&req.name).await
    }
    .await;
    respond_with(result, StatusCode::CREATED)
}

#[get("/accounts/{id}")]
async fn get_account(data: web::Data<HttpState>, path: web::Path<String>) -> HttpResponse {
    respond(data.app.accounts.get(&path).await)
}

#[post("/accounts/{id}/credits")]
async fn grant_credits(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    req: web::Json<CreditsRequest>,
) -> HttpResponse {
    respond(data.app.accounts.grant_credits(&path, req.amount).await)
}

#[put("/accounts/{id}/subscription")]
async fn set_subscription(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    req: web::Json<SubscriptionRequest>,
) -> HttpResponse {
    let req = req.into_inner();
    respond::<Account>(
        data.app
            .accounts
            .set_subscription(&path, req.subscription)
            .await,
    )
}

#[post("/accounts/{id}/scrub")]
async fn scrub_for_account(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    req: web::Json<AccountScrubRequest>,
) -> HttpResponse {
    let account_id = path.into_inner();
    let result = async {
        validate(&*req)?;
        let file = decode_upload(&data, &req.file_name, &req.file_base64)?;
        data.app
            .scrub_file
            .scrub_for_account(&account_id, &file, req.options, req.output_format)
            .await
    }
    .await;

    match result {
        Ok(result) => HttpResponse::Ok().json(ScrubResponse {
            file_name: result.report.file_name,
            file_base64: STANDARD.encode(&result.report.bytes),
            mime_type: result.report.mime_type,
            column: result.report.column,
            stats: result.report.stats,
            credits_remaining: result.account.credits,
        }),
        Err(e) => error_response(&e),
    }
}

#[get("/accounts/{id}/scrub-options")]
async fn get_scrub_options(data: web::Data<HttpState>, path: web::Path<String>) -> HttpResponse {
    respond(data.app.scrub_options.get(&path).await)
}

#[put("/accounts/{id}/scrub-options")]
async fn update_scrub_options(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    req: web::Json<ScrubOptionsPatch>,
) -> HttpResponse {
    respond(data.app.scrub_options.update(&path, &req).await)
}

#[get("/accounts/{id}/suppression")]
async fn list_suppression(data: web::Data<HttpState>, path: web::Path<String>) -> HttpResponse {
    list_numbers(&data, Some(path.as_str())).await
}

#[post("/accounts/{id}/suppression")]
async fn add_suppression(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    req: web::Json<NumbersRequest>,
) -> HttpResponse {
    add_numbers(&data, Some(path.as_str()), &req).await
}

#[delete("/accounts/{id}/suppression")]
async fn remove_suppression(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    req: web::Json<NumbersRequest>,
) -> HttpResponse {
    remove_numbers(&data, Some(path.as_str()), &req).await
}

#[delete("/accounts/{id}/suppression/all")]
async fn clear_suppression(data: web::Data<HttpState>, path: web::Path<String>) -> HttpResponse {
    clear_list(&data, Some(path.as_str())).await
}

#[post("/accounts/{id}/suppression/upload")]
async fn upload_suppression(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    req: web::Json<FileUploadRequest>,
) -> HttpResponse {
    upload_to_list(&data, Some(path.as_str()), &req).await
}

#[get("/accounts/{id}/suppression/files")]
async fn list_uploaded_files(data: web::Data<HttpState>, path: web::Path<String>) -> HttpResponse {
    uploaded_files(&data, Some(path.as_str())).await
}

#[delete("/accounts/{id}/suppression/files/{file_id}")]
async fn remove_uploaded_file(
    data: web::Data<HttpState>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (account_id, file_id) = path.into_inner();
    remove_file(&data, Some(account_id.as_str()), &file_id).await
}

#[get("/suppression/global")]
async fn list_global(data: web::Data<HttpState>) -> HttpResponse {
    list_numbers(&data, None).await
}

#[post("/suppression/global")]
async fn add_global(data: web::Data<HttpState>, req: web::Json<NumbersRequest>) -> HttpResponse {
    add_numbers(&data, None, &req).await
}

#[delete("/suppression/global")]
async fn remove_global(data: web::Data<HttpState>, req: web::Json<NumbersRequest>) -> HttpResponse {
    remove_numbers(&data, None, &req).await
}

#[delete("/suppression/global/all")]
async fn clear_global(data: web::Data<HttpState>) -> HttpResponse {
    clear_list(&data, None).await
}

#[post("/suppression/global/upload")]
async fn upload_global(
    data: web::Data<HttpState>,
    req: web::Json<FileUploadRequest>,
) -> HttpResponse {
    upload_to_list(&data, None, &req).await
}

#[get("/suppression/global/files")]
async fn list_global_files(data: web::Data<HttpState>) -> HttpResponse {
    uploaded_files(&data, None).await
}

#[delete("/suppression/global/files/{file_id}")]
async fn remove_global_file(data: web::Data<HttpState>, path: web::Path<String>) -> HttpResponse {
    remove_file(&data, None, &path).await
}

/// The list behind a suppression route: an existing account's own list,
/// or the shared list the free scrub reads.
async fn resolve_list(data: &HttpState, account_id: Option<&str>) -> Result<String> {
    match account_id {
        Some(id) => Ok(data.app.accounts.get(id).await?.id),
        None => Ok(GLOBAL_LIST_ID.to_string()),
    }
}

async fn list_numbers(data: &HttpState, account_id: Option<&str>) -> HttpResponse {
    let result = async {
        let list_id = resolve_list(data, account_id).await?;
        data.app.suppression.list(&list_id).await
    }
    .await;
    respond(result)
}

async fn add_numbers(
    data: &HttpState,
    account_id: Option<&str>,
    req: &NumbersRequest,
) -> HttpResponse {
    let result = async {
        validate(req)?;
        let list_id = resolve_list(data, account_id).await?;
        data.app.suppression.add_numbers(&list_id, &req.numbers).await
    }
    .await;
    respond(result)
}

async fn remove_numbers(
    data: &HttpState,
    account_id: Option<&str>,
    req: &NumbersRequest,
) -> HttpResponse {
    let result = async {
        validate(req)?;
        let list_id = resolve_list(data, account_id).await?;
        let removed = data
            .app
            .suppression
            .remove_numbers(&list_id, &req.numbers)
            .await?;
        Ok::<_, AppError>(RemovedResponse { removed })
    }
    .await;
    respond(result)
}

async fn clear_list(data: &HttpState, account_id: Option<&str>) -> HttpResponse {
    let result = async {
        let list_id = resolve_list(data, account_id).await?;
        let removed = data.app.suppression.clear(&list_id).await?;
        Ok::<_, AppError>(RemovedResponse { removed })
    }
    .await;
    respond(result)
}

async fn upload_to_list(
    data: &HttpState,
    account_id: Option<&str>,
    req: &FileUploadRequest,
) -> HttpResponse {
    let result = async {
        validate(req)?;
        let list_id = resolve_list(data, account_id).await?;
        let file = decode_upload(data, &req.file_name, &req.file_base64)?;
        data.app
            .suppression
            .upload_file(&list_id, &file.name, &file.bytes)
            .await
    }
    .await;
    respond(result)
}

async fn uploaded_files(data: &HttpState, account_id: Option<&str>) -> HttpResponse {
    let result = async {
        let list_id = resolve_list(data, account_id).await?;
        data.app.suppression.uploaded_files(&list_id).await
    }
    .await;
    respond(result)
}

async fn remove_file(data: &HttpState, account_id: Option<&str>, file_id: &str) -> HttpResponse {
    let result = async {
        let list_id = resolve_list(data, account_id).await?;
        let removed = data.app.suppression.remove_file(&list_id, file_id).await?;
        Ok::<_, AppError>(RemovedResponse { removed })
    }
    .await;
    respond(result)
}

#[post("/compliance/{source}/upload")]
async fn upload_compliance(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    req: web::Json<FileUploadRequest>,
) -> HttpResponse {
    let result = async {
        validate(&*req)?;
        let list: ComplianceList = path.parse()?;
        let file = decode_upload(&data, &req.file_name, &req.file_base64)?;
        data.app
            .compliance
            .upload_file(list, &file.name, &file.bytes, req.replace)
            .await
    }
    .await;
    respond(result)
}

/// JSON extractor settings. Unreadable bodies get the same error shape as
/// every other rejected request.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            let response =
                error_response(&AppError::InvalidInput(format!("Invalid JSON body: {}", err)));
            InternalError::from_response(err, response).into()
        })
}

fn validate(req: &impl Validate) -> Result<()> {
    req.validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))
}

/// Decode a base64 payload, enforcing the configured size limit on both
/// the encoded and the decoded form.
fn decode_upload(data: &HttpState, file_name: &str, file_base64: &str) -> Result<SourceFile> {
    let limit = data.app.config.max_upload_bytes;
    let too_large = || {
        AppError::InvalidInput(format!("Upload exceeds the {} byte limit", limit))
    };

    if file_base64.len() / 4 * 3 > limit + 2 {
        return Err(too_large());
    }
    let bytes = STANDARD
        .decode(file_base64.trim())
        .map_err(|e| AppError::InvalidInput(format!("file_base64 is not valid base64: {}", e)))?;
    if bytes.len() > limit {
        return Err(too_large());
    }
    Ok(SourceFile::new(file_name, bytes))
}

fn respond<T: Serialize>(result: Result<T>) -> HttpResponse {
    respond_with(result, StatusCode::OK)
}

fn respond_with<T: Serialize>(result: Result<T>, status: StatusCode) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::build(status).json(value),
        Err(e) => error_response(&e),
    }
}

pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Decode(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AppError::NoPhoneColumn => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::DatabaseError(_) | AppError::IoError(_) | AppError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub fn error_response(err: &AppError) -> HttpResponse {
    let status = status_for(err);
    if status.is_server_error() {
        error!(error = %err, "Request failed");
    } else {
        warn!(error = %err, status = status.as_u16(), "Request rejected");
    }

    let mut body = serde_json::json!({
        "error": err.kind(),
        "message": err.to_string(),
    });
    if let AppError::InsufficientCredits {
        required,
        available,
    } = err
    {
        body["required"] = serde_json::json!(required);
        body["available"] = serde_json::json!(available);
        body["shortfall"] = serde_json::json!(required - available);
    }

    HttpResponse::build(status).json(body)
}

/// Register every route under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health)
            .service(scrub_free)
            .service(create_account)
            .service(get_account)
            .service(grant_credits)
            .service(set_subscription)
            .service(scrub_for_account)
            .service(get_scrub_options)
            .service(update_scrub_options)
            .service(list_suppression)
            .service(add_suppression)
            .service(remove_suppression)
            .service(clear_suppression)
            .service(upload_suppression)
            .service(list_uploaded_files)
            .service(remove_uploaded_file)
            .service(list_global)
            .service(add_global)
            .service(remove_global)
            .service(clear_global)
            .service(upload_global)
            .service(list_global_files)
            .service(remove_global_file)
            .service(upload_compliance),
    );
}

pub fn start_server(app: Arc<AppState>) -> std::io::Result<Server> {
    let host = app.config.http_host.clone();
    let port = app.config.http_port;
    // base64 adds a third on top of the raw file
    let json_limit = app.config.max_upload_bytes / 3 * 4 + 64 * 1024;
    let state = web::Data::new(HttpState { app });

    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .app_data(json_config(json_limit))
            .configure(configure)
    })
    .bind((host.as_str(), port))?
    .run();

    info!(host = %host, port, "HTTP server listening");
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::bootstrap::build_state;
    use crate::infrastructure::config::AppConfig;
    use actix_web::test;

    async fn state() -> web::Data<HttpState> {
        let config = AppConfig {
            database_url: "memory://".to_string(),
            starting_credits: 10.0,
            max_upload_bytes: 1024,
            ..AppConfig::default()
        };
        web::Data::new(HttpState {
            app: Arc::new(build_state(config).await.unwrap()),
        })
    }

    fn csv_base64(numbers: &[&str]) -> String {
        let mut content = String::from("phone\n");
        for number in numbers {
            content.push_str(number);
            content.push('\n');
        }
        STANDARD.encode(content)
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
    }

    #[actix_web::test]
    async fn test_free_scrub_returns_file_and_stats() {
        let app =
            test::init_service(App::new().app_data(state().await).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/scrub/free")
            .set_json(serde_json::json!({
                "file_name": "leads.csv",
                "file_base64": csv_base64(&["5551112222", "555-111-2222", "5553334444"]),
                "output_format": "csv",
            }))
            .to_request();

        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["file_name"], "leads-cleaned.csv");
        assert_eq!(body["mime_type"], "text/csv");
        assert_eq!(body["stats"]["total"], 3);
        assert_eq!(body["stats"]["unique"], 2);
        assert_eq!(body["stats"]["duplicates"], 1);
        assert_eq!(body["stats"]["suppressedNumbers"], 0);
        assert!(body["stats"].get("creditsUsed").is_none());
    }

    #[actix_web::test]
    async fn test_paid_scrub_requires_credits() {
        let app =
            test::init_service(App::new().app_data(state().await).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/accounts")
            .set_json(serde_json::json!({ "name": "acme" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let account: serde_json::Value = test::read_body_json(resp).await;
        let id = account["id"].as_str().unwrap().to_string();

        let numbers: Vec<String> = (0..11).map(|i| format!("55500000{:02}", i)).collect();
        let refs: Vec<&str> = numbers.iter().map(String::as_str).collect();
        let req = test::TestRequest::post()
            .uri(&format!("/api/accounts/{}/scrub", id))
            .set_json(serde_json::json!({
                "file_name": "leads.csv",
                "file_base64": csv_base64(&refs),
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "insufficient_credits");
        assert_eq!(body["shortfall"], 1.0);

        let req = test::TestRequest::post()
            .uri(&format!("/api/accounts/{}/scrub", id))
            .set_json(serde_json::json!({
                "file_name": "leads.csv",
                "file_base64": csv_base64(&refs[..4]),
                "output_format": "csv",
            }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["stats"]["creditsUsed"], 4.0);
        assert_eq!(body["credits_remaining"], 6.0);
    }

    #[actix_web::test]
    async fn test_suppression_endpoints() {
        let app =
            test::init_service(App::new().app_data(state().await).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/accounts")
            .set_json(serde_json::json!({ "name": "acme" }))
            .to_request();
        let account: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let id = account["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/accounts/{}/suppression", id))
            .set_json(serde_json::json!({ "numbers": ["(555) 111-2222", "n/a"] }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["added"], 1);

        let req = test::TestRequest::get()
            .uri(&format!("/api/accounts/{}/suppression", id))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["numbers"][0], "5551112222");

        let req = test::TestRequest::delete()
            .uri(&format!("/api/accounts/{}/suppression", id))
            .set_json(serde_json::json!({ "numbers": ["555.111.2222"] }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["removed"], 1);
    }

    #[actix_web::test]
    async fn test_unreadable_delete_body_keeps_list() {
        let app = test::init_service(
            App::new()
                .app_data(state().await)
                .app_data(json_config(1 << 20))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/accounts")
            .set_json(serde_json::json!({ "name": "acme" }))
            .to_request();
        let account: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let id = account["id"].as_str().unwrap().to_string();
        let uri = format!("/api/accounts/{}/suppression", id);

        let req = test::TestRequest::post()
            .uri(&uri)
            .set_json(serde_json::json!({ "numbers": ["5551112222", "5553334444", "5555556666"] }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["added"], 3);

        // misspelled field, then no body at all
        let req = test::TestRequest::delete()
            .uri(&uri)
            .set_json(serde_json::json!({ "number": ["5551112222"] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "invalid_input");

        let req = test::TestRequest::delete().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri(&uri).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["count"], 3);

        let req = test::TestRequest::delete()
            .uri(&format!("{}/all", uri))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["removed"], 3);

        let req = test::TestRequest::get().uri(&uri).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["count"], 0);
    }

    #[actix_web::test]
    async fn test_global_list_feeds_free_scrub() {
        let app =
            test::init_service(App::new().app_data(state().await).configure(configure)).await;
        let free_scrub = || {
            test::TestRequest::post()
                .uri("/api/scrub/free")
                .set_json(serde_json::json!({
                    "file_name": "leads.csv",
                    "file_base64": csv_base64(&["5551112222", "5553334444", "5555556666"]),
                    "output_format": "csv",
                }))
                .to_request()
        };

        let body: serde_json::Value = test::call_and_read_body_json(&app, free_scrub()).await;
        assert_eq!(body["stats"]["suppressedNumbers"], 0);

        let req = test::TestRequest::post()
            .uri("/api/suppression/global")
            .set_json(serde_json::json!({ "numbers": ["555-111-2222"] }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["added"], 1);

        let req = test::TestRequest::post()
            .uri("/api/suppression/global/upload")
            .set_json(serde_json::json!({
                "file_name": "optouts.csv",
                "file_base64": csv_base64(&["5553334444"]),
            }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["added"], 1);
        let file_id = body["file"]["id"].as_str().unwrap().to_string();

        let body: serde_json::Value = test::call_and_read_body_json(&app, free_scrub()).await;
        assert_eq!(body["stats"]["suppressedNumbers"], 2);
        assert_eq!(body["stats"]["unique"], 1);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/suppression/global/files/{}", file_id))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["removed"], 1);

        let req = test::TestRequest::get().uri("/api/suppression/global").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["numbers"][0], "5551112222");
    }

    #[actix_web::test]
    async fn test_error_statuses() {
        let app =
            test::init_service(App::new().app_data(state().await).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/accounts/missing").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri("/api/compliance/custom/upload")
            .set_json(serde_json::json!({
                "file_name": "list.csv",
                "file_base64": csv_base64(&["1"]),
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let oversized = STANDARD.encode(vec![b'1'; 4096]);
        let req = test::TestRequest::post()
            .uri("/api/scrub/free")
            .set_json(serde_json::json!({ "file_name": "big.csv", "file_base64": oversized }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_status_mapping() {
        assert_eq!(status_for(&AppError::NoPhoneColumn), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            status_for(&AppError::DatabaseError("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
