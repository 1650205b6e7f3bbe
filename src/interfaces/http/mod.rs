pub mod state;

use crate::domain::bug_report::{FieldKey, STEPS};
use crate::domain::error::AppError;
use crate::domain::wizard::WizardView;
use crate::infrastructure::config::ServerConfig;
use actix_cors::Cors;
use actix_web::{
    delete, dev::Server, get, post, put, web, App, HttpResponse, HttpServer, Responder,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub use state::AppState;

const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub app_state: Arc<AppState>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

#[derive(Serialize)]
pub struct SessionCreated {
    pub id: Uuid,
    pub view: WizardView,
}

#[derive(Deserialize)]
pub struct FieldUpdate {
    pub value: String,
}

#[post("/wizard")]
async fn create_wizard(data: web::Data<HttpState>) -> impl Responder {
    match data.app_state.create_session() {
        Ok((id, view)) => {
            add_log(
                &data.logs,
                "INFO",
                "Wizard",
                &format!("Started session {}", id),
            );
            HttpResponse::Created().json(SessionCreated { id, view })
        }
        Err(e) => error_response(&data, "Failed to start session", &e),
    }
}

#[get("/wizard/{id}")]
async fn get_wizard(data: web::Data<HttpState>, id: web::Path<Uuid>) -> impl Responder {
    match data
        .app_state
        .with_session(id.into_inner(), |wizard| Ok(wizard.view()))
    {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(&data, "Failed to load session", &e),
    }
}

#[delete("/wizard/{id}")]
async fn delete_wizard(data: web::Data<HttpState>, id: web::Path<Uuid>) -> impl Responder {
    let id = id.into_inner();
    match data.app_state.remove_session(id) {
        Ok(()) => {
            add_log(
                &data.logs,
                "INFO",
                "Wizard",
                &format!("Discarded session {}", id),
            );
            HttpResponse::NoContent().finish()
        }
        Err(e) => error_response(&data, "Failed to discard session", &e),
    }
}

#[put("/wizard/{id}/fields/{field}")]
async fn set_field(
    data: web::Data<HttpState>,
    path: web::Path<(Uuid, String)>,
    req: web::Json<FieldUpdate>,
) -> impl Responder {
    let (id, field) = path.into_inner();
    let key = match field.parse::<FieldKey>() {
        Ok(key) => key,
        Err(msg) => {
            return error_response(&data, "Rejected field update", &AppError::ValidationError(msg))
        }
    };

    let value = req.into_inner().value;
    match data.app_state.with_session(id, |wizard| {
        wizard.set_field(key, value)?;
        Ok(wizard.view())
    }) {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(&data, "Rejected field update", &e),
    }
}

#[post("/wizard/{id}/advance")]
async fn advance(data: web::Data<HttpState>, id: web::Path<Uuid>) -> impl Responder {
    match data.app_state.with_session(id.into_inner(), |wizard| {
        wizard.advance();
        Ok(wizard.view())
    }) {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(&data, "Failed to advance", &e),
    }
}

#[post("/wizard/{id}/retreat")]
async fn retreat(data: web::Data<HttpState>, id: web::Path<Uuid>) -> impl Responder {
    match data.app_state.with_session(id.into_inner(), |wizard| {
        wizard.retreat();
        Ok(wizard.view())
    }) {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(&data, "Failed to retreat", &e),
    }
}

#[post("/wizard/{id}/submit")]
async fn submit(data: web::Data<HttpState>, id: web::Path<Uuid>) -> impl Responder {
    let id = id.into_inner();
    add_log(
        &data.logs,
        "INFO",
        "Wizard",
        &format!(
            "Submitting session {} (provider={:?} model={})",
            id, data.app_state.llm_config.provider, data.app_state.llm_config.model
        ),
    );

    match data.app_state.submit(id).await {
        Ok(view) => {
            match &view {
                WizardView::Summary(summary) => add_log(
                    &data.logs,
                    "INFO",
                    "Wizard",
                    &format!(
                        "Session {} classified (severity={} confidence={})",
                        id,
                        summary.classification.severity.as_deref().unwrap_or("-"),
                        summary.classification.confidence.as_deref().unwrap_or("-")
                    ),
                ),
                WizardView::Editing(step) if step.error.is_some() => add_log(
                    &data.logs,
                    "ERROR",
                    "Wizard",
                    &format!("Session {} classification failed", id),
                ),
                WizardView::Editing(step) => add_log(
                    &data.logs,
                    "WARN",
                    "Wizard",
                    &format!(
                        "Session {} missing required fields: {:?}",
                        id, step.missing_fields
                    ),
                ),
            }
            HttpResponse::Ok().json(view)
        }
        Err(e) => error_response(&data, "Submit rejected", &e),
    }
}

#[post("/wizard/{id}/reset")]
async fn reset(data: web::Data<HttpState>, id: web::Path<Uuid>) -> impl Responder {
    match data.app_state.with_session(id.into_inner(), |wizard| {
        wizard.reset()?;
        Ok(wizard.view())
    }) {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(&data, "Failed to reset", &e),
    }
}

#[delete("/wizard/{id}/error")]
async fn dismiss_error(data: web::Data<HttpState>, id: web::Path<Uuid>) -> impl Responder {
    match data.app_state.with_session(id.into_inner(), |wizard| {
        wizard.dismiss_error();
        Ok(wizard.view())
    }) {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(&data, "Failed to dismiss error", &e),
    }
}

#[get("/steps")]
async fn list_steps() -> impl Responder {
    HttpResponse::Ok().json(STEPS)
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    match data.logs.lock() {
        Ok(logs) => HttpResponse::Ok().json(logs.clone()),
        Err(_) => HttpResponse::InternalServerError().body("Log buffer unavailable"),
    }
}

fn error_response(data: &HttpState, context: &str, err: &AppError) -> HttpResponse {
    let level = match err {
        AppError::NotFound(_) | AppError::ValidationError(_) | AppError::InvalidState(_) => "WARN",
        _ => "ERROR",
    };
    match level {
        "ERROR" => tracing::error!(error = %err, "{}", context),
        _ => tracing::warn!(error = %err, "{}", context),
    }
    add_log(&data.logs, level, "HttpApi", &format!("{}: {}", context, err));

    match err {
        AppError::NotFound(_) => HttpResponse::NotFound().body(err.to_string()),
        AppError::ValidationError(_) => HttpResponse::BadRequest().body(err.to_string()),
        AppError::InvalidState(_) => HttpResponse::Conflict().body(err.to_string()),
        _ => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

/// Records the entry in the in-memory buffer served at `/api/logs`.
pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    if let Ok(mut logs) = logs.lock() {
        logs.push(entry.clone());
        if logs.len() > MAX_LOG_ENTRIES {
            logs.remove(0);
        }
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(create_wizard)
            .service(get_wizard)
            .service(delete_wizard)
            .service(set_field)
            .service(advance)
            .service(retreat)
            .service(submit)
            .service(reset)
            .service(dismiss_error)
            .service(list_steps)
            .service(get_logs),
    );
}

pub fn start_server(
    app_state: Arc<AppState>,
    logs: Arc<Mutex<Vec<LogEntry>>>,
    server: &ServerConfig,
) -> std::io::Result<Server> {
    let state = web::Data::new(HttpState { app_state, logs });

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Browser front-end is served from another origin

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((server.host.as_str(), server.port))?
    .run();

    Ok(server)
}
