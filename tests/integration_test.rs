//! End-to-end tests: a fake SMIIVERN backend and the service router, both on
//! ephemeral ports, driven over HTTP with `reqwest`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use reqwest::Client;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::TempDir;
use tokio::sync::Mutex;

use smiivern::backend::BackendClient;
use smiivern::report::ReportFormat;
use smiivern::store::StateStore;
use smiivern::{routes, schema, AppState, Config};

// --- fake backend

#[derive(Default)]
struct Fake {
    latest: Value,
    history: Vec<Value>,
    profiles: Vec<Value>,
    revoked: bool,
    sensors_down: bool,
    profile_list_calls: usize,
    sensor_auth: Vec<String>,
}

type Shared = Arc<Mutex<Fake>>;

fn authorized(fake: &Fake, headers: &HeaderMap) -> bool {
    // ---
    !fake.revoked
        && headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("Bearer tok-"))
}

fn record_sensor_auth(fake: &mut Fake, headers: &HeaderMap) {
    // ---
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    fake.sensor_auth.push(auth);
}

fn reading(temperature: &str, humidity: &str, ph: &str) -> Value {
    json!({
        "id": 1,
        "device_id": "esp32-001",
        "timestamp": "2025-03-26T18:45:00Z",
        "temperature": temperature,
        "humidity": humidity,
        "ph": ph,
        "conductivity": null,
        "tds": null,
        "n": "30",
        "p": "20",
        "k": "150",
        "created_at": "2025-03-26T18:45:01Z"
    })
}

fn profile(id: i64, name: &str, active: bool) -> Value {
    json!({
        "id": id,
        "nombre": name,
        "temperaturaMin": 20,
        "temperaturaMax": 40,
        "temperaturaOptima": 30,
        "humedadMin": 40,
        "humedadMax": 80,
        "phMin": "6.0",
        "phMax": "7.5",
        "nitrogenoMin": 4,
        "nitrogenoMax": 8,
        "activo": active
    })
}

async fn fake_login(Json(body): Json<Value>) -> Response {
    // ---
    if body["password"] != "secreto" {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let role = match email.split('@').next() {
        Some("admin") => "administrador",
        Some("mant") => "mantenimiento",
        _ => "estudiante",
    };
    Json(json!({
        "access_token": format!("tok-{role}"),
        "user": {
            "id": 1,
            "email": email,
            "nombre": "Ana",
            "apellido": "Pérez",
            "tipoUsuario": role
        }
    }))
    .into_response()
}

async fn fake_latest(State(fake): State<Shared>, headers: HeaderMap) -> Response {
    // ---
    let mut fake = fake.lock().await;
    record_sensor_auth(&mut fake, &headers);
    if !authorized(&fake, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if fake.sensors_down {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(fake.latest.clone()).into_response()
}

async fn fake_history(State(fake): State<Shared>, headers: HeaderMap) -> Response {
    // ---
    let mut fake = fake.lock().await;
    record_sensor_auth(&mut fake, &headers);
    if !authorized(&fake, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if fake.sensors_down {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(fake.history.clone()).into_response()
}

async fn fake_profiles(
    State(fake): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    // ---
    let mut fake = fake.lock().await;
    fake.profile_list_calls += 1;
    if !authorized(&fake, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let include_inactive = query.get("incluirInactivos").is_some_and(|v| v == "true");
    let profiles: Vec<Value> = fake
        .profiles
        .iter()
        .filter(|p| include_inactive || p["activo"] == true)
        .cloned()
        .collect();
    Json(profiles).into_response()
}

async fn fake_profile(State(fake): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    // ---
    let fake = fake.lock().await;
    if !authorized(&fake, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match fake.profiles.iter().find(|p| p["id"] == id) {
        Some(p) => Json(p.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn fake_patch_profile(
    State(fake): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(patch): Json<Value>,
) -> Response {
    // ---
    let mut fake = fake.lock().await;
    if !authorized(&fake, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let Some(p) = fake.profiles.iter_mut().find(|p| p["id"] == id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let (Some(target), Some(fields)) = (p.as_object_mut(), patch.as_object()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
    Json(p.clone()).into_response()
}

async fn fake_create_profile(
    State(fake): State<Shared>,
    headers: HeaderMap,
    Json(mut draft): Json<Value>,
) -> Response {
    // ---
    let mut fake = fake.lock().await;
    if !authorized(&fake, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let id = fake.profiles.len() as i64 + 1;
    if let Some(fields) = draft.as_object_mut() {
        fields.insert("id".to_string(), json!(id));
        fields.entry("activo").or_insert(json!(true));
    }
    fake.profiles.push(draft.clone());
    (StatusCode::CREATED, Json(draft)).into_response()
}

fn fake_backend(fake: Shared) -> Router {
    // ---
    Router::new()
        .route("/auth/login", post(fake_login))
        .route("/sensors/latest", get(fake_latest))
        .route("/sensors/history", get(fake_history))
        .route(
            "/plant-profiles",
            get(fake_profiles).post(fake_create_profile),
        )
        .route(
            "/plant-profiles/{id}",
            get(fake_profile).patch(fake_patch_profile),
        )
        .with_state(fake)
}

// --- harness

async fn spawn(app: Router) -> Result<String> {
    // ---
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

struct Harness {
    base: String,
    fake: Shared,
    client: Client,
    reports: TempDir,
}

impl Harness {
    async fn start() -> Result<Self> {
        // ---
        let fake: Shared = Arc::new(Mutex::new(Fake {
            latest: reading("35.2", "60.0", "6.8"),
            history: vec![
                reading("10.0", "60.0", "5.5"),
                reading("12.0", "62.0", "5.7"),
            ],
            profiles: vec![profile(1, "Tomate", true), profile(2, "Lechuga", false)],
            ..Fake::default()
        }));
        let backend_url = spawn(fake_backend(fake.clone())).await?;

        let reports = tempfile::tempdir()?;
        let config = Config {
            api_url: backend_url.clone(),
            db_url: "sqlite::memory:".to_string(),
            db_pool_max: 1,
            device_id: "esp32-001".to_string(),
            poll_interval: Duration::from_secs(30),
            report_history_limit: 100,
            report_dir: reports.path().join("out"),
            report_format: ReportFormat::Pdf,
            listen_port: 0,
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&config.db_url)
            .await?;
        schema::create_schema(&pool).await?;

        let backend = BackendClient::new(&backend_url)?;
        let state = AppState::new(config, backend, StateStore::new(pool));
        let base = spawn(routes::router(state)).await?;

        Ok(Self {
            base,
            fake,
            client: Client::new(),
            reports,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn login(&self, email: &str) -> Result<Value> {
        // ---
        let response = self
            .client
            .post(self.url("/session/login"))
            .json(&json!({ "email": email, "password": "secreto" }))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        Ok(response.json().await?)
    }

    async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        // ---
        let response = self.client.get(self.url(path)).send().await?;
        let status = response.status();
        Ok((status, response.json().await.unwrap_or(Value::Null)))
    }

    async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        // ---
        let response = self.client.post(self.url(path)).json(&body).send().await?;
        let status = response.status();
        Ok((status, response.json().await.unwrap_or(Value::Null)))
    }

    async fn put(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        // ---
        let response = self.client.put(self.url(path)).json(&body).send().await?;
        let status = response.status();
        Ok((status, response.json().await.unwrap_or(Value::Null)))
    }

    async fn patch(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        // ---
        let response = self.client.patch(self.url(path)).json(&body).send().await?;
        let status = response.status();
        Ok((status, response.json().await.unwrap_or(Value::Null)))
    }

    fn report_dir(&self) -> PathBuf {
        self.reports.path().join("out")
    }
}

// --- tests

#[tokio::test]
async fn health_is_ok() -> Result<()> {
    // ---
    let h = Harness::start().await?;
    let (status, body) = h.get("/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn without_session_nothing_is_allowed() -> Result<()> {
    // ---
    let h = Harness::start().await?;

    let (status, session) = h.get("/session").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["authenticated"], false);
    assert!(session["permissions"]
        .as_object()
        .unwrap()
        .values()
        .all(|v| v == false));

    let (status, _) = h.get("/dashboard").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // listing without a token never reaches the backend
    let (status, profiles) = h.get("/profiles").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profiles, json!([]));
    assert_eq!(h.fake.lock().await.profile_list_calls, 0);
    Ok(())
}

#[tokio::test]
async fn bad_credentials_are_rejected() -> Result<()> {
    // ---
    let h = Harness::start().await?;
    let (status, _) = h
        .post(
            "/session/login",
            json!({ "email": "mant@smiivern.test", "password": "nope" }),
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, session) = h.get("/session").await?;
    assert_eq!(session["authenticated"], false);
    Ok(())
}

#[tokio::test]
async fn student_permissions_are_limited() -> Result<()> {
    // ---
    let h = Harness::start().await?;
    let session = h.login("est@smiivern.test").await?;
    assert_eq!(session["role"], "estudiante");
    assert_eq!(session["permissions"]["view_dashboard"], true);
    assert_eq!(session["permissions"]["select_profile"], true);
    assert_eq!(session["permissions"]["manage_profiles"], false);
    assert_eq!(session["permissions"]["access_reports"], false);

    let (status, _) = h.post("/irrigation/toggle", json!({})).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = h.post("/reports", json!({})).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = h.get("/users").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // students may still pick a profile
    let (status, _) = h.put("/profiles/active", json!({ "id": 1 })).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn only_admins_see_inactive_profiles() -> Result<()> {
    // ---
    let h = Harness::start().await?;

    h.login("mant@smiivern.test").await?;
    let (_, profiles) = h.get("/profiles").await?;
    assert_eq!(profiles.as_array().unwrap().len(), 1);

    h.login("admin@smiivern.test").await?;
    let (_, profiles) = h.get("/profiles").await?;
    assert_eq!(profiles.as_array().unwrap().len(), 2);
    Ok(())
}

#[tokio::test]
async fn rejected_token_clears_the_session() -> Result<()> {
    // ---
    let h = Harness::start().await?;
    h.login("mant@smiivern.test").await?;
    h.fake.lock().await.revoked = true;

    let (status, profiles) = h.get("/profiles").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profiles, json!([]));

    let (_, session) = h.get("/session").await?;
    assert_eq!(session["authenticated"], false);
    assert_eq!(session["user"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn profile_selection_drives_alerts() -> Result<()> {
    // ---
    let h = Harness::start().await?;
    h.login("mant@smiivern.test").await?;

    // 35.2 °C is above the default 28 °C
    let (status, dash) = h.post("/dashboard/refresh", json!({})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dash["updated"], true);
    assert_eq!(dash["alerts"].as_array().unwrap().len(), 1);
    assert_eq!(dash["alerts"][0]["parameter"], "temperature");
    assert_eq!(dash["alerts"][0]["severity"], "danger");

    // selecting a profile drops the alerts until the next reading
    let (status, dash) = h.put("/profiles/active", json!({ "id": 1 })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dash["active_profile"]["nombre"], "Tomate");
    assert_eq!(dash["ranges"]["temperature"]["max"], 40.0);
    assert_eq!(dash["ranges"]["nitrogen"]["min"], 20.0);
    assert_eq!(dash["alerts"], json!([]));

    // 35.2 is inside 20..40
    let (_, dash) = h.post("/dashboard/refresh", json!({})).await?;
    assert_eq!(dash["alerts"], json!([]));

    // clearing restores the defaults
    let (_, dash) = h.put("/profiles/active", json!({ "id": null })).await?;
    assert_eq!(dash["active_profile"], Value::Null);
    assert_eq!(dash["ranges"]["temperature"]["max"], 28.0);
    Ok(())
}

#[tokio::test]
async fn inactive_profile_cannot_be_selected() -> Result<()> {
    // ---
    let h = Harness::start().await?;
    h.login("admin@smiivern.test").await?;

    let (status, _) = h.put("/profiles/active", json!({ "id": 2 })).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = h.put("/profiles/active", json!({ "id": 99 })).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn deactivating_the_active_profile_deselects_it() -> Result<()> {
    // ---
    let h = Harness::start().await?;
    h.login("admin@smiivern.test").await?;
    h.put("/profiles/active", json!({ "id": 1 })).await?;

    let (status, profile) = h.post("/profiles/1/deactivate", json!({})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["activo"], false);

    let (_, dash) = h.get("/dashboard").await?;
    assert_eq!(dash["active_profile"], Value::Null);
    assert_eq!(dash["ranges"]["temperature"]["max"], 28.0);
    Ok(())
}

#[tokio::test]
async fn invalid_profile_draft_is_rejected() -> Result<()> {
    // ---
    let h = Harness::start().await?;
    h.login("mant@smiivern.test").await?;

    let (status, body) = h
        .post(
            "/profiles",
            json!({
                "nombre": "Pimiento",
                "temperaturaMin": 30, "temperaturaMax": 20,
                "humedadMin": 40, "humedadMax": 80,
                "phMin": 6, "phMax": 7
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["details"]
        .as_array()
        .unwrap()
        .iter()
        .any(|d| d == "La temperatura mínima no puede ser mayor que la máxima"));

    let (status, created) = h
        .post(
            "/profiles",
            json!({
                "nombre": "Pimiento",
                "temperaturaMin": 18, "temperaturaMax": 27,
                "humedadMin": 40, "humedadMax": 80,
                "phMin": 6, "phMax": 7
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["nombre"], "Pimiento");
    assert_eq!(created["id"], 3);
    Ok(())
}

#[tokio::test]
async fn partial_edit_cannot_cross_stored_bound() -> Result<()> {
    // ---
    let h = Harness::start().await?;
    h.login("mant@smiivern.test").await?;

    // profile 1 is stored with temperaturaMax 40
    let (status, body) = h.patch("/profiles/1", json!({ "temperaturaMin": 90 })).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["details"]
        .as_array()
        .unwrap()
        .iter()
        .any(|d| d == "La temperatura mínima no puede ser mayor que la máxima"));
    assert_eq!(h.fake.lock().await.profiles[0]["temperaturaMin"], 20);

    let (status, updated) = h.patch("/profiles/1", json!({ "temperaturaMin": 25 })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["temperaturaMin"], 25);
    assert_eq!(updated["temperaturaMax"], 40);

    let (status, _) = h.patch("/profiles/99", json!({ "temperaturaMin": 25 })).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn sensor_calls_carry_the_session_token() -> Result<()> {
    // ---
    let h = Harness::start().await?;

    h.login("mant@smiivern.test").await?;
    let (status, dash) = h.post("/dashboard/refresh", json!({})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dash["updated"], true);

    let (status, _) = h.post("/reports", json!({})).await?;
    assert_eq!(status, StatusCode::CREATED);

    let auth = h.fake.lock().await.sensor_auth.clone();
    assert_eq!(auth, vec!["Bearer tok-mantenimiento"; 2]);

    // a revoked token fails the poll without dropping the last reading
    h.fake.lock().await.revoked = true;
    let (_, dash) = h.post("/dashboard/refresh", json!({})).await?;
    assert_eq!(dash["updated"], false);
    assert_eq!(dash["latest"]["temperature"], 35.2);
    Ok(())
}

#[tokio::test]
async fn report_is_written_to_the_report_dir() -> Result<()> {
    // ---
    let h = Harness::start().await?;
    h.login("mant@smiivern.test").await?;

    let (status, summary) = h.post("/reports", json!({})).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(summary["reading_count"], 2);
    assert_eq!(summary["analysis"]["temperature"]["average"], 11.0);
    assert_eq!(summary["analysis"]["temperature"]["status"], "very cold");
    assert_eq!(summary["overall_status"], "Bueno");

    let file = PathBuf::from(summary["file"].as_str().unwrap());
    assert_eq!(file.parent(), Some(h.report_dir().as_path()));
    let name = file.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("reporte-smiivern-") && name.ends_with(".pdf"));

    let bytes = tokio::fs::read(&file).await?;
    assert!(bytes.starts_with(b"%PDF-1.4"));
    assert!(bytes
        .windows(b"(  1. Incrementar temperatura".len())
        .any(|w| w == b"(  1. Incrementar temperatura"));
    Ok(())
}

#[tokio::test]
async fn backend_outage_is_not_fatal() -> Result<()> {
    // ---
    let h = Harness::start().await?;
    h.login("mant@smiivern.test").await?;
    h.post("/dashboard/refresh", json!({})).await?;
    h.fake.lock().await.sensors_down = true;

    // the previous reading and its alerts are kept
    let (status, dash) = h.post("/dashboard/refresh", json!({})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dash["updated"], false);
    assert_eq!(dash["latest"]["temperature"], 35.2);
    assert_eq!(dash["alerts"].as_array().unwrap().len(), 1);

    // no history means no report file
    let (status, _) = h.post("/reports", json!({})).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!h.report_dir().exists());
    Ok(())
}

#[tokio::test]
async fn theme_toggles_and_persists() -> Result<()> {
    // ---
    let h = Harness::start().await?;

    let (_, body) = h.get("/theme").await?;
    assert_eq!(body["theme"], "light");

    let (_, body) = h.post("/theme/toggle", json!({})).await?;
    assert_eq!(body["theme"], "dark");

    let (_, body) = h.get("/theme").await?;
    assert_eq!(body["theme"], "dark");

    let (status, body) = h.put("/theme", json!({ "theme": "light" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["theme"], "light");
    Ok(())
}

#[tokio::test]
async fn irrigation_toggle_for_maintenance() -> Result<()> {
    // ---
    let h = Harness::start().await?;
    h.login("mant@smiivern.test").await?;

    let (status, body) = h.post("/irrigation/toggle", json!({})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["irrigation_active"], true);

    let (_, dash) = h.get("/dashboard").await?;
    assert_eq!(dash["irrigation_active"], true);
    Ok(())
}

#[tokio::test]
async fn logout_drops_the_session() -> Result<()> {
    // ---
    let h = Harness::start().await?;
    h.login("mant@smiivern.test").await?;

    let response = h.client.post(h.url("/session/logout")).send().await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, _) = h.get("/dashboard").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}
