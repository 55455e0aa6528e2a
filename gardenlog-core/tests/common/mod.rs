//! In-process stand-ins for the two spreadsheet services, served by axum on
//! an ephemeral port.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const API_KEY: &str = "test-key";
pub const SPREADSHEET_ID: &str = "garden-sheet";

/// Serves `app` on 127.0.0.1 and returns its base URL.
pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn cells(row: &[&str]) -> Vec<String> {
    row.iter().map(|c| c.to_string()).collect()
}

// ── Values API ──────────────────────────────────────────────────────────────

/// A spreadsheet of named tabs, each a grid of string cells.
#[derive(Default)]
pub struct Workbook {
    pub tabs: HashMap<String, Vec<Vec<String>>>,
    /// Every mutating range seen, e.g. `POST Beds!A3:E3:clear`.
    pub writes: Vec<String>,
    /// When set, every request answers with this status.
    pub fail_with: Option<StatusCode>,
}

pub type SharedWorkbook = Arc<Mutex<Workbook>>;

impl Workbook {
    pub fn with_tab(mut self, name: &str, rows: &[&[&str]]) -> Self {
        self.tabs
            .insert(name.to_string(), rows.iter().map(|r| cells(r)).collect());
        self
    }

    pub fn shared(self) -> SharedWorkbook {
        Arc::new(Mutex::new(self))
    }
}

#[derive(Deserialize)]
struct KeyQuery {
    key: Option<String>,
}

#[derive(Deserialize)]
struct ValuesBody {
    values: Vec<Vec<String>>,
}

/// Splits `Tab!A3:E3` into `("Tab", 3)`.
fn row_of(range: &str) -> (String, usize) {
    let (tab, cells) = range.split_once('!').unwrap();
    let digits: String = cells
        .chars()
        .skip_while(|c| c.is_ascii_alphabetic())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    (tab.to_string(), digits.parse().unwrap())
}

/// What the real API returns for a grid: trailing blank cells dropped from
/// every row, trailing blank rows dropped.
fn as_returned(grid: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = grid
        .iter()
        .map(|row| {
            let keep = row.iter().rposition(|c| !c.is_empty()).map_or(0, |i| i + 1);
            row[..keep].to_vec()
        })
        .collect();
    while rows.last().is_some_and(|r| r.is_empty()) {
        rows.pop();
    }
    rows
}

fn guard(book: &Workbook, id: &str, key: &Option<String>) -> Option<Response> {
    if let Some(status) = book.fail_with {
        return Some((status, "backend unavailable").into_response());
    }
    if key.as_deref() != Some(API_KEY) {
        return Some((StatusCode::FORBIDDEN, "bad key").into_response());
    }
    if id != SPREADSHEET_ID {
        return Some((StatusCode::NOT_FOUND, "no such spreadsheet").into_response());
    }
    None
}

async fn read_range(
    State(book): State<SharedWorkbook>,
    Path((id, range)): Path<(String, String)>,
    Query(query): Query<KeyQuery>,
) -> Response {
    let book = book.lock().unwrap();
    if let Some(rejection) = guard(&book, &id, &query.key) {
        return rejection;
    }

    let (tab, header_only) = match range.strip_suffix("!1:1") {
        Some(tab) => (tab, true),
        None => (range.as_str(), false),
    };
    let Some(grid) = book.tabs.get(tab) else {
        return (StatusCode::BAD_REQUEST, "Unable to parse range").into_response();
    };

    let mut values = as_returned(grid);
    if header_only {
        values.truncate(1);
    }
    if values.is_empty() {
        return Json(json!({ "range": range })).into_response();
    }
    Json(json!({ "range": range, "values": values })).into_response()
}

async fn range_action(
    State(book): State<SharedWorkbook>,
    Path((id, target)): Path<(String, String)>,
    Query(query): Query<KeyQuery>,
    body: String,
) -> Response {
    let mut book = book.lock().unwrap();
    if let Some(rejection) = guard(&book, &id, &query.key) {
        return rejection;
    }
    book.writes.push(format!("POST {}", target));

    if let Some(range) = target.strip_suffix(":append") {
        let body: ValuesBody = serde_json::from_str(&body).unwrap();
        let (tab, _) = range.split_once('!').unwrap();
        let grid = book.tabs.entry(tab.to_string()).or_default();
        grid.extend(body.values);
        return Json(json!({ "updates": { "updatedRows": 1 } })).into_response();
    }
    if let Some(range) = target.strip_suffix(":clear") {
        let (tab, row) = row_of(range);
        if let Some(cells) = book
            .tabs
            .get_mut(&tab)
            .and_then(|grid| grid.get_mut(row - 1))
        {
            cells.iter_mut().for_each(String::clear);
        }
        return Json(json!({ "clearedRange": range })).into_response();
    }
    (StatusCode::NOT_FOUND, "unknown action").into_response()
}

async fn write_range(
    State(book): State<SharedWorkbook>,
    Path((id, range)): Path<(String, String)>,
    Query(query): Query<KeyQuery>,
    Json(body): Json<ValuesBody>,
) -> Response {
    let mut book = book.lock().unwrap();
    if let Some(rejection) = guard(&book, &id, &query.key) {
        return rejection;
    }
    book.writes.push(format!("PUT {}", range));

    let (tab, row) = row_of(&range);
    let grid = book.tabs.entry(tab).or_default();
    while grid.len() < row {
        grid.push(Vec::new());
    }
    grid[row - 1] = body.values.into_iter().next().unwrap_or_default();
    Json(json!({ "updatedRange": range })).into_response()
}

/// Serves a workbook under `/v4`, the way the values API lays out paths.
pub async fn spawn_values_api(book: SharedWorkbook) -> String {
    let app = Router::new()
        .route(
            "/v4/spreadsheets/{id}/values/{range}",
            get(read_range).post(range_action).put(write_range),
        )
        .with_state(book);
    format!("{}/v4", spawn(app).await)
}

// ── REST proxy ──────────────────────────────────────────────────────────────

/// Two JSON collections as a sheet-to-REST proxy would expose them.
#[derive(Default)]
pub struct Collections {
    pub rows: HashMap<String, Vec<Value>>,
    pub fail_with: Option<StatusCode>,
}

pub type SharedCollections = Arc<Mutex<Collections>>;

impl Collections {
    pub fn with_rows(mut self, collection: &str, rows: Vec<Value>) -> Self {
        self.rows.insert(collection.to_string(), rows);
        self
    }

    pub fn shared(self) -> SharedCollections {
        Arc::new(Mutex::new(self))
    }
}

fn field_matches(row: &Value, field: &str, value: &str) -> bool {
    row.get(field).and_then(Value::as_str) == Some(value)
}

async fn list_rows(
    State(state): State<SharedCollections>,
    Path(collection): Path<String>,
) -> Response {
    let state = state.lock().unwrap();
    if let Some(status) = state.fail_with {
        return (status, "proxy down").into_response();
    }
    let rows = state.rows.get(&collection).cloned().unwrap_or_default();
    Json(rows).into_response()
}

async fn insert_row(
    State(state): State<SharedCollections>,
    Path(collection): Path<String>,
    Json(row): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    if let Some(status) = state.fail_with {
        return (status, "proxy down").into_response();
    }
    state.rows.entry(collection).or_default().push(row.clone());
    Json(vec![row]).into_response()
}

async fn filter_rows(
    State(state): State<SharedCollections>,
    Path((collection, field, value)): Path<(String, String, String)>,
) -> Response {
    let state = state.lock().unwrap();
    if let Some(status) = state.fail_with {
        return (status, "proxy down").into_response();
    }
    let rows: Vec<Value> = state
        .rows
        .get(&collection)
        .into_iter()
        .flatten()
        .filter(|row| field_matches(row, &field, &value))
        .cloned()
        .collect();
    Json(rows).into_response()
}

async fn replace_rows(
    State(state): State<SharedCollections>,
    Path((collection, field, value)): Path<(String, String, String)>,
    Json(row): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    if let Some(status) = state.fail_with {
        return (status, "proxy down").into_response();
    }
    let mut replaced = Vec::new();
    for existing in state.rows.entry(collection).or_default().iter_mut() {
        if field_matches(existing, &field, &value) {
            *existing = row.clone();
            replaced.push(row.clone());
        }
    }
    Json(replaced).into_response()
}

async fn remove_rows(
    State(state): State<SharedCollections>,
    Path((collection, field, value)): Path<(String, String, String)>,
) -> Response {
    let mut state = state.lock().unwrap();
    if let Some(status) = state.fail_with {
        return (status, "proxy down").into_response();
    }
    let rows = state.rows.entry(collection).or_default();
    let (removed, kept): (Vec<Value>, Vec<Value>) = rows
        .drain(..)
        .partition(|row| field_matches(row, &field, &value));
    *rows = kept;
    Json(removed).into_response()
}

/// Serves collections at `/{collection}` and `/{collection}/{field}/{value}`.
pub async fn spawn_rest_proxy(state: SharedCollections) -> String {
    let app = Router::new()
        .route("/{collection}", get(list_rows).post(insert_row))
        .route(
            "/{collection}/{field}/{value}",
            get(filter_rows).put(replace_rows).delete(remove_rows),
        )
        .with_state(state);
    spawn(app).await
}
