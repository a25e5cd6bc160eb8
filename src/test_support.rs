//! In-process stand-in for the back-office backend used by the page-flow tests.
//! Every request is recorded before it reaches its handler.

use crate::api::ApiClient;
use crate::state::{SessionState, UserProfile};
use axum::body::{to_bytes, Body};
use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Form, Json, Router};
use reqwest::Client;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub const TEST_TOKEN: &str = "tok-test";
pub const TEST_USER_ID: i64 = 7;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: String,
    pub body: String,
    pub authorization: Option<String>,
}

#[derive(Default)]
pub struct FakeDb {
    pub requests: Vec<Recorded>,
    pub invoices: Vec<Value>,
    pub checks: Vec<Value>,
    pub transfers: Vec<Value>,
    pub cash_movements: Vec<Value>,
    pub bank_movements: Vec<Value>,
    pub portal_payslips: Vec<Value>,
    pub fail_mark_paid: bool,
    pub fail_invoice_listing: bool,
    pub mark_paid_delay_ms: u64,
}

impl FakeDb {
    pub fn seeded() -> Self {
        FakeDb {
            invoices: vec![
                json!({"id": 1, "numero_fattura": "FT/2024/101", "data_fattura": "2024-05-02",
                       "ragione_sociale_fornitore": "Caseificio Rossi srl", "partita_iva_fornitore": "01234567890",
                       "totale": 244.0, "iva": 44.0, "pagata": false, "stato": "active"}),
                json!({"id": 2, "numero_fattura": "FT/2024/102", "data_fattura": "2024-05-09",
                       "ragione_sociale_fornitore": "Ortofrutta Bianchi", "partita_iva_fornitore": "09876543210",
                       "totale": 1220.5, "iva": 220.1, "pagata": false, "stato": "pending"}),
                json!({"id": 3, "numero_fattura": "FT/2024/087", "data_fattura": "2024-04-11",
                       "ragione_sociale_fornitore": "Caseificio Rossi srl", "partita_iva_fornitore": "01234567890",
                       "totale": 530.0, "iva": 95.57, "pagata": true, "stato": "paid",
                       "metodo_pagamento": "cassa"}),
            ],
            checks: vec![
                json!({"id": 10, "numero": "1001", "banca": "Intesa Sanpaolo", "stato": "disponibile"}),
                json!({"id": 11, "numero": "1002", "banca": "Intesa Sanpaolo", "stato": "emesso",
                       "importo": 310.0, "beneficiario": "Forno Sereni"}),
                json!({"id": 12, "numero": "1003", "banca": "Intesa Sanpaolo", "stato": "annullato"}),
            ],
            transfers: vec![
                json!({"id": 20, "data_bonifico": "2024-05-10", "importo": 1220.5,
                       "beneficiario": "Ortofrutta Bianchi", "collegato": false}),
            ],
            cash_movements: vec![
                json!({"id": 30, "data_operazione": "2024-05-01", "tipo": "corrispettivi", "importo": 900.0}),
                json!({"id": 31, "data_operazione": "2024-05-01", "tipo": "pos", "importo": -400.0}),
            ],
            bank_movements: vec![
                json!({"id": 40, "data_operazione": "2024-05-11", "tipo": "uscita",
                       "descrizione": "BONIFICO ORTOFRUTTA BIANCHI", "importo": -1220.5, "riconciliato": false}),
            ],
            portal_payslips: vec![
                json!({"id": 50, "periodo": "Marzo 2024", "anno": 2024, "mese": 3,
                       "retribuzione_lorda": 1850.0, "inps_dipendente": 170.2, "irpef": 245.0,
                       "netto_in_busta": 1434.8, "stato_pagamento": "da_pagare", "pdf_disponibile": true,
                       "numero_visualizzazioni": 1, "accettato": false,
                       "data_disponibilita": "2024-04-05", "data_scadenza_contestazione": "2024-10-02",
                       "giorni_rimanenti_contestazione": 143, "contestazione_scaduta": false,
                       "messaggio_scadenza": null, "numero_contestazioni": 0}),
                json!({"id": 51, "periodo": "Settembre 2023", "anno": 2023, "mese": 9,
                       "retribuzione_lorda": 1850.0, "netto_in_busta": 1430.0, "stato_pagamento": "pagato",
                       "pdf_disponibile": true, "numero_visualizzazioni": 4, "accettato": true,
                       "data_disponibilita": "2023-10-05", "data_scadenza_contestazione": "2024-04-02",
                       "giorni_rimanenti_contestazione": 0, "contestazione_scaduta": true,
                       "messaggio_scadenza": "TERMINE DI CONTESTAZIONE SCADUTO", "numero_contestazioni": 0}),
            ],
            ..Default::default()
        }
    }
}

pub type Shared = Arc<Mutex<FakeDb>>;

pub struct FakeBackend {
    pub addr: SocketAddr,
    pub db: Shared,
}

impl FakeBackend {
    pub async fn spawn(db: FakeDb) -> Self {
        let shared: Shared = Arc::new(Mutex::new(db));
        let app = router(shared.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        FakeBackend { addr, db: shared }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::with_client(Client::new(), &self.url(), logged_in_session())
    }

    pub fn anonymous_client(&self) -> ApiClient {
        ApiClient::with_client(Client::new(), &self.url(), SessionState::default())
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.db.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    pub fn clear_requests(&self) {
        self.db.lock().unwrap().requests.clear();
    }

    pub fn with_db<R>(&self, f: impl FnOnce(&mut FakeDb) -> R) -> R {
        f(&mut self.db.lock().unwrap())
    }
}

pub fn logged_in_session() -> SessionState {
    SessionState::new(
        TEST_TOKEN.to_string(),
        UserProfile {
            id: TEST_USER_ID,
            email: "ufficio@trattoria.it".to_string(),
            full_name: Some("Trattoria Da Mario".to_string()),
            role: Some("admin".to_string()),
        },
    )
}

fn router(db: Shared) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", post(logout))
        .route("/api/invoices/", get(list_invoices))
        .route("/api/invoices/by-state/:state", get(invoices_by_state))
        .route("/api/invoices/payment-options/assegni", get(available_checks))
        .route("/api/invoices/payment-options/bonifici", get(unlinked_transfers))
        .route("/api/invoices/upload-bulk", post(upload_invoices))
        .route("/api/invoices/suggest-payment-match", post(suggest_match))
        .route("/api/invoices/:id", delete(delete_invoice))
        .route("/api/invoices/:id/righe", get(invoice_lines))
        .route("/api/invoices/:id/mark-paid", post(mark_paid))
        .route("/api/checks/", get(list_checks))
        .route("/api/checks/stats", get(check_stats))
        .route("/api/checks/batch-create", post(batch_create_checks))
        .route("/api/checks/:id/mark-incassato", post(mark_check_cashed))
        .route("/api/bank/", get(list_transfers).post(create_transfer))
        .route("/api/reconciliation/", get(unreconciled))
        .route("/api/reconciliation/match", post(match_movement))
        .route("/api/cash-register/", get(list_cash))
        .route("/api/cash-register/saldo", get(cash_balance))
        .route("/api/cash-register/chiusura-giornaliera", post(daily_closure))
        .route("/api/iva/liquidazione", get(vat_liquidation))
        .route("/api/suppliers/:piva/stats", get(supplier_stats))
        .route("/api/suppliers/:piva/fatture", get(supplier_invoices))
        .route("/api/dipendenti/", get(list_employees))
        .route("/api/haccp/temperature", get(temperatures))
        .route("/api/haccp/sanificazioni", get(sanitations))
        .route("/api/haccp/libretti-sanitari", get(certificates))
        .route("/api/warehouse/", get(products))
        .route("/api/dashboard/", get(analytics))
        .route("/api/dashboard/stats", get(dashboard_stats))
        .route("/api/dashboard/quick-actions", get(quick_actions))
        .route("/api/contabilita/bilancio/conto-economico", get(income_statement))
        .route("/api/bulk-import/:kind", post(bulk_import))
        .route("/api/hr/statistics", get(hr_statistics))
        .route("/api/hr/email-bot/run", post(run_email_bot))
        .route("/api/portale/buste-paga/:id", get(portal_payslip))
        .route("/api/portale/buste-paga/:id/accetta", post(accept_payslip))
        .route("/api/portale/buste-paga/:id/download-pdf", get(download_payslip_pdf))
        .route(
            "/api/portale/buste-paga/:id/download-modulo-contestazione",
            get(download_dispute_form),
        )
        .layer(middleware::from_fn_with_state(db.clone(), record))
        .with_state(db)
}

async fn record(State(db): State<Shared>, req: Request, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.unwrap_or_default();
    db.lock().unwrap().requests.push(Recorded {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().unwrap_or("").to_string(),
        body: String::from_utf8_lossy(&bytes).to_string(),
        authorization: parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    });
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

type Params = HashMap<String, String>;

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn ok_list(items: Vec<Value>) -> Response {
    Json(json!({ "success": true, "data": items })).into_response()
}

fn id_of(v: &Value) -> i64 {
    v["id"].as_i64().unwrap_or_default()
}

fn require_user(q: &Params) -> Result<(), Response> {
    match q.get("id_utente").map(String::as_str) {
        Some("7") => Ok(()),
        _ => Err(detail(StatusCode::UNPROCESSABLE_ENTITY, "id_utente mancante")),
    }
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "timestamp": "2024-05-12T10:00:00", "database": "connected"}))
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] != "segreta" {
        return detail(StatusCode::UNAUTHORIZED, "Credenziali non valide");
    }
    Json(json!({
        "success": true,
        "token": TEST_TOKEN,
        "user": {"id": TEST_USER_ID, "email": body["email"], "full_name": "Trattoria Da Mario", "role": "admin"}
    }))
    .into_response()
}

async fn me(headers: HeaderMap) -> Response {
    let expected = format!("Bearer {}", TEST_TOKEN);
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(h) if h == expected => Json(json!({
            "success": true,
            "user": {"id": TEST_USER_ID, "email": "ufficio@trattoria.it", "full_name": "Trattoria Da Mario", "role": "admin"}
        }))
        .into_response(),
        _ => detail(StatusCode::UNAUTHORIZED, "Token non valido"),
    }
}

async fn logout() -> Json<Value> {
    Json(json!({"success": true, "message": "Logout effettuato"}))
}

async fn list_invoices(State(db): State<Shared>, Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    let db = db.lock().unwrap();
    if db.fail_invoice_listing {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "connessione al database persa");
    }
    let items = db
        .invoices
        .iter()
        .filter(|f| match q.get("pagata").map(String::as_str) {
            Some("true") => f["pagata"] == true,
            Some("false") => f["pagata"] == false,
            _ => true,
        })
        .filter(|f| match q.get("status") {
            Some(status) => f["stato"] == status.as_str(),
            None => true,
        })
        .cloned()
        .collect();
    ok_list(items)
}

async fn invoices_by_state(
    State(db): State<Shared>,
    Path(state): Path<String>,
    Query(q): Query<Params>,
) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    let db = db.lock().unwrap();
    let items = db
        .invoices
        .iter()
        .filter(|f| f["stato"] == state.as_str())
        .cloned()
        .collect();
    ok_list(items)
}

async fn available_checks(State(db): State<Shared>, Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    let db = db.lock().unwrap();
    ok_list(
        db.checks
            .iter()
            .filter(|c| c["stato"] == "disponibile")
            .cloned()
            .collect(),
    )
}

async fn unlinked_transfers(State(db): State<Shared>, Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    let db = db.lock().unwrap();
    ok_list(
        db.transfers
            .iter()
            .filter(|t| t["collegato"] == false)
            .cloned()
            .collect(),
    )
}

async fn upload_invoices(mut multipart: Multipart) -> Response {
    let mut files = 0;
    let mut user = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let data = field.bytes().await.unwrap_or_default();
        match name.as_str() {
            "files" => files += 1,
            "id_utente" => user = Some(String::from_utf8_lossy(&data).to_string()),
            _ => {}
        }
    }
    if user.as_deref() != Some("7") {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "id_utente mancante");
    }
    Json(json!({"success": true, "uploaded": files, "errors": 0, "results": [], "error_details": []}))
        .into_response()
}

async fn suggest_match(
    State(db): State<Shared>,
    Query(q): Query<Params>,
    Form(form): Form<Params>,
) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    let db = db.lock().unwrap();
    let transfer = form
        .get("id_bonifico")
        .and_then(|id| id.parse::<i64>().ok())
        .and_then(|id| db.transfers.iter().find(|t| id_of(t) == id));
    let matched = transfer.and_then(|t| {
        db.invoices
            .iter()
            .find(|f| f["pagata"] == false && f["totale"] == t["importo"])
    });
    match matched {
        Some(invoice) => Json(json!({"success": true, "suggested": true, "data": invoice})).into_response(),
        None => Json(json!({"success": true, "suggested": false, "message": "Nessuna fattura corrispondente trovata"}))
            .into_response(),
    }
}

async fn delete_invoice(State(db): State<Shared>, Path(id): Path<i64>, Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    let mut db = db.lock().unwrap();
    let before = db.invoices.len();
    db.invoices.retain(|f| id_of(f) != id);
    if db.invoices.len() == before {
        return detail(StatusCode::NOT_FOUND, "Fattura non trovata");
    }
    Json(json!({"success": true, "message": "Fattura eliminata"})).into_response()
}

async fn invoice_lines(Path(id): Path<i64>, Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    ok_list(vec![json!({
        "id": 1, "id_fattura": id, "descrizione": "Mozzarella fiordilatte",
        "quantita": 20, "unita_misura": "kg", "prezzo_unitario": 10.0, "prezzo_totale": 200.0, "aliquota_iva": 22
    })])
}

async fn mark_paid(
    State(db): State<Shared>,
    Path(id): Path<i64>,
    Query(q): Query<Params>,
    Form(form): Form<Params>,
) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    let delay = db.lock().unwrap().mark_paid_delay_ms;
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    let mut db = db.lock().unwrap();
    if db.fail_mark_paid {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "Errore database");
    }
    let Some(metodo) = form.get("metodo").cloned() else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "metodo mancante");
    };
    let Some(invoice) = db.invoices.iter_mut().find(|f| id_of(f) == id) else {
        return detail(StatusCode::NOT_FOUND, "Fattura non trovata");
    };
    invoice["pagata"] = json!(true);
    invoice["metodo_pagamento"] = json!(metodo);
    let bucket = if metodo == "cassa" { "registered_cash" } else { "registered_bank" };
    invoice["stato"] = json!(bucket);
    invoice["data_pagamento"] = json!(form.get("data_pagamento"));

    if let Some(check_id) = form.get("id_assegno").and_then(|v| v.parse::<i64>().ok()) {
        if let Some(check) = db.checks.iter_mut().find(|c| id_of(c) == check_id) {
            check["stato"] = json!("emesso");
            check["id_fattura"] = json!(id);
        }
    }
    if let Some(transfer_id) = form.get("id_bonifico").and_then(|v| v.parse::<i64>().ok()) {
        if let Some(transfer) = db.transfers.iter_mut().find(|t| id_of(t) == transfer_id) {
            transfer["collegato"] = json!(true);
            transfer["id_fattura"] = json!(id);
        }
    }
    Json(json!({"success": true, "message": format!("Fattura pagata e registrata in {}", metodo), "data": {}}))
        .into_response()
}

async fn list_checks(State(db): State<Shared>, Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    ok_list(db.lock().unwrap().checks.clone())
}

async fn check_stats(State(db): State<Shared>, Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    let db = db.lock().unwrap();
    let count = |stato: &str| db.checks.iter().filter(|c| c["stato"] == stato).count();
    Json(json!({"success": true, "data": {
        "totale": db.checks.len(),
        "disponibili": count("disponibile"),
        "emessi": count("emesso"),
        "incassati": count("incassato"),
        "annullati": count("annullato"),
    }}))
    .into_response()
}

async fn batch_create_checks(State(db): State<Shared>, Form(form): Form<Params>) -> Response {
    if let Err(r) = require_user(&form) {
        return r;
    }
    let start: i64 = form.get("numero_inizio").and_then(|v| v.parse().ok()).unwrap_or_default();
    let qty: i64 = form.get("quantita").and_then(|v| v.parse().ok()).unwrap_or_default();
    let banca = form.get("banca").cloned().unwrap_or_default();
    let mut db = db.lock().unwrap();
    let next_id = db.checks.iter().map(id_of).max().unwrap_or(0) + 1;
    for i in 0..qty {
        db.checks.push(json!({
            "id": next_id + i, "numero": (start + i).to_string(), "banca": banca, "stato": "disponibile"
        }));
    }
    Json(json!({"success": true, "message": format!("Creati {} assegni", qty)})).into_response()
}

async fn mark_check_cashed(State(db): State<Shared>, Path(id): Path<i64>, Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    let mut db = db.lock().unwrap();
    match db.checks.iter_mut().find(|c| id_of(c) == id) {
        Some(check) => {
            check["stato"] = json!("incassato");
            Json(json!({"success": true, "message": "Assegno segnato come incassato"})).into_response()
        }
        None => detail(StatusCode::NOT_FOUND, "Assegno non trovato"),
    }
}

async fn list_transfers(State(db): State<Shared>, Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    let db = db.lock().unwrap();
    let items = db
        .transfers
        .iter()
        .filter(|t| match q.get("collegato").map(String::as_str) {
            Some("true") => t["collegato"] == true,
            Some("false") => t["collegato"] == false,
            _ => true,
        })
        .cloned()
        .collect();
    ok_list(items)
}

async fn create_transfer(State(db): State<Shared>, Form(form): Form<Params>) -> Response {
    if let Err(r) = require_user(&form) {
        return r;
    }
    let mut db = db.lock().unwrap();
    let id = db.transfers.iter().map(id_of).max().unwrap_or(0) + 1;
    let importo: f64 = form.get("importo").and_then(|v| v.parse().ok()).unwrap_or_default();
    db.transfers.push(json!({
        "id": id,
        "data_bonifico": form.get("data_bonifico"),
        "importo": importo,
        "beneficiario": form.get("beneficiario"),
        "causale": form.get("causale"),
        "collegato": false
    }));
    Json(json!({"success": true, "message": "Bonifico registrato"})).into_response()
}

async fn unreconciled(State(db): State<Shared>, Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    let db = db.lock().unwrap();
    ok_list(
        db.bank_movements
            .iter()
            .filter(|m| m["riconciliato"] == false)
            .cloned()
            .collect(),
    )
}

async fn match_movement(State(db): State<Shared>, Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    let movement: i64 = q.get("id_movimento").and_then(|v| v.parse().ok()).unwrap_or_default();
    let invoice: i64 = q.get("id_fattura").and_then(|v| v.parse().ok()).unwrap_or_default();
    let mut db = db.lock().unwrap();
    if let Some(m) = db.bank_movements.iter_mut().find(|m| id_of(m) == movement) {
        m["riconciliato"] = json!(true);
    }
    if let Some(f) = db.invoices.iter_mut().find(|f| id_of(f) == invoice) {
        f["riconciliata"] = json!(true);
    }
    Json(json!({"success": true, "message": "Riconciliazione completata"})).into_response()
}

async fn list_cash(State(db): State<Shared>, Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    ok_list(db.lock().unwrap().cash_movements.clone())
}

async fn cash_balance(State(db): State<Shared>, Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    let saldo: f64 = db
        .lock()
        .unwrap()
        .cash_movements
        .iter()
        .filter_map(|m| m["importo"].as_f64())
        .sum();
    Json(json!({"success": true, "saldo": saldo, "data_calcolo": "2024-05-12"})).into_response()
}

async fn daily_closure(State(db): State<Shared>, Form(form): Form<Params>) -> Response {
    if let Err(r) = require_user(&form) {
        return r;
    }
    let amount = |key: &str| -> f64 { form.get(key).and_then(|v| v.parse().ok()).unwrap_or_default() };
    let (corrispettivi, pos, versamento) = (amount("corrispettivi"), amount("pos"), amount("versamento"));
    let data = form.get("data").cloned().unwrap_or_default();

    let mut db = db.lock().unwrap();
    let mut next_id = db.cash_movements.iter().map(id_of).max().unwrap_or(0) + 1;
    for (tipo, importo) in [
        ("corrispettivi", corrispettivi),
        ("pos", -pos),
        ("versamento", -versamento),
    ] {
        if importo != 0.0 {
            db.cash_movements.push(json!({
                "id": next_id, "data_operazione": data, "tipo": tipo, "importo": importo
            }));
            next_id += 1;
        }
    }
    Json(json!({
        "success": true,
        "message": "Chiusura giornaliera registrata",
        "saldo_cassa": corrispettivi - pos - versamento
    }))
    .into_response()
}

async fn vat_liquidation(Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    let mese: u32 = q.get("mese").and_then(|v| v.parse().ok()).unwrap_or_default();
    let anno: i32 = q.get("anno").and_then(|v| v.parse().ok()).unwrap_or_default();
    let (vendite, acquisti): (f64, f64) = if mese == 5 { (1000.0, 400.0) } else { (300.0, 450.0) };
    let saldo = vendite - acquisti;
    let tipo = if saldo < 0.0 { "credito" } else { "debito" };
    Json(json!({"success": true, "data": {
        "mese": mese, "anno": anno,
        "iva_vendite": vendite, "iva_acquisti": acquisti,
        "iva_da_versare": saldo,
        "tipo": tipo
    }}))
    .into_response()
}

async fn supplier_stats(Path(piva): Path<String>, Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    if piva != "01234567890" {
        return detail(StatusCode::NOT_FOUND, "Fornitore non trovato");
    }
    Json(json!({"success": true, "data": {
        "totale_fatture": 2, "importo_totale": 774.0, "ultima_fattura": "2024-05-02",
        "fatture_pagate": 1, "fatture_da_pagare": 1
    }}))
    .into_response()
}

async fn supplier_invoices(
    State(db): State<Shared>,
    Path(piva): Path<String>,
    Query(q): Query<Params>,
) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    let db = db.lock().unwrap();
    ok_list(
        db.invoices
            .iter()
            .filter(|f| f["partita_iva_fornitore"] == piva.as_str())
            .cloned()
            .collect(),
    )
}

async fn list_employees(Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    Json(json!({"success": true, "data": null})).into_response()
}

async fn temperatures(Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    ok_list(vec![
        json!({"id": 1, "tipo": "frigorifero", "data_rilevazione": "2024-05-12", "ora_rilevazione": "08:00:00", "temperatura": 3.5}),
        json!({"id": 2, "tipo": "congelatore", "data": "2024-05-12", "ora": "08:05:00", "temperatura": -12.0}),
    ])
}

async fn sanitations(Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    ok_list(vec![json!({"id": 1, "data": "2024-05-11", "area": "Cucina", "operatore": "Luca"})])
}

async fn certificates(Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    ok_list(vec![
        json!({"id": 1, "nome_dipendente": "Giulia", "cognome_dipendente": "Verdi", "numero_libretto": "LS-1",
               "data_rilascio": "2022-01-10", "data_scadenza": "2024-01-10"}),
        json!({"id": 2, "numero_libretto": "LS-2", "data_rilascio": "2024-02-01", "data_scadenza": "2026-02-01",
               "dipendenti": {"nome": "Luca", "cognome": "Neri"}}),
    ])
}

async fn products(Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    let all = vec![
        json!({"id": 1, "codice_prodotto": "MOZ", "descrizione": "Mozzarella", "categoria": "Latticini", "quantita": 10, "prezzo_acquisto": 8.5}),
        json!({"id": 2, "codice_prodotto": "FAR", "descrizione": "Farina 00", "categoria": "Secco", "quantita": 25, "prezzo_acquisto": 0.9}),
        json!({"id": 3, "codice_prodotto": "RIC", "descrizione": "Ricotta", "categoria": "Latticini", "quantita": 4, "prezzo_acquisto": null}),
    ];
    let items = match q.get("categoria") {
        Some(cat) => all.into_iter().filter(|p| p["categoria"] == cat.as_str()).collect(),
        None => all,
    };
    ok_list(items)
}

async fn analytics(Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    Json(json!({
        "totale_fatture": 4, "importo_totale": 1000.0, "fatture_pagate": 1,
        "fatture_da_pagare": 3, "totale_fornitori": 2
    }))
    .into_response()
}

async fn dashboard_stats(Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    Json(json!({"success": true, "data": {
        "fatture_mese": {"totale": 1464.5, "mese": "2024-05"},
        "fornitori": {"totale": 2},
        "fatture_da_pagare": {"numero": 2, "importo": 1464.5},
        "saldo_cassa": 500.0
    }}))
    .into_response()
}

async fn quick_actions(Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    ok_list(vec![json!({
        "tipo": "warning", "titolo": "1 fatture scadute",
        "descrizione": "Alcune fatture sono scadute e richiedono attenzione",
        "azione": "/archive?tab=attive", "priorita": "alta"
    })])
}

async fn income_statement(Query(q): Query<Params>) -> Response {
    if let Err(r) = require_user(&q) {
        return r;
    }
    Json(json!({"success": true, "data": {
        "anno": 2024,
        "ricavi": {"totale": 52000.0, "dettaglio": []},
        "costi": {"totale": 58500.0, "dettaglio": []},
        "utile_perdita": -6500.0
    }}))
    .into_response()
}

async fn bulk_import(Path(kind): Path<String>, mut multipart: Multipart) -> Response {
    let mut has_file = false;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            has_file = !field.bytes().await.unwrap_or_default().is_empty();
        }
    }
    if !has_file || kind == "versamenti" {
        return detail(StatusCode::BAD_REQUEST, "Formato file non valido");
    }
    let errors: Vec<String> = (1..=12).map(|i| format!("Riga {}: importo mancante", i + 1)).collect();
    Json(json!({
        "success": true, "imported": 40, "skipped": 2,
        "errors": errors, "total_errors": 12
    }))
    .into_response()
}

async fn hr_statistics() -> Json<Value> {
    Json(json!({
        "totale_dipendenti": 8, "dipendenti_attivi": 6, "dipendenti_cessati": 2,
        "buste_paga_da_pagare": 2, "importo_da_pagare": "2850.00", "richieste_ferie_pendenti": 1
    }))
}

async fn run_email_bot() -> Json<Value> {
    Json(json!({"imported": 3, "skipped": 1, "errors": []}))
}

fn find_payslip(db: &FakeDb, id: i64) -> Option<Value> {
    db.portal_payslips.iter().find(|p| id_of(p) == id).cloned()
}

async fn portal_payslip(State(db): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut db = db.lock().unwrap();
    let Some(payslip) = db.portal_payslips.iter_mut().find(|p| id_of(p) == id) else {
        return detail(StatusCode::NOT_FOUND, "Busta paga non trovata");
    };
    let views = payslip["numero_visualizzazioni"].as_u64().unwrap_or_default() + 1;
    payslip["numero_visualizzazioni"] = json!(views);
    Json(payslip.clone()).into_response()
}

async fn accept_payslip(State(db): State<Shared>, Path(id): Path<i64>, Json(body): Json<Value>) -> Response {
    if body["accetto"] != true {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "accetto mancante");
    }
    let mut db = db.lock().unwrap();
    let Some(payslip) = db.portal_payslips.iter_mut().find(|p| id_of(p) == id) else {
        return detail(StatusCode::NOT_FOUND, "Busta paga non trovata");
    };
    if payslip["accettato"] == true {
        return detail(StatusCode::BAD_REQUEST, "Busta paga già accettata");
    }
    payslip["accettato"] = json!(true);
    let giorni = payslip["giorni_rimanenti_contestazione"].clone();
    Json(json!({
        "success": true,
        "message": "Busta paga accettata correttamente",
        "data_accettazione": "2024-05-12T10:00:00",
        "giorni_rimanenti_contestazione": giorni
    }))
    .into_response()
}

async fn download_payslip_pdf(State(db): State<Shared>, Path(id): Path<i64>) -> Response {
    let db = db.lock().unwrap();
    let Some(payslip) = find_payslip(&db, id) else {
        return detail(StatusCode::NOT_FOUND, "Busta paga non trovata");
    };
    if payslip["accettato"] != true {
        return detail(
            StatusCode::FORBIDDEN,
            "Devi prima accettare la busta paga per poterla scaricare",
        );
    }
    b"%PDF-1.4 busta paga".to_vec().into_response()
}

async fn download_dispute_form(State(db): State<Shared>, Path(id): Path<i64>) -> Response {
    let db = db.lock().unwrap();
    let Some(payslip) = find_payslip(&db, id) else {
        return detail(StatusCode::NOT_FOUND, "Busta paga non trovata");
    };
    if payslip["contestazione_scaduta"] == true {
        return detail(StatusCode::FORBIDDEN, "Termine di contestazione scaduto");
    }
    b"PK modulo contestazione".to_vec().into_response()
}
