use crate::config::Config;
use crate::error::{GestionaleError, GestionaleResult};
use crate::state::SessionState;
use reqwest::{multipart, Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Query or form pairs as they go on the wire.
pub type Params = Vec<(&'static str, String)>;

pub const NO_QUERY: &[(&str, &str)] = &[];

/// HTTP client for the back-office backend.
///
/// Holds the injected session: the bearer token goes on every request and the
/// user id scopes every listing through `id_utente`.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<Mutex<SessionState>>,
}

// The token stays out of debug output.
impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(config: &Config, session: SessionState) -> GestionaleResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self::with_client(http, &config.api_url, session))
    }

    pub fn with_client(http: Client, base_url: &str, session: SessionState) -> Self {
        ApiClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: Arc::new(Mutex::new(session)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> GestionaleResult<SessionState> {
        self.session
            .lock()
            .map(|s| s.clone())
            .map_err(|_| GestionaleError::Internal("session lock poisoned".to_string()))
    }

    pub(crate) fn replace_session(&self, next: SessionState) -> GestionaleResult<()> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| GestionaleError::Internal("session lock poisoned".to_string()))?;
        *session = next;
        Ok(())
    }

    pub fn user_id(&self) -> GestionaleResult<i64> {
        self.session()?.user_id()
    }

    /// `id_utente` pair for user-scoped calls. Fails before any network traffic
    /// when nobody is logged in.
    pub fn user_params(&self) -> GestionaleResult<Params> {
        Ok(vec![("id_utente", self.user_id()?.to_string())])
    }

    fn request(&self, method: Method, path: &str) -> GestionaleResult<RequestBuilder> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method, url);
        let session = self.session()?;
        if let Some(token) = session.bearer() {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    /// Sends the request and returns the raw body of a 2xx response.
    async fn send_raw(&self, method: &Method, path: &str, builder: RequestBuilder) -> GestionaleResult<Vec<u8>> {
        tracing::debug!("{} {}", method, path);

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("{} {} failed: {}", method, path, e);
                return Err(e.into());
            }
        };

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let detail = extract_detail(&body);
            tracing::error!(
                "{} {} returned {}: {}",
                method,
                path,
                status,
                detail.as_deref().unwrap_or("-")
            );
            if status == StatusCode::UNAUTHORIZED {
                return Err(GestionaleError::Auth(
                    detail.unwrap_or_else(|| "token non valido".to_string()),
                ));
            }
            return Err(GestionaleError::Status { status, detail });
        }
        Ok(body.to_vec())
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        builder: RequestBuilder,
    ) -> GestionaleResult<T> {
        let body = self.send_raw(&method, path, builder).await?;

        if body.is_empty() {
            return serde_json::from_value(Value::Null)
                .or_else(|_| serde_json::from_value(Value::Object(Default::default())))
                .map_err(GestionaleError::from);
        }

        serde_json::from_slice(&body).map_err(|e| {
            tracing::error!("{} {} returned an unexpected body: {}", method, path, e);
            GestionaleError::from(e)
        })
    }

    /// GET for file downloads: the body is returned as-is.
    pub async fn get_bytes<Q>(&self, path: &str, query: &Q) -> GestionaleResult<Vec<u8>>
    where
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::GET, path)?.query(query);
        self.send_raw(&Method::GET, path, builder).await
    }

    pub async fn get<T, Q>(&self, path: &str, query: &Q) -> GestionaleResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::GET, path)?.query(query);
        self.send(Method::GET, path, builder).await
    }

    pub async fn post_form<T, Q, F>(&self, path: &str, query: &Q, form: &F) -> GestionaleResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
        F: Serialize + ?Sized,
    {
        let builder = self.request(Method::POST, path)?.query(query).form(form);
        self.send(Method::POST, path, builder).await
    }

    pub async fn put_form<T, Q, F>(&self, path: &str, query: &Q, form: &F) -> GestionaleResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
        F: Serialize + ?Sized,
    {
        let builder = self.request(Method::PUT, path)?.query(query).form(form);
        self.send(Method::PUT, path, builder).await
    }

    pub async fn post_json<T, Q, B>(&self, path: &str, query: &Q, body: &B) -> GestionaleResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let builder = self.request(Method::POST, path)?.query(query).json(body);
        self.send(Method::POST, path, builder).await
    }

    pub async fn post_multipart<T, Q>(
        &self,
        path: &str,
        query: &Q,
        form: multipart::Form,
    ) -> GestionaleResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::POST, path)?.query(query).multipart(form);
        self.send(Method::POST, path, builder).await
    }

    pub async fn delete<T, Q>(&self, path: &str, query: &Q) -> GestionaleResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::DELETE, path)?.query(query);
        self.send(Method::DELETE, path, builder).await
    }
}

fn extract_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("detail") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => value
            .get("error")
            .or_else(|| value.get("message"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        Some(other) => Some(other.to_string()),
    }
}

fn default_success() -> bool {
    true
}

/// `{success, data, message}` body returned by nearly every endpoint.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub detail: Option<String>,
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    fn reason(&self) -> String {
        self.detail
            .clone()
            .or_else(|| self.error.clone())
            .or_else(|| self.message.clone())
            .unwrap_or_default()
    }

    fn check(&self) -> GestionaleResult<()> {
        if self.success {
            Ok(())
        } else {
            Err(GestionaleError::Rejected(self.reason()))
        }
    }

    pub fn into_data(self, what: &str) -> GestionaleResult<T> {
        self.check()?;
        self.data
            .ok_or_else(|| GestionaleError::MissingData(what.to_string()))
    }

    pub fn into_optional(self) -> GestionaleResult<Option<T>> {
        self.check()?;
        Ok(self.data)
    }

    pub fn into_message(self) -> GestionaleResult<Option<String>> {
        self.check()?;
        Ok(self.message)
    }
}

impl<T> Envelope<Vec<T>> {
    /// A missing or null `data` is an empty listing, not an error.
    pub fn into_list(self, what: &str) -> GestionaleResult<Vec<T>> {
        self.check()?;
        match self.data {
            Some(items) => Ok(items),
            None => {
                tracing::debug!("{}: response carried no data, treating as empty", what);
                Ok(Vec::new())
            }
        }
    }
}
