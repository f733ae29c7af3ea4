use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{
    body::{Body, Incoming},
    header::{HeaderValue, CONTENT_TYPE},
    service::Service,
    Method, Request, Response, StatusCode,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};
use url_escape::decode;

use std::{collections::HashMap, fmt::Display, future::Future, pin::Pin};

use crate::{
    booking::{
        error::BookingError,
        resolver::resolve_active_window,
        slots::confirm_choice,
        store::{WindowStore, WindowTable},
        window::validate_window,
    },
    database::sqlite::SqliteWindowStore,
    notify::line::{Delivery, LineNotifier},
    timing::jst_datetime_now::jst_today,
};

use super::myresponse::{ConfirmResponse, StoredResponse, WindowResponse};

/// The Server
///
/// Handles every API endpoint. Window resolution and validation live in `booking`, storage in
/// `SqliteWindowStore`, and the outbound chat message in `LineNotifier`.
///
/// This struct implements the `Service` trait from `hyper`. Each connection gets its own clone;
/// the clones share the connection pool and the HTTP client.
#[derive(Clone)]
pub struct Server {
    store: SqliteWindowStore,
    notifier: LineNotifier,
}

impl Server {
    pub fn setup(store: SqliteWindowStore, notifier: LineNotifier) -> Self {
        Self { store, notifier }
    }

    /// Parses `key=value&...` pairs (query strings and form bodies) into a `hashmap`.
    /// Returns `None` if a pair is malformed.
    fn parse_params(text: &str) -> Option<HashMap<String, String>> {
        let mut map: HashMap<String, String> = HashMap::new();
        for pairs in text.split('&').filter(|pair| !pair.is_empty()) {
            let mut iterator = pairs.split('=');
            map.insert(
                iterator.next()?.to_string(),
                decode(iterator.next()?).to_string(),
            );
        }
        Some(map)
    }

    /// Read a form-encoded request body.
    async fn read_form<B>(req: Request<B>) -> Result<HashMap<String, String>, String>
    where
        B: Body,
        B::Error: Display,
    {
        let body = match req.into_body().collect().await {
            Ok(body) => body.to_bytes(),
            Err(err) => return Err(format!("Could not read body. {}", err)),
        };
        let Ok(text) = std::str::from_utf8(&body) else {
            return Err("Body is not UTF-8.".to_string());
        };
        Self::parse_params(text).ok_or_else(|| "Malformed form body.".to_string())
    }

    /// Log a resolution failure and turn it into a generic 500.
    ///
    /// Corrupt data is logged separately so it stands out from configuration gaps.
    fn booking_failure(err: &BookingError) -> Result<Response<Full<Bytes>>, hyper::Error> {
        if err.is_corruption() {
            error!(error = %err, "stored booking window is corrupt");
        } else if let BookingError::NoWindowConfigured = err {
            warn!("no booking window configured");
        } else {
            error!(error = %err, "could not resolve booking window");
        }
        Self::server_error("Could not load today's booking window.")
    }

    /// The GET /api/window endpoint.
    ///
    /// Resolves today's window (override first, then default) and lists its slots.
    fn active_window(&self) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let today = jst_today();
        match resolve_active_window(&self.store, today) {
            Ok(resolved) => {
                debug!(%today, provenance = ?resolved.provenance, "resolved window");
                Self::ok_data(WindowResponse::new(&resolved))
            }
            Err(err) => Self::booking_failure(&err),
        }
    }

    /// The POST /api/window endpoint.
    ///
    /// Form fields: `kind` (`default` or `override`), `starttime`, `finishtime`.
    /// Nothing is written unless the window validates.
    fn submit_window(
        &self,
        form: &HashMap<String, String>,
    ) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let Some(kind) = form.get("kind") else {
            return Self::bad_request("kind not provided.");
        };
        let Some(table) = WindowTable::from_kind(kind) else {
            return Self::bad_request("kind must be 'default' or 'override'.");
        };
        let (Some(start), Some(finish)) = (form.get("starttime"), form.get("finishtime")) else {
            return Self::bad_request("starttime and finishtime are required.");
        };

        let window = match validate_window(start, finish) {
            Ok(window) => window,
            Err(err) => {
                info!(error = %err, %start, %finish, "rejected window");
                return Self::bad_request(&err.user_message());
            }
        };

        if let Err(err) = self.store.insert(table, &window) {
            error!(error = %err, kind = table.kind(), "could not store window");
            return Self::server_error("Could not save the window.");
        }
        info!(kind = table.kind(), start = %window.start(), finish = %window.finish(), "stored window");
        Self::created(StoredResponse::new(
            table.kind(),
            window.start(),
            window.finish(),
        ))
    }

    /// The GET /api/history endpoint. Every window of one kind, newest first.
    fn history(&self, query: Option<&str>) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let Some(params) = query else {
            return Self::bad_request("Parameters not provided. Required kind.");
        };
        let Some(map) = Self::parse_params(params) else {
            return Self::bad_request("Malformed Parameters.");
        };
        let Some(table) = map.get("kind").and_then(|kind| WindowTable::from_kind(kind)) else {
            return Self::bad_request("kind must be 'default' or 'override'.");
        };

        match self.store.history(table) {
            Ok(records) => Self::ok_data(records),
            Err(err) => {
                error!(error = %err, kind = table.kind(), "could not read window history");
                Self::server_error("Could not load window history.")
            }
        }
    }

    /// The POST /api/confirm endpoint.
    ///
    /// Form field `time` must be one of today's slots. The booking is then forwarded to the
    /// chat; a failed forward is a 502.
    async fn confirm(
        &self,
        form: &HashMap<String, String>,
    ) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let Some(choice) = form.get("time") else {
            return Self::bad_request("time not provided.");
        };

        let today = jst_today();
        let slots = match resolve_active_window(&self.store, today) {
            Ok(resolved) => resolved.slots(),
            Err(err) => return Self::booking_failure(&err),
        };
        let slot = match confirm_choice(&slots, choice) {
            Ok(slot) => slot,
            Err(err) => {
                info!(error = %err, "rejected booking");
                return Self::bad_request(&format!("{} is not an available time today.", choice));
            }
        };

        match self.notifier.notify_booking(today, slot).await {
            Ok(delivery) => Self::ok_data(ConfirmResponse::new(
                today,
                slot,
                delivery == Delivery::Sent,
            )),
            Err(err) => {
                error!(error = %err, %slot, "could not send booking notification");
                Self::json_response(
                    StatusCode::BAD_GATEWAY,
                    json!({ "error": "Booking notification could not be sent." }).to_string(),
                )
            }
        }
    }

    async fn route<B>(&self, req: Request<B>) -> Result<Response<Full<Bytes>>, hyper::Error>
    where
        B: Body,
        B::Error: Display,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        debug!(%method, %path, "request");

        match (method, path.as_str()) {
            (Method::GET, "/api/window") => self.active_window(),
            (Method::GET, "/api/history") => self.history(req.uri().query()),
            (Method::POST, "/api/window") => match Self::read_form(req).await {
                Ok(form) => self.submit_window(&form),
                Err(message) => Self::bad_request(&message),
            },
            (Method::POST, "/api/confirm") => match Self::read_form(req).await {
                Ok(form) => self.confirm(&form).await,
                Err(message) => Self::bad_request(&message),
            },
            _ => Self::not_found(""),
        }
    }

    fn json_response(status: StatusCode, body: String) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let mut res = Response::new(Full::new(Bytes::from(body)));
        *res.status_mut() = status;
        res.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(res)
    }

    fn serialized<T: Serialize>(
        status: StatusCode,
        body: T,
    ) -> Result<Response<Full<Bytes>>, hyper::Error> {
        match serde_json::to_string(&body) {
            Ok(data) => Self::json_response(status, data),
            Err(err) => Self::server_error(&err.to_string()),
        }
    }

    /// Return a 200 OK response with the data provided.
    fn ok_data<T: Serialize>(body: T) -> Result<Response<Full<Bytes>>, hyper::Error> {
        Self::serialized(StatusCode::OK, body)
    }

    /// Return a 201 Created response with the data provided.
    fn created<T: Serialize>(body: T) -> Result<Response<Full<Bytes>>, hyper::Error> {
        Self::serialized(StatusCode::CREATED, body)
    }

    /// Return a 500 Internal Server Error response with the message provided.
    fn server_error(message: &str) -> Result<Response<Full<Bytes>>, hyper::Error> {
        Self::json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": message }).to_string(),
        )
    }

    /// Return a 404 Not Found response with the message provided. The message here is optional.
    /// Leave it empty for no message.
    fn not_found(message: &str) -> Result<Response<Full<Bytes>>, hyper::Error> {
        if message.is_empty() {
            let mut res = Response::new(Full::new(Bytes::new()));
            *res.status_mut() = StatusCode::NOT_FOUND;
            return Ok(res);
        }
        Self::json_response(StatusCode::NOT_FOUND, json!({ "error": message }).to_string())
    }

    /// Return a 400 Bad Request response with the message provided.
    fn bad_request(message: &str) -> Result<Response<Full<Bytes>>, hyper::Error> {
        Self::json_response(StatusCode::BAD_REQUEST, json!({ "error": message }).to_string())
    }
}

impl Service<Request<Incoming>> for Server {
    type Response = Response<Full<Bytes>>;
    type Error = hyper::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let server = self.clone();
        Box::pin(async move { server.route(req).await })
    }
}
