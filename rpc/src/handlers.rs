//! HTTP request handlers.
//!
//! JSON field names are camelCase to match the browser frontend.

use std::net::SocketAddr;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use linkgate_node::GenerateRequest;
use serde::{Deserialize, Serialize};

use crate::client::{client_fingerprint, request_origin, resolve_context};
use crate::{AppState, RpcError};

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, RpcError> {
    body.map(|Json(b)| b)
        .map_err(|e| RpcError::InvalidRequest(e.body_text()))
}

fn query<T>(q: Result<Query<T>, QueryRejection>) -> Result<T, RpcError> {
    q.map(|Query(v)| v)
        .map_err(|e| RpcError::InvalidRequest(e.body_text()))
}

fn required(value: Option<String>, field: &str) -> Result<String, RpcError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| RpcError::InvalidRequest(format!("{field} is required")))
}

// ── Generate ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub captcha_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub shortened_url: String,
}

/// `POST /api/v5/generate`
pub async fn generate(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Response, RpcError> {
    let body = json_body(body)?;
    let trust = state.settings.trust_forwarded_for;
    let request = GenerateRequest {
        slug: required(body.slug, "slug")?,
        proof: body.captcha_token,
        client: client_fingerprint(&headers, peer.as_ref(), trust),
        origin: request_origin(&headers, trust),
    };

    let generated = state.resolver.generate(request).await?;
    let cookie = HeaderValue::from_str(&state.settings.session_cookie(generated.token.as_str()))
        .map_err(|e| RpcError::Server(format!("invalid cookie header: {e}")))?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(GenerateResponse {
            success: true,
            shortened_url: generated.outward_url,
        }),
    )
        .into_response())
}

// ── Resolve ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveBody {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub captcha_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub success: bool,
    pub target_url: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// `POST /api/v5/resolve`: returns the target as JSON.
///
/// A browser calling this from a gateway page sends that page as `Referer`.
/// Under a strict policy the gateway host must then be listed in
/// `[gate].allowed_referers`, or every call fails with `INVALID_REFERER`.
pub async fn resolve_json(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Json<ResolveBody>, JsonRejection>,
) -> Result<Json<ResolveResponse>, RpcError> {
    let body = json_body(body)?;
    let token = required(body.token, "token")?;
    let ctx = resolve_context(&headers, peer.as_ref(), state.settings.trust_forwarded_for);
    let target_url = state
        .resolver
        .resolve(&token, body.captcha_token.as_deref(), &ctx)
        .await?;
    Ok(Json(ResolveResponse {
        success: true,
        target_url,
    }))
}

/// `GET /api/v5/resolve?token=`: redirects to the target.
pub async fn resolve_redirect(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    q: Result<Query<TokenQuery>, QueryRejection>,
) -> Result<Response, RpcError> {
    let token = required(query(q)?.token, "token")?;
    redirect_to_target(&state, &token, peer.as_ref(), &headers).await
}

/// `GET /v5/resolve/{token}`: the URL handed to the shortener.
pub async fn resolve_path(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Path(token): Path<String>,
) -> Result<Response, RpcError> {
    redirect_to_target(&state, &token, peer.as_ref(), &headers).await
}

async fn redirect_to_target(
    state: &AppState,
    token: &str,
    peer: Option<&ConnectInfo<SocketAddr>>,
    headers: &HeaderMap,
) -> Result<Response, RpcError> {
    let ctx = resolve_context(headers, peer, state.settings.trust_forwarded_for);
    let target = state.resolver.resolve(token, None, &ctx).await?;
    let location = HeaderValue::from_str(&target)
        .map_err(|e| RpcError::Server(format!("invalid target url: {e}")))?;
    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, location),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
    )
        .into_response())
}

// ── Link ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SlugQuery {
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// `GET /api/v5/link/get?slug=`: existence only, the target stays private.
pub async fn link_get(
    State(state): State<AppState>,
    q: Result<Query<SlugQuery>, QueryRejection>,
) -> Result<Json<SuccessResponse>, RpcError> {
    let slug = required(query(q)?.slug, "slug")?;
    state.resolver.link_exists(&slug)?;
    Ok(Json(SuccessResponse { success: true }))
}

// ── V4 codec ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeBody {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub captcha_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EncodeResponse {
    pub success: bool,
    pub link: String,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeBody {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub captcha_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DecodeResponse {
    pub success: bool,
    pub url: String,
}

/// `POST /api/v4`: encode a URL into a shareable V4 link.
pub async fn encode_v4(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<EncodeBody>, JsonRejection>,
) -> Result<Json<EncodeResponse>, RpcError> {
    let body = json_body(body)?;
    let url = required(body.url, "url")?;
    let proof = required(body.captcha_token, "captchaToken")?;

    let slug = state.resolver.encode_link(&url, Some(&proof)).await?;
    let origin = request_origin(&headers, state.settings.trust_forwarded_for);
    let link = format!("{}/v4/{slug}", state.resolver.base_url(&origin));
    Ok(Json(EncodeResponse {
        success: true,
        link,
        slug,
    }))
}

/// `POST /api/v4/redirect`: decode a V4 slug.
pub async fn decode_v4(
    State(state): State<AppState>,
    body: Result<Json<DecodeBody>, JsonRejection>,
) -> Result<Json<DecodeResponse>, RpcError> {
    let body = json_body(body)?;
    let slug = required(body.slug, "slug")?;
    let proof = required(body.captcha_token, "captchaToken")?;
    let url = state.resolver.decode_link(&slug, Some(&proof)).await?;
    Ok(Json(DecodeResponse { success: true, url }))
}

// ── Operations ───────────────────────────────────────────────────────────

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> Result<Response, RpcError> {
    let text = state
        .resolver
        .metrics()
        .encode()
        .map_err(|e| RpcError::Server(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    )
        .into_response())
}

/// `GET /health`
pub async fn health() -> Json<SuccessResponse> {
    Json(SuccessResponse { success: true })
}
