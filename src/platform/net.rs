//! Highscore endpoint client over `fetch`

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use crate::error::NetworkError;
use crate::highscores::{HIGHSCORES_PATH, LeaderboardEntry, ScoresResponse, SubmitRequest};

fn js_reason(value: JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Send `request` and return the body of a 2xx response
async fn send(request: Request) -> Result<String, NetworkError> {
    let window =
        web_sys::window().ok_or_else(|| NetworkError::Request("no window".to_string()))?;
    let value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| NetworkError::Request(js_reason(e)))?;
    let response: Response = value
        .dyn_into()
        .map_err(|_| NetworkError::Malformed("not a Response".to_string()))?;
    if !response.ok() {
        return Err(NetworkError::Status(response.status()));
    }
    let text = response
        .text()
        .map_err(|e| NetworkError::Malformed(js_reason(e)))?;
    let body = JsFuture::from(text)
        .await
        .map_err(|e| NetworkError::Malformed(js_reason(e)))?;
    body.as_string()
        .ok_or_else(|| NetworkError::Malformed("body is not text".to_string()))
}

/// `GET /api/highscores`
pub async fn fetch_leaderboard() -> Result<Vec<LeaderboardEntry>, NetworkError> {
    let request = Request::new_with_str(HIGHSCORES_PATH)
        .map_err(|e| NetworkError::Request(js_reason(e)))?;
    let body = send(request).await?;
    Ok(ScoresResponse::from_json(&body)?.scores)
}

/// `POST /api/highscores` with `{name, score, token}`
pub async fn submit_score(submission: &SubmitRequest) -> Result<ScoresResponse, NetworkError> {
    let json =
        serde_json::to_string(submission).map_err(|e| NetworkError::Request(e.to_string()))?;

    let init = RequestInit::new();
    init.set_method("POST");
    init.set_body(&JsValue::from_str(&json));
    let request = Request::new_with_str_and_init(HIGHSCORES_PATH, &init)
        .map_err(|e| NetworkError::Request(js_reason(e)))?;
    request
        .headers()
        .set("Content-Type", "application/json")
        .map_err(|e| NetworkError::Request(js_reason(e)))?;

    let body = send(request).await?;
    ScoresResponse::from_json(&body)
}
