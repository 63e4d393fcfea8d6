use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::opr::WeightingPolicy;
use crate::pipeline::{OprCalculator, OprRequest, TeamRatings};
use crate::providers::Provider;

pub struct AppState {
    pub calculator: OprCalculator,
    /// Policy applied when the form asks for weighting.
    pub weighting: WeightingPolicy,
}

/// Body of `POST /api/opr`.
#[derive(Debug, Deserialize)]
pub struct OprForm {
    pub game_type: String,
    pub event_key: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_weighted")]
    pub weighted: bool,
}

fn default_weighted() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct OprResponse {
    pub provider: Provider,
    pub event_key: String,
    pub weighted: bool,
    pub report: String,
    pub teams: Vec<TeamRatings>,
    pub computed_at: DateTime<Utc>,
}

/// Build the Axum router for the calculator page.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/opr", post(calculate_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

async fn index_handler() -> impl IntoResponse {
    Html(CALCULATOR_HTML)
}

/// POST /api/opr
async fn calculate_handler(
    State(state): State<Arc<AppState>>,
    Json(form): Json<OprForm>,
) -> Result<Json<OprResponse>, (StatusCode, String)> {
    let provider = Provider::from_game_type(&form.game_type)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let weighting = if form.weighted {
        state.weighting
    } else {
        WeightingPolicy::Uniform
    };
    let req = OprRequest {
        provider,
        event_key: form.event_key,
        api_key: form.api_key,
        weighting,
    };
    info!("Calculating {} OPR for {}", provider, req.event_key);

    let ratings = state.calculator.calculate(&req).await.map_err(|e| {
        warn!("OPR calculation failed: {:#}", e);
        (StatusCode::BAD_GATEWAY, format!("An error occurred: {:#}", e))
    })?;

    Ok(Json(OprResponse {
        provider,
        event_key: ratings.event_key.clone(),
        weighted: weighting.is_weighted(),
        report: ratings.report(),
        teams: ratings.rows(),
        computed_at: ratings.computed_at,
    }))
}

/// Embedded single-file calculator page (HTML + CSS + JS)
const CALCULATOR_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Robotics OPR Calculator</title>
<style>
  :root {
    --bg: #0f1117;
    --card: #1a1d27;
    --border: #2a2d3a;
    --accent: #6c63ff;
    --red: #ff4f6a;
    --text: #e0e0e0;
    --muted: #8888aa;
  }
  * { box-sizing: border-box; margin: 0; padding: 0; }
  body { background: var(--bg); color: var(--text); font-family: 'Segoe UI', system-ui, sans-serif; }
  header { padding: 1rem 2rem; border-bottom: 1px solid var(--border); }
  header h1 { font-size: 1.4rem; font-weight: 700; }
  header p { color: var(--muted); font-size: .85rem; margin-top: .3rem; }
  main { padding: 1.5rem 2rem; display: grid; gap: 1.5rem; max-width: 960px; }
  .panel { background: var(--card); border: 1px solid var(--border); border-radius: 10px; padding: 1.2rem; display: grid; gap: 1rem; }
  .row { display: flex; gap: 1rem; flex-wrap: wrap; align-items: center; }
  label { color: var(--muted); font-size: .8rem; text-transform: uppercase; letter-spacing: .06em; }
  input[type=text], input[type=password] { background: var(--bg); color: var(--text); border: 1px solid var(--border); border-radius: 6px; padding: .5rem .7rem; min-width: 260px; }
  button { background: var(--accent); border: none; color: #fff; padding: .6rem 1.4rem; border-radius: 6px; cursor: pointer; font-weight: 600; }
  button:disabled { opacity: .5; cursor: wait; }
  .note { color: var(--muted); font-size: .8rem; }
  .error { color: var(--red); }
  table { width: 100%; border-collapse: collapse; }
  th { padding: .7rem 1rem; text-align: left; font-size: .75rem; text-transform: uppercase; color: var(--muted); border-bottom: 1px solid var(--border); }
  td { padding: .65rem 1rem; font-size: .88rem; border-bottom: 1px solid #1e2130; }
  tr:last-child td { border-bottom: none; }
  .empty { color: var(--muted); text-align: center; padding: 2rem; font-size: .9rem; }
  pre { white-space: pre-wrap; font-size: .82rem; color: var(--muted); }
</style>
</head>
<body>
<header>
  <h1>Robotics OPR Calculator</h1>
  <p>Select your game and provide the required inputs to calculate the Offensive Power Rating (OPR).</p>
</header>

<main>
  <form class="panel" id="opr-form">
    <div class="row">
      <label>Game Type</label>
      <label><input type="radio" name="game_type" value="FRC" checked> FRC</label>
      <label><input type="radio" name="game_type" value="FTC"> FTC</label>
      <label><input type="checkbox" name="weighted" checked> Weight recent matches</label>
    </div>
    <div class="row">
      <label for="event_key">Event Key</label>
      <input type="text" id="event_key" name="event_key" required>
      <label for="api_key">API Key</label>
      <input type="password" id="api_key" name="api_key">
    </div>
    <p class="note">Your data is not preserved.</p>
    <div class="row"><button type="submit" id="calc-btn">Calculate</button><span id="status" class="note"></span></div>
  </form>

  <div class="panel">
    <table>
      <thead><tr><th>#</th><th>Team</th><th>Total OPR</th><th>Teleop OPR</th><th>Auto OPR</th></tr></thead>
      <tbody id="opr-tbody"><tr><td colspan="5" class="empty">No results yet</td></tr></tbody>
    </table>
    <pre id="report"></pre>
  </div>
</main>

<script>
const form = document.getElementById('opr-form');
form.addEventListener('submit', async (ev) => {
  ev.preventDefault();
  const btn = document.getElementById('calc-btn');
  const status = document.getElementById('status');
  const data = new FormData(form);
  const body = {
    game_type: data.get('game_type'),
    event_key: data.get('event_key'),
    api_key: data.get('api_key') || null,
    weighted: data.get('weighted') === 'on',
  };
  btn.disabled = true;
  status.className = 'note';
  status.textContent = 'Calculating…';
  try {
    const r = await fetch('/api/opr', { method: 'POST', headers: { 'Content-Type': 'application/json' }, body: JSON.stringify(body) });
    if (!r.ok) {
      status.className = 'note error';
      status.textContent = await r.text();
      return;
    }
    const res = await r.json();
    const tbody = document.getElementById('opr-tbody');
    if (!res.teams.length) { tbody.innerHTML = '<tr><td colspan="5" class="empty">No teams</td></tr>'; }
    else {
      tbody.innerHTML = res.teams.map((t, i) => `<tr>
        <td>${i + 1}</td>
        <td>${t.team}</td>
        <td>${t.total.toFixed(2)}</td>
        <td>${t.teleop.toFixed(2)}</td>
        <td>${t.auto.toFixed(2)}</td>
      </tr>`).join('');
    }
    document.getElementById('report').textContent = res.report;
    status.textContent = `${res.provider} ${res.event_key} · ${res.weighted ? 'weighted' : 'unweighted'} · ${new Date(res.computed_at).toLocaleTimeString()}`;
  } catch (e) {
    status.className = 'note error';
    status.textContent = 'An error occurred: ' + e;
  } finally {
    btn.disabled = false;
  }
});
</script>
</body>
</html>"#;
