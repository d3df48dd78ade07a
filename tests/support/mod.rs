// Mock tracking backend served by axum on an ephemeral port.
#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

#[derive(Default)]
struct MockState {
    snapshot: Value,
    factions: Value,
    // When set, every endpoint answers with this status.
    fail_status: Option<u16>,
    raw_snapshot_body: Option<String>,
    snapshot_requests: usize,
    detail_queries: Vec<(String, HashMap<String, String>)>,
}

#[derive(Clone)]
pub struct MockBackend {
    pub base_url: String,
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    // Each test gets its own server so scripted state never leaks across tests.
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(MockState {
            snapshot: snapshot_json(1, &["alpha", "bravo"]),
            factions: json!([
                {"id": 1, "name": "Blue", "color": "#0000FF", "allies": []},
                {"id": 2, "name": "Red", "color": "#FF0000"}
            ]),
            ..MockState::default()
        }));

        let app = Router::new()
            .route("/api/movement/snapshot", get(snapshot))
            .route("/api/factions", get(factions))
            .route("/api/unitdetails/{id}", get(unit_details))
            .with_state(state.clone());

        // Bind to an ephemeral port to avoid collisions with local services.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral test port");
        let addr = listener.local_addr().expect("get local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend failed");
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
        }
    }

    pub fn set_snapshot(&self, snapshot: Value) {
        self.state.lock().expect("mock state poisoned").snapshot = snapshot;
    }

    pub fn set_raw_snapshot_body(&self, body: &str) {
        self.state.lock().expect("mock state poisoned").raw_snapshot_body = Some(body.to_string());
    }

    pub fn fail_with(&self, status: u16) {
        self.state.lock().expect("mock state poisoned").fail_status = Some(status);
    }

    pub fn snapshot_requests(&self) -> usize {
        self.state.lock().expect("mock state poisoned").snapshot_requests
    }

    pub fn detail_queries(&self) -> Vec<(String, HashMap<String, String>)> {
        self.state
            .lock()
            .expect("mock state poisoned")
            .detail_queries
            .clone()
    }
}

fn failure(status: u16) -> (StatusCode, Json<Value>) {
    let status = StatusCode::from_u16(status).expect("valid status");
    (status, Json(json!({"message": "mock failure"})))
}

async fn snapshot(
    State(state): State<Arc<Mutex<MockState>>>,
) -> Result<String, (StatusCode, Json<Value>)> {
    let mut guard = state.lock().expect("mock state poisoned");
    guard.snapshot_requests += 1;
    if let Some(status) = guard.fail_status {
        return Err(failure(status));
    }
    if let Some(raw) = &guard.raw_snapshot_body {
        return Ok(raw.clone());
    }
    Ok(guard.snapshot.to_string())
}

async fn factions(State(state): State<Arc<Mutex<MockState>>>) -> Reply {
    let guard = state.lock().expect("mock state poisoned");
    if let Some(status) = guard.fail_status {
        return Err(failure(status));
    }
    Ok(Json(guard.factions.clone()))
}

async fn unit_details(
    State(state): State<Arc<Mutex<MockState>>>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    let mut guard = state.lock().expect("mock state poisoned");
    guard.detail_queries.push((id.clone(), query));
    if let Some(status) = guard.fail_status {
        return Err(failure(status));
    }
    if id == "missing" {
        return Err((StatusCode::NOT_FOUND, Json(json!({"message": "unit not found"}))));
    }
    Ok(Json(details_json(&id)))
}

pub fn unit_json(id: &str, faction_id: i64) -> Value {
    json!({
        "id": id,
        "name": format!("Unit {id}"),
        "latitude": 42.5,
        "longitude": 42.0,
        "altitude": 3000.0,
        "heading": 90.0,
        "speedMps": 200.0,
        "status": "Patrolling",
        "factionId": faction_id,
        "health": 100.0,
        "visionRange": 8000.0,
        "directionX": 1.0,
        "directionY": 0.0,
        "ammoPercentage": 100.0,
        "mainCategory": "AIRPLANE",
        "subCategory": "FIGHTER"
    })
}

pub fn snapshot_json(tick: u64, ids: &[&str]) -> Value {
    let units: Vec<Value> = ids.iter().map(|id| unit_json(id, 1)).collect();
    json!({
        "tick": tick,
        "timestamp": "2024-05-01T10:00:00Z",
        "units": units,
        "projectiles": [{
            "id": "p1",
            "latitude": 42.4,
            "longitude": 41.9,
            "heading": 45.0,
            "speedMps": 600.0,
            "type": "Missile",
            "ownerUnitId": ids.first().copied().unwrap_or("none")
        }]
    })
}

pub fn details_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Unit {id}"),
        "category": "AIRPLANE",
        "subcategory": "FIGHTER",
        "status": "Patrolling",
        "position": {"latitude": 42.5, "longitude": 42.0, "altitude": 3000.0, "heading": 90.0},
        "velocity": {"speed": 200.0, "velocityX": 200.0, "velocityY": 0.0},
        "health": {"current": 80.0, "maximum": 100.0, "percentage": 80.0, "armor": 5.0,
                   "isDestroyed": false, "isDamaged": true},
        "faction": {"id": 1, "name": "Blue", "color": "#0000FF", "isAlly": true, "isEnemy": false},
        "vision": {"rangeMeters": 8000.0, "detectionRangeMeters": 12000.0,
                   "visibleEnemies": ["r1"], "visibleAllies": [], "hasRadar": true,
                   "radarRangeMeters": 40000.0},
        "weapons": [{"weaponId": "w1", "name": "Cannon", "count": 1, "projectileType": "Bullet",
                     "currentAmmo": 150, "maxAmmo": 300, "isReloading": false, "canFire": true}],
        "ammo": {"totalAmmoPercentage": 50.0, "totalRoundsRemaining": 150,
                 "isLowAmmo": false, "isOutOfAmmo": false},
        "specifications": {},
        "baseLocation": "Kutaisi"
    })
}

pub fn temp_cache_dir() -> PathBuf {
    std::env::temp_dir().join(format!("live-track-{}", uuid::Uuid::new_v4()))
}

// Poll `check` until it holds or the timeout elapses.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
