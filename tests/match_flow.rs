use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use club_court_back::{
    config::AppConfig,
    dao::{
        club_store::{ClubStore, memory::MemoryClubStore},
        models::{AttendanceEntity, AttendanceStatus, EventEntity, MemberEntity},
    },
    routes,
    state::AppState,
};
use serde_json::{Value, json};
use tower::ServiceExt;

const TOKEN: &str = "courtside";

async fn app() -> (Router, MemoryClubStore) {
    let store = MemoryClubStore::new();
    store
        .insert_event(EventEntity {
            id: "e1".into(),
            title: "Wednesday pickup".into(),
            date: "2099-01-07".into(),
        })
        .await;
    let positions = ["가드", "포워드", "센터", "guard", "forward", "center"];
    for (index, position) in positions.iter().enumerate() {
        let name = format!("player{index}");
        store
            .insert_member(MemberEntity {
                id: format!("m{index}"),
                name: name.clone(),
                position: (*position).into(),
                detail_position: String::new(),
                wins: 0,
                losses: 0,
                winning_series: 0,
                recent_results: Vec::new(),
            })
            .await;
        store
            .insert_attendance(AttendanceEntity {
                event_id: "e1".into(),
                member_name: name,
                status: AttendanceStatus::Attending,
            })
            .await;
    }

    let config = AppConfig::default().with_admin_token(Some(TOKEN.into()));
    let state = AppState::with_seed(config, 2024);
    state.set_club_store(Arc::new(store.clone())).await;
    (routes::router(state), store)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-admin-token", TOKEN);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn admin_routes_require_the_configured_token() {
    let (app, _) = app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/events/e1/teams/balance")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("POST")
        .uri("/events/e1/teams/balance")
        .header("x-admin-token", "wrong")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn balance_record_and_save_a_match() {
    let (app, store) = app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/events/e1/teams/balance",
        Some(json!({ "team_mode": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, session) = send(
        &app,
        "POST",
        "/events/e1/teams/balance",
        Some(json!({ "team_mode": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["phase"], "teams_assigned");
    let teams = session["assignment"]["teams"].as_array().unwrap();
    assert_eq!(teams.len(), 2);
    assert_eq!(teams[0]["members"].as_array().unwrap().len(), 3);
    assert_eq!(teams[1]["members"].as_array().unwrap().len(), 3);
    let team_a_member = teams[0]["members"][0]["id"].as_str().unwrap().to_owned();

    let (status, _) = send(&app, "POST", "/events/e1/teams", None).await;
    assert_eq!(status, StatusCode::OK);
    let stored = store.find_team_configuration("e1".into()).await.unwrap();
    assert_eq!(stored.map(|config| config.teams.len()), Some(2));

    let (status, body) = send(
        &app,
        "POST",
        "/events/e1/games",
        Some(json!({ "game_number": 1, "scores": { "A": 15, "B": 15 } })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].as_str().unwrap().contains("drawn"));

    let (status, series) = send(
        &app,
        "POST",
        "/events/e1/games",
        Some(json!({ "game_number": 1, "scores": { "A": 15, "B": 15 }, "winner": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(series["phase"], "series_decided");
    assert_eq!(series["leader"], "A");

    let (status, _) = send(
        &app,
        "POST",
        "/events/e1/teams/move",
        Some(json!({ "member_id": team_a_member, "from": "A", "to": "B" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, saved) = send(&app, "POST", "/events/e1/match/save", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["series_winner"], "A");
    assert_eq!(saved["updated_members"], 6);

    let member = store.member(&team_a_member).await.unwrap();
    assert_eq!(member.wins, 1);
    assert_eq!(member.winning_series, 1);

    let (status, standings) = send(&app, "GET", "/members/standings?sort=wins", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(standings.as_array().unwrap().len(), 6);
    assert_eq!(standings[0]["wins"], 1);

    let (status, matches) = send(&app, "GET", "/matches", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(matches.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "POST", "/events/e1/match/save", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn public_listing_and_unknown_event() {
    let (app, _) = app().await;

    let (status, events) = send(&app, "GET", "/events", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events[0]["id"], "e1");

    let (status, _) = send(&app, "GET", "/events/nope/session", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/events/e1%3Frev%3D2/session", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, "POST", "/events/e1%23x/teams/reset", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, health) = send(&app, "GET", "/healthcheck", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
}
