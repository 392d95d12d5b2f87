//! Integration test: trip lifecycle with background itinerary generation.

mod common;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use common::{Auth, Reply, access_token, app, app_with, send, signed_in};
use serde_json::{Value, json};

fn tokyo() -> Value {
    json!({
        "destination": "Tokyo",
        "startDate": "2024-03-01",
        "endDate": "2024-03-04",
        "travelers": 2,
        "budget": "luxury",
        "interests": ["Food", "Temples"],
        "pace": "relaxed"
    })
}

/// Poll until the trip's itinerary is non-empty.
async fn wait_for_itinerary(app: &Router, token: &str, id: &str) -> Reply {
    for _ in 0..100 {
        let trip = send(app, "GET", &format!("/api/trips/{id}"), Auth::Bearer(token), None).await;
        if trip.json["itinerary"].as_array().is_some_and(|a| !a.is_empty()) {
            return trip;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("itinerary never arrived for trip {id}");
}

#[tokio::test]
async fn created_trip_gets_itinerary_in_background() {
    let app = app();
    let token = access_token(&signed_in(&app, "tia@example.com").await);

    let created = send(&app, "POST", "/api/trips", Auth::Bearer(&token), Some(tokyo())).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json["duration"], 3);
    assert_eq!(created.json["budget"], "luxury");
    assert!(created.json["itinerary"].as_array().unwrap().is_empty());
    let id = created.json["id"].as_str().unwrap().to_string();

    let trip = wait_for_itinerary(&app, &token, &id).await;
    let days = trip.json["itinerary"].as_array().unwrap();
    let dates: Vec<_> = days.iter().map(|d| d["date"].as_str().unwrap()).collect();
    assert_eq!(dates, ["Mar 1, 2024", "Mar 2, 2024", "Mar 3, 2024"]);
    assert_eq!(days[0]["activities"][0]["type"], "accommodation");
    assert_eq!(days[0]["activities"][0]["price"], "120");

    let list = send(&app, "GET", "/api/trips", Auth::Bearer(&token), None).await;
    assert_eq!(list.json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_trip_is_rejected() {
    let app = app();
    let token = access_token(&signed_in(&app, "val@example.com").await);

    let mut body = tokyo();
    body["endDate"] = json!("2024-02-01");
    let reply = send(&app, "POST", "/api/trips", Auth::Bearer(&token), Some(body)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error_code(), "validation_error");

    let list = send(&app, "GET", "/api/trips", Auth::Bearer(&token), None).await;
    assert!(list.json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn trips_are_private_to_their_owner() {
    let app = app();
    let owner = access_token(&signed_in(&app, "own@example.com").await);
    let other = access_token(&signed_in(&app, "oth@example.com").await);

    let created = send(&app, "POST", "/api/trips", Auth::Bearer(&owner), Some(tokyo())).await;
    let id = created.json["id"].as_str().unwrap();
    let uri = format!("/api/trips/{id}");

    let peek = send(&app, "GET", &uri, Auth::Bearer(&other), None).await;
    assert_eq!(peek.status, StatusCode::FORBIDDEN);
    let delete = send(&app, "DELETE", &uri, Auth::Bearer(&other), None).await;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);

    let list = send(&app, "GET", "/api/trips", Auth::Bearer(&other), None).await;
    assert!(list.json.as_array().unwrap().is_empty());

    let anonymous = send(&app, "GET", "/api/trips", Auth::None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn delete_then_not_found() {
    let app = app();
    let token = access_token(&signed_in(&app, "del@example.com").await);

    let created = send(&app, "POST", "/api/trips", Auth::Bearer(&token), Some(tokyo())).await;
    let uri = format!("/api/trips/{}", created.json["id"].as_str().unwrap());

    let deleted = send(&app, "DELETE", &uri, Auth::Bearer(&token), None).await;
    assert_eq!(deleted.status, StatusCode::OK);
    let gone = send(&app, "GET", &uri, Auth::Bearer(&token), None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_replaces_details_and_regenerates() {
    let app = app();
    let token = access_token(&signed_in(&app, "upd@example.com").await);
    let other = access_token(&signed_in(&app, "nosy@example.com").await);

    let created = send(&app, "POST", "/api/trips", Auth::Bearer(&token), Some(tokyo())).await;
    let id = created.json["id"].as_str().unwrap().to_string();
    wait_for_itinerary(&app, &token, &id).await;
    let uri = format!("/api/trips/{id}");

    let mut body = tokyo();
    body["startDate"] = json!("2024-04-10");
    body["endDate"] = json!("2024-04-12");
    body["travelers"] = json!(3);

    let denied = send(&app, "PUT", &uri, Auth::Bearer(&other), Some(body.clone())).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let mut bad = body.clone();
    bad["interests"] = json!([]);
    let invalid = send(&app, "PUT", &uri, Auth::Bearer(&token), Some(bad)).await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.error_code(), "validation_error");

    // The first generation may still be releasing its slot.
    let mut updated = send(&app, "PUT", &uri, Auth::Bearer(&token), Some(body.clone())).await;
    for _ in 0..50 {
        if updated.status != StatusCode::CONFLICT {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        updated = send(&app, "PUT", &uri, Auth::Bearer(&token), Some(body.clone())).await;
    }
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json["duration"], 2);
    assert_eq!(updated.json["travelers"], 3);
    assert_eq!(updated.json["createdAt"], created.json["createdAt"]);

    for _ in 0..100 {
        let trip = send(&app, "GET", &uri, Auth::Bearer(&token), None).await;
        if trip.json["itinerary"][0]["date"] == "Apr 10, 2024" {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("itinerary was not regenerated for the new dates");
}

#[tokio::test]
async fn regenerate_is_accepted_once_idle() {
    let app = app();
    let token = access_token(&signed_in(&app, "re@example.com").await);

    let created = send(&app, "POST", "/api/trips", Auth::Bearer(&token), Some(tokyo())).await;
    let id = created.json["id"].as_str().unwrap().to_string();
    wait_for_itinerary(&app, &token, &id).await;

    let uri = format!("/api/trips/{id}/itinerary");
    let accepted = send(&app, "POST", &uri, Auth::Bearer(&token), None).await;
    assert_eq!(accepted.status, StatusCode::ACCEPTED);
    assert_eq!(accepted.json["tripId"], id.as_str());
    assert_eq!(accepted.json["status"], "generating");

    let missing = send(
        &app,
        "POST",
        &format!("/api/trips/{}/itinerary", uuid::Uuid::new_v4()),
        Auth::Bearer(&token),
        None,
    )
    .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn preview_returns_itinerary_without_saving() {
    let app = app();
    let token = access_token(&signed_in(&app, "pre@example.com").await);

    let reply = send(
        &app,
        "POST",
        "/api/ai/generate-itinerary",
        Auth::Bearer(&token),
        Some(tokyo()),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json["success"], true);
    assert_eq!(reply.json["itinerary"][2]["date"], "Mar 3, 2024");

    let list = send(&app, "GET", "/api/trips", Auth::Bearer(&token), None).await;
    assert!(list.json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn preview_with_unusable_reply_is_bad_gateway() {
    let app = app_with("I cannot plan trips right now.");
    let token = access_token(&signed_in(&app, "bg@example.com").await);

    let reply = send(
        &app,
        "POST",
        "/api/ai/generate-itinerary",
        Auth::Bearer(&token),
        Some(tokyo()),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_GATEWAY);
    assert_eq!(reply.error_code(), "generation_failed");
}
