mod common;

use sea_orm::ConnectionTrait;
use serde_json::Value;

#[tokio::test]
async fn owner_is_limited_to_one_listing() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_approved_user(&app, "oneowner", "OWNER").await;

    common::create_test_homestay(&app, &owner_token, 10).await;

    let resp = app
        .client
        .post(app.url("/homestay"))
        .bearer_auth(&owner_token)
        .json(&serde_json::json!({
            "name": "Second Listing",
            "description": "Should be rejected",
            "location": "Anywhere",
            "total_capacity": 5,
            "check_in": "2026-01-01T14:00:00",
            "check_out": "2026-01-01T11:00:00"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn community_owner_may_hold_multiple_listings() {
    let app = common::spawn_app().await;
    let (_id, token) = common::create_approved_user(&app, "community", "COMMUNITY_OWNER").await;

    let first = common::create_test_homestay(&app, &token, 10).await;
    let second = common::create_test_homestay(&app, &token, 8).await;
    assert_ne!(first, second);

    let resp = app
        .client
        .get(app.url("/homestay"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn guest_cannot_create_listing() {
    let app = common::spawn_app().await;
    let (_id, token) = common::create_approved_user(&app, "wannabe", "GUEST").await;

    let resp = app
        .client
        .post(app.url("/homestay"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "name": "Guest Listing",
            "description": "Guests cannot host",
            "location": "Nowhere",
            "total_capacity": 4,
            "check_in": "2026-01-01T14:00:00",
            "check_out": "2026-01-01T11:00:00"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn create_homestay_persists_rooms_and_facilities() {
    let app = common::spawn_app().await;
    let (owner_id, owner_token) = common::create_approved_user(&app, "fullowner", "OWNER").await;

    let homestay_id = common::create_test_homestay(&app, &owner_token, 12).await;

    let data = common::get_homestay(&app, &owner_token, homestay_id).await;
    assert_eq!(data["owner_id"].as_i64().unwrap() as i32, owner_id);
    assert_eq!(data["total_capacity"], 12);
    assert_eq!(data["total_booked"], 0);

    let statuses = common::room_statuses(&app.db, homestay_id).await;
    assert_eq!(statuses.len(), 2);
    for status in statuses {
        assert_eq!(status, "AVAILABLE");
    }
}

#[tokio::test]
async fn facilities_are_deduplicated_by_name() {
    let app = common::spawn_app().await;
    let (_a_id, a_token) = common::create_approved_user(&app, "facowner_a", "OWNER").await;
    let (_b_id, b_token) = common::create_approved_user(&app, "facowner_b", "OWNER").await;

    // Both listings name "WiFi" and "Parking"; the catalog keeps one row each
    common::create_test_homestay(&app, &a_token, 10).await;
    common::create_test_homestay(&app, &b_token, 10).await;

    let row = app
        .db
        .query_one(sea_orm::Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT COUNT(*) AS cnt FROM facilities".to_string(),
        ))
        .await
        .unwrap()
        .unwrap();
    let count: i64 = row.try_get("", "cnt").unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn public_catalog_list_and_search() {
    let app = common::spawn_app().await;
    let (_id, token) = common::create_approved_user(&app, "pubowner", "COMMUNITY_OWNER").await;
    common::create_test_homestay(&app, &token, 10).await;
    common::create_test_homestay(&app, &token, 6).await;

    // No auth required for the catalog
    let resp = app
        .client
        .get(app.url("/homestay/list-all"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // Case-insensitive substring search on location
    let resp = app
        .client
        .get(app.url("/homestay/search?location=test%20village"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let resp = app
        .client
        .get(app.url("/homestay/search?location=atlantis"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn only_the_owner_updates_a_listing() {
    let app = common::spawn_app().await;
    let (_a_id, a_token) = common::create_approved_user(&app, "updowner_a", "OWNER").await;
    let (_b_id, b_token) = common::create_approved_user(&app, "updowner_b", "OWNER").await;
    let homestay_id = common::create_test_homestay(&app, &a_token, 10).await;

    let resp = app
        .client
        .patch(app.url(&format!("/homestay/{}", homestay_id)))
        .bearer_auth(&b_token)
        .json(&serde_json::json!({ "name": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .patch(app.url(&format!("/homestay/{}", homestay_id)))
        .bearer_auth(&a_token)
        .json(&serde_json::json!({ "name": "Renamed", "total_capacity": 14 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["name"], "Renamed");
    assert_eq!(body["data"]["total_capacity"], 14);
}

#[tokio::test]
async fn deleting_a_listing_removes_its_bookings() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_approved_user(&app, "rmowner", "OWNER").await;
    let (_guest_id, guest_token) = common::create_approved_user(&app, "rmguest", "GUEST").await;
    let homestay_id = common::create_test_homestay(&app, &owner_token, 10).await;

    let (_status, body) = common::create_test_booking(&app, &guest_token, homestay_id, 2).await;
    let booking_id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .delete(app.url(&format!("/homestay/{}", homestay_id)))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/bookings/{}", booking_id)))
        .bearer_auth(&guest_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
