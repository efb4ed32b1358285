mod common;

use serde_json::Value;

#[tokio::test]
async fn create_booking_respects_capacity() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_approved_user(&app, "capowner", "OWNER").await;
    let (_guest_id, guest_token) = common::create_approved_user(&app, "capguest", "GUEST").await;
    let homestay_id = common::create_test_homestay(&app, &owner_token, 10).await;

    // Fill 8 of 10 spots
    let (status, body) = common::create_test_booking(&app, &guest_token, homestay_id, 8).await;
    assert_eq!(status, 200, "body: {}", body);
    assert_eq!(common::total_booked(&app.db, homestay_id).await, 8);

    // 3 more does not fit: only 2 remain
    let (status, body) = common::create_test_booking(&app, &guest_token, homestay_id, 3).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Only 2 spots left");
    assert_eq!(common::total_booked(&app.db, homestay_id).await, 8);

    // 2 more fits exactly
    let (status, body) = common::create_test_booking(&app, &guest_token, homestay_id, 2).await;
    assert_eq!(status, 200, "body: {}", body);
    assert_eq!(common::total_booked(&app.db, homestay_id).await, 10);
}

#[tokio::test]
async fn deleting_booking_restores_capacity() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_approved_user(&app, "delowner", "OWNER").await;
    let (_guest_id, guest_token) = common::create_approved_user(&app, "delguest", "GUEST").await;
    let homestay_id = common::create_test_homestay(&app, &owner_token, 10).await;

    let (status, body) = common::create_test_booking(&app, &guest_token, homestay_id, 4).await;
    assert_eq!(status, 200, "body: {}", body);
    let booking_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(common::total_booked(&app.db, homestay_id).await, 4);

    let resp = app
        .client
        .delete(app.url(&format!("/bookings/{}", booking_id)))
        .bearer_auth(&guest_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(common::total_booked(&app.db, homestay_id).await, 0);
}

#[tokio::test]
async fn cancel_booking_releases_capacity_and_resets_rooms() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_approved_user(&app, "cxlowner", "OWNER").await;
    let (_guest_id, guest_token) = common::create_approved_user(&app, "cxlguest", "GUEST").await;
    let homestay_id = common::create_test_homestay(&app, &owner_token, 10).await;

    let (status, body) = common::create_test_booking(&app, &guest_token, homestay_id, 5).await;
    assert_eq!(status, 200, "body: {}", body);
    let booking_id = body["data"]["id"].as_i64().unwrap();
    common::mark_rooms_booked(&app.db, homestay_id).await;

    let resp = app
        .client
        .patch(app.url(&format!("/bookings/{}/cancel", booking_id)))
        .bearer_auth(&guest_token)
        .json(&serde_json::json!({ "cancellation_reason": "Change of plans" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "CANCELED");
    assert_eq!(body["data"]["cancellation_reason"], "Change of plans");
    assert!(body["data"]["canceled_at"].is_string());

    // Capacity back to baseline, all rooms available again
    assert_eq!(common::total_booked(&app.db, homestay_id).await, 0);
    for status in common::room_statuses(&app.db, homestay_id).await {
        assert_eq!(status, "AVAILABLE");
    }
}

#[tokio::test]
async fn cancel_keeps_rooms_booked_while_other_bookings_remain() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_approved_user(&app, "busyowner", "OWNER").await;
    let (_guest_id, guest_token) = common::create_approved_user(&app, "busyguest", "GUEST").await;
    let homestay_id = common::create_test_homestay(&app, &owner_token, 10).await;

    let (_status, body) = common::create_test_booking(&app, &guest_token, homestay_id, 3).await;
    let first_booking = body["data"]["id"].as_i64().unwrap();
    let (_status, _body) = common::create_test_booking(&app, &guest_token, homestay_id, 4).await;
    common::mark_rooms_booked(&app.db, homestay_id).await;

    let resp = app
        .client
        .patch(app.url(&format!("/bookings/{}/cancel", first_booking)))
        .bearer_auth(&guest_token)
        .json(&serde_json::json!({ "cancellation_reason": "Found another place" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // One active booking remains: rooms stay BOOKED
    assert_eq!(common::total_booked(&app.db, homestay_id).await, 4);
    for status in common::room_statuses(&app.db, homestay_id).await {
        assert_eq!(status, "BOOKED");
    }
}

#[tokio::test]
async fn cancel_canceled_booking_conflicts() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_approved_user(&app, "dblowner", "OWNER").await;
    let (_guest_id, guest_token) = common::create_approved_user(&app, "dblguest", "GUEST").await;
    let homestay_id = common::create_test_homestay(&app, &owner_token, 10).await;

    let (_status, body) = common::create_test_booking(&app, &guest_token, homestay_id, 3).await;
    let booking_id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .patch(app.url(&format!("/bookings/{}/cancel", booking_id)))
        .bearer_auth(&guest_token)
        .json(&serde_json::json!({ "cancellation_reason": "First cancel" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Second cancel conflicts; capacity is released only once
    let resp = app
        .client
        .patch(app.url(&format!("/bookings/{}/cancel", booking_id)))
        .bearer_auth(&guest_token)
        .json(&serde_json::json!({ "cancellation_reason": "Second cancel" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Booking is already canceled");
    assert_eq!(common::total_booked(&app.db, homestay_id).await, 0);
}

#[tokio::test]
async fn verify_booking_lifecycle() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_approved_user(&app, "vfyowner", "OWNER").await;
    let (_guest_id, guest_token) = common::create_approved_user(&app, "vfyguest", "GUEST").await;
    let homestay_id = common::create_test_homestay(&app, &owner_token, 10).await;

    let (_status, body) = common::create_test_booking(&app, &guest_token, homestay_id, 2).await;
    assert_eq!(body["data"]["status"], "PENDING");
    let booking_id = body["data"]["id"].as_i64().unwrap();

    // CANCELED is not a verification outcome
    let resp = app
        .client
        .patch(app.url(&format!("/bookings/verify-booking/{}", booking_id)))
        .bearer_auth(&owner_token)
        .json(&serde_json::json!({ "status": "CANCELED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Approve
    let resp = app
        .client
        .patch(app.url(&format!("/bookings/verify-booking/{}", booking_id)))
        .bearer_auth(&owner_token)
        .json(&serde_json::json!({ "status": "APPROVED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "APPROVED");
}

#[tokio::test]
async fn verify_canceled_booking_conflicts() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_approved_user(&app, "vcowner", "OWNER").await;
    let (_guest_id, guest_token) = common::create_approved_user(&app, "vcguest", "GUEST").await;
    let homestay_id = common::create_test_homestay(&app, &owner_token, 10).await;

    let (_status, body) = common::create_test_booking(&app, &guest_token, homestay_id, 2).await;
    let booking_id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .patch(app.url(&format!("/bookings/{}/cancel", booking_id)))
        .bearer_auth(&guest_token)
        .json(&serde_json::json!({ "cancellation_reason": "Canceling first" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .patch(app.url(&format!("/bookings/verify-booking/{}", booking_id)))
        .bearer_auth(&owner_token)
        .json(&serde_json::json!({ "status": "APPROVED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Cannot update status. Booking is already canceled");
}

#[tokio::test]
async fn update_booking_rejects_total_people() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_approved_user(&app, "updowner", "OWNER").await;
    let (_guest_id, guest_token) = common::create_approved_user(&app, "updguest", "GUEST").await;
    let homestay_id = common::create_test_homestay(&app, &owner_token, 10).await;

    let (_status, body) = common::create_test_booking(&app, &guest_token, homestay_id, 3).await;
    let booking_id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .patch(app.url(&format!("/bookings/{}", booking_id)))
        .bearer_auth(&guest_token)
        .json(&serde_json::json!({ "total_people": 8 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(common::total_booked(&app.db, homestay_id).await, 3);

    // Dates and party composition are still patchable
    let resp = app
        .client
        .patch(app.url(&format!("/bookings/{}", booking_id)))
        .bearer_auth(&guest_token)
        .json(&serde_json::json!({
            "check_in": "2026-07-01T14:00:00",
            "adults": 2,
            "children": 1
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["adults"], 2);
    assert_eq!(body["data"]["children"], 1);
    assert_eq!(body["data"]["total_people"], 3);
}

#[tokio::test]
async fn guest_cannot_read_anothers_booking() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_approved_user(&app, "aclowner", "OWNER").await;
    let (_a_id, guest_a_token) = common::create_approved_user(&app, "guesta", "GUEST").await;
    let (_b_id, guest_b_token) = common::create_approved_user(&app, "guestb", "GUEST").await;
    let (_su_id, superuser_token) =
        common::create_approved_user(&app, "aclsuper", "SUPERUSER").await;
    let homestay_id = common::create_test_homestay(&app, &owner_token, 10).await;

    let (_status, body) = common::create_test_booking(&app, &guest_a_token, homestay_id, 2).await;
    let booking_id = body["data"]["id"].as_i64().unwrap();

    // Other guests are locked out
    let resp = app
        .client
        .get(app.url(&format!("/bookings/{}", booking_id)))
        .bearer_auth(&guest_b_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // The owning guest and the superuser get through
    let resp = app
        .client
        .get(app.url(&format!("/bookings/{}", booking_id)))
        .bearer_auth(&guest_a_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/bookings/{}", booking_id)))
        .bearer_auth(&superuser_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn owner_lists_bookings_with_guest_profiles() {
    let app = common::spawn_app().await;
    let (owner_id, owner_token) = common::create_approved_user(&app, "lstowner", "OWNER").await;
    let (guest_id, guest_token) = common::create_approved_user(&app, "lstguest", "GUEST").await;
    let homestay_id = common::create_test_homestay(&app, &owner_token, 10).await;

    common::create_test_booking(&app, &guest_token, homestay_id, 2).await;
    common::create_test_booking(&app, &guest_token, homestay_id, 3).await;

    // Guests cannot use the owner listing
    let resp = app
        .client
        .get(app.url("/bookings"))
        .bearer_auth(&guest_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .get(app.url("/bookings"))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);

    let first = &items[0];
    assert_eq!(first["homestay"]["owner_id"].as_i64().unwrap() as i32, owner_id);
    assert_eq!(first["guest"]["id"].as_i64().unwrap() as i32, guest_id);
    // Sensitive fields never leave the server
    assert!(first["guest"].get("password").is_none());
    assert!(first["guest"].get("password_hash").is_none());
    assert!(first["guest"].get("refresh_token").is_none());
}

#[tokio::test]
async fn get_missing_booking_returns_404() {
    let app = common::spawn_app().await;
    let (_guest_id, guest_token) = common::create_approved_user(&app, "ghostguest", "GUEST").await;

    let resp = app
        .client
        .get(app.url("/bookings/999999"))
        .bearer_auth(&guest_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
