//! Forgot-password and reset-password flows against the in-memory stores.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{body_json, location, session_cookie, TestApp};
use serde_json::json;

async fn registered() -> TestApp {
    let t = TestApp::new();
    let res = t
        .post_json("/en/signup", json!({ "email": "a@x.com", "password": "secret1" }), None)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    t
}

async fn forgot(t: &TestApp, email: &str) -> (StatusCode, serde_json::Value) {
    let res = t
        .post_json("/en/forgot-password", json!({ "email": email }), None)
        .await;
    (res.status(), body_json(res).await)
}

#[tokio::test]
async fn unknown_and_known_emails_get_the_same_answer() {
    let t = registered().await;

    let known = forgot(&t, "a@x.com").await;
    let unknown = forgot(&t, "nobody@x.com").await;
    assert_eq!(known.0, StatusCode::OK);
    assert_eq!(known, unknown);
    assert_eq!(
        known.1,
        json!({ "message": "We have sent you an email with a link to reset your password." })
    );

    let reset_jobs = t
        .jobs
        .jobs()
        .await
        .into_iter()
        .filter(|j| j.data["template"] == "reset-password")
        .count();
    assert_eq!(reset_jobs, 1);
}

#[tokio::test]
async fn forgot_password_rejects_malformed_email() {
    let t = registered().await;
    let (status, body) = forgot(&t, "not-an-email").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email address was invalid.");
}

#[tokio::test]
async fn second_request_within_window_is_limited_until_expiry() {
    let t = registered().await;

    assert_eq!(forgot(&t, "a@x.com").await.0, StatusCode::OK);
    let first_token = t.last_reset_token().await.unwrap();

    let (status, body) = forgot(&t, "a@x.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("You can only request a password reset every 30 minutes."));
    assert!(message.contains("try again in"));

    // the 30 minutes pass
    assert!(
        t.users
            .set_reset_token_expiry("a@x.com", Utc::now() - Duration::seconds(1))
            .await
    );
    assert_eq!(forgot(&t, "a@x.com").await.0, StatusCode::OK);
    let second_token = t.last_reset_token().await.unwrap();
    assert_ne!(first_token, second_token);
}

#[tokio::test]
async fn stored_token_is_a_digest_with_thirty_minute_expiry() {
    let t = registered().await;
    let before = Utc::now();
    forgot(&t, "a@x.com").await;
    let token = t.last_reset_token().await.unwrap();

    let user = t.users.all().await.remove(0);
    assert_ne!(user.reset_token.as_deref(), Some(token.as_str()));
    let expires_at = user.reset_token_expires_at.unwrap();
    assert!(expires_at >= before + Duration::minutes(30));
    assert!(expires_at <= Utc::now() + Duration::minutes(30));
}

#[tokio::test]
async fn reset_with_valid_token_changes_password_and_logs_in() {
    let t = registered().await;
    forgot(&t, "a@x.com").await;
    let token = t.last_reset_token().await.unwrap();

    let res = t
        .post_json(
            &format!("/en/reset-password/{}", token),
            json!({ "email": "a@x.com", "password": "brand-new-pass" }),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = session_cookie(&res).unwrap();
    let body = body_json(res).await;
    assert_eq!(body["message"], "You have successfully reset your password.");
    assert_eq!(body["redirectTo"], "/en");
    assert!(t.session(&cookie).await.unwrap().user_id.is_some());

    let user = t.users.all().await.remove(0);
    assert!(user.reset_token.is_none());
    assert!(user.reset_token_expires_at.is_none());

    let old = t
        .post_json("/en/login", json!({ "email": "a@x.com", "password": "secret1" }), None)
        .await;
    assert_eq!(old.status(), StatusCode::BAD_REQUEST);
    let new = t
        .post_json(
            "/en/login",
            json!({ "email": "a@x.com", "password": "brand-new-pass" }),
            None,
        )
        .await;
    assert_eq!(new.status(), StatusCode::OK);

    // consumed: reuse fails, a new request is allowed right away
    let reuse = t
        .post_json(
            &format!("/en/reset-password/{}", token),
            json!({ "email": "a@x.com", "password": "another-pass" }),
            None,
        )
        .await;
    assert_eq!(reuse.status(), StatusCode::BAD_REQUEST);
    assert_eq!(forgot(&t, "a@x.com").await.0, StatusCode::OK);
}

#[tokio::test]
async fn invalid_token_cases_share_one_error() {
    let t = registered().await;
    t.post_json("/en/signup", json!({ "email": "b@x.com", "password": "secret1" }), None)
        .await;
    forgot(&t, "a@x.com").await;
    let token = t.last_reset_token().await.unwrap();
    let uri = format!("/en/reset-password/{}", token);

    let wrong_token = t
        .post_json(
            "/en/reset-password/deadbeef",
            json!({ "email": "a@x.com", "password": "brand-new-pass" }),
            None,
        )
        .await;
    let wrong_email = t
        .post_json(&uri, json!({ "email": "b@x.com", "password": "brand-new-pass" }), None)
        .await;

    t.users
        .set_reset_token_expiry("a@x.com", Utc::now() - Duration::minutes(1))
        .await;
    let expired = t
        .post_json(&uri, json!({ "email": "a@x.com", "password": "brand-new-pass" }), None)
        .await;

    let mut bodies = Vec::new();
    for res in [wrong_token, wrong_email, expired] {
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        bodies.push(body_json(res).await);
    }
    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[1], bodies[2]);
    assert_eq!(
        bodies[0]["message"],
        "Reset token and email were not valid together."
    );
}

#[tokio::test]
async fn weak_password_leaves_token_usable_and_session_anonymous() {
    let t = registered().await;
    forgot(&t, "a@x.com").await;
    let token = t.last_reset_token().await.unwrap();
    let uri = format!("/en/reset-password/{}", token);

    let res = t
        .post_json(&uri, json!({ "email": "a@x.com", "password": "abc" }), None)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(session_cookie(&res).is_none());
    assert_eq!(
        body_json(res).await["message"],
        "Password strength was not strong enough."
    );
    assert!(t.users.all().await[0].reset_token.is_some());

    let res = t
        .post_json(&uri, json!({ "email": "a@x.com", "password": "long-enough" }), None)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn reset_validates_presence_of_fields() {
    let t = registered().await;
    let res = t
        .post_json("/en/reset-password/abc", json!({ "password": "long-enough" }), None)
        .await;
    assert_eq!(body_json(res).await["message"], "Email address was invalid.");
    let res = t
        .post_json("/en/reset-password/abc", json!({ "email": "a@x.com" }), None)
        .await;
    assert_eq!(body_json(res).await["message"], "Password was invalid.");
}

#[tokio::test]
async fn browser_forgot_password_redirects_back() {
    let t = registered().await;
    let res = t
        .post_form("/en/forgot-password", "email=nobody%40x.com", None)
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res).as_deref(), Some("/en/forgot-password"));
}

#[tokio::test]
async fn reset_succeeds_when_job_queue_fails() {
    let t = registered().await;
    t.jobs.set_failing(true);
    let (status, _) = forgot(&t, "a@x.com").await;
    assert_eq!(status, StatusCode::OK);
    assert!(t.users.all().await[0].reset_token.is_some());
}
