mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{ids, TestApp};

#[tokio::test]
async fn create_list_retrieve() -> Result<()> {
    let app = TestApp::new();
    let alice = app.user("alice").await?;
    let token = app.token(&alice)?;

    let (status, created) = app
        .post("/api/categories/", Some(&token), json!({"name": "  Technology "}))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Technology");
    assert!(created["created_at"].is_string());
    let id = created["id"].as_i64().unwrap();

    let second = app.category(&token, "Travel").await?;

    // Anonymous readers see every category, newest first
    let (status, list) = app.get("/api/categories/", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&list), vec![second, id]);

    let (status, one) = app.get(&format!("/api/categories/{}/", id), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(one, created);

    // Trailing slash is optional
    let (status, _) = app.get(&format!("/api/categories/{}", id), None).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn anonymous_create_is_401_even_with_bad_body() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = app.post("/api/categories/", None, json!({"name": "Tech"})).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication credentials were not provided.");

    let (status, _) = app.post("/api/categories/", None, json!({})).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn validation_messages() -> Result<()> {
    let app = TestApp::new();
    let alice = app.user("alice").await?;
    let token = app.token(&alice)?;

    let (status, body) = app.post("/api/categories/", Some(&token), json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["field_errors"]["name"], "This field is required.");

    let (_, body) = app.post("/api/categories/", Some(&token), json!({"name": "   "})).await?;
    assert_eq!(body["field_errors"]["name"], "This field may not be blank.");

    let (_, body) = app
        .post("/api/categories/", Some(&token), json!({"name": "x".repeat(101)}))
        .await?;
    assert_eq!(
        body["field_errors"]["name"],
        "Ensure this field has no more than 100 characters."
    );

    let (status, body) = app.post("/api/categories/", Some(&token), json!({"name": 5})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn duplicate_names_are_field_errors() -> Result<()> {
    let app = TestApp::new();
    let alice = app.user("alice").await?;
    let token = app.token(&alice)?;
    app.category(&token, "Tech").await?;
    let travel = app.category(&token, "Travel").await?;

    let (status, body) = app.post("/api/categories/", Some(&token), json!({"name": "Tech"})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["name"], "category with this name already exists.");

    let (status, _) = app
        .patch(&format!("/api/categories/{}/", travel), Some(&token), json!({"name": "Tech"}))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Renaming to its own name is not a conflict
    let (status, _) = app
        .put(&format!("/api/categories/{}/", travel), Some(&token), json!({"name": "Travel"}))
        .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn any_user_may_edit_categories() -> Result<()> {
    let app = TestApp::new();
    let alice = app.user("alice").await?;
    let bob = app.user("bob").await?;
    let id = app.category(&app.token(&alice)?, "Tech").await?;
    let bob_token = app.token(&bob)?;

    let (status, body) = app
        .put(&format!("/api/categories/{}/", id), Some(&bob_token), json!({"name": "Technology"}))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Technology");

    let (status, body) = app.delete(&format!("/api/categories/{}/", id), Some(&bob_token)).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = app.get(&format!("/api/categories/{}/", id), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn deleting_a_category_cascades_to_posts_and_comments() -> Result<()> {
    let app = TestApp::new();
    let alice = app.user("alice").await?;
    let token = app.token(&alice)?;
    let tech = app.category(&token, "Tech").await?;
    let post = app.post_in(&token, tech, "Hello", true).await?;
    let (status, _) = app
        .post("/api/comments/", Some(&token), json!({"post": post, "content": "First"}))
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.delete(&format!("/api/categories/{}", tech), Some(&token)).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, posts) = app.get("/api/posts/", Some(&token)).await?;
    let (_, comments) = app.get("/api/comments/", Some(&token)).await?;
    assert!(ids(&posts).is_empty());
    assert!(ids(&comments).is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_404() -> Result<()> {
    let app = TestApp::new();
    let alice = app.user("alice").await?;
    let token = app.token(&alice)?;

    let (status, body) = app.get("/api/categories/999/", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not found.");

    let (status, _) = app.get("/api/categories/abc/", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .patch("/api/categories/999/", Some(&token), json!({"name": "Ghost"}))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Unauthenticated is reported before not-found
    let (status, _) = app.delete("/api/categories/999/", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}
