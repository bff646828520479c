mod common;

use common::{ids, json_body, spawn_app};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn created_posts_are_stamped_with_the_caller() {
    let app = spawn_app().await;
    let jane = app.user("jane").await;
    let john = app.user("john").await;

    let response = app
        .post(
            "/posts",
            Some(&jane.token),
            json!({ "message": "hello", "image": "https://img.example.com/1.jpg", "owner": john.id }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let post = json_body(response).await;
    assert_eq!(post["message"], "hello");
    assert_eq!(post["image"], "https://img.example.com/1.jpg");
    assert_eq!(post["owner"]["id"], jane.id);
    assert_eq!(post["owner"]["username"], "jane");
    assert_eq!(post["age"], "0m");
    assert_eq!(post["comments"], json!([]));
    assert_eq!(post["likes"], json!([]));
}

#[tokio::test]
async fn creating_a_post_requires_authentication_and_a_message() {
    let app = spawn_app().await;
    let jane = app.user("jane").await;

    let response = app.post("/posts", None, json!({ "message": "hello" })).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.post("/posts", Some(&jane.token), json!({ "message": "  " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await.get("message").is_some());
}

#[tokio::test]
async fn my_posts_lists_only_own_posts_newest_first() {
    let app = spawn_app().await;
    let jane = app.user("jane").await;
    let john = app.user("john").await;

    let first = app.create_post(&jane, "first").await;
    app.create_post(&john, "not mine").await;
    let second = app.create_post(&jane, "second").await;

    let response = app.get("/posts", Some(&jane.token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let posts = json_body(response).await;
    assert_eq!(
        ids(&posts),
        vec![second["id"].as_i64().unwrap(), first["id"].as_i64().unwrap()]
    );

    let anonymous = json_body(app.get("/posts", None).await).await;
    assert_eq!(anonymous, json!([]));
}

#[tokio::test]
async fn only_the_owner_may_change_a_post() {
    let app = spawn_app().await;
    let jane = app.user("jane").await;
    let john = app.user("john").await;
    let post = app.create_post(&jane, "original").await;
    let path = format!("/post/{}", post["id"]);

    let response = app.patch(&path, &john.token, json!({ "message": "defaced" })).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = app.delete(&path, &john.token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.patch(&path, &jane.token, json!({ "message": "edited" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "edited");
    assert_eq!(body["id"], post["id"]);

    let fetched = json_body(app.get(&path, Some(&john.token)).await).await;
    assert_eq!(fetched["message"], "edited");

    let response = app.delete(&path, &jane.token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app.get(&path, Some(&jane.token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app.delete(&path, &jane.token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comments_on_a_missing_post_are_rejected() {
    let app = spawn_app().await;
    let jane = app.user("jane").await;

    let response = app
        .post("/post/404/comments", Some(&jane.token), json!({ "message": "anyone?" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["detail"], "Post doesn't exist");
}

#[tokio::test]
async fn comments_are_listed_newest_first_and_nested_in_the_post() {
    let app = spawn_app().await;
    let jane = app.user("jane").await;
    let john = app.user("john").await;
    let post = app.create_post(&jane, "discuss").await;
    let comments_path = format!("/post/{}/comments", post["id"]);

    let response = app
        .post(&comments_path, Some(&john.token), json!({ "message": "first!" }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let first = json_body(response).await;
    assert_eq!(first["owner"]["id"], john.id);
    assert_eq!(first["age"], "0m");

    let response = app
        .post(&comments_path, Some(&jane.token), json!({ "message": "thanks" }))
        .await;
    let second = json_body(response).await;

    let response = app.post(&comments_path, None, json!({ "message": "anon" })).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Reading comments needs no account.
    let listed = json_body(app.get(&comments_path, None).await).await;
    assert_eq!(
        ids(&listed),
        vec![second["id"].as_i64().unwrap(), first["id"].as_i64().unwrap()]
    );

    let post = json_body(app.get(&format!("/post/{}", post["id"]), Some(&jane.token)).await).await;
    assert_eq!(post["comments"].as_array().unwrap().len(), 2);
    assert_eq!(post["comments"][1]["message"], "first!");
}

#[tokio::test]
async fn a_post_can_be_liked_once_per_user() {
    let app = spawn_app().await;
    let jane = app.user("jane").await;
    let john = app.user("john").await;
    let post = app.create_post(&jane, "like me").await;
    let like_path = format!("/post/{}/like", post["id"]);

    let response = app.post(&like_path, Some(&john.token), json!({})).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let like = json_body(response).await;
    assert_eq!(like["owner"], john.id);

    let response = app.post(&like_path, Some(&john.token), json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["detail"], "You have already liked this post");

    let response = app.post(&like_path, Some(&jane.token), json!({})).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let post = json_body(app.get(&format!("/post/{}", post["id"]), Some(&jane.token)).await).await;
    assert_eq!(post["likes"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn concurrent_identical_likes_create_one_like() {
    let app = spawn_app().await;
    let jane = app.user("jane").await;
    let post = app.create_post(&jane, "race").await;
    let like_path = format!("/post/{}/like", post["id"]);

    let (a, b, c) = tokio::join!(
        app.post(&like_path, Some(&jane.token), json!({})),
        app.post(&like_path, Some(&jane.token), json!({})),
        app.post(&like_path, Some(&jane.token), json!({})),
    );
    let created = [a.status(), b.status(), c.status()]
        .iter()
        .filter(|s| **s == StatusCode::CREATED)
        .count();
    assert_eq!(created, 1);

    let post = json_body(app.get(&format!("/post/{}", post["id"]), Some(&jane.token)).await).await;
    assert_eq!(post["likes"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn liking_a_missing_post_is_rejected() {
    let app = spawn_app().await;
    let jane = app.user("jane").await;

    let response = app.post("/post/77/like", Some(&jane.token), json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["detail"], "Post doesn't exist");
}

#[tokio::test]
async fn unlike_removes_the_callers_like() {
    let app = spawn_app().await;
    let jane = app.user("jane").await;
    let john = app.user("john").await;
    let post = app.create_post(&jane, "meh").await;
    let id = post["id"].as_i64().unwrap();

    app.post(&format!("/post/{}/like", id), Some(&john.token), json!({})).await;

    // Jane never liked it.
    let response = app.delete(&format!("/post/{}/unlike", id), &jane.token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.delete(&format!("/post/{}/unlike", id), &john.token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app.delete(&format!("/post/{}/unlike", id), &john.token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // And it can be liked again.
    let response = app.post(&format!("/post/{}/like", id), Some(&john.token), json!({})).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}
