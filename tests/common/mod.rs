#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde_json::{json, Value};
use socialnet::{
    build_app,
    config::Config,
    init_db,
    mailer::{MailMessage, Mailer},
    run_app, FeedFallback,
};
use tokio::net::TcpListener;

pub const PASSWORD: &str = "correct horse battery";

/// Keeps outgoing mail in memory so tests can read reset links.
#[derive(Default, Clone)]
pub struct MemoryMailer {
    pub sent: Arc<Mutex<Vec<MailMessage>>>,
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, message: MailMessage) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub mailer: MemoryMailer,
}

pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub token: String,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(FeedFallback::AllPosts).await
}

pub async fn spawn_app_with(empty_feed: FeedFallback) -> TestApp {
    let mut config = Config::in_memory("integration-test-secret");
    config.empty_feed = empty_feed;
    let pool = init_db(&config.database).await.expect("database setup");
    let mailer = MemoryMailer::default();
    let app = build_app(pool, config, Arc::new(mailer.clone()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(run_app(app, listener));

    TestApp {
        address,
        client: reqwest::Client::new(),
        mailer,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Response {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.unwrap()
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Response {
        let mut request = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.unwrap()
    }

    pub async fn patch(&self, path: &str, token: &str, body: Value) -> Response {
        self.client
            .patch(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn delete(&self, path: &str, token: &str) -> Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Response {
        self.post(
            "/user",
            None,
            json!({ "username": username, "email": email, "password": password }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.post("/token", None, json!({ "email": email, "password": password }))
            .await
    }

    /// Registers `username` with `{username}@example.com` and logs in.
    pub async fn user(&self, username: &str) -> TestUser {
        let email = format!("{}@example.com", username);
        let response = self.register(username, &email, PASSWORD).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();

        let response = self.login(&email, PASSWORD).await;
        assert_eq!(response.status(), StatusCode::OK);
        let tokens: Value = response.json().await.unwrap();

        TestUser {
            id: body["id"].as_i64().unwrap(),
            username: username.to_owned(),
            email,
            token: tokens["access"].as_str().unwrap().to_owned(),
        }
    }

    pub async fn create_post(&self, user: &TestUser, message: &str) -> Value {
        let response = self
            .post("/posts", Some(&user.token), json!({ "message": message }))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().await.unwrap()
    }

    pub async fn follow(&self, user: &TestUser, target: &TestUser) -> Response {
        self.post("/follow", Some(&user.token), json!({ "follow_id": target.id }))
            .await
    }

    pub fn sent_mail(&self) -> Vec<MailMessage> {
        self.mailer.sent.lock().unwrap().clone()
    }
}

pub async fn json_body(response: Response) -> Value {
    response.json().await.unwrap()
}

pub fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}
