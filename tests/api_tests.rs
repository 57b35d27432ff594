//! API integration tests
//!
//! They need a running server with its database and Redis.

use reqwest::{redirect::Policy, Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8000";
const PASSWORD: &str = "swap-books-42";

fn no_redirect_client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("Failed to build client")
}

/// Register a fresh account and return its username
async fn register_user(client: &Client) -> String {
    let username = format!("reader_{}", &Uuid::new_v4().simple().to_string()[..12]);
    let response = client
        .post(format!("{}/accounts/register/", BASE_URL))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password1": PASSWORD,
            "password2": PASSWORD
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse register response");
    assert_eq!(body["message"], format!("Account created for {}", username));
    username
}

async fn login(client: &Client, username: &str, remember_me: bool) -> (String, String) {
    let response = client
        .post(format!("{}/accounts/login/", BASE_URL))
        .json(&json!({
            "username": username,
            "password": PASSWORD,
            "remember_me": remember_me
        }))
        .send()
        .await
        .expect("Failed to send login request");

    assert!(response.status().is_success());
    let cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .expect("No session cookie")
        .to_string();
    let body: Value = response.json().await.expect("Failed to parse login response");
    let token = body["token"].as_str().expect("No token in response").to_string();
    (token, cookie)
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_root_redirects_to_catalog() {
    let response = no_redirect_client()
        .get(format!("{}/", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers()["location"], "/catalog/");
}

#[tokio::test]
#[ignore]
async fn test_catalog_index_and_lists() {
    let client = Client::new();

    let body: Value = client
        .get(format!("{}/catalog/", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert!(body["num_books"].is_i64());
    assert!(body["num_instances_available"].is_i64());

    let books: Value = client
        .get(format!("{}/catalog/books/?per_page=5", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(books["per_page"], 5);
    assert!(books["items"].is_array());

    let response = client
        .get(format!("{}/catalog/book/999999999", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_register_rejects_numeric_password() {
    let client = Client::new();

    let response = client
        .post(format!("{}/accounts/register/", BASE_URL))
        .json(&json!({
            "username": "numeric_pw",
            "email": "numeric_pw@example.com",
            "password1": "1234567890",
            "password2": "1234567890"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/accounts/login/", BASE_URL))
        .json(&json!({
            "username": "nobody_here",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_remember_me_controls_cookie_lifetime() {
    let client = Client::new();
    let username = register_user(&client).await;

    let (_, browser_cookie) = login(&client, &username, false).await;
    assert!(browser_cookie.starts_with("sessionid="));
    assert!(!browser_cookie.contains("Max-Age"));

    let (_, remembered_cookie) = login(&client, &username, true).await;
    assert!(remembered_cookie.contains("Max-Age="));
}

#[tokio::test]
#[ignore]
async fn test_profile_flow_and_logout() {
    let client = no_redirect_client();
    let username = register_user(&client).await;
    let (token, _) = login(&client, &username, false).await;

    let response = client
        .put(format!("{}/accounts/profile/", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "bio": "Mostly science fiction" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["bio"], "Mostly science fiction");
    assert_eq!(body["user"]["username"], username.as_str());

    // Logged in users are sent to their profile
    let response = client
        .post(format!("{}/accounts/login/", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "username": username, "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/accounts/profile/");

    let response = client
        .post(format!("{}/accounts/logout/", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/accounts/profile/", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_password_change_redirects_to_done() {
    let client = no_redirect_client();
    let username = register_user(&client).await;
    let (token, _) = login(&client, &username, false).await;

    let response = client
        .post(format!("{}/accounts/password-change/", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "old_password": PASSWORD,
            "new_password1": PASSWORD,
            "new_password2": PASSWORD
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/accounts/password_change/done/");
}

#[tokio::test]
#[ignore]
async fn test_password_reset_message_does_not_leak_accounts() {
    let client = Client::new();

    let response = client
        .post(format!("{}/accounts/password-reset/", BASE_URL))
        .json(&json!({ "email": "nobody-at-all@example.com" }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .starts_with("We've emailed you instructions"));
}

#[tokio::test]
#[ignore]
async fn test_store_listing_belongs_to_owner() {
    let client = Client::new();

    let books: Value = client
        .get(format!("{}/catalog/books/?per_page=1", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let Some(book_id) = books["items"][0]["id"].as_i64() else {
        // Needs at least one book in the catalog
        return;
    };

    let owner = register_user(&client).await;
    let (owner_token, _) = login(&client, &owner, false).await;
    let other = register_user(&client).await;
    let (other_token, _) = login(&client, &other, false).await;

    let response = client
        .post(format!("{}/store/listings/", BASE_URL))
        .bearer_auth(&owner_token)
        .json(&json!({ "book_id": book_id, "imprint": "Penguin, 1999", "condition": "good" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let listing: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(listing["status"], "available");
    let listing_id = listing["id"].as_str().expect("No listing id").to_string();

    let response = client
        .put(format!("{}/store/listings/{}", BASE_URL, listing_id))
        .bearer_auth(&other_token)
        .json(&json!({ "status": "swapped" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let mine: Value = client
        .get(format!("{}/store/mine/", BASE_URL))
        .bearer_auth(&owner_token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert!(mine
        .as_array()
        .map(|items| items.iter().any(|item| item["id"] == listing_id.as_str()))
        .unwrap_or(false));

    let response = client
        .delete(format!("{}/store/listings/{}", BASE_URL, listing_id))
        .bearer_auth(&owner_token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore]
async fn test_admin_requires_staff() {
    let client = Client::new();
    let username = register_user(&client).await;
    let (token, _) = login(&client, &username, false).await;

    let response = client
        .post(format!("{}/admin/genres", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "name": "Fantasy" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
