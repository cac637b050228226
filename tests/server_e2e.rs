//! End-to-end tests over a real socket.

use dispatch_core::config::ServerConfig;
use dispatch_core::http::X_REQUEST_ID;

mod common;

#[tokio::test]
async fn test_serves_until_shutdown() {
    let (addr, shutdown) = common::spawn_server(ServerConfig::default()).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("http://{addr}/api/users/5"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key(X_REQUEST_ID));
    assert_eq!(res.text().await.unwrap(), r#"{"id":5}"#);

    let res = client
        .get(format!("http://{addr}/api/users/five"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    shutdown.trigger();
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(reqwest::Client::new()
        .get(format!("http://{addr}/api/users/5"))
        .send()
        .await
        .is_err());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (addr, shutdown) = common::spawn_server(ServerConfig::default()).await;
    let id = "6f1c2a5e-3b8d-4c7e-9a21-0d4b5e6f7a8b";

    let res = reqwest::Client::new()
        .get(format!("http://{addr}/nothing"))
        .header(X_REQUEST_ID, id)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.headers()[X_REQUEST_ID], id);

    shutdown.trigger();
}

#[tokio::test]
async fn test_concurrent_requests() {
    let (addr, shutdown) = common::spawn_server(ServerConfig::default()).await;
    let client = reqwest::Client::new();

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                let res = client
                    .get(format!("http://{addr}/api/users/{i}"))
                    .send()
                    .await
                    .unwrap();
                (res.status(), res.text().await.unwrap())
            })
        })
        .collect();

    for (i, task) in tasks.into_iter().enumerate() {
        let (status, body) = task.await.unwrap();
        assert_eq!(status, 200);
        assert_eq!(body, format!(r#"{{"id":{i}}}"#));
    }

    shutdown.trigger();
}
