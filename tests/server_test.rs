//! Integration tests for the mindpulse HTTP server

#[cfg(feature = "server")]
mod server_tests {
    use mindpulse::server::{run, ServerConfig};
    use mindpulse::transparency::create_shared_log;
    use mindpulse::{Engine, EngineState};
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::sync::oneshot;

    async fn start_server() -> (SocketAddr, oneshot::Sender<()>) {
        let (addr, shutdown_tx, _task) = run(
            ServerConfig::new(0, None),
            Engine::default().shared(),
            create_shared_log(),
        )
        .await
        .expect("Failed to start server");

        // Give server time to start
        tokio::time::sleep(Duration::from_millis(100)).await;
        (addr, shutdown_tx)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (addr, shutdown_tx) = start_server().await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");
        assert!(body["version"].as_str().is_some());
        assert!(body["instance_id"].as_str().is_some());
        assert_eq!(body["ingest"]["cardiac_accepted"], 0);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_cardiac_readings_then_analysis() {
        let (addr, shutdown_tx) = start_server().await;
        let client = reqwest::Client::new();

        for i in 0..30i64 {
            let bpm = if i % 2 == 0 { 70 } else { 72 };
            let reading = serde_json::json!({
                "heartRate": bpm,
                "SpO2": 98,
                "timestamp": 1714554000000 + i * 1000
            });
            let response = client
                .post(format!("http://{}/samples/cardiac", addr))
                .json(&reading)
                .send()
                .await
                .expect("Failed to send request");
            assert!(response.status().is_success());

            let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
            assert_eq!(body["status"], "accepted");
            assert_eq!(body["cardiac_samples"], i + 1);
        }

        let response = client
            .get(format!("http://{}/analysis", addr))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["cardiac"]["cardiac_stress"]["status"], "normal");
        assert_eq!(body["data_quality"]["cardiac_samples"], 30);
        assert_eq!(body["data_quality"]["cardiac_sufficient"], true);
        assert!(body["overall_score"].as_i64().is_some());

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_invalid_reading_rejected() {
        let (addr, shutdown_tx) = start_server().await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}/samples/cardiac", addr))
            .json(&serde_json::json!({ "heartRate": 0, "SpO2": 98 }))
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["code"], "INVALID_READING");

        let health: serde_json::Value = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(health["ingest"]["cardiac_rejected"], 1);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_thermal_reading_throttled() {
        let (addr, shutdown_tx) = start_server().await;
        let client = reqwest::Client::new();

        let first = serde_json::json!({
            "bodyTemp": 36.6,
            "ambientTemp": 24.0,
            "timestamp": "2024-05-01T10:00:00Z"
        });
        let second = serde_json::json!({
            "bodyTemp": 36.7,
            "ambientTemp": 24.0,
            "timestamp": "2024-05-01T10:05:00Z"
        });

        let body: serde_json::Value = client
            .post(format!("http://{}/samples/thermal", addr))
            .json(&first)
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(body["status"], "accepted");
        assert_eq!(body["thermal_samples"], 1);

        let body: serde_json::Value = client
            .post(format!("http://{}/samples/thermal", addr))
            .json(&second)
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(body["status"], "throttled");
        assert_eq!(body["thermal_samples"], 1);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_reset_clears_state() {
        let (addr, shutdown_tx) = start_server().await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("http://{}/samples/cardiac", addr))
            .json(&serde_json::json!({ "heartRate": 72, "SpO2": 98 }))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());

        let response = client
            .post(format!("http://{}/reset", addr))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);

        let state: serde_json::Value = client
            .get(format!("http://{}/state", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(state["version"], 1);
        assert!(state["last_analysis"].is_null());
        assert_eq!(state["cardiac_baseline"], serde_json::Value::Null);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_cors_allows_localhost() {
        let (addr, shutdown_tx) = start_server().await;

        let client = reqwest::Client::new();
        let response = client
            .request(
                reqwest::Method::OPTIONS,
                format!("http://{}/samples/cardiac", addr),
            )
            .header("Origin", "http://localhost")
            .header("Access-Control-Request-Method", "POST")
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("http://localhost")
        );

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_state_saved_after_shutdown() {
        let state_path =
            std::env::temp_dir().join(format!("mindpulse-server-{}.json", uuid::Uuid::new_v4()));
        let (addr, shutdown_tx, task) = run(
            ServerConfig::new(0, Some(state_path.clone())),
            Engine::default().shared(),
            create_shared_log(),
        )
        .await
        .expect("Failed to start server");
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Keep-alive client stays open across shutdown.
        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}/samples/cardiac", addr))
            .json(&serde_json::json!({ "heartRate": 72, "SpO2": 98 }))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());

        let _ = shutdown_tx.send(());
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("Server did not shut down")
            .expect("Server task panicked");

        let state = EngineState::load(&state_path).expect("State was not saved");
        let _ = std::fs::remove_file(&state_path);
        assert_eq!(state.cardiac.len(), 1);
    }
}
