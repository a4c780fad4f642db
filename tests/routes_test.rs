mod common;

use axum::http::StatusCode;
use common::{get, post_json, router, RecordingRunner, Reply, ScriptDir};
use serde_json::json;

#[tokio::test]
async fn test_root_and_liveness() {
    let scripts = ScriptDir::placeholders();
    let runner = RecordingRunner::new(Reply::stdout("{}"));
    let app = router(runner.clone(), &scripts.config);

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("alive"));
    assert_eq!(body["message"], json!("Confluence is breathing"));

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy", "heartbeat": true}));

    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn test_module_health_reports_script_presence() {
    let scripts = ScriptDir::placeholders();
    let runner = RecordingRunner::new(Reply::stdout("{}"));
    let app = router(runner.clone(), &scripts.config);

    let (_, iris) = get(&app, "/api/iris/health").await;
    assert_eq!(iris["dataset"], json!("iris"));
    assert_eq!(iris["year"], json!(1936));
    assert_eq!(iris["author"], json!("R.A. Fisher"));
    assert_eq!(iris["r_script_exists"], json!(true));

    let (_, spectrum) = get(&app, "/api/spectrum/health").await;
    assert_eq!(spectrum["module"], json!("spectral_sonification"));
    assert_eq!(spectrum["r_script_exists"], json!(true));

    let (_, loom) = get(&app, "/api/loom/health").await;
    assert_eq!(
        loom["systems"],
        json!(["lorenz", "automaton", "fibonacci", "clifford"])
    );

    let mut missing = scripts.config.clone();
    missing.scripts.root = "/nonexistent/r_scripts".to_string();
    let app = router(runner.clone(), &missing);
    let (status, loom) = get(&app, "/api/loom/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loom["r_script_exists"], json!(false));

    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn test_spectrum_analyze_passes_output_through() {
    let scripts = ScriptDir::placeholders();
    let output = r#"{"components": [{"frequency": 0.25, "magnitude": 3.1}], "metadata": {"n": 8}}"#;
    let runner = RecordingRunner::new(Reply::stdout(output));
    let app = router(runner.clone(), &scripts.config);

    let (status, body) = post_json(
        &app,
        "/api/spectrum/analyze",
        r#"{"series": [0, 1, 0, -1, 0, 1, 0, -1], "n_peaks": 3}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::from_str::<serde_json::Value>(output).unwrap());
    assert_eq!(runner.calls(), 1);
    assert_eq!(
        runner.last_payload().unwrap(),
        json!({
            "series": [0.0, 1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0],
            "sample_rate": 1.0,
            "n_peaks": 3
        })
    );

    let invocation = &runner.invocations()[0];
    assert_eq!(invocation.program, "Rscript");
    assert!(invocation.args[0].ends_with("spectral_analysis.R"));
}

#[tokio::test]
async fn test_spectrum_cross_analysis_payload() {
    let scripts = ScriptDir::placeholders();
    let runner = RecordingRunner::new(Reply::stdout(r#"{"coherence": []}"#));
    let app = router(runner.clone(), &scripts.config);

    let (status, _) = post_json(
        &app,
        "/api/spectrum/analyze",
        r#"{"series1": [1, 2, 3, 4], "series2": [4, 3, 2, 1], "sample_rate": 44100}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let payload = runner.last_payload().unwrap();
    assert!(payload.get("series").is_none());
    assert_eq!(payload["series2"], json!([4.0, 3.0, 2.0, 1.0]));
    assert_eq!(payload["sample_rate"], json!(44100.0));
    assert_eq!(payload["n_peaks"], json!(8));
}

#[tokio::test]
async fn test_short_series_fails_fast() {
    let scripts = ScriptDir::placeholders();
    let runner = RecordingRunner::new(Reply::stdout("{}"));
    let app = router(runner.clone(), &scripts.config);

    let (status, body) = post_json(&app, "/api/spectrum/analyze", r#"{"series": [1, 2, 3]}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        json!("Series must contain at least 4 data points for FFT")
    );
    assert_eq!(body["error_type"], json!("validation"));

    let (status, body) = post_json(
        &app,
        "/api/spectrum/analyze",
        r#"{"series1": [1, 2, 3, 4], "series2": [1]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().starts_with("Series2"));

    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn test_spectrum_requires_a_series_form() {
    let scripts = ScriptDir::placeholders();
    let runner = RecordingRunner::new(Reply::stdout("{}"));
    let app = router(runner.clone(), &scripts.config);

    for body in [r#"{}"#, r#"{"series1": [1, 2, 3, 4]}"#] {
        let (status, response) = post_json(&app, "/api/spectrum/analyze", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(
            response["detail"],
            json!("Must provide either 'series' or both 'series1' and 'series2'")
        );
    }

    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_a_client_error() {
    let scripts = ScriptDir::placeholders();
    let runner = RecordingRunner::new(Reply::stdout("{}"));
    let app = router(runner.clone(), &scripts.config);

    let (status, body) = post_json(&app, "/api/spectrum/analyze", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], json!("validation"));

    let (status, _) = post_json(&app, "/api/spectrum/analyze", r#"{"series": ["a", "b"]}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(&app, "/api/loom/generate", r#"{"params": {}}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn test_unknown_loom_system_fails_fast() {
    let scripts = ScriptDir::placeholders();
    let runner = RecordingRunner::new(Reply::stdout("{}"));
    let app = router(runner.clone(), &scripts.config);

    let (status, body) = post_json(&app, "/api/loom/generate", r#"{"system": "quantum"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        json!("Invalid system. Must be one of: lorenz, automaton, fibonacci, clifford")
    );
    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn test_loom_generate_forwards_params_untouched() {
    let scripts = ScriptDir::placeholders();
    let runner = RecordingRunner::new(Reply::stdout(r#"{"system": "clifford", "points": []}"#));
    let app = router(runner.clone(), &scripts.config);

    let (status, body) = post_json(
        &app,
        "/api/loom/generate",
        r#"{"system": "clifford", "params": {"a": -1.2, "n": 999999}}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["system"], json!("clifford"));
    assert_eq!(
        runner.last_payload().unwrap(),
        json!({"system": "clifford", "params": {"a": -1.2, "n": 999999}})
    );
}

#[tokio::test]
async fn test_demo_endpoints_run_without_payload() {
    let scripts = ScriptDir::placeholders();
    let runner = RecordingRunner::new(Reply::stdout(r#"{"demo": true}"#));
    let app = router(runner.clone(), &scripts.config);

    for uri in ["/api/iris/data", "/api/spectrum/demo", "/api/loom/demo"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, json!({"demo": true}));
    }

    let invocations = runner.invocations();
    assert_eq!(invocations.len(), 3);
    assert!(invocations.iter().all(|invocation| invocation.stdin.is_none()));
    assert!(invocations[0].args[0].ends_with("iris_transform.R"));
    assert!(invocations[2].args[0].ends_with("loom_generators.R"));
}

#[tokio::test]
async fn test_loom_systems_catalog() {
    let scripts = ScriptDir::placeholders();
    let runner = RecordingRunner::new(Reply::stdout("{}"));
    let app = router(runner.clone(), &scripts.config);

    let (status, body) = get(&app, "/api/loom/systems").await;
    assert_eq!(status, StatusCode::OK);

    let systems = body["systems"].as_array().unwrap();
    assert_eq!(systems.len(), 4);

    let ids: Vec<&str> = systems.iter().map(|s| s["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["lorenz", "automaton", "fibonacci", "clifford"]);

    for system in systems {
        for (name, schema) in system["params"].as_object().unwrap() {
            let default = schema["default"].as_f64().unwrap();
            let min = schema["min"].as_f64().unwrap();
            let max = schema["max"].as_f64().unwrap();
            assert!(min <= default && default <= max, "{}.{}", system["id"], name);
        }
    }

    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn test_timeout_maps_to_gateway_timeout() {
    let scripts = ScriptDir::placeholders();
    let runner = RecordingRunner::new(Reply::Timeout);
    let app = router(runner.clone(), &scripts.config);

    let (status, body) = get(&app, "/api/iris/data").await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(
        body["detail"],
        json!("Script execution timed out after 30 seconds")
    );
    assert_eq!(runner.calls(), 1);
}

#[tokio::test]
async fn test_missing_interpreter_is_a_server_fault() {
    let scripts = ScriptDir::placeholders();
    let runner = RecordingRunner::new(Reply::MissingInterpreter);
    let app = router(runner.clone(), &scripts.config);

    let (status, body) = get(&app, "/api/spectrum/demo").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_type"], json!("interpreter_not_found"));
}

#[tokio::test]
async fn test_missing_script_is_never_invoked() {
    let scripts = ScriptDir::placeholders();
    let mut config = scripts.config.clone();
    config.scripts.root = "/nonexistent/r_scripts".to_string();

    let runner = RecordingRunner::new(Reply::stdout("{}"));
    let app = router(runner.clone(), &config);

    let (status, body) = post_json(&app, "/api/loom/generate", r#"{"system": "lorenz"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_type"], json!("script_not_found"));
    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn test_execution_failures() {
    let scripts = ScriptDir::placeholders();

    let runner = RecordingRunner::new(Reply::failure("Error in fft(x): non-numeric argument", 1));
    let app = router(runner, &scripts.config);
    let (status, body) = get(&app, "/api/iris/data").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["detail"],
        json!("Script execution failed: Error in fft(x): non-numeric argument")
    );

    let runner = RecordingRunner::new(Reply::stdout("not-json"));
    let app = router(runner, &scripts.config);
    let (status, body) = get(&app, "/api/iris/data").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Failed to parse script output as JSON"));
    assert!(detail.contains("not-json"));

    let runner = RecordingRunner::new(Reply::stdout(r#"{"error": true, "message": "boom"}"#));
    let app = router(runner, &scripts.config);
    let (status, body) = post_json(
        &app,
        "/api/spectrum/analyze",
        r#"{"series": [1, 2, 3, 4]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], json!("Script error: boom"));
    assert_eq!(body["error_type"], json!("script_error"));
}

#[tokio::test]
async fn test_interpreter_probe_endpoint() {
    let scripts = ScriptDir::placeholders();

    let runner = RecordingRunner::new(Reply::Output(confluence::core::InvocationOutput {
        stdout: String::new(),
        stderr: "R scripting front-end version 4.3.1 (2023-06-16)\n".to_string(),
        exit_code: Some(0),
    }));
    let app = router(runner.clone(), &scripts.config);
    let (status, body) = get(&app, "/api/iris/test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["r_available"], json!(true));
    assert_eq!(
        body["version"],
        json!("R scripting front-end version 4.3.1 (2023-06-16)")
    );
    assert_eq!(runner.invocations()[0].args, vec!["--version".to_string()]);

    let runner = RecordingRunner::new(Reply::MissingInterpreter);
    let app = router(runner, &scripts.config);
    let (status, body) = get(&app, "/api/iris/test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["r_available"], json!(false));
    assert_eq!(body["version"], json!(null));
}

#[tokio::test]
async fn test_debug_pipeline_readiness() {
    let scripts = ScriptDir::placeholders();

    // "OK" 同時滿足版本查詢、套件檢查與試跑
    let runner = RecordingRunner::new(Reply::stdout("OK"));
    let app = router(runner.clone(), &scripts.config);
    let (status, body) = get(&app, "/api/iris/debug").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["r_script_exists"], json!(true));
    assert_eq!(body["r_installed"], json!(true));
    assert_eq!(body["jsonlite_installed"], json!(true));
    assert_eq!(body["test_execution_success"], json!(true));
    assert_eq!(body["test_output_valid_json"], json!(false));
    assert_eq!(body["pipeline_ready"], json!(true));
    assert_eq!(runner.calls(), 3);

    let runner = RecordingRunner::new(Reply::MissingInterpreter);
    let app = router(runner.clone(), &scripts.config);
    for uri in ["/api/iris/debug", "/api/spectrum/debug", "/api/loom/debug"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["r_installed"], json!(false));
        assert_eq!(body["test_execution_success"], json!(false));
        assert_eq!(body["pipeline_ready"], json!(false));
    }
    // 直譯器不存在時不試跑腳本
    assert_eq!(runner.calls(), 6);
}

#[tokio::test]
async fn test_cors_allows_configured_origin_with_credentials() {
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use tower::ServiceExt;

    let scripts = ScriptDir::placeholders();
    let runner = RecordingRunner::new(Reply::stdout("{}"));
    let app = router(runner, &scripts.config);

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/spectrum/analyze")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(preflight).await.unwrap();
    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

    let foreign = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "http://evil.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(foreign).await.unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_spectrum_numeric_options_are_forwarded_unchecked() {
    let scripts = ScriptDir::placeholders();
    let runner = RecordingRunner::new(Reply::stdout("{}"));
    let app = router(runner.clone(), &scripts.config);

    let (status, _) = post_json(
        &app,
        "/api/spectrum/analyze",
        r#"{"series": [1, 2, 3, 4], "n_peaks": -1, "sample_rate": 0}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let payload = runner.last_payload().unwrap();
    assert_eq!(payload["n_peaks"], json!(-1));
    assert_eq!(payload["sample_rate"], json!(0.0));
}

#[tokio::test]
async fn test_directory_at_script_path_is_not_a_script() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = confluence::ServerConfig::default();
    config.scripts.root = dir.path().display().to_string();
    std::fs::create_dir(config.script_paths().iris).unwrap();

    let runner = RecordingRunner::new(Reply::stdout("{}"));
    let app = router(runner.clone(), &config);

    let (_, health) = get(&app, "/api/iris/health").await;
    assert_eq!(health["r_script_exists"], json!(false));

    let (status, body) = get(&app, "/api/iris/data").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_type"], json!("script_not_found"));
    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn test_lorenz_catalog_entry_text() {
    let scripts = ScriptDir::placeholders();
    let runner = RecordingRunner::new(Reply::stdout("{}"));
    let app = router(runner, &scripts.config);

    let (_, body) = get(&app, "/api/loom/systems").await;
    assert_eq!(body["systems"][0]["name"], json!("Lorenz Attractor"));
    assert_eq!(
        body["systems"][0]["description"],
        json!("The butterfly's wing. Deterministic chaos—predictable yet unknowable.")
    );
}

#[tokio::test]
async fn test_pass_through_keeps_script_key_order() {
    let scripts = ScriptDir::placeholders();
    let runner = RecordingRunner::new(Reply::stdout(
        r#"{"zeta": 1, "alpha": {"omega": 2, "beta": 3}, "mid": []}"#,
    ));
    let app = router(runner, &scripts.config);

    let (status, body) = get(&app, "/api/iris/data").await;
    assert_eq!(status, StatusCode::OK);
    let keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, ["zeta", "alpha", "mid"]);
    let inner: Vec<_> = body["alpha"].as_object().unwrap().keys().cloned().collect();
    assert_eq!(inner, ["omega", "beta"]);
}
