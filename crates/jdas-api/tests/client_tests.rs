// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use jdas_api::{
    ApiError, BODY_EXCERPT_CHARS, Client, LegacyFeed, RawQuery, RequestOptions,
};
use jdas_app::{Industry, TableDef};
use jdas_testkit::{
    MockApi, MockResponse, UpdatesFaker, block_json, card, failed_block_json, summary_json,
};
use serde_json::json;
use std::time::Duration;

#[test]
fn unreachable_server_is_a_transport_error() -> Result<()> {
    let client = Client::new("http://127.0.0.1:1", Duration::from_millis(200))?;
    let error = client
        .request_json("/api/health", &RequestOptions::get())
        .expect_err("request should fail for unreachable endpoint");
    assert!(matches!(error, ApiError::Transport { .. } | ApiError::Timeout { .. }));
    assert!(error.to_string().contains("127.0.0.1:1"));
    Ok(())
}

#[test]
fn industry_summary_parses_blocks() -> Result<()> {
    let api = MockApi::serve_json(summary_json(&[
        (
            "real_estate",
            block_json(
                Industry::RealEstate,
                &[card("jdas_housingmarketinsight", "X")],
            ),
        ),
        ("automotive", failed_block_json(Industry::Automotive)),
    ]))?;

    let client = Client::new(api.base_url(), Duration::from_secs(2))?;
    let summary = client.industry_summary(Some(10), Some("createdon desc"))?;

    let records = summary.records(Industry::RealEstate);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].text("title").as_deref(), Some("X"));
    assert!(summary.records(Industry::Automotive).is_empty());
    assert_eq!(summary.record_count(), 1);

    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path(), "/api/v1/summary/industry-updates");
    assert_eq!(requests[0].query(), "top=10&orderby=createdon+desc");
    assert_eq!(requests[0].header("Accept"), Some("application/json"));
    Ok(())
}

#[test]
fn failed_summary_envelope_yields_empty_payload() -> Result<()> {
    let api = MockApi::serve_json(json!({"ok": false, "error": "upstream down"}))?;
    let client = Client::new(api.base_url(), Duration::from_secs(2))?;

    let summary = client.industry_summary(None, None)?;
    assert!(summary.is_empty());
    assert_eq!(api.requests()[0].query(), "");
    Ok(())
}

#[test]
fn server_error_carries_status_and_body_excerpt() -> Result<()> {
    let api = MockApi::start(|_| MockResponse::text(500, "server error"))?;
    let client = Client::new(api.base_url(), Duration::from_secs(2))?;

    let error = client
        .industry_summary(None, None)
        .expect_err("500 should fail");
    assert_eq!(error.status(), Some(500));
    let message = error.to_string();
    assert!(message.contains("500"), "{message}");
    assert!(message.contains("Internal Server Error"), "{message}");
    assert!(message.contains("server error"), "{message}");
    Ok(())
}

#[test]
fn long_error_bodies_are_truncated() -> Result<()> {
    let api = MockApi::start(|_| MockResponse::text(502, "x".repeat(5_000)))?;
    let client = Client::new(api.base_url(), Duration::from_secs(2))?;

    let error = client
        .request_json("/anything", &RequestOptions::get())
        .expect_err("502 should fail");
    let ApiError::Status { body_excerpt, .. } = error else {
        panic!("expected status error, got {error:?}");
    };
    assert_eq!(body_excerpt.chars().count(), BODY_EXCERPT_CHARS + 1);
    assert!(body_excerpt.ends_with('…'));
    Ok(())
}

#[test]
fn json_error_bodies_still_fail_on_status() -> Result<()> {
    let api = MockApi::start(|_| {
        MockResponse::json(&json!({"ok": true, "value": [], "detail": "maintenance"}))
            .with_status(503)
    })?;
    let client = Client::new(api.base_url(), Duration::from_secs(2))?;

    let error = client
        .industry_summary(None, None)
        .expect_err("503 should fail even with an ok envelope");
    assert_eq!(error.status(), Some(503));
    let ApiError::Status { body_excerpt, .. } = error else {
        panic!("expected status error, got {error:?}");
    };
    assert!(body_excerpt.contains("maintenance"), "{body_excerpt}");
    Ok(())
}

#[test]
fn non_json_success_is_a_decode_error() -> Result<()> {
    let api = MockApi::start(|_| MockResponse::text(200, "<html>hello</html>"))?;
    let client = Client::new(api.base_url(), Duration::from_secs(2))?;

    let error = client
        .request_json("/api/health", &RequestOptions::get())
        .expect_err("html should not decode");
    assert!(matches!(error, ApiError::Decode { .. }));
    Ok(())
}

#[test]
fn slow_response_times_out() -> Result<()> {
    let api = MockApi::start(|_| {
        MockResponse::json(&json!({"ok": true})).with_delay(Duration::from_millis(800))
    })?;
    let client = Client::new(api.base_url(), Duration::from_millis(100))?;

    let error = client
        .request_json("/slow", &RequestOptions::get())
        .expect_err("slow response should time out");
    assert!(error.is_timeout(), "{error:?}");
    assert!(error.to_string().contains("timed out"));
    Ok(())
}

#[test]
fn per_request_timeout_overrides_client_default() -> Result<()> {
    let api = MockApi::start(|_| {
        MockResponse::json(&json!({"ok": true})).with_delay(Duration::from_millis(800))
    })?;
    let client = Client::new(api.base_url(), Duration::from_secs(5))?;

    let options = RequestOptions::get().with_timeout(Duration::from_millis(100));
    let error = client
        .request_json("/slow", &options)
        .expect_err("per-request timeout should fire");
    assert!(error.is_timeout());
    Ok(())
}

#[test]
fn post_sends_json_body() -> Result<()> {
    let api = MockApi::serve_json(json!({"ok": true}))?;
    let client = Client::new(api.base_url(), Duration::from_secs(2))?;

    let value = client.post_json("/api/echo", json!({"top": 5}))?;
    assert_eq!(value, json!({"ok": true}));

    let requests = api.requests();
    assert_eq!(requests[0].method, "POST");
    assert!(
        requests[0]
            .header("Content-Type")
            .is_some_and(|value| value.starts_with("application/json"))
    );
    assert_eq!(serde_json::from_str::<serde_json::Value>(&requests[0].body)?, json!({"top": 5}));
    Ok(())
}

#[test]
fn health_falls_back_to_legacy_path() -> Result<()> {
    let api = MockApi::routes(vec![(
        "/health",
        MockResponse::json(&json!({"status": "ok"})),
    )])?;
    let client = Client::new(api.base_url(), Duration::from_secs(2))?;

    assert_eq!(client.health()?, json!({"status": "ok"}));
    let paths: Vec<String> = api
        .requests()
        .iter()
        .map(|request| request.path().to_owned())
        .collect();
    assert_eq!(paths, vec!["/api/health", "/health"]);
    Ok(())
}

#[test]
fn metadata_prefers_versioned_path() -> Result<()> {
    let api = MockApi::routes(vec![
        ("/api/v1/metadata", MockResponse::json(&json!({"version": 1}))),
        ("/api/metadata", MockResponse::json(&json!({"version": 0}))),
    ])?;
    let client = Client::new(api.base_url(), Duration::from_secs(2))?;

    assert_eq!(client.metadata()?, json!({"version": 1}));
    assert_eq!(api.requests().len(), 1);
    Ok(())
}

#[test]
fn raw_tables_accept_strings_and_objects() -> Result<()> {
    let api = MockApi::serve_json(json!({
        "ok": true,
        "value": ["jdas_marketinsight", {"key": "jdas_marketanalysis"}, {"name": "jdas_aiindustryinsight"}, 4]
    }))?;
    let client = Client::new(api.base_url(), Duration::from_secs(2))?;

    assert_eq!(
        client.raw_tables()?,
        vec![
            "jdas_marketinsight".to_owned(),
            "jdas_marketanalysis".to_owned(),
            "jdas_aiindustryinsight".to_owned(),
        ]
    );
    Ok(())
}

#[test]
fn raw_rows_send_query_and_normalize_envelope() -> Result<()> {
    let table = TableDef::find("marketoutlook").expect("table");
    let row = UpdatesFaker::new(5).raw_row(table);
    let api = MockApi::serve_json(json!({"ok": true, "value": [row.clone()]}))?;
    let client = Client::new(api.base_url(), Duration::from_secs(2))?;

    let rows = client.raw_rows(
        table.key,
        &RawQuery {
            top: Some(3),
            orderby: Some(String::new()),
            extra: None,
        },
    )?;
    assert_eq!(rows, vec![row]);

    let requests = api.requests();
    assert_eq!(requests[0].path(), "/api/v1/raw/jdas_marketoutlook");
    assert_eq!(requests[0].query(), "top=3");
    Ok(())
}

#[test]
fn legacy_feed_adds_cache_buster() -> Result<()> {
    let api = MockApi::serve_json(json!([{"company": "Acme"}]))?;
    let client = Client::new(api.base_url(), Duration::from_secs(2))?;

    let rows = client.legacy_feed(LegacyFeed::Layoffs, Some(20), true)?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].text("company").as_deref(), Some("Acme"));

    let requests = api.requests();
    assert_eq!(requests[0].path(), "/api/layoff-announcement");
    assert_eq!(requests[0].query(), "top=20&nocache=1");
    Ok(())
}

#[test]
fn summary_uses_its_own_timeout() -> Result<()> {
    let api = MockApi::start(|_| {
        MockResponse::json(&summary_json(&[])).with_delay(Duration::from_millis(800))
    })?;
    let client = Client::new(api.base_url(), Duration::from_secs(5))?
        .with_summary_timeout(Duration::from_millis(100));

    let error = client
        .industry_summary(None, None)
        .expect_err("summary timeout should fire");
    assert!(error.is_timeout(), "{error:?}");
    Ok(())
}
