mod common;

use autobridge_primitives::{Env, RoutePlan};
use autobridge_rpc::{QuoteRequest, RouteApiClient};
use common::start_route_service;
use jsonrpsee::core::ClientError;
use serde_json::json;

#[tokio::test]
async fn health() -> eyre::Result<()> {
    let (_handle, client) = start_route_service(Env::new()).await?;

    let health = client.health().await?;
    assert_eq!(health.status, "ok");
    assert!(health.timestamp > 0);

    Ok(())
}

#[tokio::test]
async fn env_check_reports_missing_variables() -> eyre::Result<()> {
    let (_handle, client) = start_route_service(Env::new()).await?;
    let report = client.env_check().await?;
    assert_eq!(report.status, "error");
    assert!(report.missing.iter().any(|item| item.env_var == "BASE_BUNDLER_URL"));

    // The public alias counts as set
    let env = Env::from([(
        "NEXT_PUBLIC_BASE_BUNDLER_URL".to_string(),
        "https://bundler.example".to_string(),
    )]);
    let (_handle, client) = start_route_service(env).await?;
    let report = client.env_check().await?;
    assert!(!report.missing.iter().any(|item| item.env_var == "BASE_BUNDLER_URL"));
    assert!(report.missing.iter().any(|item| item.env_var == "OPTIMISM_BUNDLER_URL"));

    Ok(())
}

#[tokio::test]
async fn quote_with_defaults() -> eyre::Result<()> {
    let (_handle, client) = start_route_service(Env::new()).await?;

    let plan = client.quote(None).await?;
    assert_eq!(plan.src_chain, "base-sepolia");
    assert_eq!(plan.dst_chain, "optimism-sepolia");
    assert_eq!(plan.token_in, "WETH");
    assert_eq!(plan.token_out, "USDCx");
    assert_eq!(plan.amount_in, "1");
    assert_eq!(plan.source_swap.min_amount_out, "0.995");
    assert!(plan.expires_at > plan.created_at);
    assert!(plan.validate().is_ok());

    Ok(())
}

#[tokio::test]
async fn quote_rejects_malformed_amounts() -> eyre::Result<()> {
    let (_handle, client) = start_route_service(Env::new()).await?;

    for amount in ["abc", "-1", "0", "1.2.3"] {
        let request = QuoteRequest { amount_in: Some(amount.into()), ..Default::default() };
        match client.quote(Some(request)).await {
            Err(ClientError::Call(err)) => assert_eq!(err.code(), -32602, "{amount}"),
            other => panic!("unexpected response for {amount}: {other:?}"),
        }
    }

    let request = QuoteRequest { dst_chain: Some("solana".into()), ..Default::default() };
    match client.quote(Some(request)).await {
        Err(ClientError::Call(err)) => {
            assert_eq!(err.code(), -32602);
            assert!(err.message().contains("solana"), "{}", err.message());
        }
        other => panic!("unexpected response: {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn validate_quoted_and_malformed_plans() -> eyre::Result<()> {
    let (_handle, client) = start_route_service(Env::new()).await?;

    let plan = client.quote(None).await?;
    let report = client.validate(serde_json::to_value(&plan)?).await?;
    assert!(report.valid);
    assert!(report.issues.is_empty());
    assert_eq!(report.plan, Some(plan.clone()));

    let report = client.validate(json!({"foo": "bar"})).await?;
    assert!(!report.valid);
    assert_eq!(report.issues[0].path, "plan");
    assert!(report.plan.is_none());

    let expired = RoutePlan { expires_at: plan.created_at, ..plan };
    let report = client.validate(serde_json::to_value(&expired)?).await?;
    assert!(!report.valid);
    assert!(report.issues.iter().any(|issue| issue.path == "expiresAt"));

    Ok(())
}
