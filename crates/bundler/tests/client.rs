mod common;

use autobridge_bundler::{BundlerApi, BundlerClient, SubmitOptions};
use autobridge_primitives::{AutoBridgeError, UserOperation};
use common::{entry_point, start_mock_bundler, MockBundler, MockError, CHAIN_ID, ENTRY_POINT};
use serde_json::json;
use std::{
    sync::{atomic::AtomicU64, Arc},
    time::Duration,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

fn user_operation() -> UserOperation {
    UserOperation::default()
        .sender("0x9c5754De1443984659E1b3a8d1931D83475ba29C".parse().unwrap())
        .nonce(3.into())
        .call_gas_limit(900_000.into())
        .verification_gas_limit(550_000.into())
        .pre_verification_gas(120_000.into())
        .max_fee_per_gas(3_500_000_000_u64.into())
        .max_priority_fee_per_gas(1_500_000_000.into())
}

fn mock() -> MockBundler {
    MockBundler::new(Arc::new(AtomicU64::new(0)))
}

#[tokio::test]
async fn estimate_accepts_verification_gas_alias() -> eyre::Result<()> {
    let mut mock = mock();
    mock.estimate = json!({
        "preVerificationGas": "0xc350",
        "verificationGas": "0x186a0",
        "callGasLimit": "0x30d40"
    });
    let (_handle, url) = start_mock_bundler(mock.clone()).await?;

    let client = BundlerClient::new(url);
    let est = client.estimate_user_operation_gas(&user_operation(), &entry_point()).await?;
    assert_eq!(est.pre_verification_gas, 50_000.into());
    assert_eq!(est.verification_gas_limit, 100_000.into());
    assert_eq!(est.call_gas_limit, 200_000.into());

    let calls = mock.calls.lock().clone();
    assert_eq!(calls.len(), 1);
    let (method, uo, ep) = &calls[0];
    assert_eq!(method, "eth_estimateUserOperationGas");
    assert_eq!(ep, ENTRY_POINT);
    assert_eq!(uo["nonce"], json!("0x3"));
    assert_eq!(uo["callGasLimit"], json!("0xdbba0"));
    assert_eq!(uo["sender"], json!("0x9c5754De1443984659E1b3a8d1931D83475ba29C"));

    Ok(())
}

#[tokio::test]
async fn send_returns_raw_response() -> eyre::Result<()> {
    let mock = mock();
    let (_handle, url) = start_mock_bundler(mock.clone()).await?;

    let client = BundlerClient::new(url);
    let uo = user_operation();
    let res = client.send_user_operation(&uo, &entry_point(), &SubmitOptions::default()).await?;

    assert_eq!(res.jsonrpc, "2.0");
    assert!(res.error.is_none());
    assert_eq!(res.result, Some(json!(uo.hash(&entry_point(), CHAIN_ID).to_string())));
    assert_eq!(mock.methods(), vec!["eth_sendUserOperation"]);

    Ok(())
}

#[tokio::test]
async fn dry_run_simulates() -> eyre::Result<()> {
    let mock = mock();
    let (_handle, url) = start_mock_bundler(mock.clone()).await?;

    let client = BundlerClient::new(url);
    let options = SubmitOptions { dry_run: true, ..Default::default() };
    let res = client.send_user_operation(&user_operation(), &entry_point(), &options).await?;

    assert!(res.result.is_none());
    assert!(res.error.is_none());
    assert_eq!(mock.methods(), vec!["eth_callUserOperation"]);

    Ok(())
}

#[tokio::test]
async fn submission_times_out() -> eyre::Result<()> {
    let mut mock = mock();
    mock.send_delay = Duration::from_millis(500);
    let (_handle, url) = start_mock_bundler(mock).await?;

    let client = BundlerClient::new(url);
    let options = SubmitOptions { timeout: Some(Duration::from_millis(50)), ..Default::default() };
    let err = client
        .send_user_operation(&user_operation(), &entry_point(), &options)
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    match err {
        AutoBridgeError::Timeout { operation, timeout } => {
            assert_eq!(operation, "eth_sendUserOperation");
            assert_eq!(timeout, Duration::from_millis(50));
        }
        other => panic!("unexpected {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn bundler_error_is_kept_verbatim() -> eyre::Result<()> {
    let mut mock = mock();
    mock.send_error = Some(MockError {
        code: -32502,
        message: "AA33 reverted (or OOG)".into(),
        data: Some(json!({"paymaster": "0xc5026854aeaC69673a8D91fcC54DA9c1779FaC9d"})),
    });
    let (_handle, url) = start_mock_bundler(mock).await?;

    let client = BundlerClient::new(url);
    let err = client
        .send_user_operation(&user_operation(), &entry_point(), &SubmitOptions::default())
        .await
        .unwrap_err();

    assert!(!err.is_retryable());
    match err {
        AutoBridgeError::Bundler(err) => {
            assert_eq!(err.code, -32502);
            assert_eq!(err.message, "AA33 reverted (or OOG)");
            assert_eq!(
                err.data,
                Some(json!({"paymaster": "0xc5026854aeaC69673a8D91fcC54DA9c1779FaC9d"}))
            );
        }
        other => panic!("unexpected {other:?}"),
    }

    Ok(())
}

/// Answers one HTTP request with a 502 page after reading it completely
async fn bad_gateway() -> eyre::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else { return };
        let mut req = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let Ok(n) = stream.read(&mut buf).await else { return };
            if n == 0 {
                return;
            }
            req.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&req).to_lowercase();
            if let Some(end) = text.find("\r\n\r\n") {
                let len = text
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|len| len.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if req.len() >= end + 4 + len {
                    break;
                }
            }
        }
        let body = "<html>bad gateway</html>";
        let res = format!(
            "HTTP/1.1 502 Bad Gateway\r\ncontent-type: text/html\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(res.as_bytes()).await;
        let _ = stream.shutdown().await;
    });

    Ok(format!("http://{addr}"))
}

#[tokio::test]
async fn non_json_response_is_a_transport_error() -> eyre::Result<()> {
    let url = bad_gateway().await?;

    let client = BundlerClient::new(url);
    let err = client
        .estimate_user_operation_gas(&user_operation(), &entry_point())
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    match err {
        AutoBridgeError::Transport { message } => {
            assert!(message.contains("502"), "{message}");
            assert!(message.contains("non JSON-RPC"), "{message}");
        }
        other => panic!("unexpected {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn unreachable_bundler_is_a_transport_error() -> eyre::Result<()> {
    // Bind then drop to get a port nothing listens on
    let addr = TcpListener::bind("127.0.0.1:0").await?.local_addr()?;

    let client = BundlerClient::new(format!("http://{addr}"));
    let err = client
        .send_user_operation(&user_operation(), &entry_point(), &SubmitOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AutoBridgeError::Transport { .. }), "{err:?}");

    Ok(())
}
