use autobridge_contracts::EXECUTE_ROUTE_SELECTOR;
use autobridge_primitives::{
    config::Env, AutoBridgeError, BridgeMetadata, ChainRegistry, PoolConfig, RouteRequest,
};
use autobridge_routing::{PlanStrategy, PlannerConfig, RouteEncoder, RoutePlanner};
use ethers::types::{Address, I256, U256};
use std::{str::FromStr, sync::Arc};

const NOW: u64 = 1_700_000_000_000;

fn registry() -> Arc<ChainRegistry> {
    Arc::new(ChainRegistry::builtin())
}

fn request() -> RouteRequest {
    RouteRequest {
        src_chain: "base-sepolia".into(),
        dst_chain: "optimism-sepolia".into(),
        token_in: "WETH".into(),
        token_out: "USDCx".into(),
        amount_in: "1.0".into(),
        recipient: "0x000000000000000000000000000000000000dEaD".into(),
    }
}

fn token(chain: &str, symbol: &str) -> Address {
    ChainRegistry::builtin().token(chain, symbol).unwrap().address
}

fn hook() -> Address {
    Address::repeat_byte(0x77)
}

fn smart_account() -> Address {
    Address::repeat_byte(0xaa)
}

fn paymaster() -> Address {
    Address::repeat_byte(0xbb)
}

#[test]
fn standard_route_input() {
    let plan = RoutePlanner::new(registry(), PlannerConfig::default())
        .unwrap()
        .plan_at(&request(), NOW)
        .unwrap();
    let route = RouteEncoder::new(registry(), PoolConfig::new(hook()))
        .encode(&plan, smart_account(), paymaster())
        .unwrap();

    let weth = token("base-sepolia", "WETH");
    let usdx = token("base-sepolia", "USDX");
    assert_eq!(route.user, smart_account());
    assert_eq!(route.token_in, weth);
    assert_eq!(route.amount_in, U256::exp10(18));
    assert!(!route.permit.use_permit);

    let source = &route.source_swap;
    assert!(source.execute);
    assert_eq!((source.pool_key.currency0, source.pool_key.currency1), (weth, usdx));
    assert_eq!(source.pool_key.hooks, hook());
    assert!(source.swap_params.zero_for_one);
    assert_eq!(source.swap_params.amount_specified, I256::from_raw(U256::exp10(18)));
    assert_eq!(source.min_amount_out, U256::from(995u64) * U256::exp10(15));
    assert_eq!(source.bridge_fee.extra_fee_bps, 40);
    assert_eq!(source.bridge_fee.max_fee_bps, 80);
    assert_eq!(source.bridge_fee.ttl, 60);
    assert_eq!(source.bridge_fee.quote_timestamp, NOW / 1000);
    assert_eq!(source.gas_fee.vault, paymaster());
    assert_eq!((source.gas_fee.skim_bps, source.gas_fee.max_skim_bps), (10, 100));

    let bridge = &route.bridge;
    assert_eq!(bridge.refund_address, smart_account());
    assert_eq!(bridge.dst_eid, 0);
    assert_eq!(bridge.dest_executor, Address::zero());
    assert!(bridge.options.is_empty());
    assert_eq!(bridge.fee.native_fee, 0);

    let payload = &bridge.dest_payload;
    assert_eq!(
        payload.recipient,
        Address::from_str("0x000000000000000000000000000000000000dEaD").unwrap()
    );
    assert_eq!(payload.ttl, 60);
    assert_eq!(payload.quote_timestamp, NOW / 1000);

    let dest = &payload.dest_swap;
    let usdx_op = token("optimism-sepolia", "USDX");
    let usdcx_op = token("optimism-sepolia", "USDCx");
    assert!(dest.execute);
    assert_eq!(dest.token_out, usdcx_op);
    assert_eq!((dest.pool_key.currency0, dest.pool_key.currency1), (usdcx_op, usdx_op));
    assert!(!dest.swap_params.zero_for_one);
    assert_eq!(dest.min_amount_out, U256::from(990_025u64));

    let call_data = route.execute_route_call_data();
    assert_eq!(&call_data[..4], EXECUTE_ROUTE_SELECTOR.as_slice());
}

#[test]
fn simplified_route_has_inert_destination_swap() {
    let plan = RoutePlanner::new(
        registry(),
        PlannerConfig { strategy: PlanStrategy::Simplified, ..Default::default() },
    )
    .unwrap()
    .plan_at(&request(), NOW)
    .unwrap();
    let pool = PoolConfig::new(hook());
    let route = RouteEncoder::new(registry(), pool.clone())
        .encode(&plan, smart_account(), paymaster())
        .unwrap();

    assert_eq!(route.source_swap.min_amount_out, U256::exp10(18));
    assert_eq!(route.source_swap.bridge_fee.extra_fee_bps, 0);
    assert_eq!(route.source_swap.bridge_fee.max_fee_bps, 80);
    assert_eq!(route.source_swap.gas_fee.vault, paymaster());
    assert_eq!(route.source_swap.gas_fee.skim_bps, 0);
    // floor applies even without a skim
    assert_eq!(route.source_swap.gas_fee.max_skim_bps, 100);

    let dest = &route.bridge.dest_payload.dest_swap;
    assert!(!dest.execute);
    assert_eq!(dest.token_out, Address::zero());
    assert_eq!(dest.pool_key.currency0, Address::zero());
    assert_eq!(dest.pool_key.fee, pool.fee);
    assert_eq!(dest.pool_key.tick_spacing, pool.tick_spacing);
    assert_eq!(dest.pool_key.hooks, hook());
    assert!(dest.swap_params.zero_for_one);
    assert_eq!(dest.min_amount_out, U256::zero());
}

#[test]
fn dust_route_encodes_zero_minimums() {
    let mut dust = request();
    dust.amount_in = "0.0000001".into();
    let mut plan = RoutePlanner::new(registry(), PlannerConfig::default())
        .unwrap()
        .plan_at(&dust, NOW)
        .unwrap();
    let route = RouteEncoder::new(registry(), PoolConfig::new(hook()))
        .encode(&plan, smart_account(), paymaster())
        .unwrap();

    assert_eq!(route.amount_in, U256::from(100_000_000_000u64));
    assert_eq!(route.source_swap.min_amount_out, U256::from(99_500_000_000u64));
    let dest = &route.bridge.dest_payload.dest_swap;
    assert!(dest.execute);
    assert_eq!(dest.swap_params.amount_specified, I256::from(99_500_000_000i64));
    assert_eq!(dest.min_amount_out, U256::zero());

    // the route input itself stays strictly positive
    plan.amount_in = "0".into();
    assert_eq!(
        RouteEncoder::new(registry(), PoolConfig::new(hook()))
            .encode(&plan, smart_account(), paymaster())
            .unwrap_err(),
        AutoBridgeError::input("Amount must be positive: 0")
    );
}

#[test]
fn gas_vault_resolution_order() {
    let planner = RoutePlanner::new(registry(), PlannerConfig::default()).unwrap();
    let mut plan = planner.plan_at(&request(), NOW).unwrap();
    let env_vault = Address::repeat_byte(0xcc);
    let hook_vault = Address::repeat_byte(0xdd);

    let encoder = RouteEncoder::new(registry(), PoolConfig::new(hook()).with_gas_vault(env_vault));
    let route = encoder.encode(&plan, smart_account(), paymaster()).unwrap();
    assert_eq!(route.source_swap.gas_fee.vault, env_vault);

    // a zero vault in the hook config counts as unset
    let shield = plan.source_swap.hooks.as_mut().unwrap().gas_shield.as_mut().unwrap();
    shield.gas_vault = Some(Address::zero());
    let route = encoder.encode(&plan, smart_account(), paymaster()).unwrap();
    assert_eq!(route.source_swap.gas_fee.vault, env_vault);

    let shield = plan.source_swap.hooks.as_mut().unwrap().gas_shield.as_mut().unwrap();
    shield.gas_vault = Some(hook_vault);
    let route = encoder.encode(&plan, smart_account(), paymaster()).unwrap();
    assert_eq!(route.source_swap.gas_fee.vault, hook_vault);
}

#[test]
fn bridge_metadata_passes_through() {
    let planner = RoutePlanner::new(registry(), PlannerConfig::default()).unwrap();
    let mut plan = planner.plan_at(&request(), NOW).unwrap();
    plan.bridge.metadata = BridgeMetadata {
        native_fee_wei: Some(U256::from(1_000_000_000_000_000u64)),
        lz_token_fee_wei: Some(U256::from(7)),
        dst_eid: Some(40232),
        dest_executor: Some(Address::repeat_byte(0x0e)),
        options: Some(vec![0x00, 0x03, 0x01].into()),
        price_payload: Some(vec![0xfe].into()),
        ..Default::default()
    };

    let route = RouteEncoder::new(registry(), PoolConfig::new(hook()))
        .encode(&plan, smart_account(), paymaster())
        .unwrap();
    assert_eq!(route.source_swap.bridge_fee.native_fee, 1_000_000_000_000_000);
    assert_eq!(route.bridge.fee.native_fee, 1_000_000_000_000_000);
    assert_eq!(route.bridge.fee.lz_token_fee, 7);
    assert_eq!(route.bridge.dst_eid, 40232);
    assert_eq!(route.bridge.dest_executor, Address::repeat_byte(0x0e));
    assert_eq!(route.bridge.options.to_vec(), vec![0x00, 0x03, 0x01]);
    assert_eq!(route.bridge.dest_payload.price_payload.to_vec(), vec![0xfe]);

    plan.bridge.metadata.native_fee_wei = Some(U256::MAX);
    assert!(matches!(
        RouteEncoder::new(registry(), PoolConfig::new(hook())).encode(
            &plan,
            smart_account(),
            paymaster()
        ),
        Err(AutoBridgeError::InvariantViolation { .. })
    ));
}

#[test]
fn missing_pool_hook_is_fatal() {
    let err = RouteEncoder::from_env(registry(), &Env::new()).unwrap_err();
    assert!(matches!(err, AutoBridgeError::InputValidation { .. }));
    assert!(err.to_string().contains("POOL_HOOK_ADDRESS"));
}

#[tokio::test]
async fn concurrent_plans_share_the_planner() {
    let planner = Arc::new(RoutePlanner::new(registry(), PlannerConfig::default()).unwrap());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let planner = planner.clone();
            tokio::spawn(async move { planner.plan_at(&request(), NOW) })
        })
        .collect();

    let expected = planner.plan_at(&request(), NOW).unwrap();
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), expected);
    }
}
