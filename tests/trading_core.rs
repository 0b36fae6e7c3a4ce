//! Trading Core Integration Tests
//!
//! Integration tests that verify the trading components work together:
//! 1. TradingEngine entry gates -> position lifecycle -> exit checks
//! 2. CopyTradeMirror gate chain -> TradingEngine execution
//! 3. Configuration persistence across mirror restarts
//!
//! All tests are deterministic (no real network calls) and use mock ports.

use std::sync::Arc;
use std::time::Duration;

use aegis_trader::config::{EngineSection, MirrorSection};
use aegis_trader::domain::{SafetyLimits, TradeOrigin};
use aegis_trader::engine::{EntryDecision, ExitKind, TradingEngine};
use aegis_trader::mirror::{
    CopyAction, CopyTradeConfig, CopyTradeMirror, WalletTradeEvent, CONFIG_STORE_KEY,
    ENABLE_CONFIRMATION_PHRASE,
};
use aegis_trader::ports::mocks::{MockConfigStore, MockExecutor, MockMarketData, MockWalletIntel};
use aegis_trader::ports::{ConfigStore, FileConfigStore, TokenSnapshot};

// ============================================================================
// Test Fixtures
// ============================================================================

const MINT: &str = "MemeMint111111111111111111111111111111111111";
const SMART_WALLET: &str = "AlphaWallet1111111111111111111111111111111";

fn healthy_token(price_sol: f64) -> TokenSnapshot {
    TokenSnapshot {
        mint: MINT.to_string(),
        symbol: "MEME".to_string(),
        price_sol,
        market_cap_usd: 150_000.0,
        liquidity_usd: 40_000.0,
        buys_1h: 60,
        sells_1h: 20,
    }
}

fn observed_buy(amount_sol: f64) -> WalletTradeEvent {
    WalletTradeEvent {
        wallet: SMART_WALLET.to_string(),
        action: CopyAction::Buy,
        mint: MINT.to_string(),
        symbol: "MEME".to_string(),
        amount_sol,
    }
}

struct TestStack {
    engine: Arc<TradingEngine>,
    mirror: CopyTradeMirror,
    executor: Arc<MockExecutor>,
    market: Arc<MockMarketData>,
}

/// Engine and mirror wired to mocks, both enabled, auto-execution on.
async fn build_stack() -> TestStack {
    let executor = Arc::new(MockExecutor::new());
    let market = Arc::new(MockMarketData::new().with_token(healthy_token(0.001)));
    let intel = Arc::new(MockWalletIntel::new().with_wallet(SMART_WALLET, "Alpha", 0.8));
    let store = Arc::new(MockConfigStore::new());

    // Interval gate relaxed so back-to-back copies can run in one test
    let limits = SafetyLimits {
        min_trade_interval: Duration::ZERO,
        ..SafetyLimits::default()
    };
    let engine = Arc::new(TradingEngine::new(
        EngineSection::default(),
        limits,
        executor.clone(),
        market.clone(),
    ));
    engine.enable().await;

    let mirror = CopyTradeMirror::new(
        engine.clone(),
        intel,
        store,
        MirrorSection::default(),
        CopyTradeConfig {
            enabled: true,
            whitelist: Vec::new(),
            size_multiplier: 0.5,
            copy_buys_only: false,
            require_approval: false,
        },
    );

    TestStack {
        engine,
        mirror,
        executor,
        market,
    }
}

// ============================================================================
// Strategy lifecycle
// ============================================================================

#[tokio::test]
async fn test_strategy_entry_to_take_profit() {
    let stack = build_stack().await;

    let decision = stack.engine.evaluate_and_enter(MINT).await.unwrap();
    assert!(matches!(decision, EntryDecision::Enter { size_sol } if size_sol == 0.25));
    assert_eq!(stack.engine.total_exposure(None).await, 0.25);

    // Price doubles: the next exit check takes profit
    stack.market.set_token(healthy_token(0.002));
    stack.executor.set_sell_pnl(0.25);
    let events = stack.engine.check_exits().await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, ExitKind::TakeProfit);
    assert!(events[0].outcome.is_ok());
    assert_eq!(stack.engine.total_exposure(None).await, 0.0);

    let stats = stack.engine.stats().await;
    assert_eq!(stats.wins, 1);
    assert_eq!(stats.losses, 0);
}

#[tokio::test]
async fn test_disabled_engine_blocks_both_entry_paths() {
    let stack = build_stack().await;
    stack.engine.disable().await;

    let decision = stack.engine.evaluate_candidate(MINT).await.unwrap();
    assert!(!decision.is_enter());

    assert!(stack.engine.open_copy_position(MINT, 0.25).await.is_err());
    assert!(stack.executor.buy_calls().is_empty());
}

// ============================================================================
// Copy-trade flow through the engine
// ============================================================================

#[tokio::test]
async fn test_observed_buy_becomes_copy_position() {
    let stack = build_stack().await;

    let decision = stack.mirror.handle_observed_trade(&observed_buy(1.0)).await;

    assert!(decision.should_copy, "refused: {}", decision.reason);
    assert_eq!(
        stack.engine.total_exposure(Some(TradeOrigin::Copy)).await,
        0.5
    );
    // Strategy exposure is untouched
    assert_eq!(
        stack.engine.total_exposure(Some(TradeOrigin::Strategy)).await,
        0.0
    );
}

#[tokio::test]
async fn test_observed_sell_closes_the_copied_position() {
    let stack = build_stack().await;
    stack.mirror.handle_observed_trade(&observed_buy(1.0)).await;
    stack.executor.set_sell_pnl(0.1);

    let decision = stack
        .mirror
        .handle_observed_trade(&WalletTradeEvent {
            action: CopyAction::Sell,
            ..observed_buy(1.0)
        })
        .await;

    assert!(decision.should_copy, "refused: {}", decision.reason);
    assert_eq!(stack.engine.total_exposure(None).await, 0.0);
    assert_eq!(stack.executor.sell_calls().len(), 1);

    let recent = stack.mirror.recent_executions(10).await;
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].realized_pnl_sol, Some(0.1));
}

#[tokio::test]
async fn test_caps_hold_across_the_whole_stack() {
    let stack = build_stack().await;

    // A 40 SOL observed whale buy at 0.5x would be 20 SOL; the per-trade
    // clamp cuts it to 0.5 SOL before it reaches the executor.
    let decision = stack.mirror.handle_observed_trade(&observed_buy(40.0)).await;
    assert!(decision.should_copy, "refused: {}", decision.reason);
    assert_eq!(stack.executor.buy_calls(), vec![(MINT.to_string(), 0.5)]);

    // Engine-side strategy entries keep their own cap independently
    let entry = stack.engine.evaluate_and_enter(MINT).await.unwrap();
    assert!(entry.is_enter());
    assert!(stack.engine.total_exposure(None).await <= 5.0);
}

// ============================================================================
// Configuration persistence
// ============================================================================

#[tokio::test]
async fn test_mirror_config_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.json");
    let intel = Arc::new(MockWalletIntel::new());

    let executor = Arc::new(MockExecutor::new());
    let market = Arc::new(MockMarketData::new());
    let engine = Arc::new(TradingEngine::new(
        EngineSection::default(),
        SafetyLimits::default(),
        executor,
        market,
    ));
    engine.enable().await;

    // First process life: enable and persist
    {
        let store = Arc::new(FileConfigStore::new(&store_path));
        let mirror = CopyTradeMirror::load(
            engine.clone(),
            intel.clone(),
            store,
            MirrorSection::default(),
        )
        .await;
        assert!(!mirror.is_enabled().await);
        mirror.enable(ENABLE_CONFIRMATION_PHRASE).await.unwrap();
    }

    // Second process life: state comes back from disk
    let store = Arc::new(FileConfigStore::new(&store_path));
    assert!(store.get(CONFIG_STORE_KEY).await.unwrap().is_some());
    let mirror = CopyTradeMirror::load(engine, intel, store, MirrorSection::default()).await;
    assert!(mirror.is_enabled().await);
}
