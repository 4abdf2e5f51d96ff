mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use rust_decimal::Decimal;

use copytrader::build_controller;
use copytrader::config::AppConfig;
use copytrader::ledger::{MemoryLedger, TradeLedger};
use copytrader::models::{
    FollowerTradeStatus, NewFollowerTrade, NewLeaderTrade, Side, SettingsUpdate, TradingMode,
    TradingStatus,
};
use copytrader::ports::MarketDataPort;
use copytrader::services::mode_controller::{ControlError, ModeController};

use common::{FakeMarketData, FlakyLedger, WALLET_A};

fn setup() -> (Arc<MemoryLedger>, Arc<ModeController>) {
    let ledger = Arc::new(MemoryLedger::new());
    let market: Arc<dyn MarketDataPort> = Arc::new(FakeMarketData::default());
    let config = AppConfig {
        poll_interval_secs: 3600,
        ..Default::default()
    };
    let controller = build_controller(&config, ledger.clone(), market, None);
    (ledger, controller)
}

async fn event_types(ledger: &MemoryLedger) -> Vec<String> {
    ledger
        .list_events(100)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.event_type)
        .collect()
}

#[tokio::test]
async fn test_start_spawns_monitor_and_persists_running() {
    let (ledger, controller) = setup();

    let settings = controller.start().await.unwrap();

    assert_eq!(settings.global_trading_status, TradingStatus::Running);
    assert_eq!(controller.status(), TradingStatus::Running);
    assert!(controller.monitor_alive().await);
    assert_eq!(
        ledger.load_settings().await.unwrap().global_trading_status,
        TradingStatus::Running
    );

    controller.stop().await.unwrap();
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let (_ledger, controller) = setup();
    controller.start().await.unwrap();

    let err = controller.start().await.unwrap_err();
    assert!(matches!(
        err,
        ControlError::InvalidTransition {
            from: TradingStatus::Running,
            to: TradingStatus::Running
        }
    ));

    controller.stop().await.unwrap();
}

#[tokio::test]
async fn test_pause_requires_running() {
    let (_ledger, controller) = setup();

    assert!(matches!(
        controller.pause().await,
        Err(ControlError::InvalidTransition { .. })
    ));

    controller.start().await.unwrap();
    let paused = controller.pause().await.unwrap();
    assert_eq!(paused.global_trading_status, TradingStatus::Paused);
    // Monitor idles while paused instead of exiting
    assert!(controller.monitor_alive().await);

    let resumed = controller.start().await.unwrap();
    assert_eq!(resumed.global_trading_status, TradingStatus::Running);
    controller.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_drains_monitor() {
    let (ledger, controller) = setup();
    controller.start().await.unwrap();

    let settings = controller.stop().await.unwrap();

    assert_eq!(settings.global_trading_status, TradingStatus::Stopped);
    assert!(!controller.monitor_alive().await);
    assert!(matches!(
        controller.stop().await,
        Err(ControlError::InvalidTransition { .. })
    ));

    let events = event_types(&ledger).await;
    assert_eq!(events[0], "BOT_STOPPED");
    assert_eq!(events[1], "BOT_STARTED");
}

#[tokio::test]
async fn test_switch_mode_while_running_stops_first() {
    let (ledger, controller) = setup();
    controller.start().await.unwrap();

    let settings = controller.switch_mode(TradingMode::Live, false).await.unwrap();

    assert_eq!(settings.global_trading_mode, TradingMode::Live);
    assert_eq!(settings.global_trading_status, TradingStatus::Stopped);
    assert!(settings.last_mode_switch.is_some());
    assert!(settings.live_mode_started.is_some());
    assert!(!controller.monitor_alive().await);

    let events = event_types(&ledger).await;
    assert_eq!(&events[..3], ["MODE_SWITCHED", "BOT_STOPPED", "BOT_STARTED"]);
}

#[tokio::test]
async fn test_switch_to_test_rearms_dry_run() {
    let (ledger, controller) = setup();
    controller.switch_mode(TradingMode::Live, false).await.unwrap();
    controller
        .update_settings(SettingsUpdate {
            dry_run_enabled: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();

    let test = controller.switch_mode(TradingMode::Test, false).await.unwrap();
    assert!(test.dry_run_enabled);
    let switched = ledger.list_events(1).await.unwrap();
    assert_eq!(switched[0].event_type, "MODE_SWITCHED");
    assert_eq!(switched[0].metadata["dry_run_enabled"], true);

    let live = controller.switch_mode(TradingMode::Live, false).await.unwrap();
    assert!(live.dry_run_enabled);
    assert!(live.is_simulated());
}

#[tokio::test]
async fn test_failed_stop_save_keeps_running_signal() {
    let ledger = Arc::new(FlakyLedger::default());
    let market: Arc<dyn MarketDataPort> = Arc::new(FakeMarketData::default());
    let config = AppConfig {
        poll_interval_secs: 3600,
        ..Default::default()
    };
    let controller = build_controller(&config, ledger.clone(), market, None);
    controller.start().await.unwrap();

    ledger.fail_settings_saves.store(true, Ordering::SeqCst);
    assert!(matches!(controller.stop().await, Err(ControlError::Ledger(_))));
    assert_eq!(controller.status(), TradingStatus::Running);
    assert_eq!(
        ledger.load_settings().await.unwrap().global_trading_status,
        TradingStatus::Running
    );

    ledger.fail_settings_saves.store(false, Ordering::SeqCst);
    let settings = controller.stop().await.unwrap();
    assert_eq!(settings.global_trading_status, TradingStatus::Stopped);
    assert_eq!(controller.status(), TradingStatus::Stopped);
}

#[tokio::test]
async fn test_switch_to_same_mode_is_rejected() {
    let (_ledger, controller) = setup();

    let err = controller.switch_mode(TradingMode::Test, false).await.unwrap_err();
    assert!(matches!(err, ControlError::ModeUnchanged(TradingMode::Test)));
}

#[tokio::test]
async fn test_switch_mode_with_reset_clears_history() {
    let (ledger, controller) = setup();
    let wallet = ledger.insert_wallet(WALLET_A, None).await.unwrap().unwrap();
    let leader = ledger
        .insert_leader_trade(NewLeaderTrade {
            external_trade_id: "tx1".into(),
            wallet_id: wallet.id,
            market_id: "m1".into(),
            outcome_id: "o1".into(),
            side: Side::Yes,
            size: Decimal::from(100),
            price: Decimal::new(5, 1),
            executed_at: chrono::Utc::now(),
            category: None,
        })
        .await
        .unwrap()
        .unwrap();
    ledger
        .record_execution(NewFollowerTrade {
            leader_trade_id: leader.id,
            market_id: "m1".into(),
            outcome_id: "o1".into(),
            side: Side::Yes,
            size: Decimal::from(20),
            price: Decimal::new(51, 2),
            status: FollowerTradeStatus::Simulated,
            is_dry_run: true,
            order_id: None,
            error_message: None,
            executed_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

    controller.switch_mode(TradingMode::Live, true).await.unwrap();

    assert!(ledger.list_follower_trades(10).await.unwrap().is_empty());
    assert!(ledger.list_leader_trades(10).await.unwrap().is_empty());
    assert!(ledger.list_positions().await.unwrap().is_empty());
    assert!(event_types(&ledger).await.contains(&"ANALYTICS_RESET".to_string()));
}

#[tokio::test]
async fn test_reset_requires_stopped() {
    let (_ledger, controller) = setup();
    controller.start().await.unwrap();

    assert!(matches!(
        controller.reset_analytics().await,
        Err(ControlError::NotStopped(TradingStatus::Running))
    ));

    controller.stop().await.unwrap();
    assert!(controller.reset_analytics().await.is_ok());
}

#[tokio::test]
async fn test_update_settings_validates_and_keeps_status() {
    let (ledger, controller) = setup();
    controller.start().await.unwrap();

    let bad = SettingsUpdate {
        copy_trade_percentage: Some(Decimal::ZERO),
        ..Default::default()
    };
    assert!(matches!(
        controller.update_settings(bad).await,
        Err(ControlError::InvalidSettings(_))
    ));

    let good = SettingsUpdate {
        max_trade_amount: Some(Decimal::from(250)),
        ..Default::default()
    };
    let settings = controller.update_settings(good).await.unwrap();
    assert_eq!(settings.max_trade_amount, Decimal::from(250));
    assert_eq!(settings.global_trading_status, TradingStatus::Running);
    assert!(event_types(&ledger).await.contains(&"SETTINGS_UPDATED".to_string()));

    controller.stop().await.unwrap();
}

#[tokio::test]
async fn test_restore_resumes_and_shutdown_keeps_persisted_status() {
    let (ledger, controller) = setup();
    let mut stored = ledger.load_settings().await.unwrap();
    stored.global_trading_status = TradingStatus::Running;
    ledger.save_settings(&stored).await.unwrap();

    controller.restore().await.unwrap();
    assert_eq!(controller.status(), TradingStatus::Running);
    assert!(controller.monitor_alive().await);

    controller.shutdown().await;
    assert!(!controller.monitor_alive().await);
    assert_eq!(
        ledger.load_settings().await.unwrap().global_trading_status,
        TradingStatus::Running
    );
}
