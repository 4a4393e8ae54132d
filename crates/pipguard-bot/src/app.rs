//! Application wiring and per-account monitor tasks.
//!
//! Each account runs as its own tokio task owning every piece of its
//! state: gateway session, tracker, audit log, heartbeat, counters.
//! Nothing is shared between accounts, so one broken session never
//! stalls another. Shutdown is signalled over a watch channel and
//! checked between cycles, so an in-flight action batch always
//! completes before disconnect.

use std::sync::Arc;
use std::time::Duration;

use pipguard_core::{Direction, Position, Price, Symbol, Ticket, Volume};
use pipguard_engine::{LadderCache, Monitor, SessionTracker, TpLadder};
use pipguard_gateway::{DynGateway, SimGateway};
use pipguard_persistence::FileHitGroupStore;
use pipguard_telemetry::{ActivitySummary, AuditLog, Heartbeat};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::{AccountConfig, AppConfig};
use crate::error::{AppError, AppResult};

/// Gateway factory: one gateway per account.
pub type GatewayFactory = dyn Fn(&AccountConfig) -> AppResult<DynGateway> + Send + Sync;

/// Top-level application.
pub struct Application {
    config: AppConfig,
}

impl Application {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Run all configured accounts until Ctrl-C.
    pub async fn run(self) -> AppResult<()> {
        self.run_with_gateways(Arc::new(default_gateway)).await
    }

    /// Run with a custom gateway factory (tests, alternative bridges).
    pub async fn run_with_gateways(self, factory: Arc<GatewayFactory>) -> AppResult<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut handles = Vec::new();

        for account in &self.config.accounts {
            let gateway = factory(account)?;
            let monitor = self.build_monitor(account, gateway)?;
            let heartbeat = Heartbeat::new(&self.config.telemetry.heartbeat_dir, &account.name)?;
            let tick = Duration::from_millis(self.config.monitor.tick_interval_ms);
            let name = account.name.clone();
            let rx = shutdown_rx.clone();

            handles.push(tokio::spawn(run_account(
                name, monitor, heartbeat, tick, rx,
            )));
        }
        drop(shutdown_rx);

        info!(accounts = self.config.accounts.len(), "pipguard running");
        tokio::signal::ctrl_c().await?;
        info!("shutdown requested, finishing in-flight cycles");
        // receivers check between cycles; an in-flight batch completes
        let _ = shutdown_tx.send(true);

        for handle in handles {
            if let Err(err) = handle.await {
                error!(error = %err, "account task panicked");
            }
        }
        Ok(())
    }

    fn build_monitor(&self, account: &AccountConfig, gateway: DynGateway) -> AppResult<Monitor> {
        let audit = AuditLog::open(&self.config.telemetry.audit_file, &account.name)?;
        let stats = ActivitySummary::new(
            &account.name,
            Duration::from_secs(self.config.monitor.summary_interval_secs),
        );

        let tracker = if self.config.engine.progressive {
            let path = std::path::Path::new(&self.config.persistence.state_dir)
                .join(format!("{}_hit_groups.log", account.name));
            let store = FileHitGroupStore::open(path)?;
            SessionTracker::with_store(Box::new(store))?
        } else {
            SessionTracker::new()
        };

        let mut ladders = LadderCache::new();
        for ladder in &self.config.ladders {
            ladders.insert(
                &ladder.group,
                TpLadder::new(ladder.levels.iter().copied().map(Price::new).collect()),
            );
        }

        Ok(Monitor::new(
            &account.name,
            gateway,
            self.config.engine.clone(),
            tracker,
            ladders,
            audit,
            stats,
        ))
    }
}

async fn run_account(
    name: String,
    mut monitor: Monitor,
    heartbeat: Heartbeat,
    tick: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(account = %name, "monitor task started");
    loop {
        if *shutdown.borrow() {
            break;
        }
        if let Err(err) = heartbeat.beat() {
            warn!(account = %name, error = %err, "heartbeat write failed");
        }
        monitor.run_cycle().await;

        tokio::select! {
            _ = tokio::time::sleep(tick) => {}
            _ = shutdown.changed() => {}
        }
    }
    monitor.flush_summary();
    info!(account = %name, "monitor task stopped");
}

/// Default factory: simulated broker for simulation accounts. Live
/// terminal bridges are provided externally through
/// `run_with_gateways`.
fn default_gateway(account: &AccountConfig) -> AppResult<DynGateway> {
    if !account.simulation {
        return Err(AppError::Config(format!(
            "account {} is not marked simulation and no terminal bridge is configured",
            account.name
        )));
    }
    Ok(seeded_sim_gateway(account))
}

/// Seed a simulation gateway with a two-leg group a few pips short
/// of its TP1, so a demo run exercises the full securing sequence.
fn seeded_sim_gateway(account: &AccountConfig) -> DynGateway {
    let symbol = Symbol::new(account.test_symbol.as_deref().unwrap_or("EURUSD"));
    let gateway = SimGateway::new();
    let now = unix_now();

    let base = Price::new(Decimal::new(11000, 4)); // 1.1000
    let tp1 = Price::new(Decimal::new(11010, 4)); // 1.1010
    let tp2 = Price::new(Decimal::new(11030, 4)); // 1.1030

    for (ticket, entry, tp, offset) in [
        (1u64, base, tp1, 0i64),
        (2u64, Price::new(base.inner() + Decimal::new(1, 4)), tp2, 2),
    ] {
        gateway.push_position(Position {
            ticket: Ticket(ticket),
            symbol: symbol.clone(),
            direction: Direction::Buy,
            volume: Volume::new(Decimal::new(1, 1)),
            open_price: entry,
            stop_loss: Price::ZERO,
            take_profit: tp,
            current_price: entry,
            open_time: now - 600 + offset,
            comment: String::new(),
        });
    }
    // quote sits just short of TP1
    gateway.set_price(&symbol, Price::new(tp1.inner() - Decimal::new(2, 5)));
    Arc::new(gateway)
}

fn unix_now() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MonitorConfig, PersistenceConfig, TelemetryConfig};
    use pipguard_engine::EngineConfig;

    fn sim_account(name: &str) -> AccountConfig {
        AccountConfig {
            name: name.to_string(),
            login: 1,
            server: "sim".to_string(),
            password_env: None,
            simulation: true,
            test_symbol: Some("EURUSD".to_string()),
        }
    }

    #[test]
    fn test_default_factory_rejects_live_accounts() {
        let mut account = sim_account("live");
        account.simulation = false;
        assert!(default_gateway(&account).is_err());
    }

    #[tokio::test]
    async fn test_seeded_gateway_has_group_near_tp() {
        let gateway = seeded_sim_gateway(&sim_account("demo"));
        let positions = gateway.positions().await.unwrap();
        assert_eq!(positions.len(), 2);
        // both legs within grouping proximity
        assert!((positions[0].open_time - positions[1].open_time).abs() <= 5);
    }

    #[tokio::test]
    async fn test_build_monitor_for_sim_account() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            accounts: vec![sim_account("demo")],
            engine: EngineConfig::default(),
            monitor: MonitorConfig::default(),
            telemetry: TelemetryConfig {
                audit_file: dir
                    .path()
                    .join("key_events.log")
                    .to_string_lossy()
                    .into_owned(),
                heartbeat_dir: dir.path().join("hb").to_string_lossy().into_owned(),
            },
            persistence: PersistenceConfig {
                state_dir: dir.path().join("state").to_string_lossy().into_owned(),
            },
            ladders: vec![],
        };
        let app = Application::new(config.clone());

        let sim = Arc::new(SimGateway::new());
        let symbol = Symbol::new("EURUSD");
        sim.push_position(Position {
            ticket: Ticket(1),
            symbol: symbol.clone(),
            direction: Direction::Buy,
            volume: Volume::new(Decimal::new(1, 1)),
            open_price: Price::new(Decimal::new(11000, 4)),
            stop_loss: Price::ZERO,
            take_profit: Price::new(Decimal::new(11010, 4)),
            current_price: Price::new(Decimal::new(11000, 4)),
            open_time: 1000,
            comment: String::new(),
        });
        sim.push_position(Position {
            ticket: Ticket(2),
            symbol: symbol.clone(),
            direction: Direction::Buy,
            volume: Volume::new(Decimal::new(1, 1)),
            open_price: Price::new(Decimal::new(11001, 4)),
            stop_loss: Price::ZERO,
            take_profit: Price::new(Decimal::new(11030, 4)),
            current_price: Price::new(Decimal::new(11001, 4)),
            open_time: 1002,
            comment: String::new(),
        });
        sim.set_price(&symbol, Price::new(Decimal::new(110098, 5)));

        let mut monitor = app
            .build_monitor(&config.accounts[0], sim.clone() as DynGateway)
            .unwrap();
        monitor.run_cycle().await;

        // scenario fires: TP1 leg secured at its entry
        let p1 = sim.position(Ticket(1)).unwrap();
        assert_eq!(p1.stop_loss, p1.open_price);
    }
}
