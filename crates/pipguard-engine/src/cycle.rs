//! Per-account monitoring cycle.
//!
//! One `run_cycle` call is a full pass: connectivity check, position
//! snapshot, housekeeping, grouping, trigger evaluation, dispatch,
//! follow-up securing, summary cadence. Every failure is absorbed
//! and counted; a bad tick never kills the loop.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use pipguard_core::{pip_size, Position};
use pipguard_gateway::DynGateway;
use pipguard_telemetry::{ActivitySummary, AuditLog};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::decision::{evaluate, TpMetrics};
use crate::dispatcher::Dispatcher;
use crate::grouper::{group_positions, GroupKey, SignalGroup};
use crate::ladder::LadderCache;
use crate::ranker::{rank_from_tag, rank_in_group};
use crate::tracker::SessionTracker;

/// Per-account monitor: owns everything one account needs.
pub struct Monitor {
    account: String,
    gateway: DynGateway,
    config: EngineConfig,
    tracker: SessionTracker,
    ladders: LadderCache,
    audit: AuditLog,
    stats: ActivitySummary,
}

impl Monitor {
    pub fn new(
        account: impl Into<String>,
        gateway: DynGateway,
        config: EngineConfig,
        tracker: SessionTracker,
        ladders: LadderCache,
        audit: AuditLog,
        stats: ActivitySummary,
    ) -> Self {
        Self {
            account: account.into(),
            gateway,
            config,
            tracker,
            ladders,
            audit,
            stats,
        }
    }

    /// Run one monitoring pass.
    pub async fn run_cycle(&mut self) {
        if !self.gateway.is_connected() {
            if let Err(err) = self.gateway.connect().await {
                warn!(account = %self.account, error = %err, "terminal unreachable, skipping cycle");
                self.stats.record_error();
                return;
            }
            info!(account = %self.account, "terminal session re-established");
        }

        let positions = match self.gateway.positions().await {
            Ok(positions) => positions,
            Err(err) => {
                warn!(account = %self.account, error = %err, "position snapshot failed, skipping cycle");
                self.stats.record_error();
                self.stats.maybe_emit(false);
                return;
            }
        };

        self.tracker.clear_secured_if_flat(positions.len());
        if positions.is_empty() {
            self.stats.maybe_emit(false);
            return;
        }

        self.stats.record_checked(positions.len() as u64);
        for position in &positions {
            self.stats.record_symbol(position.symbol.as_str());
        }

        let groups = group_positions(&positions, &self.config);
        let live_keys: HashSet<GroupKey> = groups.iter().map(|g| g.key.clone()).collect();
        self.tracker.retain_live_groups(&live_keys);

        let mut groups_per_symbol: HashMap<&str, usize> = HashMap::new();
        for group in &groups {
            *groups_per_symbol.entry(group.key.symbol.as_str()).or_default() += 1;
        }

        let now = Utc::now().timestamp();
        let mut triggered: HashSet<GroupKey> = HashSet::new();

        for group in &groups {
            let multi_group = groups_per_symbol
                .get(group.key.symbol.as_str())
                .is_some_and(|n| *n > 1);
            self.process_group(group, multi_group, now, &mut triggered).await;
        }

        self.stats.maybe_emit(false);
    }

    /// Force the activity summary out, end of session.
    pub fn flush_summary(&mut self) {
        self.stats.maybe_emit(true);
    }

    async fn process_group(
        &mut self,
        group: &SignalGroup,
        multi_group: bool,
        now: i64,
        triggered: &mut HashSet<GroupKey>,
    ) {
        if self.config.progressive && self.tracker.group_hit(&group.key) {
            return;
        }

        let mut fired = false;
        for member in &group.members {
            if !self.is_tp1(member, group) || self.tracker.is_secured(member.ticket) {
                continue;
            }
            if triggered.contains(&group.key) {
                break;
            }
            let pip = pip_size(&member.symbol);
            let Some(metrics) = TpMetrics::compute(member, pip) else {
                continue;
            };
            let decision = evaluate(&metrics, multi_group, member.age_secs(now), &self.config);
            debug!(
                ticket = member.ticket.0,
                group = %group.key,
                fire = decision.fire,
                reason = %decision.reason,
                "evaluated TP1 leg"
            );
            if !decision.fire {
                continue;
            }

            triggered.insert(group.key.clone());
            let mut dispatcher = Dispatcher {
                gateway: self.gateway.as_ref(),
                tracker: &mut self.tracker,
                audit: &self.audit,
                stats: &mut self.stats,
                config: &self.config,
                ladders: &self.ladders,
            };
            if dispatcher.handle_trigger(member, group).await {
                fired = true;
                if self.config.progressive {
                    self.tracker.mark_group_hit(group.key.clone());
                }
            } else {
                // step 1 failed: allow a retry next cycle
                triggered.remove(&group.key);
            }
            break;
        }

        if !fired {
            self.follow_up(group).await;
        }
    }

    /// A TP1 leg secured in an earlier cycle leaves its siblings to
    /// catch up here (late fills, earlier partial failures).
    async fn follow_up(&mut self, group: &SignalGroup) {
        let tp1_secured = group
            .members
            .iter()
            .any(|m| self.is_tp1(m, group) && self.tracker.is_secured(m.ticket));
        if !tp1_secured {
            return;
        }
        let pending: Vec<Position> = group
            .members
            .iter()
            .filter(|m| !self.tracker.is_secured(m.ticket))
            .cloned()
            .collect();
        for member in &pending {
            let mut dispatcher = Dispatcher {
                gateway: self.gateway.as_ref(),
                tracker: &mut self.tracker,
                audit: &self.audit,
                stats: &mut self.stats,
                config: &self.config,
                ladders: &self.ladders,
            };
            dispatcher.secure_at_entry(member, false).await;
        }
    }

    fn is_tp1(&self, member: &Position, group: &SignalGroup) -> bool {
        if self.config.progressive {
            rank_from_tag(member) == 1
        } else {
            rank_in_group(member, &group.members) == Some(1)
        }
    }
}
