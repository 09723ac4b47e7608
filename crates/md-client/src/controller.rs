//! MDS subscription controller (§4.3): startup flow, discovery cascade,
//! available-markets policy, and the outgoing command queue.

use std::collections::HashSet;

use bd_codes::{MdsCommandId, ReturnCode};
use chrono::{DateTime, Utc};
use md_protocol::{FrameKind, MdsCommand, MdsIncoming, MdsResponse};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::MdsConfig;
use crate::queue::{CorrelationIds, PriorityQueue, RateLimiter};

/// Tracks which stage of the startup flow the controller is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginStage {
    AwaitingLogin,
    AwaitingRefreshPeriod,
    Ready,
}

pub struct SubscriptionController {
    config: MdsConfig,
    correlation_ids: CorrelationIds,
    priority_queue: PriorityQueue,
    rate_limiter: RateLimiter,
    login_stage: LoginStage,
    login_correlation_id: Option<u32>,
    refresh_correlation_id: Option<u32>,
    seen_event_ids: HashSet<i64>,
    sweep_task_running: bool,
}

impl SubscriptionController {
    #[must_use]
    pub fn new(config: MdsConfig, now: Instant) -> Self {
        Self {
            config,
            correlation_ids: CorrelationIds::default(),
            priority_queue: PriorityQueue::default(),
            rate_limiter: RateLimiter::new(now),
            login_stage: LoginStage::AwaitingLogin,
            login_correlation_id: None,
            refresh_correlation_id: None,
            seen_event_ids: HashSet::new(),
            sweep_task_running: false,
        }
    }

    /// Enqueue the first command of the startup flow (§4.3 step 1).
    pub fn start(&mut self) {
        let correlation_id = self.correlation_ids.next();
        self.login_correlation_id = Some(correlation_id);
        let command = match (&self.config.username, &self.config.password) {
            (Some(username), Some(password)) => MdsCommand::LogonPunter {
                correlation_id,
                username: username.clone(),
                password: password.clone(),
            },
            _ => MdsCommand::SetAnonymousSessionContext { correlation_id },
        };
        self.priority_queue.push(1, correlation_id, command);
    }

    /// Whether the event-sweep task should be (re)started: true exactly
    /// once, on the first `SetRefreshPeriod` response (§9 "SetRefreshPeriod
    /// second receipt").
    pub fn should_start_sweep(&mut self) -> bool {
        if self.sweep_task_running {
            return false;
        }
        self.sweep_task_running = true;
        true
    }

    /// Enqueue a `SubscribeEventHierarchy` for every configured top-level
    /// classifier (§4.3 step 3, called by the event-sweep task on its own
    /// schedule).
    pub fn sweep_classifiers(&mut self) {
        let classifier_ids: Vec<i64> = self.config.meta_refresh_classifiers.keys().copied().collect();
        for classifier_id in classifier_ids {
            let correlation_id = self.correlation_ids.next();
            self.rate_limiter.enqueue(
                MdsCommandId::SubscribeEventHierarchy,
                MdsCommand::SubscribeEventHierarchy {
                    correlation_id,
                    classifier_id,
                },
            );
        }
    }

    /// Handle one decoded incoming message. Any commands it causes (a
    /// login follow-up, a discovery cascade subscription) are pushed onto
    /// the internal queues as a side effect; callers drain them via
    /// [`SubscriptionController::next_to_send`].
    pub fn handle_incoming(&mut self, incoming: &MdsIncoming) {
        match incoming {
            MdsIncoming::Response(resp) => self.handle_response(resp),
            MdsIncoming::Topic {
                resolution,
                frame_kind,
                fields,
            } => {
                if resolution.class == "Language4" {
                    self.handle_language4(resolution, fields);
                } else if resolution.class == "MExchangeInfo"
                    && *frame_kind != Some(FrameKind::Delete)
                {
                    self.handle_exchange_info(resolution, fields);
                }
            }
        }
    }

    fn handle_response(&mut self, resp: &MdsResponse) {
        if resp.available_markets_exhausted() {
            warn!(
                correlation_id = resp.correlation_id,
                "available_markets_count == 0, subscription slots exhausted"
            );
        }

        if !resp.return_code.is_benign() {
            warn!(
                correlation_id = resp.correlation_id,
                return_code = ?resp.return_code,
                "terminal return code, disconnect required"
            );
            return;
        }

        if self.login_stage == LoginStage::AwaitingLogin
            && Some(resp.correlation_id) == self.login_correlation_id
            && resp.return_code == ReturnCode::Success
        {
            let correlation_id = self.correlation_ids.next();
            self.refresh_correlation_id = Some(correlation_id);
            self.login_stage = LoginStage::AwaitingRefreshPeriod;
            self.priority_queue.push(
                1,
                correlation_id,
                MdsCommand::SetRefreshPeriod {
                    correlation_id,
                    refresh_period_ms: i64::from(self.config.refresh_period_secs) * 1000,
                },
            );
        } else if self.login_stage == LoginStage::AwaitingRefreshPeriod
            && Some(resp.correlation_id) == self.refresh_correlation_id
        {
            self.login_stage = LoginStage::Ready;
        }
    }

    fn handle_language4(
        &mut self,
        resolution: &md_protocol::TopicResolution,
        fields: &std::collections::BTreeMap<&'static str, md_protocol::FieldValue>,
    ) {
        let _ = fields;
        let ec = &resolution.keywords.event_classifier_id;
        if let Some(event_id) = ec.event_id {
            if !self.seen_event_ids.contains(&event_id) {
                self.seen_event_ids.insert(event_id);
                let correlation_id = self.correlation_ids.next();
                self.rate_limiter.enqueue(
                    MdsCommandId::SubscribeMarketInformation,
                    MdsCommand::SubscribeMarketInformation {
                        correlation_id,
                        event_id,
                    },
                );
                debug!(event_id, "discovered new event, subscribing");
            }
        } else if let Some(location_id) = ec.location_id {
            let correlation_id = self.correlation_ids.next();
            self.rate_limiter.enqueue(
                MdsCommandId::SubscribeEventHierarchy,
                MdsCommand::SubscribeEventHierarchy {
                    correlation_id,
                    classifier_id: location_id,
                },
            );
        }
    }

    /// A `Delete` topic message for an event discards it from the seen
    /// set (§4.3 "Discovery cascade").
    pub fn forget_event(&mut self, event_id: i64) {
        self.seen_event_ids.remove(&event_id);
    }

    fn handle_exchange_info(
        &mut self,
        resolution: &md_protocol::TopicResolution,
        fields: &std::collections::BTreeMap<&'static str, md_protocol::FieldValue>,
    ) {
        let Some(market_id) = resolution.keywords.market_id else {
            return;
        };
        let number_winning_places = fields
            .get("number_winning_places")
            .and_then(md_protocol::FieldValue::as_int);
        if number_winning_places != Some(0) {
            return;
        }
        let correlation_id = self.correlation_ids.next();
        self.rate_limiter.enqueue(
            MdsCommandId::SubscribeDetailedMarketPrices,
            MdsCommand::SubscribeDetailedMarketPrices {
                correlation_id,
                market_id,
                prices_number: i64::from(self.config.prices_number),
                filter_by_volume: self.config.filter_by_volume != 0,
            },
        );
        let correlation_id = self.correlation_ids.next();
        self.rate_limiter.enqueue(
            MdsCommandId::SubscribeMarketMatchedAmounts,
            MdsCommand::SubscribeMarketMatchedAmounts {
                correlation_id,
                market_id,
            },
        );
        debug!(market_id, "exchange-style market, subscribing to prices");
    }

    /// Enqueue an `Unsubscribe`, used on shutdown (§4.4).
    pub fn enqueue_unsubscribe(&mut self, subscription_ids: Vec<u32>) {
        let correlation_id = self.correlation_ids.next();
        self.priority_queue.push(
            0,
            correlation_id,
            MdsCommand::Unsubscribe {
                correlation_id,
                subscription_ids,
            },
        );
    }

    /// Drain the next command to send: priority-queue commands first,
    /// then the rate-limited path.
    pub fn next_to_send(&mut self, now: Instant) -> Option<MdsCommand> {
        if let Some(command) = self.priority_queue.pop() {
            return Some(command);
        }
        self.rate_limiter.next_ready(now).map(|(_, command)| command)
    }

    /// Reset all queue/schedule state on disconnect (§4.4, §8 invariant 6).
    pub fn reset_on_disconnect(&mut self, now: Instant) {
        self.rate_limiter.reset(now);
        self.seen_event_ids.clear();
        self.sweep_task_running = false;
        self.login_stage = LoginStage::AwaitingLogin;
        self.login_correlation_id = None;
        self.refresh_correlation_id = None;
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.login_stage == LoginStage::Ready
    }

    #[must_use]
    pub fn ping_command(&mut self, now: DateTime<Utc>) -> MdsCommand {
        let correlation_id = self.correlation_ids.next();
        MdsCommand::Ping {
            correlation_id,
            current_client_time: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn config() -> MdsConfig {
        MdsConfig {
            stream_url: "wss://example/stream".to_owned(),
            timeout: std::time::Duration::from_secs(10),
            connection_timeout: std::time::Duration::from_secs(60),
            receive_timeout: std::time::Duration::from_secs(60),
            ping_frequency: std::time::Duration::from_secs(30),
            username: None,
            password: None,
            refresh_period_secs: 60,
            meta_refresh_period: std::time::Duration::from_secs(300),
            meta_refresh_classifiers: BTreeMap::new(),
            prices_number: 3,
            filter_by_volume: 1,
        }
    }

    #[test]
    fn start_enqueues_anonymous_login_without_credentials() {
        let now = Instant::now();
        let mut controller = SubscriptionController::new(config(), now);
        controller.start();
        let cmd = controller.next_to_send(now).unwrap();
        assert!(matches!(cmd, MdsCommand::SetAnonymousSessionContext { .. }));
    }

    #[test]
    fn successful_login_enqueues_set_refresh_period() {
        let now = Instant::now();
        let mut controller = SubscriptionController::new(config(), now);
        controller.start();
        let login_cmd = controller.next_to_send(now).unwrap();
        let resp = MdsResponse {
            command_id: MdsCommandId::SetAnonymousSessionContext,
            correlation_id: login_cmd.correlation_id(),
            return_code: ReturnCode::Success,
            fields: BTreeMap::new(),
        };
        controller.handle_incoming(&MdsIncoming::Response(resp));
        let next = controller.next_to_send(now).unwrap();
        assert!(matches!(next, MdsCommand::SetRefreshPeriod { .. }));
    }

    #[test]
    fn terminal_return_code_does_not_advance_login_stage() {
        let now = Instant::now();
        let mut controller = SubscriptionController::new(config(), now);
        controller.start();
        let login_cmd = controller.next_to_send(now).unwrap();
        let resp = MdsResponse {
            command_id: MdsCommandId::SetAnonymousSessionContext,
            correlation_id: login_cmd.correlation_id(),
            return_code: ReturnCode::from_wire_value(99),
            fields: BTreeMap::new(),
        };
        controller.handle_incoming(&MdsIncoming::Response(resp));
        assert!(!controller.is_ready());
        assert!(controller.next_to_send(now).is_none());
    }

    #[test]
    fn sweep_idempotent_after_first_call() {
        let now = Instant::now();
        let mut controller = SubscriptionController::new(config(), now);
        assert!(controller.should_start_sweep());
        assert!(!controller.should_start_sweep());
    }

    #[test]
    fn reset_clears_seen_events_and_sweep_flag() {
        let now = Instant::now();
        let mut controller = SubscriptionController::new(config(), now);
        controller.should_start_sweep();
        controller.reset_on_disconnect(now);
        assert!(controller.should_start_sweep());
    }

    #[test]
    fn language4_with_new_event_id_enqueues_market_information() {
        let now = Instant::now();
        let mut controller = SubscriptionController::new(config(), now);
        let mut keywords = md_protocol::TopicKeywords::default();
        keywords.event_classifier_id.parent = Some(1);
        keywords.event_classifier_id.event_id = Some(55);
        let resolution = md_protocol::TopicResolution {
            class: "Language4",
            keywords,
        };
        controller.handle_incoming(&MdsIncoming::Topic {
            resolution,
            frame_kind: None,
            fields: BTreeMap::new(),
        });
        let (_kind, cmd) = controller
            .rate_limiter
            .next_ready(now)
            .expect("subscription enqueued");
        assert!(matches!(cmd, MdsCommand::SubscribeMarketInformation { event_id: 55, .. }));
    }

    #[test]
    fn exchange_info_delete_is_not_a_subscription_trigger() {
        let now = Instant::now();
        let mut controller = SubscriptionController::new(config(), now);
        let mut keywords = md_protocol::TopicKeywords::default();
        keywords.market_id = Some(12759206);
        let resolution = md_protocol::TopicResolution {
            class: "MExchangeInfo",
            keywords,
        };
        let mut fields = BTreeMap::new();
        fields.insert("number_winning_places", md_protocol::FieldValue::Int(0));
        controller.handle_incoming(&MdsIncoming::Topic {
            resolution,
            frame_kind: Some(FrameKind::Delete),
            fields,
        });
        assert!(controller.rate_limiter.next_ready(now).is_none());
    }

    #[test]
    fn ping_command_uses_a_fresh_correlation_id() {
        let now = Instant::now();
        let mut controller = SubscriptionController::new(config(), now);
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let a = controller.ping_command(t);
        let b = controller.ping_command(t);
        assert!(b.correlation_id() > a.correlation_id());
    }
}
