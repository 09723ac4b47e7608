//! The outgoing command queue (§4.3): a min-priority queue for one-shot
//! control commands, plus a per-kind rate limiter for the four
//! subscription command kinds.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::time::Duration;

use bd_codes::MdsCommandId;
use md_protocol::MdsCommand;
use tokio::time::Instant;

pub const RATE_LIMITED_KINDS: [MdsCommandId; 4] = [
    MdsCommandId::SubscribeEventHierarchy,
    MdsCommandId::SubscribeDetailedMarketPrices,
    MdsCommandId::SubscribeMarketInformation,
    MdsCommandId::SubscribeMarketMatchedAmounts,
];

pub const RATE_LIMIT_GAP: Duration = Duration::from_secs(1);
pub const TICK_DELAY: Duration = Duration::from_millis(200);

/// Monotonically increasing correlation id generator (§3 invariant: every
/// enqueued command's correlation id is strictly greater than any
/// previously assigned).
#[derive(Debug, Default)]
pub struct CorrelationIds {
    next: u32,
}

impl CorrelationIds {
    pub fn next(&mut self) -> u32 {
        self.next += 1;
        self.next
    }
}

struct QueuedCommand {
    priority: u8,
    correlation_id: u32,
    command: MdsCommand,
}

impl PartialEq for QueuedCommand {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.correlation_id == other.correlation_id
    }
}
impl Eq for QueuedCommand {}

impl PartialOrd for QueuedCommand {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedCommand {
    /// Reversed so `BinaryHeap` (a max-heap) pops the *lowest* priority,
    /// then lowest correlation id, first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.correlation_id.cmp(&self.correlation_id))
    }
}

/// The priority queue for login, `SetRefreshPeriod`, and `Unsubscribe`
/// (priorities 0/1, drained as fast as the transport allows).
#[derive(Default)]
pub struct PriorityQueue {
    heap: BinaryHeap<QueuedCommand>,
}

impl PriorityQueue {
    pub fn push(&mut self, priority: u8, correlation_id: u32, command: MdsCommand) {
        self.heap.push(QueuedCommand {
            priority,
            correlation_id,
            command,
        });
    }

    pub fn pop(&mut self) -> Option<MdsCommand> {
        self.heap.pop().map(|q| q.command)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Per-kind FIFO and cooldown schedule for the four rate-limited
/// subscription kinds.
pub struct RateLimiter {
    fifos: HashMap<MdsCommandId, VecDeque<MdsCommand>>,
    next_permitted: HashMap<MdsCommandId, Instant>,
}

impl RateLimiter {
    pub fn new(now: Instant) -> Self {
        let mut next_permitted = HashMap::new();
        let mut fifos = HashMap::new();
        for kind in RATE_LIMITED_KINDS {
            next_permitted.insert(kind, now);
            fifos.insert(kind, VecDeque::new());
        }
        Self {
            fifos,
            next_permitted,
        }
    }

    pub fn enqueue(&mut self, kind: MdsCommandId, command: MdsCommand) {
        self.fifos.entry(kind).or_default().push_back(command);
    }

    /// Pick at most one ready command per tick (§4.3 "Emission rule"),
    /// checked in a fixed kind order. Advances that kind's
    /// next-permitted-time by [`RATE_LIMIT_GAP`].
    pub fn next_ready(&mut self, now: Instant) -> Option<(MdsCommandId, MdsCommand)> {
        for kind in RATE_LIMITED_KINDS {
            let ready = self.next_permitted.get(&kind).is_some_and(|t| *t <= now);
            if !ready {
                continue;
            }
            if let Some(fifo) = self.fifos.get_mut(&kind)
                && let Some(command) = fifo.pop_front()
            {
                self.next_permitted.insert(kind, now + RATE_LIMIT_GAP);
                return Some((kind, command));
            }
        }
        None
    }

    /// Reset every per-kind schedule and FIFO (§4.4 "State cleared on
    /// each disconnect" / §8 invariant 6).
    pub fn reset(&mut self, now: Instant) {
        for kind in RATE_LIMITED_KINDS {
            self.fifos.insert(kind, VecDeque::new());
            self.next_permitted.insert(kind, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ping(correlation_id: u32) -> MdsCommand {
        MdsCommand::Ping {
            correlation_id,
            current_client_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn priority_queue_orders_by_priority_then_correlation_id() {
        let mut q = PriorityQueue::default();
        q.push(1, 5, ping(5));
        q.push(0, 9, ping(9));
        q.push(1, 2, ping(2));
        assert_eq!(q.pop().unwrap().correlation_id(), 9);
        assert_eq!(q.pop().unwrap().correlation_id(), 2);
        assert_eq!(q.pop().unwrap().correlation_id(), 5);
        assert!(q.pop().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limiter_enforces_one_second_gap_per_kind() {
        let now = Instant::now();
        let mut limiter = RateLimiter::new(now);
        limiter.enqueue(MdsCommandId::SubscribeEventHierarchy, ping(1));
        limiter.enqueue(MdsCommandId::SubscribeEventHierarchy, ping(2));

        let (_kind, first) = limiter.next_ready(now).unwrap();
        assert_eq!(first.correlation_id(), 1);
        assert!(limiter.next_ready(now).is_none());

        let later = now + Duration::from_millis(999);
        assert!(limiter.next_ready(later).is_none());

        let after_gap = now + RATE_LIMIT_GAP;
        let (_kind, second) = limiter.next_ready(after_gap).unwrap();
        assert_eq!(second.correlation_id(), 2);
    }

    #[test]
    fn reset_clears_fifos_and_schedules() {
        let now = Instant::now();
        let mut limiter = RateLimiter::new(now);
        limiter.enqueue(MdsCommandId::SubscribeEventHierarchy, ping(1));
        limiter.reset(now);
        assert!(limiter.next_ready(now).is_none());
    }
}
