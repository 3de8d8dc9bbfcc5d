//! Event types for the TariffSight event system
//!
//! Provides shared event definitions and the EventBus used to keep
//! concurrent browser sessions synchronized via SSE.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Application event types
///
/// Events are broadcast via EventBus and can be serialized for SSE
/// transmission. All events use this central enum for type safety and
/// exhaustive matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AppEvent {
    /// A session was opened or closed for a user
    ///
    /// Triggers:
    /// - SSE: other open tabs refresh their in-memory profile
    SessionChanged {
        /// Identity the session belongs to
        email: String,
        /// true on sign-in, false on sign-out
        signed_in: bool,
        /// When the session changed
        timestamp: DateTime<Utc>,
    },

    /// An analysis request entered the Classifying state
    AnalysisStarted {
        /// Requesting identity
        email: String,
        /// When classification started
        timestamp: DateTime<Utc>,
    },

    /// An analysis completed and its history record was appended
    ///
    /// Triggers:
    /// - SSE: history list refresh, credit counter refresh
    AnalysisCompleted {
        /// Owning identity
        email: String,
        /// History record id
        history_id: Uuid,
        /// Assigned tariff code
        tariff_code: String,
        /// Post-decrement credit balance (-1 = unlimited)
        credits_remaining: i64,
        /// When the analysis completed
        timestamp: DateTime<Utc>,
    },

    /// An analysis failed; no credit was consumed
    AnalysisFailed {
        /// Requesting identity
        email: String,
        /// User-facing failure description
        reason: String,
        /// When the failure was detected
        timestamp: DateTime<Utc>,
    },

    /// Credit balance changed outside the analysis path
    /// (verification grant, plan purchase, admin adjustment)
    CreditsChanged {
        /// Owning identity
        email: String,
        /// New balance (-1 = unlimited)
        credits: i64,
        /// When the balance changed
        timestamp: DateTime<Utc>,
    },

    /// Subscription plan changed (purchase or forced downgrade)
    PlanChanged {
        /// Owning identity
        email: String,
        /// New plan id
        plan_id: String,
        /// When the plan changed
        timestamp: DateTime<Utc>,
    },

    /// Subscription was cancelled and the account downgraded to free
    SubscriptionCancelled {
        /// Owning identity
        email: String,
        /// When the cancellation was confirmed
        timestamp: DateTime<Utc>,
    },

    /// Admin edited the site content blob; caches must invalidate
    ContentUpdated {
        /// When the content changed
        timestamp: DateTime<Utc>,
    },
}

impl AppEvent {
    /// Event type name used as the SSE event field
    pub fn event_type(&self) -> &'static str {
        match self {
            AppEvent::SessionChanged { .. } => "SessionChanged",
            AppEvent::AnalysisStarted { .. } => "AnalysisStarted",
            AppEvent::AnalysisCompleted { .. } => "AnalysisCompleted",
            AppEvent::AnalysisFailed { .. } => "AnalysisFailed",
            AppEvent::CreditsChanged { .. } => "CreditsChanged",
            AppEvent::PlanChanged { .. } => "PlanChanged",
            AppEvent::SubscriptionCancelled { .. } => "SubscriptionCancelled",
            AppEvent::ContentUpdated { .. } => "ContentUpdated",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for application-wide events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Returns a receiver that will receive all events emitted after
    /// subscription. Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: AppEvent) -> Result<usize, broadcast::error::SendError<AppEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Useful for non-critical events where it is acceptable if no
    /// component is currently listening.
    pub fn emit_lossy(&self, event: AppEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
