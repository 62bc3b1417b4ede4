//! Event registry and delivery queues.
//!
//! Events are emitted towards a target entity for a given tick. Until that
//! tick arrives they sit in the *pending* queue, ordered by
//! `(deliver_at, sequence)`. The tick scheduler moves due events to the
//! *ready* queue, where `poll` consumes them first-in first-out per
//! `(target, type)`.

use std::collections::VecDeque;
use std::mem;

use bytemuck::Pod;
use tickwork_foundation::{
    CapacityLimit, EntityId, Error, ErrorKind, EventType, Name, Result, Tick,
};
use tracing::debug;

// =============================================================================
// Schemas
// =============================================================================

/// Registration request for an event type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventDesc {
    /// Type id (nonzero).
    pub event: EventType,
    /// Exact payload size; zero for signal-only events.
    pub payload_size: u32,
    /// Human-readable name.
    pub name: Name,
}

impl EventDesc {
    /// Creates a descriptor for a raw payload layout.
    #[must_use]
    pub fn new(event: EventType, payload_size: u32) -> Self {
        Self {
            event,
            payload_size,
            name: Name::default(),
        }
    }

    /// Creates a descriptor whose payload size comes from `T`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn of<T: Pod>(event: EventType, name: &str) -> Self {
        Self {
            event,
            payload_size: mem::size_of::<T>() as u32,
            name: Name::new(name),
        }
    }

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Name::new(name);
        self
    }
}

/// Registered metadata for an event type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventMeta {
    /// Type id.
    pub event: EventType,
    /// Exact payload size.
    pub payload_size: u32,
    /// Human-readable name.
    pub name: Name,
}

/// Registry of event schemas, kept in registration order.
#[derive(Clone, Debug, Default)]
pub struct EventRegistry {
    metas: Vec<EventMeta>,
}

impl EventRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an event schema.
    ///
    /// # Errors
    ///
    /// Returns an invalid argument error for the reserved type id or an id
    /// that is already registered.
    pub fn register(&mut self, desc: EventDesc) -> Result<&EventMeta> {
        if desc.event.is_reserved() {
            return Err(Error::invalid_argument("event type 0 is reserved"));
        }
        if self.get(desc.event).is_some() {
            return Err(Error::new(ErrorKind::DuplicateEvent(desc.event)));
        }

        debug!(
            event = desc.event.raw(),
            payload_size = desc.payload_size,
            name = desc.name.as_str(),
            "registered event type"
        );
        self.metas.push(EventMeta {
            event: desc.event,
            payload_size: desc.payload_size,
            name: desc.name,
        });
        let last = self.metas.len() - 1;
        Ok(&self.metas[last])
    }

    /// Looks up a registered schema.
    #[must_use]
    pub fn get(&self, event: EventType) -> Option<&EventMeta> {
        self.metas.iter().find(|meta| meta.event == event)
    }

    /// Looks up a registered schema, failing if it is absent.
    ///
    /// # Errors
    ///
    /// Returns an unregistered-event error.
    pub fn require(&self, event: EventType) -> Result<&EventMeta> {
        self.get(event)
            .ok_or_else(|| Error::new(ErrorKind::UnregisteredEvent(event)))
    }

    /// Iterates over schemas in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &EventMeta> {
        self.metas.iter()
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metas.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }
}

// =============================================================================
// Records
// =============================================================================

/// One scheduled or delivered event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRecord {
    /// Entity the event is addressed to.
    pub target: EntityId,
    /// Event type.
    pub event: EventType,
    /// Tick at which the event becomes pollable.
    pub deliver_at: Tick,
    /// Emission sequence number; breaks ties between equal ticks.
    pub sequence: u64,
    /// Payload bytes, exactly the registered payload size.
    pub payload: Vec<u8>,
}

impl EventRecord {
    fn sort_key(&self) -> (Tick, u64) {
        (self.deliver_at, self.sequence)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn payload_len(&self) -> u32 {
        self.payload.len() as u32
    }
}

/// An event removed from the ready queue by a poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolledEvent {
    /// Tick the event was scheduled for.
    pub deliver_at: Tick,
    /// Emission sequence number.
    pub sequence: u64,
    /// Payload bytes.
    pub payload: Vec<u8>,
}

impl From<EventRecord> for PolledEvent {
    fn from(record: EventRecord) -> Self {
        Self {
            deliver_at: record.deliver_at,
            sequence: record.sequence,
            payload: record.payload,
        }
    }
}

// =============================================================================
// Queues
// =============================================================================

/// Pending and ready event queues with count and payload budgets.
#[derive(Clone, Debug)]
pub struct EventQueues {
    pending: VecDeque<EventRecord>,
    ready: VecDeque<EventRecord>,
    used_payload_bytes: u32,
    max_events: u32,
    max_payload_bytes: u32,
}

impl EventQueues {
    /// Creates empty queues with the given limits.
    #[must_use]
    pub fn new(max_events: u32, max_payload_bytes: u32) -> Self {
        Self {
            pending: VecDeque::new(),
            ready: VecDeque::new(),
            used_payload_bytes: 0,
            max_events,
            max_payload_bytes,
        }
    }

    /// Returns the pending queue in delivery order.
    pub fn pending(&self) -> impl ExactSizeIterator<Item = &EventRecord> {
        self.pending.iter()
    }

    /// Returns the ready queue in poll order.
    pub fn ready(&self) -> impl ExactSizeIterator<Item = &EventRecord> {
        self.ready.iter()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Returns the number of ready events.
    #[must_use]
    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    /// Returns the total number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len() + self.ready.len()
    }

    /// Returns true if both queues are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the payload bytes currently held by both queues.
    #[must_use]
    pub fn used_payload_bytes(&self) -> u32 {
        self.used_payload_bytes
    }

    /// Returns the queued event limit.
    #[must_use]
    pub fn max_events(&self) -> u32 {
        self.max_events
    }

    /// Returns the payload byte budget.
    #[must_use]
    pub fn max_payload_bytes(&self) -> u32 {
        self.max_payload_bytes
    }

    /// Checks that one more event of `payload_len` bytes fits.
    ///
    /// # Errors
    ///
    /// Returns a capacity error for the count limit first, then the byte budget.
    pub fn check_capacity(&self, payload_len: u32) -> Result<()> {
        if self.len() >= self.max_events as usize {
            return Err(Error::capacity_exceeded(CapacityLimit::Events {
                limit: self.max_events,
            }));
        }
        let requested = u64::from(self.used_payload_bytes) + u64::from(payload_len);
        if requested > u64::from(self.max_payload_bytes) {
            return Err(Error::capacity_exceeded(CapacityLimit::EventPayloadBytes {
                limit: self.max_payload_bytes,
                requested,
            }));
        }
        Ok(())
    }

    /// Queues a record, routing it by its delivery tick.
    ///
    /// # Errors
    ///
    /// Fails like [`EventQueues::check_capacity`].
    pub fn push(&mut self, record: EventRecord, current_tick: Tick) -> Result<()> {
        if record.deliver_at <= current_tick {
            self.push_ready(record)
        } else {
            self.push_pending(record)
        }
    }

    /// Inserts a record into the pending queue at its sorted position.
    ///
    /// # Errors
    ///
    /// Fails like [`EventQueues::check_capacity`].
    pub fn push_pending(&mut self, record: EventRecord) -> Result<()> {
        self.check_capacity(record.payload_len())?;
        self.used_payload_bytes += record.payload_len();
        let key = record.sort_key();
        let position = self.pending.partition_point(|r| r.sort_key() <= key);
        self.pending.insert(position, record);
        Ok(())
    }

    /// Appends a record to the ready queue.
    ///
    /// # Errors
    ///
    /// Fails like [`EventQueues::check_capacity`].
    pub fn push_ready(&mut self, record: EventRecord) -> Result<()> {
        self.check_capacity(record.payload_len())?;
        self.used_payload_bytes += record.payload_len();
        self.ready.push_back(record);
        Ok(())
    }

    /// Moves every pending event due at or before `tick` to the ready queue.
    ///
    /// Returns the number of events promoted.
    pub fn promote_due(&mut self, tick: Tick) -> usize {
        let due = self.pending.partition_point(|r| r.deliver_at <= tick);
        self.ready.extend(self.pending.drain(..due));
        due
    }

    /// Removes the first ready event matching `(target, event)`.
    pub fn take_ready(&mut self, target: EntityId, event: EventType) -> Option<EventRecord> {
        let position = self
            .ready
            .iter()
            .position(|r| r.target == target && r.event == event)?;
        let record = self.ready.remove(position)?;
        self.used_payload_bytes -= record.payload_len();
        Some(record)
    }

    /// Drops every queued event and releases the payload budget.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.ready.clear();
        self.used_payload_bytes = 0;
    }
}
