//! Transaction State Machine
//!
//! Tracks every confirmed request this device has outstanding, keyed by the
//! peer's [`Address`] and invoke ID, through the state diagram a confirmed
//! service follows from submission to completion: segmentation windows,
//! retry/deadline bookkeeping, and the terminal states a caller polls for.
//!
//! Generalizes a single-peer invoke-ID allocator to a fixed-capacity slot
//! pool keyed by `(Address, invoke_id)`, with a fuller state machine than a
//! plain timeout-or-not tracker.

#[cfg(feature = "std")]
use std::error::Error;

#[cfg(not(feature = "std"))]
use core::fmt;

#[cfg(feature = "std")]
use std::fmt;

#[cfg(feature = "std")]
use std::time::{Duration, Instant};

#[cfg(not(feature = "std"))]
use core::time::Duration;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::datalink::Address;

/// Result type for TSM operations.
#[cfg(feature = "std")]
pub type Result<T> = std::result::Result<T, TsmError>;

#[cfg(not(feature = "std"))]
pub type Result<T> = core::result::Result<T, TsmError>;

/// Errors the Transaction State Machine can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsmError {
    /// Every slot in the pool is in use; no invoke ID is free for this peer.
    PoolExhausted,
    /// No transaction is tracked for the given (peer, invoke ID) pair.
    UnknownTransaction,
    /// The requested state transition isn't valid from the transaction's
    /// current state (e.g. completing an already-completed transaction).
    InvalidTransition,
}

impl fmt::Display for TsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TsmError::PoolExhausted => write!(f, "transaction slot pool exhausted"),
            TsmError::UnknownTransaction => write!(f, "no transaction tracked for this peer/invoke ID"),
            TsmError::InvalidTransition => write!(f, "invalid transaction state transition"),
        }
    }
}

#[cfg(feature = "std")]
impl Error for TsmError {}

/// A confirmed-request transaction's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Slot allocated, request not yet sent.
    Idle,
    /// Request sent, waiting for an ACK/Error/Reject/Abort.
    AwaitingResponse,
    /// A SimpleACK/ComplexACK/Error/Reject has been applied; caller can
    /// collect the result and free the slot.
    Complete,
    /// A segmented response is arriving; waiting for the next segment
    /// within the agreed window.
    AwaitingSegAck,
    /// No response arrived before the deadline and retries are exhausted.
    TimedOut,
    /// The peer sent an Abort PDU for this transaction.
    Aborted,
    /// The peer sent a Reject PDU for this transaction.
    Rejected,
    /// The peer sent an Error PDU for this transaction.
    Errored,
}

/// One tracked transaction.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub peer: Address,
    pub invoke_id: u8,
    pub state: TransactionState,
    /// Service choice of the original confirmed request (for matching
    /// ComplexAck/Error service-choice echoes).
    pub service_choice: u8,
    /// Number of retransmissions attempted so far.
    pub retry_count: u8,
    /// Segmentation window size negotiated for a segmented response.
    pub window_size: u8,
    /// Next expected sequence number in a segmented response.
    pub next_sequence_number: u8,
    #[cfg(feature = "std")]
    deadline: Instant,
    #[cfg(feature = "std")]
    timeout: Duration,
}

/// Fixed-capacity pool of transaction slots.
///
/// `capacity` bounds how many confirmed requests this device may have
/// outstanding simultaneously — no unbounded allocation; once full,
/// [`TransactionStateMachine::start_request`]
/// returns [`TsmError::PoolExhausted`].
pub struct TransactionStateMachine {
    slots: Vec<Transaction>,
    capacity: usize,
    next_invoke_id: u8,
    default_timeout: Duration,
    max_retries: u8,
}

impl TransactionStateMachine {
    pub fn new(capacity: usize, default_timeout: Duration, max_retries: u8) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            next_invoke_id: 1,
            default_timeout,
            max_retries,
        }
    }

    /// Allocate the next invoke ID not currently in use by `peer`, skipping
    /// 0 (reserved), wrapping at 255, scoped per peer rather than globally.
    fn allocate_invoke_id(&mut self, peer: &Address) -> Result<u8> {
        let start = self.next_invoke_id;
        loop {
            let candidate = self.next_invoke_id;
            self.next_invoke_id = self.next_invoke_id.wrapping_add(1);
            if self.next_invoke_id == 0 {
                self.next_invoke_id = 1;
            }
            if !self.slots.iter().any(|t| t.invoke_id == candidate && &t.peer == peer) {
                return Ok(candidate);
            }
            if self.next_invoke_id == start {
                return Err(TsmError::PoolExhausted);
            }
        }
    }

    /// Begin tracking a new confirmed request to `peer`, returning its
    /// invoke ID. Fails with [`TsmError::PoolExhausted`] if the slot pool is
    /// at capacity or every invoke ID for this peer is in use.
    #[cfg(feature = "std")]
    pub fn start_request(&mut self, peer: Address, service_choice: u8) -> Result<u8> {
        if self.slots.len() >= self.capacity {
            return Err(TsmError::PoolExhausted);
        }
        let invoke_id = self.allocate_invoke_id(&peer)?;
        log::debug!(
            "tsm: starting transaction invoke_id={invoke_id} peer={peer:?} service_choice={service_choice}"
        );
        self.slots.push(Transaction {
            peer,
            invoke_id,
            state: TransactionState::AwaitingResponse,
            service_choice,
            retry_count: 0,
            window_size: 1,
            next_sequence_number: 0,
            deadline: Instant::now() + self.default_timeout,
            timeout: self.default_timeout,
        });
        Ok(invoke_id)
    }

    fn find_mut(&mut self, peer: &Address, invoke_id: u8) -> Result<&mut Transaction> {
        self.slots
            .iter_mut()
            .find(|t| t.invoke_id == invoke_id && &t.peer == peer)
            .ok_or(TsmError::UnknownTransaction)
    }

    /// Apply a SimpleACK/ComplexACK: transitions to `Complete`.
    pub fn complete(&mut self, peer: &Address, invoke_id: u8) -> Result<()> {
        let txn = self.find_mut(peer, invoke_id)?;
        txn.state = TransactionState::Complete;
        Ok(())
    }

    /// Apply a Segment-ACK: extends the deadline and advances the window,
    /// transitioning to `AwaitingSegAck`.
    #[cfg(feature = "std")]
    pub fn ack_segment(&mut self, peer: &Address, invoke_id: u8, sequence_number: u8, window_size: u8) -> Result<()> {
        let timeout = self.default_timeout;
        let txn = self.find_mut(peer, invoke_id)?;
        txn.state = TransactionState::AwaitingSegAck;
        txn.next_sequence_number = sequence_number.wrapping_add(1);
        txn.window_size = window_size;
        txn.deadline = Instant::now() + timeout;
        Ok(())
    }

    /// Apply an Abort PDU: transitions to `Aborted`.
    pub fn abort(&mut self, peer: &Address, invoke_id: u8) -> Result<()> {
        let txn = self.find_mut(peer, invoke_id)?;
        txn.state = TransactionState::Aborted;
        Ok(())
    }

    /// Apply a Reject PDU: transitions to `Rejected`.
    pub fn reject(&mut self, peer: &Address, invoke_id: u8) -> Result<()> {
        let txn = self.find_mut(peer, invoke_id)?;
        txn.state = TransactionState::Rejected;
        Ok(())
    }

    /// Apply an Error PDU: transitions to `Errored`.
    pub fn error(&mut self, peer: &Address, invoke_id: u8) -> Result<()> {
        let txn = self.find_mut(peer, invoke_id)?;
        txn.state = TransactionState::Errored;
        Ok(())
    }

    /// Drop a transaction's slot once the caller has collected its result.
    pub fn free(&mut self, peer: &Address, invoke_id: u8) -> Result<()> {
        let before = self.slots.len();
        self.slots.retain(|t| !(t.invoke_id == invoke_id && &t.peer == peer));
        if self.slots.len() == before {
            Err(TsmError::UnknownTransaction)
        } else {
            Ok(())
        }
    }

    /// Scan for transactions past their deadline. Transactions still under
    /// `max_retries` are returned for retransmission (their deadline is
    /// reset and retry count bumped); transactions that have exhausted
    /// retries transition to `TimedOut` and are returned for the caller to
    /// surface as a failure.
    #[cfg(feature = "std")]
    pub fn poll_timeouts(&mut self) -> (Vec<(Address, u8)>, Vec<(Address, u8)>) {
        let now = Instant::now();
        let mut to_retry = Vec::new();
        let mut timed_out = Vec::new();
        let max_retries = self.max_retries;

        for txn in self.slots.iter_mut() {
            if txn.state != TransactionState::AwaitingResponse && txn.state != TransactionState::AwaitingSegAck {
                continue;
            }
            if now < txn.deadline {
                continue;
            }
            if txn.retry_count < max_retries {
                txn.retry_count += 1;
                txn.deadline = now + txn.timeout;
                log::debug!(
                    "tsm: retrying invoke_id={} peer={:?} attempt={}",
                    txn.invoke_id, txn.peer, txn.retry_count
                );
                to_retry.push((txn.peer.clone(), txn.invoke_id));
            } else {
                txn.state = TransactionState::TimedOut;
                log::warn!(
                    "tsm: invoke_id={} peer={:?} timed out after {} retries",
                    txn.invoke_id, txn.peer, txn.retry_count
                );
                timed_out.push((txn.peer.clone(), txn.invoke_id));
            }
        }

        (to_retry, timed_out)
    }

    /// Current state of a tracked transaction, if any.
    pub fn state_of(&self, peer: &Address, invoke_id: u8) -> Option<TransactionState> {
        self.slots
            .iter()
            .find(|t| t.invoke_id == invoke_id && &t.peer == peer)
            .map(|t| t.state)
    }

    /// Number of transactions currently tracked.
    pub fn active_count(&self) -> usize {
        self.slots.len()
    }

    /// True when no transaction is tracked for this (peer, invoke ID) —
    /// either it was never allocated or has already been freed.
    pub fn is_invoke_id_free(&self, peer: &Address, invoke_id: u8) -> bool {
        self.state_of(peer, invoke_id).is_none()
    }

    /// True when the transaction for this (peer, invoke ID) reached a
    /// terminal failure state (timeout, abort, reject, or error).
    pub fn is_invoke_id_failed(&self, peer: &Address, invoke_id: u8) -> bool {
        matches!(
            self.state_of(peer, invoke_id),
            Some(TransactionState::TimedOut)
                | Some(TransactionState::Aborted)
                | Some(TransactionState::Rejected)
                | Some(TransactionState::Errored)
        )
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn peer(mac: u8) -> Address {
        Address { net: 0, mac_len: 1, mac: [mac, 0, 0, 0, 0, 0, 0], adr: None }
    }

    #[test]
    fn allocates_distinct_invoke_ids_per_peer() {
        let mut tsm = TransactionStateMachine::new(8, Duration::from_secs(5), 2);
        let a = tsm.start_request(peer(1), 12).unwrap();
        let b = tsm.start_request(peer(1), 12).unwrap();
        assert_ne!(a, b);
        assert_eq!(tsm.active_count(), 2);
    }

    #[test]
    fn pool_exhaustion_is_reported() {
        let mut tsm = TransactionStateMachine::new(1, Duration::from_secs(5), 2);
        tsm.start_request(peer(1), 12).unwrap();
        assert_eq!(tsm.start_request(peer(2), 12), Err(TsmError::PoolExhausted));
    }

    #[test]
    fn complete_then_free_round_trips() {
        let mut tsm = TransactionStateMachine::new(4, Duration::from_secs(5), 2);
        let p = peer(1);
        let id = tsm.start_request(p.clone(), 12).unwrap();
        tsm.complete(&p, id).unwrap();
        assert_eq!(tsm.state_of(&p, id), Some(TransactionState::Complete));
        tsm.free(&p, id).unwrap();
        assert_eq!(tsm.state_of(&p, id), None);
    }

    #[test]
    fn timeout_retries_then_gives_up() {
        let mut tsm = TransactionStateMachine::new(4, Duration::from_millis(10), 1);
        let p = peer(1);
        let id = tsm.start_request(p.clone(), 12).unwrap();

        sleep(Duration::from_millis(20));
        let (retry, timed_out) = tsm.poll_timeouts();
        assert_eq!(retry, vec![(p.clone(), id)]);
        assert!(timed_out.is_empty());

        sleep(Duration::from_millis(20));
        let (retry, timed_out) = tsm.poll_timeouts();
        assert!(retry.is_empty());
        assert_eq!(timed_out, vec![(p.clone(), id)]);
        assert_eq!(tsm.state_of(&p, id), Some(TransactionState::TimedOut));
    }

    #[test]
    fn unknown_transaction_is_reported() {
        let mut tsm = TransactionStateMachine::new(4, Duration::from_secs(5), 2);
        assert_eq!(tsm.complete(&peer(9), 1), Err(TsmError::UnknownTransaction));
    }
}
