//! Randomized transaction generation
//!
//! Randomness sits behind the `ValueSource` trait (one "next value"
//! operation) so tests can inject scripted sequences and replay exact
//! request streams.

use crate::models::{LockingMode, TransactionRequest, TransactionType};

/// Uniform values in [0, 1), one draw at a time
pub trait ValueSource: Send {
    fn next(&mut self) -> f64;
}

/// Production source backed by the thread-local RNG
#[derive(Debug, Default)]
pub struct EntropySource;

impl ValueSource for EntropySource {
    fn next(&mut self) -> f64 {
        rand::random::<f64>()
    }
}

/// Scripted source for tests; cycles through the given values
#[derive(Debug)]
pub struct FixedSource {
    values: Vec<f64>,
    pos: usize,
}

impl FixedSource {
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "FixedSource needs at least one value");
        Self { values, pos: 0 }
    }
}

impl ValueSource for FixedSource {
    fn next(&mut self) -> f64 {
        let v = self.values[self.pos % self.values.len()];
        self.pos += 1;
        v
    }
}

/// Builds one randomized request per iteration
pub struct TransactionGenerator;

impl TransactionGenerator {
    /// Draw order: action first, amount second.
    /// Action is DEPOSIT for draws < 0.5, amount is uniform in [1, 100].
    pub fn next_request(source: &mut dyn ValueSource, mode: LockingMode) -> TransactionRequest {
        let tx_type = if source.next() < 0.5 {
            TransactionType::Deposit
        } else {
            TransactionType::Withdrawal
        };
        let amount = ((source.next() * 100.0) as u32 + 1).min(100);
        let reason = format!("{}_{}", tx_type, mode);

        TransactionRequest {
            r#type: tx_type,
            amount,
            locking_mode: mode,
            reason,
        }
    }
}
