//! Engine - command processing front end with CPU pinning and warm-up.
//!
//! Turns [`Command`]s into [`OutputEvent`]s. With the `runtime` feature the
//! engine can own a dedicated thread fed through an rtrb SPSC ring buffer,
//! which serialises all order entry onto the single matching thread.

use log::warn;

use crate::command::{
    Command, OrderAccepted, OrderCanceled, OrderId, OrderModified, OrderRejected, OutputEvent,
    TradeEvent,
};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::matching::MatchingEngine;

/// The main engine that processes commands.
pub struct Engine {
    /// The underlying matching engine
    pub matcher: MatchingEngine,
}

impl Engine {
    /// Create a new engine with the specified order capacity.
    pub fn new(capacity: u32) -> Self {
        Self {
            matcher: MatchingEngine::new(capacity),
        }
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            matcher: MatchingEngine::with_config(config),
        }
    }

    /// Run the engine event loop.
    ///
    /// # Arguments
    /// * `input` - Consumer end of the command ring buffer
    /// * `output` - Producer end of the output event ring buffer
    /// * `pin_to_core` - Whether to pin to the last available CPU core
    ///
    /// Runs until the producer side of `input` is dropped and drained.
    #[cfg(feature = "runtime")]
    pub fn run(
        &mut self,
        input: &mut rtrb::Consumer<Command>,
        output: &mut rtrb::Producer<OutputEvent>,
        pin_to_core: bool,
    ) {
        if pin_to_core {
            self.pin_to_core();
        }

        self.warm_up();
        log::info!("engine loop started");

        loop {
            while let Ok(cmd) = input.pop() {
                for event in self.process_command(cmd) {
                    // Best effort - drop if full
                    if output.push(event).is_err() {
                        warn!("output ring full, dropped {:?}", event);
                    }
                }
            }
            if input.is_abandoned() && input.is_empty() {
                break;
            }
            std::hint::spin_loop();
        }

        log::info!("engine loop stopped");
    }

    /// Process a single command and return output events.
    ///
    /// Trades come first in execution order, followed by the order's own
    /// status event. Cancels and modifies of unknown ids produce no events.
    #[inline]
    pub fn process_command(&mut self, cmd: Command) -> Vec<OutputEvent> {
        match cmd {
            Command::Place(order) => {
                let result = self
                    .matcher
                    .place(order.order_id, order.price, order.volume, order.side);
                self.report_match(order.order_id, result)
            }
            Command::Cancel(cancel) => self
                .matcher
                .cancel(cancel.order_id)
                .map(|canceled_volume| {
                    OutputEvent::Canceled(OrderCanceled {
                        order_id: cancel.order_id,
                        canceled_volume,
                    })
                })
                .into_iter()
                .collect(),
            Command::ModifyPrice(modify) => {
                let result = self.matcher.modify_price(modify.order_id, modify.new_price);
                self.report_match(modify.order_id, result)
            }
            Command::ModifyVolume(modify) => {
                let Some(before) = self.matcher.order(modify.order_id) else {
                    return Vec::new();
                };
                match self.matcher.modify_volume(modify.order_id, modify.new_volume) {
                    Ok(true) => {}
                    Ok(false) => return Vec::new(),
                    Err(err) => return reject(modify.order_id, err),
                }
                let event = if modify.new_volume == 0 {
                    OutputEvent::Canceled(OrderCanceled {
                        order_id: modify.order_id,
                        canceled_volume: before.volume,
                    })
                } else {
                    OutputEvent::Modified(OrderModified {
                        order_id: modify.order_id,
                        new_volume: modify.new_volume,
                    })
                };
                vec![event]
            }
        }
    }

    /// Events for a place or reprice: trades, then Accepted if it rests.
    fn report_match(
        &self,
        order_id: OrderId,
        result: Result<Vec<TradeEvent>, EngineError>,
    ) -> Vec<OutputEvent> {
        match result {
            Ok(trades) => {
                let mut events: Vec<OutputEvent> =
                    trades.into_iter().map(OutputEvent::Trade).collect();
                if let Some(resting) = self.matcher.order(order_id) {
                    events.push(OutputEvent::Accepted(OrderAccepted {
                        order_id,
                        side: resting.side,
                        price: resting.price,
                        volume: resting.volume,
                    }));
                }
                events
            }
            Err(err) => reject(order_id, err),
        }
    }

    /// Pin the current thread to the last available CPU core.
    ///
    /// The last core is typically isolated from OS interrupts.
    pub fn pin_to_core(&self) {
        match core_affinity::get_core_ids().and_then(|ids| ids.last().copied()) {
            Some(core) => {
                if !core_affinity::set_for_current(core) {
                    warn!("failed to pin engine thread to core {}", core.id);
                }
            }
            None => warn!("no core ids available, engine thread not pinned"),
        }
    }

    /// Warm up the engine by pre-faulting memory pages.
    pub fn warm_up(&mut self) {
        self.matcher.warm_up();
    }

    #[inline]
    pub fn best_bid(&self) -> Option<rust_decimal::Decimal> {
        self.matcher.best_bid()
    }

    #[inline]
    pub fn best_ask(&self) -> Option<rust_decimal::Decimal> {
        self.matcher.best_ask()
    }

    #[inline]
    pub fn order_count(&self) -> usize {
        self.matcher.order_count()
    }

    /// Compute state hash for determinism testing.
    #[inline]
    pub fn state_hash(&self) -> u64 {
        self.matcher.state_hash()
    }
}

/// Rejected event for an order the engine refused, if the error is a rejection.
fn reject(order_id: OrderId, err: EngineError) -> Vec<OutputEvent> {
    match err.reject_reason() {
        Some(reason) => vec![OutputEvent::Rejected(OrderRejected { order_id, reason })],
        None => {
            warn!("unexpected engine error for {order_id}: {err}");
            Vec::new()
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}
