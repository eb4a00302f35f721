//! Periodic quote batch generator.
//!
//! The `QuoteGenerator` runs a background thread that synthesizes one
//! `QuoteBatch` per tick for a fixed list of instruments and hands it to the
//! broadcast coordinator over a `crossbeam_channel`. It knows nothing about
//! subscribers.
//!
//! Design notes:
//! - Some instruments have a constant price, the rest are drawn uniformly as
//!   `base + random() * spread`. Nothing clamps the result.
//! - The random source is owned by the generator, so tests can seed it.
//! - Ticks come from a `Receiver<Instant>`; `spawn` uses `crossbeam_channel::tick`,
//!   which first fires one full period after start.

use crossbeam_channel::{Receiver, Sender, bounded, tick};
use log::{debug, info, warn};
use quote_common::{Instrument, Quote, QuoteBatch};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::thread;
use std::time::{Duration, Instant};

/// Default time between two batches.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(5);

/// How the price of one instrument is produced on each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceModel {
    /// Same price on every tick.
    Fixed(f64),
    /// `base + random() * spread`, with `random()` uniform in `[0, 1)`.
    Jitter {
        /// Lower end of the range.
        base: f64,
        /// Width of the range.
        spread: f64,
    },
}

/// Instruments quoted on every tick, in broadcast order.
pub const INSTRUMENTS: [(Instrument, PriceModel); 10] = [
    (Instrument::Apple, PriceModel::Jitter { base: 5.0, spread: 5.0 }),
    (Instrument::Microsoft, PriceModel::Fixed(300.0)),
    (Instrument::Google, PriceModel::Jitter { base: 5.0, spread: 300.0 }),
    (Instrument::Salesforce, PriceModel::Fixed(500.0)),
    (Instrument::LinkedIn, PriceModel::Jitter { base: 5.0, spread: 10.0 }),
    (Instrument::Yahoo, PriceModel::Fixed(700.0)),
    (Instrument::Hp, PriceModel::Jitter { base: 5.0, spread: 50.0 }),
    (Instrument::Dell, PriceModel::Fixed(900.0)),
    (Instrument::Levis, PriceModel::Jitter { base: 5.0, spread: 13.0 }),
    (Instrument::Bata, PriceModel::Fixed(330.0)),
];

impl PriceModel {
    /// Draw the next price from `rng`.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        match *self {
            PriceModel::Fixed(price) => price,
            PriceModel::Jitter { base, spread } => base + rng.random::<f64>() * spread,
        }
    }
}

/// Background quote source.
pub struct QuoteGenerator<R> {
    rng: R,
}

impl QuoteGenerator<StdRng> {
    /// Generator with a fixed seed; the same seed yields the same batches.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Generator seeded from the operating system.
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> QuoteGenerator<R> {
    /// Wrap an explicitly owned random source.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Produce one batch covering every entry of `INSTRUMENTS`.
    pub fn generate(&mut self) -> QuoteBatch {
        INSTRUMENTS
            .iter()
            .map(|(instrument, model)| Quote::new(instrument.to_string(), model.sample(&mut self.rng)))
            .collect()
    }

    /// Emit one batch into `batch_tx` per tick received on `ticks`.
    ///
    /// Returns when the tick source closes or the batch receiver is dropped.
    pub fn run(mut self, ticks: Receiver<Instant>, batch_tx: Sender<QuoteBatch>) {
        for at in ticks.iter() {
            let batch = self.generate();
            debug!("Generated batch of {} quotes at {:?}", batch.len(), at);
            if batch_tx.send(batch).is_err() {
                warn!("Batch receiver is gone, generator stopping");
                return;
            }
        }
        info!("Tick source closed, generator stopping");
    }
}

impl<R: Rng + Send + 'static> QuoteGenerator<R> {
    /// Start the generator thread with one tick per `period`.
    ///
    /// Returns the receiving side of the batch channel. Like the delivery
    /// queues it holds a single batch, so a stalled coordinator holds the
    /// generator back instead of piling batches up.
    pub fn spawn(self, period: Duration) -> Receiver<QuoteBatch> {
        let (batch_tx, batch_rx) = bounded::<QuoteBatch>(1);
        thread::spawn(move || {
            info!(
                "Quote generator started (Thread ID: {:?}), period {:?}",
                thread::current().id(),
                period
            );
            self.run(tick(period), batch_tx);
        });
        batch_rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn batch_has_ten_instruments_in_order() {
        let batch = QuoteGenerator::seeded(7).generate();
        let names: Vec<&str> = batch.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Apple",
                "Microsoft",
                "Google",
                "Salesforce",
                "LinkedIn",
                "Yahoo",
                "HP",
                "Dell",
                "Levis",
                "Bata"
            ]
        );
    }

    #[test]
    fn fixed_prices_are_constant_and_jitter_stays_in_range() {
        let mut generator = QuoteGenerator::seeded(42);
        for _ in 0..200 {
            let batch = generator.generate();
            for (quote, (_, model)) in batch.iter().zip(INSTRUMENTS.iter()) {
                match *model {
                    PriceModel::Fixed(price) => assert_eq!(quote.price, price),
                    PriceModel::Jitter { base, spread } => {
                        assert!(quote.price >= base && quote.price < base + spread, "{quote:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn same_seed_same_batches() {
        let mut a = QuoteGenerator::seeded(9);
        let mut b = QuoteGenerator::seeded(9);
        assert_eq!(a.generate(), b.generate());
        assert_eq!(a.generate(), b.generate());
    }

    #[test]
    fn negative_spread_is_passed_through() {
        let model = PriceModel::Jitter { base: 0.0, spread: -10.0 };
        let price = model.sample(&mut StdRng::seed_from_u64(1));
        assert!(price <= 0.0);
    }

    #[test]
    fn run_emits_one_batch_per_tick() {
        let (tick_tx, tick_rx) = unbounded();
        let (batch_tx, batch_rx) = unbounded();
        for _ in 0..3 {
            tick_tx.send(Instant::now()).unwrap();
        }
        drop(tick_tx);
        QuoteGenerator::seeded(3).run(tick_rx, batch_tx);
        assert_eq!(batch_rx.try_iter().count(), 3);
    }

    #[test]
    fn run_stops_when_receiver_dropped() {
        let (tick_tx, tick_rx) = unbounded();
        let (batch_tx, batch_rx) = unbounded::<QuoteBatch>();
        drop(batch_rx);
        tick_tx.send(Instant::now()).unwrap();
        // Would hang on the open tick channel if the send failure were ignored.
        QuoteGenerator::seeded(3).run(tick_rx, batch_tx);
    }

    #[test]
    fn spawned_generator_ticks_on_period() {
        let batches = QuoteGenerator::seeded(5).spawn(Duration::from_millis(10));
        let batch = batches.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(batch.len(), INSTRUMENTS.len());
    }
}
