//! Append-only observation history.

use crate::Observation;

/// Ordered, append-only series of observations.
///
/// Insertion order is emission order; `observed_at` is not required to be
/// monotonic across entries.
#[derive(Debug, Clone, Default)]
pub struct ObservationSeries {
    rows: Vec<Observation>,
}

impl ObservationSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one observation and return its index.
    pub fn push(&mut self, observation: Observation) -> usize {
        self.rows.push(observation);
        self.rows.len() - 1
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The most recent `n` observations, oldest first.
    pub fn tail(&self, n: usize) -> &[Observation] {
        let start = self.rows.len().saturating_sub(n);
        &self.rows[start..]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{floor_to_minute, Exchange, Price};
    use rust_decimal::Decimal;

    fn obs(exchange: Exchange, spot: i64) -> Observation {
        Observation::new(
            exchange,
            Price::new(Decimal::from(spot)),
            Price::new(Decimal::from(spot + 10)),
            floor_to_minute(1_700_000_000_000).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_push_keeps_emission_order() {
        let mut series = ObservationSeries::new();
        assert_eq!(series.push(obs(Exchange::Okx, 1)), 0);
        assert_eq!(series.push(obs(Exchange::Binance, 2)), 1);
        assert_eq!(series.push(obs(Exchange::Bybit, 3)), 2);

        let order: Vec<_> = series.iter().map(|o| o.exchange).collect();
        assert_eq!(order, vec![Exchange::Okx, Exchange::Binance, Exchange::Bybit]);
    }

    #[test]
    fn test_tail_window() {
        let mut series = ObservationSeries::new();
        for i in 0..12 {
            series.push(obs(Exchange::Binance, i));
        }

        let tail = series.tail(9);
        assert_eq!(tail.len(), 9);
        assert_eq!(tail[0].spot.inner(), Decimal::from(3));
        assert_eq!(tail[8].spot.inner(), Decimal::from(11));
        assert_eq!(series.tail(100).len(), 12);
        assert!(ObservationSeries::new().tail(9).is_empty());
    }
}
