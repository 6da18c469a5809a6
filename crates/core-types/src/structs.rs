use crate::enums::Field;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single, fully populated trading day for one ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

impl Quote {
    /// Returns the price stored under `field`. Volume is widened to a `Decimal`.
    pub fn value(&self, field: Field) -> Decimal {
        match field {
            Field::Open => self.open,
            Field::High => self.high,
            Field::Low => self.low,
            Field::Close => self.close,
            Field::Volume => Decimal::from(self.volume),
        }
    }
}

/// A provider's columnar table for one ticker, before any cleaning.
///
/// Columns are keyed by `Field` and may be missing entirely; individual cells
/// may be `None` when the provider reported a null for that day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub dates: Vec<NaiveDate>,
    pub columns: BTreeMap<Field, Vec<Option<Decimal>>>,
}

impl RawTable {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            columns: BTreeMap::new(),
        }
    }

    /// Builder-style helper for attaching a column.
    pub fn with_column(mut self, field: Field, cells: Vec<Option<Decimal>>) -> Self {
        self.columns.insert(field, cells);
        self
    }

    pub fn column(&self, field: Field) -> Option<&[Option<Decimal>]> {
        self.columns.get(&field).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Keeps only the rows whose date satisfies `keep`, in every column.
    pub fn retain_dates<F>(&mut self, keep: F)
    where
        F: Fn(&NaiveDate) -> bool,
    {
        let mask: Vec<bool> = self.dates.iter().map(|d| keep(d)).collect();
        let mut dates = Vec::with_capacity(self.dates.len());
        for (date, keep) in self.dates.drain(..).zip(&mask) {
            if *keep {
                dates.push(date);
            }
        }
        self.dates = dates;

        for cells in self.columns.values_mut() {
            let mut idx = 0;
            cells.retain(|_| {
                let keep = mask.get(idx).copied().unwrap_or(false);
                idx += 1;
                keep
            });
        }
    }
}

/// The shape of a provider response, decided once at the fetch boundary.
///
/// A request for a single ticker comes back `Flat`; a request for several comes
/// back as one table per ticker symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawResponse {
    Flat(RawTable),
    MultiTicker(BTreeMap<String, RawTable>),
}

impl RawResponse {
    /// Total number of rows across every table in the response.
    pub fn row_count(&self) -> usize {
        match self {
            RawResponse::Flat(table) => table.len(),
            RawResponse::MultiTicker(tables) => tables.values().map(RawTable::len).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    #[test]
    fn retain_dates_filters_every_column() {
        let mut table = RawTable::new(vec![day(3), day(4), day(5)])
            .with_column(Field::Close, vec![Some(dec!(1)), None, Some(dec!(3))])
            .with_column(Field::Open, vec![Some(dec!(10)), Some(dec!(20)), Some(dec!(30))]);

        table.retain_dates(|d| *d != day(4));

        assert_eq!(table.dates, vec![day(3), day(5)]);
        assert_eq!(table.column(Field::Close).unwrap(), &[Some(dec!(1)), Some(dec!(3))]);
        assert_eq!(table.column(Field::Open).unwrap(), &[Some(dec!(10)), Some(dec!(30))]);
    }

    #[test]
    fn row_count_sums_nested_tables() {
        let mut tables = BTreeMap::new();
        tables.insert("AAPL".to_string(), RawTable::new(vec![day(3), day(4)]));
        tables.insert("MSFT".to_string(), RawTable::new(vec![day(3)]));
        assert_eq!(RawResponse::MultiTicker(tables).row_count(), 3);
        assert_eq!(RawResponse::Flat(RawTable::default()).row_count(), 0);
    }

    #[test]
    fn quote_value_widens_volume() {
        let quote = Quote {
            date: day(3),
            open: dec!(1),
            high: dec!(2),
            low: dec!(0.5),
            close: dec!(1.5),
            volume: 42,
        };
        assert_eq!(quote.value(Field::Volume), dec!(42));
        assert_eq!(quote.value(Field::High), dec!(2));
    }
}
