//! Replay feed - CSV command files for driving the engine offline.
//!
//! One command per row, header `action,order_id,side,price,volume`.
//! Columns that an action does not use may be left empty.

use std::io;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::command::{CancelOrder, Command, ModifyPrice, ModifyVolume, OrderId, PlaceOrder, Side};
use crate::error::FeedError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Place,
    Cancel,
    ModifyPrice,
    ModifyVolume,
}

impl Action {
    fn name(self) -> &'static str {
        match self {
            Action::Place => "place",
            Action::Cancel => "cancel",
            Action::ModifyPrice => "modify_price",
            Action::ModifyVolume => "modify_volume",
        }
    }
}

/// A raw CSV row.
#[derive(Clone, Debug, Deserialize)]
pub struct ReplayRow {
    pub action: Action,
    pub order_id: u64,
    pub side: Option<Side>,
    /// Kept as text so decimal prices parse exactly
    pub price: Option<String>,
    pub volume: Option<u64>,
}

impl ReplayRow {
    /// Convert a raw row to a typed command.
    ///
    /// `row` is the 1-based data row number used in error messages.
    pub fn to_command(&self, row: usize) -> Result<Command, FeedError> {
        let order_id = OrderId(self.order_id);
        let command = match self.action {
            Action::Place => Command::Place(PlaceOrder {
                order_id,
                side: self.require(row, "side", self.side)?,
                price: self.price(row)?,
                volume: self.require(row, "volume", self.volume)?,
            }),
            Action::Cancel => Command::Cancel(CancelOrder { order_id }),
            Action::ModifyPrice => Command::ModifyPrice(ModifyPrice {
                order_id,
                new_price: self.price(row)?,
            }),
            Action::ModifyVolume => Command::ModifyVolume(ModifyVolume {
                order_id,
                new_volume: self.require(row, "volume", self.volume)?,
            }),
        };
        Ok(command)
    }

    fn require<T>(
        &self,
        row: usize,
        field: &'static str,
        value: Option<T>,
    ) -> Result<T, FeedError> {
        value.ok_or(FeedError::MissingField {
            row,
            action: self.action.name(),
            field,
        })
    }

    fn price(&self, row: usize) -> Result<Decimal, FeedError> {
        let raw = self.require(row, "price", self.price.as_deref())?;
        Decimal::from_str(raw.trim()).map_err(|_| FeedError::BadPrice {
            row,
            value: raw.to_string(),
        })
    }
}

/// Read every command from a CSV source with a header row.
pub fn read_commands<R: io::Read>(source: R) -> Result<Vec<Command>, FeedError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    reader
        .deserialize::<ReplayRow>()
        .enumerate()
        .map(|(i, row)| row?.to_command(i + 1))
        .collect()
}
