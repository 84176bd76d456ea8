//! CSV command-script reader for the replay binary.
//!
//! A script drives the engine through both sides of an order's life:
//!
//! ```csv
//! command, actor, order, arg, detail
//! place, user:alice, o1, op1, burger:2|fries:1
//! status, op:op1, o1, confirmed,
//! deliver, op:op1, o1, ,
//! ```
//!
//! `order` is a symbolic reference bound by `place`. `deliver` with an
//! empty `arg` submits the OTP as the customer sees it on their own order.

use crate::application::engine::OrderLine;
use crate::domain::identity::Identity;
use crate::domain::order::MenuItemId;
use crate::error::{OrderError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Place,
    Pay,
    Status,
    Cancel,
    Deliver,
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct ScriptCommand {
    pub command: CommandKind,
    pub actor: String,
    pub order: String,
    #[serde(default)]
    pub arg: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

pub struct ScriptReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ScriptReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn commands(self) -> impl Iterator<Item = Result<ScriptCommand>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(OrderError::from))
    }
}

/// Builds the identity a script actor stands for. `user:<id>` is a
/// customer (with a synthetic profile, since the script has no identity
/// provider), `op:<id>` an operator.
pub fn parse_actor(actor: &str) -> Result<Identity> {
    if let Some(id) = actor.strip_prefix("user:") {
        Ok(Identity::customer(id, format!("{id}@mealflow.test"), id))
    } else if let Some(id) = actor.strip_prefix("op:") {
        Ok(Identity::operator(id))
    } else {
        Err(OrderError::Validation(format!(
            "Actor must be 'user:<id>' or 'op:<id>', got '{actor}'"
        )))
    }
}

/// Parses an item list of the form `item:qty|item:qty`.
pub fn parse_items(detail: &str) -> Result<Vec<OrderLine>> {
    detail
        .split('|')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (id, qty) = part.split_once(':').ok_or_else(|| {
                OrderError::Validation(format!("Expected 'item:qty', got '{part}'"))
            })?;
            let quantity: u32 = qty
                .trim()
                .parse()
                .map_err(|_| OrderError::Validation(format!("Invalid quantity '{qty}'")))?;
            Ok(OrderLine {
                menu_item_id: MenuItemId::new(id.trim()),
                quantity,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::Role;

    #[test]
    fn test_reader_valid_stream() {
        let data = "command, actor, order, arg, detail\n\
                    place, user:alice, o1, op1, burger:2|fries:1\n\
                    status, op:op1, o1, confirmed,";
        let reader = ScriptReader::new(data.as_bytes());
        let commands: Vec<Result<ScriptCommand>> = reader.commands().collect();

        assert_eq!(commands.len(), 2);
        let place = commands[0].as_ref().unwrap();
        assert_eq!(place.command, CommandKind::Place);
        assert_eq!(place.actor, "user:alice");
        assert_eq!(place.order, "o1");
        assert_eq!(place.arg.as_deref(), Some("op1"));
        assert_eq!(place.detail.as_deref(), Some("burger:2|fries:1"));

        let status = commands[1].as_ref().unwrap();
        assert_eq!(status.command, CommandKind::Status);
        assert_eq!(status.arg.as_deref(), Some("confirmed"));
        assert_eq!(status.detail, None);
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "command, actor, order, arg, detail\nteleport, user:alice, o1, ,";
        let reader = ScriptReader::new(data.as_bytes());
        let commands: Vec<Result<ScriptCommand>> = reader.commands().collect();
        assert!(commands[0].is_err());
    }

    #[test]
    fn test_parse_actor() {
        let customer = parse_actor("user:alice").unwrap();
        assert_eq!(customer.role, Role::Customer);
        assert_eq!(customer.id, "alice");

        let operator = parse_actor("op:op1").unwrap();
        assert_eq!(operator.role, Role::Operator);
        assert_eq!(operator.id, "op1");

        assert!(parse_actor("alice").is_err());
    }

    #[test]
    fn test_parse_items() {
        let lines = parse_items("burger:2|fries:1").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].menu_item_id, MenuItemId::new("burger"));
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[1].quantity, 1);

        assert!(parse_items("burger").is_err());
        assert!(parse_items("burger:two").is_err());
    }
}
