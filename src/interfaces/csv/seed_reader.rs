//! Readers for the two seed files the replay binary consumes: the operator
//! directory (`id, restaurant`) and the menu catalog
//! (`id, operator, name, price, image`).

use crate::domain::order::{MenuItemId, OperatorId, Price};
use crate::domain::ports::{CatalogItem, OperatorProfile};
use crate::error::{OrderError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct OperatorRecord {
    pub id: String,
    pub restaurant: String,
}

impl OperatorRecord {
    pub fn into_entry(self) -> (OperatorId, OperatorProfile) {
        (
            OperatorId::new(self.id),
            OperatorProfile {
                restaurant_name: self.restaurant,
            },
        )
    }
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct MenuRecord {
    pub id: String,
    pub operator: String,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
}

impl MenuRecord {
    pub fn into_entry(self) -> Result<(MenuItemId, CatalogItem)> {
        Ok((
            MenuItemId::new(self.id),
            CatalogItem {
                name: self.name,
                price: Price::new(self.price)?,
                image: self.image.unwrap_or_default(),
            },
        ))
    }
}

pub fn read_operators<R: Read>(source: R) -> Result<Vec<OperatorRecord>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source)
        .into_deserialize()
        .map(|result| result.map_err(OrderError::from))
        .collect()
}

pub fn read_menu<R: Read>(source: R) -> Result<Vec<MenuRecord>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source)
        .into_deserialize()
        .map(|result| result.map_err(OrderError::from))
        .collect()
}
