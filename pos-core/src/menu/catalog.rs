//! Read-only lookup of sellable items
//!
//! Loaded once from configuration (a JSON array of `{id, name, price}`) and
//! never mutated afterwards.

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::dec;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::MenuItem;

use crate::orders::OrderError;
use crate::orders::money::validate_price;

/// Immutable menu
#[derive(Debug, Clone)]
pub struct MenuCatalog {
    items: Vec<MenuItem>,
    index: HashMap<String, usize>,
}

impl MenuCatalog {
    /// Validate and index a list of items
    pub fn from_items(items: Vec<MenuItem>) -> AppResult<Self> {
        let mut index = HashMap::with_capacity(items.len());
        for (pos, item) in items.iter().enumerate() {
            if item.id.trim().is_empty() {
                return Err(AppError::with_message(
                    ErrorCode::RequiredField,
                    format!("Menu item #{} has an empty id", pos),
                ));
            }
            validate_price(item.price, "price").map_err(|e| {
                AppError::with_message(ErrorCode::MenuItemInvalidPrice, e.to_string())
                    .with_detail("menu_item_id", item.id.clone())
            })?;
            if index.insert(item.id.clone(), pos).is_some() {
                return Err(AppError::with_message(
                    ErrorCode::MenuItemDuplicate,
                    format!("Menu item id {} appears more than once", item.id),
                ));
            }
        }
        tracing::debug!(items = items.len(), "Menu catalog loaded");
        Ok(Self { items, index })
    }

    /// Parse a JSON array of menu items
    pub fn from_json_str(json: &str) -> AppResult<Self> {
        let items: Vec<MenuItem> = serde_json::from_str(json).map_err(|e| {
            AppError::with_message(ErrorCode::InvalidFormat, format!("Invalid menu JSON: {}", e))
        })?;
        Self::from_items(items)
    }

    /// Load a JSON menu file
    pub fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("Failed to read menu {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    /// Default menu used when no file is configured
    pub fn builtin() -> Self {
        let items = vec![
            MenuItem::new("espresso", "Espresso", dec!(1.80)),
            MenuItem::new("cappuccino", "Cappuccino", dec!(2.60)),
            MenuItem::new("orange-juice", "Orange Juice", dec!(3.20)),
            MenuItem::new("croissant", "Croissant", dec!(2.10)),
            MenuItem::new("club-sandwich", "Club Sandwich", dec!(8.90)),
            MenuItem::new("caesar-salad", "Caesar Salad", dec!(9.40)),
            MenuItem::new("burger", "Burger", dec!(12.50)),
            MenuItem::new("fries", "Fries", dec!(3.90)),
            MenuItem::new("cheesecake", "Cheesecake", dec!(5.20)),
            MenuItem::new("water", "Mineral Water", dec!(1.50)),
        ];
        let index = items
            .iter()
            .enumerate()
            .map(|(pos, item)| (item.id.clone(), pos))
            .collect();
        Self { items, index }
    }

    pub fn get(&self, id: &str) -> Option<&MenuItem> {
        self.index.get(id).map(|&pos| &self.items[pos])
    }

    /// Lookup that reports a missing id as an error
    pub fn require(&self, id: &str) -> AppResult<&MenuItem> {
        self.get(id)
            .ok_or_else(|| OrderError::UnknownMenuItem(id.to_string()).into())
    }

    /// Items in configuration order
    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
