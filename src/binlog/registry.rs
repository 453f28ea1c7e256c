// Copyright (c) 2021 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::{collections::HashMap, sync::Arc};

use super::events::TableMapEvent;

/// Table map events of a single replication stream, keyed by table id.
///
/// Entries are replaced (never mutated) when a table id is mapped again.
/// Rows events hold an `Arc` to the entry they were decoded against,
/// so replacing an entry doesn't affect already decoded events.
#[derive(Debug, Default, Clone)]
pub struct TableMapRegistry {
    tables: HashMap<u64, Arc<TableMapEvent>>,
}

impl TableMapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the given table map event replacing the previous one with the same table id.
    ///
    /// Returns the replaced event, if any.
    pub fn insert(&mut self, table: Arc<TableMapEvent>) -> Option<Arc<TableMapEvent>> {
        self.tables.insert(table.table_id(), table)
    }

    pub fn get(&self, table_id: u64) -> Option<&Arc<TableMapEvent>> {
        self.tables.get(&table_id)
    }

    pub fn contains(&self, table_id: u64) -> bool {
        self.tables.contains_key(&table_id)
    }

    pub fn remove(&mut self, table_id: u64) -> Option<Arc<TableMapEvent>> {
        self.tables.remove(&table_id)
    }

    /// Removes all table map events.
    pub fn clear(&mut self) {
        self.tables.clear()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Returns ids of registered tables in no particular order.
    pub fn table_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.tables.keys().copied()
    }
}
