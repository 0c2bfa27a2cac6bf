//! A single entity table

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::model::{Record, RecordId};

/// Rows of one entity kind plus its identifier sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    into = "TableImage<T>",
    from = "TableImage<T>",
    bound(serialize = "T: Serialize + Clone", deserialize = "T: DeserializeOwned")
)]
pub struct Table<T> {
    rows: BTreeMap<RecordId, T>,
    next_id: u64,
}

/// Serialized form: rows as a list, so identifiers stay numbers.
#[derive(Serialize, Deserialize)]
struct TableImage<T> {
    next_id: u64,
    rows: Vec<Record<T>>,
}

impl<T> From<Table<T>> for TableImage<T> {
    fn from(table: Table<T>) -> Self {
        Self {
            next_id: table.next_id,
            rows: table
                .rows
                .into_iter()
                .map(|(id, data)| Record { id, data })
                .collect(),
        }
    }
}

impl<T> From<TableImage<T>> for Table<T> {
    fn from(image: TableImage<T>) -> Self {
        let rows: BTreeMap<RecordId, T> = image
            .rows
            .into_iter()
            .map(|record| (record.id, record.data))
            .collect();
        // The sequence never moves backwards past a stored row.
        let floor = rows.keys().next_back().map_or(1, |id| id.get() + 1);
        Self {
            rows,
            next_id: image.next_id.max(floor),
        }
    }
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    pub fn get(&self, id: RecordId) -> Option<&T> {
        self.rows.get(&id)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in ascending identifier order
    pub fn iter(&self) -> impl Iterator<Item = (RecordId, &T)> + '_ {
        self.rows.iter().map(|(id, data)| (*id, data))
    }

    /// Identifiers of rows matching `predicate`, ascending
    pub fn ids_where(&self, mut predicate: impl FnMut(&T) -> bool) -> Vec<RecordId> {
        self.iter()
            .filter(|(_, data)| predicate(data))
            .map(|(id, _)| id)
            .collect()
    }

    /// Identifier the next insert will receive
    pub fn next_id(&self) -> RecordId {
        RecordId::new(self.next_id)
    }

    pub(crate) fn allocate_id(&mut self) -> RecordId {
        let id = RecordId::new(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn put(&mut self, id: RecordId, data: T) -> Option<T> {
        self.rows.insert(id, data)
    }

    pub(crate) fn remove(&mut self, id: RecordId) -> Option<T> {
        self.rows.remove(&id)
    }
}

impl<T: Clone> Table<T> {
    pub fn record(&self, id: RecordId) -> Option<Record<T>> {
        self.get(id).map(|data| Record {
            id,
            data: data.clone(),
        })
    }

    /// Every row as a record, ascending
    pub fn records(&self) -> Vec<Record<T>> {
        self.iter()
            .map(|(id, data)| Record {
                id,
                data: data.clone(),
            })
            .collect()
    }
}
