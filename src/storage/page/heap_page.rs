use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::{DbError, PageId, RecordId, Result, SlotId, TransactionId};
use crate::tuple::{Schema, Tuple};

/// Heap page layout:
///
/// +------------------+
/// | Slot Bitmap      |  ceil(num_slots / 8) bytes, bit i%8 of byte i/8
/// +------------------+
/// | [slot 0]         |  schema.byte_size() bytes each
/// | [slot 1]         |
/// | ...              |
/// | [slot n-1]       |
/// +------------------+
/// | Zero Padding     |
/// +------------------+
///
/// Each slot costs one tuple image plus one header bit, so
/// `num_slots = floor(page_size * 8 / (tuple_size * 8 + 1))`.
/// Unused slots are written as zeros.
#[derive(Debug)]
pub struct HeapPage {
    page_id: PageId,
    schema: Arc<Schema>,
    page_size: usize,
    /// Slot usage bitmap
    header: Vec<u8>,
    /// Materialized tuples, `None` for free slots
    tuples: Vec<Option<Tuple>>,
    /// Transaction that last dirtied this page, `None` when clean
    dirtied_by: Option<TransactionId>,
}

/// Shared handle to a cached page.
pub type PageRef = Arc<RwLock<HeapPage>>;

impl HeapPage {
    /// Materializes a page from its on-disk image.
    /// The page size is the length of `data`.
    pub fn new(page_id: PageId, schema: Arc<Schema>, data: &[u8]) -> Result<Self> {
        let page_size = data.len();
        let num_slots = Self::slots_per_page(page_size, schema.byte_size());
        let header_size = Self::header_size(num_slots);
        let tuple_size = schema.byte_size();

        let header = data[..header_size].to_vec();
        let mut tuples = Vec::with_capacity(num_slots);

        for slot in 0..num_slots {
            if !bit_is_set(&header, slot) {
                tuples.push(None);
                continue;
            }

            let start = header_size + slot * tuple_size;
            let mut tuple = Tuple::from_bytes(schema.clone(), &data[start..start + tuple_size])
                .ok_or_else(|| DbError::CorruptedPage {
                    page_id,
                    reason: format!("slot {} does not decode as [{}]", slot, schema),
                })?;
            tuple.set_record_id(Some(RecordId::new(page_id, SlotId::new(slot as u16))));
            tuples.push(Some(tuple));
        }

        Ok(Self {
            page_id,
            schema,
            page_size,
            header,
            tuples,
            dirtied_by: None,
        })
    }

    /// Creates a page with every slot free.
    pub fn empty(page_id: PageId, schema: Arc<Schema>, page_size: usize) -> Self {
        let num_slots = Self::slots_per_page(page_size, schema.byte_size());
        Self {
            page_id,
            schema,
            page_size,
            header: vec![0u8; Self::header_size(num_slots)],
            tuples: vec![None; num_slots],
            dirtied_by: None,
        }
    }

    /// Returns the on-disk image of an empty page.
    pub fn empty_page_data(page_size: usize) -> Vec<u8> {
        vec![0u8; page_size]
    }

    /// Number of tuple slots a page of `page_size` bytes holds.
    pub fn slots_per_page(page_size: usize, tuple_size: usize) -> usize {
        (page_size * 8) / (tuple_size * 8 + 1)
    }

    fn header_size(num_slots: usize) -> usize {
        num_slots.div_ceil(8)
    }

    /// Returns the page ID.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Returns the schema of the tuples on this page.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the total number of slots.
    pub fn num_slots(&self) -> usize {
        self.tuples.len()
    }

    /// Returns the number of free slots.
    pub fn num_empty_slots(&self) -> usize {
        (0..self.num_slots())
            .filter(|&slot| !self.is_slot_used(slot))
            .count()
    }

    /// Returns whether `slot` holds a tuple.
    pub fn is_slot_used(&self, slot: usize) -> bool {
        slot < self.num_slots() && bit_is_set(&self.header, slot)
    }

    /// Returns the tuple stored in `slot`.
    pub fn tuple(&self, slot: usize) -> Option<&Tuple> {
        self.tuples.get(slot).and_then(Option::as_ref)
    }

    /// Returns an iterator over stored tuples in slot order. Each carries its
    /// record id.
    pub fn tuples(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter().filter_map(Option::as_ref)
    }

    /// Stores `tuple` in the first free slot and returns its record id.
    /// A value whose type differs from its column's fails with `TypeMismatch`
    /// and leaves the page unchanged.
    pub fn insert_tuple(&mut self, mut tuple: Tuple) -> Result<RecordId> {
        if **tuple.schema() != *self.schema {
            return Err(DbError::SchemaMismatch {
                expected: self.schema.to_string(),
                found: tuple.schema().to_string(),
            });
        }
        tuple.check_types()?;

        let slot = (0..self.num_slots())
            .find(|&slot| !self.is_slot_used(slot))
            .ok_or(DbError::PageFull(self.page_id))?;

        let record_id = RecordId::new(self.page_id, SlotId::new(slot as u16));
        tuple.set_record_id(Some(record_id));
        set_bit(&mut self.header, slot, true);
        self.tuples[slot] = Some(tuple);
        Ok(record_id)
    }

    /// Frees the slot named by `tuple`'s record id.
    pub fn delete_tuple(&mut self, tuple: &Tuple) -> Result<()> {
        let record_id = tuple.record_id().ok_or(DbError::MissingRecordId)?;
        let slot = record_id.slot_id.as_usize();
        if record_id.page_id != self.page_id || !self.is_slot_used(slot) {
            return Err(DbError::TupleNotOnPage(record_id));
        }

        set_bit(&mut self.header, slot, false);
        self.tuples[slot] = None;
        Ok(())
    }

    /// Marks the page dirty on behalf of `tx`, or clean with `None`.
    pub fn mark_dirty(&mut self, tx: Option<TransactionId>) {
        self.dirtied_by = tx;
    }

    /// Returns the transaction that dirtied this page, if it is dirty.
    pub fn dirtied_by(&self) -> Option<TransactionId> {
        self.dirtied_by
    }

    pub fn is_dirty(&self) -> bool {
        self.dirtied_by.is_some()
    }

    /// Serializes the page to its fixed-size on-disk image.
    pub fn to_bytes(&self) -> Vec<u8> {
        let tuple_size = self.schema.byte_size();
        let mut data = Vec::with_capacity(self.page_size);
        data.extend_from_slice(&self.header);

        for slot in &self.tuples {
            match slot {
                Some(tuple) => data.extend(tuple.to_bytes()),
                None => data.resize(data.len() + tuple_size, 0),
            }
        }

        data.resize(self.page_size, 0);
        data
    }
}

fn bit_is_set(bitmap: &[u8], index: usize) -> bool {
    bitmap[index / 8] & (1 << (index % 8)) != 0
}

fn set_bit(bitmap: &mut [u8], index: usize, value: bool) {
    if value {
        bitmap[index / 8] |= 1 << (index % 8);
    } else {
        bitmap[index / 8] &= !(1 << (index % 8));
    }
}
