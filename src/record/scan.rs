use super::error::RecordResult;
use super::record::{Record, RecordId, SlotId};
use super::table::{DATA_START_PAGE, Table};
use super::value::Value;
use crate::expr::{Expr, ExprError, eval};
use crate::file::PageId;

impl Table {
    /// Start a scan over the table's records, optionally filtered.
    ///
    /// The page count is snapshotted here: pages appended after the scan
    /// starts are not visited. `None` as the condition accepts every record.
    pub fn scan(&mut self, condition: Option<Expr>) -> RecordResult<TableScan<'_>> {
        let meta = self.read_meta()?;
        Ok(TableScan {
            table: self,
            condition,
            current_page: DATA_START_PAGE,
            current_slot: 0,
            total_pages: meta.num_pages,
            slots_per_page: meta.slots_per_page,
            active: true,
        })
    }
}

/// Cursor over a table's (page, slot) space.
///
/// Each call to [`TableScan::next_record`] pins at most one page at a time
/// and resumes after the previously returned record. The scan also works
/// as an [`Iterator`] over `RecordResult<Record>`.
pub struct TableScan<'a> {
    table: &'a mut Table,
    condition: Option<Expr>,
    current_page: PageId,
    current_slot: SlotId,
    total_pages: u32,
    slots_per_page: u32,
    active: bool,
}

impl TableScan<'_> {
    /// Advance to the next record satisfying the condition.
    ///
    /// Returns `Ok(None)` once the cursor has passed the last page captured
    /// at scan start; the scan stays exhausted from then on.
    pub fn next_record(&mut self) -> RecordResult<Option<Record>> {
        if !self.active {
            return Ok(None);
        }

        let Self {
            table,
            condition,
            current_page,
            current_slot,
            total_pages,
            slots_per_page,
            active,
        } = self;

        while *current_page < *total_pages {
            let layout = table.layout;
            let file = table.file;
            let guard = table.pool.pin(file, *current_page)?;

            while *current_slot < *slots_per_page {
                let slot = *current_slot;
                *current_slot += 1;

                if !layout.is_occupied(guard.data(), slot) {
                    continue;
                }

                let rid = RecordId::new(*current_page, slot);
                let record =
                    Record::from_bytes(rid, layout.record_slice(guard.data(), slot).to_vec());

                let matches = match condition {
                    None => true,
                    Some(cond) => match eval(&record, &table.schema, cond)? {
                        Value::Bool(b) => b,
                        _ => return Err(ExprError::PredicateNotBoolean.into()),
                    },
                };

                if matches {
                    // Cursor already points past the hit; the next call
                    // re-pins this page if needed
                    return Ok(Some(record));
                }
            }

            drop(guard);
            *current_page += 1;
            *current_slot = 0;
        }

        *active = false;
        Ok(None)
    }

    /// Whether the scan has records left to consider
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The schema of the scanned table
    pub fn schema(&self) -> &super::schema::Schema {
        &self.table.schema
    }
}

impl Iterator for TableScan<'_> {
    type Item = RecordResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
