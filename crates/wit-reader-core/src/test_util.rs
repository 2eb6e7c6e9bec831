use std::cell::Cell as Counter;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::schema::{PhysicalType, Schema};
use crate::source::{Cell, RowGroup, RowGroupSource, SourceError};
use crate::timestamp::{Int96Timestamp, JULIAN_DAY_OF_UNIX_EPOCH, NANOS_PER_SECOND};

/// Shared counters observed by the in-memory source and its groups.
#[derive(Clone, Default)]
pub(crate) struct Probe {
    fetches: Rc<Counter<usize>>,
    cell_reads: Rc<Counter<usize>>,
    released: Rc<Counter<usize>>,
}

impl Probe {
    pub(crate) fn fetches(&self) -> usize {
        self.fetches.get()
    }

    pub(crate) fn cell_reads(&self) -> usize {
        self.cell_reads.get()
    }

    pub(crate) fn released(&self) -> usize {
        self.released.get()
    }
}

fn bump(counter: &Counter<usize>) {
    counter.set(counter.get() + 1);
}

pub(crate) type MemoryRow = Vec<Option<Cell>>;

pub(crate) struct MemoryGroup {
    rows: Vec<MemoryRow>,
    probe: Probe,
}

impl MemoryGroup {
    pub(crate) fn new(rows: Vec<MemoryRow>, probe: &Probe) -> Self {
        Self {
            rows,
            probe: probe.clone(),
        }
    }
}

impl RowGroup for MemoryGroup {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn cell(&mut self, row: usize, position: usize) -> Result<Option<Cell>, SourceError> {
        bump(&self.probe.cell_reads);
        Ok(self
            .rows
            .get(row)
            .and_then(|cells| cells.get(position))
            .cloned()
            .flatten())
    }
}

impl Drop for MemoryGroup {
    fn drop(&mut self) {
        bump(&self.probe.released);
    }
}

pub(crate) struct MemorySource {
    groups: VecDeque<MemoryGroup>,
    handed_out: usize,
    fail_after: Option<usize>,
    probe: Probe,
}

impl MemorySource {
    pub(crate) fn new(groups: Vec<MemoryGroup>, probe: &Probe) -> Self {
        Self {
            groups: groups.into(),
            handed_out: 0,
            fail_after: None,
            probe: probe.clone(),
        }
    }

    /// Fail the fetch that follows the first `count` groups.
    pub(crate) fn failing_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }
}

impl RowGroupSource for MemorySource {
    type Group = MemoryGroup;

    fn next_row_group(&mut self) -> Result<Option<MemoryGroup>, SourceError> {
        bump(&self.probe.fetches);
        if self.fail_after == Some(self.handed_out) {
            return Err(SourceError::Unavailable {
                row_group: self.handed_out,
                message: "simulated read failure".to_string(),
            });
        }
        let group = self.groups.pop_front();
        if group.is_some() {
            self.handed_out += 1;
        }
        Ok(group)
    }
}

pub(crate) fn wit_schema() -> Schema {
    Schema::new(
        "schema",
        [
            ("time", PhysicalType::Int96, true),
            ("water", PhysicalType::Double, true),
            ("wet", PhysicalType::Double, true),
            ("bs", PhysicalType::Double, true),
            ("pv", PhysicalType::Double, true),
            ("npv", PhysicalType::Double, true),
            ("geometry", PhysicalType::Utf8String, true),
            ("uid", PhysicalType::Utf8String, true),
        ],
    )
}

/// A row dated `day` days and `day` seconds after the epoch, with fractions
/// `base`, `base + 1`, ... `base + 4`.
pub(crate) fn wit_row(day: i32, base: f64, geometry: &str, uid: &str) -> MemoryRow {
    let time = Int96Timestamp {
        julian_day: JULIAN_DAY_OF_UNIX_EPOCH + day,
        nanos_of_day: i64::from(day) * NANOS_PER_SECOND,
    };
    vec![
        Some(Cell::Int96(time)),
        Some(Cell::Double(base)),
        Some(Cell::Double(base + 1.0)),
        Some(Cell::Double(base + 2.0)),
        Some(Cell::Double(base + 3.0)),
        Some(Cell::Double(base + 4.0)),
        Some(Cell::Text(geometry.to_string())),
        Some(Cell::Text(uid.to_string())),
    ]
}

/// `count` rows numbered from `first`, with `uid-<n>` identifiers.
pub(crate) fn wit_rows(first: usize, count: usize) -> Vec<MemoryRow> {
    (first..first + count)
        .map(|n| wit_row(n as i32, n as f64 / 10.0, "POINT (0 0)", &format!("uid-{n}")))
        .collect()
}
