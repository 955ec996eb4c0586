//! Synthetic row identifiers for the fact table.

/// Bits reserved for the row offset inside one chunk of work.
pub const PARTITION_ID_SHIFT: u32 = 33;

/// Generates ids for the rows produced by one chunk of work.
///
/// The chunk index occupies the upper bits and a per-chunk counter the lower
/// 33 bits, so ids are unique across chunks and increase with chunk order
/// without any coordination between workers. They are not contiguous.
#[derive(Debug, Clone)]
pub struct MonotonicIds {
    next: i64,
}

impl MonotonicIds {
    pub fn for_partition(partition: usize) -> Self {
        Self {
            next: (partition as i64) << PARTITION_ID_SHIFT,
        }
    }

    pub fn next_id(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }
}
