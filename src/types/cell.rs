/// A user-table cell address: `(row-bytes, column-bytes)` (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Cell {
    pub row: Vec<u8>,
    pub column: Vec<u8>,
}

impl Cell {
    pub fn new(row: impl Into<Vec<u8>>, column: impl Into<Vec<u8>>) -> Self {
        Self { row: row.into(), column: column.into() }
    }

    /// Bytes fed to the partitioner's stable hash; `row` then `column`, length-prefixed so
    /// `(row="ab", column="c")` and `(row="a", column="bc")` never collide.
    pub fn identity_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.row.len() + self.column.len() + 8);
        buf.extend_from_slice(&(self.row.len() as u32).to_be_bytes());
        buf.extend_from_slice(&self.row);
        buf.extend_from_slice(&(self.column.len() as u32).to_be_bytes());
        buf.extend_from_slice(&self.column);
        buf
    }
}
