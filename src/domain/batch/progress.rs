use serde::Serialize;

/// Number of chunks needed for `rows` rows: ceil(rows / chunk_size)
pub fn chunk_count(rows: usize, chunk_size: usize) -> usize {
    if chunk_size == 0 {
        return 0;
    }
    rows.div_ceil(chunk_size)
}

/// Snapshot published after every completed chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BatchProgress {
    pub processed_rows: usize,
    pub total_rows: usize,
    pub completed_chunks: usize,
    pub total_chunks: usize,
}

impl BatchProgress {
    pub fn start(total_rows: usize, chunk_size: usize) -> Self {
        Self {
            processed_rows: 0,
            total_rows,
            completed_chunks: 0,
            total_chunks: chunk_count(total_rows, chunk_size),
        }
    }

    pub fn chunk_done(mut self, rows_in_chunk: usize) -> Self {
        self.processed_rows = (self.processed_rows + rows_in_chunk).min(self.total_rows);
        self.completed_chunks += 1;
        self
    }

    /// Whole percent, rounded down so 100 only appears once every row is done
    pub fn percent(&self) -> u8 {
        if self.total_rows == 0 {
            return 0;
        }
        (self.processed_rows * 100 / self.total_rows) as u8
    }

    pub fn fraction(&self) -> f64 {
        if self.total_rows == 0 {
            return 0.0;
        }
        self.processed_rows as f64 / self.total_rows as f64
    }

    pub fn is_complete(&self) -> bool {
        self.total_rows > 0 && self.processed_rows == self.total_rows
    }
}
