use crate::error::HodokiError;

/// Symbol id of the "not seen yet" entry.
pub const ESCAPE_CODE: i16 = -1;
/// Every byte value plus the escape code.
pub const SYMBOL_SORTS: usize = 0x101;
pub const TOTAL_LIMIT: u32 = 0x2000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodeSymbol {
    pub occurrences: u16,
    pub symbol: i16,
}

/// Adaptive frequency table feeding the entropy coders.
///
/// `total_count` always equals the sum of the active occurrences and is kept
/// at or below [`TOTAL_LIMIT`] by halving every count once it is exceeded.
/// Indices of active entries are stable for the life of the model.
#[derive(Debug, Clone)]
pub struct ProbModel {
    total_count: u32,
    symbol_sorts: usize,
    sym_table: [CodeSymbol; SYMBOL_SORTS],
}

impl Default for ProbModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbModel {
    pub fn new() -> Self {
        let mut sym_table = [CodeSymbol::default(); SYMBOL_SORTS];
        sym_table[0] = CodeSymbol {
            occurrences: 1,
            symbol: ESCAPE_CODE,
        };
        Self {
            total_count: 1,
            symbol_sorts: 1,
            sym_table,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    pub fn symbol_sorts(&self) -> usize {
        self.symbol_sorts
    }

    pub fn symbols(&self) -> &[CodeSymbol] {
        &self.sym_table[..self.symbol_sorts]
    }

    pub fn find_symbol(&self, symbol: i16) -> Option<usize> {
        self.symbols().iter().position(|s| s.symbol == symbol)
    }

    /// Registers `symbol` with a single occurrence and returns its index.
    /// Registering a known symbol returns the existing index untouched.
    pub fn add_symbol(&mut self, symbol: i16) -> Result<usize, HodokiError> {
        if let Some(index) = self.find_symbol(symbol) {
            return Ok(index);
        }
        if self.symbol_sorts >= SYMBOL_SORTS {
            return Err(HodokiError::AlphabetOverflow(SYMBOL_SORTS));
        }
        let index = self.symbol_sorts;
        self.sym_table[index] = CodeSymbol {
            occurrences: 1,
            symbol,
        };
        self.symbol_sorts += 1;
        self.total_count += 1;
        if self.total_count > TOTAL_LIMIT {
            self.half_occurrence_count();
        }
        Ok(index)
    }

    pub fn increase_symbol(&mut self, index: usize) -> Result<(), HodokiError> {
        if index >= self.symbol_sorts {
            return Err(HodokiError::OutOfRange {
                position: index as i64,
                size: self.symbol_sorts,
            });
        }
        self.sym_table[index].occurrences += 1;
        self.total_count += 1;
        if self.total_count > TOTAL_LIMIT {
            self.half_occurrence_count();
        }
        Ok(())
    }

    /// Halves every active count, never below one, so no symbol is forgotten.
    pub fn half_occurrence_count(&mut self) {
        let active = &mut self.sym_table[..self.symbol_sorts];
        self.total_count = active
            .iter_mut()
            .map(|entry| {
                entry.occurrences = (entry.occurrences >> 1).max(1);
                u32::from(entry.occurrences)
            })
            .sum();
    }
}
