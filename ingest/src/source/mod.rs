pub mod sheet;
pub mod xlsx;

pub use sheet::{Cell, Sheet, SheetBatch};
pub use xlsx::XlsxWorkbook;

use chrono::NaiveDate;
use common::Result;
use std::collections::BTreeMap;

/// Loads a dated multi-sheet source and filters every sheet down to the
/// rows matching one target date. Sheets with nothing for the date are
/// returned as empty batches; the caller decides whether to skip them.
pub trait SourceReader {
    fn load_for_date(&mut self, target: NaiveDate) -> Result<BTreeMap<String, SheetBatch>>;
}
