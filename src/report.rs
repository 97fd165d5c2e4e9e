use ethers::types::U256;
use log::warn;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{Result, ToolError};
use crate::pagination::RecordSink;
use crate::sources::{HolderItem, HolderRecord, TransactionItem};

/// Headerless, unquoted CSV file writer for the fetchers.
pub fn create_output(path: impl AsRef<Path>) -> Result<csv::Writer<File>> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv_writer(file))
}

pub fn csv_writer<W: Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(out)
}

fn flush<W: Write>(writer: &mut csv::Writer<W>) -> Result<()> {
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// `address,balance` rows.
pub struct HolderCsv<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> HolderCsv<W> {
    pub fn new(writer: csv::Writer<W>) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> csv::Writer<W> {
        self.writer
    }
}

impl<W: Write> RecordSink<HolderRecord> for HolderCsv<W> {
    fn write(&mut self, record: HolderRecord) -> Result<()> {
        self.writer
            .write_record([record.address.as_str(), record.balance.as_str()])?;
        Ok(())
    }

    fn end_page(&mut self) -> Result<()> {
        flush(&mut self.writer)
    }
}

impl<W: Write> RecordSink<HolderItem> for HolderCsv<W> {
    fn write(&mut self, item: HolderItem) -> Result<()> {
        RecordSink::<HolderRecord>::write(self, item.into())
    }

    fn end_page(&mut self) -> Result<()> {
        flush(&mut self.writer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionFeeRecord {
    pub hash: String,
    pub gas_used: String,
    pub gas_price: String,
    /// Fee exactly as reported.
    pub fee: String,
    pub running_total: U256,
}

impl TransactionFeeRecord {
    pub fn to_row(&self) -> [String; 5] {
        [
            self.hash.clone(),
            self.gas_used.clone(),
            self.gas_price.clone(),
            self.fee.clone(),
            self.running_total.to_string(),
        ]
    }
}

/// Cumulative gas fee over every transaction seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeLedger {
    total: U256,
}

impl FeeLedger {
    /// A fee that is not a decimal integer is written as reported but adds
    /// nothing to the total.
    pub fn record(&mut self, item: TransactionItem) -> TransactionFeeRecord {
        let fee = U256::from_dec_str(&item.fee.value).unwrap_or_else(|e| {
            warn!("tx {}: fee {:?} counted as 0 ({e})", item.hash, item.fee.value);
            U256::zero()
        });
        self.total = self.total.saturating_add(fee);
        TransactionFeeRecord {
            hash: item.hash,
            gas_used: item.gas_used,
            gas_price: item.gas_price,
            fee: item.fee.value,
            running_total: self.total,
        }
    }

    pub fn total(&self) -> U256 {
        self.total
    }
}

/// `hash,gas_used,gas_price,fee,running_total` rows.
pub struct FeeCsv<W: Write> {
    writer: csv::Writer<W>,
    ledger: FeeLedger,
}

impl<W: Write> FeeCsv<W> {
    pub fn new(writer: csv::Writer<W>) -> Self {
        Self {
            writer,
            ledger: FeeLedger::default(),
        }
    }

    pub fn total(&self) -> U256 {
        self.ledger.total()
    }

    pub fn into_inner(self) -> csv::Writer<W> {
        self.writer
    }
}

impl<W: Write> RecordSink<TransactionItem> for FeeCsv<W> {
    fn write(&mut self, item: TransactionItem) -> Result<()> {
        let record = self.ledger.record(item);
        self.writer.write_record(record.to_row())?;
        Ok(())
    }

    fn end_page(&mut self) -> Result<()> {
        flush(&mut self.writer)
    }
}
