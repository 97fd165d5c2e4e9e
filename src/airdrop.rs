use log::debug;
use std::collections::HashMap;
use std::io::Write;

use crate::error::Result;
use crate::table::KeyValueTable;

/// Running airdrop totals per owner address.
///
/// Per-id amounts are `i64`; totals are `i128` so summing many large tiers
/// cannot overflow, and saturate at the bounds if they ever would.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AirdropLedger {
    totals: HashMap<String, i128>,
}

impl AirdropLedger {
    /// Joins owner -> nft id -> rarity -> amount and sums per owner.
    ///
    /// An id without a rarity, a rarity without an amount, or an amount that
    /// is not an integer all contribute 0. The owner still gets a row.
    pub fn aggregate(
        id_to_owner: &KeyValueTable,
        id_to_rarity: &KeyValueTable,
        rarity_to_amount: &KeyValueTable,
    ) -> Self {
        let mut totals: HashMap<String, i128> = HashMap::new();
        for (nft_id, owner) in id_to_owner.iter() {
            let rarity = id_to_rarity.get_or_empty(nft_id);
            let amount_str = rarity_to_amount.get_or_empty(rarity);
            let amount = amount_str.parse::<i64>().unwrap_or_else(|e| {
                debug!("nft {nft_id}: amount {amount_str:?} for rarity {rarity:?} counted as 0 ({e})");
                0
            });
            let total = totals.entry(owner.to_string()).or_insert(0);
            *total = total.saturating_add(i128::from(amount));
        }
        Self { totals }
    }

    pub fn total_for(&self, owner: &str) -> Option<i128> {
        self.totals.get(owner).copied()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Rows sorted by owner so repeated runs diff cleanly.
    pub fn rows(&self) -> Vec<(&str, i128)> {
        let mut rows: Vec<_> = self.totals.iter().map(|(o, t)| (o.as_str(), *t)).collect();
        rows.sort_unstable_by(|a, b| a.0.cmp(b.0));
        rows
    }

    /// Writes `owner,total` lines, unquoted.
    pub fn write_to<W: Write>(&self, out: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(out);
        for (owner, total) in self.rows() {
            writer.write_record([owner, total.to_string().as_str()])?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}
