use ethers::abi::{Event, EventParam, ParamType, RawLog, Token};
use ethers::providers::{JsonRpcClient, Middleware, Provider};
use ethers::types::{Address, Filter, Log, H256, U256};
use ethers::utils::to_checksum;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Instant;

use crate::error::{Result, ToolError};
use crate::pagination::RetryPolicy;

pub const STAKE_EVENT: &str = "Stake";
pub const UNSTAKE_EVENT: &str = "UnStake";

/// Field order shared by both events.
const EVENT_FIELDS: [(&str, ParamType); 5] = [
    ("user", ParamType::Address),
    ("id", ParamType::Uint(256)),
    ("amount", ParamType::Uint(256)),
    ("startTime", ParamType::Uint(256)),
    ("duration", ParamType::Uint(256)),
];

/// The event ABI with the leading `indexed` params moved into topics.
fn event_abi(name: &str, indexed: usize) -> Event {
    Event {
        name: name.to_string(),
        inputs: EVENT_FIELDS
            .iter()
            .enumerate()
            .map(|(i, (field, kind))| EventParam {
                name: field.to_string(),
                kind: kind.clone(),
                indexed: i < indexed,
            })
            .collect(),
        anonymous: false,
    }
}

pub fn stake_topic() -> H256 {
    event_abi(STAKE_EVENT, 0).signature()
}

pub fn unstake_topic() -> H256 {
    event_abi(UNSTAKE_EVENT, 0).signature()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StakeStatus {
    Staked,
    Unstaked,
}

impl StakeStatus {
    /// Status column value, as the contract's `claimed` flag reads.
    pub fn code(&self) -> u8 {
        match self {
            StakeStatus::Staked => 1,
            StakeStatus::Unstaked => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeEvent {
    pub id: U256,
    pub user: Address,
    pub amount: U256,
    pub start_time: U256,
    pub duration: U256,
    pub status: StakeStatus,
}

impl StakeEvent {
    /// Decodes a `Stake` or `UnStake` log. Anything else is an error.
    pub fn from_log(log: &Log) -> Result<Self> {
        let topic = log.topics.first().copied();
        let (name, status) = match topic {
            Some(t) if t == stake_topic() => (STAKE_EVENT, StakeStatus::Staked),
            Some(t) if t == unstake_topic() => (UNSTAKE_EVENT, StakeStatus::Unstaked),
            _ => {
                return Err(ToolError::LogDecode {
                    event: "unknown",
                    tx: log.transaction_hash,
                    reason: format!("unexpected topic0 {topic:?}"),
                })
            }
        };
        let fail = |reason: String| ToolError::LogDecode {
            event: name,
            tx: log.transaction_hash,
            reason,
        };

        let indexed = log.topics.len() - 1;
        if indexed > EVENT_FIELDS.len() {
            return Err(fail(format!("{} topics", log.topics.len())));
        }
        let parsed = event_abi(name, indexed)
            .parse_log(RawLog {
                topics: log.topics.clone(),
                data: log.data.to_vec(),
            })
            .map_err(|e| fail(e.to_string()))?;

        let param = |field: &str| -> Result<Token> {
            parsed
                .params
                .iter()
                .find(|p| p.name == field)
                .map(|p| p.value.clone())
                .ok_or_else(|| fail(format!("missing {field}")))
        };
        let uint = |field: &str| -> Result<U256> {
            match param(field)? {
                Token::Uint(v) => Ok(v),
                other => Err(fail(format!("{field} is {other:?}"))),
            }
        };
        let user = match param("user")? {
            Token::Address(a) => a,
            other => return Err(fail(format!("user is {other:?}"))),
        };

        Ok(StakeEvent {
            id: uint("id")?,
            user,
            amount: uint("amount")?,
            start_time: uint("startTime")?,
            duration: uint("duration")?,
            status,
        })
    }
}

/// Stakes and unstakes seen so far, keyed by stake id. Later logs for the same
/// id replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct StakeBook {
    stakes: BTreeMap<U256, StakeEvent>,
    unstakes: BTreeMap<U256, StakeEvent>,
}

impl StakeBook {
    pub fn insert(&mut self, event: StakeEvent) {
        match event.status {
            StakeStatus::Staked => self.stakes.insert(event.id, event),
            StakeStatus::Unstaked => self.unstakes.insert(event.id, event),
        };
    }

    pub fn stake_count(&self) -> usize {
        self.stakes.len()
    }

    pub fn unstake_count(&self) -> usize {
        self.unstakes.len()
    }

    /// One record per staked id, ascending. An unstake only updates the
    /// status; ids that were never staked in range are dropped.
    pub fn reconcile(self) -> Vec<StakeEvent> {
        let StakeBook { stakes, unstakes } = self;
        stakes
            .into_values()
            .map(|mut stake| {
                if let Some(unstake) = unstakes.get(&stake.id) {
                    stake.status = unstake.status;
                }
                stake
            })
            .collect()
    }
}

/// Inclusive `[from, to]` windows of at most `size` blocks covering `start..=end`.
pub fn block_windows(start: u64, end: u64, size: u64) -> Result<Vec<(u64, u64)>> {
    if size == 0 {
        return Err(ToolError::InvalidConfig("block range size must be positive".into()));
    }
    let mut windows = Vec::new();
    let mut from = start;
    while from <= end {
        let to = from.saturating_add(size - 1).min(end);
        windows.push((from, to));
        if to == u64::MAX {
            break;
        }
        from = to + 1;
    }
    Ok(windows)
}

/// Anything that can answer `eth_getLogs`.
#[allow(async_fn_in_trait)]
pub trait LogSource {
    async fn logs(&self, filter: &Filter) -> Result<Vec<Log>>;
}

impl<P: JsonRpcClient> LogSource for Provider<P> {
    async fn logs(&self, filter: &Filter) -> Result<Vec<Log>> {
        self.get_logs(filter)
            .await
            .map_err(|e| ToolError::Rpc(e.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct StakeScanner {
    pub contract: Address,
    pub from_block: u64,
    pub to_block: u64,
    pub range: u64,
    pub policy: RetryPolicy,
    pub show_progress: bool,
}

impl StakeScanner {
    pub fn filter(&self, from: u64, to: u64) -> Filter {
        Filter::new()
            .address(self.contract)
            .topic0(vec![stake_topic(), unstake_topic()])
            .from_block(from)
            .to_block(to)
    }

    /// Queries every window in order, retrying failed queries, and decodes
    /// each log. A log that fails to decode ends the scan.
    pub async fn scan<L: LogSource>(&self, source: &L) -> Result<StakeBook> {
        let windows = block_windows(self.from_block, self.to_block, self.range)?;
        let started = Instant::now();

        let bar = if self.show_progress {
            ProgressBar::new(windows.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template("{elapsed_precise} [{bar:40}] {pos}/{len} windows {msg}")
                .map_err(|e| ToolError::InvalidConfig(e.to_string()))?,
        );

        let mut book = StakeBook::default();
        for (from, to) in windows {
            let filter = self.filter(from, to);
            let (logs, _) = self.policy.run(|| source.logs(&filter)).await?;
            bar.suspend(|| {
                info!("fromBlock = {from} and toBlock = {to} have {} logs", logs.len())
            });
            for log in &logs {
                book.insert(StakeEvent::from_log(log)?);
            }
            bar.inc(1);
        }
        bar.finish_with_message(format!(
            "{} stakes, {} unstakes",
            book.stake_count(),
            book.unstake_count()
        ));

        info!("elapsed time = {:?}", started.elapsed());
        Ok(book)
    }
}

/// Quoted CSV with a header row.
pub fn write_stake_report<W: Write>(events: &[StakeEvent], out: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(out);
    writer.write_record([
        "staking_id",
        "amount_raw",
        "start_time",
        "duration",
        "status",
        "address",
    ])?;
    for event in events {
        writer.write_record([
            event.id.to_string(),
            event.amount.to_string(),
            event.start_time.to_string(),
            event.duration.to_string(),
            event.status.code().to_string(),
            to_checksum(&event.user, None),
        ])?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}
