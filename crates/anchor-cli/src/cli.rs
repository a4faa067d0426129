use clap::Parser;

use anchor_service::AnchorMode;

#[derive(Parser)]
#[command(
    name = "anchor-bench",
    about = "anchor — ledger-anchored document auditing, batching benchmark runner",
    version,
)]
pub struct Args {
    /// How document hashes reach the ledger
    #[arg(long, value_enum, default_value = "batched")]
    pub mode: Mode,

    /// Number of concurrent worker tasks
    #[arg(short, long, default_value_t = 1)]
    pub workers: usize,

    /// Total number of documents to process
    #[arg(short, long, default_value_t = 10)]
    pub count: usize,

    /// Size of each generated document, in bytes
    #[arg(long, default_value_t = 1024 * 1024)]
    pub payload_size: usize,

    /// Leaves per batch (batched mode)
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Flush deadline in milliseconds (batched mode)
    #[arg(long, default_value_t = 25)]
    pub max_wait_ms: u64,

    /// Simulated ledger write latency in milliseconds
    #[arg(long, default_value_t = 200)]
    pub ledger_delay_ms: u64,

    /// Output CSV path (defaults to results_<mode>_w<workers>_c<count>.csv)
    #[arg(long)]
    pub out: Option<String>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum Mode {
    /// No ledger interaction (pipeline baseline)
    Baseline,
    /// One ledger write per document
    Direct,
    /// One ledger write per Merkle batch
    Batched,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Direct => "direct",
            Self::Batched => "batched",
        }
    }
}

impl From<Mode> for AnchorMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Baseline => Self::Baseline,
            Mode::Direct => Self::Direct,
            Mode::Batched => Self::Batched,
        }
    }
}
