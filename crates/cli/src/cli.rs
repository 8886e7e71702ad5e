use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "certproof",
    about = "Issue and verify ledger-anchored certificates",
    long_about = "Fingerprint certificate fields, record the fingerprint on a registry contract, \
                  and verify certificates from their QR proof."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output machine-readable JSON to stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose logging (debug level unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML configuration file
    #[arg(long, global = true, env = "CERTPROOF_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the per-field hashes and the fingerprint of a certificate
    Fingerprint {
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Record a certificate on the ledger and produce its proof
    Issue {
        #[command(flatten)]
        fields: FieldArgs,

        #[command(flatten)]
        ledger: LedgerArgs,

        /// Write the proof QR code as PNG to this path
        #[arg(long)]
        qr_out: Option<PathBuf>,

        /// Certificate PDF to embed the proof into
        #[arg(long)]
        pdf: Option<PathBuf>,

        /// Output path for the PDF with embedded proof (default: <pdf>_certified.pdf)
        #[arg(short, long, requires = "pdf")]
        output: Option<PathBuf>,
    },

    /// Verify a certificate PDF (embedded proof) or an image of its QR code
    Verify {
        /// Path to the certificate PDF or QR image
        input: PathBuf,

        #[command(flatten)]
        ledger: LedgerArgs,
    },

    /// Serve the issue/verify HTTP API
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(long, env = "CERTPROOF_BIND")]
        bind: Option<String>,

        #[command(flatten)]
        ledger: LedgerArgs,
    },
}

/// Certificate fields, from a JSON file or individual flags.
#[derive(Args, Debug, Clone, Default)]
pub struct FieldArgs {
    /// JSON file with Certificate_Number, name, courseName, Grant_Date, Expiration_Date
    #[arg(long, conflicts_with_all = ["number", "name", "course", "grant_date", "expiration_date"])]
    pub fields: Option<PathBuf>,

    /// Certificate number
    #[arg(long)]
    pub number: Option<String>,

    /// Holder name
    #[arg(long)]
    pub name: Option<String>,

    /// Course name
    #[arg(long)]
    pub course: Option<String>,

    /// Grant date
    #[arg(long)]
    pub grant_date: Option<String>,

    /// Expiration date
    #[arg(long)]
    pub expiration_date: Option<String>,
}

/// Ledger selection and overrides.
#[derive(Args, Debug, Clone)]
pub struct LedgerArgs {
    /// Ledger backend to use
    #[arg(long, value_enum, default_value = "rpc")]
    pub ledger: LedgerKind,

    /// JSON-RPC endpoint (overrides ledger.rpc_url)
    #[arg(long, env = "CERTPROOF_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Registry contract address (overrides ledger.contract_address)
    #[arg(long)]
    pub contract: Option<String>,

    /// Node-managed sender account for writes (overrides ledger.from_address)
    #[arg(long)]
    pub from: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LedgerKind {
    /// Registry contract over Ethereum JSON-RPC
    Rpc,
    /// In-process ledger (state is lost on exit)
    Memory,
}
