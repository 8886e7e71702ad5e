//! Fingerprint, issue and verify commands.

use anyhow::{Context, Result, bail};
use certproof_core::{
    CertificateFields, ChainExtractor, FINGERPRINT_DIGEST, FINGERPRINT_SCHEME_VERSION,
    IssueOptions, Ledger, MemoryLedger, TrailerExtractor, build_fingerprint, decode_record,
    draft_proof_text, embed_proof, field_hashes, issue_certificate, split_pdf, verify_document,
};
use certproof_ledger::RpcLedger;
use certproof_qr::{QrImageExtractor, RenderOptions, ensure_fits, render_png};
use console::style;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::{FieldArgs, LedgerArgs, LedgerKind};
use crate::config::Config;
use crate::json::{FingerprintJson, IssueJson, VerifyJson};
use crate::util::{default_certified_output_path, read_input, spinner};

/// Build the ledger selected on the command line.
pub fn build_ledger(config: &Config, args: &LedgerArgs) -> Result<Arc<dyn Ledger>> {
    match args.ledger {
        LedgerKind::Memory => {
            tracing::warn!("Using in-memory ledger; issued certificates are lost on exit");
            Ok(Arc::new(MemoryLedger::new()))
        }
        LedgerKind::Rpc => {
            let endpoints = config.ledger_endpoints(args)?;
            tracing::debug!(
                rpc_url = %endpoints.rpc_url,
                contract = %endpoints.contract_address,
                "Using JSON-RPC ledger"
            );
            Ok(Arc::new(RpcLedger::new(endpoints)?))
        }
    }
}

/// Proof extraction order for documents: embedded trailer, then QR image.
pub fn document_extractor() -> ChainExtractor {
    ChainExtractor::new()
        .with(TrailerExtractor)
        .with(QrImageExtractor)
}

/// Certificate fields from a JSON file or the individual flags.
pub fn resolve_fields(args: &FieldArgs) -> Result<CertificateFields> {
    let value = match &args.fields {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read fields file: {}", path.display()))?;
            serde_json::from_str::<Value>(&content)
                .with_context(|| format!("Fields file is not valid JSON: {}", path.display()))?
        }
        None => {
            let mut object = Map::new();
            let flags = [
                ("Certificate_Number", &args.number),
                ("name", &args.name),
                ("courseName", &args.course),
                ("Grant_Date", &args.grant_date),
                ("Expiration_Date", &args.expiration_date),
            ];
            for (key, value) in flags {
                if let Some(value) = value {
                    object.insert(key.to_string(), Value::String(value.clone()));
                }
            }
            Value::Object(object)
        }
    };
    Ok(CertificateFields::from_json(&value)?)
}

pub fn fingerprint(fields: FieldArgs, json: bool) -> Result<()> {
    let fields = resolve_fields(&fields)?;
    let hashes = field_hashes(&fields);
    let fingerprint = build_fingerprint(&fields);

    if json {
        let payload = FingerprintJson {
            status: "ok",
            command: "fingerprint",
            scheme_version: FINGERPRINT_SCHEME_VERSION,
            algorithm: FINGERPRINT_DIGEST.name(),
            field_hashes: hashes,
            fingerprint: fingerprint.into_string(),
        };
        println!("{}", serde_json::to_string(&payload)?);
    } else {
        eprintln!("{}", style("==> Certificate fingerprint").cyan().bold());
        eprintln!("    {}", style(hashes.canonical_json()).dim());
        println!("{}", fingerprint);
    }
    Ok(())
}

pub struct IssueArgs {
    pub fields: FieldArgs,
    pub ledger: LedgerArgs,
    pub qr_out: Option<PathBuf>,
    pub pdf: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// Checks that must pass before anything is written to the ledger.
fn preflight(fields: &CertificateFields, pdf: Option<&[u8]>) -> Result<()> {
    let draft = draft_proof_text(fields)?;
    ensure_fits(&draft).context("Certificate details are too long to fit in a QR code")?;
    if let Some(data) = pdf {
        split_pdf(data).context("Input PDF cannot carry a proof")?;
    }
    Ok(())
}

pub fn issue(config: &Config, args: IssueArgs, json: bool) -> Result<()> {
    eprintln!("{}", style("==> Issuing certificate").cyan().bold());

    let fields = resolve_fields(&args.fields)?;
    let ledger = build_ledger(config, &args.ledger)?;
    let options = IssueOptions {
        explorer_tx_url: config.ledger.explorer_tx_url.clone(),
    };

    let pdf_data = match &args.pdf {
        Some(path) => Some(read_input(path, "PDF")?),
        None => None,
    };
    preflight(&fields, pdf_data.as_deref())?;

    let rt = tokio::runtime::Runtime::new()?;
    let progress = spinner("Recording certificate on ledger");
    let issued = rt.block_on(issue_certificate(&fields, ledger.as_ref(), &options));
    progress.finish_and_clear();
    let issued = issued.context("Certificate was not issued")?;

    eprintln!(
        "{} Recorded {}",
        style("[OK]").green().bold(),
        style(&issued.proof.certificate_hash).cyan()
    );
    eprintln!("    Ledger: {}", style(&issued.ledger_link).cyan());

    if let Some(qr_path) = &args.qr_out {
        let png = render_png(&issued.proof_text, &RenderOptions::default())?;
        write_output(qr_path, &png)?;
        eprintln!("    QR code: {}", style(qr_path.display()).cyan());
    }

    let output_path = match (&args.pdf, pdf_data) {
        (Some(input), Some(data)) => {
            let output = match &args.output {
                Some(path) => path.clone(),
                None => default_certified_output_path(input)?,
            };
            let certified = embed_proof(&data, &issued.proof_text)?;
            write_output(&output, &certified)?;
            eprintln!("    Certified PDF: {}", style(output.display()).cyan());
            Some(output)
        }
        _ => None,
    };

    eprintln!(
        "\n{} {}",
        style("[SUCCESS]").green().bold(),
        style("Certificate issued").green()
    );

    if json {
        let payload = IssueJson {
            status: "ok",
            command: "issue",
            details: issued.proof,
            proof_text: issued.proof_text,
            ledger_link: issued.ledger_link,
            qr_out: args.qr_out.map(|p| p.display().to_string()),
            output: output_path.map(|p| p.display().to_string()),
        };
        println!("{}", serde_json::to_string(&payload)?);
    } else {
        println!("{}", issued.proof_text);
    }
    Ok(())
}

/// Returns whether the certificate is valid.
pub fn verify(config: &Config, input: PathBuf, ledger: LedgerArgs, json: bool) -> Result<bool> {
    eprintln!("{}", style("==> Verifying certificate").cyan().bold());

    let data = read_input(&input, "certificate")?;
    let ledger = build_ledger(config, &ledger)?;
    let extractor = document_extractor();

    let rt = tokio::runtime::Runtime::new()?;
    let progress = spinner("Checking proof against ledger");
    let report = rt.block_on(verify_document(&data, &extractor, ledger.as_ref()));
    progress.finish_and_clear();

    if report.result.valid {
        eprintln!(
            "\n{} {}",
            style("[VALID]").green().bold(),
            style(&report.result.reason).green()
        );
    } else {
        eprintln!(
            "\n{} {}",
            style("[INVALID]").red().bold(),
            style(&report.result.reason).red()
        );
        if let Some(failure) = report.result.failure {
            tracing::info!(?failure, "Verification failed");
        }
    }
    let details = report.details_qr.as_deref().map(decode_record);
    if let Some(record) = &details {
        eprintln!("    Certificate Hash: {}", style(&record.certificate_hash).cyan());
        eprintln!("    Certificate Number: {}", style(&record.certificate_number).cyan());
        eprintln!("    Name: {}", record.name);
        eprintln!("    Course: {}", record.course_name);
        eprintln!("    Granted: {}  Expires: {}", record.grant_date, record.expiration_date);
        eprintln!("    Transaction: {}", style(&record.transaction_hash).dim());
    }

    let valid = report.result.valid;
    if json {
        let payload = VerifyJson {
            status: "ok",
            command: "verify",
            input: input.display().to_string(),
            valid,
            message: report.result.reason,
            failure: report.result.failure,
            details_qr: report.details_qr,
            details,
        };
        println!("{}", serde_json::to_string(&payload)?);
    } else {
        use std::io::IsTerminal;
        if !std::io::stdout().is_terminal() {
            println!("{}", if valid { "VALID" } else { "INVALID" });
        }
    }
    Ok(valid)
}

fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    if path.is_dir() {
        bail!("Output path is a directory: {}", path.display());
    }
    std::fs::write(path, data)
        .with_context(|| format!("Failed to write output file: {}", path.display()))
}
