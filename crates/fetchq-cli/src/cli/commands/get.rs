//! `fetchq get` – download URLs through one admission controller.

use anyhow::{Context, Result};
use fetchq_core::config::FetchqConfig;
use fetchq_core::transport::{AcceptContentTypes, CurlTransport, Decode, RawBody, Sha256Body};
use fetchq_core::{AdmissionController, Outcome, Prioritization, TaskHandle};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::cli::output;

/// Command-line overrides for `get`.
#[derive(Debug, Default)]
pub struct GetOptions {
    pub max_active: Option<usize>,
    pub order: Option<Prioritization>,
    pub output_dir: Option<PathBuf>,
    pub sha256: bool,
    pub accept: Vec<String>,
}

pub async fn run_get(cfg: &FetchqConfig, urls: &[String], opts: GetOptions) -> Result<()> {
    let max_active = opts.max_active.unwrap_or(cfg.max_active_downloads);
    if max_active == 0 {
        anyhow::bail!("--max-active must be at least 1");
    }
    let order = opts.order.unwrap_or(cfg.prioritization);
    let controller = AdmissionController::new(max_active, order);
    let transport = CurlTransport::new(cfg.transport_config());
    let accept = if opts.accept.is_empty() {
        vec!["*/*".to_string()]
    } else {
        opts.accept
    };
    tracing::info!(max_active, %order, count = urls.len(), "starting downloads");

    let started = Instant::now();
    let report_failures = Arc::new(AtomicUsize::new(0));
    let handles = if opts.sha256 {
        let decoder = AcceptContentTypes::new(&accept, Sha256Body);
        submit_all(
            &controller,
            &transport,
            urls,
            decoder,
            Arc::clone(&report_failures),
            |_, digest| Ok(format!("{}  {} ({} bytes)", digest.sha256, digest.url, digest.len)),
        )?
    } else {
        let dir = opts.output_dir.clone();
        if let Some(dir) = &dir {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        let names = output::file_names(urls);
        let decoder = AcceptContentTypes::new(&accept, RawBody);
        submit_all(
            &controller,
            &transport,
            urls,
            decoder,
            Arc::clone(&report_failures),
            move |index, resp| match &dir {
                Some(dir) => {
                    let path = dir.join(&names[index]);
                    fs::write(&path, &resp.body)
                        .with_context(|| format!("write {}", path.display()))?;
                    Ok(format!(
                        "{} -> {} ({} bytes)",
                        resp.url,
                        path.display(),
                        resp.body.len()
                    ))
                }
                None => Ok(format!(
                    "{} ({} bytes, {})",
                    resp.url,
                    resp.body.len(),
                    resp.content_type.as_deref().unwrap_or("unknown type")
                )),
            },
        )?
    };

    let mut failed = 0usize;
    for handle in &handles {
        if handle.finished().await == Outcome::Failure {
            failed += 1;
        }
    }
    failed += report_failures.load(Ordering::Relaxed);

    tracing::info!(
        failed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "downloads finished"
    );
    if failed > 0 {
        anyhow::bail!("{} of {} download(s) failed", failed, urls.len());
    }
    println!("{} download(s) completed in {:.1}s", urls.len(), started.elapsed().as_secs_f64());
    Ok(())
}

/// Validate every URL, then submit them all. `report` runs on the transport
/// thread with the decoded payload and returns the line to print.
fn submit_all<D, R>(
    controller: &AdmissionController,
    transport: &CurlTransport,
    urls: &[String],
    decoder: D,
    report_failures: Arc<AtomicUsize>,
    report: R,
) -> Result<Vec<TaskHandle>>
where
    D: Decode + Clone,
    R: Fn(usize, D::Output) -> Result<String> + Send + Sync + 'static,
{
    let ops = urls
        .iter()
        .map(|url| transport.request(url, decoder.clone()))
        .collect::<Result<Vec<_>>>()?;

    let report = Arc::new(report);
    let mut handles = Vec::with_capacity(ops.len());
    for (index, op) in ops.into_iter().enumerate() {
        let url = op.url().to_string();
        let failed_url = url.clone();
        let report = Arc::clone(&report);
        let report_failures = Arc::clone(&report_failures);
        handles.push(controller.submit(
            op,
            move |payload| match (*report)(index, payload) {
                Ok(line) => println!("{}", line),
                Err(e) => {
                    report_failures.fetch_add(1, Ordering::Relaxed);
                    eprintln!("{}: {:#}", url, e);
                }
            },
            move |err| eprintln!("{}: {}", failed_url, err),
        ));
    }
    Ok(handles)
}
