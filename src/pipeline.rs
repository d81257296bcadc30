//! Batch driver: resolve, acquire and decode each SPN, then encode once.

use crate::error::{Error, Result};
use crate::format::{self, CrackFormat, EncodedOutput, FormatMismatch};
use crate::kerberos::{ticket, TicketAcquirer};
use crate::record::{BatchContext, CrackRecord, Principal, SkipReason, Skipped};
use crate::resolver::PrincipalResolver;
use crate::sink::Sink;
use log::{info, warn};
use std::sync::{Mutex, MutexGuard};
use std::thread;

pub struct RoastOptions {
    pub format: Option<CrackFormat>,
    pub sink: Sink,
    /// 1 processes SPNs strictly one after another.
    pub workers: usize,
}

impl Default for RoastOptions {
    fn default() -> Self {
        Self {
            format: None,
            sink: Sink::Return,
            workers: 1,
        }
    }
}

#[derive(Debug)]
pub struct Report {
    /// `None` when the output went to a file.
    pub output: Option<EncodedOutput>,
    pub records: usize,
    pub skipped: Vec<Skipped>,
    pub mismatches: Vec<FormatMismatch>,
}

impl Report {
    /// One line per SPN left out of the output, skips first.
    pub fn notices(&self) -> Vec<String> {
        self.skipped
            .iter()
            .map(|s| format!("{} skipped: {}", s.spn, s.reason))
            .chain(self.mismatches.iter().map(|m| format!("Not written: {}", m)))
            .collect()
    }
}

pub fn roast<I, R, A>(
    spns: I,
    resolver: &mut R,
    acquirer: &A,
    options: &RoastOptions,
) -> Result<Report>
where
    I: IntoIterator<Item = String>,
    R: PrincipalResolver + Send + ?Sized,
    A: TicketAcquirer + Sync + ?Sized,
{
    let batch = if options.workers > 1 {
        collect_pooled(spns.into_iter().collect(), resolver, acquirer, options.workers)
    } else {
        collect(spns, resolver, acquirer)
    };
    finish(batch, options.format, &options.sink)
}

/// Sequential run; each SPN is finished before the next one is pulled.
pub fn collect<I, R, A>(spns: I, resolver: &mut R, acquirer: &A) -> BatchContext
where
    I: IntoIterator<Item = String>,
    R: PrincipalResolver + ?Sized,
    A: TicketAcquirer + ?Sized,
{
    let mut batch = BatchContext::new();
    for (index, spn) in spns.into_iter().enumerate() {
        let outcome = process_spn(index, spn, |spn| resolver.resolve(spn), acquirer);
        push_outcome(&mut batch, outcome);
    }
    batch
}

/// Bounded worker pool. The resolver is shared behind a mutex; records are
/// put back in input order before returning.
pub fn collect_pooled<R, A>(
    spns: Vec<String>,
    resolver: &mut R,
    acquirer: &A,
    workers: usize,
) -> BatchContext
where
    R: PrincipalResolver + Send + ?Sized,
    A: TicketAcquirer + Sync + ?Sized,
{
    let workers = workers.clamp(1, spns.len().max(1));
    info!("Processing {} SPNs with {} workers", spns.len(), workers);

    let queue = Mutex::new(spns.into_iter().enumerate());
    let resolver = Mutex::new(resolver);
    let batch = Mutex::new(BatchContext::new());

    thread::scope(|s| {
        for _ in 0..workers {
            s.spawn(|| loop {
                let Some((index, spn)) = lock(&queue).next() else {
                    break;
                };
                let outcome = process_spn(index, spn, |spn| lock(&resolver).resolve(spn), acquirer);
                push_outcome(&mut lock(&batch), outcome);
            });
        }
    });

    let mut batch = batch.into_inner().unwrap_or_else(|e| e.into_inner());
    batch.sort_by_input();
    batch
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Resolve, acquire and decode one SPN.
pub fn process_spn<F, A>(
    index: usize,
    spn: String,
    resolve: F,
    acquirer: &A,
) -> std::result::Result<(usize, CrackRecord), Skipped>
where
    F: FnOnce(&str) -> Principal,
    A: TicketAcquirer + ?Sized,
{
    let principal = resolve(&spn);

    let raw = match acquirer.acquire(&spn) {
        Ok(raw) => raw,
        Err(e) => {
            return Err(Skipped {
                index,
                spn,
                reason: SkipReason::Acquire(e),
            })
        }
    };

    let (etype, payload) = match ticket::decode(&raw) {
        Ok(decoded) => decoded,
        Err(e) => {
            return Err(Skipped {
                index,
                spn,
                reason: SkipReason::Decode(e),
            })
        }
    };

    info!("Ticket for {} ({}, {})", spn, principal, etype);
    Ok((
        index,
        CrackRecord {
            spn,
            principal,
            etype,
            payload,
        },
    ))
}

fn push_outcome(batch: &mut BatchContext, outcome: std::result::Result<(usize, CrackRecord), Skipped>) {
    match outcome {
        Ok((index, record)) => batch.push_record(index, record),
        Err(skipped) => {
            info!("Skipping {}: {}", skipped.spn, skipped.reason);
            batch.push_skipped(skipped);
        }
    }
}

/// Encodes and delivers a finished batch; an empty batch is an error.
pub fn finish(batch: BatchContext, format: Option<CrackFormat>, sink: &Sink) -> Result<Report> {
    if batch.record_count() == 0 {
        // No report reaches the caller, so the skips are surfaced here
        for skipped in batch.skipped() {
            warn!("{} skipped: {}", skipped.spn, skipped.reason);
        }
        info!("{} SPN(s) processed, all skipped", batch.seen());
        return Err(Error::EmptyBatch);
    }

    let (records, skipped) = batch.into_parts();
    let count = records.len();
    let encoding = format::encode(records, format);
    let output = sink.deliver(encoding.output)?;

    Ok(Report {
        output,
        records: count,
        skipped,
        mismatches: encoding.mismatches,
    })
}
