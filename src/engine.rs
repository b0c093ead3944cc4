//! Nonce search.
//!
//! A candidate is hashed as `SHA256(challenge || b64url(nonce))`, which is the
//! same byte string a verifier hashes when it digests the whole stamp.
use crate::bits::satisfies;
use crate::cancel::CancelFlag;
use crate::counter::BigCounter;
use crate::error::Error;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use derive_builder::Builder;
use flume::{Receiver, Sender};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

/// Attempts between two checks of the stop flags.
pub const CHECK_INTERVAL: u64 = 1024;

/// SHA-256 yields 256 bits; anything above can never be met.
pub const MAX_DIFFICULTY: u32 = 256;

/// A satisfying nonce and the number of hashes it took to find it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub nonce: BigCounter,
    pub attempts: u64,
}

/// Hash a challenge with one nonce candidate.
pub fn pow_hash(challenge: &[u8], nonce: &BigCounter) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(challenge);
    hasher.update(URL_SAFE_NO_PAD.encode(nonce.as_bytes()));
    hasher.finalize().into()
}

/// Search on the calling thread until a nonce is found. Never returns early.
pub fn search(challenge: &[u8], difficulty: u32) -> Solution {
    let mut attempts = 0;
    let nonce = scan(challenge, difficulty, 0, 1, &mut attempts, || false);
    // scan only gives up when asked to stop
    Solution {
        nonce: nonce.unwrap_or_default(),
        attempts,
    }
}

/// Search on the calling thread, giving up once `cancel` is set.
pub fn search_cancellable(
    challenge: &[u8],
    difficulty: u32,
    cancel: &CancelFlag,
) -> Result<Solution, Error> {
    let mut attempts = 0;
    match scan(challenge, difficulty, 0, 1, &mut attempts, || {
        cancel.is_cancelled()
    }) {
        Some(nonce) => Ok(Solution { nonce, attempts }),
        None => Err(Error::Cancelled),
    }
}

/// Walk counter values `start, start + stride, ...` until one satisfies `difficulty`
/// or `should_stop` returns true at a check point.
fn scan(
    challenge: &[u8],
    difficulty: u32,
    start: usize,
    stride: usize,
    attempts: &mut u64,
    should_stop: impl Fn() -> bool,
) -> Option<BigCounter> {
    let prefix = Sha256::new_with_prefix(challenge);
    let mut nonce = BigCounter::new();
    nonce.advance(start);
    let mut encoded = String::new();

    loop {
        if *attempts % CHECK_INTERVAL == 0 && should_stop() {
            return None;
        }
        encoded.clear();
        URL_SAFE_NO_PAD.encode_string(nonce.as_bytes(), &mut encoded);
        let mut hasher = prefix.clone();
        hasher.update(encoded.as_bytes());
        let hash: [u8; 32] = hasher.finalize().into();
        *attempts += 1;
        if satisfies(&hash, difficulty) {
            return Some(nonce);
        }
        nonce.advance(stride);
    }
}

/// Configurable, optionally multi-threaded nonce search.
///
/// With `threads > 1`, worker `i` scans counter values `i, i + threads, ...`
/// so workers never repeat each other's candidates. The first hit wins and
/// the rest are stopped; which worker wins is not deterministic.
#[derive(Builder, Debug, Clone)]
#[builder(pattern = "owned")]
pub struct SearchEngine {
    pub difficulty: u32,
    #[builder(default = "1")]
    pub threads: usize,
}

impl SearchEngine {
    fn validate(&self) -> Result<(), Error> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(Error::InvalidConfig(format!(
                "difficulty must be <= {MAX_DIFFICULTY}"
            )));
        }
        if self.threads == 0 {
            return Err(Error::InvalidConfig("threads must be >= 1".into()));
        }
        Ok(())
    }

    /// Find a nonce for `challenge`, honoring `cancel`.
    pub fn solve(&self, challenge: &[u8], cancel: &CancelFlag) -> Result<Solution, Error> {
        self.validate()?;
        let solution = if self.threads == 1 {
            search_cancellable(challenge, self.difficulty, cancel)?
        } else {
            solve_parallel(challenge, self.difficulty, self.threads, cancel)?
        };
        tracing::debug!(
            difficulty = self.difficulty,
            threads = self.threads,
            attempts = solution.attempts,
            nonce_len = solution.nonce.len(),
            "proof of work found"
        );
        Ok(solution)
    }
}

impl SearchEngineBuilder {
    fn validate(&self) -> Result<(), Error> {
        match self.difficulty {
            None => return Err(Error::InvalidConfig("difficulty must be provided".into())),
            Some(d) if d > MAX_DIFFICULTY => {
                return Err(Error::InvalidConfig(format!(
                    "difficulty must be <= {MAX_DIFFICULTY}"
                )))
            }
            Some(_) => {}
        }
        if self.threads == Some(0) {
            return Err(Error::InvalidConfig("threads must be >= 1".into()));
        }
        Ok(())
    }

    pub fn build_validated(self) -> Result<SearchEngine, Error> {
        self.validate()?;
        self.build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

fn solve_parallel(
    challenge: &[u8],
    difficulty: u32,
    threads: usize,
    cancel: &CancelFlag,
) -> Result<Solution, Error> {
    let challenge: Arc<[u8]> = Arc::from(challenge);
    let stop = CancelFlag::new();
    let attempts = Arc::new(AtomicU64::new(0));
    let (tx, rx): (Sender<BigCounter>, Receiver<BigCounter>) = flume::bounded(threads);
    let mut joins = Vec::with_capacity(threads);

    for start in 0..threads {
        let worker_challenge = challenge.clone();
        let worker_stop = stop.clone();
        let worker_cancel = cancel.clone();
        let worker_attempts = attempts.clone();
        let worker_tx = tx.clone();
        let join = thread::spawn(move || {
            worker_loop(
                &worker_challenge,
                difficulty,
                start,
                threads,
                worker_stop,
                worker_cancel,
                worker_attempts,
                worker_tx,
            );
        });
        joins.push(join);
    }
    drop(tx);

    let found = rx.recv();
    stop.cancel();
    join_handles(joins);
    let attempts = attempts.load(Ordering::SeqCst);

    match found {
        Ok(nonce) => Ok(Solution { nonce, attempts }),
        Err(_) if cancel.is_cancelled() => Err(Error::Cancelled),
        Err(_) => Err(Error::ChannelClosed),
    }
}

#[allow(clippy::too_many_arguments)]
fn worker_loop(
    challenge: &[u8],
    difficulty: u32,
    start: usize,
    stride: usize,
    stop: CancelFlag,
    cancel: CancelFlag,
    attempts: Arc<AtomicU64>,
    tx: Sender<BigCounter>,
) {
    let mut local = 0;
    let found = scan(challenge, difficulty, start, stride, &mut local, || {
        stop.is_cancelled() || cancel.is_cancelled()
    });
    attempts.fetch_add(local, Ordering::SeqCst);
    if let Some(nonce) = found {
        // capacity equals worker count, so this never blocks
        let _ = tx.send(nonce);
    }
}

fn join_handles(joins: Vec<thread::JoinHandle<()>>) {
    for handle in joins {
        let _ = handle.join();
    }
}
