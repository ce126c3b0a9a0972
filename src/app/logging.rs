//! Progress logging utilities.

use log::info;

/// Logs batch progress.
///
/// # Arguments
///
/// * `start_time` - The start time of processing
/// * `completed` - URLs finished so far
/// * `total` - URLs in the batch
pub fn log_progress(start_time: std::time::Instant, completed: usize, total: usize) {
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    let rate = if elapsed_secs > 0.0 {
        completed as f64 / elapsed_secs
    } else {
        0.0
    };
    info!(
        "Scanned {completed}/{total} URLs in {elapsed_secs:.2} seconds (~{rate:.2} URLs/sec)"
    );
}
