/*
 * Demo wiring for the logging pipeline
 *
 * Builds a deferred logger from logpipe.toml (defaults apply when the
 * file is absent), lets a few producer threads capture records while the
 * main thread pumps on a timer, then drains once more before exit so
 * nothing captured is lost.
 *
 * The pump runs inside a current-thread runtime, so ownership of the
 * drain stays with the main thread that bound it.
 */

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use liblogpipe::{log_err, log_err_caused, log_fine, log_info, log_warn, LogConfig};

fn main() -> liblogpipe::Result<()> {
    let config = LogConfig::from_file("logpipe.toml")?;
    let logger = Arc::new(config.build_deferred()?);
    logger.owner().bind()?;

    log_info!(logger, "pipeline up, mode %s, %d producers", "deferred", 3)?;
    if let Err(e) = std::fs::read_to_string("warmup.txt") {
        log_err_caused!(logger, e, "warmup file unavailable")?;
    }

    let mut producers = Vec::new();
    for worker in 0..3i64 {
        let logger = Arc::clone(&logger);
        producers.push(thread::spawn(move || {
            for tick in 0..20 {
                let _ = log_fine!(logger, "worker %d tick %02d", worker, tick);
                if tick % 5 == 0 {
                    let _ = log_info!(logger, "worker %d checkpoint at %d", worker, tick);
                }
                if tick == 13 && worker == 0 {
                    let _ = log_err!(logger, "worker %d lost its lease at tick %d", worker, tick);
                }
                thread::sleep(Duration::from_millis(25));
            }
            let _ = log_warn!(logger, "worker %d draining", worker);
        }));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(async {
        let mut ticker = tokio::time::interval(Duration::from_millis(100));
        while !producers.iter().all(|p| p.is_finished()) {
            ticker.tick().await;
            logger.pump()?;
        }
        liblogpipe::Result::Ok(())
    })?;

    for producer in producers {
        let _ = producer.join();
    }
    // final drain: producers may have captured after the last tick
    logger.pump()?;
    log_info!(logger, "pipeline down, %d records left behind", logger.pending())?;
    logger.pump()?;
    Ok(())
}
