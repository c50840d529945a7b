use std::fs::File;
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use chanlink_bindings::{ConnectorError, SynchronousConnector};
use chanlink_channel::{Channel, Handle, DEFAULT_MAX_MESSAGE_BYTES, DEFAULT_MAX_MESSAGE_HANDLES};
use chanlink_message::Message;

use crate::cmd::PingArgs;
use crate::exit::{
    channel_error, connector_error, io_error, CliError, CliResult, DATA_INVALID, INTERNAL,
    SUCCESS, USAGE,
};
use crate::output::{print_ping, OutputFormat, PingSummary};

pub fn run(args: PingArgs, format: OutputFormat) -> CliResult<i32> {
    validate(&args)?;

    let (local, remote) =
        Channel::create().map_err(|err| channel_error("channel create failed", err))?;
    let echo = thread::Builder::new()
        .name("echo-peer".to_string())
        .spawn(move || echo_peer(remote))
        .map_err(|err| io_error("echo peer spawn failed", err))?;

    let mut connector = SynchronousConnector::new(local);
    let payload = Bytes::from(pattern(args.size));
    let mut rtts = Vec::with_capacity(args.count);

    for seq in 0..args.count {
        let mut request = Message::new(payload.clone(), null_handles(args.handles)?);
        let mut reply = Message::default();

        let started = Instant::now();
        connector
            .call(&mut request, &mut reply)
            .map_err(|err| connector_error("round trip failed", err))?;
        rtts.push(started.elapsed());

        if reply.bytes() != &payload || reply.handles().len() != args.handles {
            return Err(CliError::new(
                DATA_INVALID,
                format!(
                    "echo mismatch at round trip {seq}: {} bytes + {} handles",
                    reply.len(),
                    reply.handles().len()
                ),
            ));
        }
        tracing::debug!(seq, rtt_us = rtts[seq].as_micros() as u64, "round trip complete");
    }

    // Closing our end lets the echo peer observe a clean termination.
    drop(connector);
    let served = echo
        .join()
        .map_err(|_| CliError::new(INTERNAL, "echo peer panicked"))?
        .map_err(|err| connector_error("echo peer failed", err))?;
    tracing::info!(served, "echo peer finished");

    print_ping(&summarize(&args, &rtts), format);
    Ok(SUCCESS)
}

fn validate(args: &PingArgs) -> CliResult<()> {
    if args.count == 0 {
        return Err(CliError::new(USAGE, "--count must be greater than zero"));
    }
    if args.size > DEFAULT_MAX_MESSAGE_BYTES {
        return Err(CliError::new(
            USAGE,
            format!("--size must be at most {DEFAULT_MAX_MESSAGE_BYTES} bytes"),
        ));
    }
    if args.handles > DEFAULT_MAX_MESSAGE_HANDLES {
        return Err(CliError::new(
            USAGE,
            format!("--handles must be at most {DEFAULT_MAX_MESSAGE_HANDLES}"),
        ));
    }
    Ok(())
}

/// Echo every message (payload and handles) back until the other side closes.
fn echo_peer(channel: Channel) -> Result<usize, ConnectorError> {
    let mut connector = SynchronousConnector::new(channel);
    let mut served = 0usize;
    loop {
        let mut message = Message::default();
        match connector.blocking_read(&mut message) {
            Ok(()) => {}
            Err(err) if err.is_peer_closed() => return Ok(served),
            Err(err) => return Err(err),
        }
        connector.write(&mut message)?;
        served += 1;
    }
}

fn null_handles(count: usize) -> CliResult<Vec<Handle>> {
    (0..count)
        .map(|_| {
            File::open("/dev/null")
                .map(Handle::from)
                .map_err(|err| io_error("open /dev/null failed", err))
        })
        .collect()
}

fn pattern(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

fn summarize(args: &PingArgs, rtts: &[Duration]) -> PingSummary {
    let total: Duration = rtts.iter().sum();
    let min = rtts.iter().min().copied().unwrap_or_default();
    let max = rtts.iter().max().copied().unwrap_or_default();
    let avg = total / rtts.len().max(1) as u32;

    PingSummary {
        round_trips: rtts.len(),
        payload_size: args.size,
        handles_per_message: args.handles,
        min_us: min.as_micros(),
        avg_us: avg.as_micros(),
        max_us: max.as_micros(),
        total_us: total.as_micros(),
    }
}
