use std::fs::File;
use std::time::Duration;

use chanlink_channel::{Channel, ChannelConfig, Deadline, Handle, Signals};
use serde::Serialize;

use crate::cmd::DoctorArgs;
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;

const CHECK_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Info,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    detail: String,
}

impl CheckResult {
    fn from_outcome(name: &str, outcome: Result<String, String>) -> Self {
        let (status, detail) = match outcome {
            Ok(detail) => (CheckStatus::Pass, detail),
            Err(detail) => (CheckStatus::Fail, detail),
        };
        Self {
            name: name.to_string(),
            status,
            detail,
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(_args: DoctorArgs, format: OutputFormat) -> CliResult<i32> {
    let checks = vec![
        CheckResult::from_outcome("channel_pair", channel_pair_check()),
        CheckResult::from_outcome("handle_passing", handle_passing_check()),
        CheckResult::from_outcome("peer_closed_signal", peer_closed_check()),
        channel_limits_check(),
    ];

    let has_fail = checks.iter().any(|c| matches!(c.status, CheckStatus::Fail));
    let output = DoctorOutput {
        checks,
        overall: if has_fail { "fail" } else { "pass" },
    };

    print_doctor(&output, format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn channel_pair_check() -> Result<String, String> {
    let (left, right) = Channel::create().map_err(|err| format!("socketpair failed: {err}"))?;
    left.write(b"doctor", &mut Vec::new())
        .map_err(|err| format!("write failed: {err}"))?;
    right
        .wait_one(Signals::READABLE, Deadline::after(CHECK_TIMEOUT))
        .map_err(|err| format!("wait failed: {err}"))?;

    let mut bytes = Vec::new();
    right
        .read(&mut bytes, &mut Vec::new())
        .map_err(|err| format!("read failed: {err}"))?;
    if bytes != b"doctor" {
        return Err("payload corrupted in transit".to_string());
    }
    Ok("seqpacket socket pair round trip succeeded".to_string())
}

fn handle_passing_check() -> Result<String, String> {
    let (left, right) = Channel::create().map_err(|err| format!("socketpair failed: {err}"))?;
    let file = File::open("/dev/null").map_err(|err| format!("open /dev/null failed: {err}"))?;

    left.write(b"", &mut vec![Handle::from(file)])
        .map_err(|err| format!("write with handle failed: {err}"))?;

    let mut handles = Vec::new();
    right
        .read(&mut Vec::new(), &mut handles)
        .map_err(|err| format!("read with handle failed: {err}"))?;
    if handles.len() != 1 {
        return Err(format!("expected 1 handle, received {}", handles.len()));
    }
    Ok("SCM_RIGHTS descriptor transfer succeeded".to_string())
}

fn peer_closed_check() -> Result<String, String> {
    let (left, right) = Channel::create().map_err(|err| format!("socketpair failed: {err}"))?;
    drop(left);

    let signals = right
        .wait_one(
            Signals::READABLE | Signals::PEER_CLOSED,
            Deadline::after(CHECK_TIMEOUT),
        )
        .map_err(|err| format!("wait failed: {err}"))?;
    if signals != Signals::PEER_CLOSED {
        return Err(format!("unexpected signals after close: {signals:?}"));
    }
    Ok("peer closure observed without spurious readability".to_string())
}

fn channel_limits_check() -> CheckResult {
    let config = ChannelConfig::default();
    CheckResult {
        name: "channel_limits".to_string(),
        status: CheckStatus::Info,
        detail: format!(
            "max_message_bytes={}, max_message_handles={}",
            config.max_message_bytes, config.max_message_handles
        ),
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("chanlink doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<20} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Info => "INFO",
    }
}
