//! Demo host: drives the demo device over a Unix socket.
//!
//! Run with:
//!   cargo run -p cmdlink --example host -- --socket /tmp/cmdlink-demo.sock

mod common;

use std::path::PathBuf;

use clap::Parser;
use cmdlink::messenger::{AckRequest, Messenger, MessengerConfig};
use cmdlink::transport::UnixLink;
use common::{ids, init_logging, LogFormat, LogLevel};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(about = "cmdlink demo host")]
struct Args {
    /// Socket path of a running device demo.
    #[arg(long, env = "CMDLINK_SOCKET", default_value = "/tmp/cmdlink-demo.sock")]
    socket: PathBuf,

    /// Acknowledgment timeout in milliseconds.
    #[arg(long, default_value_t = 1000)]
    timeout_ms: u64,

    /// Optional JSON messenger configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.log_format, args.log_level);

    let config = match &args.config {
        Some(path) => MessengerConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => MessengerConfig::default(),
    };
    let transport = UnixLink::connect(&args.socket)?;
    let mut host = Messenger::with_config(transport, config)?;
    host.print_lf_cr(true);

    let ack = AckRequest::new(ids::ACK, args.timeout_ms);
    for on in [true, false] {
        let acked = host.send_cmd_with(ids::SET_LED, &on, Some(ack))?;
        info!(on, acked, "set_led");
    }

    host.send_cmd_start(ids::ADD)?;
    host.send_cmd_float_arg(1.5, 2)?;
    host.send_cmd_sci_arg(2.25e6, 3)?;
    if host.send_cmd_end(Some(AckRequest::new(ids::SUM, args.timeout_ms)))? {
        info!(sum = host.args().read_f64(), "add");
    } else {
        warn!("no sum received");
    }

    host.send_cmd_start(ids::ECHO)?;
    host.send_cmd_esc_arg(b"not; a, frame/")?;
    if host.send_cmd_end(Some(AckRequest::new(ids::ECHO_REPLY, args.timeout_ms)))? {
        let echoed = String::from_utf8_lossy(host.args().read_unescaped()).into_owned();
        info!(%echoed, "escaped echo");
    }

    if host.send_bin_cmd(
        ids::SAMPLE,
        &4u16,
        Some(AckRequest::new(ids::SAMPLE_REPLY, args.timeout_ms)),
    )? {
        let mut samples = Vec::new();
        loop {
            let value = host.args().read_bin::<f32>();
            if !host.is_arg_ok() {
                break;
            }
            samples.push(value);
        }
        info!(?samples, "samples");
    }

    let acked = host.send_cmd(99, Some(ack))?;
    info!(acked, "unknown command");

    host.send_cmd(ids::BYE, Some(ack))?;
    Ok(())
}
