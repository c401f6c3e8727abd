//! Two messengers talking over an in-memory link on one thread.
//!
//! Run with:
//!   cargo run -p cmdlink --example loopback -- --value 2.5 --value 40

mod common;

use clap::Parser;
use cmdlink::frame::format_sci;
use cmdlink::messenger::{CommandContext, Messenger};
use cmdlink::transport::MemoryTransport;
use common::{ids, init_logging, LogFormat, LogLevel};
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "cmdlink in-memory loopback demo")]
struct Args {
    /// Values the device adds up.
    #[arg(long = "value", default_values_t = [1.0, 2.0])]
    values: Vec<f64>,

    /// Text echoed through the device, escaped on the wire.
    #[arg(long, default_value = "a,b;c/d")]
    text: String,

    #[arg(long, value_enum, default_value_t = LogLevel::Debug)]
    log_level: LogLevel,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.log_format, args.log_level);

    let (device_link, host_link) = MemoryTransport::pair();
    let mut device = Messenger::new(device_link);
    let mut host = Messenger::new(host_link);

    device.attach_command(ids::ADD, |ctx: &mut CommandContext<'_>| {
        let mut sum = 0.0;
        while ctx.args().next() {
            sum += ctx.args().read_f64();
        }
        ctx.send_cmd_start(ids::SUM)?;
        ctx.send_cmd_sci_arg(sum, 3)?;
        ctx.send_cmd_end()?;
        Ok(())
    });
    device.attach_command(ids::ECHO, |ctx: &mut CommandContext<'_>| {
        let text = ctx.args().read_unescaped().to_vec();
        ctx.send_cmd_start(ids::ECHO_REPLY)?;
        ctx.send_cmd_esc_arg(&text)?;
        ctx.send_cmd_end()?;
        Ok(())
    });

    host.send_cmd_start(ids::ADD)?;
    for value in &args.values {
        host.send_cmd_arg(value)?;
    }
    host.send_cmd_end(None)?;
    info!(wire = %String::from_utf8_lossy(&host.transport().outgoing()), "host sent");

    device.feed_in_serial_data()?;
    if host.blocked_till_reply(100, ids::SUM)? {
        let sum = host.args().read_f64();
        info!(sum, formatted = %format_sci(sum, 3), "sum");
    }

    host.send_cmd_start(ids::ECHO)?;
    host.send_cmd_esc_arg(args.text.as_bytes())?;
    host.send_cmd_end(None)?;
    device.feed_in_serial_data()?;
    if host.blocked_till_reply(100, ids::ECHO_REPLY)? {
        let echoed = String::from_utf8_lossy(host.args().read_unescaped()).into_owned();
        info!(%echoed, matches = echoed == args.text, "echo");
    }
    Ok(())
}
