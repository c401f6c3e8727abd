//! Demo device: serves commands on a Unix socket until told to stop.
//!
//! Run with:
//!   cargo run -p cmdlink --example device -- --socket /tmp/cmdlink-demo.sock
//!
//! Then start the host demo against the same socket.

mod common;

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use cmdlink::messenger::{CommandContext, Messenger, MessengerError};
use cmdlink::transport::{TransportError, UnixLink};
use common::{ids, init_logging, LogFormat, LogLevel};
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "cmdlink demo device")]
struct Args {
    /// Socket path to listen on.
    #[arg(long, env = "CMDLINK_SOCKET", default_value = "/tmp/cmdlink-demo.sock")]
    socket: PathBuf,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.log_format, args.log_level);

    let link = UnixLink::bind(&args.socket)?;
    info!(path = %link.path().display(), "waiting for host");
    let transport = link.accept()?;
    info!("host connected");

    let mut device = Messenger::new(transport);
    device.print_lf_cr(true);

    device.attach_command(ids::SET_LED, |ctx: &mut CommandContext<'_>| {
        let on = ctx.args().read_bool();
        if !ctx.args().is_arg_ok() {
            ctx.reply(ids::ERROR, "set_led needs a state")?;
            return Ok(());
        }
        info!(on, "led");
        ctx.reply_id(ids::ACK)?;
        Ok(())
    });

    device.attach_command(ids::ADD, |ctx: &mut CommandContext<'_>| {
        let a = ctx.args().read_f64();
        let b = ctx.args().read_f64();
        ctx.send_cmd_start(ids::SUM)?;
        ctx.send_cmd_sci_arg(a + b, 4)?;
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

    device.attach_command(ids::SAMPLE, |ctx: &mut CommandContext<'_>| {
        let count = ctx.args().read_bin::<u16>();
        ctx.send_cmd_start(ids::SAMPLE_REPLY)?;
        for i in 0..count.min(8) {
            ctx.send_cmd_bin_arg(&(f32::from(i) * 0.25))?;
        }
        ctx.send_cmd_end()?;
        Ok(())
    });

    let running = Rc::new(Cell::new(true));
    let flag = Rc::clone(&running);
    device.attach_command(ids::BYE, move |ctx: &mut CommandContext<'_>| {
        flag.set(false);
        ctx.reply_id(ids::ACK)?;
        Ok(())
    });

    device.attach(|ctx: &mut CommandContext<'_>| {
        let id = ctx.id();
        ctx.reply(ids::ERROR, &format!("unknown command {id}"))?;
        Ok(())
    });

    while running.get() {
        match device.feed_in_serial_data() {
            Ok(0) => std::thread::sleep(Duration::from_millis(1)),
            Ok(_) => {}
            Err(MessengerError::Transport(TransportError::Closed)) => {
                info!(dropped = device.dropped_frames(), "host disconnected");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }
    }
    info!(dropped = device.dropped_frames(), "host said bye");
    Ok(())
}
