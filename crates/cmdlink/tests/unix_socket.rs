#![cfg(unix)]

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use cmdlink::messenger::{AckRequest, CommandContext, Messenger, MessengerError};
use cmdlink::transport::{StreamTransport, TransportError, UnixLink};

const ACK: i16 = 1;
const INCREMENT: i16 = 3;
const ECHO: i16 = 6;
const BYE: i16 = 10;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/cmdlink-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

/// Serve until BYE or a few seconds pass. Returns how many commands were handled.
fn run_device(transport: StreamTransport) -> cmdlink::messenger::Result<usize> {
    let mut device = Messenger::new(transport);
    let running = Rc::new(Cell::new(true));

    device.attach_command(INCREMENT, |ctx: &mut CommandContext<'_>| {
        let value = ctx.args().read_i32();
        ctx.reply(ACK, &(value + 1))?;
        Ok(())
    });
    device.attach_command(ECHO, |ctx: &mut CommandContext<'_>| {
        let text = ctx.args().read_unescaped().to_vec();
        ctx.send_cmd_start(ACK)?;
        ctx.send_cmd_esc_arg(&text)?;
        ctx.send_cmd_end()?;
        Ok(())
    });
    let flag = Rc::clone(&running);
    device.attach_command(BYE, move |ctx: &mut CommandContext<'_>| {
        flag.set(false);
        ctx.reply_id(ACK)?;
        Ok(())
    });

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut handled = 0;
    while running.get() && Instant::now() < deadline {
        let n = device.feed_in_serial_data()?;
        if n == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        handled += n;
    }
    Ok(handled)
}

fn exercise_host(transport: StreamTransport) {
    let mut host = Messenger::new(transport);
    let ack = AckRequest::new(ACK, 2000);

    assert!(host
        .send_cmd_with(INCREMENT, &41, Some(ack))
        .expect("increment"));
    assert_eq!(host.args().read_i32(), 42);

    host.send_cmd_start(ECHO).expect("start");
    host.send_cmd_esc_arg(b"semi;colon,comma//slash").expect("arg");
    assert!(host.send_cmd_end(Some(ack)).expect("echo"));
    assert_eq!(host.args().read_unescaped(), b"semi;colon,comma//slash");

    assert!(host.send_cmd(BYE, Some(ack)).expect("bye"));
}

#[test]
fn test_socket_pair_request_reply() {
    let (device_link, host_link) = StreamTransport::pair().expect("pair");
    let device = thread::spawn(move || run_device(device_link));

    exercise_host(host_link);
    assert_eq!(device.join().expect("device thread").expect("device"), 3);
}

#[test]
fn test_bound_socket_request_reply() {
    let dir = unique_temp_dir("bound");
    let path = dir.join("device.sock");
    let link = UnixLink::bind(&path).expect("bind");

    let device = thread::spawn(move || {
        let transport = link.accept().expect("accept");
        run_device(transport)
    });

    let host_link = UnixLink::connect(&path).expect("connect");
    exercise_host(host_link);
    assert_eq!(device.join().expect("device thread").expect("device"), 3);
    assert!(!path.exists(), "socket removed when the link drops");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_silent_device_times_out() {
    let (_device_link, host_link) = StreamTransport::pair().expect("pair");
    let mut host = Messenger::new(host_link);

    let started = Instant::now();
    assert!(!host
        .send_cmd(INCREMENT, Some(AckRequest::new(ACK, 100)))
        .expect("send"));
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(99), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1000), "elapsed {elapsed:?}");
}

#[test]
fn test_device_sees_host_hangup() {
    let (device_link, host_link) = StreamTransport::pair().expect("pair");
    let mut device = Messenger::new(device_link);
    drop(host_link);

    let err = device.feed_in_serial_data().unwrap_err();
    assert!(matches!(
        err,
        MessengerError::Transport(TransportError::Closed)
    ));
}
