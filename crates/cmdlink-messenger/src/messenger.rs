use std::fmt;

use cmdlink_frame::{
    BinaryArg, CommandId, CommandWriter, FrameReader, MessageState, TextArg,
};
use cmdlink_transport::{Clock, SystemClock, Transport};
use tracing::{debug, trace, warn};

use crate::ack::{AckPoll, AckRequest, AckWait};
use crate::config::MessengerConfig;
use crate::error::Result;
use crate::handler::{CommandContext, Handler, HandlerRegistry};

/// Command engine bound to one transport.
///
/// Receiving is driven by the caller: each [`feed_in_serial_data`] drains
/// what the transport has ready and dispatches every completed command.
/// Sending builds one frame at a time, optionally followed by a bounded
/// wait for an acknowledgment. Receiving is paused while a frame is being
/// built, so a half-written command never interleaves with dispatch.
///
/// Nothing is shared between instances; several messengers can run side
/// by side on different transports.
///
/// [`feed_in_serial_data`]: Self::feed_in_serial_data
pub struct Messenger<T, C = SystemClock> {
    transport: T,
    clock: C,
    config: MessengerConfig,
    reader: FrameReader,
    writer: CommandWriter,
    intake: Box<[u8]>,
    handlers: HandlerRegistry,
    last_command_id: CommandId,
}

impl<T: Transport> Messenger<T, SystemClock> {
    /// Messenger with default configuration and the system clock.
    pub fn new(transport: T) -> Self {
        Self::build(transport, SystemClock::new(), MessengerConfig::default())
    }

    /// Messenger with explicit configuration and the system clock.
    pub fn with_config(transport: T, config: MessengerConfig) -> Result<Self> {
        Self::with_clock(transport, SystemClock::new(), config)
    }
}

impl<T: Transport, C: Clock> Messenger<T, C> {
    /// Messenger with explicit configuration and clock.
    pub fn with_clock(transport: T, clock: C, config: MessengerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(transport, clock, config))
    }

    fn build(transport: T, clock: C, config: MessengerConfig) -> Self {
        Self {
            reader: FrameReader::with_config(&config.frame),
            writer: CommandWriter::new(&config.frame),
            intake: vec![0u8; config.frame.stream_buffer_size.max(1)].into_boxed_slice(),
            handlers: HandlerRegistry::new(),
            last_command_id: 0,
            transport,
            clock,
            config,
        }
    }

    /// Set the handler for commands without a route of their own.
    pub fn attach<F>(&mut self, handler: F)
    where
        F: FnMut(&mut CommandContext<'_>) -> Result<()> + 'static,
    {
        self.handlers.set_default(Box::new(handler));
    }

    /// Route command `id` to `handler`.
    pub fn attach_command<F>(&mut self, id: CommandId, handler: F)
    where
        F: FnMut(&mut CommandContext<'_>) -> Result<()> + 'static,
    {
        self.handlers.insert(id, Box::new(handler));
    }

    /// Route command `id` to a handler object.
    pub fn attach_handler<H: Handler + 'static>(&mut self, id: CommandId, handler: H) {
        self.handlers.insert(id, Box::new(handler));
    }

    pub fn handlers_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.handlers
    }

    /// Append CR LF after every sent command.
    pub fn print_lf_cr(&mut self, enabled: bool) {
        self.writer.set_print_newlines(enabled);
    }

    /// Drain the transport and dispatch every completed command.
    ///
    /// Returns how many commands reached a handler. Does nothing while an
    /// outbound frame is being built.
    ///
    /// A failing handler does not cut the batch short: every byte already
    /// read is still fed and dispatched, and the first handler error is
    /// returned once the batch is done.
    pub fn feed_in_serial_data(&mut self) -> Result<usize> {
        let mut dispatched = 0;
        let mut first_err = None;
        while first_err.is_none() && !self.writer.is_building() {
            let ready = self.transport.available()?;
            if ready == 0 {
                break;
            }
            let want = ready.min(self.intake.len());
            let n = self.transport.read(&mut self.intake[..want])?;
            if n == 0 {
                break;
            }
            trace!(bytes = n, "read from transport");
            for i in 0..n {
                let byte = self.intake[i];
                if self.reader.feed(byte) != MessageState::FrameComplete {
                    continue;
                }
                match self.dispatch() {
                    Ok(true) => dispatched += 1,
                    Ok(false) => {}
                    Err(err) => {
                        dispatched += 1;
                        warn!(id = self.last_command_id, error = %err, "command handler failed");
                        first_err.get_or_insert(err);
                    }
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(dispatched),
        }
    }

    fn dispatch(&mut self) -> Result<bool> {
        let id = self.reader.read_i16();
        self.last_command_id = id;
        let Some(handler) = self.handlers.resolve(id) else {
            debug!(id, "no handler for command, skipping");
            return Ok(false);
        };
        trace!(id, "dispatching command");
        let mut ctx = CommandContext::new(
            id,
            &mut self.reader,
            &mut self.writer,
            &mut self.transport,
        );
        handler.handle(&mut ctx)?;
        Ok(true)
    }

    /// Id of the most recently received command.
    pub fn command_id(&self) -> CommandId {
        self.last_command_id
    }

    /// Arguments of the most recently completed frame: the last dispatched
    /// command, or the reply that satisfied an acknowledgment wait.
    pub fn args(&mut self) -> &mut FrameReader {
        &mut self.reader
    }

    pub fn is_arg_ok(&self) -> bool {
        self.reader.is_arg_ok()
    }

    /// Whether an outbound frame is open.
    pub fn is_sending(&self) -> bool {
        self.writer.is_building()
    }

    /// Acknowledgment with the configured default id and timeout.
    pub fn default_ack(&self) -> AckRequest {
        AckRequest::from_config(&self.config)
    }

    /// Open an outbound frame. Returns `false` if one is already open.
    pub fn send_cmd_start(&mut self, id: CommandId) -> Result<bool> {
        Ok(self.writer.start(&mut self.transport, id)?)
    }

    pub fn send_cmd_arg<A: TextArg + ?Sized>(&mut self, value: &A) -> Result<()> {
        Ok(self.writer.arg(&mut self.transport, value)?)
    }

    pub fn send_cmd_esc_arg(&mut self, bytes: &[u8]) -> Result<()> {
        Ok(self.writer.esc_arg(&mut self.transport, bytes)?)
    }

    pub fn send_cmd_fmt_arg(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        Ok(self.writer.fmt_arg(&mut self.transport, args)?)
    }

    pub fn send_cmd_float_arg(&mut self, value: f64, decimals: usize) -> Result<()> {
        Ok(self.writer.float_arg(&mut self.transport, value, decimals)?)
    }

    pub fn send_cmd_sci_arg(&mut self, value: f64, digits: u32) -> Result<()> {
        Ok(self.writer.sci_arg(&mut self.transport, value, digits)?)
    }

    pub fn send_cmd_bin_arg<B: BinaryArg>(&mut self, value: &B) -> Result<()> {
        Ok(self.writer.bin_arg(&mut self.transport, value)?)
    }

    /// Close the open frame and optionally wait for an acknowledgment.
    ///
    /// Returns `false` when no frame was open or when a requested
    /// acknowledgment did not arrive. Receiving resumes before the wait.
    pub fn send_cmd_end(&mut self, ack: Option<AckRequest>) -> Result<bool> {
        if !self.writer.end(&mut self.transport)? {
            return Ok(false);
        }
        match ack {
            None => Ok(true),
            Some(request) => self.blocked_till_reply(request.timeout_ms, request.id),
        }
    }

    /// Send a command without arguments.
    pub fn send_cmd(&mut self, id: CommandId, ack: Option<AckRequest>) -> Result<bool> {
        if !self.send_cmd_start(id)? {
            return Ok(false);
        }
        self.send_cmd_end(ack)
    }

    /// Send a command with one text argument.
    pub fn send_cmd_with<A: TextArg + ?Sized>(
        &mut self,
        id: CommandId,
        value: &A,
        ack: Option<AckRequest>,
    ) -> Result<bool> {
        if !self.send_cmd_start(id)? {
            return Ok(false);
        }
        self.send_cmd_arg(value)?;
        self.send_cmd_end(ack)
    }

    /// Send a command with one binary argument.
    pub fn send_bin_cmd<B: BinaryArg>(
        &mut self,
        id: CommandId,
        value: &B,
        ack: Option<AckRequest>,
    ) -> Result<bool> {
        if !self.send_cmd_start(id)? {
            return Ok(false);
        }
        self.send_cmd_bin_arg(value)?;
        self.send_cmd_end(ack)
    }

    /// Poll the transport until a frame led by `ack_id` arrives or
    /// `timeout_ms` elapses.
    ///
    /// Frames seen while waiting are consumed here and never dispatched.
    /// Must not be called from inside a handler.
    pub fn blocked_till_reply(&mut self, timeout_ms: u64, ack_id: CommandId) -> Result<bool> {
        let mut wait = AckWait::new(ack_id, timeout_ms, self.clock.now_millis())
            .on_mismatch(self.config.ack_mismatch)
            .strict_id(self.config.strict_ack_id);
        loop {
            let now = self.clock.now_millis();
            match wait.step(&mut self.reader, &mut self.transport, now)? {
                AckPoll::Pending => std::hint::spin_loop(),
                AckPoll::Acknowledged => {
                    self.last_command_id = ack_id;
                    return Ok(true);
                }
                AckPoll::Mismatched | AckPoll::TimedOut => return Ok(false),
            }
        }
    }

    pub fn config(&self) -> &MessengerConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Frames dropped for exceeding the receive buffer.
    pub fn dropped_frames(&self) -> u64 {
        self.reader.dropped_frames()
    }

    pub fn into_transport(self) -> T {
        self.transport
    }
}

impl<T: fmt::Debug, C> fmt::Debug for Messenger<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Messenger")
            .field("transport", &self.transport)
            .field("config", &self.config)
            .field("handlers", &self.handlers)
            .field("sending", &self.writer.is_building())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    use cmdlink_transport::{ManualClock, MemoryTransport};

    use super::*;
    use crate::config::AckMismatch;

    type Log = Rc<RefCell<Vec<String>>>;

    fn recording(log: &Log) -> impl FnMut(&mut CommandContext<'_>) -> Result<()> + 'static {
        let log = Rc::clone(log);
        move |ctx: &mut CommandContext<'_>| {
            let id = ctx.id();
            let arg = ctx.args().read_str().into_owned();
            log.borrow_mut().push(format!("{id}:{arg}"));
            Ok(())
        }
    }

    fn manual(link: MemoryTransport, clock: &ManualClock) -> Messenger<MemoryTransport, &ManualClock> {
        Messenger::with_clock(link, clock, MessengerConfig::default()).unwrap()
    }

    #[test]
    fn test_empty_frames_do_not_dispatch() {
        let link = MemoryTransport::new();
        link.push_incoming(b";;5,x;");
        let log = Log::default();
        let mut messenger = Messenger::new(link);
        messenger.attach(recording(&log));

        assert_eq!(messenger.feed_in_serial_data().unwrap(), 1);
        assert_eq!(*log.borrow(), vec!["5:x".to_string()]);
        assert_eq!(messenger.command_id(), 5);
    }

    #[test]
    fn test_failing_handler_keeps_rest_of_batch() {
        let link = MemoryTransport::new().with_read_limit(4);
        link.push_incoming(b"1;2;3;");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut messenger = Messenger::new(link);
        let log = Rc::clone(&seen);
        messenger.attach(move |ctx: &mut CommandContext<'_>| {
            log.borrow_mut().push(ctx.id());
            if ctx.id() == 1 {
                return Err(cmdlink_transport::TransportError::Closed.into());
            }
            Ok(())
        });

        let err = messenger.feed_in_serial_data().unwrap_err();
        assert!(matches!(err, crate::MessengerError::Transport(_)));
        assert_eq!(*seen.borrow(), vec![1, 2]);

        assert_eq!(messenger.feed_in_serial_data().unwrap(), 1);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
        assert_eq!(messenger.reader.pending(), 0);
    }

    #[test]
    fn test_routes_by_command_id() {
        let link = MemoryTransport::new().with_read_limit(3);
        link.push_incoming(b"1,a;2,b;3,c;");
        let routed = Log::default();
        let fallback = Log::default();
        let mut messenger = Messenger::new(link);
        messenger.attach_command(2, recording(&routed));
        messenger.attach(recording(&fallback));

        assert_eq!(messenger.feed_in_serial_data().unwrap(), 3);
        assert_eq!(*routed.borrow(), vec!["2:b".to_string()]);
        assert_eq!(*fallback.borrow(), vec!["1:a".to_string(), "3:c".to_string()]);
    }

    #[test]
    fn test_unrouted_commands_are_skipped() {
        let link = MemoryTransport::new();
        link.push_incoming(b"4;9;");
        let log = Log::default();
        let mut messenger = Messenger::new(link);
        messenger.attach_command(9, recording(&log));

        assert_eq!(messenger.feed_in_serial_data().unwrap(), 1);
        assert_eq!(messenger.command_id(), 9);
    }

    #[test]
    fn test_handlers_can_reply() {
        let link = MemoryTransport::new();
        link.push_incoming(b"20,7;");
        let mut messenger = Messenger::new(link);
        messenger.attach_command(20, |ctx: &mut CommandContext<'_>| {
            let n = ctx.args().read_i32();
            ctx.reply(21, &(n * n))?;
            Ok(())
        });

        messenger.feed_in_serial_data().unwrap();
        assert_eq!(messenger.transport().take_outgoing(), b"21,49;");
    }

    #[test]
    fn test_receiving_pauses_while_building() {
        let link = MemoryTransport::new();
        let log = Log::default();
        let mut messenger = Messenger::new(link);
        messenger.attach(recording(&log));

        assert!(messenger.send_cmd_start(3).unwrap());
        assert!(messenger.is_sending());
        messenger.transport().push_incoming(b"8,z;");
        assert_eq!(messenger.feed_in_serial_data().unwrap(), 0);
        assert_eq!(messenger.transport().pending_incoming(), 4);

        assert!(!messenger.send_cmd_start(4).unwrap());
        assert!(messenger.send_cmd_end(None).unwrap());
        assert_eq!(messenger.feed_in_serial_data().unwrap(), 1);
        assert_eq!(messenger.transport().take_outgoing(), b"3;");
    }

    #[test]
    fn test_nested_convenience_send_leaves_open_frame_alone() {
        let mut messenger = Messenger::new(MemoryTransport::new());
        messenger.send_cmd_start(1).unwrap();
        messenger.send_cmd_arg("a").unwrap();
        assert!(!messenger.send_cmd_with(2, "b", None).unwrap());
        assert!(messenger.is_sending());
        messenger.send_cmd_end(None).unwrap();
        assert_eq!(messenger.transport().take_outgoing(), b"1,a;");
    }

    #[test]
    fn test_send_api_writes_expected_bytes() {
        let mut messenger = Messenger::new(MemoryTransport::new());
        messenger.print_lf_cr(true);

        messenger.send_cmd(0, None).unwrap();
        messenger.send_cmd_with(10, "abc", None).unwrap();
        messenger.send_cmd_start(11).unwrap();
        messenger.send_cmd_esc_arg(b"x;y").unwrap();
        messenger.send_cmd_fmt_arg(format_args!("{:02}", 7)).unwrap();
        messenger.send_cmd_float_arg(0.5, 3).unwrap();
        messenger.send_cmd_sci_arg(-250.0, 1).unwrap();
        messenger.send_cmd_end(None).unwrap();
        messenger.send_bin_cmd(12, &1u8, None).unwrap();

        assert_eq!(
            messenger.transport().take_outgoing(),
            b"0;\r\n10,abc;\r\n11,x/;y,07,0.500,-2.5E+2;\r\n12,\x01;\r\n".to_vec()
        );
    }

    #[test]
    fn test_ack_arrives_and_reply_args_are_readable() {
        let clock = ManualClock::stepping(0, 1);
        let link = MemoryTransport::new();
        link.push_incoming(b"6,pong,3;");
        let mut messenger = manual(link, &clock);

        assert!(messenger
            .send_cmd_with(5, "ping", Some(AckRequest::new(6, 100)))
            .unwrap());
        assert_eq!(messenger.args().read_str(), "pong");
        assert_eq!(messenger.args().read_i16(), 3);
        assert_eq!(messenger.command_id(), 6);
        assert_eq!(messenger.transport().take_outgoing(), b"5,ping;");
    }

    #[test]
    fn test_mismatched_reply_fails_immediately() {
        let clock = ManualClock::stepping(0, 1);
        let link = MemoryTransport::new();
        link.push_incoming(b"9;1;");
        let mut messenger = manual(link, &clock);

        assert!(!messenger.send_cmd(5, Some(AckRequest::new(1, 100))).unwrap());
        assert!(clock.peek() < 10, "gave up at the first frame");
        assert_eq!(messenger.transport().pending_incoming(), 2);
    }

    #[test]
    fn test_skip_policy_finds_a_later_ack() {
        let clock = ManualClock::stepping(0, 1);
        let link = MemoryTransport::new();
        link.push_incoming(b"9;1;");
        let config = MessengerConfig {
            ack_mismatch: AckMismatch::Skip,
            ..MessengerConfig::default()
        };
        let mut messenger = Messenger::with_clock(link, &clock, config).unwrap();

        assert!(messenger.send_cmd(5, Some(messenger.default_ack())).unwrap());
    }

    #[test]
    fn test_silent_peer_times_out_on_manual_clock() {
        let clock = ManualClock::stepping(0, 1);
        let mut messenger = manual(MemoryTransport::new(), &clock);

        assert!(!messenger.blocked_till_reply(100, 1).unwrap());
        let elapsed = clock.peek();
        assert!((100..=102).contains(&elapsed), "elapsed {elapsed}");
    }

    #[test]
    fn test_silent_peer_times_out_on_system_clock() {
        let mut messenger = Messenger::new(MemoryTransport::new());
        let started = Instant::now();
        assert!(!messenger.blocked_till_reply(100, 1).unwrap());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(99), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(500), "elapsed {elapsed:?}");
    }

    #[test]
    fn test_strict_ack_id_rejects_garbage() {
        let clock = ManualClock::stepping(0, 1);
        let link = MemoryTransport::new();
        link.push_incoming(b"abc;");
        let config = MessengerConfig {
            strict_ack_id: true,
            ..MessengerConfig::default()
        };
        let mut messenger = Messenger::with_clock(link, &clock, config).unwrap();
        assert!(!messenger.blocked_till_reply(100, 0).unwrap());

        let mut lenient = manual(MemoryTransport::new(), &clock);
        lenient.transport().push_incoming(b"abc;");
        assert!(lenient.blocked_till_reply(100, 0).unwrap());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = MessengerConfig::default();
        config.frame.command_buffer_size = 1;
        assert!(Messenger::with_config(MemoryTransport::new(), config).is_err());
    }
}
