use crate::base::{BusLine, Channel, Error, Frame, Result};
use crate::config::BusConfig;
use crate::decoders::{decode_nak, decode_response, DecodedRecord};
use crate::protocol::{self, FrameFilter};
use crate::queue::{CommandQueue, Exchange, Outcome, QueuedCommand};
use crate::types::NakReply;
use crate::utils::to_hex;
use log::{error, trace, warn};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

/// Notifications published by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    /// A request went out on the line (first attempt or retry).
    CommandSent { request: Vec<u8> },
    ResponseReceived { request: Vec<u8>, response: Frame },
    NakReceived { request: Vec<u8>, nak: NakReply },
    /// No reply before the deadline; a BREAK reset follows. `retry` counts from 1.
    CommandTimedOut { request: Vec<u8>, retry: u32 },
    /// The command was given up.
    CommandFailed { request: Vec<u8> },
    /// A reply matched a decoder.
    Decoded(DecodedRecord),
    /// Both queues and the in-flight slot were emptied.
    QueueCleared,
}

/// Receiver of [`BusEvent`]s.
pub trait EventSink {
    fn publish(&mut self, event: BusEvent);
}

impl<F: FnMut(BusEvent)> EventSink for F {
    fn publish(&mut self, event: BusEvent) {
        self(event)
    }
}

/// Forwards events over an `mpsc` channel; a hung up receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelSink(pub Sender<BusEvent>);

impl EventSink for ChannelSink {
    fn publish(&mut self, event: BusEvent) {
        if self.0.send(event).is_err() {
            trace!("Event receiver gone, dropping event");
        }
    }
}

/// Position of the transmission state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Nothing in flight.
    Idle,
    /// Request written, waiting for the reply.
    Sending,
    /// Reply timed out, line about to be pulled into BREAK.
    BreakSet,
    /// Line held in BREAK.
    BreakReset,
    /// BREAK released, recovering before the resend.
    Retry,
}

/// Drives the bus: one command in flight, queue spacing, timeouts, BREAK
/// resets and bounded retries.
///
/// Call [`BusEngine::poll`] from the main loop. Spacing and the response
/// timeout are deadlines checked on each poll. The BREAK sequence is the one
/// place that blocks: on a timeout the poll holds the line low for
/// `break_duration`, releases it and waits `break_duration` again before the
/// resend, so the bus reset timing does not depend on how often `poll` runs.
///
/// # Example
/// ```ignore
/// let mut engine = BusEngine::new(Box::new(line), BusConfig::default(), |event| {
///     println!("{:?}", event);
/// });
/// engine.enqueue_normal(QueuedCommand::from_message(&cmds::read_sensor(0x05))?)?;
/// loop {
///     engine.poll()?;
/// }
/// ```
pub struct BusEngine<T: ?Sized> {
    channel: Channel<T>,
    queue: CommandQueue,
    config: BusConfig,
    state: QueueState,
    in_flight: Option<QueuedCommand>,
    retries: u32,
    deadline: Option<Instant>,
    last_exchange: Option<Instant>,
    last_reply: Option<Instant>,
    sink: Box<dyn EventSink>,
}

impl<T: ?Sized> BusEngine<T>
where
    T: BusLine,
{
    pub fn new<S>(line: Box<T>, config: BusConfig, sink: S) -> BusEngine<T>
    where
        S: EventSink + 'static,
    {
        trace!("Creating new BusEngine with {:?}", config);
        BusEngine {
            channel: Channel::new(line),
            queue: CommandQueue::new(config.priority_capacity, config.normal_capacity),
            config,
            state: QueueState::Idle,
            in_flight: None,
            retries: 0,
            deadline: None,
            last_exchange: None,
            last_reply: None,
            sink: Box::new(sink),
        }
    }

    pub fn enqueue_normal(&mut self, command: QueuedCommand) -> Result<()> {
        self.queue.push_normal(command)
    }

    pub fn enqueue_priority(&mut self, command: QueuedCommand) -> Result<()> {
        self.queue.push_priority(command)
    }

    /// Removes a waiting command; the in-flight one is not affected.
    pub fn remove(&mut self, request: &[u8]) -> bool {
        self.queue.remove(request)
    }

    /// `true` if the request is waiting in a queue or in flight.
    pub fn contains(&self, request: &[u8]) -> bool {
        self.queue.contains(request)
            || self
                .in_flight
                .as_ref()
                .map_or(false, |c| c.bytes() == request)
    }

    /// Empties both queues, drops the in-flight command and returns to Idle.
    pub fn clear(&mut self) {
        trace!("Clearing command queues");
        self.queue.clear();
        self.in_flight = None;
        if self.channel.is_break_active() {
            if let Err(e) = self.channel.clear_break() {
                warn!("Failed to release BREAK while clearing: {}", e);
            }
        }
        self.state = QueueState::Idle;
        self.retries = 0;
        self.deadline = None;
        self.sink.publish(BusEvent::QueueCleared);
    }

    pub fn is_idle(&self) -> bool {
        self.state == QueueState::Idle && self.in_flight.is_none() && self.queue.is_empty()
    }

    /// Waiting commands plus the one in flight.
    pub fn pending_count(&self) -> usize {
        self.queue.len() + self.in_flight.iter().count()
    }

    pub fn state(&self) -> QueueState {
        self.state
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: BusConfig) {
        self.queue
            .set_capacity(config.priority_capacity, config.normal_capacity);
        self.config = config;
    }

    pub fn set_timing(
        &mut self,
        queue_interval: Duration,
        response_timeout: Duration,
        break_duration: Duration,
    ) {
        self.config.queue_interval = queue_interval;
        self.config.response_timeout = response_timeout;
        self.config.break_duration = break_duration;
    }

    pub fn set_max_retries(&mut self, max_retries: u32) {
        self.config.max_retries = max_retries;
    }

    /// When the heater last answered a request, with a reply or a NAK.
    pub fn last_reply(&self) -> Option<Instant> {
        self.last_reply
    }

    /// Pulses BREAK to wake the heater: hold `break_duration`, release, wait
    /// `break_duration`. Skipped while a command is in flight.
    pub fn wake_up(&mut self) -> Result<()> {
        if self.in_flight.is_some() {
            trace!("Exchange in progress, skipping wake-up pulse");
            return Ok(());
        }
        trace!("Sending wake-up pulse");
        let hold = self.config.break_duration;
        self.channel.set_break()?;
        thread::sleep(hold);
        self.channel.clear_break()?;
        thread::sleep(hold);
        Ok(())
    }

    pub fn channel(&self) -> &Channel<T> {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut Channel<T> {
        &mut self.channel
    }

    pub fn poll(&mut self) -> Result<()> {
        self.poll_at(Instant::now())
    }

    /// Runs one step of the state machine as if the current time were `now`.
    pub fn poll_at(&mut self, now: Instant) -> Result<()> {
        self.channel.poll()?;
        match self.state {
            QueueState::Idle => self.dispatch_next(now),
            QueueState::Sending => self.check_response(now),
            QueueState::BreakSet => self.begin_break(now),
            QueueState::BreakReset => self.end_break(now),
            QueueState::Retry => self.retry(now),
        }
    }

    fn expired(&self, now: Instant) -> bool {
        self.deadline.map_or(true, |deadline| now >= deadline)
    }

    fn request(&self) -> Vec<u8> {
        self.in_flight
            .as_ref()
            .map(|c| c.bytes().to_vec())
            .unwrap_or_default()
    }

    fn dispatch_next(&mut self, now: Instant) -> Result<()> {
        if let Some(last) = self.last_exchange {
            if now.saturating_duration_since(last) < self.config.queue_interval {
                return Ok(());
            }
        }
        let command = match self.queue.pop() {
            Some(command) => command,
            None => return Ok(()),
        };
        trace!("Dispatching {:?}", command);
        self.retries = 0;
        self.in_flight = Some(command);
        self.transmit(now)
    }

    fn transmit(&mut self, now: Instant) -> Result<()> {
        let request = self.request();
        match self.channel.write_raw(&request) {
            Ok(_) => {
                self.sink.publish(BusEvent::CommandSent { request });
                self.state = QueueState::Sending;
                self.deadline = Some(now + self.config.response_timeout);
                Ok(())
            }
            Err(e) => {
                error!("Failed to send {}: {}", to_hex(&request), e);
                self.give_up(now);
                Err(e)
            }
        }
    }

    fn check_response(&mut self, now: Instant) -> Result<()> {
        let replies = self.channel.rx_frames().to_vec();
        for raw in replies.iter() {
            if let Some(outcome) = self.match_reply(&raw.bytes) {
                self.complete(outcome, now);
                return Ok(());
            }
        }
        if self.expired(now) {
            let request = self.request();
            warn!(
                "No reply to {} (attempt {})",
                to_hex(&request),
                self.retries + 1
            );
            self.sink.publish(BusEvent::CommandTimedOut {
                request,
                retry: self.retries + 1,
            });
            self.state = QueueState::BreakSet;
            return self.begin_break(now);
        }
        Ok(())
    }

    /// Validates a heater frame against the in-flight command.
    ///
    /// Invalid frames and replies to other commands yield `None` and are dropped.
    fn match_reply(&self, bytes: &[u8]) -> Option<Outcome> {
        let command = self.in_flight.as_ref()?;
        let frame = match protocol::decode(bytes, &FrameFilter::default()) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Dropping invalid frame {}: {}", to_hex(bytes), e);
                return None;
            }
        };

        if frame.is_nak() {
            return match frame.payload.first() {
                Some(&failed) if failed != command.command() => {
                    warn!("Dropping NAK for command {:02X}", failed);
                    None
                }
                _ => Some(Outcome::Nak(decode_nak(&frame.payload))),
            };
        }

        let filter = FrameFilter {
            command: Some(command.command()),
            index: command.index(),
            min_length: None,
        };
        match protocol::decode(bytes, &filter) {
            Ok(frame) => Some(Outcome::Response(frame)),
            Err(e) => {
                warn!("Dropping unrelated frame {}: {}", to_hex(bytes), e);
                None
            }
        }
    }

    fn complete(&mut self, outcome: Outcome, now: Instant) {
        self.state = QueueState::Idle;
        self.retries = 0;
        self.deadline = None;
        self.last_exchange = Some(now);
        self.last_reply = Some(now);

        let mut command = match self.in_flight.take() {
            Some(command) => command,
            None => return,
        };
        let exchange = Exchange {
            request: command.bytes().to_vec(),
            outcome,
        };
        command.complete(&exchange);

        let Exchange { request, outcome } = exchange;
        match outcome {
            Outcome::Response(frame) => {
                trace!("Reply to {}: {:?}", to_hex(&request), frame);
                let record = decode_response(&frame);
                self.sink.publish(BusEvent::ResponseReceived {
                    request,
                    response: frame,
                });
                if let Some(record) = record {
                    self.sink.publish(BusEvent::Decoded(record));
                }
                if command.is_looping() {
                    if let Err(e) = self.queue.push_normal(command) {
                        warn!("Could not re-queue looping command: {}", e);
                    }
                }
            }
            Outcome::Nak(nak) => {
                warn!(
                    "{} rejected: {}",
                    nak.command_name, nak.reason_description
                );
                self.sink.publish(BusEvent::NakReceived {
                    request,
                    nak: nak.clone(),
                });
                self.sink.publish(BusEvent::Decoded(DecodedRecord::Nak(nak)));
            }
            Outcome::Failed => {}
        }
    }

    /// Holds the line in BREAK for exactly `break_duration`, then releases it.
    fn begin_break(&mut self, now: Instant) -> Result<()> {
        if let Err(e) = self.channel.set_break() {
            error!("Failed to set BREAK: {}", e);
            self.give_up(now);
            return Err(e);
        }
        self.state = QueueState::BreakReset;
        let hold = self.config.break_duration;
        thread::sleep(hold);
        self.end_break(now + hold)
    }

    /// Releases BREAK, then waits the recovery pause before resending.
    fn end_break(&mut self, now: Instant) -> Result<()> {
        if let Err(e) = self.channel.clear_break() {
            error!("Failed to release BREAK: {}", e);
            self.give_up(now);
            return Err(e);
        }
        self.state = QueueState::Retry;
        let recovery = self.config.break_duration;
        thread::sleep(recovery);
        self.retry(now + recovery)
    }

    fn retry(&mut self, now: Instant) -> Result<()> {
        self.retries += 1;
        if self.retries >= self.config.max_retries {
            error!(
                "Giving up on {} after {} retries",
                to_hex(&self.request()),
                self.retries
            );
            self.give_up(now);
            return Err(Error::OperationTimeout);
        }
        trace!("Retry {} of {}", self.retries, to_hex(&self.request()));
        self.transmit(now)
    }

    /// Fails the in-flight command and resets the whole session.
    fn give_up(&mut self, now: Instant) {
        if let Some(mut command) = self.in_flight.take() {
            let exchange = Exchange {
                request: command.bytes().to_vec(),
                outcome: Outcome::Failed,
            };
            command.complete(&exchange);
            self.sink.publish(BusEvent::CommandFailed {
                request: exchange.request,
            });
        }
        self.last_exchange = Some(now);
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::RX_HEADER;
    use crate::cmds;
    use crate::mock::MockLine;
    use crate::protocol::encode_with_header;
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    type Events = Rc<RefCell<Vec<BusEvent>>>;

    fn engine(config: BusConfig) -> (BusEngine<MockLine>, Events) {
        let events: Events = Rc::new(RefCell::new(Vec::new()));
        let sink = {
            let events = events.clone();
            move |event: BusEvent| events.borrow_mut().push(event)
        };
        let engine = BusEngine::new(Box::new(MockLine::with_echo()), config, sink);
        (engine, events)
    }

    fn queued(msg: crate::base::Message) -> QueuedCommand {
        QueuedCommand::from_message(&msg).unwrap()
    }

    fn recorder() -> (Rc<RefCell<Vec<Exchange>>>, impl FnMut(&Exchange) + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |exchange: &Exchange| {
            sink.borrow_mut().push(exchange.clone())
        })
    }

    fn push_reply(engine: &mut BusEngine<MockLine>, command: u8, index: Option<u8>, payload: &[u8]) {
        let bytes = encode_with_header(RX_HEADER, command, index, payload).unwrap();
        engine.channel_mut().line_mut().push_rx(&bytes);
    }

    fn ms(t0: Instant, millis: u64) -> Instant {
        t0 + Duration::from_millis(millis)
    }

    #[test]
    fn sends_and_decodes_reply() {
        let (mut engine, events) = engine(BusConfig::default());
        let (seen, callback) = recorder();
        engine
            .enqueue_normal(queued(cmds::read_sensor(0x05)).on_complete(callback))
            .unwrap();

        let t0 = Instant::now();
        engine.poll_at(t0).unwrap();
        assert_eq!(engine.state(), QueueState::Sending);
        assert_eq!(
            engine.channel().line().written(),
            [0xF4, 0x03, 0x50, 0x05, 0xA2]
        );

        push_reply(
            &mut engine,
            0xD0,
            Some(0x05),
            &[0x5A, 0x30, 0xD4, 0x01, 0x07, 0xD0, 0x04, 0xB0],
        );
        engine.poll_at(ms(t0, 300)).unwrap();

        assert!(engine.is_idle());
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].request, [0xF4, 0x03, 0x50, 0x05, 0xA2]);
        assert_eq!(seen[0].response().unwrap().index, Some(0x05));

        let events = events.borrow();
        assert!(matches!(events[0], BusEvent::CommandSent { .. }));
        assert!(matches!(events[1], BusEvent::ResponseReceived { .. }));
        match &events[2] {
            BusEvent::Decoded(DecodedRecord::Operational(m)) => {
                assert_eq!(m.temperature, 40.0);
                assert_eq!(m.heating_power, 2000);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn spacing_is_measured_from_previous_reply() {
        let (mut engine, _) = engine(BusConfig::default());
        engine.enqueue_normal(queued(cmds::diagnostic())).unwrap();
        engine.enqueue_normal(queued(cmds::read_errors())).unwrap();

        let t0 = Instant::now();
        engine.poll_at(t0).unwrap();
        push_reply(&mut engine, 0xB8, None, &[]);
        engine.poll_at(ms(t0, 100)).unwrap();
        assert_eq!(engine.state(), QueueState::Idle);
        engine.channel_mut().line_mut().take_written();

        engine.poll_at(ms(t0, 249)).unwrap();
        assert!(engine.channel().line().written().is_empty());
        engine.poll_at(ms(t0, 250)).unwrap();
        assert_eq!(
            engine.channel().line().written(),
            [0xF4, 0x03, 0x56, 0x01, 0xA0]
        );
    }

    #[test]
    fn priority_goes_first() {
        let (mut engine, _) = engine(BusConfig::default());
        engine.enqueue_normal(queued(cmds::read_sensor(0x02))).unwrap();
        engine.enqueue_priority(queued(cmds::shutdown())).unwrap();
        engine.poll_at(Instant::now()).unwrap();
        assert_eq!(engine.channel().line().written(), [0xF4, 0x02, 0x10, 0xE6]);
        assert_eq!(engine.pending_count(), 2);
    }

    #[test]
    fn exhausted_retries_fail_and_clear() {
        let config = BusConfig::default()
            .with_max_retries(3)
            .with_break_duration(Duration::from_millis(5));
        let (mut engine, events) = engine(config);
        let (seen, callback) = recorder();
        engine
            .enqueue_normal(queued(cmds::diagnostic()).on_complete(callback))
            .unwrap();
        engine.enqueue_normal(queued(cmds::read_errors())).unwrap();

        let t0 = Instant::now();
        let mut t = 0;
        engine.poll_at(ms(t0, t)).unwrap();

        let mut last = None;
        for attempt in 1..=3 {
            t += 1999;
            engine.poll_at(ms(t0, t)).unwrap();
            assert_eq!(engine.state(), QueueState::Sending);

            t += 1;
            let result = engine.poll_at(ms(t0, t));
            assert!(!engine.channel().line().break_active());
            assert_eq!(engine.channel().line().break_count(), attempt);
            if attempt < 3 {
                result.as_ref().unwrap();
                assert_eq!(engine.state(), QueueState::Sending);
                // hold plus recovery
                t += 10;
            }
            last = Some(result);
        }

        assert!(matches!(last, Some(Err(Error::OperationTimeout))));
        assert!(engine.is_idle());
        assert_eq!(engine.pending_count(), 0);
        // initial send plus two retries
        assert_eq!(engine.channel().line().written().len(), 3 * 4);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0].outcome, Outcome::Failed);

        let events = events.borrow();
        let timeouts: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                BusEvent::CommandTimedOut { retry, .. } => Some(*retry),
                _ => None,
            })
            .collect();
        assert_eq!(timeouts, [1, 2, 3]);
        let n = events.len();
        assert!(matches!(events[n - 2], BusEvent::CommandFailed { .. }));
        assert_eq!(events[n - 1], BusEvent::QueueCleared);
    }

    #[test]
    fn break_hold_does_not_follow_poll_rate() {
        let hold = Duration::from_millis(20);
        let (mut engine, _) = engine(BusConfig::default().with_break_duration(hold));
        engine.enqueue_normal(queued(cmds::diagnostic())).unwrap();
        let t0 = Instant::now();
        engine.poll_at(t0).unwrap();

        // one poll at the deadline, then the application goes quiet
        let started = Instant::now();
        engine.poll_at(ms(t0, 2000)).unwrap();
        let spent = started.elapsed();

        let line = engine.channel().line();
        assert_eq!(line.break_holds().len(), 1);
        assert!(line.break_holds()[0] >= hold);
        assert!(line.break_holds()[0] < hold + Duration::from_millis(200));
        assert!(!line.break_active());
        assert!(spent >= hold * 2);
        // resent within the same poll
        assert_eq!(engine.state(), QueueState::Sending);
        assert_eq!(line.written(), [0xF4, 0x02, 0x38, 0xCE, 0xF4, 0x02, 0x38, 0xCE]);
    }

    #[test]
    fn two_replies_in_one_poll_keep_the_matching_one() {
        let (mut engine, _) = engine(BusConfig::default());
        let (seen, callback) = recorder();
        engine
            .enqueue_normal(queued(cmds::read_sensor(0x03)).on_complete(callback))
            .unwrap();
        let t0 = Instant::now();
        engine.poll_at(t0).unwrap();

        push_reply(&mut engine, 0xD0, Some(0x03), &[0x05]);
        push_reply(&mut engine, 0xB8, None, &[]);
        engine.poll_at(ms(t0, 40)).unwrap();
        assert!(engine.is_idle());
        assert_eq!(seen.borrow()[0].response().unwrap().payload, [0x05]);
    }

    #[test]
    fn nak_completes_without_retry() {
        let (mut engine, events) = engine(BusConfig::default());
        let (seen, callback) = recorder();
        engine
            .enqueue_normal(
                queued(cmds::parking_heat(59))
                    .looping(true)
                    .on_complete(callback),
            )
            .unwrap();

        let t0 = Instant::now();
        engine.poll_at(t0).unwrap();
        push_reply(&mut engine, 0x7F, None, &[0x21, 0x33]);
        engine.poll_at(ms(t0, 100)).unwrap();

        assert!(engine.is_idle());
        assert_eq!(engine.channel().line().break_count(), 0);
        match &seen.borrow()[0].outcome {
            Outcome::Nak(nak) => {
                assert_eq!(nak.failed_command, 0x21);
                assert_eq!(nak.reason_description, "not possible in current state");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(events
            .borrow()
            .iter()
            .any(|e| matches!(e, BusEvent::NakReceived { .. })));
    }

    #[test]
    fn invalid_and_unrelated_frames_are_dropped() {
        let (mut engine, _) = engine(BusConfig::default());
        engine.enqueue_normal(queued(cmds::read_sensor(0x03))).unwrap();
        let t0 = Instant::now();
        engine.poll_at(t0).unwrap();

        // bad checksum
        engine
            .channel_mut()
            .line_mut()
            .push_rx(&[0x4F, 0x04, 0xD0, 0x03, 0x05, 0x00]);
        engine.poll_at(ms(t0, 10)).unwrap();
        assert_eq!(engine.state(), QueueState::Sending);

        // reply for another index
        push_reply(&mut engine, 0xD0, Some(0x05), &[0x00]);
        engine.poll_at(ms(t0, 20)).unwrap();
        assert_eq!(engine.state(), QueueState::Sending);

        // NAK for another command
        push_reply(&mut engine, 0x7F, None, &[0x21, 0x33]);
        engine.poll_at(ms(t0, 30)).unwrap();
        assert_eq!(engine.state(), QueueState::Sending);

        push_reply(&mut engine, 0xD0, Some(0x03), &[0x05]);
        engine.poll_at(ms(t0, 40)).unwrap();
        assert!(engine.is_idle());
    }

    #[test]
    fn looping_command_is_requeued_on_success() {
        let (mut engine, _) = engine(BusConfig::default());
        engine
            .enqueue_normal(queued(cmds::read_sensor(0x03)).looping(true))
            .unwrap();
        let t0 = Instant::now();
        engine.poll_at(t0).unwrap();
        push_reply(&mut engine, 0xD0, Some(0x03), &[0x01]);
        engine.poll_at(ms(t0, 50)).unwrap();

        assert_eq!(engine.state(), QueueState::Idle);
        assert_eq!(engine.pending_count(), 1);
        assert!(engine.contains(&[0xF4, 0x03, 0x50, 0x03, 0xA4]));
    }

    #[test]
    fn write_failure_fails_and_clears() {
        let (mut engine, events) = engine(BusConfig::default());
        let (seen, callback) = recorder();
        engine
            .enqueue_normal(queued(cmds::shutdown()).on_complete(callback))
            .unwrap();
        engine.enqueue_normal(queued(cmds::diagnostic())).unwrap();
        engine
            .channel_mut()
            .line_mut()
            .fail_writes(io::ErrorKind::BrokenPipe);

        assert!(matches!(
            engine.poll_at(Instant::now()),
            Err(Error::IoError(_))
        ));
        assert!(engine.is_idle());
        assert_eq!(seen.borrow()[0].outcome, Outcome::Failed);
        assert_eq!(events.borrow().last(), Some(&BusEvent::QueueCleared));
    }

    #[test]
    fn clear_releases_break() {
        let (mut engine, events) = engine(BusConfig::default());
        engine.enqueue_normal(queued(cmds::diagnostic())).unwrap();
        engine.channel_mut().set_break().unwrap();
        assert!(engine.channel().line().break_active());

        engine.clear();
        assert!(!engine.channel().line().break_active());
        assert!(engine.is_idle());
        assert_eq!(events.borrow().last(), Some(&BusEvent::QueueCleared));
    }

    #[test]
    fn timing_changes_apply_to_next_transition() {
        let (mut engine, _) = engine(BusConfig::default());
        engine.enqueue_normal(queued(cmds::diagnostic())).unwrap();
        let t0 = Instant::now();
        engine.poll_at(t0).unwrap();

        engine.set_timing(
            Duration::from_millis(150),
            Duration::from_millis(500),
            Duration::from_millis(10),
        );
        // armed deadline keeps the old 2000 ms timeout
        engine.poll_at(ms(t0, 600)).unwrap();
        assert_eq!(engine.state(), QueueState::Sending);
        engine.poll_at(ms(t0, 2000)).unwrap();
        assert_eq!(engine.channel().line().break_count(), 1);
        assert!(engine.channel().line().break_holds()[0] >= Duration::from_millis(10));

        // resent at 2020 with the new 500 ms timeout
        engine.poll_at(ms(t0, 2519)).unwrap();
        assert_eq!(engine.channel().line().break_count(), 1);
        engine.poll_at(ms(t0, 2520)).unwrap();
        assert_eq!(engine.channel().line().break_count(), 2);
    }

    #[test]
    fn wake_up_pulses_break_when_idle() {
        let hold = Duration::from_millis(5);
        let (mut engine, _) = engine(BusConfig::default().with_break_duration(hold));
        engine.wake_up().unwrap();
        assert_eq!(engine.channel().line().break_count(), 1);
        assert!(engine.channel().line().break_holds()[0] >= hold);
        assert!(!engine.channel().line().break_active());

        engine.enqueue_normal(queued(cmds::diagnostic())).unwrap();
        engine.poll_at(Instant::now()).unwrap();
        engine.wake_up().unwrap();
        assert_eq!(engine.channel().line().break_count(), 1);
    }

    #[test]
    fn channel_sink_forwards_events() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut engine = BusEngine::new(
            Box::new(MockLine::new()),
            BusConfig::default(),
            ChannelSink(tx),
        );
        engine.clear();
        assert_eq!(rx.try_recv().unwrap(), BusEvent::QueueCleared);
    }
}
