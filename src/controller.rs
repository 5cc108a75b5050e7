use crate::base::{BusLine, Error, Message, Result};
use crate::cmds::{self, ComponentTest, HeaterMode};
use crate::config::{BusConfig, ControllerConfig};
use crate::engine::{BusEngine, EventSink};
use crate::queue::QueuedCommand;
use log::{info, trace, warn};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

/// Sensor pages read continuously once connected.
const POLLED_SENSORS: [u8; 5] = [
    cmds::WBUS_SENSOR_STATUS_FLAGS,
    cmds::WBUS_SENSOR_ON_OFF_FLAGS,
    cmds::WBUS_SENSOR_OPERATIONAL,
    cmds::WBUS_SENSOR_OPERATING_STATE,
    cmds::WBUS_SENSOR_SUBSYSTEMS,
];

/// Identification pages read once after connecting.
const IDENTIFICATION: [u8; 9] = [
    cmds::WBUS_INFO_DEVICE_ID,
    cmds::WBUS_INFO_CTRL_MFG_DATE,
    cmds::WBUS_INFO_HEATER_MFG_DATE,
    cmds::WBUS_INFO_CUSTOMER_ID,
    cmds::WBUS_INFO_SERIAL_NUMBER,
    cmds::WBUS_INFO_WBUS_VERSION,
    cmds::WBUS_INFO_DEVICE_NAME,
    cmds::WBUS_INFO_WBUS_CODE,
    cmds::WBUS_INFO_DATASET_ID,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    ConnectionFailed,
}

#[derive(Debug)]
struct Shared {
    connection: ConnectionState,
    mode: Option<HeaterMode>,
    /// Set by the diagnostic callback, consumed by the next poll.
    just_connected: bool,
}

/// High level heater control on top of a [`BusEngine`].
///
/// Tracks the connection, remembers the running mode and keeps it alive with
/// a periodic keep-alive command. Commands are never refused while
/// disconnected: control commands first pulse BREAK to wake the heater, reads
/// are queued as they are. A connected heater that stops answering for
/// `connection_timeout`, or a bus session that fails, moves the connection to
/// [`ConnectionState::ConnectionFailed`].
pub struct HeaterController<T: ?Sized> {
    engine: BusEngine<T>,
    config: ControllerConfig,
    shared: Rc<RefCell<Shared>>,
    last_keepalive: Option<Instant>,
}

impl<T: ?Sized> HeaterController<T>
where
    T: BusLine,
{
    pub fn new<S>(
        line: Box<T>,
        bus: BusConfig,
        config: ControllerConfig,
        sink: S,
    ) -> HeaterController<T>
    where
        S: EventSink + 'static,
    {
        HeaterController {
            engine: BusEngine::new(line, bus, sink),
            config,
            shared: Rc::new(RefCell::new(Shared {
                connection: ConnectionState::Disconnected,
                mode: None,
                just_connected: false,
            })),
            last_keepalive: None,
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.shared.borrow().connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    /// Mode confirmed by the heater, if any.
    pub fn active_mode(&self) -> Option<HeaterMode> {
        self.shared.borrow().mode
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ControllerConfig) {
        self.config = config;
    }

    pub fn engine(&self) -> &BusEngine<T> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut BusEngine<T> {
        &mut self.engine
    }

    /// Sends the diagnostic command; its reply decides the connection state.
    pub fn connect(&mut self) -> Result<()> {
        if self.connection_state() == ConnectionState::Connecting {
            warn!("Connection attempt already in progress");
            return Ok(());
        }
        info!("Connecting to heater");
        self.shared.borrow_mut().connection = ConnectionState::Connecting;
        if let Err(e) = self.engine.wake_up() {
            self.shared.borrow_mut().connection = ConnectionState::ConnectionFailed;
            return Err(e);
        }

        let shared = self.shared.clone();
        let command = QueuedCommand::from_message(&cmds::diagnostic())?.on_complete(
            move |exchange| {
                let mut shared = shared.borrow_mut();
                if exchange.is_success() {
                    info!("Heater connected");
                    shared.connection = ConnectionState::Connected;
                    shared.just_connected = true;
                } else {
                    warn!("Heater did not answer the diagnostic request");
                    shared.connection = ConnectionState::ConnectionFailed;
                }
            },
        );
        if let Err(e) = self.engine.enqueue_normal(command) {
            self.shared.borrow_mut().connection = ConnectionState::ConnectionFailed;
            return Err(e);
        }
        Ok(())
    }

    /// Drops every pending command and forgets the connection.
    pub fn disconnect(&mut self) {
        info!("Disconnecting from heater");
        self.engine.clear();
        let mut shared = self.shared.borrow_mut();
        shared.connection = ConnectionState::Disconnected;
        shared.mode = None;
        shared.just_connected = false;
        self.last_keepalive = None;
    }

    /// Starts a mode with the configured runtime.
    pub fn start(&mut self, mode: HeaterMode) -> Result<()> {
        self.wake_if_disconnected()?;
        let shared = self.shared.clone();
        let msg = cmds::start(mode, self.config.runtime_minutes);
        let command = QueuedCommand::from_message(&msg)?.on_complete(move |exchange| {
            if exchange.is_success() {
                info!("{:?} started", mode);
                shared.borrow_mut().mode = Some(mode);
            } else {
                warn!("{:?} was not started", mode);
            }
        });
        self.engine.enqueue_normal(command)
    }

    /// Stops whatever runs; goes ahead of queued reads.
    pub fn shutdown(&mut self) -> Result<()> {
        self.wake_if_disconnected()?;
        let shared = self.shared.clone();
        let command =
            QueuedCommand::from_message(&cmds::shutdown())?.on_complete(move |exchange| {
                if exchange.is_success() {
                    info!("Heater shut down");
                    shared.borrow_mut().mode = None;
                } else {
                    warn!("Shutdown was not confirmed");
                }
            });
        self.engine.enqueue_priority(command)
    }

    pub fn read_sensor(&mut self, index: u8) -> Result<()> {
        self.send(&cmds::read_sensor(index))
    }

    pub fn read_info(&mut self, index: u8) -> Result<()> {
        self.send(&cmds::read_info(index))
    }

    pub fn read_errors(&mut self) -> Result<()> {
        self.send(&cmds::read_errors())
    }

    pub fn read_error_details(&mut self, code: u8) -> Result<()> {
        self.send(&cmds::read_error_details(code))
    }

    pub fn clear_errors(&mut self) -> Result<()> {
        self.send(&cmds::clear_errors())
    }

    pub fn fuel_circulation(&mut self, seconds: u8) -> Result<()> {
        self.wake_if_disconnected()?;
        self.send(&cmds::fuel_circulation(seconds))
    }

    pub fn test_component(&mut self, test: ComponentTest, seconds: u8) -> Result<()> {
        self.wake_if_disconnected()?;
        self.send(&test.to_message(seconds))
    }

    /// Queues any message once on the normal queue.
    pub fn send(&mut self, msg: &Message) -> Result<()> {
        self.engine
            .enqueue_normal(QueuedCommand::from_message(msg)?)
    }

    pub fn poll(&mut self) -> Result<()> {
        self.poll_at(Instant::now())
    }

    /// Drives the engine, then checks the link and schedules polling reads
    /// and keep-alives.
    pub fn poll_at(&mut self, now: Instant) -> Result<()> {
        if let Err(e) = self.engine.poll_at(now) {
            self.connection_lost("bus session failed");
            return Err(e);
        }
        let silent = self.engine.last_reply().map_or(false, |last| {
            now.saturating_duration_since(last) > self.config.connection_timeout
        });
        if silent {
            self.connection_lost("heater stopped answering");
        }

        let just_connected =
            std::mem::replace(&mut self.shared.borrow_mut().just_connected, false);
        if just_connected {
            self.schedule_reads()?;
        }
        self.keep_alive(now)
    }

    fn connection_lost(&mut self, reason: &str) {
        let mut shared = self.shared.borrow_mut();
        if shared.connection == ConnectionState::Connected {
            warn!("Connection lost: {}", reason);
            shared.connection = ConnectionState::ConnectionFailed;
        }
    }

    fn wake_if_disconnected(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }
        self.engine.wake_up()
    }

    fn schedule_reads(&mut self) -> Result<()> {
        trace!("Scheduling identification and polling reads");
        for index in IDENTIFICATION.iter() {
            self.enqueue_quiet(QueuedCommand::from_message(&cmds::read_info(*index))?)?;
        }
        for index in POLLED_SENSORS.iter() {
            let command = QueuedCommand::from_message(&cmds::read_sensor(*index))?.looping(true);
            self.enqueue_quiet(command)?;
        }
        self.enqueue_quiet(QueuedCommand::from_message(&cmds::read_errors())?.looping(true))
    }

    /// Enqueues on the normal queue; an identical pending command is fine.
    fn enqueue_quiet(&mut self, command: QueuedCommand) -> Result<()> {
        match self.engine.enqueue_normal(command) {
            Err(Error::DuplicateCommand) => Ok(()),
            other => other,
        }
    }

    fn keep_alive(&mut self, now: Instant) -> Result<()> {
        let mode = match self.active_mode() {
            Some(mode) => mode,
            None => {
                self.last_keepalive = None;
                return Ok(());
            }
        };
        let last = match self.last_keepalive {
            Some(last) => last,
            None => {
                self.last_keepalive = Some(now);
                return Ok(());
            }
        };
        if now.saturating_duration_since(last) < self.config.keepalive_interval {
            return Ok(());
        }
        self.last_keepalive = Some(now);
        trace!("Sending keep-alive for {:?}", mode);

        let command = QueuedCommand::from_message(&cmds::keep_alive(mode))?.on_complete(
            move |exchange| {
                if !exchange.is_success() {
                    warn!("Keep-alive for {:?} was not delivered", mode);
                }
            },
        );
        match self.engine.enqueue_priority(command) {
            Err(Error::DuplicateCommand) => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::RX_HEADER;
    use crate::engine::BusEvent;
    use crate::mock::MockLine;
    use crate::protocol::{encode, encode_with_header};
    use std::time::Duration;

    fn controller(bus: BusConfig) -> HeaterController<MockLine> {
        HeaterController::new(
            Box::new(MockLine::with_echo()),
            bus.with_break_duration(Duration::from_millis(1)),
            ControllerConfig::default(),
            |_: BusEvent| {},
        )
    }

    fn reply(ctl: &mut HeaterController<MockLine>, command: u8, payload: &[u8]) {
        let bytes = encode_with_header(RX_HEADER, command, None, payload).unwrap();
        ctl.engine_mut().channel_mut().line_mut().push_rx(&bytes);
    }

    fn wire(msg: Message) -> Vec<u8> {
        encode(msg.cmd, msg.index, &msg.data).unwrap()
    }

    fn ms(t0: Instant, millis: u64) -> Instant {
        t0 + Duration::from_millis(millis)
    }

    #[test]
    fn connect_schedules_polling() {
        let mut ctl = controller(BusConfig::default());
        ctl.connect().unwrap();
        assert_eq!(ctl.connection_state(), ConnectionState::Connecting);
        // second call while connecting is a no-op
        ctl.connect().unwrap();
        assert_eq!(ctl.engine().pending_count(), 1);

        let t0 = Instant::now();
        ctl.poll_at(t0).unwrap();
        assert_eq!(
            ctl.engine().channel().line().written(),
            [0xF4, 0x02, 0x38, 0xCE]
        );
        reply(&mut ctl, 0xB8, &[]);
        ctl.poll_at(ms(t0, 100)).unwrap();

        assert!(ctl.is_connected());
        assert_eq!(
            ctl.engine().pending_count(),
            IDENTIFICATION.len() + POLLED_SENSORS.len() + 1
        );
        assert!(ctl
            .engine()
            .contains(&wire(cmds::read_sensor(cmds::WBUS_SENSOR_OPERATIONAL))));
    }

    #[test]
    fn connect_fails_after_retries() {
        let mut ctl = controller(BusConfig::default().with_max_retries(1));
        ctl.connect().unwrap();
        let t0 = Instant::now();
        ctl.poll_at(t0).unwrap();
        assert!(ctl.poll_at(ms(t0, 2000)).is_err());
        assert_eq!(ctl.connection_state(), ConnectionState::ConnectionFailed);
        assert!(ctl.engine().is_idle());
    }

    fn connected(bus: BusConfig) -> (HeaterController<MockLine>, Instant) {
        let mut ctl = controller(bus);
        ctl.connect().unwrap();
        let t0 = Instant::now();
        ctl.poll_at(t0).unwrap();
        reply(&mut ctl, 0xB8, &[]);
        ctl.poll_at(ms(t0, 100)).unwrap();
        assert!(ctl.is_connected());
        (ctl, t0)
    }

    #[test]
    fn failed_session_drops_connection() {
        let (mut ctl, t0) = connected(BusConfig::default().with_max_retries(1));
        ctl.poll_at(ms(t0, 250)).unwrap();
        assert!(ctl.poll_at(ms(t0, 2250)).is_err());
        assert_eq!(ctl.connection_state(), ConnectionState::ConnectionFailed);
        assert_eq!(ctl.engine().pending_count(), 0);
    }

    #[test]
    fn silent_heater_drops_connection() {
        let (mut ctl, t0) = connected(BusConfig::default());
        ctl.poll_at(ms(t0, 250)).unwrap();
        ctl.poll_at(ms(t0, 5100)).unwrap();
        assert!(ctl.is_connected());
        ctl.poll_at(ms(t0, 5101)).unwrap();
        assert_eq!(ctl.connection_state(), ConnectionState::ConnectionFailed);
    }

    #[test]
    fn control_commands_wake_the_bus_when_disconnected() {
        let mut ctl = controller(BusConfig::default());
        ctl.read_sensor(cmds::WBUS_SENSOR_OPERATIONAL).unwrap();
        assert_eq!(ctl.engine().channel().line().break_count(), 0);
        ctl.shutdown().unwrap();
        assert_eq!(ctl.engine().channel().line().break_count(), 1);
        assert_eq!(ctl.engine().pending_count(), 2);

        let (mut ctl, _) = connected(BusConfig::default());
        // the pulse sent by connect
        assert_eq!(ctl.engine().channel().line().break_count(), 1);
        ctl.start(HeaterMode::Boost).unwrap();
        assert_eq!(ctl.engine().channel().line().break_count(), 1);
    }

    #[test]
    fn running_mode_is_kept_alive() {
        let mut ctl = controller(BusConfig::default());
        let t0 = Instant::now();
        ctl.start(HeaterMode::ParkingHeat).unwrap();
        ctl.poll_at(t0).unwrap();
        assert_eq!(
            ctl.engine().channel().line().written(),
            [0xF4, 0x03, 0x21, 0x3B, 0xED]
        );
        reply(&mut ctl, 0xA1, &[0x3B]);
        ctl.poll_at(ms(t0, 100)).unwrap();
        assert_eq!(ctl.active_mode(), Some(HeaterMode::ParkingHeat));
        ctl.engine_mut().channel_mut().line_mut().take_written();

        ctl.poll_at(ms(t0, 25_099)).unwrap();
        ctl.poll_at(ms(t0, 25_099)).unwrap();
        assert!(ctl.engine().channel().line().written().is_empty());

        ctl.poll_at(ms(t0, 25_100)).unwrap();
        ctl.poll_at(ms(t0, 25_101)).unwrap();
        assert_eq!(
            ctl.engine().channel().line().written(),
            [0xF4, 0x04, 0x44, 0x21, 0x00, 0x95]
        );
    }

    #[test]
    fn shutdown_stops_keep_alive() {
        let mut ctl = controller(BusConfig::default());
        let t0 = Instant::now();
        ctl.start(HeaterMode::Ventilation).unwrap();
        ctl.poll_at(t0).unwrap();
        reply(&mut ctl, 0xA2, &[0x3B]);
        ctl.poll_at(ms(t0, 100)).unwrap();
        assert_eq!(ctl.active_mode(), Some(HeaterMode::Ventilation));

        ctl.shutdown().unwrap();
        ctl.poll_at(ms(t0, 300)).unwrap();
        reply(&mut ctl, 0x90, &[]);
        ctl.poll_at(ms(t0, 400)).unwrap();
        assert_eq!(ctl.active_mode(), None);

        ctl.engine_mut().channel_mut().line_mut().take_written();
        ctl.poll_at(ms(t0, 60_000)).unwrap();
        ctl.poll_at(ms(t0, 60_001)).unwrap();
        assert!(ctl.engine().channel().line().written().is_empty());
    }

    #[test]
    fn disconnect_clears_everything() {
        let mut ctl = controller(BusConfig::default());
        ctl.connect().unwrap();
        ctl.read_errors().unwrap();
        ctl.disconnect();
        assert_eq!(ctl.connection_state(), ConnectionState::Disconnected);
        assert!(ctl.engine().is_idle());
    }
}
