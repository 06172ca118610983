//! Capture engine
//!
//! Owns the device session and runs the blocking poll loop: send the
//! initialization commands, read frames, turn split reports into
//! [`TimeRecord`]s and hand them to the store.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::thread;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{CaptureConfig, CaptureError};
use crate::protocol::{
    decode_frame, encode_command, read_outcome, CommandSequencer, DecodedFrame, DeviceSession,
    ReadOutcome, SplitEvent, Transport, LINE_TERMINATOR,
};
use crate::store::{SplitStore, TimeRecord};
use crate::timing::parse_split_time;

/// Capture lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureState {
    /// Device opened, loop not started
    Idle,
    /// Poll loop active
    Running,
    /// Loop active, stop signalled but not yet observed
    StopRequested,
    /// Loop ended on request
    Stopped,
    /// Loop ended because the device was unplugged
    Disconnected,
    /// Loop aborted by a fatal transport error
    Failed,
}

impl CaptureState {
    /// Whether the loop has ended
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CaptureState::Stopped | CaptureState::Disconnected | CaptureState::Failed
        )
    }
}

/// How a capture run ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureOutcome {
    /// A stop was requested
    Stopped,
    /// The device was disconnected
    Disconnected,
}

/// Summary of one capture session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureReport {
    /// How the run ended
    pub outcome: CaptureOutcome,
    /// Successful reads, init acknowledgements excluded
    pub frames_read: u64,
    /// Frames that were not split reports
    pub frames_ignored: u64,
    /// Splits handed to the store successfully
    pub splits_saved: u64,
    /// Splits lost to conversion or storage failures
    pub splits_dropped: u64,
    /// Reads that hit the timeout
    pub timeouts: u64,
    /// Initialization commands written successfully
    pub commands_sent: u64,
}

impl fmt::Display for CaptureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}: {} frames ({} ignored), {} splits saved, {} dropped, {} timeouts",
            self.outcome,
            self.frames_read,
            self.frames_ignored,
            self.splits_saved,
            self.splits_dropped,
            self.timeouts
        )
    }
}

#[derive(Debug, Default)]
struct Counters {
    frames_read: u64,
    frames_ignored: u64,
    splits_saved: u64,
    splits_dropped: u64,
    timeouts: u64,
    commands_sent: u64,
}

impl Counters {
    fn report(&self, outcome: CaptureOutcome) -> CaptureReport {
        CaptureReport {
            outcome,
            frames_read: self.frames_read,
            frames_ignored: self.frames_ignored,
            splits_saved: self.splits_saved,
            splits_dropped: self.splits_dropped,
            timeouts: self.timeouts,
            commands_sent: self.commands_sent,
        }
    }
}

/// State shared between the engine and its handles
#[derive(Debug)]
struct Shared {
    stop: CancellationToken,
    state: Mutex<CaptureState>,
}

impl Shared {
    fn state(&self) -> CaptureState {
        let state = *self.state.lock().unwrap_or_else(|p| p.into_inner());
        if state == CaptureState::Running && self.stop.is_cancelled() {
            CaptureState::StopRequested
        } else {
            state
        }
    }

    fn set_state(&self, state: CaptureState) {
        *self.state.lock().unwrap_or_else(|p| p.into_inner()) = state;
    }
}

/// Cloneable handle for observing and stopping a capture from another thread
#[derive(Debug, Clone)]
pub struct CaptureHandle {
    shared: Arc<Shared>,
}

impl CaptureHandle {
    /// Ask the loop to stop.
    ///
    /// Honoured at the next iteration boundary. A read already blocked in
    /// the transport finishes (or times out) first.
    pub fn request_stop(&self) {
        self.shared.stop.cancel();
    }

    /// Current lifecycle state
    pub fn state(&self) -> CaptureState {
        self.shared.state()
    }
}

/// What the loop should do after a transfer
enum Step {
    Continue,
    /// The transfer timed out and had no effect
    Skip,
    Exit(CaptureOutcome),
}

/// Direction of a transfer, selects the timeout that applied
#[derive(Clone, Copy)]
enum Transfer {
    Read,
    Write,
}

/// Decode a raw frame for the capture loop
fn decode(raw: &[u8]) -> Result<DecodedFrame, CaptureError> {
    Ok(decode_frame(raw)?)
}

/// Convert a split report into a record
pub fn build_record(event: &SplitEvent) -> Result<TimeRecord, CaptureError> {
    let time_measured = parse_split_time(&event.raw_duration)?;
    let order = event.order_number.as_str();
    let order_number = Some(order)
        .filter(|o| (1..=2).contains(&o.len()) && o.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|o| o.parse::<u8>().ok())
        .filter(|n| (1..=99).contains(n))
        .ok_or_else(|| CaptureError::InvalidOrderNumber(order.to_string()))?;

    Ok(TimeRecord::new(time_measured, order_number))
}

/// Capture engine for one device session
pub struct CaptureEngine {
    config: CaptureConfig,
    session: Box<dyn DeviceSession>,
    store: Box<dyn SplitStore>,
    sequencer: CommandSequencer,
    shared: Arc<Shared>,
    counters: Counters,
}

impl CaptureEngine {
    /// Discover and configure the device.
    ///
    /// Fails with [`CaptureError::DeviceNotFound`] when nothing matches the
    /// configured identifiers.
    pub fn connect<T>(
        config: CaptureConfig,
        transport: &mut T,
        store: Box<dyn SplitStore>,
    ) -> Result<Self, CaptureError>
    where
        T: Transport + ?Sized,
    {
        config.validate()?;

        let Some(mut session) = transport.open(config.vendor_id, config.product_id)? else {
            error!(
                "ALGE TIMY3 ({:04x}:{:04x}) not found. Time capture not possible.",
                config.vendor_id, config.product_id
            );
            return Err(CaptureError::DeviceNotFound {
                vendor_id: config.vendor_id,
                product_id: config.product_id,
            });
        };

        session.configure()?;
        info!(
            "ALGE TIMY3 ({:04x}:{:04x}) opened",
            config.vendor_id, config.product_id
        );

        Ok(Self::with_session(config, session, store))
    }

    /// Wrap an already configured session
    pub fn with_session(
        config: CaptureConfig,
        session: Box<dyn DeviceSession>,
        store: Box<dyn SplitStore>,
    ) -> Self {
        let sequencer = CommandSequencer::new(config.init_commands.iter().cloned());
        Self {
            config,
            session,
            store,
            sequencer,
            shared: Arc::new(Shared {
                stop: CancellationToken::new(),
                state: Mutex::new(CaptureState::Idle),
            }),
            counters: Counters::default(),
        }
    }

    /// Handle for stopping the loop from elsewhere
    pub fn handle(&self) -> CaptureHandle {
        CaptureHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> CaptureState {
        self.shared.state()
    }

    /// Configuration in use
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Run the capture loop until stopped, disconnected or failed.
    ///
    /// The session is reset and released on every exit path.
    pub fn start(mut self) -> Result<CaptureReport, CaptureError> {
        self.shared.set_state(CaptureState::Running);
        info!(
            "Capture started (read timeout {} ms)",
            self.config.read_timeout_ms
        );

        let result = self.capture_loop();

        // Reset so the next discovery finds the device in a clean state
        debug!("Device reset - ending the loop");
        if let Err(e) = self.session.reset() {
            warn!("Device reset failed: {}", e);
        }

        let (state, result) = match result {
            Ok(outcome) => {
                let report = self.counters.report(outcome);
                info!("Capture finished: {}", report);
                let state = match outcome {
                    CaptureOutcome::Stopped => CaptureState::Stopped,
                    CaptureOutcome::Disconnected => CaptureState::Disconnected,
                };
                (state, Ok(report))
            }
            Err(e) => {
                error!("Capture aborted: {}", e);
                (CaptureState::Failed, Err(e))
            }
        };
        self.shared.set_state(state);
        result
    }

    fn capture_loop(&mut self) -> Result<CaptureOutcome, CaptureError> {
        // Flush any half-typed command in the device buffer
        if let Step::Exit(outcome) = self.write(&[LINE_TERMINATOR])? {
            return Ok(outcome);
        }

        loop {
            if self.shared.stop.is_cancelled() {
                info!("Stop requested, ending capture");
                return Ok(CaptureOutcome::Stopped);
            }

            if let Some(cmd) = self.sequencer.next_command() {
                if let Step::Exit(outcome) = self.send_command(&cmd)? {
                    return Ok(outcome);
                }
            }

            let outcome = self.read();
            if let Step::Exit(outcome) =
                self.handle_outcome(outcome, Transfer::Read, Self::handle_frame)?
            {
                return Ok(outcome);
            }

            thread::sleep(self.config.poll_interval());
        }
    }

    /// Send one init command and discard its acknowledgement.
    ///
    /// A command whose write timed out is not counted and gets no
    /// acknowledgement read.
    fn send_command(&mut self, cmd: &str) -> Result<Step, CaptureError> {
        debug!("Sending command {}", cmd);
        match self.write(&encode_command(cmd))? {
            Step::Continue => {}
            Step::Skip => {
                warn!("Command {} was not delivered", cmd);
                return Ok(Step::Continue);
            }
            exit => return Ok(exit),
        }
        self.counters.commands_sent += 1;

        let ack = self.read();
        self.handle_outcome(ack, Transfer::Read, |_, raw| {
            debug!(
                "Acknowledgement: {:?}",
                String::from_utf8_lossy(&raw).trim_end()
            );
        })
    }

    fn write(&mut self, data: &[u8]) -> Result<Step, CaptureError> {
        match self
            .session
            .write(self.config.write_endpoint, data, self.config.write_timeout())
        {
            Ok(_) => Ok(Step::Continue),
            Err(e) => self.handle_outcome(read_outcome(Err(e)), Transfer::Write, |_, _| {}),
        }
    }

    fn read(&mut self) -> ReadOutcome {
        read_outcome(self.session.read(
            self.config.read_endpoint,
            self.config.frame_size,
            self.config.read_timeout(),
        ))
    }

    fn handle_outcome<F>(
        &mut self,
        outcome: ReadOutcome,
        transfer: Transfer,
        on_data: F,
    ) -> Result<Step, CaptureError>
    where
        F: FnOnce(&mut Self, Vec<u8>),
    {
        match outcome {
            ReadOutcome::Data(raw) => {
                on_data(self, raw);
                Ok(Step::Continue)
            }
            ReadOutcome::Timeout => {
                self.counters.timeouts += 1;
                match transfer {
                    Transfer::Read => warn!(
                        "Configured timeout {} ms has expired. Recommendation: increase its value.",
                        self.config.read_timeout_ms
                    ),
                    Transfer::Write => warn!(
                        "Write timeout {} ms has expired",
                        self.config.write_timeout_ms
                    ),
                }
                Ok(Step::Skip)
            }
            ReadOutcome::Disconnected => {
                error!("ALGE TIMY USB device has been disconnected");
                Ok(Step::Exit(CaptureOutcome::Disconnected))
            }
            ReadOutcome::Fatal(e) => Err(CaptureError::Fatal(e)),
        }
    }

    fn handle_frame(&mut self, raw: Vec<u8>) {
        self.counters.frames_read += 1;

        let frame = match decode(&raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Dropping frame {:02x?}: {}", raw, e);
                self.counters.frames_ignored += 1;
                return;
            }
        };

        let Some(event) = frame.split_event() else {
            debug!("Ignoring frame {:?}", frame.fields);
            self.counters.frames_ignored += 1;
            return;
        };

        debug!(
            "Received values: {} - c1M - {} - {}",
            event.sequence, event.raw_duration, event.order_number
        );

        match self.record_split(&event) {
            Ok(record) => {
                self.counters.splits_saved += 1;
                debug!(
                    "Split #{} ({}) saved",
                    record.order_number, event.raw_duration
                );
            }
            Err(e) => {
                self.counters.splits_dropped += 1;
                error!("Problem with saving split {}: {}", event.sequence, e);
            }
        }
    }

    /// Convert and persist one split
    fn record_split(&mut self, event: &SplitEvent) -> Result<TimeRecord, CaptureError> {
        let record = build_record(event)?;
        self.store.save(record.clone())?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn event(duration: &str, order: &str) -> SplitEvent {
        SplitEvent {
            sequence: "001".to_string(),
            raw_duration: duration.to_string(),
            order_number: order.to_string(),
        }
    }

    #[test]
    fn test_build_record() {
        let record = build_record(&event("00:00:10.82", "07")).unwrap();
        assert_eq!(record.time_measured, Duration::from_millis(10_820));
        assert_eq!(record.order_number, 7);
    }

    #[test]
    fn test_build_record_rejects_bad_time() {
        assert!(matches!(
            build_record(&event("24:00:00.00", "07")),
            Err(CaptureError::TimeFormat(_))
        ));
    }

    #[test]
    fn test_build_record_rejects_bad_order_number() {
        for order in ["", "0", "00", "100", "+7", "x1", "256"] {
            assert!(
                matches!(
                    build_record(&event("00:00:10.82", order)),
                    Err(CaptureError::InvalidOrderNumber(_))
                ),
                "{:?} should be rejected",
                order
            );
        }
        assert_eq!(
            build_record(&event("00:00:10.82", "99")).unwrap().order_number,
            99
        );
    }

    #[test]
    fn test_build_record_rejects_long_order_number() {
        assert!(matches!(
            build_record(&event("00:00:10.82", "007")),
            Err(CaptureError::InvalidOrderNumber(o)) if o == "007"
        ));
        assert_eq!(build_record(&event("00:00:10.82", "7")).unwrap().order_number, 7);
    }

    #[test]
    fn test_decode_failure_is_decode_error() {
        assert!(matches!(
            decode(&[0x30, 0xff, 0xfe]),
            Err(CaptureError::Decode(_))
        ));
        assert_eq!(decode(b"001 c1M").unwrap().fields, vec!["001", "c1M"]);
    }

    #[test]
    fn test_stop_overlay_state() {
        let shared = Shared {
            stop: CancellationToken::new(),
            state: Mutex::new(CaptureState::Idle),
        };
        shared.stop.cancel();
        assert_eq!(shared.state(), CaptureState::Idle);

        shared.set_state(CaptureState::Running);
        assert_eq!(shared.state(), CaptureState::StopRequested);

        shared.set_state(CaptureState::Stopped);
        assert_eq!(shared.state(), CaptureState::Stopped);
        assert!(shared.state().is_terminal());
    }
}
