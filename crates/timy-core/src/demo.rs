//! Demo Mode - Simulated TIMY for testing without hardware
//!
//! Acknowledges commands by echoing them and reports split times for random
//! competitors, with the occasional idle timeout and status chatter.

use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::protocol::{
    DeviceSession, Transport, TransportError, LINE_TERMINATOR, SPLIT_MARKER,
};
use crate::timing::format_split_time;

/// Chatter the device prints besides split reports
const CHATTER: [&str; 3] = ["TIMY3 ALGE", "PROG: PRINT", "BAT 95%"];

/// Longest real-time pause between two simulated events
const MAX_PACING_MS: u64 = 1500;

/// Transport that always finds one simulated device
#[derive(Debug, Clone)]
pub struct DemoTransport {
    seed: Option<u64>,
    paced: bool,
    competitors: u8,
}

impl Default for DemoTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoTransport {
    /// Simulator seeded from entropy, pacing events in real time
    pub fn new() -> Self {
        Self {
            seed: None,
            paced: true,
            competitors: 20,
        }
    }

    /// Reproducible simulator
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::new()
        }
    }

    /// Answer reads immediately instead of waiting like real hardware
    pub fn without_pacing(mut self) -> Self {
        self.paced = false;
        self
    }

    /// Number of distinct order numbers reported (1-99)
    pub fn competitors(mut self, count: u8) -> Self {
        self.competitors = count.clamp(1, 99);
        self
    }
}

impl Transport for DemoTransport {
    fn open(
        &mut self,
        vendor_id: u16,
        product_id: u16,
    ) -> Result<Option<Box<dyn DeviceSession>>, TransportError> {
        tracing::info!(
            "Demo mode: simulating device {:04x}:{:04x}",
            vendor_id,
            product_id
        );
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Some(Box::new(DemoSession {
            rng,
            paced: self.paced,
            competitors: self.competitors,
            replies: VecDeque::new(),
            clock: Duration::ZERO,
            sequence: 0,
        })))
    }
}

/// One simulated device session
pub struct DemoSession {
    rng: StdRng,
    paced: bool,
    competitors: u8,
    /// Acknowledgements waiting to be read
    replies: VecDeque<Vec<u8>>,
    /// Simulated run clock
    clock: Duration,
    sequence: u32,
}

impl DemoSession {
    fn pause(&self, duration: Duration) {
        if self.paced {
            thread::sleep(duration);
        }
    }

    fn next_split(&mut self) -> Vec<u8> {
        let gap_hundredths = self.rng.gen_range(50..3000u64);
        self.clock += Duration::from_millis(gap_hundredths * 10);
        if self.clock >= Duration::from_secs(86_400) {
            self.clock = Duration::ZERO;
        }
        self.sequence = self.sequence % 999 + 1;

        let order = self.rng.gen_range(1..=self.competitors);
        let time = format_split_time(self.clock).unwrap_or_else(|_| "00:00:00.00".to_string());
        format!("{:03} {} {} {:02}\r", self.sequence, SPLIT_MARKER, time, order).into_bytes()
    }
}

impl DeviceSession for DemoSession {
    fn configure(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn write(
        &mut self,
        _endpoint: u8,
        data: &[u8],
        _timeout: Duration,
    ) -> Result<usize, TransportError> {
        let text = String::from_utf8_lossy(data);
        let cmd = text.trim_end_matches(LINE_TERMINATOR as char);
        if !cmd.is_empty() {
            self.replies.push_back(format!("{}\r", cmd).into_bytes());
        }
        Ok(data.len())
    }

    fn read(
        &mut self,
        _endpoint: u8,
        max_len: usize,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        if let Some(mut reply) = self.replies.pop_front() {
            reply.truncate(max_len);
            return Ok(reply);
        }

        let wait = Duration::from_millis(self.rng.gen_range(100..MAX_PACING_MS));
        let roll: f64 = self.rng.gen();
        if roll < 0.1 || (self.paced && wait > timeout) {
            self.pause(timeout.min(Duration::from_millis(MAX_PACING_MS)));
            return Err(TransportError::timed_out());
        }
        self.pause(wait);

        let mut frame = if roll < 0.2 {
            let line = CHATTER[self.rng.gen_range(0..CHATTER.len())];
            format!("{}\r", line).into_bytes()
        } else {
            self.next_split()
        };
        frame.truncate(max_len);
        Ok(frame)
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        self.replies.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{decode_frame, encode_command, FRAME_SIZE, READ_ENDPOINT};
    use crate::timing::parse_split_time;

    fn open(transport: &mut DemoTransport) -> Box<dyn DeviceSession> {
        transport.open(0x0c4a, 0x0889).unwrap().unwrap()
    }

    #[test]
    fn test_commands_are_echoed() {
        let mut session = open(&mut DemoTransport::with_seed(1).without_pacing());
        session
            .write(0x01, &encode_command("TIMYINIT"), Duration::from_secs(1))
            .unwrap();
        let ack = session
            .read(READ_ENDPOINT, FRAME_SIZE, Duration::from_secs(1))
            .unwrap();
        assert_eq!(decode_frame(&ack).unwrap().fields, vec!["TIMYINIT"]);
    }

    #[test]
    fn test_splits_are_well_formed() {
        let mut session = open(
            &mut DemoTransport::with_seed(42)
                .without_pacing()
                .competitors(5),
        );
        let mut splits = 0;
        let mut last = Duration::ZERO;
        for _ in 0..200 {
            let Ok(raw) = session.read(READ_ENDPOINT, FRAME_SIZE, Duration::from_secs(2)) else {
                continue;
            };
            assert!(raw.len() <= FRAME_SIZE);
            let frame = decode_frame(&raw).unwrap();
            if let Some(event) = frame.split_event() {
                let time = parse_split_time(&event.raw_duration).unwrap();
                assert!(time > last);
                last = time;
                let order: u8 = event.order_number.parse().unwrap();
                assert!((1..=5).contains(&order));
                splits += 1;
            }
        }
        assert!(splits > 100);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let read_all = |seed| {
            let mut session = open(&mut DemoTransport::with_seed(seed).without_pacing());
            (0..20)
                .map(|_| session.read(READ_ENDPOINT, FRAME_SIZE, Duration::from_secs(2)).ok())
                .collect::<Vec<_>>()
        };
        assert_eq!(read_all(7), read_all(7));
    }
}
