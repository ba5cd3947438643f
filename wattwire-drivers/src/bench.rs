//! Host test bench
//!
//! Runs a [`BusMaster`] against a [`RegisterTarget`] on a
//! [`SimulatedBus`], with a passive monitor decoding everything that
//! appears on the wire.
//!
//! Each reference tick runs in a fixed order:
//! 1. master tick (may move either line)
//! 2. target tick (sees the master's new levels, may move data)
//! 3. monitor samples the combined levels

use wattwire_core::{
    BusConfig, BusMaster, ControlInputs, MasterStatus, TransactionRequest, TransactionResult,
};
use wattwire_protocol::{BusMonitor, DecodeError, FrameDecoder, Transfer};

use crate::sim::{BusLevels, SimulatedBus};
use crate::target::RegisterTarget;

/// Bus periods allowed for one transaction, with margin
const PERIODS_PER_TRANSACTION: u32 = 64;

/// Errors from running a request on the bench
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BenchError {
    /// The master did not accept the request
    Busy,
    /// No done pulse within the tick budget
    Timeout {
        /// Ticks run before giving up
        ticks: u32,
    },
}

/// Outcome of a request run to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Master result outputs
    pub result: TransactionResult,
    /// Ticks from the start request to the done pulse, inclusive
    pub ticks: u32,
    /// Done pulses seen, including one bus period after completion
    pub done_pulses: u32,
    /// Transfer decoded from the wire
    pub transfer: Option<Transfer>,
}

/// Master, target and monitor on one simulated bus
pub struct TestBench {
    master: BusMaster<SimulatedBus>,
    target: RegisterTarget,
    monitor: BusMonitor,
    decoder: FrameDecoder,
    last_transfer: Option<Transfer>,
    decode_error: Option<DecodeError>,
}

impl TestBench {
    /// Create a bench with an idle bus
    pub fn new(config: BusConfig, target: RegisterTarget) -> Self {
        Self {
            master: BusMaster::new(config, SimulatedBus::new()),
            target,
            monitor: BusMonitor::new(),
            decoder: FrameDecoder::new(),
            last_transfer: None,
            decode_error: None,
        }
    }

    /// Advance everything by one reference tick
    pub fn tick(&mut self, inputs: &ControlInputs) -> MasterStatus {
        let status = self.master.tick(inputs);
        self.target.tick(self.master.lines_mut());

        let levels = self.levels();
        if let Some(event) = self.monitor.observe(levels.data, levels.clock) {
            match self.decoder.feed(event) {
                Ok(Some(transfer)) => self.last_transfer = Some(transfer),
                Ok(None) => {}
                Err(e) => self.decode_error = Some(e),
            }
        }

        status
    }

    /// Run `ticks` idle ticks with the master enabled
    pub fn idle(&mut self, ticks: u32) -> u32 {
        let mut done_pulses = 0;
        for _ in 0..ticks {
            if self.tick(&ControlInputs::enabled()).transaction_done {
                done_pulses += 1;
            }
        }
        done_pulses
    }

    /// Run one request from start to done
    ///
    /// Start is held for a single tick. After the done pulse the bench runs
    /// one more bus period so stray done pulses are counted.
    pub fn run(&mut self, request: TransactionRequest) -> Result<Completion, BenchError> {
        if self.master.status().busy {
            return Err(BenchError::Busy);
        }
        self.last_transfer = None;

        if !self.tick(&ControlInputs::start(request)).busy {
            return Err(BenchError::Busy);
        }

        let budget = self.tick_budget();
        let mut ticks = 1;
        let mut done_pulses = 0;
        loop {
            if ticks >= budget {
                return Err(BenchError::Timeout { ticks });
            }
            let status = self.tick(&ControlInputs::enabled());
            ticks += 1;
            if status.transaction_done {
                done_pulses += 1;
            }
            if !status.busy {
                break;
            }
        }

        done_pulses += self.idle(self.master.config().divisor());

        Ok(Completion {
            result: self.master.result(),
            ticks,
            done_pulses,
            transfer: self.last_transfer.take(),
        })
    }

    /// Tick budget for one transaction
    pub fn tick_budget(&self) -> u32 {
        self.master.config().divisor() * PERIODS_PER_TRANSACTION + 16
    }

    /// Current wire levels
    pub fn levels(&self) -> BusLevels {
        self.master.lines().levels()
    }

    /// First decode error seen since the last call, if any
    pub fn take_decode_error(&mut self) -> Option<DecodeError> {
        self.decode_error.take()
    }

    /// Get access to the master
    pub fn master(&self) -> &BusMaster<SimulatedBus> {
        &self.master
    }

    /// Get mutable access to the master
    pub fn master_mut(&mut self) -> &mut BusMaster<SimulatedBus> {
        &mut self.master
    }

    /// Get access to the target
    pub fn target(&self) -> &RegisterTarget {
        &self.target
    }

    /// Get mutable access to the target
    pub fn target_mut(&mut self) -> &mut RegisterTarget {
        &mut self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{AckPolicy, Register};
    use wattwire_core::config::{CALIBRATION_REGISTER, CONFIGURATION_REGISTER};
    use wattwire_core::{SequencerState, TransactionError};
    use wattwire_hal::Line;

    fn bench() -> TestBench {
        // 8 ticks per bus period
        let config = BusConfig::new(800_000, 100_000);
        TestBench::new(config, RegisterTarget::default())
    }

    fn values(transfer: &Transfer) -> Vec<u8> {
        transfer.values().iter().copied().collect()
    }

    #[test]
    fn test_write_with_payload() {
        let mut bench = bench();
        let done = bench
            .run(TransactionRequest::write(CALIBRATION_REGISTER, 0x1000))
            .unwrap();

        assert_eq!(done.done_pulses, 1);
        assert_eq!(done.result.into_result(), Ok(0));

        let transfer = done.transfer.unwrap();
        assert_eq!(transfer.address, 0x40);
        assert!(!transfer.read);
        assert!(transfer.address_acked);
        assert_eq!(values(&transfer), [CALIBRATION_REGISTER, 0x10, 0x00]);
        assert!(transfer.bytes.iter().all(|b| b.acked));

        assert_eq!(bench.target().register(Register::Calibration), 0x1000);
        assert_eq!(bench.take_decode_error(), None);
    }

    #[test]
    fn test_configuration_write() {
        let mut bench = bench();
        bench
            .run(TransactionRequest::write(CONFIGURATION_REGISTER, 0x019F))
            .unwrap();
        assert_eq!(bench.target().register(Register::Configuration), 0x019F);
    }

    #[test]
    fn test_pointer_only_write() {
        let mut bench = bench();
        let done = bench.run(TransactionRequest::write(0x02, 0xFFFF)).unwrap();

        let transfer = done.transfer.unwrap();
        assert_eq!(values(&transfer), [0x02]);
        assert!(!done.result.acknowledge_failed);
        assert_eq!(bench.target().pointer(), 0x02);
        assert_eq!(bench.target().writes(), 0);
    }

    #[test]
    fn test_read_after_select() {
        let mut bench = bench();
        bench.target_mut().set_register(Register::BusVoltage, 0x5D9A);

        bench.run(TransactionRequest::select(0x02)).unwrap();
        let done = bench.run(TransactionRequest::read()).unwrap();

        assert_eq!(done.done_pulses, 1);
        assert_eq!(done.result.into_result(), Ok(0x5D9A));
        assert_eq!(bench.master().status().read_payload, 0x5D9A);

        let transfer = done.transfer.unwrap();
        assert!(transfer.read);
        assert!(transfer.address_acked);
        assert_eq!(transfer.word(0), Some(0x5D9A));
        // Master acks the first byte and nacks the last
        assert!(transfer.bytes[0].acked);
        assert!(!transfer.bytes[1].acked);
    }

    #[test]
    fn test_write_then_read_back() {
        let mut bench = bench();
        bench
            .run(TransactionRequest::write(CALIBRATION_REGISTER, 0xA55A))
            .unwrap();
        let done = bench.run(TransactionRequest::read()).unwrap();

        assert_eq!(done.result.into_result(), Ok(0xA55A));
    }

    #[test]
    fn test_write_leaves_read_payload() {
        let mut bench = bench();
        bench.target_mut().set_register(Register::Configuration, 0x1234);
        bench.run(TransactionRequest::read()).unwrap();

        let done = bench.run(TransactionRequest::select(0x01)).unwrap();
        assert_eq!(done.result.read_payload, 0x1234);
    }

    #[test]
    fn test_missing_target() {
        let config = BusConfig::new(800_000, 100_000);
        let target = RegisterTarget::new(0x41);
        let mut bench = TestBench::new(config, target);

        let done = bench
            .run(TransactionRequest::write(CALIBRATION_REGISTER, 0x0001))
            .unwrap();

        assert_eq!(done.done_pulses, 1);
        assert_eq!(
            done.result.into_result(),
            Err(TransactionError::AcknowledgeFailed)
        );
        // Full transaction is still clocked out
        let transfer = done.transfer.unwrap();
        assert!(!transfer.address_acked);
        assert_eq!(transfer.bytes.len(), 3);
    }

    #[test]
    fn test_nack_on_payload() {
        let mut bench = bench();
        bench.target_mut().set_policy(AckPolicy::AddressOnly);

        let done = bench
            .run(TransactionRequest::write(CALIBRATION_REGISTER, 0x0001))
            .unwrap();
        assert!(done.result.acknowledge_failed);
        assert!(done.transfer.unwrap().address_acked);

        // Next accepted request clears the flag
        bench.target_mut().set_policy(AckPolicy::Always);
        let done = bench.run(TransactionRequest::read()).unwrap();
        assert!(!done.result.acknowledge_failed);
    }

    #[test]
    fn test_never_ack_read() {
        let mut bench = bench();
        bench.target_mut().set_policy(AckPolicy::Never);

        let done = bench.run(TransactionRequest::read()).unwrap();
        assert_eq!(done.done_pulses, 1);
        assert!(done.result.acknowledge_failed);
        // Released line reads as ones
        assert_eq!(done.result.read_payload, 0xFFFF);
    }

    #[test]
    fn test_transaction_timing() {
        let mut bench = bench();
        let done = bench.run(TransactionRequest::select(0x01)).unwrap();

        // Start, address and pointer bytes with acks, two stop falls
        let falls = 1 + 2 * 9 + 2;
        assert_eq!(done.ticks, 1 + 4 + 8 * (falls - 1));
    }

    #[test]
    fn test_start_ignored_while_busy() {
        let mut bench = bench();
        bench.target_mut().set_register(Register::Configuration, 0x4321);

        bench.tick(&ControlInputs::start(TransactionRequest::read()));
        bench.idle(40);
        assert!(bench.master().status().busy);

        let status = bench.tick(&ControlInputs::start(TransactionRequest::write(
            CALIBRATION_REGISTER,
            0xFFFF,
        )));
        assert!(status.busy);
        assert_eq!(bench.run(TransactionRequest::read()), Err(BenchError::Busy));

        let mut done_pulses = 0;
        while bench.master().status().busy {
            if bench.tick(&ControlInputs::enabled()).transaction_done {
                done_pulses += 1;
            }
        }

        assert_eq!(done_pulses, 1);
        assert_eq!(bench.master().result().into_result(), Ok(0x4321));
        assert_eq!(bench.target().register(Register::Calibration), 0);
    }

    #[test]
    fn test_reset_mid_transaction() {
        let mut bench = bench();
        bench.tick(&ControlInputs::start(TransactionRequest::write(
            CALIBRATION_REGISTER,
            0x0000,
        )));
        bench.idle(60);
        assert!(bench.master().status().busy);

        bench.master_mut().reset();

        let master = bench.master();
        assert_eq!(master.state(), SequencerState::Ready);
        assert!(!master.status().busy);
        assert!(!master.status().acknowledge_failed);
        assert!(!master.lines().master_drives(Line::Data));
        assert!(!master.lines().master_drives(Line::Clock));

        // Recovers once the target has seen a stop
        bench.idle(8);
        bench.target_mut().set_register(Register::Configuration, 0x0042);
        let mut recovered = false;
        for _ in 0..3 {
            if let Ok(done) = bench.run(TransactionRequest::read()) {
                if done.result.into_result() == Ok(0x0042) {
                    recovered = true;
                    break;
                }
            }
        }
        assert!(recovered);
    }

    #[test]
    fn test_disable_aborts() {
        let mut bench = bench();
        bench.tick(&ControlInputs::start(TransactionRequest::read()));
        bench.idle(30);

        let status = bench.tick(&ControlInputs::default());
        assert!(!status.busy);
        assert!(!status.transaction_done);
        assert!(!bench.master().lines().master_drives(Line::Data));
        assert!(!bench.master().lines().master_drives(Line::Clock));

        // Nothing moves while disabled
        for _ in 0..50 {
            let status = bench.tick(&ControlInputs::default());
            assert!(!status.busy);
            assert!(bench.levels().clock);
        }
    }

    #[test]
    fn test_lines_idle_between_transactions() {
        let mut bench = bench();
        bench.run(TransactionRequest::select(0x03)).unwrap();

        assert_eq!(bench.levels(), BusLevels::IDLE);
        assert_eq!(bench.idle(100), 0);
        assert_eq!(bench.levels(), BusLevels::IDLE);
    }

    #[test]
    fn test_data_changes_only_with_clock_low() {
        let mut bench = bench();
        bench.tick(&ControlInputs::start(TransactionRequest::write(
            CALIBRATION_REGISTER,
            0x6C93,
        )));

        let mut last = bench.levels();
        let mut conditions = 0;
        for _ in 0..bench.tick_budget() {
            bench.tick(&ControlInputs::enabled());
            let now = bench.levels();
            if last.clock && now.clock && last.data != now.data {
                conditions += 1;
            }
            last = now;
        }

        // Only the start and the stop condition
        assert_eq!(conditions, 2);
    }
}
