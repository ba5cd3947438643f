//! Bus master
//!
//! Composes the [`ClockPhaseGenerator`] and the [`Sequencer`] over a
//! [`LineDriver`]. The caller drives it with one [`tick`](BusMaster::tick)
//! per reference clock cycle and reads back a [`MasterStatus`].

use wattwire_hal::LineDriver;

use crate::clock::{ClockPhase, ClockPhaseGenerator};
use crate::config::BusConfig;
use crate::transaction::{Sequencer, SequencerState, TransactionRequest, TransactionResult};

/// Inputs sampled by the master every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlInputs {
    /// Master enable; deasserting it aborts any transaction
    pub enable: bool,
    /// Start request, acted on at its rising edge
    pub start: bool,
    /// Parameters latched when a start is accepted
    pub request: TransactionRequest,
}

impl ControlInputs {
    /// Enabled, no start request
    pub const fn enabled() -> Self {
        Self {
            enable: true,
            start: false,
            request: TransactionRequest::read(),
        }
    }

    /// Enabled with start asserted for `request`
    pub const fn start(request: TransactionRequest) -> Self {
        Self {
            enable: true,
            start: true,
            request,
        }
    }
}

/// Outputs of the master after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MasterStatus {
    /// A transaction is in flight
    pub busy: bool,
    /// An acknowledge window read high during the current or last transaction
    pub acknowledge_failed: bool,
    /// High for exactly one tick when a transaction completes
    pub transaction_done: bool,
    /// Word from the last completed read
    pub read_payload: u16,
}

impl MasterStatus {
    /// Result of the transaction that just completed, if any
    pub fn completed(&self) -> Option<TransactionResult> {
        self.transaction_done.then_some(TransactionResult {
            read_payload: self.read_payload,
            acknowledge_failed: self.acknowledge_failed,
        })
    }
}

/// Tick-driven bus master
pub struct BusMaster<L: LineDriver> {
    lines: L,
    config: BusConfig,
    generator: ClockPhaseGenerator,
    sequencer: Sequencer,
    /// Start input on the previous tick
    last_start: bool,
}

impl<L: LineDriver> BusMaster<L> {
    /// Create a new master, releasing both lines
    pub fn new(config: BusConfig, mut lines: L) -> Self {
        let mut sequencer = Sequencer::new(&config);
        sequencer.reset(&mut lines);

        Self {
            lines,
            generator: ClockPhaseGenerator::with_divisor(config.divisor()),
            sequencer,
            config,
            last_start: false,
        }
    }

    /// Advance by one reference tick
    pub fn tick(&mut self, inputs: &ControlInputs) -> MasterStatus {
        let start_edge = inputs.start && !self.last_start;
        self.last_start = inputs.start;

        if !inputs.enable {
            if self.sequencer.is_busy() {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "disabled in {}, transaction aborted",
                    self.sequencer.state()
                );
                self.sequencer.reset(&mut self.lines);
            }
            // Idle phase, no edge: only ends a pending done pulse
            let phase = self.generator.tick(false, false);
            self.sequencer.step(phase, &mut self.lines);
            return self.status();
        }

        let accepted = start_edge && self.sequencer.accept(inputs.request);
        let phase = self.generator.tick(true, accepted);
        self.sequencer.step(phase, &mut self.lines);

        self.status()
    }

    /// Synchronous reset
    ///
    /// Returns to ready and releases both lines, from any state.
    pub fn reset(&mut self) {
        self.sequencer.reset(&mut self.lines);
        self.generator.reset();
        self.last_start = false;
    }

    /// Outputs as of the last tick
    pub fn status(&self) -> MasterStatus {
        MasterStatus {
            busy: self.sequencer.is_busy(),
            acknowledge_failed: self.sequencer.ack_failed(),
            transaction_done: self.sequencer.is_done(),
            read_payload: self.sequencer.read_payload(),
        }
    }

    /// Result outputs
    pub fn result(&self) -> TransactionResult {
        self.sequencer.result()
    }

    /// Current sequencer state
    pub fn state(&self) -> SequencerState {
        self.sequencer.state()
    }

    /// Last generator phase
    pub fn phase(&self) -> ClockPhase {
        self.generator.phase()
    }

    /// Active configuration
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Get access to the line driver
    pub fn lines(&self) -> &L {
        &self.lines
    }

    /// Get mutable access to the line driver
    pub fn lines_mut(&mut self) -> &mut L {
        &mut self.lines
    }

    /// Release the line driver
    pub fn into_lines(self) -> L {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CALIBRATION_REGISTER;
    use wattwire_hal::Line;

    // Lines with nobody else on the bus: every ack window reads high
    #[derive(Default)]
    struct LonelyLines {
        data_low: bool,
        clock_low: bool,
        data_changes_while_clock_high: u32,
    }

    impl LineDriver for LonelyLines {
        fn drive_low(&mut self, line: Line) {
            match line {
                Line::Data => {
                    if !self.data_low && !self.clock_low {
                        self.data_changes_while_clock_high += 1;
                    }
                    self.data_low = true;
                }
                Line::Clock => self.clock_low = true,
            }
        }

        fn release(&mut self, line: Line) {
            match line {
                Line::Data => {
                    if self.data_low && !self.clock_low {
                        self.data_changes_while_clock_high += 1;
                    }
                    self.data_low = false;
                }
                Line::Clock => self.clock_low = false,
            }
        }

        fn is_high(&mut self, line: Line) -> bool {
            match line {
                Line::Data => !self.data_low,
                Line::Clock => !self.clock_low,
            }
        }
    }

    fn master(divisor: u32) -> BusMaster<LonelyLines> {
        let config = BusConfig::new(divisor * 100_000, 100_000);
        BusMaster::new(config, LonelyLines::default())
    }

    /// Tick with start held for one tick, then until done or `limit`
    fn run(
        master: &mut BusMaster<LonelyLines>,
        request: TransactionRequest,
        limit: u32,
    ) -> (u32, u32) {
        let mut done_pulses = 0;
        let mut ticks = 0;

        master.tick(&ControlInputs::start(request));
        while ticks < limit {
            ticks += 1;
            let status = master.tick(&ControlInputs::enabled());
            if status.transaction_done {
                done_pulses += 1;
            }
            if !status.busy {
                break;
            }
        }

        (ticks, done_pulses)
    }

    #[test]
    fn test_new_releases_lines() {
        let master = master(4);
        assert!(!master.lines().data_low);
        assert!(!master.lines().clock_low);
        assert_eq!(master.state(), SequencerState::Ready);
        assert_eq!(master.config().divisor(), 4);
    }

    #[test]
    fn test_accept_sets_busy_immediately() {
        let mut master = master(4);
        let status = master.tick(&ControlInputs::start(TransactionRequest::read()));
        assert!(status.busy);
        assert!(!status.transaction_done);
    }

    #[test]
    fn test_start_condition_after_half_period() {
        let mut master = master(8);
        master.tick(&ControlInputs::start(TransactionRequest::read()));

        // Phase restarted high: first fall is divisor/2 ticks later
        for _ in 0..3 {
            master.tick(&ControlInputs::enabled());
            assert!(!master.lines().data_low);
        }
        master.tick(&ControlInputs::enabled());
        assert!(master.lines().data_low);
        assert!(!master.lines().clock_low);
        assert_eq!(master.state(), SequencerState::Start);
    }

    #[test]
    fn test_transaction_completes_without_target() {
        let mut master = master(4);
        let request = TransactionRequest::write(CALIBRATION_REGISTER, 0x1234);
        let (_, done_pulses) = run(&mut master, request, 1000);

        assert_eq!(done_pulses, 1);
        let status = master.status();
        assert!(!status.busy);
        assert!(status.acknowledge_failed);
        assert_eq!(master.state(), SequencerState::Ready);
        assert!(!master.lines().data_low);
        assert!(!master.lines().clock_low);
    }

    #[test]
    fn test_data_only_changes_while_clock_low() {
        let mut master = master(6);
        let request = TransactionRequest::write(CALIBRATION_REGISTER, 0xF0F0);
        run(&mut master, request, 1000);

        // Start and stop conditions only
        assert_eq!(master.lines().data_changes_while_clock_high, 2);
    }

    #[test]
    fn test_transaction_length() {
        let divisor = 4;
        let mut master = master(divisor);
        let request = TransactionRequest::write(CALIBRATION_REGISTER, 0);
        let (ticks, _) = run(&mut master, request, 1000);

        // One falling edge per period, the first half a period after the
        // start: start condition, 4 bytes of 9 clocks, two for the stop
        let falls = 1 + 4 * 9 + 2;
        assert_eq!(ticks, divisor / 2 + divisor * (falls - 1));
    }

    #[test]
    fn test_start_is_edge_triggered() {
        let mut master = master(4);
        let held = ControlInputs::start(TransactionRequest::select(0x01));

        master.tick(&held);
        let mut done_pulses = 0;
        for _ in 0..1000 {
            if master.tick(&held).transaction_done {
                done_pulses += 1;
            }
        }

        // Holding start high does not re-trigger
        assert_eq!(done_pulses, 1);
        assert!(!master.status().busy);
    }

    #[test]
    fn test_start_ignored_while_busy() {
        let mut master = master(4);
        master.tick(&ControlInputs::start(TransactionRequest::select(0x01)));
        for _ in 0..10 {
            master.tick(&ControlInputs::enabled());
        }

        master.tick(&ControlInputs::start(TransactionRequest::read()));
        assert!(master.status().busy);
        assert_eq!(master.state(), SequencerState::Command);

        let (_, done_pulses) = run_to_idle(&mut master);
        assert_eq!(done_pulses, 1);
    }

    fn run_to_idle(master: &mut BusMaster<LonelyLines>) -> (u32, u32) {
        let mut done_pulses = 0;
        let mut ticks = 0;
        while master.status().busy && ticks < 1000 {
            ticks += 1;
            if master.tick(&ControlInputs::enabled()).transaction_done {
                done_pulses += 1;
            }
        }
        (ticks, done_pulses)
    }

    #[test]
    fn test_disable_aborts_transaction() {
        let mut master = master(4);
        master.tick(&ControlInputs::start(TransactionRequest::read()));
        for _ in 0..20 {
            master.tick(&ControlInputs::enabled());
        }
        assert!(master.status().busy);

        let status = master.tick(&ControlInputs::default());
        assert!(!status.busy);
        assert!(!status.transaction_done);
        assert!(!status.acknowledge_failed);
        assert_eq!(master.state(), SequencerState::Ready);
        assert_eq!(master.phase(), ClockPhase::IDLE);
        assert!(!master.lines().data_low);
        assert!(!master.lines().clock_low);
    }

    #[test]
    fn test_done_pulse_ends_when_disabled() {
        let mut master = master(4);
        master.tick(&ControlInputs::start(TransactionRequest::select(0x01)));

        let mut done_seen = false;
        for _ in 0..1000 {
            if master.tick(&ControlInputs::enabled()).transaction_done {
                done_seen = true;
                break;
            }
        }
        assert!(done_seen);

        // Disabled right after the done tick
        for _ in 0..5 {
            let status = master.tick(&ControlInputs::default());
            assert!(!status.transaction_done);
            assert_eq!(status.completed(), None);
            assert!(!status.busy);
        }

        // Result outputs survive the disable
        assert!(master.status().acknowledge_failed);
    }

    #[test]
    fn test_disabled_ignores_start() {
        let mut master = master(4);
        let status = master.tick(&ControlInputs {
            enable: false,
            start: true,
            request: TransactionRequest::read(),
        });
        assert!(!status.busy);

        // Start still held: no rising edge when enable returns
        let status = master.tick(&ControlInputs::start(TransactionRequest::read()));
        assert!(!status.busy);
    }

    #[test]
    fn test_reset_mid_transaction() {
        let mut master = master(4);
        let request = TransactionRequest::write(CALIBRATION_REGISTER, 0);
        master.tick(&ControlInputs::start(request));
        for _ in 0..30 {
            master.tick(&ControlInputs::enabled());
        }

        master.reset();

        assert_eq!(master.state(), SequencerState::Ready);
        assert!(!master.status().busy);
        assert!(!master.lines().data_low);
        assert!(!master.lines().clock_low);

        // A fresh start is accepted straight away
        assert!(master.tick(&ControlInputs::start(TransactionRequest::read())).busy);
    }

    #[test]
    fn test_completed_only_on_done_tick() {
        let status = MasterStatus {
            busy: false,
            acknowledge_failed: false,
            transaction_done: true,
            read_payload: 0x1234,
        };
        assert_eq!(
            status.completed().map(|r| r.into_result()),
            Some(Ok(0x1234))
        );

        let status = MasterStatus {
            transaction_done: false,
            ..status
        };
        assert_eq!(status.completed(), None);
    }
}
