//! Sequencer states
//!
//! The sequencer is in exactly one of these states. Transitions happen
//! only on bus clock edges; see [`Sequencer`](super::Sequencer).

/// Sequencer states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerState {
    /// Idle, both lines released, waiting for a request
    #[default]
    Ready,
    /// Start condition issued, about to send the address MSB
    Start,
    /// Sending the remaining address bits and the direction bit
    Command,
    /// Target acknowledges the address byte
    SlaveAck1,
    /// Sending the register pointer byte
    Write,
    /// Sending the 16-bit payload, one byte at a time
    WriteRegister,
    /// Target acknowledges a pointer or payload byte
    SlaveAck2,
    /// Receiving the 16-bit word, one byte at a time
    Read,
    /// Master acknowledges (or refuses) a received byte
    MasterAck,
    /// Preparing the stop condition
    Stop,
    /// Releasing the bus and reporting completion
    EndTransaction,
}

impl SequencerState {
    /// Check if this is the idle state
    pub fn is_idle(&self) -> bool {
        matches!(self, SequencerState::Ready)
    }

    /// Check if the master is sending bits in this state
    pub fn is_transmitting(&self) -> bool {
        matches!(
            self,
            SequencerState::Start
                | SequencerState::Command
                | SequencerState::Write
                | SequencerState::WriteRegister
        )
    }

    /// Check if the target is expected to acknowledge in this state
    pub fn is_slave_ack(&self) -> bool {
        matches!(self, SequencerState::SlaveAck1 | SequencerState::SlaveAck2)
    }

    /// Check if this state belongs to the stop sequence
    pub fn is_stopping(&self) -> bool {
        matches!(self, SequencerState::Stop | SequencerState::EndTransaction)
    }
}
