//! Wireless connection supervisor
//!
//! Watches client presence on the wireless transport once per idle cycle and reacts only to
//! edges against the previous poll. What happens on a lost client depends on the
//! [`RecoveryPolicy`] baked into the deployment.

use crate::clock::SampleClock;
use crate::telemetry::Telemetry;
use crate::transport::Transport;

pub const MSG_CONNECTED: &str = "Connection successful!";
pub const MSG_LOST_RESTARTING: &str = "Bluetooth client disconnected. Restarting...";
pub const MSG_LOST_WAITING: &str = "Bluetooth client disconnected. Waiting for reconnect...";
pub const MSG_RECONNECTED: &str = "Bluetooth client reconnected.";

/// Whether wireless writes go out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub enum LinkState {
    Disconnected,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub enum SupervisorState {
    AwaitingFirstConnection,
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub enum RecoveryPolicy {
    /// Hand a restart back to the boot sequencer.
    Restart,
    /// Spin until the client comes back, then carry on.
    Resume,
}

/// What the idle loop should do after a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub enum Control {
    Continue,
    Restart,
}

#[derive(Debug)]
pub struct ConnectionSupervisor {
    state: SupervisorState,
    policy: RecoveryPolicy,
    disconnects: u32,
}

impl ConnectionSupervisor {
    pub fn new(policy: RecoveryPolicy) -> Self {
        Self {
            state: SupervisorState::AwaitingFirstConnection,
            policy,
            disconnects: 0,
        }
    }

    /// Probe once without blocking. A present client is announced right away; otherwise the
    /// supervisor keeps waiting for it on later polls while sampling goes ahead.
    pub fn from_probe<W: Transport, L: Transport>(
        policy: RecoveryPolicy,
        telemetry: &mut Telemetry<W, L>,
    ) -> Self {
        let mut supervisor = Self::new(policy);
        if telemetry.wireless_mut().is_available() {
            supervisor.establish(telemetry);
        } else {
            crate::log_info!("no wireless client at boot, sampling ungated");
        }
        supervisor
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn policy(&self) -> RecoveryPolicy {
        self.policy
    }

    pub fn disconnects(&self) -> u32 {
        self.disconnects
    }

    /// Block until the first client shows up, probing every `poll_ms`.
    pub fn await_first_connection<C: SampleClock, W: Transport, L: Transport>(
        &mut self,
        clock: &mut C,
        telemetry: &mut Telemetry<W, L>,
        poll_ms: u32,
    ) {
        crate::log_info!("waiting for wireless client");
        while !telemetry.wireless_mut().is_available() {
            clock.delay_ms(poll_ms);
        }
        self.establish(telemetry);
    }

    /// One idle-cycle poll.
    pub fn poll<W: Transport, L: Transport>(&mut self, telemetry: &mut Telemetry<W, L>) -> Control {
        let present = telemetry.wireless_mut().is_available();

        match (self.state, present) {
            (SupervisorState::AwaitingFirstConnection, true) => {
                self.establish(telemetry);
                Control::Continue
            }
            (SupervisorState::Connected, false) => self.on_lost(telemetry),
            (SupervisorState::Disconnected, true) => {
                self.on_restored(telemetry);
                Control::Continue
            }
            _ => Control::Continue,
        }
    }

    fn establish<W: Transport, L: Transport>(&mut self, telemetry: &mut Telemetry<W, L>) {
        self.state = SupervisorState::Connected;
        telemetry.set_link(LinkState::Connected);
        crate::log_info!("wireless client connected");
        telemetry.status(MSG_CONNECTED);
    }

    fn on_lost<W: Transport, L: Transport>(&mut self, telemetry: &mut Telemetry<W, L>) -> Control {
        self.state = SupervisorState::Disconnected;
        self.disconnects += 1;
        telemetry.set_link(LinkState::Disconnected);
        crate::log_warn!("wireless client lost ({} so far)", self.disconnects);

        match self.policy {
            RecoveryPolicy::Restart => {
                telemetry.status(MSG_LOST_RESTARTING);
                Control::Restart
            }
            RecoveryPolicy::Resume => {
                telemetry.status(MSG_LOST_WAITING);
                while !telemetry.wireless_mut().is_available() {
                    core::hint::spin_loop();
                }
                self.on_restored(telemetry);
                Control::Continue
            }
        }
    }

    fn on_restored<W: Transport, L: Transport>(&mut self, telemetry: &mut Telemetry<W, L>) {
        self.state = SupervisorState::Connected;
        telemetry.set_link(LinkState::Connected);
        crate::log_info!("wireless client restored");
        telemetry.status(MSG_RECONNECTED);
    }
}
