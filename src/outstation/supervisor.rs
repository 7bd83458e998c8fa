//! Session supervisor: restart and broadcast indications, restart requests
//! and connection state reporting.

use tracing::{debug, info};

use super::traits::{
    ConnectionState, ConnectionStateListener, OutstationApplication, OutstationInformation,
    RestartDelay,
};
use crate::types::{FunctionCode, Iin1, Variation};

/// Outcome of a COLD_RESTART or WARM_RESTART request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RestartOutcome {
    /// Restart accepted, report the delay in this object
    Accepted { variation: Variation, delay: u16 },
    /// Restart not supported
    NotSupported,
}

#[derive(Debug)]
pub(crate) struct Supervisor {
    restart: bool,
    broadcast: bool,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    /// A new supervisor reports DEVICE_RESTART until the master clears it.
    pub fn new() -> Self {
        Self {
            restart: true,
            broadcast: false,
        }
    }

    pub fn restart_iin(&self) -> bool {
        self.restart
    }

    /// Master wrote 0 to IIN1.7.
    pub fn clear_restart(&mut self, information: &mut dyn OutstationInformation) {
        if self.restart {
            info!("Restart IIN cleared by master");
        }
        self.restart = false;
        information.clear_restart_iin();
    }

    /// Remember that a broadcast was processed; reported in the next response.
    pub fn latch_broadcast(&mut self) {
        self.broadcast = true;
    }

    /// IIN1 bits owned by the supervisor. Reading them releases the broadcast latch.
    pub fn take_iin1(&mut self) -> Iin1 {
        let iin1 = Iin1::default()
            .with(Iin1::DEVICE_RESTART, self.restart)
            .with(Iin1::BROADCAST, self.broadcast);
        self.broadcast = false;
        iin1
    }

    /// Ask the application to restart.
    pub fn restart(
        &mut self,
        function: FunctionCode,
        application: &mut dyn OutstationApplication,
    ) -> RestartOutcome {
        let delay = match function {
            FunctionCode::ColdRestart => application.cold_restart(),
            FunctionCode::WarmRestart => application.warm_restart(),
            _ => None,
        };

        match delay {
            Some(delay) => {
                info!("{} accepted, delay {:?}", function, delay);
                self.restart = true;
                match delay {
                    RestartDelay::Seconds(delay) => RestartOutcome::Accepted {
                        variation: Variation::Group52Var1,
                        delay,
                    },
                    RestartDelay::Milliseconds(delay) => RestartOutcome::Accepted {
                        variation: Variation::Group52Var2,
                        delay,
                    },
                }
            }
            None => {
                debug!("{} not supported by application", function);
                RestartOutcome::NotSupported
            }
        }
    }

    /// Report a transport session state change.
    pub fn connection_changed(
        &self,
        listener: &mut dyn ConnectionStateListener,
        state: ConnectionState,
    ) {
        info!("Connection state: {:?}", state);
        listener.on_change(state);
    }
}
