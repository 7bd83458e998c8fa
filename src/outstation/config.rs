//! Outstation configuration.

use std::time::Duration;

use crate::error::{Dnp3Error, Result};

/// Default solicited confirm timeout in seconds.
pub const DEFAULT_CONFIRM_TIMEOUT: u64 = 5;

/// Default select-to-operate timeout in seconds.
pub const DEFAULT_SELECT_TIMEOUT: u64 = 5;

/// Default number of unsolicited retransmissions.
pub const DEFAULT_MAX_UNSOLICITED_RETRIES: usize = 3;

/// Default maximum fragment size.
pub const DEFAULT_MAX_FRAGMENT_SIZE: usize = 2048;

/// Smallest fragment size every DNP3 device must accept.
pub const MIN_FRAGMENT_SIZE: usize = 249;

/// Default maximum number of controls in one request.
pub const DEFAULT_MAX_CONTROLS_PER_REQUEST: usize = 16;

/// Largest valid data link address; 0xFFF0 and above are reserved.
pub const MAX_LINK_ADDRESS: u16 = 0xFFEF;

/// Outstation configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutstationConfig {
    /// Address of this outstation
    pub outstation_address: u16,
    /// Address of the master
    pub master_address: u16,
    /// Time to wait for a solicited confirm
    pub solicited_confirm_timeout: Duration,
    /// Time to wait for an unsolicited confirm
    pub unsolicited_confirm_timeout: Duration,
    /// Retransmissions of an unconfirmed unsolicited response
    pub max_unsolicited_retries: usize,
    /// Maximum time between SELECT and OPERATE
    pub select_timeout: Duration,
    /// Largest request fragment accepted
    pub max_rx_fragment_size: usize,
    /// Largest response fragment sent
    pub max_tx_fragment_size: usize,
    /// Commands beyond this count in one request are answered with TOO_MANY_OPS
    pub max_controls_per_request: usize,
    /// Unsolicited responses allowed
    pub allow_unsolicited: bool,
    /// Broadcast requests processed
    pub broadcast: bool,
}

impl OutstationConfig {
    /// Create a new configuration with default timeouts and sizes.
    pub fn new(outstation_address: u16, master_address: u16) -> Self {
        Self {
            outstation_address,
            master_address,
            solicited_confirm_timeout: Duration::from_secs(DEFAULT_CONFIRM_TIMEOUT),
            unsolicited_confirm_timeout: Duration::from_secs(DEFAULT_CONFIRM_TIMEOUT),
            max_unsolicited_retries: DEFAULT_MAX_UNSOLICITED_RETRIES,
            select_timeout: Duration::from_secs(DEFAULT_SELECT_TIMEOUT),
            max_rx_fragment_size: DEFAULT_MAX_FRAGMENT_SIZE,
            max_tx_fragment_size: DEFAULT_MAX_FRAGMENT_SIZE,
            max_controls_per_request: DEFAULT_MAX_CONTROLS_PER_REQUEST,
            allow_unsolicited: false,
            broadcast: true,
        }
    }

    /// Set solicited confirm timeout.
    pub fn solicited_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.solicited_confirm_timeout = timeout;
        self
    }

    /// Set unsolicited confirm timeout.
    pub fn unsolicited_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.unsolicited_confirm_timeout = timeout;
        self
    }

    /// Set the number of unsolicited retransmissions.
    pub fn max_unsolicited_retries(mut self, retries: usize) -> Self {
        self.max_unsolicited_retries = retries;
        self
    }

    /// Set select timeout.
    pub fn select_timeout(mut self, timeout: Duration) -> Self {
        self.select_timeout = timeout;
        self
    }

    /// Set the largest request fragment accepted.
    pub fn max_rx_fragment_size(mut self, size: usize) -> Self {
        self.max_rx_fragment_size = size;
        self
    }

    /// Set the largest response fragment sent.
    pub fn max_tx_fragment_size(mut self, size: usize) -> Self {
        self.max_tx_fragment_size = size;
        self
    }

    /// Set the maximum number of controls per request.
    pub fn max_controls_per_request(mut self, count: usize) -> Self {
        self.max_controls_per_request = count;
        self
    }

    /// Enable or disable unsolicited responses.
    pub fn allow_unsolicited(mut self, allow: bool) -> Self {
        self.allow_unsolicited = allow;
        self
    }

    /// Enable or disable processing of broadcast requests.
    pub fn broadcast(mut self, enabled: bool) -> Self {
        self.broadcast = enabled;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.outstation_address > MAX_LINK_ADDRESS {
            return Err(Dnp3Error::invalid_config(format!(
                "Outstation address {} is reserved",
                self.outstation_address
            )));
        }
        if self.master_address > MAX_LINK_ADDRESS {
            return Err(Dnp3Error::invalid_config(format!(
                "Master address {} is reserved",
                self.master_address
            )));
        }
        if self.outstation_address == self.master_address {
            return Err(Dnp3Error::invalid_config_static(
                "Outstation and master addresses must differ",
            ));
        }
        for (name, size) in [
            ("rx", self.max_rx_fragment_size),
            ("tx", self.max_tx_fragment_size),
        ] {
            if !(MIN_FRAGMENT_SIZE..=u16::MAX as usize).contains(&size) {
                return Err(Dnp3Error::invalid_config(format!(
                    "Maximum {} fragment size {} outside {}..={}",
                    name,
                    size,
                    MIN_FRAGMENT_SIZE,
                    u16::MAX
                )));
            }
        }
        if self.max_controls_per_request == 0 {
            return Err(Dnp3Error::invalid_config_static(
                "Maximum controls per request must be greater than zero",
            ));
        }
        if self.solicited_confirm_timeout.is_zero()
            || self.unsolicited_confirm_timeout.is_zero()
            || self.select_timeout.is_zero()
        {
            return Err(Dnp3Error::invalid_config_static(
                "Timeouts must be greater than zero",
            ));
        }
        Ok(())
    }
}
