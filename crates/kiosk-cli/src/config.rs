//! Process configuration.
//!
//! Every option can come from the command line or from the environment;
//! `.env` in the working directory is loaded before parsing.

use clap::Parser;
use kiosk_booking::BookingClientConfig;
use kiosk_core::constants::{
    DEFAULT_API_TIMEOUT_MS, DEFAULT_DEBOUNCE_MS, DEFAULT_LISTEN_ADDR, DEFAULT_LOGOUT_TIMEOUT_MS,
    DEFAULT_POLL_PERIOD_MS, DEFAULT_UI_IDLE_TIMEOUT_MS,
};
use kiosk_core::{SessionMode, Tunables};
use kiosk_ui::UiServerConfig;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "kiosk")]
#[command(version, about = "Device check-out kiosk")]
pub struct Config {
    /// Booking backend endpoint
    #[arg(long, env = "API_URL")]
    pub api_url: String,

    /// Bearer token for the booking backend
    #[arg(long, env = "API_TOKEN", hide_env_values = true)]
    pub api_token: String,

    /// Address the UI websocket server listens on
    #[arg(long, env = "LISTEN_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Window (ms) in which repeated reads of the same chip are ignored
    #[arg(
        long,
        env = "READ_TIMEOUT",
        default_value_t = DEFAULT_DEBOUNCE_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub read_timeout: u64,

    /// Pause (ms) between two reader polls
    #[arg(
        long,
        env = "READ_CYCLE",
        default_value_t = DEFAULT_POLL_PERIOD_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub read_cycle: u64,

    /// Idle time (ms) before a logged-in user is logged out
    #[arg(
        long,
        env = "LOGOUT_TIMEOUT",
        default_value_t = DEFAULT_LOGOUT_TIMEOUT_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub logout_timeout: u64,

    /// Timeout (ms) for a whole backend request
    #[arg(
        long,
        env = "API_TIMEOUT",
        default_value_t = DEFAULT_API_TIMEOUT_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub api_timeout: u64,

    /// Close UI connections silent for longer than this (ms)
    #[arg(
        long,
        env = "UI_IDLE_TIMEOUT",
        default_value_t = DEFAULT_UI_IDLE_TIMEOUT_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub ui_idle_timeout: u64,

    /// Enroll chips instead of lending devices
    #[arg(long, env = "REGISTER_MODE", default_value_t = false)]
    pub register_mode: bool,

    /// Type UIDs on standard input instead of using a reader
    #[arg(long, env = "TESTING_MODE", default_value_t = false)]
    pub testing_mode: bool,
}

impl Config {
    pub fn tunables(&self) -> kiosk_core::Result<Tunables> {
        Tunables::new(self.read_timeout, self.read_cycle, self.logout_timeout)
    }

    pub fn session_mode(&self) -> SessionMode {
        SessionMode::from_register_flag(self.register_mode)
    }

    pub fn booking_config(&self) -> BookingClientConfig {
        BookingClientConfig {
            api_url: self.api_url.clone(),
            api_token: self.api_token.clone(),
            timeout: Duration::from_millis(self.api_timeout),
        }
    }

    pub fn ui_config(&self) -> UiServerConfig {
        UiServerConfig {
            bind_addr: self.listen_addr,
            idle_timeout: Duration::from_millis(self.ui_idle_timeout),
        }
    }
}
