//! DASH7 Mode-2 data-link, network and transport engine.
//!
//! Exposes the protocol logic for integration testing and for boards to
//! drive.  Radio, file system, security and routing stay behind the
//! traits in [`ports`]; nothing here touches hardware.
//!
//! ```text
//!   Dll ──▶ SessionStack        (session)
//!    │  ──▶ Comm / CSMA-CA      (csma)
//!    │  ──▶ Network  (M2NP)     (m2np)  ──▶ Transport (M2QP)  (m2qp)
//!    └──── RadioPort / FilePort / ...   (ports)
//! ```

#![deny(unused_must_use)]

pub mod config;
pub mod csma;
pub mod dll;
pub mod error;
pub mod m2np;
pub mod m2qp;
pub mod ports;
pub mod queue;
pub mod session;
pub mod time;

pub use config::StackConfig;
pub use dll::Dll;
pub use error::{Error, Result};
pub use ports::Ports;
