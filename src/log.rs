//! Logging facade. In tests we print directly so `cargo test -- --nocapture`
//! shows pass activity without wiring up a logger; elsewhere we defer to the
//! `log` facade so a consuming binary picks the backend.

#[cfg(test)]
pub(crate) use std::{
    eprintln as error, eprintln as warn, println as debug, println as info, println as trace,
};

#[cfg(not(test))]
pub(crate) use log::{debug, error, info, trace, warn};
