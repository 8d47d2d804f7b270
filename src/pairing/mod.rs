//! Pairing with the television.
//!
//! | Module | Flow |
//! |--------|------|
//! | `token` | Token granted over the WebSocket channel after on-screen approval |
//! | `pin` | Legacy PIN exchange over the DIAL port |

mod pin;
mod token;

pub use pin::{
    DEFAULT_PAIRING_APP_ID, DEFAULT_PAIRING_DEVICE_ID, PairedIdentity, PairingSession, PinHandshake,
    PinPairing,
};
pub use token::{
    DEFAULT_PAIR_ATTEMPTS, DEFAULT_PAIR_DELAY, RetryPolicy, request_token, token_from_reply,
};
