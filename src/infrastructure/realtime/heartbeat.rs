use std::time::Duration;

use super::constants::HEARTBEAT_TIMEOUT_MULTIPLIER;
use super::error::{ChannelError, ChannelResult};

/// Heart-beat intervals agreed during the STOMP handshake. `None` disables
/// a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Heartbeat {
    pub outgoing: Option<Duration>,
    pub incoming: Option<Duration>,
}

impl Heartbeat {
    /// Header value offered in `CONNECT`.
    #[must_use]
    pub fn offer(outgoing: Duration, incoming: Duration) -> String {
        format!("{},{}", millis(outgoing), millis(incoming))
    }

    /// Combines our offer with the broker's `heart-beat` header.
    ///
    /// # Errors
    ///
    /// Returns `Protocol` if the header is not two comma-separated integers.
    pub fn negotiate(
        outgoing: Duration,
        incoming: Duration,
        server_header: Option<&str>,
    ) -> ChannelResult<Self> {
        let Some(header) = server_header else {
            return Ok(Self::default());
        };

        let (sx, sy) = parse_header(header)?;
        let (cx, cy) = (millis(outgoing), millis(incoming));

        Ok(Self {
            outgoing: agree(cx, sy),
            incoming: agree(cy, sx),
        })
    }

    /// How long the connection may stay silent before it is considered dead.
    #[must_use]
    pub fn incoming_timeout(&self) -> Option<Duration> {
        self.incoming
            .map(|interval| interval.mul_f64(HEARTBEAT_TIMEOUT_MULTIPLIER))
    }
}

fn agree(ours: u64, theirs: u64) -> Option<Duration> {
    if ours == 0 || theirs == 0 {
        None
    } else {
        Some(Duration::from_millis(ours.max(theirs)))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

fn parse_header(header: &str) -> ChannelResult<(u64, u64)> {
    let invalid = || ChannelError::protocol(format!("invalid heart-beat header {header:?}"));

    let (x, y) = header.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse().map_err(|_| invalid())?;
    let y = y.trim().parse().map_err(|_| invalid())?;
    Ok((x, y))
}
