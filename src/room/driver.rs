//! Frame scheduler for a battle client

use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::battle::ports::Arena;
use crate::battle::{BattleClient, BattleError};

use super::hub::{RoomEvent, RoomSubscription};

/// What woke the driver up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Frame,
    Event,
}

/// Run `client` until it leaves the session or the room stream ends.
///
/// Frames advance the client by a fixed `1 / frame_rate` of simulated time;
/// room events are applied as they arrive. `on_wake` sees the client after
/// every frame and event.
pub async fn drive<A, F>(
    mut client: BattleClient<A>,
    mut events: RoomSubscription,
    mut on_wake: F,
) -> Result<BattleClient<A>, BattleError>
where
    A: Arena,
    F: FnMut(&BattleClient<A>, Wake),
{
    let dt = client.config().frame_delta();
    let mut frames = interval(Duration::from_secs_f32(dt));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = frames.tick() => {
                client.tick(dt)?;
                on_wake(&client, Wake::Frame);
                if !client.is_in_session() {
                    debug!("Client left the session");
                    break;
                }
            }
            event = events.recv() => match event {
                Ok(event) => {
                    let closed = matches!(event, RoomEvent::Closed { .. });
                    client.handle(event)?;
                    on_wake(&client, Wake::Event);
                    if closed {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Room events lagged, replica may diverge");
                }
                Err(RecvError::Closed) => {
                    debug!("Room event stream closed");
                    break;
                }
            }
        }
    }
    Ok(client)
}
