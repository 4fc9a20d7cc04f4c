// Live stream driver
// Feeds a session from an async frame channel and forwards accepted events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::acceptance::AcceptancePolicy;
use crate::events::{AcceptedEvent, Detection};
use crate::live::session::{LiveSession, SessionSummary};

/// One frame as delivered by the transport layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveFrame {
    pub detections: Vec<Detection>,
    pub timestamp: DateTime<Utc>,
}

impl LiveFrame {
    pub fn new(detections: Vec<Detection>, timestamp: DateTime<Utc>) -> Self {
        LiveFrame {
            detections,
            timestamp,
        }
    }
}

/// Run a session until its frame channel closes
///
/// Every accepted event is forwarded to `events`. A dropped event receiver
/// does not stop counting. Closing the frame channel ends the session,
/// force-closing any pending cluster.
pub async fn drive_session<P>(
    mut session: LiveSession<P>,
    mut frames: mpsc::Receiver<LiveFrame>,
    events: mpsc::Sender<AcceptedEvent>,
) -> SessionSummary
where
    P: AcceptancePolicy,
{
    let mut listener_gone = false;

    while let Some(frame) = frames.recv().await {
        if let Some(event) = session.process_frame(&frame.detections, frame.timestamp) {
            forward(&events, event, &mut listener_gone, session.id()).await;
        }
    }

    let session_id = session.id();
    let (last, summary) = session.end();
    if let Some(event) = last {
        forward(&events, event, &mut listener_gone, session_id).await;
    }

    summary
}

async fn forward(
    events: &mpsc::Sender<AcceptedEvent>,
    event: AcceptedEvent,
    listener_gone: &mut bool,
    session_id: uuid::Uuid,
) {
    if *listener_gone {
        return;
    }
    if events.send(event).await.is_err() {
        log::warn!("Session {}: event listener dropped, counting continues", session_id);
        *listener_gone = true;
    }
}
