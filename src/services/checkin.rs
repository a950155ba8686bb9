use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::api::OpenhouseApi;
use crate::models::attendance;

const INVALID: &str = "Invalid";
const MSG_SUCCESS: &str = "Log-In Berhasil!";
const MSG_FAILURE: &str = "Log-In Gagal!";

/// Outcome of one resolved scan, shown in the dismissible modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub success: bool,
    pub message: String,
}

impl ScanResult {
    fn success() -> Self {
        Self {
            success: true,
            message: MSG_SUCCESS.to_string(),
        }
    }

    fn failure() -> Self {
        Self {
            success: false,
            message: MSG_FAILURE.to_string(),
        }
    }
}

/// The scanner screen's state machine. Frames only advance it while it is
/// Scanning; Resolving and Result suspend decoding so at most one
/// resolution is ever in flight per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Scanning,
    Resolving,
    Result(ScanResult),
}

/// Snapshot of a session the scan page polls for.
#[derive(Debug, Clone, Serialize)]
pub struct ScanView {
    pub state: &'static str,
    pub payload: String,
    pub name: String,
    pub success: Option<bool>,
    pub message: Option<String>,
}

/// One check-in screen instance. Owns the whole scan state; nothing about
/// a scan lives outside this struct.
#[derive(Debug)]
pub struct CheckinSession {
    state: ScanState,
    payload: String,
    name: String,
    last_seen: Instant,
}

impl CheckinSession {
    pub fn new() -> Self {
        Self {
            state: ScanState::Scanning,
            payload: INVALID.to_string(),
            name: INVALID.to_string(),
            last_seen: Instant::now(),
        }
    }

    pub fn view(&self) -> ScanView {
        let (state, success, message) = match &self.state {
            ScanState::Scanning => ("scanning", None, None),
            ScanState::Resolving => ("resolving", None, None),
            ScanState::Result(result) => (
                "result",
                Some(result.success),
                Some(result.message.clone()),
            ),
        };
        ScanView {
            state,
            payload: self.payload.clone(),
            name: self.name.clone(),
            success,
            message,
        }
    }

    /// Feed one camera frame through the state machine. Frames arriving
    /// while a result is displayed (or a resolution is running) are
    /// ignored.
    pub async fn process_frame(&mut self, api: &dyn OpenhouseApi, frame: &[u8]) -> ScanView {
        self.touch();
        if self.state != ScanState::Scanning {
            return self.view();
        }

        let Some(payload) = decode_frame(frame) else {
            // No readable code in this frame; stay armed.
            self.payload = INVALID.to_string();
            self.name = INVALID.to_string();
            return self.view();
        };

        self.payload = payload.clone();
        self.state = ScanState::Resolving;
        self.resolve(api, &payload).await;
        self.view()
    }

    async fn resolve(&mut self, api: &dyn OpenhouseApi, payload: &str) {
        let lookup = match api.check_qrcode(payload).await {
            Ok(lookup) => lookup,
            Err(e) => {
                error!("QR lookup failed: {e}");
                self.name = INVALID.to_string();
                self.state = ScanState::Result(ScanResult::failure());
                return;
            }
        };

        if !lookup.exists {
            self.name = INVALID.to_string();
            self.state = ScanState::Result(ScanResult::failure());
            return;
        }

        self.name = lookup.name.unwrap_or_else(|| INVALID.to_string());
        let phone = lookup.phone.unwrap_or_default();
        let result = match api.update_log(&phone, &attendance::log_timestamp()).await {
            Ok(true) => ScanResult::success(),
            Ok(false) => ScanResult::failure(),
            Err(e) => {
                error!("attendance log write failed for {phone}: {e}");
                ScanResult::failure()
            }
        };
        self.state = ScanState::Result(result);
    }

    /// Close the result modal and re-arm scanning. A no-op while already
    /// Scanning, so rapid repeated dismisses are safe.
    pub fn dismiss(&mut self) -> ScanView {
        self.touch();
        if matches!(self.state, ScanState::Result(_)) {
            self.state = ScanState::Scanning;
        }
        self.view()
    }

    fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_seen.elapsed()
    }
}

impl Default for CheckinSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract a QR payload from raw image bytes. Decode misses are routine
/// (most frames contain no code) and are reported as `None`.
pub fn decode_frame(bytes: &[u8]) -> Option<String> {
    let luma = match image::load_from_memory(bytes) {
        Ok(img) => img.to_luma8(),
        Err(e) => {
            debug!("unreadable frame: {e}");
            return None;
        }
    };

    let (width, height) = (luma.width() as usize, luma.height() as usize);
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| {
        luma.get_pixel(x as u32, y as u32)[0]
    });
    let grids = prepared.detect_grids();
    let grid = grids.first()?;
    match grid.decode() {
        Ok((_meta, content)) => Some(content),
        Err(e) => {
            debug!("grid decode failed: {e}");
            None
        }
    }
}

/// Live scanner sessions, one per open scan page. Pages announce teardown
/// through the close endpoint; sessions whose page vanished without doing
/// so are reclaimed by the sweep when the next page opens.
pub struct ScannerRegistry {
    sessions: Mutex<HashMap<Uuid, Arc<Mutex<CheckinSession>>>>,
    stale_after: Duration,
}

impl ScannerRegistry {
    const STALE_AFTER: Duration = Duration::from_secs(600);

    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            stale_after: Self::STALE_AFTER,
        }
    }

    #[cfg(test)]
    fn with_stale_after(stale_after: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            stale_after,
        }
    }

    pub async fn open(&self) -> Uuid {
        let mut sessions = self.sessions.lock().await;
        Self::sweep(&mut sessions, self.stale_after);

        let id = Uuid::new_v4();
        sessions.insert(id, Arc::new(Mutex::new(CheckinSession::new())));
        id
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<CheckinSession>>> {
        self.sessions.lock().await.get(&id).cloned()
    }

    pub async fn close(&self, id: Uuid) -> bool {
        self.sessions.lock().await.remove(&id).is_some()
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    fn sweep(sessions: &mut HashMap<Uuid, Arc<Mutex<CheckinSession>>>, stale_after: Duration) {
        sessions.retain(|id, session| {
            // A locked session has a request in flight; it is not stale.
            let Ok(session) = session.try_lock() else {
                return true;
            };
            let keep = session.idle_for() < stale_after;
            if !keep {
                warn!("reclaiming abandoned scanner session {id}");
            }
            keep
        });
    }
}

impl Default for ScannerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
