// libmfc1k/src/session/tracker.rs

//! Debouncing of repeated detections of the same card.

use std::time::{Duration, Instant};

use crate::reader::CardReader;
use crate::types::{TagResponse, TagType, Uid};
use crate::Result;

/// Tracker state: no card, or the last card seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No card remembered
    Idle,
    /// Last card seen within the window
    Tracking(Uid),
}

/// A tag found by one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// Selected UID
    pub uid: Uid,
    /// Family from the ATQA
    pub tag_type: TagType,
    /// True when the UID differs from the tracked card at poll time
    pub is_new: bool,
}

/// Remembers the last card seen so the same physical card is not processed
/// again on every polling tick.
///
/// The tracked card is forgotten as soon as a poll reports no tag (or the
/// reader fails the detection), and in any case once more than
/// `forget_after` has passed since the last [`touch`](Self::touch).
#[derive(Debug, Clone)]
pub struct SessionTracker {
    last_uid: Option<Uid>,
    last_event: Option<Instant>,
    forget_after: Duration,
}

impl SessionTracker {
    /// Idle tracker forgetting cards after `forget_after` of silence.
    pub fn new(forget_after: Duration) -> Self {
        Self {
            last_uid: None,
            last_event: None,
            forget_after,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        match self.last_uid {
            Some(uid) => SessionState::Tracking(uid),
            None => SessionState::Idle,
        }
    }

    /// UID of the tracked card.
    pub fn last_uid(&self) -> Option<&Uid> {
        self.last_uid.as_ref()
    }

    /// Staleness window.
    pub fn forget_after(&self) -> Duration {
        self.forget_after
    }

    /// True unless `uid` is the tracked card.
    pub fn is_new_card(&self, uid: &Uid) -> bool {
        self.last_uid.as_ref() != Some(uid)
    }

    /// Remember `uid` as seen at `now`.
    pub fn touch(&mut self, uid: Uid, now: Instant) {
        if self.is_new_card(&uid) {
            log::debug!("tracking card {}", uid);
        }
        self.last_uid = Some(uid);
        self.last_event = Some(now);
    }

    /// Forget the tracked card when it has been silent longer than the
    /// window. Returns true when a card was dropped.
    pub fn expire_if_stale(&mut self, now: Instant) -> bool {
        let stale = match self.last_event {
            Some(at) => now.saturating_duration_since(at) > self.forget_after,
            None => false,
        };
        if stale && self.last_uid.is_some() {
            log::debug!("card silent for more than {:?}, forgetting it", self.forget_after);
            self.reset();
            return true;
        }
        false
    }

    /// Back to [`SessionState::Idle`].
    pub fn reset(&mut self) {
        self.last_uid = None;
        self.last_event = None;
    }

    /// Run one detect + select sequence on `reader`.
    ///
    /// Returns `Ok(None)` when no tag answers. The tracker is not touched;
    /// callers decide whether the detection counts as an event.
    pub fn poll<R: CardReader + ?Sized>(
        &mut self,
        reader: &mut R,
        now: Instant,
    ) -> Result<Option<Detection>> {
        self.expire_if_stale(now);

        match Self::detect(reader) {
            Ok(Some((uid, tag_type))) => Ok(Some(Detection {
                uid,
                tag_type,
                is_new: self.is_new_card(&uid),
            })),
            Ok(None) => {
                if self.last_uid.is_some() {
                    log::debug!("card left the field");
                }
                self.reset();
                Ok(None)
            }
            Err(err) => {
                self.reset();
                Err(err)
            }
        }
    }

    fn detect<R: CardReader + ?Sized>(reader: &mut R) -> Result<Option<(Uid, TagType)>> {
        reader.init()?;
        match reader.request_tag()? {
            TagResponse::NoTag => Ok(None),
            TagResponse::Present(tag_type) => {
                let uid = reader.select_tag()?;
                log::trace!("selected {} ({})", uid, tag_type);
                Ok(Some((uid, tag_type)))
            }
        }
    }
}
