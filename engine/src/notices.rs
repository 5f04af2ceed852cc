use hexfog_core::{Event, Notice, NoticeLevel, RemovalError};

/// User-visible notice for a world event, if the event warrants one.
pub(crate) fn notice_for(event: &Event) -> Option<Notice> {
    let notice = match event {
        Event::FogReset => Notice::new(NoticeLevel::Info, "Map has been reset"),
        Event::ViewReset => Notice::new(NoticeLevel::Info, "View has been reset"),
        Event::TokenSelected { token: Some(_) } => {
            Notice::new(NoticeLevel::Info, "Token selected (drag to move)")
        }
        Event::TokenAdded { .. } => Notice::new(NoticeLevel::Success, "Token added"),
        Event::TokenUpdated { .. } => Notice::new(NoticeLevel::Success, "Token updated"),
        Event::TokenRemoved { .. } => Notice::new(NoticeLevel::Success, "Token removed"),
        Event::TokenRemovalRejected { reason } => match reason {
            RemovalError::NoTokenAtPosition => {
                Notice::new(NoticeLevel::Warning, "No token at that location")
            }
            RemovalError::MissingToken => {
                Notice::new(NoticeLevel::Warning, "That token no longer exists")
            }
        },
        Event::TokensCleared { count: 0 } => Notice::new(NoticeLevel::Info, "No tokens to clear"),
        Event::TokensCleared { .. } => Notice::new(NoticeLevel::Info, "All tokens removed"),
        Event::DebugOverlayChanged { enabled } => {
            let state = if *enabled { "on" } else { "off" };
            Notice::new(NoticeLevel::Info, format!("Debug overlay {state}"))
        }
        _ => return None,
    };
    Some(notice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexfog_core::TokenIndex;

    #[test]
    fn clearing_nothing_is_reported() {
        let notice = notice_for(&Event::TokensCleared { count: 0 }).expect("notice");
        assert_eq!(notice.message, "No tokens to clear");
    }

    #[test]
    fn drag_frames_are_silent() {
        assert_eq!(
            notice_for(&Event::TokenMoved {
                token: TokenIndex::new(0)
            }),
            None
        );
        assert_eq!(notice_for(&Event::TokenSelected { token: None }), None);
    }
}
