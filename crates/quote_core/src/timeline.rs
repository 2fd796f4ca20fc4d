use crate::{ItemId, LiveEvent};

/// Visual emphasis shared by badges, timeline entries and notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Default,
    Muted,
    Success,
    Warning,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub id: u64,
    pub received_at: String,
    pub event_type: &'static str,
    pub item_id: Option<ItemId>,
    pub message: String,
    pub tone: Tone,
}

impl TimelineEntry {
    pub fn from_event(id: u64, event: &LiveEvent, received_at: String) -> Self {
        let event_type = event.type_name();
        let message = if event.raw_data.is_null() {
            event_type.to_string()
        } else {
            format!("{event_type}: {}", event.raw_data)
        };
        Self {
            id,
            received_at,
            event_type,
            item_id: event.item_id().map(ToOwned::to_owned),
            message,
            tone: tone_for_event_type(event_type),
        }
    }
}

pub fn tone_for_event_type(event_type: &str) -> Tone {
    if event_type.contains("failed") {
        Tone::Destructive
    } else if event_type.contains("completed") {
        Tone::Success
    } else if event_type.contains("anti-bot") {
        Tone::Warning
    } else {
        Tone::Default
    }
}

/// A dismissible message shown after a user-triggered action settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub tone: Tone,
}
