use chrono::{DateTime, Utc};
use scout_ui_types::FindingEvent;

/// An item the agent reported, frozen at the moment it was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub title: Option<String>,
    pub price: Option<String>,
    pub notes: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl Finding {
    pub fn new(event: FindingEvent, received_at: DateTime<Utc>) -> Finding {
        Finding {
            title: event.title,
            price: event.price,
            notes: event.notes,
            url: event.url,
            image_url: event.image_url.filter(|url| !url.is_empty()),
            received_at,
        }
    }

    /// One-line description, e.g. `Walkman WM-2 - $45`.
    pub fn headline(&self) -> String {
        let title = self.title.as_deref().unwrap_or("Untitled item");
        match self.price.as_deref() {
            Some(price) if !price.is_empty() => format!("{title} - {price}"),
            _ => title.to_string(),
        }
    }
}

impl From<FindingEvent> for Finding {
    fn from(event: FindingEvent) -> Finding {
        Finding::new(event, Utc::now())
    }
}
