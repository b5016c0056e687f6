//! Service alert messages.

/// A service alert or remark attached to a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Message {
    /// Short headline
    pub header: String,
    /// Full text
    pub description: String,
    /// Lead paragraph, if the publisher provides one
    pub lead: String,
    /// Link to more information
    pub link: Option<String>,
}

impl Message {
    /// Create a message with a header and description.
    pub fn new(header: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            description: description.into(),
            lead: String::new(),
            link: None,
        }
    }

    /// Set the lead paragraph.
    pub fn with_lead(mut self, lead: impl Into<String>) -> Self {
        self.lead = lead.into();
        self
    }

    /// Set the link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}
