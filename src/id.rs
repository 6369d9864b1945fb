use compact_str::CompactString;

/// Upstream identifier of a feed event. Zero is reserved for the sentinel.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct EventId {
    value: u64,
}

/// GitHub login the activity feed is addressed by
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash)]
pub struct Login {
    value: CompactString,
}

impl EventId {
    pub const SENTINEL: EventId = EventId { value: 0 };

    pub fn new(id: u64) -> Self {
        Self { value: id }
    }

    /// Parses the leading decimal digits of `raw`.
    ///
    /// Anything without a leading digit, or a value that does not fit in a
    /// `u64`, collapses to the sentinel.
    pub fn parse_lossy(raw: &str) -> Self {
        let digits_end = raw
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(raw.len());

        raw[..digits_end]
            .parse::<u64>()
            .map(Self::new)
            .unwrap_or(Self::SENTINEL)
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn is_sentinel(&self) -> bool {
        self.value == 0
    }
}

impl Login {
    pub fn new<S: Into<CompactString>>(login: S) -> Self {
        Self { value: login.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl std::fmt::Display for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}
