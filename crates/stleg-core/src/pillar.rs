/// One of the four logical service surfaces. Used as the second component
/// of the rate-limit key so that a token cannot evade a pillar's ceiling by
/// attacking a different one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pillar {
    SeaSide,
    DeckSide,
    DockSide,
    MarketSide,
}

impl Pillar {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SeaSide => "seaside",
            Self::DeckSide => "deckside",
            Self::DockSide => "dockside",
            Self::MarketSide => "marketside",
        }
    }

    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "seaside" => Some(Self::SeaSide),
            "deckside" => Some(Self::DeckSide),
            "dockside" => Some(Self::DockSide),
            "marketside" => Some(Self::MarketSide),
            _ => None,
        }
    }

    /// Extract the pillar from a request path of the shape
    /// `/api/v1/{pillar}/...`. Mirrors `path.split("/")[3]` against the raw
    /// path; `None` if the path is too short or the segment isn't a known
    /// pillar.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let segment = path.split('/').filter(|s| !s.is_empty()).nth(2)?;
        Self::from_segment(segment)
    }
}

impl std::fmt::Display for Pillar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
