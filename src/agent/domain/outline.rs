//! Deck outlines produced by the generative backend.

use serde::{Deserialize, Serialize};

/// One slide of a generated deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideOutline {
    /// Slide title.
    pub title: String,
    /// Bullet points.
    #[serde(default)]
    pub bullets: Vec<String>,
}

/// A titled group of slides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionOutline {
    /// Section title.
    pub title: String,
    /// Slides in presentation order.
    pub slides: Vec<SlideOutline>,
}

/// Structured deck content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckOutline {
    /// Deck title.
    pub title: String,
    /// Sections in presentation order.
    pub sections: Vec<SectionOutline>,
}

impl DeckOutline {
    /// Returns the total number of slides across all sections.
    #[must_use]
    pub fn slide_count(&self) -> usize {
        self.sections.iter().map(|section| section.slides.len()).sum()
    }

    /// Returns section titles in order.
    #[must_use]
    pub fn section_titles(&self) -> Vec<String> {
        self.sections
            .iter()
            .map(|section| section.title.clone())
            .collect()
    }
}
