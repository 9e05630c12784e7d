//! Prompt templates rendered with `minijinja`.

use crate::agent::ports::{AgentError, AgentResult};
use minijinja::Environment;
use serde::Serialize;

/// Deck generation prompt.
pub const PRESENTATION: &str = "\
You are preparing a {{ template }} slide deck.
Instructions: {{ instructions }}
{% if slide_count %}Produce exactly {{ slide_count }} slides.
{% endif %}{% if attachments %}Source files:
{% for name in attachments %}- {{ name }}
{% endfor %}{% endif %}Return the deck as titled sections of titled slides.";

/// Grounded answer prompt.
pub const DOCUMENT: &str = "\
Answer the question using only the sources below. Cite every claim with the
bracketed source id it comes from. If the sources do not answer the question,
say so.
Question: {{ question }}
{% for passage in passages %}[{{ passage.source_id }}] {{ passage.text }}
{% endfor %}{% for excerpt in excerpts %}Attachment {{ excerpt.name }}:
{{ excerpt.text }}
{% endfor %}";

/// Conversational answer prompt.
pub const CHAT: &str = "\
{% if hits %}Current information from the web:
{% for hit in hits %}- {{ hit.title }} ({{ hit.url }}): {{ hit.snippet }}
{% endfor %}{% endif %}{% if search_unavailable %}Web search was unavailable; say so if the answer depends on current events.
{% endif %}User: {{ message }}";

/// Renders `template` against `context`.
///
/// # Errors
///
/// Returns [`AgentError::Prompt`] when the template fails to render.
pub fn render(template: &str, context: impl Serialize) -> AgentResult<String> {
    let environment = Environment::new();
    environment
        .render_str(template, context)
        .map_err(|error| AgentError::Prompt(error.to_string()))
}
