//! Markdown rendering with syntax highlighting

use anyhow::Result;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::helpers::html_escape;

const EXCERPT_MARKER: &str = "<!-- more -->";

/// Markdown renderer with syntect-highlighted code blocks
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme: Option<Theme>,
}

impl MarkdownRenderer {
    /// Create a renderer using the default highlight theme
    pub fn new() -> Self {
        Self::with_theme("base16-ocean.dark")
    }

    /// Create a renderer with a named syntect theme
    pub fn with_theme(theme_name: &str) -> Self {
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = themes
            .remove(theme_name)
            .or_else(|| themes.into_values().next());
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
        }
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> Result<String> {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES;

        let mut events: Vec<Event> = Vec::new();
        // Some(lang) while inside a code block
        let mut code_lang: Option<String> = None;
        let mut code = String::new();

        for event in Parser::new_ext(markdown, options) {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    code_lang = Some(match kind {
                        CodeBlockKind::Fenced(lang) => lang.to_string(),
                        CodeBlockKind::Indented => String::new(),
                    });
                    code.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    let lang = code_lang.take().unwrap_or_default();
                    let highlighted = self.highlight_code(&code, &lang);
                    events.push(Event::Html(CowStr::from(highlighted)));
                }
                Event::Text(text) if code_lang.is_some() => code.push_str(&text),
                other => events.push(other),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        Ok(html_output)
    }

    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let lang = if lang.is_empty() { "text" } else { lang };
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let highlighted = self.theme.as_ref().and_then(|theme| {
            highlighted_html_for_string(code, &self.syntax_set, syntax, theme).ok()
        });

        match highlighted {
            Some(html) => format!(r#"<figure class="highlight {}">{}</figure>"#, lang, html),
            None => format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                lang,
                html_escape(code)
            ),
        }
    }

    /// Split markdown at `<!-- more -->`
    ///
    /// Returns the excerpt (if marked) and the body with the marker removed.
    pub fn split_excerpt(content: &str) -> (Option<String>, String) {
        match content.split_once(EXCERPT_MARKER) {
            Some((excerpt, rest)) => {
                let excerpt = excerpt.trim().to_string();
                let body = format!("{}\n\n{}", excerpt, rest.trim());
                (Some(excerpt), body)
            }
            None => (None, content.to_string()),
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}
