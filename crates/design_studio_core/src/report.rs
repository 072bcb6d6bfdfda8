//! crates/design_studio_core/src/report.rs
//!
//! Report assembly. A [`Report`] is a format-agnostic description of a paginated
//! document; [`Report::layout`] breaks it into pages of styled lines that a
//! `ReportRenderer` only has to draw.

use crate::ports::{PortError, PortResult};

/// A titled block of free-flowing text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    pub heading: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub title: String,
    /// Centered lines printed under the title on the first page.
    pub subtitle: Vec<String>,
    /// Adds a title page and a table of contents, and numbers the section headings.
    pub multi_section: bool,
    pub sections: Vec<ReportSection>,
}

/// How a laid-out line is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Title,
    Subtitle,
    Heading,
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub style: LineStyle,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportPage {
    pub lines: Vec<ReportLine>,
}

/// Page capacity in lines and line width in characters, per style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub lines_per_page: usize,
    pub body_chars: usize,
    pub heading_chars: usize,
}

impl Default for PageGeometry {
    /// A4 portrait with 10pt body text on 10mm line pitch.
    fn default() -> Self {
        Self {
            lines_per_page: 26,
            body_chars: 95,
            heading_chars: 55,
        }
    }
}

/// A single-section document: a centered title over the body text.
pub fn build(title: &str, body: &str) -> Report {
    Report {
        title: title.to_string(),
        subtitle: Vec::new(),
        multi_section: false,
        sections: vec![ReportSection {
            heading: String::new(),
            body: body.to_string(),
        }],
    }
}

/// A multi-section document: title page, table of contents, then one page per
/// `(heading, text)` pair in the given order.
pub fn build_full(title: &str, subtitle: &[String], sections: Vec<(String, String)>) -> Report {
    Report {
        title: title.to_string(),
        subtitle: subtitle.to_vec(),
        multi_section: true,
        sections: sections
            .into_iter()
            .map(|(heading, body)| ReportSection { heading, body })
            .collect(),
    }
}

/// Characters in the Windows-1252 extras block (0x80..=0x9F). The five
/// undefined codes in that block have no character.
const WIN_ANSI_EXTRAS: [char; 27] = [
    '\u{20AC}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{017D}', '\u{2018}',
    '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}', '\u{02DC}',
    '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{017E}', '\u{0178}',
];

fn win_ansi(c: char) -> bool {
    let code = u32::from(c);
    code < 0x80 || (0xA0..=0xFF).contains(&code) || WIN_ANSI_EXTRAS.contains(&c)
}

impl Report {
    /// Export formats with the built-in single-byte fonts only carry text that
    /// has a Windows-1252 (WinAnsi) code.
    pub fn check_encoding(&self) -> PortResult<()> {
        let all_text = std::iter::once(self.title.as_str())
            .chain(self.subtitle.iter().map(String::as_str))
            .chain(
                self.sections
                    .iter()
                    .flat_map(|s| [s.heading.as_str(), s.body.as_str()]),
            );
        for text in all_text {
            if let Some(ch) = text.chars().find(|c| !win_ansi(*c)) {
                return Err(PortError::Encoding(format!(
                    "character {:?} (U+{:04X}) is outside Windows-1252",
                    ch,
                    u32::from(ch)
                )));
            }
        }
        Ok(())
    }

    fn numbered_heading(&self, index: usize) -> String {
        let heading = &self.sections[index].heading;
        if self.multi_section {
            format!("{}. {}", index + 1, heading)
        } else {
            heading.clone()
        }
    }

    /// Breaks the report into pages.
    pub fn layout(&self, geometry: &PageGeometry) -> Vec<ReportPage> {
        let mut pager = Pager::new(geometry.lines_per_page.max(1));

        for line in wrap(&self.title, geometry.heading_chars) {
            pager.push(LineStyle::Title, line);
        }
        for sub in &self.subtitle {
            for line in wrap(sub, geometry.body_chars) {
                pager.push(LineStyle::Subtitle, line);
            }
        }

        if self.multi_section {
            pager.break_page();
            pager.push(LineStyle::Heading, "Table of Contents".to_string());
            for index in 0..self.sections.len() {
                pager.push(LineStyle::Body, self.numbered_heading(index));
            }
        }

        for (index, section) in self.sections.iter().enumerate() {
            if self.multi_section {
                pager.break_page();
            }
            let heading = self.numbered_heading(index);
            if !heading.is_empty() {
                for line in wrap(&heading, geometry.heading_chars) {
                    pager.push(LineStyle::Heading, line);
                }
            }
            for line in wrap(&section.body, geometry.body_chars) {
                pager.push(LineStyle::Body, line);
            }
        }

        pager.finish()
    }
}

struct Pager {
    capacity: usize,
    pages: Vec<ReportPage>,
    current: ReportPage,
}

impl Pager {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            pages: Vec::new(),
            current: ReportPage::default(),
        }
    }

    fn push(&mut self, style: LineStyle, text: String) {
        if self.current.lines.len() >= self.capacity {
            self.break_page();
        }
        self.current.lines.push(ReportLine { style, text });
    }

    fn break_page(&mut self) {
        let page = std::mem::take(&mut self.current);
        self.pages.push(page);
    }

    fn finish(mut self) -> Vec<ReportPage> {
        if !self.current.lines.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

/// Greedy word wrap. Explicit newlines are kept, blank lines survive as empty
/// lines and words longer than `width` are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        let mut line_len = 0;
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if line_len > 0 {
                    out.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                let rest = word.split_off(width);
                out.push(word.into_iter().collect());
                word = rest;
            }
            let extra = if line_len == 0 { word.len() } else { word.len() + 1 };
            if line_len + extra > width {
                out.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line.extend(word.iter());
            line_len += word.len();
        }
        out.push(line);
    }
    out
}
