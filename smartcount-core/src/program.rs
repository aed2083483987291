use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// Title of the built-in default program
pub const DEFAULT_PROGRAM_TITLE: &str = "Smart countdown";

/// One timed unit of the agenda
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Display title
    pub title: String,
    /// Planned length in seconds. Zero is allowed: the slot stays but occupies no time.
    #[serde(rename = "seconds")]
    pub duration_seconds: u64,
    /// Presenter names (display only)
    #[serde(default)]
    pub presenters: Vec<String>,
}

impl Section {
    /// Create a new section without presenters
    pub fn new(title: impl Into<String>, duration_seconds: u64) -> Self {
        Self {
            title: title.into(),
            duration_seconds,
            presenters: Vec::new(),
        }
    }

    /// Add a presenter name
    #[must_use]
    pub fn with_presenter(mut self, name: impl Into<String>) -> Self {
        self.presenters.push(name.into());
        self
    }

    /// Whether a nudge down by `step_seconds` should be offered for this section.
    ///
    /// Sections at or below one step are not shrunk further from the
    /// interactive controls.
    #[must_use]
    pub const fn can_shrink(&self, step_seconds: u64) -> bool {
        self.duration_seconds > step_seconds
    }
}

/// An ordered, non-empty list of sections plus a title
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Program {
    pub title: String,
    sections: Vec<Section>,
}

impl Program {
    /// Create a program from its sections.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyProgram`] if `sections` is empty.
    pub fn new(title: impl Into<String>, sections: Vec<Section>) -> Result<Self> {
        if sections.is_empty() {
            return Err(CoreError::EmptyProgram);
        }
        Ok(Self {
            title: title.into(),
            sections,
        })
    }

    /// All sections in timeline order
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Section at `index`, if any
    #[must_use]
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// Number of sections (always at least one)
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Always `false`; present for API symmetry with `len`
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Index of the last section
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.sections.len().saturating_sub(1)
    }

    /// Sum of all section durations in seconds
    #[must_use]
    pub fn total_duration_seconds(&self) -> u64 {
        self.sections
            .iter()
            .fold(0_u64, |acc, s| acc.saturating_add(s.duration_seconds))
    }

    /// Duration of each section, in order
    #[must_use]
    pub fn durations(&self) -> Vec<u64> {
        self.sections.iter().map(|s| s.duration_seconds).collect()
    }

    /// Seconds from program start to the start of section `index`
    #[must_use]
    pub fn offset_of(&self, index: usize) -> u64 {
        self.sections
            .iter()
            .take(index)
            .fold(0_u64, |acc, s| acc.saturating_add(s.duration_seconds))
    }

    /// Insert a section at `index`, shifting later sections back.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SectionIndexOutOfRange`] if `index > len`.
    pub fn insert(&mut self, index: usize, section: Section) -> Result<()> {
        if index > self.sections.len() {
            return Err(CoreError::SectionIndexOutOfRange {
                index,
                len: self.sections.len(),
            });
        }
        self.sections.insert(index, section);
        Ok(())
    }

    /// Append a section at the end of the timeline
    pub fn push(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Remove and return the section at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LastSection`] if only one section remains, or
    /// [`CoreError::SectionIndexOutOfRange`] if `index` is invalid.
    pub fn remove(&mut self, index: usize) -> Result<Section> {
        if self.sections.len() == 1 {
            return Err(CoreError::LastSection);
        }
        if index >= self.sections.len() {
            return Err(CoreError::SectionIndexOutOfRange {
                index,
                len: self.sections.len(),
            });
        }
        Ok(self.sections.remove(index))
    }

    /// Replace the section at `index`, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SectionIndexOutOfRange`] if `index` is invalid.
    pub fn replace(&mut self, index: usize, section: Section) -> Result<Section> {
        let len = self.sections.len();
        let slot = self
            .sections
            .get_mut(index)
            .ok_or(CoreError::SectionIndexOutOfRange { index, len })?;
        Ok(std::mem::replace(slot, section))
    }

    /// Set the duration of the section at `index`. Out-of-range indices are ignored.
    pub(crate) fn set_duration(&mut self, index: usize, duration_seconds: u64) {
        if let Some(section) = self.sections.get_mut(index) {
            section.duration_seconds = duration_seconds;
        }
    }
}

impl Default for Program {
    /// The built-in three-section program used when no config overrides it
    fn default() -> Self {
        Self {
            title: DEFAULT_PROGRAM_TITLE.to_string(),
            sections: vec![
                Section::new("Discuss the problem", 120),
                Section::new("Discuss possible solutions", 120),
                Section::new("Make a plan", 120),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(durations: &[u64]) -> Program {
        let sections = durations
            .iter()
            .enumerate()
            .map(|(i, d)| Section::new(format!("Section {}", i + 1), *d))
            .collect();
        Program::new("Test", sections).unwrap()
    }

    #[test]
    fn test_default_program() {
        let program = Program::default();
        assert_eq!(program.title, DEFAULT_PROGRAM_TITLE);
        assert_eq!(program.len(), 3);
        assert_eq!(program.total_duration_seconds(), 360);
        assert!(program.sections().iter().all(|s| s.presenters.is_empty()));
    }

    #[test]
    fn test_new_rejects_empty() {
        assert!(matches!(
            Program::new("Empty", Vec::new()),
            Err(CoreError::EmptyProgram)
        ));
    }

    #[test]
    fn test_total_duration_with_zero_section() {
        let program = program(&[60, 0, 30]);
        assert_eq!(program.total_duration_seconds(), 90);
    }

    #[test]
    fn test_offset_of() {
        let program = program(&[60, 0, 30]);
        assert_eq!(program.offset_of(0), 0);
        assert_eq!(program.offset_of(1), 60);
        assert_eq!(program.offset_of(2), 60);
        assert_eq!(program.offset_of(3), 90);
    }

    #[test]
    fn test_insert() {
        let mut program = program(&[60, 30]);
        program.insert(1, Section::new("Middle", 45)).unwrap();
        assert_eq!(program.durations(), vec![60, 45, 30]);
        assert_eq!(program.section(1).unwrap().title, "Middle");
    }

    #[test]
    fn test_insert_out_of_range() {
        let mut program = program(&[60]);
        let result = program.insert(5, Section::new("Nowhere", 10));
        assert!(matches!(
            result,
            Err(CoreError::SectionIndexOutOfRange { index: 5, len: 1 })
        ));
    }

    #[test]
    fn test_remove_last_section_rejected() {
        let mut program = program(&[60]);
        assert!(matches!(program.remove(0), Err(CoreError::LastSection)));
        assert_eq!(program.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut program = program(&[60, 30, 10]);
        let removed = program.remove(1).unwrap();
        assert_eq!(removed.duration_seconds, 30);
        assert_eq!(program.durations(), vec![60, 10]);
    }

    #[test]
    fn test_replace() {
        let mut program = program(&[60, 30]);
        let old = program.replace(0, Section::new("New", 15)).unwrap();
        assert_eq!(old.duration_seconds, 60);
        assert_eq!(program.durations(), vec![15, 30]);
        assert!(program.replace(2, Section::new("Bad", 1)).is_err());
    }

    #[test]
    fn test_can_shrink() {
        assert!(Section::new("Long", 31).can_shrink(30));
        assert!(!Section::new("Short", 30).can_shrink(30));
        assert!(!Section::new("Empty", 0).can_shrink(30));
    }

    #[test]
    fn test_section_with_presenter() {
        let section = Section::new("Demo", 300)
            .with_presenter("Ada")
            .with_presenter("Grace");
        assert_eq!(section.presenters, vec!["Ada", "Grace"]);
    }

    #[test]
    fn test_section_deserialize_from_toml() {
        let section: Section = toml::from_str("title = \"Intro\"\nseconds = 90").unwrap();
        assert_eq!(section, Section::new("Intro", 90));
    }
}
