//! cli::commands::registry
//!
//! Records which command groups the current invocation registered, and the
//! section labels used to present them.
//!
//! # Design
//!
//! Availability is decided once, at the end of the bootstrap, by explicit
//! [`CommandRegistry::register`] calls. Dispatch consults the registry
//! instead of re-deriving "is there a config, is there a project" in every
//! handler; `status` uses the section labels to explain what is currently
//! available and why.

use std::fmt;

/// Availability groups commands belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandGroup {
    /// Always available.
    Base,
    /// Needs a resolved project.
    Project,
    /// Needs a loaded configuration.
    Db,
    /// Needs a loaded configuration.
    Import,
}

/// Presentation label attached to a registered group. Purely descriptive;
/// it never affects dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section(String);

impl Section {
    pub fn new(label: impl Into<String>) -> Self {
        Section(label.into())
    }

    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One registered group with its presentation data.
#[derive(Debug, Clone)]
pub struct RegisteredGroup {
    group: CommandGroup,
    section: Section,
    commands: Vec<&'static str>,
}

impl RegisteredGroup {
    pub fn section(&self) -> &Section {
        &self.section
    }

    pub fn commands(&self) -> &[&'static str] {
        &self.commands
    }
}

/// The set of groups registered for one invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    groups: Vec<RegisteredGroup>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        CommandRegistry { groups: Vec::new() }
    }

    /// Register a group under a section label. Registering a group twice
    /// replaces its earlier entry.
    pub fn register(&mut self, group: CommandGroup, section: Section, commands: &[&'static str]) {
        self.groups.retain(|entry| entry.group != group);
        self.groups.push(RegisteredGroup {
            group,
            section,
            commands: commands.to_vec(),
        });
    }

    pub fn is_registered(&self, group: CommandGroup) -> bool {
        self.groups.iter().any(|entry| entry.group == group)
    }

    /// Registered groups in registration order.
    pub fn groups(&self) -> impl Iterator<Item = &RegisteredGroup> {
        self.groups.iter()
    }
}
