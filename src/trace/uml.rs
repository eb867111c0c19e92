//! This module contains [`SequenceDiagram`], a trace sink that renders the
//! event stream as a PlantUML sequence diagram. Useful for seeing who
//! resumed whom in a producer/consumer chain.
use crate::trace::{TraceEvent, TraceSink};

/// Collects trace events and renders them as PlantUML text.
///
/// Coroutines become participants, transfers become arrows, yields and
/// terminal transitions become notes. Feed the result to any PlantUML
/// renderer.
///
/// # Example
///
/// ```ignore
/// let diagram = Rc::new(RefCell::new(SequenceDiagram::new()));
/// rt.set_trace(Box::new(Rc::clone(&diagram)));
/// // ... drive some generators ...
/// println!("{}", diagram.borrow().render());
/// ```
#[derive(Debug)]
pub struct SequenceDiagram {
    driver: String,
    participants: Vec<String>,
    lines: Vec<String>,
}

impl SequenceDiagram {
    /// Creates an empty diagram. The external driver participant is named
    /// `driver`.
    pub fn new() -> Self {
        Self::with_driver("driver")
    }

    /// Creates an empty diagram with the given name for the external driver
    /// participant.
    pub fn with_driver(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            participants: Vec::new(),
            lines: Vec::new(),
        }
    }

    fn add_participant(&mut self, name: &str) {
        if !self.participants.iter().any(|p| p == name) {
            self.participants.push(name.to_string());
        }
    }

    /// Renders the collected events as a PlantUML document.
    pub fn render(&self) -> String {
        let mut out = String::from("@startuml\n");
        out.push_str(&format!("participant {}\n", self.driver));
        for participant in &self.participants {
            out.push_str(&format!("participant {}\n", participant));
        }
        out.push('\n');
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("@enduml\n");
        out
    }
}

impl Default for SequenceDiagram {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceSink for SequenceDiagram {
    fn record(&mut self, event: &TraceEvent) {
        match event {
            TraceEvent::Spawned { co } => self.add_participant(co),
            TraceEvent::Resumed { co } => {
                self.lines.push(format!("{} -> {} : resume", self.driver, co));
            }
            TraceEvent::Transferred { from, to } => {
                self.lines.push(format!("{} -> {} : transfer", from, to));
            }
            TraceEvent::Yielded { co } => {
                self.lines.push(format!("note over {} : yield", co));
            }
            TraceEvent::Suspended { co } => {
                self.lines.push(format!("{} --> {} : suspend", co, self.driver));
            }
            TraceEvent::Parked { co } => {
                self.lines.push(format!("{} --> {} : park", co, self.driver));
            }
            TraceEvent::Completed { co } => {
                self.lines.push(format!("note over {} : done", co));
            }
            TraceEvent::Faulted { co, fault } => {
                self.lines.push(format!("note over {} : fault: {}", co, fault));
            }
            TraceEvent::Destroyed { co } => {
                self.lines.push(format!("destroy {}", co));
            }
        }
    }
}
