//! Document tree nodes produced by the RTF parser.

use serde::{Deserialize, Serialize};

use super::types::{Alignment, CharFormat};

/// A top-level node of the parsed document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Paragraph(Paragraph),
    PageBreak,
}

impl Node {
    /// Dispatches this node to the visitor. Paragraph nodes call
    /// [`NodeVisitor::visit_paragraph`] first, then
    /// [`NodeVisitor::visit_run`] for each run in order.
    pub fn visit<V: NodeVisitor + ?Sized>(&self, visitor: &mut V) {
        match self {
            Node::Paragraph(paragraph) => {
                visitor.visit_paragraph(paragraph);
                for run in &paragraph.runs {
                    visitor.visit_run(run);
                }
            }
            Node::PageBreak => visitor.visit_page_break(),
        }
    }
}

/// A paragraph: zero or more runs sharing one alignment.
///
/// Empty paragraphs are kept because each one still stands for a `\par`
/// in the source text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub alignment: Alignment,
    pub runs: Vec<Run>,
}

impl Paragraph {
    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

/// A span of text with uniform character formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    pub format: CharFormat,
}

/// Read-only walk over parsed nodes. Every method has a no-op default,
/// so a visitor implements only the node kinds it cares about.
pub trait NodeVisitor {
    fn visit_paragraph(&mut self, _paragraph: &Paragraph) {}
    fn visit_run(&mut self, _run: &Run) {}
    fn visit_page_break(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl NodeVisitor for Recorder {
        fn visit_paragraph(&mut self, paragraph: &Paragraph) {
            self.events.push(format!("para:{}", paragraph.runs.len()));
        }

        fn visit_run(&mut self, run: &Run) {
            self.events.push(format!("run:{}", run.text));
        }

        fn visit_page_break(&mut self) {
            self.events.push("page".to_string());
        }
    }

    fn run(text: &str) -> Run {
        Run {
            text: text.to_string(),
            format: CharFormat::default(),
        }
    }

    #[test]
    fn test_visit_dispatches_paragraph_then_runs() {
        let node = Node::Paragraph(Paragraph {
            alignment: Alignment::Left,
            runs: vec![run("a"), run("b")],
        });

        let mut recorder = Recorder::default();
        node.visit(&mut recorder);
        assert_eq!(recorder.events, vec!["para:2", "run:a", "run:b"]);

        let mut recorder = Recorder::default();
        Node::PageBreak.visit(&mut recorder);
        assert_eq!(recorder.events, vec!["page"]);
    }

    #[test]
    fn test_paragraph_text_concatenates_runs() {
        let paragraph = Paragraph {
            alignment: Alignment::Left,
            runs: vec![run("Hello, "), run("world")],
        };
        assert_eq!(paragraph.text(), "Hello, world");
    }

    #[test]
    fn test_default_visitor_methods_are_no_ops() {
        struct Silent;
        impl NodeVisitor for Silent {}

        let mut silent = Silent;
        Node::PageBreak.visit(&mut silent);
    }
}
