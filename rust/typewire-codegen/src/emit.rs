//! Generated statement accumulation.
//!
//! A [`CodeBlock`] is an ordered list of TypeScript statement lines plus a
//! flag recording whether any of them changes the value's representation.
//! Containers use the flag to drop their loop scaffolding when the element
//! conversion is a plain copy.

const INDENT: &str = "    ";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBlock {
    lines: Vec<String>,
    transforms: bool,
}

impl CodeBlock {
    pub fn new(lines: Vec<String>, transforms: bool) -> Self {
        Self { lines, transforms }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// `dest = src`, or nothing when both name the same location. Never
    /// transforms.
    pub fn identity(src: &str, dest: &str) -> Self {
        if src == dest {
            return Self::empty();
        }
        Self::new(vec![format!("{} = {}", dest, src)], false)
    }

    /// A single converting statement.
    pub fn transform(line: impl Into<String>) -> Self {
        Self::new(vec![line.into()], true)
    }

    /// A single scaffolding statement that does not convert by itself.
    pub fn line(line: impl Into<String>) -> Self {
        Self::new(vec![line.into()], false)
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn append(&mut self, other: CodeBlock) {
        self.lines.extend(other.lines);
        self.transforms |= other.transforms;
    }

    pub fn concat(blocks: impl IntoIterator<Item = CodeBlock>) -> Self {
        let mut out = Self::empty();
        for block in blocks {
            out.append(block);
        }
        out
    }

    /// The same block, one nesting level deeper.
    pub fn indented(self) -> Self {
        Self {
            lines: self.lines.into_iter().map(|l| format!("{}{}", INDENT, l)).collect(),
            transforms: self.transforms,
        }
    }

    pub fn mark_transforming(&mut self) {
        self.transforms = true;
    }

    /// Newline-joined text, only when the block transforms.
    pub fn joined(&self) -> Option<String> {
        self.transforms.then(|| self.lines.join("\n"))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn transforms(&self) -> bool {
        self.transforms
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
