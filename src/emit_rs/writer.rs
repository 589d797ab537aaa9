/// Indentation-aware string builder for emitting Rust source text.
pub struct CodeWriter {
    buf: String,
    depth: usize,
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeWriter {
    pub fn new() -> Self {
        Self {
            buf: String::new(),
            depth: 0,
        }
    }

    /// Write a line at the current indentation level.
    pub fn line(&mut self, text: &str) {
        self.write_indent();
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    /// An empty separator line.
    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Open a block: write `text {` and increase indent.
    pub fn open(&mut self, text: &str) {
        self.write_indent();
        self.buf.push_str(text);
        self.buf.push_str(" {\n");
        self.depth += 1;
    }

    /// Close a block: decrease indent and write `}`.
    pub fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.write_indent();
        self.buf.push_str("}\n");
    }

    /// Consume and return the built string.
    pub fn finish(self) -> String {
        self.buf
    }

    fn write_indent(&mut self) {
        for _ in 0..self.depth {
            self.buf.push_str("    ");
        }
    }
}

/// Escape a string for embedding in a Rust double-quoted string literal.
pub fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line() {
        let mut w = CodeWriter::new();
        w.line("let x = 1;");
        assert_eq!(w.finish(), "let x = 1;\n");
    }

    #[test]
    fn test_open_close_indents_by_four() {
        let mut w = CodeWriter::new();
        w.open("fn f()");
        w.line("g();");
        w.close();
        assert_eq!(w.finish(), "fn f() {\n    g();\n}\n");
    }

    #[test]
    fn test_nested_blocks() {
        let mut w = CodeWriter::new();
        w.open("impl T");
        w.open("fn f()");
        w.line("g();");
        w.close();
        w.close();
        assert_eq!(w.finish(), "impl T {\n    fn f() {\n        g();\n    }\n}\n");
    }

    #[test]
    fn test_escape_str() {
        assert_eq!(escape_str("plain"), "plain");
        assert_eq!(escape_str("a\"b"), "a\\\"b");
        assert_eq!(escape_str("a\\b"), "a\\\\b");
    }
}
