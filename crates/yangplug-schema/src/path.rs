//! Context paths used in diagnostics.
//!
//! A path starts with the module name followed by the segments leading to the
//! offending statement: `/aa:{identity='x'}/{extension='rev:scheme'}/arg`.
//! Statements without a data-tree name use `{keyword='name'}` placeholders.

/// Path to a schema statement, built while the compiler descends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaPath {
    module: String,
    segments: Vec<String>,
}

impl SchemaPath {
    /// Creates the path of a module's top level.
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            segments: Vec::new(),
        }
    }

    /// Enters a statement rendered as a `{keyword='name'}` placeholder.
    pub fn push_stmt(&mut self, keyword: &str, name: &str) {
        self.segments.push(format!("{{{}='{}'}}", keyword, name));
    }

    /// Enters a data node or appends a literal segment such as an argument value.
    pub fn push_node(&mut self, name: &str) {
        self.segments.push(name.to_string());
    }

    /// Leaves the innermost segment.
    pub fn pop(&mut self) {
        self.segments.pop();
    }

    /// Number of segments below the module.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Renders the path.
    pub fn render(&self) -> String {
        let mut out = format!("/{}", self.module);
        for (i, segment) in self.segments.iter().enumerate() {
            out.push(if i == 0 { ':' } else { '/' });
            out.push_str(segment);
        }
        out
    }
}

impl std::fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_top_level_extension_path() {
        let mut path = SchemaPath::new("aa");
        path.push_stmt("extension", "rev:revision-label-scheme");
        assert_eq!(path.render(), "/aa:{extension='rev:revision-label-scheme'}");
        path.push_node("aa:testver-scheme");
        assert_eq!(
            path.render(),
            "/aa:{extension='rev:revision-label-scheme'}/aa:testver-scheme"
        );
    }

    #[test]
    fn test_nested_path_and_pop() {
        let mut path = SchemaPath::new("aa");
        path.push_stmt("identity", "testver-scheme");
        path.push_stmt("extension", "rev:revision-label-scheme");
        path.push_node("aa:testver-scheme");
        assert_eq!(
            path.to_string(),
            "/aa:{identity='testver-scheme'}/{extension='rev:revision-label-scheme'}/aa:testver-scheme"
        );
        path.pop();
        path.pop();
        path.pop();
        assert_eq!(path.depth(), 0);
        assert_eq!(path.render(), "/aa");
    }
}
