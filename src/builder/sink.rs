/// Append-only destination for generated SQL text. Builders never read it back.
pub trait SqlSink {
    fn print(&mut self, text: &str);

    /// Closes the current statement with the dialect's terminator.
    fn end_statement(&mut self, terminator: &str);
}

/// A plain script: statements are terminated and separated by a blank line.
impl SqlSink for String {
    fn print(&mut self, text: &str) {
        self.push_str(text);
    }

    fn end_statement(&mut self, terminator: &str) {
        self.push_str(terminator);
        self.push_str("\n\n");
    }
}

/// Collects one string per statement, without terminators, ready to be executed one by one.
#[derive(Debug, Default)]
pub struct Statements {
    statements: Vec<String>,
    current: String,
}

impl Statements {
    pub fn as_slice(&self) -> &[String] {
        &self.statements
    }

    pub fn into_vec(self) -> Vec<String> {
        self.statements
    }
}

impl SqlSink for Statements {
    fn print(&mut self, text: &str) {
        self.current.push_str(text);
    }

    fn end_statement(&mut self, _terminator: &str) {
        let statement = std::mem::take(&mut self.current);
        let statement = statement.trim();
        if !statement.is_empty() {
            self.statements.push(statement.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_split_on_end_of_statement() {
        let mut sink = Statements::default();
        sink.print("CREATE TABLE t (\n");
        sink.print("    a INTEGER\n)");
        sink.end_statement(";");
        sink.end_statement(";");
        sink.print("DROP TABLE u");
        sink.end_statement(";");
        assert_eq!(
            sink.into_vec(),
            vec!["CREATE TABLE t (\n    a INTEGER\n)", "DROP TABLE u"]
        );
    }

    #[test]
    fn test_string_sink_appends_terminator() {
        let mut sql = String::new();
        sql.print("DROP TABLE t");
        sql.end_statement(";");
        assert_eq!(sql, "DROP TABLE t;\n\n");
    }
}
