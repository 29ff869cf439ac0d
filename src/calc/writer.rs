// Copyright 2025 Cubecalc Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Plan output for compiled calcs
//!
//! One line per node, children indented two spaces below their parent:
//!
//! ```text
//! MemberValueCalc(type=SCALAR, shape=GenericCalc, resultStyle=VALUE)
//!   HierarchyCurrentMemberCalc(type=MEMBER<[Gender]>, shape=MemberCalc, resultStyle=VALUE)
//! ```

use std::fmt::Write;

use crate::olap::Hierarchy;

use super::Calc;

/// Renders calc trees as indented text
#[derive(Debug, Default)]
pub struct CalcWriter {
    lines: Vec<String>,
    hierarchies: Vec<Hierarchy>,
}

impl CalcWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also list, per node, which of `hierarchies` it depends on
    pub fn with_dependencies(mut self, hierarchies: &[Hierarchy]) -> Self {
        self.hierarchies = hierarchies.to_vec();
        self
    }

    /// Appends the tree rooted at `calc`
    pub fn write(&mut self, calc: &Calc) {
        self.write_node(calc, 0);
    }

    fn write_node(&mut self, calc: &Calc, indent: usize) {
        let prefix = "  ".repeat(indent);
        let mut line = format!(
            "{}{}(type={}, shape={}, resultStyle={}",
            prefix,
            calc.name(),
            calc.ty(),
            calc.shape(),
            calc.result_style()
        );
        if !self.hierarchies.is_empty() {
            let depends: Vec<&str> = self
                .hierarchies
                .iter()
                .filter(|h| calc.depends_on(h))
                .map(|h| h.unique_name())
                .collect();
            let _ = write!(line, ", dependsOn=[{}]", depends.join(", "));
        }
        line.push(')');
        self.lines.push(line);

        for child in calc.children() {
            self.write_node(child, indent + 1);
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn finish(self) -> String {
        self.lines.join("\n")
    }
}

/// Plan text for one calc tree
pub fn explain(calc: &Calc) -> String {
    let mut writer = CalcWriter::new();
    writer.write(calc);
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::{ConstantCalc, GenericAccessor, IntegerToDoubleCalc, ValueCalc};
    use crate::core::{Type, Value};
    use crate::olap::Dimension;
    use std::sync::Arc;

    #[test]
    fn test_explain_indents_children() {
        let constant = Arc::new(ConstantCalc::new(Value::integer(3), Type::INTEGER));
        let calc = Calc::Double(Arc::new(IntegerToDoubleCalc::new(Arc::new(
            GenericAccessor::new(constant),
        ))));
        let text = explain(&calc);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("IntegerToDoubleCalc(type="));
        assert!(lines[0].contains("shape=DoubleCalc"));
        assert!(lines[1].starts_with("  ConstantCalc("));
    }

    /// Test: integer to double conversion reports a numeric result type
    #[test]
    fn test_integer_to_double_is_numeric() {
        let constant = Arc::new(ConstantCalc::new(Value::integer(3), Type::INTEGER));
        let calc = Calc::Double(Arc::new(IntegerToDoubleCalc::new(Arc::new(
            GenericAccessor::new(constant),
        ))));
        assert_eq!(calc.ty(), &Type::NUMERIC);
        let text = explain(&calc);
        assert!(text.starts_with(&format!("IntegerToDoubleCalc(type={},", Type::NUMERIC)));
    }

    #[test]
    fn test_dependencies_listed() {
        let gender = Hierarchy::new(&Dimension::new("Gender"));
        let mut writer = CalcWriter::new().with_dependencies(std::slice::from_ref(&gender));
        writer.write(&ValueCalc::new().into_calc());
        writer.write(&ConstantCalc::new(Value::double(1.0), Type::NUMERIC).into_calc());
        let lines = writer.lines().to_vec();
        assert!(lines[0].ends_with(&format!("dependsOn=[{}])", gender.unique_name())));
        assert!(lines[1].ends_with("dependsOn=[])"));
    }
}
