// SPDX-License-Identifier: MIT OR Apache-2.0
//! Program export.
//!
//! Turns a [`ResolvedAnimationRecord`] into the source of a manimgl scene
//! that writes the text on screen with the record's styling.

use crate::graphs::text_animation::{
    ResolvedAnimationRecord, DEFAULT_DURATION, DEFAULT_FONT_FAMILY, DEFAULT_TEXT,
};
use std::fmt::Write as _;

/// Name of the scene class in the exported program
pub const SCENE_CLASS_NAME: &str = "TextAnimation";

/// Render the program for a record.
///
/// Total: malformed colors become white, empty text and family names and
/// non-finite durations fall back to their defaults.
pub fn export_program(record: &ResolvedAnimationRecord) -> String {
    let [r, g, b] = record.rgb().normalized();
    let text = non_empty_or(&record.text, DEFAULT_TEXT);
    let font_family = non_empty_or(&record.font_family, DEFAULT_FONT_FAMILY);
    let time = if record.time.is_finite() { record.time } else { DEFAULT_DURATION };

    let mut program = String::new();
    program.push_str("from manimlib import *\n");
    program.push_str("import numpy as np\n");
    program.push('\n');
    let _ = writeln!(program, "class {SCENE_CLASS_NAME}(Scene):");
    program.push_str("    def construct(self):\n");
    let _ = writeln!(program, "        text = Text({},", python_string(text));
    let _ = writeln!(program, "                   font={},", python_string(font_family));
    let _ = writeln!(program, "                   font_size={},", record.font_size);
    let _ = writeln!(program, "                   color=rgb_to_color([{r}, {g}, {b}]))");
    program.push('\n');
    program.push_str("        self.play(\n");
    program.push_str("            Write(text),\n");
    let _ = writeln!(program, "            run_time={time}");
    program.push_str("        )\n");
    program.push('\n');
    program.push_str("        self.wait(1)\n");

    tracing::debug!(bytes = program.len(), "exported program");
    program
}

fn non_empty_or<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() { default } else { value }
}

/// Quote a string as a double-quoted Python literal
fn python_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ResolvedAnimationRecord {
        ResolvedAnimationRecord {
            text: "Hi".into(),
            color: "#112233".into(),
            time: 2.5,
            font_size: 20,
            font_family: "Georgia".into(),
        }
    }

    #[test]
    fn test_program_embeds_record() {
        let program = export_program(&record());
        assert!(program.starts_with("from manimlib import *\nimport numpy as np\n"));
        assert!(program.contains("class TextAnimation(Scene):"));
        assert!(program.contains("text = Text(\"Hi\","));
        assert!(program.contains("font=\"Georgia\","));
        assert!(program.contains("font_size=20,"));
        assert!(program.contains("run_time=2.5\n"));
        assert!(program.ends_with("        self.wait(1)\n"));

        let channels = format!(
            "color=rgb_to_color([{}, {}, {}]))",
            17.0 / 255.0,
            34.0 / 255.0,
            51.0 / 255.0
        );
        assert!(program.contains(&channels), "{program}");
    }

    #[test]
    fn test_default_record_program() {
        let program = export_program(&ResolvedAnimationRecord::default());
        assert!(program.contains("Text(\"Sample Text\","));
        assert!(program.contains("font=\"Arial\","));
        assert!(program.contains("font_size=32,"));
        assert!(program.contains("rgb_to_color([1, 1, 1])"));
        assert!(program.contains("run_time=1\n"));
    }

    #[test]
    fn test_malformed_color_exports_white() {
        let mut record = record();
        record.color = "#12".into();
        assert!(export_program(&record).contains("rgb_to_color([1, 1, 1])"));
    }

    #[test]
    fn test_export_redefaults_degenerate_values() {
        let mut record = record();
        record.text = String::new();
        record.font_family = String::new();
        record.time = f64::NAN;
        let program = export_program(&record);
        assert!(program.contains("Text(\"Sample Text\","));
        assert!(program.contains("font=\"Arial\","));
        assert!(program.contains("run_time=1\n"));
    }

    #[test]
    fn test_non_positive_duration_is_kept() {
        let mut record = record();
        record.time = -0.5;
        assert!(export_program(&record).contains("run_time=-0.5\n"));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut record = record();
        record.text = "say \"hi\"\\\nnow".into();
        let program = export_program(&record);
        assert!(program.contains(r#"Text("say \"hi\"\\\nnow","#), "{program}");
    }
}
