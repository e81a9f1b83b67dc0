// SPDX-License-Identifier: MIT OR Apache-2.0
//! Text animation graph.
//!
//! Three source nodes (color, text style, duration) feed a single animation
//! sink. The sink merges whatever arrives on its inputs into a
//! [`ResolvedAnimationRecord`], defaulting each field independently.

use crate::color::{hex_to_rgb, is_hex_color, Rgb8};
use crate::graph::Graph;
use crate::node::{FieldKind, FieldValue, Fields, Node, NodeCategory};
use crate::port::{Port, PortValue, PortValues, SocketType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default color
pub const DEFAULT_COLOR: &str = "#FFFFFF";
/// Default display text
pub const DEFAULT_TEXT: &str = "Sample Text";
/// Default font size
pub const DEFAULT_FONT_SIZE: i32 = 32;
/// Default font family
pub const DEFAULT_FONT_FAMILY: &str = "Arial";
/// Default animation duration in seconds
pub const DEFAULT_DURATION: f64 = 1.0;

/// Font families offered by editor front-ends. Other names are accepted.
pub const FONT_FAMILIES: [&str; 5] = ["Arial", "Times New Roman", "Courier New", "Georgia", "Verdana"];

/// Field and record key: color
pub const COLOR_KEY: &str = "color";
/// Field and record key: display text
pub const TEXT_KEY: &str = "text";
/// Field and record key: font size
pub const FONT_SIZE_KEY: &str = "fontSize";
/// Field and record key: font family
pub const FONT_FAMILY_KEY: &str = "fontFamily";
/// Field key: duration
pub const DURATION_KEY: &str = "duration";
/// Port and record key: animation time
pub const TIME_KEY: &str = "time";
/// Port key: sink output
pub const OUTPUT_KEY: &str = "output";

/// The node kinds of a text animation graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Emits a hex color
    ColorSource,
    /// Emits a text style record
    TextSource,
    /// Emits an animation duration
    DurationSource,
    /// Merges the sources into the resolved animation
    AnimationSink,
}

impl NodeKind {
    /// All node kinds
    pub const ALL: [NodeKind; 4] = [
        Self::ColorSource,
        Self::TextSource,
        Self::DurationSource,
        Self::AnimationSink,
    ];

    /// Stable type identifier
    pub fn type_id(&self) -> &'static str {
        match self {
            Self::ColorSource => "color_source",
            Self::TextSource => "text_source",
            Self::DurationSource => "duration_source",
            Self::AnimationSink => "animation_sink",
        }
    }

    /// Component name used by earlier editor documents
    pub fn legacy_name(&self) -> &'static str {
        match self {
            Self::ColorSource => "COLOR_SETUP_01",
            Self::TextSource => "TEXT_SETUP_01",
            Self::DurationSource => "ANIMATION_TIME_SETUP_01",
            Self::AnimationSink => "TEXTANIM_COLOR_01",
        }
    }

    /// Display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ColorSource => "Color Setup",
            Self::TextSource => "Text Setup",
            Self::DurationSource => "Animation Time Setup",
            Self::AnimationSink => "Text Animation",
        }
    }

    /// Category
    pub fn category(&self) -> NodeCategory {
        match self {
            Self::AnimationSink => NodeCategory::Output,
            _ => NodeCategory::Input,
        }
    }

    /// Freshly identified input and output ports
    pub fn ports(&self) -> (Vec<Port>, Vec<Port>) {
        match self {
            Self::ColorSource => (
                vec![],
                vec![Port::output(COLOR_KEY, "Color", SocketType::Color)],
            ),
            Self::TextSource => (
                vec![],
                vec![Port::output(TEXT_KEY, "Text", SocketType::Text)],
            ),
            Self::DurationSource => (
                vec![],
                vec![Port::output(TIME_KEY, "Animation Time", SocketType::Number)],
            ),
            Self::AnimationSink => (
                vec![
                    Port::input(COLOR_KEY, "Color", SocketType::Color),
                    Port::input(TEXT_KEY, "Text", SocketType::Text),
                    Port::input(TIME_KEY, "Time", SocketType::Number),
                ],
                vec![Port::output(OUTPUT_KEY, "Output", SocketType::Number)],
            ),
        }
    }

    /// Names of the editable fields
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            Self::ColorSource => &[COLOR_KEY],
            Self::TextSource => &[TEXT_KEY, FONT_SIZE_KEY, FONT_FAMILY_KEY],
            Self::DurationSource => &[DURATION_KEY],
            Self::AnimationSink => &[],
        }
    }

    /// Type of an editable field; `None` when the kind has no such field
    pub fn field_kind(&self, key: &str) -> Option<FieldKind> {
        if !self.field_names().contains(&key) {
            return None;
        }
        match key {
            FONT_SIZE_KEY | DURATION_KEY => Some(FieldKind::Number),
            _ => Some(FieldKind::Text),
        }
    }

    /// Initial field values
    pub fn default_fields(&self) -> Fields {
        let mut fields = Fields::new();
        match self {
            Self::ColorSource => {
                fields.insert(COLOR_KEY.into(), FieldValue::Text(DEFAULT_COLOR.into()));
            }
            Self::TextSource => {
                fields.insert(TEXT_KEY.into(), FieldValue::Text(DEFAULT_TEXT.into()));
                fields.insert(FONT_SIZE_KEY.into(), FieldValue::Number(f64::from(DEFAULT_FONT_SIZE)));
                fields.insert(FONT_FAMILY_KEY.into(), FieldValue::Text(DEFAULT_FONT_FAMILY.into()));
            }
            Self::DurationSource => {
                fields.insert(DURATION_KEY.into(), FieldValue::Number(DEFAULT_DURATION));
            }
            Self::AnimationSink => {}
        }
        fields
    }

    /// Evaluate a node of this kind. Pure: depends only on the arguments.
    ///
    /// `inputs` holds the upstream value of every connected input port, keyed
    /// by port name; unconnected ports are absent.
    pub fn evaluate(&self, fields: &Fields, inputs: &PortValues) -> NodeEvaluation {
        match self {
            Self::ColorSource => {
                let color = fields.get(COLOR_KEY)
                    .and_then(FieldValue::as_text)
                    .filter(|c| is_hex_color(c))
                    .unwrap_or(DEFAULT_COLOR);
                NodeEvaluation::single(COLOR_KEY, PortValue::Color(color.to_string()))
            }
            Self::TextSource => {
                let text = fields.get(TEXT_KEY)
                    .and_then(FieldValue::as_text)
                    .unwrap_or(DEFAULT_TEXT);
                let font_size = fields.get(FONT_SIZE_KEY)
                    .and_then(FieldValue::as_number)
                    .map_or(DEFAULT_FONT_SIZE, font_size_from);
                let font_family = fields.get(FONT_FAMILY_KEY)
                    .and_then(FieldValue::as_text)
                    .unwrap_or(DEFAULT_FONT_FAMILY);
                let style = PortValue::record([
                    (TEXT_KEY, PortValue::Text(text.to_string())),
                    (FONT_SIZE_KEY, PortValue::Number(f64::from(font_size))),
                    (FONT_FAMILY_KEY, PortValue::Text(font_family.to_string())),
                ]);
                NodeEvaluation::single(TEXT_KEY, style)
            }
            Self::DurationSource => {
                // Zero and negative durations pass through
                let duration = fields.get(DURATION_KEY)
                    .and_then(FieldValue::as_number)
                    .unwrap_or(DEFAULT_DURATION);
                NodeEvaluation::single(TIME_KEY, PortValue::Number(duration))
            }
            Self::AnimationSink => {
                let record = ResolvedAnimationRecord::merge(inputs);
                let mut evaluation = NodeEvaluation::single(OUTPUT_KEY, record.to_value());
                evaluation.resolved = Some(record);
                evaluation
            }
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_id())
    }
}

impl FromStr for NodeKind {
    type Err = UnknownNodeKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| {
                kind.type_id().eq_ignore_ascii_case(wanted)
                    || kind.legacy_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| UnknownNodeKind(s.to_string()))
    }
}

/// Error when parsing a node kind name
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown node kind: {0}")]
pub struct UnknownNodeKind(pub String);

/// Output of a single node evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct NodeEvaluation {
    /// Output values by port name
    pub outputs: PortValues,
    /// Set by the animation sink only
    pub resolved: Option<ResolvedAnimationRecord>,
}

impl NodeEvaluation {
    fn single(port: &str, value: PortValue) -> Self {
        let mut outputs = PortValues::new();
        outputs.insert(port.to_string(), value);
        Self {
            outputs,
            resolved: None,
        }
    }
}

/// The sink's merged output, the only value handed to program export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAnimationRecord {
    /// Display text
    pub text: String,
    /// Hex color string
    pub color: String,
    /// Animation duration in seconds
    pub time: f64,
    /// Font size
    pub font_size: i32,
    /// Font family
    pub font_family: String,
}

impl Default for ResolvedAnimationRecord {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEXT.to_string(),
            color: DEFAULT_COLOR.to_string(),
            time: DEFAULT_DURATION,
            font_size: DEFAULT_FONT_SIZE,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
        }
    }
}

impl ResolvedAnimationRecord {
    /// Merge upstream values arriving at the sink's `color`, `text` and
    /// `time` inputs, defaulting each field on its own.
    pub fn merge(inputs: &PortValues) -> Self {
        // A plain string is used verbatim; a record contributes its `color` field
        let color = inputs.get(COLOR_KEY)
            .and_then(|value| {
                value.as_str().or_else(|| {
                    value.field(COLOR_KEY)
                        .and_then(PortValue::as_str)
                        .filter(|c| !c.is_empty())
                })
            })
            .unwrap_or(DEFAULT_COLOR);

        // Only a record carries text settings; anything else means defaults
        let style = inputs.get(TEXT_KEY);
        let text = style
            .and_then(|s| s.field(TEXT_KEY))
            .and_then(PortValue::as_str)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TEXT);
        let font_size = style
            .and_then(|s| s.field(FONT_SIZE_KEY))
            .and_then(PortValue::as_number)
            .map_or(DEFAULT_FONT_SIZE, font_size_from);
        let font_family = style
            .and_then(|s| s.field(FONT_FAMILY_KEY))
            .and_then(PortValue::as_str)
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_FONT_FAMILY);

        let time = inputs.get(TIME_KEY)
            .and_then(PortValue::as_number)
            .unwrap_or(DEFAULT_DURATION);

        Self {
            text: text.to_string(),
            color: color.to_string(),
            time,
            font_size,
            font_family: font_family.to_string(),
        }
    }

    /// The color as RGB, white when malformed
    pub fn rgb(&self) -> Rgb8 {
        hex_to_rgb(&self.color)
    }

    /// The record as a port value
    pub fn to_value(&self) -> PortValue {
        PortValue::record([
            (TEXT_KEY, PortValue::Text(self.text.clone())),
            (COLOR_KEY, PortValue::Color(self.color.clone())),
            (TIME_KEY, PortValue::Number(self.time)),
            (FONT_SIZE_KEY, PortValue::Number(f64::from(self.font_size))),
            (FONT_FAMILY_KEY, PortValue::Text(self.font_family.clone())),
        ])
    }
}

fn font_size_from(value: f64) -> i32 {
    value.round() as i32
}

/// The graph a new editing session starts with: one node of each kind,
/// laid out left to right, unconnected
pub fn starter_graph() -> Graph {
    let mut graph = Graph::new("Text Animation");
    graph.add_node(Node::new(NodeKind::AnimationSink).with_position(400.0, 200.0));
    graph.add_node(Node::new(NodeKind::ColorSource).with_position(100.0, 100.0));
    graph.add_node(Node::new(NodeKind::TextSource).with_position(100.0, 300.0));
    graph.add_node(Node::new(NodeKind::DurationSource).with_position(100.0, 500.0));
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs<const N: usize>(values: [(&str, PortValue); N]) -> PortValues {
        values.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    fn output(kind: NodeKind, fields: &Fields) -> PortValue {
        let evaluation = kind.evaluate(fields, &PortValues::new());
        assert_eq!(evaluation.outputs.len(), 1);
        evaluation.outputs[0].clone()
    }

    #[test]
    fn test_sink_with_no_inputs_uses_defaults() {
        let evaluation = NodeKind::AnimationSink.evaluate(&Fields::new(), &PortValues::new());
        let record = evaluation.resolved.unwrap();
        assert_eq!(
            record,
            ResolvedAnimationRecord {
                text: "Sample Text".into(),
                color: "#FFFFFF".into(),
                time: 1.0,
                font_size: 32,
                font_family: "Arial".into(),
            }
        );
        assert_eq!(evaluation.outputs[OUTPUT_KEY], record.to_value());
    }

    #[test]
    fn test_sink_time_parse_failure_defaults() {
        let record = ResolvedAnimationRecord::merge(&inputs([(TIME_KEY, PortValue::Text("abc".into()))]));
        assert_eq!(record.time, 1.0);

        let record = ResolvedAnimationRecord::merge(&inputs([(TIME_KEY, PortValue::Text("2.5".into()))]));
        assert_eq!(record.time, 2.5);

        let record = ResolvedAnimationRecord::merge(&inputs([(
            TIME_KEY,
            PortValue::record([(TEXT_KEY, PortValue::Text("x".into()))]),
        )]));
        assert_eq!(record.time, 1.0);
    }

    #[test]
    fn test_sink_color_shapes() {
        let plain = ResolvedAnimationRecord::merge(&inputs([(COLOR_KEY, PortValue::Color("#112233".into()))]));
        assert_eq!(plain.color, "#112233");

        let text = ResolvedAnimationRecord::merge(&inputs([(COLOR_KEY, PortValue::Text("#ABCDEF".into()))]));
        assert_eq!(text.color, "#ABCDEF");

        let record = ResolvedAnimationRecord::merge(&inputs([(
            COLOR_KEY,
            PortValue::record([(COLOR_KEY, PortValue::Color("#445566".into()))]),
        )]));
        assert_eq!(record.color, "#445566");

        let number = ResolvedAnimationRecord::merge(&inputs([(COLOR_KEY, PortValue::Number(3.0))]));
        assert_eq!(number.color, DEFAULT_COLOR);

        let colorless = ResolvedAnimationRecord::merge(&inputs([(
            COLOR_KEY,
            PortValue::record([(TEXT_KEY, PortValue::Text("Hi".into()))]),
        )]));
        assert_eq!(colorless.color, DEFAULT_COLOR);
    }

    #[test]
    fn test_sink_text_fields_default_independently() {
        let record = ResolvedAnimationRecord::merge(&inputs([(
            TEXT_KEY,
            PortValue::record([
                (TEXT_KEY, PortValue::Text("Hi".into())),
                (FONT_FAMILY_KEY, PortValue::Text(String::new())),
            ]),
        )]));
        assert_eq!(record.text, "Hi");
        assert_eq!(record.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(record.font_family, DEFAULT_FONT_FAMILY);
    }

    #[test]
    fn test_sink_text_wrong_shape_uses_defaults() {
        let record = ResolvedAnimationRecord::merge(&inputs([(TEXT_KEY, PortValue::Text("Hi".into()))]));
        assert_eq!(record.text, DEFAULT_TEXT);
        assert_eq!(record.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(record.font_family, DEFAULT_FONT_FAMILY);
    }

    #[test]
    fn test_color_source() {
        assert_eq!(
            output(NodeKind::ColorSource, &NodeKind::ColorSource.default_fields()),
            PortValue::Color("#FFFFFF".into())
        );

        let mut fields = Fields::new();
        fields.insert(COLOR_KEY.into(), FieldValue::Text("#ff8000".into()));
        assert_eq!(output(NodeKind::ColorSource, &fields), PortValue::Color("#ff8000".into()));

        fields.insert(COLOR_KEY.into(), FieldValue::Text("orange".into()));
        assert_eq!(output(NodeKind::ColorSource, &fields), PortValue::Color(DEFAULT_COLOR.into()));

        fields.insert(COLOR_KEY.into(), FieldValue::Number(12.0));
        assert_eq!(output(NodeKind::ColorSource, &fields), PortValue::Color(DEFAULT_COLOR.into()));
    }

    #[test]
    fn test_text_source_defaults_each_field() {
        let mut fields = Fields::new();
        fields.insert(TEXT_KEY.into(), FieldValue::Text(String::new()));
        fields.insert(FONT_SIZE_KEY.into(), FieldValue::Text("big".into()));
        fields.insert(FONT_FAMILY_KEY.into(), FieldValue::Text("Georgia".into()));

        let style = output(NodeKind::TextSource, &fields);
        assert_eq!(style.field(TEXT_KEY), Some(&PortValue::Text(DEFAULT_TEXT.into())));
        assert_eq!(style.field(FONT_SIZE_KEY), Some(&PortValue::Number(32.0)));
        assert_eq!(style.field(FONT_FAMILY_KEY), Some(&PortValue::Text("Georgia".into())));
    }

    #[test]
    fn test_duration_source_passes_through_non_positive() {
        let mut fields = Fields::new();
        assert_eq!(output(NodeKind::DurationSource, &fields), PortValue::Number(1.0));

        fields.insert(DURATION_KEY.into(), FieldValue::Number(0.0));
        assert_eq!(output(NodeKind::DurationSource, &fields), PortValue::Number(0.0));

        fields.insert(DURATION_KEY.into(), FieldValue::Number(-2.0));
        assert_eq!(output(NodeKind::DurationSource, &fields), PortValue::Number(-2.0));

        fields.insert(DURATION_KEY.into(), FieldValue::Text("soon".into()));
        assert_eq!(output(NodeKind::DurationSource, &fields), PortValue::Number(1.0));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("color_source".parse::<NodeKind>(), Ok(NodeKind::ColorSource));
        assert_eq!("TEXTANIM_COLOR_01".parse::<NodeKind>(), Ok(NodeKind::AnimationSink));
        assert_eq!(" Text_Source ".parse::<NodeKind>(), Ok(NodeKind::TextSource));
        assert!("blend_poses".parse::<NodeKind>().is_err());
        for kind in NodeKind::ALL {
            assert_eq!(kind.to_string().parse::<NodeKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_field_kinds() {
        assert_eq!(NodeKind::ColorSource.field_kind(COLOR_KEY), Some(FieldKind::Text));
        assert_eq!(NodeKind::TextSource.field_kind(TEXT_KEY), Some(FieldKind::Text));
        assert_eq!(NodeKind::TextSource.field_kind(FONT_FAMILY_KEY), Some(FieldKind::Text));
        assert_eq!(NodeKind::TextSource.field_kind(FONT_SIZE_KEY), Some(FieldKind::Number));
        assert_eq!(NodeKind::DurationSource.field_kind(DURATION_KEY), Some(FieldKind::Number));
        assert_eq!(NodeKind::AnimationSink.field_kind(COLOR_KEY), None);
        assert_eq!(NodeKind::ColorSource.field_kind(DURATION_KEY), None);
    }

    #[test]
    fn test_starter_graph_layout() {
        let graph = starter_graph();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.connection_count(), 0);
        let sink = graph.nodes_of_kind(NodeKind::AnimationSink).next().unwrap();
        assert_eq!(sink.position, [400.0, 200.0]);
        assert_eq!(sink.kind.category(), NodeCategory::Output);
    }
}
