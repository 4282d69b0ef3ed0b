use super::{ExplainPortIO, ExplainStep};
use itertools::Itertools;

/// Formats explain traces into human-readable text.
pub struct TraceFormatter;

impl TraceFormatter {
    /// One line per step, in trace order. The step of `active` is marked
    /// with `>`.
    pub fn format_flow(steps: &[ExplainStep], active: Option<&str>) -> String {
        steps
            .iter()
            .map(|step| {
                let marker = if Some(step.node_id.as_str()) == active { '>' } else { ' ' };
                format!(
                    "{} {}: {} ({}@{}) in:{} out:{}",
                    marker,
                    step.node_type,
                    step.title,
                    step.block_id,
                    step.version,
                    step.inputs.len(),
                    step.outputs.len()
                )
            })
            .join("\n")
    }

    /// A detailed view of one step.
    pub fn format_step(step: &ExplainStep) -> String {
        let mut out = format!(
            "{}\n  {}@{} ({})",
            step.title, step.block_id, step.version, step.node_type
        );
        if let Some(formula) = &step.formula {
            out.push_str(&format!("\n  formula: {}", formula));
        }
        if let Some(why) = &step.why_it_works {
            out.push_str(&format!("\n  why: {}", why));
        }
        Self::push_ports(&mut out, "inputs", &step.inputs);
        Self::push_ports(&mut out, "outputs", &step.outputs);
        if !step.implementation.is_empty() {
            out.push_str(&format!("\n  impl: {}", step.implementation.join(", ")));
        }
        out
    }

    fn push_ports(out: &mut String, heading: &str, ports: &[ExplainPortIO]) {
        if ports.is_empty() {
            return;
        }
        out.push_str(&format!("\n  {}:", heading));
        for port in ports {
            out.push_str(&format!("\n    - {} ({})", port.name, port.port_type));
            if let Some(shape) = &port.shape {
                out.push_str(&format!(" shape=[{}]", shape.iter().join(", ")));
            }
            if let Some(preview) = &port.preview {
                let values = preview.iter().map(|v| Self::format_number(*v)).join(", ");
                out.push_str(&format!(" preview=[{}]", values));
            }
            if let Some(note) = &port.note {
                out.push_str(&format!(" // {}", note));
            }
        }
    }

    /// Whole numbers print without a fractional part.
    fn format_number(n: f64) -> String {
        if n.fract() == 0.0 && n.abs() < 1e15 {
            format!("{}", n as i64)
        } else {
            format!("{}", n)
        }
    }
}
